use ndarray::{
    Array, Array2, ArrayView, ArrayView1, ArrayView2, ArrayViewMut1, Axis, Dimension, Zip,
};
use thiserror::Error;

use crate::index::GridAxis;

/// Which partial derivative of a surface to evaluate.
///
/// Mixed derivatives are never needed, so at most one axis is differentiated.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Derivative {
    #[default]
    Value,
    /// First derivative along the first axis.
    PartialX,
    /// First derivative along the second axis.
    PartialY,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("grid has shape {found:?} but axes have lengths {expected:?}")]
pub struct GridShapeError {
    expected: (usize, usize),
    found: (usize, usize),
}

/// Weights of a cubic piece in its cell, expressed on the values and second
/// derivatives at both ends of the cell.
#[derive(Copy, Clone, Debug)]
struct CubicWeights {
    lo: f64,
    hi: f64,
    curv_lo: f64,
    curv_hi: f64,
}

impl CubicWeights {
    fn new(axis: &GridAxis, at: f64, derivative: bool) -> (usize, Self) {
        let i = axis.cell(at);
        let knots = axis.values();
        let h = knots[i + 1] - knots[i];
        let a = (knots[i + 1] - at) / h;
        let b = (at - knots[i]) / h;
        let weights = if derivative {
            Self {
                lo: -1.0 / h,
                hi: 1.0 / h,
                curv_lo: -(3.0 * a * a - 1.0) * h / 6.0,
                curv_hi: (3.0 * b * b - 1.0) * h / 6.0,
            }
        } else {
            Self {
                lo: a,
                hi: b,
                curv_lo: (a * a * a - a) * h * h / 6.0,
                curv_hi: (b * b * b - b) * h * h / 6.0,
            }
        };
        (i, weights)
    }

    #[inline]
    fn apply(&self, lo: f64, hi: f64, curv_lo: f64, curv_hi: f64) -> f64 {
        self.lo * lo + self.hi * hi + self.curv_lo * curv_lo + self.curv_hi * curv_hi
    }
}

/// Second derivatives at the knots of the not-a-knot cubic spline through
/// `values`.
///
/// The third derivative is continuous across the second and penultimate
/// knots, which makes the spline reproduce any cubic exactly. Needs at least
/// four knots.
pub(crate) fn not_a_knot_curvatures(
    widths: &[f64],
    values: ArrayView1<'_, f64>,
    mut out: ArrayViewMut1<'_, f64>,
) {
    let n = values.len();
    debug_assert_eq!(widths.len() + 1, n);
    debug_assert!(n >= 4);
    let h = widths;
    let m = n - 2;

    // Unknowns are the curvatures at knots 1..=n-2; the end curvatures are
    // eliminated with the not-a-knot conditions.
    let mut sub = vec![0.0; m];
    let mut diag = vec![0.0; m];
    let mut sup = vec![0.0; m];
    let mut rhs = vec![0.0; m];
    for k in 0..m {
        let i = k + 1;
        sub[k] = h[i - 1];
        diag[k] = 2.0 * (h[i - 1] + h[i]);
        sup[k] = h[i];
        rhs[k] = 6.0
            * ((values[i + 1] - values[i]) / h[i] - (values[i] - values[i - 1]) / h[i - 1]);
    }
    let (h0, h1) = (h[0], h[1]);
    diag[0] += h0 * (h0 + h1) / h1;
    sup[0] -= h0 * h0 / h1;
    let (a, b) = (h[n - 3], h[n - 2]);
    diag[m - 1] += b * (a + b) / a;
    sub[m - 1] -= b * b / a;

    // Thomas algorithm
    for k in 1..m {
        let w = sub[k] / diag[k - 1];
        diag[k] -= w * sup[k - 1];
        rhs[k] -= w * rhs[k - 1];
    }
    out[m] = rhs[m - 1] / diag[m - 1];
    for k in (0..m - 1).rev() {
        out[k + 1] = (rhs[k] - sup[k] * out[k + 2]) / diag[k];
    }

    out[0] = ((h0 + h1) * out[1] - h0 * out[2]) / h1;
    out[n - 1] = ((a + b) * out[n - 2] - b * out[n - 3]) / a;
}

fn curvatures_along(axis: Axis, knots: &GridAxis, values: ArrayView2<'_, f64>) -> Array2<f64> {
    let widths = knots.widths();
    let mut out = Array2::zeros(values.raw_dim());
    Zip::from(out.lanes_mut(axis))
        .and(values.lanes(axis))
        .for_each(|curv, vals| not_a_knot_curvatures(&widths, vals, curv));
    out
}

/// Bicubic tensor-product spline interpolating a rectangular grid.
///
/// Each node stores the value together with the second derivatives along
/// each axis and the mixed fourth derivative, which fully determines the
/// bicubic piece on every cell. These are computed once at construction.
#[derive(Clone, Debug)]
pub struct BicubicSpline {
    x: GridAxis,
    y: GridAxis,
    values: Array2<f64>,
    d2x: Array2<f64>,
    d2y: Array2<f64>,
    d4xy: Array2<f64>,
}

impl BicubicSpline {
    pub fn new(
        x: GridAxis,
        y: GridAxis,
        grid: ArrayView2<'_, f64>,
    ) -> Result<Self, GridShapeError> {
        let expected = (x.n_values(), y.n_values());
        let found = grid.dim();
        if expected != found {
            return Err(GridShapeError { expected, found });
        }
        let d2x = curvatures_along(Axis(0), &x, grid);
        let d2y = curvatures_along(Axis(1), &y, grid);
        let d4xy = curvatures_along(Axis(1), &y, d2x.view());
        Ok(Self {
            values: grid.to_owned(),
            x,
            y,
            d2x,
            d2y,
            d4xy,
        })
    }

    pub fn x(&self) -> &GridAxis {
        &self.x
    }

    pub fn y(&self) -> &GridAxis {
        &self.y
    }

    /// Evaluate the surface or one of its first partial derivatives.
    ///
    /// Points outside the grid are computed with the cubic pieces of the
    /// boundary cells.
    pub fn eval(&self, x: f64, y: f64, derivative: Derivative) -> f64 {
        if derivative == Derivative::Value {
            if let (Some(i), Some(j)) = (self.x.exact_index(x), self.y.exact_index(y)) {
                return self.values[[i, j]];
            }
        }
        let (ix, wx) = CubicWeights::new(&self.x, x, derivative == Derivative::PartialX);
        let (iy, wy) = CubicWeights::new(&self.y, y, derivative == Derivative::PartialY);
        let along_y = |arr: &Array2<f64>, curv: &Array2<f64>, i: usize| {
            wy.apply(arr[[i, iy]], arr[[i, iy + 1]], curv[[i, iy]], curv[[i, iy + 1]])
        };
        wx.apply(
            along_y(&self.values, &self.d2y, ix),
            along_y(&self.values, &self.d2y, ix + 1),
            along_y(&self.d2x, &self.d4xy, ix),
            along_y(&self.d2x, &self.d4xy, ix + 1),
        )
    }

    /// Elementwise [`BicubicSpline::eval`] over points of equal shape.
    pub fn eval_many<D: Dimension>(
        &self,
        x: ArrayView<'_, f64, D>,
        y: ArrayView<'_, f64, D>,
        derivative: Derivative,
    ) -> Array<f64, D> {
        assert_eq!(x.shape(), y.shape());
        Zip::from(&x)
            .and(&y)
            .map_collect(|&x, &y| self.eval(x, y, derivative))
    }
}
