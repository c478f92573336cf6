use crate::is_close::IsClose;
use thiserror::Error;

/// Number of knots a cubic spline needs along each axis.
pub const MIN_KNOTS: usize = 4;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RangeError {
    #[error("axis should have at least {min} values, found {n_values}")]
    TooFewValues { n_values: usize, min: usize },
    #[error("axis value at index {index} is not finite")]
    NotFinite { index: usize },
    #[error("axis should be in strictly increasing order (at index {index})")]
    NotInIncreasingOrder { index: usize },
}

/// Coordinates of a table axis, in strictly increasing order.
#[derive(Clone, Debug, PartialEq)]
pub struct GridAxis(Vec<f64>);

impl GridAxis {
    pub fn new(values: Vec<f64>) -> Result<Self, RangeError> {
        let n_values = values.len();
        if n_values < MIN_KNOTS {
            return Err(RangeError::TooFewValues {
                n_values,
                min: MIN_KNOTS,
            });
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(RangeError::NotFinite { index });
        }
        if let Some(index) = (1..n_values).find(|&i| values[i] <= values[i - 1]) {
            return Err(RangeError::NotInIncreasingOrder { index });
        }
        Ok(Self(values))
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn n_values(&self) -> usize {
        self.0.len()
    }

    pub fn first(&self) -> f64 {
        self.0[0]
    }

    pub fn last(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    pub fn contains(&self, value: f64) -> bool {
        let (first, last) = (self.first(), self.last());
        (value >= first && value <= last) || value.is_close(first) || value.is_close(last)
    }

    /// Widths of the cells between consecutive knots.
    pub(crate) fn widths(&self) -> Vec<f64> {
        self.0.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Left knot of the cell holding `value`.
    ///
    /// Values outside the axis map to the first or last cell, whose cubic
    /// pieces then extend past the boundary.
    pub fn cell(&self, value: f64) -> usize {
        let n_below = self.0.partition_point(|&v| v <= value);
        n_below.saturating_sub(1).min(self.0.len() - 2)
    }

    /// Index of the knot equal to `value`, if any.
    pub fn exact_index(&self, value: f64) -> Option<usize> {
        let i = self.cell(value);
        if value.is_close(self.0[i]) {
            Some(i)
        } else if value.is_close(self.0[i + 1]) {
            Some(i + 1)
        } else {
            None
        }
    }
}
