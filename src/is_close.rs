/// Tolerance of [`IsClose`], relative to the magnitude of the compared
/// values once they exceed unity.
pub(crate) const CLOSE_TOL: f64 = 1e-12;

pub trait IsClose {
    fn is_close(&self, other: Self) -> bool;
}

impl IsClose for f64 {
    #[inline]
    fn is_close(&self, other: f64) -> bool {
        let scale = self.abs().max(other.abs()).max(1.0);
        (self - other).abs() <= CLOSE_TOL * scale
    }
}

impl IsClose for &[f64] {
    fn is_close(&self, other: Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, &b)| a.is_close(b))
    }
}
