use std::sync::Arc;

use ndarray::{Array, ArrayView, Dimension};

use crate::{
    eos::MixtureEos,
    mixture::{MixtureQuantity, MixtureResult},
};

/// A set of mixture states, e.g. the layers of a stellar or planetary
/// model, sharing one EOS.
pub struct MixtureState<D: Dimension> {
    log_pressure: Array<f64, D>,
    log_temperature: Array<f64, D>,
    he_frac: Array<f64, D>,
    eos: Arc<MixtureEos>,
}

fn check_shapes<D: Dimension>(
    log_pressure: &ArrayView<'_, f64, D>,
    log_temperature: &ArrayView<'_, f64, D>,
    he_frac: &ArrayView<'_, f64, D>,
) {
    assert_eq!(log_pressure.shape(), log_temperature.shape());
    assert_eq!(log_pressure.shape(), he_frac.shape());
}

impl<D: Dimension> MixtureState<D> {
    pub fn new(
        eos: Arc<MixtureEos>,
        log_pressure: ArrayView<'_, f64, D>,
        log_temperature: ArrayView<'_, f64, D>,
        he_frac: ArrayView<'_, f64, D>,
    ) -> Self {
        check_shapes(&log_pressure, &log_temperature, &he_frac);
        Self {
            log_pressure: log_pressure.to_owned(),
            log_temperature: log_temperature.to_owned(),
            he_frac: he_frac.to_owned(),
            eos,
        }
    }

    /// Build states from pressures in Ba and temperatures in K.
    pub fn from_linear(
        eos: Arc<MixtureEos>,
        pressure: ArrayView<'_, f64, D>,
        temperature: ArrayView<'_, f64, D>,
        he_frac: ArrayView<'_, f64, D>,
    ) -> Self {
        let log_pressure = pressure.mapv(f64::log10);
        let log_temperature = temperature.mapv(f64::log10);
        Self::new(eos, log_pressure.view(), log_temperature.view(), he_frac)
    }

    pub fn set_state(
        &mut self,
        log_pressure: ArrayView<'_, f64, D>,
        log_temperature: ArrayView<'_, f64, D>,
        he_frac: ArrayView<'_, f64, D>,
    ) {
        check_shapes(&log_pressure, &log_temperature, &he_frac);
        self.log_pressure = log_pressure.to_owned();
        self.log_temperature = log_temperature.to_owned();
        self.he_frac = he_frac.to_owned();
    }

    pub fn log_pressure(&self) -> ArrayView<'_, f64, D> {
        self.log_pressure.view()
    }

    pub fn log_temperature(&self) -> ArrayView<'_, f64, D> {
        self.log_temperature.view()
    }

    pub fn he_frac(&self) -> ArrayView<'_, f64, D> {
        self.he_frac.view()
    }

    pub fn compute(&self, quantity: MixtureQuantity) -> Array<f64, D> {
        self.eos.compute(
            quantity,
            self.log_pressure.view(),
            self.log_temperature.view(),
            self.he_frac.view(),
        )
    }

    /// All mixture quantities at every state.
    pub fn results(&self) -> Array<MixtureResult, D> {
        self.eos.evaluate_many(
            self.log_pressure.view(),
            self.log_temperature.view(),
            self.he_frac.view(),
        )
    }
}
