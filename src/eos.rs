use ndarray::{Array, ArrayView, Dimension, Zip};
use tracing::info;

use crate::{
    config::{DerivativeSource, EosConfig},
    error::{EosError, Result},
    interp::{BicubicSpline, Derivative},
    loader,
    mixture::{mix, mix_entropy, MixtureQuantity, MixtureResult, SpeciesSample},
    species_tables::{Field, Species, SpeciesTable},
};

/// A species table with one spline per tabulated field.
///
/// The log T and log P columns get splines too, so that every field can be
/// looked up; they reproduce the axes.
struct SpeciesSurfaces {
    table: SpeciesTable,
    splines: Vec<BicubicSpline>,
}

impl SpeciesSurfaces {
    fn new(table: SpeciesTable) -> Self {
        let splines = Field::ALL
            .into_iter()
            .map(|field| {
                BicubicSpline::new(
                    table.log_pressure().clone(),
                    table.log_temperature().clone(),
                    table.field(field),
                )
                .expect("species table fields match its axes")
            })
            .collect();
        Self { table, splines }
    }

    #[inline]
    fn at(&self, field: Field, derivative: Derivative, log_p: f64, log_t: f64) -> f64 {
        self.splines[field as usize].eval(log_p, log_t, derivative)
    }

    fn sample(&self, source: DerivativeSource, log_p: f64, log_t: f64) -> SpeciesSample {
        let value = |field| self.at(field, Derivative::Value, log_p, log_t);
        let (dlogs_dlogp, dlogs_dlogt, dlogrho_dlogp, dlogrho_dlogt) = match source {
            DerivativeSource::Spline => (
                self.at(Field::LogEntropy, Derivative::PartialX, log_p, log_t),
                self.at(Field::LogEntropy, Derivative::PartialY, log_p, log_t),
                self.at(Field::LogDensity, Derivative::PartialX, log_p, log_t),
                self.at(Field::LogDensity, Derivative::PartialY, log_p, log_t),
            ),
            DerivativeSource::Table => (
                value(Field::DEntDPTcst),
                value(Field::DEntDTPcst),
                value(Field::DRhoDPTcst),
                value(Field::DRhoDTPcst),
            ),
        };
        SpeciesSample {
            log_entropy: value(Field::LogEntropy),
            dlogs_dlogp,
            dlogs_dlogt,
            log_density: value(Field::LogDensity),
            dlogrho_dlogp,
            dlogrho_dlogt,
        }
    }
}

/// Equation of state of hydrogen-helium mixtures.
///
/// Pure species are interpolated in (log P, log T) with bicubic splines
/// built once at construction, and combined at the requested helium mass
/// fraction. Pressures are in Ba and temperatures in K; queries outside of
/// the tables are extrapolated.
pub struct MixtureEos {
    derivatives: DerivativeSource,
    hydrogen: SpeciesSurfaces,
    helium: SpeciesSurfaces,
}

impl MixtureEos {
    pub fn new(config: &EosConfig) -> Result<Self> {
        let (hydrogen, helium) = loader::load(config)?;
        Self::from_tables(hydrogen, helium, config.derivatives)
    }

    /// Build the EOS from one table of each species, given in any order.
    pub fn from_tables(
        first: SpeciesTable,
        second: SpeciesTable,
        derivatives: DerivativeSource,
    ) -> Result<Self> {
        let (hydrogen, helium) = match (first.species(), second.species()) {
            (Species::Hydrogen, Species::Helium) => (first, second),
            (Species::Helium, Species::Hydrogen) => (second, first),
            (Species::Hydrogen, Species::Hydrogen) => {
                return Err(EosError::MissingSpecies {
                    species: Species::Helium,
                })
            }
            (Species::Helium, Species::Helium) => {
                return Err(EosError::MissingSpecies {
                    species: Species::Hydrogen,
                })
            }
        };
        let eos = Self {
            derivatives,
            hydrogen: SpeciesSurfaces::new(hydrogen),
            helium: SpeciesSurfaces::new(helium),
        };
        info!(
            pressures = eos.hydrogen.table.log_pressure().n_values(),
            temperatures = eos.hydrogen.table.log_temperature().n_values(),
            derivatives = ?derivatives,
            "built H-He mixture EOS"
        );
        Ok(eos)
    }

    pub fn derivatives(&self) -> DerivativeSource {
        self.derivatives
    }

    fn surfaces(&self, species: Species) -> &SpeciesSurfaces {
        match species {
            Species::Hydrogen => &self.hydrogen,
            Species::Helium => &self.helium,
        }
    }

    pub fn table(&self, species: Species) -> &SpeciesTable {
        &self.surfaces(species).table
    }

    /// Interpolated `field` of a pure species, or its first derivative along
    /// log P ([`Derivative::PartialX`]) or log T ([`Derivative::PartialY`]).
    pub fn lookup(
        &self,
        species: Species,
        field: Field,
        derivative: Derivative,
        log_p: f64,
        log_t: f64,
    ) -> f64 {
        self.surfaces(species).at(field, derivative, log_p, log_t)
    }

    /// Pure species state entering the mixing rules.
    pub fn sample(&self, species: Species, log_p: f64, log_t: f64) -> SpeciesSample {
        self.surfaces(species)
            .sample(self.derivatives, log_p, log_t)
    }

    pub fn evaluate(&self, log_p: f64, log_t: f64, he_frac: f64) -> MixtureResult {
        let h = self.sample(Species::Hydrogen, log_p, log_t);
        let he = self.sample(Species::Helium, log_p, log_t);
        mix(&h, &he, log_p, he_frac)
    }

    /// Same as [`MixtureEos::evaluate`], failing if any quantity is not
    /// finite.
    pub fn evaluate_checked(&self, log_p: f64, log_t: f64, he_frac: f64) -> Result<MixtureResult> {
        self.evaluate(log_p, log_t, he_frac).check_finite()
    }

    pub fn quantity(&self, quantity: MixtureQuantity, log_p: f64, log_t: f64, he_frac: f64) -> f64 {
        self.evaluate(log_p, log_t, he_frac).get(quantity)
    }

    pub fn grad_ad(&self, log_p: f64, log_t: f64, he_frac: f64) -> f64 {
        self.quantity(MixtureQuantity::GradAd, log_p, log_t, he_frac)
    }

    pub fn log_density(&self, log_p: f64, log_t: f64, he_frac: f64) -> f64 {
        self.quantity(MixtureQuantity::LogDensity, log_p, log_t, he_frac)
    }

    pub fn gamma1(&self, log_p: f64, log_t: f64, he_frac: f64) -> f64 {
        self.quantity(MixtureQuantity::Gamma1, log_p, log_t, he_frac)
    }

    /// Log entropy of the mixture, without evaluating any derivative.
    pub fn log_entropy(&self, log_p: f64, log_t: f64, he_frac: f64) -> f64 {
        let at = |species| self.lookup(species, Field::LogEntropy, Derivative::Value, log_p, log_t);
        mix_entropy(at(Species::Hydrogen), at(Species::Helium), he_frac).log10()
    }

    /// Elementwise [`MixtureEos::evaluate`] over arrays of equal shape.
    pub fn evaluate_many<D: Dimension>(
        &self,
        log_p: ArrayView<'_, f64, D>,
        log_t: ArrayView<'_, f64, D>,
        he_frac: ArrayView<'_, f64, D>,
    ) -> Array<MixtureResult, D> {
        assert_eq!(log_p.shape(), log_t.shape());
        assert_eq!(log_p.shape(), he_frac.shape());
        Zip::from(&log_p)
            .and(&log_t)
            .and(&he_frac)
            .map_collect(|&p, &t, &y| self.evaluate(p, t, y))
    }

    /// Compute `quantity` over arrays of equal shape.
    pub fn compute<D: Dimension>(
        &self,
        quantity: MixtureQuantity,
        log_p: ArrayView<'_, f64, D>,
        log_t: ArrayView<'_, f64, D>,
        he_frac: ArrayView<'_, f64, D>,
    ) -> Array<f64, D> {
        assert_eq!(log_p.shape(), log_t.shape());
        assert_eq!(log_p.shape(), he_frac.shape());
        Zip::from(&log_p)
            .and(&log_t)
            .and(&he_frac)
            .map_collect(|&p, &t, &y| self.quantity(quantity, p, t, y))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use approx::assert_relative_eq;
    use ndarray::{arr1, Array3};

    use super::MixtureEos;
    use crate::{
        config::DerivativeSource,
        error::EosError,
        index::GridAxis,
        interp::Derivative,
        mixture::MixtureQuantity,
        species_tables::{Field, Species, SpeciesTable},
    };

    /// Analytic fields of a species as functions of (log P, log T): log rho,
    /// log U and log S with their partial derivatives.
    pub(crate) trait Model {
        fn log_rho(&self, p: f64, t: f64) -> f64;
        fn rho_p(&self, p: f64, t: f64) -> f64;
        fn rho_t(&self, p: f64, t: f64) -> f64;
        fn log_s(&self, p: f64, t: f64) -> f64;
        fn s_p(&self, p: f64, t: f64) -> f64;
        fn s_t(&self, p: f64, t: f64) -> f64;
    }

    /// Nearly ideal gas, with cubic terms that splines reproduce exactly.
    pub(crate) struct Cubic {
        pub rho0: f64,
        pub s0: f64,
        pub s_slope: f64,
    }

    impl Model for Cubic {
        fn log_rho(&self, p: f64, t: f64) -> f64 {
            self.rho0 + p - t + 0.01 * (p - 1.0).powi(3)
        }
        fn rho_p(&self, p: f64, _t: f64) -> f64 {
            1.0 + 0.03 * (p - 1.0).powi(2)
        }
        fn rho_t(&self, _p: f64, _t: f64) -> f64 {
            -1.0
        }
        fn log_s(&self, p: f64, t: f64) -> f64 {
            self.s0 + self.s_slope * (t - 0.4 * p) + 0.02 * (t - 6.0).powi(3)
        }
        fn s_p(&self, _p: f64, _t: f64) -> f64 {
            -0.4 * self.s_slope
        }
        fn s_t(&self, _p: f64, t: f64) -> f64 {
            self.s_slope + 0.06 * (t - 6.0).powi(2)
        }
    }

    /// Entropy equal to log P + log T.
    struct Planar;

    impl Model for Planar {
        fn log_rho(&self, p: f64, t: f64) -> f64 {
            p - t
        }
        fn rho_p(&self, _p: f64, _t: f64) -> f64 {
            1.0
        }
        fn rho_t(&self, _p: f64, _t: f64) -> f64 {
            -1.0
        }
        fn log_s(&self, p: f64, t: f64) -> f64 {
            p + t
        }
        fn s_p(&self, _p: f64, _t: f64) -> f64 {
            1.0
        }
        fn s_t(&self, _p: f64, _t: f64) -> f64 {
            1.0
        }
    }

    /// Smooth but not polynomial; the tabulated derivatives are exact while
    /// spline derivatives carry interpolation errors.
    struct Wavy;

    impl Model for Wavy {
        fn log_rho(&self, p: f64, t: f64) -> f64 {
            -1.0 + p - t + 0.1 * (2.0 * p).sin()
        }
        fn rho_p(&self, p: f64, _t: f64) -> f64 {
            1.0 + 0.2 * (2.0 * p).cos()
        }
        fn rho_t(&self, _p: f64, _t: f64) -> f64 {
            -1.0
        }
        fn log_s(&self, p: f64, t: f64) -> f64 {
            9.0 + 0.4 * t - 0.16 * p + 0.05 * (1.5 * t).cos()
        }
        fn s_p(&self, _p: f64, _t: f64) -> f64 {
            -0.16
        }
        fn s_t(&self, _p: f64, t: f64) -> f64 {
            0.4 - 0.075 * (1.5 * t).sin()
        }
    }

    pub(crate) fn logp_axis() -> GridAxis {
        GridAxis::new((0..17).map(|i| -2.0 + 0.25 * i as f64).collect()).unwrap()
    }

    pub(crate) fn logt_axis() -> GridAxis {
        GridAxis::new((0..13).map(|i| 5.0 + 0.25 * i as f64).collect()).unwrap()
    }

    pub(crate) fn table_of<M: Model>(species: Species, model: &M) -> SpeciesTable {
        let logp = logp_axis();
        let logt = logt_axis();
        let values = Array3::from_shape_fn(
            (logp.n_values(), logt.n_values(), Field::COUNT),
            |(i, j, k)| {
                let (p, t) = (logp.values()[i], logt.values()[j]);
                match Field::ALL[k] {
                    Field::LogTemperature => t,
                    Field::LogPressure => p,
                    Field::LogDensity => model.log_rho(p, t),
                    Field::LogEnergy => 12.0 + 0.5 * t,
                    Field::LogEntropy => model.log_s(p, t),
                    Field::DRhoDTPcst => model.rho_t(p, t),
                    Field::DRhoDPTcst => model.rho_p(p, t),
                    Field::DEntDTPcst => model.s_t(p, t),
                    Field::DEntDPTcst => model.s_p(p, t),
                }
            },
        );
        SpeciesTable::new(species, logp, logt, values)
    }

    pub(crate) const H_MODEL: Cubic = Cubic {
        rho0: -1.0,
        s0: 9.3,
        s_slope: 0.4,
    };
    pub(crate) const HE_MODEL: Cubic = Cubic {
        rho0: -0.4,
        s0: 8.8,
        s_slope: 0.3,
    };

    pub(crate) fn cubic_eos(derivatives: DerivativeSource) -> MixtureEos {
        MixtureEos::from_tables(
            table_of(Species::Hydrogen, &H_MODEL),
            table_of(Species::Helium, &HE_MODEL),
            derivatives,
        )
        .unwrap()
    }

    #[test]
    fn planar_entropy_scenario() {
        let eos = MixtureEos::from_tables(
            table_of(Species::Hydrogen, &Planar),
            table_of(Species::Helium, &Planar),
            DerivativeSource::Spline,
        )
        .unwrap();
        let at = |d| eos.lookup(Species::Hydrogen, Field::LogEntropy, d, 0.0, 6.0);
        assert_relative_eq!(at(Derivative::Value), 6.0, epsilon = 1e-12);
        assert_relative_eq!(at(Derivative::PartialY), 1.0, epsilon = 1e-12);
        assert_relative_eq!(at(Derivative::PartialX), 1.0, epsilon = 1e-12);
        assert_relative_eq!(eos.grad_ad(0.37, 6.11, 0.3), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn exact_at_grid_points() {
        let table = table_of(Species::Hydrogen, &Wavy);
        let expected = table.field(Field::LogDensity).to_owned();
        let (logp, logt) = (table.log_pressure().clone(), table.log_temperature().clone());
        let eos = MixtureEos::from_tables(
            table,
            table_of(Species::Helium, &Wavy),
            DerivativeSource::Spline,
        )
        .unwrap();
        for (i, &p) in logp.values().iter().enumerate() {
            for (j, &t) in logt.values().iter().enumerate() {
                let v = eos.lookup(Species::Hydrogen, Field::LogDensity, Derivative::Value, p, t);
                assert_relative_eq!(v, expected[[i, j]], max_relative = 1e-9);
            }
        }
    }

    #[test]
    fn pure_species_limits() {
        let eos = cubic_eos(DerivativeSource::Spline);
        let (p, t) = (0.33, 6.07);
        for (y, species) in [(0.0, Species::Hydrogen), (1.0, Species::Helium)] {
            let res = eos.evaluate(p, t, y);
            let logrho = eos.lookup(species, Field::LogDensity, Derivative::Value, p, t);
            let logs = eos.lookup(species, Field::LogEntropy, Derivative::Value, p, t);
            assert_relative_eq!(res.log_density, logrho, epsilon = 1e-12);
            assert_relative_eq!(res.log_entropy, logs, epsilon = 1e-12);
        }
        let res = eos.evaluate(p, t, 0.0);
        assert_relative_eq!(res.log_density, H_MODEL.log_rho(p, t), epsilon = 1e-10);
        assert_relative_eq!(
            res.grad_ad,
            -H_MODEL.s_p(p, t) / H_MODEL.s_t(p, t),
            epsilon = 1e-10
        );
    }

    #[test]
    fn mixture_density_lies_between_species() {
        let eos = cubic_eos(DerivativeSource::Spline);
        let (p, t) = (-0.71, 5.43);
        let rho_h = 10f64.powf(H_MODEL.log_rho(p, t));
        let rho_he = 10f64.powf(HE_MODEL.log_rho(p, t));
        for y in [0.05, 0.27, 0.5, 0.95] {
            let rho = 10f64.powf(eos.log_density(p, t, y));
            assert!(rho > rho_h && rho < rho_he);
        }
    }

    #[test]
    fn gamma3_identity_holds() {
        let eos = cubic_eos(DerivativeSource::Spline);
        for &(p, t, y) in &[(0.1, 5.2, 0.27), (1.3, 7.5, 0.6), (-1.9, 7.9, 0.0), (2.4, 4.8, 1.0)] {
            let res = eos.evaluate(p, t, y);
            assert_relative_eq!(res.gamma3 - 1.0, res.gamma1 * res.grad_ad, epsilon = 1e-13);
        }
    }

    #[test]
    fn derivative_sources_agree_on_cubic_tables() {
        let spline = cubic_eos(DerivativeSource::Spline);
        let table = cubic_eos(DerivativeSource::Table);
        assert_eq!(table.derivatives(), DerivativeSource::Table);
        let (p, t, y) = (0.61, 6.37, 0.27);
        let a = spline.evaluate(p, t, y);
        let b = table.evaluate(p, t, y);
        for q in MixtureQuantity::ALL {
            assert_relative_eq!(a.get(q), b.get(q), epsilon = 1e-9, max_relative = 1e-9);
        }
    }

    #[test]
    fn derivative_sources_differ_slightly_on_smooth_tables() {
        let eos = |source| {
            MixtureEos::from_tables(
                table_of(Species::Hydrogen, &Wavy),
                table_of(Species::Helium, &Wavy),
                source,
            )
            .unwrap()
        };
        let (spline, table) = (eos(DerivativeSource::Spline), eos(DerivativeSource::Table));
        let (p, t, y) = (0.13, 6.62, 0.27);
        let a = spline.grad_ad(p, t, y);
        let b = table.grad_ad(p, t, y);
        assert_ne!(a, b);
        assert_relative_eq!(a, b, max_relative = 5e-3);
        let exact = -Wavy.s_p(p, t) / Wavy.s_t(p, t);
        assert_relative_eq!(b, exact, max_relative = 5e-4);
    }

    #[test]
    fn tables_are_slotted_by_species() {
        let eos = MixtureEos::from_tables(
            table_of(Species::Helium, &HE_MODEL),
            table_of(Species::Hydrogen, &H_MODEL),
            DerivativeSource::Spline,
        )
        .unwrap();
        assert_eq!(eos.table(Species::Hydrogen).species(), Species::Hydrogen);
        let (p, t) = (0.3, 6.2);
        let logrho = eos.lookup(Species::Helium, Field::LogDensity, Derivative::Value, p, t);
        assert_relative_eq!(logrho, HE_MODEL.log_rho(p, t), epsilon = 1e-10);

        let err = MixtureEos::from_tables(
            table_of(Species::Hydrogen, &H_MODEL),
            table_of(Species::Hydrogen, &HE_MODEL),
            DerivativeSource::Spline,
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            EosError::MissingSpecies {
                species: Species::Helium
            }
        ));
    }

    #[test]
    fn axis_fields_reproduce_the_axes() {
        let eos = cubic_eos(DerivativeSource::Spline);
        let (p, t) = (-1.13, 7.41);
        let at = |field, d| eos.lookup(Species::Helium, field, d, p, t);
        assert_relative_eq!(at(Field::LogTemperature, Derivative::Value), t, epsilon = 1e-12);
        assert_relative_eq!(at(Field::LogPressure, Derivative::Value), p, epsilon = 1e-12);
        assert_relative_eq!(at(Field::LogPressure, Derivative::PartialX), 1.0, epsilon = 1e-12);
        assert_relative_eq!(at(Field::LogTemperature, Derivative::PartialX), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn extrapolates_beyond_the_tables() {
        let eos = cubic_eos(DerivativeSource::Spline);
        let (p, t) = (2.6, 8.4);
        assert!(!eos.table(Species::Hydrogen).log_pressure().contains(p));
        let res = eos.evaluate_checked(p, t, 0.0).expect("cubic tables extrapolate");
        assert_relative_eq!(res.log_density, H_MODEL.log_rho(p, t), epsilon = 1e-9);
    }

    #[test]
    fn log_entropy_matches_full_evaluation() {
        let eos = cubic_eos(DerivativeSource::Spline);
        let (p, t, y) = (-0.4, 6.9, 0.31);
        assert_relative_eq!(
            eos.log_entropy(p, t, y),
            eos.evaluate(p, t, y).log_entropy,
            epsilon = 1e-14
        );
    }

    #[test]
    fn loads_from_directory() {
        use crate::{config::EosConfig, loader::tests::synthetic_table};

        let dir = std::env::temp_dir().join("chabrier_eos_load_test");
        std::fs::create_dir_all(&dir).unwrap();
        let logts: Vec<f64> = (0..14).map(|i| 4.75 + 0.25 * i as f64).collect();
        let logps: Vec<f64> = (0..9).map(|i| -12.0 + 0.5 * i as f64).collect();
        // native units: P in GPa, S in MJ/kg/K
        let row = |model: &Cubic, p: f64, t: f64| {
            let q = p + 10.0;
            [
                model.log_rho(q, t),
                2.0,
                model.log_s(q, t) - 10.0,
                model.rho_t(q, t),
                model.rho_p(q, t),
                model.s_t(q, t),
                model.s_p(q, t),
            ]
        };
        let h_text = synthetic_table(&logts, &logps, |p, t| row(&H_MODEL, p, t));
        let he_text = synthetic_table(&logts, &logps, |p, t| row(&HE_MODEL, p, t));
        std::fs::write(dir.join("TABLE_H_TP_v1"), h_text).unwrap();
        std::fs::write(dir.join("TABLE_HE_TP_v1"), he_text).unwrap();

        let eos = MixtureEos::new(&EosConfig::new(&dir)).expect("tables are well-formed");
        let logt = eos.table(Species::Helium).log_temperature();
        assert_eq!(logt.n_values(), 13);
        assert_relative_eq!(logt.first(), 5.0);
        let logp = eos.table(Species::Hydrogen).log_pressure();
        assert_relative_eq!(logp.first(), -2.0, epsilon = 1e-12);
        assert_relative_eq!(logp.last(), 2.0, epsilon = 1e-12);

        let (p, t) = (0.35, 6.4);
        let res = eos.evaluate(p, t, 1.0);
        assert_relative_eq!(res.log_density, HE_MODEL.log_rho(p, t), epsilon = 1e-8);
        assert_relative_eq!(res.log_entropy, HE_MODEL.log_s(p, t), epsilon = 1e-8);
    }

    #[test]
    fn array_evaluation_is_elementwise() {
        let eos = cubic_eos(DerivativeSource::Spline);
        let logp = arr1(&[-1.0, 0.4, 1.7]);
        let logt = arr1(&[5.1, 6.0, 7.3]);
        let y = arr1(&[0.0, 0.27, 1.0]);
        let gamma1 = eos.compute(MixtureQuantity::Gamma1, logp.view(), logt.view(), y.view());
        let results = eos.evaluate_many(logp.view(), logt.view(), y.view());
        for i in 0..3 {
            assert_eq!(gamma1[i], eos.gamma1(logp[i], logt[i], y[i]));
            assert_eq!(results[i], eos.evaluate(logp[i], logt[i], y[i]));
        }
    }
}
