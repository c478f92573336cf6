//! Thermodynamics of a hydrogen-helium mixture from the pure species.
//!
//! Entropies add linearly with the mass fractions and volumes add linearly
//! (additive-volume law), so both are combined in linear space. Logarithmic
//! derivatives then mix with weights given by the contribution of each
//! species to the total entropy or specific volume.

use tracing::warn;

use crate::error::{EosError, Result};

/// Interpolated state of a pure species at some (log P, log T).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpeciesSample {
    pub log_entropy: f64,
    /// d log(S) / d log(P) at constant T.
    pub dlogs_dlogp: f64,
    /// d log(S) / d log(T) at constant P.
    pub dlogs_dlogt: f64,
    pub log_density: f64,
    /// d log(rho) / d log(P) at constant T.
    pub dlogrho_dlogp: f64,
    /// d log(rho) / d log(T) at constant P.
    pub dlogrho_dlogt: f64,
}

/// Quantities computed for a mixture.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MixtureQuantity {
    GradAd,
    LogDensity,
    LogEntropy,
    LogEntropyH,
    LogEntropyHe,
    Gamma1,
    Gamma3,
    ChiRho,
    ChiT,
    ChiY,
    DensityH,
    DensityHe,
    DLogRhoDLogP,
    DLogRhoDLogT,
    Cp,
    Cv,
    SoundSpeed,
}

impl MixtureQuantity {
    pub const ALL: [MixtureQuantity; 17] = [
        MixtureQuantity::GradAd,
        MixtureQuantity::LogDensity,
        MixtureQuantity::LogEntropy,
        MixtureQuantity::LogEntropyH,
        MixtureQuantity::LogEntropyHe,
        MixtureQuantity::Gamma1,
        MixtureQuantity::Gamma3,
        MixtureQuantity::ChiRho,
        MixtureQuantity::ChiT,
        MixtureQuantity::ChiY,
        MixtureQuantity::DensityH,
        MixtureQuantity::DensityHe,
        MixtureQuantity::DLogRhoDLogP,
        MixtureQuantity::DLogRhoDLogT,
        MixtureQuantity::Cp,
        MixtureQuantity::Cv,
        MixtureQuantity::SoundSpeed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MixtureQuantity::GradAd => "grada",
            MixtureQuantity::LogDensity => "logrho",
            MixtureQuantity::LogEntropy => "logs",
            MixtureQuantity::LogEntropyH => "logs_h",
            MixtureQuantity::LogEntropyHe => "logs_he",
            MixtureQuantity::Gamma1 => "gamma1",
            MixtureQuantity::Gamma3 => "gamma3",
            MixtureQuantity::ChiRho => "chirho",
            MixtureQuantity::ChiT => "chit",
            MixtureQuantity::ChiY => "chiy",
            MixtureQuantity::DensityH => "rho_h",
            MixtureQuantity::DensityHe => "rho_he",
            MixtureQuantity::DLogRhoDLogP => "rhop",
            MixtureQuantity::DLogRhoDLogT => "rhot",
            MixtureQuantity::Cp => "cp",
            MixtureQuantity::Cv => "cv",
            MixtureQuantity::SoundSpeed => "csound",
        }
    }
}

/// Thermodynamic state of a mixture at given (log P, log T, Y).
///
/// Nothing is clamped: a query outside of the physical domain shows up as
/// non-finite values, see [`MixtureResult::check_finite`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MixtureResult {
    /// Adiabatic gradient d log(T) / d log(P) at constant S.
    pub grad_ad: f64,
    pub log_density: f64,
    pub log_entropy: f64,
    pub log_entropy_h: f64,
    pub log_entropy_he: f64,
    pub gamma1: f64,
    pub gamma3: f64,
    /// d ln(P) / d ln(rho) at constant T.
    pub chi_rho: f64,
    /// d ln(P) / d ln(T) at constant rho.
    pub chi_t: f64,
    /// d ln(rho) / d ln(Y) at constant P and T.
    pub chi_y: f64,
    pub density_h: f64,
    pub density_he: f64,
    /// d log(rho) / d log(P) at constant T.
    pub dlogrho_dlogp: f64,
    /// d log(rho) / d log(T) at constant P.
    pub dlogrho_dlogt: f64,
    pub cp: f64,
    pub cv: f64,
    pub sound_speed: f64,
}

impl MixtureResult {
    pub fn get(&self, quantity: MixtureQuantity) -> f64 {
        match quantity {
            MixtureQuantity::GradAd => self.grad_ad,
            MixtureQuantity::LogDensity => self.log_density,
            MixtureQuantity::LogEntropy => self.log_entropy,
            MixtureQuantity::LogEntropyH => self.log_entropy_h,
            MixtureQuantity::LogEntropyHe => self.log_entropy_he,
            MixtureQuantity::Gamma1 => self.gamma1,
            MixtureQuantity::Gamma3 => self.gamma3,
            MixtureQuantity::ChiRho => self.chi_rho,
            MixtureQuantity::ChiT => self.chi_t,
            MixtureQuantity::ChiY => self.chi_y,
            MixtureQuantity::DensityH => self.density_h,
            MixtureQuantity::DensityHe => self.density_he,
            MixtureQuantity::DLogRhoDLogP => self.dlogrho_dlogp,
            MixtureQuantity::DLogRhoDLogT => self.dlogrho_dlogt,
            MixtureQuantity::Cp => self.cp,
            MixtureQuantity::Cv => self.cv,
            MixtureQuantity::SoundSpeed => self.sound_speed,
        }
    }

    /// Fail with the first quantity that is not finite.
    pub fn check_finite(self) -> Result<Self> {
        match MixtureQuantity::ALL
            .into_iter()
            .find(|&q| !self.get(q).is_finite())
        {
            Some(q) => {
                let value = self.get(q);
                warn!(quantity = q.name(), value, "non-finite mixture quantity");
                Err(EosError::Domain {
                    quantity: q.name(),
                    value,
                })
            }
            None => Ok(self),
        }
    }
}

/// Entropy of the mixture, in linear space.
pub(crate) fn mix_entropy(log_s_h: f64, log_s_he: f64, he_frac: f64) -> f64 {
    (1.0 - he_frac) * 10f64.powf(log_s_h) + he_frac * 10f64.powf(log_s_he)
}

/// Combine the two pure species at pressure `log_p` and helium mass
/// fraction `he_frac`.
pub fn mix(h: &SpeciesSample, he: &SpeciesSample, log_p: f64, he_frac: f64) -> MixtureResult {
    let x_frac = 1.0 - he_frac;

    let s_h = 10f64.powf(h.log_entropy);
    let s_he = 10f64.powf(he.log_entropy);
    let s = x_frac * s_h + he_frac * s_he;
    let w_s_h = x_frac * s_h / s;
    let w_s_he = he_frac * s_he / s;
    let s_t = w_s_h * h.dlogs_dlogt + w_s_he * he.dlogs_dlogt;
    let s_p = w_s_h * h.dlogs_dlogp + w_s_he * he.dlogs_dlogp;
    let grad_ad = -s_p / s_t;

    let rho_h = 10f64.powf(h.log_density);
    let rho_he = 10f64.powf(he.log_density);
    let rho = 1.0 / (he_frac / rho_he + x_frac / rho_h);
    let w_v_h = x_frac * rho / rho_h;
    let w_v_he = he_frac * rho / rho_he;
    let rho_t = w_v_h * h.dlogrho_dlogt + w_v_he * he.dlogrho_dlogt;
    let rho_p = w_v_h * h.dlogrho_dlogp + w_v_he * he.dlogrho_dlogp;

    let chi_rho = 1.0 / rho_p;
    let chi_t = -rho_t / rho_p;
    let chi_y = -rho * he_frac * (1.0 / rho_he - 1.0 / rho_h);

    let gamma1 = chi_rho / (1.0 - chi_t * grad_ad);
    let gamma3 = 1.0 + gamma1 * grad_ad;
    let cp = s * s_t;
    // Unno et al. (1989), eq. 13.87
    let cv = cp * chi_rho / gamma1;
    let sound_speed = (10f64.powf(log_p) / rho * gamma1).sqrt();

    MixtureResult {
        grad_ad,
        log_density: rho.log10(),
        log_entropy: s.log10(),
        log_entropy_h: h.log_entropy,
        log_entropy_he: he.log_entropy,
        gamma1,
        gamma3,
        chi_rho,
        chi_t,
        chi_y,
        density_h: rho_h,
        density_he: rho_he,
        dlogrho_dlogp: rho_p,
        dlogrho_dlogt: rho_t,
        cp,
        cv,
        sound_speed,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{mix, mix_entropy, MixtureQuantity, MixtureResult, SpeciesSample};
    use crate::error::EosError;

    /// Ideal-gas like hydrogen: rho ~ P/T, S ~ T^0.4 / P^0.16.
    const HYDROGEN: SpeciesSample = SpeciesSample {
        log_entropy: 9.3,
        dlogs_dlogp: -0.16,
        dlogs_dlogt: 0.4,
        log_density: -1.2,
        dlogrho_dlogp: 1.0,
        dlogrho_dlogt: -1.0,
    };

    const HELIUM: SpeciesSample = SpeciesSample {
        log_entropy: 8.8,
        dlogs_dlogp: -0.08,
        dlogs_dlogt: 0.2,
        log_density: -0.6,
        dlogrho_dlogp: 0.9,
        dlogrho_dlogt: -0.8,
    };

    #[test]
    fn pure_hydrogen_limit() {
        let res = mix(&HYDROGEN, &HELIUM, 12.0, 0.0);
        assert_relative_eq!(res.log_density, HYDROGEN.log_density, epsilon = 1e-12);
        assert_relative_eq!(res.log_entropy, HYDROGEN.log_entropy, epsilon = 1e-12);
        assert_relative_eq!(res.grad_ad, 0.4, epsilon = 1e-12);
        assert_relative_eq!(res.chi_rho, 1.0, epsilon = 1e-12);
        assert_relative_eq!(res.chi_t, 1.0, epsilon = 1e-12);
        assert_relative_eq!(res.chi_y, 0.0);
        assert_relative_eq!(res.gamma1, 1.0 / 0.6, epsilon = 1e-12);
    }

    #[test]
    fn pure_helium_limit() {
        let res = mix(&HYDROGEN, &HELIUM, 12.0, 1.0);
        assert_relative_eq!(res.log_density, HELIUM.log_density, epsilon = 1e-12);
        assert_relative_eq!(res.log_entropy, HELIUM.log_entropy, epsilon = 1e-12);
        assert_relative_eq!(res.grad_ad, 0.4, epsilon = 1e-12);
        assert_relative_eq!(res.dlogrho_dlogp, 0.9, epsilon = 1e-12);
        assert_relative_eq!(res.dlogrho_dlogt, -0.8, epsilon = 1e-12);
        assert!(res.check_finite().is_ok());
    }

    #[test]
    fn density_is_weighted_harmonic_mean() {
        let rho_h = 10f64.powf(HYDROGEN.log_density);
        let rho_he = 10f64.powf(HELIUM.log_density);
        for y in [0.1, 0.275, 0.5, 0.9] {
            let res = mix(&HYDROGEN, &HELIUM, 12.0, y);
            let rho = 10f64.powf(res.log_density);
            assert!(rho > rho_h && rho < rho_he);
            assert_relative_eq!(1.0 / rho, y / rho_he + (1.0 - y) / rho_h, max_relative = 1e-12);
            assert_relative_eq!(res.density_h, rho_h);
            assert_relative_eq!(res.density_he, rho_he);
        }
    }

    #[test]
    fn entropy_mixes_linearly() {
        let y = 0.3;
        let res = mix(&HYDROGEN, &HELIUM, 12.0, y);
        let expected = 0.7 * 10f64.powf(9.3) + 0.3 * 10f64.powf(8.8);
        assert_relative_eq!(10f64.powf(res.log_entropy), expected, max_relative = 1e-12);
        assert_relative_eq!(
            mix_entropy(HYDROGEN.log_entropy, HELIUM.log_entropy, y),
            expected,
            max_relative = 1e-12
        );
        assert_eq!(res.log_entropy_h, 9.3);
        assert_eq!(res.log_entropy_he, 8.8);
    }

    #[test]
    fn response_coefficients_are_consistent() {
        for y in [0.0, 0.25, 0.6, 1.0] {
            let res = mix(&HYDROGEN, &HELIUM, 11.5, y);
            assert_relative_eq!(res.gamma3 - 1.0, res.gamma1 * res.grad_ad, epsilon = 1e-14);
            assert_relative_eq!(res.chi_rho * res.dlogrho_dlogp, 1.0, epsilon = 1e-14);
            assert_relative_eq!(res.chi_t, -res.dlogrho_dlogt * res.chi_rho, epsilon = 1e-14);
            assert_relative_eq!(res.cv * res.gamma1, res.cp * res.chi_rho, max_relative = 1e-12);
            let rho = 10f64.powf(res.log_density);
            assert_relative_eq!(
                res.sound_speed * res.sound_speed,
                10f64.powf(11.5) / rho * res.gamma1,
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn chi_y_sign_follows_density_contrast() {
        // helium is denser: adding helium raises the density
        let res = mix(&HYDROGEN, &HELIUM, 12.0, 0.27);
        assert!(res.chi_y > 0.0);
    }

    #[test]
    fn non_finite_results_are_reported() {
        let cold = SpeciesSample {
            dlogs_dlogt: 0.0,
            ..HYDROGEN
        };
        let res = mix(&cold, &cold, 12.0, 0.5);
        assert!(!res.grad_ad.is_finite());
        let err = res.check_finite().unwrap_err();
        assert!(matches!(err, EosError::Domain { quantity: "grada", .. }));
    }

    #[test]
    fn quantities_are_reachable_by_name() {
        let res: MixtureResult = mix(&HYDROGEN, &HELIUM, 12.0, 0.27);
        assert_eq!(res.get(MixtureQuantity::Gamma1), res.gamma1);
        assert_eq!(res.get(MixtureQuantity::SoundSpeed), res.sound_speed);
        let mut names: Vec<_> = MixtureQuantity::ALL.iter().map(|q| q.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), MixtureQuantity::ALL.len());
    }
}
