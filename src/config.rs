use std::path::{Path, PathBuf};

pub const HYDROGEN_TABLE: &str = "TABLE_H_TP_v1";
pub const HELIUM_TABLE: &str = "TABLE_HE_TP_v1";

/// Where the per-species partial derivatives of log(S) and log(rho) come
/// from.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DerivativeSource {
    /// Differentiate the splines of log(S) and log(rho). Adiabatic gradients
    /// obtained this way integrate to isentropic profiles more faithfully.
    #[default]
    Spline,
    /// Interpolate the tabulated partial-derivative columns.
    Table,
}

/// Construction parameters of a [`crate::eos::MixtureEos`].
#[derive(Clone, Debug)]
pub struct EosConfig {
    pub table_root: PathBuf,
    pub hydrogen_file: String,
    pub helium_file: String,
    pub derivatives: DerivativeSource,
    /// Expected number of pressures per isotherm, inferred from the first
    /// retained isotherm if unset. Isotherms below the temperature cutoff
    /// are skipped unchecked.
    pub n_pressures: Option<usize>,
}

impl EosConfig {
    pub fn new(table_root: impl Into<PathBuf>) -> Self {
        Self {
            table_root: table_root.into(),
            hydrogen_file: HYDROGEN_TABLE.to_owned(),
            helium_file: HELIUM_TABLE.to_owned(),
            derivatives: DerivativeSource::default(),
            n_pressures: None,
        }
    }

    pub fn with_derivatives(mut self, derivatives: DerivativeSource) -> Self {
        self.derivatives = derivatives;
        self
    }

    pub fn with_n_pressures(mut self, n_pressures: usize) -> Self {
        self.n_pressures = Some(n_pressures);
        self
    }

    pub fn with_file_names(mut self, hydrogen: impl Into<String>, helium: impl Into<String>) -> Self {
        self.hydrogen_file = hydrogen.into();
        self.helium_file = helium.into();
        self
    }

    pub fn hydrogen_path(&self) -> PathBuf {
        self.table_root.join(&self.hydrogen_file)
    }

    pub fn helium_path(&self) -> PathBuf {
        self.table_root.join(&self.helium_file)
    }

    pub fn table_root(&self) -> &Path {
        &self.table_root
    }
}
