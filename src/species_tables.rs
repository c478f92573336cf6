use ndarray::{Array3, ArrayView2, Axis};

use crate::index::GridAxis;

/// The two pure species of the mixture.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Species {
    Hydrogen,
    Helium,
}

impl Species {
    pub fn name(self) -> &'static str {
        match self {
            Species::Hydrogen => "hydrogen",
            Species::Helium => "helium",
        }
    }
}

/// Tabulated quantities, in the column order of the table files.
///
/// All values are in log10; derivatives are logarithmic derivatives.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Field {
    LogTemperature,
    LogPressure,
    LogDensity,
    LogEnergy,
    LogEntropy,
    /// d log(rho) / d log(T) at constant P.
    DRhoDTPcst,
    /// d log(rho) / d log(P) at constant T.
    DRhoDPTcst,
    /// d log(S) / d log(T) at constant P.
    DEntDTPcst,
    /// d log(S) / d log(P) at constant T.
    DEntDPTcst,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::LogTemperature,
        Field::LogPressure,
        Field::LogDensity,
        Field::LogEnergy,
        Field::LogEntropy,
        Field::DRhoDTPcst,
        Field::DRhoDPTcst,
        Field::DEntDTPcst,
        Field::DEntDPTcst,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Shift applied when loading, converting GPa and MJ/kg based units to
    /// cgs.
    pub(crate) fn log_offset(self) -> f64 {
        match self {
            // 1 GPa = 1e10 Ba, 1 MJ/kg = 1e10 erg/g
            Field::LogPressure | Field::LogEnergy | Field::LogEntropy => 10.0,
            _ => 0.0,
        }
    }
}

/// Tabulated EOS of a pure species on a (log P, log T) grid.
#[derive(Clone, Debug)]
pub struct SpeciesTable {
    species: Species,
    log_pressure: GridAxis,
    log_temperature: GridAxis,
    /// Table indexed by pressure, temperature, and field
    values: Array3<f64>,
}

impl SpeciesTable {
    pub(crate) fn new(
        species: Species,
        log_pressure: GridAxis,
        log_temperature: GridAxis,
        values: Array3<f64>,
    ) -> Self {
        assert_eq!(
            values.dim(),
            (
                log_pressure.n_values(),
                log_temperature.n_values(),
                Field::COUNT
            )
        );
        Self {
            species,
            log_pressure,
            log_temperature,
            values,
        }
    }

    pub fn species(&self) -> Species {
        self.species
    }

    pub fn log_pressure(&self) -> &GridAxis {
        &self.log_pressure
    }

    pub fn log_temperature(&self) -> &GridAxis {
        &self.log_temperature
    }

    /// Values of `field`, indexed by pressure and temperature.
    pub fn field(&self, field: Field) -> ArrayView2<'_, f64> {
        self.values.index_axis(Axis(2), field as usize)
    }
}
