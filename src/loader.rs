//! Reading of the per-species (log P, log T) EOS tables.
//!
//! A table file is a sequence of isotherms. Each isotherm starts with a
//! comment line holding `=` whose last `=`-delimited field is the log
//! temperature, followed by one row per pressure:
//!
//! ```text
//! #iT= 61 log T= 5.00
//! #log T [K]  log P [GPa]  log rho [g/cc]  log U [MJ/kg]  log S [MJ/kg/K]  ...
//!  5.00  -9.00  -11.27  1.93  -0.38  -1.00  1.00  0.20  -0.07
//! ```
//!
//! Other comment lines and blank lines are ignored, as are trailing columns
//! past the ninth.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use ndarray::Array3;
use tracing::debug;

use crate::{
    config::EosConfig,
    error::{EosError, Result},
    index::GridAxis,
    is_close::IsClose,
    species_tables::{Field, Species, SpeciesTable},
};

/// Isotherms below this log temperature are discarded.
pub const LOG_T_CUTOFF: f64 = 5.0;

fn above_cutoff(logt: f64) -> bool {
    logt >= LOG_T_CUTOFF || logt.is_close(LOG_T_CUTOFF)
}

/// Isotherms of the hydrogen table kept in the grid.
///
/// The helium table is read through the same index so that both grids are
/// built from matching isotherms.
#[derive(Clone, Debug, PartialEq)]
pub struct IsothermIndex {
    /// Header temperature of every isotherm in the file.
    header_log_t: Vec<f64>,
    /// Positions of the retained isotherms in the file.
    retained: Vec<usize>,
}

impl IsothermIndex {
    fn from_headers(header_log_t: Vec<f64>) -> Self {
        let retained = header_log_t
            .iter()
            .enumerate()
            .filter(|(_, logt)| above_cutoff(**logt))
            .map(|(i, _)| i)
            .collect();
        Self {
            header_log_t,
            retained,
        }
    }

    pub fn n_isotherms(&self) -> usize {
        self.header_log_t.len()
    }

    pub fn n_retained(&self) -> usize {
        self.retained.len()
    }

    fn keeps(&self, ordinal: usize) -> bool {
        self.retained.binary_search(&ordinal).is_ok()
    }

    fn retained_log_t(&self) -> impl Iterator<Item = f64> + '_ {
        self.retained.iter().map(|&i| self.header_log_t[i])
    }
}

struct Isotherm {
    header_line: usize,
    rows: Vec<[f64; Field::COUNT]>,
}

/// Result of a pass over a table file.
struct Scan {
    header_log_t: Vec<f64>,
    isotherms: Vec<Isotherm>,
}

fn parse_header_log_t(line: &str) -> Option<f64> {
    line.rsplit('=').next()?.split_whitespace().next()?.parse().ok()
}

fn parse_row(line: &str) -> Option<[f64; Field::COUNT]> {
    let mut row = [0.0; Field::COUNT];
    let mut columns = line.split_whitespace();
    for value in row.iter_mut() {
        *value = columns.next()?.parse().ok()?;
    }
    Some(row)
}

/// Collect all isotherm headers, and the data rows of isotherms for which
/// `keep` holds.
fn scan<R, F>(reader: R, path: &Path, keep: F) -> Result<Scan>
where
    R: BufRead,
    F: Fn(usize, f64) -> bool,
{
    let mut header_log_t = Vec::new();
    let mut isotherms = Vec::new();
    // whether the rows of the current isotherm are collected
    let mut collecting = None;
    for (iline, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| EosError::io(path, e))?;
        let lineno = iline + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('#') {
            if !trimmed.contains('=') {
                continue;
            }
            let logt = parse_header_log_t(trimmed).ok_or_else(|| {
                EosError::format(path, lineno, "isotherm header has no numeric temperature")
            })?;
            let kept = keep(header_log_t.len(), logt);
            header_log_t.push(logt);
            if kept {
                isotherms.push(Isotherm {
                    header_line: lineno,
                    rows: Vec::new(),
                });
            }
            collecting = Some(kept);
            continue;
        }
        match collecting {
            None => {
                return Err(EosError::format(
                    path,
                    lineno,
                    "data row before the first isotherm header",
                ))
            }
            Some(false) => {}
            Some(true) => {
                let row = parse_row(trimmed).ok_or_else(|| {
                    EosError::format(
                        path,
                        lineno,
                        format!("expected {} numeric columns", Field::COUNT),
                    )
                })?;
                if let Some(isotherm) = isotherms.last_mut() {
                    isotherm.rows.push(row);
                }
            }
        }
    }
    Ok(Scan {
        header_log_t,
        isotherms,
    })
}

/// Assemble retained isotherms into a grid, applying the unit offsets.
fn assemble(
    species: Species,
    path: &Path,
    isotherms: &[Isotherm],
    n_pressures: Option<usize>,
) -> Result<SpeciesTable> {
    let last = isotherms
        .last()
        .ok_or_else(|| EosError::format(path, 0, "no isotherm above the temperature cutoff"))?;
    let n_pressures = n_pressures.unwrap_or(isotherms[0].rows.len());
    if let Some(iso) = isotherms.iter().find(|iso| iso.rows.len() != n_pressures) {
        return Err(EosError::format(
            path,
            iso.header_line,
            format!(
                "isotherm has {} rows, expected {n_pressures}",
                iso.rows.len()
            ),
        ));
    }

    let offset = Field::LogPressure.log_offset();
    let logp: Vec<f64> = last
        .rows
        .iter()
        .map(|row| row[Field::LogPressure as usize] + offset)
        .collect();
    for iso in isotherms {
        let pressures: Vec<f64> = iso
            .rows
            .iter()
            .map(|row| row[Field::LogPressure as usize] + offset)
            .collect();
        if !pressures.as_slice().is_close(&logp) {
            return Err(EosError::format(
                path,
                iso.header_line,
                "pressures differ from those of the last isotherm",
            ));
        }
    }
    let log_pressure = GridAxis::new(logp)
        .map_err(|e| EosError::format(path, last.header_line, format!("pressure axis: {e}")))?;

    let logt = isotherms
        .iter()
        .map(|iso| iso.rows[0][Field::LogTemperature as usize])
        .collect();
    let log_temperature = GridAxis::new(logt)
        .map_err(|e| EosError::format(path, 0, format!("temperature axis: {e}")))?;

    let mut values = Array3::zeros((n_pressures, isotherms.len(), Field::COUNT));
    for (it, iso) in isotherms.iter().enumerate() {
        for (ip, row) in iso.rows.iter().enumerate() {
            for field in Field::ALL {
                values[[ip, it, field as usize]] = row[field as usize] + field.log_offset();
            }
        }
    }
    Ok(SpeciesTable::new(
        species,
        log_pressure,
        log_temperature,
        values,
    ))
}

/// Read the hydrogen table, deciding which isotherms are retained.
pub(crate) fn read_hydrogen<R: BufRead>(
    reader: R,
    path: &Path,
    n_pressures: Option<usize>,
) -> Result<(SpeciesTable, IsothermIndex)> {
    let scan = scan(reader, path, |_, logt| above_cutoff(logt))?;
    let index = IsothermIndex::from_headers(scan.header_log_t);
    let table = assemble(Species::Hydrogen, path, &scan.isotherms, n_pressures)?;
    debug!(
        path = %path.display(),
        isotherms = index.n_isotherms(),
        retained = index.n_retained(),
        pressures = table.log_pressure().n_values(),
        "read hydrogen EOS table"
    );
    Ok((table, index))
}

/// Read the helium table through the isotherm index of the hydrogen table.
pub(crate) fn read_helium<R: BufRead>(
    reader: R,
    path: &Path,
    index: &IsothermIndex,
    n_pressures: Option<usize>,
) -> Result<SpeciesTable> {
    let scan = scan(reader, path, |ordinal, _| index.keeps(ordinal))?;
    if scan.header_log_t.len() != index.n_isotherms() {
        return Err(EosError::format(
            path,
            0,
            format!(
                "{} isotherms but the hydrogen table has {}",
                scan.header_log_t.len(),
                index.n_isotherms()
            ),
        ));
    }
    let mismatch = scan
        .isotherms
        .iter()
        .zip(index.retained.iter().map(|&i| scan.header_log_t[i]))
        .zip(index.retained_log_t())
        .find(|((_, he), h)| !he.is_close(*h));
    if let Some(((iso, he), h)) = mismatch {
        return Err(EosError::format(
            path,
            iso.header_line,
            format!("isotherm at log T = {he} where the hydrogen table has {h}"),
        ));
    }
    let table = assemble(Species::Helium, path, &scan.isotherms, n_pressures)?;
    debug!(
        path = %path.display(),
        retained = scan.isotherms.len(),
        pressures = table.log_pressure().n_values(),
        "read helium EOS table"
    );
    Ok(table)
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| EosError::io(path, e))
}

/// Load the hydrogen and helium tables described by `config`.
pub fn load(config: &EosConfig) -> Result<(SpeciesTable, SpeciesTable)> {
    let root = config.table_root();
    if !root.is_dir() {
        return Err(EosError::DataNotFound {
            path: root.to_path_buf(),
        });
    }
    let h_path = config.hydrogen_path();
    let he_path = config.helium_path();
    let (hydrogen, index) = read_hydrogen(open(&h_path)?, &h_path, config.n_pressures)?;
    let helium = read_helium(open(&he_path)?, &he_path, &index, config.n_pressures)?;
    Ok((hydrogen, helium))
}

/// Load the tables found under `table_root` with the standard file names.
pub fn load_dir(table_root: impl AsRef<Path>) -> Result<(SpeciesTable, SpeciesTable)> {
    load(&EosConfig::new(table_root.as_ref()))
}
