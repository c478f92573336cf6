use std::{path::PathBuf, sync::Arc};

use chabrier_eos::{
    config::{DerivativeSource, EosConfig},
    eos::MixtureEos,
    error::EosError,
    mixture::MixtureQuantity,
};
use ndarray::{Array, IxDyn};
use numpy::{IntoPyArray, PyArrayDyn, PyReadonlyArrayDyn};
use pyo3::{
    exceptions::{PyFileNotFoundError, PyKeyError, PyValueError},
    prelude::*,
    types::PyDict,
};

/// Environment variable holding the root of the EOS data.
const DATA_PATH_VAR: &str = "ongp_data_path";
const TABLE_DIR: &str = "DirEOS2019";

fn to_py_err(err: EosError) -> PyErr {
    match err {
        EosError::DataNotFound { .. } => PyFileNotFoundError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

fn quantity_named(name: &str) -> PyResult<MixtureQuantity> {
    MixtureQuantity::ALL
        .into_iter()
        .find(|q| q.name() == name)
        .ok_or_else(|| PyKeyError::new_err(name.to_owned()))
}

/// Equation of state of hydrogen-helium mixtures from the CMS19 tables.
#[pyclass(frozen)]
pub struct Eos(Arc<MixtureEos>);

#[pymethods]
impl Eos {
    #[new]
    #[pyo3(signature = (path_to_data=None, table_derivatives=false))]
    fn new(path_to_data: Option<PathBuf>, table_derivatives: bool) -> PyResult<Self> {
        let root = match path_to_data {
            Some(path) => path,
            None => std::env::var_os(DATA_PATH_VAR)
                .map(PathBuf::from)
                .ok_or_else(|| {
                    PyValueError::new_err(format!("{DATA_PATH_VAR} is not set"))
                })?,
        };
        let derivatives = if table_derivatives {
            DerivativeSource::Table
        } else {
            DerivativeSource::Spline
        };
        let config = EosConfig::new(root.join(TABLE_DIR)).with_derivatives(derivatives);
        let eos = MixtureEos::new(&config).map_err(to_py_err)?;
        Ok(Self(eos.into()))
    }

    /// All mixture quantities, keyed by name.
    fn get<'py>(
        &self,
        py: Python<'py>,
        logp: PyReadonlyArrayDyn<'py, f64>,
        logt: PyReadonlyArrayDyn<'py, f64>,
        y: f64,
    ) -> PyResult<Bound<'py, PyDict>> {
        let (logp, logt) = (logp.as_array(), logt.as_array());
        if logp.shape() != logt.shape() {
            return Err(PyValueError::new_err("logp and logt differ in shape"));
        }
        let y = Array::from_elem(logp.raw_dim(), y);
        let results = self.0.evaluate_many(logp, logt, y.view());
        let out = PyDict::new(py);
        for q in MixtureQuantity::ALL {
            let values = results.mapv(|res| res.get(q));
            out.set_item(q.name(), values.into_pyarray(py))?;
        }
        Ok(out)
    }

    /// A single mixture quantity, by name (e.g. `"grada"`).
    fn quantity<'py>(
        &self,
        py: Python<'py>,
        name: &str,
        logp: PyReadonlyArrayDyn<'py, f64>,
        logt: PyReadonlyArrayDyn<'py, f64>,
        y: f64,
    ) -> PyResult<Bound<'py, PyArrayDyn<f64>>> {
        let quantity = quantity_named(name)?;
        let (logp, logt) = (logp.as_array(), logt.as_array());
        if logp.shape() != logt.shape() {
            return Err(PyValueError::new_err("logp and logt differ in shape"));
        }
        let y = Array::<f64, IxDyn>::from_elem(logp.raw_dim(), y);
        let out = self.0.compute(quantity, logp, logt, y.view());
        Ok(out.into_pyarray(py))
    }

    fn get_grada<'py>(
        &self,
        py: Python<'py>,
        logp: PyReadonlyArrayDyn<'py, f64>,
        logt: PyReadonlyArrayDyn<'py, f64>,
        y: f64,
    ) -> PyResult<Bound<'py, PyArrayDyn<f64>>> {
        self.quantity(py, MixtureQuantity::GradAd.name(), logp, logt, y)
    }

    fn get_logrho<'py>(
        &self,
        py: Python<'py>,
        logp: PyReadonlyArrayDyn<'py, f64>,
        logt: PyReadonlyArrayDyn<'py, f64>,
        y: f64,
    ) -> PyResult<Bound<'py, PyArrayDyn<f64>>> {
        self.quantity(py, MixtureQuantity::LogDensity.name(), logp, logt, y)
    }

    fn get_gamma1<'py>(
        &self,
        py: Python<'py>,
        logp: PyReadonlyArrayDyn<'py, f64>,
        logt: PyReadonlyArrayDyn<'py, f64>,
        y: f64,
    ) -> PyResult<Bound<'py, PyArrayDyn<f64>>> {
        self.quantity(py, MixtureQuantity::Gamma1.name(), logp, logt, y)
    }

    /// Log entropy of the mixture, skipping the derivatives.
    fn get_logs<'py>(
        &self,
        py: Python<'py>,
        logp: PyReadonlyArrayDyn<'py, f64>,
        logt: PyReadonlyArrayDyn<'py, f64>,
        y: f64,
    ) -> PyResult<Bound<'py, PyArrayDyn<f64>>> {
        let (logp, logt) = (logp.as_array(), logt.as_array());
        if logp.shape() != logt.shape() {
            return Err(PyValueError::new_err("logp and logt differ in shape"));
        }
        let out = ndarray::Zip::from(&logp)
            .and(&logt)
            .map_collect(|&p, &t| self.0.log_entropy(p, t, y));
        Ok(out.into_pyarray(py))
    }
}
