use pyo3::prelude::*;

mod eos;

#[pymodule]
#[pyo3(name = "chabrier_eos")]
fn py_module(pymod: &Bound<'_, PyModule>) -> PyResult<()> {
    pymod.add_class::<eos::Eos>()?;
    pymod.add("__version__", chabrier_eos::VERSION)?;
    Ok(())
}
