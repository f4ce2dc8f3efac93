use std::collections::{BTreeMap, HashMap};

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use xroute_types::XrouteError;

fn to_py_err(e: XrouteError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Decimal string → base-unit integer string. Returns "0" for bad input.
#[pyfunction]
#[pyo3(signature = (amount, decimals=None))]
fn to_base_units(amount: Option<&str>, decimals: Option<u32>) -> String {
    xroute_amount::to_base_units(amount, decimals)
}

/// Base-unit integer string → decimal string, or None for bad input.
#[pyfunction]
#[pyo3(signature = (base, decimals=None))]
fn from_base_units(base: &str, decimals: Option<u32>) -> Option<String> {
    xroute_amount::from_base_units(base, decimals)
}

#[pyfunction]
fn format_with_commas(value: &str) -> String {
    xroute_amount::format_with_commas(value)
}

#[pyfunction]
fn strip_commas(value: &str) -> String {
    xroute_amount::strip_commas(value)
}

/// Same account payload under another bech32 prefix.
#[pyfunction]
fn reencode_address(address: &str, prefix: &str) -> PyResult<String> {
    xroute_address::reencode(address, prefix).map_err(to_py_err)
}

/// Bind route hops to addresses.
///
/// `prefixes` maps chain id → bech32 prefix. Returns chain id → address
/// for every hop that could be resolved.
#[pyfunction]
#[pyo3(signature = (hops, connected=None, destination=None, prefixes=HashMap::new()))]
fn resolve_addresses(
    hops: Vec<String>,
    connected: Option<&str>,
    destination: Option<&str>,
    prefixes: HashMap<String, String>,
) -> BTreeMap<String, String> {
    xroute_address::resolve(&hops, connected, destination, &prefixes)
}

/// Hops of `hops` with no address in `binding`, in route order.
#[pyfunction]
fn missing_chains(hops: Vec<String>, binding: BTreeMap<String, String>) -> Vec<String> {
    xroute_address::missing_chains(&hops, &binding)
}

#[pymodule]
fn _native(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(to_base_units, m)?)?;
    m.add_function(wrap_pyfunction!(from_base_units, m)?)?;
    m.add_function(wrap_pyfunction!(format_with_commas, m)?)?;
    m.add_function(wrap_pyfunction!(strip_commas, m)?)?;
    m.add_function(wrap_pyfunction!(reencode_address, m)?)?;
    m.add_function(wrap_pyfunction!(resolve_addresses, m)?)?;
    m.add_function(wrap_pyfunction!(missing_chains, m)?)?;
    Ok(())
}
