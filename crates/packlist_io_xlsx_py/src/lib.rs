use packlist_io_xlsx::conf::{C_OUTPUT_FILE_NAME, C_OUTPUT_MIME_TYPE, TUP_SALES_ORDER_COLUMNS};
use packlist_io_xlsx::frame::derive_ipc_bytes_from_records;
use packlist_io_xlsx::spec::{
    ConvertError, EncodeError, SpecConvertReport, SpecGridReadOptions, SpecSalesOrderRecord,
};
use packlist_io_xlsx::{convert_packing_list_bytes, encode_sales_order};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyBytes;
use tracing_subscriber::EnvFilter;

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "packlist.xlsx.sales_order.v1";
const C_BRIDGE_TRANSPORT: &str = "arrow_ipc_bytes";

type TupRecord = (String, f64, f64, String, String, String, String, String);

#[pyclass(name = "SalesOrderReport", frozen)]
struct PySalesOrderReport {
    inner: SpecConvertReport,
}

#[pymethods]
impl PySalesOrderReport {
    #[getter]
    fn records(&self) -> Vec<TupRecord> {
        self.inner.records.iter().map(derive_record_tuple).collect()
    }

    #[getter]
    fn warnings(&self) -> Vec<String> {
        self.inner.warnings.clone()
    }

    #[getter]
    fn columns(&self) -> Vec<&'static str> {
        TUP_SALES_ORDER_COLUMNS.to_vec()
    }

    #[getter]
    fn n_rows_product_block(&self) -> usize {
        self.inner.n_rows_product_block
    }

    #[getter]
    fn n_rows_skipped(&self) -> usize {
        self.inner.n_rows_skipped
    }

    #[getter]
    fn n_quantity_coerced(&self) -> usize {
        self.inner.n_quantity_coerced
    }

    fn to_dict(&self) -> std::collections::BTreeMap<String, usize> {
        self.inner.to_dict()
    }

    /// Arrow IPC bytes for table previews (`polars.read_ipc`).
    fn to_ipc<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyBytes>> {
        let v_ipc = py
            .allow_threads(|| derive_ipc_bytes_from_records(&self.inner.records))
            .map_err(map_encode_error)?;
        Ok(PyBytes::new(py, &v_ipc))
    }

    /// Workbook bytes for the download button.
    fn to_xlsx<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyBytes>> {
        let v_xlsx = py
            .allow_threads(|| encode_sales_order(&self.inner.records))
            .map_err(map_encode_error)?;
        Ok(PyBytes::new(py, &v_xlsx))
    }

    fn __len__(&self) -> usize {
        self.inner.records.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "SalesOrderReport(records={}, warnings={})",
            self.inner.records.len(),
            self.inner.warning_count()
        )
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }
}

#[pyfunction]
#[pyo3(signature = (data, file_name, if_first_row_is_header = true))]
fn convert_packing_list(
    py: Python<'_>,
    data: &[u8],
    file_name: &str,
    if_first_row_is_header: bool,
) -> PyResult<PySalesOrderReport> {
    let cfg_read_options = SpecGridReadOptions {
        if_first_row_is_header,
    };
    let report = py
        .allow_threads(|| convert_packing_list_bytes(data, file_name, &cfg_read_options))
        .map_err(map_convert_error)?;
    tracing::info!(
        file_name,
        records = report.records.len(),
        warnings = report.warning_count(),
        "Converted packing list."
    );
    Ok(PySalesOrderReport { inner: report })
}

/// Install a stderr `tracing` subscriber; returns `False` when one already exists.
#[pyfunction]
#[pyo3(signature = (level = "info"))]
fn init_logging(level: &str) -> PyResult<bool> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|err| PyValueError::new_err(format!("Invalid log level {level:?}: {err}")))?,
    };
    let if_installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok();
    Ok(if_installed)
}

fn derive_record_tuple(record: &SpecSalesOrderRecord) -> TupRecord {
    (
        record.description.clone(),
        record.quantity,
        record.price,
        record.customer_name.clone(),
        record.sales_order_no.clone(),
        record.sales_order_date.clone(),
        record.delivery_method.clone(),
        record.notes.clone(),
    )
}

fn map_convert_error(err: ConvertError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn map_encode_error(err: EncodeError) -> PyErr {
    match err {
        EncodeError::TooManyRows(_) => PyValueError::new_err(err.to_string()),
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

#[pymodule]
fn _packlist_io_xlsx_rs(_py: Python<'_>, module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PySalesOrderReport>()?;
    module.add_function(wrap_pyfunction!(convert_packing_list, module)?)?;
    module.add_function(wrap_pyfunction!(init_logging, module)?)?;
    module.add("OUTPUT_FILE_NAME", C_OUTPUT_FILE_NAME)?;
    module.add("OUTPUT_MIME_TYPE", C_OUTPUT_MIME_TYPE)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
