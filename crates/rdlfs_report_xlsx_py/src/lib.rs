use std::collections::BTreeMap;
use std::path::PathBuf;

use pyo3::exceptions::{PyOSError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyAny, PyDict};
use rdlfs_report_xlsx::{
    EnumLaborCount, ReportError, ReportWriter as RsReportWriter, SpecBatchReport,
    SpecCountyReport, SpecCropSubsidy, SpecDisaster, SpecFarmerRecord, SpecHouseholdMember,
    SpecLaborEntry, SpecReportOptions, derive_default_report_options, write_county_reports,
};

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "rdlfs.report.xlsx.v1";

#[pyclass(name = "ReportWriter")]
struct PyReportWriter {
    #[pyo3(get)]
    county: String,
    inner: RsReportWriter,
}

#[pymethods]
impl PyReportWriter {
    #[new]
    fn new(county: String, path: String) -> PyResult<Self> {
        let inner =
            RsReportWriter::new(county.clone(), PathBuf::from(path)).map_err(convert_report_error)?;
        Ok(Self { county, inner })
    }

    fn __enter__(slf: PyRefMut<'_, Self>) -> PyRefMut<'_, Self> {
        slf
    }

    #[pyo3(signature = (exc_type=None, _exc=None, _tb=None))]
    fn __exit__(
        &mut self,
        exc_type: Option<&Bound<'_, PyAny>>,
        _exc: Option<&Bound<'_, PyAny>>,
        _tb: Option<&Bound<'_, PyAny>>,
    ) -> PyResult<()> {
        if exc_type.is_some_and(|val| !val.is_none()) {
            return Ok(());
        }
        self.save().map(|_| ())
    }

    /// `(col, row)` of the layout cursor, both 1-based.
    #[getter]
    fn cursor(&self) -> (usize, usize) {
        let cursor = self.inner.cursor();
        (cursor.col(), cursor.row())
    }

    #[getter]
    fn file_out(&self) -> String {
        self.inner.file_out().to_string_lossy().to_string()
    }

    fn set_data(&mut self, record: &Bound<'_, PyAny>) -> PyResult<()> {
        let record = parse_farmer_record(record)?;
        self.inner
            .set_data(&record)
            .map_err(convert_report_error)
    }

    fn save(&mut self) -> PyResult<String> {
        let path_file_out = self.inner.save().map_err(convert_report_error)?;
        Ok(path_file_out.to_string_lossy().to_string())
    }

    fn report<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        create_county_report_dict(py, &self.inner.report())
    }
}

#[pyfunction(name = "write_county_reports")]
#[pyo3(signature = (path, records_by_county, num_workers_max = None))]
fn py_write_county_reports<'py>(
    py: Python<'py>,
    path: String,
    records_by_county: &Bound<'py, PyDict>,
    num_workers_max: Option<usize>,
) -> PyResult<Bound<'py, PyDict>> {
    let mut dict_records = BTreeMap::new();
    for (key, value) in records_by_county.iter() {
        let county = key.extract::<String>()?;
        let l_records = parse_sequence(&value, parse_farmer_record)?;
        dict_records.insert(county, l_records);
    }

    let cfg_options = SpecReportOptions {
        num_workers_max,
        ..derive_default_report_options()
    };
    let path_dir_out = PathBuf::from(path);
    let batch_report: SpecBatchReport =
        py.allow_threads(|| write_county_reports(&path_dir_out, &dict_records, &cfg_options));

    let dict_out = PyDict::new(py);
    let l_reports = batch_report
        .reports
        .iter()
        .map(|report| create_county_report_dict(py, report))
        .collect::<PyResult<Vec<_>>>()?;
    let dict_errors = PyDict::new(py);
    for error in &batch_report.errors {
        dict_errors.set_item(&error.county, &error.exception)?;
    }
    dict_out.set_item("reports", l_reports)?;
    dict_out.set_item("errors", dict_errors)?;
    dict_out.set_item("warnings", batch_report.warnings)?;
    Ok(dict_out)
}

fn create_county_report_dict<'py>(
    py: Python<'py>,
    report: &SpecCountyReport,
) -> PyResult<Bound<'py, PyDict>> {
    let dict_report = PyDict::new(py);
    dict_report.set_item("county", &report.county)?;
    dict_report.set_item("file_out", report.file_out.to_string_lossy().to_string())?;
    dict_report.set_item("cnt_records", report.cnt_records)?;
    dict_report.set_item("row_last", report.row_last)?;
    dict_report.set_item("warnings", report.warnings.clone())?;
    Ok(dict_report)
}

fn convert_report_error(err: ReportError) -> PyErr {
    if err.is_io() {
        return PyOSError::new_err(err.to_string());
    }
    match err {
        ReportError::InvalidArea { .. } | ReportError::MissingField { .. } => {
            PyValueError::new_err(err.to_string())
        }
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region RecordParsing

/// Convert a record `dict` into [`SpecFarmerRecord`].
///
/// Missing keys raise `KeyError` from the lookup itself.
fn parse_farmer_record(obj: &Bound<'_, PyAny>) -> PyResult<SpecFarmerRecord> {
    Ok(SpecFarmerRecord {
        farmer_num: extract_text(&obj.get_item("farmer_num")?)?,
        name: extract_text(&obj.get_item("name")?)?,
        tel: extract_text(&obj.get_item("tel")?)?,
        addr: extract_text(&obj.get_item("addr")?)?,
        birthday: extract_text(&obj.get_item("birthday")?)?,
        layer: extract_text(&obj.get_item("layer")?)?,
        link_num: extract_text(&obj.get_item("link_num")?)?,
        household: parse_sequence(&obj.get_item("household")?, parse_household_member)?,
        crop_sbdy: parse_sequence(&obj.get_item("crop_sbdy")?, parse_crop_subsidy)?,
        disaster: parse_sequence(&obj.get_item("disaster")?, parse_disaster)?,
        mon_hire_104y: parse_sequence(&obj.get_item("mon_hire_104y")?, extract_count)?,
        short_hire_106y: parse_sequence(&obj.get_item("short_hire_106y")?, extract_count)?,
        hire_106y: parse_sequence(&obj.get_item("hire_106y")?, |item| {
            parse_labor_entry(item, EnumLaborCount::RegularHire)
        })?,
        lack_106y: parse_sequence(&obj.get_item("lack_106y")?, |item| {
            parse_labor_entry(item, EnumLaborCount::RegularLack)
        })?,
        short_lack_106y: parse_sequence(&obj.get_item("short_lack_106y")?, |item| {
            parse_labor_entry(item, EnumLaborCount::TemporaryLack)
        })?,
        lack_situation: extract_text(&obj.get_item("lack_situation")?)?,
    })
}

fn parse_household_member(item: &Bound<'_, PyAny>) -> PyResult<SpecHouseholdMember> {
    Ok(SpecHouseholdMember {
        birth_year: extract_text(&item.get_item(0)?)?,
        relationship: extract_text(&item.get_item(1)?)?,
    })
}

fn parse_crop_subsidy(item: &Bound<'_, PyAny>) -> PyResult<SpecCropSubsidy> {
    Ok(SpecCropSubsidy {
        crop_name: extract_text(&item.get_item(0)?)?,
        item: extract_text(&item.get_item(1)?)?,
        period: extract_text(&item.get_item(2)?)?,
    })
}

fn parse_disaster(item: &Bound<'_, PyAny>) -> PyResult<SpecDisaster> {
    Ok(SpecDisaster {
        disaster_name: extract_text(&item.get_item(0)?)?,
        crop_name: extract_text(&item.get_item(1)?)?,
        area: extract_text(&item.get_item(2)?)?,
    })
}

fn parse_labor_entry(item: &Bound<'_, PyAny>, count: EnumLaborCount) -> PyResult<SpecLaborEntry> {
    let product_name = if count == EnumLaborCount::TemporaryLack {
        Some(extract_text(&item.get_item("產品名稱")?)?)
    } else {
        None
    };

    Ok(SpecLaborEntry {
        work_type: extract_text(&item.get_item("工作類型")?)?,
        headcount: extract_count(&item.get_item(count.label())?)?,
        months: parse_sequence(&item.get_item("months")?, extract_count)?,
        product_name,
    })
}

/// Collect a Python iterable; `None` is treated as empty.
fn parse_sequence<T, F>(obj: &Bound<'_, PyAny>, parse_item: F) -> PyResult<Vec<T>>
where
    F: Fn(&Bound<'_, PyAny>) -> PyResult<T>,
{
    if obj.is_none() {
        return Ok(vec![]);
    }
    let mut l_items = Vec::new();
    for item in obj.try_iter()? {
        l_items.push(parse_item(&item?)?);
    }
    Ok(l_items)
}

/// `str(obj)`, with `None` mapped to an empty string.
fn extract_text(obj: &Bound<'_, PyAny>) -> PyResult<String> {
    if obj.is_none() {
        return Ok(String::new());
    }
    if let Ok(c_value) = obj.extract::<String>() {
        return Ok(c_value);
    }
    Ok(obj.str()?.to_cow()?.into_owned())
}

/// Non-negative integer count given as `int` or numeric `str`.
fn extract_count(obj: &Bound<'_, PyAny>) -> PyResult<u32> {
    if let Ok(n_value) = obj.extract::<u32>() {
        return Ok(n_value);
    }
    let c_value = extract_text(obj)?;
    c_value
        .trim()
        .parse::<u32>()
        .map_err(|_| PyValueError::new_err(format!("Expected a count, got {c_value:?}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[pymodule]
fn _rdlfs_report_xlsx_rs(_py: Python<'_>, module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PyReportWriter>()?;
    module.add_function(wrap_pyfunction!(py_write_county_reports, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    Ok(())
}
