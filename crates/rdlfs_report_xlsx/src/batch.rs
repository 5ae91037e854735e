//! Multi-county batch driver.
//!
//! Every county gets its own [`ReportWriter`] and output file; counties run in
//! parallel on a bounded rayon pool and share nothing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::spec::{
    ReportResult, SpecBatchReport, SpecCountyError, SpecCountyReport, SpecFarmerRecord,
    SpecReportOptions,
};
use crate::util::calculate_worker_limit;
use crate::writer::ReportWriter;

/// Write one workbook per county into `path_dir_out`.
///
/// A failing county is recorded in [`SpecBatchReport::errors`] and does not
/// stop the others.
pub fn write_county_reports(
    path_dir_out: &Path,
    records_by_county: &BTreeMap<String, Vec<SpecFarmerRecord>>,
    options: &SpecReportOptions,
) -> SpecBatchReport {
    let mut batch_report = SpecBatchReport::default();
    let l_tasks: Vec<(&String, &Vec<SpecFarmerRecord>)> = records_by_county.iter().collect();
    let n_workers_max = calculate_worker_limit(options.num_workers_max, l_tasks.len());

    let run_county = |(county, records): (&String, &Vec<SpecFarmerRecord>)| {
        let res = write_county_report(path_dir_out, county, records, options)
            .map_err(|err| err.to_string());
        (county.clone(), res)
    };

    let l_results = if n_workers_max <= 1 {
        l_tasks.into_iter().map(run_county).collect::<Vec<_>>()
    } else {
        match ThreadPoolBuilder::new().num_threads(n_workers_max).build() {
            Ok(thread_pool) => {
                thread_pool.install(|| l_tasks.into_par_iter().map(run_county).collect())
            }
            Err(err) => {
                batch_report.warnings.push(format!(
                    "Failed to initialize thread pool (workers={n_workers_max}): {err}; fallback to serial write."
                ));
                l_tasks.into_iter().map(run_county).collect()
            }
        }
    };

    for (county, res) in l_results {
        match res {
            Ok(report) => batch_report.reports.push(report),
            Err(err) => {
                warn!("[{county}] report failed: {err}");
                batch_report.errors.push(SpecCountyError {
                    county,
                    exception: err,
                });
            }
        }
    }

    info!(
        "[XLSX] batch done: counties={} errors={}",
        batch_report.reports.len() + batch_report.errors.len(),
        batch_report.error_count()
    );
    batch_report
}

fn write_county_report(
    path_dir_out: &Path,
    county: &str,
    records: &[SpecFarmerRecord],
    options: &SpecReportOptions,
) -> ReportResult<SpecCountyReport> {
    let mut writer =
        ReportWriter::with_options(county, PathBuf::from(path_dir_out), options.clone())?;
    for record in records {
        writer.set_data(record)?;
    }
    writer.save()?;
    Ok(writer.report())
}
