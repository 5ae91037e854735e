//! `rdlfs_report_xlsx` v1:
//! Rust-side county report kernel for farmer survey records.
//!
//! Module layout:
//! - `conf`   : constants, title catalog and default presets
//! - `spec`   : record/layout/report models and errors
//! - `cursor` : 1-based layout cursor
//! - `block`  : pure per-block builders
//! - `util`   : pure helper functions
//! - `writer` : single-county workbook writer
//! - `batch`  : multi-county parallel driver
pub mod batch;
pub mod block;
pub mod conf;
pub mod cursor;
pub mod spec;
pub mod util;
pub mod writer;

pub use batch::write_county_reports;
pub use block::plan_record;
pub use conf::{derive_default_report_options, hire_title};
pub use cursor::Cursor;
pub use spec::{
    EnumBlockKind, EnumCellValue, EnumLaborCount, ReportError, ReportResult, SpecBatchReport,
    SpecBlock, SpecBlockRow, SpecCell, SpecCellStyle, SpecCountyError, SpecCountyReport,
    SpecCropSubsidy, SpecDisaster, SpecFarmerRecord, SpecHouseholdMember, SpecLaborEntry,
    SpecRecordPlan, SpecReportOptions,
};
pub use writer::ReportWriter;
