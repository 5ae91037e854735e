//! Record, layout and report models shared by the report kernel.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::conf::{
    L_WIDTH_COLUMNS_BASE, N_COLOR_TITLE_BG, N_LEN_TEXT_WRAP_MIN, N_WIDTH_COLUMNS_MULTIPLIER,
};

////////////////////////////////////////////////////////////////////////////////
// #region RecordModel

/// One household member as `(birth_year, relationship)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecHouseholdMember {
    pub birth_year: String,
    pub relationship: String,
}

/// One crop-rotation subsidy entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecCropSubsidy {
    pub crop_name: String,
    pub item: String,
    pub period: String,
}

/// One approved disaster entry.
///
/// `area` is kept as the source text and parsed when entries are summed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecDisaster {
    pub disaster_name: String,
    pub crop_name: String,
    pub area: String,
}

/// One per-work-type entry of the hire, lack or short-lack lists.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecLaborEntry {
    /// Work type (`工作類型`).
    pub work_type: String,
    /// Head count; its meaning follows the list the entry belongs to.
    pub headcount: u32,
    /// Months the entry applies to.
    pub months: Vec<u32>,
    /// Product name (`產品名稱`), required by the short-lack list only.
    pub product_name: Option<String>,
}

/// One farmer's full dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecFarmerRecord {
    pub farmer_num: String,
    pub name: String,
    pub tel: String,
    pub addr: String,
    pub birthday: String,
    pub layer: String,
    pub link_num: String,
    pub household: Vec<SpecHouseholdMember>,
    pub crop_sbdy: Vec<SpecCropSubsidy>,
    pub disaster: Vec<SpecDisaster>,
    /// Monthly hire counts from the 104-year census.
    pub mon_hire_104y: Vec<u32>,
    /// Monthly temporary-hire counts for year 106.
    pub short_hire_106y: Vec<u32>,
    pub hire_106y: Vec<SpecLaborEntry>,
    pub lack_106y: Vec<SpecLaborEntry>,
    pub short_lack_106y: Vec<SpecLaborEntry>,
    pub lack_situation: String,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region LayoutModel

/// Block kinds, in the order they are laid out for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EnumBlockKind {
    Sample,
    Household,
    CropSubsidy,
    Disaster,
    CropNames,
    MonthlyHire104y,
    Hire,
    MonthlyShortHire106y,
    LackSituation,
    Lack,
    ShortLack,
    Separator,
}

/// Which head count a hire/lack block reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumLaborCount {
    /// Regular employees (`常僱人數`).
    RegularHire,
    /// Lacking regular employees (`常缺人數`).
    RegularLack,
    /// Lacking temporary workers (`臨缺人數`).
    TemporaryLack,
}

impl EnumLaborCount {
    /// Header label of the count row.
    pub fn label(self) -> &'static str {
        match self {
            Self::RegularHire => "常僱人數",
            Self::RegularLack => "常缺人數",
            Self::TemporaryLack => "臨缺人數",
        }
    }

    /// Block this count is reported in.
    pub fn block_kind(self) -> EnumBlockKind {
        match self {
            Self::RegularHire => EnumBlockKind::Hire,
            Self::RegularLack => EnumBlockKind::Lack,
            Self::TemporaryLack => EnumBlockKind::ShortLack,
        }
    }
}

/// Normalized cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

impl EnumCellValue {
    /// Text as it appears in the sheet; numbers keep one decimal when integral.
    pub fn to_text(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::String(val) => val.clone(),
            Self::Number(val) if val.is_finite() && val.fract() == 0.0 => format!("{val:.1}"),
            Self::Number(val) => val.to_string(),
        }
    }

    /// Length in characters of [`Self::to_text`].
    pub fn len_chars(&self) -> usize {
        match self {
            Self::String(val) => val.chars().count(),
            _ => self.to_text().chars().count(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::None => true,
            Self::String(val) => val.is_empty(),
            Self::Number(_) => false,
        }
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for EnumCellValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for EnumCellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Visual style of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SpecCellStyle {
    /// Shaded background and bold font.
    pub if_title: bool,
    /// Word-wrap.
    pub if_wrap: bool,
    /// Left horizontal alignment.
    pub if_align_left: bool,
}

/// One cell of a block row.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecCell {
    pub value: EnumCellValue,
    pub style: SpecCellStyle,
}

impl SpecCell {
    /// Title cell.
    pub fn title(value: impl Into<EnumCellValue>) -> Self {
        Self {
            value: value.into(),
            style: SpecCellStyle {
                if_title: true,
                ..Default::default()
            },
        }
    }

    /// Data cell, wrapped when its text is longer than `n_len_wrap_min` characters.
    pub fn body(value: impl Into<EnumCellValue>, n_len_wrap_min: usize) -> Self {
        let value = value.into();
        let if_wrap = value.len_chars() > n_len_wrap_min;
        Self {
            value,
            style: SpecCellStyle {
                if_wrap,
                ..Default::default()
            },
        }
    }

    /// Data cell with an explicit style.
    pub fn styled(value: impl Into<EnumCellValue>, style: SpecCellStyle) -> Self {
        Self {
            value: value.into(),
            style,
        }
    }

    /// Unstyled cell.
    pub fn plain(value: impl Into<EnumCellValue>) -> Self {
        Self::styled(value, SpecCellStyle::default())
    }
}

/// One row of a block, written starting `col_offset` columns right of the cursor column.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecBlockRow {
    pub col_offset: usize,
    pub cells: Vec<SpecCell>,
}

impl SpecBlockRow {
    pub fn new(col_offset: usize, cells: Vec<SpecCell>) -> Self {
        Self { col_offset, cells }
    }
}

/// Layout-independent content of one block.
///
/// The layout driver advances `n_rows_lead` rows, writes `rows` on consecutive
/// rows (the first one on the current row), then advances `n_rows_trail` rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecBlock {
    pub kind: EnumBlockKind,
    pub n_rows_lead: usize,
    pub rows: Vec<SpecBlockRow>,
    pub n_rows_trail: usize,
}

impl SpecBlock {
    /// Texts of every row, for inspection.
    pub fn texts(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.cells.iter().map(|cell| cell.value.to_text()).collect())
            .collect()
    }
}

/// Blocks planned for one record, plus non-fatal warnings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecRecordPlan {
    pub blocks: Vec<SpecBlock>,
    pub warnings: Vec<String>,
}

impl SpecRecordPlan {
    /// Whether a block of `kind` was planned.
    pub fn contains(&self, kind: EnumBlockKind) -> bool {
        self.blocks.iter().any(|block| block.kind == kind)
    }

    /// First block of `kind`.
    pub fn get(&self, kind: EnumBlockKind) -> Option<&SpecBlock> {
        self.blocks.iter().find(|block| block.kind == kind)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Writer-wide options.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecReportOptions {
    /// Column widths (A, B, ...) before the multiplier.
    pub widths_column: Vec<f64>,
    /// Multiplier applied to every column width.
    pub width_multiplier: f64,
    /// Title background color as `0xRRGGBB`.
    pub color_title_bg: u32,
    /// Data cells longer than this many characters are word-wrapped.
    pub n_len_wrap_min: usize,
    /// Maximum worker threads for multi-county batches.
    pub num_workers_max: Option<usize>,
}

impl Default for SpecReportOptions {
    fn default() -> Self {
        Self {
            widths_column: L_WIDTH_COLUMNS_BASE.to_vec(),
            width_multiplier: N_WIDTH_COLUMNS_MULTIPLIER,
            color_title_bg: N_COLOR_TITLE_BG,
            n_len_wrap_min: N_LEN_TEXT_WRAP_MIN,
            num_workers_max: None,
        }
    }
}

impl SpecReportOptions {
    /// Final column widths after the multiplier.
    pub fn derive_column_widths(&self) -> Vec<f64> {
        self.widths_column
            .iter()
            .map(|width| width * self.width_multiplier)
            .collect()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-county write summary.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecCountyReport {
    /// County the workbook belongs to.
    pub county: String,
    /// Output workbook path.
    pub file_out: PathBuf,
    /// Number of records laid out.
    pub cnt_records: u64,
    /// Last 1-based row touched by the layout.
    pub row_last: usize,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecCountyReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} county={} records={} rows={} warnings={} file={}",
            self.county,
            self.cnt_records,
            self.row_last,
            self.warnings.len(),
            self.file_out.display()
        )
    }
}

impl fmt::Display for SpecCountyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[XLSX]"))
    }
}

/// One county that failed in a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCountyError {
    pub county: String,
    /// User-facing error text.
    pub exception: String,
}

/// Result of a multi-county batch run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecBatchReport {
    /// Reports of counties saved successfully, sorted by county.
    pub reports: Vec<SpecCountyReport>,
    /// Failed counties, sorted by county.
    pub errors: Vec<SpecCountyError>,
    /// Batch-level warnings.
    pub warnings: Vec<String>,
}

impl SpecBatchReport {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Errors raised while laying out or saving a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Disaster area is not a number.
    #[error("Invalid disaster area {value:?} for ({disaster}, {crop})")]
    InvalidArea {
        disaster: String,
        crop: String,
        value: String,
    },

    /// Record lacks a field required by a block.
    #[error("Missing field {field:?} in block {block:?}")]
    MissingField {
        block: EnumBlockKind,
        field: &'static str,
    },

    /// `set_data` was called after the workbook was saved.
    #[error("Cannot write after save().")]
    WriteAfterSave,

    /// Cursor moved beyond the worksheet limits.
    #[error("Cell index overflow: {0}")]
    IndexOverflow(usize),

    /// Error from the xlsx backend, including I/O failures on save.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl ReportError {
    /// Whether the error comes from the filesystem.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Xlsx(rust_xlsxwriter::XlsxError::IoError(_)))
    }
}

/// Result type for report operations.
pub type ReportResult<T> = std::result::Result<T, ReportError>;

// #endregion
////////////////////////////////////////////////////////////////////////////////
