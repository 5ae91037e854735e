//! Report constants, title catalog and default preset factories.

use crate::spec::{EnumBlockKind, SpecReportOptions};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Base column widths (columns A..I) before the multiplier is applied.
pub const L_WIDTH_COLUMNS_BASE: [f64; 9] =
    [20.29, 9.29, 16.29, 29.29, 9.29, 11.29, 11.29, 11.29, 11.29];
/// Multiplier applied to every base column width.
pub const N_WIDTH_COLUMNS_MULTIPLIER: f64 = 1.054;
/// Title cell background (solid fill), `#C3C5C9`.
pub const N_COLOR_TITLE_BG: u32 = 0xC3C5C9;
/// Data cells longer than this many characters are word-wrapped.
pub const N_LEN_TEXT_WRAP_MIN: usize = 8;

/// Number of dashes in the line closing the sample block.
pub const N_LEN_SAMPLE_DASHES: usize = 206;
/// Number of `=` in the line closing a record.
pub const N_LEN_RECORD_SEPARATOR: usize = 129;

/// Fixed value written in the third column of every crop-subsidy row.
pub const C_CROP_SUBSIDY_FLAG: &str = "1";
/// Delimiter used when joining crop names and months.
pub const C_JOIN_DELIMITER: &str = ", ";

/// Header label of the product row in the short-lack block.
pub const C_LABEL_PRODUCT: &str = "產品";
/// Header label of the work-type row in hire/lack blocks.
pub const C_LABEL_WORK_TYPE: &str = "工作類型";
/// Header label of the months row in hire/lack blocks.
pub const C_LABEL_MONTHS: &str = "月份";

const TUP_TITLE_SAMPLE: [&str; 7] = [
    "農戶編號",
    "調查姓名",
    "電話",
    "地址",
    "出生年",
    "原層別",
    "連結編號",
];
const TUP_TITLE_HOUSEHOLD: [&str; 3] = ["[戶籍檔]", "出生年", "關係"];
const TUP_TITLE_CROP_SUBSIDY: [&str; 4] = ["[轉作補貼]", "項目", "作物名稱", "期別"];
const TUP_TITLE_DISASTER: [&str; 5] = ["[災害]", "項目", "災害", "核定作物", "核定面積"];
const TUP_TITLE_CROP_NAMES: [&str; 1] = ["[106y-107y作物]"];
const TUP_TITLE_HIRE: [&str; 1] = ["[106每月常僱員工]"];
const TUP_TITLE_LACK_SITUATION: [&str; 1] = ["[106勞動力短缺情形]"];
const TUP_TITLE_LACK: [&str; 1] = ["[106短缺常僱員工]"];
const TUP_TITLE_SHORT_LACK: [&str; 1] = ["[106短缺臨時僱工]"];

/// Month labels for January..June.
pub const TUP_MONTHS_FIRST_HALF: [&str; 6] = ["一月", "二月", "三月", "四月", "五月", "六月"];
/// Month labels for July..December.
pub const TUP_MONTHS_SECOND_HALF: [&str; 6] = ["七月", "八月", "九月", "十月", "十一月", "十二月"];

const C_LABEL_HIRE_104Y: &str = "[104農普每月僱工]";
const C_LABEL_SHORT_HIRE_106Y: &str = "[106每月臨時僱工]";

/// Static title labels for one block kind.
///
/// Monthly hire blocks have no static title; use [`hire_title`].
pub fn derive_block_title(kind: EnumBlockKind) -> &'static [&'static str] {
    match kind {
        EnumBlockKind::Sample => &TUP_TITLE_SAMPLE,
        EnumBlockKind::Household => &TUP_TITLE_HOUSEHOLD,
        EnumBlockKind::CropSubsidy => &TUP_TITLE_CROP_SUBSIDY,
        EnumBlockKind::Disaster => &TUP_TITLE_DISASTER,
        EnumBlockKind::CropNames => &TUP_TITLE_CROP_NAMES,
        EnumBlockKind::Hire => &TUP_TITLE_HIRE,
        EnumBlockKind::LackSituation => &TUP_TITLE_LACK_SITUATION,
        EnumBlockKind::Lack => &TUP_TITLE_LACK,
        EnumBlockKind::ShortLack => &TUP_TITLE_SHORT_LACK,
        EnumBlockKind::MonthlyHire104y
        | EnumBlockKind::MonthlyShortHire106y
        | EnumBlockKind::Separator => &[],
    }
}

/// Title row of the first half-year of a monthly hire block.
///
/// The leading label names the survey variant; the remaining six are month labels.
pub fn hire_title(is_104y: bool) -> [&'static str; 7] {
    let c_label = if is_104y {
        C_LABEL_HIRE_104Y
    } else {
        C_LABEL_SHORT_HIRE_106Y
    };
    let [m1, m2, m3, m4, m5, m6] = TUP_MONTHS_FIRST_HALF;
    [c_label, m1, m2, m3, m4, m5, m6]
}

/// Line written under the sample block.
pub fn derive_sample_dashes() -> String {
    format!(" {} ", "-".repeat(N_LEN_SAMPLE_DASHES))
}

/// Line written after every record.
pub fn derive_record_separator() -> String {
    format!(" {} ", "=".repeat(N_LEN_RECORD_SEPARATOR))
}

/// Build default report options.
pub fn derive_default_report_options() -> SpecReportOptions {
    SpecReportOptions::default()
}
