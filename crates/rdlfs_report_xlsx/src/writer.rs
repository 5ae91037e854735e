//! County report writer: stacks record blocks on one worksheet and saves it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatPattern, Workbook};

use crate::block::plan_record;
use crate::conf::derive_default_report_options;
use crate::cursor::Cursor;
use crate::spec::{
    EnumCellValue, ReportError, ReportResult, SpecBlock, SpecCell, SpecCellStyle,
    SpecCountyReport, SpecFarmerRecord, SpecReportOptions,
};
use crate::util::{cast_col_num, cast_row_num, sanitize_sheet_name};

/// Stateful single-sheet workbook writer for one county.
///
/// The workbook is buffered in memory until [`Self::save`] is called. One
/// writer must not be shared between threads; use one writer per county.
pub struct ReportWriter {
    county: String,
    path_dir_out: PathBuf,
    workbook: Workbook,
    options: SpecReportOptions,
    cursor: Cursor,
    dict_formats: BTreeMap<SpecCellStyle, Format>,
    report: SpecCountyReport,
    if_saved: bool,
}

impl ReportWriter {
    /// Create a writer for `county` that saves into `path_dir_out`.
    pub fn new(county: impl Into<String>, path_dir_out: impl Into<PathBuf>) -> ReportResult<Self> {
        Self::with_options(county, path_dir_out, derive_default_report_options())
    }

    /// Create a writer with explicit options.
    ///
    /// Sets the sheet name and the fixed column widths; the cursor starts at (1, 1).
    pub fn with_options(
        county: impl Into<String>,
        path_dir_out: impl Into<PathBuf>,
        options: SpecReportOptions,
    ) -> ReportResult<Self> {
        let county = county.into();
        let path_dir_out = path_dir_out.into();

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sanitize_sheet_name(&county, "_"))?;
        for (n_idx_col, n_width) in options.derive_column_widths().into_iter().enumerate() {
            worksheet.set_column_width(cast_col_num(n_idx_col)?, n_width)?;
        }

        let report = SpecCountyReport {
            county: county.clone(),
            file_out: derive_file_out(&path_dir_out, &county),
            ..Default::default()
        };

        Ok(Self {
            county,
            path_dir_out,
            workbook,
            options,
            cursor: Cursor::new(),
            dict_formats: BTreeMap::new(),
            report,
            if_saved: false,
        })
    }

    pub fn county(&self) -> &str {
        &self.county
    }

    /// Output workbook path, `<path_dir_out>/<county>.xlsx`.
    pub fn file_out(&self) -> PathBuf {
        derive_file_out(&self.path_dir_out, &self.county)
    }

    /// Current layout position.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Snapshot of the write summary.
    pub fn report(&self) -> SpecCountyReport {
        self.report.clone()
    }

    /// Lay out one farmer record below the previous one.
    ///
    /// The whole record is planned before the first cell is written, so a
    /// malformed record leaves the sheet and the cursor untouched.
    pub fn set_data(&mut self, record: &SpecFarmerRecord) -> ReportResult<()> {
        if self.if_saved {
            return Err(ReportError::WriteAfterSave);
        }

        let plan = plan_record(record, self.options.n_len_wrap_min)?;
        for block in &plan.blocks {
            self.write_block(block)?;
        }

        for c_warning in plan.warnings {
            warn!("[{}] record {}: {c_warning}", self.county, record.farmer_num);
            self.report
                .warn(format!("record {}: {c_warning}", record.farmer_num));
        }
        self.report.cnt_records += 1;
        debug!(
            "[{}] record {} written, cursor at row {}",
            self.county,
            record.farmer_num,
            self.cursor.row()
        );
        Ok(())
    }

    /// Flush the workbook to `<path_dir_out>/<county>.xlsx`. Idempotent.
    pub fn save(&mut self) -> ReportResult<PathBuf> {
        let path_file_out = self.file_out();
        if self.if_saved {
            return Ok(path_file_out);
        }

        self.workbook.save(&path_file_out)?;
        self.if_saved = true;
        info!("{}", self.report);
        Ok(path_file_out)
    }

    fn write_block(&mut self, block: &SpecBlock) -> ReportResult<()> {
        self.cursor.advance_row(block.n_rows_lead);

        for (n_idx_row, row) in block.rows.iter().enumerate() {
            if n_idx_row > 0 {
                self.cursor.advance_row(1);
            }
            self.cursor.reset_col();
            self.cursor.advance_col(row.col_offset);

            for cell in &row.cells {
                self.write_cell(cell)?;
                self.cursor.advance_col(1);
            }
            self.report.row_last = usize::max(self.report.row_last, self.cursor.row());
        }

        self.cursor.advance_row(block.n_rows_trail);
        self.cursor.reset_col();
        Ok(())
    }

    fn write_cell(&mut self, cell: &SpecCell) -> ReportResult<()> {
        let (n_idx_row, n_idx_col) = self.cursor.to_zero_based();
        let (n_row, n_col) = (cast_row_num(n_idx_row)?, cast_col_num(n_idx_col)?);

        if cell.value.is_blank() && !cell.style.if_title {
            return Ok(());
        }

        let n_color_title_bg = self.options.color_title_bg;
        let format = self
            .dict_formats
            .entry(cell.style)
            .or_insert_with(|| derive_rust_xlsx_format(&cell.style, n_color_title_bg));
        let worksheet = self.workbook.worksheet_from_index(0)?;

        match &cell.value {
            EnumCellValue::None => {
                worksheet.write_blank(n_row, n_col, format)?;
            }
            EnumCellValue::String(val) if val.is_empty() => {
                worksheet.write_blank(n_row, n_col, format)?;
            }
            EnumCellValue::String(val) => {
                worksheet.write_string_with_format(n_row, n_col, val, format)?;
            }
            EnumCellValue::Number(val) => {
                worksheet.write_number_with_format(n_row, n_col, *val, format)?;
            }
        }
        Ok(())
    }
}

fn derive_file_out(path_dir_out: &Path, county: &str) -> PathBuf {
    path_dir_out.join(format!("{county}.xlsx"))
}

fn derive_rust_xlsx_format(style: &SpecCellStyle, color_title_bg: u32) -> Format {
    let mut format = Format::new();

    if style.if_title {
        format = format
            .set_bold()
            .set_pattern(FormatPattern::Solid)
            .set_background_color(Color::RGB(color_title_bg));
    }
    if style.if_wrap {
        format = format.set_text_wrap();
    }
    if style.if_align_left {
        format = format.set_align(FormatAlign::Left);
    }

    format
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::Path;

    use calamine::{Data, Reader, open_workbook_auto};

    use super::ReportWriter;
    use crate::spec::{
        ReportError, SpecCropSubsidy, SpecDisaster, SpecFarmerRecord, SpecHouseholdMember,
        SpecLaborEntry,
    };

    fn cell_to_string(cell: &Data) -> String {
        match cell {
            Data::String(v) => v.to_string(),
            Data::Float(v) => v.to_string(),
            Data::Int(v) => v.to_string(),
            Data::Bool(v) => v.to_string(),
            Data::DateTime(v) => v.to_string(),
            Data::DateTimeIso(v) => v.to_string(),
            Data::DurationIso(v) => v.to_string(),
            Data::Error(v) => format!("{v:?}"),
            Data::Empty => String::new(),
        }
    }

    /// Non-empty cells of `sheet` keyed by zero-based `(row, col)`.
    fn read_grid(path: &Path, sheet: &str) -> BTreeMap<(u32, u32), String> {
        let mut workbook = open_workbook_auto(path).expect("open xlsx");
        let range = workbook.worksheet_range(sheet).expect("read sheet");
        let (n_row_start, n_col_start) = range.start().unwrap_or((0, 0));

        range
            .used_cells()
            .filter(|(_, _, cell)| !matches!(cell, Data::Empty))
            .map(|(n_row, n_col, cell)| {
                (
                    (n_row as u32 + n_row_start, n_col as u32 + n_col_start),
                    cell_to_string(cell),
                )
            })
            .collect()
    }

    fn text(grid: &BTreeMap<(u32, u32), String>, row: u32, col: u32) -> &str {
        grid.get(&(row, col)).map(String::as_str).unwrap_or("")
    }

    fn full_record() -> SpecFarmerRecord {
        SpecFarmerRecord {
            farmer_num: "1001001".to_string(),
            name: "王小明".to_string(),
            tel: "03-9876543".to_string(),
            addr: "宜蘭縣三星鄉大洲村".to_string(),
            birthday: "45".to_string(),
            layer: "2".to_string(),
            link_num: "A-17".to_string(),
            household: vec![SpecHouseholdMember {
                birth_year: "48".to_string(),
                relationship: "配偶".to_string(),
            }],
            crop_sbdy: vec![
                SpecCropSubsidy {
                    crop_name: "水稻".to_string(),
                    item: "輪作".to_string(),
                    period: "一期".to_string(),
                },
                SpecCropSubsidy {
                    crop_name: "水稻".to_string(),
                    item: "輪作".to_string(),
                    period: "二期".to_string(),
                },
                SpecCropSubsidy {
                    crop_name: "玉米".to_string(),
                    item: "輪作".to_string(),
                    period: "一期".to_string(),
                },
            ],
            disaster: vec![
                SpecDisaster {
                    disaster_name: "颱風".to_string(),
                    crop_name: "水稻".to_string(),
                    area: "1.5".to_string(),
                },
                SpecDisaster {
                    disaster_name: "颱風".to_string(),
                    crop_name: "水稻".to_string(),
                    area: "0.5".to_string(),
                },
                SpecDisaster {
                    disaster_name: "颱風".to_string(),
                    crop_name: "玉米".to_string(),
                    area: "2".to_string(),
                },
            ],
            mon_hire_104y: (1..=12).collect(),
            short_hire_106y: vec![],
            hire_106y: vec![SpecLaborEntry {
                work_type: "採收".to_string(),
                headcount: 2,
                months: vec![3, 4],
                product_name: None,
            }],
            lack_106y: vec![],
            short_lack_106y: vec![SpecLaborEntry {
                work_type: "整地".to_string(),
                headcount: 5,
                months: vec![1],
                product_name: Some("蔥\u{3000}".to_string()),
            }],
            lack_situation: "缺工".to_string(),
        }
    }

    #[test]
    fn full_record_round_trips_through_xlsx() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut writer = ReportWriter::new("宜蘭縣", tmp.path()).expect("writer");
        writer.set_data(&full_record()).expect("set data");
        assert_eq!(writer.cursor().row(), 34);
        assert_eq!(writer.cursor().col(), 1);

        let path_file_out = writer.save().expect("save");
        assert_eq!(path_file_out, tmp.path().join("宜蘭縣.xlsx"));
        let grid = read_grid(&path_file_out, "宜蘭縣");

        // Sample
        assert_eq!(text(&grid, 0, 0), "農戶編號");
        assert_eq!(text(&grid, 0, 6), "連結編號");
        assert_eq!(text(&grid, 1, 0), "1001001");
        assert_eq!(text(&grid, 1, 3), "宜蘭縣三星鄉大洲村");
        assert_eq!(text(&grid, 2, 0).chars().filter(|c| *c == '-').count(), 206);
        // Household
        assert_eq!(text(&grid, 3, 0), "[戶籍檔]");
        assert_eq!(text(&grid, 4, 1), "48");
        assert_eq!(text(&grid, 4, 2), "配偶");
        // Crop subsidy: two distinct crops
        assert_eq!(text(&grid, 6, 0), "[轉作補貼]");
        assert_eq!(
            (text(&grid, 7, 1), text(&grid, 7, 2), text(&grid, 7, 3)),
            ("1", "水稻", "1")
        );
        assert_eq!(
            (text(&grid, 8, 1), text(&grid, 8, 2), text(&grid, 8, 3)),
            ("2", "玉米", "1")
        );
        assert_eq!(text(&grid, 9, 2), "");
        // Disaster: merged areas
        assert_eq!(text(&grid, 10, 0), "[災害]");
        assert_eq!(text(&grid, 11, 3), "水稻");
        assert_eq!(text(&grid, 11, 4), "2");
        assert_eq!(text(&grid, 12, 3), "玉米");
        assert_eq!(text(&grid, 12, 4), "2");
        // Crop names
        assert_eq!(text(&grid, 14, 0), "[106y-107y作物]");
        assert_eq!(text(&grid, 14, 1), "水稻, 玉米");
        // Monthly hire 104y
        assert_eq!(text(&grid, 16, 0), "[104農普每月僱工]");
        assert_eq!(text(&grid, 16, 6), "六月");
        assert_eq!(text(&grid, 17, 1), "1");
        assert_eq!(text(&grid, 18, 1), "七月");
        assert_eq!(text(&grid, 19, 6), "12");
        // Regular hire
        assert_eq!(text(&grid, 21, 0), "[106每月常僱員工]");
        assert_eq!(text(&grid, 21, 1), "工作類型");
        assert_eq!(text(&grid, 21, 2), "採收");
        assert_eq!(text(&grid, 22, 1), "常僱人數");
        assert_eq!(text(&grid, 23, 2), "3, 4");
        // Lack situation
        assert_eq!(text(&grid, 25, 0), "[106勞動力短缺情形]");
        assert_eq!(text(&grid, 25, 1), "缺工");
        // Short lack
        assert_eq!(text(&grid, 27, 0), "[106短缺臨時僱工]");
        assert_eq!(text(&grid, 27, 2), "蔥");
        assert_eq!(text(&grid, 29, 1), "臨缺人數");
        assert_eq!(text(&grid, 29, 2), "5");
        // Separator, then nothing.
        assert!(text(&grid, 31, 0).starts_with(" ="));
        assert_eq!(grid.keys().map(|(row, _)| *row).max(), Some(31));
    }

    #[test]
    fn empty_household_writes_title_only() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut writer = ReportWriter::new("花蓮縣", tmp.path()).expect("writer");
        let record = SpecFarmerRecord {
            farmer_num: "2002002".to_string(),
            ..Default::default()
        };
        writer.set_data(&record).expect("set data");
        let path_file_out = writer.save().expect("save");
        let grid = read_grid(&path_file_out, "花蓮縣");

        assert_eq!(text(&grid, 3, 0), "[戶籍檔]");
        assert!(grid.keys().all(|(row, _)| *row != 4));
        // Separator follows right after the blank row below the title.
        assert!(text(&grid, 5, 0).starts_with(" ="));
        assert!(!grid.values().any(|val| val == "[106y-107y作物]"));
    }

    #[test]
    fn records_stack_and_crop_names_do_not_leak() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut writer = ReportWriter::new("臺東縣", tmp.path()).expect("writer");
        writer.set_data(&full_record()).expect("first");
        writer
            .set_data(&SpecFarmerRecord {
                farmer_num: "3003003".to_string(),
                ..Default::default()
            })
            .expect("second");

        let report = writer.report();
        assert_eq!(report.cnt_records, 2);

        let path_file_out = writer.save().expect("save");
        let grid = read_grid(&path_file_out, "臺東縣");

        // One blank row between the separator (row 31) and the next record.
        assert_eq!(text(&grid, 32, 0), "");
        assert_eq!(text(&grid, 33, 0), "農戶編號");
        assert_eq!(text(&grid, 34, 0), "3003003");
        assert_eq!(
            grid.values().filter(|val| *val == "[106y-107y作物]").count(),
            1
        );
    }

    #[test]
    fn bad_record_leaves_sheet_untouched() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut writer = ReportWriter::new("南投縣", tmp.path()).expect("writer");
        let record = SpecFarmerRecord {
            disaster: vec![SpecDisaster {
                disaster_name: "颱風".to_string(),
                crop_name: "水稻".to_string(),
                area: "abc".to_string(),
            }],
            ..Default::default()
        };

        let err = writer.set_data(&record).unwrap_err();
        assert!(matches!(err, ReportError::InvalidArea { .. }));
        assert_eq!(writer.cursor().row(), 1);
        assert_eq!(writer.report().cnt_records, 0);
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_dir_missing = tmp.path().join("missing");
        let mut writer = ReportWriter::new("嘉義縣", &path_dir_missing).expect("writer");
        writer.set_data(&full_record()).expect("set data");

        let err = writer.save().unwrap_err();
        assert!(err.is_io(), "unexpected error: {err}");
        assert!(!path_dir_missing.join("嘉義縣.xlsx").exists());
    }

    #[test]
    fn save_is_idempotent_and_blocks_further_writes() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut writer = ReportWriter::new("屏東縣", tmp.path()).expect("writer");
        writer.set_data(&full_record()).expect("set data");

        let path_first = writer.save().expect("save");
        let path_second = writer.save().expect("save again");
        assert_eq!(path_first, path_second);

        let err = writer.set_data(&full_record()).unwrap_err();
        assert!(matches!(err, ReportError::WriteAfterSave));
    }

    #[test]
    fn odd_monthly_list_is_reported_as_warning() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut writer = ReportWriter::new("雲林縣", tmp.path()).expect("writer");
        let record = SpecFarmerRecord {
            farmer_num: "4004004".to_string(),
            short_hire_106y: vec![1, 2, 3],
            ..Default::default()
        };
        writer.set_data(&record).expect("set data");

        let report = writer.report();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("record 4004004:"));
    }
}
