//! Stateless helper utilities used by the block builders and the writer.

use std::collections::HashSet;

use crate::conf::{C_JOIN_DELIMITER, N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL};
use crate::spec::{ReportError, SpecCropSubsidy, SpecDisaster};

////////////////////////////////////////////////////////////////////////////////
// #region CropSet

/// Distinct crop names in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecCropSet {
    l_names: Vec<String>,
    set_names: HashSet<String>,
}

impl SpecCropSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `name`; return `false` if it was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.set_names.contains(name) {
            return false;
        }
        self.set_names.insert(name.to_string());
        self.l_names.push(name.to_string());
        true
    }

    pub fn is_empty(&self) -> bool {
        self.l_names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.l_names.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.l_names.iter().map(String::as_str)
    }

    /// All names joined with `", "`.
    pub fn join(&self) -> String {
        self.l_names.join(C_JOIN_DELIMITER)
    }

    pub fn clear(&mut self) {
        self.l_names.clear();
        self.set_names.clear();
    }
}

impl<'a> Extend<&'a str> for SpecCropSet {
    fn extend<T: IntoIterator<Item = &'a str>>(&mut self, iter: T) {
        for name in iter {
            self.insert(name);
        }
    }
}

/// Distinct crop names of a subsidy list, in first-seen order.
pub fn derive_distinct_crops(crop_sbdy: &[SpecCropSubsidy]) -> SpecCropSet {
    let mut crop_set = SpecCropSet::new();
    crop_set.extend(crop_sbdy.iter().map(|entry| entry.crop_name.as_str()));
    crop_set
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DisasterAggregation

/// Disaster entries merged by `(disaster_name, crop_name)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecDisasterTotal {
    pub disaster_name: String,
    pub crop_name: String,
    pub area: f64,
}

/// Sum areas of entries sharing `(disaster_name, crop_name)`, keeping first-seen order.
///
/// Fails on the first area that does not parse as `f64`.
pub fn aggregate_disasters(disaster: &[SpecDisaster]) -> Result<Vec<SpecDisasterTotal>, ReportError> {
    let mut l_totals: Vec<SpecDisasterTotal> = Vec::new();

    for entry in disaster {
        let n_area = entry
            .area
            .trim()
            .parse::<f64>()
            .map_err(|_| ReportError::InvalidArea {
                disaster: entry.disaster_name.clone(),
                crop: entry.crop_name.clone(),
                value: entry.area.clone(),
            })?;

        match l_totals.iter_mut().find(|total| {
            total.disaster_name == entry.disaster_name && total.crop_name == entry.crop_name
        }) {
            Some(total) => total.area += n_area,
            None => l_totals.push(SpecDisasterTotal {
                disaster_name: entry.disaster_name.clone(),
                crop_name: entry.crop_name.clone(),
                area: n_area,
            }),
        }
    }

    Ok(l_totals)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TextHelpers

/// Join month numbers with `", "`.
pub fn join_months(months: &[u32]) -> String {
    months
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(C_JOIN_DELIMITER)
}

/// Remove ideographic spaces (U+3000) padding product names.
pub fn strip_ideographic_space(text: &str) -> String {
    text.replace('\u{3000}', "")
}

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().trim_matches('\'').to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Casting

pub(crate) fn cast_row_num(value: usize) -> Result<u32, ReportError> {
    if value >= crate::conf::N_NROWS_EXCEL_MAX {
        return Err(ReportError::IndexOverflow(value));
    }
    u32::try_from(value).map_err(|_| ReportError::IndexOverflow(value))
}

pub(crate) fn cast_col_num(value: usize) -> Result<u16, ReportError> {
    if value >= crate::conf::N_NCOLS_EXCEL_MAX {
        return Err(ReportError::IndexOverflow(value));
    }
    u16::try_from(value).map_err(|_| ReportError::IndexOverflow(value))
}

/// Resolve worker count from an optional cap and the number of tasks.
pub(crate) fn calculate_worker_limit(num_workers_max: Option<usize>, n_tasks: usize) -> usize {
    let n_cpu = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);

    let n_workers = match num_workers_max {
        Some(n) => n.clamp(1, n_cpu),
        None => n_cpu.clamp(1, 8),
    };
    n_workers.min(n_tasks.max(1))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn disaster(name: &str, crop: &str, area: &str) -> SpecDisaster {
        SpecDisaster {
            disaster_name: name.to_string(),
            crop_name: crop.to_string(),
            area: area.to_string(),
        }
    }

    #[test]
    fn aggregate_disasters_sums_same_pair() {
        let l_totals = aggregate_disasters(&[
            disaster("颱風", "水稻", "1.5"),
            disaster("颱風", "水稻", "0.5"),
            disaster("颱風", "玉米", "2"),
        ])
        .expect("aggregate");

        assert_eq!(
            l_totals,
            vec![
                SpecDisasterTotal {
                    disaster_name: "颱風".to_string(),
                    crop_name: "水稻".to_string(),
                    area: 2.0,
                },
                SpecDisasterTotal {
                    disaster_name: "颱風".to_string(),
                    crop_name: "玉米".to_string(),
                    area: 2.0,
                },
            ]
        );
    }

    #[test]
    fn aggregate_disasters_keeps_distinct_disasters_apart() {
        let l_totals = aggregate_disasters(&[
            disaster("颱風", "水稻", "1"),
            disaster("豪雨", "水稻", "1"),
        ])
        .expect("aggregate");
        assert_eq!(l_totals.len(), 2);
    }

    #[test]
    fn aggregate_disasters_rejects_non_numeric_area() {
        let err = aggregate_disasters(&[disaster("颱風", "水稻", "一公頃")]).unwrap_err();
        assert!(matches!(err, ReportError::InvalidArea { ref value, .. } if value == "一公頃"));
    }

    #[test]
    fn crop_set_keeps_first_seen_order() {
        let mut crop_set = derive_distinct_crops(&[
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
        ]);
        assert_eq!(crop_set.len(), 2);

        crop_set.extend(["甘藷", "水稻"]);
        assert_eq!(crop_set.join(), "水稻, 玉米, 甘藷");

        crop_set.clear();
        assert!(crop_set.is_empty());
        assert!(crop_set.insert("水稻"));
    }

    #[test]
    fn text_helpers() {
        assert_eq!(join_months(&[1, 2, 12]), "1, 2, 12");
        assert_eq!(join_months(&[]), "");
        assert_eq!(strip_ideographic_space("\u{3000}香蕉\u{3000}"), "香蕉");
        assert_eq!(sanitize_sheet_name("a/b:c", "_"), "a_b_c");
        assert_eq!(sanitize_sheet_name("  ", "_"), "Sheet");
    }

    #[test]
    fn cast_rejects_out_of_sheet_indices() {
        assert!(cast_row_num(1_048_575).is_ok());
        assert!(cast_row_num(1_048_576).is_err());
        assert!(cast_col_num(16_384).is_err());
    }

    #[test]
    fn worker_limit_never_exceeds_task_count() {
        assert_eq!(calculate_worker_limit(Some(64), 1), 1);
        assert!(calculate_worker_limit(None, 100) >= 1);
        assert_eq!(calculate_worker_limit(Some(4), 0), 1);
    }
}
