//! Pure per-block builders.
//!
//! Each builder turns a slice of one record into a [`SpecBlock`] (or `None`
//! when the block is skipped). Nothing here knows about the worksheet; the
//! writer stacks the returned blocks with its cursor.

use log::debug;

use crate::conf::{
    C_CROP_SUBSIDY_FLAG, C_LABEL_MONTHS, C_LABEL_PRODUCT, C_LABEL_WORK_TYPE,
    TUP_MONTHS_SECOND_HALF, derive_block_title, derive_record_separator, derive_sample_dashes,
    hire_title,
};
use crate::spec::{
    EnumBlockKind, EnumCellValue, EnumLaborCount, ReportError, SpecBlock, SpecBlockRow, SpecCell,
    SpecCellStyle, SpecCropSubsidy, SpecDisaster, SpecFarmerRecord, SpecHouseholdMember,
    SpecLaborEntry, SpecRecordPlan,
};
use crate::util::{
    SpecCropSet, aggregate_disasters, derive_distinct_crops, join_months, strip_ideographic_space,
};

const N_MONTHS_HALF: usize = 6;
const N_MONTHS_YEAR: usize = 12;

fn derive_title_cells(labels: &[&str]) -> Vec<SpecCell> {
    labels.iter().map(|label| SpecCell::title(*label)).collect()
}

////////////////////////////////////////////////////////////////////////////////
// #region RecordPlan

/// Plan every block of one record in layout order.
///
/// The crop set lives only for the duration of this call, so crop names can
/// never carry over to the next record.
pub fn plan_record(
    record: &SpecFarmerRecord,
    n_len_wrap_min: usize,
) -> Result<SpecRecordPlan, ReportError> {
    let mut plan = SpecRecordPlan::default();

    plan.blocks.push(build_sample_block(record));
    plan.blocks
        .push(build_household_block(&record.household, n_len_wrap_min));

    let mut crop_set = SpecCropSet::new();
    if let Some((block, crops_subsidy)) = build_crop_subsidy_block(&record.crop_sbdy, n_len_wrap_min)
    {
        crop_set = crops_subsidy;
        plan.blocks.push(block);
    }
    if let Some(block) = build_disaster_block(&record.disaster, &mut crop_set, n_len_wrap_min)? {
        plan.blocks.push(block);
    }
    if let Some(block) = build_crop_names_block(&crop_set, n_len_wrap_min) {
        plan.blocks.push(block);
    }
    crop_set.clear();

    if let Some(block) = build_monthly_hire_block(
        &record.mon_hire_104y,
        true,
        n_len_wrap_min,
        &mut plan.warnings,
    ) {
        plan.blocks.push(block);
    }
    if let Some(block) = build_labor_block(
        &record.hire_106y,
        EnumLaborCount::RegularHire,
        n_len_wrap_min,
    )? {
        plan.blocks.push(block);
    }
    if let Some(block) = build_monthly_hire_block(
        &record.short_hire_106y,
        false,
        n_len_wrap_min,
        &mut plan.warnings,
    ) {
        plan.blocks.push(block);
    }
    if let Some(block) = build_lack_situation_block(&record.lack_situation, n_len_wrap_min) {
        plan.blocks.push(block);
    }
    if let Some(block) = build_labor_block(
        &record.lack_106y,
        EnumLaborCount::RegularLack,
        n_len_wrap_min,
    )? {
        plan.blocks.push(block);
    }
    if let Some(block) = build_labor_block(
        &record.short_lack_106y,
        EnumLaborCount::TemporaryLack,
        n_len_wrap_min,
    )? {
        plan.blocks.push(block);
    }

    plan.blocks.push(build_separator_block());

    debug!(
        "planned record {}: {} blocks, {} warnings",
        record.farmer_num,
        plan.blocks.len(),
        plan.warnings.len()
    );
    Ok(plan)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Blocks

/// Sample title, wrapped sample values, then the dashed line.
pub fn build_sample_block(record: &SpecFarmerRecord) -> SpecBlock {
    let style_wrap = SpecCellStyle {
        if_wrap: true,
        ..Default::default()
    };
    let l_values = [
        &record.farmer_num,
        &record.name,
        &record.tel,
        &record.addr,
        &record.birthday,
        &record.layer,
        &record.link_num,
    ]
    .into_iter()
    .map(|val| SpecCell::styled(val.as_str(), style_wrap))
    .collect();

    SpecBlock {
        kind: EnumBlockKind::Sample,
        n_rows_lead: 0,
        rows: vec![
            SpecBlockRow::new(0, derive_title_cells(derive_block_title(EnumBlockKind::Sample))),
            SpecBlockRow::new(0, l_values),
            SpecBlockRow::new(0, vec![SpecCell::plain(derive_sample_dashes())]),
        ],
        n_rows_trail: 1,
    }
}

/// Household title, then one left-aligned row per member from column 2.
///
/// The title is always written; without members the cursor ends on the row below it.
pub fn build_household_block(members: &[SpecHouseholdMember], n_len_wrap_min: usize) -> SpecBlock {
    let mut l_rows = vec![SpecBlockRow::new(
        0,
        derive_title_cells(derive_block_title(EnumBlockKind::Household)),
    )];

    for member in members {
        let l_cells = [&member.birth_year, &member.relationship]
            .into_iter()
            .map(|val| {
                let mut cell = SpecCell::body(val.as_str(), n_len_wrap_min);
                cell.style.if_align_left = true;
                cell
            })
            .collect();
        l_rows.push(SpecBlockRow::new(1, l_cells));
    }

    SpecBlock {
        kind: EnumBlockKind::Household,
        n_rows_lead: 0,
        rows: l_rows,
        n_rows_trail: if members.is_empty() { 1 } else { 0 },
    }
}

/// One row per distinct subsidized crop.
///
/// Returns the block together with the distinct crop names.
pub fn build_crop_subsidy_block(
    crop_sbdy: &[SpecCropSubsidy],
    n_len_wrap_min: usize,
) -> Option<(SpecBlock, SpecCropSet)> {
    if crop_sbdy.is_empty() {
        return None;
    }

    let crop_set = derive_distinct_crops(crop_sbdy);
    let mut l_rows = vec![SpecBlockRow::new(
        0,
        derive_title_cells(derive_block_title(EnumBlockKind::CropSubsidy)),
    )];
    for (n_idx, c_crop) in crop_set.iter().enumerate() {
        l_rows.push(SpecBlockRow::new(
            1,
            vec![
                SpecCell::body((n_idx + 1).to_string(), n_len_wrap_min),
                SpecCell::body(c_crop, n_len_wrap_min),
                SpecCell::body(C_CROP_SUBSIDY_FLAG, n_len_wrap_min),
            ],
        ));
    }

    Some((
        SpecBlock {
            kind: EnumBlockKind::CropSubsidy,
            n_rows_lead: 2,
            rows: l_rows,
            n_rows_trail: 0,
        },
        crop_set,
    ))
}

/// One row per `(disaster, crop)` with the summed area; adds crops to `crop_set`.
pub fn build_disaster_block(
    disaster: &[SpecDisaster],
    crop_set: &mut SpecCropSet,
    n_len_wrap_min: usize,
) -> Result<Option<SpecBlock>, ReportError> {
    if disaster.is_empty() {
        return Ok(None);
    }

    let l_totals = aggregate_disasters(disaster)?;
    let mut l_rows = vec![SpecBlockRow::new(
        0,
        derive_title_cells(derive_block_title(EnumBlockKind::Disaster)),
    )];
    for (n_idx, total) in l_totals.iter().enumerate() {
        crop_set.insert(&total.crop_name);
        l_rows.push(SpecBlockRow::new(
            1,
            vec![
                SpecCell::body((n_idx + 1).to_string(), n_len_wrap_min),
                SpecCell::body(total.disaster_name.as_str(), n_len_wrap_min),
                SpecCell::body(total.crop_name.as_str(), n_len_wrap_min),
                SpecCell::body(EnumCellValue::Number(total.area), n_len_wrap_min),
            ],
        ));
    }

    Ok(Some(SpecBlock {
        kind: EnumBlockKind::Disaster,
        n_rows_lead: 2,
        rows: l_rows,
        n_rows_trail: 0,
    }))
}

/// Single row listing every crop seen in the subsidy and disaster blocks.
pub fn build_crop_names_block(crop_set: &SpecCropSet, n_len_wrap_min: usize) -> Option<SpecBlock> {
    if crop_set.is_empty() {
        return None;
    }

    let mut l_cells = derive_title_cells(derive_block_title(EnumBlockKind::CropNames));
    l_cells.push(SpecCell::body(crop_set.join(), n_len_wrap_min));

    Some(SpecBlock {
        kind: EnumBlockKind::CropNames,
        n_rows_lead: 2,
        rows: vec![SpecBlockRow::new(0, l_cells)],
        n_rows_trail: 0,
    })
}

/// Monthly counts split into two half-year groups, each under its own title row.
///
/// Values past the twelfth month are dropped; both cases of a list that is not
/// exactly twelve long add a warning.
pub fn build_monthly_hire_block(
    values: &[u32],
    is_104y: bool,
    n_len_wrap_min: usize,
    warnings: &mut Vec<String>,
) -> Option<SpecBlock> {
    if values.is_empty() {
        return None;
    }

    let kind = if is_104y {
        EnumBlockKind::MonthlyHire104y
    } else {
        EnumBlockKind::MonthlyShortHire106y
    };
    if values.len() != N_MONTHS_YEAR {
        warnings.push(format!(
            "{kind:?}: expected {N_MONTHS_YEAR} monthly values, got {}",
            values.len()
        ));
    }

    let l_values = &values[..values.len().min(N_MONTHS_YEAR)];
    let (l_first, l_second) = l_values.split_at(l_values.len().min(N_MONTHS_HALF));
    let derive_value_cells = |l_part: &[u32]| -> Vec<SpecCell> {
        l_part
            .iter()
            .map(|val| SpecCell::body(val.to_string(), n_len_wrap_min))
            .collect()
    };

    Some(SpecBlock {
        kind,
        n_rows_lead: 2,
        rows: vec![
            SpecBlockRow::new(0, derive_title_cells(&hire_title(is_104y))),
            SpecBlockRow::new(1, derive_value_cells(l_first)),
            SpecBlockRow::new(1, derive_title_cells(&TUP_MONTHS_SECOND_HALF)),
            SpecBlockRow::new(1, derive_value_cells(l_second)),
        ],
        n_rows_trail: 0,
    })
}

/// Parallel rows (product, work type, head count, months) for hire/lack lists.
///
/// The product row is only present for [`EnumLaborCount::TemporaryLack`], and
/// then every entry must carry a product name.
pub fn build_labor_block(
    entries: &[SpecLaborEntry],
    count: EnumLaborCount,
    n_len_wrap_min: usize,
) -> Result<Option<SpecBlock>, ReportError> {
    if entries.is_empty() {
        return Ok(None);
    }
    let kind = count.block_kind();

    let derive_row = |c_label: &str, l_values: Vec<String>| -> Vec<SpecCell> {
        let mut l_cells = vec![SpecCell::title(c_label)];
        l_cells.extend(
            l_values
                .into_iter()
                .map(|val| SpecCell::body(val, n_len_wrap_min)),
        );
        l_cells
    };

    let mut l_rows_cells = Vec::with_capacity(4);
    if count == EnumLaborCount::TemporaryLack {
        let l_products = entries
            .iter()
            .map(|entry| {
                entry
                    .product_name
                    .as_deref()
                    .map(strip_ideographic_space)
                    .ok_or(ReportError::MissingField {
                        block: kind,
                        field: "產品名稱",
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        l_rows_cells.push(derive_row(C_LABEL_PRODUCT, l_products));
    }
    l_rows_cells.push(derive_row(
        C_LABEL_WORK_TYPE,
        entries.iter().map(|entry| entry.work_type.clone()).collect(),
    ));
    l_rows_cells.push(derive_row(
        count.label(),
        entries
            .iter()
            .map(|entry| entry.headcount.to_string())
            .collect(),
    ));
    l_rows_cells.push(derive_row(
        C_LABEL_MONTHS,
        entries
            .iter()
            .map(|entry| join_months(&entry.months))
            .collect(),
    ));

    let mut l_rows = Vec::with_capacity(l_rows_cells.len());
    for (n_idx, l_cells) in l_rows_cells.into_iter().enumerate() {
        if n_idx == 0 {
            let mut l_cells_first = derive_title_cells(derive_block_title(kind));
            l_cells_first.extend(l_cells);
            l_rows.push(SpecBlockRow::new(0, l_cells_first));
        } else {
            l_rows.push(SpecBlockRow::new(1, l_cells));
        }
    }

    Ok(Some(SpecBlock {
        kind,
        n_rows_lead: 2,
        rows: l_rows,
        n_rows_trail: 0,
    }))
}

/// Free-text description of the labor shortage.
pub fn build_lack_situation_block(text: &str, n_len_wrap_min: usize) -> Option<SpecBlock> {
    if text.is_empty() {
        return None;
    }

    let mut l_cells = derive_title_cells(derive_block_title(EnumBlockKind::LackSituation));
    l_cells.push(SpecCell::body(text, n_len_wrap_min));

    Some(SpecBlock {
        kind: EnumBlockKind::LackSituation,
        n_rows_lead: 2,
        rows: vec![SpecBlockRow::new(0, l_cells)],
        n_rows_trail: 0,
    })
}

/// `=` line after a record, followed by one blank row.
pub fn build_separator_block() -> SpecBlock {
    SpecBlock {
        kind: EnumBlockKind::Separator,
        n_rows_lead: 1,
        rows: vec![SpecBlockRow::new(
            0,
            vec![SpecCell::plain(derive_record_separator())],
        )],
        n_rows_trail: 2,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
