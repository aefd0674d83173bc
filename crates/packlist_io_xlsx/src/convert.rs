//! Packing-list grid to sales-order records.
//!
//! Header fields come from the coordinate table in [`crate::conf::TUP_HEADER_FIELDS`];
//! line items come from the product block starting at
//! [`crate::conf::N_ROW_PRODUCT_BLOCK_START`]. Unusable header cells and quantities
//! degrade to fixed fallbacks and are reported as warnings. Only a grid too
//! narrow to hold a description column is fatal.

use std::collections::BTreeMap;

use crate::conf::{
    C_CUSTOMER_NAME, C_DELIVERY_METHOD, COL_QUANTITY, N_COL_DESCRIPTION, N_NCOLS_LAYOUT_MIN,
    N_PRICE_DEFAULT, N_QUANTITY_FALLBACK, N_ROW_PRODUCT_BLOCK_START, TUP_HEADER_FIELDS,
};
use crate::reader::{EnumWorkbookFormat, read_grid_from_bytes};
use crate::spec::{
    ConvertError, EnumCellValue, EnumHeaderFieldKey, SpecConvertReport, SpecGrid,
    SpecGridReadOptions, SpecHeaderField, SpecSalesOrderRecord,
};

/// Header values resolved for one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecHeaderValues {
    dict_values: BTreeMap<EnumHeaderFieldKey, String>,
}

impl SpecHeaderValues {
    /// Resolved value (or fallback) for `key`.
    pub fn get(&self, key: EnumHeaderFieldKey) -> &str {
        self.dict_values.get(&key).map(String::as_str).unwrap_or("")
    }
}

/// Read one header field; fall back (with a warning) when the cell is absent or blank.
pub fn extract_header_field(
    grid: &SpecGrid,
    field: &SpecHeaderField,
    report: &mut SpecConvertReport,
) -> String {
    let cell = field
        .col
        .resolve(grid.width())
        .and_then(|n_col| grid.cell(field.row, n_col));

    match cell {
        Some(value) if !value.is_blank() => value.as_text_or(field.fallback),
        Some(_) => {
            report.warn(format!(
                "{}: cell at row {} is empty; using {:?}.",
                field.key.as_str(),
                field.row,
                field.fallback
            ));
            field.fallback.to_string()
        }
        None => {
            report.warn(format!(
                "{}: cell at row {} ({:?}) is outside the sheet ({}x{}); using {:?}.",
                field.key.as_str(),
                field.row,
                field.col,
                grid.height(),
                grid.width(),
                field.fallback
            ));
            field.fallback.to_string()
        }
    }
}

/// Evaluate the whole coordinate table.
pub fn extract_header_values(grid: &SpecGrid, report: &mut SpecConvertReport) -> SpecHeaderValues {
    let dict_values = TUP_HEADER_FIELDS
        .iter()
        .map(|field| (field.key, extract_header_field(grid, field, report)))
        .collect();
    SpecHeaderValues { dict_values }
}

/// Convert a decoded packing-list grid into sales-order records.
///
/// `Ok` with zero records is a valid outcome (no product rows); `Err` means the
/// grid cannot be a packing list at all and nothing was produced.
pub fn convert_packing_list(grid: &SpecGrid) -> Result<SpecConvertReport, ConvertError> {
    let n_height = grid.height();
    let n_width = grid.width();
    tracing::debug!(height = n_height, width = n_width, "Converting packing list grid.");

    if n_width < N_NCOLS_LAYOUT_MIN {
        tracing::error!(width = n_width, "Packing list grid is too narrow.");
        return Err(ConvertError::UnexpectedLayout { width: n_width });
    }

    let mut report = SpecConvertReport::default();
    let header_values = extract_header_values(grid, &mut report);

    let n_col_quantity = COL_QUANTITY
        .resolve(n_width)
        .ok_or(ConvertError::UnexpectedLayout { width: n_width })?;

    let ship_to_info = header_values.get(EnumHeaderFieldKey::ShipToInfo);
    let sales_order_no = header_values.get(EnumHeaderFieldKey::SalesOrderNo);
    let sales_order_date = header_values.get(EnumHeaderFieldKey::SalesOrderDate);

    for (n_idx_row, row) in grid.rows_from(N_ROW_PRODUCT_BLOCK_START) {
        report.n_rows_product_block += 1;

        let description = match row.get(N_COL_DESCRIPTION) {
            Some(value) if !value.is_blank() => value.as_text_or(""),
            _ => {
                report.n_rows_skipped += 1;
                continue;
            }
        };

        let quantity = match row.get(n_col_quantity) {
            Some(value) => clean_quantity(n_idx_row, value, &mut report),
            None => clean_quantity(n_idx_row, &EnumCellValue::None, &mut report),
        };

        report.records.push(SpecSalesOrderRecord {
            description,
            quantity,
            price: N_PRICE_DEFAULT,
            customer_name: C_CUSTOMER_NAME.to_string(),
            sales_order_no: sales_order_no.to_string(),
            sales_order_date: sales_order_date.to_string(),
            delivery_method: C_DELIVERY_METHOD.to_string(),
            notes: ship_to_info.to_string(),
        });
    }

    tracing::debug!("{report}");
    Ok(report)
}

/// Decode workbook bytes and convert the first sheet.
pub fn convert_packing_list_bytes(
    data: &[u8],
    file_name: &str,
    options: &SpecGridReadOptions,
) -> Result<SpecConvertReport, ConvertError> {
    let format = EnumWorkbookFormat::from_file_name(file_name)?;
    let grid = read_grid_from_bytes(data, format, options)?;
    convert_packing_list(&grid)
}

fn clean_quantity(n_idx_row: usize, value: &EnumCellValue, report: &mut SpecConvertReport) -> f64 {
    let n_quantity = value.as_number_or(f64::NAN);
    if !n_quantity.is_nan() {
        return n_quantity;
    }

    report.n_quantity_coerced += 1;
    match value {
        EnumCellValue::None => report.warn(format!(
            "row {n_idx_row}: quantity is missing; using {N_QUANTITY_FALLBACK}."
        )),
        _ => report.warn(format!(
            "row {n_idx_row}: quantity {:?} is not numeric; using {N_QUANTITY_FALLBACK}.",
            value.as_text_or("")
        )),
    }
    N_QUANTITY_FALLBACK
}
