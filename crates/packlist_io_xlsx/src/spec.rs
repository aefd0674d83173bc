//! Shared grid, record, report and option models.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::util::convert_number_to_text;

////////////////////////////////////////////////////////////////////////////////
// #region CellAndGrid

/// Normalized cell value of a decoded grid or an output row.
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
    /// `true` for missing cells and text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            EnumCellValue::None => true,
            EnumCellValue::String(s) => s.trim().is_empty(),
            EnumCellValue::Number(_) => false,
        }
    }

    /// Stringify the cell, or return `default` when it is blank.
    pub fn as_text_or(&self, default: &str) -> String {
        match self {
            EnumCellValue::None => default.to_string(),
            EnumCellValue::String(s) if s.trim().is_empty() => default.to_string(),
            EnumCellValue::String(s) => s.clone(),
            EnumCellValue::Number(n) => convert_number_to_text(*n),
        }
    }

    /// Parse the cell as a finite number, or return `default`.
    pub fn as_number_or(&self, default: f64) -> f64 {
        match self {
            EnumCellValue::Number(n) if n.is_finite() => *n,
            EnumCellValue::String(s) => match s.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => n,
                _ => default,
            },
            _ => default,
        }
    }
}

/// Immutable row-major cell table decoded from one worksheet.
///
/// Rows may be jagged; a coordinate past the end of a short row reads as absent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecGrid {
    rows: Vec<Vec<EnumCellValue>>,
}

impl SpecGrid {
    /// Wrap already-decoded rows.
    pub fn from_rows(rows: Vec<Vec<EnumCellValue>>) -> Self {
        Self { rows }
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Length of the longest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cell at `(row, col)`; `None` when out of range.
    pub fn cell(&self, row: usize, col: usize) -> Option<&EnumCellValue> {
        self.rows.get(row)?.get(col)
    }

    /// Iterate rows starting at `row_start`, paired with their absolute index.
    pub fn rows_from(
        &self,
        row_start: usize,
    ) -> impl Iterator<Item = (usize, &[EnumCellValue])> + '_ {
        self.rows
            .iter()
            .enumerate()
            .skip(row_start)
            .map(|(n_idx, row)| (n_idx, row.as_slice()))
    }
}

/// Column reference resolved against a grid's width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumColumnIdentifier {
    /// Zero-based column index.
    Index(usize),
    /// Last column of the grid.
    Last,
}

impl EnumColumnIdentifier {
    /// Resolve to an absolute index; `None` when the grid has no such column.
    pub fn resolve(&self, width: usize) -> Option<usize> {
        match self {
            EnumColumnIdentifier::Index(n_idx) if *n_idx < width => Some(*n_idx),
            EnumColumnIdentifier::Index(_) => None,
            EnumColumnIdentifier::Last => width.checked_sub(1),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region HeaderFields

/// Business values read from fixed coordinates of the packing list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnumHeaderFieldKey {
    /// Delivery address block, copied into `notes`.
    ShipToInfo,
    /// Sales order number.
    SalesOrderNo,
    /// Sales order date.
    SalesOrderDate,
}

impl EnumHeaderFieldKey {
    /// Stable field name used in warnings and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            EnumHeaderFieldKey::ShipToInfo => "ship_to_info",
            EnumHeaderFieldKey::SalesOrderNo => "sales_order_no",
            EnumHeaderFieldKey::SalesOrderDate => "sales_order_date",
        }
    }
}

/// One entry of the coordinate table: where a header field lives and what
/// replaces it when the cell is unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecHeaderField {
    /// Field key.
    pub key: EnumHeaderFieldKey,
    /// Zero-based grid row.
    pub row: usize,
    /// Column reference.
    pub col: EnumColumnIdentifier,
    /// Substituted value when the cell is absent or blank.
    pub fallback: &'static str,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SalesOrderRecord

/// One normalized sales-order line.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSalesOrderRecord {
    /// Product description.
    pub description: String,
    /// Ordered quantity; `0` when the source cell was not numeric.
    pub quantity: f64,
    /// Unit price.
    pub price: f64,
    /// Customer name.
    pub customer_name: String,
    /// Sales order number.
    pub sales_order_no: String,
    /// Sales order date.
    pub sales_order_date: String,
    /// Delivery method.
    pub delivery_method: String,
    /// Ship-to block.
    pub notes: String,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReadOptions

/// Options for decoding a workbook into a [`SpecGrid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecGridReadOptions {
    /// Consume the first sheet row as column headers instead of grid data.
    pub if_first_row_is_header: bool,
}

impl Default for SpecGridReadOptions {
    fn default() -> Self {
        Self {
            if_first_row_is_header: true,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification with overlay semantics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Number format code.
    pub num_format: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
        }
    }
}

/// Autofit policy for column width inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitCellsPolicy {
    /// Max body rows inspected for width inference.
    pub height_body_inferred_max: Option<usize>,
    /// Minimum final width.
    pub width_cell_min: usize,
    /// Maximum final width.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            height_body_inferred_max: Some(20_000),
            width_cell_min: 8,
            width_cell_max: 60,
            width_cell_padding: 2,
        }
    }
}

/// Writer options for the sales-order sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxWriteOptions {
    /// Target sheet name (sanitized before use).
    pub sheet_name: String,
    /// Freeze the header row.
    pub if_freeze_header: bool,
    /// Column autofit policy; `None` disables autofit.
    pub policy_autofit: Option<SpecAutofitCellsPolicy>,
}

impl Default for SpecXlsxWriteOptions {
    fn default() -> Self {
        Self {
            sheet_name: crate::conf::C_OUTPUT_SHEET_NAME.to_string(),
            if_freeze_header: true,
            policy_autofit: Some(SpecAutofitCellsPolicy::default()),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Successful conversion: ordered records plus non-fatal diagnostics.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecConvertReport {
    /// Output records in product-block order.
    pub records: Vec<SpecSalesOrderRecord>,
    /// Non-fatal warnings (fallback substitutions).
    pub warnings: Vec<String>,
    /// Rows at or after the product-block start.
    pub n_rows_product_block: usize,
    /// Product-block rows dropped for a blank description.
    pub n_rows_skipped: usize,
    /// Records whose quantity was coerced to `0`.
    pub n_quantity_coerced: usize,
}

impl SpecConvertReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        let c_msg = msg.as_ref();
        tracing::warn!("{c_msg}");
        self.warnings.push(c_msg.to_string());
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, usize> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_records".to_string(), self.records.len());
        dict_counts.insert(
            "cnt_rows_product_block".to_string(),
            self.n_rows_product_block,
        );
        dict_counts.insert("cnt_rows_skipped".to_string(), self.n_rows_skipped);
        dict_counts.insert("cnt_quantity_coerced".to_string(), self.n_quantity_coerced);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count());
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} records={} block_rows={} skipped={} quantity_coerced={} warnings={}",
            self.records.len(),
            self.n_rows_product_block,
            self.n_rows_skipped,
            self.n_quantity_coerced,
            self.warning_count()
        )
    }
}

impl std::fmt::Display for SpecConvertReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format("[CONVERT]"))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Fatal conversion failure; no records are produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// Grid shape violates the minimal layout assumption.
    #[error("Excel file doesn't have expected columns (found {width})")]
    UnexpectedLayout {
        /// Observed grid width.
        width: usize,
    },
    /// A decoded sales-order sheet does not carry the expected header row.
    #[error("Unexpected sales order header: {0}")]
    UnexpectedHeader(String),
    /// File extension is not a supported spreadsheet container.
    #[error("Unsupported file type: {0:?} (expected .xlsx or .xls)")]
    UnsupportedFormat(String),
    /// Bytes could not be parsed as a workbook.
    #[error("Failed to read workbook: {0}")]
    UnreadableWorkbook(String),
    /// Workbook parsed but contains no worksheet.
    #[error("Workbook contains no sheets")]
    EmptyWorkbook,
}

/// Sales-order workbook encoding failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Records could not be shaped into a data frame.
    #[error("Failed to build sales order frame: {0}")]
    Frame(String),
    /// Workbook serialization failed.
    #[error("{0}")]
    Xlsx(String),
    /// Record count exceeds one worksheet.
    #[error("Too many rows for one worksheet: {0}")]
    TooManyRows(usize),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_coercions() {
        assert_eq!(EnumCellValue::Number(12.0).as_text_or("x"), "12");
        assert_eq!(EnumCellValue::Number(2.5).as_text_or("x"), "2.5");
        assert_eq!(EnumCellValue::String("  ".to_string()).as_text_or("x"), "x");
        assert_eq!(EnumCellValue::None.as_text_or("x"), "x");

        assert_eq!(EnumCellValue::String(" 7 ".to_string()).as_number_or(0.0), 7.0);
        assert_eq!(EnumCellValue::String("abc".to_string()).as_number_or(0.0), 0.0);
        assert_eq!(EnumCellValue::String("inf".to_string()).as_number_or(0.0), 0.0);
        assert_eq!(EnumCellValue::Number(f64::NAN).as_number_or(0.0), 0.0);
        assert_eq!(EnumCellValue::None.as_number_or(0.0), 0.0);
    }

    #[test]
    fn test_grid_jagged_access() {
        let grid = SpecGrid::from_rows(vec![
            vec![EnumCellValue::Number(1.0)],
            vec![EnumCellValue::None, EnumCellValue::None, EnumCellValue::Number(3.0)],
        ]);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.cell(0, 2), None);
        assert_eq!(grid.cell(1, 2), Some(&EnumCellValue::Number(3.0)));
        assert_eq!(grid.cell(5, 0), None);
    }

    #[test]
    fn test_column_identifier_resolve() {
        assert_eq!(EnumColumnIdentifier::Last.resolve(0), None);
        assert_eq!(EnumColumnIdentifier::Last.resolve(4), Some(3));
        assert_eq!(EnumColumnIdentifier::Index(3).resolve(3), None);
        assert_eq!(EnumColumnIdentifier::Index(3).resolve(4), Some(3));
    }

    #[test]
    fn test_report_format() {
        let mut report = SpecConvertReport::default();
        report.warn("w1");
        assert_eq!(report.to_dict()["cnt_warnings"], 1);
        assert_eq!(
            report.to_string(),
            "[CONVERT] records=0 block_rows=0 skipped=0 quantity_coerced=0 warnings=1"
        );
    }
}
