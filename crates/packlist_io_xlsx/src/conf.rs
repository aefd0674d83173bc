//! Packing-list layout constants, business constants and default presets.

use std::collections::BTreeMap;

use crate::spec::{EnumColumnIdentifier, EnumHeaderFieldKey, SpecCellFormat, SpecHeaderField};

////////////////////////////////////////////////////////////////////////////////
// #region PackingListLayout

/// Fallback for a missing ship-to block.
pub const C_FALLBACK_SHIP_TO_INFO: &str = "SHIP TO info not found";
/// Fallback for missing sales order number/date.
pub const C_FALLBACK_UNKNOWN: &str = "Unknown";

/// Coordinate table of header fields, evaluated in order.
pub const TUP_HEADER_FIELDS: [SpecHeaderField; 3] = [
    SpecHeaderField {
        key: EnumHeaderFieldKey::ShipToInfo,
        row: 6,
        col: EnumColumnIdentifier::Index(3),
        fallback: C_FALLBACK_SHIP_TO_INFO,
    },
    SpecHeaderField {
        key: EnumHeaderFieldKey::SalesOrderNo,
        row: 2,
        col: EnumColumnIdentifier::Last,
        fallback: C_FALLBACK_UNKNOWN,
    },
    SpecHeaderField {
        key: EnumHeaderFieldKey::SalesOrderDate,
        row: 1,
        col: EnumColumnIdentifier::Last,
        fallback: C_FALLBACK_UNKNOWN,
    },
];

/// First grid row of the product table.
pub const N_ROW_PRODUCT_BLOCK_START: usize = 14;
/// Product description column.
pub const N_COL_DESCRIPTION: usize = 1;
/// Quantity column.
pub const COL_QUANTITY: EnumColumnIdentifier = EnumColumnIdentifier::Last;
/// Minimum grid width for the layout to be usable.
pub const N_NCOLS_LAYOUT_MIN: usize = N_COL_DESCRIPTION + 1;
/// Substituted quantity for non-numeric or absent cells.
pub const N_QUANTITY_FALLBACK: f64 = 0.0;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SalesOrderConstants

/// Unit price written on every line.
pub const N_PRICE_DEFAULT: f64 = 1.0;
/// Customer written on every line.
pub const C_CUSTOMER_NAME: &str = "Profit Development LLC";
/// Delivery method written on every line.
pub const C_DELIVERY_METHOD: &str = "send by us";

/// Number of output columns.
pub const N_SALES_ORDER_COLUMNS: usize = 8;
/// Output header, in record field order.
pub const TUP_SALES_ORDER_COLUMNS: [&str; N_SALES_ORDER_COLUMNS] = [
    "description",
    "quantity",
    "price",
    "customer name",
    "sales order no.",
    "sales order date",
    "delivery method",
    "notes",
];

/// Download file name offered to the user.
pub const C_OUTPUT_FILE_NAME: &str = "Sales_Order_Output.xlsx";
/// MIME type of the encoded workbook.
pub const C_OUTPUT_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// Sheet name of the encoded workbook.
pub const C_OUTPUT_SHEET_NAME: &str = "Sheet1";

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExcelLimits

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FormatPresets

/// Canonical format preset keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFmtKey {
    /// Generic text cell format.
    Text,
    /// General number format.
    Number,
    /// Header cell format.
    Header,
}

impl EnumFmtKey {
    /// Preset map key.
    pub fn as_str(&self) -> &'static str {
        match self {
            EnumFmtKey::Text => "text",
            EnumFmtKey::Number => "number",
            EnumFmtKey::Header => "header",
        }
    }
}

/// Build default named format presets used by [`crate::writer::SalesOrderWriter`].
pub fn derive_default_xlsx_formats() -> BTreeMap<String, SpecCellFormat> {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_name: Some("Calibri".to_string()),
        font_size: Some(11),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert(
        EnumFmtKey::Text.as_str().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            align: Some("left".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Header.as_str().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            border: Some(1),
            align: Some("center".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Number.as_str().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some("General".to_string()),
            ..Default::default()
        }),
    );

    dict_fmt
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
