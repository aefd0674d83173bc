//! XLSX writer kernel that renders sales-order frames into workbook bytes.

use polars::prelude::DataFrame;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

use crate::conf::{EnumFmtKey, N_NROWS_EXCEL_MAX, derive_default_xlsx_formats};
use crate::frame::{derive_cell_value_from_any_value, derive_dataframe_from_records};
use crate::spec::{
    EncodeError, EnumCellValue, SpecAutofitCellsPolicy, SpecCellFormat, SpecSalesOrderRecord,
    SpecXlsxWriteOptions,
};
use crate::util::{
    calculate_column_width, convert_number_to_text, estimate_cell_text_width, sanitize_sheet_name,
};

/// Stateful in-memory workbook writer holding one sales-order sheet.
///
/// The sheet is buffered until [`Self::close`] returns the encoded bytes.
pub struct SalesOrderWriter {
    workbook: Workbook,
    fmt_text: SpecCellFormat,
    fmt_number: SpecCellFormat,
    fmt_header: SpecCellFormat,
    write_options: SpecXlsxWriteOptions,
    if_sheet_written: bool,
    if_closed: bool,
}

impl SalesOrderWriter {
    /// Create writer with explicit format presets.
    pub fn new(
        fmt_text: SpecCellFormat,
        fmt_number: SpecCellFormat,
        fmt_header: SpecCellFormat,
        write_options: SpecXlsxWriteOptions,
    ) -> Self {
        Self {
            workbook: Workbook::new(),
            fmt_text,
            fmt_number,
            fmt_header,
            write_options,
            if_sheet_written: false,
            if_closed: false,
        }
    }

    /// Create writer with the presets from [`derive_default_xlsx_formats`].
    pub fn with_default_formats(write_options: SpecXlsxWriteOptions) -> Self {
        let dict_default_fmts = derive_default_xlsx_formats();
        let select_fmt =
            |key: EnumFmtKey| dict_default_fmts.get(key.as_str()).cloned().unwrap_or_default();
        Self::new(
            select_fmt(EnumFmtKey::Text),
            select_fmt(EnumFmtKey::Number),
            select_fmt(EnumFmtKey::Header),
            write_options,
        )
    }

    /// Write records as one sheet.
    pub fn write_sheet_from_records(
        &mut self,
        records: &[SpecSalesOrderRecord],
    ) -> Result<String, EncodeError> {
        let df = derive_dataframe_from_records(records)?;
        self.write_sheet_from_dataframe(&df)
    }

    /// Write the sheet from an in-memory frame; returns the sheet name used.
    pub fn write_sheet_from_dataframe(
        &mut self,
        df_data: &DataFrame,
    ) -> Result<String, EncodeError> {
        if self.if_closed {
            return Err(EncodeError::Xlsx("Cannot write after close().".to_string()));
        }
        if self.if_sheet_written {
            return Err(EncodeError::Xlsx("Sales order sheet already written.".to_string()));
        }
        if df_data.height() + 1 > N_NROWS_EXCEL_MAX {
            return Err(EncodeError::TooManyRows(df_data.height()));
        }
        let sheet_name = self.write_sheet(df_data).map_err(EncodeError::Xlsx)?;
        self.if_sheet_written = true;
        Ok(sheet_name)
    }

    /// Serialize the workbook. Further writes are rejected.
    pub fn close(&mut self) -> Result<Vec<u8>, EncodeError> {
        if self.if_closed {
            return Err(EncodeError::Xlsx("Workbook already closed.".to_string()));
        }
        let v_xlsx = self
            .workbook
            .save_to_buffer()
            .map_err(|err| EncodeError::Xlsx(derive_xlsx_error_text(err)))?;
        self.if_closed = true;
        Ok(v_xlsx)
    }

    fn write_sheet(&mut self, df_data: &DataFrame) -> Result<String, String> {
        let n_height_df = df_data.height();

        let l_colnames_df: Vec<String> = df_data
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect();

        let sheet_name = sanitize_sheet_name(&self.write_options.sheet_name, "_");
        let fmt_header = derive_rust_xlsx_format(&self.fmt_header);
        let fmt_text = derive_rust_xlsx_format(&self.fmt_text);
        let fmt_number = derive_rust_xlsx_format(&self.fmt_number);

        let worksheet = self.workbook.add_worksheet();
        worksheet
            .set_name(&sheet_name)
            .map_err(derive_xlsx_error_text)?;

        let mut l_width_by_col: Vec<usize> = l_colnames_df
            .iter()
            .map(|c_name| estimate_cell_text_width(c_name))
            .collect();

        for (n_idx_col, c_name) in l_colnames_df.iter().enumerate() {
            worksheet
                .write_string_with_format(0, cast_col_num(n_idx_col)?, c_name, &fmt_header)
                .map_err(derive_xlsx_error_text)?;
        }

        let n_rows_autofit = match &self.write_options.policy_autofit {
            Some(SpecAutofitCellsPolicy {
                height_body_inferred_max: Some(n_max),
                ..
            }) => usize::min(*n_max, n_height_df),
            Some(_) => n_height_df,
            None => 0,
        };

        for (n_idx_col, col) in df_data.get_columns().iter().enumerate() {
            let if_is_numeric_col = col.dtype().is_numeric();
            let fmt_col = if if_is_numeric_col {
                &fmt_number
            } else {
                &fmt_text
            };

            for n_idx_row in 0..n_height_df {
                let value = derive_cell_value_from_any_value(
                    col.get(n_idx_row)
                        .map_err(|err| format!("Failed to access cell value: {err}"))?,
                );

                if n_idx_row < n_rows_autofit {
                    l_width_by_col[n_idx_col] =
                        usize::max(l_width_by_col[n_idx_col], estimate_width_len(&value));
                }

                write_cell_with_format(worksheet, n_idx_row + 1, n_idx_col, &value, fmt_col)?;
            }
        }

        if self.write_options.if_freeze_header {
            worksheet
                .set_freeze_panes(1, 0)
                .map_err(derive_xlsx_error_text)?;
        }

        if let Some(policy_autofit) = &self.write_options.policy_autofit {
            for (n_idx_col, n_width_recorded) in l_width_by_col.iter().enumerate() {
                let n_width_final = calculate_column_width(
                    *n_width_recorded,
                    policy_autofit.width_cell_min,
                    policy_autofit.width_cell_max,
                    policy_autofit.width_cell_padding,
                );
                worksheet
                    .set_column_width(cast_col_num(n_idx_col)?, n_width_final as f64)
                    .map_err(derive_xlsx_error_text)?;
            }
        }

        tracing::debug!(
            sheet = %sheet_name,
            rows = n_height_df,
            cols = l_colnames_df.len(),
            "Wrote sales order sheet."
        );
        Ok(sheet_name)
    }
}

/// Encode records as a single-sheet `.xlsx` workbook (header row + one row per record).
pub fn encode_sales_order(records: &[SpecSalesOrderRecord]) -> Result<Vec<u8>, EncodeError> {
    let mut writer = SalesOrderWriter::with_default_formats(SpecXlsxWriteOptions::default());
    writer.write_sheet_from_records(records)?;
    writer.close()
}

/// Estimate displayed width units for one cell value.
pub fn estimate_width_len(value: &EnumCellValue) -> usize {
    match value {
        EnumCellValue::None => 0,
        EnumCellValue::String(s) => estimate_cell_text_width(s),
        EnumCellValue::Number(n) => convert_number_to_text(*n).len(),
    }
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), String> {
    match value {
        EnumCellValue::None => {
            worksheet
                .write_blank(cast_row_num(row_idx)?, cast_col_num(col_idx)?, format)
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::String(val) => {
            worksheet
                .write_string_with_format(
                    cast_row_num(row_idx)?,
                    cast_col_num(col_idx)?,
                    val,
                    format,
                )
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::Number(val) => {
            worksheet
                .write_number_with_format(
                    cast_row_num(row_idx)?,
                    cast_col_num(col_idx)?,
                    *val,
                    format,
                )
                .map_err(derive_xlsx_error_text)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("row index overflow: {value}"))
}

fn cast_col_num(value: usize) -> Result<u16, String> {
    u16::try_from(value).map_err(|_| format!("column index overflow: {value}"))
}

fn derive_xlsx_error_text(err: XlsxError) -> String {
    format!("xlsx write error: {err}")
}

#[cfg(test)]
mod tests {
    use calamine::{Reader, Xlsx};
    use proptest::prelude::*;

    use super::*;
    use crate::conf::TUP_SALES_ORDER_COLUMNS;
    use crate::reader::decode_sales_order;

    fn create_record(description: &str, quantity: f64, notes: &str) -> SpecSalesOrderRecord {
        SpecSalesOrderRecord {
            description: description.to_string(),
            quantity,
            price: 1.0,
            customer_name: "Profit Development LLC".to_string(),
            sales_order_no: "4501".to_string(),
            sales_order_date: "2024-03-01".to_string(),
            delivery_method: "send by us".to_string(),
            notes: notes.to_string(),
        }
    }

    fn read_sheet_names(v_xlsx: &[u8]) -> Vec<String> {
        let workbook = Xlsx::new(std::io::Cursor::new(v_xlsx)).unwrap();
        workbook.sheet_names()
    }

    #[test]
    fn test_encode_round_trip() {
        let records = vec![
            create_record("Widget A", 12.0, "ACME Corp\n1 Main St"),
            create_record("Widget B", 0.0, "ACME Corp\n1 Main St"),
            create_record("0042", 2.5, "ACME Corp\n1 Main St"),
        ];

        let v_xlsx = encode_sales_order(&records).unwrap();
        assert_eq!(read_sheet_names(&v_xlsx), vec!["Sheet1".to_string()]);
        assert_eq!(decode_sales_order(&v_xlsx).unwrap(), records);
    }

    #[test]
    fn test_encode_empty_records_keeps_header() {
        let v_xlsx = encode_sales_order(&[]).unwrap();
        assert!(decode_sales_order(&v_xlsx).unwrap().is_empty());
    }

    #[test]
    fn test_writer_rejects_write_after_close() {
        let mut writer = SalesOrderWriter::with_default_formats(SpecXlsxWriteOptions::default());
        writer
            .write_sheet_from_records(&[create_record("Widget A", 1.0, "n")])
            .unwrap();
        writer.close().unwrap();

        assert!(writer.write_sheet_from_records(&[]).is_err());
        assert!(writer.close().is_err());
    }

    #[test]
    fn test_writer_rejects_frame_taller_than_sheet() {
        use polars::prelude::Column;

        let df = DataFrame::new(vec![Column::new(
            "quantity".into(),
            vec![0.0f64; N_NROWS_EXCEL_MAX],
        )])
        .unwrap();
        let mut writer = SalesOrderWriter::with_default_formats(SpecXlsxWriteOptions::default());
        assert_eq!(
            writer.write_sheet_from_dataframe(&df),
            Err(EncodeError::TooManyRows(N_NROWS_EXCEL_MAX))
        );
    }

    #[test]
    fn test_writer_sanitizes_sheet_name_and_holds_one_sheet() {
        let mut writer = SalesOrderWriter::with_default_formats(SpecXlsxWriteOptions {
            sheet_name: "Orders/March".to_string(),
            if_freeze_header: false,
            policy_autofit: None,
        });
        let c_sheet = writer.write_sheet_from_records(&[]).unwrap();
        assert_eq!(c_sheet, "Orders_March");
        assert!(writer.write_sheet_from_records(&[]).is_err());

        let v_xlsx = writer.close().unwrap();
        assert_eq!(read_sheet_names(&v_xlsx), vec![c_sheet]);
    }

    #[test]
    fn test_encode_round_trip_keeps_control_and_escape_like_text() {
        let records = vec![
            create_record("Widget\u{7}A", 1.0, "ACME Corp\r\n1 Main St"),
            create_record("_x0041_ literal", 2.0, "ctrl\u{1}char _x005F_"),
        ];

        let v_xlsx = encode_sales_order(&records).unwrap();
        assert_eq!(decode_sales_order(&v_xlsx).unwrap(), records);
    }

    #[test]
    fn test_derive_format_border() {
        assert!(matches!(derive_format_border(1), FormatBorder::Thin));
        assert!(matches!(derive_format_border(0), FormatBorder::None));
    }

    #[test]
    fn test_default_formats_map_to_header_style() {
        let dict_fmt = derive_default_xlsx_formats();
        assert_eq!(dict_fmt["header"].bold, Some(true));
        assert_eq!(dict_fmt["number"].num_format.as_deref(), Some("General"));
        assert_eq!(TUP_SALES_ORDER_COLUMNS.len(), 8);
    }

    #[test]
    fn test_estimate_width_len() {
        assert_eq!(estimate_width_len(&EnumCellValue::None), 0);
        assert_eq!(estimate_width_len(&EnumCellValue::Number(12.0)), 2);
        assert_eq!(
            estimate_width_len(&EnumCellValue::String("ab\nabcde".to_string())),
            5
        );
    }

    const C_REGEX_TEXT: &str = "[A-Za-z0-9]([A-Za-z0-9 ,.]{0,10}[A-Za-z0-9])?";

    /// Text with a separator that the xlsx string encoding must escape or preserve.
    fn strategy_text() -> impl Strategy<Value = String> {
        (
            C_REGEX_TEXT,
            prop::sample::select(vec![
                "", " ", "_", "\r\n", "\n", "\t", "\u{1}", "\u{7}", "_x0041_", "_x005F_",
            ]),
            C_REGEX_TEXT,
        )
            .prop_map(|(c_head, c_sep, c_tail)| format!("{c_head}{c_sep}{c_tail}"))
    }

    fn strategy_record() -> impl Strategy<Value = SpecSalesOrderRecord> {
        (
            strategy_text(),
            -1e6f64..1e6f64,
            strategy_text(),
            strategy_text(),
            strategy_text(),
        )
            .prop_map(
                |(description, quantity, sales_order_no, sales_order_date, notes)| {
                    SpecSalesOrderRecord {
                        description,
                        quantity,
                        price: 1.0,
                        customer_name: "Profit Development LLC".to_string(),
                        sales_order_no,
                        sales_order_date,
                        delivery_method: "send by us".to_string(),
                        notes,
                    }
                },
            )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_decode_inverts_encode(
            records in prop::collection::vec(strategy_record(), 1..12)
        ) {
            let v_xlsx = encode_sales_order(&records).unwrap();
            prop_assert_eq!(decode_sales_order(&v_xlsx).unwrap(), records);
        }
    }
}
