//! Workbook bytes to [`SpecGrid`] via `calamine`.

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Range, Reader, Sheets, Xls, Xlsx};
use chrono::{NaiveDateTime, Timelike};

use crate::conf::TUP_SALES_ORDER_COLUMNS;
use crate::spec::{
    ConvertError, EnumCellValue, SpecGrid, SpecGridReadOptions, SpecSalesOrderRecord,
};
use crate::util::decode_ooxml_escapes;

/// Accepted spreadsheet containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumWorkbookFormat {
    /// Office Open XML workbook (`.xlsx`).
    Xlsx,
    /// Legacy BIFF workbook (`.xls`).
    Xls,
}

impl EnumWorkbookFormat {
    /// Detect the container from a file name's extension.
    pub fn from_file_name(file_name: &str) -> Result<Self, ConvertError> {
        let c_ext = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match c_ext.as_str() {
            "xlsx" => Ok(Self::Xlsx),
            "xls" => Ok(Self::Xls),
            _ => Err(ConvertError::UnsupportedFormat(file_name.to_string())),
        }
    }
}

/// Decode the first worksheet of `data` into a grid anchored at cell A1.
pub fn read_grid_from_bytes(
    data: &[u8],
    format: EnumWorkbookFormat,
    options: &SpecGridReadOptions,
) -> Result<SpecGrid, ConvertError> {
    let mut workbook = open_workbook(data, format)?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ConvertError::EmptyWorkbook)?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|err| ConvertError::UnreadableWorkbook(format!("sheet {sheet_name:?}: {err}")))?;

    let grid = derive_grid_from_range(&range, format, options);
    tracing::debug!(
        sheet = %sheet_name,
        height = grid.height(),
        width = grid.width(),
        "Decoded worksheet."
    );
    Ok(grid)
}

/// Decode a workbook produced by [`crate::writer::encode_sales_order`].
pub fn decode_sales_order(data: &[u8]) -> Result<Vec<SpecSalesOrderRecord>, ConvertError> {
    let grid = read_grid_from_bytes(
        data,
        EnumWorkbookFormat::Xlsx,
        &SpecGridReadOptions {
            if_first_row_is_header: false,
        },
    )?;

    let l_header: Vec<String> = (0..grid.width())
        .map(|n_col| {
            grid.cell(0, n_col)
                .map(|value| value.as_text_or(""))
                .unwrap_or_default()
        })
        .collect();
    if !l_header.iter().map(String::as_str).eq(TUP_SALES_ORDER_COLUMNS) {
        return Err(ConvertError::UnexpectedHeader(format!("{l_header:?}")));
    }

    let text_at = |row: &[EnumCellValue], n_col: usize| {
        row.get(n_col)
            .map(|value| value.as_text_or(""))
            .unwrap_or_default()
    };
    let number_at = |row: &[EnumCellValue], n_col: usize| {
        row.get(n_col)
            .map(|value| value.as_number_or(0.0))
            .unwrap_or(0.0)
    };

    Ok(grid
        .rows_from(1)
        .map(|(_, row)| SpecSalesOrderRecord {
            description: text_at(row, 0),
            quantity: number_at(row, 1),
            price: number_at(row, 2),
            customer_name: text_at(row, 3),
            sales_order_no: text_at(row, 4),
            sales_order_date: text_at(row, 5),
            delivery_method: text_at(row, 6),
            notes: text_at(row, 7),
        })
        .collect())
}

fn open_workbook(
    data: &[u8],
    format: EnumWorkbookFormat,
) -> Result<Sheets<Cursor<&[u8]>>, ConvertError> {
    let cursor = Cursor::new(data);
    match format {
        EnumWorkbookFormat::Xlsx => Xlsx::new(cursor)
            .map(Sheets::Xlsx)
            .map_err(|err| ConvertError::UnreadableWorkbook(err.to_string())),
        EnumWorkbookFormat::Xls => Xls::new(cursor)
            .map(Sheets::Xls)
            .map_err(|err| ConvertError::UnreadableWorkbook(err.to_string())),
    }
}

fn derive_grid_from_range(
    range: &Range<Data>,
    format: EnumWorkbookFormat,
    options: &SpecGridReadOptions,
) -> SpecGrid {
    let Some((n_row_offset, n_col_offset)) = range.start() else {
        return SpecGrid::default();
    };
    let n_row_offset = n_row_offset as usize;
    let n_col_offset = n_col_offset as usize;
    let (_, n_width_range) = range.get_size();
    let n_width = n_col_offset + n_width_range;

    let mut l_rows = vec![vec![EnumCellValue::None; n_width]; n_row_offset];
    for row in range.rows() {
        let mut l_cells = vec![EnumCellValue::None; n_col_offset];
        l_cells.extend(row.iter().map(|value| derive_cell_value_from_data(value, format)));
        l_rows.push(l_cells);
    }

    if options.if_first_row_is_header && !l_rows.is_empty() {
        l_rows.remove(0);
    }
    SpecGrid::from_rows(l_rows)
}

fn derive_cell_value_from_data(value: &Data, format: EnumWorkbookFormat) -> EnumCellValue {
    match value {
        Data::Empty | Data::Error(_) => EnumCellValue::None,
        Data::String(val) => match format {
            EnumWorkbookFormat::Xlsx => {
                EnumCellValue::String(decode_ooxml_escapes(val).into_owned())
            }
            EnumWorkbookFormat::Xls => EnumCellValue::String(val.clone()),
        },
        Data::Float(val) => EnumCellValue::Number(*val),
        Data::Int(val) => EnumCellValue::Number(*val as f64),
        Data::Bool(val) => EnumCellValue::String(if *val { "True" } else { "False" }.to_string()),
        Data::DateTime(val) => match val.as_datetime() {
            Some(dt) => EnumCellValue::String(derive_datetime_text(&dt)),
            None => EnumCellValue::Number(val.as_f64()),
        },
        Data::DateTimeIso(val) | Data::DurationIso(val) => EnumCellValue::String(val.clone()),
    }
}

fn derive_datetime_text(dt: &NaiveDateTime) -> String {
    if dt.time().num_seconds_from_midnight() == 0 && dt.nanosecond() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
