//! Sales-order records as a Polars `DataFrame`.

use polars::prelude::{AnyValue, Column, DataFrame, IpcWriter, SerWriter};

use crate::conf::TUP_SALES_ORDER_COLUMNS;
use crate::spec::{EncodeError, EnumCellValue, SpecSalesOrderRecord};

/// Shape records into an eight-column frame in output column order.
pub fn derive_dataframe_from_records(
    records: &[SpecSalesOrderRecord],
) -> Result<DataFrame, EncodeError> {
    let [
        c_description,
        c_quantity,
        c_price,
        c_customer_name,
        c_sales_order_no,
        c_sales_order_date,
        c_delivery_method,
        c_notes,
    ] = TUP_SALES_ORDER_COLUMNS;

    DataFrame::new(vec![
        derive_text_column(c_description, records, |r| r.description.as_str()),
        derive_number_column(c_quantity, records, |r| r.quantity),
        derive_number_column(c_price, records, |r| r.price),
        derive_text_column(c_customer_name, records, |r| r.customer_name.as_str()),
        derive_text_column(c_sales_order_no, records, |r| r.sales_order_no.as_str()),
        derive_text_column(c_sales_order_date, records, |r| r.sales_order_date.as_str()),
        derive_text_column(c_delivery_method, records, |r| r.delivery_method.as_str()),
        derive_text_column(c_notes, records, |r| r.notes.as_str()),
    ])
    .map_err(|err| EncodeError::Frame(err.to_string()))
}

fn derive_text_column(
    name: &str,
    records: &[SpecSalesOrderRecord],
    f: impl Fn(&SpecSalesOrderRecord) -> &str,
) -> Column {
    let l_values: Vec<&str> = records.iter().map(f).collect();
    Column::new(name.into(), l_values)
}

fn derive_number_column(
    name: &str,
    records: &[SpecSalesOrderRecord],
    f: impl Fn(&SpecSalesOrderRecord) -> f64,
) -> Column {
    let l_values: Vec<f64> = records.iter().map(f).collect();
    Column::new(name.into(), l_values)
}

/// Serialize records to Arrow IPC bytes for table previews.
pub fn derive_ipc_bytes_from_records(
    records: &[SpecSalesOrderRecord],
) -> Result<Vec<u8>, EncodeError> {
    let mut df = derive_dataframe_from_records(records)?;
    let mut v_ipc = Vec::new();
    IpcWriter::new(&mut v_ipc)
        .finish(&mut df)
        .map_err(|err| EncodeError::Frame(format!("Failed to write IPC bytes: {err}")))?;
    Ok(v_ipc)
}

/// Map one Polars scalar onto the writer's cell model.
pub fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::String(if val { "True" } else { "False" }.to_string())
        }
        AnyValue::UInt8(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int8(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int16(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use polars::prelude::{IpcReader, SerReader};

    use super::*;

    fn derive_dataframe_from_ipc_bytes(v_ipc_df: &[u8]) -> DataFrame {
        IpcReader::new(Cursor::new(v_ipc_df)).finish().unwrap()
    }

    fn create_record(description: &str, quantity: f64) -> SpecSalesOrderRecord {
        SpecSalesOrderRecord {
            description: description.to_string(),
            quantity,
            price: 1.0,
            customer_name: "Profit Development LLC".to_string(),
            sales_order_no: "SO-1".to_string(),
            sales_order_date: "2024-03-01".to_string(),
            delivery_method: "send by us".to_string(),
            notes: "Dock 4".to_string(),
        }
    }

    #[test]
    fn test_dataframe_columns_follow_output_order() {
        let df = derive_dataframe_from_records(&[
            create_record("Widget A", 12.0),
            create_record("Widget B", 0.0),
        ])
        .unwrap();

        let l_names: Vec<&str> = df.get_column_names_str().into_iter().collect();
        assert_eq!(l_names, TUP_SALES_ORDER_COLUMNS.to_vec());
        assert_eq!(df.height(), 2);
        assert!(df.get_columns()[1].dtype().is_numeric());
        assert!(!df.get_columns()[0].dtype().is_numeric());
    }

    #[test]
    fn test_empty_records_give_empty_frame() {
        let df = derive_dataframe_from_records(&[]).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), TUP_SALES_ORDER_COLUMNS.len());
    }

    #[test]
    fn test_ipc_bytes_read_back() {
        let v_ipc = derive_ipc_bytes_from_records(&[create_record("Widget A", 3.5)]).unwrap();
        let df = derive_dataframe_from_ipc_bytes(&v_ipc);

        assert_eq!(df.height(), 1);
        let c_col = &df.get_columns()[1];
        assert_eq!(
            derive_cell_value_from_any_value(c_col.get(0).unwrap()),
            EnumCellValue::Number(3.5)
        );
        assert_eq!(
            derive_cell_value_from_any_value(df.get_columns()[7].get(0).unwrap()),
            EnumCellValue::String("Dock 4".to_string())
        );
    }
}
