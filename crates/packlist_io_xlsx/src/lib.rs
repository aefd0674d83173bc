//! `packlist_io_xlsx` v1:
//! Packing-list to sales-order conversion kernel.
//!
//! Modules:
//! - `conf`    : layout coordinates, business constants and format presets
//! - `spec`    : cell/grid models, records, options, reports and errors
//! - `util`    : pure helper functions
//! - `reader`  : workbook bytes to cell grid
//! - `convert` : grid to sales-order records
//! - `frame`   : records as a Polars frame and IPC bytes
//! - `writer`  : records to `.xlsx` bytes
pub mod conf;
pub mod convert;
pub mod frame;
pub mod reader;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_CUSTOMER_NAME, C_DELIVERY_METHOD, C_OUTPUT_FILE_NAME, C_OUTPUT_MIME_TYPE,
    N_NROWS_EXCEL_MAX, N_PRICE_DEFAULT, N_ROW_PRODUCT_BLOCK_START, TUP_SALES_ORDER_COLUMNS,
};
pub use convert::{convert_packing_list, convert_packing_list_bytes};
pub use frame::{derive_dataframe_from_records, derive_ipc_bytes_from_records};
pub use reader::{EnumWorkbookFormat, decode_sales_order, read_grid_from_bytes};
pub use spec::{
    ConvertError, EncodeError, EnumCellValue, SpecConvertReport, SpecGrid, SpecGridReadOptions,
    SpecSalesOrderRecord, SpecXlsxWriteOptions,
};
pub use writer::{SalesOrderWriter, encode_sales_order};
