use thiserror::Error;

/// Fatal ingestion failures. Everything softer than these (unrecognized
/// sheets, rejected rows, unparseable cells) is absorbed as omission or a
/// default value and never surfaces as an error.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("file bytes are not valid UTF-8 or GBK text; re-save as UTF-8 or GBK CSV")]
    Encoding,

    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to open workbook: {0}")]
    Excel(String),

    #[error("unsupported file format: {0}; expected .csv, .xlsx or .xls")]
    UnsupportedFormat(String),
}
