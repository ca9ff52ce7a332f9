//! Error types.
//!
//! - `IngestError`: file decoding and row normalization failures. Any of these
//!   aborts the whole run; no partial ingestion.
//! - `ForecastError`: per-company training failures. These never abort the
//!   batch; the company is skipped and reported.
//! - `AppError`: what the binary prints, plus its process exit code.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestError {
    #[error("Please upload an Excel file (.xlsx or .xls) or a .csv file, got '{0}'")]
    UnsupportedFile(String),

    #[error("Failed to open workbook '{path}': {message}")]
    Workbook { path: String, message: String },

    #[error("Workbook '{0}' has no sheets")]
    NoSheets(String),

    #[error("The first sheet of '{0}' has no header row")]
    EmptySheet(String),

    #[error("Failed to read CSV '{path}': {message}")]
    Csv { path: String, message: String },

    #[error(
        "Missing required data in row {row} ({field}). Please ensure all rows have date, company name, and profit columns."
    )]
    MissingField { row: usize, field: &'static str },

    #[error("Invalid date format in row {row}: '{value}'")]
    InvalidDate { row: usize, value: String },
}

impl IngestError {
    /// 1-based data row index for row-level errors.
    pub fn row(&self) -> Option<usize> {
        match self {
            IngestError::MissingField { row, .. } | IngestError::InvalidDate { row, .. } => Some(*row),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("needs at least {required} observations, got {got}")]
    TooFewObservations { required: usize, got: usize },

    #[error("training diverged (non-finite loss at epoch {epoch})")]
    Diverged { epoch: usize },

    #[error("future date overflows the calendar at step {step}")]
    DateOverflow { step: u32 },
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        AppError::new(2, err.to_string())
    }
}
