//! Domain error types.

/// Top-level error type for foliotrack.
#[derive(Debug, thiserror::Error)]
pub enum FoliotrackError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid trade: {reason}")]
    InvalidTrade { reason: String },

    #[error("invalid cash event: {reason}")]
    InvalidCashEvent { reason: String },

    #[error("csv import error at record {record}: {reason}")]
    CsvImport { record: usize, reason: String },

    #[error("insufficient history for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("quote provider error: {reason}")]
    QuoteProvider { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&FoliotrackError> for std::process::ExitCode {
    fn from(err: &FoliotrackError) -> Self {
        let code: u8 = match err {
            FoliotrackError::Io(_) => 1,
            FoliotrackError::ConfigParse { .. }
            | FoliotrackError::ConfigMissing { .. }
            | FoliotrackError::ConfigInvalid { .. } => 2,
            FoliotrackError::Database { .. } | FoliotrackError::DatabaseQuery { .. } => 3,
            FoliotrackError::InvalidTrade { .. }
            | FoliotrackError::InvalidCashEvent { .. }
            | FoliotrackError::CsvImport { .. } => 4,
            FoliotrackError::InsufficientData { .. } => 5,
            FoliotrackError::QuoteProvider { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
