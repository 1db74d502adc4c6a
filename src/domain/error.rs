//! Domain error types.

/// A parse error with position information for decision-table parsing.
#[derive(Debug, Clone, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct TableParseError {
    pub message: String,
    pub position: usize,
}

impl TableParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Top-level error type for pairtrader.
#[derive(Debug, thiserror::Error)]
pub enum PairtraderError {
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

    #[error(transparent)]
    TableParse(#[from] TableParseError),

    #[error("return resampling outside real domain: (1 + {returns})^({n}/{m})")]
    Domain { returns: f64, n: f64, m: f64 },

    #[error("insufficient data for curve fit: have {have} paired samples, need {need}")]
    InsufficientData { have: usize, need: usize },

    #[error("degenerate curve fit: normal equations are singular")]
    SingularFit,

    #[error("invalid price {price} on {date}")]
    InvalidPrice { price: f64, date: chrono::NaiveDate },

    #[error("missing external data: {reason}")]
    MissingExternalData { reason: String },

    #[error("price rows not strictly ascending at {date}")]
    UnsortedRows { date: chrono::NaiveDate },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&PairtraderError> for std::process::ExitCode {
    fn from(err: &PairtraderError) -> Self {
        let code: u8 = match err {
            PairtraderError::Io(_) => 1,
            PairtraderError::ConfigParse { .. }
            | PairtraderError::ConfigMissing { .. }
            | PairtraderError::ConfigInvalid { .. } => 2,
            PairtraderError::MissingExternalData { .. } => 3,
            PairtraderError::TableParse(_) => 4,
            PairtraderError::Domain { .. }
            | PairtraderError::InsufficientData { .. }
            | PairtraderError::SingularFit
            | PairtraderError::InvalidPrice { .. }
            | PairtraderError::UnsortedRows { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
