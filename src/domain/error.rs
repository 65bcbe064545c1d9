//! Domain error types.

/// A magnitude parse error carrying the offending input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot parse '{raw}' at position {position}: {message}")]
pub struct ParseError {
    pub raw: String,
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub(crate) fn new(raw: &str, message: impl Into<String>, position: usize) -> Self {
        Self {
            raw: raw.to_string(),
            message: message.into(),
            position,
        }
    }

    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self) -> String {
        // Positions are byte offsets; one inside a character points at that character.
        let offset = self
            .raw
            .char_indices()
            .take_while(|(i, c)| i + c.len_utf8() <= self.position)
            .count();
        let caret = " ".repeat(offset) + "^";
        format!("{}\n{caret}\n{self}", self.raw)
    }
}

/// Top-level error type for indexvol.
#[derive(Debug, thiserror::Error)]
pub enum IndexvolError {
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
    MagnitudeParse(#[from] ParseError),

    #[error("row {row}, column {column}: {source}")]
    Cell {
        row: usize,
        column: String,
        #[source]
        source: ParseError,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {code}")]
    NoData { code: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&IndexvolError> for std::process::ExitCode {
    fn from(err: &IndexvolError) -> Self {
        let code: u8 = match err {
            IndexvolError::Io(_) => 1,
            IndexvolError::ConfigParse { .. }
            | IndexvolError::ConfigMissing { .. }
            | IndexvolError::ConfigInvalid { .. } => 2,
            IndexvolError::Data { .. } => 3,
            IndexvolError::MagnitudeParse(_) | IndexvolError::Cell { .. } => 4,
            IndexvolError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
