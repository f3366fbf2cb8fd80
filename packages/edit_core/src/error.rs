/// Errors produced while encoding or decoding an edit frame.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("empty frame")]
    Empty,

    #[error("malformed edit: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("insert is missing its character")]
    MissingChar,

    #[error("invalid code point {0:#x}")]
    InvalidChar(u32),
}

impl CodecError {
    /// Short stable name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Malformed(_) => "malformed",
            Self::MissingChar => "missing_char",
            Self::InvalidChar(_) => "invalid_char",
        }
    }
}
