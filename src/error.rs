use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum IfsError {
    InvalidDimensions { width: u32, height: u32 },
    InvalidSimilitudeCount(usize),
    InvalidBlurWidth(u32),
    UnknownColorMode(String),
    UnknownGradient(String),
    IncompatibleCatalog { expected: u32, found: u32 },
    StateMismatch { field: &'static str, message: String },
}

impl fmt::Display for IfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimensions { width, height } => {
                write!(f, "invalid screen dimensions: {width}x{height}")
            }
            Self::InvalidSimilitudeCount(n) => {
                write!(f, "similitude count must be in 2..=5, got {n}")
            }
            Self::InvalidBlurWidth(w) => write!(f, "invalid blur width {w} (expected 3, 5 or 7)"),
            Self::UnknownColorMode(name) => write!(f, "unknown color mode: {name}"),
            Self::UnknownGradient(name) => write!(f, "unknown gradient: {name}"),
            Self::IncompatibleCatalog { expected, found } => write!(
                f,
                "gradient catalog version mismatch: expected {expected}, found {found}"
            ),
            Self::StateMismatch { field, message } => {
                write!(f, "state mismatch in {field}: {message}")
            }
        }
    }
}

impl std::error::Error for IfsError {}
