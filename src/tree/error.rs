use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Error during parsing or format handling (e.g., syntax error, bad tag)
    Format {
        /// A human-readable message explaining the error
        message: String,
        /// The line number (1-based)
        line: usize,
        /// The column number (1-based)
        column: usize,
    },
    /// Structural error (e.g., broker depth sequence not forming a rooted tree)
    Structure(String),
}

impl TreeError {
    pub fn format(message: impl Into<String>, line: usize, column: usize) -> Self {
        TreeError::Format {
            message: message.into(),
            line,
            column,
        }
    }

    pub fn structure(message: impl Into<String>) -> Self {
        TreeError::Structure(message.into())
    }
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::Format {
                message,
                line,
                column,
            } => {
                write!(f, "Format error at line {}, column {}: {}", line, column, message)
            }
            TreeError::Structure(msg) => write!(f, "Tree structure error: {}", msg),
        }
    }
}

impl std::error::Error for TreeError {}
