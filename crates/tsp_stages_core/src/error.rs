use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("empty input: {0}")]
    EmptyInput(String),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("perfect matching needs an even vertex count, got {size}")]
    OddSizeMismatch { size: usize },
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn empty_input(message: impl Into<String>) -> Self {
        Self::EmptyInput(message.into())
    }

    pub fn unsupported_algorithm(message: impl Into<String>) -> Self {
        Self::UnsupportedAlgorithm(message.into())
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InternalInvariantViolation(message.into())
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn odd_size_mismatch_reports_size() {
        let err = Error::OddSizeMismatch { size: 3 };
        assert_eq!(
            err.to_string(),
            "perfect matching needs an even vertex count, got 3"
        );
    }

    #[test]
    fn constructors_prefix_their_kind() {
        assert!(
            Error::invalid_input("bad lat")
                .to_string()
                .starts_with("invalid input:")
        );
        assert!(
            Error::unsupported_algorithm("zz")
                .to_string()
                .starts_with("unsupported algorithm:")
        );
    }
}
