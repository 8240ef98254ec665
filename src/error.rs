use core::fmt;

/// Result alias for `iterfit`.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse error category.
///
/// Every [`Error`] belongs to exactly one of these, so callers can branch on
/// the category without matching each variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A configuration value or count is out of range (k > n, zero steps, ...).
    InvalidParameter,
    /// Input data is malformed (bad choice groups, mismatched shapes).
    InvalidInput,
    /// A non-finite value appeared mid-computation.
    NumericInstability,
    /// A matrix that must be inverted is singular or not positive definite.
    IllConditioned,
}

/// Errors returned by estimation primitives.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// Dimension mismatch (usize).
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Shape mismatch (string description).
    ShapeMismatch {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        actual: String,
    },

    /// Invalid number of clusters requested.
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// Malformed input data.
    InvalidInput(String),

    /// Non-finite value produced while computing `context`.
    NumericInstability {
        /// What was being computed.
        context: &'static str,
    },

    /// Matrix inversion failed (singular or not positive definite).
    IllConditioned(String),

    /// The external optimizer failed.
    Optimizer(String),
}

impl Error {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyInput
            | Error::InvalidClusterCount { .. }
            | Error::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            Error::DimensionMismatch { .. }
            | Error::ShapeMismatch { .. }
            | Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::NumericInstability { .. } | Error::Optimizer(_) => {
                ErrorKind::NumericInstability
            }
            Error::IllConditioned(_) => ErrorKind::IllConditioned,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::ShapeMismatch { expected, actual } => {
                write!(f, "shape mismatch: expected {expected}, actual {actual}")
            }
            Error::InvalidClusterCount { requested, n_items } => {
                write!(f, "cannot create {requested} clusters from {n_items} items")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Error::NumericInstability { context } => {
                write!(f, "non-finite value while computing {context}")
            }
            Error::IllConditioned(msg) => write!(f, "ill-conditioned matrix: {msg}"),
            Error::Optimizer(msg) => write!(f, "optimizer failed: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_cover_the_taxonomy() {
        assert_eq!(Error::EmptyInput.kind(), ErrorKind::InvalidParameter);
        assert_eq!(
            Error::InvalidClusterCount { requested: 3, n_items: 2 }.kind(),
            ErrorKind::InvalidParameter
        );
        assert_eq!(
            Error::DimensionMismatch { expected: 2, found: 3 }.kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            Error::NumericInstability { context: "x" }.kind(),
            ErrorKind::NumericInstability
        );
        assert_eq!(
            Error::IllConditioned("singular".into()).kind(),
            ErrorKind::IllConditioned
        );
    }

    #[test]
    fn display_mentions_parameter_name() {
        let err = Error::InvalidParameter {
            name: "k",
            message: "must be > 0",
        };
        assert_eq!(err.to_string(), "invalid parameter 'k': must be > 0");
    }
}
