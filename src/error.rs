//! Error types for metricache.

use thiserror::Error;

use crate::types::ValueKind;

/// Result type alias for metricache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Metric name is empty.
    #[error("fully-qualified name cannot be empty")]
    EmptyName,

    /// Label name and value sequences have different lengths.
    #[error("label names have different length than values: {names} names, {values} values")]
    LabelLengthMismatch {
        /// Number of label names supplied.
        names: usize,
        /// Number of label values supplied.
        values: usize,
    },

    /// Value kind that the cache cannot store.
    ///
    /// Unlike validation errors, this aborts the whole update batch.
    #[error("unsupported value kind: {0}")]
    UnsupportedValueKind(ValueKind),

    /// A deletion named a family that does not exist while its metric does.
    ///
    /// Indicates an index-consistency violation.
    #[error("could not remove metric from family {0}: family does not exist")]
    FamilyNotFound(String),

    /// A deletion's metric is not linked into its family's member list.
    ///
    /// Indicates an index-consistency violation.
    #[error("could not remove metric from family {family}: family does not have such metric")]
    MemberNotFound {
        /// Name of the family that should have contained the metric.
        family: String,
    },

    /// Several errors collected from a single update batch.
    #[error("{}", join_errors(.0))]
    Multiple(Vec<Error>),
}

impl Error {
    /// Collapse a list of collected errors into a single result.
    ///
    /// Empty list means success, a single error is returned as-is, and
    /// two or more are combined into [`Error::Multiple`].
    pub fn maybe_aggregate(mut errs: Vec<Error>) -> Result<()> {
        match errs.len() {
            0 => Ok(()),
            1 => Err(errs.remove(0)),
            _ => Err(Error::Multiple(errs)),
        }
    }
}

fn join_errors(errs: &[Error]) -> String {
    let messages: Vec<String> = errs.iter().map(|e| e.to_string()).collect();
    format!("{} errors occurred: {}", errs.len(), messages.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::EmptyName;
        assert_eq!(format!("{}", err), "fully-qualified name cannot be empty");

        let err = Error::LabelLengthMismatch { names: 2, values: 1 };
        assert_eq!(
            format!("{}", err),
            "label names have different length than values: 2 names, 1 values"
        );

        let err = Error::FamilyNotFound("requests_total".to_string());
        assert!(format!("{}", err).contains("requests_total"));
    }

    #[test]
    fn test_maybe_aggregate_empty() {
        assert_eq!(Error::maybe_aggregate(Vec::new()), Ok(()));
    }

    #[test]
    fn test_maybe_aggregate_single_is_unwrapped() {
        let result = Error::maybe_aggregate(vec![Error::EmptyName]);
        assert_eq!(result, Err(Error::EmptyName));
    }

    #[test]
    fn test_maybe_aggregate_many_are_combined() {
        let errs = vec![
            Error::EmptyName,
            Error::LabelLengthMismatch { names: 1, values: 0 },
        ];
        match Error::maybe_aggregate(errs) {
            Err(Error::Multiple(inner)) => {
                assert_eq!(inner.len(), 2);
                assert_eq!(inner[0], Error::EmptyName);
            }
            other => panic!("expected Multiple, got {:?}", other),
        }
    }

    #[test]
    fn test_multiple_display_joins_messages() {
        let err = Error::Multiple(vec![
            Error::EmptyName,
            Error::FamilyNotFound("f".to_string()),
        ]);
        let msg = format!("{}", err);
        assert!(msg.starts_with("2 errors occurred: "));
        assert!(msg.contains("fully-qualified name cannot be empty"));
        assert!(msg.contains("family f"));
    }
}
