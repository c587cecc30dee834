use std::collections::TryReserveError;

use thiserror::Error as ThisError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures surfaced by fallible tree operations.
///
/// Duplicate keys and missing keys are not errors; they are reported through
/// `bool` and count return values.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    #[error("failed to allocate tree node: {0}")]
    Alloc(#[from] TryReserveError),

    #[error("node index space exhausted ({limit} nodes)")]
    CapacityExceeded { limit: usize },
}
