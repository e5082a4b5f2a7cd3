//! Error - failure cases of the checked container operations
//!
//! Every fallible operation on the containers returns `Result<_, Error>`.
//! The variants are deliberately coarse: callers branch on "the position or
//! key does not exist" versus "there is nothing to take", and the cursor
//! protocol guarantees that misuse surfaces as one of these rather than as
//! silent corruption.

use thiserror::Error;

/// Failure cases of checked container operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The requested key, position or cursor does not address a live
    /// element. Raised by checked lookups of absent keys, removal of absent
    /// keys, navigation past a container boundary, and any use of the end
    /// position or of a cursor whose element has since been removed.
    #[error("no such element")]
    NoSuchElement,
    /// The container holds no elements to take. Raised by `pop_front` and
    /// `pop_back` on an empty list.
    #[error("collection is empty")]
    Empty,
}
