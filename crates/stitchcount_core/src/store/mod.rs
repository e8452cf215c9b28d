//! Durable project store, persistence codec and derived selectors.
//!
//! # Responsibility
//! - Own the in-memory `StoreDocument` of one context.
//! - Route every mutation through a single commit path that stamps,
//!   persists and then announces the change.
//! - Project the document into read-only views for UI collaborators.
//!
//! # Invariants
//! - A mutation that is applied is written to the slot before the next
//!   mutation in the same context starts.
//! - Not-found and invalid-input mutations leave the document untouched.

use crate::repo::slot_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod codec;
pub mod project_store;
pub mod selectors;

pub use codec::{CodecError, LoadSource, STORAGE_SLOT_KEY};
pub use project_store::ProjectStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of the durable medium while committing a mutation.
///
/// The in-memory document keeps the mutation; the next successful commit
/// persists it.
#[derive(Debug)]
pub enum StoreError {
    Repo(RepoError),
    Codec(CodecError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Codec(err) => Some(err),
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<CodecError> for StoreError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}
