//! Persistence codec for the replicated store document.
//!
//! # Responsibility
//! - Encode `StoreDocument` as the JSON document kept in one storage slot.
//! - Restore it on load, falling back to the example dataset.
//!
//! # Invariants
//! - Only `projects` and `selectedProjectID` are ever written.
//! - Loading never fails: a missing, corrupt or unreadable slot yields the
//!   example document.

use super::StoreResult;
use crate::model::project::StoreDocument;
use crate::model::templates::example_document;
use crate::repo::slot_repo::SlotRepository;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Name of the single slot holding the whole document.
pub const STORAGE_SLOT_KEY: &str = "stitch-counter-storage";

#[derive(Debug)]
pub enum CodecError {
    Json(serde_json::Error),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid store document: {err}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Where the document returned by [`load_document`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Decoded from the storage slot.
    Stored,
    /// Slot absent (first run); example data used.
    Missing,
    /// Slot present but undecodable; example data used.
    Corrupt,
    /// Storage medium failed; example data used.
    Unavailable,
}

impl LoadSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::Missing => "missing",
            Self::Corrupt => "corrupt",
            Self::Unavailable => "unavailable",
        }
    }
}

pub fn encode_document(doc: &StoreDocument) -> Result<String, CodecError> {
    Ok(serde_json::to_string(doc)?)
}

pub fn decode_document(payload: &str) -> Result<StoreDocument, CodecError> {
    Ok(serde_json::from_str(payload)?)
}

/// Reads and decodes the store slot.
///
/// `now_ms` dates the example projects when falling back.
pub fn load_document<R: SlotRepository + ?Sized>(
    repo: &R,
    now_ms: i64,
) -> (StoreDocument, LoadSource) {
    let source = match repo.read_slot(STORAGE_SLOT_KEY) {
        Ok(Some(payload)) => match decode_document(&payload) {
            Ok(doc) => {
                info!(
                    "event=store_load module=codec status=ok source=stored projects={}",
                    doc.projects.len()
                );
                return (doc, LoadSource::Stored);
            }
            Err(err) => {
                warn!(
                    "event=store_load module=codec status=fallback source=corrupt bytes={} error={}",
                    payload.len(),
                    err
                );
                LoadSource::Corrupt
            }
        },
        Ok(None) => {
            info!("event=store_load module=codec status=fallback source=missing");
            LoadSource::Missing
        }
        Err(err) => {
            warn!(
                "event=store_load module=codec status=fallback source=unavailable error={}",
                err
            );
            LoadSource::Unavailable
        }
    };

    (example_document(now_ms), source)
}

/// Encodes `doc` and writes it to the store slot in full.
pub fn save_document<R: SlotRepository + ?Sized>(repo: &R, doc: &StoreDocument) -> StoreResult<()> {
    let payload = encode_document(doc)?;
    repo.write_slot(STORAGE_SLOT_KEY, &payload)?;
    Ok(())
}
