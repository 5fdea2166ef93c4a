//! Mapping between notes and their stored BSON documents.
//!
//! The mapping is explicit rather than structural: [`FIELD_MAPPING`] lists
//! every note field next to the key it is stored under, and [`decode`]
//! checks a document against that table before building a [`Note`].

use bson::{Bson, Document, oid::ObjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{NoteError, NoteResult};
use crate::id::NoteId;
use crate::note::{Note, NoteField};

/// Note field to document key, in document order.
pub const FIELD_MAPPING: [(NoteField, &str); 5] = [
    (NoteField::Id, "_id"),
    (NoteField::Title, "title"),
    (NoteField::Body, "body"),
    (NoteField::CreatedAt, "created_at"),
    (NoteField::UpdatedAt, "updated_at"),
];

/// The stored shape of a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteDocument {
    /// Object id, stored as `_id`.
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Title.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Creation time, millisecond precision.
    pub created_at: bson::DateTime,
    /// Last write time, millisecond precision.
    pub updated_at: bson::DateTime,
}

impl From<&Note> for NoteDocument {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id.object_id(),
            title: note.title.clone(),
            body: note.body.clone(),
            created_at: bson::DateTime::from_chrono(note.created_at),
            updated_at: bson::DateTime::from_chrono(note.updated_at),
        }
    }
}

impl TryFrom<NoteDocument> for Note {
    type Error = NoteError;

    fn try_from(doc: NoteDocument) -> NoteResult<Self> {
        if doc.updated_at < doc.created_at {
            return Err(NoteError::mapping(format!(
                "updated_at {} is before created_at {}",
                doc.updated_at, doc.created_at
            ))
            .for_note(Some(doc.id.into())));
        }

        Ok(Note {
            id: doc.id.into(),
            title: doc.title,
            body: doc.body,
            created_at: doc.created_at.to_chrono(),
            updated_at: doc.updated_at.to_chrono(),
        })
    }
}

/// Encode a note into its stored document.
pub fn encode(note: &Note) -> NoteResult<Document> {
    bson::to_document(&NoteDocument::from(note))
        .map_err(|e| NoteError::mapping(format!("failed to encode: {}", e)).for_note(Some(note.id)))
}

/// Decode a stored document into a note.
///
/// Every mapped key must be present. Keys outside the mapping are ignored.
pub fn decode(doc: Document) -> NoteResult<Note> {
    let id = doc.get_object_id("_id").ok().map(NoteId::from);
    for (field, key) in FIELD_MAPPING {
        if !doc.contains_key(key) {
            return Err(NoteError::mapping(format!(
                "document is missing '{}' (note field '{}')",
                key, field
            ))
            .for_note(id));
        }
    }

    for key in doc.keys() {
        if NoteField::from_document_key(key).is_none() {
            trace!(key = %key, "Ignoring unmapped document key");
        }
    }

    let stored: NoteDocument = bson::from_document(doc)
        .map_err(|e| NoteError::mapping(format!("failed to decode: {}", e)).for_note(id))?;
    Note::try_from(stored)
}

/// Convert a timestamp to a BSON datetime.
pub fn datetime_to_bson(dt: DateTime<Utc>) -> Bson {
    Bson::DateTime(bson::DateTime::from_chrono(dt))
}
