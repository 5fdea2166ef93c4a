//! The note entity and its input/change types.

use std::fmt;

use bson::{Document, doc};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{self, FIELD_MAPPING};
use crate::id::NoteId;

/// A stored note. Values returned by the store are always fully populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier.
    pub id: NoteId,
    /// Title, not required to be unique.
    pub title: String,
    /// Body text.
    pub body: String,
    /// When the note was inserted. Never changes afterwards.
    pub created_at: DateTime<Utc>,
    /// When the note was last written. Never earlier than `created_at`.
    pub updated_at: DateTime<Utc>,
}

/// A note as handed to the store for insertion.
///
/// The store assigns the identifier when `id` is `None` and always stamps
/// both timestamps itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewNote {
    /// Identifier to insert under, or `None` to have one generated.
    pub id: Option<NoteId>,
    /// Title.
    pub title: String,
    /// Body text.
    pub body: String,
}

impl NewNote {
    /// Create a new note without an identifier.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            body: body.into(),
        }
    }

    /// Insert under a caller-chosen identifier.
    pub fn with_id(mut self, id: NoteId) -> Self {
        self.id = Some(id);
        self
    }

    /// Assign an id if missing and stamp both timestamps with `now`.
    pub(crate) fn stamp(self, now: DateTime<Utc>) -> Note {
        Note {
            id: self.id.unwrap_or_else(NoteId::new),
            title: self.title,
            body: self.body,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The fields of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteField {
    /// `id`
    Id,
    /// `title`
    Title,
    /// `body`
    Body,
    /// `created_at`
    CreatedAt,
    /// `updated_at`
    UpdatedAt,
}

impl NoteField {
    /// All fields, in document order.
    pub const ALL: [NoteField; 5] = [
        NoteField::Id,
        NoteField::Title,
        NoteField::Body,
        NoteField::CreatedAt,
        NoteField::UpdatedAt,
    ];

    /// The field name on the Rust side.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Body => "body",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }

    /// The key this field is stored under.
    pub fn document_key(&self) -> &'static str {
        FIELD_MAPPING
            .iter()
            .find(|(field, _)| field == self)
            .map(|(_, key)| *key)
            .unwrap_or_else(|| self.name())
    }

    /// Look up the field stored under `key`.
    pub fn from_document_key(key: &str) -> Option<Self> {
        FIELD_MAPPING
            .iter()
            .find(|(_, k)| *k == key)
            .map(|(field, _)| *field)
    }
}

impl fmt::Display for NoteField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of field changes for an update by id.
///
/// Only mutable fields can be set. `updated_at` is always refreshed by the
/// store, even when no field is changed.
///
/// ```rust,ignore
/// let changes = NoteUpdate::new().body("Some updated text");
/// store.update_by_id(&ctx, id, changes).await?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteUpdate {
    title: Option<String>,
    body: Option<String>,
}

impl NoteUpdate {
    /// Create an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a new title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set a new body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Check whether no field is changed.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none()
    }

    /// The fields this update changes, not counting `updated_at`.
    pub fn changed_fields(&self) -> Vec<NoteField> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push(NoteField::Title);
        }
        if self.body.is_some() {
            fields.push(NoteField::Body);
        }
        fields
    }

    /// Build the `$set` update document for these changes.
    pub(crate) fn to_update_document(&self, now: DateTime<Utc>) -> Document {
        let mut set = Document::new();
        if let Some(ref title) = self.title {
            set.insert(NoteField::Title.document_key(), title.as_str());
        }
        if let Some(ref body) = self.body {
            set.insert(NoteField::Body.document_key(), body.as_str());
        }
        set.insert(
            NoteField::UpdatedAt.document_key(),
            document::datetime_to_bson(now),
        );
        doc! { "$set": set }
    }
}
