//! Note filter building.

use bson::{Bson, Document, doc};
use chrono::{DateTime, Utc};

use crate::document::datetime_to_bson;
use crate::id::NoteId;
use crate::note::NoteField;

/// Builder for note filters.
///
/// Conditions are expressed on note fields and translated to stored keys
/// through the field mapping. Several range conditions on one field are
/// combined rather than overwritten.
///
/// # Example
///
/// ```rust,ignore
/// use notekeep_mongodb::NoteFilter;
///
/// let filter = NoteFilter::all()
///     .title_contains("note")
///     .created_after(yesterday)
///     .created_before(now);
///
/// // Produces: { "title": { "$regex": "note", "$options": "i" },
/// //             "created_at": { "$gt": ..., "$lt": ... } }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteFilter {
    doc: Document,
}

impl NoteFilter {
    /// A filter matching every note.
    pub fn all() -> Self {
        Self::default()
    }

    /// Use a raw filter document as is.
    ///
    /// The document is not validated here; the backend rejects malformed
    /// filters with a query error.
    pub fn raw(doc: Document) -> Self {
        Self { doc }
    }

    /// Match the note with this id.
    pub fn by_id(id: NoteId) -> Self {
        Self::all().field_eq(NoteField::Id, id)
    }

    /// Match notes whose `field` equals `value`.
    pub fn field_eq(mut self, field: NoteField, value: impl Into<Bson>) -> Self {
        self.doc.insert(field.document_key(), value.into());
        self
    }

    /// Match notes with exactly this title.
    pub fn title_eq(self, title: impl Into<String>) -> Self {
        self.field_eq(NoteField::Title, title.into())
    }

    /// Match notes with exactly this body.
    pub fn body_eq(self, body: impl Into<String>) -> Self {
        self.field_eq(NoteField::Body, body.into())
    }

    /// Match notes whose title contains `text`, ignoring case.
    pub fn title_contains(self, text: &str) -> Self {
        self.matches(NoteField::Title, &regex_lite::escape(text), "i")
    }

    /// Match notes whose title matches a regular expression.
    pub fn title_matches(self, pattern: &str) -> Self {
        self.matches(NoteField::Title, pattern, "")
    }

    /// Match notes whose body contains `text`, ignoring case.
    pub fn body_contains(self, text: &str) -> Self {
        self.matches(NoteField::Body, &regex_lite::escape(text), "i")
    }

    /// Match notes whose `field` matches a regular expression.
    pub fn matches(mut self, field: NoteField, pattern: &str, options: &str) -> Self {
        let mut condition = doc! { "$regex": pattern };
        if !options.is_empty() {
            condition.insert("$options", options);
        }
        self.doc.insert(field.document_key(), condition);
        self
    }

    /// Match notes created strictly after `at`.
    pub fn created_after(self, at: DateTime<Utc>) -> Self {
        self.with_operator(NoteField::CreatedAt, "$gt", datetime_to_bson(at))
    }

    /// Match notes created strictly before `at`.
    pub fn created_before(self, at: DateTime<Utc>) -> Self {
        self.with_operator(NoteField::CreatedAt, "$lt", datetime_to_bson(at))
    }

    /// Match notes last written strictly after `at`.
    pub fn updated_after(self, at: DateTime<Utc>) -> Self {
        self.with_operator(NoteField::UpdatedAt, "$gt", datetime_to_bson(at))
    }

    /// Match notes last written strictly before `at`.
    pub fn updated_before(self, at: DateTime<Utc>) -> Self {
        self.with_operator(NoteField::UpdatedAt, "$lt", datetime_to_bson(at))
    }

    /// Match notes whose id is one of `ids`.
    pub fn id_in(self, ids: impl IntoIterator<Item = NoteId>) -> Self {
        let ids: Vec<Bson> = ids.into_iter().map(Bson::from).collect();
        self.with_operator(NoteField::Id, "$in", Bson::Array(ids))
    }

    /// Match notes satisfying any of `filters` ($or).
    pub fn any_of(mut self, filters: Vec<NoteFilter>) -> Self {
        let branches: Vec<Document> = filters.into_iter().map(NoteFilter::into_document).collect();
        self.doc.insert("$or", branches);
        self
    }

    /// Add an operator condition on a field, keeping existing operators.
    fn with_operator(mut self, field: NoteField, operator: &str, value: Bson) -> Self {
        let key = field.document_key();
        if let Some(Bson::Document(existing)) = self.doc.get_mut(key) {
            if existing.keys().all(|k| k.starts_with('$')) {
                existing.insert(operator, value);
                return self;
            }
        }

        let mut condition = Document::new();
        condition.insert(operator, value);
        self.doc.insert(key, condition);
        self
    }

    /// Check if the filter matches everything.
    pub fn is_all(&self) -> bool {
        self.doc.is_empty()
    }

    /// Borrow the filter document.
    pub fn as_document(&self) -> &Document {
        &self.doc
    }

    /// Build the filter document.
    pub fn into_document(self) -> Document {
        self.doc
    }
}

impl From<Document> for NoteFilter {
    fn from(doc: Document) -> Self {
        Self::raw(doc)
    }
}
