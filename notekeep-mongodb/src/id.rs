//! Note identifiers.
//!
//! Notes are keyed by MongoDB object ids. At the API boundary an id is a
//! plain 24-character hex string; [`NoteId`] is the parsed form.

use std::fmt;
use std::str::FromStr;

use bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{NoteError, NoteResult};

/// Unique identifier of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(ObjectId);

impl NoteId {
    /// Generate a fresh identifier on the client.
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    /// Parse an identifier from its hex representation.
    pub fn parse(s: &str) -> NoteResult<Self> {
        ObjectId::parse_str(s)
            .map(Self)
            .map_err(|e| NoteError::invalid_id(s, e.to_string()))
    }

    /// Render the identifier as a 24-character hex string.
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    /// Get the underlying object id.
    pub fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ObjectId> for NoteId {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

impl From<NoteId> for ObjectId {
    fn from(id: NoteId) -> Self {
        id.0
    }
}

impl From<NoteId> for bson::Bson {
    fn from(id: NoteId) -> Self {
        bson::Bson::ObjectId(id.0)
    }
}

impl FromStr for NoteId {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

impl Serialize for NoteId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for NoteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Anything a store operation accepts as a note identifier.
///
/// Strings are parsed on the way in, so a malformed id fails with
/// [`NoteError::InvalidId`] before any round trip is made.
pub trait IntoNoteId {
    /// Convert into a parsed identifier.
    fn into_note_id(self) -> NoteResult<NoteId>;
}

impl IntoNoteId for NoteId {
    fn into_note_id(self) -> NoteResult<NoteId> {
        Ok(self)
    }
}

impl IntoNoteId for &NoteId {
    fn into_note_id(self) -> NoteResult<NoteId> {
        Ok(*self)
    }
}

impl IntoNoteId for &str {
    fn into_note_id(self) -> NoteResult<NoteId> {
        NoteId::parse(self)
    }
}

impl IntoNoteId for String {
    fn into_note_id(self) -> NoteResult<NoteId> {
        NoteId::parse(&self)
    }
}

impl IntoNoteId for &String {
    fn into_note_id(self) -> NoteResult<NoteId> {
        NoteId::parse(self)
    }
}
