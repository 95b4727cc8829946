//! Shape checks for incoming create/update payloads.
//!
//! Validators never touch storage: whether a referenced id exists is decided
//! later by the storage layer.

use serde_json::{Map, Value};

use crate::domain::id::{AlbumId, ArtistId};

pub mod error;

use error::{FieldViolation, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistPayload {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumPayload {
    pub title: String,
    pub artist_id: ArtistId,
    pub release_year: i32,
}

/// Only `title` is stored for a song.
///
/// Clients may also send `artist_id`, `album_id` or `release_date`; those are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongPayload {
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachPayload {
    pub album_id: AlbumId,
    pub track_number: u32,
}

pub fn validate_artist(input: &Value) -> Result<ArtistPayload, ValidationError> {
    let mut fields = Fields::new(input);
    let name = fields.non_empty_string("name");

    match name {
        Some(name) => Ok(ArtistPayload { name }),
        None => Err(fields.into_error()),
    }
}

pub fn validate_album(input: &Value) -> Result<AlbumPayload, ValidationError> {
    let mut fields = Fields::new(input);
    let title = fields.non_empty_string("title");
    let artist_id = fields.positive_integer("artist_id");
    let release_year = fields.integer("release_year");

    match (title, artist_id, release_year) {
        (Some(title), Some(artist_id), Some(release_year)) => Ok(AlbumPayload {
            title,
            artist_id: ArtistId(artist_id),
            release_year,
        }),
        _ => Err(fields.into_error()),
    }
}

pub fn validate_song(input: &Value) -> Result<SongPayload, ValidationError> {
    let mut fields = Fields::new(input);
    let title = fields.non_empty_string("title");

    match title {
        Some(title) => Ok(SongPayload { title }),
        None => Err(fields.into_error()),
    }
}

pub fn validate_attach(input: &Value) -> Result<AttachPayload, ValidationError> {
    let mut fields = Fields::new(input);
    let album_id = fields.positive_integer("album_id");
    let track_number = fields.positive_integer("track_number");

    match (album_id, track_number) {
        (Some(album_id), Some(track_number)) => Ok(AttachPayload {
            album_id: AlbumId(album_id),
            track_number,
        }),
        _ => Err(fields.into_error()),
    }
}

/// Collects violations across all fields of one payload.
///
/// Each helper returns `None` exactly when it recorded a violation.
struct Fields<'a> {
    object: Option<&'a Map<String, Value>>,
    violations: Vec<FieldViolation>,
}

impl<'a> Fields<'a> {
    fn new(input: &'a Value) -> Self {
        Self {
            object: input.as_object(),
            violations: Vec::new(),
        }
    }

    fn into_error(self) -> ValidationError {
        ValidationError {
            violations: self.violations,
        }
    }

    fn violation(&mut self, field: &'static str, problem: &str) {
        self.violations.push(FieldViolation {
            field,
            message: format!("The {} field {problem}.", field.replace('_', " ")),
        });
    }

    /// present and not null
    fn required(&mut self, field: &'static str) -> Option<&'a Value> {
        match self.object.and_then(|o| o.get(field)) {
            Some(Value::Null) | None => {
                self.violation(field, "is required");
                None
            }
            Some(value) => Some(value),
        }
    }

    fn non_empty_string(&mut self, field: &'static str) -> Option<String> {
        let value = self.required(field)?;
        let Some(s) = value.as_str() else {
            self.violation(field, "must be a string");
            return None;
        };
        let trimmed = s.trim();
        if trimmed.is_empty() {
            self.violation(field, "must not be empty");
            return None;
        }
        Some(trimmed.to_string())
    }

    fn integer<T: TryFrom<i64>>(&mut self, field: &'static str) -> Option<T> {
        let value = self.required(field)?;
        match value.as_i64().map(T::try_from) {
            Some(Ok(n)) => Some(n),
            // integers above i64::MAX only fit in u64
            Some(Err(_)) | None if value.is_u64() || value.is_i64() => {
                self.violation(field, "is out of range");
                None
            }
            _ => {
                self.violation(field, "must be an integer");
                None
            }
        }
    }

    fn positive_integer<T: TryFrom<i64>>(&mut self, field: &'static str) -> Option<T> {
        let n: i64 = self.integer(field)?;
        if n < 1 {
            self.violation(field, "must be at least 1");
            return None;
        }
        match T::try_from(n) {
            Ok(n) => Some(n),
            Err(_) => {
                self.violation(field, "is out of range");
                None
            }
        }
    }
}
