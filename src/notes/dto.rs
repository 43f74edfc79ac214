use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::notes::repo::Note;

/// What the client sends when creating or replacing a note.
#[derive(Debug, Deserialize)]
pub struct NoteCreate {
    pub title: String,
    pub content: String,
}

/// Full note returned to the client, server-generated fields included.
#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl From<Note> for NoteResponse {
    fn from(n: Note) -> Self {
        Self {
            id: n.id,
            title: n.title,
            content: n.content,
            created_at: n.created_at,
            updated_at: n.updated_at,
        }
    }
}

/// Offset/limit pass-through for listing.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.skip, 0);
        assert_eq!(p.limit, 20);
    }

    #[test]
    fn note_response_uses_rfc3339_timestamps() {
        let note = Note {
            id: 1,
            title: "First".into(),
            content: "Hello".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: None,
        };
        let json = serde_json::to_value(NoteResponse::from(note)).unwrap();
        assert_eq!(json["created_at"], "1970-01-01T00:00:00Z");
        assert_eq!(json["updated_at"], serde_json::Value::Null);
    }
}
