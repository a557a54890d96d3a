//! Response types of the filebin HTTP API

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One entry of `GET /list`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListedFile {
    pub id: String,
    pub filename: String,
    pub mimetype: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// Result of long-polling `GET /event`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Changed,
    TimedOut,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listed_file_deserialization() {
        let json = r#"{
            "id": "abcd1234",
            "filename": "notes.txt",
            "mimetype": "text/plain; charset=utf-8",
            "size": 12,
            "created_at": "2026-10-01T12:00:00Z"
        }"#;

        let file: ListedFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.id, "abcd1234");
        assert_eq!(file.size, 12);
        assert_eq!(file.created_at.to_rfc3339(), "2026-10-01T12:00:00+00:00");
    }
}
