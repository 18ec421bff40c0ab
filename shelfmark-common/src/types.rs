//! Shared domain types

use serde::{Deserialize, Serialize};

/// Best-effort book identification produced by the recognition workflow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub publisher: String,
}

/// Reading status of a book
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    #[default]
    Unread,
    Reading,
    Completed,
}

impl BookStatus {
    /// Database TEXT representation
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Unread => "unread",
            BookStatus::Reading => "reading",
            BookStatus::Completed => "completed",
        }
    }

    /// Parse the database TEXT representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unread" => Some(BookStatus::Unread),
            "reading" => Some(BookStatus::Reading),
            "completed" => Some(BookStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
