//! # Domain Models
//!
//! These structs represent the records Flatboard persists.
//! A thread is stored as one self-describing document together with its replies,
//! so the serde layout here *is* the on-disk format.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::submission::{ReplyDraft, ThreadDraft};

/// Number of digits in the canonical (zero-padded) form of a thread id.
pub const ID_WIDTH: usize = 8;

/// Sequential thread identifier.
///
/// Rendered as a fixed-width, zero-padded decimal string (`00000042`) so that
/// record names sort lexicographically in numeric order. `0` is never issued
/// by the allocator and marks a thread whose identity has not been assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ThreadId(u64);

impl ThreadId {
    pub const UNASSIGNED: ThreadId = ThreadId(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn is_assigned(self) -> bool {
        self.0 != 0
    }

    /// Parses a user-supplied id. Only ASCII digits are accepted; leading
    /// zeros are allowed, so `"1"` and `"00000001"` name the same thread.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        raw.parse::<u64>().ok().map(ThreadId)
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = ID_WIDTH)
    }
}

impl TryFrom<String> for ThreadId {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        ThreadId::parse(&raw).ok_or_else(|| format!("invalid thread id {raw:?}"))
    }
}

impl From<ThreadId> for String {
    fn from(id: ThreadId) -> Self {
        id.to_string()
    }
}

/// Diagnostic metadata about who submitted a thread or reply.
/// Persisted alongside the content but never rendered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Origin {
    /// Hex SHA-256 of the submitter's network address
    #[serde(rename = "_ip")]
    pub ip_hash: String,
    /// Truncated user-agent string
    #[serde(rename = "_ua")]
    pub user_agent: String,
}

/// A response attached to exactly one thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Position within the parent thread, starting at 1
    pub rid: u32,
    pub author: String,
    pub body: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub origin: Origin,
}

/// A discussion topic and its replies, persisted as one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
    pub title: String,
    pub author: String,
    pub body: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent activity (creation or latest reply)
    #[serde(with = "chrono::serde::ts_seconds")]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub origin: Origin,
    pub replies: Vec<Reply>,
}

impl Thread {
    /// Builds a fresh thread with no replies.
    pub fn new(id: ThreadId, draft: ThreadDraft, origin: Origin, at: DateTime<Utc>) -> Self {
        let (title, author, body) = draft.into_parts();
        Self {
            id,
            title,
            author,
            body,
            created_at: at,
            updated_at: at,
            origin,
            replies: Vec::new(),
        }
    }

    /// Appends a reply and returns its `rid`.
    ///
    /// `updated_at` never moves backwards, even if `at` is earlier than the
    /// last recorded activity (e.g. a wall-clock step between workers).
    pub fn append_reply(&mut self, draft: ReplyDraft, origin: Origin, at: DateTime<Utc>) -> u32 {
        let rid = self.replies.len() as u32 + 1;
        let (author, body) = draft.into_parts();
        self.replies.push(Reply {
            rid,
            author,
            body,
            created_at: at,
            origin,
        });
        self.updated_at = self.updated_at.max(at);
        rid
    }

    /// Most recent activity derived from the content itself rather than the
    /// stored `updated_at`.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.replies
            .iter()
            .map(|r| r.created_at)
            .fold(self.created_at, |latest, at| latest.max(at))
    }

    /// Checks the structural invariants a stored document must satisfy.
    pub fn check_integrity(&self) -> Result<(), String> {
        if !self.id.is_assigned() {
            return Err("thread id is not set".to_string());
        }
        for (idx, reply) in self.replies.iter().enumerate() {
            let expected = idx as u32 + 1;
            if reply.rid != expected {
                return Err(format!(
                    "reply at position {expected} carries rid {}",
                    reply.rid
                ));
            }
        }
        Ok(())
    }

    pub fn summary(&self) -> ThreadSummary {
        ThreadSummary {
            id: self.id,
            title: self.title.clone(),
            author: self.author.clone(),
            created_at: self.created_at,
            updated_at: self.last_activity(),
            reply_count: self.replies.len(),
        }
    }
}

/// One row of the thread listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadSummary {
    pub id: ThreadId,
    pub title: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub reply_count: usize,
}
