//! # Submission Pipeline
//!
//! Validates and normalizes raw title/author/body text before it reaches the
//! record store. Drafts can only be built here, so every persisted field has
//! already been trimmed and length-bounded.

use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};
use crate::models::Origin;

/// Address recorded when the client address is unknown.
const UNKNOWN_ADDR: &str = "0.0.0.0";

/// Maximum field lengths, measured in Unicode code points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub title: usize,
    pub author: usize,
    pub body: usize,
    pub user_agent: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            title: 120,
            author: 60,
            body: 5000,
            user_agent: 200,
        }
    }
}

/// Normalized input for a new thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadDraft {
    title: String,
    author: String,
    body: String,
}

impl ThreadDraft {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub(crate) fn into_parts(self) -> (String, String, String) {
        (self.title, self.author, self.body)
    }
}

/// Normalized input for a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyDraft {
    author: String,
    body: String,
}

impl ReplyDraft {
    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub(crate) fn into_parts(self) -> (String, String) {
        (self.author, self.body)
    }
}

/// Turns raw form input into drafts and origin metadata.
#[derive(Debug, Clone)]
pub struct SubmissionPipeline {
    limits: Limits,
    default_author: String,
}

impl SubmissionPipeline {
    pub fn new(limits: Limits, default_author: impl Into<String>) -> Self {
        Self {
            limits,
            default_author: default_author.into(),
        }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn default_author(&self) -> &str {
        &self.default_author
    }

    /// Trims and truncates the fields of a new thread.
    /// Overlong input is cut, not rejected; an empty title or body is.
    pub fn thread(&self, title: &str, author: &str, body: &str) -> Result<ThreadDraft> {
        let title = limit_len(title.trim(), self.limits.title);
        let body = limit_len(body.trim(), self.limits.body);

        if title.is_empty() || body.is_empty() {
            return Err(AppError::ValidationError(
                "title and message are required".to_string(),
            ));
        }

        Ok(ThreadDraft {
            title,
            author: self.author(author),
            body,
        })
    }

    pub fn reply(&self, author: &str, body: &str) -> Result<ReplyDraft> {
        let body = limit_len(body.trim(), self.limits.body);
        if body.is_empty() {
            return Err(AppError::ValidationError("message is required".to_string()));
        }

        Ok(ReplyDraft {
            author: self.author(author),
            body,
        })
    }

    /// Builds the diagnostic origin metadata stored with a submission.
    /// The raw address is never persisted, only its hash.
    pub fn origin(&self, client_addr: Option<&str>, user_agent: Option<&str>) -> Origin {
        let addr = client_addr.filter(|a| !a.is_empty()).unwrap_or(UNKNOWN_ADDR);
        Origin {
            ip_hash: hash_addr(addr),
            user_agent: limit_len(user_agent.unwrap_or_default(), self.limits.user_agent),
        }
    }

    fn author(&self, raw: &str) -> String {
        let author = limit_len(raw.trim(), self.limits.author);
        if author.is_empty() {
            self.default_author.clone()
        } else {
            author
        }
    }
}

impl Default for SubmissionPipeline {
    fn default() -> Self {
        Self::new(Limits::default(), "Anonymous")
    }
}

/// Truncates `s` to at most `max` code points.
pub fn limit_len(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => s[..cut].to_string(),
        None => s.to_string(),
    }
}

/// Hex SHA-256 of a client address.
pub fn hash_addr(addr: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(addr.as_bytes());
    hex::encode(hasher.finalize())
}
