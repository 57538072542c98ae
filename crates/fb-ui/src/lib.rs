//! # fb-ui
//!
//! Askama templates and the view models they render. Everything here is
//! presentation: models are flattened into display strings and post bodies
//! are pre-formatted to safe HTML.

pub mod format;

use askama::Template;
use fb_core::models::{Reply, Thread, ThreadSummary};
use fb_core::submission::Limits;

pub use format::{format_datetime, format_text};

/// One row of the thread list.
pub struct SummaryView {
    pub id: String,
    pub title: String,
    pub author: String,
    pub created: String,
    pub updated: String,
    pub reply_count: usize,
}

impl From<&ThreadSummary> for SummaryView {
    fn from(s: &ThreadSummary) -> Self {
        Self {
            id: s.id.to_string(),
            title: s.title.clone(),
            author: s.author.clone(),
            created: format_datetime(s.created_at),
            updated: format_datetime(s.updated_at),
            reply_count: s.reply_count,
        }
    }
}

pub struct ReplyView {
    pub rid: u32,
    pub author: String,
    pub created: String,
    pub body_html: String,
}

impl From<&Reply> for ReplyView {
    fn from(r: &Reply) -> Self {
        Self {
            rid: r.rid,
            author: r.author.clone(),
            created: format_datetime(r.created_at),
            body_html: format_text(&r.body),
        }
    }
}

/// A thread ready for display. Origin metadata is deliberately absent.
pub struct ThreadView {
    pub id: String,
    pub title: String,
    pub author: String,
    pub created: String,
    pub body_html: String,
    pub replies: Vec<ReplyView>,
}

impl From<&Thread> for ThreadView {
    fn from(t: &Thread) -> Self {
        Self {
            id: t.id.to_string(),
            title: t.title.clone(),
            author: t.author.clone(),
            created: format_datetime(t.created_at),
            body_html: format_text(&t.body),
            replies: t.replies.iter().map(ReplyView::from).collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub site_name: &'a str,
    pub page_title: &'a str,
    pub threads: Vec<SummaryView>,
}

#[derive(Template)]
#[template(path = "thread.html")]
pub struct ThreadTemplate<'a> {
    pub site_name: &'a str,
    pub page_title: &'a str,
    pub thread: ThreadView,
    pub csrf_token: &'a str,
    pub limits: Limits,
    pub default_author: &'a str,
}

#[derive(Template)]
#[template(path = "new_thread.html")]
pub struct NewThreadTemplate<'a> {
    pub site_name: &'a str,
    pub page_title: &'a str,
    pub csrf_token: &'a str,
    pub limits: Limits,
    pub default_author: &'a str,
}

/// Error and notice pages.
#[derive(Template)]
#[template(path = "message.html")]
pub struct MessageTemplate<'a> {
    pub site_name: &'a str,
    pub page_title: &'a str,
    pub message: &'a str,
    pub back_href: &'a str,
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use fb_core::models::{Origin, ThreadId};
    use fb_core::submission::SubmissionPipeline;

    use super::*;

    fn thread() -> Thread {
        let pipeline = SubmissionPipeline::default();
        let draft = pipeline
            .thread("<b>Hello</b>", "Ann", "Hi there\nhttps://example.org")
            .unwrap();
        let origin = Origin {
            ip_hash: "deadbeef".into(),
            user_agent: "SecretAgent/1.0".into(),
        };
        let mut t = Thread::new(
            ThreadId::new(1),
            draft,
            origin.clone(),
            Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
        );
        let reply = pipeline.reply("Bob", "Welcome!").unwrap();
        t.append_reply(reply, origin, Utc.with_ymd_and_hms(2025, 1, 2, 4, 0, 0).unwrap());
        t
    }

    #[test]
    fn thread_page_escapes_title_and_hides_origin() {
        let t = thread();
        let html = ThreadTemplate {
            site_name: "Flatboard",
            page_title: &t.title,
            thread: ThreadView::from(&t),
            csrf_token: "tok",
            limits: Limits::default(),
            default_author: "Anonymous",
        }
        .render()
        .unwrap();

        assert!(html.contains("&lt;b&gt;Hello&lt;"));
        assert!(!html.contains("<b>Hello"));
        assert!(html.contains("id=\"r1\""));
        assert!(html.contains("<a href=\"https://example.org\""));
        assert!(html.contains("action=\"/threads/00000001/replies\""));
        assert!(html.contains("02.01.2025 03:04"));
        assert!(!html.contains("SecretAgent"));
        assert!(!html.contains("deadbeef"));
    }

    #[test]
    fn index_lists_summaries() {
        let t = thread();
        let html = IndexTemplate {
            site_name: "Flatboard",
            page_title: "Threads",
            threads: vec![SummaryView::from(&t.summary())],
        }
        .render()
        .unwrap();

        assert!(html.contains("href=\"/threads/00000001\""));
        assert!(html.contains("replies: 1"));
        assert!(html.contains("last activity 02.01.2025 04:00"));
    }

    #[test]
    fn empty_index_invites_first_thread() {
        let html = IndexTemplate {
            site_name: "Flatboard",
            page_title: "Threads",
            threads: Vec::new(),
        }
        .render()
        .unwrap();
        assert!(html.contains("No threads yet."));
    }
}
