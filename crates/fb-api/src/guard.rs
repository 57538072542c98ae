//! Request screening that runs before a submission reaches the forum:
//! CSRF double-submit token, honeypot field and a posting cooldown.

use std::time::{Duration, Instant};

use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use fb_core::error::{AppError, Result};
use subtle::ConstantTimeEq;
use uuid::Uuid;

pub const CSRF_COOKIE: &str = "fb_csrf";

/// Entries older than the window are dropped once the table grows past this.
const PRUNE_THRESHOLD: usize = 10_000;

/// Returns the CSRF token for this client, plus a cookie to set when the
/// client does not have one yet.
pub fn csrf_token(req: &HttpRequest) -> (String, Option<Cookie<'static>>) {
    if let Some(existing) = req.cookie(CSRF_COOKIE) {
        if !existing.value().is_empty() {
            return (existing.value().to_string(), None);
        }
    }

    let token = Uuid::new_v4().simple().to_string();
    let cookie = Cookie::build(CSRF_COOKIE, token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .finish();
    (token, Some(cookie))
}

/// The submitted form token must equal the token in the client's cookie.
pub fn verify_csrf(req: &HttpRequest, submitted: &str) -> Result<()> {
    let valid = req
        .cookie(CSRF_COOKIE)
        .map(|c| {
            let expected = c.value().as_bytes();
            !expected.is_empty() && bool::from(expected.ct_eq(submitted.as_bytes()))
        })
        .unwrap_or(false);

    if valid {
        Ok(())
    } else {
        Err(AppError::Forbidden("invalid CSRF token".into()))
    }
}

/// Hidden form field that humans never fill in.
pub fn check_honeypot(website: &str) -> Result<()> {
    if website.trim().is_empty() {
        Ok(())
    } else {
        Err(AppError::Forbidden("spam detected".into()))
    }
}

/// Minimum spacing between posts from one origin, per worker process.
pub struct Cooldown {
    window: Duration,
    last_post: DashMap<String, Instant>,
}

impl Cooldown {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_post: DashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records a post from `key` and returns `true`, unless `key` already
    /// posted within the window.
    pub fn try_record(&self, key: &str) -> bool {
        if self.window.is_zero() {
            return true;
        }

        let now = Instant::now();
        if self.last_post.len() > PRUNE_THRESHOLD {
            self.last_post
                .retain(|_, at| now.duration_since(*at) < self.window);
        }

        match self.last_post.entry(key.to_string()) {
            Entry::Occupied(mut last) => {
                if now.duration_since(*last.get()) < self.window {
                    return false;
                }
                last.insert(now);
                true
            }
            Entry::Vacant(slot) => {
                slot.insert(now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn new_client_gets_a_cookie() {
        let req = TestRequest::default().to_http_request();
        let (token, cookie) = csrf_token(&req);
        assert_eq!(token.len(), 32);
        assert_eq!(cookie.map(|c| c.value().to_string()), Some(token));
    }

    #[test]
    fn returning_client_keeps_its_token() {
        let req = TestRequest::default()
            .cookie(Cookie::new(CSRF_COOKIE, "abc123"))
            .to_http_request();
        let (token, cookie) = csrf_token(&req);
        assert_eq!(token, "abc123");
        assert!(cookie.is_none());
    }

    #[test]
    fn csrf_must_match_cookie() {
        let req = TestRequest::default()
            .cookie(Cookie::new(CSRF_COOKIE, "abc123"))
            .to_http_request();
        assert!(verify_csrf(&req, "abc123").is_ok());
        assert!(verify_csrf(&req, "abc124").is_err());
        assert!(verify_csrf(&req, "abc12").is_err());
        assert!(verify_csrf(&req, "abc1234").is_err());
        assert!(verify_csrf(&req, "").is_err());

        let no_cookie = TestRequest::default().to_http_request();
        assert!(verify_csrf(&no_cookie, "").is_err());
    }

    #[test]
    fn honeypot_rejects_filled_field() {
        assert!(check_honeypot("").is_ok());
        assert!(matches!(
            check_honeypot("http://spam.example"),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn cooldown_blocks_second_post_in_window() {
        let cooldown = Cooldown::new(Duration::from_secs(60));
        assert!(cooldown.try_record("a"));
        assert!(!cooldown.try_record("a"));
        assert!(cooldown.try_record("b"));
    }

    #[test]
    fn zero_cooldown_never_blocks() {
        let cooldown = Cooldown::new(Duration::ZERO);
        assert!(cooldown.try_record("a"));
        assert!(cooldown.try_record("a"));
    }
}
