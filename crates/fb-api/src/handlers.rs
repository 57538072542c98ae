//! # fb-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the forum
//! service. Handlers never touch storage directly.

use actix_web::cookie::Cookie;
use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse};
use askama::Template;
use fb_core::error::{AppError, Result};
use fb_core::models::{Origin, ThreadId};
use fb_core::service::ForumService;
use fb_core::submission::SubmissionPipeline;
use fb_ui::{
    IndexTemplate, MessageTemplate, NewThreadTemplate, SummaryView, ThreadTemplate, ThreadView,
};
use serde::Deserialize;
use tracing::error;

use crate::guard::{check_honeypot, csrf_token, verify_csrf, Cooldown};

/// State shared across all Actix-web workers.
pub struct AppState {
    pub forum: ForumService,
    pub pipeline: SubmissionPipeline,
    pub site_name: String,
    /// Page-size cutoff applied to the full listing
    pub threads_per_page: usize,
    pub cooldown: Cooldown,
}

#[derive(Debug, Default, Deserialize)]
pub struct ThreadForm {
    #[serde(default)]
    pub csrf: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReplyForm {
    #[serde(default)]
    pub csrf: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub body: String,
}

/// Renders the thread list (most recent activity first).
pub async fn index(state: web::Data<AppState>) -> HttpResponse {
    match state.forum.list_threads().await {
        Ok(summaries) => {
            let threads = summaries
                .iter()
                .take(state.threads_per_page)
                .map(SummaryView::from)
                .collect();
            let page = IndexTemplate {
                site_name: &state.site_name,
                page_title: "Threads",
                threads,
            };
            html(StatusCode::OK, &page, None)
        }
        Err(e) => error_page(&state, &e),
    }
}

pub async fn new_thread_form(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let (token, cookie) = csrf_token(&req);
    let page = NewThreadTemplate {
        site_name: &state.site_name,
        page_title: "New thread",
        csrf_token: &token,
        limits: state.pipeline.limits(),
        default_author: state.pipeline.default_author(),
    };
    html(StatusCode::OK, &page, cookie)
}

/// Orchestrates the creation of a new thread.
pub async fn create_thread(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<ThreadForm>,
) -> HttpResponse {
    match submit_thread(&state, &req, form.into_inner()).await {
        Ok(id) => see_other(format!("/threads/{id}")),
        Err(e) => error_page(&state, &e),
    }
}

/// Renders a specific thread (e.g., /threads/00000001 or /threads/1).
pub async fn view_thread(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let id = path.into_inner();
    match state.forum.get_thread(&id).await {
        Ok(Some(thread)) => {
            let (token, cookie) = csrf_token(&req);
            let page = ThreadTemplate {
                site_name: &state.site_name,
                page_title: &thread.title,
                thread: ThreadView::from(&thread),
                csrf_token: &token,
                limits: state.pipeline.limits(),
                default_author: state.pipeline.default_author(),
            };
            html(StatusCode::OK, &page, cookie)
        }
        Ok(None) => error_page(&state, &AppError::thread_not_found(id)),
        Err(e) => error_page(&state, &e),
    }
}

pub async fn post_reply(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    form: web::Form<ReplyForm>,
) -> HttpResponse {
    let id = path.into_inner();
    match submit_reply(&state, &req, &id, form.into_inner()).await {
        Ok(rid) => {
            let canonical = ThreadId::parse(&id).map_or(id, |t| t.to_string());
            see_other(format!("/threads/{canonical}#r{rid}"))
        }
        Err(e) => error_page(&state, &e),
    }
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn submit_thread(state: &AppState, req: &HttpRequest, form: ThreadForm) -> Result<ThreadId> {
    let origin = origin_of(state, req);
    screen(state, req, &form.csrf, &form.website, &origin)?;

    let draft = state.pipeline.thread(&form.title, &form.name, &form.body)?;
    state.forum.create_thread(draft, origin).await
}

async fn submit_reply(state: &AppState, req: &HttpRequest, id: &str, form: ReplyForm) -> Result<u32> {
    let origin = origin_of(state, req);
    screen(state, req, &form.csrf, &form.website, &origin)?;

    let draft = state.pipeline.reply(&form.name, &form.body)?;
    state.forum.append_reply(id, draft, origin).await
}

/// CSRF, honeypot, then cooldown. A rejected post does not start a cooldown,
/// but an accepted one does even if validation fails afterwards.
fn screen(
    state: &AppState,
    req: &HttpRequest,
    csrf: &str,
    website: &str,
    origin: &Origin,
) -> Result<()> {
    verify_csrf(req, csrf)?;
    check_honeypot(website)?;

    if !state.cooldown.try_record(&origin.ip_hash) {
        return Err(AppError::RateLimitExceeded(format!(
            "please wait {} seconds between posts",
            state.cooldown.window().as_secs()
        )));
    }
    Ok(())
}

fn origin_of(state: &AppState, req: &HttpRequest) -> Origin {
    let addr = req.peer_addr().map(|a| a.ip().to_string());
    let agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok());
    state.pipeline.origin(addr.as_deref(), agent)
}

fn see_other(location: String) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn html<T: Template>(status: StatusCode, page: &T, cookie: Option<Cookie<'static>>) -> HttpResponse {
    match page.render() {
        Ok(body) => {
            let mut response = HttpResponse::build(status);
            response.content_type("text/html; charset=utf-8");
            if let Some(cookie) = cookie {
                response.cookie(cookie);
            }
            response.body(body)
        }
        Err(e) => {
            error!("template rendering failed: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Maps an error to a status code and a rendered notice page.
fn error_page(state: &AppState, err: &AppError) -> HttpResponse {
    let (status, title, message) = match err {
        AppError::NotFound(..) => (
            StatusCode::NOT_FOUND,
            "Thread not found",
            "Thread not found.".to_string(),
        ),
        AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, "Missing input", msg.clone()),
        AppError::Forbidden(msg) => (StatusCode::BAD_REQUEST, "Request rejected", msg.clone()),
        AppError::RateLimitExceeded(msg) => (
            StatusCode::TOO_MANY_REQUESTS,
            "Posting too fast",
            msg.clone(),
        ),
        other => {
            error!(error = %other, "request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error",
                "The forum could not complete this request. Please try again.".to_string(),
            )
        }
    };

    let page = MessageTemplate {
        site_name: &state.site_name,
        page_title: title,
        message: &message,
        back_href: "/",
    };
    html(status, &page, None)
}
