//! # HTTP Routes
//!
//! `POST /align` runs an alignment, `OPTIONS /align` answers CORS
//! preflight requests. Every response from these routes allows any origin.

use std::net::SocketAddr;

use axum::Router;
use axum::body::Bytes;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{ConnectInfo, DefaultBodyLimit, Multipart, Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_LENGTH, CONTENT_TYPE,
};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use tracing::{debug, info};
use wordalign_core::AlignPipeline;

use crate::error::ApiError;

/// State shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub pipeline: AlignPipeline,
}

/// Build the application router.
///
/// Request bodies are unbounded unless `max_upload_bytes` is set, in which
/// case larger uploads are answered with 413.
pub fn router(pipeline: AlignPipeline, max_upload_bytes: Option<usize>) -> Router {
    let body_limit = match max_upload_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };
    Router::new()
        .route("/align", post(align).options(preflight))
        .layer(body_limit)
        .layer(middleware::map_response(allow_any_origin))
        .layer(middleware::from_fn(log_request))
        .with_state(AppState { pipeline })
}

async fn log_request(request: Request, next: Next) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    let content_length = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    info!(
        %remote,
        method = %request.method(),
        path = %request.uri().path(),
        version = ?request.version(),
        %content_length,
        "request"
    );
    next.run(request).await
}

async fn allow_any_origin(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

async fn preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
    )
}

fn form_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::TooLarge
    } else {
        ApiError::InvalidForm(err.body_text())
    }
}

/// The two corpora of an upload.
#[derive(Debug, Default)]
struct Uploads {
    src: Option<Bytes>,
    tgt: Option<Bytes>,
}

/// Collect the `src` and `tgt` file parts. Other fields, and `src`/`tgt`
/// parts sent without a filename, are skipped; for a repeated field the
/// first occurrence wins.
async fn read_uploads(multipart: &mut Multipart) -> Result<Uploads, ApiError> {
    let mut uploads = Uploads::default();
    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().map(str::to_owned);
        let is_file = field.file_name().is_some();
        let slot = match name.as_deref() {
            Some("src") if is_file => &mut uploads.src,
            Some("tgt") if is_file => &mut uploads.tgt,
            _ => {
                debug!(field = ?name, is_file, "ignoring form field");
                continue;
            }
        };
        let data = field.bytes().await.map_err(form_error)?;
        if slot.is_none() {
            *slot = Some(data);
        }
    }
    Ok(uploads)
}

async fn align(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::InvalidForm(e.body_text()))?;
    let uploads = read_uploads(&mut multipart).await?;
    let src = uploads.src.ok_or(ApiError::MissingField("src"))?;
    let tgt = uploads.tgt.ok_or(ApiError::MissingField("tgt"))?;
    debug!(src_bytes = src.len(), tgt_bytes = tgt.len(), "received corpora");

    let pipeline = state.pipeline.clone();
    let alignment = tokio::task::spawn_blocking(move || pipeline.run(&src[..], &tgt[..])).await??;

    Ok(([(CONTENT_TYPE, "text/plain")], alignment).into_response())
}
