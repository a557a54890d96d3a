//! HTTP server
//!
//! Upload, listing, event and delete endpoints require the shared
//! credential; reading a file by id does not.

use crate::auth::AuthUser;
use crate::config::ServerConfig;
use crate::error::AppError;
use crate::mimetype::{detect_mimetype, is_textual};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use filebin_registry::{Registry, WaitOutcome};
use serde::Serialize;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const LOGO: &str = r"  __ _ _      _     _
 / _(_) | ___| |__ (_)_ __
| |_| | |/ _ \ '_ \| | '_ \
|  _| | |  __/ |_) | | | | |
|_| |_|_|\___|_.__/|_|_| |_|
";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Shared state for the HTTP server
pub struct AppState {
    pub registry: Arc<Registry>,
    pub config: ServerConfig,
    pub started_at: DateTime<Utc>,
    shutdown: watch::Receiver<bool>,
}

impl AppState {
    /// `shutdown` turning true stops the server and releases long-poll
    /// waiters.
    pub fn new(
        registry: Arc<Registry>,
        config: ServerConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            registry,
            config,
            started_at: Utc::now(),
            shutdown,
        }
    }
}

pub type SharedState = Arc<AppState>;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    backend: &'static str,
    files: usize,
    uptime_secs: u64,
}

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    let body_limit = state.config.upload_max_size;
    Router::new()
        .route("/", get(index).post(upload))
        .route("/robots.txt", get(robots))
        .route("/health", get(health))
        .route("/list", get(list))
        .route("/event", get(event))
        .route("/{id}", get(view_file).delete(delete_file))
        .route("/{id}/download", get(download_file))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server, returning once shutdown has been signalled and
/// in-flight requests have finished.
pub async fn start_server(state: SharedState, addr: SocketAddr) -> std::io::Result<()> {
    let mut shutdown = state.shutdown.clone();
    let router = create_router(state);
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { wait_for_shutdown(&mut shutdown).await })
        .await
}

async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stopping| *stopping).await.is_err() {
        // Sender gone without a shutdown: nothing will ever stop us.
        std::future::pending::<()>().await;
    }
}

fn text_response(body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN)),
            (
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ),
        ],
        body,
    )
        .into_response()
}

fn nosniff(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response
}

async fn index(headers: HeaderMap) -> Response {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown host");
    text_response(format!(
        "{}\nVersion {}, running at {}\n",
        LOGO,
        env!("CARGO_PKG_VERSION"),
        host
    ))
}

async fn robots() -> Response {
    text_response("User-agent: *\nDisallow: /\n".to_string())
}

async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0) as u64;
    Json(HealthResponse {
        status: "ok",
        backend: state.registry.backend_name(),
        files: state.registry.len(),
        uptime_secs,
    })
}

/// Store every file part of a multipart body.
///
/// Answers one line per file part: its URL, or `failed`. Succeeds as long as
/// at least one part was stored.
async fn upload(
    State(state): State<SharedState>,
    _user: AuthUser,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut results: Vec<Option<String>> = Vec::new();
    let mut too_large = false;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                too_large |= e.status() == StatusCode::PAYLOAD_TOO_LARGE;
                warn!(error = %e, "Malformed multipart upload");
                results.push(None);
                break;
            }
        };

        // Plain form fields are not files.
        let Some(filename) = field.file_name().map(base_name) else {
            continue;
        };
        let declared = field.content_type().map(str::to_string);

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                too_large |= e.status() == StatusCode::PAYLOAD_TOO_LARGE;
                warn!(filename = %filename, error = %e, "Failed to receive upload");
                results.push(None);
                break;
            }
        };

        let mimetype = detect_mimetype(declared.as_deref(), &data);
        match state
            .registry
            .create(Box::pin(Cursor::new(data)), &filename, &mimetype)
            .await
        {
            Ok(record) => results.push(Some(record.id)),
            Err(e) => {
                warn!(filename = %filename, error = %e, "Failed to store upload");
                results.push(None);
            }
        }
    }

    if !results.iter().any(Option::is_some) {
        if too_large {
            return Err(AppError::PayloadTooLarge(format!(
                "Upload exceeds {} bytes",
                state.config.upload_max_size
            )));
        }
        return Err(AppError::BadRequest("No file uploaded".into()));
    }

    let body: String = results
        .iter()
        .map(|result| match result {
            Some(id) => format!("{}\n", state.config.file_url(id)),
            None => "failed\n".to_string(),
        })
        .collect();
    Ok(text_response(body))
}

/// Last path component of a client-supplied filename
fn base_name(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename).trim();
    if name.is_empty() {
        "upload".to_string()
    } else {
        name.to_string()
    }
}

/// JSON when the request declares `Content-Type: application/json`,
/// otherwise one text line per file.
async fn list(State(state): State<SharedState>, _user: AuthUser, headers: HeaderMap) -> Response {
    let wants_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    if wants_json {
        return nosniff(Json(state.registry.list_all()).into_response());
    }

    let mut body = String::new();
    state.registry.for_each(|record| {
        body.push_str(&format!(
            "{}: {} ({}) -> {}\n",
            record.created_at.to_rfc3339(),
            record.filename,
            record.mimetype,
            state.config.file_url(&record.id)
        ));
    });
    text_response(body)
}

/// Long-poll until the registry changes: 200 on change, 408 on timeout.
async fn event(State(state): State<SharedState>, _user: AuthUser) -> StatusCode {
    let mut shutdown = state.shutdown.clone();
    tokio::select! {
        outcome = state.registry.wait_for_change(state.config.event_timeout) => match outcome {
            WaitOutcome::Changed => StatusCode::OK,
            WaitOutcome::TimedOut => StatusCode::REQUEST_TIMEOUT,
        },
        _ = wait_for_shutdown(&mut shutdown) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// `/{id}` serves the bytes inline, `/{id}.json` the record and `/{id}.txt`
/// the bytes as plain text. Ids never contain a dot, so the suffix is
/// unambiguous.
async fn view_file(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    request: Request,
) -> Result<Response, AppError> {
    if let Some(id) = name.strip_suffix(".json") {
        let handle = state.registry.get(id)?;
        return Ok(nosniff(Json(handle.into_record()).into_response()));
    }

    if let Some(id) = name.strip_suffix(".txt") {
        let handle = state.registry.get(id)?;
        if !is_textual(&handle.record().mimetype) {
            return Err(AppError::BadRequest(format!(
                "{} is not a text file",
                handle.record().filename
            )));
        }
        return Ok(handle.serve(request, TEXT_PLAIN, false).await?);
    }

    let handle = state.registry.get(&name)?;
    let mimetype = handle.record().mimetype.clone();
    Ok(handle.serve(request, &mimetype, false).await?)
}

async fn download_file(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    request: Request,
) -> Result<Response, AppError> {
    let handle = state.registry.get(&id)?;
    let mimetype = handle.record().mimetype.clone();
    Ok(handle.serve(request, &mimetype, true).await?)
}

async fn delete_file(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let record = state.registry.delete(&id).await?;
    info!(id = %record.id, by = %user.username, "Deleted on request");
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use filebin_registry::LocalBackend;
    use std::collections::HashMap;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    const AUTH: &str = "Basic YWRtaW46c2VjcmV0"; // admin:secret
    const BAD_AUTH: &str = "Basic YWRtaW46d3Jvbmc="; // admin:wrong
    const BOUNDARY: &str = "filebin-test-boundary";

    async fn create_test_state_with_shutdown(
        dir: &TempDir,
        extra: &[(&str, &str)],
    ) -> (SharedState, watch::Sender<bool>) {
        let mut vars: HashMap<String, String> = [
            ("FILEBIN_STORAGE_DIR", dir.path().to_str().unwrap()),
            ("FILEBIN_AUTH_USERNAME", "admin"),
            ("FILEBIN_AUTH_PASSWORD", "secret"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in extra {
            vars.insert(k.to_string(), v.to_string());
        }
        let config = ServerConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();

        let backend = LocalBackend::new(&config.storage_dir).await.unwrap();
        let registry = Registry::open(Arc::new(backend), config.registry_config())
            .await
            .unwrap();
        let (tx, rx) = watch::channel(false);
        (Arc::new(AppState::new(Arc::new(registry), config, rx)), tx)
    }

    async fn create_test_state(dir: &TempDir, extra: &[(&str, &str)]) -> SharedState {
        create_test_state_with_shutdown(dir, extra).await.0
    }

    fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (filename, content_type, data) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                    filename
                )
                .as_bytes(),
            );
            if let Some(content_type) = content_type {
                body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn upload_request(auth: Option<&str>, body: Vec<u8>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            );
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn authed(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, AUTH)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    /// Upload one file through the router and return its id.
    async fn upload_one(state: &SharedState, filename: &str, content_type: Option<&str>, data: &[u8]) -> String {
        let body = multipart_body(&[(filename, content_type, data)]);
        let response = create_router(state.clone())
            .oneshot(upload_request(Some(AUTH), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_string(response).await.trim().to_string()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let dir = tempdir().unwrap();
        let state = create_test_state(&dir, &[]).await;

        let response = create_router(state).oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["backend"], "local");
        assert_eq!(json["files"], 0);
        assert!(json["uptime_secs"].as_u64().is_some());
    }

    #[tokio::test]
    async fn test_index_and_robots() {
        let dir = tempdir().unwrap();
        let state = create_test_state(&dir, &[]).await;

        let request = Request::builder()
            .uri("/")
            .header(header::HOST, "bin.example.org")
            .body(Body::empty())
            .unwrap();
        let response = create_router(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert!(body_string(response)
            .await
            .contains("running at bin.example.org"));

        let response = create_router(state).oneshot(get("/robots.txt")).await.unwrap();
        assert_eq!(body_string(response).await, "User-agent: *\nDisallow: /\n");
    }

    #[tokio::test]
    async fn test_upload_requires_auth() {
        let dir = tempdir().unwrap();
        let state = create_test_state(&dir, &[]).await;
        let body = multipart_body(&[("a.txt", Some("text/plain"), &b"hi"[..])]);

        let response = create_router(state.clone())
            .oneshot(upload_request(None, body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[header::WWW_AUTHENTICATE],
            "Basic realm=\"filebin\""
        );

        let response = create_router(state.clone())
            .oneshot(upload_request(Some(BAD_AUTH), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(state.registry.is_empty());
    }

    #[tokio::test]
    async fn test_upload_multiple_parts() {
        let dir = tempdir().unwrap();
        let state = create_test_state(&dir, &[("FILEBIN_BASE_URL", "https://bin.example.org")]).await;
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        let body = multipart_body(&[
            ("notes.txt", None, &b"some notes\n"[..]),
            ("/home/me/pic.png", Some("application/octet-stream"), &png[..]),
        ]);

        let response = create_router(state.clone())
            .oneshot(upload_request(Some(AUTH), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let text = body_string(response).await;
        let urls: Vec<&str> = text.lines().collect();
        assert_eq!(urls.len(), 2);

        let records = state.registry.list_all();
        assert_eq!(records.len(), 2);
        assert_eq!(urls[0], format!("https://bin.example.org/{}", records[0].id));
        assert_eq!(records[0].filename, "notes.txt");
        assert_eq!(records[0].mimetype, "text/plain; charset=utf-8");
        assert_eq!(records[1].filename, "pic.png");
        assert_eq!(records[1].mimetype, "image/png");
        assert_eq!(records[1].size, png.len() as u64);
    }

    #[tokio::test]
    async fn test_upload_without_files_is_bad_request() {
        let dir = tempdir().unwrap();
        let state = create_test_state(&dir, &[]).await;
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"comment\"\r\n\r\nhello\r\n--{b}--\r\n",
            b = BOUNDARY
        );

        let response = create_router(state)
            .oneshot(upload_request(Some(AUTH), body.into_bytes()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_over_limit_is_rejected() {
        let dir = tempdir().unwrap();
        let state = create_test_state(&dir, &[("FILEBIN_UPLOAD_MAX_SIZE_MB", "1")]).await;
        let big = vec![b'a'; 2 * 1024 * 1024];
        let body = multipart_body(&[("big.txt", Some("text/plain"), &big[..])]);

        let response = create_router(state.clone())
            .oneshot(upload_request(Some(AUTH), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(state.registry.is_empty());
    }

    #[tokio::test]
    async fn test_view_json_txt_and_download() {
        let dir = tempdir().unwrap();
        let state = create_test_state(&dir, &[]).await;
        let id = upload_one(&state, "hello.rs", Some("text/x-rust"), b"fn main() {}\n").await;

        let response = create_router(state.clone())
            .oneshot(get(&format!("/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/x-rust");
        assert_eq!(body_string(response).await, "fn main() {}\n");

        let response = create_router(state.clone())
            .oneshot(get(&format!("/{}.json", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["id"], id.as_str());
        assert_eq!(json["filename"], "hello.rs");
        assert_eq!(json["size"], 13);

        let response = create_router(state.clone())
            .oneshot(get(&format!("/{}.txt", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], TEXT_PLAIN);

        let response = create_router(state)
            .oneshot(get(&format!("/{}/download", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment;"));
        assert!(disposition.contains("hello.rs"));
    }

    #[tokio::test]
    async fn test_txt_view_of_binary_is_bad_request() {
        let dir = tempdir().unwrap();
        let state = create_test_state(&dir, &[]).await;
        let id = upload_one(&state, "pic.png", Some("image/png"), b"\x89PNG").await;

        let response = create_router(state)
            .oneshot(get(&format!("/{}.txt", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let dir = tempdir().unwrap();
        let state = create_test_state(&dir, &[]).await;

        for uri in ["/nope1234", "/nope1234.json", "/nope1234.txt", "/nope1234/download"] {
            let response = create_router(state.clone()).oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_list_json_and_text() {
        let dir = tempdir().unwrap();
        let state = create_test_state(&dir, &[]).await;
        let id = upload_one(&state, "a.txt", Some("text/plain"), b"a").await;

        let response = create_router(state.clone())
            .oneshot(get("/list"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let request = Request::builder()
            .uri("/list")
            .header(header::AUTHORIZATION, AUTH)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::empty())
            .unwrap();
        let response = create_router(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["id"], id.as_str());

        let response = create_router(state)
            .oneshot(authed(Method::GET, "/list"))
            .await
            .unwrap();
        let text = body_string(response).await;
        assert!(text.trim_end().ends_with(&format!(": a.txt (text/plain) -> {}", id)));
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = tempdir().unwrap();
        let state = create_test_state(&dir, &[]).await;
        let id = upload_one(&state, "a.txt", Some("text/plain"), b"a").await;
        let uri = format!("/{}", id);

        let unauthenticated = Request::builder()
            .method(Method::DELETE)
            .uri(&uri)
            .body(Body::empty())
            .unwrap();
        let response = create_router(state.clone())
            .oneshot(unauthenticated)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = create_router(state.clone())
            .oneshot(authed(Method::DELETE, &uri))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = create_router(state.clone())
            .oneshot(authed(Method::DELETE, &uri))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = create_router(state).oneshot(get(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_event_times_out() {
        let dir = tempdir().unwrap();
        let state = create_test_state(&dir, &[("FILEBIN_EVENT_TIMEOUT_SECS", "1")]).await;

        let response = create_router(state)
            .oneshot(authed(Method::GET, "/event"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_event_released_by_upload() {
        let dir = tempdir().unwrap();
        let state = create_test_state(&dir, &[("FILEBIN_EVENT_TIMEOUT_SECS", "10")]).await;

        let waiter = tokio::spawn(create_router(state.clone()).oneshot(authed(Method::GET, "/event")));
        tokio::time::sleep(Duration::from_millis(100)).await;
        upload_one(&state, "ping.txt", None, b"ping").await;

        let response = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("long-poll was not released")
            .unwrap()
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_event_released_by_shutdown() {
        let dir = tempdir().unwrap();
        let (state, shutdown) = create_test_state_with_shutdown(&dir, &[]).await;

        let waiter = tokio::spawn(create_router(state).oneshot(authed(Method::GET, "/event")));
        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.send(true).unwrap();

        let response = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("long-poll was not released")
            .unwrap()
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("notes.txt"), "notes.txt");
        assert_eq!(base_name("/home/me/notes.txt"), "notes.txt");
        assert_eq!(base_name("C:\\temp\\notes.txt"), "notes.txt");
        assert_eq!(base_name("dir/"), "upload");
    }
}
