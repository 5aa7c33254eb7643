//! HTTP API.
//!
//! ## Routes
//!
//! | Method | Path | Auth | Body |
//! |--------|------|------|------|
//! | GET | `/` | no | service banner |
//! | GET | `/healthz` | no | `{"status":"ok"}` |
//! | GET | `/debug/auth` | no | which credentials arrived, never the secret |
//! | GET | `/consulta?codigo=` | yes | one record |
//! | POST | `/consulta-lote` | yes | `{"codigos": [...]}` → `{"resultados": [...]}` |
//!
//! Errors are `{"detail": "<message>"}` with the error class status code.
//! Scrapes are serialized: at most one browser session is live at a time.

#![allow(clippy::unused_async)]

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sisreg::{BatchEntry, ResultRecord, ScrapeError, SearchCode, WaitListLookup};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::error::{CliError, CliResult};

/// Service name reported by `/`
pub const SERVICE_NAME: &str = "sisreg-api";

/// Header checked when `Authorization` carries nothing
pub const API_TOKEN_HEADER: &str = "x-api-token";

/// Shared handler state
pub struct AppState {
    lookup: Arc<dyn WaitListLookup>,
    token: Option<String>,
    gate: Mutex<()>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("auth_enabled", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

/// API error response
#[derive(Debug)]
pub enum ApiError {
    /// Missing or wrong token
    Unauthorized,
    /// Classified scrape failure
    Scrape(ScrapeError),
}

impl From<ScrapeError> for ApiError {
    fn from(err: ScrapeError) -> Self {
        Self::Scrape(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            Self::Scrape(err) => (
                StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_GATEWAY),
                err.to_string(),
            ),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// Query of `GET /consulta`
#[derive(Debug, Deserialize)]
pub struct ConsultaParams {
    /// Request code
    #[serde(default)]
    pub codigo: String,
}

/// Body of `POST /consulta-lote`
#[derive(Debug, Deserialize)]
pub struct LoteRequest {
    /// Request codes, processed in order
    pub codigos: Vec<String>,
}

/// Response of `POST /consulta-lote`
#[derive(Debug, Serialize)]
pub struct LoteResponse {
    /// One entry per non-blank code
    pub resultados: Vec<BatchEntry>,
}

/// Client token: `Authorization: Bearer <t>` (any case), a bare
/// `Authorization: <t>`, or `X-API-Token: <t>` when `Authorization` yields
/// nothing
#[must_use]
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let from_authorization =
        header_str(headers, header::AUTHORIZATION.as_str()).and_then(|auth| {
            let token = match auth.split_once(char::is_whitespace) {
                Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
                None if auth.eq_ignore_ascii_case("bearer") => "",
                _ => auth,
            };
            (!token.is_empty()).then_some(token)
        });

    from_authorization
        .or_else(|| header_str(headers, API_TOKEN_HEADER))
        .map(ToString::to_string)
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

async fn require_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = &state.token {
        if extract_token(request.headers()).as_deref() != Some(expected.as_str()) {
            tracing::warn!(path = %request.uri().path(), "rejected request with bad token");
            return Err(ApiError::Unauthorized);
        }
    }
    Ok(next.run(request).await)
}

async fn root() -> Json<Value> {
    Json(json!({ "status": "ok", "service": SERVICE_NAME }))
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn debug_auth(headers: HeaderMap) -> Json<Value> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let api_token_len = headers
        .get(API_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map_or(0, str::len);
    Json(json!({
        "has_authorization": authorization.is_some(),
        "auth_sample": authorization.map(|a| a.chars().take(12).collect::<String>()),
        "x_api_token_len": api_token_len,
    }))
}

async fn consulta(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConsultaParams>,
) -> Result<Json<ResultRecord>, ApiError> {
    let code = SearchCode::parse(&params.codigo)?;
    let _session = state.gate.lock().await;
    let record = state.lookup.scrape_by_code(code.as_str()).await?;
    Ok(Json(record))
}

async fn consulta_lote(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoteRequest>,
) -> Json<LoteResponse> {
    let _session = state.gate.lock().await;
    let resultados = state.lookup.scrape_batch(&body.codigos).await;
    tracing::info!(
        requested = body.codigos.len(),
        processed = resultados.len(),
        failed = resultados.iter().filter(|e| e.is_failure()).count(),
        "batch finished"
    );
    Json(LoteResponse { resultados })
}

/// Build the API router
pub fn build_router(lookup: Arc<dyn WaitListLookup>, config: &ApiConfig) -> Router {
    let state = Arc::new(AppState {
        lookup,
        token: config.token.clone(),
        gate: Mutex::new(()),
    });

    let protected = Router::new()
        .route("/consulta", get(consulta))
        .route("/consulta-lote", post(consulta_lote))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_token,
        ));

    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/debug/auth", get(debug_auth))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind and serve until Ctrl+C
pub async fn serve(lookup: Arc<dyn WaitListLookup>, config: &ApiConfig) -> CliResult<()> {
    let addr = config.socket_addr()?;
    let app = build_router(lookup, config);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| CliError::server(format!("cannot bind {addr}: {e}")))?;

    if !config.auth_enabled() {
        tracing::warn!("API_TOKEN not set, authentication disabled");
    }
    tracing::info!(%addr, "API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use sisreg::{
        MockLauncher, MockPage, RawTable, Scraper, ScraperConfig, Timeouts, UnlockPolicy,
    };
    use std::time::Duration;
    use tower::ServiceExt;

    fn lookup() -> Arc<dyn WaitListLookup> {
        let table = RawTable::new(
            ["PROCEDIMENTO", "POSIÇÃO", "TEMPO DE ESPERA"],
            ["Consulta X", "12", "30"],
        );
        let page = MockPage::wait_list()
            .with_record("123456", table)
            .with_page_text("Foram encontrados 0 registros");
        let config = ScraperConfig::new()
            .with_timeouts(Timeouts::instant())
            .with_unlock(UnlockPolicy::instant(1))
            .with_politeness_delay(Duration::ZERO);
        Arc::new(Scraper::new(MockLauncher::new(page), config))
    }

    fn app(token: Option<&str>) -> Router {
        let config = ApiConfig::new().with_token(token.map(ToString::to_string));
        build_router(lookup(), &config)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("router should respond");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let value = serde_json::from_slice(&bytes).expect("body should be JSON");
        (status, value)
    }

    fn fetch(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    mod public_route_tests {
        use super::*;

        #[tokio::test]
        async fn test_root() {
            let (status, body) = send(app(Some("s3cret")), fetch("/")).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({ "status": "ok", "service": "sisreg-api" }));
        }

        #[tokio::test]
        async fn test_healthz() {
            let (status, body) = send(app(Some("s3cret")), fetch("/healthz")).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({ "status": "ok" }));
        }

        #[tokio::test]
        async fn test_debug_auth() {
            let request = Request::builder()
                .uri("/debug/auth")
                .header("Authorization", "Bearer abcdefghijklmnop")
                .header("X-API-Token", "xyz")
                .body(Body::empty())
                .unwrap();
            let (status, body) = send(app(Some("s3cret")), request).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(
                body,
                json!({
                    "has_authorization": true,
                    "auth_sample": "Bearer abcde",
                    "x_api_token_len": 3
                })
            );
        }

        #[tokio::test]
        async fn test_debug_auth_without_headers() {
            let (_, body) = send(app(None), fetch("/debug/auth")).await;
            assert_eq!(body["has_authorization"], false);
            assert_eq!(body["auth_sample"], Value::Null);
            assert_eq!(body["x_api_token_len"], 0);
        }
    }

    mod auth_tests {
        use super::*;

        fn with_header(name: &str, value: &str) -> Request<Body> {
            Request::builder()
                .uri("/consulta?codigo=123456")
                .header(name, value)
                .body(Body::empty())
                .unwrap()
        }

        #[tokio::test]
        async fn test_missing_token_rejected() {
            let (status, body) = send(app(Some("s3cret")), fetch("/consulta?codigo=123456")).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, json!({ "detail": "Unauthorized" }));
        }

        #[tokio::test]
        async fn test_wrong_token_rejected() {
            let request = with_header("Authorization", "Bearer nope");
            let (status, _) = send(app(Some("s3cret")), request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        #[tokio::test]
        async fn test_accepted_token_forms() {
            for (name, value) in [
                ("Authorization", "Bearer s3cret"),
                ("Authorization", "bearer   s3cret "),
                ("Authorization", "s3cret"),
                ("X-API-Token", " s3cret"),
            ] {
                let (status, _) = send(app(Some("s3cret")), with_header(name, value)).await;
                assert_eq!(status, StatusCode::OK, "{name}: {value}");
            }
        }

        #[tokio::test]
        async fn test_open_mode_without_secret() {
            let (status, _) = send(app(None), fetch("/consulta?codigo=123456")).await;
            assert_eq!(status, StatusCode::OK);
        }

        #[test]
        fn test_extract_token_prefers_authorization() {
            let mut headers = HeaderMap::new();
            headers.insert(header::AUTHORIZATION, "Bearer a".parse().unwrap());
            headers.insert(API_TOKEN_HEADER, "b".parse().unwrap());
            assert_eq!(extract_token(&headers).as_deref(), Some("a"));
        }

        #[test]
        fn test_extract_token_empty_bearer_falls_back() {
            let mut headers = HeaderMap::new();
            headers.insert(header::AUTHORIZATION, "Bearer ".parse().unwrap());
            headers.insert(API_TOKEN_HEADER, "b".parse().unwrap());
            assert_eq!(extract_token(&headers).as_deref(), Some("b"));
            assert_eq!(extract_token(&HeaderMap::new()), None);
        }
    }

    mod consulta_tests {
        use super::*;

        #[tokio::test]
        async fn test_record() {
            let (status, body) = send(app(None), fetch("/consulta?codigo=%20123456%20")).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["codigo_solicitacao"], "123456");
            assert_eq!(body["procedimento"], "Consulta X");
            assert_eq!(body["posicao"], 12);
            assert_eq!(body["tempo_espera_dias"], 30);
            assert_eq!(body["status"], "");
        }

        #[tokio::test]
        async fn test_blank_code_is_bad_request() {
            let (status, body) = send(app(None), fetch("/consulta?codigo=%20%20")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({ "detail": "search code is empty" }));
            let (status, _) = send(app(None), fetch("/consulta")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }

        #[tokio::test]
        async fn test_unknown_code_is_not_found() {
            let (status, body) = send(app(None), fetch("/consulta?codigo=999")).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert!(body["detail"].as_str().unwrap().contains("999"));
        }
    }

    mod lote_tests {
        use super::*;

        fn post_batch(body: &Value) -> Request<Body> {
            Request::builder()
                .method("POST")
                .uri("/consulta-lote")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        }

        #[tokio::test]
        async fn test_batch_order_and_failures() {
            let request = post_batch(&json!({ "codigos": ["123456", " ", "999"] }));
            let (status, body) = send(app(None), request).await;
            assert_eq!(status, StatusCode::OK);
            let resultados = body["resultados"].as_array().unwrap();
            assert_eq!(resultados.len(), 2);
            assert_eq!(resultados[0]["procedimento"], "Consulta X");
            assert_eq!(resultados[1]["codigo_solicitacao"], "999");
            assert_eq!(resultados[1]["error"], "code 999 has no records");
        }

        #[tokio::test]
        async fn test_batch_requires_token() {
            let request = post_batch(&json!({ "codigos": ["123456"] }));
            let (status, _) = send(app(Some("s3cret")), request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        #[tokio::test]
        async fn test_empty_batch() {
            let (status, body) = send(app(None), post_batch(&json!({ "codigos": [] }))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({ "resultados": [] }));
        }
    }
}
