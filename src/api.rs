use axum::{
    extract::{ConnectInfo, Json, State},
    http::HeaderMap,
    response::{Html, IntoResponse},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::net::SocketAddr;
use std::time::Instant;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{run_runs_test, RunsTestRequest, RunsTestResponse, RunsTestResult, Verdict};

/// Largest prefix of the submitted input kept in the query log
const MAX_SAMPLE_SIZE: usize = 5 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(runs_test_handler),
    components(schemas(RunsTestRequest, RunsTestResponse, RunsTestResult, Verdict)),
    tags((name = "runs-test", description = "Runs test above/below the mean"))
)]
pub struct ApiDoc;

/// Build the HTTP application; `pool` enables query logging when present
pub fn app(pool: Option<PgPool>) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/api/runs-test", post(runs_test_handler))
        .nest_service("/static", ServeDir::new("static"))
        .with_state(pool)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn serve_index() -> impl IntoResponse {
    info!("Serving index page");

    let html = include_str!("../static/index.html");
    let html_with_version = html
        .replace("{{GIT_HASH}}", env!("GIT_HASH"))
        .replace("{{GIT_DATE}}", env!("GIT_DATE"));

    Html(html_with_version)
}

/// Run the runs test on the submitted observations
#[utoipa::path(
    post,
    path = "/api/runs-test",
    tag = "runs-test",
    request_body = RunsTestRequest,
    responses(
        (status = 200, description = "Test outcome; `valid` is false when the input cannot be tested", body = RunsTestResponse)
    )
)]
pub async fn runs_test_handler(
    State(pool): State<Option<PgPool>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<RunsTestRequest>,
) -> Json<RunsTestResponse> {
    let start_time = Instant::now();
    let query_id = uuid::Uuid::new_v4();

    let client_ip = extract_client_ip(&headers, addr);
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("Unknown");

    info!(
        "Runs test request received: query_id={}, ip={}, {} bytes",
        query_id,
        client_ip,
        payload.numbers.len()
    );

    let response = run_runs_test(&payload);
    let processing_time_ms = start_time.elapsed().as_millis() as i32;

    if response.valid {
        info!(
            "Runs test computed: query_id={}, random={}, time={}ms",
            query_id, response.random, processing_time_ms
        );
    } else {
        warn!(
            "Runs test rejected: query_id={}, reason={}, time={}ms",
            query_id, response.message, processing_time_ms
        );
    }

    if let Some(pool) = pool {
        if let Err(e) = log_query_to_database(
            &pool,
            query_id,
            &client_ip,
            user_agent,
            &payload,
            &response,
            processing_time_ms,
        )
        .await
        {
            error!("Failed to log query to database: {}", e);
        }
    }

    Json(response)
}

/// Client IP from proxy headers, falling back to the socket address
pub fn extract_client_ip(headers: &HeaderMap, addr: SocketAddr) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim())
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        return real_ip.trim().to_string();
    }

    addr.ip().to_string()
}

/// Cut `input` to at most `max` bytes on a character boundary
fn truncate_sample(input: &str, max: usize) -> (&str, bool) {
    if input.len() <= max {
        return (input, false);
    }
    let mut end = max;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

async fn log_query_to_database(
    pool: &PgPool,
    query_id: uuid::Uuid,
    client_ip: &str,
    user_agent: &str,
    request: &RunsTestRequest,
    response: &RunsTestResponse,
    processing_time_ms: i32,
) -> Result<(), sqlx::Error> {
    let (numbers_sample, numbers_truncated) = truncate_sample(&request.numbers, MAX_SAMPLE_SIZE);
    let result = response.result.as_ref();
    let error_message = (!response.valid).then(|| response.message.as_str());

    sqlx::query(
        r#"
        INSERT INTO runs_queries (
            query_id, created_at, client_ip, user_agent,
            numbers_sample, numbers_truncated, values_count,
            valid, random, run_count, n_above, n_below,
            mean, z_score, p_value,
            processing_time_ms, error_message
        ) VALUES (
            $1, $2, $3, $4,
            $5, $6, $7,
            $8, $9, $10, $11, $12,
            $13, $14, $15,
            $16, $17
        )
        "#,
    )
    .bind(query_id)
    .bind(chrono::Utc::now())
    .bind(client_ip)
    .bind(user_agent)
    .bind(numbers_sample)
    .bind(numbers_truncated)
    .bind(result.map(|r| r.len() as i32))
    .bind(response.valid)
    .bind(response.random)
    .bind(result.map(|r| r.run_count as i32))
    .bind(result.map(|r| r.n_above as i32))
    .bind(result.map(|r| r.n_below as i32))
    .bind(result.map(|r| r.mean))
    .bind(result.map(|r| r.z_score))
    .bind(result.map(|r| r.p_value))
    .bind(processing_time_ms)
    .bind(error_message)
    .execute(pool)
    .await?;

    info!("Query logged to database: query_id={}", query_id);
    Ok(())
}
