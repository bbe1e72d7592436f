//! HTTP surface for the filter pipeline.
//!
//! Three routes: `GET /health` (service probe), `POST /api/filter`
//! (multipart CSV upload, runs one complete pipeline invocation and
//! answers with both outputs inline), `GET /api/logs` (SSE feed of run
//! progress). Nothing is stored server-side; every upload is one
//! self-contained run.

use axum::{
    extract::Multipart,
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::LOG_BROADCASTER;
use super::types::{error_response, schema_error_response, FilterResponse};
use crate::error::LoadError;
use crate::models::Variant;
use crate::transform::pipeline::{filter_bytes, FilterOptions};

/// Bind on `0.0.0.0:port` and serve until the process is stopped.
pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    // Permissive CORS so the dev frontend can call from another origin
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/filter", post(filter_csv))
        .route("/api/logs", get(sse_logs))
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 loyalsift listening on http://localhost:{}", port);
    println!("   POST /api/filter   upload a CSV export");
    println!("   GET  /api/logs     follow run progress (SSE)");
    println!("   GET  /health       service probe");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "loyalsift",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "filter": "POST /api/filter",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// Forward every broadcast log entry to this subscriber as one SSE event.
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload-and-filter endpoint.
///
/// Multipart fields: `file` (required, the CSV) and `variant` (optional,
/// `minimal` or `extended`; defaults to `extended`). Schema failures
/// answer 422 with both column lists, parse failures answer 400.
async fn filter_csv(
    mut multipart: Multipart,
) -> Result<Json<FilterResponse>, (StatusCode, Json<Value>)> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut variant = Variant::Extended;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(error_response(&format!("Multipart error: {}", e))),
        )
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                file_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| {
                            (
                                StatusCode::BAD_REQUEST,
                                Json(error_response(&format!("Read error: {}", e))),
                            )
                        })?
                        .to_vec(),
                );
            }
            "variant" => {
                let text = field.text().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(error_response(&format!("Read error: {}", e))),
                    )
                })?;
                variant = text
                    .parse()
                    .map_err(|e: String| (StatusCode::BAD_REQUEST, Json(error_response(&e))))?;
            }
            _ => {}
        }
    }

    let bytes = file_data
        .ok_or_else(|| (StatusCode::BAD_REQUEST, Json(error_response("No file provided"))))?;

    println!("\n{}", "=".repeat(60));
    println!(
        "📄 Upload: {} ({} bytes, {} rule set)",
        file_name.as_deref().unwrap_or("unnamed"),
        bytes.len(),
        variant
    );
    println!("{}\n", "=".repeat(60));

    let options = FilterOptions {
        variant,
        delimiter: None,
    };

    let report = filter_bytes(&bytes, &options).map_err(|e| {
        eprintln!("❌ Filter error: {}", e);
        match e {
            LoadError::Schema(ref schema) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(schema_error_response(schema)),
            ),
            LoadError::Parse(_) => (StatusCode::BAD_REQUEST, Json(error_response(&e.to_string()))),
        }
    })?;

    println!("\n{}", "=".repeat(60));
    println!(
        "📊 Done: {} total, {} kept, {} excluded",
        report.counts.total, report.counts.kept, report.counts.excluded
    );
    println!("{}\n", "=".repeat(60));

    let response = FilterResponse::from_report(report, variant).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(error_response(&e.to_string())),
        )
    })?;

    Ok(Json(response))
}
