//! Local stand-in for the homework status API
//!
//! Serves a canned payload with two status records so the daemon can be
//! exercised without real credentials:
//!
//! ```bash
//! cargo run --bin debug_server
//! HWSTATUS_ENDPOINT=http://127.0.0.1:8080/api/user_api/homework_statuses/ hwstatusd
//! ```
//!
//! `DEBUG_SERVER_ADDR` overrides the listen address.

use axum::extract::Query;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;

const DEFAULT_ADDR: &str = "127.0.0.1:8080";

fn sample_payload() -> Value {
    json!({
        "homeworks": [
            {
                "id": 124,
                "status": "rejected",
                "homework_name": "username__hw_python_oop.zip",
                "reviewer_comment": "Код не по PEP8, нужно исправить",
                "date_updated": "2020-02-13T16:42:47Z",
                "lesson_name": "Итоговый проект"
            },
            {
                "id": 123,
                "status": "approved",
                "homework_name": "username__hw_test.zip",
                "reviewer_comment": "Всё нравится",
                "date_updated": "2020-02-11T14:40:57Z",
                "lesson_name": "Тестовый проект"
            }
        ],
        "current_date": 1581604970
    })
}

async fn homework_statuses(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    tracing::info!(
        "Status request from_date={}",
        params.get("from_date").map(String::as_str).unwrap_or("<missing>")
    );
    Json(sample_payload())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let addr: SocketAddr = std::env::var("DEBUG_SERVER_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()?;

    let router = Router::new().route("/api/user_api/homework_statuses/", get(homework_statuses));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Debug server listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    tracing::info!("Debug server stopped");
    Ok(())
}
