//! HTTP surface: JSON in, JSON out.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::{AppError, ValidationError};
use crate::insights::{Insight, Report};
use crate::logging::{log, log_insight_report, log_record_rejected, log_record_submitted, obj, v_str, Domain, Level, ProfileScope};
use crate::price::PriceSample;
use crate::record::{round2, ProductionRecord, ShiftReport};
use crate::state::AppState;

pub type SharedState = Arc<AppState>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, level) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, Level::Warn),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, Level::Info),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, Level::Error),
        };
        let msg = self.to_string();
        log(
            level,
            Domain::Http,
            "request_failed",
            obj(&[("status", json!(status.as_u16())), ("msg", v_str(&msg))]),
        );
        (status, Json(json!({ "error": msg }))).into_response()
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/production-data", get(list_production).post(submit_production))
        .route("/api/gold-price", get(gold_price))
        .route("/api/gold-price/history", get(gold_price_history))
        .route("/api/ml/:report", get(insight_report))
        .with_state(state)
}

pub async fn serve(state: SharedState, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionList {
    pub production_data: Vec<ProductionRecord>,
    pub historical_records: usize,
}

pub async fn list_production(State(state): State<SharedState>) -> Json<ProductionList> {
    let snapshot = state.snapshot();
    Json(ProductionList {
        production_data: snapshot.entries().to_vec(),
        historical_records: snapshot.historical_records,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submitted {
    pub success: bool,
    pub production_entry: ProductionRecord,
    pub production_data: Vec<ProductionRecord>,
}

pub async fn submit_production(
    State(state): State<SharedState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Submitted>, AppError> {
    let submitted = body
        .map_err(|rejection| ValidationError::MalformedBody(rejection.body_text()))
        .and_then(|Json(body)| ShiftReport::from_json(&body))
        .and_then(|report| state.submit(report, Utc::now()));

    match submitted {
        Ok((record, entries)) => {
            log_record_submitted(
                record.id.unwrap_or_default(),
                record.gold_extracted,
                record.ore_processed,
                record.efficiency,
            );
            Ok(Json(Submitted {
                success: true,
                production_entry: record,
                production_data: entries,
            }))
        }
        Err(err) => {
            log_record_rejected(&err.to_string());
            Err(err.into())
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GoldPrice {
    pub success: bool,
    pub price: f64,
    pub change: f64,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
}

pub async fn gold_price(State(state): State<SharedState>) -> Json<GoldPrice> {
    let quote = state.oracle.refresh().await;
    Json(GoldPrice {
        success: true,
        price: round2(quote.sample.price),
        change: round2(quote.sample.change),
        timestamp: quote.sample.timestamp,
        source: quote.sample.source.tag().to_string(),
        note: quote.note,
    })
}

#[derive(Debug, Serialize)]
pub struct PriceHistory {
    pub history: Vec<PriceSample>,
}

pub async fn gold_price_history(State(state): State<SharedState>) -> Json<PriceHistory> {
    Json(PriceHistory { history: state.oracle.history() })
}

#[derive(Debug, Serialize)]
pub struct Insights {
    pub insights: Vec<Insight>,
}

pub async fn insight_report(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<Insights>, AppError> {
    let report = Report::from_name(&name)
        .ok_or_else(|| AppError::NotFound(format!("Unknown report: {}", name)))?;

    let snapshot = state.snapshot();
    let market = state.oracle.market_context();

    let insights = {
        let _scope = ProfileScope::with_context("insight_report", &[("report", v_str(report.name()))]);
        report.build(&snapshot.records, market)
    };
    log_insight_report(report.name(), snapshot.records.len(), insights.len());
    Ok(Json(Insights { insights }))
}
