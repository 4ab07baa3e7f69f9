use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use time::Date;
use tracing::instrument;

use crate::auth::jwt::AuthStaff;
use crate::dates::parse_date;
use crate::error::ApiError;
use crate::reports::dto::{DateRangeQuery, HistoryQuery};
use crate::reports::repo::{self, HistoryRow, MonthlyCount, ReportRow, StatusCount};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/history", get(history))
        .route("/reports/books/status", get(status_summary))
        .route("/reports/borrows/monthly", get(monthly_borrows))
        .route("/reports/borrows", get(borrow_report))
}

const MAX_HISTORY_LIMIT: i64 = 1000;

/// SQLite treats `LIMIT -1` (or any negative limit) as unbounded, so the
/// caller-supplied row cap is clamped before it reaches the query.
fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_HISTORY_LIMIT)
}

fn parse_range(start: &str, end: &str) -> Result<(Date, Date), ApiError> {
    let mut errors = Vec::new();
    let start = parse_date(start.trim()).ok();
    let end = parse_date(end.trim()).ok();
    if start.is_none() {
        errors.push("start date must be YYYY-MM-DD".to_string());
    }
    if end.is_none() {
        errors.push("end date must be YYYY-MM-DD".to_string());
    }
    match (start, end) {
        (Some(start), Some(end)) if start <= end => Ok((start, end)),
        (Some(_), Some(_)) => Err(ApiError::Validation(vec![
            "start date must not be after end date".to_string(),
        ])),
        _ => Err(ApiError::Validation(errors)),
    }
}

#[instrument(skip(state, _staff))]
pub async fn history(
    State(state): State<AppState>,
    _staff: AuthStaff,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryRow>>, ApiError> {
    Ok(Json(repo::history(&state.db, clamp_limit(query.limit)).await?))
}

#[instrument(skip(state, _staff))]
pub async fn status_summary(
    State(state): State<AppState>,
    _staff: AuthStaff,
) -> Result<Json<Vec<StatusCount>>, ApiError> {
    Ok(Json(repo::status_summary(&state.db).await?))
}

#[instrument(skip(state, _staff))]
pub async fn monthly_borrows(
    State(state): State<AppState>,
    _staff: AuthStaff,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<MonthlyCount>>, ApiError> {
    let (start, end) = parse_range(&query.start, &query.end)?;
    Ok(Json(
        repo::monthly_borrow_counts(&state.db, start, end).await?,
    ))
}

#[instrument(skip(state, _staff))]
pub async fn borrow_report(
    State(state): State<AppState>,
    _staff: AuthStaff,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<ReportRow>>, ApiError> {
    let (start, end) = parse_range(&query.start, &query.end)?;
    Ok(Json(
        repo::filtered_report(&state.db, start, end, query.status.as_item_status()).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_parser_collects_field_errors() {
        let err = parse_range("nonsense", "").unwrap_err();
        match err {
            ApiError::Validation(messages) => assert_eq!(messages.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn range_parser_rejects_inverted_ranges() {
        assert!(parse_range("2025-02-01", "2025-01-01").is_err());
        assert!(parse_range("2025-01-01", "2025-01-31").is_ok());
    }

    #[test]
    fn history_limit_is_clamped_to_sane_bounds() {
        assert_eq!(clamp_limit(-1), 1);
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(200), 200);
        assert_eq!(clamp_limit(50_000), MAX_HISTORY_LIMIT);
    }
}
