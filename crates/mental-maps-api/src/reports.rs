use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use serde_json::Value;
use tracing::info;

use mental_maps_db::ReportFilter;
use mental_maps_types::api::{CreateReportRequest, FieldIssue, ListReportsQuery, Page, ReportSummary};
use mental_maps_types::models::{Report, ReportStatus};

use crate::convert::{now, report_summary, report_to_row};
use crate::error::{ApiError, ensure_valid};
use crate::extract::{JsonBody, QueryParams};
use crate::ids::new_id;
use crate::maps::string_or_empty;
use crate::middleware::Caller;
use crate::pagination::PageRequest;
use crate::policy::require_moderator;
use crate::state::{AppState, run_blocking};

/// POST /reports: flag a map for moderation.
///
/// Any authenticated caller may report any map, private ones included.
pub async fn create_report(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    JsonBody(req): JsonBody<CreateReportRequest>,
) -> Result<(StatusCode, Json<Report>), ApiError> {
    let mut details = Vec::new();
    let map_id = match req.map_id {
        Some(Value::String(s)) if !s.is_empty() => s,
        _ => {
            details.push(FieldIssue::new("mapId", "required"));
            String::new()
        }
    };
    let reason = match req.reason {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => {
            details.push(FieldIssue::new("reason", "required"));
            String::new()
        }
    };
    ensure_valid(details)?;

    let lookup = map_id.clone();
    if !run_blocking(&state, move |db| db.map_exists(&lookup)).await? {
        return Err(ApiError::not_found("Cannot create report: map not found"));
    }

    let report = Report {
        report_id: new_id("rep"),
        map_id,
        author_id: caller.id,
        reason,
        comment: string_or_empty(req.comment),
        status: ReportStatus::New,
        created_at: now(),
    };

    let row = report_to_row(&report);
    run_blocking(&state, move |db| db.insert_report(&row)).await?;

    info!("Report {} filed against map {} by {}", report.report_id, report.map_id, report.author_id);
    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /reports: every report, newest first. Moderators only.
pub async fn list_reports(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    QueryParams(pairs): QueryParams<Vec<(String, String)>>,
) -> Result<Json<Page<ReportSummary>>, ApiError> {
    require_moderator(&caller)?;

    let query = ListReportsQuery::from_pairs(&pairs);
    let page = PageRequest::from_query(query.limit.as_deref(), query.cursor.as_deref());
    let status = query.status;

    let (rows, total) = run_blocking(&state, move |db| {
        let filter = ReportFilter {
            status: status.as_deref(),
        };
        let rows = db.list_reports(&filter, page.limit, page.offset)?;
        let total = db.count_reports(&filter)?;
        Ok((rows, total))
    })
    .await?;

    let next_cursor = page.next_cursor(rows.len(), total);
    Ok(Json(Page {
        items: rows.into_iter().map(report_summary).collect(),
        next_cursor,
    }))
}
