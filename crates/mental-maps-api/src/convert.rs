//! Conversions between stored rows and wire models.
//!
//! Rows keep enums, timestamps and `style` as text. Values that fail to parse
//! are logged and replaced with a safe default rather than failing the request.

use chrono::{DateTime, SubsecRound, Utc};
use tracing::warn;

use mental_maps_db::models::{ElementRow, MapRow, ReportRow};
use mental_maps_types::api::{ElementSummary, MapSummary, ReportSummary};
use mental_maps_types::models::{Element, Map, Report, ReportStatus, Visibility};

/// Current time at the precision timestamps are stored with.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Stored and wire form are the same text.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    mental_maps_types::timestamp::format(ts)
}

fn parse_timestamp(raw: &str, column: &str, id: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            warn!("Corrupt {} '{}' on '{}': {}", column, raw, id, e);
            DateTime::default()
        })
}

fn parse_visibility(raw: &str, id: &str) -> Visibility {
    Visibility::parse(raw).unwrap_or_else(|| {
        warn!("Corrupt visibility '{}' on map '{}'", raw, id);
        Visibility::Private
    })
}

fn parse_status(raw: &str, id: &str) -> ReportStatus {
    ReportStatus::parse(raw).unwrap_or_else(|| {
        warn!("Corrupt status '{}' on report '{}'", raw, id);
        ReportStatus::New
    })
}

// -- Maps --

pub fn map_to_row(map: &Map) -> MapRow {
    MapRow {
        map_id: map.map_id.clone(),
        owner_id: map.owner_id.clone(),
        title: map.title.clone(),
        description: map.description.clone(),
        visibility: map.visibility.as_str().to_string(),
        created_at: format_timestamp(&map.created_at),
        updated_at: format_timestamp(&map.updated_at),
    }
}

pub fn map_from_row(row: MapRow) -> Map {
    Map {
        visibility: parse_visibility(&row.visibility, &row.map_id),
        created_at: parse_timestamp(&row.created_at, "created_at", &row.map_id),
        updated_at: parse_timestamp(&row.updated_at, "updated_at", &row.map_id),
        map_id: row.map_id,
        owner_id: row.owner_id,
        title: row.title,
        description: row.description,
    }
}

pub fn map_summary(row: MapRow) -> MapSummary {
    let map = map_from_row(row);
    MapSummary {
        map_id: map.map_id,
        title: map.title,
        visibility: map.visibility,
        updated_at: map.updated_at,
    }
}

// -- Elements --

pub fn element_to_row(element: &Element) -> ElementRow {
    ElementRow {
        element_id: element.element_id.clone(),
        map_id: element.map_id.clone(),
        kind: element.kind.clone(),
        x: element.x,
        y: element.y,
        content: element.content.clone(),
        style: element.style.to_string(),
        created_at: format_timestamp(&element.created_at),
    }
}

pub fn element_summary(row: ElementRow) -> ElementSummary {
    ElementSummary {
        element_id: row.element_id,
        kind: row.kind,
        x: row.x,
        y: row.y,
        content: row.content,
    }
}

// -- Reports --

pub fn report_to_row(report: &Report) -> ReportRow {
    ReportRow {
        report_id: report.report_id.clone(),
        map_id: report.map_id.clone(),
        author_id: report.author_id.clone(),
        reason: report.reason.clone(),
        comment: report.comment.clone(),
        status: report.status.as_str().to_string(),
        created_at: format_timestamp(&report.created_at),
    }
}

pub fn report_summary(row: ReportRow) -> ReportSummary {
    ReportSummary {
        status: parse_status(&row.status, &row.report_id),
        created_at: parse_timestamp(&row.created_at, "created_at", &row.report_id),
        report_id: row.report_id,
        map_id: row.map_id,
        reason: row.reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn timestamps_round_trip_at_millisecond_precision() {
        let ts = now();
        let text = format_timestamp(&ts);
        assert!(text.ends_with('Z'));
        assert_eq!(text.len(), "2026-01-01T00:00:00.000Z".len());
        assert_eq!(parse_timestamp(&text, "created_at", "x"), ts);
    }

    #[test]
    fn map_survives_storage() {
        let ts = now();
        let map = Map {
            map_id: "map_0000abcd".into(),
            owner_id: "u_alice".into(),
            title: "Trip".into(),
            description: "notes".into(),
            visibility: Visibility::Public,
            created_at: ts,
            updated_at: ts,
        };
        assert_eq!(map_from_row(map_to_row(&map)), map);
    }

    #[test]
    fn element_style_survives_storage() {
        let element = Element {
            element_id: "el_0000abcd".into(),
            map_id: "map_0000abcd".into(),
            kind: "node".into(),
            x: 10.25,
            y: -3.0,
            content: "idea".into(),
            style: serde_json::json!({ "color": "#ff0000", "size": 3 }),
            created_at: now(),
        };
        let row = element_to_row(&element);
        let style: Value = serde_json::from_str(&row.style).unwrap();
        assert_eq!(style, element.style);
        assert_eq!(row.kind, "node");
    }

    #[test]
    fn corrupt_values_fall_back() {
        let row = MapRow {
            map_id: "map_bad".into(),
            owner_id: "u_alice".into(),
            title: "t".into(),
            description: String::new(),
            visibility: "everyone".into(),
            created_at: "yesterday".into(),
            updated_at: "yesterday".into(),
        };
        let map = map_from_row(row);
        assert_eq!(map.visibility, Visibility::Private);
        assert_eq!(map.created_at, DateTime::<Utc>::default());
    }
}
