use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::Value;
use tracing::{info, warn};

use mental_maps_db::MapFilter;
use mental_maps_types::api::{
    CreateElementRequest, CreateMapRequest, ElementSummary, FieldIssue, ItemList, ListMapsQuery,
    MapSummary, Page,
};
use mental_maps_types::models::{Element, Map, Visibility};

use crate::convert::{element_summary, element_to_row, map_from_row, map_summary, map_to_row, now};
use crate::error::{ApiError, ensure_valid};
use crate::extract::{JsonBody, QueryParams};
use crate::ids::new_id;
use crate::middleware::Caller;
use crate::pagination::PageRequest;
use crate::policy::{can_read, can_write};
use crate::state::{AppState, run_blocking};

/// Validated fields of a new map.
struct NewMap {
    title: String,
    description: String,
    visibility: Visibility,
}

fn validate_new_map(req: CreateMapRequest) -> Result<NewMap, ApiError> {
    let mut details = Vec::new();

    let title = match req.title {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => {
            details.push(FieldIssue::new("title", "required"));
            String::new()
        }
    };

    let visibility = match req.visibility {
        None => Visibility::default(),
        Some(Value::String(s)) => Visibility::parse(&s).unwrap_or_else(|| {
            details.push(FieldIssue::new("visibility", "must be 'private' or 'public'"));
            Visibility::default()
        }),
        Some(_) => {
            details.push(FieldIssue::new("visibility", "must be 'private' or 'public'"));
            Visibility::default()
        }
    };

    ensure_valid(details)?;

    Ok(NewMap {
        title,
        description: string_or_empty(req.description),
        visibility,
    })
}

/// Validated fields of a new element.
struct NewElement {
    kind: String,
    x: f64,
    y: f64,
    content: String,
    style: Value,
}

fn validate_new_element(req: CreateElementRequest) -> Result<NewElement, ApiError> {
    let mut details = Vec::new();

    let kind = match req.kind {
        Some(Value::String(s)) if !s.is_empty() => s,
        _ => {
            details.push(FieldIssue::new("type", "required"));
            String::new()
        }
    };

    let mut coordinate = |field: &str, value: Option<Value>| match value.as_ref().and_then(Value::as_f64) {
        Some(n) => n,
        None => {
            details.push(FieldIssue::new(field, "must be number"));
            0.0
        }
    };
    let x = coordinate("x", req.x);
    let y = coordinate("y", req.y);

    ensure_valid(details)?;

    Ok(NewElement {
        kind,
        x,
        y,
        content: string_or_empty(req.content),
        style: req.style.unwrap_or_else(|| Value::Object(Default::default())),
    })
}

/// Optional free-text fields: anything but a string is stored as empty.
pub(crate) fn string_or_empty(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        _ => String::new(),
    }
}

/// Load a map or fail with 404.
async fn load_map(state: &AppState, map_id: String) -> Result<Map, ApiError> {
    run_blocking(state, move |db| db.get_map(&map_id))
        .await?
        .map(map_from_row)
        .ok_or_else(|| ApiError::not_found("Map not found"))
}

/// POST /maps: create a map owned by the caller.
pub async fn create_map(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    JsonBody(req): JsonBody<CreateMapRequest>,
) -> Result<(StatusCode, Json<Map>), ApiError> {
    let new_map = validate_new_map(req)?;

    let ts = now();
    let map = Map {
        map_id: new_id("map"),
        owner_id: caller.id,
        title: new_map.title,
        description: new_map.description,
        visibility: new_map.visibility,
        created_at: ts,
        updated_at: ts,
    };

    let row = map_to_row(&map);
    run_blocking(&state, move |db| db.insert_map(&row)).await?;

    info!("Map {} created by {} ({})", map.map_id, map.owner_id, map.visibility);
    Ok((StatusCode::CREATED, Json(map)))
}

/// GET /maps: the caller's own maps, most recently updated first.
///
/// Moderators get their own maps here too; other users' maps are never listed.
pub async fn list_maps(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    QueryParams(pairs): QueryParams<Vec<(String, String)>>,
) -> Result<Json<Page<MapSummary>>, ApiError> {
    let query = ListMapsQuery::from_pairs(&pairs);
    let page = PageRequest::from_query(query.limit.as_deref(), query.cursor.as_deref());
    // An unrecognised visibility is ignored rather than rejected.
    let visibility = query.visibility.as_deref().and_then(Visibility::parse);

    let (rows, total) = run_blocking(&state, move |db| {
        let filter = MapFilter {
            owner_id: &caller.id,
            visibility: visibility.as_ref().map(Visibility::as_str),
        };
        let rows = db.list_maps(&filter, page.limit, page.offset)?;
        let total = db.count_maps(&filter)?;
        Ok((rows, total))
    })
    .await?;

    let next_cursor = page.next_cursor(rows.len(), total);
    Ok(Json(Page {
        items: rows.into_iter().map(map_summary).collect(),
        next_cursor,
    }))
}

/// GET /maps/{map_id}
pub async fn get_map(
    State(state): State<AppState>,
    Path(map_id): Path<String>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Map>, ApiError> {
    let map = load_map(&state, map_id).await?;
    if !can_read(&caller, &map) {
        warn!("{} denied read on map {}", caller.id, map.map_id);
        return Err(ApiError::forbidden("Insufficient permissions to view this map"));
    }
    Ok(Json(map))
}

/// POST /maps/{map_id}/elements: add an element and bump the map's `updatedAt`.
pub async fn add_element(
    State(state): State<AppState>,
    Path(map_id): Path<String>,
    Extension(caller): Extension<Caller>,
    JsonBody(req): JsonBody<CreateElementRequest>,
) -> Result<(StatusCode, Json<Element>), ApiError> {
    let map = load_map(&state, map_id).await?;
    if !can_write(&caller, &map) {
        warn!("{} denied write on map {}", caller.id, map.map_id);
        return Err(ApiError::forbidden("Insufficient permissions to modify this map"));
    }

    let new_element = validate_new_element(req)?;
    let element = Element {
        element_id: new_id("el"),
        map_id: map.map_id,
        kind: new_element.kind,
        x: new_element.x,
        y: new_element.y,
        content: new_element.content,
        style: new_element.style,
        created_at: now(),
    };

    let row = element_to_row(&element);
    run_blocking(&state, move |db| db.insert_element(&row)).await?;

    Ok((StatusCode::CREATED, Json(element)))
}

/// GET /maps/{map_id}/elements: every element, oldest first. Not paginated.
pub async fn list_elements(
    State(state): State<AppState>,
    Path(map_id): Path<String>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<ItemList<ElementSummary>>, ApiError> {
    let map = load_map(&state, map_id).await?;
    if !can_read(&caller, &map) {
        warn!("{} denied element read on map {}", caller.id, map.map_id);
        return Err(ApiError::forbidden(
            "Insufficient permissions to view this map's elements",
        ));
    }

    let rows = run_blocking(&state, move |db| db.list_elements(&map.map_id)).await?;
    Ok(Json(ItemList {
        items: rows.into_iter().map(element_summary).collect(),
    }))
}
