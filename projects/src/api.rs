use crate::errors::ProjectsError;
use crate::ids::ObjectId;
use crate::metrics_defs::{RECORDS_CREATED, RECORDS_DELETED};
use crate::model::{Batch, BatchChanges, NewBatch, NewProject, Project, ProjectChanges};
use crate::pagination::{Page, PageRequest};
use crate::store::{BatchFilter, ProjectStore};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router, middleware};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use serde_json::{Value, json};
use shared::access_log::access_log;
use shared::cors::cors_layer;
use shared::validation::parse_json_object;

// Keeps pathological patterns from compiling into huge automata.
const SEARCH_SIZE_LIMIT: usize = 1 << 20;

pub fn router(store: ProjectStore) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/batches", get(list_batches).post(create_batch))
        .route(
            "/batches/{id}",
            get(get_batch).put(update_batch).delete(delete_batch),
        )
        .layer(middleware::from_fn(access_log))
        .layer(cors_layer())
        .with_state(store)
}

async fn healthz() -> Json<Value> {
    Json(json!({"status": "ok", "service": "ms-projects"}))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectQuery {
    search: Option<String>,
    page: Option<String>,
    page_size: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchQuery {
    project_id: Option<String>,
    status: Option<String>,
    page: Option<String>,
    page_size: Option<String>,
}

fn search_pattern(search: Option<&str>) -> Result<Option<Regex>, ProjectsError> {
    match search {
        None | Some("") => Ok(None),
        Some(pattern) => Ok(Some(
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .size_limit(SEARCH_SIZE_LIMIT)
                .build()?,
        )),
    }
}

async fn list_projects(
    State(store): State<ProjectStore>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<Page<Project>>, ProjectsError> {
    let search = search_pattern(query.search.as_deref())?;
    let page = PageRequest::from_query(query.page.as_deref(), query.page_size.as_deref());
    Ok(Json(store.list_projects(search, page).await?))
}

async fn create_project(
    State(store): State<ProjectStore>,
    body: Bytes,
) -> Result<(StatusCode, Json<Project>), ProjectsError> {
    let new = NewProject::from_json(&parse_json_object(&body)?)?;
    let project = store.create_project(new).await?;

    shared::counter!(RECORDS_CREATED, "kind" => "project").increment(1);
    tracing::debug!(id = %project.id, "project created");
    Ok((StatusCode::CREATED, Json(project)))
}

async fn get_project(
    State(store): State<ProjectStore>,
    Path(id): Path<String>,
) -> Result<Json<Project>, ProjectsError> {
    let id: ObjectId = id.parse()?;
    store
        .get_project(id)
        .await?
        .map(Json)
        .ok_or(ProjectsError::NotFound)
}

async fn update_project(
    State(store): State<ProjectStore>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Project>, ProjectsError> {
    let changes = ProjectChanges::from_json(&parse_json_object(&body)?)?;
    let id: ObjectId = id.parse()?;
    store
        .update_project(id, changes)
        .await?
        .map(Json)
        .ok_or(ProjectsError::NotFound)
}

async fn delete_project(
    State(store): State<ProjectStore>,
    Path(id): Path<String>,
) -> Result<StatusCode, ProjectsError> {
    let id: ObjectId = id.parse()?;
    if store.delete_project(id).await? {
        shared::counter!(RECORDS_DELETED, "kind" => "project").increment(1);
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_batches(
    State(store): State<ProjectStore>,
    Query(query): Query<BatchQuery>,
) -> Result<Json<Page<Batch>>, ProjectsError> {
    // blank filters match everything
    let filter = BatchFilter {
        project_id: query.project_id.filter(|v| !v.is_empty()),
        status: query.status.filter(|v| !v.is_empty()),
    };
    let page = PageRequest::from_query(query.page.as_deref(), query.page_size.as_deref());
    Ok(Json(store.list_batches(filter, page).await?))
}

async fn create_batch(
    State(store): State<ProjectStore>,
    body: Bytes,
) -> Result<(StatusCode, Json<Batch>), ProjectsError> {
    let new = NewBatch::from_json(&parse_json_object(&body)?)?;
    let batch = store.create_batch(new).await?;

    shared::counter!(RECORDS_CREATED, "kind" => "batch").increment(1);
    tracing::debug!(id = %batch.id, project_id = %batch.project_id, "batch created");
    Ok((StatusCode::CREATED, Json(batch)))
}

async fn get_batch(
    State(store): State<ProjectStore>,
    Path(id): Path<String>,
) -> Result<Json<Batch>, ProjectsError> {
    let id: ObjectId = id.parse()?;
    store
        .get_batch(id)
        .await?
        .map(Json)
        .ok_or(ProjectsError::NotFound)
}

async fn update_batch(
    State(store): State<ProjectStore>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Batch>, ProjectsError> {
    let changes = BatchChanges::from_json(&parse_json_object(&body)?)?;
    let id: ObjectId = id.parse()?;
    store
        .update_batch(id, changes)
        .await?
        .map(Json)
        .ok_or(ProjectsError::NotFound)
}

async fn delete_batch(
    State(store): State<ProjectStore>,
    Path(id): Path<String>,
) -> Result<StatusCode, ProjectsError> {
    let id: ObjectId = id.parse()?;
    if store.delete_batch(id).await? {
        shared::counter!(RECORDS_DELETED, "kind" => "batch").increment(1);
    }
    Ok(StatusCode::NO_CONTENT)
}
