//! Document version lifecycle handlers

use super::{parse_id, tenant};
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use spm_lifecycle::{calculate_checksum, SourceFile, TimelineEntry, VersionDiff, VersionStats};
use spm_storage::PublishOutcome;
use spm_types::{
    ChangeType, DocumentId, DocumentVersion, LifecycleStatus, TransitionCheck, VersionId,
    VersionNumber,
};

/// Register a source file already held elsewhere
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub document_id: Option<String>,
    pub source_file_url: Option<String>,
    pub source_file_name: Option<String>,
    pub source_file_type: Option<String>,
    #[serde(default)]
    pub source_file_size: u64,
    pub created_by: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub file_name: String,
    pub created_by: String,
    pub document_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub content: String,
    pub processed_by: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    pub content: Option<String>,
    pub transitioned_by: String,
    pub change_description: Option<String>,
}

/// Body shared by submit, publish and archive
#[derive(Debug, Deserialize)]
pub struct ActorRequest {
    pub actor: String,
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub approved_by: String,
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub rejected_by: String,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct NextVersionQuery {
    pub change_type: String,
}

#[derive(Debug, Deserialize)]
pub struct CanTransitionQuery {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ChecksumRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChecksumResponse {
    pub checksum: String,
}

#[derive(Debug, Serialize)]
pub struct NextVersionResponse {
    pub version_number: VersionNumber,
}

/// Import a raw source file
pub async fn import_document(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Json(request): Json<ImportRequest>,
) -> ApiResult<(StatusCode, Json<DocumentVersion>)> {
    let tenant_id = tenant(&tenant_id)?;
    let document_id = request
        .document_id
        .as_deref()
        .map(|raw| parse_id::<DocumentId>("document_id", raw))
        .transpose()?;
    let source = SourceFile {
        url: request.source_file_url,
        name: request.source_file_name,
        file_type: request.source_file_type,
        size: request.source_file_size,
    };

    let version = state
        .lifecycle()
        .await?
        .import_raw(&tenant_id, document_id, source, &request.created_by)
        .await?;
    Ok((StatusCode::CREATED, Json(version)))
}

/// Store uploaded bytes and import them as a raw version
pub async fn upload_document(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<DocumentVersion>)> {
    let tenant_id = tenant(&tenant_id)?;
    let document_id = query
        .document_id
        .as_deref()
        .map(|raw| parse_id::<DocumentId>("document_id", raw))
        .transpose()?;
    if body.is_empty() {
        return Err(ApiError::validation("body", "upload must not be empty"));
    }
    let file_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    let version = state
        .lifecycle()
        .await?
        .import_upload(
            &tenant_id,
            document_id,
            &query.file_name,
            file_type,
            &body,
            &query.created_by,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(version)))
}

pub async fn list_versions(
    State(state): State<AppState>,
    Path((tenant_id, document_id)): Path<(String, String)>,
) -> ApiResult<Json<Vec<DocumentVersion>>> {
    let tenant_id = tenant(&tenant_id)?;
    let document_id: DocumentId = parse_id("document_id", &document_id)?;
    let versions = state
        .lifecycle()
        .await?
        .list_versions(&tenant_id, &document_id)
        .await?;
    Ok(Json(versions))
}

/// Current ACTIVE_FINAL version of a document
pub async fn get_active_version(
    State(state): State<AppState>,
    Path((tenant_id, document_id)): Path<(String, String)>,
) -> ApiResult<Json<DocumentVersion>> {
    let tenant_id = tenant(&tenant_id)?;
    let document_id: DocumentId = parse_id("document_id", &document_id)?;
    state
        .lifecycle()
        .await?
        .get_active_version(&tenant_id, &document_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no active version for document {document_id}")))
}

pub async fn get_timeline(
    State(state): State<AppState>,
    Path((tenant_id, document_id)): Path<(String, String)>,
) -> ApiResult<Json<Vec<TimelineEntry>>> {
    let tenant_id = tenant(&tenant_id)?;
    let document_id: DocumentId = parse_id("document_id", &document_id)?;
    let timeline = state
        .lifecycle()
        .await?
        .get_timeline(&tenant_id, &document_id)
        .await?;
    Ok(Json(timeline))
}

pub async fn get_stats(
    State(state): State<AppState>,
    Path((tenant_id, document_id)): Path<(String, String)>,
) -> ApiResult<Json<VersionStats>> {
    let tenant_id = tenant(&tenant_id)?;
    let document_id: DocumentId = parse_id("document_id", &document_id)?;
    let stats = state
        .lifecycle()
        .await?
        .get_version_stats(&tenant_id, &document_id)
        .await?;
    Ok(Json(stats))
}

pub async fn next_version_number(
    State(state): State<AppState>,
    Path((tenant_id, document_id)): Path<(String, String)>,
    Query(query): Query<NextVersionQuery>,
) -> ApiResult<Json<NextVersionResponse>> {
    let tenant_id = tenant(&tenant_id)?;
    let document_id: DocumentId = parse_id("document_id", &document_id)?;
    let change_type: ChangeType = parse_id("change_type", &query.change_type)?;
    let version_number = state
        .lifecycle()
        .await?
        .get_next_version_number(&tenant_id, &document_id, change_type)
        .await?;
    Ok(Json(NextVersionResponse { version_number }))
}

pub async fn get_version(
    State(state): State<AppState>,
    Path((tenant_id, version_id)): Path<(String, String)>,
) -> ApiResult<Json<DocumentVersion>> {
    let tenant_id = tenant(&tenant_id)?;
    let version_id: VersionId = parse_id("version_id", &version_id)?;
    let version = state
        .lifecycle()
        .await?
        .get_version(&tenant_id, &version_id)
        .await?;
    Ok(Json(version))
}

/// RAW -> PROCESSED
pub async fn process_version(
    State(state): State<AppState>,
    Path((tenant_id, version_id)): Path<(String, String)>,
    Json(request): Json<ProcessRequest>,
) -> ApiResult<(StatusCode, Json<DocumentVersion>)> {
    let tenant_id = tenant(&tenant_id)?;
    let version_id: VersionId = parse_id("version_id", &version_id)?;
    let version = state
        .lifecycle()
        .await?
        .process_to_markdown(
            &tenant_id,
            &version_id,
            &request.content,
            &request.processed_by,
            request.notes,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(version)))
}

/// Derive a DRAFT from a PROCESSED, UNDER_REVIEW or APPROVED version
pub async fn draft_version(
    State(state): State<AppState>,
    Path((tenant_id, version_id)): Path<(String, String)>,
    Json(request): Json<DraftRequest>,
) -> ApiResult<(StatusCode, Json<DocumentVersion>)> {
    let tenant_id = tenant(&tenant_id)?;
    let version_id: VersionId = parse_id("version_id", &version_id)?;
    let version = state
        .lifecycle()
        .await?
        .transition_to_draft(
            &tenant_id,
            &version_id,
            request.content,
            &request.transitioned_by,
            request.change_description,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(version)))
}

pub async fn submit_version(
    State(state): State<AppState>,
    Path((tenant_id, version_id)): Path<(String, String)>,
    Json(request): Json<ActorRequest>,
) -> ApiResult<Json<DocumentVersion>> {
    let tenant_id = tenant(&tenant_id)?;
    let version_id: VersionId = parse_id("version_id", &version_id)?;
    let version = state
        .lifecycle()
        .await?
        .submit_for_review(&tenant_id, &version_id, &request.actor)
        .await?;
    Ok(Json(version))
}

pub async fn approve_version(
    State(state): State<AppState>,
    Path((tenant_id, version_id)): Path<(String, String)>,
    Json(request): Json<ApproveRequest>,
) -> ApiResult<Json<DocumentVersion>> {
    let tenant_id = tenant(&tenant_id)?;
    let version_id: VersionId = parse_id("version_id", &version_id)?;
    let version = state
        .lifecycle()
        .await?
        .approve(&tenant_id, &version_id, &request.approved_by, request.comments)
        .await?;
    Ok(Json(version))
}

/// Send a version back to DRAFT in place
pub async fn reject_version(
    State(state): State<AppState>,
    Path((tenant_id, version_id)): Path<(String, String)>,
    Json(request): Json<RejectRequest>,
) -> ApiResult<Json<DocumentVersion>> {
    let tenant_id = tenant(&tenant_id)?;
    let version_id: VersionId = parse_id("version_id", &version_id)?;
    let version = state
        .lifecycle()
        .await?
        .reject(&tenant_id, &version_id, &request.rejected_by, &request.reason)
        .await?;
    Ok(Json(version))
}

pub async fn publish_version(
    State(state): State<AppState>,
    Path((tenant_id, version_id)): Path<(String, String)>,
    Json(request): Json<ActorRequest>,
) -> ApiResult<Json<PublishOutcome>> {
    let tenant_id = tenant(&tenant_id)?;
    let version_id: VersionId = parse_id("version_id", &version_id)?;
    let outcome = state
        .lifecycle()
        .await?
        .publish_to_active(&tenant_id, &version_id, &request.actor)
        .await?;
    Ok(Json(outcome))
}

pub async fn archive_version(
    State(state): State<AppState>,
    Path((tenant_id, version_id)): Path<(String, String)>,
    Json(request): Json<ActorRequest>,
) -> ApiResult<Json<DocumentVersion>> {
    let tenant_id = tenant(&tenant_id)?;
    let version_id: VersionId = parse_id("version_id", &version_id)?;
    let version = state
        .lifecycle()
        .await?
        .archive(&tenant_id, &version_id, &request.actor)
        .await?;
    Ok(Json(version))
}

pub async fn can_transition(
    State(state): State<AppState>,
    Path((tenant_id, version_id)): Path<(String, String)>,
    Query(query): Query<CanTransitionQuery>,
) -> ApiResult<Json<TransitionCheck>> {
    let tenant_id = tenant(&tenant_id)?;
    let version_id: VersionId = parse_id("version_id", &version_id)?;
    let status: LifecycleStatus = parse_id("status", &query.status)?;
    let check = state
        .lifecycle()
        .await?
        .can_transition(&tenant_id, &version_id, status)
        .await?;
    Ok(Json(check))
}

pub async fn compare_versions(
    State(state): State<AppState>,
    Path((tenant_id, version_a, version_b)): Path<(String, String, String)>,
) -> ApiResult<Json<VersionDiff>> {
    let tenant_id = tenant(&tenant_id)?;
    let version_a: VersionId = parse_id("version_a", &version_a)?;
    let version_b: VersionId = parse_id("version_b", &version_b)?;
    let diff = state
        .lifecycle()
        .await?
        .compare_versions(&tenant_id, &version_a, &version_b)
        .await?;
    Ok(Json(diff))
}

/// SHA-256 of content as a version would record it
pub async fn checksum(
    Path(tenant_id): Path<String>,
    Json(request): Json<ChecksumRequest>,
) -> ApiResult<Json<ChecksumResponse>> {
    tenant(&tenant_id)?;
    Ok(Json(ChecksumResponse {
        checksum: calculate_checksum(&request.content),
    }))
}
