//! Policy, committee, audit and search handlers

use super::{parse_id, tenant};
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use spm_storage::{AuditRecord, QueryWindow, SearchHit};
use spm_types::{Committee, CommitteeId, Policy, PolicyId};

const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Paging parameters for list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ListQuery {
    fn window(&self) -> QueryWindow {
        QueryWindow {
            limit: self.limit.unwrap_or(0),
            offset: self.offset.unwrap_or(0),
        }
    }
}

/// Head of a tenant's audit chain
#[derive(Debug, Serialize)]
pub struct AuditHeadResponse {
    pub latest_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub limit: Option<usize>,
}

pub async fn list_policies(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Policy>>> {
    let tenant_id = tenant(&tenant_id)?;
    let policies = state
        .registry
        .policies()
        .await?
        .list_policies(&tenant_id, query.window())
        .await?;
    Ok(Json(policies))
}

pub async fn get_policy(
    State(state): State<AppState>,
    Path((tenant_id, policy_id)): Path<(String, String)>,
) -> ApiResult<Json<Policy>> {
    let tenant_id = tenant(&tenant_id)?;
    let policy_id: PolicyId = parse_id("policy_id", &policy_id)?;
    state
        .registry
        .policies()
        .await?
        .get_policy(&tenant_id, &policy_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("policy {policy_id}")))
}

pub async fn list_committees(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Committee>>> {
    let tenant_id = tenant(&tenant_id)?;
    let committees = state
        .registry
        .committees()
        .await?
        .list_committees(&tenant_id, query.window())
        .await?;
    Ok(Json(committees))
}

pub async fn get_committee(
    State(state): State<AppState>,
    Path((tenant_id, committee_id)): Path<(String, String)>,
) -> ApiResult<Json<Committee>> {
    let tenant_id = tenant(&tenant_id)?;
    let committee_id: CommitteeId = parse_id("committee_id", &committee_id)?;
    state
        .registry
        .committees()
        .await?
        .get_committee(&tenant_id, &committee_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("committee {committee_id}")))
}

/// Audit trail for a tenant, newest first
pub async fn list_audit(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<AuditRecord>>> {
    let tenant_id = tenant(&tenant_id)?;
    let records = state
        .registry
        .audit()
        .await?
        .list_audit(&tenant_id, query.window())
        .await?;
    Ok(Json(records))
}

pub async fn audit_head(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> ApiResult<Json<AuditHeadResponse>> {
    let tenant_id = tenant(&tenant_id)?;
    let latest_hash = state
        .registry
        .audit()
        .await?
        .latest_audit_hash(&tenant_id)
        .await?;
    Ok(Json(AuditHeadResponse { latest_hash }))
}

pub async fn search(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<SearchHit>>> {
    let tenant_id = tenant(&tenant_id)?;
    if query.q.trim().is_empty() {
        return Err(ApiError::validation("q", "search query must not be empty"));
    }
    let hits = state
        .registry
        .search()
        .await?
        .search(
            &tenant_id,
            &query.q,
            query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
        )
        .await?;
    Ok(Json(hits))
}
