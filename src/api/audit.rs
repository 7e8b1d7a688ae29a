use axum::{ Json, extract::{ Query, State } };
use serde::{ Deserialize, Serialize };

use crate::db::audit_log;
use crate::enums::AuditAction;
use crate::error::Result;
use crate::services::DEFAULT_AUDIT_LIMIT;

use super::AppState;

#[derive(Serialize)]
pub struct AuditEntryResponse {
    pub id: i64,
    pub actor: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: i64,
    pub meta: serde_json::Value,
    pub created_at: String,
}

impl From<audit_log::Model> for AuditEntryResponse {
    fn from(entry: audit_log::Model) -> Self {
        Self {
            id: entry.id,
            actor: entry.actor,
            action: entry.action,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            meta: entry.meta,
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

#[derive(Deserialize)]
pub struct AuditQuery {
    pub limit: Option<u64>,
    pub actor: Option<String>,
    pub action: Option<String>,
}

pub async fn list_audit(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>
) -> Result<Json<Vec<AuditEntryResponse>>> {
    let action = match query.action.as_deref() {
        Some(raw) => Some(raw.parse::<AuditAction>()?),
        None => None,
    };

    let entries = state.audit.list(
        query.limit.unwrap_or(DEFAULT_AUDIT_LIMIT),
        query.actor.as_deref(),
        action
    ).await?;

    Ok(Json(entries.into_iter().map(AuditEntryResponse::from).collect()))
}
