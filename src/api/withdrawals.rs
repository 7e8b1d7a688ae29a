use axum::{ Json, extract::{ Path, Query, State } };
use serde::{ Deserialize, Serialize };

use crate::db::withdrawal;
use crate::enums::WithdrawalStatus;
use crate::error::Result;
use crate::money;
use crate::services::DEFAULT_PAGE_SIZE;
use crate::services::withdrawal_service::DEFAULT_NETWORK;

use super::{ API_ACTOR, AppState };
use super::users::UserResponse;

#[derive(Serialize)]
pub struct WithdrawalResponse {
    pub id: i64,
    pub user_id: i64,
    pub amount: String,
    pub amount_cents: i64,
    pub destination: String,
    pub network: String,
    pub status: String,
    pub requested_at: String,
    pub decided_at: Option<String>,
    pub decided_by: Option<String>,
    pub txid: Option<String>,
    pub note: Option<String>,
}

impl From<withdrawal::Model> for WithdrawalResponse {
    fn from(row: withdrawal::Model) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            amount: money::format_cents(row.amount_cents),
            amount_cents: row.amount_cents,
            destination: row.destination,
            network: row.network,
            status: row.status,
            requested_at: row.requested_at.to_rfc3339(),
            decided_at: row.decided_at.map(|ts| ts.to_rfc3339()),
            decided_by: row.decided_by,
            txid: row.txid,
            note: row.note,
        }
    }
}

#[derive(Deserialize)]
pub struct WithdrawalListQuery {
    pub status: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

pub async fn list_withdrawals(
    State(state): State<AppState>,
    Query(query): Query<WithdrawalListQuery>
) -> Result<Json<Vec<WithdrawalResponse>>> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(raw.parse::<WithdrawalStatus>()?),
        None => None,
    };

    let rows = state.withdrawals.list(
        status,
        query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        query.offset.unwrap_or(0)
    ).await?;

    Ok(Json(rows.into_iter().map(WithdrawalResponse::from).collect()))
}

#[derive(Serialize)]
pub struct PendingWithdrawalResponse {
    pub withdrawal: WithdrawalResponse,
    pub user: Option<UserResponse>,
}

pub async fn pending_withdrawals(
    State(state): State<AppState>,
    Query(page): Query<super::users::PageQuery>
) -> Result<Json<Vec<PendingWithdrawalResponse>>> {
    let rows = state.withdrawals.queue(page.limit.unwrap_or(DEFAULT_PAGE_SIZE)).await?;

    let rows = rows
        .into_iter()
        .map(|(row, requester)| PendingWithdrawalResponse {
            withdrawal: WithdrawalResponse::from(row),
            user: requester.map(UserResponse::from),
        })
        .collect();

    Ok(Json(rows))
}

pub async fn get_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<i64>
) -> Result<Json<WithdrawalResponse>> {
    let row = state.withdrawals.get(id).await?;

    Ok(Json(WithdrawalResponse::from(row)))
}

#[derive(Deserialize)]
pub struct ApproveRequest {
    pub txid: Option<String>,
}

pub async fn approve_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ApproveRequest>
) -> Result<Json<WithdrawalResponse>> {
    let row = state.withdrawals.approve(id, API_ACTOR, request.txid.as_deref()).await?;

    Ok(Json(WithdrawalResponse::from(row)))
}

#[derive(Deserialize)]
pub struct DenyRequest {
    pub note: Option<String>,
}

pub async fn deny_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<DenyRequest>
) -> Result<Json<WithdrawalResponse>> {
    let row = state.withdrawals.deny(id, API_ACTOR, request.note.as_deref()).await?;

    Ok(Json(WithdrawalResponse::from(row)))
}

#[derive(Deserialize)]
pub struct CreateWithdrawalRequest {
    pub external_id: i64,
    pub amount: String,
    pub destination: String,
    pub network: Option<String>,
}

#[derive(Serialize)]
pub struct CreateWithdrawalResponse {
    pub withdrawal: WithdrawalResponse,
    pub user: UserResponse,
}

/// Files a request on a user's behalf. Same debit-at-request semantics
/// as the bot flow.
pub async fn create_withdrawal(
    State(state): State<AppState>,
    Json(request): Json<CreateWithdrawalRequest>
) -> Result<Json<CreateWithdrawalResponse>> {
    let amount_cents = money::parse_amount(&request.amount)?;

    let (row, user) = state.withdrawals.request(
        request.external_id,
        None,
        amount_cents,
        &request.destination,
        request.network.as_deref().unwrap_or(DEFAULT_NETWORK),
        API_ACTOR
    ).await?;

    Ok(
        Json(CreateWithdrawalResponse {
            withdrawal: WithdrawalResponse::from(row),
            user: UserResponse::from(user),
        })
    )
}
