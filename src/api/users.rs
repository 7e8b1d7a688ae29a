use axum::{ Json, extract::{ Path, Query, State } };
use serde::{ Deserialize, Serialize };

use crate::db::user;
use crate::error::{ AppError, Result };
use crate::money;
use crate::services::DEFAULT_PAGE_SIZE;

use super::{ API_ACTOR, AppState };

#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub external_id: i64,
    pub handle: Option<String>,
    pub role: String,
    pub balance: String,
    pub balance_cents: i64,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            external_id: user.external_id,
            handle: user.handle,
            role: user.role,
            balance: money::format_cents(user.balance_cents),
            balance_cents: user.balance_cents,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>
) -> Result<Json<Vec<UserResponse>>> {
    let users = state.users.list(
        page.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        page.offset.unwrap_or(0)
    ).await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(ident): Path<String>
) -> Result<Json<UserResponse>> {
    let user = state.users.find(&ident).await?;

    Ok(Json(UserResponse::from(user)))
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub external_id: i64,
    pub balance: String,
    pub balance_cents: i64,
}

pub async fn get_balance(
    State(state): State<AppState>,
    Path(ident): Path<String>
) -> Result<Json<BalanceResponse>> {
    let user = state.balances.get(&ident).await?;

    Ok(
        Json(BalanceResponse {
            external_id: user.external_id,
            balance: money::format_cents(user.balance_cents),
            balance_cents: user.balance_cents,
        })
    )
}

#[derive(Deserialize)]
pub struct BalanceOpRequest {
    pub op: String,
    pub amount: String,
}

pub async fn change_balance(
    State(state): State<AppState>,
    Path(ident): Path<String>,
    Json(request): Json<BalanceOpRequest>
) -> Result<Json<UserResponse>> {
    let amount_cents = money::parse_amount(&request.amount)?;

    let user = match request.op.as_str() {
        "set" => state.balances.set(&ident, amount_cents, API_ACTOR).await?,
        "add" => state.balances.add(&ident, amount_cents, API_ACTOR).await?,
        "sub" => state.balances.sub(&ident, amount_cents, API_ACTOR).await?,
        other => {
            return Err(AppError::InvalidInput(format!(
                "Invalid op: {}. Supported: set, add, sub",
                other
            )));
        }
    };

    Ok(Json(UserResponse::from(user)))
}

#[derive(Deserialize)]
pub struct RoleRequest {
    pub role: String,
}

pub async fn set_role(
    State(state): State<AppState>,
    Path(ident): Path<String>,
    Json(request): Json<RoleRequest>
) -> Result<Json<UserResponse>> {
    let role = request.role.parse()?;
    let user = state.users.set_role(&ident, role, API_ACTOR).await?;

    Ok(Json(UserResponse::from(user)))
}

#[derive(Deserialize)]
pub struct DepositRequest {
    pub amount: String,
}

pub async fn deposit(
    State(state): State<AppState>,
    Path(ident): Path<String>,
    Json(request): Json<DepositRequest>
) -> Result<Json<UserResponse>> {
    let amount_cents = money::parse_amount(&request.amount)?;
    let user = state.balances.add(&ident, amount_cents, API_ACTOR).await?;

    Ok(Json(UserResponse::from(user)))
}
