use axum::{ Json, extract::{ Request, State }, middleware::Next, response::Response };
use hmac::{ Hmac, Mac };
use serde::Serialize;
use serde_json::{ Map, Value };
use sha2::{ Digest, Sha256 };

use crate::error::{ AppError, Result };

use super::AppState;
use super::users::UserResponse;

type HmacSha256 = Hmac<Sha256>;

/// Gate for the admin routes: requires `Authorization: Bearer <token>`
/// matching the configured admin token.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next
) -> Result<Response> {
    let token = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match token {
        Some(token) if digests_match(token, &state.config.admin_api_token) => {
            Ok(next.run(request).await)
        }
        _ => Err(AppError::Unauthorized("Missing or invalid bearer token".to_string())),
    }
}

// Compared as SHA-256 digests: the comparison time must not track how
// much of the secret matches.
fn digests_match(a: &str, b: &str) -> bool {
    Sha256::digest(a.as_bytes()) == Sha256::digest(b.as_bytes())
}

#[derive(Serialize)]
pub struct TelegramLoginResponse {
    pub ok: bool,
    pub is_admin: bool,
    pub user: UserResponse,
}

/// Telegram Login Widget verification. The widget posts its fields
/// verbatim; the signature covers every field except `hash`. A valid
/// login registers the user (idempotent) and returns the ledger row.
pub async fn verify_telegram_login(
    State(state): State<AppState>,
    Json(payload): Json<Map<String, Value>>
) -> Result<Json<TelegramLoginResponse>> {
    let login = verify_login(
        &payload,
        &state.config.telegram_bot_token,
        state.config.telegram_auth_max_age_secs
    )?;

    let user = state.users.register(login.id, login.username.as_deref()).await?;
    let is_admin = state.users.is_admin(login.id).await;

    Ok(
        Json(TelegramLoginResponse {
            ok: true,
            is_admin,
            user: UserResponse::from(user),
        })
    )
}

struct VerifiedLogin {
    id: i64,
    username: Option<String>,
}

fn verify_login(
    payload: &Map<String, Value>,
    bot_token: &str,
    max_age_secs: i64
) -> Result<VerifiedLogin> {
    let received_hash = payload
        .get("hash")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::InvalidInput("Missing hash".to_string()))?;

    // data-check-string: key=value lines sorted by key, hash excluded
    let mut fields: Vec<(&String, &Value)> = payload
        .iter()
        .filter(|(key, _)| key.as_str() != "hash")
        .collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));
    let data_check_string = fields
        .iter()
        .map(|(key, value)| format!("{}={}", key, plain(value)))
        .collect::<Vec<_>>()
        .join("\n");

    let secret_key = Sha256::digest(bot_token.as_bytes());
    let mut mac = HmacSha256::new_from_slice(&secret_key).map_err(|_| {
        AppError::Unauthorized("Invalid signature".to_string())
    })?;
    mac.update(data_check_string.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    if !digests_match(&expected, &received_hash.to_lowercase()) {
        return Err(AppError::Unauthorized("Invalid signature".to_string()));
    }

    let auth_date = int_field(payload, "auth_date").ok_or_else(|| {
        AppError::InvalidInput("Missing auth_date".to_string())
    })?;
    let age = chrono::Utc::now().timestamp() - auth_date;
    if age.abs() > max_age_secs {
        return Err(AppError::Unauthorized("Login data expired".to_string()));
    }

    let id = int_field(payload, "id").ok_or_else(|| {
        AppError::InvalidInput("Missing id".to_string())
    })?;
    let username = payload
        .get("username")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(VerifiedLogin { id, username })
}

// The widget sends numbers both bare and as strings.
fn int_field(payload: &Map<String, Value>, key: &str) -> Option<i64> {
    let value = payload.get(key)?;
    value.as_i64().or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TOKEN: &str = "12345:TEST_TOKEN";

    fn signed_payload(entries: Vec<(&str, Value)>) -> Map<String, Value> {
        let mut payload = Map::new();
        for (key, value) in entries {
            payload.insert(key.to_string(), value);
        }

        let mut fields: Vec<(&String, &Value)> = payload.iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        let data_check_string = fields
            .iter()
            .map(|(key, value)| format!("{}={}", key, plain(value)))
            .collect::<Vec<_>>()
            .join("\n");

        let secret_key = Sha256::digest(TOKEN.as_bytes());
        let mut mac = HmacSha256::new_from_slice(&secret_key).unwrap();
        mac.update(data_check_string.as_bytes());
        let hash = hex::encode(mac.finalize().into_bytes());

        payload.insert("hash".to_string(), json!(hash));
        payload
    }

    #[test]
    fn test_valid_login_passes() {
        let payload = signed_payload(
            vec![
                ("id", json!(777000)),
                ("username", json!("alice")),
                ("first_name", json!("Alice")),
                ("auth_date", json!(chrono::Utc::now().timestamp()))
            ]
        );

        let login = verify_login(&payload, TOKEN, 86_400).unwrap();
        assert_eq!(login.id, 777000);
        assert_eq!(login.username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_tampered_field_is_rejected() {
        let mut payload = signed_payload(
            vec![("id", json!(777000)), ("auth_date", json!(chrono::Utc::now().timestamp()))]
        );
        payload.insert("id".to_string(), json!(999999));

        assert!(matches!(
            verify_login(&payload, TOKEN, 86_400),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_stale_login_is_rejected() {
        let payload = signed_payload(
            vec![
                ("id", json!(777000)),
                ("auth_date", json!(chrono::Utc::now().timestamp() - 100_000))
            ]
        );

        assert!(matches!(
            verify_login(&payload, TOKEN, 86_400),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_missing_hash_is_rejected() {
        let mut payload = Map::new();
        payload.insert("id".to_string(), json!(1));

        assert!(verify_login(&payload, TOKEN, 86_400).is_err());
    }

    #[test]
    fn test_string_fields_sign_without_quotes() {
        // Same signature whether the widget sends id as number or string.
        let payload = signed_payload(
            vec![
                ("id", json!("777000")),
                ("auth_date", json!(chrono::Utc::now().timestamp().to_string()))
            ]
        );

        let login = verify_login(&payload, TOKEN, 86_400).unwrap();
        assert_eq!(login.id, 777000);
    }
}
