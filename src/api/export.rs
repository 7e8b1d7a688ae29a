use axum::extract::{ Path, State };
use axum::http::header;
use axum::response::IntoResponse;

use crate::enums::{ ExportEntity, ExportFormat };
use crate::error::{ AppError, Result };

use super::AppState;

/// `GET /api/export/{entity}.{format}`, e.g. `users.csv` or
/// `audit.json`. Streams the full table as an attachment.
pub async fn export_entity(
    State(state): State<AppState>,
    Path(target): Path<String>
) -> Result<impl IntoResponse> {
    let (entity_raw, format_raw) = target.rsplit_once('.').ok_or_else(|| {
        AppError::InvalidInput(format!("Expected <entity>.<format>, got: {}", target))
    })?;

    let entity: ExportEntity = entity_raw.parse()?;
    let format: ExportFormat = format_raw.parse()?;

    let body = state.export.export(entity, format).await?;

    let headers = [
        (header::CONTENT_TYPE, format.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", target.to_lowercase()),
        ),
    ];

    Ok((headers, body))
}
