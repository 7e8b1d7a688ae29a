use axum::{ Json, extract::{ Query, State } };

use crate::error::Result;
use crate::sim::{ SimParams, SimReport, run_simulation };

use super::AppState;

pub async fn run_sim(
    State(_state): State<AppState>,
    Query(params): Query<SimParams>
) -> Result<Json<SimReport>> {
    if params.daily_percent > 150.0 || params.trades_per_day > 50 {
        tracing::warn!(
            daily_percent = params.daily_percent,
            trades_per_day = params.trades_per_day,
            "Unrealistic simulation settings"
        );
    }

    let report = run_simulation(&params)?;
    Ok(Json(report))
}
