use serde::{ Deserialize, Serialize };

use crate::enums::SimMode;
use crate::error::{ AppError, Result };

// Input bounds match the original projection tool.
pub const MAX_DAYS: u32 = 365;
pub const MAX_TRADES_PER_DAY: u32 = 100;

const MAX_PROJECTED_CENTS: f64 = 9.0e18;

#[derive(Debug, Clone, Deserialize)]
pub struct SimParams {
    pub balance_cents: i64,
    pub daily_percent: f64,
    pub days: u32,
    pub trades_per_day: u32,
    pub mode: SimMode,
    /// Step at which `WithdrawAnytime` cashes out. The day is required
    /// for that mode; the trade defaults to the day's last trade.
    pub withdraw_day: Option<u32>,
    pub withdraw_trade: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimStep {
    pub day: u32,
    pub trade: u32,
    pub balance_cents: i64,
    pub withdrawn_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct SimReport {
    pub steps: Vec<SimStep>,
    pub final_balance_cents: i64,
    pub total_withdrawn_cents: i64,
}

/// Fabricated profit projection. Pure arithmetic over the inputs; the
/// ledger is never consulted or touched. Each trade earns
/// `balance * daily_percent / trades_per_day / 100`, rounded half-up
/// to whole cents:
/// - `Reinvest` compounds the profit into the balance.
/// - `Withdraw` accrues the profit to a withdrawn total; the balance
///   stays flat.
/// - `WithdrawAnytime` compounds until the chosen step, then cashes
///   out the whole balance and stops.
pub fn run_simulation(params: &SimParams) -> Result<SimReport> {
    if params.balance_cents < 0 {
        return Err(AppError::InvalidInput("Initial balance cannot be negative".to_string()));
    }
    if !params.daily_percent.is_finite() || params.daily_percent <= 0.0 {
        return Err(AppError::InvalidInput("Daily percent must be positive".to_string()));
    }
    if params.days < 1 || params.days > MAX_DAYS {
        return Err(AppError::InvalidInput(format!("Days must be between 1 and {}", MAX_DAYS)));
    }
    if params.trades_per_day < 1 || params.trades_per_day > MAX_TRADES_PER_DAY {
        return Err(AppError::InvalidInput(format!(
            "Trades per day must be between 1 and {}",
            MAX_TRADES_PER_DAY
        )));
    }

    let stop = match params.mode {
        SimMode::WithdrawAnytime => {
            let day = params.withdraw_day.ok_or_else(|| {
                AppError::InvalidInput(
                    "withdraw_day is required for withdraw_anytime mode".to_string()
                )
            })?;
            let trade = params.withdraw_trade.unwrap_or(params.trades_per_day);
            if day < 1 || day > params.days {
                return Err(AppError::InvalidInput(
                    "withdraw_day is outside the simulated range".to_string()
                ));
            }
            if trade < 1 || trade > params.trades_per_day {
                return Err(AppError::InvalidInput(
                    "withdraw_trade is outside the simulated range".to_string()
                ));
            }
            Some((day, trade))
        }
        _ => None,
    };

    let rate = params.daily_percent / (params.trades_per_day as f64) / 100.0;
    let mut balance = params.balance_cents;
    let mut withdrawn: i64 = 0;
    let mut steps = Vec::with_capacity((params.days as usize) * (params.trades_per_day as usize));

    'days: for day in 1..=params.days {
        for trade in 1..=params.trades_per_day {
            if stop == Some((day, trade)) {
                withdrawn = withdrawn.checked_add(balance).ok_or_else(overflow)?;
                balance = 0;
                steps.push(SimStep {
                    day,
                    trade,
                    balance_cents: balance,
                    withdrawn_cents: withdrawn,
                });
                break 'days;
            }

            let profit = trade_profit(balance, rate)?;
            match params.mode {
                SimMode::Withdraw => {
                    withdrawn = withdrawn.checked_add(profit).ok_or_else(overflow)?;
                }
                _ => {
                    balance = balance.checked_add(profit).ok_or_else(overflow)?;
                }
            }

            steps.push(SimStep {
                day,
                trade,
                balance_cents: balance,
                withdrawn_cents: withdrawn,
            });
        }
    }

    Ok(SimReport {
        steps,
        final_balance_cents: balance,
        total_withdrawn_cents: withdrawn,
    })
}

fn trade_profit(balance_cents: i64, rate: f64) -> Result<i64> {
    let profit = (balance_cents as f64) * rate;
    if !profit.is_finite() || profit >= MAX_PROJECTED_CENTS {
        return Err(overflow());
    }
    Ok(profit.round() as i64)
}

fn overflow() -> AppError {
    AppError::InvalidInput("Projection overflowed, reduce the horizon or the rate".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(mode: SimMode) -> SimParams {
        SimParams {
            balance_cents: 10_000,
            daily_percent: 10.0,
            days: 3,
            trades_per_day: 1,
            mode,
            withdraw_day: None,
            withdraw_trade: None,
        }
    }

    #[test]
    fn test_reinvest_compounds() {
        let report = run_simulation(&params(SimMode::Reinvest)).unwrap();

        assert_eq!(report.steps.len(), 3);
        assert_eq!(report.steps[0].balance_cents, 11_000);
        assert_eq!(report.steps[1].balance_cents, 12_100);
        assert_eq!(report.steps[2].balance_cents, 13_310);
        assert_eq!(report.final_balance_cents, 13_310);
        assert_eq!(report.total_withdrawn_cents, 0);
    }

    #[test]
    fn test_withdraw_keeps_balance_flat() {
        let report = run_simulation(&params(SimMode::Withdraw)).unwrap();

        assert_eq!(report.final_balance_cents, 10_000);
        assert_eq!(report.total_withdrawn_cents, 3_000);
        assert!(report.steps.iter().all(|step| step.balance_cents == 10_000));
    }

    #[test]
    fn test_withdraw_anytime_cashes_out_and_stops() {
        let mut params = params(SimMode::WithdrawAnytime);
        params.days = 5;
        params.withdraw_day = Some(3);
        params.withdraw_trade = Some(1);

        let report = run_simulation(&params).unwrap();

        // Two compounding days, then the whole balance leaves.
        assert_eq!(report.steps.len(), 3);
        assert_eq!(report.final_balance_cents, 0);
        assert_eq!(report.total_withdrawn_cents, 12_100);
        let last = report.steps.last().unwrap();
        assert_eq!((last.day, last.trade), (3, 1));
    }

    #[test]
    fn test_withdraw_anytime_requires_day() {
        let params = params(SimMode::WithdrawAnytime);
        assert!(run_simulation(&params).is_err());
    }

    #[test]
    fn test_daily_rate_splits_across_trades() {
        let params = SimParams {
            balance_cents: 100_000,
            daily_percent: 35.0,
            days: 1,
            trades_per_day: 5,
            mode: SimMode::Reinvest,
            withdraw_day: None,
            withdraw_trade: None,
        };

        let report = run_simulation(&params).unwrap();

        assert_eq!(report.steps.len(), 5);
        assert_eq!(report.steps[0].balance_cents, 107_000);
        assert_eq!(report.final_balance_cents, 140_255);
    }

    #[test]
    fn test_rounds_half_up_per_trade() {
        let params = SimParams {
            balance_cents: 105,
            daily_percent: 10.0,
            days: 1,
            trades_per_day: 1,
            mode: SimMode::Reinvest,
            withdraw_day: None,
            withdraw_trade: None,
        };

        // 10.5 cents of profit rounds to 11.
        let report = run_simulation(&params).unwrap();
        assert_eq!(report.final_balance_cents, 116);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let mut bad = params(SimMode::Reinvest);
        bad.days = 0;
        assert!(run_simulation(&bad).is_err());

        let mut bad = params(SimMode::Reinvest);
        bad.trades_per_day = 500;
        assert!(run_simulation(&bad).is_err());

        let mut bad = params(SimMode::Reinvest);
        bad.daily_percent = -5.0;
        assert!(run_simulation(&bad).is_err());

        let mut bad = params(SimMode::Reinvest);
        bad.balance_cents = -1;
        assert!(run_simulation(&bad).is_err());
    }
}
