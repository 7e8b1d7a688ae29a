use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_acquire_timeout: Duration,
    pub server_host: String,
    pub server_port: u16,
    pub telegram_bot_token: String,
    /// Telegram ids that are treated as staff regardless of stored role.
    pub admin_ids: Vec<i64>,
    pub admin_api_token: String,
    pub telegram_auth_max_age_secs: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;

        let db_acquire_timeout_secs: u64 = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?;

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()?;

        let telegram_bot_token = env::var("TELEGRAM_BOT_TOKEN")?;

        let admin_ids = Self::parse_admin_ids(&env::var("ADMIN_IDS").unwrap_or_default());

        let admin_api_token = env::var("ADMIN_API_TOKEN")?;
        if admin_api_token.len() < 16 {
            return Err("ADMIN_API_TOKEN must be at least 16 characters".into());
        }

        let telegram_auth_max_age_secs = env::var("TELEGRAM_AUTH_MAX_AGE_SECS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()?;

        Ok(Config {
            database_url,
            db_acquire_timeout: Duration::from_secs(db_acquire_timeout_secs),
            server_host,
            server_port,
            telegram_bot_token,
            admin_ids,
            admin_api_token,
            telegram_auth_max_age_secs,
        })
    }

    // Accepts "1,2,3", "1;2;3" or "1 2 3"; silently skips junk entries.
    fn parse_admin_ids(raw: &str) -> Vec<i64> {
        raw.replace(';', ",")
            .replace(' ', ",")
            .split(',')
            .filter_map(|part| part.trim().parse().ok())
            .collect()
    }

    pub fn is_admin_id(&self, id: i64) -> bool {
        self.admin_ids.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_ids() {
        assert_eq!(Config::parse_admin_ids("1,2,3"), vec![1, 2, 3]);
        assert_eq!(Config::parse_admin_ids("1; 2;3"), vec![1, 2, 3]);
        assert_eq!(Config::parse_admin_ids(""), Vec::<i64>::new());
        assert_eq!(Config::parse_admin_ids("1,abc,3"), vec![1, 3]);
    }
}
