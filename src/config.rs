use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub price_timeout_secs: u64,
    pub metalprice_url: String,
    pub metalprice_api_key: String,
    pub goldapi_url: String,
    pub goldapi_token: String,
    /// Rolling window for retained price samples
    pub price_window_hours: i64,
    pub initial_gold_price: f64,
    pub history_days: u32,
    /// Fixed seed for the synthetic history; entropy-seeded when unset
    pub history_seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(5000),
            price_timeout_secs: std::env::var("PRICE_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(10),
            metalprice_url: std::env::var("METALPRICE_URL").unwrap_or_else(|_| "https://api.metalpriceapi.com/v1/latest".to_string()),
            metalprice_api_key: std::env::var("METALPRICE_API_KEY").unwrap_or_else(|_| "demo".to_string()),
            goldapi_url: std::env::var("GOLDAPI_URL").unwrap_or_else(|_| "https://www.goldapi.io/api/XAU/USD".to_string()),
            goldapi_token: std::env::var("GOLDAPI_TOKEN").unwrap_or_else(|_| "goldapi-demo-key".to_string()),
            price_window_hours: std::env::var("PRICE_WINDOW_HOURS").ok().and_then(|v| v.parse().ok()).unwrap_or(24),
            initial_gold_price: std::env::var("INITIAL_GOLD_PRICE").ok().and_then(|v| v.parse().ok()).unwrap_or(2000.0),
            history_days: std::env::var("HISTORY_DAYS").ok().and_then(|v| v.parse().ok()).unwrap_or(90),
            history_seed: std::env::var("HISTORY_SEED").ok().and_then(|v| v.parse().ok()),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn price_timeout(&self) -> Duration {
        Duration::from_secs(self.price_timeout_secs)
    }

    pub fn price_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.price_window_hours.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            price_timeout_secs: 10,
            metalprice_url: "https://api.metalpriceapi.com/v1/latest".to_string(),
            metalprice_api_key: "demo".to_string(),
            goldapi_url: "https://www.goldapi.io/api/XAU/USD".to_string(),
            goldapi_token: "goldapi-demo-key".to_string(),
            price_window_hours: 24,
            initial_gold_price: 2000.0,
            history_days: 90,
            history_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:5000");
        assert_eq!(cfg.price_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.price_window(), chrono::Duration::hours(24));
        assert_eq!(cfg.history_days, 90);
    }

    #[test]
    fn test_window_never_zero() {
        let cfg = Config { price_window_hours: 0, ..Config::default() };
        assert_eq!(cfg.price_window(), chrono::Duration::hours(1));
    }
}
