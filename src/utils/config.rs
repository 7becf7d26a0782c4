use std::net::SocketAddr;
use std::time::Duration;

use chrono::NaiveDate;

const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

pub const DEFAULT_SYMBOL: &str = "F";
pub const DEFAULT_START_DATE: &str = "2025-06-01";
pub const DEFAULT_INVESTMENT: f64 = 100.0;

pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, std::net::AddrParseError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8001);
        let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
        Ok(Self { addr })
    }
}

/// 行情数据源配置
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    /// 未设置时沿用 reqwest 默认（不超时）
    pub timeout: Option<Duration>,
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("YAHOO_BASE_URL")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_YAHOO_BASE_URL.to_string());
        let timeout = std::env::var("PROVIDER_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|value| *value > 0)
            .map(Duration::from_secs);
        Self { base_url, timeout }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

/// 查询参数缺省值：symbol=F, start_date=2025-06-01, investment=100
#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentDefaults {
    pub symbol: String,
    pub start_date: String,
    pub investment: f64,
}

impl Default for InvestmentDefaults {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            start_date: DEFAULT_START_DATE.to_string(),
            investment: DEFAULT_INVESTMENT,
        }
    }
}

impl InvestmentDefaults {
    /// 环境变量中的非法值会被忽略，回退到内置缺省值
    pub fn from_env() -> Self {
        let fallback = Self::default();

        let symbol = std::env::var("DEFAULT_SYMBOL")
            .ok()
            .map(|v| v.trim().to_uppercase())
            .filter(|v| !v.is_empty())
            .unwrap_or(fallback.symbol);
        let start_date = std::env::var("DEFAULT_START_DATE")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").is_ok())
            .unwrap_or(fallback.start_date);
        let investment = std::env::var("DEFAULT_INVESTMENT")
            .ok()
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(fallback.investment);

        Self {
            symbol,
            start_date,
            investment,
        }
    }
}
