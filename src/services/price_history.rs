use async_trait::async_trait;
use chrono::NaiveDate;
use polars::prelude::PolarsError;
use reqwest::StatusCode;
use thiserror::Error;

use crate::services::price_frame::PriceFrame;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("provider error {code}: {description}")]
    Upstream { code: String, description: String },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("frame error: {0}")]
    Frame(#[from] PolarsError),
}

/// 日线历史查询条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub symbol: String,
    pub start: NaiveDate,
    /// None 表示查到最新交易日
    pub end: Option<NaiveDate>,
    /// 为 true 时 OHLC 按复权因子调整，并且不再单独返回 Adj Close
    pub auto_adjust: bool,
}

impl HistoryRequest {
    /// 从 start 起到最新交易日，不复权
    pub fn since(symbol: &str, start: NaiveDate) -> Self {
        Self {
            symbol: symbol.to_string(),
            start,
            end: None,
            auto_adjust: false,
        }
    }
}

/// 行情数据源
///
/// 返回的表按交易日升序；列名可能按 ticker 分组成两层，调用方负责归一化。
#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    async fn fetch_history(&self, request: &HistoryRequest) -> Result<PriceFrame, ProviderError>;
}
