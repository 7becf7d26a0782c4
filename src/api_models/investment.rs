use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::investment_return::InvestmentOutcome;
use crate::utils::config::InvestmentDefaults;
use crate::utils::percent::round2;

/// 收益查询参数，均可省略
#[derive(Debug, Default, Deserialize)]
pub struct InvestmentQuery {
    pub symbol: Option<String>,
    /// 格式：YYYY-MM-DD
    pub start_date: Option<String>,
    pub investment: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParamError {
    #[error("Invalid start_date: {0}, expected YYYY-MM-DD")]
    StartDate(String),
    #[error("Invalid investment: {0}")]
    Investment(String),
}

/// 校验并补全缺省值后的参数
#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentParams {
    /// 已转大写
    pub symbol: String,
    pub start_date: NaiveDate,
    /// 原样回显给调用方
    pub start_date_raw: String,
    pub investment: f64,
}

impl InvestmentParams {
    pub fn resolve(query: InvestmentQuery, defaults: &InvestmentDefaults) -> Result<Self, ParamError> {
        let symbol = query
            .symbol
            .unwrap_or_else(|| defaults.symbol.clone())
            .to_uppercase();

        let start_date_raw = query
            .start_date
            .unwrap_or_else(|| defaults.start_date.clone());
        let start_date = NaiveDate::parse_from_str(start_date_raw.trim(), "%Y-%m-%d")
            .map_err(|_| ParamError::StartDate(start_date_raw.clone()))?;

        let investment = match query.investment {
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v > 0.0)
                .ok_or(ParamError::Investment(raw))?,
            None => defaults.investment,
        };

        Ok(Self {
            symbol,
            start_date,
            start_date_raw,
            investment,
        })
    }
}

/// 收益查询响应，价格与金额保留两位小数
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct InvestmentResponse {
    pub symbol: String,
    pub start_date: String,
    pub investment: f64,
    pub start_price: f64,
    pub latest_price: f64,
    pub current_value: f64,
    pub return_pct: f64,
}

impl InvestmentResponse {
    pub fn new(params: &InvestmentParams, outcome: &InvestmentOutcome) -> Self {
        Self {
            symbol: params.symbol.clone(),
            start_date: params.start_date_raw.clone(),
            investment: params.investment,
            start_price: round2(outcome.start_price),
            latest_price: round2(outcome.latest_price),
            current_value: round2(outcome.current_value),
            return_pct: round2(outcome.return_pct),
        }
    }
}
