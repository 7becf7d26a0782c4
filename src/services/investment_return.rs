use thiserror::Error;

use crate::services::price_frame::PricePoint;
use crate::utils::percent::pct_change;

#[derive(Debug, Error, PartialEq)]
pub enum ReturnError {
    #[error("price series is empty")]
    EmptySeries,
    #[error("invalid start price {0}")]
    InvalidStartPrice(f64),
    #[error("invalid investment {0}")]
    InvalidInvestment(f64),
}

/// 收益计算结果（未取整）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvestmentOutcome {
    pub start_price: f64,
    pub latest_price: f64,
    pub shares: f64,
    pub current_value: f64,
    pub return_pct: f64,
}

/// 以序列首条价格买入 investment 金额，按末条价格估值
///
/// series 需按日期升序且不含缺失值。
pub fn compute_return(investment: f64, series: &[PricePoint]) -> Result<InvestmentOutcome, ReturnError> {
    let (first, last) = match (series.first(), series.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(ReturnError::EmptySeries),
    };

    let start_price = first.price;
    if !start_price.is_finite() || start_price <= 0.0 {
        return Err(ReturnError::InvalidStartPrice(start_price));
    }
    let latest_price = last.price;

    let shares = investment / start_price;
    let current_value = shares * latest_price;
    let return_pct =
        pct_change(investment, current_value).ok_or(ReturnError::InvalidInvestment(investment))?;

    Ok(InvestmentOutcome {
        start_price,
        latest_price,
        shares,
        current_value,
        return_pct,
    })
}
