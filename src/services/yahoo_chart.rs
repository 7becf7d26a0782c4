//! Yahoo Finance chart 接口
//!
//! 返回的日线表按 ticker 分组，列名为 `(SYMBOL, Open|High|Low|Close|Adj Close|Volume)`。

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::services::price_frame::{ColumnKey, PriceFrame};
use crate::services::price_history::{HistoryRequest, PriceHistoryProvider, ProviderError};
use crate::utils::config::ProviderConfig;
use crate::utils::http_client;

const NOT_FOUND_CODE: &str = "Not Found";

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    /// 交易所相对 UTC 的偏移（秒）
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

pub struct YahooChartProvider {
    client: Client,
    base_url: String,
}

impl YahooChartProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = http_client::create_yahoo_client(config.timeout)?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// 指定 base_url（测试时指向 wiremock）
    #[cfg(test)]
    pub fn with_base_url(base_url: &str) -> Result<Self, ProviderError> {
        let config = ProviderConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..ProviderConfig::default()
        };
        Self::new(&config)
    }

    fn chart_url(&self, symbol: &str) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ProviderError::Parse(format!("invalid base url '{}': {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Parse(format!("invalid base url '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        Ok(url)
    }
}

#[async_trait]
impl PriceHistoryProvider for YahooChartProvider {
    async fn fetch_history(&self, request: &HistoryRequest) -> Result<PriceFrame, ProviderError> {
        let url = self.chart_url(&request.symbol)?;
        // 东半球交易所的开盘时间在 UTC 前一天，多取一天，换算成交易日后再裁掉
        let window_start = request
            .start
            .pred_opt()
            .ok_or_else(|| ProviderError::InvalidDate(request.start.to_string()))?;
        let period1 = midnight_timestamp(window_start)?;
        let period2 = match request.end {
            Some(end) => {
                let next = end
                    .succ_opt()
                    .ok_or_else(|| ProviderError::InvalidDate(end.to_string()))?;
                midnight_timestamp(next)?
            }
            None => Utc::now().timestamp(),
        };
        if period1 >= period2 {
            tracing::debug!(symbol = %request.symbol, period1, period2, "empty chart window");
            return Ok(PriceFrame::empty());
        }

        tracing::debug!(symbol = %request.symbol, period1, period2, "fetching yahoo chart");

        let resp = self
            .client
            .get(url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "div,split".to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            // 未知代码 Yahoo 返回 404 + chart.error，视为无数据
            if status == StatusCode::NOT_FOUND && is_not_found_body(&body) {
                return Ok(PriceFrame::empty());
            }
            return Err(ProviderError::Status {
                status,
                body: truncate(&body, 200),
            });
        }

        let envelope: ChartEnvelope = serde_json::from_str(&body).map_err(|e| {
            ProviderError::Parse(format!("{} | body: {}", e, truncate(&body, 500)))
        })?;
        frame_from_chart(envelope, request)
    }
}

fn is_not_found_body(body: &str) -> bool {
    serde_json::from_str::<ChartEnvelope>(body)
        .ok()
        .and_then(|env| env.chart.error)
        .map(|err| err.code == NOT_FOUND_CODE)
        .unwrap_or(false)
}

fn frame_from_chart(envelope: ChartEnvelope, request: &HistoryRequest) -> Result<PriceFrame, ProviderError> {
    if let Some(err) = envelope.chart.error {
        if err.code == NOT_FOUND_CODE {
            return Ok(PriceFrame::empty());
        }
        return Err(ProviderError::Upstream {
            code: err.code,
            description: err.description.unwrap_or_default(),
        });
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(PriceFrame::empty());
    };
    if result.timestamp.is_empty() {
        return Ok(PriceFrame::empty());
    }

    let offset = result.meta.gmtoffset;
    let all_dates = result
        .timestamp
        .iter()
        .map(|ts| trading_date(*ts, offset))
        .collect::<Result<Vec<_>, _>>()?;

    // 盘中时 Yahoo 会在末尾追加一条同日实时报价，同一交易日只保留最后一条
    let rows: Vec<usize> = last_row_per_date(&all_dates)
        .into_iter()
        .filter(|&i| in_window(all_dates[i], request))
        .collect();
    if rows.is_empty() {
        return Ok(PriceFrame::empty());
    }
    let dates: Vec<NaiveDate> = rows.iter().map(|&i| all_dates[i]).collect();

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let adjclose = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|a| a.adjclose);

    let pick = |values: &[Option<f64>]| -> Vec<Option<f64>> {
        rows.iter().map(|&i| values.get(i).copied().flatten()).collect()
    };

    let mut open = pick(&quote.open);
    let mut high = pick(&quote.high);
    let mut low = pick(&quote.low);
    let mut close = pick(&quote.close);
    let volume = pick(&quote.volume);
    let adj = adjclose.as_deref().map(|values| pick(values));

    if request.auto_adjust {
        if let Some(adj) = &adj {
            let ratios: Vec<Option<f64>> = close
                .iter()
                .zip(adj.iter())
                .map(|(c, a)| match (c, a) {
                    (Some(c), Some(a)) if *c != 0.0 => Some(a / c),
                    _ => None,
                })
                .collect();
            for series in [&mut open, &mut high, &mut low, &mut close] {
                apply_ratio(series, &ratios);
            }
        }
    }

    let ticker = request.symbol.as_str();
    let mut builder = PriceFrame::builder(dates)
        .column(ColumnKey::grouped(ticker, "Open"), open)
        .column(ColumnKey::grouped(ticker, "High"), high)
        .column(ColumnKey::grouped(ticker, "Low"), low)
        .column(ColumnKey::grouped(ticker, "Close"), close);
    // 复权后 Close 已是调整价，不再单独给出 Adj Close
    if let (Some(adj), false) = (adj, request.auto_adjust) {
        builder = builder.column(ColumnKey::grouped(ticker, "Adj Close"), adj);
    }

    Ok(builder
        .column(ColumnKey::grouped(ticker, "Volume"), volume)
        .build()?)
}

fn in_window(date: NaiveDate, request: &HistoryRequest) -> bool {
    date >= request.start && request.end.map_or(true, |end| date <= end)
}

fn apply_ratio(series: &mut [Option<f64>], ratios: &[Option<f64>]) {
    for (value, ratio) in series.iter_mut().zip(ratios.iter()) {
        *value = match (*value, ratio) {
            (Some(v), Some(r)) => Some(v * r),
            _ => None,
        };
    }
}

fn last_row_per_date(dates: &[NaiveDate]) -> Vec<usize> {
    (0..dates.len())
        .filter(|&i| dates.get(i + 1) != Some(&dates[i]))
        .collect()
}

fn midnight_timestamp(date: NaiveDate) -> Result<i64, ProviderError> {
    let datetime = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ProviderError::InvalidDate(date.to_string()))?;
    Ok(datetime.and_utc().timestamp())
}

fn trading_date(timestamp: i64, gmtoffset: i64) -> Result<NaiveDate, ProviderError> {
    DateTime::from_timestamp(timestamp + gmtoffset, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| ProviderError::InvalidDate(timestamp.to_string()))
}

fn truncate(body: &str, max: usize) -> String {
    body.chars().take(max).collect()
}
