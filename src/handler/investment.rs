use axum::{
    extract::{Query, State},
    Json,
};

use crate::api_models::investment::{InvestmentParams, InvestmentQuery, InvestmentResponse};
use crate::app::AppState;
use crate::handler::error::AppError;
use crate::services::investment_return::{compute_return, ReturnError};
use crate::services::price_history::HistoryRequest;

/// 计算假设投资收益：start_date 当日（或之后首个交易日）买入，按最新价格估值
pub async fn get_investment_return(
    State(state): State<AppState>,
    Query(query): Query<InvestmentQuery>,
) -> Result<Json<InvestmentResponse>, AppError> {
    let params = InvestmentParams::resolve(query, &state.defaults)?;

    // 1. 拉取 start_date 至今的日线（不复权）
    let request = HistoryRequest::since(&params.symbol, params.start_date);
    let frame = state.provider.fetch_history(&request).await?;
    tracing::info!(
        symbol = %params.symbol,
        rows = frame.len(),
        "Columns returned from provider: {:?}",
        frame.column_labels()
    );

    if frame.is_empty() {
        return Err(no_data(&params.symbol));
    }

    // 2. 多层列名收敛为单层
    let frame = frame.normalize_for(&params.symbol)?;

    // 3. 价格列：Adj Close 优先，其次 Close
    let field = frame.price_field().ok_or_else(|| {
        AppError::Internal(format!(
            "No Close/Adj Close column. Columns: {:?}",
            frame.column_labels()
        ))
    })?;

    // 4. 剔除缺失值后计算
    let series = frame.price_series(field)?;
    let outcome = compute_return(params.investment, &series).map_err(|e| match e {
        ReturnError::EmptySeries => no_data(&params.symbol),
        ReturnError::InvalidStartPrice(price) => {
            tracing::error!(symbol = %params.symbol, price, "Invalid start price");
            AppError::Internal(format!("Invalid start price {} for {}", price, params.symbol))
        }
        ReturnError::InvalidInvestment(amount) => {
            AppError::BadRequest(format!("Invalid investment: {}", amount))
        }
    })?;
    tracing::debug!(
        symbol = %params.symbol,
        price_column = field.label(),
        shares = outcome.shares,
        "Computed investment return"
    );

    Ok(Json(InvestmentResponse::new(&params, &outcome)))
}

fn no_data(symbol: &str) -> AppError {
    AppError::BadRequest(format!("No data for {}", symbol))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::NaiveDate;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::app::build_app_with_provider;
    use crate::services::price_frame::{ColumnKey, PriceFrame};
    use crate::services::price_history::{HistoryRequest, PriceHistoryProvider, ProviderError};
    use crate::services::yahoo_chart::YahooChartProvider;
    use crate::utils::config::InvestmentDefaults;

    /// 返回固定数据并记录收到的查询
    struct StubProvider {
        frame: Option<PriceFrame>,
        requests: Mutex<Vec<HistoryRequest>>,
    }

    impl StubProvider {
        fn returning(frame: PriceFrame) -> Arc<Self> {
            Arc::new(Self {
                frame: Some(frame),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                frame: None,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<HistoryRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PriceHistoryProvider for StubProvider {
        async fn fetch_history(&self, request: &HistoryRequest) -> Result<PriceFrame, ProviderError> {
            self.requests.lock().unwrap().push(request.clone());
            self.frame
                .clone()
                .ok_or_else(|| ProviderError::Parse("stub failure".to_string()))
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dates() -> Vec<NaiveDate> {
        vec![d(2025, 6, 2), d(2025, 6, 3), d(2025, 6, 4)]
    }

    fn close_only(prices: Vec<Option<f64>>) -> PriceFrame {
        PriceFrame::builder(dates())
            .column(ColumnKey::field("Close"), prices)
            .build()
            .unwrap()
    }

    async fn call(provider: Arc<dyn PriceHistoryProvider>, uri: &str) -> (StatusCode, Value) {
        let app = build_app_with_provider(provider, InvestmentDefaults::default());
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn computes_return_from_close_prices() {
        let provider = StubProvider::returning(close_only(vec![Some(10.0), Some(11.0), Some(12.0)]));

        let (status, body) = call(provider, "/api/investment?symbol=F&start_date=2025-06-01&investment=100").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "symbol": "F",
                "start_date": "2025-06-01",
                "investment": 100.0,
                "start_price": 10.0,
                "latest_price": 12.0,
                "current_value": 120.0,
                "return_pct": 20.0
            })
        );
    }

    #[tokio::test]
    async fn grouped_columns_are_normalized() {
        let frame = PriceFrame::builder(dates())
            .column(ColumnKey::grouped("F", "Open"), vec![Some(9.0); 3])
            .column(ColumnKey::grouped("F", "Close"), vec![Some(10.0), Some(11.0), Some(12.0)])
            .column(ColumnKey::grouped("F", "Adj Close"), vec![Some(8.0), None, Some(10.0)])
            .build()
            .unwrap();
        let provider = StubProvider::returning(frame);

        let (status, body) = call(provider, "/api/investment?symbol=f&investment=200").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "F");
        assert_eq!(body["start_price"], 8.0);
        assert_eq!(body["latest_price"], 10.0);
        assert_eq!(body["current_value"], 250.0);
        assert_eq!(body["return_pct"], 25.0);
    }

    #[tokio::test]
    async fn missing_values_are_skipped() {
        let provider = StubProvider::returning(close_only(vec![None, Some(20.0), Some(25.0)]));

        let (status, body) = call(provider, "/api/investment").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["start_price"], 20.0);
        assert_eq!(body["return_pct"], 25.0);
    }

    #[tokio::test]
    async fn empty_history_is_bad_request() {
        let provider = StubProvider::returning(PriceFrame::empty());

        let (status, body) = call(provider, "/api/investment?symbol=zzzz").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "No data for ZZZZ"}));
    }

    #[tokio::test]
    async fn all_missing_prices_is_bad_request() {
        let provider = StubProvider::returning(close_only(vec![None, None, None]));

        let (status, body) = call(provider, "/api/investment").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "No data for F"}));
    }

    #[tokio::test]
    async fn missing_price_column_lists_columns() {
        let frame = PriceFrame::builder(dates())
            .column(ColumnKey::field("Open"), vec![Some(10.0); 3])
            .column(ColumnKey::field("Volume"), vec![Some(1000.0); 3])
            .build()
            .unwrap();
        let provider = StubProvider::returning(frame);

        let (status, body) = call(provider, "/api/investment").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"error": "No Close/Adj Close column. Columns: [\"Open\", \"Volume\"]"})
        );
    }

    #[tokio::test]
    async fn zero_start_price_is_server_error() {
        let provider = StubProvider::returning(close_only(vec![Some(0.0), Some(1.0), Some(2.0)]));

        let (status, body) = call(provider, "/api/investment").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Invalid start price 0 for F"}));
    }

    #[tokio::test]
    async fn provider_failure_is_bare_server_error() {
        let (status, body) = call(StubProvider::failing(), "/api/investment").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn non_numeric_investment_is_bad_request() {
        let provider = StubProvider::returning(close_only(vec![Some(10.0); 3]));

        let (status, body) = call(provider.clone(), "/api/investment?investment=lots").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Invalid investment: lots"}));
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn defaults_match_explicit_parameters() {
        let frame = close_only(vec![Some(10.0), Some(11.0), Some(12.0)]);
        let implicit = StubProvider::returning(frame.clone());
        let explicit = StubProvider::returning(frame);

        let (_, implicit_body) = call(implicit.clone(), "/api/investment").await;
        let (_, explicit_body) = call(
            explicit.clone(),
            "/api/investment?symbol=F&start_date=2025-06-01&investment=100",
        )
        .await;

        assert_eq!(implicit_body, explicit_body);
        assert_eq!(implicit.requests(), explicit.requests());
        assert_eq!(
            implicit.requests(),
            vec![HistoryRequest::since("F", d(2025, 6, 1))]
        );
    }

    #[tokio::test]
    async fn symbol_case_does_not_change_provider_query() {
        let frame = close_only(vec![Some(10.0), Some(11.0), Some(12.0)]);
        let lower = StubProvider::returning(frame.clone());
        let upper = StubProvider::returning(frame);

        call(lower.clone(), "/api/investment?symbol=f").await;
        call(upper.clone(), "/api/investment?symbol=F").await;

        assert_eq!(lower.requests(), upper.requests());
        let request = &lower.requests()[0];
        assert_eq!(request.symbol, "F");
        assert_eq!(request.end, None);
        assert!(!request.auto_adjust);
    }

    #[tokio::test]
    async fn future_start_date_is_no_data_without_upstream_call() {
        // 未挂载任何 mock：一旦真的发出请求就会得到 404 并变成 500
        let server = wiremock::MockServer::start().await;
        let provider = Arc::new(YahooChartProvider::with_base_url(&server.uri()).unwrap());

        let (status, body) = call(provider, "/api/investment?start_date=2099-01-01").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "No data for F"}));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
