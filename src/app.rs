use std::sync::Arc;

use axum::Router;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};
use tracing::Level;

use crate::handler::error::AppError;
use crate::routes;
use crate::services::price_history::{PriceHistoryProvider, ProviderError};
use crate::services::yahoo_chart::YahooChartProvider;
use crate::utils::config::{InvestmentDefaults, ProviderConfig};
use crate::utils::middleware;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn PriceHistoryProvider>,
    pub defaults: Arc<InvestmentDefaults>,
}

pub fn build_app() -> Result<Router, ProviderError> {
    let config = ProviderConfig::from_env();
    tracing::info!("Price history provider: {}", config.base_url);
    let provider = Arc::new(YahooChartProvider::new(&config)?);
    Ok(build_app_with_provider(provider, InvestmentDefaults::from_env()))
}

pub fn build_app_with_provider(
    provider: Arc<dyn PriceHistoryProvider>,
    defaults: InvestmentDefaults,
) -> Router {
    let state = AppState {
        provider,
        defaults: Arc::new(defaults),
    };

    routes::build_routes()
        .fallback(|| async { AppError::NotFound })
        .with_state(state)
        .layer(middleware::cors_layer())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
