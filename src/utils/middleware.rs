use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};

/// 跨域配置：设置 ALLOWED_ORIGINS（逗号分隔）时只放行这些来源，否则允许任意来源
pub fn cors_layer() -> CorsLayer {
    let allowed_env = std::env::var("ALLOWED_ORIGINS").unwrap_or_default();
    cors_layer_for(&allowed_env)
}

fn cors_layer_for(allowed: &str) -> CorsLayer {
    let from_env: Vec<HeaderValue> = allowed
        .split(',')
        .filter_map(|o| {
            let trimmed = o.trim();
            if trimmed.is_empty() {
                None
            } else {
                HeaderValue::from_str(trimmed).ok()
            }
        })
        .collect();

    if !from_env.is_empty() {
        CorsLayer::new()
            .allow_origin(from_env)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
