use axum::{routing::get, Router};

use crate::app::AppState;
use crate::handler::investment::get_investment_return;

pub fn router() -> Router<AppState> {
    Router::new().route("/investment", get(get_investment_return))
}
