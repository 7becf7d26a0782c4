pub mod investment_return;
pub mod price_frame;
pub mod price_history;
pub mod yahoo_chart;
