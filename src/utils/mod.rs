pub mod config;
pub mod logging;
pub mod middleware;
pub mod percent;
pub mod http_client;
