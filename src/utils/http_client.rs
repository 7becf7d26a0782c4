use std::time::Duration;

use reqwest::{Client, header::{HeaderMap, HeaderValue, USER_AGENT, ACCEPT}};

/// 创建用于 Yahoo Finance 行情接口的 HTTP 客户端
/// Yahoo 会拒绝没有浏览器 UA 的请求
pub fn create_yahoo_client(timeout: Option<Duration>) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        ),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));

    let mut builder = Client::builder().default_headers(headers);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}
