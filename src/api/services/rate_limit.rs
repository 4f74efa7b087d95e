//! 登录类接口的限流

use actix_governor::{Governor, GovernorConfigBuilder, KeyExtractor, SimpleKeyExtractionError};
use actix_web::dev::ServiceRequest;
use governor::middleware::NoOpMiddleware;
use tracing::debug;

use crate::utils::ip::{extract_client_ip_from_conn_info, extract_forwarded_ip_from_headers};

/// 基于客户端 IP 的限流 key 提取器
///
/// 只有连接来自可信代理（或未配置时来自私有地址）才采用 X-Forwarded-For。
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = String;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(&self, req: &ServiceRequest) -> Result<Self::Key, Self::KeyExtractionError> {
        let key = extract_client_ip_from_conn_info(&req.connection_info(), || {
            extract_forwarded_ip_from_headers(req.headers())
        })
        .unwrap_or_else(|| "unknown".to_string());
        debug!("Rate limit key: {}", key);
        Ok(key)
    }
}

/// 登录 / 重置密码：每秒补充 1 个令牌，突发最多 5 次
pub fn login_rate_limiter() -> Governor<ClientIpKeyExtractor, NoOpMiddleware> {
    let config = GovernorConfigBuilder::default()
        .seconds_per_request(1)
        .burst_size(5)
        .key_extractor(ClientIpKeyExtractor)
        .finish()
        .expect("Invalid rate limit config");

    Governor::new(&config)
}
