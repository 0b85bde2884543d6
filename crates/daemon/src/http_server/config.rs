use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct Config {
    // Listen address
    pub listen_addr: SocketAddr,
    // log level for http tracing
    pub log_level: tracing::Level,
    // bearer token that authorizes force-return operations
    pub admin_token: Option<String>,
}

impl Config {
    pub fn new(listen_addr: SocketAddr, admin_token: Option<String>) -> Self {
        tracing::info!(
            "Creating HTTP server Config: listen_addr={}, admin_token_set={}",
            listen_addr,
            admin_token.is_some()
        );
        Self {
            listen_addr,
            log_level: tracing::Level::INFO,
            admin_token,
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid Socket Address: {0}")]
    ListenAddr(#[from] std::net::AddrParseError),
}
