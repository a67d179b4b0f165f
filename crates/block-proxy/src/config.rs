use std::{
    net::SocketAddr,
    sync::Arc,
    time::Duration,
};

use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::{
    cache::{
        CacheConfig,
        MokaBlockCache,
    },
    client::{
        BlockClient,
        ClientOptions,
    },
    error::ProxyError,
    server::BlockProxy,
    transport::RpcTransport,
};

/// Runtime configuration for the block proxy.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Caching block proxy for Ethereum JSON-RPC nodes", long_about = None)]
pub struct Config {
    /// Address the HTTP server listens on
    #[arg(long, env = "BLOCK_PROXY_LISTEN_ADDR", default_value = "127.0.0.1:8080")]
    pub listen_addr: SocketAddr,
    /// Upstream Ethereum JSON-RPC endpoint
    #[arg(long, env = "BLOCK_PROXY_UPSTREAM", default_value = "https://cloudflare-eth.com")]
    pub upstream: Url,
    /// Maximum number of historical blocks kept in memory
    #[arg(long, env = "BLOCK_PROXY_CACHE_CAPACITY", default_value = "1024")]
    pub cache_capacity: u64,
    /// Capacity of the queue feeding background cache and recency updates
    #[arg(long, env = "BLOCK_PROXY_UPDATE_QUEUE_SIZE", default_value = "1024")]
    pub update_queue_size: usize,
    /// Give up on upstream requests after this many seconds. Unset means no timeout.
    #[arg(long, env = "BLOCK_PROXY_UPSTREAM_TIMEOUT_SECS")]
    pub upstream_timeout_secs: Option<u64>,
    /// Log level
    #[arg(long, env = "BLOCK_PROXY_LOG_LEVEL", default_value = "info")]
    pub log_level: LevelFilter,
}

impl Config {
    /// Validates a configuration loaded from CLI flags or the environment.
    pub fn validate(self) -> Result<Self, ProxyError> {
        if self.cache_capacity == 0 {
            return Err(ProxyError::InvalidConfig(
                "cache_capacity must be greater than zero".to_string(),
            ));
        }
        if self.update_queue_size == 0 {
            return Err(ProxyError::InvalidConfig(
                "update_queue_size must be greater than zero".to_string(),
            ));
        }
        if self.upstream_timeout_secs == Some(0) {
            return Err(ProxyError::InvalidConfig(
                "upstream_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            max_entries: self.cache_capacity,
        }
    }

    fn transport(&self) -> Result<RpcTransport, ProxyError> {
        match self.upstream_timeout_secs {
            Some(secs) => {
                RpcTransport::with_timeout(self.upstream.clone(), Duration::from_secs(secs))
                    .map_err(ProxyError::HttpClient)
            }
            None => Ok(RpcTransport::new(self.upstream.clone())),
        }
    }

    /// Binds the listener and connects the block client.
    ///
    /// Fails if the upstream node cannot serve the `latest` block.
    pub async fn build(self, cancel_token: CancellationToken) -> Result<BlockProxy, ProxyError> {
        let config = self.validate()?;

        let listener = TcpListener::bind(config.listen_addr).await?;
        tracing::info!(listen_addr = %listener.local_addr()?, "Listening on address");

        let cache = Arc::new(MokaBlockCache::new(&config.cache_config()));
        // Cancelling the server token also stops the worker, but not the reverse.
        let options = ClientOptions {
            update_queue_size: config.update_queue_size,
            cancel_token: cancel_token.child_token(),
        };
        let client = BlockClient::connect(config.transport()?, cache, options).await?;

        Ok(BlockProxy::new(listener, client, cancel_token))
    }
}
