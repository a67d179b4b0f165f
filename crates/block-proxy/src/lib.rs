//! Caching block proxy for Ethereum JSON-RPC nodes.
//!
//! Blocks are fetched from an upstream node with `eth_getBlockByNumber`.
//! Blocks that are far enough behind the chain head are settled and get
//! served from an in-process cache; `latest` and recent blocks always go to
//! the node, and every such response advances the known head.
//!
//! The crate exposes two integration surfaces:
//!
//! - [`BlockProxy`], the HTTP server run by the `block-proxy` binary.
//! - [`BlockClient`], which embeds the same cache gate in-process.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod gate;
pub mod identifier;
pub mod recency;
pub mod server;
pub mod transport;
pub mod types;
pub mod updates;

pub use cache::{
    BlockCache,
    CacheConfig,
    MokaBlockCache,
};
pub use client::{
    BlockClient,
    ClientOptions,
};
pub use config::Config;
pub use error::{
    BlockClientError,
    ProxyError,
    Result,
};
pub use gate::FRESHNESS_THRESHOLD;
pub use identifier::{
    BlockIdentifier,
    TransactionIdentifier,
    normalize,
};
pub use server::BlockProxy;
pub use transport::RpcTransport;
pub use types::{
    Block,
    BlockSummary,
    Transaction,
};
