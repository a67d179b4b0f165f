//! JSON-RPC plumbing towards the upstream node.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{
    Client,
    header,
};
use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    debug,
    warn,
};
use url::Url;

use crate::{
    error::{
        BlockClientError,
        Result,
    },
    identifier::BlockIdentifier,
    types::Block,
};

const GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
const REQUEST_ID: u64 = 1;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, P> {
    jsonrpc: &'static str,
    method: &'a str,
    params: P,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    #[serde(default)]
    code: i64,
    message: String,
}

/// Issues `eth_getBlockByNumber` calls against a single node.
#[derive(Clone, Debug)]
pub struct RpcTransport {
    http: Client,
    url: Url,
}

impl RpcTransport {
    pub fn new(url: Url) -> Self {
        Self::with_client(Client::new(), url)
    }

    /// Builds a transport whose HTTP client gives up after `timeout`.
    pub fn with_timeout(url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, url))
    }

    pub fn with_client(http: Client, url: Url) -> Self {
        Self { http, url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Posts the block request and returns the raw response body.
    ///
    /// No retries; any network level failure is returned as is.
    pub async fn fetch_block_bytes(&self, identifier: &BlockIdentifier) -> Result<Bytes> {
        let request = block_request(identifier);
        let body = serde_json::to_vec(&request)?;

        debug!(%identifier, url = %self.url, "requesting block");
        metrics::counter!("block_proxy_upstream_requests_total").increment(1);

        let response = self
            .http
            .post(self.url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .inspect_err(|err| {
                warn!(%identifier, %err, "block request failed");
                metrics::counter!("block_proxy_upstream_errors_total").increment(1);
            })?;

        debug!(%identifier, status = %response.status(), "received block response");

        response.bytes().await.map_err(|err| {
            warn!(%identifier, %err, "failed to read block response body");
            metrics::counter!("block_proxy_upstream_errors_total").increment(1);
            BlockClientError::Transport(err)
        })
    }

    /// Fetches and decodes a block in one go.
    pub async fn fetch_block(&self, identifier: &BlockIdentifier) -> Result<Block> {
        let bytes = self.fetch_block_bytes(identifier).await?;
        decode_block(&bytes).inspect_err(|err| {
            warn!(%identifier, %err, "upstream returned no usable block");
        })
    }
}

fn block_request(identifier: &BlockIdentifier) -> JsonRpcRequest<'static, (String, bool)> {
    JsonRpcRequest {
        jsonrpc: "2.0",
        method: GET_BLOCK_BY_NUMBER,
        // `true` asks for full transaction objects instead of hashes.
        params: (identifier.canonical(), true),
        id: REQUEST_ID,
    }
}

/// Decodes a JSON-RPC envelope carrying a block.
///
/// A node-reported error wins over any result. A missing or `null` result
/// without an error is reported as [`BlockClientError::EmptyResult`].
pub fn decode_block(bytes: &[u8]) -> Result<Block> {
    let response: JsonRpcResponse<Block> = serde_json::from_slice(bytes)?;

    if let Some(error) = response.error {
        return Err(BlockClientError::Upstream {
            code: error.code,
            message: error.message,
        });
    }

    response.result.ok_or(BlockClientError::EmptyResult)
}
