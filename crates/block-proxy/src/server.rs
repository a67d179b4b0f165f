use std::{
    io,
    net::SocketAddr,
};

use axum::{
    Json,
    Router,
    extract::{
        Path,
        State,
    },
    http::StatusCode,
    response::{
        IntoResponse,
        Response,
    },
    routing::get,
};
use tokio::{
    net::TcpListener,
    signal,
};
use tokio_util::sync::CancellationToken;
use tracing::{
    error,
    info,
    warn,
};

use crate::{
    client::BlockClient,
    error::{
        BlockClientError,
        ProxyError,
    },
    identifier::TransactionIdentifier,
    types::{
        BlockSummary,
        Transaction,
    },
};

/// A bound HTTP server in front of a connected [`BlockClient`].
pub struct BlockProxy {
    listener: TcpListener,
    client: BlockClient,
    cancel_token: CancellationToken,
}

impl BlockProxy {
    pub fn new(listener: TcpListener, client: BlockClient, cancel_token: CancellationToken) -> Self {
        Self {
            listener,
            client,
            cancel_token,
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn client(&self) -> &BlockClient {
        &self.client
    }

    /// Serves requests until Ctrl-C is received or the cancel token fires.
    /// In-flight requests are drained before the update worker is stopped.
    pub async fn serve(self) -> Result<(), ProxyError> {
        let BlockProxy {
            listener,
            client,
            cancel_token,
        } = self;

        let addr = listener.local_addr()?;
        info!(%addr, "block proxy listening");

        let shutdown = cancel_token.clone();
        axum::serve(listener, router(client.clone()))
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_signal() => {}
                    _ = shutdown.cancelled() => {}
                }
            })
            .await?;

        client.shutdown();
        info!("block proxy shutdown complete");
        Ok(())
    }
}

/// Routes for block and transaction lookups.
pub fn router(client: BlockClient) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/block/{identifier}", get(get_block))
        .route(
            "/block/{identifier_b}/txs/{identifier_t}",
            get(get_transaction),
        )
        .with_state(client)
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn health() -> &'static str {
    "ok"
}

#[tracing::instrument(skip(client))]
async fn get_block(
    State(client): State<BlockClient>,
    Path(identifier): Path<String>,
) -> Result<Json<BlockSummary>, ApiError> {
    let block = client.get_block_by(&identifier).await?;
    Ok(Json(block.to_summary()))
}

#[tracing::instrument(skip(client))]
async fn get_transaction(
    State(client): State<BlockClient>,
    Path((identifier_b, identifier_t)): Path<(String, String)>,
) -> Result<Json<Transaction>, ApiError> {
    let lookup = TransactionIdentifier::parse(&identifier_t)?;
    let block = client.get_block_by(&identifier_b).await?;
    let tx = match lookup {
        TransactionIdentifier::Hash(hash) => client.get_transaction_by_hash(&block, &hash)?,
        TransactionIdentifier::Index(index) => client.get_transaction_by_index(&block, index)?,
    };
    Ok(Json(tx.clone()))
}

/// Maps client errors onto plain-text HTTP responses.
#[derive(Debug)]
pub struct ApiError(BlockClientError);

impl From<BlockClientError> for ApiError {
    fn from(err: BlockClientError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else if self.0.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(err = %self.0, "request failed");
        } else {
            warn!(err = %self.0, %status, "request rejected");
        }
        (status, self.0.to_string()).into_response()
    }
}
