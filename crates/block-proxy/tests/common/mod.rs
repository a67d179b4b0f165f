#![allow(dead_code)]

use std::net::SocketAddr;

use block_proxy::Config;
use clap::Parser;
use serde_json::{
    Value,
    json,
};
use tokio_util::sync::CancellationToken;
use wiremock::{
    Mock,
    MockServer,
    ResponseTemplate,
    matchers::{
        body_partial_json,
        method,
    },
};

pub const HEAD_TX_HASH: &str =
    "0x29489800f624b64b975af75bde520c5a70a21848920b5483d463c25c3b22ac0b";

/// A block in the shape returned by `eth_getBlockByNumber(_, true)`.
pub fn block_json(number: &str, tx_hashes: &[&str]) -> Value {
    let hash = format!("0xb10c{}", number.trim_start_matches("0x"));
    let transactions: Vec<Value> = tx_hashes
        .iter()
        .enumerate()
        .map(|(index, tx_hash)| {
            json!({
                "blockHash": hash,
                "blockNumber": number,
                "from": "0x8d12a197cb00d4747a1fe03395095ce2a5cc6819",
                "gas": "0x5208",
                "gasPrice": "0x3b9aca00",
                "hash": tx_hash,
                "input": "0x",
                "nonce": format!("{index:#x}"),
                "to": "0x3535353535353535353535353535353535353535",
                "transactionIndex": format!("{index:#x}"),
                "value": "0xde0b6b3a7640000",
                "v": "0x25",
                "r": "0x1",
                "s": "0x2"
            })
        })
        .collect();

    json!({
        "number": number,
        "hash": hash,
        "parentHash": "0x00",
        "miner": "0x0000000000000000000000000000000000000000",
        "gasLimit": "0x1c9c380",
        "gasUsed": "0x5208",
        "timestamp": "0x5f5e100",
        "uncles": [],
        "transactions": transactions
    })
}

/// Mounts a node response for `eth_getBlockByNumber(param, true)`.
pub async fn mount_block(server: &MockServer, param: &str, block: Value, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "eth_getBlockByNumber",
            "params": [param, true]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": block
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// A running proxy bound to a random local port.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub http: reqwest::Client,
    cancel_token: CancellationToken,
}

impl TestProxy {
    pub async fn start(upstream: &MockServer) -> Self {
        let upstream = upstream.uri();
        let config = Config::try_parse_from(vec![
            "block-proxy",
            "--listen-addr",
            "127.0.0.1:0",
            "--upstream",
            upstream.as_str(),
        ])
        .unwrap();

        let cancel_token = CancellationToken::new();
        let proxy = config.build(cancel_token.clone()).await.unwrap();
        let addr = proxy.local_addr().unwrap();
        tokio::spawn(proxy.serve());

        Self {
            addr,
            http: reqwest::Client::new(),
            cancel_token,
        }
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.http
            .get(format!("http://{}{path}", self.addr))
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
