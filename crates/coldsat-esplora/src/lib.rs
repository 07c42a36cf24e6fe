//! # coldsat-esplora — Esplora REST gateway.
//!
//! Blocking implementation of [`BlockchainGateway`] against the Esplora API
//! served by Blockstream and compatible indexers. Three endpoints are used:
//!
//! - `GET  /address/{address}/utxo`
//! - `GET  /tx/{txid}`
//! - `POST /tx` with the raw hex as the body

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use tracing::debug;

use coldsat_core::error::GatewayError;
use coldsat_core::traits::BlockchainGateway;
use coldsat_core::types::{PreviousOutput, Utxo};

pub const MAINNET_URL: &str = "https://blockstream.info/api";
pub const TESTNET_URL: &str = "https://blockstream.info/testnet/api";
pub const SIGNET_URL: &str = "https://mempool.space/signet/api";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Esplora HTTP gateway.
#[derive(Debug, Clone)]
pub struct EsploraGateway {
    client: Client,
    base_url: String,
}

impl EsploraGateway {
    /// Create a gateway for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("coldsat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn mainnet() -> Result<Self, GatewayError> {
        Self::new(MAINNET_URL, DEFAULT_TIMEOUT)
    }

    pub fn testnet() -> Result<Self, GatewayError> {
        Self::new(TESTNET_URL, DEFAULT_TIMEOUT)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_text(&self, path: &str, what: &str) -> Result<String, GatewayError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "esplora GET");
        let resp = self.client.get(&url).send().map_err(transport)?;
        let status = resp.status();
        let body = read_body(resp)?;
        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

impl BlockchainGateway for EsploraGateway {
    fn list_utxos(&self, address: &str) -> Result<Vec<Utxo>, GatewayError> {
        let body = self.get_text(&format!("/address/{address}/utxo"), address)?;
        let utxos = parse_utxos(&body)?;
        debug!(address, count = utxos.len(), "utxos listed");
        Ok(utxos)
    }

    fn previous_output(&self, txid: &str, vout: u32) -> Result<PreviousOutput, GatewayError> {
        let body = self.get_text(&format!("/tx/{txid}"), txid)?;
        parse_previous_output(&body, txid, vout)
    }

    fn broadcast(&self, raw_tx_hex: &str) -> Result<String, GatewayError> {
        let url = format!("{}/tx", self.base_url);
        debug!(%url, bytes = raw_tx_hex.len() / 2, "esplora broadcast");
        let resp = self
            .client
            .post(&url)
            .body(raw_tx_hex.to_string())
            .send()
            .map_err(transport)?;
        let status = resp.status();
        let body = read_body(resp)?;
        if !status.is_success() {
            return Err(GatewayError::Rejected(body));
        }
        parse_broadcast_txid(&body)
    }
}

fn transport(e: reqwest::Error) -> GatewayError {
    GatewayError::Transport(e.to_string())
}

fn read_body(resp: Response) -> Result<String, GatewayError> {
    resp.text().map_err(transport)
}

#[derive(Deserialize)]
struct EsploraUtxo {
    txid: String,
    vout: u32,
    value: u64,
    status: EsploraStatus,
}

#[derive(Deserialize)]
struct EsploraStatus {
    confirmed: bool,
}

#[derive(Deserialize)]
struct EsploraTx {
    vout: Vec<EsploraTxOut>,
}

#[derive(Deserialize)]
struct EsploraTxOut {
    scriptpubkey: String,
    value: u64,
}

/// The txid Esplora returns as the plain-text body of a successful `POST /tx`.
pub fn parse_broadcast_txid(body: &str) -> Result<String, GatewayError> {
    let txid = body.trim();
    if txid.len() != 64 || !txid.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(GatewayError::Malformed(format!("broadcast txid {txid:?}")));
    }
    Ok(txid.to_ascii_lowercase())
}

/// Decode an `/address/{a}/utxo` response.
pub fn parse_utxos(body: &str) -> Result<Vec<Utxo>, GatewayError> {
    let raw: Vec<EsploraUtxo> =
        serde_json::from_str(body).map_err(|e| GatewayError::Malformed(format!("utxo list: {e}")))?;
    Ok(raw
        .into_iter()
        .map(|u| Utxo::new(u.txid, u.vout, u.value, u.status.confirmed))
        .collect())
}

/// Pick output `vout` out of a `/tx/{txid}` response.
pub fn parse_previous_output(body: &str, txid: &str, vout: u32) -> Result<PreviousOutput, GatewayError> {
    let tx: EsploraTx =
        serde_json::from_str(body).map_err(|e| GatewayError::Malformed(format!("tx {txid}: {e}")))?;
    let out = tx
        .vout
        .into_iter()
        .nth(vout as usize)
        .ok_or_else(|| GatewayError::NotFound(format!("{txid}:{vout}")))?;
    let script_pubkey = hex::decode(&out.scriptpubkey)
        .map_err(|e| GatewayError::Malformed(format!("scriptpubkey of {txid}:{vout}: {e}")))?;
    Ok(PreviousOutput {
        script_pubkey,
        value: out.value,
    })
}
