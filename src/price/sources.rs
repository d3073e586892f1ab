//! External spot-price sources.
//!
//! Each source performs one HTTP request and parses a single USD/oz
//! figure. Range checks and timeouts belong to the oracle, not here.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::config::Config;

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Tag recorded on samples produced by this source
    fn name(&self) -> &str;
    async fn fetch(&self) -> Result<f64>;
}

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// metalpriceapi.com quotes XAU per USD, so the spot price is its inverse.
///
/// The key travels in the query string; request errors are stripped of
/// their URL so it never reaches the logs.
pub struct MetalPriceApi {
    client: Client,
    url: String,
    api_key: String,
}

impl MetalPriceApi {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            url: url.into(),
            api_key: api_key.into(),
        }
    }
}

pub fn parse_metalprice(body: &Value) -> Result<f64> {
    let rate = body
        .get("rates")
        .and_then(|r| r.get("XAU"))
        .and_then(as_f64)
        .ok_or_else(|| anyhow!("response has no rates.XAU"))?;
    if rate <= 0.0 {
        return Err(anyhow!("non-positive XAU rate {}", rate));
    }
    Ok(1.0 / rate)
}

#[async_trait]
impl PriceProvider for MetalPriceApi {
    fn name(&self) -> &str {
        "MetalPriceAPI"
    }

    async fn fetch(&self) -> Result<f64> {
        let resp = self
            .client
            .get(&self.url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("base", "USD"),
                ("currencies", "XAU"),
            ])
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        if !resp.status().is_success() {
            return Err(anyhow!("status {}", resp.status()));
        }
        let body: Value = resp.json().await.map_err(reqwest::Error::without_url)?;
        parse_metalprice(&body)
    }
}

pub struct GoldApi {
    client: Client,
    url: String,
    token: String,
}

impl GoldApi {
    pub fn new(url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            url: url.into(),
            token: token.into(),
        }
    }
}

pub fn parse_goldapi(body: &Value) -> Result<f64> {
    body.get("price")
        .and_then(as_f64)
        .ok_or_else(|| anyhow!("response has no price"))
}

#[async_trait]
impl PriceProvider for GoldApi {
    fn name(&self) -> &str {
        "GoldAPI"
    }

    async fn fetch(&self) -> Result<f64> {
        let resp = self
            .client
            .get(&self.url)
            .header("X-ACCESS-TOKEN", &self.token)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        if !resp.status().is_success() {
            return Err(anyhow!("status {}", resp.status()));
        }
        let body: Value = resp.json().await.map_err(reqwest::Error::without_url)?;
        parse_goldapi(&body)
    }
}

// Both APIs have been seen returning numbers as strings
fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Ranked source list: MetalPriceAPI first, then GoldAPI.
pub fn default_providers(cfg: &Config) -> Vec<Box<dyn PriceProvider>> {
    vec![
        Box::new(MetalPriceApi::new(
            cfg.metalprice_url.clone(),
            cfg.metalprice_api_key.clone(),
            cfg.price_timeout(),
        )),
        Box::new(GoldApi::new(
            cfg.goldapi_url.clone(),
            cfg.goldapi_token.clone(),
            cfg.price_timeout(),
        )),
    ]
}
