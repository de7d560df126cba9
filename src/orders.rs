use anyhow::{bail, Context, Result};
use log::debug;
use serde::Deserialize;
use serde_json::Value;

use crate::config::Credentials;

/// Orders created before this date are never fetched.
pub const START_DATE: &str = "2025-01-01T00:00:00";

/// How many orders to request per page.
pub const PAGE_SIZE: u32 = 100;

fn zero() -> String {
    "0".to_string()
}

/// One order as returned by the store's REST API.
///
/// Only the fields used in the export are deserialized; anything else in
/// the response is ignored. Absent fields fall back to zero values rather
/// than failing the run.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Order {
    #[serde(default)]
    pub id: u64,
    #[serde(default = "zero")]
    pub date_created: String,
    #[serde(default)]
    pub customer_id: u64,
    #[serde(default = "zero")]
    pub status: String,
    #[serde(default = "zero")]
    pub shipping_total: String,
    #[serde(default = "zero")]
    pub total_tax: String,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

/// One product entry within an order.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub quantity: u32,
    /// The line total, kept as a decimal string to avoid float precision
    /// loss in the export.
    #[serde(default = "zero")]
    pub total: String,
    #[serde(default)]
    pub meta_data: Vec<MetaEntry>,
}

/// One key/value pair of product metadata attached to a line item.
///
/// Values arrive as strings or numbers depending on the plugin that wrote
/// them, so they stay loosely typed here.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MetaEntry {
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

/// Fetches orders from the store's REST API.
pub struct OrdersClient {
    http: reqwest::blocking::Client,
    creds: Credentials,
}

impl OrdersClient {
    #[must_use]
    pub fn new(creds: Credentials) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            creds,
        }
    }

    /// Fetches every order created on or after [`START_DATE`], in
    /// ascending date order.
    ///
    /// Pages are requested one at a time, each blocking until its response
    /// arrives, until the API returns an empty page.
    ///
    /// # Errors
    ///
    /// Any non-success response status aborts the whole fetch with the
    /// status code and response body; no partial result is returned and
    /// nothing is retried.
    pub fn fetch_all(&self) -> Result<Vec<Order>> {
        fetch_paginated(|page| self.fetch_page(page))
    }

    fn fetch_page(&self, page: u32) -> Result<Vec<Order>> {
        debug!("fetching orders page {page}");
        let url = format!("{}/orders", self.creds.base_url);
        let per_page = PAGE_SIZE.to_string();
        let page = page.to_string();
        let resp = self
            .http
            .get(&url)
            .basic_auth(&self.creds.consumer_key, Some(&self.creds.consumer_secret))
            .query(&[
                ("per_page", per_page.as_str()),
                ("page", page.as_str()),
                ("after", START_DATE),
                ("status", "any"),
                ("orderby", "date"),
                ("order", "asc"),
            ])
            .send()
            .with_context(|| format!("requesting {url} page {page}"))?;
        let status = resp.status();
        if !status.is_success() {
            bail!(
                "API request failed: {status} {}",
                resp.text().unwrap_or_default()
            );
        }
        resp.json().context("decoding orders page")
    }
}

/// Accumulates pages of orders from `fetch_page`, starting at page 1, into
/// one sequence in request order.
///
/// Termination is a literally empty page: a short but non-empty page still
/// triggers one more request.
///
/// # Errors
///
/// The first page error aborts the loop; nothing fetched so far is
/// returned.
pub fn fetch_paginated<F>(mut fetch_page: F) -> Result<Vec<Order>>
where
    F: FnMut(u32) -> Result<Vec<Order>>,
{
    let mut orders = Vec::new();
    let mut page = 1;
    loop {
        let batch = fetch_page(page)?;
        if batch.is_empty() {
            break;
        }
        orders.extend(batch);
        page += 1;
    }
    Ok(orders)
}
