use serde::Serialize;
use serde_json::Value;

use crate::orders::{LineItem, Order};
use crate::usd::Usd;

/// Metadata keys recognized as carrying a line item's unit cost, compared
/// case-insensitively.
pub const COST_KEYS: [&str; 4] = ["product_cost", "cost_of_goods", "_wc_cog_cost", "cogs"];

/// One flat export row: a single line item together with its order's
/// context.
///
/// Field declaration order is the CSV column order. The order-level fields
/// are repeated identically on every row derived from the same order.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ExportRow {
    pub order_id: u64,
    pub order_date: String,
    pub customer_id: u64,
    pub sku: String,
    pub quantity: u32,
    pub line_total: String,
    pub unit_cost: Usd,
    pub line_cogs: Usd,
    pub order_status: String,
    pub shipping_paid: String,
    pub taxes_paid: String,
}

/// Flattens one order into zero or more export rows, one per line item.
///
/// An order with no line items contributes no rows, so it is effectively
/// dropped from the export.
///
/// # Examples
///
/// ```
/// use cogs::orders::Order;
/// use cogs::rows::extract_rows;
///
/// assert!(extract_rows(&Order::default()).is_empty());
/// ```
#[must_use]
pub fn extract_rows(order: &Order) -> Vec<ExportRow> {
    order
        .line_items
        .iter()
        .map(|item| {
            let unit_cost = unit_cost(item);
            ExportRow {
                order_id: order.id,
                order_date: order.date_created.clone(),
                customer_id: order.customer_id,
                sku: item.sku.clone(),
                quantity: item.quantity,
                line_total: item.total.clone(),
                unit_cost,
                line_cogs: unit_cost * item.quantity,
                order_status: order.status.clone(),
                shipping_paid: order.shipping_total.clone(),
                taxes_paid: order.total_tax.clone(),
            }
        })
        .collect()
}

/// Returns the unit cost recorded in a line item's metadata.
///
/// The first entry whose key matches one of [`COST_KEYS`], ignoring case,
/// determines the cost; later duplicates are never summed. A missing entry
/// or an unparseable value means a cost of zero.
#[must_use]
pub fn unit_cost(item: &LineItem) -> Usd {
    item.meta_data
        .iter()
        .find(|meta| COST_KEYS.contains(&meta.key.to_lowercase().as_str()))
        .and_then(|meta| parse_cost(&meta.value))
        .unwrap_or_default()
}

fn parse_cost(value: &Value) -> Option<Usd> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => Usd::from_f64(n.as_f64()?),
        _ => None,
    }
}
