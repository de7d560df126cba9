use anyhow::Result;

use std::path::Path;

use crate::orders::Order;
use crate::rows::extract_rows;

/// The export filename, written fresh in the working directory each run.
pub const EXPORT_PATH: &str = "orders.csv";

/// The fixed export column headers, in column order.
pub const CSV_HEADERS: [&str; 11] = [
    "order_id",
    "order_date",
    "customer_id",
    "line_item_sku",
    "line_item_quantity",
    "line_item_total",
    "product_cost",
    "line_COGS",
    "order_status",
    "shipping_paid",
    "taxes_paid",
];

/// Writes the flattened export for `orders` to a CSV file at `path`,
/// truncating any existing file.
///
/// The header row is always written, even when no order contributes any
/// rows. Returns the number of data rows written.
///
/// # Errors
///
/// Returns any errors from creating or writing the file.
pub fn write_csv(path: impl AsRef<Path>, orders: &[Order]) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    wtr.write_record(CSV_HEADERS)?;
    let mut rows = 0;
    for order in orders {
        for row in extract_rows(order) {
            wtr.serialize(row)?;
            rows += 1;
        }
    }
    wtr.flush()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::orders::{LineItem, MetaEntry};

    use super::*;

    fn synthetic_orders() -> Vec<Order> {
        let with_items = Order {
            id: 1001,
            date_created: "2025-01-02T10:00:00".into(),
            customer_id: 77,
            status: "processing".into(),
            shipping_total: "4.50".into(),
            total_tax: "1.25".into(),
            line_items: vec![
                LineItem {
                    sku: "A".into(),
                    quantity: 2,
                    total: "20.00".into(),
                    meta_data: vec![MetaEntry {
                        key: "product_cost".into(),
                        value: json!("5.00"),
                    }],
                },
                LineItem {
                    sku: "B".into(),
                    quantity: 1,
                    total: "9.99".into(),
                    meta_data: Vec::new(),
                },
            ],
        };
        let empty = Order {
            id: 1002,
            ..Order::default()
        };
        vec![with_items, empty]
    }

    #[test]
    fn write_csv_fn_writes_one_row_per_line_item() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        let rows = write_csv(&path, &synthetic_orders()).unwrap();
        // The itemless order contributes nothing.
        assert_eq!(rows, 2, "wrong row count");
        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next().unwrap(), CSV_HEADERS.join(","));
        assert_eq!(
            lines.next().unwrap(),
            "1001,2025-01-02T10:00:00,77,A,2,20.00,5.00,10.00,processing,4.50,1.25"
        );
        assert_eq!(
            lines.next().unwrap(),
            "1001,2025-01-02T10:00:00,77,B,1,9.99,0.00,0.00,processing,4.50,1.25"
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn write_csv_fn_writes_header_only_for_an_empty_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        let rows = write_csv(&path, &[]).unwrap();
        assert_eq!(rows, 0);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim_end(), CSV_HEADERS.join(","));
    }

    #[test]
    fn write_csv_fn_truncates_a_previous_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        write_csv(&path, &synthetic_orders()).unwrap();
        write_csv(&path, &[]).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim_end(), CSV_HEADERS.join(","));
    }
}
