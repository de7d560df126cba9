use anyhow::{anyhow, bail, Context, Result};
use log::debug;
use serde::Deserialize;
use serde_json::json;

use std::{fs, path::Path};

/// The spreadsheet document that receives the export.
pub const GSHEET_URL: &str =
    "https://docs.google.com/spreadsheets/d/1kJH3Gk9IVJoLp6MqDj7lit_iqsMdYWYvEpsUz4pVDxc";

/// The worksheet within the document that holds the order data.
pub const SHEET_NAME: &str = "order_data";

const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Auth file shape: a bearer token for the Sheets API.
#[derive(Debug, Deserialize)]
struct SheetAuth {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
struct Sheet {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

/// Extracts the document ID from a spreadsheet URL.
///
/// # Errors
///
/// Returns an error if the URL has no `/d/<id>` segment.
pub fn spreadsheet_id(url: &str) -> Result<&str> {
    url.split("/d/")
        .nth(1)
        .and_then(|rest| rest.split('/').next())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| anyhow!("no spreadsheet ID in URL: {url}"))
}

/// Reads a CSV file back as a grid of strings, header row included, ready
/// to be written to a worksheet.
///
/// # Errors
///
/// Returns any errors from opening or parsing the file.
pub fn read_grid(path: impl AsRef<Path>) -> Result<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    let mut grid = Vec::new();
    for record in rdr.records() {
        let record = record?;
        grid.push(record.iter().map(str::to_string).collect());
    }
    Ok(grid)
}

/// Publishes the finished export to the [`SHEET_NAME`] worksheet of the
/// configured spreadsheet.
///
/// The worksheet is replaced wholesale: located (or created) by title,
/// cleared entirely, then rewritten from the top-left cell. No diffing
/// against prior contents.
pub struct SheetPublisher {
    http: reqwest::blocking::Client,
    token: String,
    spreadsheet_id: String,
}

impl SheetPublisher {
    /// Builds a publisher from the auth JSON file, which must contain an
    /// `access_token` for the Sheets API.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_auth_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let auth: SheetAuth =
            serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        Ok(Self {
            http: reqwest::blocking::Client::new(),
            token: auth.access_token,
            spreadsheet_id: spreadsheet_id(GSHEET_URL)?.to_string(),
        })
    }

    /// Replaces the worksheet's contents with `grid`, creating the
    /// worksheet if it doesn't exist yet. Returns the number of data rows
    /// uploaded, not counting the header.
    ///
    /// # Errors
    ///
    /// Any non-success API response aborts the upload with the status code
    /// and response body.
    pub fn publish(&self, grid: &[Vec<String>]) -> Result<usize> {
        if !self.sheet_exists()? {
            debug!("worksheet {SHEET_NAME} not found, creating it");
            self.add_sheet()?;
        }
        self.clear()?;
        self.update(grid)?;
        Ok(grid.len().saturating_sub(1))
    }

    fn sheet_exists(&self) -> Result<bool> {
        let url = format!(
            "{API_BASE}/{}?fields=sheets.properties.title",
            self.spreadsheet_id
        );
        let resp = self.check("fetching spreadsheet", self.http.get(url))?;
        let doc: Spreadsheet = resp.json().context("decoding spreadsheet")?;
        Ok(doc.sheets.iter().any(|s| s.properties.title == SHEET_NAME))
    }

    fn add_sheet(&self) -> Result<()> {
        let url = format!("{API_BASE}/{}:batchUpdate", self.spreadsheet_id);
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": SHEET_NAME,
                        "gridProperties": {"rowCount": 100, "columnCount": 20},
                    }
                }
            }]
        });
        self.check("creating worksheet", self.http.post(url).json(&body))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        debug!("clearing worksheet {SHEET_NAME}");
        let url = format!(
            "{API_BASE}/{}/values/{SHEET_NAME}:clear",
            self.spreadsheet_id
        );
        self.check("clearing worksheet", self.http.post(url).json(&json!({})))?;
        Ok(())
    }

    fn update(&self, grid: &[Vec<String>]) -> Result<()> {
        debug!("writing {} rows to worksheet {SHEET_NAME}", grid.len());
        let url = format!(
            "{API_BASE}/{}/values/{SHEET_NAME}!A1?valueInputOption=RAW",
            self.spreadsheet_id
        );
        let body = json!({"values": grid});
        self.check("writing worksheet", self.http.put(url).json(&body))?;
        Ok(())
    }

    fn check(
        &self,
        what: &str,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<reqwest::blocking::Response> {
        let resp = request
            .bearer_auth(&self.token)
            .send()
            .with_context(|| format!("{what}: request failed"))?;
        let status = resp.status();
        if !status.is_success() {
            bail!(
                "{what} failed: {status} {}",
                resp.text().unwrap_or_default()
            );
        }
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spreadsheet_id_fn_extracts_the_document_id() {
        assert_eq!(
            spreadsheet_id(GSHEET_URL).unwrap(),
            "1kJH3Gk9IVJoLp6MqDj7lit_iqsMdYWYvEpsUz4pVDxc"
        );
        assert_eq!(
            spreadsheet_id("https://docs.google.com/spreadsheets/d/abc123/edit#gid=0").unwrap(),
            "abc123"
        );
    }

    #[test]
    fn spreadsheet_id_fn_rejects_urls_without_an_id() {
        assert!(spreadsheet_id("https://docs.google.com/spreadsheets").is_err());
        assert!(spreadsheet_id("https://docs.google.com/spreadsheets/d/").is_err());
    }

    #[test]
    fn read_grid_fn_includes_the_header_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        std::fs::write(&path, "order_id,line_item_sku\n1001,A\n1001,B\n").unwrap();
        let grid = read_grid(&path).unwrap();
        assert_eq!(
            grid,
            vec![
                vec!["order_id".to_string(), "line_item_sku".to_string()],
                vec!["1001".to_string(), "A".to_string()],
                vec!["1001".to_string(), "B".to_string()],
            ]
        );
    }

    #[test]
    fn from_auth_file_fn_reads_a_bearer_token() {
        let publisher = SheetPublisher::from_auth_file("testdata/sheets_auth.json").unwrap();
        assert_eq!(publisher.token, "ya29.test-token");
        assert_eq!(
            publisher.spreadsheet_id,
            "1kJH3Gk9IVJoLp6MqDj7lit_iqsMdYWYvEpsUz4pVDxc"
        );
    }

    #[test]
    fn from_auth_file_fn_returns_error_for_a_malformed_file() {
        assert!(SheetPublisher::from_auth_file("testdata/wc_credentials.json").is_err());
    }
}
