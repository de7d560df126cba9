use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use std::{
    fs,
    io::{BufRead, Write},
    path::{Path, PathBuf},
};

/// The credential file used when none is named on the command line.
pub const DEFAULT_CONFIG: &str = "wc_credentials.json";

/// The store endpoint offered as a default when prompting.
pub const DEFAULT_BASE_URL: &str = "https://naturesseed.com/wp-json/wc/v3";

/// Connection details for the store's REST API.
///
/// The serialized form matches the credential file on disk:
///
/// ```json
/// {"WC_BASE_URL": "...", "CONSUMER_KEY": "...", "CONSUMER_SECRET": "..."}
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Credentials {
    #[serde(rename = "WC_BASE_URL")]
    pub base_url: String,
    #[serde(rename = "CONSUMER_KEY")]
    pub consumer_key: String,
    #[serde(rename = "CONSUMER_SECRET")]
    pub consumer_secret: String,
}

/// A source of store credentials.
pub trait CredentialSource {
    /// Produces a complete set of credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot supply credentials, for
    /// example because a credential file is missing or malformed.
    fn credentials(&mut self) -> Result<Credentials>;
}

/// Reads credentials from a JSON file.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialSource for FileSource {
    fn credentials(&mut self) -> Result<Credentials> {
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("reading {:?}", self.path))?;
        serde_json::from_str(&data).with_context(|| format!("parsing {:?}", self.path))
    }
}

/// Prompts interactively for credentials, then persists them to the
/// credential file so the next run doesn't have to ask.
///
/// Generic over its input and output streams; the binary wires it to
/// stdin/stdout.
pub struct PromptSource<R, W> {
    input: R,
    output: W,
    path: PathBuf,
}

impl<R: BufRead, W: Write> PromptSource<R, W> {
    pub fn new(input: R, output: W, path: impl Into<PathBuf>) -> Self {
        Self {
            input,
            output,
            path: path.into(),
        }
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

impl<R: BufRead, W: Write> CredentialSource for PromptSource<R, W> {
    fn credentials(&mut self) -> Result<Credentials> {
        writeln!(
            self.output,
            "WooCommerce credentials not found. Please enter them now:"
        )?;
        let mut base_url = self.ask("WooCommerce base URL: ")?;
        if base_url.is_empty() {
            base_url = DEFAULT_BASE_URL.to_string();
        }
        let consumer_key = self.ask("Consumer key: ")?;
        let consumer_secret = self.ask("Consumer secret: ")?;
        let creds = Credentials {
            base_url,
            consumer_key,
            consumer_secret,
        };
        fs::write(&self.path, serde_json::to_string(&creds)?)
            .with_context(|| format!("writing {:?}", self.path))?;
        Ok(creds)
    }
}

/// Loads credentials from the file at `path` if it exists; otherwise
/// prompts for them on the terminal and saves the answers to `path` for
/// future runs.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed, or if
/// prompting or persisting fails.
pub fn load_or_prompt(path: impl AsRef<Path>) -> Result<Credentials> {
    let path = path.as_ref();
    if path.exists() {
        FileSource::new(path).credentials()
    } else {
        let stdin = std::io::stdin();
        PromptSource::new(stdin.lock(), std::io::stdout(), path).credentials()
    }
}
