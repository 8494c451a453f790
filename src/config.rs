use encoding_rs::Encoding;
use std::time::Duration;

use crate::error::{Error, Result};

/// Swisstopo's official register of localities with zipcodes, LV95 coordinates.
pub const DOWNLOAD_URL: &str =
    "https://data.geo.admin.ch/ch.swisstopo-vd.ortschaftenverzeichnis_plz/PLZO_CSV_LV95.zip";

/// Label of the encoding the register is decoded with by default.
///
/// The register is published as latin1. WHATWG maps every latin1 label to
/// Windows-1252, which agrees with ISO-8859-1 except for bytes 0x80-0x9F
/// (C1 controls there, punctuation and `€` here). The register carries none
/// of those bytes.
pub const DEFAULT_ENCODING_LABEL: &str = "windows-1252";

/// Settings for fetching and decoding the dataset
#[derive(Debug, Clone)]
pub struct Config {
    /// Where the ZIP archive is downloaded from
    pub url: String,
    /// Timeout applied to each HTTP request
    pub timeout: Duration,
    /// Attempts made on timeouts and connection errors before giving up
    pub max_retry: u32,
    /// Text encoding of the CSV table inside the archive
    pub encoding: &'static Encoding,
}

impl Config {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retry(mut self, max_retry: u32) -> Self {
        self.max_retry = max_retry.max(1);
        self
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Resolve a WHATWG encoding label such as `windows-1252` or `utf-8`.
    pub fn with_encoding_label(self, label: &str) -> Result<Self> {
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| Error::UnknownEncoding(label.to_string()))?;
        Ok(self.with_encoding(encoding))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: DOWNLOAD_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retry: 3,
            encoding: encoding_rs::WINDOWS_1252,
        }
    }
}
