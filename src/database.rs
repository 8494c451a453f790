use encoding_rs::Encoding;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::Config;
use crate::dataset;
use crate::error::{Error, Result};
use crate::fetch::ensure_local;
use crate::io::{ArchiveSource, HttpArchiveSource};
use crate::location::{Location, LocationIndex};

/// Database of Swiss zipcodes.
///
/// The register is downloaded to `file_path` the first time any query needs
/// it (unless the file is already there), then parsed once and kept in
/// memory for the lifetime of the database.
///
/// ```no_run
/// use zipch::ZipcodesDatabase;
///
/// # async fn run() -> zipch::Result<()> {
/// let db = ZipcodesDatabase::new("/tmp/zipcodes.csv")?;
/// let location = db.get_location(1003).await?;
/// assert_eq!(location.canton, "VD");
/// # Ok(())
/// # }
/// ```
pub struct ZipcodesDatabase<S: ArchiveSource = HttpArchiveSource> {
    file_path: PathBuf,
    source: S,
    encoding: &'static Encoding,
    /// Unset until the first successful build; a failed build leaves it unset
    locations: OnceCell<LocationIndex>,
}

impl ZipcodesDatabase<HttpArchiveSource> {
    /// Database backed by the official swisstopo download.
    ///
    /// `file_path` is where the extracted CSV is cached; it does not need
    /// to exist yet.
    pub fn new(file_path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(file_path, &Config::default())
    }

    pub fn with_config(file_path: impl Into<PathBuf>, config: &Config) -> Result<Self> {
        let source = HttpArchiveSource::new(config)?;
        Ok(Self::with_source(file_path, source, config.encoding))
    }
}

impl<S: ArchiveSource> ZipcodesDatabase<S> {
    pub fn with_source(file_path: impl Into<PathBuf>, source: S, encoding: &'static Encoding) -> Self {
        Self {
            file_path: file_path.into(),
            source,
            encoding,
            locations: OnceCell::new(),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Download the zipcodes file. With `overwrite` unset, nothing happens
    /// if the file already exists.
    ///
    /// The in-memory index is left alone; see [`invalidate`](Self::invalidate).
    pub async fn download(&self, overwrite: bool) -> Result<()> {
        ensure_local(&self.source, &self.file_path, overwrite).await?;
        Ok(())
    }

    /// Zipcode to location mapping, downloading and parsing the register
    /// on first use.
    ///
    /// Concurrent first calls share a single download and parse. If that
    /// fails the error is returned and the next call tries again.
    pub async fn get_locations(&self) -> Result<&LocationIndex> {
        self.locations
            .get_or_try_init(|| async {
                ensure_local(&self.source, &self.file_path, false).await?;
                let index = dataset::parse(&self.file_path, self.encoding).await?;
                info!(zipcodes = index.len(), "zipcodes index built");
                Ok::<_, Error>(index)
            })
            .await
    }

    /// Whether the index has been built already
    pub fn is_loaded(&self) -> bool {
        self.locations.initialized()
    }

    /// Drop the in-memory index so the next query parses the file again
    pub fn invalidate(&mut self) {
        self.locations = OnceCell::new();
    }

    pub async fn get_location(&self, zipcode: u32) -> Result<&Location> {
        self.get_locations()
            .await?
            .get(&zipcode)
            .ok_or(Error::ZipcodeNotFound(zipcode))
    }

    /// Zipcodes whose main municipality is `municipality`, in index order
    pub async fn get_zipcodes_for_municipality(&self, municipality: &str) -> Result<Vec<u32>> {
        self.zipcodes_where(|location| location.municipality == municipality)
            .await
    }

    /// Zipcodes in the canton with abbreviation `canton`, in index order
    pub async fn get_zipcodes_for_canton(&self, canton: &str) -> Result<Vec<u32>> {
        self.zipcodes_where(|location| location.canton == canton)
            .await
    }

    /// Distinct canton abbreviations, sorted
    pub async fn get_cantons(&self) -> Result<Vec<String>> {
        self.distinct(|location| &location.canton).await
    }

    /// Distinct municipality names, sorted
    pub async fn get_municipalities(&self) -> Result<Vec<String>> {
        self.distinct(|location| &location.municipality).await
    }

    async fn zipcodes_where<F>(&self, predicate: F) -> Result<Vec<u32>>
    where
        F: Fn(&Location) -> bool,
    {
        Ok(self
            .get_locations()
            .await?
            .iter()
            .filter(|(_, location)| predicate(location))
            .map(|(zipcode, _)| *zipcode)
            .collect())
    }

    async fn distinct<F>(&self, field: F) -> Result<Vec<String>>
    where
        F: for<'a> Fn(&'a Location) -> &'a String,
    {
        let values: BTreeSet<&String> = self.get_locations().await?.values().map(field).collect();
        Ok(values.into_iter().cloned().collect())
    }
}
