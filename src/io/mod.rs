mod http;
mod local;

pub use http::HttpArchiveSource;
pub use local::{LocalArchiveSource, LocalFileReader};

use async_trait::async_trait;
use std::path::Path;

use crate::error::{Error, Result};

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Fill the whole buffer, failing if the source ends first
    async fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_at(offset + filled as u64, &mut buf[filled..]).await?;
            if n == 0 {
                return Err(Error::InvalidArchive(format!(
                    "unexpected end of data at offset {}",
                    offset + filled as u64
                )));
            }
            filled += n;
        }
        Ok(())
    }
}

/// Somewhere a zipcode archive can be fetched from
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Write the whole archive to `destination`, replacing its contents
    async fn fetch_to(&self, destination: &Path) -> Result<()>;

    /// Human readable origin, used in logs
    fn describe(&self) -> String;
}
