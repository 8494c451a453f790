use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};
use crate::io::{LocalFileReader, ReadAt};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Suffix of the table we look for inside the register archive
pub const TABLE_SUFFIX: &str = ".csv";

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all files in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// First entry, in stored order, whose name ends with `suffix`
    pub async fn find_first(&self, suffix: &str) -> Result<Option<ZipFileEntry>> {
        let entries = self.list_files().await?;
        Ok(entries.into_iter().find(|e| e.has_suffix(suffix)))
    }

    /// Decompress an entry to memory, checking its size and CRC-32
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        if entry.is_encrypted() {
            return Err(Error::InvalidArchive(format!(
                "{} is encrypted",
                entry.file_name
            )));
        }

        let data_offset = self.parser.get_data_offset(entry).await?;
        // Sizes come from the archive itself; never allocate past its end
        let in_bounds = data_offset
            .checked_add(entry.compressed_size)
            .is_some_and(|end| end <= self.parser.reader().size());
        if !in_bounds {
            return Err(Error::InvalidArchive(format!(
                "{}: entry data lies outside the archive",
                entry.file_name
            )));
        }

        let mut raw = vec![0u8; entry.compressed_size as usize];
        self.parser
            .reader()
            .read_exact_at(data_offset, &mut raw)
            .await?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw,
            CompressionMethod::Deflate => {
                let mut out = Vec::new();
                // Read one byte past the declared size so overlong streams are caught
                DeflateDecoder::new(raw.as_slice())
                    .take(entry.uncompressed_size.saturating_add(1))
                    .read_to_end(&mut out)
                    .map_err(|e| {
                        Error::InvalidArchive(format!("{}: {}", entry.file_name, e))
                    })?;
                out
            }
            CompressionMethod::Unknown(method) => {
                return Err(Error::InvalidArchive(format!(
                    "unsupported compression method {} for {}",
                    method, entry.file_name
                )));
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            return Err(Error::InvalidArchive(format!(
                "{}: expected {} bytes, got {}",
                entry.file_name,
                entry.uncompressed_size,
                data.len()
            )));
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            return Err(Error::InvalidArchive(format!(
                "{}: CRC-32 mismatch",
                entry.file_name
            )));
        }

        Ok(data)
    }

    /// Extract file to disk, replacing whatever is at `output_path`.
    ///
    /// The previous file stays in place until the new content is fully
    /// written.
    pub async fn extract_to_file(&self, entry: &ZipFileEntry, output_path: &Path) -> Result<()> {
        let data = self.extract_to_memory(entry).await?;
        let output_path = output_path.to_path_buf();

        tokio::task::spawn_blocking(move || replace_file(&output_path, &data))
            .await
            .map_err(std::io::Error::other)?
    }
}

/// Write `data` next to `path` and rename it over `path`
fn replace_file(path: &Path, data: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut staged = NamedTempFile::new_in(parent)?;
    staged.write_all(data)?;
    staged.as_file().sync_all()?;
    // A failed rename drops the staged file, which deletes it
    staged.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Extract the first `.csv` entry of the archive at `archive_path` to
/// `destination`.
///
/// Fails with [`Error::TableNotFound`] when the archive holds no such entry,
/// in which case `destination` is not touched.
pub async fn extract_csv(archive_path: &Path, destination: &Path) -> Result<()> {
    let reader = Arc::new(LocalFileReader::new(archive_path)?);
    let extractor = ZipExtractor::new(reader);

    let entry = extractor
        .find_first(TABLE_SUFFIX)
        .await?
        .ok_or(Error::TableNotFound)?;

    debug!(
        entry = %entry.file_name,
        size = entry.uncompressed_size,
        destination = %destination.display(),
        "extracting table"
    );
    extractor.extract_to_file(&entry, destination).await
}
