//! ZIP archive reading.
//!
//! The register is published as a ZIP archive holding a single CSV table
//! (plus documentation files, depending on the release). This module reads
//! the archive's Central Directory, picks the table, and decompresses it.
//!
//! - [`structures`]: ZIP format records (EOCD, ZIP64 records, entries)
//! - [`parser`]: binary parsing of those records from a [`ReadAt`](crate::io::ReadAt) source
//! - [`extractor`]: decompression to memory or disk, and [`extract_csv`]
//!
//! Supported: STORED and DEFLATE entries, ZIP64 archives, trailing archive
//! comments. Not supported: encryption, multi-disk archives, other
//! compression methods.

mod extractor;
mod parser;
mod structures;

pub use extractor::{TABLE_SUFFIX, ZipExtractor, extract_csv};
pub use parser::ZipParser;
pub use structures::*;
