use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::{Error, Result};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }
}

/// Short read of an archive record
fn truncated(what: &'static str) -> impl Fn(std::io::Error) -> Error {
    move |e| Error::InvalidArchive(format!("truncated {}: {}", what, e))
}

fn check_signature(data: &[u8], signature: &[u8], min_size: usize, what: &str) -> Result<()> {
    if data.len() < min_size || &data[0..4] != signature {
        return Err(Error::InvalidArchive(format!("bad {}", what)));
    }
    Ok(())
}

/// End of Central Directory (EOCD) - 22 bytes minimum
pub struct EndOfCentralDirectory {
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        const WHAT: &str = "end of central directory";
        check_signature(data, Self::SIGNATURE, Self::SIZE, WHAT)?;

        // Skip signature and the two disk numbers (multi-disk is unsupported)
        Self::read_fields(&mut Cursor::new(&data[8..])).map_err(truncated(WHAT))
    }

    fn read_fields(cursor: &mut Cursor<&[u8]>) -> std::io::Result<Self> {
        Ok(Self {
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
        })
    }

    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes
pub struct Zip64EOCDLocator {
    pub eocd64_offset: u64,
}

impl Zip64EOCDLocator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        const WHAT: &str = "ZIP64 locator";
        check_signature(data, Self::SIGNATURE, Self::SIZE, WHAT)?;

        let eocd64_offset = Cursor::new(&data[8..])
            .read_u64::<LittleEndian>()
            .map_err(truncated(WHAT))?;
        Ok(Self { eocd64_offset })
    }
}

/// ZIP64 End of Central Directory - 56 bytes minimum
pub struct Zip64EOCD {
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EOCD {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        const WHAT: &str = "ZIP64 end of central directory";
        check_signature(data, Self::SIGNATURE, Self::MIN_SIZE, WHAT)?;

        // Record size, versions, disk numbers and per-disk count come first
        Self::read_fields(&mut Cursor::new(&data[32..])).map_err(truncated(WHAT))
    }

    fn read_fields(cursor: &mut Cursor<&[u8]>) -> std::io::Result<Self> {
        Ok(Self {
            total_entries: cursor.read_u64::<LittleEndian>()?,
            cd_size: cursor.read_u64::<LittleEndian>()?,
            cd_offset: cursor.read_u64::<LittleEndian>()?,
        })
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// General purpose flag bit 0
pub const FLAG_ENCRYPTED: u16 = 0x0001;

/// Parsed ZIP file entry information
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub flags: u16,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub is_directory: bool,
}

impl ZipFileEntry {
    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }

    /// Whether this entry is a file whose name ends with `suffix`
    pub fn has_suffix(&self, suffix: &str) -> bool {
        !self.is_directory && self.file_name.ends_with(suffix)
    }
}
