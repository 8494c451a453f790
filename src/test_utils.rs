//! Fixtures shared by the unit tests.

use async_trait::async_trait;
use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Crc;
use flate2::write::DeflateEncoder;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;
use crate::io::ArchiveSource;

pub const HEADER: &str = "Ortschaftsname;PLZ;Zusatzziffer;Gemeindename;BFS-Nr;Kantonskürzel;E;N;Sprache";

/// A small excerpt of the register, Windows-1252 encodable
pub const FIXTURE_ROWS: &[&str] = &[
    "Lausanne;1003;0;Lausanne;5586;VD;2538000;1152000;fr",
    "Lausanne;1004;0;Lausanne;5586;VD;2537000;1153000;fr",
    "Genève;1201;0;Genève;6621;GE;2500000;1118000;fr",
    "Zürich;8001;0;Zürich;261;ZH;2683000;1247000;de",
    "Winterthur;8400;0;Winterthur;230;ZH;2697000;1262000;de",
    "Bern;3011;0;Bern;351;BE;2600000;1200000;de",
    "Biel/Bienne;2502;0;Biel/Bienne;371;BE;2585000;1221000;de",
];

pub fn fixture_csv() -> String {
    let mut csv = String::from(HEADER);
    for row in FIXTURE_ROWS {
        csv.push_str("\r\n");
        csv.push_str(row);
    }
    csv.push_str("\r\n");
    csv
}

pub fn fixture_csv_latin1() -> Vec<u8> {
    let csv = fixture_csv();
    let (bytes, _, had_errors) = encoding_rs::WINDOWS_1252.encode(&csv);
    assert!(!had_errors);
    bytes.into_owned()
}

pub fn write_zip(path: &Path, entries: &[(&str, &[u8])], method: CompressionMethod) {
    let file = std::fs::File::create(path).unwrap();
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(method);
    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap();
}

/// Single entry archive assembled by hand, for headers the `zip` crate
/// refuses to write. Sizes always go through the ZIP64 extra field.
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub name: &'static str,
    pub data: Vec<u8>,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
}

impl RawEntry {
    pub fn deflated(name: &'static str, content: &[u8]) -> Self {
        let mut encoder = DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(content).unwrap();
        let data = encoder.finish().unwrap();
        let mut crc = Crc::new();
        crc.update(content);
        Self {
            name,
            compressed_size: data.len() as u64,
            uncompressed_size: content.len() as u64,
            crc32: crc.sum(),
            data,
        }
    }

    /// Archive bytes whose end record claims `declared_entries` entries
    pub fn to_zip(&self, declared_entries: u16) -> Vec<u8> {
        let name = self.name.as_bytes();
        let mut out = Vec::new();

        // Local file header
        out.extend_from_slice(b"PK\x03\x04");
        out.write_u16::<LittleEndian>(20).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(8).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(self.crc32).unwrap();
        out.write_u32::<LittleEndian>(0xFFFFFFFF).unwrap();
        out.write_u32::<LittleEndian>(0xFFFFFFFF).unwrap();
        out.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.extend_from_slice(name);
        out.extend_from_slice(&self.data);

        // Central directory
        let cd_offset = out.len() as u32;
        out.extend_from_slice(b"PK\x01\x02");
        out.write_u16::<LittleEndian>(20).unwrap();
        out.write_u16::<LittleEndian>(20).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(8).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(self.crc32).unwrap();
        out.write_u32::<LittleEndian>(0xFFFFFFFF).unwrap();
        out.write_u32::<LittleEndian>(0xFFFFFFFF).unwrap();
        out.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(20).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.extend_from_slice(name);
        out.write_u16::<LittleEndian>(0x0001).unwrap();
        out.write_u16::<LittleEndian>(16).unwrap();
        out.write_u64::<LittleEndian>(self.uncompressed_size).unwrap();
        out.write_u64::<LittleEndian>(self.compressed_size).unwrap();
        let cd_size = out.len() as u32 - cd_offset;

        // End of central directory
        out.extend_from_slice(b"PK\x05\x06");
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(declared_entries).unwrap();
        out.write_u16::<LittleEndian>(declared_entries).unwrap();
        out.write_u32::<LittleEndian>(cd_size).unwrap();
        out.write_u32::<LittleEndian>(cd_offset).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out
    }
}

/// Archive source serving a fixed archive from memory and counting fetches
pub struct CountingSource {
    archive: Vec<u8>,
    fetches: AtomicUsize,
    last_destination: Mutex<Option<PathBuf>>,
}

impl CountingSource {
    pub fn new(archive: Vec<u8>) -> Self {
        Self {
            archive,
            fetches: AtomicUsize::new(0),
            last_destination: Mutex::new(None),
        }
    }

    /// Source serving the latin1 fixture table, deflated
    pub fn with_fixture() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("PLZO_CSV_LV95.zip");
        write_zip(
            &path,
            &[
                ("PLZO_CSV_LV95/Metadata.txt", &b"swisstopo"[..]),
                ("PLZO_CSV_LV95/PLZO_CSV_LV95.csv", &fixture_csv_latin1()[..]),
            ],
            CompressionMethod::Deflated,
        );
        Self::new(std::fs::read(&path).unwrap())
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn last_destination(&self) -> Option<PathBuf> {
        self.last_destination.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArchiveSource for CountingSource {
    async fn fetch_to(&self, destination: &Path) -> Result<()> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        *self.last_destination.lock().unwrap() = Some(destination.to_path_buf());
        tokio::fs::write(destination, &self.archive).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
