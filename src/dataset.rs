//! Parser for the register's CSV table.
//!
//! The table is `;` separated and starts with a header row:
//!
//! ```text
//! Ortschaftsname;PLZ;Zusatzziffer;Gemeindename;BFS-Nr;Kantonskürzel;E;N;Sprache
//! ```
//!
//! Columns are looked up by header name once, before any data row is read,
//! so a reordered table still parses and a renamed column fails early.

use csv::StringRecord;
use encoding_rs::Encoding;
use std::path::Path;
use tracing::debug;

use crate::coordinates::Lv95Coordinates;
use crate::error::{Error, Result};
use crate::location::{Location, LocationIndex};

pub const DELIMITER: u8 = b';';

pub const COLUMN_OFFICIAL_NAME: &str = "Ortschaftsname";
pub const COLUMN_ZIPCODE: &str = "PLZ";
pub const COLUMN_MUNICIPALITY: &str = "Gemeindename";
pub const COLUMN_CANTON: &str = "Kantonskürzel";
pub const COLUMN_EAST: &str = "E";
pub const COLUMN_NORTH: &str = "N";

/// Positions of the columns we read, resolved from the header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    official_name: usize,
    zipcode: usize,
    municipality: usize,
    canton: usize,
    /// Both coordinate columns, or neither
    coordinates: Option<(usize, usize)>,
    /// Minimum number of fields a data row must have
    width: usize,
}

impl Schema {
    pub fn from_header(header: &StringRecord) -> Result<Self> {
        let find = |name: &'static str| header.iter().position(|field| field.trim() == name);
        let require = |name: &'static str| find(name).ok_or(Error::MissingColumn(name));

        let official_name = require(COLUMN_OFFICIAL_NAME)?;
        let zipcode = require(COLUMN_ZIPCODE)?;
        let municipality = require(COLUMN_MUNICIPALITY)?;
        let canton = require(COLUMN_CANTON)?;
        let coordinates = find(COLUMN_EAST).zip(find(COLUMN_NORTH));

        let width = [official_name, zipcode, municipality, canton]
            .into_iter()
            .chain(coordinates.into_iter().flat_map(|(e, n)| [e, n]))
            .max()
            .unwrap_or(0)
            + 1;

        Ok(Self {
            official_name,
            zipcode,
            municipality,
            canton,
            coordinates,
            width,
        })
    }

    /// Read one data row. `row` is the 1-based line number, for diagnostics.
    pub fn read_row(&self, record: &StringRecord, row: u64) -> Result<(u32, Location)> {
        if record.len() < self.width {
            return Err(Error::MalformedRow {
                row,
                reason: format!(
                    "expected at least {} columns, found {}",
                    self.width,
                    record.len()
                ),
            });
        }

        let zipcode_field = record[self.zipcode].trim();
        let zipcode = zipcode_field.parse::<u32>().map_err(|_| Error::MalformedRow {
            row,
            reason: format!("invalid zipcode `{}`", zipcode_field),
        })?;

        let coordinates = match self.coordinates {
            Some((east, north)) => Some(Lv95Coordinates::new(
                parse_coordinate(&record[east], row)?,
                parse_coordinate(&record[north], row)?,
            )),
            None => None,
        };

        let location = Location {
            official_name: record[self.official_name].to_string(),
            canton: record[self.canton].to_string(),
            municipality: record[self.municipality].to_string(),
            coordinates,
        };

        Ok((zipcode, location))
    }
}

fn parse_coordinate(field: &str, row: u64) -> Result<f64> {
    field.trim().parse::<f64>().map_err(|_| Error::MalformedRow {
        row,
        reason: format!("invalid coordinate `{}`", field),
    })
}

/// Parse the table at `path`, decoded with exactly `encoding`.
pub async fn parse(path: &Path, encoding: &'static Encoding) -> Result<LocationIndex> {
    let bytes = tokio::fs::read(path).await?;
    let index = parse_bytes(&bytes, encoding)?;
    debug!(path = %path.display(), zipcodes = index.len(), "parsed zipcodes file");
    Ok(index)
}

/// Parse an in-memory table.
///
/// Bytes that are invalid in `encoding` fail the whole parse. A zipcode
/// seen twice keeps the later row.
pub fn parse_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<LocationIndex> {
    let decoded = encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or(Error::Decoding(encoding.name()))?;
    let text = decoded.strip_prefix('\u{feff}').unwrap_or(&*decoded);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = reader.records();

    let header = records.next().ok_or(Error::EmptyFile)??;
    let schema = Schema::from_header(&header)?;

    let mut index = LocationIndex::new();
    for (i, record) in records.enumerate() {
        let record = record?;
        let row = record
            .position()
            .map(|p| p.line())
            .unwrap_or(i as u64 + 2);
        let (zipcode, location) = schema.read_row(&record, row)?;
        index.insert(zipcode, location);
    }

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_utils::{HEADER, fixture_csv, fixture_csv_latin1};

    const LATIN1: &Encoding = encoding_rs::WINDOWS_1252;

    #[test]
    fn test_parse_single_row() {
        let csv = "Ortschaftsname;PLZ;Zusatzziffer;Gemeindename;BFS-Nr;Kantonskürzel;E;N\n\
                   Lausanne;1003;0;Lausanne;5586;VD;2538000;1152000\n";
        let index = parse_bytes(csv.as_bytes(), encoding_rs::UTF_8).unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(
            index[&1003],
            Location {
                official_name: "Lausanne".to_string(),
                canton: "VD".to_string(),
                municipality: "Lausanne".to_string(),
                coordinates: Some(Lv95Coordinates::new(2_538_000.0, 1_152_000.0)),
            }
        );
    }

    #[test]
    fn test_parse_latin1_fixture() {
        let index = parse_bytes(&fixture_csv_latin1(), LATIN1).unwrap();

        assert_eq!(index.len(), 7);
        let zurich = &index[&8001];
        assert_eq!(zurich.official_name, "Zürich");
        assert_eq!(zurich.canton, "ZH");
        assert_eq!(index[&1201].municipality, "Genève");
    }

    #[test]
    fn test_parse_utf8_fixture() {
        let index = parse_bytes(fixture_csv().as_bytes(), encoding_rs::UTF_8).unwrap();
        assert_eq!(index[&8001].official_name, "Zürich");
    }

    #[test]
    fn test_wrong_single_byte_encoding_breaks_header() {
        // UTF-8 read as latin1 never fails to decode, but garbles `ü`
        let err = parse_bytes(fixture_csv().as_bytes(), LATIN1).unwrap_err();
        assert!(matches!(err, Error::MissingColumn(COLUMN_CANTON)));
    }

    #[test]
    fn test_invalid_bytes_are_fatal() {
        let err = parse_bytes(&fixture_csv_latin1(), encoding_rs::UTF_8).unwrap_err();
        assert!(matches!(err, Error::Decoding("UTF-8")));
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_bom_is_ignored() {
        let mut bytes = "\u{feff}".as_bytes().to_vec();
        bytes.extend_from_slice(fixture_csv().as_bytes());
        let index = parse_bytes(&bytes, encoding_rs::UTF_8).unwrap();
        assert_eq!(index.len(), 7);
    }

    #[test]
    fn test_empty_file() {
        let err = parse_bytes(b"", LATIN1).unwrap_err();
        assert!(matches!(err, Error::EmptyFile));
    }

    #[test]
    fn test_header_only() {
        let index = parse_bytes(HEADER.as_bytes(), encoding_rs::UTF_8).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_missing_column() {
        let csv = "Ortschaftsname;Postleitzahl;Gemeindename;Kantonskürzel\nLausanne;1003;Lausanne;VD\n";
        let err = parse_bytes(csv.as_bytes(), encoding_rs::UTF_8).unwrap_err();
        assert!(matches!(err, Error::MissingColumn("PLZ")));
    }

    #[test]
    fn test_reordered_columns() {
        let csv = "PLZ;Kantonskürzel;Gemeindename;Ortschaftsname\n1003;VD;Lausanne;Lausanne\n";
        let index = parse_bytes(csv.as_bytes(), encoding_rs::UTF_8).unwrap();
        let location = &index[&1003];
        assert_eq!(location.official_name, "Lausanne");
        assert_eq!(location.canton, "VD");
        assert_eq!(location.coordinates, None);
    }

    #[test]
    fn test_short_row() {
        let csv = format!("{}\nLausanne;1003;0;Lausanne;5586;VD;2538000;1152000;fr\nLausanne;1004;0\n", HEADER);
        let err = parse_bytes(csv.as_bytes(), encoding_rs::UTF_8).unwrap_err();
        assert!(matches!(err, Error::MalformedRow { row: 3, .. }), "{:?}", err);
    }

    #[test]
    fn test_non_numeric_zipcode() {
        let csv = format!("{}\nLausanne;10O3;0;Lausanne;5586;VD;2538000;1152000;fr\n", HEADER);
        let err = parse_bytes(csv.as_bytes(), encoding_rs::UTF_8).unwrap_err();
        match err {
            Error::MalformedRow { row, reason } => {
                assert_eq!(row, 2);
                assert!(reason.contains("10O3"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_zipcode_keeps_last_row() {
        let csv = format!(
            "{}\nLausanne;1000;0;Lausanne;5586;VD;2538000;1152000;fr\n\
             Lausanne 25;1000;25;Lausanne;5586;VD;2540000;1155000;fr\n",
            HEADER
        );
        let index = parse_bytes(csv.as_bytes(), encoding_rs::UTF_8).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[&1000].official_name, "Lausanne 25");
    }

    #[tokio::test]
    async fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zipcodes.csv");
        std::fs::write(&path, fixture_csv_latin1()).unwrap();

        let index = parse(&path, LATIN1).await.unwrap();
        assert_eq!(index.keys().copied().collect::<Vec<_>>(), vec![1003, 1004, 1201, 2502, 3011, 8001, 8400]);
    }

    #[tokio::test]
    async fn test_parse_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse(&dir.path().join("missing.csv"), LATIN1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
