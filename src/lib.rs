//! # zipch
//!
//! Swiss zipcodes, cantons and municipalities.
//!
//! The data comes from swisstopo's official register of localities, published
//! as a ZIP archive holding a `;` separated CSV table. [`ZipcodesDatabase`]
//! downloads the archive when the local copy is missing, extracts the table,
//! parses it once, and answers queries from memory.
//!
//! ## Example
//!
//! ```no_run
//! use zipch::ZipcodesDatabase;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = ZipcodesDatabase::new("/tmp/zipcodes.csv")?;
//!
//!     let location = db.get_location(1003).await?;
//!     println!("{} is in {}", location.official_name, location.canton);
//!
//!     for zipcode in db.get_zipcodes_for_canton("GE").await? {
//!         println!("{}", zipcode);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod coordinates;
pub mod dataset;
pub mod database;
pub mod error;
pub mod fetch;
pub mod io;
pub mod location;

#[cfg(test)]
mod test_utils;

pub use cli::Cli;
pub use config::Config;
pub use coordinates::{Lv95Coordinates, Wgs84Coordinates, to_wgs84};
pub use database::ZipcodesDatabase;
pub use error::{Error, ErrorKind, Result};
pub use fetch::ensure_local;
pub use io::{ArchiveSource, HttpArchiveSource, LocalArchiveSource};
pub use location::{Location, LocationIndex};
