use std::collections::BTreeMap;
use std::fmt;

use crate::coordinates::{Lv95Coordinates, Wgs84Coordinates};

/// A locality of the register. The zipcode is the key in [`LocationIndex`],
/// not part of the record.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub official_name: String,
    /// Two letter canton abbreviation, e.g. `VD`
    pub canton: String,
    /// Main municipality the locality belongs to
    pub municipality: String,
    /// Some point within the locality's perimeter
    pub coordinates: Option<Lv95Coordinates>,
}

impl Location {
    pub fn wgs84(&self) -> Option<Wgs84Coordinates> {
        self.coordinates.map(Lv95Coordinates::to_wgs84)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {})",
            self.official_name, self.municipality, self.canton
        )
    }
}

/// Zipcode to locality mapping, iterated in ascending zipcode order
pub type LocationIndex = BTreeMap<u32, Location>;
