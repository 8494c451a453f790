//! Swiss LV95 to WGS84 conversion.
//!
//! Uses swisstopo's approximate closed-form formulas, accurate to about a
//! metre across Switzerland. That is below the precision of the register's
//! coordinates, which only locate "some point" inside the locality.

use std::fmt;

/// Position in the Swiss LV95 (CH1903+) planar system, in metres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lv95Coordinates {
    pub east: f64,
    pub north: f64,
}

/// Geographic position, in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wgs84Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Lv95Coordinates {
    pub fn new(east: f64, north: f64) -> Self {
        Self { east, north }
    }

    pub fn to_wgs84(self) -> Wgs84Coordinates {
        to_wgs84(self)
    }
}

impl fmt::Display for Wgs84Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

pub fn to_wgs84(coordinates: Lv95Coordinates) -> Wgs84Coordinates {
    // Auxiliary values, in units of 1000 km from the Bern origin
    let y = (coordinates.east - 2_600_000.0) / 1_000_000.0;
    let x = (coordinates.north - 1_200_000.0) / 1_000_000.0;

    // Results in units of 10000"
    let lambda = 2.6779094 + 4.728982 * y + 0.791484 * y * x + 0.1306 * y * x * x
        - 0.0436 * y * y * y;
    let phi = 16.9023892 + 3.238272 * x
        - 0.270978 * y * y
        - 0.002528 * x * x
        - 0.0447 * y * y * x
        - 0.0140 * x * x * x;

    Wgs84Coordinates {
        longitude: lambda * 100.0 / 36.0,
        latitude: phi * 100.0 / 36.0,
    }
}
