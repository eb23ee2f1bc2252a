//! Geographic coordinates for the store map.

use core::fmt;

/// Errors that can occur when building [`Coordinates`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CoordinateError {
    /// A field could not be parsed as a number.
    #[error("{field} is not a number: {value:?}")]
    NotANumber {
        /// Which field failed (`lat` or `lon`).
        field: &'static str,
        /// The rejected input.
        value: String,
    },
    /// Latitude outside [-90, 90] or not finite.
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    /// Longitude outside [-180, 180] or not finite.
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A validated latitude/longitude pair in decimal degrees.
///
/// ## Constraints
///
/// - Latitude in [-90, 90]
/// - Longitude in [-180, 180]
/// - Both finite
///
/// ## Examples
///
/// ```
/// use myshop_core::Coordinates;
///
/// assert!(Coordinates::new(28.0, -106.0).is_ok());
/// assert!(Coordinates::new(95.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    lat: f64,
    lon: f64,
}

impl Coordinates {
    /// Store location shown when no valid input is given (Chihuahua, Mexico).
    pub const DEFAULT: Self = Self {
        lat: 28.640_832_5,
        lon: -106.148_590_2,
    };

    /// Build coordinates, validating both ranges.
    ///
    /// # Errors
    ///
    /// Returns an error if either value is out of range or not finite.
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::LongitudeOutOfRange(lon));
        }
        Ok(Self { lat, lon })
    }

    /// Parse coordinates from raw form input.
    ///
    /// A missing field takes the matching component of [`Coordinates::DEFAULT`].
    ///
    /// # Errors
    ///
    /// Returns an error if a present field is not a number, or the resulting
    /// pair is out of range.
    pub fn parse(lat: Option<&str>, lon: Option<&str>) -> Result<Self, CoordinateError> {
        let lat = parse_component("lat", lat, Self::DEFAULT.lat)?;
        let lon = parse_component("lon", lon, Self::DEFAULT.lon)?;
        Self::new(lat, lon)
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn lon(&self) -> f64 {
        self.lon
    }
}

impl Default for Coordinates {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.lat, self.lon)
    }
}

fn parse_component(
    field: &'static str,
    raw: Option<&str>,
    default: f64,
) -> Result<f64, CoordinateError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    raw.trim()
        .parse::<f64>()
        .map_err(|_| CoordinateError::NotANumber {
            field,
            value: raw.to_owned(),
        })
}
