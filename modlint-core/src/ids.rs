//! Strongly-typed identifiers for module data.
//!
//! Area IDs and location IDs overlap in the source data (a plot point's
//! `location` field holds an *area* ID), so both are distinct newtypes
//! validated against their exact shape at construction. Misusing one for
//! the other is a type error, not a runtime surprise.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

lazy_static! {
    static ref LOCATION_ID_RE: Regex = Regex::new(r"^[A-Z]{1,3}[0-9]{2}$").unwrap();
    static ref AREA_ID_RE: Regex = Regex::new(r"^[A-Z]{3,}[0-9]{3}$").unwrap();
    static ref COORDINATES_RE: Regex = Regex::new(r"^X([0-9]+)Y([0-9]+)$").unwrap();
    static ref DC_CHECK_RE: Regex = Regex::new(r"^([A-Z][a-z]+) DC ([0-9]+): (.+)$").unwrap();
}

/// Error type for identifier and pattern parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("invalid location ID {0:?} (expected e.g. \"A01\" or \"HFG12\")")]
    InvalidLocationId(String),
    #[error("invalid area ID {0:?} (expected e.g. \"HFG001\")")]
    InvalidAreaId(String),
    #[error("invalid coordinates {0:?} (expected e.g. \"X3Y7\")")]
    InvalidCoordinates(String),
    #[error("invalid DC check {0:?} (expected e.g. \"Perception DC 15: ...\")")]
    InvalidDcCheck(String),
}

/// Identifier of a single navigable location, e.g. `A01` or `HFG12`.
///
/// Shape: one to three uppercase letters followed by exactly two digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocationId(String);

impl LocationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a raw string has the location-ID shape.
    pub fn matches(s: &str) -> bool {
        LOCATION_ID_RE.is_match(s)
    }
}

impl FromStr for LocationId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::matches(s) {
            Ok(LocationId(s.to_string()))
        } else {
            Err(IdError::InvalidLocationId(s.to_string()))
        }
    }
}

impl TryFrom<String> for LocationId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<LocationId> for String {
    fn from(id: LocationId) -> String {
        id.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an area (a zone containing locations), e.g. `HFG001`.
///
/// Shape: three or more uppercase letters followed by exactly three digits.
/// The digit count alone distinguishes it from [`LocationId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AreaId(String);

impl AreaId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a raw string has the area-ID shape.
    pub fn matches(s: &str) -> bool {
        AREA_ID_RE.is_match(s)
    }
}

impl FromStr for AreaId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::matches(s) {
            Ok(AreaId(s.to_string()))
        } else {
            Err(IdError::InvalidAreaId(s.to_string()))
        }
    }
}

impl TryFrom<String> for AreaId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AreaId> for String {
    fn from(id: AreaId) -> String {
        id.0
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Classification of a raw identifier string by shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdClass {
    Location,
    Area,
    Neither,
}

/// Classify a raw string as a location ID, an area ID, or neither.
///
/// The two shapes are disjoint (two trailing digits vs. three), so this is
/// a total classification, used by the wrong-ID-type connectivity rule.
pub fn classify_id(s: &str) -> IdClass {
    if LocationId::matches(s) {
        IdClass::Location
    } else if AreaId::matches(s) {
        IdClass::Area
    } else {
        IdClass::Neither
    }
}

/// Grid coordinates of a location, persisted as `X<int>Y<int>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Coordinates {
    pub x: u32,
    pub y: u32,
}

impl FromStr for Coordinates {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = COORDINATES_RE
            .captures(s)
            .ok_or_else(|| IdError::InvalidCoordinates(s.to_string()))?;
        let x = caps[1]
            .parse()
            .map_err(|_| IdError::InvalidCoordinates(s.to_string()))?;
        let y = caps[2]
            .parse()
            .map_err(|_| IdError::InvalidCoordinates(s.to_string()))?;
        Ok(Coordinates { x, y })
    }
}

impl TryFrom<String> for Coordinates {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Coordinates> for String {
    fn from(c: Coordinates) -> String {
        c.to_string()
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X{}Y{}", self.x, self.y)
    }
}

/// A skill check attached to a location, persisted as
/// `<Skill> DC <number>: <description>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DcCheck {
    pub skill: String,
    pub dc: u32,
    pub description: String,
}

impl FromStr for DcCheck {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = DC_CHECK_RE
            .captures(s)
            .ok_or_else(|| IdError::InvalidDcCheck(s.to_string()))?;
        let dc = caps[2]
            .parse()
            .map_err(|_| IdError::InvalidDcCheck(s.to_string()))?;
        Ok(DcCheck {
            skill: caps[1].to_string(),
            dc,
            description: caps[3].to_string(),
        })
    }
}

impl TryFrom<String> for DcCheck {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DcCheck> for String {
    fn from(c: DcCheck) -> String {
        c.to_string()
    }
}

impl fmt::Display for DcCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} DC {}: {}", self.skill, self.dc, self.description)
    }
}
