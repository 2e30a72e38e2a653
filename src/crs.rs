use std::fmt;
use std::str::FromStr;

use geojson::JsonObject;
use serde_json::{json, Value as JsonValue};

use crate::error::PipelineError;

/// A coordinate reference system identified by authority and code, e.g. `EPSG:27700`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Crs {
    authority: String,
    code: String,
}

impl Crs {
    pub fn epsg(code: u32) -> Self {
        Crs {
            authority: "EPSG".to_string(),
            code: code.to_string(),
        }
    }

    /// Geographic WGS 84, longitude/latitude in degrees.
    pub fn wgs84() -> Self {
        Crs::epsg(4326)
    }

    /// British National Grid, easting/northing in metres.
    pub fn british_national_grid() -> Self {
        Crs::epsg(27700)
    }

    pub fn to_urn(&self) -> String {
        format!("urn:ogc:def:crs:{}::{}", self.authority, self.code)
    }

    /// Reads a legacy `"crs": {"type": "name", ...}` member.
    pub fn from_geojson_member(member: &JsonValue) -> Result<Self, PipelineError> {
        member
            .get("properties")
            .and_then(|props| props.get("name"))
            .and_then(JsonValue::as_str)
            .ok_or_else(|| PipelineError::Schema(format!("unsupported crs member: {}", member)))?
            .parse()
    }

    pub fn to_geojson_member(&self) -> JsonValue {
        json!({
            "type": "name",
            "properties": { "name": self.to_urn() }
        })
    }

    /// Foreign members to attach to a FeatureCollection in this CRS.
    /// WGS 84 is the GeoJSON default and gets no member.
    pub fn foreign_members(&self) -> Option<JsonObject> {
        if *self == Crs::wgs84() {
            return None;
        }
        let mut members = JsonObject::new();
        members.insert("crs".to_string(), self.to_geojson_member());
        Some(members)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.authority, self.code)
    }
}

impl FromStr for Crs {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();

        // CRS84 is WGS 84 with longitude first, which is how EPSG:4326 is handled here
        if upper == "OGC:CRS84" || upper == "CRS84" || upper.ends_with(":OGC:1.3:CRS84") {
            return Ok(Crs::wgs84());
        }

        let parts: Vec<&str> = if let Some(rest) = upper.strip_prefix("URN:OGC:DEF:CRS:") {
            // urn:ogc:def:crs:AUTHORITY:[VERSION]:CODE
            let fields: Vec<&str> = rest.split(':').collect();
            match fields.as_slice() {
                [authority, _version, code] => vec![*authority, *code],
                _ => Vec::new(),
            }
        } else {
            upper.split(':').collect()
        };

        match parts.as_slice() {
            [authority, code] if !authority.is_empty() && !code.is_empty() => Ok(Crs {
                authority: authority.to_string(),
                code: code.to_string(),
            }),
            _ => Err(PipelineError::Schema(format!("unrecognised CRS identifier `{}`", trimmed))),
        }
    }
}
