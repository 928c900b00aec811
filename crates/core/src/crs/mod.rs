//! Coordinate reference system tag
//!
//! Nothing here reprojects. The CRS rides along from an input band to every
//! output band so rebuilt rasters stay georeferenced.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An EPSG code, a WKT definition, or neither
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    epsg: Option<u32>,
    wkt: Option<String>,
}

impl CRS {
    pub fn from_epsg(code: u32) -> Self {
        Self {
            epsg: Some(code),
            wkt: None,
        }
    }

    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            epsg: None,
            wkt: Some(wkt.into()),
        }
    }

    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }
}

/// `EPSG:<code>`, or the first 50 characters of the WKT
impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.epsg {
            return write!(f, "EPSG:{}", code);
        }
        match self.wkt() {
            Some(wkt) => write!(f, "WKT:{}", wkt.chars().take(50).collect::<String>()),
            None => f.write_str("Unknown"),
        }
    }
}
