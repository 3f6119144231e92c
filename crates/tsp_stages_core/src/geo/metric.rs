use serde::Serialize;
use tsp_stages_derive::CliValue;

use crate::point::Point;

/// Mean Earth radius in kilometres.
const R_KM: f64 = 6_371.0;

/// How the distance between two points is measured.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, CliValue)]
#[serde(rename_all = "kebab-case")]
#[cli_value(option = "metric")]
pub enum Metric {
    /// Great-circle distance in kilometres (haversine).
    #[default]
    #[cli(alias = "great-circle", alias = "geo")]
    Haversine,
    /// Planar distance over the raw `lat/lng` values.
    #[cli(alias = "planar")]
    Euclidean,
}

impl Metric {
    pub fn distance(self, a: &Point, b: &Point) -> f64 {
        match self {
            Self::Haversine => haversine_km(a, b),
            Self::Euclidean => euclidean(a, b),
        }
    }

    pub(crate) fn accepts(self, point: &Point) -> bool {
        match self {
            Self::Haversine => point.is_geographic(),
            Self::Euclidean => point.is_finite(),
        }
    }
}

pub(crate) fn haversine_km(a: &Point, b: &Point) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();
    let s1 = (dlat / 2.0).sin();
    let s2 = (dlng / 2.0).sin();
    let h = s1 * s1 + lat1.cos() * lat2.cos() * s2 * s2;
    2.0 * R_KM * h.sqrt().min(1.0).asin()
}

#[inline]
pub(crate) fn euclidean(a: &Point, b: &Point) -> f64 {
    (a.lat - b.lat).hypot(a.lng - b.lng)
}
