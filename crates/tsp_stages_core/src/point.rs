use std::fmt;

use serde::Serialize;

const NINETY: f64 = 90.0;
const ONE_EIGHTY: f64 = NINETY * 2.0;

/// Named location. Latitude and longitude are in degrees for geographic
/// input; under the planar metric they are read as plain `y/x` values.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Point {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl Point {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    pub fn is_geographic(&self) -> bool {
        self.is_finite()
            && (-NINETY..=NINETY).contains(&self.lat)
            && (-ONE_EIGHTY..=ONE_EIGHTY).contains(&self.lng)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut b1 = ryu::Buffer::new();
        let mut b2 = ryu::Buffer::new();
        write!(
            f,
            "{},{},{}",
            self.name,
            b1.format(self.lat),
            b2.format(self.lng)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Point;

    #[test]
    fn geographic_bounds_are_inclusive() {
        assert!(Point::new("sw", -90.0, -180.0).is_geographic());
        assert!(Point::new("ne", 90.0, 180.0).is_geographic());
    }

    #[test]
    fn out_of_range_or_non_finite_values_are_rejected() {
        assert!(!Point::new("a", 91.0, 0.0).is_geographic());
        assert!(!Point::new("b", 0.0, 181.0).is_geographic());
        assert!(!Point::new("c", f64::NAN, 0.0).is_finite());
        assert!(!Point::new("d", 0.0, f64::INFINITY).is_finite());
    }

    #[test]
    fn planar_values_outside_geographic_range_are_still_finite() {
        let p = Point::new("far", 500.0, -900.0);
        assert!(p.is_finite());
        assert!(!p.is_geographic());
    }

    #[test]
    fn display_formats_as_name_lat_lng() {
        let point = Point::new("Lyon", 45.75, 4.85);
        assert_eq!(point.to_string(), "Lyon,45.75,4.85");
    }
}
