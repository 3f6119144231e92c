use std::{
    collections::HashSet,
    fs,
    io::{self, Read},
    path::Path,
};

use tsp_stages_derive::KvDisplay;

use crate::{Error, Point, Result};

/// Named points loaded from `name,lat,lng` lines, in file order.
#[derive(Clone, Debug, Default, KvDisplay)]
pub struct PointTable {
    #[kv(fmt = "len")]
    points: Vec<Point>,
}

impl PointTable {
    pub fn new(points: Vec<Point>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(points.len());
        for point in &points {
            if !seen.insert(point.name.as_str()) {
                return Err(Error::invalid_input(format!(
                    "duplicate point name: {}",
                    point.name
                )));
            }
        }
        Ok(Self { points })
    }

    /// Reads from `path`, or stdin when `None`.
    pub fn read(path: Option<&Path>) -> Result<Self> {
        let text = match path {
            Some(path) => fs::read_to_string(path).map_err(|e| {
                io::Error::new(
                    e.kind(),
                    format!("failed to read points from {}: {e}", path.display()),
                )
            })?,
            None => {
                let mut text = String::new();
                io::stdin().read_to_string(&mut text)?;
                text
            }
        };
        Self::parse(&text)
    }

    /// Parses one `name,lat,lng` per line. Blank lines, `#` comments and a
    /// `name,lat,lng` header are skipped. Names may contain commas.
    pub fn parse(input: &str) -> Result<Self> {
        let mut points = Vec::new();

        for (idx, raw) in input.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.rsplitn(3, ',');
            let lng_s = fields.next().unwrap_or_default().trim();
            let lat_s = fields
                .next()
                .ok_or_else(|| {
                    Error::invalid_input(format!(
                        "Line {line_no}: expected 'name,lat,lng' but got: {line}"
                    ))
                })?
                .trim();
            let name = fields
                .next()
                .ok_or_else(|| {
                    Error::invalid_input(format!(
                        "Line {line_no}: expected 'name,lat,lng' but got: {line}"
                    ))
                })?
                .trim();

            if is_header(lat_s) {
                continue;
            }
            if name.is_empty() {
                return Err(Error::invalid_input(format!(
                    "Line {line_no}: missing point name"
                )));
            }

            let lat: f64 = lat_s.parse().map_err(|_| {
                Error::invalid_input(format!("Line {line_no}: invalid latitude: {lat_s}"))
            })?;
            let lng: f64 = lng_s.parse().map_err(|_| {
                Error::invalid_input(format!("Line {line_no}: invalid longitude: {lng_s}"))
            })?;

            points.push(Point::new(name, lat, lng));
        }

        let table = Self::new(points)?;
        log::debug!("point_table.parse: points={}", table.len());
        Ok(table)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Point> {
        self.points.iter().find(|p| p.name == name)
    }

    /// Points named in `names`, kept in table order. An empty selection
    /// returns every point.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Point>> {
        if names.is_empty() {
            return Ok(self.points.clone());
        }

        let wanted: HashSet<&str> = names.iter().map(|n| n.as_ref().trim()).collect();
        if let Some(missing) = wanted.iter().find(|n| self.get(n).is_none()) {
            return Err(Error::invalid_input(format!("unknown point: {missing}")));
        }

        Ok(self
            .points
            .iter()
            .filter(|p| wanted.contains(p.name.as_str()))
            .cloned()
            .collect())
    }
}

fn is_header(lat: &str) -> bool {
    lat.eq_ignore_ascii_case("lat") || lat.eq_ignore_ascii_case("latitude")
}
