use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use crate::{Result, TourResult, io::options::OutputFormat, stage::Edge};

/// Writes `result` to `path`, or stdout when `None`.
pub fn write_result(result: &TourResult, format: OutputFormat, path: Option<&Path>) -> Result<()> {
    let rendered = render(result, format)?;

    match path {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                io::Error::new(
                    e.kind(),
                    format!("failed to create output file {}: {e}", path.display()),
                )
            })?;
            let mut out = BufWriter::new(file);
            out.write_all(rendered.as_bytes())?;
            out.flush()?;
            log::info!("output.write: format={format} path={}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            out.write_all(rendered.as_bytes())?;
            out.flush()?;
        }
    }
    Ok(())
}

pub fn render(result: &TourResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut json = result.to_json_pretty()?;
            json.push('\n');
            Ok(json)
        }
        OutputFormat::Text => Ok(render_text(result)),
    }
}

fn render_text(result: &TourResult) -> String {
    let algorithm = result.algorithm();
    let mut distance = ryu::Buffer::new();
    let mut lines = vec![
        format!("{} ({})", algorithm.title(), algorithm.short_tag()),
        format!("distance:   {}", distance.format(result.distance())),
        format!("complexity: {}", result.complexity()),
        format!("tour:       {}", result.tour().stops().join(" -> ")),
    ];

    lines.extend(result.stages().iter().map(|stage| {
        format!(
            "stage {}: primary=[{}] secondary=[{}] nodes=[{}]",
            stage.index,
            edge_list(&stage.primary),
            edge_list(&stage.secondary),
            stage.nodes.join(", ")
        )
    }));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn edge_list(edges: &[Edge]) -> String {
    edges
        .iter()
        .map(|e| format!("{}-{}", e.from, e.to))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{render, write_result};
    use crate::{Algorithm, Error, Metric, Point, TourRequest, io::options::OutputFormat, solve};

    fn square_result() -> crate::TourResult {
        let points = vec![
            Point::new("A", 0.0, 0.0),
            Point::new("B", 0.0, 1.0),
            Point::new("C", 1.0, 1.0),
            Point::new("D", 1.0, 0.0),
        ];
        let request = TourRequest::default()
            .with_algorithm(Algorithm::Christofides)
            .with_metric(Metric::Euclidean);
        solve(&points, &request).expect("solve")
    }

    #[test]
    fn json_output_round_trips_through_serde_json() {
        let json = render(&square_result(), OutputFormat::Json).expect("render");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["algorithm"], "christofides");
        assert_eq!(value["distance"], 4.0);
        assert_eq!(value["tour"], serde_json::json!(["A", "B", "C", "D", "A"]));
        assert_eq!(value["stages"].as_array().map(Vec::len), Some(5));
        assert_eq!(value["stages"][2]["primary"], serde_json::json!([["C", "D"]]));
        assert!(json.ends_with('\n'));
    }

    #[test]
    fn text_output_lists_header_and_stages() {
        let text = render(&square_result(), OutputFormat::Text).expect("render");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Christofides (CA)");
        assert_eq!(lines[1], "distance:   4.0");
        assert_eq!(lines[3], "tour:       A -> B -> C -> D -> A");
        assert_eq!(lines.len(), 4 + 5);
        assert_eq!(
            lines[6],
            "stage 2: primary=[C-D] secondary=[A-B, B-C, A-D] nodes=[]"
        );
    }

    #[test]
    fn unwritable_output_path_is_an_io_error() {
        let path = Path::new("/nonexistent-tsp-stages-dir/route.json");
        let err = write_result(&square_result(), OutputFormat::Json, Some(path))
            .expect_err("missing directory");

        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("failed to create output file"));
    }
}
