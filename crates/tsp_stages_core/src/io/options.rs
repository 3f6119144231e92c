use std::{env, path::Path};

use log::LevelFilter;
use tsp_stages_derive::{CliOptions, CliValue, KvDisplay};

use crate::{Algorithm, Error, Metric, Result, TourRequest, solver::DEFAULT_SHORT_TOUR_PASSES};

/// Command-line options for one `tsp-stages` run.
#[derive(Clone, Debug, CliOptions, KvDisplay)]
pub struct RunOptions {
    /// Tour construction algorithm.
    #[cli(long = "algorithm", alias = "algo", parse_with = "Algorithm::parse")]
    pub algorithm: Algorithm,
    /// Nearest-neighbor start point. Empty means the first point.
    #[cli(long = "start")]
    #[kv(fmt = "or_dash")]
    pub start: String,
    /// `;`-separated point names to solve over. Empty means all points.
    #[cli(long = "select")]
    #[kv(fmt = "or_dash")]
    pub select: String,
    /// Distance metric.
    #[cli(long = "metric", parse_with = "Metric::parse")]
    pub metric: Metric,
    /// Upper bound on 2-opt passes after the greedy short tour.
    #[cli(long = "short-tour-passes")]
    pub short_tour_passes: usize,
    /// Result format written to the output.
    #[cli(long = "format", parse_with = "OutputFormat::parse")]
    pub format: OutputFormat,
    /// Structured logging level.
    #[cli(long = "log-level", parse_with = "LogLevel::parse")]
    pub log_level: LogLevel,
    /// Logging output format.
    #[cli(long = "log-format", parse_with = "LogFormat::parse")]
    pub log_format: LogFormat,
    /// Include timestamps in log lines.
    pub log_timestamp: bool,
    /// Optional output file path for logs. Empty means stderr.
    #[cli(long = "log-output")]
    #[kv(fmt = "or_dash")]
    pub log_output: String,
    /// Optional input file path for points. Empty means stdin.
    #[cli(long = "input")]
    #[kv(fmt = "or_dash")]
    pub input: String,
    /// Optional output file path for the result. Empty means stdout.
    #[cli(long = "output")]
    #[kv(fmt = "or_dash")]
    pub output: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, CliValue)]
#[cli_value(option = "log-level")]
pub enum LogLevel {
    Error,
    #[cli(alias = "warning")]
    Warn,
    Info,
    Debug,
    Trace,
    Off,
}

impl LogLevel {
    pub fn to_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
            Self::Off => LevelFilter::Off,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, CliValue)]
#[cli_value(option = "log-format")]
pub enum LogFormat {
    Compact,
    Pretty,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, CliValue)]
#[cli_value(option = "format")]
pub enum OutputFormat {
    Json,
    Text,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::NearestNeighbor,
            start: String::new(),
            select: String::new(),
            metric: Metric::Haversine,
            short_tour_passes: DEFAULT_SHORT_TOUR_PASSES,
            format: OutputFormat::Json,
            log_level: LogLevel::Warn,
            log_format: LogFormat::Compact,
            log_timestamp: true,
            log_output: String::new(),
            input: String::new(),
            output: String::new(),
        }
    }
}

impl RunOptions {
    pub fn from_args() -> Result<Self> {
        Self::parse_from_iter(env::args().skip(1))
    }

    fn parse_from_iter<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Self::default();
        let mut args = args
            .into_iter()
            .map(|arg| arg.as_ref().to_owned())
            .peekable();

        while let Some(arg) = args.next() {
            if arg == "--help" || arg == "-h" {
                return Err(Error::invalid_input(Self::usage()));
            }

            let Some(raw_name) = arg.strip_prefix("--") else {
                return Err(Error::invalid_input(format!(
                    "Unexpected argument: {arg}\n\n{}",
                    Self::usage()
                )));
            };

            if raw_name.is_empty() {
                return Err(Error::invalid_input(format!(
                    "Invalid option name: {arg}\n\n{}",
                    Self::usage()
                )));
            }

            let (name, value) = Self::split_arg(raw_name, &mut args);

            if options.apply_cli_option(&name, value.clone())? {
                continue;
            }

            match name.as_str() {
                "log-timestamp" => {
                    options.log_timestamp = match value {
                        Some(v) => parse_bool(&name, &v)?,
                        None => true,
                    };
                }
                "no-log-timestamp" => {
                    if value.is_some() {
                        return Err(Error::invalid_input(format!(
                            "Flag --{name} does not take a value"
                        )));
                    }
                    options.log_timestamp = false;
                }
                _ => {
                    return Err(Error::invalid_input(format!(
                        "Unknown option: --{name}\n\n{}",
                        Self::usage()
                    )));
                }
            }
        }

        Ok(options)
    }

    pub fn usage() -> &'static str {
        concat!(
            "Usage:\n",
            "  tsp-stages [options] [--input points.csv]\n",
            "  tsp-stages [options] < points.csv\n\n",
            "Input lines are 'name,lat,lng'; '#' starts a comment.\n\n",
            "Options:\n",
            "  --algorithm <nearest-neighbor|christofides|short-tour>  (also nn|ca|cc)\n",
            "  --start <name>\n",
            "  --select <name[;name...]>\n",
            "  --metric <haversine|euclidean>\n",
            "  --short-tour-passes <usize>\n",
            "  --format <json|text>\n",
            "  --log-level <error|warn|info|debug|trace|off>\n",
            "  --log-format <compact|pretty>\n",
            "  --log-timestamp[=<bool>]\n",
            "  --no-log-timestamp\n",
            "  --log-output <path>\n",
            "  --input <path>\n",
            "  --output <path>\n",
            "  --help\n",
            "\n",
            "Examples:\n",
            "  tsp-stages --algorithm christofides --input cities.csv\n",
            "  tsp-stages --algorithm=nn --start=Paris --format=text < cities.csv\n",
            "  tsp-stages --metric=euclidean --select='A;B;C;D' --output route.json < grid.csv\n",
            "  tsp-stages --algorithm=cc --log-level=debug --log-format=pretty < cities.csv\n",
        )
    }

    /// The solver request these options describe.
    pub fn request(&self) -> TourRequest {
        let request = TourRequest::new(self.algorithm, self.metric, self.short_tour_passes);
        match self.start.trim() {
            "" => request,
            start => request.with_start(start.to_string()),
        }
    }

    /// Names from `--select`, in the order given.
    pub fn selection(&self) -> Vec<&str> {
        self.select
            .split(';')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }

    pub fn log_output_path(&self) -> Option<&Path> {
        optional_path(&self.log_output)
    }

    pub fn output_path(&self) -> Option<&Path> {
        optional_path(&self.output)
    }

    pub fn input_path(&self) -> Option<&Path> {
        optional_path(&self.input)
    }
}

/// Empty and `-` mean the standard stream.
fn optional_path(raw: &str) -> Option<&Path> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "-" {
        None
    } else {
        Some(Path::new(raw))
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value {
        "1" | "true" | "TRUE" | "True" | "yes" | "YES" | "on" | "ON" => Ok(true),
        "0" | "false" | "FALSE" | "False" | "no" | "NO" | "off" | "OFF" => Ok(false),
        _ => Err(Error::invalid_input(format!(
            "Invalid boolean for --{name}: {value} (expected true/false)"
        ))),
    }
}
