use std::path::PathBuf;

use crate::error::DispatchError;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CITY_CENTER: (f64, f64) = (40.7128, -74.0060);

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Cli {
        cases_path: PathBuf,
        hospitals_path: PathBuf,
        output_path: PathBuf,
    },
    Web {
        port: u16,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub mode: Mode,
    /// Fallback coordinates for reports that arrive without a location
    pub city_center: (f64, f64),
}

impl Config {
    /// Reads the process arguments and environment.
    pub fn from_env() -> Result<Self, DispatchError> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::from_parts(&args, |key| std::env::var(key).ok())
    }

    /// Builds a config from arguments (without the program name) and an env lookup.
    pub fn from_parts<F>(args: &[String], env: F) -> Result<Self, DispatchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let city_center = (
            env_f64(&env, "DISPATCH_CITY_LAT")?.unwrap_or(DEFAULT_CITY_CENTER.0),
            env_f64(&env, "DISPATCH_CITY_LON")?.unwrap_or(DEFAULT_CITY_CENTER.1),
        );

        let mode = if args.first().map(String::as_str) == Some("web") {
            let env_port = env("DISPATCH_PORT");
            let port = match args.get(1).or(env_port.as_ref()) {
                Some(p) => p
                    .parse::<u16>()
                    .map_err(|_| DispatchError::Config(format!("Invalid port: {}", p)))?,
                None => DEFAULT_PORT,
            };
            Mode::Web { port }
        } else {
            Mode::Cli {
                cases_path: flag_value(args, "--cases").unwrap_or_else(|| "data/cases.csv".into()),
                hospitals_path: flag_value(args, "--hospitals")
                    .unwrap_or_else(|| "data/hospitals.csv".into()),
                output_path: flag_value(args, "--output").unwrap_or_else(|| "assignments.txt".into()),
            }
        };

        Ok(Config { mode, city_center })
    }
}

fn flag_value(args: &[String], flag: &str) -> Option<PathBuf> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
}

fn env_f64<F>(env: &F, key: &str) -> Result<Option<f64>, DispatchError>
where
    F: Fn(&str) -> Option<String>,
{
    match env(key) {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(DispatchError::Config(format!("{} must be a number, got {:?}", key, raw))),
        },
    }
}
