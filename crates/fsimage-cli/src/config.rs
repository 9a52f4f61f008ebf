//! Command-line and environment configuration.

use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;

use fsimage_error::{FsImageError, Result};

/// Input path when no positional argument is given.
pub const ENV_INPUT: &str = "FSIMAGE_PATH";
/// Output path when neither `-o` nor a second positional is given.
pub const ENV_OUTPUT: &str = "FSIMAGE_OUTPUT";
/// Log filter when `--log-level` is absent.
pub const ENV_LOG: &str = "FSIMAGE_LOG";
/// Output path spelling for standard output.
pub const STDOUT_PATH: &str = "-";
/// Filter used when nothing else is configured.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Row serialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Header line plus tab-separated rows.
    #[default]
    Tsv,
    /// One JSON object per line.
    JsonLines,
}

impl FromStr for OutputFormat {
    type Err = FsImageError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "tsv" => Ok(Self::Tsv),
            "jsonl" | "json-lines" | "ndjson" => Ok(Self::JsonLines),
            _ => Err(FsImageError::invalid_argument(format!(
                "unknown format `{value}`; expected `tsv` or `jsonl`"
            ))),
        }
    }
}

/// Parsed command line, before environment fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub summary: bool,
    pub parallel: bool,
    pub log_level: Option<String>,
    pub show_help: bool,
}

/// Fully resolved run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input: PathBuf,
    /// `None` writes to standard output.
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub summary: bool,
    pub parallel: bool,
    pub log_filter: String,
}

impl Config {
    /// Apply environment fallbacks to `options`.
    ///
    /// Command-line values always win over the environment.
    pub fn resolve<F>(options: CliOptions, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| env(key).filter(|value| !value.is_empty());
        let input = options
            .input
            .or_else(|| non_empty(ENV_INPUT).map(PathBuf::from))
            .ok_or_else(|| {
                FsImageError::invalid_argument(format!(
                    "missing FSIMAGE path (pass it as an argument or set {ENV_INPUT})"
                ))
            })?;
        let output = options
            .output
            .or_else(|| non_empty(ENV_OUTPUT).map(PathBuf::from))
            .filter(|path| path.as_os_str() != STDOUT_PATH);
        let log_filter = options
            .log_level
            .or_else(|| non_empty(ENV_LOG))
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned());
        Ok(Self {
            input,
            output,
            format: options.format,
            summary: options.summary,
            parallel: options.parallel,
            log_filter,
        })
    }
}

pub fn parse_args<I>(args: I) -> Result<CliOptions>
where
    I: IntoIterator<Item = OsString>,
{
    let mut iter = args.into_iter();
    let _argv0 = iter.next();

    let mut options = CliOptions::default();
    let mut positionals: Vec<PathBuf> = Vec::new();

    while let Some(argument) = iter.next() {
        let arg = argument.to_string_lossy();
        let arg_str = arg.as_ref();

        match arg_str {
            "-h" | "--help" => options.show_help = true,
            "--summary" => options.summary = true,
            "--parallel" => options.parallel = true,
            "-o" | "--output" => {
                let next = iter
                    .next()
                    .ok_or_else(|| FsImageError::invalid_argument("missing path argument for `-o/--output`"))?;
                set_output(&mut options, PathBuf::from(next))?;
            }
            "--format" => {
                let next = iter
                    .next()
                    .ok_or_else(|| FsImageError::invalid_argument("missing value for `--format`"))?;
                options.format = next.to_string_lossy().parse()?;
            }
            "--log-level" => {
                let next = iter
                    .next()
                    .ok_or_else(|| FsImageError::invalid_argument("missing filter for `--log-level`"))?;
                options.log_level = Some(next.to_string_lossy().into_owned());
            }
            _ => {
                if let Some(value) = arg_str.strip_prefix("--output=") {
                    set_output(&mut options, PathBuf::from(value))?;
                    continue;
                }
                if let Some(value) = arg_str.strip_prefix("--format=") {
                    options.format = value.parse()?;
                    continue;
                }
                if let Some(value) = arg_str.strip_prefix("--log-level=") {
                    options.log_level = Some(value.to_owned());
                    continue;
                }
                if arg_str.starts_with('-') && arg_str != STDOUT_PATH {
                    return Err(FsImageError::invalid_argument(format!(
                        "unknown option `{arg_str}`"
                    )));
                }
                positionals.push(PathBuf::from(argument));
            }
        }
    }

    let mut positionals = positionals.into_iter();
    options.input = positionals.next();
    if let Some(output) = positionals.next() {
        set_output(&mut options, output)?;
    }
    if positionals.next().is_some() {
        return Err(FsImageError::invalid_argument(
            "too many positional arguments; expected FSIMAGE [OUTPUT]",
        ));
    }
    Ok(options)
}

fn set_output(options: &mut CliOptions, path: PathBuf) -> Result<()> {
    if options.output.is_some() {
        return Err(FsImageError::invalid_argument(
            "output path may only be provided once",
        ));
    }
    options.output = Some(path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn parse_from(args: &[&str]) -> Result<CliOptions> {
        let os_args: Vec<OsString> = args.iter().map(OsString::from).collect();
        parse_args(os_args)
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_defaults() {
        let options = parse_from(&["fsimage-export"]).unwrap();
        assert_eq!(options, CliOptions::default());
        assert_eq!(options.format, OutputFormat::Tsv);
    }

    #[test]
    fn test_parse_input_and_output_positionals() {
        let options = parse_from(&["fsimage-export", "fsimage_0001", "out.tsv"]).unwrap();
        assert_eq!(options.input, Some(PathBuf::from("fsimage_0001")));
        assert_eq!(options.output, Some(PathBuf::from("out.tsv")));
    }

    #[test]
    fn test_parse_flags() {
        let options = parse_from(&[
            "fsimage-export",
            "--format=jsonl",
            "--parallel",
            "--summary",
            "--log-level",
            "debug",
            "-o",
            "rows.jsonl",
            "img",
        ])
        .unwrap();
        assert_eq!(options.format, OutputFormat::JsonLines);
        assert!(options.parallel);
        assert!(options.summary);
        assert_eq!(options.log_level.as_deref(), Some("debug"));
        assert_eq!(options.output, Some(PathBuf::from("rows.jsonl")));
        assert_eq!(options.input, Some(PathBuf::from("img")));
    }

    #[test]
    fn test_parse_output_twice_fails() {
        let err = parse_from(&["fsimage-export", "-o", "a", "img", "b"]).unwrap_err();
        assert!(err.to_string().contains("only be provided once"));
    }

    #[test]
    fn test_parse_unknown_option_fails() {
        let err = parse_from(&["fsimage-export", "--frobnicate"]).unwrap_err();
        assert!(err.to_string().contains("unknown option"));
    }

    #[test]
    fn test_parse_bad_format_fails() {
        let err = parse_from(&["fsimage-export", "--format", "csv"]).unwrap_err();
        assert!(err.to_string().contains("unknown format"));
    }

    #[test]
    fn test_parse_errors_are_usage_errors() {
        let err = parse_from(&["fsimage-export", "--frobnicate"]).unwrap_err();
        assert!(matches!(err, FsImageError::InvalidArgument(_)));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.suggestion(), Some("Run with --help for usage"));
    }

    #[test]
    fn test_parse_too_many_positionals() {
        assert!(parse_from(&["fsimage-export", "a", "b", "c"]).is_err());
    }

    #[test]
    fn test_parse_missing_option_value() {
        assert!(parse_from(&["fsimage-export", "--output"]).is_err());
        assert!(parse_from(&["fsimage-export", "--log-level"]).is_err());
    }

    #[test]
    fn test_resolve_uses_env_fallbacks() {
        let env = env_from(&[
            (ENV_INPUT, "/data/fsimage"),
            (ENV_OUTPUT, "/tmp/out.tsv"),
            (ENV_LOG, "info"),
        ]);
        let config = Config::resolve(CliOptions::default(), env).unwrap();
        assert_eq!(config.input, PathBuf::from("/data/fsimage"));
        assert_eq!(config.output, Some(PathBuf::from("/tmp/out.tsv")));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_resolve_arguments_beat_env() {
        let env = env_from(&[(ENV_INPUT, "/env/image"), (ENV_LOG, "info")]);
        let options = parse_from(&["fsimage-export", "--log-level=trace", "cli-image"]).unwrap();
        let config = Config::resolve(options, env).unwrap();
        assert_eq!(config.input, PathBuf::from("cli-image"));
        assert_eq!(config.output, None);
        assert_eq!(config.log_filter, "trace");
    }

    #[test]
    fn test_resolve_requires_input() {
        let err = Config::resolve(CliOptions::default(), env_from(&[])).unwrap_err();
        assert!(err.to_string().contains(ENV_INPUT));
        let err = Config::resolve(CliOptions::default(), env_from(&[(ENV_INPUT, "")])).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_resolve_dash_is_stdout() {
        let options = parse_from(&["fsimage-export", "img", "-"]).unwrap();
        let config = Config::resolve(options, env_from(&[])).unwrap();
        assert_eq!(config.output, None);
    }

    #[test]
    fn test_resolve_default_log_filter() {
        let env = env_from(&[(ENV_INPUT, "img")]);
        let config = Config::resolve(CliOptions::default(), env).unwrap();
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }
}
