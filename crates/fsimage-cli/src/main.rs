//! `fsimage-export`: print every inode of an HDFS fsimage as one row.

mod config;
mod logging;
mod output;

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Write};

use fsimage_core::{DecodeOptions, FsImage};
use fsimage_error::FsImageError;
use tracing::info;

use crate::config::{Config, ENV_INPUT, ENV_LOG, ENV_OUTPUT, parse_args};

fn main() {
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr();

    let exit_code = run(
        std::env::args_os(),
        |key| std::env::var(key).ok(),
        &mut stdout,
        &mut stderr,
    );
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run<I, F, W, E>(args: I, env: F, out: &mut W, err: &mut E) -> i32
where
    I: IntoIterator<Item = OsString>,
    F: Fn(&str) -> Option<String>,
    W: Write,
    E: Write,
{
    let options = match parse_args(args) {
        Ok(options) => options,
        Err(error) => return usage_error(&error, err),
    };

    if options.show_help {
        let _ = write_usage(out);
        return 0;
    }

    let config = match Config::resolve(options, env) {
        Ok(config) => config,
        Err(error) => return usage_error(&error, err),
    };

    if let Err(error) = logging::init(&config.log_filter) {
        return report(&error, err);
    }

    let image = match FsImage::open_path(
        &config.input,
        DecodeOptions::default().parallel(config.parallel),
    ) {
        Ok(image) => image,
        Err(error) => return report(&error, err),
    };

    let result = match &config.output {
        Some(path) => match File::create(path) {
            Ok(file) => {
                let mut writer = BufWriter::new(file);
                export(&image, &config, &mut writer).and_then(|rows| {
                    writer.flush()?;
                    Ok(rows)
                })
            }
            Err(source) => {
                return report(
                    &FsImageError::CannotOpen {
                        path: path.clone(),
                        source,
                    },
                    err,
                );
            }
        },
        None => export(&image, &config, out).and_then(|rows| {
            out.flush()?;
            Ok(rows)
        }),
    };

    match result {
        Ok(rows) => {
            info!(rows, summary = config.summary, "export finished");
            0
        }
        Err(error) => report(&FsImageError::Io(error), err),
    }
}

/// Write either the summary or every row. Returns the row count.
fn export<W: Write>(image: &FsImage, config: &Config, out: &mut W) -> io::Result<usize> {
    if config.summary {
        output::write_summary(&image.summary(), out)?;
        return Ok(0);
    }
    output::write_rows(image.rows(), config.format, out)
}

/// Report a bad invocation, followed by the usage text.
fn usage_error<E: Write>(error: &FsImageError, err: &mut E) -> i32 {
    let code = report(error, err);
    let _ = writeln!(err);
    let _ = write_usage(err);
    code
}

fn report<E: Write>(error: &FsImageError, err: &mut E) -> i32 {
    let _ = writeln!(err, "error: {error}");
    if let Some(hint) = error.suggestion() {
        let _ = writeln!(err, "hint: {hint}");
    }
    error.exit_code()
}

fn write_usage<W>(out: &mut W) -> io::Result<()>
where
    W: Write,
{
    writeln!(
        out,
        "Usage: fsimage-export [OPTIONS] FSIMAGE [OUTPUT]\n\
         \n\
         Decode an uncompressed HDFS fsimage and print one row per inode,\n\
         root first, in depth-first order.\n\
         \n\
         Options:\n\
         \x20 -o, --output PATH     write rows to PATH instead of stdout (`-` is stdout)\n\
         \x20     --format FORMAT   `tsv` (default) or `jsonl`\n\
         \x20     --summary         print a JSON overview of the image instead of rows\n\
         \x20     --parallel        decode sections on separate threads\n\
         \x20     --log-level SPEC  diagnostics filter, e.g. `info` or `fsimage_core=debug`\n\
         \x20 -h, --help            show this help\n\
         \n\
         Environment:\n\
         \x20 {ENV_INPUT}   fsimage path when none is given\n\
         \x20 {ENV_OUTPUT}  output path when none is given\n\
         \x20 {ENV_LOG}    log filter when --log-level is absent (default `warn`)"
    )
}
