//! Row and summary writers.

use std::io::{self, Write};

use fsimage_core::ImageSummary;
use fsimage_types::{COLUMNS, ResolvedRow};

use crate::config::OutputFormat;

/// Write every row in `format`. Returns the number of rows written.
pub fn write_rows<I, W>(rows: I, format: OutputFormat, out: &mut W) -> io::Result<usize>
where
    I: IntoIterator<Item = ResolvedRow>,
    W: Write,
{
    match format {
        OutputFormat::Tsv => write_tsv(rows, out),
        OutputFormat::JsonLines => write_json_lines(rows, out),
    }
}

/// Header line, then one tab-separated line per row.
pub fn write_tsv<I, W>(rows: I, out: &mut W) -> io::Result<usize>
where
    I: IntoIterator<Item = ResolvedRow>,
    W: Write,
{
    writeln!(out, "{}", COLUMNS.join("\t"))?;
    let mut written = 0;
    for row in rows {
        writeln!(out, "{}", format_tsv_row(&row))?;
        written += 1;
    }
    Ok(written)
}

fn format_tsv_row(row: &ResolvedRow) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        row.path,
        row.replication,
        row.modification_time,
        row.access_time,
        row.preferred_block_size,
        row.blocks_count,
        row.file_size,
        row.ns_quota,
        row.ds_quota,
        row.permission,
        row.user_name,
        row.group_name,
    )
}

/// One JSON object per line, keyed by column name.
pub fn write_json_lines<I, W>(rows: I, out: &mut W) -> io::Result<usize>
where
    I: IntoIterator<Item = ResolvedRow>,
    W: Write,
{
    let mut written = 0;
    for row in rows {
        serde_json::to_writer(&mut *out, &row)?;
        out.write_all(b"\n")?;
        written += 1;
    }
    Ok(written)
}

/// Pretty-printed JSON overview of the image.
pub fn write_summary<W: Write>(summary: &ImageSummary, out: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, summary)?;
    out.write_all(b"\n")
}
