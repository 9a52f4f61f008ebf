//! Skipped records and degraded images must leave a trace in the log.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use fsimage_core::{DecodeOptions, FsImage, MemoryImage};
use fsimage_harness::sample_namespace;
use fsimage_types::MessageWriter;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Open `bytes` with a capturing subscriber installed.
fn open_logged_with(bytes: Vec<u8>, options: DecodeOptions) -> (FsImage, String) {
    let buffer = SharedBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let image = tracing::subscriber::with_default(subscriber, || {
        FsImage::open(&mut MemoryImage::new(bytes), options).unwrap()
    });
    (image, buffer.contents())
}

fn open_logged(bytes: Vec<u8>) -> (FsImage, String) {
    open_logged_with(bytes, DecodeOptions::default())
}

#[test]
fn skipped_record_is_logged_with_its_index() {
    let mut builder = sample_namespace();
    builder.raw_inode(MessageWriter::new().bytes(2, b"oops").finish());
    let (image, log) = open_logged(builder.build());

    assert_eq!(image.stats().inodes.skipped, 1);
    let line = log
        .lines()
        .find(|line| line.contains("skipping undecodable record"))
        .expect("warning for the bad inode");
    assert!(line.contains("WARN"));
    assert!(line.contains("section=\"INODE\""));
    assert!(line.contains("record_index=7"));
}

#[test]
fn parallel_decode_logs_inside_the_open_span() {
    let mut builder = sample_namespace();
    builder.raw_inode(MessageWriter::new().bytes(2, b"oops").finish());
    let options = DecodeOptions::default().parallel(true);
    let (image, log) = open_logged_with(builder.build(), options);

    assert_eq!(image.stats().inodes.skipped, 1);
    let line = log
        .lines()
        .find(|line| line.contains("skipping undecodable record"))
        .expect("warning from the inode worker thread");
    assert!(line.contains("fsimage_open{"), "no open span in: {line}");
    assert!(line.contains("parallel=true"));
    assert!(line.contains("decode_section{section=\"INODE\"}"));
}

#[test]
fn missing_string_table_is_logged() {
    let mut builder = sample_namespace();
    builder.omit_section("STRING_TABLE");
    let (_, log) = open_logged(builder.build());
    assert!(log.contains("no string table section"));
}

#[test]
fn clean_image_logs_no_warnings() {
    let (image, log) = open_logged(sample_namespace().build());
    assert_eq!(image.inodes().len(), 7);
    assert!(!log.contains("WARN"), "unexpected warnings:\n{log}");
    assert!(log.contains("fsimage decoded"));
    assert!(log.contains("section table entry"));
}
