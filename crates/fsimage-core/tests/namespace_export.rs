//! End-to-end decoding of synthetic images into exported rows.
//!
//! Every test builds a container with `fsimage-harness`, opens it through the
//! public `FsImage` API and checks the row stream.

use fsimage_core::{DecodeOptions, FsImage, MemoryImage};
use fsimage_harness::{
    ImageBuilder, SAMPLE_PATHS, encode_inode, generated_namespace, sample_namespace,
};
use fsimage_types::{
    DirectoryAttrs, InodeKind, InodeRecord, MessageWriter, PermissionWord, ROOT_INODE_ID,
    ResolvedRow, USER_TAG,
};

fn open(bytes: Vec<u8>) -> FsImage {
    FsImage::open(&mut MemoryImage::new(bytes), DecodeOptions::default()).unwrap()
}

fn row<'a>(rows: &'a [ResolvedRow], path: &str) -> &'a ResolvedRow {
    rows.iter()
        .find(|row| row.path == path)
        .unwrap_or_else(|| panic!("no row for {path}"))
}

// ─── Walk order and paths ───────────────────────────────────────────────────

#[test]
fn sample_rows_in_pre_order() {
    let fs = open(sample_namespace().build());
    let paths: Vec<String> = fs.rows().map(|row| row.path).collect();
    assert_eq!(paths, SAMPLE_PATHS);
}

#[test]
fn root_row_comes_first() {
    let (builder, _) = generated_namespace(11, 300);
    let fs = open(builder.build());
    let first = fs.rows().next().unwrap();
    assert_eq!(first.path, "/");
}

#[test]
fn generated_namespace_emits_every_inode_once() {
    let (builder, shape) = generated_namespace(42, 500);
    let fs = open(builder.build());
    let rows: Vec<ResolvedRow> = fs.rows().collect();
    assert_eq!(rows.len(), 1 + shape.directories + shape.files);
    let mut paths: Vec<&str> = rows.iter().map(|row| row.path.as_str()).collect();
    paths.sort_unstable();
    paths.dedup();
    assert_eq!(paths.len(), rows.len());
}

#[test]
fn decoding_twice_is_identical() {
    let bytes = sample_namespace().build();
    let first: Vec<ResolvedRow> = open(bytes.clone()).rows().collect();
    let second: Vec<ResolvedRow> = open(bytes).rows().collect();
    assert_eq!(first, second);
}

#[test]
fn one_image_many_walks() {
    let fs = open(sample_namespace().build());
    let a: Vec<ResolvedRow> = fs.rows().collect();
    let b: Vec<ResolvedRow> = fs.rows().collect();
    assert_eq!(a, b);
}

#[test]
fn parallel_decode_matches_sequential() {
    let (builder, _) = generated_namespace(5, 1_000);
    let bytes = builder.build();
    let sequential = open(bytes.clone());
    let parallel = FsImage::open(
        &mut MemoryImage::new(bytes),
        DecodeOptions::default().parallel(true),
    )
    .unwrap();
    assert!(sequential.rows().eq(parallel.rows()));
    assert_eq!(sequential.stats(), parallel.stats());
}

#[test]
fn dangling_child_recurses_into_grandchildren() {
    let mut builder = ImageBuilder::new();
    let user = builder.user("u");
    let group = builder.group("g");
    builder
        .root(user, group, 0o755)
        .file(16_390, "grandchild", user, group, 0o644, &[1])
        .children(ROOT_INODE_ID, &[16_389])
        .children(16_389, &[16_390]);
    let fs = open(builder.build());
    let paths: Vec<String> = fs.rows().map(|row| row.path).collect();
    assert_eq!(paths, ["/", "/grandchild"]);
}

// ─── Projection ─────────────────────────────────────────────────────────────

#[test]
fn file_and_directory_rows() {
    let fs = open(sample_namespace().build());
    let rows: Vec<ResolvedRow> = fs.rows().collect();

    let data = row(&rows, "/user/alice/data.csv");
    assert_eq!(data.replication, 3);
    assert_eq!(data.modification_time, "2023-11-14 22:13:20");
    assert_eq!(data.access_time, "2023-11-14 22:13:20");
    assert_eq!(data.preferred_block_size, 134_217_728);
    assert_eq!(data.blocks_count, 3);
    assert_eq!(data.file_size, 2 * 134_217_728 + 1_024);
    assert_eq!((data.ns_quota, data.ds_quota), (0, 0));
    assert_eq!(data.permission, "rw-r--r--");
    assert_eq!(data.user_name, "alice");
    assert_eq!(data.group_name, "staff");

    let root = row(&rows, "/");
    assert_eq!(root.replication, 0);
    assert_eq!(root.access_time, "1970-01-01 00:00:00");
    assert_eq!(root.ns_quota, i64::MAX);
    assert_eq!(root.ds_quota, -1);
    assert_eq!(root.user_name, "hdfs");
    assert_eq!(root.group_name, "supergroup");

    assert_eq!(row(&rows, "/tmp").permission, "rwxrwxrwt");
    assert_eq!(row(&rows, "/user/alice").permission, "rwx------");
}

#[test]
fn symlink_row_is_path_only() {
    let fs = open(sample_namespace().build());
    let rows: Vec<ResolvedRow> = fs.rows().collect();
    assert_eq!(
        row(&rows, "/user/alice/latest"),
        &ResolvedRow {
            path: "/user/alice/latest".to_owned(),
            ..ResolvedRow::default()
        }
    );
}

#[test]
fn user_tag_resolves_only_as_user() {
    let mut builder = ImageBuilder::new();
    builder.string(USER_TAG | 9, "bob");
    builder
        .inode(&InodeRecord {
            id: ROOT_INODE_ID,
            name: Vec::new(),
            kind: InodeKind::Directory(DirectoryAttrs {
                permission: PermissionWord::from_parts(9, 9, 0o755),
                ..DirectoryAttrs::default()
            }),
        })
        .children(ROOT_INODE_ID, &[]);
    let fs = open(builder.build());
    let root = fs.rows().next().unwrap();
    assert_eq!(root.user_name, "bob");
    assert_eq!(root.group_name, "9");
}

#[test]
fn string_table_alias_is_used() {
    let mut builder = sample_namespace();
    builder.string_table_name("STRINGTABLE");
    let fs = open(builder.build());
    let root = fs.rows().next().unwrap();
    assert_eq!(root.user_name, "hdfs");
}

#[test]
fn missing_string_table_degrades_to_ids() {
    let mut builder = sample_namespace();
    builder.omit_section("STRING_TABLE");
    let fs = open(builder.build());
    let root = fs.rows().next().unwrap();
    assert_eq!(root.user_name, "1");
    assert_eq!(root.group_name, "2");
    assert!(fs.summary().string_table.is_none());
}

// ─── Record-level damage ────────────────────────────────────────────────────

#[test]
fn bad_inode_record_is_skipped() {
    let mut builder = sample_namespace();
    builder.raw_inode(MessageWriter::new().bytes(2, b"not-an-id").finish());
    let fs = open(builder.build());
    assert_eq!(fs.stats().inodes.skipped, 1);
    assert_eq!(fs.rows().count(), SAMPLE_PATHS.len());
}

#[test]
fn duplicate_inode_id_last_wins() {
    let mut builder = sample_namespace();
    builder.raw_inode(encode_inode(&InodeRecord {
        id: 16_391,
        name: b"renamed".to_vec(),
        kind: InodeKind::Directory(DirectoryAttrs::default()),
    }));
    let fs = open(builder.build());
    let paths: Vec<String> = fs.rows().map(|row| row.path).collect();
    assert_eq!(paths.last().unwrap(), "/tmp/renamed");
}

#[test]
fn summary_describes_sections() {
    let fs = open(sample_namespace().build());
    let summary = fs.summary();
    let names: Vec<&str> = summary.sections.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["NS_INFO", "STRING_TABLE", "INODE", "INODE_DIR"]);
    assert_eq!(summary.inodes, 7);
    assert_eq!(summary.strings, 4);
    assert_eq!(summary.inode_header.num_inodes, 7);
    assert_eq!(summary.directories, 4);
    assert_eq!(summary.edges, 6);
}

#[test]
fn open_path_reads_file() {
    let file = sample_namespace().write_temp().unwrap();
    let fs = FsImage::open_path(file.path(), DecodeOptions::default()).unwrap();
    assert_eq!(fs.rows().count(), SAMPLE_PATHS.len());
}
