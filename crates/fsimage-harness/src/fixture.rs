//! Canned namespaces shared by the decoder and exporter tests.

use fsimage_types::{InodeId, ROOT_INODE_ID};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::builder::ImageBuilder;

/// Paths of [`sample_namespace`], in walk order.
pub const SAMPLE_PATHS: [&str; 7] = [
    "/",
    "/user",
    "/user/alice",
    "/user/alice/data.csv",
    "/user/alice/latest",
    "/tmp",
    "/tmp/report\\t1.txt",
];

/// A small namespace exercising every inode type, a sticky directory,
/// a split `DirEntry` and a name that needs escaping.
///
/// ```text
/// /                      hdfs:supergroup  rwxr-xr-x
/// /user                  hdfs:supergroup  rwxr-xr-x
/// /user/alice            alice:staff      rwx------
/// /user/alice/data.csv   alice:staff      rw-r--r--   3 blocks
/// /user/alice/latest     symlink -> data.csv
/// /tmp                   hdfs:supergroup  rwxrwxrwt
/// /tmp/report\t1.txt     alice:staff      rw-r-----   empty
/// ```
#[must_use]
pub fn sample_namespace() -> ImageBuilder {
    let mut builder = ImageBuilder::new();
    let hdfs = builder.user("hdfs");
    let supergroup = builder.group("supergroup");
    let alice = builder.user("alice");
    let staff = builder.group("staff");
    builder
        .root(hdfs, supergroup, 0o755)
        .directory(16_386, "user", hdfs, supergroup, 0o755)
        .directory(16_387, "alice", alice, staff, 0o700)
        .file(
            16_388,
            "data.csv",
            alice,
            staff,
            0o644,
            &[134_217_728, 134_217_728, 1_024],
        )
        .symlink(16_389, "latest", "data.csv")
        .directory(16_390, "tmp", hdfs, supergroup, 0o1777)
        .file(16_391, "report\t1.txt", alice, staff, 0o640, &[])
        .children(ROOT_INODE_ID, &[16_386])
        .children(16_386, &[16_387])
        .children(16_387, &[16_388, 16_389])
        .children(ROOT_INODE_ID, &[16_390])
        .children(16_390, &[16_391]);
    builder
}

/// Shape of a generated namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GeneratedShape {
    pub seed: u64,
    pub directories: usize,
    pub files: usize,
}

/// Deterministic pseudo-random namespace with `inodes` entries below root.
///
/// Every new inode is attached to a uniformly chosen existing directory, so
/// the result is always a tree. The same seed always yields the same bytes.
#[must_use]
pub fn generated_namespace(seed: u64, inodes: usize) -> (ImageBuilder, GeneratedShape) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut builder = ImageBuilder::new();
    let owner = builder.user("gen");
    let group = builder.group("gen");
    builder.root(owner, group, 0o755);

    let mut directories: Vec<InodeId> = vec![ROOT_INODE_ID];
    let mut shape = GeneratedShape {
        seed,
        directories: 0,
        files: 0,
    };
    for (offset, id) in (ROOT_INODE_ID + 1..).take(inodes).enumerate() {
        let parent = directories[rng.gen_range(0..directories.len())];
        if rng.gen_range(0..4_u8) == 0 {
            builder.directory(id, format!("d{offset}"), owner, group, 0o755);
            directories.push(id);
            shape.directories += 1;
        } else {
            let blocks: Vec<u64> = (0..rng.gen_range(0..3_usize))
                .map(|_| rng.gen_range(0..4_096_u64))
                .collect();
            builder.file(id, format!("f{offset}"), owner, group, 0o644, &blocks);
            shape.files += 1;
        }
        builder.children(parent, &[id]);
    }
    (builder, shape)
}
