use std::sync::LazyLock;

use twophase::{DirStore, Tables};

/// Built on first use and saved under the target directory, so later test
/// binaries only load them.
pub static TABLES: LazyLock<Tables> = LazyLock::new(|| {
    Tables::load_or_build(&DirStore::new(concat!(
        env!("CARGO_TARGET_TMPDIR"),
        "/twophase-tables"
    )))
});

pub const SOLVED: &str = "UUUUUUUUURRRRRRRRRFFFFFFFFFDDDDDDDDDLLLLLLLLLBBBBBBBBB";
