//! The precomputed tables and where they are kept between runs.
//!
//! Every table is a flat array of fixed width integers. A [`TableStore`] keeps
//! them as little endian byte blobs, one per table, each followed by an 8 byte
//! hash of its contents. A blob that is missing, has the wrong size or fails
//! its hash is rebuilt and saved again.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Instant,
};

use log::{debug, info, warn};

use crate::{
    N_PERM_4, N_U_EDGES_PHASE2,
    coord_cube::build_edge_merge,
    moves::MoveTables,
    pruning::PruningTables,
    start, success,
    symmetry::SymmetryTables,
    working,
};

/// Persistent storage for table blobs.
pub trait TableStore {
    /// The blob saved under `name`, if any.
    fn load(&self, name: &str) -> Option<Vec<u8>>;

    /// Saves a blob under `name`, replacing what was there.
    ///
    /// # Errors
    ///
    /// Any I/O error; the caller keeps going with the table it has in memory.
    fn save(&self, name: &str, bytes: &[u8]) -> io::Result<()>;
}

/// Never stores anything, so every table is built in memory.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoStore;

impl TableStore for NoStore {
    fn load(&self, _name: &str) -> Option<Vec<u8>> {
        None
    }

    fn save(&self, _name: &str, _bytes: &[u8]) -> io::Result<()> {
        Ok(())
    }
}

/// One file per table inside a directory.
#[derive(Clone, Debug)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    pub fn new(dir: impl Into<PathBuf>) -> DirStore {
        DirStore { dir: dir.into() }
    }

    /// `twophase-tables` in the platform cache directory, or in the working
    /// directory when the platform has none.
    #[must_use]
    pub fn default_location() -> DirStore {
        let mut dir = dirs::cache_dir().unwrap_or_default();
        dir.push("twophase-tables");
        DirStore::new(dir)
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl TableStore for DirStore {
    fn load(&self, name: &str) -> Option<Vec<u8>> {
        fs::read(self.dir.join(name)).ok()
    }

    fn save(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        // A crash must never leave a truncated table under the real name
        let tmp = self.dir.join(format!("{name}.tmp"));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, self.dir.join(name))
    }
}

/// Integers a table can be made of.
pub(crate) trait Element: Copy {
    const WIDTH: usize;

    fn write_le(self, out: &mut Vec<u8>);

    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! element {
    ($($t:ty),*) => {
        $(
            impl Element for $t {
                const WIDTH: usize = size_of::<$t>();

                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn read_le(bytes: &[u8]) -> Self {
                    let mut buf = [0; size_of::<$t>()];
                    buf.copy_from_slice(bytes);
                    <$t>::from_le_bytes(buf)
                }
            }
        )*
    };
}

element!(u8, u16, u32, u64);

const HASH_WIDTH: usize = size_of::<u64>();

#[derive(Debug, PartialEq, Eq)]
enum DecodeError {
    WrongSize { actual: usize, expected: usize },
    HashMismatch,
}

fn decode<T: Element>(bytes: &[u8], len: usize) -> Result<Vec<T>, DecodeError> {
    let expected = len * T::WIDTH + HASH_WIDTH;
    if bytes.len() != expected {
        return Err(DecodeError::WrongSize {
            actual: bytes.len(),
            expected,
        });
    }
    let (payload, hash) = bytes.split_at(len * T::WIDTH);
    if u64::read_le(hash) != fxhash::hash64(payload) {
        return Err(DecodeError::HashMismatch);
    }
    Ok(payload.chunks_exact(T::WIDTH).map(T::read_le).collect())
}

fn encode<T: Element>(table: &[T]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(table.len() * T::WIDTH + HASH_WIDTH);
    for &value in table {
        value.write_le(&mut bytes);
    }
    let hash = fxhash::hash64(bytes.as_slice());
    hash.write_le(&mut bytes);
    bytes
}

/// Loads the table `name` of `len` elements from `store`, or builds and saves
/// it when that fails.
pub(crate) fn load_or_build<T: Element>(
    store: &dyn TableStore,
    name: &str,
    len: usize,
    build: impl FnOnce() -> Vec<T>,
) -> Vec<T> {
    if let Some(bytes) = store.load(name) {
        match decode(&bytes, len) {
            Ok(table) => {
                debug!("Loaded table {name}");
                return table;
            }
            Err(DecodeError::WrongSize { actual, expected }) => {
                warn!("Table {name} has {actual} bytes instead of {expected}; rebuilding it");
            }
            Err(DecodeError::HashMismatch) => {
                warn!("Table {name} is corrupt; rebuilding it");
            }
        }
    }

    info!(working!("Creating table {}"), name);
    let now = Instant::now();
    let table = build();
    debug_assert_eq!(table.len(), len);
    info!(success!("Created table {} in {:.2?}"), name, now.elapsed());

    if let Err(e) = store.save(name, &encode(&table)) {
        warn!("Failed to save table {name}: {e}");
    }
    table
}

/// Everything the solver looks up during a search. Built once and then only
/// read, so one value can be shared by any number of searches.
pub struct Tables {
    pub moves: MoveTables,
    pub symmetry: SymmetryTables,
    pub pruning: PruningTables,
    /// The phase 2 ud_edges coordinate from the u_edges and d_edges
    /// coordinates, indexed as `24 * u_edges + d_edges % 24`.
    pub edge_merge: Vec<u16>,
}

impl Tables {
    /// Loads all tables from `store`, building and saving the ones that are
    /// missing. Building everything from scratch takes a few minutes.
    pub fn load_or_build(store: &impl TableStore) -> Tables {
        info!(start!("Preparing solver tables"));
        let now = Instant::now();

        let moves = MoveTables::load_or_build(store);
        let symmetry = SymmetryTables::load_or_build(store);
        let edge_merge = load_or_build(
            store,
            "phase2_edgemerge",
            N_U_EDGES_PHASE2 * N_PERM_4,
            build_edge_merge,
        );
        let pruning = PruningTables::load_or_build(store, &moves, &symmetry);

        info!(success!("Solver tables ready in {:.2?}"), now.elapsed());

        Tables {
            moves,
            symmetry,
            pruning,
            edge_merge,
        }
    }

    /// Builds every table in memory without persisting anything.
    #[must_use]
    pub fn build() -> Tables {
        Tables::load_or_build(&NoStore)
    }

    /// Distance mod 3 from the phase 1 subgroup.
    #[must_use]
    pub fn phase1_depth3(&self, flip: u16, twist: u16, slice_sorted: u16) -> usize {
        self.pruning
            .phase1_depth3(self.symmetry.phase1_index(flip, twist, slice_sorted))
    }

    /// Lower bound mod 3 of the phase 2 distance, or 3 when it is at least 11.
    #[must_use]
    pub fn phase2_depth3(&self, corners: u16, ud_edges: u16) -> usize {
        self.pruning
            .phase2_depth3(self.symmetry.phase2_index(corners, ud_edges))
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::HashMap};

    use super::*;

    #[derive(Default)]
    struct MemoryStore {
        blobs: RefCell<HashMap<String, Vec<u8>>>,
    }

    impl TableStore for MemoryStore {
        fn load(&self, name: &str) -> Option<Vec<u8>> {
            self.blobs.borrow().get(name).cloned()
        }

        fn save(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
            self.blobs.borrow_mut().insert(name.to_owned(), bytes.to_vec());
            Ok(())
        }
    }

    #[test_log::test]
    fn test_encoding_is_little_endian() {
        let bytes = encode(&[0x0102_u16, 0xffff]);
        assert_eq!(bytes[..4], [2, 1, 0xff, 0xff]);
        assert_eq!(bytes[4..], fxhash::hash64(&bytes[..4]).to_le_bytes());

        let bytes = encode(&[0xffff_ffff_u32, 1]);
        assert_eq!(bytes[..8], [0xff, 0xff, 0xff, 0xff, 1, 0, 0, 0]);

        assert_eq!(
            decode::<u16>(&encode(&[0x0102_u16, 0xffff]), 2),
            Ok(vec![0x0102, 0xffff])
        );
        assert_eq!(
            decode::<u16>(&[2, 1, 0xff], 2),
            Err(DecodeError::WrongSize {
                actual: 3,
                expected: 12
            })
        );
    }

    #[test_log::test]
    fn test_load_or_build_saves_then_loads() {
        let store = MemoryStore::default();
        let built = load_or_build(&store, "squares", 4, || vec![0_u32, 1, 4, 9]);
        assert_eq!(built, vec![0, 1, 4, 9]);
        assert_eq!(store.blobs.borrow()["squares"].len(), 16 + HASH_WIDTH);

        let loaded: Vec<u32> = load_or_build(&store, "squares", 4, || unreachable!());
        assert_eq!(loaded, built);
    }

    #[test_log::test]
    fn test_truncated_table_is_rebuilt() {
        let store = MemoryStore::default();
        store.save("table", &[1, 2, 3]).unwrap();
        let table: Vec<u16> = load_or_build(&store, "table", 2, || vec![7, 8]);
        assert_eq!(table, vec![7, 8]);
        assert_eq!(store.load("table"), Some(encode(&[7_u16, 8])));
    }

    #[test_log::test]
    fn test_corrupt_table_is_rebuilt() {
        let store = MemoryStore::default();
        let built = load_or_build(&store, "merge", 3, || vec![1_u16, 2, 3]);

        // Same size, different contents
        let mut bytes = store.load("merge").unwrap();
        bytes[..6].fill(0xff);
        store.save("merge", &bytes).unwrap();
        assert_eq!(decode::<u16>(&bytes, 3), Err(DecodeError::HashMismatch));

        let table: Vec<u16> = load_or_build(&store, "merge", 3, || vec![1, 2, 3]);
        assert_eq!(table, built);
        assert_eq!(store.load("merge"), Some(encode(&built)));
    }

    #[test_log::test]
    fn test_dir_store() {
        let dir = std::env::temp_dir().join(format!("twophase-dir-store-{}", std::process::id()));
        let store = DirStore::new(&dir);
        assert_eq!(store.load("missing"), None);
        store.save("blob", &[1, 2, 3]).unwrap();
        assert_eq!(store.load("blob"), Some(vec![1, 2, 3]));
        assert!(!dir.join("blob.tmp").exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}
