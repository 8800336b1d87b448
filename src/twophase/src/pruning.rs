//! Pruning tables: distances to the phase 1 and phase 2 targets, stored
//! modulo 3 in two bits per entry.
//!
//! Consecutive BFS layers differ by exactly one move, so knowing the distance
//! of a neighbor and the new distance mod 3 is enough to recover the new
//! distance; see [`DISTANCE`].

use log::{debug, info};

use crate::{
    N_CORNERS, N_CORNERS_CLASS, N_FLIP, N_FLIPSLICE_CLASS, N_PERM_4, N_SYM_D4H, N_TWIST,
    N_UD_EDGES,
    cubie::CubieCube,
    moves::{Move, MoveTables},
    start, success,
    symmetry::{INV_IDX, SYM_CUBES, SymmetryTables},
    tables::{TableStore, load_or_build},
    working,
};

/// All sixteen two-bit entries of a word unfilled.
const UNFILLED_WORD: u32 = u32::MAX;

/// Entry value of a state the BFS has not reached.
const UNFILLED: usize = 3;

/// The phase 2 table is filled up to this depth. Anything still unfilled is
/// further away.
pub const PHASE2_MAX_DEPTH: usize = 10;

const fn distance_table() -> [usize; 60] {
    let mut table = [0; 60];
    let mut i: usize = 0;
    while i < 20 {
        let mut j: usize = 0;
        while j < 3 {
            let mut d = (i / 3) * 3 + j;
            if i % 3 == 2 && j == 0 {
                d += 3;
            } else if i % 3 == 0 && j == 2 {
                d = d.saturating_sub(3);
            }
            table[3 * i + j] = d;
            j += 1;
        }
        i += 1;
    }
    table
}

/// `DISTANCE[3 * old + new_mod3]` is the distance of a neighbor of a state at
/// distance `old` whose distance mod 3 is `new_mod3`.
pub const DISTANCE: [usize; 60] = distance_table();

fn get_depth3(table: &[u32], idx: usize) -> usize {
    ((table[idx / 16] >> ((idx % 16) * 2)) & 3) as usize
}

fn set_depth3(table: &mut [u32], idx: usize, value: usize) {
    let shift = (idx % 16) * 2;
    let word = &mut table[idx / 16];
    *word = (*word & !(3 << shift)) | ((value as u32) << shift);
}

/// For every class representative, the bit set of the symmetries among the
/// first 16 that map it to itself.
fn stabilizers(
    reps: &[u32],
    set: impl Fn(&mut CubieCube, usize),
    conjugate: impl Fn(&CubieCube, &CubieCube, &CubieCube) -> usize,
) -> Vec<u16> {
    let syms = &*SYM_CUBES;
    let inv = &*INV_IDX;
    let mut cube = CubieCube::SOLVED;
    reps.iter()
        .map(|&rep| {
            set(&mut cube, rep as usize);
            (0..N_SYM_D4H)
                .filter(|&s| conjugate(&syms[s], &cube, &syms[inv[s]]) == rep as usize)
                .fold(0, |bits, s| bits | (1 << s))
        })
        .collect()
}

fn build_phase1(moves: &MoveTables, sym: &SymmetryTables) -> Vec<u32> {
    let total = N_FLIPSLICE_CLASS * N_TWIST;
    let mut table = vec![UNFILLED_WORD; total / 16 + 1];

    let fs_sym = stabilizers(
        &sym.flipslice_rep,
        |cube, rep| {
            cube.set_slice((rep / N_FLIP) as u16);
            cube.set_flip((rep % N_FLIP) as u16);
        },
        |s, cube, s_inv| {
            let mut conjugate = *s;
            conjugate.edge_multiply(cube);
            conjugate.edge_multiply(s_inv);
            N_FLIP * usize::from(conjugate.slice()) + usize::from(conjugate.flip())
        },
    );

    set_depth3(&mut table, 0, 0);
    let mut done = 1;
    let mut depth = 0;
    let mut backward = false;

    while done != total {
        let depth3 = depth % 3;
        // Most entries are filled by now, so it is cheaper to look for
        // neighbors of the unfilled ones
        if depth == 9 {
            debug!("Switching to backward search");
            backward = true;
        }

        let mut idx = 0;
        for class in 0..N_FLIPSLICE_CLASS {
            let mut twist = 0;
            while twist < N_TWIST {
                if !backward
                    && idx % 16 == 0
                    && table[idx / 16] == UNFILLED_WORD
                    && twist < N_TWIST - 16
                {
                    twist += 16;
                    idx += 16;
                    continue;
                }

                let matched = if backward {
                    get_depth3(&table, idx) == UNFILLED
                } else {
                    get_depth3(&table, idx) == depth3
                };

                if matched {
                    let flipslice = sym.flipslice_rep[class] as usize;
                    let flip = (flipslice % N_FLIP) as u16;
                    let slice_sorted = ((flipslice / N_FLIP) * N_PERM_4) as u16;

                    for m in Move::ALL {
                        let idx1 = sym.phase1_index(
                            moves.flip(flip, m),
                            moves.twist(twist as u16, m),
                            moves.slice_sorted(slice_sorted, m),
                        );

                        if backward {
                            if get_depth3(&table, idx1) == depth3 {
                                set_depth3(&mut table, idx, (depth + 1) % 3);
                                done += 1;
                                break;
                            }
                            continue;
                        }

                        if get_depth3(&table, idx1) != UNFILLED {
                            continue;
                        }
                        set_depth3(&mut table, idx1, (depth + 1) % 3);
                        done += 1;

                        // A symmetric representative has several twists
                        // standing for the same state
                        let class1 = idx1 / N_TWIST;
                        let twist1 = idx1 % N_TWIST;
                        let stabilizer = fs_sym[class1];
                        if stabilizer == 1 {
                            continue;
                        }
                        for j in 1..N_SYM_D4H {
                            if (stabilizer >> j) & 1 == 0 {
                                continue;
                            }
                            let twist2 = usize::from(sym.twist_conj[N_SYM_D4H * twist1 + j]);
                            let idx2 = N_TWIST * class1 + twist2;
                            if get_depth3(&table, idx2) == UNFILLED {
                                set_depth3(&mut table, idx2, (depth + 1) % 3);
                                done += 1;
                            }
                        }
                    }
                }

                twist += 1;
                idx += 1;
            }
        }

        depth += 1;
        debug!(working!("Phase 1 depth {}: {}/{} entries"), depth, done, total);
    }

    table
}

fn build_phase2(moves: &MoveTables, sym: &SymmetryTables) -> Vec<u32> {
    let total = N_CORNERS_CLASS * N_UD_EDGES;
    let mut table = vec![UNFILLED_WORD; total / 16];

    let c_sym = stabilizers(
        &sym.corner_rep,
        |cube, rep| cube.set_corners(rep as u16),
        |s, cube, s_inv| {
            let mut conjugate = *s;
            conjugate.corner_multiply(cube);
            conjugate.corner_multiply(s_inv);
            usize::from(conjugate.corners())
        },
    );

    set_depth3(&mut table, 0, 0);
    let mut done = 1;
    let mut depth = 0;

    while depth < PHASE2_MAX_DEPTH {
        let depth3 = depth % 3;
        let mut idx = 0;
        for class in 0..N_CORNERS_CLASS {
            let mut ud_edges = 0;
            while ud_edges < N_UD_EDGES {
                if idx % 16 == 0 && table[idx / 16] == UNFILLED_WORD && ud_edges < N_UD_EDGES - 16 {
                    ud_edges += 16;
                    idx += 16;
                    continue;
                }

                if get_depth3(&table, idx) == depth3 {
                    let corners = sym.corner_rep[class] as u16;
                    for m in Move::PHASE2 {
                        let idx1 = sym.phase2_index(
                            moves.corners(corners, m),
                            moves.ud_edges(ud_edges as u16, m),
                        );
                        if get_depth3(&table, idx1) != UNFILLED {
                            continue;
                        }
                        set_depth3(&mut table, idx1, (depth + 1) % 3);
                        done += 1;

                        let class1 = idx1 / N_UD_EDGES;
                        let ud_edges1 = idx1 % N_UD_EDGES;
                        let stabilizer = c_sym[class1];
                        if stabilizer == 1 {
                            continue;
                        }
                        for j in 1..N_SYM_D4H {
                            if (stabilizer >> j) & 1 == 0 {
                                continue;
                            }
                            let ud_edges2 =
                                usize::from(sym.ud_edges_conj[N_SYM_D4H * ud_edges1 + j]);
                            let idx2 = N_UD_EDGES * class1 + ud_edges2;
                            if get_depth3(&table, idx2) == UNFILLED {
                                set_depth3(&mut table, idx2, (depth + 1) % 3);
                                done += 1;
                            }
                        }
                    }
                }

                ud_edges += 1;
                idx += 1;
            }
        }

        depth += 1;
        debug!(working!("Phase 2 depth {}: {}/{} entries"), depth, done, total);
    }

    debug!(
        "{} phase 2 entries are more than {PHASE2_MAX_DEPTH} moves away",
        total - done
    );
    table
}

/// Exact phase 2 distance of the corners and the slice edge order, ignoring
/// the other eight edges.
fn build_cornslice(moves: &MoveTables) -> Vec<u8> {
    let total = N_CORNERS * N_PERM_4;
    let mut table = vec![u8::MAX; total];
    table[0] = 0;
    let mut done = 1;
    let mut depth = 0;

    while done != total {
        for corners in 0..N_CORNERS {
            for slice_sorted in 0..N_PERM_4 {
                if table[N_PERM_4 * corners + slice_sorted] != depth {
                    continue;
                }
                for m in Move::PHASE2 {
                    let corners1 = usize::from(moves.corners(corners as u16, m));
                    let slice_sorted1 = usize::from(moves.slice_sorted(slice_sorted as u16, m));
                    let idx1 = N_PERM_4 * corners1 + slice_sorted1;
                    if table[idx1] == u8::MAX {
                        table[idx1] = depth + 1;
                        done += 1;
                    }
                }
            }
        }
        depth += 1;
        debug!(working!("Corner slice depth {}: {}/{} entries"), depth, done, total);
    }

    table
}

pub struct PruningTables {
    /// Exact phase 1 distance mod 3, indexed by
    /// [`SymmetryTables::phase1_index`].
    pub phase1: Vec<u32>,
    /// Phase 2 distance mod 3 up to [`PHASE2_MAX_DEPTH`] plus one, indexed by
    /// [`SymmetryTables::phase2_index`].
    pub phase2: Vec<u32>,
    /// `cornslice[24 * corners + slice_sorted]` for phase 2 cubes.
    pub cornslice: Vec<u8>,
}

impl PruningTables {
    pub(crate) fn load_or_build(
        store: &dyn TableStore,
        moves: &MoveTables,
        sym: &SymmetryTables,
    ) -> PruningTables {
        info!(start!("Loading pruning tables"));

        let phase1 = load_or_build(
            store,
            "phase1_prun",
            N_FLIPSLICE_CLASS * N_TWIST / 16 + 1,
            || build_phase1(moves, sym),
        );
        let phase2 = load_or_build(
            store,
            "phase2_prun",
            N_CORNERS_CLASS * N_UD_EDGES / 16,
            || build_phase2(moves, sym),
        );
        let cornslice = load_or_build(store, "phase2_cornsliceprun", N_CORNERS * N_PERM_4, || {
            build_cornslice(moves)
        });

        info!(success!("Pruning tables ready"));

        PruningTables {
            phase1,
            phase2,
            cornslice,
        }
    }

    #[must_use]
    pub fn phase1_depth3(&self, idx: usize) -> usize {
        get_depth3(&self.phase1, idx)
    }

    /// 3 when the state is more than [`PHASE2_MAX_DEPTH`] + 1 moves away.
    #[must_use]
    pub fn phase2_depth3(&self, idx: usize) -> usize {
        get_depth3(&self.phase2, idx)
    }

    /// `slice_sorted` must be below 24.
    #[must_use]
    pub fn cornslice(&self, corners: u16, slice_sorted: u16) -> usize {
        usize::from(self.cornslice[N_PERM_4 * usize::from(corners) + usize::from(slice_sorted)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{moves::parse_moves, tables::NoStore};

    #[test_log::test]
    fn test_distance_table() {
        // Distance 4 seen from a neighbor at distance 5 is 1 mod 3
        assert_eq!(DISTANCE[3 * 5 + 1], 4);
        assert_eq!(DISTANCE[3 * 5 + 2], 5);
        assert_eq!(DISTANCE[3 * 5], 6);
        assert_eq!(DISTANCE[3 * 6 + 2], 5);
        assert_eq!(DISTANCE[3 * 6], 6);
        assert_eq!(DISTANCE[3 * 6 + 1], 7);
        assert_eq!(DISTANCE[3 * 1], 0);
        assert_eq!(DISTANCE[3 * 19 + 2], 20);

        for old in 1..20 {
            for new in [old - 1, old, old + 1] {
                assert_eq!(DISTANCE[3 * old + new % 3], new);
            }
        }
    }

    #[test_log::test]
    fn test_packed_entries() {
        let mut table = vec![UNFILLED_WORD; 3];
        assert_eq!(get_depth3(&table, 17), UNFILLED);

        set_depth3(&mut table, 17, 2);
        set_depth3(&mut table, 18, 0);
        set_depth3(&mut table, 47, 1);
        assert_eq!(get_depth3(&table, 16), UNFILLED);
        assert_eq!(get_depth3(&table, 17), 2);
        assert_eq!(get_depth3(&table, 18), 0);
        assert_eq!(get_depth3(&table, 47), 1);
        assert_eq!(table[0], UNFILLED_WORD);

        set_depth3(&mut table, 17, 1);
        assert_eq!(get_depth3(&table, 17), 1);
    }

    #[test_log::test]
    fn test_cornslice_bounds_phase2_scrambles() {
        let moves = MoveTables::load_or_build(&NoStore);
        let cornslice = build_cornslice(&moves);
        assert!(!cornslice.contains(&u8::MAX));
        assert_eq!(cornslice[0], 0);

        let lookup = |cube: &CubieCube| {
            usize::from(cornslice[N_PERM_4 * usize::from(cube.corners()) + usize::from(cube.slice_sorted())])
        };

        let u = CubieCube::from_moves(&parse_moves("U").unwrap());
        assert_eq!(lookup(&u), 1);
        let r2 = CubieCube::from_moves(&parse_moves("R2").unwrap());
        assert_eq!(lookup(&r2), 1);

        let mut rng = fastrand::Rng::with_seed(5);
        for len in 0..14 {
            let mut cube = CubieCube::SOLVED;
            for _ in 0..len {
                cube.apply_move(Move::PHASE2[rng.usize(..Move::PHASE2.len())]);
            }
            assert!(lookup(&cube) <= len);
        }
    }
}
