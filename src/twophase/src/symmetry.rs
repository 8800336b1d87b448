//! The 48 symmetries of the cube and the tables that reduce coordinates to
//! symmetry classes.
//!
//! Symmetry `16 * urf3 + 8 * f2 + 2 * u4 + lr2` is
//! `ROT_URF3^urf3 * ROT_F2^f2 * ROT_U4^u4 * MIRR_LR2^lr2`. The first 16 keep
//! the UD axis in place and form the subgroup used for the class tables.

use std::{cell::OnceCell, sync::LazyLock};

use log::info;

use crate::{
    N_CORNERS, N_CORNERS_CLASS, N_FLIP, N_FLIPSLICE_CLASS, N_MOVE, N_SLICE, N_SYM, N_SYM_D4H,
    N_TWIST, N_UD_EDGES, N_PERM_4,
    cubie::{Corner, CubieCube, Edge},
    moves::Move,
    start, success,
    tables::{TableStore, load_or_build},
};

use Corner::{DBL, DFR, DLF, DRB, UBR, UFL, ULB, URF};
use Edge::{BL, BR, DB, DF, DL, DR, FL, FR, UB, UF, UL, UR};

/// 120° clockwise rotation around the URF-DBL diagonal.
const ROT_URF3: CubieCube = CubieCube {
    cp: [URF, DFR, DLF, UFL, UBR, DRB, DBL, ULB],
    co: [1, 2, 1, 2, 2, 1, 2, 1],
    ep: [UF, FR, DF, FL, UB, BR, DB, BL, UR, DR, DL, UL],
    eo: [1, 0, 1, 0, 1, 0, 1, 0, 1, 1, 1, 1],
};

/// 180° rotation around the FB axis.
const ROT_F2: CubieCube = CubieCube {
    cp: [DLF, DFR, DRB, DBL, UFL, URF, UBR, ULB],
    co: [0; 8],
    ep: [DL, DF, DR, DB, UL, UF, UR, UB, FL, FR, BR, BL],
    eo: [0; 12],
};

/// 90° clockwise rotation around the UD axis.
const ROT_U4: CubieCube = CubieCube {
    cp: [UBR, URF, UFL, ULB, DRB, DFR, DLF, DBL],
    co: [0; 8],
    ep: [UB, UR, UF, UL, DB, DR, DF, DL, BR, FR, FL, BL],
    eo: [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1],
};

/// Reflection through the plane containing the U, D, F and B centers.
const MIRR_LR2: CubieCube = CubieCube {
    cp: [UFL, URF, UBR, ULB, DLF, DFR, DRB, DBL],
    co: [3; 8],
    ep: [UL, UF, UR, UB, DL, DF, DR, DB, FL, FR, BR, BL],
    eo: [0; 12],
};

pub(crate) static SYM_CUBES: LazyLock<[CubieCube; N_SYM]> = LazyLock::new(|| {
    let mut syms = [CubieCube::SOLVED; N_SYM];
    let mut cube = CubieCube::SOLVED;
    let mut idx = 0;
    for _ in 0..3 {
        for _ in 0..2 {
            for _ in 0..4 {
                for _ in 0..2 {
                    syms[idx] = cube;
                    idx += 1;
                    cube.multiply(&MIRR_LR2);
                }
                cube.multiply(&ROT_U4);
            }
            cube.multiply(&ROT_F2);
        }
        cube.multiply(&ROT_URF3);
    }
    syms
});

/// `SYM_CUBES[INV_IDX[s]]` is the inverse of `SYM_CUBES[s]`.
pub(crate) static INV_IDX: LazyLock<[usize; N_SYM]> = LazyLock::new(|| {
    let syms = &*SYM_CUBES;
    let mut inv = [0; N_SYM];
    for (j, sym) in syms.iter().enumerate() {
        if let Some(i) = syms
            .iter()
            .position(|other| sym.compose(other) == CubieCube::SOLVED)
        {
            inv[j] = i;
        }
    }
    inv
});

/// Marks a coordinate value no class has claimed yet.
const INVALID: u16 = u16::MAX;

/// Symmetry classes of one coordinate under the 16 UD preserving symmetries.
struct SymClasses {
    classidx: Vec<u16>,
    sym: Vec<u8>,
    rep: Vec<u32>,
}

/// Reduces the coordinate space `0..size` to classes in one pass. Every raw
/// value not claimed yet starts a new class and claims the conjugates
/// `s^-1 * cube * s` of its cube for all 16 symmetries `s`.
fn build_classes(
    size: usize,
    set: impl Fn(&mut CubieCube, usize),
    conjugate: impl Fn(&CubieCube, usize) -> usize,
) -> SymClasses {
    let mut classidx = vec![INVALID; size];
    let mut sym = vec![0; size];
    let mut rep = Vec::new();
    let mut cube = CubieCube::SOLVED;

    for idx in 0..size {
        if classidx[idx] != INVALID {
            continue;
        }
        let class = rep.len() as u16;
        classidx[idx] = class;
        rep.push(idx as u32);

        set(&mut cube, idx);
        for s in 0..N_SYM_D4H {
            let conjugate_idx = conjugate(&cube, s);
            if classidx[conjugate_idx] == INVALID {
                classidx[conjugate_idx] = class;
                sym[conjugate_idx] = s as u8;
            }
        }
    }

    SymClasses { classidx, sym, rep }
}

fn load_or_build_classes(
    store: &dyn TableStore,
    prefix: &str,
    size: usize,
    n_classes: usize,
    build: impl Fn() -> SymClasses,
) -> SymClasses {
    let built = OnceCell::new();
    let classes = || built.get_or_init(&build);

    SymClasses {
        classidx: load_or_build(store, &format!("{prefix}_classidx"), size, || {
            classes().classidx.clone()
        }),
        sym: load_or_build(store, &format!("{prefix}_sym"), size, || classes().sym.clone()),
        rep: load_or_build(store, &format!("{prefix}_rep"), n_classes, || {
            classes().rep.clone()
        }),
    }
}

/// Conjugation tables and symmetry classes.
pub struct SymmetryTables {
    /// `mult_sym[N_SYM * i + j]` is the symmetry `i * j`.
    pub mult_sym: Vec<u8>,
    /// `conj_move[N_MOVE * s + m]` is the move `s * m * s^-1`.
    pub conj_move: Vec<Move>,
    /// `twist_conj[N_SYM_D4H * t + s]` is the twist of `s * t * s^-1`.
    pub twist_conj: Vec<u16>,
    /// `ud_edges_conj[N_SYM_D4H * u + s]` is the ud_edges of `s * u * s^-1`.
    pub ud_edges_conj: Vec<u16>,
    /// Class of every `N_FLIP * slice + flip` value.
    pub flipslice_classidx: Vec<u16>,
    /// The symmetry conjugating a flipslice value's class representative
    /// into it.
    pub flipslice_sym: Vec<u8>,
    /// The representative flipslice value of every class.
    pub flipslice_rep: Vec<u32>,
    pub corner_classidx: Vec<u16>,
    pub corner_sym: Vec<u8>,
    pub corner_rep: Vec<u32>,
}

impl SymmetryTables {
    pub(crate) fn load_or_build(store: &dyn TableStore) -> SymmetryTables {
        info!(start!("Loading symmetry tables"));
        let syms = &*SYM_CUBES;
        let inv = &*INV_IDX;

        let mut mult_sym = vec![0; N_SYM * N_SYM];
        for (i, a) in syms.iter().enumerate() {
            for (j, b) in syms.iter().enumerate() {
                let product = a.compose(b);
                if let Some(k) = syms.iter().position(|s| *s == product) {
                    mult_sym[N_SYM * i + j] = k as u8;
                }
            }
        }

        let mut conj_move = vec![Move::U1; N_SYM * N_MOVE];
        for (s, sym) in syms.iter().enumerate() {
            for m in Move::ALL {
                let conjugate = sym.compose(m.cubie()).compose(&syms[inv[s]]);
                if let Some(&m2) = Move::ALL.iter().find(|m2| *m2.cubie() == conjugate) {
                    conj_move[N_MOVE * s + m as usize] = m2;
                }
            }
        }

        let twist_conj = load_or_build(store, "conj_twist", N_TWIST * N_SYM_D4H, || {
            let mut table = vec![0; N_TWIST * N_SYM_D4H];
            let mut cube = CubieCube::SOLVED;
            for t in 0..N_TWIST {
                cube.set_twist(t as u16);
                for s in 0..N_SYM_D4H {
                    let mut conjugate = syms[s];
                    conjugate.corner_multiply(&cube);
                    conjugate.corner_multiply(&syms[inv[s]]);
                    table[N_SYM_D4H * t + s] = conjugate.twist();
                }
            }
            table
        });

        let ud_edges_conj = load_or_build(store, "conj_ud_edges", N_UD_EDGES * N_SYM_D4H, || {
            let mut table = vec![0; N_UD_EDGES * N_SYM_D4H];
            let mut cube = CubieCube::SOLVED;
            for u in 0..N_UD_EDGES {
                cube.set_ud_edges(u as u16);
                for s in 0..N_SYM_D4H {
                    let mut conjugate = syms[s];
                    conjugate.edge_multiply(&cube);
                    conjugate.edge_multiply(&syms[inv[s]]);
                    table[N_SYM_D4H * u + s] = conjugate.ud_edges();
                }
            }
            table
        });

        let flipslice = load_or_build_classes(
            store,
            "fs",
            N_FLIP * N_SLICE,
            N_FLIPSLICE_CLASS,
            || {
                build_classes(
                    N_FLIP * N_SLICE,
                    |cube, idx| {
                        cube.set_slice((idx / N_FLIP) as u16);
                        cube.set_flip((idx % N_FLIP) as u16);
                    },
                    |cube, s| {
                        let mut conjugate = syms[inv[s]];
                        conjugate.edge_multiply(cube);
                        conjugate.edge_multiply(&syms[s]);
                        N_FLIP * usize::from(conjugate.slice()) + usize::from(conjugate.flip())
                    },
                )
            },
        );

        let corners = load_or_build_classes(store, "co", N_CORNERS, N_CORNERS_CLASS, || {
            build_classes(
                N_CORNERS,
                |cube, idx| cube.set_corners(idx as u16),
                |cube, s| {
                    let mut conjugate = syms[inv[s]];
                    conjugate.corner_multiply(cube);
                    conjugate.corner_multiply(&syms[s]);
                    usize::from(conjugate.corners())
                },
            )
        });

        info!(success!("Symmetry tables ready"));

        SymmetryTables {
            mult_sym,
            conj_move,
            twist_conj,
            ud_edges_conj,
            flipslice_classidx: flipslice.classidx,
            flipslice_sym: flipslice.sym,
            flipslice_rep: flipslice.rep,
            corner_classidx: corners.classidx,
            corner_sym: corners.sym,
            corner_rep: corners.rep,
        }
    }

    /// `s * m * s^-1`.
    #[must_use]
    pub fn conj_move(&self, s: usize, m: Move) -> Move {
        self.conj_move[N_MOVE * s + m as usize]
    }

    /// Index into the phase 1 pruning table: the flipslice class and the twist
    /// conjugated into that class's frame.
    #[must_use]
    pub fn phase1_index(&self, flip: u16, twist: u16, slice_sorted: u16) -> usize {
        let flipslice = N_FLIP * (usize::from(slice_sorted) / N_PERM_4) + usize::from(flip);
        let class = usize::from(self.flipslice_classidx[flipslice]);
        let sym = usize::from(self.flipslice_sym[flipslice]);
        N_TWIST * class + usize::from(self.twist_conj[N_SYM_D4H * usize::from(twist) + sym])
    }

    /// Index into the phase 2 pruning table, built like
    /// [`SymmetryTables::phase1_index`] from the corner class.
    #[must_use]
    pub fn phase2_index(&self, corners: u16, ud_edges: u16) -> usize {
        let class = usize::from(self.corner_classidx[usize::from(corners)]);
        let sym = usize::from(self.corner_sym[usize::from(corners)]);
        N_UD_EDGES * class
            + usize::from(self.ud_edges_conj[N_SYM_D4H * usize::from(ud_edges) + sym])
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use super::*;
    use crate::tables::NoStore;

    static TABLES: LazyLock<SymmetryTables> =
        LazyLock::new(|| SymmetryTables::load_or_build(&NoStore));

    #[test_log::test]
    fn test_symmetries_are_distinct() {
        let syms = &*SYM_CUBES;
        assert_eq!(syms[0], CubieCube::SOLVED);
        assert_eq!(syms[16], ROT_URF3);
        assert_eq!(syms[1], MIRR_LR2);
        for i in 0..N_SYM {
            for j in 0..i {
                assert_ne!(syms[i], syms[j]);
            }
        }
    }

    #[test_log::test]
    fn test_inverses() {
        let syms = &*SYM_CUBES;
        for s in 0..N_SYM {
            assert_eq!(syms[s].compose(&syms[INV_IDX[s]]), CubieCube::SOLVED);
        }
        assert_eq!(INV_IDX[16], 32);
    }

    #[test_log::test]
    fn test_closure() {
        let syms = &*SYM_CUBES;
        for i in 0..N_SYM {
            for j in 0..N_SYM {
                let k = usize::from(TABLES.mult_sym[N_SYM * i + j]);
                assert_eq!(syms[i].compose(&syms[j]), syms[k]);
            }
        }
        // The UD preserving symmetries form a subgroup
        for i in 0..N_SYM_D4H {
            for j in 0..N_SYM_D4H {
                assert!(usize::from(TABLES.mult_sym[N_SYM * i + j]) < N_SYM_D4H);
            }
        }
    }

    #[test_log::test]
    fn test_move_conjugation() {
        let syms = &*SYM_CUBES;
        for s in 0..N_SYM {
            for m in Move::ALL {
                let conjugate = syms[s].compose(m.cubie()).compose(&syms[INV_IDX[s]]);
                assert_eq!(*TABLES.conj_move(s, m).cubie(), conjugate);
            }
        }
        for m in Move::ALL {
            assert_eq!(TABLES.conj_move(0, m), m);
        }
        for s in 0..N_SYM_D4H {
            for m in Move::PHASE2 {
                assert!(TABLES.conj_move(s, m).is_phase2());
            }
        }
    }

    #[test_log::test]
    fn test_class_counts() {
        assert_eq!(TABLES.flipslice_rep.len(), N_FLIPSLICE_CLASS);
        assert_eq!(TABLES.corner_rep.len(), N_CORNERS_CLASS);
        assert!(!TABLES.flipslice_classidx.contains(&INVALID));
        assert!(!TABLES.corner_classidx.contains(&INVALID));
    }

    #[test_log::test]
    fn test_representatives_reproduce_raw_values() {
        let syms = &*SYM_CUBES;
        let mut rng = fastrand::Rng::with_seed(17);

        for (class, &rep) in TABLES.corner_rep.iter().enumerate() {
            assert_eq!(usize::from(TABLES.corner_classidx[rep as usize]), class);
            assert_eq!(TABLES.corner_sym[rep as usize], 0);
        }

        for _ in 0..2000 {
            let corners = rng.usize(..N_CORNERS);
            let class = usize::from(TABLES.corner_classidx[corners]);
            let s = usize::from(TABLES.corner_sym[corners]);
            let mut rep = CubieCube::SOLVED;
            rep.set_corners(TABLES.corner_rep[class] as u16);
            let mut conjugate = syms[INV_IDX[s]];
            conjugate.corner_multiply(&rep);
            conjugate.corner_multiply(&syms[s]);
            assert_eq!(usize::from(conjugate.corners()), corners);

            let flipslice = rng.usize(..N_FLIP * N_SLICE);
            let class = usize::from(TABLES.flipslice_classidx[flipslice]);
            let s = usize::from(TABLES.flipslice_sym[flipslice]);
            let rep = TABLES.flipslice_rep[class] as usize;
            let mut cube = CubieCube::SOLVED;
            cube.set_slice((rep / N_FLIP) as u16);
            cube.set_flip((rep % N_FLIP) as u16);
            let mut conjugate = syms[INV_IDX[s]];
            conjugate.edge_multiply(&cube);
            conjugate.edge_multiply(&syms[s]);
            assert_eq!(
                N_FLIP * usize::from(conjugate.slice()) + usize::from(conjugate.flip()),
                flipslice
            );
        }
    }

    #[test_log::test]
    fn test_conjugated_twist_matches_cubies() {
        let syms = &*SYM_CUBES;
        let mut rng = fastrand::Rng::with_seed(23);
        for _ in 0..500 {
            let cube = CubieCube::random_with(&mut rng);
            let s = rng.usize(..N_SYM_D4H);
            let conjugate = syms[s].compose(&cube).compose(&syms[INV_IDX[s]]);
            assert_eq!(
                TABLES.twist_conj[N_SYM_D4H * usize::from(cube.twist()) + s],
                conjugate.twist()
            );
        }
    }
}
