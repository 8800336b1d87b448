//! The cube as eight corner and twelve edge pieces, each with a position and
//! an orientation. The same type also represents the 18 face turns and the 48
//! symmetries of the cube.

use std::{fmt, sync::LazyLock};

use itertools::Itertools;
use thiserror::Error;

use crate::{N_SYM, moves::Move, symmetry};

/// Corner positions, named by the faces they touch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Corner {
    URF,
    UFL,
    ULB,
    UBR,
    DFR,
    DLF,
    DBL,
    DRB,
}

/// Edge positions, named by the faces they touch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Edge {
    UR,
    UF,
    UL,
    UB,
    DR,
    DF,
    DL,
    DB,
    FR,
    FL,
    BL,
    BR,
}

impl Corner {
    pub const ALL: [Corner; 8] = [
        Corner::URF,
        Corner::UFL,
        Corner::ULB,
        Corner::UBR,
        Corner::DFR,
        Corner::DLF,
        Corner::DBL,
        Corner::DRB,
    ];
}

impl Edge {
    pub const ALL: [Edge; 12] = [
        Edge::UR,
        Edge::UF,
        Edge::UL,
        Edge::UB,
        Edge::DR,
        Edge::DF,
        Edge::DL,
        Edge::DB,
        Edge::FR,
        Edge::FL,
        Edge::BL,
        Edge::BR,
    ];
}

/// Reasons a [`CubieCube`] does not describe a reachable cube.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum CubieError {
    #[error("some edges are undefined")]
    UndefinedEdges,
    #[error("total edge flip is wrong")]
    EdgeFlip,
    #[error("some corners are undefined")]
    UndefinedCorners,
    #[error("total corner twist is wrong")]
    CornerTwist,
    #[error("wrong edge and corner parity")]
    ParityMismatch,
}

/// A cube on the level of its pieces.
///
/// `cp[i]` is the corner sitting at position `i` and `co[i]` its twist. Twists
/// `0..3` are regular; `3..6` only occur for the mirror symmetries and mark the
/// element as orientation reversing. Edges work the same way with flips `0..2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CubieCube {
    pub cp: [Corner; 8],
    pub co: [u8; 8],
    pub ep: [Edge; 12],
    pub eo: [u8; 12],
}

impl Default for CubieCube {
    fn default() -> Self {
        Self::SOLVED
    }
}

use Corner::{DBL, DFR, DLF, DRB, UBR, UFL, ULB, URF};
use Edge::{BL, BR, DB, DF, DL, DR, FL, FR, UB, UF, UL, UR};

/// Clockwise quarter turns of the faces in U, R, F, D, L, B order.
pub(crate) const BASIC_MOVES: [CubieCube; 6] = [
    CubieCube {
        cp: [UBR, URF, UFL, ULB, DFR, DLF, DBL, DRB],
        co: [0; 8],
        ep: [UB, UR, UF, UL, DR, DF, DL, DB, FR, FL, BL, BR],
        eo: [0; 12],
    },
    CubieCube {
        cp: [DFR, UFL, ULB, URF, DRB, DLF, DBL, UBR],
        co: [2, 0, 0, 1, 1, 0, 0, 2],
        ep: [FR, UF, UL, UB, BR, DF, DL, DB, DR, FL, BL, UR],
        eo: [0; 12],
    },
    CubieCube {
        cp: [UFL, DLF, ULB, UBR, URF, DFR, DBL, DRB],
        co: [1, 2, 0, 0, 2, 1, 0, 0],
        ep: [UR, FL, UL, UB, DR, FR, DL, DB, UF, DF, BL, BR],
        eo: [0, 1, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0],
    },
    CubieCube {
        cp: [URF, UFL, ULB, UBR, DLF, DBL, DRB, DFR],
        co: [0; 8],
        ep: [UR, UF, UL, UB, DF, DL, DB, DR, FR, FL, BL, BR],
        eo: [0; 12],
    },
    CubieCube {
        cp: [URF, ULB, DBL, UBR, DFR, UFL, DLF, DRB],
        co: [0, 1, 2, 0, 0, 2, 1, 0],
        ep: [UR, UF, BL, UB, DR, DF, FL, DB, FR, UL, DL, BR],
        eo: [0; 12],
    },
    CubieCube {
        cp: [URF, UFL, UBR, DRB, DFR, DLF, ULB, DBL],
        co: [0, 0, 1, 2, 0, 0, 2, 1],
        ep: [UR, UF, UL, BR, DR, DF, DL, BL, FR, FL, UB, DB],
        eo: [0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 1, 1],
    },
];

/// All 18 face turns, indexed like [`Move`].
pub(crate) static MOVE_CUBES: LazyLock<[CubieCube; 18]> = LazyLock::new(|| {
    let mut cubes = [CubieCube::SOLVED; 18];
    for (face, basic) in BASIC_MOVES.iter().enumerate() {
        let mut cube = CubieCube::SOLVED;
        for power in 0..3 {
            cube.multiply(basic);
            cubes[3 * face + power] = cube;
        }
    }
    cubes
});

impl CubieCube {
    pub const SOLVED: CubieCube = CubieCube {
        cp: Corner::ALL,
        co: [0; 8],
        ep: Edge::ALL,
        eo: [0; 12],
    };

    /// Generates a cube uniformly at random from all reachable states.
    #[must_use]
    pub fn random() -> CubieCube {
        Self::random_with(&mut fastrand::Rng::new())
    }

    /// Like [`CubieCube::random`], drawing from the given generator.
    #[must_use]
    pub fn random_with(rng: &mut fastrand::Rng) -> CubieCube {
        let mut cube = CubieCube::SOLVED;
        rng.shuffle(&mut cube.ep);
        rng.shuffle(&mut cube.cp);
        if cube.corner_parity() != cube.edge_parity() {
            cube.cp.swap(0, 1);
        }
        cube.set_flip(rng.u16(..crate::N_FLIP as u16));
        cube.set_twist(rng.u16(..crate::N_TWIST as u16));
        cube
    }

    /// The cube reached from the solved state by the given moves.
    #[must_use]
    pub fn from_moves(moves: &[Move]) -> CubieCube {
        let mut cube = CubieCube::SOLVED;
        cube.apply_moves(moves);
        cube
    }

    pub fn apply_move(&mut self, mv: Move) {
        self.multiply(mv.cubie());
    }

    pub fn apply_moves(&mut self, moves: &[Move]) {
        for &mv in moves {
            self.apply_move(mv);
        }
    }

    /// Replaces the corners of `self` with those of `self * b`.
    ///
    /// Either operand may be a mirrored element; the twist arithmetic keeps
    /// track of that through the `3..6` range.
    pub fn corner_multiply(&mut self, b: &CubieCube) {
        let mut cp = self.cp;
        let mut co = self.co;
        for c in 0..8 {
            let from = b.cp[c] as usize;
            cp[c] = self.cp[from];
            let ori_a = self.co[from];
            let ori_b = b.co[c];
            co[c] = match (ori_a < 3, ori_b < 3) {
                (true, true) => (ori_a + ori_b) % 3,
                (true, false) => {
                    let ori = ori_a + ori_b;
                    if ori >= 6 { ori - 3 } else { ori }
                }
                (false, true) => {
                    let ori = ori_a - ori_b;
                    if ori < 3 { ori + 3 } else { ori }
                }
                (false, false) => {
                    if ori_a < ori_b {
                        ori_a + 3 - ori_b
                    } else {
                        ori_a - ori_b
                    }
                }
            };
        }
        self.cp = cp;
        self.co = co;
    }

    /// Replaces the edges of `self` with those of `self * b`.
    pub fn edge_multiply(&mut self, b: &CubieCube) {
        let mut ep = self.ep;
        let mut eo = self.eo;
        for e in 0..12 {
            let from = b.ep[e] as usize;
            ep[e] = self.ep[from];
            eo[e] = (b.eo[e] + self.eo[from]) % 2;
        }
        self.ep = ep;
        self.eo = eo;
    }

    pub fn multiply(&mut self, b: &CubieCube) {
        self.corner_multiply(b);
        self.edge_multiply(b);
    }

    /// `self * b` as a new value.
    #[must_use]
    pub fn compose(&self, b: &CubieCube) -> CubieCube {
        let mut out = *self;
        out.multiply(b);
        out
    }

    #[must_use]
    pub fn inverse(&self) -> CubieCube {
        let mut inv = CubieCube::SOLVED;
        for (position, &edge) in self.ep.iter().enumerate() {
            inv.ep[edge as usize] = Edge::ALL[position];
        }
        for e in 0..12 {
            inv.eo[e] = self.eo[inv.ep[e] as usize];
        }
        for (position, &corner) in self.cp.iter().enumerate() {
            inv.cp[corner as usize] = Corner::ALL[position];
        }
        for c in 0..8 {
            let ori = self.co[inv.cp[c] as usize];
            inv.co[c] = if ori >= 3 { ori } else { (3 - ori) % 3 };
        }
        inv
    }

    /// Parity of the corner permutation, 0 for even and 1 for odd.
    #[must_use]
    pub fn corner_parity(&self) -> u8 {
        parity(&self.cp)
    }

    /// Parity of the edge permutation. Reachable cubes have equal corner and
    /// edge parity.
    #[must_use]
    pub fn edge_parity(&self) -> u8 {
        parity(&self.ep)
    }

    /// Checks that this is a reachable cube.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant, checking edges before corners.
    pub fn verify(&self) -> Result<(), CubieError> {
        if !is_permutation(&self.ep) {
            return Err(CubieError::UndefinedEdges);
        }
        if self.eo.iter().any(|&o| o > 1)
            || self.eo.iter().map(|&o| u32::from(o)).sum::<u32>() % 2 != 0
        {
            return Err(CubieError::EdgeFlip);
        }
        if !is_permutation(&self.cp) {
            return Err(CubieError::UndefinedCorners);
        }
        if self.co.iter().any(|&o| o > 2)
            || self.co.iter().map(|&o| u32::from(o)).sum::<u32>() % 3 != 0
        {
            return Err(CubieError::CornerTwist);
        }
        if self.edge_parity() != self.corner_parity() {
            return Err(CubieError::ParityMismatch);
        }
        Ok(())
    }

    /// `S * self * S^-1` where `S` is the `s`th of the 48 symmetries.
    #[must_use]
    pub fn conjugate(&self, s: usize) -> CubieCube {
        let sym_cubes = &*symmetry::SYM_CUBES;
        sym_cubes[s]
            .compose(self)
            .compose(&sym_cubes[symmetry::INV_IDX[s]])
    }

    /// Indices of the symmetries `s` with `s * self * s^-1 == self`, and
    /// `s + 48` for every `s` with `s * self * s^-1 == self^-1`.
    #[must_use]
    pub fn symmetries(&self) -> Vec<usize> {
        let mut syms = Vec::new();
        for s in 0..N_SYM {
            let conjugate = self.conjugate(s);
            if conjugate == *self {
                syms.push(s);
            }
            if conjugate.inverse() == *self {
                syms.push(s + N_SYM);
            }
        }
        syms
    }
}

fn parity<T: Ord>(perm: &[T]) -> u8 {
    let inversions = perm
        .iter()
        .tuple_combinations()
        .filter(|(a, b)| a > b)
        .count();
    (inversions % 2) as u8
}

fn is_permutation<T: Copy + Into<usize>>(perm: &[T]) -> bool {
    let mut seen = vec![false; perm.len()];
    for &p in perm {
        let p: usize = p.into();
        if seen[p] {
            return false;
        }
        seen[p] = true;
    }
    true
}

impl From<Corner> for usize {
    fn from(corner: Corner) -> usize {
        corner as usize
    }
}

impl From<Edge> for usize {
    fn from(edge: Edge) -> usize {
        edge as usize
    }
}

impl fmt::Display for CubieCube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (corner, ori) in self.cp.iter().zip(self.co) {
            write!(f, "({corner:?},{ori})")?;
        }
        writeln!(f)?;
        for (edge, ori) in self.ep.iter().zip(self.eo) {
            write!(f, "({edge:?},{ori})")?;
        }
        Ok(())
    }
}
