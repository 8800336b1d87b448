#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation, clippy::module_name_repetitions)]

//! A two-phase solver for the 3x3x3 cube.
//!
//! A cube is read from its 54-character facelet string, converted to a
//! [`CubieCube`], and solved by an iterative deepening search that first moves
//! it into the subgroup `<U, D, R2, F2, L2, B2>` and then solves it within that
//! subgroup. All move, symmetry and pruning tables live in one immutable
//! [`Tables`] value that is built (or loaded from a [`TableStore`]) once and
//! shared by every search thread.

pub mod coord_cube;
pub mod coords;
pub mod cubie;
pub mod facelet;
pub mod moves;
pub mod pruning;
pub mod solver;
pub mod symmetry;
pub mod tables;

pub use cubie::{Corner, CubieCube, CubieError, Edge};
pub use facelet::{Color, FaceCube, FaceletError};
pub use moves::{Move, MoveParseError, parse_moves};
pub use solver::{Solution, SolveError, TwoPhaseSolver};
pub use tables::{DirStore, NoStore, TableStore, Tables};

#[macro_export]
macro_rules! start {
    ($msg:expr) => {
        concat!("⏳ ", $msg)
    };
}

#[macro_export]
macro_rules! working {
    ($msg:expr) => {
        concat!("🛠  ", $msg)
    };
}

#[macro_export]
macro_rules! success {
    ($msg:expr) => {
        concat!("✅ ", $msg)
    };
}

/// Orderings of four pieces.
pub const N_PERM_4: usize = 24;
/// Ways to place four pieces on eight positions.
pub const N_CHOOSE_8_4: usize = 70;
/// Face turns: six faces, three amounts each.
pub const N_MOVE: usize = 18;

/// Corner orientations, `3^7`.
pub const N_TWIST: usize = 2187;
/// Edge orientations, `2^11`.
pub const N_FLIP: usize = 2048;
/// Placements and orderings of the four slice edges, `12 * 11 * 10 * 9`.
pub const N_SLICE_SORTED: usize = 11880;
/// Placements of the four slice edges ignoring their order.
pub const N_SLICE: usize = N_SLICE_SORTED / N_PERM_4;
/// Classes of the combined flip and slice coordinate under the 16 symmetries.
pub const N_FLIPSLICE_CLASS: usize = 64430;

/// Values the u_edges coordinate can take once phase 1 is solved.
pub const N_U_EDGES_PHASE2: usize = 1680;
/// Corner permutations, `8!`.
pub const N_CORNERS: usize = 40320;
/// Classes of the corner permutation under the 16 symmetries.
pub const N_CORNERS_CLASS: usize = 2768;
/// Permutations of the eight U and D edges, `8!`.
pub const N_UD_EDGES: usize = 40320;

/// Order of the full symmetry group of the cube.
pub const N_SYM: usize = 48;
/// Order of the subgroup that preserves the UD axis.
pub const N_SYM_D4H: usize = 16;

/// The u_edges coordinate of the solved cube. Every other coordinate is 0 when
/// solved.
pub const SOLVED_U_EDGES: u16 = 1656;

// Binomial coefficients up to 12 choose 12
const BINOMIAL: [[u16; 13]; 13] = {
    let mut table = [[0; 13]; 13];
    let mut n = 0;
    while n < 13 {
        table[n][0] = 1;
        let mut k = 1;
        while k <= n {
            table[n][k] = table[n - 1][k - 1] + table[n - 1][k];
            k += 1;
        }
        n += 1;
    }
    table
};

/// `n` choose `k`, zero when `k > n`.
#[must_use]
pub const fn c_nk(n: usize, k: usize) -> usize {
    if k > n { 0 } else { BINOMIAL[n][k] as usize }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn binomials() {
        assert_eq!(c_nk(12, 4), N_SLICE);
        assert_eq!(c_nk(8, 4), N_CHOOSE_8_4);
        assert_eq!(c_nk(11, 0), 1);
        assert_eq!(c_nk(3, 4), 0);
        assert_eq!(c_nk(12, 6), 924);
    }
}
