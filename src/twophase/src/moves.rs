//! Face turns and the move tables that apply them directly to coordinates.

use std::{fmt, str::FromStr};

use log::info;
use thiserror::Error;

use crate::{
    N_CORNERS, N_FLIP, N_MOVE, N_SLICE_SORTED, N_TWIST, N_UD_EDGES,
    cubie::{BASIC_MOVES, CubieCube, MOVE_CUBES},
    facelet::Color,
    start, success,
    tables::{TableStore, load_or_build},
};

/// A clockwise turn of a face by one, two or three quarter turns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Move {
    U1,
    U2,
    U3,
    R1,
    R2,
    R3,
    F1,
    F2,
    F3,
    D1,
    D2,
    D3,
    L1,
    L2,
    L3,
    B1,
    B2,
    B3,
}

impl Move {
    pub const ALL: [Move; N_MOVE] = [
        Move::U1,
        Move::U2,
        Move::U3,
        Move::R1,
        Move::R2,
        Move::R3,
        Move::F1,
        Move::F2,
        Move::F3,
        Move::D1,
        Move::D2,
        Move::D3,
        Move::L1,
        Move::L2,
        Move::L3,
        Move::B1,
        Move::B2,
        Move::B3,
    ];

    /// The moves that keep a cube inside the phase 2 subgroup.
    pub const PHASE2: [Move; 10] = [
        Move::U1,
        Move::U2,
        Move::U3,
        Move::R2,
        Move::F2,
        Move::D1,
        Move::D2,
        Move::D3,
        Move::L2,
        Move::B2,
    ];

    #[must_use]
    pub fn new(face: Color, power: usize) -> Move {
        Move::ALL[3 * face as usize + (power - 1) % 3]
    }

    #[must_use]
    pub fn face(self) -> Color {
        Color::ALL[self as usize / 3]
    }

    /// Number of clockwise quarter turns, `1..=3`.
    #[must_use]
    pub fn power(self) -> usize {
        self as usize % 3 + 1
    }

    #[must_use]
    pub fn inverse(self) -> Move {
        Move::new(self.face(), 4 - self.power())
    }

    #[must_use]
    pub fn is_phase2(self) -> bool {
        Move::PHASE2.contains(&self)
    }

    /// Whether `self` right after `prev` is redundant: it turns the same face,
    /// or the opposite face when that sorts first. A canonical sequence turns
    /// U before D, R before L and F before B.
    #[must_use]
    pub fn is_redundant_after(self, prev: Move) -> bool {
        let diff = prev as isize / 3 - self as isize / 3;
        diff == 0 || diff == 3
    }

    #[must_use]
    pub fn cubie(self) -> &'static CubieCube {
        &MOVE_CUBES[self as usize]
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.face(), self.power())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid move {0:?}")]
pub struct MoveParseError(pub String);

impl FromStr for Move {
    type Err = MoveParseError;

    /// Accepts `U1`, `U2` and `U3` as well as `U`, `U2` and `U'`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let face = chars
            .next()
            .and_then(Color::from_char)
            .ok_or_else(|| MoveParseError(s.to_owned()))?;
        let power = match chars.as_str() {
            "" | "1" => 1,
            "2" => 2,
            "'" | "3" => 3,
            _ => return Err(MoveParseError(s.to_owned())),
        };
        Ok(Move::new(face, power))
    }
}

/// Parses whitespace separated moves.
///
/// # Errors
///
/// Fails on the first token that is not a move.
pub fn parse_moves(s: &str) -> Result<Vec<Move>, MoveParseError> {
    s.split_whitespace().map(str::parse).collect()
}

/// For every coordinate, the value after each of the 18 moves, indexed as
/// `N_MOVE * coord + move`.
pub struct MoveTables {
    pub twist: Vec<u16>,
    pub flip: Vec<u16>,
    pub slice_sorted: Vec<u16>,
    pub u_edges: Vec<u16>,
    pub d_edges: Vec<u16>,
    /// Only filled for the phase 2 moves.
    pub ud_edges: Vec<u16>,
    pub corners: Vec<u16>,
}

#[derive(Clone, Copy)]
enum Pieces {
    Corners,
    Edges,
}

fn build_move_table(
    size: usize,
    pieces: Pieces,
    set: fn(&mut CubieCube, u16),
    get: fn(&CubieCube) -> u16,
    phase2_only: bool,
) -> Vec<u16> {
    let mut table = vec![0; size * N_MOVE];
    for coord in 0..size {
        let mut cube = CubieCube::SOLVED;
        set(&mut cube, coord as u16);
        for (face, basic) in BASIC_MOVES.iter().enumerate() {
            // The fourth turn restores the face
            for power in 0..4 {
                match pieces {
                    Pieces::Corners => cube.corner_multiply(basic),
                    Pieces::Edges => cube.edge_multiply(basic),
                }
                let m = 3 * face + power;
                if power < 3 && (!phase2_only || Move::ALL[m].is_phase2()) {
                    table[N_MOVE * coord + m] = get(&cube);
                }
            }
        }
    }
    table
}

impl MoveTables {
    pub(crate) fn load_or_build(store: &dyn TableStore) -> MoveTables {
        info!(start!("Loading move tables"));

        let twist = load_or_build(store, "move_twist", N_TWIST * N_MOVE, || {
            build_move_table(
                N_TWIST,
                Pieces::Corners,
                CubieCube::set_twist,
                CubieCube::twist,
                false,
            )
        });
        let flip = load_or_build(store, "move_flip", N_FLIP * N_MOVE, || {
            build_move_table(
                N_FLIP,
                Pieces::Edges,
                CubieCube::set_flip,
                CubieCube::flip,
                false,
            )
        });
        let slice_sorted = load_or_build(store, "move_slice_sorted", N_SLICE_SORTED * N_MOVE, || {
            build_move_table(
                N_SLICE_SORTED,
                Pieces::Edges,
                CubieCube::set_slice_sorted,
                CubieCube::slice_sorted,
                false,
            )
        });
        let u_edges = load_or_build(store, "move_u_edges", N_SLICE_SORTED * N_MOVE, || {
            build_move_table(
                N_SLICE_SORTED,
                Pieces::Edges,
                CubieCube::set_u_edges,
                CubieCube::u_edges,
                false,
            )
        });
        let d_edges = load_or_build(store, "move_d_edges", N_SLICE_SORTED * N_MOVE, || {
            build_move_table(
                N_SLICE_SORTED,
                Pieces::Edges,
                CubieCube::set_d_edges,
                CubieCube::d_edges,
                false,
            )
        });
        let ud_edges = load_or_build(store, "move_ud_edges", N_UD_EDGES * N_MOVE, || {
            build_move_table(
                N_UD_EDGES,
                Pieces::Edges,
                CubieCube::set_ud_edges,
                CubieCube::ud_edges,
                true,
            )
        });
        let corners = load_or_build(store, "move_corners", N_CORNERS * N_MOVE, || {
            build_move_table(
                N_CORNERS,
                Pieces::Corners,
                CubieCube::set_corners,
                CubieCube::corners,
                false,
            )
        });

        info!(success!("Move tables ready"));

        MoveTables {
            twist,
            flip,
            slice_sorted,
            u_edges,
            d_edges,
            ud_edges,
            corners,
        }
    }

    #[must_use]
    pub fn twist(&self, twist: u16, m: Move) -> u16 {
        self.twist[N_MOVE * usize::from(twist) + m as usize]
    }

    #[must_use]
    pub fn flip(&self, flip: u16, m: Move) -> u16 {
        self.flip[N_MOVE * usize::from(flip) + m as usize]
    }

    #[must_use]
    pub fn slice_sorted(&self, slice_sorted: u16, m: Move) -> u16 {
        self.slice_sorted[N_MOVE * usize::from(slice_sorted) + m as usize]
    }

    #[must_use]
    pub fn u_edges(&self, u_edges: u16, m: Move) -> u16 {
        self.u_edges[N_MOVE * usize::from(u_edges) + m as usize]
    }

    #[must_use]
    pub fn d_edges(&self, d_edges: u16, m: Move) -> u16 {
        self.d_edges[N_MOVE * usize::from(d_edges) + m as usize]
    }

    /// `m` must be a phase 2 move.
    #[must_use]
    pub fn ud_edges(&self, ud_edges: u16, m: Move) -> u16 {
        self.ud_edges[N_MOVE * usize::from(ud_edges) + m as usize]
    }

    #[must_use]
    pub fn corners(&self, corners: u16, m: Move) -> u16 {
        self.corners[N_MOVE * usize::from(corners) + m as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::NoStore;

    #[test_log::test]
    fn test_move_names() {
        assert_eq!(Move::U1.to_string(), "U1");
        assert_eq!(Move::B3.to_string(), "B3");
        assert_eq!(Move::R2.face(), Color::R);
        assert_eq!(Move::R2.power(), 2);
        assert_eq!(Move::F1.inverse(), Move::F3);
        assert_eq!(Move::D2.inverse(), Move::D2);
    }

    #[test_log::test]
    fn test_parse_moves() {
        assert_eq!(
            parse_moves("U R' F2 D3 L1  B").unwrap(),
            vec![Move::U1, Move::R3, Move::F2, Move::D3, Move::L1, Move::B1]
        );
        assert_eq!(parse_moves("").unwrap(), vec![]);
        assert_eq!(parse_moves("U X"), Err(MoveParseError("X".to_owned())));
        assert_eq!(parse_moves("U4"), Err(MoveParseError("U4".to_owned())));
    }

    #[test_log::test]
    fn test_move_inverse_cubies() {
        for m in Move::ALL {
            assert_eq!(m.cubie().compose(m.inverse().cubie()), CubieCube::SOLVED);
        }
    }

    #[test_log::test]
    fn test_redundant_moves() {
        assert!(Move::U2.is_redundant_after(Move::U1));
        // D then U is the non canonical order of two commuting turns
        assert!(Move::U1.is_redundant_after(Move::D1));
        assert!(!Move::D1.is_redundant_after(Move::U1));
        assert!(!Move::R1.is_redundant_after(Move::U1));
        assert!(Move::R3.is_redundant_after(Move::L2));
    }

    #[test_log::test]
    fn test_move_tables_match_cubies() {
        let tables = MoveTables::load_or_build(&NoStore);
        let mut rng = fastrand::Rng::with_seed(9);

        for _ in 0..200 {
            let cube = CubieCube::random_with(&mut rng);
            for m in Move::ALL {
                let moved = cube.compose(m.cubie());
                assert_eq!(tables.twist(cube.twist(), m), moved.twist());
                assert_eq!(tables.flip(cube.flip(), m), moved.flip());
                assert_eq!(
                    tables.slice_sorted(cube.slice_sorted(), m),
                    moved.slice_sorted()
                );
                assert_eq!(tables.u_edges(cube.u_edges(), m), moved.u_edges());
                assert_eq!(tables.d_edges(cube.d_edges(), m), moved.d_edges());
                assert_eq!(tables.corners(cube.corners(), m), moved.corners());
            }
        }

        let mut cube = CubieCube::SOLVED;
        for _ in 0..200 {
            let m = Move::PHASE2[rng.usize(..Move::PHASE2.len())];
            let moved = cube.compose(m.cubie());
            assert_eq!(tables.ud_edges(cube.ud_edges(), m), moved.ud_edges());
            cube = moved;
        }
    }
}
