//! The cube as 54 colored stickers, and conversion to and from the cubie
//! level.
//!
//! A cube definition string lists the facelets face by face in the order
//! U, R, F, D, L, B. Each face is read row by row as seen from outside the
//! cube, with U and D oriented so that F is at the bottom of U and the top of
//! D. The solved cube is
//! `UUUUUUUUURRRRRRRRRFFFFFFFFFDDDDDDDDDLLLLLLLLLBBBBBBBBB`.

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::cubie::{Corner, CubieCube, CubieError, Edge};

/// Face colors, named after the face whose center carries them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Color {
    U,
    R,
    F,
    D,
    L,
    B,
}

impl Color {
    pub const ALL: [Color; 6] = [Color::U, Color::R, Color::F, Color::D, Color::L, Color::B];

    #[must_use]
    pub fn from_char(c: char) -> Option<Color> {
        match c {
            'U' => Some(Color::U),
            'R' => Some(Color::R),
            'F' => Some(Color::F),
            'D' => Some(Color::D),
            'L' => Some(Color::L),
            'B' => Some(Color::B),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Color::U => 'U',
            Color::R => 'R',
            Color::F => 'F',
            Color::D => 'D',
            Color::L => 'L',
            Color::B => 'B',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Errors from parsing a cube definition string.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FaceletError {
    #[error("cube definition string contains {actual} facelets, expected 54")]
    WrongLength { actual: usize },
    #[error("cube definition string contains invalid character {character:?} at position {position}")]
    InvalidCharacter { character: char, position: usize },
    #[error("cube definition string contains {count} facelets of color {color}, expected 9")]
    WrongColorCount { color: Color, count: usize },
}

// Index of facelet `n` (1-based, row by row) on `face`
const fn facelet(face: Color, n: usize) -> usize {
    9 * face as usize + n - 1
}

use Color::{B, D, F, L, R, U};

/// Facelets of each corner position, starting with the U or D facelet and
/// going clockwise.
const CORNER_FACELETS: [[usize; 3]; 8] = [
    [facelet(U, 9), facelet(R, 1), facelet(F, 3)],
    [facelet(U, 7), facelet(F, 1), facelet(L, 3)],
    [facelet(U, 1), facelet(L, 1), facelet(B, 3)],
    [facelet(U, 3), facelet(B, 1), facelet(R, 3)],
    [facelet(D, 3), facelet(F, 9), facelet(R, 7)],
    [facelet(D, 1), facelet(L, 9), facelet(F, 7)],
    [facelet(D, 7), facelet(B, 9), facelet(L, 7)],
    [facelet(D, 9), facelet(R, 9), facelet(B, 7)],
];

/// Facelets of each edge position, starting with the reference facelet.
const EDGE_FACELETS: [[usize; 2]; 12] = [
    [facelet(U, 6), facelet(R, 2)],
    [facelet(U, 8), facelet(F, 2)],
    [facelet(U, 4), facelet(L, 2)],
    [facelet(U, 2), facelet(B, 2)],
    [facelet(D, 6), facelet(R, 8)],
    [facelet(D, 2), facelet(F, 8)],
    [facelet(D, 4), facelet(L, 8)],
    [facelet(D, 8), facelet(B, 8)],
    [facelet(F, 6), facelet(R, 4)],
    [facelet(F, 4), facelet(L, 6)],
    [facelet(B, 6), facelet(L, 4)],
    [facelet(B, 4), facelet(R, 6)],
];

/// Colors of each corner piece in the same order as [`CORNER_FACELETS`].
const CORNER_COLORS: [[Color; 3]; 8] = [
    [U, R, F],
    [U, F, L],
    [U, L, B],
    [U, B, R],
    [D, F, R],
    [D, L, F],
    [D, B, L],
    [D, R, B],
];

/// Colors of each edge piece in the same order as [`EDGE_FACELETS`].
const EDGE_COLORS: [[Color; 2]; 12] = [
    [U, R],
    [U, F],
    [U, L],
    [U, B],
    [D, R],
    [D, F],
    [D, L],
    [D, B],
    [F, R],
    [F, L],
    [B, L],
    [B, R],
];

/// A cube on the level of its 54 facelets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FaceCube {
    pub f: [Color; 54],
}

impl Default for FaceCube {
    fn default() -> Self {
        Self::SOLVED
    }
}

impl FaceCube {
    pub const SOLVED: FaceCube = {
        let mut f = [Color::U; 54];
        let mut i = 0;
        while i < 54 {
            f[i] = Color::ALL[i / 9];
            i += 1;
        }
        FaceCube { f }
    };

    /// Identifies the piece at every position by its colors.
    ///
    /// # Errors
    ///
    /// Fails when some position shows a color combination no piece has. The
    /// result is not verified beyond that; see [`CubieCube::verify`].
    pub fn to_cubie(&self) -> Result<CubieCube, CubieError> {
        let mut cube = CubieCube::SOLVED;

        for (i, facelets) in EDGE_FACELETS.iter().enumerate() {
            let colors = [self.f[facelets[0]], self.f[facelets[1]]];
            let (piece, flip) = EDGE_COLORS
                .iter()
                .enumerate()
                .find_map(|(j, piece_colors)| {
                    if colors == *piece_colors {
                        Some((j, 0))
                    } else if colors == [piece_colors[1], piece_colors[0]] {
                        Some((j, 1))
                    } else {
                        None
                    }
                })
                .ok_or(CubieError::UndefinedEdges)?;
            cube.ep[i] = Edge::ALL[piece];
            cube.eo[i] = flip;
        }

        for (i, facelets) in CORNER_FACELETS.iter().enumerate() {
            let ori = (0..3)
                .find(|&ori| matches!(self.f[facelets[ori]], Color::U | Color::D))
                .ok_or(CubieError::UndefinedCorners)?;
            let col1 = self.f[facelets[(ori + 1) % 3]];
            let col2 = self.f[facelets[(ori + 2) % 3]];
            let piece = CORNER_COLORS
                .iter()
                .position(|piece_colors| piece_colors[1] == col1 && piece_colors[2] == col2)
                .ok_or(CubieError::UndefinedCorners)?;
            cube.cp[i] = Corner::ALL[piece];
            cube.co[i] = ori as u8;
        }

        Ok(cube)
    }

    /// The unfolded cube: U on top, then L, F, R and B side by side, then D.
    #[must_use]
    pub fn to_2d_string(&self) -> String {
        fn row(s: &str, face: Color, r: usize) -> &str {
            let start = facelet(face, 3 * r + 1);
            &s[start..start + 3]
        }

        let s = self.to_string();

        let mut out = String::new();
        for r in 0..3 {
            out.push_str("   ");
            out.push_str(row(&s, U, r));
            out.push('\n');
        }
        for r in 0..3 {
            for face in [L, F, R, B] {
                out.push_str(row(&s, face, r));
            }
            out.push('\n');
        }
        for r in 0..3 {
            out.push_str("   ");
            out.push_str(row(&s, D, r));
            out.push('\n');
        }
        out
    }
}

impl From<&CubieCube> for FaceCube {
    fn from(cube: &CubieCube) -> Self {
        let mut face = FaceCube::SOLVED;
        for (i, facelets) in CORNER_FACELETS.iter().enumerate() {
            let colors = CORNER_COLORS[cube.cp[i] as usize];
            let ori = usize::from(cube.co[i]);
            for (k, &color) in colors.iter().enumerate() {
                face.f[facelets[(k + ori) % 3]] = color;
            }
        }
        for (i, facelets) in EDGE_FACELETS.iter().enumerate() {
            let colors = EDGE_COLORS[cube.ep[i] as usize];
            let ori = usize::from(cube.eo[i]);
            for (k, &color) in colors.iter().enumerate() {
                face.f[facelets[(k + ori) % 2]] = color;
            }
        }
        face
    }
}

impl FromStr for FaceCube {
    type Err = FaceletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let actual = s.chars().count();
        if actual != 54 {
            return Err(FaceletError::WrongLength { actual });
        }

        let mut face = FaceCube::SOLVED;
        let mut counts = [0; 6];
        for (position, (character, slot)) in s.chars().zip(&mut face.f).enumerate() {
            let color = Color::from_char(character).ok_or(FaceletError::InvalidCharacter {
                character,
                position,
            })?;
            counts[color as usize] += 1;
            *slot = color;
        }

        if let Some((color, &count)) = Color::ALL.into_iter().zip(&counts).find(|&(_, &c)| c != 9) {
            return Err(FaceletError::WrongColorCount { color, count });
        }

        Ok(face)
    }
}

impl fmt::Display for FaceCube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for color in self.f {
            write!(f, "{color}")?;
        }
        Ok(())
    }
}
