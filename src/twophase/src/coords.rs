//! Coordinates: bijections between parts of a [`CubieCube`] and small
//! integers.
//!
//! Placements of four edges among twelve positions are ranked with the
//! combinatorial number system and their order with a factorial-base rank.
//! Every setter only touches the pieces its coordinate describes, except the
//! four-edge setters which overwrite all twelve edges.

use crate::{
    N_PERM_4, c_nk,
    cubie::{Corner, CubieCube, Edge},
};

use Edge::{BL, BR, DB, DF, DL, DR, FL, FR, UB, UF, UL, UR};

const SLICE_EDGES: [Edge; 4] = [FR, FL, BL, BR];
const U_EDGES: [Edge; 4] = [UR, UF, UL, UB];
const D_EDGES: [Edge; 4] = [DR, DF, DL, DB];

/// Factorial-base rank of `perm`, whose entries are `offset..offset + perm.len()`.
/// Scrambles `perm` in the process.
fn rank_permutation(perm: &mut [u8], offset: usize) -> usize {
    let mut rank = 0;
    for j in (1..perm.len()).rev() {
        // Left rotations of perm[..=j] until j + offset sits at position j
        let k = perm[..=j]
            .iter()
            .position(|&p| usize::from(p) == j + offset)
            .map_or(0, |pos| (pos + 1) % (j + 1));
        perm[..=j].rotate_left(k);
        rank = (j + 1) * rank + k;
    }
    rank
}

/// Inverse of [`rank_permutation`]; `perm` must start out sorted.
fn unrank_permutation<T>(perm: &mut [T], mut rank: usize) {
    for j in 0..perm.len() {
        let k = rank % (j + 1);
        rank /= j + 1;
        perm[..=j].rotate_right(k);
    }
}

/// Location and order of the four edges `first..first + 4` within `ep`.
fn edge4_coord(ep: &[Edge; 12], first: Edge) -> u16 {
    let first = first as u8;
    let mut location = 0;
    let mut found = 0;
    let mut edge4 = [0; 4];
    for j in (0..12).rev() {
        let e = ep[j] as u8;
        if (first..first + 4).contains(&e) && found < 4 {
            location += c_nk(11 - j, found + 1);
            edge4[3 - found] = e;
            found += 1;
        }
    }
    let order = rank_permutation(&mut edge4, usize::from(first));
    (N_PERM_4 * location + order) as u16
}

fn set_edge4(ep: &mut [Edge; 12], idx: u16, mut chosen: [Edge; 4], others: [Edge; 8]) {
    let idx = usize::from(idx);
    let mut location = idx / N_PERM_4;
    unrank_permutation(&mut chosen, idx % N_PERM_4);

    let mut placed = [None; 12];
    let mut left = 4;
    for (j, slot) in placed.iter_mut().enumerate() {
        if left > 0 && location >= c_nk(11 - j, left) {
            *slot = Some(chosen[4 - left]);
            location -= c_nk(11 - j, left);
            left -= 1;
        }
    }

    let mut rest = others.iter().copied();
    for (edge, slot) in ep.iter_mut().zip(placed) {
        if let Some(e) = slot.or_else(|| rest.next()) {
            *edge = e;
        }
    }
}

impl CubieCube {
    /// Twist of the corners, `0..2187`. The last corner's twist is implied.
    #[must_use]
    pub fn twist(&self) -> u16 {
        self.co[..7]
            .iter()
            .fold(0, |acc, &ori| 3 * acc + u16::from(ori))
    }

    pub fn set_twist(&mut self, mut twist: u16) {
        let mut total = 0;
        for ori in self.co[..7].iter_mut().rev() {
            *ori = (twist % 3) as u8;
            total += *ori;
            twist /= 3;
        }
        self.co[7] = (3 - total % 3) % 3;
    }

    /// Flip of the edges, `0..2048`. The last edge's flip is implied.
    #[must_use]
    pub fn flip(&self) -> u16 {
        self.eo[..11]
            .iter()
            .fold(0, |acc, &ori| 2 * acc + u16::from(ori))
    }

    pub fn set_flip(&mut self, mut flip: u16) {
        let mut total = 0;
        for ori in self.eo[..11].iter_mut().rev() {
            *ori = (flip % 2) as u8;
            total += *ori;
            flip /= 2;
        }
        self.eo[11] = (2 - total % 2) % 2;
    }

    /// Location of the FR, FL, BL and BR edges ignoring their order, `0..495`.
    /// Zero exactly when they are all in the middle slice.
    #[must_use]
    pub fn slice(&self) -> u16 {
        self.slice_sorted() / N_PERM_4 as u16
    }

    pub fn set_slice(&mut self, slice: u16) {
        self.set_slice_sorted(slice * N_PERM_4 as u16);
    }

    /// Location and order of the FR, FL, BL and BR edges, `0..11880`, and
    /// `0..24` once they are in the middle slice.
    #[must_use]
    pub fn slice_sorted(&self) -> u16 {
        edge4_coord(&self.ep, FR)
    }

    pub fn set_slice_sorted(&mut self, idx: u16) {
        set_edge4(&mut self.ep, idx, SLICE_EDGES, [UR, UF, UL, UB, DR, DF, DL, DB]);
    }

    /// Location and order of the UR, UF, UL and UB edges, `0..11880`, and
    /// `0..1680` once the slice edges are in the middle slice.
    ///
    /// Ranked on the edges rotated right by four positions, which gives the
    /// solved cube [`crate::SOLVED_U_EDGES`].
    #[must_use]
    pub fn u_edges(&self) -> u16 {
        let mut ep = self.ep;
        ep.rotate_right(4);
        edge4_coord(&ep, UR)
    }

    pub fn set_u_edges(&mut self, idx: u16) {
        set_edge4(&mut self.ep, idx, U_EDGES, [DR, DF, DL, DB, FR, FL, BL, BR]);
        self.ep.rotate_left(4);
    }

    /// Location and order of the DR, DF, DL and DB edges, with the same
    /// ranges as [`CubieCube::u_edges`].
    #[must_use]
    pub fn d_edges(&self) -> u16 {
        let mut ep = self.ep;
        ep.rotate_right(4);
        edge4_coord(&ep, DR)
    }

    pub fn set_d_edges(&mut self, idx: u16) {
        set_edge4(&mut self.ep, idx, D_EDGES, [FR, FL, BL, BR, UR, UF, UL, UB]);
        self.ep.rotate_left(4);
    }

    /// Corner permutation, `0..40320`.
    #[must_use]
    pub fn corners(&self) -> u16 {
        let mut perm = self.cp.map(|c| c as u8);
        rank_permutation(&mut perm, 0) as u16
    }

    pub fn set_corners(&mut self, idx: u16) {
        self.cp = Corner::ALL;
        unrank_permutation(&mut self.cp, usize::from(idx));
    }

    /// Permutation of the eight U and D edges, `0..40320`. Only meaningful
    /// when the slice edges are in the middle slice.
    #[must_use]
    pub fn ud_edges(&self) -> u16 {
        let mut perm = [0; 8];
        for (p, &e) in perm.iter_mut().zip(&self.ep) {
            *p = e as u8;
        }
        rank_permutation(&mut perm, 0) as u16
    }

    /// Leaves the four slice edges where they are.
    pub fn set_ud_edges(&mut self, idx: u16) {
        self.ep[..8].copy_from_slice(&Edge::ALL[..8]);
        unrank_permutation(&mut self.ep[..8], usize::from(idx));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        N_CORNERS, N_FLIP, N_SLICE, N_SLICE_SORTED, N_TWIST, N_UD_EDGES, SOLVED_U_EDGES,
        moves::{Move, parse_moves},
    };

    #[test_log::test]
    fn test_solved_coordinates() {
        let cube = CubieCube::SOLVED;
        assert_eq!(cube.twist(), 0);
        assert_eq!(cube.flip(), 0);
        assert_eq!(cube.slice(), 0);
        assert_eq!(cube.slice_sorted(), 0);
        assert_eq!(cube.u_edges(), SOLVED_U_EDGES);
        assert_eq!(cube.d_edges(), 0);
        assert_eq!(cube.corners(), 0);
        assert_eq!(cube.ud_edges(), 0);
    }

    #[test_log::test]
    fn test_orientation_round_trip() {
        let mut cube = CubieCube::SOLVED;
        for twist in 0..N_TWIST as u16 {
            cube.set_twist(twist);
            assert_eq!(cube.twist(), twist);
            assert_eq!(cube.co.iter().map(|&o| u32::from(o)).sum::<u32>() % 3, 0);
        }
        for flip in 0..N_FLIP as u16 {
            cube.set_flip(flip);
            assert_eq!(cube.flip(), flip);
            assert_eq!(cube.eo.iter().map(|&o| u32::from(o)).sum::<u32>() % 2, 0);
        }
    }

    #[test_log::test]
    fn test_edge4_round_trip() {
        let mut cube = CubieCube::SOLVED;
        for idx in 0..N_SLICE_SORTED as u16 {
            cube.set_slice_sorted(idx);
            assert_eq!(cube.slice_sorted(), idx);
            cube.set_u_edges(idx);
            assert_eq!(cube.u_edges(), idx);
            cube.set_d_edges(idx);
            assert_eq!(cube.d_edges(), idx);
        }
        for slice in 0..N_SLICE as u16 {
            cube.set_slice(slice);
            assert_eq!(cube.slice(), slice);
        }
    }

    #[test_log::test]
    fn test_permutation_round_trip() {
        let mut cube = CubieCube::SOLVED;
        for idx in 0..N_CORNERS as u16 {
            cube.set_corners(idx);
            assert_eq!(cube.corners(), idx);
        }
        for idx in 0..N_UD_EDGES as u16 {
            cube.set_ud_edges(idx);
            assert_eq!(cube.ud_edges(), idx);
        }
    }

    #[test_log::test]
    fn test_phase2_ranges() {
        let mut rng = fastrand::Rng::with_seed(11);
        let mut cube = CubieCube::SOLVED;
        for _ in 0..300 {
            cube.apply_move(Move::PHASE2[rng.usize(..Move::PHASE2.len())]);
            assert_eq!(cube.twist(), 0);
            assert_eq!(cube.flip(), 0);
            assert_eq!(cube.slice(), 0);
            assert!(cube.slice_sorted() < 24);
            assert!(usize::from(cube.u_edges()) < crate::N_U_EDGES_PHASE2);
            assert!(usize::from(cube.d_edges()) < crate::N_U_EDGES_PHASE2);
        }
    }

    #[test_log::test]
    fn test_quarter_turn_leaves_subgroup() {
        let cube = CubieCube::from_moves(&parse_moves("R").unwrap());
        assert_ne!(cube.slice(), 0);
        assert_ne!(cube.twist(), 0);
        assert_eq!(cube.flip(), 0);
    }
}
