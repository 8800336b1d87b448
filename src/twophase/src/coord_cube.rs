//! A cube on the coordinate level, as the search sees it.

use std::fmt;

use crate::{
    N_CHOOSE_8_4, N_FLIP, N_PERM_4, N_U_EDGES_PHASE2, SOLVED_U_EDGES,
    cubie::{CubieCube, Edge},
    moves::Move,
    pruning::PHASE2_MAX_DEPTH,
    tables::Tables,
};

/// All coordinates of one cube plus the symmetry classes of its phase 1
/// flipslice and its corner permutation.
#[derive(Clone, Copy)]
pub struct CoordCube<'t> {
    tables: &'t Tables,
    pub twist: u16,
    pub flip: u16,
    pub slice_sorted: u16,
    pub u_edges: u16,
    pub d_edges: u16,
    pub corners: u16,
    /// Only known while the cube is in the phase 2 subgroup.
    pub ud_edges: Option<u16>,
    pub flipslice_classidx: u16,
    pub flipslice_sym: u8,
    pub flipslice_rep: u32,
    pub corner_classidx: u16,
    pub corner_sym: u8,
    pub corner_rep: u32,
}

impl<'t> CoordCube<'t> {
    #[must_use]
    pub fn new(tables: &'t Tables, cube: &CubieCube) -> CoordCube<'t> {
        let slice_sorted = cube.slice_sorted();
        let ud_edges = (usize::from(slice_sorted) < N_PERM_4).then(|| cube.ud_edges());

        let mut coord = CoordCube {
            tables,
            twist: cube.twist(),
            flip: cube.flip(),
            slice_sorted,
            u_edges: cube.u_edges(),
            d_edges: cube.d_edges(),
            corners: cube.corners(),
            ud_edges,
            flipslice_classidx: 0,
            flipslice_sym: 0,
            flipslice_rep: 0,
            corner_classidx: 0,
            corner_sym: 0,
            corner_rep: 0,
        };
        coord.update_classes();
        coord
    }

    /// The solved cube, without going through a [`CubieCube`].
    #[must_use]
    pub fn solved(tables: &'t Tables) -> CoordCube<'t> {
        let mut coord = CoordCube {
            tables,
            twist: 0,
            flip: 0,
            slice_sorted: 0,
            u_edges: SOLVED_U_EDGES,
            d_edges: 0,
            corners: 0,
            ud_edges: Some(0),
            flipslice_classidx: 0,
            flipslice_sym: 0,
            flipslice_rep: 0,
            corner_classidx: 0,
            corner_sym: 0,
            corner_rep: 0,
        };
        coord.update_classes();
        coord
    }

    fn update_classes(&mut self) {
        let sym = &self.tables.symmetry;

        let flipslice = N_FLIP * (usize::from(self.slice_sorted) / N_PERM_4) + usize::from(self.flip);
        self.flipslice_classidx = sym.flipslice_classidx[flipslice];
        self.flipslice_sym = sym.flipslice_sym[flipslice];
        self.flipslice_rep = sym.flipslice_rep[usize::from(self.flipslice_classidx)];

        let corners = usize::from(self.corners);
        self.corner_classidx = sym.corner_classidx[corners];
        self.corner_sym = sym.corner_sym[corners];
        self.corner_rep = sym.corner_rep[usize::from(self.corner_classidx)];
    }

    /// Applies any move. The ud_edges coordinate is recovered from the u_edges
    /// and d_edges coordinates whenever the move lands in the phase 2
    /// subgroup's slice position.
    pub fn apply_phase1_move(&mut self, m: Move) {
        let tables = self.tables;
        let moves = &tables.moves;
        self.twist = moves.twist(self.twist, m);
        self.flip = moves.flip(self.flip, m);
        self.slice_sorted = moves.slice_sorted(self.slice_sorted, m);
        self.u_edges = moves.u_edges(self.u_edges, m);
        self.d_edges = moves.d_edges(self.d_edges, m);
        self.corners = moves.corners(self.corners, m);
        self.ud_edges = (usize::from(self.slice_sorted) < N_PERM_4)
            .then(|| tables.merge_ud_edges(self.u_edges, self.d_edges));
        self.update_classes();
    }

    /// Applies one of [`Move::PHASE2`] to a cube in the phase 2 subgroup.
    pub fn apply_phase2_move(&mut self, m: Move) {
        let moves = &self.tables.moves;
        self.slice_sorted = moves.slice_sorted(self.slice_sorted, m);
        self.corners = moves.corners(self.corners, m);
        self.ud_edges = self.ud_edges.map(|ud_edges| moves.ud_edges(ud_edges, m));
    }

    #[must_use]
    pub fn is_phase1_solved(&self) -> bool {
        self.twist == 0 && self.flip == 0 && self.slice_sorted / N_PERM_4 as u16 == 0
    }

    /// Exact number of moves to the phase 2 subgroup.
    ///
    /// The table only knows the distance mod 3, so this walks down to the
    /// subgroup through neighbors one closer.
    #[must_use]
    pub fn phase1_depth(&self) -> usize {
        let tables = self.tables;
        let mut flip = self.flip;
        let mut twist = self.twist;
        let mut slice_sorted = self.slice_sorted;
        let mut depth3 = tables.phase1_depth3(flip, twist, slice_sorted);
        let mut depth = 0;

        while flip != 0 || twist != 0 || usize::from(slice_sorted) >= N_PERM_4 {
            if depth3 == 0 {
                depth3 = 3;
            }
            let Some((flip1, twist1, slice_sorted1)) = Move::ALL
                .iter()
                .map(|&m| {
                    (
                        tables.moves.flip(flip, m),
                        tables.moves.twist(twist, m),
                        tables.moves.slice_sorted(slice_sorted, m),
                    )
                })
                .find(|&(f, t, s)| tables.phase1_depth3(f, t, s) == depth3 - 1)
            else {
                break;
            };
            flip = flip1;
            twist = twist1;
            slice_sorted = slice_sorted1;
            depth3 -= 1;
            depth += 1;
        }
        depth
    }

    /// Number of moves that solve the corners and the U and D edges of a cube
    /// in the phase 2 subgroup, or [`PHASE2_MAX_DEPTH`] + 1 when the table
    /// only knows it is at least that many.
    #[must_use]
    pub fn phase2_depth(&self, corners: u16, ud_edges: u16) -> usize {
        let tables = self.tables;
        let mut corners = corners;
        let mut ud_edges = ud_edges;
        let mut depth3 = tables.phase2_depth3(corners, ud_edges);
        if depth3 == 3 {
            return PHASE2_MAX_DEPTH + 1;
        }
        let mut depth = 0;

        while corners != 0 || ud_edges != 0 {
            if depth3 == 0 {
                depth3 = 3;
            }
            let Some((corners1, ud_edges1)) = Move::PHASE2
                .iter()
                .map(|&m| (tables.moves.corners(corners, m), tables.moves.ud_edges(ud_edges, m)))
                .find(|&(c, u)| tables.phase2_depth3(c, u) == depth3 - 1)
            else {
                break;
            };
            corners = corners1;
            ud_edges = ud_edges1;
            depth3 -= 1;
            depth += 1;
        }
        depth
    }
}

impl fmt::Debug for CoordCube<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordCube")
            .field("twist", &self.twist)
            .field("flip", &self.flip)
            .field("slice_sorted", &self.slice_sorted)
            .field("u_edges", &self.u_edges)
            .field("d_edges", &self.d_edges)
            .field("corners", &self.corners)
            .field("ud_edges", &self.ud_edges)
            .field("flipslice_class", &(self.flipslice_classidx, self.flipslice_sym))
            .field("corner_class", &(self.corner_classidx, self.corner_sym))
            .finish_non_exhaustive()
    }
}

fn is_u_edge(e: Edge) -> bool {
    (e as u8) < 4
}

fn is_d_edge(e: Edge) -> bool {
    (4..8).contains(&(e as u8))
}

/// The eight U and D edge positions of `u` and `d` combined, taking the U
/// edges from `u` and the D edges from `d`. `None` when some position gets
/// neither.
fn merge_edges(u: &CubieCube, d: &CubieCube) -> Option<CubieCube> {
    let mut merged = CubieCube::SOLVED;
    for (slot, (&eu, &ed)) in merged.ep[..8].iter_mut().zip(u.ep.iter().zip(&d.ep)) {
        *slot = if is_d_edge(ed) {
            ed
        } else if is_u_edge(eu) {
            eu
        } else {
            return None;
        };
    }
    Some(merged)
}

/// Table from phase 2 u_edges and d_edges coordinates to the ud_edges
/// coordinate, indexed as `24 * u_edges + d_edges % 24`.
///
/// Once phase 1 is solved the D edges fill exactly the positions the U edges
/// leave free, so the location part of d_edges is implied by u_edges.
pub(crate) fn build_edge_merge() -> Vec<u16> {
    let mut table = vec![0; N_U_EDGES_PHASE2 * N_PERM_4];
    let mut u = CubieCube::SOLVED;
    let mut d = CubieCube::SOLVED;

    for i in 0..N_U_EDGES_PHASE2 {
        u.set_u_edges(i as u16);
        for j in 0..N_CHOOSE_8_4 {
            d.set_d_edges((N_PERM_4 * j) as u16);
            if merge_edges(&u, &d).is_none() {
                continue;
            }
            for k in 0..N_PERM_4 {
                d.set_d_edges((N_PERM_4 * j + k) as u16);
                if let Some(merged) = merge_edges(&u, &d) {
                    table[N_PERM_4 * i + k] = merged.ud_edges();
                }
            }
        }
    }

    table
}

impl Tables {
    /// The ud_edges coordinate of a cube in the phase 2 subgroup.
    #[must_use]
    pub fn merge_ud_edges(&self, u_edges: u16, d_edges: u16) -> u16 {
        self.edge_merge[N_PERM_4 * usize::from(u_edges) + usize::from(d_edges) % N_PERM_4]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::parse_moves;

    #[test_log::test]
    fn test_edge_merge_matches_cubies() {
        let table = build_edge_merge();
        let mut rng = fastrand::Rng::with_seed(3);
        let mut cube = CubieCube::SOLVED;

        for _ in 0..500 {
            cube.apply_move(Move::PHASE2[rng.usize(..Move::PHASE2.len())]);
            let idx = N_PERM_4 * usize::from(cube.u_edges()) + usize::from(cube.d_edges()) % N_PERM_4;
            assert_eq!(table[idx], cube.ud_edges());
        }

        let solved = N_PERM_4 * usize::from(SOLVED_U_EDGES);
        assert_eq!(table[solved], 0);
    }

    #[test_log::test]
    fn test_merge_edges_rejects_collisions() {
        let u = CubieCube::SOLVED;
        assert!(merge_edges(&u, &CubieCube::SOLVED).is_some());

        // R moves UR into the slice, so no U or D edge covers its position
        let r = CubieCube::from_moves(&parse_moves("R").unwrap());
        assert!(merge_edges(&r, &r).is_none());
    }
}
