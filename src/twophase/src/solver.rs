use std::{
    fmt,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    N_SYM, N_SYM_D4H,
    coord_cube::CoordCube,
    cubie::{CubieCube, CubieError},
    facelet::{FaceCube, FaceletError},
    moves::Move,
    pruning::{DISTANCE, PHASE2_MAX_DEPTH},
    start, success,
    tables::Tables,
    working,
};

/// Phase 1 never needs more moves than this.
const MAX_PHASE1_DEPTH: usize = 20;

/// Which of the cubes passed to [`TwoPhaseSolver::solve_to`] was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CubeRole {
    Start,
    Goal,
}

impl fmt::Display for CubeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CubeRole::Start => "start",
            CubeRole::Goal => "goal",
        })
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SolveError {
    /// The definition string is malformed.
    #[error("invalid {role} cube: {source}")]
    Facelet {
        role: CubeRole,
        #[source]
        source: FaceletError,
    },
    /// The definition string describes a cube that cannot be reached by
    /// turning faces.
    #[error("invalid {role} cube: {source}")]
    Cubie {
        role: CubeRole,
        #[source]
        source: CubieError,
    },
}

impl SolveError {
    #[must_use]
    pub fn role(&self) -> CubeRole {
        match self {
            SolveError::Facelet { role, .. } | SolveError::Cubie { role, .. } => *role,
        }
    }
}

fn parse_cube(definition: &str, role: CubeRole) -> Result<CubieCube, SolveError> {
    let face_cube: FaceCube = definition
        .parse()
        .map_err(|source| SolveError::Facelet { role, source })?;
    let cube = face_cube
        .to_cubie()
        .map_err(|source| SolveError::Cubie { role, source })?;
    cube.verify()
        .map_err(|source| SolveError::Cubie { role, source })?;
    Ok(cube)
}

/// A move sequence that solves a cube.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Solution {
    pub moves: Vec<Move>,
}

impl Solution {
    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

impl fmt::Display for Solution {
    /// `U1 R2 (2f)`; the solved cube gives `(0f)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in &self.moves {
            write!(f, "{m} ")?;
        }
        write!(f, "({}f)", self.moves.len())
    }
}

/// State shared by all search variants of one solve.
struct Shared {
    /// Every accepted solution is shorter than the one before it.
    solutions: Mutex<Vec<Vec<Move>>>,
    shortest: AtomicUsize,
    terminated: AtomicBool,
}

/// State owned by one search variant.
struct SearchMutable<'t> {
    coord: CoordCube<'t>,
    /// Conjugate the cube by the `16 * rot`th symmetry.
    rot: usize,
    /// Search the inverse cube.
    inverse: bool,
    sofar_phase1: Vec<Move>,
    sofar_phase2: Vec<Move>,
    phase2_done: bool,
    /// Corners after the most recent phase 1 sequence.
    corners_save: u16,
}

impl SearchMutable<'_> {
    fn variant(&self) -> usize {
        self.rot + 3 * usize::from(self.inverse)
    }
}

/// Runs the two-phase search on up to six transformed copies of a cube in
/// parallel and returns the shortest solution any of them found.
///
/// The search returns as soon as it has a solution of at most `max_length`
/// moves. After `timeout` it also returns the best solution so far, if there
/// is one.
pub struct TwoPhaseSolver<'t> {
    tables: &'t Tables,
    max_length: usize,
    timeout: Duration,
}

impl<'t> TwoPhaseSolver<'t> {
    #[must_use]
    pub fn new(tables: &'t Tables) -> Self {
        TwoPhaseSolver {
            tables,
            max_length: 20,
            timeout: Duration::from_secs(3),
        }
    }

    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Solves the cube given by its 54-character definition string.
    ///
    /// # Errors
    ///
    /// Fails when the string is malformed or does not describe a solvable
    /// cube.
    pub fn solve(&self, definition: &str) -> Result<Solution, SolveError> {
        let cube = parse_cube(definition, CubeRole::Start)?;
        Ok(self.search(&cube))
    }

    /// Finds a move sequence that turns the cube `start` into the cube `goal`.
    ///
    /// # Errors
    ///
    /// Fails when either string is malformed or does not describe a solvable
    /// cube.
    pub fn solve_to(&self, start: &str, goal: &str) -> Result<Solution, SolveError> {
        let start = parse_cube(start, CubeRole::Start)?;
        let goal = parse_cube(goal, CubeRole::Goal)?;
        // start * S = goal exactly when (goal^-1 * start) * S = id
        Ok(self.search(&goal.inverse().compose(&start)))
    }

    /// Solves an already constructed cube.
    ///
    /// # Errors
    ///
    /// Fails when the cube is not solvable.
    pub fn solve_cube(&self, cube: &CubieCube) -> Result<Solution, CubieError> {
        cube.verify()?;
        Ok(self.search(cube))
    }

    fn search(&self, cube: &CubieCube) -> Solution {
        info!(start!("Solving cube"));
        let started = Instant::now();
        // A timeout too long to represent never expires
        let deadline = started.checked_add(self.timeout);

        let shared = Shared {
            solutions: Mutex::new(Vec::new()),
            shortest: AtomicUsize::new(usize::MAX),
            terminated: AtomicBool::new(false),
        };

        let variants = search_variants(cube);
        debug!("Searching variants {variants:?}");

        thread::scope(|scope| {
            for variant in variants {
                let shared = &shared;
                scope.spawn(move || {
                    let mut mutable = self.prepare(cube, variant % 3, variant / 3 == 1);
                    self.run(&mut mutable, shared, deadline);
                    debug!("Variant {variant} finished");
                });
            }
        });

        let solutions = shared
            .solutions
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(moves) = solutions.into_iter().next_back() else {
            warn!("No variant found a solution");
            return Solution::default();
        };

        info!(
            success!("Found a {} move solution in {:.2?}"),
            moves.len(),
            started.elapsed()
        );
        Solution { moves }
    }

    fn prepare(&self, cube: &CubieCube, rot: usize, inverse: bool) -> SearchMutable<'t> {
        // Symmetries 16 and 32 are the two rotations around the URF-DBL
        // diagonal
        let mut transformed = match rot {
            1 => cube.conjugate(32),
            2 => cube.conjugate(16),
            _ => *cube,
        };
        if inverse {
            transformed = transformed.inverse();
        }

        SearchMutable {
            coord: CoordCube::new(self.tables, &transformed),
            rot,
            inverse,
            sofar_phase1: Vec::new(),
            sofar_phase2: Vec::new(),
            phase2_done: false,
            corners_save: 0,
        }
    }

    fn run(&self, mutable: &mut SearchMutable<'t>, shared: &Shared, deadline: Option<Instant>) {
        let coord = mutable.coord;
        let dist = coord.phase1_depth();
        for togo1 in dist..MAX_PHASE1_DEPTH {
            if shared.terminated.load(Ordering::Relaxed) {
                break;
            }
            debug!(
                working!("Variant {}: phase 1 depth {}"),
                mutable.variant(),
                togo1
            );
            mutable.sofar_phase1.clear();
            self.search_phase1(
                mutable,
                shared,
                deadline,
                coord.flip,
                coord.twist,
                coord.slice_sorted,
                dist,
                togo1,
            );
        }
    }

    /// Searches phase 1 sequences of exactly `togo1` more moves from a cube
    /// `dist` moves away from the phase 2 subgroup, and hands every one that
    /// reaches the subgroup to phase 2.
    #[allow(clippy::too_many_arguments)]
    fn search_phase1(
        &self,
        mutable: &mut SearchMutable<'t>,
        shared: &Shared,
        deadline: Option<Instant>,
        flip: u16,
        twist: u16,
        slice_sorted: u16,
        dist: usize,
        togo1: usize,
    ) {
        if shared.terminated.load(Ordering::Relaxed) {
            return;
        }

        if togo1 == 0 {
            if deadline.is_some_and(|deadline| Instant::now() > deadline)
                && shared.shortest.load(Ordering::Relaxed) != usize::MAX
            {
                shared.terminated.store(true, Ordering::Relaxed);
            }
            self.start_phase2(mutable, shared, slice_sorted);
            return;
        }

        let moves = &self.tables.moves;
        for m in Move::ALL {
            // With few moves left inside the subgroup the rest belongs to
            // phase 2
            if dist == 0 && togo1 < 5 && m.is_phase2() {
                continue;
            }
            if let Some(&prev) = mutable.sofar_phase1.last()
                && m.is_redundant_after(prev)
            {
                continue;
            }

            let flip_new = moves.flip(flip, m);
            let twist_new = moves.twist(twist, m);
            let slice_sorted_new = moves.slice_sorted(slice_sorted, m);
            let dist_new = DISTANCE
                [3 * dist + self.tables.phase1_depth3(flip_new, twist_new, slice_sorted_new)];
            if dist_new >= togo1 {
                continue;
            }

            mutable.sofar_phase1.push(m);
            self.search_phase1(
                mutable,
                shared,
                deadline,
                flip_new,
                twist_new,
                slice_sorted_new,
                dist_new,
                togo1 - 1,
            );
            mutable.sofar_phase1.pop();
        }
    }

    fn start_phase2(&self, mutable: &mut SearchMutable<'t>, shared: &Shared, slice_sorted: u16) {
        let moves = &self.tables.moves;

        // Phase 1 sequences ending in R1 and R3 come in pairs and differ by R2
        let corners = match mutable.sofar_phase1.last() {
            Some(&m @ (Move::R3 | Move::F3 | Move::L3 | Move::B3)) => {
                moves.corners(mutable.corners_save, Move::new(m.face(), 2))
            }
            _ => {
                let corners = mutable
                    .sofar_phase1
                    .iter()
                    .fold(mutable.coord.corners, |c, &m| moves.corners(c, m));
                mutable.corners_save = corners;
                corners
            }
        };

        // A new solution must be shorter than the best one so far
        let togo2_limit = shared
            .shortest
            .load(Ordering::Relaxed)
            .saturating_sub(mutable.sofar_phase1.len())
            .min(PHASE2_MAX_DEPTH + 1);
        if self.tables.pruning.cornslice(corners, slice_sorted) >= togo2_limit {
            return;
        }

        let (u_edges, d_edges) = mutable.sofar_phase1.iter().fold(
            (mutable.coord.u_edges, mutable.coord.d_edges),
            |(u, d), &m| (moves.u_edges(u, m), moves.d_edges(d, m)),
        );
        let ud_edges = self.tables.merge_ud_edges(u_edges, d_edges);

        let dist2 = mutable.coord.phase2_depth(corners, ud_edges);
        for togo2 in dist2..togo2_limit {
            mutable.sofar_phase2.clear();
            mutable.phase2_done = false;
            self.search_phase2(mutable, shared, corners, ud_edges, slice_sorted, dist2, togo2);
            if mutable.phase2_done {
                break;
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn search_phase2(
        &self,
        mutable: &mut SearchMutable<'t>,
        shared: &Shared,
        corners: u16,
        ud_edges: u16,
        slice_sorted: u16,
        dist: usize,
        togo2: usize,
    ) {
        if shared.terminated.load(Ordering::Relaxed) || mutable.phase2_done {
            return;
        }

        if togo2 == 0 && slice_sorted == 0 {
            self.record(mutable, shared);
            mutable.phase2_done = true;
            return;
        }

        let moves = &self.tables.moves;
        for m in Move::PHASE2 {
            let prev = mutable
                .sofar_phase2
                .last()
                .or_else(|| mutable.sofar_phase1.last());
            if let Some(&prev) = prev
                && m.is_redundant_after(prev)
            {
                continue;
            }

            let corners_new = moves.corners(corners, m);
            let ud_edges_new = moves.ud_edges(ud_edges, m);
            let slice_sorted_new = moves.slice_sorted(slice_sorted, m);
            let dist_new =
                DISTANCE[3 * dist + self.tables.phase2_depth3(corners_new, ud_edges_new)];
            let cornslice = self.tables.pruning.cornslice(corners_new, slice_sorted_new);
            if dist_new.max(cornslice) >= togo2 {
                continue;
            }

            mutable.sofar_phase2.push(m);
            self.search_phase2(
                mutable,
                shared,
                corners_new,
                ud_edges_new,
                slice_sorted_new,
                dist_new,
                togo2 - 1,
            );
            mutable.sofar_phase2.pop();
        }
    }

    /// Stores the current phase 1 and phase 2 sequences, translated back to
    /// the untransformed cube, when they beat every solution so far.
    fn record(&self, mutable: &SearchMutable<'t>, shared: &Shared) {
        let mut solutions = shared
            .solutions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let len = mutable.sofar_phase1.len() + mutable.sofar_phase2.len();
        if solutions.last().is_none_or(|best| best.len() > len) {
            let mut moves: Vec<Move> = mutable
                .sofar_phase1
                .iter()
                .chain(&mutable.sofar_phase2)
                .copied()
                .collect();
            if mutable.inverse {
                moves.reverse();
                for m in &mut moves {
                    *m = m.inverse();
                }
            }
            for m in &mut moves {
                *m = self.tables.symmetry.conj_move(N_SYM_D4H * mutable.rot, *m);
            }

            debug!(
                "Variant {} found {} + {} moves",
                mutable.variant(),
                mutable.sofar_phase1.len(),
                mutable.sofar_phase2.len()
            );
            solutions.push(moves);
            shared.shortest.store(len, Ordering::Relaxed);
        }

        if shared.shortest.load(Ordering::Relaxed) <= self.max_length {
            shared.terminated.store(true, Ordering::Relaxed);
        }
    }
}

/// Variant `v` searches the cube rotated by `120° * (v % 3)` around the
/// URF-DBL diagonal, inverted when `v >= 3`. Symmetric cubes need fewer
/// variants: a cube symmetric under a diagonal rotation gives the same search
/// for every rotation, and a cube equal to a conjugate of its inverse gives
/// the same search inverted.
fn search_variants(cube: &CubieCube) -> Vec<usize> {
    let syms = cube.symmetries();
    let mut variants: Vec<usize> = if syms.iter().any(|s| [16, 20, 24, 28].contains(s)) {
        vec![0, 3]
    } else {
        (0..6).collect()
    };
    if syms.iter().any(|&s| s >= N_SYM) {
        variants.retain(|&v| v < 3);
    }
    variants
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::parse_moves;

    #[test_log::test]
    fn test_solution_display() {
        assert_eq!(Solution::default().to_string(), "(0f)");
        let solution = Solution {
            moves: parse_moves("U1 R2 F3").unwrap(),
        };
        assert_eq!(solution.to_string(), "U1 R2 F3 (3f)");
        assert_eq!(solution.len(), 3);
        assert!(!solution.is_empty());
    }

    #[test_log::test]
    fn test_search_variants() {
        assert_eq!(search_variants(&CubieCube::SOLVED), vec![0]);
        let mut rng = fastrand::Rng::with_seed(1);
        assert_eq!(
            search_variants(&CubieCube::random_with(&mut rng)),
            vec![0, 1, 2, 3, 4, 5]
        );
        // U1 is conjugate to its inverse U3 by the LR mirror
        assert_eq!(
            search_variants(&CubieCube::from_moves(&[Move::U1])),
            vec![0, 1, 2]
        );
    }

    #[test_log::test]
    fn test_error_names_role() {
        let err = parse_cube("UUU", CubeRole::Goal).unwrap_err();
        assert_eq!(err.role(), CubeRole::Goal);
        assert_eq!(
            err.to_string(),
            "invalid goal cube: cube definition string contains 3 facelets, expected 54"
        );
    }
}
