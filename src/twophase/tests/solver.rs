mod common;

use std::time::Duration;

use common::{SOLVED, TABLES};
use twophase::{
    CubieCube, CubieError, FaceCube, FaceletError, Move, TwoPhaseSolver, parse_moves,
    solver::{CubeRole, SolveError},
};

fn definition(cube: &CubieCube) -> String {
    FaceCube::from(cube).to_string()
}

fn solves(cube: &CubieCube, moves: &[Move]) -> bool {
    let mut cube = *cube;
    cube.apply_moves(moves);
    cube == CubieCube::SOLVED
}

#[test_log::test]
fn test_solved_cube() {
    let solution = TwoPhaseSolver::new(&TABLES).solve(SOLVED).unwrap();
    assert!(solution.is_empty());
    assert_eq!(solution.to_string(), "(0f)");
}

#[test_log::test]
fn test_single_quarter_turns() {
    let solver = TwoPhaseSolver::new(&TABLES).with_max_length(1);
    for m in Move::ALL.into_iter().filter(|m| m.power() == 1) {
        let cube = CubieCube::from_moves(&[m]);
        let solution = solver.solve(&definition(&cube)).unwrap();
        assert_eq!(solution.moves, vec![m.inverse()], "solving {m}");
    }

    let u = CubieCube::from_moves(&[Move::U1]);
    assert_eq!(solver.solve(&definition(&u)).unwrap().to_string(), "U3 (1f)");
}

#[test_log::test]
fn test_known_cube() {
    let cube_string = "DUUBULDBFRBFRRULLLBRDFFFBLURDBFDFDRFRULBLUFDURRBLBDUDL";
    let solution = TwoPhaseSolver::new(&TABLES)
        .with_max_length(20)
        .with_timeout(Duration::from_secs(2))
        .solve(cube_string)
        .unwrap();
    assert!(solution.len() <= 20);

    // Undoing the solution on a solved cube gives back the input
    let undo: Vec<Move> = solution.moves.iter().rev().map(|m| m.inverse()).collect();
    assert_eq!(definition(&CubieCube::from_moves(&undo)), cube_string);
}

#[test_log::test]
fn test_scrambles() {
    let solver = TwoPhaseSolver::new(&TABLES).with_timeout(Duration::from_secs(10));
    for scramble in [
        "R U R' U'",
        "F B R L' U2 D2 F' B'",
        "U2 R2 L D2 B' D' F2 R' F U B2 L' R2 D F2 U2",
        "L U' R2 B' L' U2 F' L' R' U' F' B2 L D' R B' L2 F' U R'",
    ] {
        let cube = CubieCube::from_moves(&parse_moves(scramble).unwrap());
        let solution = solver.solve(&definition(&cube)).unwrap();
        assert!(solution.len() <= 20, "solving {scramble}");
        assert!(solves(&cube, &solution.moves), "solving {scramble}");
    }
}

#[test_log::test]
fn test_random_cubes() {
    let solver = TwoPhaseSolver::new(&TABLES).with_timeout(Duration::from_secs(10));
    let mut rng = fastrand::Rng::with_seed(2024);
    for _ in 0..5 {
        let cube = CubieCube::random_with(&mut rng);
        let solution = solver.solve_cube(&cube).unwrap();
        assert!(solution.len() <= 20);
        assert!(solves(&cube, &solution.moves));
    }
}

#[test_log::test]
fn test_time_limited_search_returns_a_solution() {
    let solver = TwoPhaseSolver::new(&TABLES)
        .with_max_length(0)
        .with_timeout(Duration::from_millis(200));
    let cube = CubieCube::from_moves(&parse_moves("R U F D L B R2 U2").unwrap());
    let solution = solver.solve_cube(&cube).unwrap();
    assert!(!solution.is_empty());
    assert!(solves(&cube, &solution.moves));
}

#[test_log::test]
fn test_unbounded_timeout() {
    let solver = TwoPhaseSolver::new(&TABLES).with_timeout(Duration::MAX);
    let cube = CubieCube::from_moves(&parse_moves("R U").unwrap());
    let solution = solver.solve_cube(&cube).unwrap();
    assert!(solution.len() <= 20);
    assert!(solves(&cube, &solution.moves));
}

#[test_log::test]
fn test_solve_to() {
    let solver = TwoPhaseSolver::new(&TABLES);
    let mut rng = fastrand::Rng::with_seed(77);
    let start = CubieCube::random_with(&mut rng);
    let goal = CubieCube::random_with(&mut rng);

    let same = solver
        .solve_to(&definition(&start), &definition(&start))
        .unwrap();
    assert_eq!(same.len(), 0);

    let solution = solver
        .solve_to(&definition(&start), &definition(&goal))
        .unwrap();
    let mut cube = start;
    cube.apply_moves(&solution.moves);
    assert_eq!(cube, goal);
}

#[test_log::test]
fn test_wrong_length() {
    let err = TwoPhaseSolver::new(&TABLES)
        .solve(&SOLVED[..53])
        .unwrap_err();
    assert_eq!(
        err,
        SolveError::Facelet {
            role: CubeRole::Start,
            source: FaceletError::WrongLength { actual: 53 },
        }
    );
    assert!(err.to_string().contains("53"));
}

#[test_log::test]
fn test_wrong_color_count() {
    let definition = SOLVED.replacen('R', "U", 1);
    let err = TwoPhaseSolver::new(&TABLES).solve(&definition).unwrap_err();
    assert_eq!(err.role(), CubeRole::Start);
    let message = err.to_string();
    assert!(message.contains("10 facelets of color U"), "{message}");
}

#[test_log::test]
fn test_unsolvable_cubes() {
    let solver = TwoPhaseSolver::new(&TABLES);

    let mut twisted = CubieCube::SOLVED;
    twisted.co[0] = 1;
    assert_eq!(solver.solve_cube(&twisted), Err(CubieError::CornerTwist));

    let mut swapped = CubieCube::SOLVED;
    swapped.ep.swap(0, 1);
    assert_eq!(solver.solve_cube(&swapped), Err(CubieError::ParityMismatch));

    let mut overflipped = CubieCube::SOLVED;
    overflipped.eo[0] = 2;
    assert_eq!(solver.solve_cube(&overflipped), Err(CubieError::EdgeFlip));

    let mut overtwisted = CubieCube::SOLVED;
    overtwisted.co[0] = 3;
    assert_eq!(solver.solve_cube(&overtwisted), Err(CubieError::CornerTwist));

    let err = solver
        .solve_to(SOLVED, &definition(&twisted))
        .unwrap_err();
    assert_eq!(
        err,
        SolveError::Cubie {
            role: CubeRole::Goal,
            source: CubieError::CornerTwist,
        }
    );
}
