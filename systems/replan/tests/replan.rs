use collapse_nav_core::{CellCoord, CellState};
use collapse_nav_system_aftershock::{AftershockParams, AftershockState};
use collapse_nav_system_corridor as corridor;
use collapse_nav_system_replan::{tick, HoldReason};
use collapse_nav_world::{CostField, OccupancyGrid};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Parameters whose spawn gate stays closed for the whole test, so the
/// grid only changes through endpoint pinning.
fn static_world(interval: u32) -> (AftershockParams, AftershockState) {
    (
        AftershockParams::new(interval, 0.0),
        AftershockState::from_parts(1, 1, interval, Vec::new()),
    )
}

#[test]
fn static_world_replans_the_same_route_as_a_direct_plan() {
    let raw = vec![
        vec![0, 0, 0, 0, 0],
        vec![0, 1, 1, 1, 0],
        vec![0, 0, 0, 1, 0],
        vec![1, 1, 0, 1, 0],
        vec![0, 0, 0, 0, 0],
    ];
    let mut grid = OccupancyGrid::from_rows(&raw).expect("valid grid");
    let reference = grid.clone();
    let field = CostField::build(&reference);
    let direct = corridor::plan(&reference, CellCoord::new(0, 0), CellCoord::new(4, 4), Some(&field))
        .expect("in bounds")
        .expect("reachable");

    let (params, prior) = static_world(1000);
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let outcome = tick(
        &mut grid,
        CellCoord::new(0, 0),
        CellCoord::new(4, 4),
        CellCoord::new(0, 0),
        &params,
        Some(prior),
        &mut rng,
    )
    .expect("in bounds");

    assert!(outcome.changed.is_empty());
    assert_eq!(outcome.reason, None);
    let route = outcome.route.expect("reachable");
    assert!((route.cost() - direct.cost()).abs() < 1e-9);
    assert_eq!(route.cells(), direct.cells());
    assert_eq!(outcome.agent, direct.cells()[1]);
    assert!(!outcome.done);
}

#[test]
fn sealed_agent_holds_its_position() {
    // Static walls box the agent in; the engine never removes layout
    // walls, so no route can appear.
    let raw = vec![
        vec![0, 1, 0, 0],
        vec![1, 1, 0, 0],
        vec![0, 0, 0, 0],
        vec![0, 0, 0, 0],
    ];
    let mut grid = OccupancyGrid::from_rows(&raw).expect("valid grid");
    let (params, prior) = static_world(1000);
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    let outcome = tick(
        &mut grid,
        CellCoord::new(0, 0),
        CellCoord::new(3, 3),
        CellCoord::new(0, 0),
        &params,
        Some(prior),
        &mut rng,
    )
    .expect("in bounds");

    assert!(outcome.route.is_none());
    assert_eq!(outcome.reason, Some(HoldReason::NoPath));
    assert_eq!(outcome.agent, CellCoord::new(0, 0));
    assert!(!outcome.done);
}

#[test]
fn mission_endpoints_are_forced_open() {
    let mut grid = OccupancyGrid::new_free(5, 5);
    grid.set_state(CellCoord::new(0, 0), CellState::Blocked);
    grid.set_state(CellCoord::new(4, 4), CellState::Blocked);

    let (params, prior) = static_world(1000);
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let outcome = tick(
        &mut grid,
        CellCoord::new(0, 0),
        CellCoord::new(4, 4),
        CellCoord::new(0, 0),
        &params,
        Some(prior),
        &mut rng,
    )
    .expect("in bounds");

    assert!(grid.is_free(CellCoord::new(0, 0)));
    assert!(grid.is_free(CellCoord::new(4, 4)));
    // Pinning the endpoints open is itself a reported change.
    assert!(outcome.changed.contains(&CellCoord::new(0, 0)));
    assert!(outcome.changed.contains(&CellCoord::new(4, 4)));
    assert!(outcome.route.is_some());
}

#[test]
fn agent_walks_the_static_route_one_cell_per_tick() {
    let mut grid = OccupancyGrid::new_free(4, 4);
    let start = CellCoord::new(0, 0);
    let goal = CellCoord::new(3, 3);
    let (params, mut prior) = static_world(1000);
    let mut rng = ChaCha8Rng::seed_from_u64(19);

    let mut agent = start;
    let mut ticks = 0;
    loop {
        let outcome = tick(
            &mut grid,
            start,
            goal,
            agent,
            &params,
            Some(prior),
            &mut rng,
        )
        .expect("in bounds");
        assert_eq!(agent.manhattan_distance(outcome.agent), 1);
        agent = outcome.agent;
        prior = outcome.state;
        ticks += 1;
        if outcome.done {
            break;
        }
        assert!(ticks < 20, "agent failed to converge");
    }

    assert_eq!(agent, goal);
    // Manhattan distance six means exactly six single-cell moves.
    assert_eq!(ticks, 6);
}

#[test]
fn aftershock_state_threads_through_the_outcome() {
    let mut grid = OccupancyGrid::new_free(16, 16);
    let params = AftershockParams::new(4, 0.5);
    let mut rng = ChaCha8Rng::seed_from_u64(23);

    let outcome = tick(
        &mut grid,
        CellCoord::new(0, 0),
        CellCoord::new(15, 15),
        CellCoord::new(0, 0),
        &params,
        None,
        &mut rng,
    )
    .expect("in bounds");

    // The never-spawned sentinel opens the gate on the first call.
    assert_eq!(outcome.state.tick(), 1);
    assert_eq!(outcome.state.last_spawn_tick(), 0);
    assert!(outcome.stats.spawned > 0);
    assert_eq!(outcome.changed.len(), grid.blocked_count());
}
