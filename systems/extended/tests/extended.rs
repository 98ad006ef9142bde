use collapse_nav_core::{extended_offset, CellCoord, CellState};
use collapse_nav_system_extended::{line_of_sight, plan};
use collapse_nav_world::OccupancyGrid;

#[test]
fn open_grid_diagonal_crossing_costs_the_euclidean_distance() {
    let grid = OccupancyGrid::new_free(5, 5);
    let route = plan(&grid, CellCoord::new(0, 0), CellCoord::new(4, 4))
        .expect("in bounds")
        .expect("open grid is connected");

    // Two (2, 2) hops cover the diagonal exactly.
    assert!((route.cost() - 32.0_f64.sqrt()).abs() < 1e-9);
}

#[test]
fn every_hop_passes_the_line_of_sight_check() {
    let raw = vec![
        vec![0, 0, 0, 0, 1, 0, 0, 0],
        vec![0, 1, 1, 0, 1, 0, 1, 0],
        vec![0, 0, 0, 0, 0, 0, 1, 0],
        vec![1, 1, 0, 1, 1, 0, 1, 0],
        vec![0, 0, 0, 1, 0, 0, 0, 0],
        vec![0, 1, 0, 1, 0, 1, 1, 0],
        vec![0, 1, 0, 0, 0, 0, 1, 0],
        vec![0, 0, 0, 1, 1, 0, 0, 0],
    ];
    let grid = OccupancyGrid::from_rows(&raw).expect("valid grid");
    let route = plan(&grid, CellCoord::new(0, 0), CellCoord::new(7, 7))
        .expect("in bounds")
        .expect("reachable");

    for pair in route.cells().windows(2) {
        assert!(
            line_of_sight(&grid, pair[0], pair[1]),
            "hop {pair:?} lacks line of sight"
        );
    }
}

#[test]
fn triplets_use_extended_direction_codes() {
    let grid = OccupancyGrid::new_free(5, 5);
    let route = plan(&grid, CellCoord::new(0, 0), CellCoord::new(4, 4))
        .expect("in bounds")
        .expect("reachable");

    let mut cursor = CellCoord::new(0, 0);
    for triplet in route.extended_triplets() {
        assert_eq!(CellCoord::new(triplet.row, triplet.column), cursor);
        let offset = extended_offset(triplet.direction).expect("known code");
        cursor = cursor.offset_by(offset).expect("stays in bounds");
    }
    assert_eq!(cursor, CellCoord::new(4, 4));
}

#[test]
fn thin_wall_defeats_radius_two_hops() {
    // A full-height wall one cell thick: every hop either lands on the
    // wall or crosses it, so no path exists.
    let raw = vec![vec![0, 0, 1, 0, 0]];
    let grid = OccupancyGrid::from_rows(&raw).expect("valid grid");
    let outcome =
        plan(&grid, CellCoord::new(0, 0), CellCoord::new(0, 4)).expect("in bounds");
    assert!(outcome.is_none());
}

#[test]
fn wall_gap_admits_a_route() {
    let raw = vec![
        vec![0, 0, 1, 0, 0],
        vec![0, 0, 0, 0, 0],
        vec![0, 0, 1, 0, 0],
    ];
    let grid = OccupancyGrid::from_rows(&raw).expect("valid grid");
    let route = plan(&grid, CellCoord::new(0, 0), CellCoord::new(0, 4))
        .expect("in bounds")
        .expect("gap admits a route");
    // The wall detour must thread the gap row, so the route is strictly
    // longer than the unobstructed straight line.
    assert!(route.cost() > 4.0);
    for pair in route.cells().windows(2) {
        assert!(line_of_sight(&grid, pair[0], pair[1]));
    }
}

#[test]
fn blocked_endpoint_reports_no_path() {
    let mut grid = OccupancyGrid::new_free(3, 3);
    grid.set_state(CellCoord::new(2, 2), CellState::Blocked);
    let outcome =
        plan(&grid, CellCoord::new(0, 0), CellCoord::new(2, 2)).expect("in bounds");
    assert!(outcome.is_none());
}

#[test]
fn out_of_range_endpoint_is_rejected() {
    let grid = OccupancyGrid::new_free(3, 3);
    assert!(plan(&grid, CellCoord::new(0, 0), CellCoord::new(5, 5)).is_err());
}
