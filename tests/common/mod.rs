#![allow(dead_code)]

use std::collections::HashSet;

use rand::RngCore;
use rand::SeedableRng;
use rule_life::{Cell, Grid, GridConfig, Rule, RuleBuilder};

pub fn alive_neighbors(cell: &Cell, grid: &Grid) -> usize {
    grid.count_alive_neighbors(cell.row(), cell.column())
        .expect("rule evaluated on an in-bounds cell")
}

/// B3/S23 as three builder rules: die, survive (evolve), birth.
pub fn life_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(
            RuleBuilder::new("die")
                .when(|cell: &Cell, grid: &Grid| {
                    cell.is_alive() && !(2..=3).contains(&alive_neighbors(cell, grid))
                })
                .then(Cell::kill),
        ),
        Box::new(
            RuleBuilder::new("survive")
                .when(|cell: &Cell, grid: &Grid| {
                    cell.is_alive() && (2..=3).contains(&alive_neighbors(cell, grid))
                })
                .then(Cell::evolve),
        ),
        Box::new(
            RuleBuilder::new("birth")
                .when(|cell: &Cell, grid: &Grid| {
                    !cell.is_alive() && alive_neighbors(cell, grid) == 3
                })
                .then(Cell::revive),
        ),
    ]
}

pub fn life_grid(rows: usize, columns: usize, config: GridConfig) -> Grid {
    let mut grid = Grid::with_config(rows, columns, None, config).unwrap();
    for rule in life_rules() {
        grid.rules_mut().push(rule.into());
    }
    grid
}

pub fn set_cells(grid: &mut Grid, cells: &[(usize, usize)]) {
    for &(row, column) in cells {
        grid.revive(row, column).unwrap();
    }
}

pub fn collect_live(grid: &Grid) -> HashSet<(usize, usize)> {
    grid.cells()
        .filter(|cell| cell.is_alive())
        .map(Cell::position)
        .collect()
}

pub fn assert_alive(grid: &Grid, cells: &[(usize, usize)]) {
    for &(row, column) in cells {
        assert!(
            grid.get(row, column).unwrap().is_alive(),
            "expected alive at ({row},{column})"
        );
    }
}

pub fn assert_not_alive(grid: &Grid, cells: &[(usize, usize)]) {
    for &(row, column) in cells {
        assert!(
            !grid.get(row, column).unwrap().is_alive(),
            "expected not alive at ({row},{column})"
        );
    }
}

pub fn assert_generation_invariant(grid: &Grid) {
    for cell in grid.cells() {
        assert_eq!(
            cell.generation() == 0,
            !cell.is_alive(),
            "generation/state mismatch: {cell}"
        );
    }
}

/// Random alive set over a `rows x columns` board.
pub fn random_live(rows: usize, columns: usize, density: f64, seed: u64) -> Vec<(usize, usize)> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let threshold = (u64::MAX as f64 * density) as u64;
    let mut out = Vec::new();
    for row in 0..rows {
        for column in 0..columns {
            if rng.next_u64() <= threshold {
                out.push((row, column));
            }
        }
    }
    out
}

/// Reference B3/S23 step on a bounded (optionally toroidal) board.
pub fn step_naive(
    cells: &HashSet<(usize, usize)>,
    rows: usize,
    columns: usize,
    wrap: bool,
) -> HashSet<(usize, usize)> {
    let mut next = HashSet::new();
    for row in 0..rows {
        for column in 0..columns {
            let mut neighbors = 0;
            for dr in -1i64..=1 {
                for dc in -1i64..=1 {
                    if dr == 0 && dc == 0 {
                        continue;
                    }
                    let mut r = row as i64 + dr;
                    let mut c = column as i64 + dc;
                    if wrap {
                        r = r.rem_euclid(rows as i64);
                        c = c.rem_euclid(columns as i64);
                    } else if r < 0 || c < 0 || r >= rows as i64 || c >= columns as i64 {
                        continue;
                    }
                    if (r as usize, c as usize) == (row, column) {
                        continue;
                    }
                    if cells.contains(&(r as usize, c as usize)) {
                        neighbors += 1;
                    }
                }
            }
            let alive = cells.contains(&(row, column));
            let next_alive = if alive {
                neighbors == 2 || neighbors == 3
            } else {
                neighbors == 3
            };
            if next_alive {
                next.insert((row, column));
            }
        }
    }
    next
}
