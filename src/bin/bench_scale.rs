use rand::RngCore;
use rand::SeedableRng;
use rule_life::{Cell, Grid, GridConfig, RuleBuilder};
use std::time::Instant;

fn life_grid(size: usize, density: f64, config: GridConfig) -> Grid {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5EED_1234_ABCD_EF01);
    let threshold = (u64::MAX as f64 * density) as u64;
    let picks: Vec<bool> = (0..size * size)
        .map(|_| rng.next_u64() <= threshold)
        .collect();
    let init = RuleBuilder::new("random")
        .when(move |cell: &Cell, grid: &Grid| picks[cell.row() * grid.columns() + cell.column()])
        .then(Cell::revive);

    let mut grid = Grid::with_config(size, size, Some(&init), config.wrap_edges(true))
        .expect("benchmark grid dimensions are positive");
    grid.add_rule(
        RuleBuilder::new("die")
            .when(|cell: &Cell, grid: &Grid| {
                let n = grid.count_alive_neighbors(cell.row(), cell.column()).unwrap_or(0);
                cell.is_alive() && !(2..=3).contains(&n)
            })
            .then(Cell::kill),
    );
    grid.add_rule(
        RuleBuilder::new("survive")
            .when(|cell: &Cell, grid: &Grid| {
                let n = grid.count_alive_neighbors(cell.row(), cell.column()).unwrap_or(0);
                cell.is_alive() && (2..=3).contains(&n)
            })
            .then(Cell::evolve),
    );
    grid.add_rule(
        RuleBuilder::new("birth")
            .when(|cell: &Cell, grid: &Grid| {
                !cell.is_alive()
                    && grid.count_alive_neighbors(cell.row(), cell.column()).unwrap_or(0) == 3
            })
            .then(Cell::revive),
    );
    grid
}

fn bench(size: usize, cycles: u64, config: GridConfig) -> (f64, usize, u64) {
    let mut grid = life_grid(size, 0.42, config);
    let start = Instant::now();
    grid.step_n(cycles);
    let total_ms = start.elapsed().as_secs_f64() * 1000.0;
    (total_ms, grid.threads(), grid.population())
}

fn main() {
    let scales: &[(usize, u64)] = &[
        (32, 400),  // serial regardless of config
        (64, 200),  // parallel threshold
        (256, 50),
        (512, 20),
        (1024, 5),
    ];

    println!(
        "{:<10} {:>8} {:>8} {:>12} {:>10} {:>10}",
        "Grid", "Threads", "Cycles", "Total(ms)", "Avg(ms)", "Pop"
    );
    println!("{}", "-".repeat(64));

    for &(size, cycles) in scales {
        for config in [GridConfig::default().thread_count(1), GridConfig::default()] {
            let (total_ms, threads, pop) = bench(size, cycles, config);
            println!(
                "{:<10} {:>8} {:>8} {:>12.1} {:>10.4} {:>10}",
                format!("{}x{}", size, size),
                threads,
                cycles,
                total_ms,
                total_ms / cycles as f64,
                pop
            );
        }
    }
}
