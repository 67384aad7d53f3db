#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use log::{LevelFilter, info};
use rand::RngCore;
use rand::SeedableRng;
use rule_life::{Cell, Grid, GridConfig, Result, Rule, RuleBuilder};
use std::time::Instant;

const DEFAULT_ROWS: usize = 256;
const DEFAULT_COLUMNS: usize = 256;
const DEFAULT_CYCLES: u64 = 200;
const CHECK_INTERVAL: u64 = 50;
const LIVE_DENSITY: f64 = 0.42;
const RANDOM_SEED: u64 = 0x5EED_1234_ABCD_EF01;

/// Alive cells with fewer than two or more than three alive neighbors die.
struct Lonely;
/// Alive cells with two or three alive neighbors survive one more generation.
struct Survive;
/// Non-alive cells with exactly three alive neighbors are born.
struct Birth;

fn alive_neighbors(cell: &Cell, grid: &Grid) -> usize {
    grid.count_alive_neighbors(cell.row(), cell.column())
        .unwrap_or(0)
}

impl Rule for Lonely {
    fn name(&self) -> &str {
        "life: die"
    }

    fn matches(&self, cell: &Cell, grid: &Grid) -> bool {
        let n = alive_neighbors(cell, grid);
        cell.is_alive() && !(2..=3).contains(&n)
    }

    fn apply(&self, cell: &mut Cell) -> Result<()> {
        cell.kill()
    }
}

impl Rule for Survive {
    fn name(&self) -> &str {
        "life: survive"
    }

    fn matches(&self, cell: &Cell, grid: &Grid) -> bool {
        cell.is_alive() && (2..=3).contains(&alive_neighbors(cell, grid))
    }

    fn apply(&self, cell: &mut Cell) -> Result<()> {
        cell.evolve()
    }
}

impl Rule for Birth {
    fn name(&self) -> &str {
        "life: birth"
    }

    fn matches(&self, cell: &Cell, grid: &Grid) -> bool {
        !cell.is_alive() && alive_neighbors(cell, grid) == 3
    }

    fn apply(&self, cell: &mut Cell) -> Result<()> {
        cell.revive()
    }
}

#[derive(Clone, Copy, Debug)]
enum Pattern {
    Random,
    AllAlive,
    Glider,
    Cross,
    DiagonalCross,
    WideSquares,
    TightSquares,
    AlternateRows,
}

impl Pattern {
    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "random" => Some(Pattern::Random),
            "all-alive" => Some(Pattern::AllAlive),
            "glider" => Some(Pattern::Glider),
            "cross" => Some(Pattern::Cross),
            "diagonal" => Some(Pattern::DiagonalCross),
            "wide-squares" => Some(Pattern::WideSquares),
            "tight-squares" => Some(Pattern::TightSquares),
            "alternate-rows" => Some(Pattern::AlternateRows),
            _ => None,
        }
    }

    /// Initialization rule reviving the cells of this pattern.
    fn rule(self, cell_count: usize) -> Box<dyn Rule> {
        match self {
            Pattern::Random => {
                let threshold = (u64::MAX as f64 * LIVE_DENSITY) as u64;
                let mut rng = rand::rngs::StdRng::seed_from_u64(RANDOM_SEED);
                // Draw per coordinate up front so the condition stays pure.
                let picks: Vec<bool> = (0..cell_count)
                    .map(|_| rng.next_u64() <= threshold)
                    .collect();
                Box::new(
                    RuleBuilder::new("random")
                        .when(move |cell: &Cell, grid: &Grid| {
                            let idx = cell.row() * grid.columns() + cell.column();
                            picks.get(idx).copied().unwrap_or(false)
                        })
                        .then(Cell::revive),
                )
            }
            Pattern::AllAlive => Box::new(
                RuleBuilder::new("all alive")
                    .when(|_: &Cell, _: &Grid| true)
                    .then(Cell::revive),
            ),
            Pattern::Glider => Box::new(
                RuleBuilder::new("single glider")
                    .when(|cell: &Cell, _: &Grid| {
                        matches!(cell.position(), (0, 2) | (1, 3) | (2, 1..=3))
                    })
                    .then(Cell::revive),
            ),
            Pattern::Cross => Box::new(
                RuleBuilder::new("cross")
                    .when(|cell: &Cell, grid: &Grid| {
                        cell.column() == grid.columns() / 2 || cell.row() == grid.rows() / 2
                    })
                    .then(Cell::revive),
            ),
            Pattern::DiagonalCross => Box::new(
                RuleBuilder::new("diagonal cross")
                    .when(|cell: &Cell, grid: &Grid| {
                        cell.row() == cell.column() || cell.row() + cell.column() + 1 == grid.rows()
                    })
                    .then(Cell::revive),
            ),
            Pattern::WideSquares => Box::new(
                RuleBuilder::new("wide squares")
                    .when(|cell: &Cell, _: &Grid| cell.row() % 8 == 0 || cell.column() % 8 == 0)
                    .then(Cell::revive),
            ),
            Pattern::TightSquares => Box::new(
                RuleBuilder::new("tight squares")
                    .when(|cell: &Cell, _: &Grid| {
                        cell.row() % 9 == 0 || cell.row() * cell.column() % 3 == 0
                    })
                    .then(Cell::revive),
            ),
            Pattern::AlternateRows => Box::new(
                RuleBuilder::new("alternate rows")
                    .when(|cell: &Cell, _: &Grid| {
                        cell.row() % 4 == 0
                            || cell.column() % 9 == 0
                            || cell.row() * cell.column() % 3 == 0
                    })
                    .then(Cell::revive),
            ),
        }
    }
}

struct MainArgs {
    rows: usize,
    columns: usize,
    cycles: u64,
    pattern: Pattern,
    config: GridConfig,
}

fn parse_args() -> MainArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = MainArgs {
        rows: DEFAULT_ROWS,
        columns: DEFAULT_COLUMNS,
        cycles: DEFAULT_CYCLES,
        pattern: Pattern::Random,
        config: GridConfig::default(),
    };
    let next_arg = |i: usize, flag: &str| -> &str {
        args.get(i)
            .map(String::as_str)
            .unwrap_or_else(|| panic!("{flag} requires a value"))
    };
    let positive = |i: usize, flag: &str| -> usize {
        next_arg(i, flag)
            .parse()
            .unwrap_or_else(|_| panic!("{flag} requires a positive integer"))
    };
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--rows" => {
                i += 1;
                parsed.rows = positive(i, "--rows");
            }
            "--columns" => {
                i += 1;
                parsed.columns = positive(i, "--columns");
            }
            "--cycles" => {
                i += 1;
                parsed.cycles = positive(i, "--cycles") as u64;
            }
            "--threads" => {
                i += 1;
                parsed.config = parsed.config.thread_count(positive(i, "--threads"));
            }
            "--max-threads" => {
                i += 1;
                parsed.config = parsed.config.max_threads(positive(i, "--max-threads"));
            }
            "--pattern" => {
                i += 1;
                let name = next_arg(i, "--pattern");
                parsed.pattern = Pattern::parse(name).unwrap_or_else(|| {
                    panic!(
                        "unknown pattern: {name} (expected random, all-alive, glider, cross, diagonal, wide-squares, tight-squares or alternate-rows)"
                    )
                });
            }
            "--wrap" => {
                parsed.config = parsed.config.wrap_edges(true);
            }
            other => panic!(
                "unknown argument: {other}\nusage: rule-life [--rows N] [--columns N] [--cycles N] [--threads N] [--max-threads N] [--pattern random|all-alive|glider|cross|diagonal|wide-squares|tight-squares|alternate-rows] [--wrap]"
            ),
        }
        i += 1;
    }
    parsed
}

fn run(args: MainArgs) -> Result<()> {
    let init = args
        .pattern
        .rule(args.rows.saturating_mul(args.columns));
    let mut grid = Grid::with_config(args.rows, args.columns, Some(&*init), args.config)?;
    grid.add_rule(Lonely);
    grid.add_rule(Survive);
    grid.add_rule(Birth);
    info!(
        "{grid}, pattern {:?}, {} thread(s), initial population {}",
        args.pattern,
        grid.threads(),
        grid.population()
    );

    let mut total = std::time::Duration::ZERO;
    let mut done = 0;
    while done < args.cycles {
        let batch = CHECK_INTERVAL.min(args.cycles - done);
        let start = Instant::now();
        grid.step_n(batch);
        let phase = start.elapsed();
        total += phase;
        done += batch;

        let report = grid.last_report();
        let phase_ms = phase.as_secs_f64() * 1000.0;
        println!(
            "Cycle {}: {} [{:.3} ms/cycle, {} fault(s)]",
            report.age,
            report.statistics,
            phase_ms / batch as f64,
            report.faults.len()
        );
    }

    let total_ms = total.as_secs_f64() * 1000.0;
    println!("\n--- Summary ({done} cycles) ---");
    println!(
        "{total_ms:.3} ms total, {:.6} ms/cycle, final population {}",
        total_ms / done.max(1) as f64,
        grid.population()
    );
    Ok(())
}

fn main() {
    simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()
        .expect("failed to install logger");

    let args = parse_args();
    if let Err(err) = run(args) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
