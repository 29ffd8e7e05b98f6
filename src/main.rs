use std::time::Instant;

use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use tracing_subscriber::EnvFilter;

use qevo::prelude::*;

#[derive(Parser)]
#[command(name = "qevo", about = "Evolutionary discovery of quantum circuits", version)]
struct Cli {
    #[command(subcommand)]
    problem: Cmd,

    /// RNG seed for reproducible runs.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Number of qubits.
    #[arg(long)]
    n_bit: Option<usize>,

    /// Generations to run.
    #[arg(long)]
    n_gen: Option<usize>,

    /// Carry-over population size.
    #[arg(long)]
    pop_size: Option<usize>,

    /// Expanded per-generation population size.
    #[arg(long)]
    pop_size2: Option<usize>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Prepare a target basis state from |0…0⟩.
    Prep {
        /// Target basis state index.
        #[arg(long, default_value_t = 3)]
        target: usize,
    },
    /// Synthesize the quantum Fourier transform.
    Fourier,
    /// Grover-style oracle search.
    Search,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut cfg = Config::default();
    if let Some(n_bit) = cli.n_bit {
        cfg.n_bit = n_bit;
    }
    if let Some(n_gen) = cli.n_gen {
        cfg.n_gen = n_gen;
    }
    if let Some(pop_size) = cli.pop_size {
        cfg.pop_size = pop_size;
    }
    if let Some(pop_size2) = cli.pop_size2 {
        cfg.pop_size2 = pop_size2;
    }

    match cli.problem {
        Cmd::Prep { target } => run(StatePrep::new(&cfg, target), cfg, cli.seed),
        Cmd::Fourier => run(Fourier::new(), cfg, cli.seed),
        Cmd::Search => run(Search::new(), cfg, cli.seed),
    }
}

fn run<P: Problem>(problem: P, cfg: Config, seed: u64) {
    let mut evo = Evolution::new(problem, cfg);
    let mut rng = StdRng::seed_from_u64(seed);

    let start = Instant::now();
    let pop = evo.run(&mut rng);
    let elapsed = start.elapsed();

    let gens = evo.config().n_gen.max(1) as u32;
    println!(
        "run took {:.2?} ({:.2?}/gen avg), {} candidates tested",
        elapsed,
        elapsed / gens,
        evo.total_evaluated()
    );

    println!("\ngenetic operator distribution:");
    print!("{}", evo.tracker().dump());

    let front = pop.front();
    println!("\n{} nondominated candidates:", front.len());
    for member in front {
        println!("{} {}", member.fitness(), member.candidate());
    }
}
