use clap::{Parser, Subcommand, ValueEnum};
use distsweep::brute_force::{brute_force_intersections, intersection_set, read_answers};
use distsweep::generator::{SegmentGenerator, XDistribution};
use distsweep::memory_config::MemoryConfig;
use distsweep::segment::{Intersection, Segment};
use distsweep::store::PagedStore;
use distsweep::sweep::DistributionSweep;
use distsweep::SweepError;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "distsweep")]
#[command(about = "External-memory orthogonal segment intersection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum DistributionArg {
    Uniform,
    Normal,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic segment file
    Generate {
        #[arg(long)]
        count: usize,
        /// Fraction of segments that are vertical
        #[arg(long, default_value_t = 0.5)]
        vertical_share: f64,
        #[arg(long, value_enum, default_value = "uniform")]
        distribution: DistributionArg,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long)]
        out: PathBuf,
    },
    /// Report all intersections in a segment file
    Intersect {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Working memory budget in bytes
        #[arg(long, default_value_t = 1 << 20)]
        memory: usize,
        /// Page size in bytes
        #[arg(long, default_value_t = 4096)]
        page: usize,
        #[arg(long, default_value = "./sweep_state")]
        work_dir: PathBuf,
    },
    /// Compare an answer file against the quadratic reference
    Verify {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        answers: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("distsweep: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), SweepError> {
    match cli.command {
        Commands::Generate {
            count,
            vertical_share,
            distribution,
            seed,
            out,
        } => {
            let distribution = match distribution {
                DistributionArg::Uniform => XDistribution::Uniform,
                DistributionArg::Normal => XDistribution::Normal,
            };
            let mut store: PagedStore<Segment> = PagedStore::create(&out)?;
            SegmentGenerator::new(count, vertical_share, distribution)
                .generate(seed, &mut store)?;
            store.close()?;
            println!(
                "[generate] wrote {} segments to {}",
                store.record_count(),
                out.display()
            );
            Ok(())
        }
        Commands::Intersect {
            input,
            out,
            memory,
            page,
            work_dir,
        } => {
            let input: PagedStore<Segment> = PagedStore::open(&input)?;
            let sweep = DistributionSweep::new(MemoryConfig::new(memory, page), work_dir);
            let summary = sweep.find_intersections(&input, &out)?;
            let json = serde_json::to_string_pretty(&summary)
                .map_err(|e| SweepError::Other(format!("summary serialization: {}", e)))?;
            println!("{}", json);
            Ok(())
        }
        Commands::Verify { input, answers } => {
            let input: PagedStore<Segment> = PagedStore::open(&input)?;
            let mut segments = Vec::with_capacity(input.record_count() as usize);
            let mut cursor = input.pages(0, 128)?;
            while let Some((batch, _)) = cursor.next_page()? {
                segments.extend(batch);
            }

            let expected = brute_force_intersections(&segments)?;
            let answer_store: PagedStore<Intersection> = PagedStore::open(&answers)?;
            let reported = read_answers(&answer_store)?;

            let expected_set = intersection_set(&expected);
            let reported_set = intersection_set(&reported);
            println!(
                "[verify] reported {} records ({} distinct points), reference {} pairs ({} distinct points)",
                reported.len(),
                reported_set.len(),
                expected.len(),
                expected_set.len()
            );
            if reported.len() == expected.len() && reported_set == expected_set {
                println!("[verify] OK");
                Ok(())
            } else {
                let missing = expected_set.difference(&reported_set).count();
                let spurious = reported_set.difference(&expected_set).count();
                Err(SweepError::Other(format!(
                    "answer mismatch: {} missing points, {} spurious points",
                    missing, spurious
                )))
            }
        }
    }
}
