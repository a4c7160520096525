use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, ValueEnum};

use relation_rank::cluster::metrics;
use relation_rank::config::RankAlgorithm;
use relation_rank::data::{self, parquet, relation_log};
use relation_rank::{storage, viz, IndexCalculator, Parameters};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Token transfers between accounts
    Transfer,
    /// Votes, follows, ownership and other social relations
    Social,
    /// Parameters taken as given, no relation filter
    Generic,
}

#[derive(Parser, Debug)]
#[clap(
    name = "relation-rank",
    about = "Incremental rank calculation over typed relation graphs"
)]
struct Cli {
    /// Path to input relations (.parquet or a ';'-separated relation log)
    #[clap(long)]
    input: String,

    /// Output directory for results
    #[clap(long, default_value = "rank_results")]
    output_dir: String,

    /// Which calculator to build
    #[clap(long, value_enum, default_value = "transfer")]
    mode: Mode,

    /// JSON file with calculation parameters
    #[clap(long)]
    params: Option<PathBuf>,

    /// Snapshot to resume from if it exists; rewritten after the run.
    /// Blocks of the input already counted by the snapshot are not replayed
    #[clap(long)]
    state: Option<PathBuf>,

    /// Write the clustering as GraphML
    #[clap(long)]
    export_clusters: bool,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

fn load_input(input: &str) -> Result<Vec<relation_rank::Relation>> {
    if input.ends_with(".parquet") {
        parquet::load_relations(input)
    } else {
        relation_log::load_file(Path::new(input))
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Cli::parse();

    // Configure logging
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    let mut params = match &args.params {
        Some(path) => Parameters::from_json_file(path)?,
        None => Parameters::default(),
    };

    // Set number of threads
    params.num_threads = if args.threads > 0 {
        args.threads
    } else {
        // If threads = 0, use all available cores
        num_cpus::get()
    };

    log::info!("Using {} worker threads", params.num_threads);
    log::info!("Input: {}", args.input);
    log::info!("Output: {}", args.output_dir);

    let calculator = match args.mode {
        Mode::Transfer => IndexCalculator::for_transfer(params)?,
        Mode::Social => IndexCalculator::for_social_network(params)?,
        Mode::Generic => IndexCalculator::new(params)?,
    };

    // 1. Resume previous state
    if let Some(state) = args.state.as_deref().filter(|p| p.exists()) {
        calculator.load_state_from_file(state)?;
        log::info!(
            "Resumed from {} after {} blocks",
            state.display(),
            calculator.get_total_handled_block_count()
        );
    }

    // 2. Replay relations block by block
    let blocks = data::group_into_blocks(load_input(&args.input)?);
    log::info!("Replaying {} blocks", blocks.len());

    let added = data::replay(&calculator, &blocks);
    log::info!("Added {} new blocks", added);

    // 3. Rank
    let scores = calculator.calculate();
    log::info!(
        "Ranked {} nodes",
        scores.values().map(|by_id| by_id.len()).sum::<usize>()
    );

    // 4. Cluster statistics
    let wants_clusters =
        args.export_clusters || calculator.parameters().algorithm == RankAlgorithm::NcdAwareRank;
    let clustering = wants_clusters.then(|| calculator.clustering());
    let summary = clustering
        .as_ref()
        .map(|c| metrics::summarize(&c.graph, &c.assignment));

    if let Some(summary) = &summary {
        log::info!(
            "Found {} clusters, {} hubs, {} outliers",
            summary.cluster_count,
            summary.hub_count,
            summary.outlier_count
        );
    }

    // 5. Save results
    storage::save_results(
        &scores,
        summary.as_ref(),
        calculator.get_total_handled_block_count(),
        &args.output_dir,
    )?;

    if args.export_clusters {
        if let (Some(clustering), Some(summary)) = (&clustering, &summary) {
            viz::export_clustering(clustering, summary, &args.output_dir)?;
        }
    }

    if let Some(state) = &args.state {
        calculator.save_state_to_file(state)?;
        log::info!("State saved to {}", state.display());
    }

    log::info!("Analysis complete. Results saved to {}", args.output_dir);

    Ok(())
}
