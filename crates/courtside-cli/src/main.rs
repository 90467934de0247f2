// Courtside command-line entry point.
//
// 1. Parse flags and initialize tracing (stderr; stdout carries the lineups)
// 2. Load config/optimizer.toml and apply flag overrides
// 3. Load and merge the cost and projection tables
// 4. Optionally write the boom/bust table
// 5. Build one optimal lineup, or a diversified set
// 6. Print the lineups and write them as CSV

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{info, warn};

use courtside_core::config::{self, Config};
use courtside_core::diversify::generate_lineups;
use courtside_core::optimizer::{optimize_lineup, OptimizerSettings, Strategy};
use courtside_core::pool::{
    filter_by_tip_time, load_cost_table, load_projection_table, merge_pool, Candidate,
};
use courtside_core::report::{
    format_lineup, render_table, summarize, to_json, write_csv, write_lineup_set_csv,
    write_volatility_csv, LineupReport,
};
use courtside_core::slots::Lineup;
use courtside_core::volatility::{rank_by_boom, rank_by_bust, score_pool};

#[derive(Parser, Debug)]
#[command(name = "courtside")]
#[command(about = "Daily fantasy basketball lineup optimizer")]
struct Args {
    /// Cost/position CSV (name, cost, position columns)
    #[arg(long)]
    costs: PathBuf,

    /// Projection CSV (name, projected value columns)
    #[arg(long)]
    projections: PathBuf,

    /// Salary cap; overrides [roster] salary_cap
    #[arg(long)]
    max_cost: Option<f64>,

    /// Output CSV path; defaults to a timestamped file in the working directory
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Number of lineups; more than one runs the diversified strategy catalog
    #[arg(long, default_value = "1")]
    lineups: usize,

    /// Most candidates any two lineups may share
    #[arg(long)]
    max_overlap: Option<usize>,

    /// Most lineups a single candidate may appear in
    #[arg(long)]
    max_exposure: Option<usize>,

    /// Only keep candidates with this tip time (repeatable)
    #[arg(long = "tip-time")]
    tip_times: Vec<String>,

    /// Write the boom/bust volatility table to this CSV
    #[arg(long)]
    volatility: Option<PathBuf>,

    /// Directory holding config/ and defaults/; defaults to the working directory
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Print lineups as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing()?;

    let config = load_config(&args)?;
    info!(
        "salary cap {:.0}, {} lineup(s), overlap <= {}, exposure <= {}",
        config.roster.salary_cap,
        args.lineups,
        config.diversify.max_overlap,
        config.diversify.max_exposure
    );

    let pool = load_pool(&args, &config)?;

    if let Some(path) = &args.volatility {
        write_volatility(&pool, path)?;
    }

    let lineups = if args.lineups <= 1 {
        let settings = OptimizerSettings::from_config(&config.solver);
        let lineup = optimize_lineup(&pool, &Strategy::max_value(), config.roster.salary_cap, &settings)
            .context("failed to build a lineup")?;
        vec![lineup]
    } else {
        let set = generate_lineups(&pool, &config).context("failed to assign roster slots")?;
        for label in set.relaxed_strategies() {
            warn!("{label}: overlap limit relaxed to find a lineup");
        }
        for (label, reason) in set.failed_strategies() {
            warn!("{label}: no lineup ({reason})");
        }
        if set.lineups().is_empty() {
            bail!("no strategy produced a feasible lineup");
        }
        info!("max pairwise overlap: {}", set.max_pairwise_overlap());
        for (key, count) in set.exposure_counts().iter().filter(|(_, n)| *n > 1) {
            info!("exposure {key}: {count}");
        }
        set.lineups().into_iter().cloned().collect()
    };

    let reports: Vec<LineupReport> = lineups.iter().map(format_lineup).collect();
    print_reports(&lineups, &reports, config.roster.salary_cap, args.json)?;

    let output = args.output.clone().unwrap_or_else(|| default_output_path(lineups.len()));
    let file = File::create(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let written = if reports.len() == 1 {
        write_csv(&reports[0], file)
    } else {
        write_lineup_set_csv(&reports, file)
    };
    written.with_context(|| format!("failed to write {}", output.display()))?;
    info!("wrote {} lineup(s) to {}", reports.len(), output.display());

    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("courtside=info,courtside_core=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

/// Load the config file and apply command-line overrides.
fn load_config(args: &Args) -> anyhow::Result<Config> {
    let base_dir = match &args.config_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("failed to read working directory")?,
    };
    let mut config = config::load_config(&base_dir).context("failed to load configuration")?;

    if let Some(cap) = args.max_cost {
        config.roster.salary_cap = cap;
    }
    if args.lineups > 1 {
        config.diversify.num_lineups = args.lineups;
    }
    if let Some(overlap) = args.max_overlap {
        config.diversify.max_overlap = overlap;
    }
    if let Some(exposure) = args.max_exposure {
        config.diversify.max_exposure = exposure;
    }
    config::validate(&config).context("invalid command-line override")?;
    Ok(config)
}

fn load_pool(args: &Args, config: &Config) -> anyhow::Result<Vec<Candidate>> {
    let costs = load_cost_table(&args.costs)
        .with_context(|| format!("failed to load costs from {}", args.costs.display()))?;
    let projections = load_projection_table(&args.projections).with_context(|| {
        format!("failed to load projections from {}", args.projections.display())
    })?;

    let merged = merge_pool(&costs, &projections, &config.matching);
    let pool = filter_by_tip_time(&merged.candidates, &args.tip_times);
    if !args.tip_times.is_empty() {
        info!(
            "tip-time filter kept {} of {} candidates",
            pool.len(),
            merged.candidates.len()
        );
    }
    Ok(pool)
}

fn write_volatility(pool: &[Candidate], path: &Path) -> anyhow::Result<()> {
    let rows = score_pool(pool);
    for row in rank_by_boom(&rows).iter().take(5) {
        info!("boom {:>5.1}%  {}", row.boom_probability, row.name);
    }
    for row in rank_by_bust(&rows).iter().take(5) {
        info!("bust {:>5.1}%  {}", row.bust_probability, row.name);
    }
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_volatility_csv(&rows, file).with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote volatility table to {}", path.display());
    Ok(())
}

fn print_reports(
    lineups: &[Lineup],
    reports: &[LineupReport],
    salary_cap: f64,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        let text = if reports.len() == 1 {
            to_json(&reports[0])?
        } else {
            serde_json::to_string_pretty(reports)?
        };
        println!("{text}");
        return Ok(());
    }
    for (lineup, report) in lineups.iter().zip(reports) {
        println!("{}", render_table(report, &summarize(lineup, salary_cap)));
    }
    Ok(())
}

fn default_output_path(lineup_count: usize) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let stem = if lineup_count > 1 {
        "optimized_lineups"
    } else {
        "optimized_lineup"
    };
    PathBuf::from(format!("{stem}_{stamp}.csv"))
}
