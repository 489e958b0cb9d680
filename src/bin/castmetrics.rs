use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, Subcommand};

use castmetrics::{report, AnalysisReport, CastAnalyzer, SnapshotLoader, WindowSet};

#[derive(Parser)]
#[command(name = "castmetrics", about = "Cast analytics and retention-risk CLI")]
struct Cli {
    /// Backend snapshot file (JSON)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monthly analysis for one cast
    Analyze {
        /// Cast id
        #[arg(long)]
        cast: String,
        /// Cast display name for diary attribution (defaults to the id)
        #[arg(long)]
        name: Option<String>,
        /// Reference month (YYYY-MM)
        #[arg(long)]
        month: String,
        /// Evaluation date for the staleness signal (YYYY-MM-DD, default today)
        #[arg(long)]
        as_of: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Write the markdown report to a file instead
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show the three windows a reference month resolves to
    Windows {
        /// Reference month (YYYY-MM)
        #[arg(long)]
        month: String,
    },
}

fn parse_date(text: Option<&str>) -> Option<chrono::NaiveDate> {
    text.and_then(|s| {
        let parsed = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
        if parsed.is_none() {
            log::warn!("Could not parse date '{s}' — using today");
        }
        parsed
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Analyze {
            cast,
            name,
            month,
            as_of,
            json,
            out,
        } => {
            let Some(data) = cli.data else {
                bail!("--data <snapshot.json> is required for analyze");
            };
            let analyzer = CastAnalyzer::new(SnapshotLoader::open(&data)?);
            let name = name.unwrap_or_else(|| cast.clone());
            let result = match parse_date(as_of.as_deref()) {
                Some(date) => analyzer.analyze_at(&cast, &name, &month, date)?,
                None => analyzer.analyze(&cast, &name, &month)?,
            };

            if let Some(path) = out {
                std::fs::write(&path, report::render_markdown(&result))?;
                println!("Report written to {}.", path.display());
            } else if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_summary(&result);
            }
        }
        Commands::Windows { month } => {
            let set = WindowSet::resolve(&month)?;
            println!("Windows for {month}");
            for (label, window) in [
                ("current", set.current),
                ("previous", set.previous),
                ("two back", set.two_back),
            ] {
                let (start, end) = window.date_range();
                println!("  {label:<9} {window}  {start} – {end}");
            }
        }
    }

    Ok(())
}

fn print_summary(result: &AnalysisReport) {
    let current = &result.snapshots.current;
    println!("Cast Analysis: {} ({})", result.cast_id, result.month);
    println!(
        "  Worked days:  {} ({} absences)",
        current.schedule.worked_days, current.schedule.absence_days
    );
    println!("  Working rate: {:.1}%", current.schedule.working_rate);
    println!(
        "  Services:     {} (gross ¥{})",
        current.sales.service_count, current.sales.gross_sales
    );
    println!("  Payout:       ¥{}", current.sales.total_payout);
    println!("  Avg ticket:   ¥{:.0}", current.sales.average_ticket);
    println!("  Cancel rate:  {:.1}%", current.cancellations.rate);

    println!();
    println!("Vs previous month:");
    for (metric, trend) in &result.vs_previous {
        println!("  {metric:<18} {:+.1} ({})", trend.delta, trend.percent);
    }

    println!();
    println!(
        "Risk: {} ({} of {} signals)",
        result.risk.level.as_str(),
        result.risk.true_count,
        result.risk.flags.len()
    );
    for flag in result.risk.flags.iter().filter(|f| f.triggered) {
        println!("  ! {} — {}", flag.name, flag.detail);
    }
}
