mod render;
mod replay;
mod simulate;
mod trace;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use keyscanner_debounce::{ScanInterval, TableVariant};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "keyscanner-cli")]
#[command(about = "Key switch debouncer inspection and trace replay")]
struct Cli {
    /// Enable debug output on stderr
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum TableArg {
    Minimal,
    ChatterDefense,
}

impl From<TableArg> for TableVariant {
    fn from(arg: TableArg) -> Self {
        match arg {
            TableArg::Minimal => TableVariant::Minimal,
            TableArg::ChatterDefense => TableVariant::ChatterDefense,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Replay recorded switch traces and check the press counts
    Replay {
        /// Trace files (0/1 samples, `# PRESSES:` and `# SAMPLES-PER-SECOND:` comments)
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = TableArg::ChatterDefense)]
        table: TableArg,
        /// Scan timer compare value; sets the simulated sampling rate
        #[arg(short, long, default_value_t = ScanInterval::DEFAULT.raw())]
        interval: u8,
        /// Simulated sampling rate in Hz, overrides --interval
        #[arg(short, long)]
        sample_rate: Option<u32>,
        /// Use the timer's real rate for the default interval instead of the nominal 2000 Hz
        #[arg(long)]
        exact_rate: bool,
    },
    /// Print the phases of a lifecycle table
    Table {
        #[arg(short, long, value_enum, default_value_t = TableArg::ChatterDefense)]
        table: TableArg,
    },
    /// Print a lifecycle table as a Graphviz graph
    Graph {
        #[arg(short, long, value_enum, default_value_t = TableArg::ChatterDefense)]
        table: TableArg,
    },
    /// Feed a sample pattern such as "0x100 1x50 0x100" to one key
    Simulate {
        pattern: String,
        #[arg(short, long, value_enum, default_value_t = TableArg::ChatterDefense)]
        table: TableArg,
        /// Print phase and countdown after every sample
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    match cli.command {
        Command::Replay {
            files,
            table,
            interval,
            sample_rate,
            exact_rate,
        } => {
            let variant = TableVariant::from(table);
            let target_rate = match sample_rate {
                Some(rate) => rate.max(1),
                None => replay::target_rate(
                    ScanInterval::new(interval).context("invalid --interval")?,
                    exact_rate,
                ),
            };
            log::info!("replaying at {} samples per second", target_rate);

            let pb = ProgressBar::new(files.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} traces")
                    .context("progress bar template")?
                    .progress_chars("=> "),
            );
            pb.set_message(variant.name());

            let mut passed = 0;
            for file in &files {
                let name = file.display();
                match trace::load(file) {
                    Ok(trace) => {
                        let outcome = replay::replay(variant.table(), &trace, target_rate);
                        let lines =
                            replay::report_lines(variant.name(), &name.to_string(), &outcome);
                        // Results go to stdout even when the bar is hidden.
                        pb.suspend(|| {
                            for line in &lines {
                                println!("{}", line);
                            }
                        });
                        if outcome.passed() {
                            passed += 1;
                        }
                    }
                    Err(e) => log::error!("{}: {:#}", name, e),
                }
                pb.inc(1);
            }
            pb.finish_and_clear();

            println!("{}/{}", passed, files.len());
            if passed != files.len() {
                std::process::exit(1);
            }
        }
        Command::Table { table } => {
            let variant = TableVariant::from(table);
            println!("{} ({} phases)", variant, variant.table().len());
            print!("{}", render::phase_listing(variant.table()));
        }
        Command::Graph { table } => {
            let variant = TableVariant::from(table);
            print!("{}", render::dot(variant.table(), variant.name()));
        }
        Command::Simulate {
            pattern,
            table,
            verbose,
        } => {
            let variant = TableVariant::from(table);
            let samples = simulate::parse_pattern(&pattern).context("parsing pattern")?;
            let sim = simulate::simulate(variant.table(), &samples);

            if verbose {
                for (n, step) in sim.steps.iter().enumerate() {
                    println!(
                        "{:>6} {} {:<18} {:>3} {}",
                        n + 1,
                        step.input as u8,
                        step.phase.name(),
                        step.ticks_remaining,
                        step.state as u8
                    );
                }
            }
            for change in &sim.changes {
                let what = if change.pressed { "press" } else { "release" };
                println!("sample {}: {}", change.sample, what);
            }
            println!(
                "{} samples, {} presses, {} releases",
                samples.len(),
                sim.presses(),
                sim.releases()
            );
        }
    }

    Ok(())
}
