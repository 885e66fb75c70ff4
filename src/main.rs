use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};
use memplot::chart;
use memplot::config::MemplotConfig;
use memplot::memlog::{self, is_no_sections};
use memplot::styling::{
    BOLD, ERROR, ERROR_EMOJI, HINT, HINT_EMOJI, SUCCESS, SUCCESS_EMOJI, WARNING, WARNING_EMOJI,
    eprintln, println,
};
use memplot::viewer;

#[derive(Parser, Debug)]
#[command(
    name = "plot-mem-usage",
    version,
    about = "Plot TrajLNS memory usage from logs.",
    long_about = None
)]
struct Cli {
    /// Path to the planner log (e.g., log.txt).
    #[arg(long, value_name = "PATH")]
    log: PathBuf,
    /// Output image path (e.g., mem_usage.png or mem_usage.svg).
    ///
    /// Without an extension the chart is written as PNG.
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
    /// Display the plot even when --out is given.
    ///
    /// Without --out, the chart is written to memplot-chart.png in the temp
    /// directory, replacing the one from the previous run, and opened from
    /// there.
    #[arg(long)]
    show: bool,
    /// Print the parsed table only, without rendering a chart.
    #[arg(long, conflicts_with_all = ["out", "show"])]
    no_plot: bool,
    /// Tag before `:<key>_mem_GB` (defaults to "TrajLNS").
    #[arg(long, value_name = "TAG")]
    prefix: Option<String>,
    /// Path to memplot config TOML (defaults to `~/.config/memplot/config.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("{ERROR_EMOJI} {ERROR}{err:#}{ERROR:#}");
        if is_no_sections(&err) {
            eprintln!(
                "{HINT_EMOJI} {HINT}Expected lines like `TrajLNS:total_mem_GB = 0.5`; use --prefix for other tags{HINT:#}"
            );
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    // RUST_LOG, when set, overrides the -v level
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config =
        MemplotConfig::load(cli.config.as_deref()).context("Failed to load memplot config")?;
    let options = config.parse_options(cli.prefix.as_deref());

    let table = memlog::parse_file(&cli.log, &options)?;
    println!("Parsed sections: {}", table.len());
    println!("{}", table.render_text());

    if cli.no_plot {
        return Ok(());
    }

    let style = config.chart_style(options.prefix());

    let saved = match &cli.out {
        Some(out) => {
            let path = chart::save_chart(&table, out, &style)?;
            println!(
                "{SUCCESS_EMOJI} {SUCCESS}Saved plot to {BOLD}{}{BOLD:#}{SUCCESS:#}",
                path.display()
            );
            Some(path)
        }
        None => None,
    };

    if cli.show || saved.is_none() {
        let image = match saved {
            Some(path) => path,
            None => chart::save_chart(&table, &viewer::scratch_path(), &style)?,
        };
        if !viewer::show(&image, config.viewer.as_deref())? {
            eprintln!(
                "{WARNING_EMOJI} {WARNING}No image viewer found; chart is at {BOLD}{}{BOLD:#}{WARNING:#}",
                image.display()
            );
            eprintln!("{HINT_EMOJI} {HINT}Set `viewer` in the config or MEMPLOT_VIEWER{HINT:#}");
        }
    }

    Ok(())
}
