//! hwinfo-report - print, capture or replay a hardware report
//!
//! The report can be produced straight from the Rust API or routed through
//! the exported C functions (`--through-ffi`), which exercises every get/free
//! pair the shared library offers.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use hwinfo_ffi::{ffi, logging, report, Config, HardwareContext, HardwareSnapshot, StaticProbe};
use std::fs;
use std::path::{Path, PathBuf};

/// hwinfo-report - Hardware information through the hwinfo-ffi boundary
#[derive(Parser)]
#[command(name = "hwinfo-report")]
#[command(version)]
#[command(about = "Print a hardware report, or capture one as JSON")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the hardware report (default)
    Report {
        /// Read hardware from a captured snapshot instead of this machine
        #[arg(long, value_name = "FILE")]
        replay: Option<PathBuf>,

        /// Collect the report through the exported C functions
        #[arg(long)]
        through_ffi: bool,
    },

    /// Write a JSON snapshot of this machine
    Capture {
        /// Output file (stdout when omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show the configuration file location and settings
    Config {
        /// Write the default configuration if no file exists yet
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    logging::init(&config.logging);

    match cli.command {
        Some(Commands::Report {
            replay,
            through_ffi,
        }) => run_report(&config, replay.as_deref(), through_ffi),
        None => run_report(&config, None, false),
        Some(Commands::Capture { output }) => run_capture(&config, output.as_deref()),
        Some(Commands::Config { init }) => show_config_info(init),
    }
}

fn build_context(config: &Config, replay: Option<&Path>) -> Result<HardwareContext> {
    match replay {
        Some(path) => {
            let probe = StaticProbe::load(path)
                .with_context(|| format!("Failed to load snapshot from {}", path.display()))?;
            Ok(HardwareContext::new(probe))
        }
        None => Ok(HardwareContext::from_config(config)),
    }
}

fn run_report(config: &Config, replay: Option<&Path>, through_ffi: bool) -> Result<()> {
    let ctx = build_context(config, replay)?;

    let snapshot: HardwareSnapshot = if through_ffi {
        ffi::install(ctx).map_err(|_| anyhow!("C boundary context was already initialized"))?;
        ffi::decode::read_snapshot().context("Failed to read hardware through the C boundary")?
    } else {
        ctx.snapshot().context("Failed to probe hardware")?
    };

    let source = match (replay, through_ffi) {
        (Some(path), _) => format!("replay of {}", path.display()),
        (None, true) => "live, via C ABI".to_string(),
        (None, false) => "live".to_string(),
    };
    println!("{} {}", "Source:".bright_cyan(), source.bright_white());
    println!("{}", report::render(&snapshot));

    Ok(())
}

fn run_capture(config: &Config, output: Option<&Path>) -> Result<()> {
    let ctx = build_context(config, None)?;
    let snapshot = ctx.snapshot().context("Failed to probe hardware")?;
    let json = snapshot
        .to_json_pretty()
        .context("Failed to serialize snapshot")?;

    match output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
            println!(
                "{} {}",
                "✓ Snapshot written to".bright_green(),
                path.display().to_string().bright_white()
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn show_config_info(init: bool) -> Result<()> {
    println!("{}", "hwinfo-ffi Configuration\n".bright_cyan().bold());

    let path = Config::config_path()?;
    println!(
        "{} {}",
        "Config file:".bright_yellow(),
        path.display().to_string().bright_white()
    );

    if path.exists() {
        println!("  {} {}", "Status:".bright_cyan(), "Exists".bright_green());
    } else if init {
        Config::init().context("Could not create config file")?;
        println!("  {} {}", "Status:".bright_cyan(), "Created with defaults".bright_green());
    } else {
        println!(
            "  {} {}",
            "Status:".bright_cyan(),
            "Not created yet (will use defaults)".bright_yellow()
        );
    }

    let cfg = Config::load()?;

    println!("\n{}", "Probe settings:".bright_white().bold());
    println!(
        "  {} {}",
        "Cache OS/memory/mainboard:".bright_cyan(),
        cfg.probe.cache_singletons
    );
    println!(
        "  {} {} ms",
        "CPU sample interval:".bright_cyan(),
        cfg.probe.sample_interval_ms
    );
    println!("  {} {}", "Use nvidia-smi:".bright_cyan(), cfg.probe.use_nvidia_smi);
    println!("  {} {}", "Use dmidecode:".bright_cyan(), cfg.probe.use_dmidecode);
    println!(
        "  {} {}",
        "sysfs root:".bright_cyan(),
        cfg.probe.sys_root.display()
    );
    println!(
        "  {} {}",
        "procfs root:".bright_cyan(),
        cfg.probe.proc_root.display()
    );

    println!("\n{}", "Logging:".bright_white().bold());
    println!(
        "  {} {}",
        "Enabled for C callers:".bright_cyan(),
        cfg.logging.enabled
    );
    println!("  {} {}", "Filter:".bright_cyan(), cfg.logging.filter);
    println!(
        "  {} {}",
        "Override:".bright_cyan(),
        format!("set {} to an EnvFilter directive", logging::LOG_ENV).bright_black()
    );

    Ok(())
}
