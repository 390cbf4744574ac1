use a3launch::config::{LauncherConfig, load_config};
use a3launch::keys::{copy_keys, purge_keys};
use a3launch::launch::{build_args, render_command_line, spawn_server};
use a3launch::logging;
use a3launch::logs::{LineFilter, LogFollower, latest_log, open_in_viewer};
use a3launch::menu::run_console_menu;
use a3launch::paths::{Paths, config_file, keys_dir};
use a3launch::preset::{list_presets, parse_preset, select_by_name, select_interactive};
use a3launch::resolver::{ModFlag, resolve_mods};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "a3launch", version, about = "Arma 3 dedicated server launcher")]
struct Cli {
    /// Launcher config file (defaults to A3LAUNCH_CONFIG or the launcher home)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding preset files
    #[arg(long, global = true)]
    presets_dir: Option<PathBuf>,
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pick a preset, sync keys and start the server (default)
    Launch {
        /// Preset name; prompts when omitted
        #[arg(long)]
        preset: Option<String>,
        /// Print the command line without touching keys or starting anything
        #[arg(long)]
        dry_run: bool,
        /// Exit right after the server starts
        #[arg(long)]
        no_menu: bool,
    },
    /// List available presets
    Presets,
    /// Print the mods a preset would load
    Show { preset: String },
    /// Locate the newest RPT log, optionally opening or following it
    Logs {
        #[arg(long, conflicts_with = "filter")]
        open: bool,
        /// Follow the log, printing lines that match this pattern
        #[arg(long)]
        filter: Option<String>,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        let mut source = err.source();
        while let Some(inner) = source {
            eprintln!("  caused by: {inner}");
            source = inner.source();
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let default = Command::Launch {
        preset: None,
        dry_run: false,
        no_menu: false,
    };
    let command = cli.command.as_ref().unwrap_or(&default);

    match command {
        Command::Launch {
            preset,
            dry_run,
            no_menu,
        } => launch_server(&cli, preset.as_deref(), *dry_run, *no_menu)?,
        Command::Presets => {
            let dir = presets_dir(&cli)?;
            for preset in list_presets(&dir)? {
                println!("{}\t{}", preset.index, preset.name);
            }
        }
        Command::Show { preset } => {
            let dir = presets_dir(&cli)?;
            let presets = list_presets(&dir)?;
            let preset = select_by_name(&presets, preset)?;
            let mods = parse_preset(&preset.path)?;
            println!("global mods ({}):", mods.stats.global);
            print_list(&mods.global);
            println!("server mods ({}):", mods.stats.server);
            print_list(&mods.server);
            println!("skipped lines: {}", mods.stats.skipped);
        }
        Command::Logs { open, filter } => {
            let config = load_config(&config_file(cli.config.as_deref())?)?;
            let log = latest_log(&config.profiles)?;
            if *open {
                open_in_viewer(&log)?;
            } else if let Some(pattern) = filter {
                let filter = LineFilter::new(pattern)?;
                println!("following {} (Ctrl+C to stop)", log.display());
                LogFollower::new(log, filter).follow(&mut io::stdout())?;
            } else {
                println!("{}", log.display());
            }
        }
    }

    Ok(())
}

fn launch_server(
    cli: &Cli,
    preset_name: Option<&str>,
    dry_run: bool,
    no_menu: bool,
) -> Result<()> {
    let config = load_config(&config_file(cli.config.as_deref())?)?;
    let dir = presets_dir_for(cli, &config)?;
    let presets = list_presets(&dir)?;
    let preset = match preset_name {
        Some(name) => select_by_name(&presets, name)?,
        None => select_interactive(&presets, &mut io::stdin().lock(), &mut io::stdout())?,
    };
    println!("preset: {}", preset.name);

    let mods = parse_preset(&preset.path)?;
    let global = resolve_mods(&mods.global, &config.root, ModFlag::Global)?;
    let server = resolve_mods(&mods.server, &config.root, ModFlag::Server)?;
    let args = build_args(&config, global.as_ref(), server.as_ref());

    if dry_run {
        println!("{}", render_command_line(&config, &args));
        return Ok(());
    }

    let keys = keys_dir(&config.root);
    purge_keys(&keys)?;
    copy_keys(&config.root, &mods.all(), &keys)?;

    let pid = spawn_server(&config, &args)?;
    println!("server started (pid {pid})");

    if !no_menu {
        run_console_menu(&config.profiles)?;
    }
    Ok(())
}

fn presets_dir(cli: &Cli) -> Result<PathBuf> {
    if let Some(dir) = &cli.presets_dir {
        return Ok(dir.clone());
    }
    let config = load_config(&config_file(cli.config.as_deref())?)?;
    presets_dir_for(cli, &config)
}

/// `--presets-dir`, then the config's `presetsPath`, then the launcher home.
fn presets_dir_for(cli: &Cli, config: &LauncherConfig) -> Result<PathBuf> {
    match cli.presets_dir.clone().or_else(|| config.presets.clone()) {
        Some(dir) => Ok(dir),
        None => Ok(Paths::new()?.presets),
    }
}

fn print_list(items: &[String]) {
    if items.is_empty() {
        println!("  (none)");
    } else {
        for item in items {
            println!("  {item}");
        }
    }
}
