// CLI module - command-line argument parsing and handlers
//
// The normal invocation is `homeboard --skin <file>`; the config
// subcommand inspects the app configuration:
// - config --show: Display effective configuration
// - config --path: Show config file path

use crate::config::{AppConfig, BackendConfig, VERSION};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Homeboard - a widget dashboard for kiosk displays
#[derive(Parser)]
#[command(name = "homeboard")]
#[command(version = VERSION)]
#[command(about = "Widget dashboard for kiosk displays", long_about = None)]
pub struct Cli {
    /// App config file (default: ~/.config/homeboard/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Skin file describing the screen and its widgets
    #[arg(long, default_value = "skin.toml")]
    pub skin: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

/// Handle CLI subcommands. Returns true if one was handled (exit after).
pub fn handle_cli(cli: &Cli) -> bool {
    match cli.command {
        Some(Commands::Config { show, path }) => {
            if path {
                handle_config_path();
            } else if show {
                handle_config_show(cli.config.as_deref());
            } else {
                println!("Usage: homeboard config [--show|--path]");
                println!();
                println!("Options:");
                println!("  --show    Display effective configuration");
                println!("  --path    Show config file path");
            }
            true
        }
        None => false,
    }
}

fn handle_config_path() {
    match AppConfig::config_path() {
        Some(path) => println!("{}", path.display()),
        None => {
            eprintln!("Error: Could not determine config path");
            std::process::exit(1);
        }
    }
}

fn handle_config_show(path: Option<&std::path::Path>) {
    let config = match AppConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    println!("# Effective configuration (env > file > defaults)");
    println!();
    println!("cache_dir = {:?}", config.cache_dir.display().to_string());
    println!("fps = {}", config.fps);
    println!("debug_widgets = {}", config.debug_widgets);
    println!();
    println!("[backend]");
    match &config.backend {
        BackendConfig::Framebuffer { device } => {
            println!("kind = \"framebuffer\"");
            println!("device = {:?}", device.display().to_string());
        }
        BackendConfig::Png { output } => {
            println!("kind = \"png\"");
            println!("output = {:?}", output.display().to_string());
        }
    }
    println!();
    println!("[logging]");
    println!("level = {:?}", config.logging.level);
    if let Some(dir) = &config.logging.dir {
        println!("dir = {:?}", dir.display().to_string());
    }

    println!();
    match path.map(PathBuf::from).or_else(AppConfig::config_path) {
        Some(p) if p.exists() => println!("# Source: {}", p.display()),
        _ => println!("# Source: defaults (no config file)"),
    }
}
