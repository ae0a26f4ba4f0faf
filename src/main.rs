//! `joymap` command-line tool.
//!
//! Lists controllers, polls one through the default mapping (plus an optional
//! joymap) and prints what the emulated port sees, and loads/saves joymaps.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use joymap::backends::{self, Backend};
use joymap::default_map::DirectionalPreference;
use joymap::logger::Logger;
use joymap::mapping::{pins, PotAxis};
use joymap::metadata::DeviceSummary;
use joymap::snapshot::EmulatedState;
use joymap::{run_poll_loop, Config, Device, DeviceRegistry, Joymap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "joymap")]
#[command(author, version, about = "Game controller to emulated joystick port mapper")]
struct Cli {
    /// Config file path (default: <config dir>/joymap/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List detected controllers
    #[command(visible_alias = "ls")]
    List {
        /// Print device descriptions as JSON
        #[arg(long)]
        json: bool,
        /// Also list every axis, button and hat
        #[arg(long)]
        inputs: bool,
    },

    /// Poll a controller and report emulated port activity until Ctrl+C
    Poll {
        /// Device index (from `list`) or node path
        device: String,
        /// Sleep between polls; overrides the config file
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,
        /// Joymap applied on top of the default mapping
        #[arg(long, value_name = "FILE")]
        joymap: Option<PathBuf>,
        /// Emulated port to assign the device to
        #[arg(long, default_value_t = 1)]
        port: u8,
    },

    /// Apply a joymap to a controller and print the resulting mapping
    Load {
        device: String,
        file: PathBuf,
    },

    /// Write a controller's current mapping as a joymap
    Save {
        device: String,
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = match cli.config.or_else(Config::default_path) {
        Some(path) => {
            Config::load(&path).with_context(|| format!("loading {}", path.display()))?
        }
        None => Config::default(),
    };

    let backend = backends::platform_backend(config.digital_policy())
        .context("no controller backend")?;
    let mut registry = DeviceRegistry::discover(backend).context("device discovery failed")?;
    let prefer = config.default_mapping.prefer;

    match cli.command {
        Commands::List { json, inputs } => list(&registry, json, inputs),
        Commands::Poll {
            device,
            interval_ms,
            joymap,
            port,
        } => {
            let interval = interval_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.poll_interval());
            poll(&mut registry, &device, prefer, joymap.as_deref(), port, interval)
        }
        Commands::Load { device, file } => {
            let index = select(&registry, &device)?;
            default_mapping(&mut registry, index, prefer);
            let applied = apply_joymap(&mut registry, index, &file)?;
            println!("applied {applied} override(s) from {}", file.display());
            print_mappings(device_at(&registry, index)?);
            Ok(())
        }
        Commands::Save { device, file } => {
            let index = select(&registry, &device)?;
            default_mapping(&mut registry, index, prefer);
            let device = device_at(&registry, index)?;
            Joymap::from_device(device)
                .save(&file)
                .with_context(|| format!("saving joymap for {device}"))?;
            println!("wrote {}", file.display());
            Ok(())
        }
    }
}

fn select<B: Backend>(registry: &DeviceRegistry<B>, selector: &str) -> Result<usize> {
    registry
        .find(selector)
        .ok_or_else(|| anyhow!("no device matches '{selector}' (see `joymap list`)"))
}

fn device_at<B: Backend>(registry: &DeviceRegistry<B>, index: usize) -> Result<&Device> {
    registry
        .device(index)
        .ok_or_else(|| anyhow!("device {index} disappeared"))
}

fn default_mapping<B: Backend>(
    registry: &mut DeviceRegistry<B>,
    index: usize,
    prefer: DirectionalPreference,
) {
    if let Some(Err(e)) = registry.apply_default_mapping(index, prefer) {
        warn!("no default mapping: {e}");
    }
}

fn apply_joymap<B: Backend>(
    registry: &mut DeviceRegistry<B>,
    index: usize,
    file: &Path,
) -> Result<usize> {
    let joymap = Joymap::load(file)?;
    let device = registry
        .device_mut(index)
        .ok_or_else(|| anyhow!("device {index} disappeared"))?;
    joymap
        .apply(device)
        .with_context(|| format!("applying {}", file.display()))
}

fn list<B: Backend>(registry: &DeviceRegistry<B>, json: bool, inputs: bool) -> Result<()> {
    let summaries: Vec<DeviceSummary> =
        registry.devices().iter().map(DeviceSummary::from).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("No controllers found.");
        return Ok(());
    }

    for (index, (summary, device)) in summaries.iter().zip(registry.devices()).enumerate() {
        let caps = if summary.capabilities.is_empty() {
            "none".to_string()
        } else {
            summary.capabilities.join(", ")
        };
        println!("{index}: {device}");
        println!(
            "   {} axes, {} buttons, {} hats; emulates: {caps}",
            device.axes.len(),
            device.buttons.len(),
            device.hats.len()
        );
        if inputs {
            for input in &summary.inputs {
                let code = input
                    .code
                    .map(|c| format!("{c:#06x}"))
                    .unwrap_or_else(|| "-".to_string());
                let mut line = format!("     {:<6} {code:<8} {}", input.kind.as_str(), input.name);
                if let Some((min, max)) = input.range {
                    line.push_str(&format!("  [{min}..{max}]"));
                }
                if input.digital == Some(true) {
                    line.push_str("  digital");
                }
                if let Some((x, y)) = input.sub_axes {
                    line.push_str(&format!("  axes {x:#x}/{y:#x}"));
                }
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn print_mappings(device: &Device) {
    let mapped = device.mapped_inputs();
    if mapped.is_empty() {
        println!("{device}: no mappings");
        return;
    }
    println!("{device}:");
    for (input, mapping) in mapped {
        println!("  {:<24} {mapping}", input.to_string());
    }
}

fn describe_pins(mask: u16) -> String {
    let names = [
        (pins::UP, "up"),
        (pins::DOWN, "down"),
        (pins::LEFT, "left"),
        (pins::RIGHT, "right"),
        (pins::FIRE, "fire"),
        (pins::FIRE2, "fire2"),
        (pins::FIRE3, "fire3"),
    ];
    let held: Vec<&str> = names
        .iter()
        .filter(|(bit, _)| mask & bit != 0)
        .map(|&(_, name)| name)
        .collect();
    if held.is_empty() {
        "none".to_string()
    } else {
        held.join("+")
    }
}

fn poll<B: Backend>(
    registry: &mut DeviceRegistry<B>,
    selector: &str,
    prefer: DirectionalPreference,
    joymap: Option<&Path>,
    port: u8,
    interval: Duration,
) -> Result<()> {
    let index = select(registry, selector)?;
    default_mapping(registry, index, prefer);
    if let Some(file) = joymap {
        let applied = apply_joymap(registry, index, file)?;
        info!("Applied {applied} override(s) from {}", file.display());
    }
    registry.assign_port(index, port)?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || handler_stop.store(true, Ordering::SeqCst))
        .context("installing Ctrl+C handler")?;

    let mut sink = Logger::new(EmulatedState::default());
    let mut open = registry.open(index).context("opening device")?;
    info!("Polling {}. Press Ctrl+C to stop.", open.device());
    let polls = run_poll_loop(&mut open, &mut sink, interval, &stop)?;
    drop(open);

    let state = sink.into_inner();
    let port = Some(port);
    println!("{polls} poll(s)");
    println!("pins: {}", describe_pins(state.pins(port)));
    println!(
        "pots: x={} y={}",
        state.pot(port, PotAxis::X),
        state.pot(port, PotAxis::Y)
    );
    let keys: Vec<String> = state
        .held_keys()
        .map(|k| format!("{},{}", k.row, k.column))
        .collect();
    if !keys.is_empty() {
        println!("held keys: {}", keys.join(" "));
    }
    if state.activations() > 0 {
        println!("ui activations: {}", state.activations());
    }
    Ok(())
}
