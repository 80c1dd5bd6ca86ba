//! Probe the DRM outputs the hardware composer would drive
//!
//! Runs output detection against a real DRM node and prints what each
//! display resolved to. Optionally switches one output's power state.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kms_hwcomposer::{DisplayDevice, DisplayPower, Drm, DrmConfig};

#[derive(Parser, Debug)]
#[command(name = "kms-hwc-probe")]
#[command(about = "Probe DRM outputs for the hardware composer", long_about = None)]
struct Args {
    /// Config file (defaults to $KMS_HWC_CONFIG or /etc/kms-hwcomposer.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// DRM node to open, overriding the config
    #[arg(long)]
    device: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(short, long)]
    debug: bool,

    /// Switch the selected output on or off after probing
    #[arg(long, value_enum)]
    dpms: Option<Power>,

    /// Output to apply --dpms to
    #[arg(long, value_enum, default_value = "primary")]
    output: Display,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Power {
    On,
    Off,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Display {
    Primary,
    External,
}

impl From<Power> for DisplayPower {
    fn from(power: Power) -> Self {
        match power {
            Power::On => DisplayPower::On,
            Power::Off => DisplayPower::Off,
        }
    }
}

impl From<Display> for DisplayDevice {
    fn from(display: Display) -> Self {
        match display {
            Display::Primary => DisplayDevice::Primary,
            Display::External => DisplayDevice::External,
        }
    }
}

fn print_output(drm: &Drm, display: DisplayDevice) {
    let summary = drm.with_output(display, |output| {
        let Some(connector) = output.connector() else {
            return format!("{:?}: no connector", display);
        };

        let mut line = format!(
            "{:?}: connector {} type {} {:?}, {} modes",
            display,
            connector.id,
            connector.connector_type,
            connector.connection,
            connector.modes.len()
        );
        if let Some(crtc) = output.crtc() {
            line.push_str(&format!(", crtc {} {}x{}", crtc.id, crtc.width, crtc.height));
        }
        if let Some(fb) = output.framebuffer() {
            line.push_str(&format!(", fb {} pitch {}", fb.id, fb.pitch));
        }
        line.push_str(if output.connected() {
            ", connected"
        } else {
            ", not connected"
        });
        line
    });

    match summary {
        Some(line) => println!("{}", line),
        None => println!("{:?}: unavailable", display),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Quiet by default, verbose with --debug
    let default_filter = if args.debug {
        "debug,kms_hwcomposer=trace"
    } else {
        "warn,kms_hwcomposer=info"
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &args.config {
        Some(path) => DrmConfig::load_from(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => DrmConfig::load().context("failed to load config")?,
    };
    if let Some(device) = args.device {
        config.device = device;
    }

    info!(device = %config.device.display(), "probing drm outputs");

    let drm = Drm::open(&config);
    drm.detect().context("output detection failed")?;

    match drm.drm_fd() {
        Some(fd) => println!("drm fd {}", fd),
        None => println!("drm not initialized"),
    }
    print_output(&drm, DisplayDevice::Primary);
    print_output(&drm, DisplayDevice::External);

    if let Some(power) = args.dpms {
        let display = DisplayDevice::from(args.output);
        drm.set_dpms_mode(display, power.into())
            .with_context(|| format!("failed to set {:?} power", display))?;
        println!("{:?}: dpms {:?}", display, power);
    }

    Ok(())
}
