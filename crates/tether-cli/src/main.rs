use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use tether_control::{Commander, ModeMap, YawDirection};
use tether_link::{LinkConfig, VehicleLink};

#[derive(Debug, Parser)]
#[command(name = "tether", version, about = "tether - ROV command console")]
struct Cli {
    /// Path to the TOML config (link parameters and the vehicle mode table).
    #[arg(long)]
    config: Option<String>,

    /// Seconds to wait for the vehicle heartbeat before giving up.
    #[arg(long, default_value_t = 10)]
    connect_timeout_s: u64,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Listen for a heartbeat and report the discovered vehicle ids.
    Probe,
    /// Arm the motors.
    Arm {
        /// Wait up to N seconds for the motors-armed confirmation.
        #[arg(long)]
        wait_s: Option<u64>,
    },
    /// Disarm the motors.
    Disarm {
        #[arg(long)]
        wait_s: Option<u64>,
    },
    /// Set the flight mode by name (e.g. MANUAL, STABILIZE).
    Mode { name: String },
    /// Send a relative move setpoint (meters, m/s, or m/s^2 in NED axes).
    Move {
        order: MoveOrder,
        x: f32,
        y: f32,
        z: f32,
    },
    /// Point the nose at a heading.
    Yaw {
        yaw_deg: f32,
        #[arg(long, default_value_t = 10.0)]
        rate_dps: f32,
        #[arg(long, value_enum, default_value = "shortest")]
        direction: Direction,
        /// Interpret the angle as absolute instead of relative to the
        /// current heading.
        #[arg(long)]
        absolute: bool,
    },
    /// Tilt the camera gimbal.
    CameraPitch {
        pitch_deg: f32,
        #[arg(long, default_value_t = 5.0)]
        rate: f32,
    },
    /// Toggle the lights servo.
    Lights { state: Switch },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MoveOrder {
    Pos,
    Vel,
    Accel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Direction {
    Cw,
    Ccw,
    Shortest,
}

impl From<Direction> for YawDirection {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Cw => YawDirection::Clockwise,
            Direction::Ccw => YawDirection::CounterClockwise,
            Direction::Shortest => YawDirection::Shortest,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct Config {
    link: LinkConfig,
    /// Mode-name to custom-mode-id table for the connected firmware.
    modes: ModeMap,
}

fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(p) => {
            let s = std::fs::read_to_string(p).with_context(|| format!("read config {}", p))?;
            toml::from_str(&s).context("parse config toml")
        }
        None => Ok(Config::default()),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref())?;

    let mut link = VehicleLink::new(cfg.link.clone());
    link.listen()?;
    info!("waiting for vehicle heartbeat");
    link.await_heartbeat(Some(Duration::from_secs(cli.connect_timeout_s)))?;

    if let Command::Probe = cli.cmd {
        println!("system={}", link.target_system()?);
        println!("component={}", link.target_component()?);
        return Ok(());
    }

    // ArduSub expects a GCS heartbeat before acting on commands.
    link.send_heartbeat()?;
    let mut cmd = Commander::new(&mut link)?;

    match cli.cmd {
        Command::Probe => unreachable!(),
        Command::Arm { wait_s } => {
            cmd.arm(wait_s.map(Duration::from_secs))?;
            println!("armed");
        }
        Command::Disarm { wait_s } => {
            cmd.disarm(wait_s.map(Duration::from_secs))?;
            println!("disarmed");
        }
        Command::Mode { name } => {
            anyhow::ensure!(
                !cfg.modes.is_empty(),
                "no [modes] table in config; cannot resolve mode names"
            );
            cmd.set_mode(&name, &cfg.modes)?;
            println!("mode set to {}", name);
        }
        Command::Move { order, x, y, z } => {
            match order {
                MoveOrder::Pos => cmd.set_position(x, y, z)?,
                MoveOrder::Vel => cmd.set_velocity(x, y, z)?,
                MoveOrder::Accel => cmd.set_acceleration(x, y, z)?,
            }
            println!("setpoint sent");
        }
        Command::Yaw { yaw_deg, rate_dps, direction, absolute } => {
            cmd.set_yaw(yaw_deg, rate_dps, direction.into(), !absolute)?;
            println!("yaw sent");
        }
        Command::CameraPitch { pitch_deg, rate } => {
            cmd.set_camera_pitch(pitch_deg, rate)?;
            println!("camera pitch sent");
        }
        Command::Lights { state } => {
            cmd.lights(matches!(state, Switch::On))?;
            println!("lights {:?}", state);
        }
    }
    Ok(())
}
