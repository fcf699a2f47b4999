use clap::{Parser, ValueEnum};
use log::LevelFilter;

/// Custom enum for log levels that can be used with clap's ValueEnum
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convert our custom LogLevel enum to log crate's LevelFilter
impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Command line arguments structure using clap derive macros
#[derive(Parser)]
#[command(name = "gridlight")]
#[command(about = "A 2D grid ray tracer with reflections and light accumulation")]
pub struct Args {
    /// Trace configuration TOML; built-in defaults when omitted
    #[arg(short, long)]
    pub config: Option<String>,

    /// Square RGBA map image; the built-in demo scene when omitted
    #[arg(short, long)]
    pub map: Option<String>,

    /// Set the logging level (defaults to "info")
    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub debug_level: LogLevel,

    /// Camera x position in map cells
    #[arg(long, default_value = "138.0")]
    pub camera_x: f32,

    /// Camera y position in map cells
    #[arg(long, default_value = "42.0")]
    pub camera_y: f32,

    /// Camera view angle in degrees
    #[arg(long, default_value = "56.0")]
    pub camera_angle: f32,

    /// Number of frames to trace; accumulation averages them
    #[arg(short, long, default_value = "1")]
    pub frames: u32,

    /// Seed for the stochastic sampler; random when omitted
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Output file path for the projected view (PNG)
    #[arg(short, long, default_value = "projection.png")]
    pub output: String,
}
