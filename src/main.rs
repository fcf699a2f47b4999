use clap::Parser;
use glam::Vec2;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

use std::error::Error;
use std::fs;
use std::process;

mod cli;
mod logger;

use cli::Args;
use gridlight::accumulate::AccumulationBuffer;
use gridlight::color;
use gridlight::config::TraceConfig;
use gridlight::grid::MapBuffer;
use gridlight::projection;
use gridlight::random::Sampler;
use gridlight::tracer::{CameraPose, RayTracer};
use logger::init_logger;

fn load_config(path: Option<&str>) -> Result<TraceConfig, Box<dyn Error>> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            Ok(TraceConfig::from_toml(&text)?)
        }
        None => Ok(TraceConfig::default()),
    }
}

fn load_map(path: Option<&str>) -> Result<MapBuffer, Box<dyn Error>> {
    match path {
        Some(path) => {
            let image = image::open(path)?.to_rgba8();
            Ok(MapBuffer::from_image(image)?)
        }
        None => Ok(MapBuffer::demo()),
    }
}

/// Flatten the straight-alpha frame over a black backdrop and save it.
fn save_png(frame: &[u8], resolution: u32, path: &str) -> Result<(), Box<dyn Error>> {
    let mut out = image::RgbImage::new(resolution, resolution);
    for (i, pixel) in out.pixels_mut().enumerate() {
        let o = 4 * i;
        let alpha = frame[o + 3] as f32 / 255.0;
        *pixel = image::Rgb([
            (frame[o] as f32 * alpha).round() as u8,
            (frame[o + 1] as f32 * alpha).round() as u8,
            (frame[o + 2] as f32 * alpha).round() as u8,
        ]);
    }
    out.save(path)?;
    Ok(())
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = load_config(args.config.as_deref())?;
    let map = load_map(args.map.as_deref())?;
    info!(
        "Map {0}x{0} cells, projecting at {1}x{1}",
        map.size(),
        config.screen.resolution
    );

    let tracer = RayTracer::new(map.grid(), &config)?;
    let pose = CameraPose {
        position: Vec2::new(args.camera_x, args.camera_y),
        angle: args.camera_angle.to_radians(),
    };

    let seed: u64 = args.seed.unwrap_or_else(rand::random);
    info!("Sampler seed: {seed}");

    let frames = args.frames.max(1);
    let progress = ProgressBar::new(frames as u64);
    progress.set_style(ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames",
    )?);

    let mut accumulator = AccumulationBuffer::new();
    let mut view = Vec::new();
    for index in 0..frames {
        let sampler = Sampler::from_seed(seed.wrapping_add(index as u64));

        let intersections = if config.ray_casting.debug {
            let (intersections, rays) = tracer.trace_debug(&pose, &sampler);
            if index == 0 {
                for ray in &rays {
                    debug!(
                        "bounce {} from ({:.1}, {:.1}) toward ({:.3}, {:.3}): distance {:.2} (path {:.2}), color {}",
                        ray.level,
                        ray.origin.x,
                        ray.origin.y,
                        ray.direction.x,
                        ray.direction.y,
                        ray.distance,
                        ray.total_distance,
                        color::to_hex(
                            ray.color,
                            (config.camera.far / ray.total_distance / 10.0).clamp(0.0, 1.0)
                        ),
                    );
                }
            }
            intersections
        } else {
            tracer.trace(&pose, &sampler)
        };

        let frame = projection::draw(&intersections, &config);
        view = accumulator.blend(frame, index == 0);
        progress.inc(1);
    }
    progress.finish();

    save_png(&view, config.screen.resolution, &args.output)?;
    info!("Saved projection to {}", args.output);
    Ok(())
}

fn main() {
    let args = Args::parse();

    init_logger(args.debug_level.clone().into());

    // Log application startup with version information
    info!("Gridlight - Git Version {} ({})", env!("GIT_HASH"), env!("GIT_DATE"));

    if let Err(error) = run(args) {
        log::error!("{error}");
        process::exit(1);
    }
}
