//! Headless frame benchmark.
//!
//! ```bash
//! cargo run --release --bin bench_frame -- --threads 4 --frames 300 --linear --sky
//! ```

use std::time::{Duration, Instant};

use clap::Parser;
use glam::Vec2;

use maze_raycaster::{
    logging::{LoggingConfig, init_logging},
    renderer::{Billboard, FrameFlags, GraphicsVars, Renderer, Software},
    world::{Camera, CameraParams, GameMap, GameTextures, SpriteBank, Texture},
};

#[derive(Parser, Debug)]
#[command(about = "Render N frames off-screen and report the average frame time")]
struct Cli {
    #[arg(long, default_value_t = 1280)]
    width: usize,

    #[arg(long, default_value_t = 800)]
    height: usize,

    /// Render threads; 0 = one per core.
    #[arg(long, default_value_t = 0)]
    threads: usize,

    #[arg(long, default_value_t = 200)]
    frames: usize,

    /// Square arena side, in cells.
    #[arg(long, default_value_t = 24)]
    arena: usize,

    /// Billboards scattered through the arena.
    #[arg(long, default_value_t = 16)]
    sprites: usize,

    /// Horizontal field of view, degrees.
    #[arg(long, default_value_t = 60.0)]
    fov: f32,

    #[arg(long, default_value_t = 32.0)]
    render_dist: f32,

    #[arg(long, default_value_t = 0.01)]
    precision: f32,

    #[arg(long)]
    linear: bool,

    #[arg(long)]
    sky: bool,

    #[arg(long)]
    log: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(match cli.log.clone() {
        Some(filter) => LoggingConfig::with_filter(filter),
        None => LoggingConfig::default(),
    });
    anyhow::ensure!(cli.arena >= 3, "arena must be at least 3 cells wide");

    let map = GameMap::bordered(cli.arena, cli.arena);
    let params = CameraParams::new(cli.fov.to_radians(), cli.render_dist, cli.precision)?;
    let mut bank = SpriteBank::new();
    bank.insert(0, Texture::solid(16, 16, [200, 180, 40, 255]))?;

    let mut renderer = Software::new(
        cli.width,
        cli.height,
        cli.threads,
        GameTextures::builtin(),
        bank,
        GraphicsVars::default(),
    );

    let mut flags = FrameFlags::empty();
    flags.set(FrameFlags::LINEAR, cli.linear);
    flags.set(FrameFlags::SKY, cli.sky);

    let centre = Vec2::splat(cli.arena as f32 * 0.5);
    let spots: Vec<Vec2> = (0..cli.sprites)
        .map(|i| {
            let a = i as f32 * 2.399; // golden angle
            let r = 1.0 + (i % 5) as f32 * (cli.arena as f32 * 0.08);
            centre + Vec2::from_angle(a) * r
        })
        .collect();

    let mut total = Duration::ZERO;
    let mut slowest = Duration::ZERO;
    for frame in 0..cli.frames {
        let yaw = frame as f32 * 0.01;
        let camera = Camera::new(centre, yaw);
        let billboards: Vec<Billboard> = spots
            .iter()
            .filter_map(|&p| Billboard::project(0, p, 0.5, &camera, &params, cli.width))
            .collect();

        let t0 = Instant::now();
        renderer.begin_frame();
        renderer.draw_view(flags, &camera, &params, &map, &billboards)?;
        renderer.end_frame(|_, _, _| {});
        let dt = t0.elapsed();

        total += dt;
        slowest = slowest.max(dt);
    }

    let avg_ms = total.as_secs_f64() * 1000.0 / cli.frames.max(1) as f64;
    log::info!(
        "{} frames {}x{} on {} worker(s): avg {avg_ms:.2} ms, worst {:.2} ms",
        cli.frames,
        cli.width,
        cli.height,
        renderer.worker_count(),
        slowest.as_secs_f64() * 1000.0,
    );
    Ok(())
}
