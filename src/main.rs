//! Interactive maze viewer.
//!
//! ```bash
//! cargo run --release -- --map maze.txt --assets textures/
//! ```
//!
//! WASD / arrows move, `L` toggles linear floor, `K` toggles the sky,
//! `Tab` shows the map, `P` pauses, `Esc` quits.

use std::{
    collections::VecDeque,
    path::PathBuf,
    time::{Duration, Instant},
};

use clap::Parser;
use glam::Vec2;
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use maze_raycaster::{
    logging::{LoggingConfig, init_logging},
    renderer::{
        Billboard, FrameFlags, GraphicsVars, Renderer, Software, software::MapMarker,
    },
    world::{
        Camera, CameraParams, Cell, GameAssets, GameMap, GameTextures, SpriteBank, Texture,
        TextureError,
    },
};

const GOAL_SPRITE: u32 = 0;
const MOVE_SPEED: f32 = 2.5; // cells per second
const TURN_SPEED: f32 = 2.0; // radians per second
const PLAYER_RADIUS: f32 = 0.2;

const DEFAULT_MAZE: [&str; 12] = [
    "bbbbbbbbbbbbbbbb",
    "b      w       b",
    "b www  w  wwww b",
    "b   w  w     w b",
    "bww w     ww w b",
    "b   wwww  w  w b",
    "b w    w  w gw b",
    "b w ww w  wwww b",
    "b w  w      w  b",
    "b wwww  ww  w  b",
    "b       w      b",
    "bbbbbbbbbbbbbbbb",
];

#[derive(Parser, Debug)]
#[command(version, about = "Multithreaded software raycaster")]
struct Cli {
    /// Maze file, one row per line (`w` wall, `b` boundary, `g` goal).
    #[arg(long)]
    map: Option<PathBuf>,

    /// Directory holding wall/boundary/floor/ceiling/sky PNGs.
    #[arg(long)]
    assets: Option<PathBuf>,

    #[arg(long, default_value_t = 960)]
    width: usize,

    #[arg(long, default_value_t = 600)]
    height: usize,

    /// Render threads; 0 = one per core.
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Horizontal field of view, degrees.
    #[arg(long, default_value_t = 60.0)]
    fov: f32,

    #[arg(long, default_value_t = 32.0)]
    render_dist: f32,

    #[arg(long, default_value_t = 0.01)]
    precision: f32,

    /// Start in linear (row-interpolated) floor mode.
    #[arg(long)]
    linear: bool,

    /// Start with the sky instead of the ceiling.
    #[arg(long)]
    sky: bool,

    /// `env_logger` filter, overrides RUST_LOG.
    #[arg(long)]
    log: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(match cli.log.clone() {
        Some(filter) => LoggingConfig::with_filter(filter),
        None => LoggingConfig::default(),
    });

    // ─────────── world ────────────
    let map = match &cli.map {
        Some(path) => GameMap::from_file(path)?,
        None => GameMap::from_rows(&DEFAULT_MAZE)?,
    };
    let textures = match &cli.assets {
        Some(dir) => GameTextures::load(&GameAssets::from_dir(dir))?,
        None => GameTextures::builtin(),
    };
    let mut sprites = SpriteBank::new();
    sprites.insert(GOAL_SPRITE, goal_texture()?)?;

    let params = CameraParams::new(cli.fov.to_radians(), cli.render_dist, cli.precision)?;
    let start = spawn_point(&map).ok_or_else(|| anyhow::anyhow!("maze has no empty cell"))?;
    let mut camera = Camera::new(start, 0.0);
    let goals: Vec<Vec2> = map
        .goals()
        .map(|(x, y)| Vec2::new(x as f32 + 0.5, y as f32 + 0.5))
        .collect();
    log::info!(
        "maze {}x{}, {} goal(s)",
        map.width(),
        map.height(),
        goals.len()
    );
    log::debug!("maze layout:\n{map}");

    let mut renderer = Software::new(
        cli.width,
        cli.height,
        cli.threads,
        textures,
        sprites,
        GraphicsVars::default(),
    );

    let mut flags = FrameFlags::empty();
    flags.set(FrameFlags::LINEAR, cli.linear);
    flags.set(FrameFlags::SKY, cli.sky);

    let mut win = Window::new(
        "Maze raycaster",
        cli.width,
        cli.height,
        WindowOptions::default(),
    )?;
    win.set_target_fps(60);

    // ─────────── timing ────────────
    let mut acc_time = Duration::ZERO;
    let mut acc_frames = 0usize;
    let mut last_print = Instant::now();
    let mut last_tick = Instant::now();
    let mut reached_goal = false;

    while win.is_open() && !win.is_key_down(Key::Escape) {
        let dt = last_tick.elapsed().as_secs_f32().min(0.1);
        last_tick = Instant::now();

        /* toggles ---------------------------------------------------------- */
        for (key, flag) in [
            (Key::L, FrameFlags::LINEAR),
            (Key::K, FrameFlags::SKY),
            (Key::P, FrameFlags::PAUSED),
        ] {
            if win.is_key_pressed(key, KeyRepeat::No) {
                flags.toggle(flag);
            }
        }
        flags.set(FrameFlags::TABBED, win.is_key_down(Key::Tab));

        /* movement --------------------------------------------------------- */
        if !flags.contains(FrameFlags::PAUSED) {
            let mut forward = 0.0;
            let mut side = 0.0;
            let mut turn = 0.0;
            if win.is_key_down(Key::Up) || win.is_key_down(Key::W) {
                forward += 1.0;
            }
            if win.is_key_down(Key::Down) || win.is_key_down(Key::S) {
                forward -= 1.0;
            }
            if win.is_key_down(Key::A) {
                side -= 1.0;
            }
            if win.is_key_down(Key::D) {
                side += 1.0;
            }
            if win.is_key_down(Key::Left) {
                turn += 1.0;
            }
            if win.is_key_down(Key::Right) {
                turn -= 1.0;
            }
            camera.turn(turn * TURN_SPEED * dt);
            let step = MOVE_SPEED * dt;
            move_with_collision(&mut camera, &map, forward * step, side * step);

            if !reached_goal && map.cell_at(camera.pos) == Some(Cell::Goal) {
                reached_goal = true;
                log::info!("goal reached");
            }
        }

        /* draw ------------------------------------------------------------- */
        let t0 = Instant::now();
        let path = route_to_goal(&map, camera.pos);
        renderer.begin_frame();
        if flags.intersects(FrameFlags::PAUSED | FrameFlags::TABBED) {
            renderer.draw_map(&map, &camera, &path);
        } else {
            let billboards: Vec<Billboard> = goals
                .iter()
                .filter_map(|&p| {
                    Billboard::project(GOAL_SPRITE, p, 0.6, &camera, &params, cli.width)
                })
                .collect();
            renderer.draw_view(flags, &camera, &params, &map, &billboards)?;
            renderer.draw_minimap_background(&map);
            renderer.draw_path_out(&map, &path);
            renderer.draw_minimap_rays(&map, &camera);
            renderer.draw_minimap_triangles(
                &map,
                &[MapMarker {
                    pos: camera.pos,
                    yaw: camera.yaw,
                    color: [230, 60, 60, 255],
                }],
            );
        }

        let mut shown = Ok(());
        renderer.end_frame(|fb, w, h| {
            acc_time += t0.elapsed();
            acc_frames += 1;
            shown = win.update_with_buffer(fb, w, h);
        });
        shown?;

        if last_print.elapsed() >= Duration::from_secs(3) {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames.max(1) as f64;
            log::info!("avg render: {avg_ms:.2} ms ({:.1} FPS)", 1000.0 / avg_ms);
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }
    Ok(())
}

/// Centre of the first empty cell, row-major.
fn spawn_point(map: &GameMap) -> Option<Vec2> {
    map.cells()
        .iter()
        .position(|&c| c == Cell::Empty)
        .map(|i| {
            Vec2::new(
                (i % map.width()) as f32 + 0.5,
                (i / map.width()) as f32 + 0.5,
            )
        })
}

/// Axis-separated sliding: each axis is applied only if the player's
/// bounding square stays clear of solid cells.
fn move_with_collision(camera: &mut Camera, map: &GameMap, forward: f32, side: f32) {
    let delta = camera.forward() * forward + camera.right() * side;
    let blocked = |p: Vec2| {
        [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)]
            .iter()
            .any(|&(sx, sy)| {
                let c = p + Vec2::new(sx, sy) * PLAYER_RADIUS;
                map.is_solid(c.x.floor() as i64, c.y.floor() as i64)
            })
    };
    let try_x = camera.pos + Vec2::new(delta.x, 0.0);
    if !blocked(try_x) {
        camera.pos = try_x;
    }
    let try_y = camera.pos + Vec2::new(0.0, delta.y);
    if !blocked(try_y) {
        camera.pos = try_y;
    }
}

/// Breadth-first route over walkable cells to the nearest goal.
fn route_to_goal(map: &GameMap, from: Vec2) -> Vec<(usize, usize)> {
    let (w, h) = (map.width(), map.height());
    let start = (from.x.floor() as i64, from.y.floor() as i64);
    if map.is_solid(start.0, start.1) {
        return Vec::new();
    }
    let idx = |x: i64, y: i64| y as usize * w + x as usize;
    let mut prev = vec![usize::MAX; w * h];
    let mut queue = VecDeque::from([start]);
    prev[idx(start.0, start.1)] = idx(start.0, start.1);

    while let Some((x, y)) = queue.pop_front() {
        if map.cell(x, y) == Some(Cell::Goal) {
            let mut path = Vec::new();
            let mut i = idx(x, y);
            loop {
                path.push((i % w, i / w));
                if prev[i] == i {
                    break;
                }
                i = prev[i];
            }
            path.reverse();
            return path;
        }
        for (nx, ny) in [(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)] {
            if !map.is_solid(nx, ny) && prev[idx(nx, ny)] == usize::MAX {
                prev[idx(nx, ny)] = idx(x, y);
                queue.push_back((nx, ny));
            }
        }
    }
    Vec::new()
}

/// Gold diamond on a transparent background.
fn goal_texture() -> Result<Texture, TextureError> {
    const N: usize = 32;
    let mut pixels = Vec::with_capacity(N * N * 4);
    for y in 0..N {
        for x in 0..N {
            let d = (x as i32 * 2 - N as i32 + 1).abs() + (y as i32 * 2 - N as i32 + 1).abs();
            let px = if d < N as i32 {
                let shade = 255 - (d * 4).min(120) as u8;
                [shade, (shade as u16 * 4 / 5) as u8, 40, 255]
            } else {
                [0, 0, 0, 0]
            };
            pixels.extend_from_slice(&px);
        }
    }
    Texture::from_rgba(N, N, pixels)
}
