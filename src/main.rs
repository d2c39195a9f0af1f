//! Headless runner: animates a scene into a CPU raster
//!
//! Run with: cargo run --features cli --bin depthfield-cli
//!
//! Environment:
//!   DEPTHFIELD_SCENE     starfield | wave (default starfield)
//!   DEPTHFIELD_CONFIG    path to a camelCase JSON config
//!   DEPTHFIELD_SIZE      WxH (default 800x600)
//!   DEPTHFIELD_FRAMES    frames to run (default 600)
//!   DEPTHFIELD_FPS       target frame rate (default 60)
//!   DEPTHFIELD_SNAPSHOT  PNG written after the last frame

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::cell::RefCell;
    use std::rc::Rc;

    use depthfield::{AnyRenderer, ManualHost, RasterSurface, SceneConfig};
    use tracing::info;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,depthfield=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let scene = std::env::var("DEPTHFIELD_SCENE").unwrap_or_else(|_| "starfield".to_string());
    let config_path = std::env::var("DEPTHFIELD_CONFIG").ok();
    let (width, height) = parse_size(&env_or("DEPTHFIELD_SIZE", "800x600".to_string())?)?;
    let frames: u64 = env_or("DEPTHFIELD_FRAMES", 600)?;
    let fps: f64 = env_or("DEPTHFIELD_FPS", 60.0)?;
    if !(fps.is_finite() && fps > 0.0) {
        return Err(format!("DEPTHFIELD_FPS must be positive, got {}", fps).into());
    }
    let snapshot = std::env::var("DEPTHFIELD_SNAPSHOT").ok();

    let config_json = match &config_path {
        Some(path) => {
            info!(path = %path, "Loading config");
            Some(std::fs::read_to_string(path)?)
        }
        None => None,
    };
    let config = SceneConfig::from_json(&scene, config_json.as_deref())?;

    let surface = Rc::new(RefCell::new(RasterSurface::new(width, height)));
    let host = ManualHost::new();
    info!(scene = config.name(), width, height, frames, fps, "Starting headless run");

    let renderer = AnyRenderer::start(surface.clone(), &config, host.clone())?;
    run_frames(&host, &renderer, frames, fps).await;
    info!(summary = %renderer.summary(), "Final state");
    renderer.stop();

    if let Some(path) = snapshot {
        let surface = surface.borrow();
        write_png(&path, &surface)?;
        info!(path = %path, "Snapshot written");
    }
    Ok(())
}

/// Drive the host at `fps` until `frames` frames ran, logging once a second
#[cfg(not(target_arch = "wasm32"))]
async fn run_frames(host: &depthfield::ManualHost, renderer: &depthfield::AnyRenderer, frames: u64, fps: f64) {
    use std::time::{Duration, Instant};
    use tracing::info;

    let start_time = Instant::now();
    let mut frame_interval = tokio::time::interval(Duration::from_secs_f64(1.0 / fps));
    let mut stats_interval = tokio::time::interval(Duration::from_secs(1));
    stats_interval.tick().await;
    let mut frames_last_interval = renderer.frames();

    while renderer.frames() < frames {
        tokio::select! {
            _ = frame_interval.tick() => {
                host.run_frame();
            }
            _ = stats_interval.tick() => {
                let total = renderer.frames();
                info!(
                    frames = total,
                    skipped = renderer.skipped_frames(),
                    "/sec" = total - frames_last_interval,
                    "stats"
                );
                frames_last_interval = total;
            }
        }
    }

    let elapsed = start_time.elapsed().as_secs_f64();
    info!(
        frames = renderer.frames(),
        elapsed = format!("{:.2}s", elapsed),
        fps = format!("{:.1}", renderer.frames() as f64 / elapsed.max(f64::EPSILON)),
        "Run complete"
    );
}

#[cfg(not(target_arch = "wasm32"))]
fn env_or<T>(key: &str, default: T) -> Result<T, Box<dyn std::error::Error>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| format!("{}: {}", key, e).into()),
        Err(_) => Ok(default),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn parse_size(raw: &str) -> Result<(usize, usize), Box<dyn std::error::Error>> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("size must look like 800x600, got '{}'", raw))?;
    let (w, h): (usize, usize) = (w.trim().parse()?, h.trim().parse()?);
    if w == 0 || h == 0 {
        return Err(format!("size must be non-zero, got {}x{}", w, h).into());
    }
    Ok((w, h))
}

#[cfg(not(target_arch = "wasm32"))]
fn write_png(path: &str, surface: &depthfield::RasterSurface) -> Result<(), Box<dyn std::error::Error>> {
    use std::fs::File;
    use std::io::BufWriter;

    let file = BufWriter::new(File::create(path)?);
    let mut encoder = png::Encoder::new(file, surface.width() as u32, surface.height() as u32);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&surface.composited_over(depthfield::theme::colors::PAGE_BG))?;
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
