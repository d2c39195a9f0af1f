//! Native preview window
//!
//! Run with: cargo run --features viewer --bin depthfield-viewer
//!
//! Environment:
//!   DEPTHFIELD_SCENE   starfield | wave (default starfield)
//!   DEPTHFIELD_CONFIG  path to a camelCase JSON config

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use depthfield::viewer::ViewerApp;
    use depthfield::SceneConfig;
    use eframe::egui;
    use tracing::info;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,depthfield=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let scene = std::env::var("DEPTHFIELD_SCENE").unwrap_or_else(|_| "starfield".to_string());
    let config_json = match std::env::var("DEPTHFIELD_CONFIG") {
        Ok(path) => {
            info!(path = %path, "Loading config");
            Some(std::fs::read_to_string(path)?)
        }
        Err(_) => None,
    };
    let config = SceneConfig::from_json(&scene, config_json.as_deref())?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("depthfield")
            .with_inner_size([1024.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "depthfield",
        options,
        Box::new(move |cc| Ok(Box::new(ViewerApp::new(cc, config)))),
    )?;
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
