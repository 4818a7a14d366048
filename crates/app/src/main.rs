//! Entry point for the SBM viewer.

use anyhow::Result;
use app::ViewerConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ViewerConfig::from_env();
    log::info!(
        "Starting SBM viewer. Model: {:?}, texture: {:?}, backend: {:?}, window: {}, show_fps={}, window_size={}x{}",
        config.model,
        config.texture,
        config.gpu_backends,
        config.window,
        config.show_fps,
        config.width,
        config.height
    );

    if let Err(e) = app::run(&config) {
        log::error!("{:#}", e);
        return Err(e);
    }

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}
