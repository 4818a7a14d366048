//! Viewer main loop: load assets, open a window, pump input, draw frame 0.

use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use asset::{SbmObject, TextureData};
use platform::{PumpStatus, WindowDesc, WindowSystem, create_window_system};
use renderer::{DEFAULT_FRAME, FrameUniforms, GpuState, draw_range, stream_bindings};

use crate::config::ViewerConfig;
use crate::state::{Action, ViewerState};

/// Size of the checkerboard used with `--no-texture`.
const FALLBACK_TEXTURE_SIZE: u32 = 64;

/// Loop pacing when there is no surface to present to.
const IDLE_FRAME: Duration = Duration::from_millis(16);

/// What a finished run looked like.
#[derive(Debug)]
pub struct RunSummary {
    pub frames: u64,
    pub state: ViewerState,
}

pub fn run(config: &ViewerConfig) -> Result<RunSummary> {
    let mut ws = create_window_system(config.window);
    run_with(ws.as_mut(), config)
}

/// Run the viewer on an already constructed window system.
pub fn run_with(ws: &mut dyn WindowSystem, config: &ViewerConfig) -> Result<RunSummary> {
    let mesh = SbmObject::open(&config.model)
        .with_context(|| format!("Failed to load model {:?}", config.model))?;
    // Reject meshes the pipeline cannot bind before any window shows up.
    stream_bindings(&mesh).with_context(|| format!("Model {:?} is not drawable", config.model))?;

    let texture = match &config.texture {
        Some(path) => TextureData::load(path)?,
        None => {
            log::info!("Texture disabled, using checkerboard");
            TextureData::create_test_texture(FALLBACK_TEXTURE_SIZE)
        }
    };

    let backend = ws.name();
    ws.open_display()
        .with_context(|| format!("Failed to open {backend} display"))?;
    let result = run_window(ws, config, &mesh, &texture);
    ws.close_display();
    result
}

fn run_window(
    ws: &mut dyn WindowSystem,
    config: &ViewerConfig,
    mesh: &SbmObject,
    texture: &TextureData,
) -> Result<RunSummary> {
    let desc = WindowDesc {
        title: format!("SBM Viewer - {}", mesh.name().unwrap_or("unnamed")),
        width: config.width,
        height: config.height,
    };
    ws.create_window(&desc)?;
    let result = main_loop(ws, config, &desc, mesh, texture);
    ws.destroy_window();
    result
}

fn main_loop(
    ws: &mut dyn WindowSystem,
    config: &ViewerConfig,
    desc: &WindowDesc,
    mesh: &SbmObject,
    texture: &TextureData,
) -> Result<RunSummary> {
    let mut gpu = match ws.surface_target() {
        Some(window) => Some(pollster::block_on(GpuState::new(
            window,
            config.gpu_backends,
            mesh,
            texture,
        ))?),
        None => {
            log::info!("{} window has no surface, rendering disabled", ws.name());
            if config.max_frames.is_none() {
                log::warn!("No --frames limit; running until interrupted");
            }
            None
        }
    };

    let mut state = ViewerState::new(desc.width, desc.height);
    let vertices = draw_range(mesh, DEFAULT_FRAME);
    log::info!(
        "Drawing frame {} (vertices {}..{})",
        DEFAULT_FRAME,
        vertices.start,
        vertices.end
    );

    let mut events = Vec::new();
    let mut frames: u64 = 0;
    let mut fps_frames: u32 = 0;
    let mut fps_since = Instant::now();

    'main: loop {
        if config.max_frames.is_some_and(|max| frames >= max) {
            log::info!("Rendered {} frames, stopping", frames);
            break;
        }

        let status = ws.pump_events(&mut events)?;
        for event in events.drain(..) {
            match state.apply(event) {
                Action::None => {}
                Action::Resize { width, height } => {
                    if let Some(gpu) = gpu.as_mut() {
                        gpu.resize(width, height);
                    }
                }
                Action::Quit => break 'main,
            }
        }
        if status == PumpStatus::Exit {
            break;
        }

        match gpu.as_mut() {
            Some(gpu) => {
                let uniforms = FrameUniforms::new(&state.camera, &state.viewport);
                match gpu.render(&uniforms, vertices.clone()) {
                    Ok(()) => {}
                    Err(e) if GpuState::is_surface_lost(&e) => {
                        log::warn!("Surface {:?}, recreating", e);
                        gpu.recreate_surface();
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => bail!("GPU out of memory"),
                    Err(e) => log::warn!("Frame skipped: {:?}", e),
                }
            }
            None => std::thread::sleep(IDLE_FRAME),
        }
        frames += 1;

        if config.show_fps {
            fps_frames += 1;
            let elapsed = fps_since.elapsed();
            if elapsed >= Duration::from_secs(1) {
                log::info!("FPS: {:.1}", fps_frames as f64 / elapsed.as_secs_f64());
                fps_frames = 0;
                fps_since = Instant::now();
            }
        }
    }

    Ok(RunSummary { frames, state })
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset::sbm::SbmBuilder;
    use platform::{HeadlessWindowSystem, InputEvent};
    use tempfile::TempDir;

    fn model_dir() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        SbmBuilder::new("tri")
            .attribute("position", 4, vec![0.0; 12])
            .attribute("normal", 3, vec![0.0; 9])
            .attribute("texcoord0", 2, vec![0.0; 6])
            .frame(0, 3)
            .write_file(dir.path().join("tri.sbm"))
            .unwrap();
        dir
    }

    fn headless_config(dir: &TempDir, frames: u64) -> ViewerConfig {
        ViewerConfig {
            model: dir.path().join("tri.sbm"),
            texture: None,
            max_frames: Some(frames),
            window: platform::BackendKind::Headless,
            ..ViewerConfig::default()
        }
    }

    #[test]
    fn headless_run_stops_after_frame_limit() {
        let dir = model_dir();
        let summary = run(&headless_config(&dir, 2)).unwrap();
        assert_eq!(summary.frames, 2);
    }

    #[test]
    fn scripted_drag_turns_camera() {
        let dir = model_dir();
        let mut ws = HeadlessWindowSystem::new().with_script([
            vec![InputEvent::PointerMoved {
                x: 100,
                y: 100,
                left_button: true,
            }],
            vec![InputEvent::PointerMoved {
                x: 36,
                y: 100,
                left_button: true,
            }],
        ]);
        let summary = run_with(&mut ws, &headless_config(&dir, 3)).unwrap();
        assert_eq!(summary.frames, 3);
        assert!((summary.state.camera.yaw - 72.0).abs() < 1e-4);
    }

    #[test]
    fn close_request_ends_loop_early() {
        let dir = model_dir();
        let mut ws = HeadlessWindowSystem::new().with_script([vec![InputEvent::CloseRequested]]);
        let summary = run_with(&mut ws, &headless_config(&dir, 100)).unwrap();
        assert_eq!(summary.frames, 1);
    }

    #[test]
    fn missing_model_aborts_before_display() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ViewerConfig {
            model: dir.path().join("missing.sbm"),
            ..headless_config(&dir, 1)
        };
        let mut ws = HeadlessWindowSystem::new();
        let err = run_with(&mut ws, &cfg).unwrap_err();
        assert!(err.to_string().contains("Failed to load model"));
        assert_eq!(ws.pumps(), 0);
    }
}
