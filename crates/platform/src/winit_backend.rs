use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result, anyhow, bail};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus as WinitPumpStatus},
    window::{Window, WindowId},
};

use crate::{InputEvent, PumpStatus, WindowDesc, WindowSystem};

/// How many zero-timeout pumps to allow for the window to appear.
const CREATE_ATTEMPTS: u32 = 64;

/// Receives winit callbacks during a pump and queues translated input.
#[derive(Default)]
struct Handler {
    requested: Option<WindowDesc>,
    window: Option<Arc<Window>>,
    create_error: Option<String>,
    queue: Vec<InputEvent>,
    left_button: bool,
}

impl Handler {
    /// Windows can only be created from an active event loop in winit 0.30,
    /// so creation is deferred to the first callback that has one.
    fn ensure_window(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.create_error.is_some() {
            return;
        }
        let Some(desc) = &self.requested else {
            return;
        };
        let attrs = Window::default_attributes()
            .with_title(desc.title.clone())
            .with_inner_size(PhysicalSize::new(desc.width, desc.height));
        match event_loop.create_window(attrs) {
            Ok(window) => {
                let size = window.inner_size();
                log::info!("Window created: {}x{}", size.width, size.height);
                self.window = Some(Arc::new(window));
            }
            Err(e) => self.create_error = Some(e.to_string()),
        }
    }
}

impl ApplicationHandler for Handler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.ensure_window(event_loop);
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested.");
                self.queue.push(InputEvent::CloseRequested);
            }
            WindowEvent::Resized(size) => {
                log::debug!("Resized: {}x{}", size.width, size.height);
                self.queue.push(InputEvent::Resized {
                    width: size.width,
                    height: size.height,
                });
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.left_button = state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.queue.push(InputEvent::PointerMoved {
                    x: position.x as i32,
                    y: position.y as i32,
                    left_button: self.left_button,
                });
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                log::info!("Scale factor changed: {:.3}", scale_factor);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.ensure_window(event_loop);
    }
}

/// Native window via winit, driven by `pump_app_events` so the caller
/// keeps ownership of the loop.
#[derive(Default)]
pub struct WinitWindowSystem {
    event_loop: Option<EventLoop<()>>,
    handler: Handler,
}

impl WinitWindowSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn pump_once(&mut self) -> Result<WinitPumpStatus> {
        let event_loop = self
            .event_loop
            .as_mut()
            .ok_or_else(|| anyhow!("Display is not open"))?;
        Ok(event_loop.pump_app_events(Some(Duration::ZERO), &mut self.handler))
    }
}

impl WindowSystem for WinitWindowSystem {
    fn name(&self) -> &'static str {
        "winit"
    }

    fn open_display(&mut self) -> Result<()> {
        if self.event_loop.is_some() {
            bail!("Display already open");
        }
        let event_loop = EventLoop::new().context("Failed to create event loop")?;
        self.event_loop = Some(event_loop);
        log::info!("Native display opened");
        Ok(())
    }

    fn close_display(&mut self) {
        self.destroy_window();
        if self.event_loop.take().is_some() {
            log::info!("Native display closed");
        }
    }

    fn create_window(&mut self, desc: &WindowDesc) -> Result<()> {
        if self.handler.window.is_some() {
            bail!("Window already created");
        }
        self.handler.requested = Some(desc.clone());
        self.handler.create_error = None;

        for _ in 0..CREATE_ATTEMPTS {
            if let WinitPumpStatus::Exit(code) = self.pump_once()? {
                bail!("Event loop exited with code {code} before the window was created");
            }
            if let Some(err) = self.handler.create_error.take() {
                self.handler.requested = None;
                bail!("Failed to create window: {err}");
            }
            if self.handler.window.is_some() {
                return Ok(());
            }
        }
        self.handler.requested = None;
        bail!("Window was not created after {CREATE_ATTEMPTS} event pumps")
    }

    fn destroy_window(&mut self) {
        self.handler.requested = None;
        if self.handler.window.take().is_some() {
            log::info!("Window destroyed");
        }
    }

    fn pump_events(&mut self, events: &mut Vec<InputEvent>) -> Result<PumpStatus> {
        if self.handler.window.is_none() {
            bail!("pump_events called without a window");
        }
        let status = self.pump_once()?;
        events.append(&mut self.handler.queue);
        Ok(match status {
            WinitPumpStatus::Continue => PumpStatus::Continue,
            WinitPumpStatus::Exit(code) => {
                log::info!("Event loop exited with code {}", code);
                PumpStatus::Exit
            }
        })
    }

    fn surface_target(&self) -> Option<Arc<Window>> {
        self.handler.window.clone()
    }
}
