//! Platform layer: windowing behind one trait.
//!
//! A [`WindowSystem`] owns the display connection and at most one window.
//! The viewer drives it with a poll loop: pump events, handle them, draw.
//! Backends:
//! - [`WinitWindowSystem`]: native window through winit's pump-events API.
//! - [`HeadlessWindowSystem`]: no window; replays scripted input.

use std::{fmt, str::FromStr, sync::Arc};

use anyhow::Result;
use winit::window::Window;

mod headless;
mod winit_backend;

pub use headless::HeadlessWindowSystem;
pub use winit_backend::WinitWindowSystem;

/// Requested window properties.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowDesc {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowDesc {
    fn default() -> Self {
        Self {
            title: "SBM Viewer".to_string(),
            width: 640,
            height: 480,
        }
    }
}

/// Input delivered by a window system, in arrival order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    /// New drawable size in physical pixels.
    Resized { width: u32, height: u32 },
    /// Cursor position in window pixels and whether the left button is held.
    PointerMoved { x: i32, y: i32, left_button: bool },
    CloseRequested,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PumpStatus {
    Continue,
    /// The platform wants the loop to stop (e.g. the event loop exited).
    Exit,
}

/// Window system operations used by the viewer.
pub trait WindowSystem {
    fn name(&self) -> &'static str;

    /// Connect to the display server.
    fn open_display(&mut self) -> Result<()>;

    /// Disconnect from the display server. Destroys the window if present.
    fn close_display(&mut self);

    /// Create the single window. Requires an open display.
    fn create_window(&mut self, desc: &WindowDesc) -> Result<()>;

    fn destroy_window(&mut self);

    /// Process pending platform events without blocking, appending the
    /// translated input to `events`.
    fn pump_events(&mut self, events: &mut Vec<InputEvent>) -> Result<PumpStatus>;

    /// Native window for GPU surface creation, if this backend has one.
    fn surface_target(&self) -> Option<Arc<Window>>;
}

/// Window system variant, chosen at runtime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    #[default]
    Winit,
    Headless,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "winit" | "native" => Ok(Self::Winit),
            "headless" | "none" => Ok(Self::Headless),
            other => Err(format!("unknown window backend '{other}'")),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Winit => f.write_str("winit"),
            Self::Headless => f.write_str("headless"),
        }
    }
}

pub fn create_window_system(kind: BackendKind) -> Box<dyn WindowSystem> {
    log::info!("Using {} window system", kind);
    match kind {
        BackendKind::Winit => Box::new(WinitWindowSystem::new()),
        BackendKind::Headless => Box::new(HeadlessWindowSystem::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_parses_aliases() {
        assert_eq!("winit".parse::<BackendKind>(), Ok(BackendKind::Winit));
        assert_eq!("Native".parse::<BackendKind>(), Ok(BackendKind::Winit));
        assert_eq!("HEADLESS".parse::<BackendKind>(), Ok(BackendKind::Headless));
        assert!("x11".parse::<BackendKind>().is_err());
        assert_eq!(BackendKind::Headless.to_string(), "headless");
    }

    #[test]
    fn headless_factory_has_no_surface() {
        let mut ws = create_window_system(BackendKind::Headless);
        assert_eq!(ws.name(), "headless");
        ws.open_display().unwrap();
        ws.create_window(&WindowDesc::default()).unwrap();
        assert!(ws.surface_target().is_none());
        ws.destroy_window();
        ws.close_display();
    }
}
