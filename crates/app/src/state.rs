//! Viewer state driven by window input.

use corelib::{OrbitCamera, Viewport};
use platform::InputEvent;

/// What the loop should do after an event was applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    None,
    /// The drawable changed size; reconfigure the surface.
    Resize { width: u32, height: u32 },
    Quit,
}

#[derive(Clone, Debug, Default)]
pub struct ViewerState {
    pub camera: OrbitCamera,
    pub viewport: Viewport,
    /// Last cursor position; `None` until the first move.
    cursor: Option<(i32, i32)>,
}

impl ViewerState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: Viewport::new(width, height).unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Returns false when the size is degenerate (minimised window) and the
    /// previous viewport was kept.
    pub fn on_resize(&mut self, width: u32, height: u32) -> bool {
        match Viewport::new(width, height) {
            Ok(vp) => {
                self.viewport = vp;
                true
            }
            Err(e) => {
                log::debug!("Keeping {}x{}: {}", self.viewport.width, self.viewport.height, e);
                false
            }
        }
    }

    pub fn on_mouse_move(&mut self, x: i32, y: i32, left_button: bool) {
        if let Some((last_x, last_y)) = self.cursor
            && left_button
        {
            self.camera.drag(last_x - x, last_y - y, &self.viewport);
        }
        self.cursor = Some((x, y));
    }

    pub fn cursor(&self) -> Option<(i32, i32)> {
        self.cursor
    }

    pub fn apply(&mut self, event: InputEvent) -> Action {
        match event {
            InputEvent::Resized { width, height } => {
                if self.on_resize(width, height) {
                    Action::Resize { width, height }
                } else {
                    Action::None
                }
            }
            InputEvent::PointerMoved { x, y, left_button } => {
                self.on_mouse_move(x, y, left_button);
                Action::None
            }
            InputEvent::CloseRequested => Action::Quit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_resize_keeps_viewport() {
        let mut s = ViewerState::new(640, 480);
        assert_eq!(
            s.apply(InputEvent::Resized {
                width: 0,
                height: 300
            }),
            Action::None
        );
        assert_eq!((s.viewport.width, s.viewport.height), (640, 480));
        assert_eq!(
            s.apply(InputEvent::Resized {
                width: 320,
                height: 200
            }),
            Action::Resize {
                width: 320,
                height: 200
            }
        );
        assert_eq!(s.viewport.width, 320);
    }

    #[test]
    fn drag_needs_left_button() {
        let mut s = ViewerState::new(640, 480);
        s.on_mouse_move(100, 100, false);
        s.on_mouse_move(36, 100, false);
        assert_eq!(s.camera.yaw, 0.0);
        assert_eq!(s.cursor(), Some((36, 100)));

        // Moving left by 64 px at 640 wide is +72 degrees of yaw.
        s.on_mouse_move(-28, 100, true);
        assert!((s.camera.yaw - 72.0).abs() < 1e-4);
        s.on_mouse_move(-28, 76, true);
        assert!((s.camera.pitch - 18.0).abs() < 1e-4);
    }

    #[test]
    fn first_move_does_not_jump() {
        let mut s = ViewerState::new(640, 480);
        s.on_mouse_move(500, 400, true);
        assert_eq!(s.camera.yaw, 0.0);
        assert_eq!(s.camera.pitch, 0.0);
    }

    #[test]
    fn close_requests_quit() {
        let mut s = ViewerState::default();
        assert_eq!(s.apply(InputEvent::CloseRequested), Action::Quit);
    }

    #[test]
    fn degenerate_initial_size_falls_back() {
        let s = ViewerState::new(0, 0);
        assert_eq!(s.viewport, Viewport::default());
    }
}
