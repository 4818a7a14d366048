use std::{collections::VecDeque, sync::Arc};

use anyhow::{Result, bail};
use winit::window::Window;

use crate::{InputEvent, PumpStatus, WindowDesc, WindowSystem};

/// Window system without a display. Each pump delivers the next scripted
/// batch of input; once the script runs out pumps deliver nothing.
#[derive(Debug, Default)]
pub struct HeadlessWindowSystem {
    display_open: bool,
    window: Option<WindowDesc>,
    script: VecDeque<Vec<InputEvent>>,
    pumps: u64,
}

impl HeadlessWindowSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue input for one future pump.
    pub fn push_batch(&mut self, batch: Vec<InputEvent>) {
        self.script.push_back(batch);
    }

    pub fn with_script(mut self, script: impl IntoIterator<Item = Vec<InputEvent>>) -> Self {
        self.script.extend(script);
        self
    }

    /// Number of successful pumps so far.
    pub fn pumps(&self) -> u64 {
        self.pumps
    }
}

impl WindowSystem for HeadlessWindowSystem {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn open_display(&mut self) -> Result<()> {
        if self.display_open {
            bail!("Display already open");
        }
        self.display_open = true;
        log::debug!("Headless display opened");
        Ok(())
    }

    fn close_display(&mut self) {
        self.destroy_window();
        if self.display_open {
            self.display_open = false;
            log::debug!("Headless display closed");
        }
    }

    fn create_window(&mut self, desc: &WindowDesc) -> Result<()> {
        if !self.display_open {
            bail!("Cannot create a window without an open display");
        }
        if self.window.is_some() {
            bail!("Window already created");
        }
        log::info!("Headless window '{}': {}x{}", desc.title, desc.width, desc.height);
        // A native window reports its initial size through a resize event.
        self.script.push_front(vec![InputEvent::Resized {
            width: desc.width,
            height: desc.height,
        }]);
        self.window = Some(desc.clone());
        Ok(())
    }

    fn destroy_window(&mut self) {
        if self.window.take().is_some() {
            log::debug!("Headless window destroyed");
        }
    }

    fn pump_events(&mut self, events: &mut Vec<InputEvent>) -> Result<PumpStatus> {
        if self.window.is_none() {
            bail!("pump_events called without a window");
        }
        self.pumps += 1;
        if let Some(batch) = self.script.pop_front() {
            events.extend(batch);
        }
        Ok(PumpStatus::Continue)
    }

    fn surface_target(&self) -> Option<Arc<Window>> {
        None
    }
}
