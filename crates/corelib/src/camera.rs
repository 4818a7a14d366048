use crate::{CoreError, CoreResult, Mat4, Vec4};

/// Degrees of yaw per window width dragged.
const YAW_PER_WIDTH: f32 = 720.0;
/// Degrees of pitch per window height dragged.
const PITCH_PER_HEIGHT: f32 = 360.0;
const PITCH_LIMIT: f32 = 89.0;

/// Drawable area in physical pixels. Never zero-sized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> CoreResult<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidViewport { width, height });
        }
        Ok(Self { width, height })
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

/// Camera orbiting a target point, driven by mouse drags (right-handed,
/// angles in degrees).
#[derive(Clone, Copy, Debug)]
pub struct OrbitCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub target: Vec4,
    pub distance: f32,
    pub fov_y_deg: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            target: Vec4::new(0.0, 85.0, 0.0, 0.0),
            distance: 200.0,
            fov_y_deg: 60.0,
            z_near: 1.0,
            z_far: 1000.0,
        }
    }
}

impl OrbitCamera {
    /// Eye position: the +Z offset rotated by pitch (about X), then yaw
    /// (about Y), added to the target. `w` stays 0.
    pub fn eye(&self) -> Vec4 {
        let yaw = Mat4::rotate(self.yaw, Vec4::Y);
        let pitch = Mat4::rotate(self.pitch, Vec4::X);
        let offset = (yaw * pitch) * Vec4::new(0.0, 0.0, self.distance, 0.0);
        (self.target + offset).xyz0()
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at(self.eye(), self.target.xyz0(), Vec4::Y)
    }

    /// GL-style projection (z in [-1, 1]).
    #[inline]
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective(self.fov_y_deg, aspect.max(1e-6), self.z_near, self.z_far)
    }

    #[inline]
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view()
    }

    /// Unit direction from the origin towards the eye; used as the light.
    #[inline]
    pub fn light_dir(&self) -> Vec4 {
        Vec4::normalize(self.eye().xyz0())
    }

    /// Apply a pointer drag of `(dx, dy)` pixels, measured as old minus new
    /// cursor position.
    pub fn drag(&mut self, dx: i32, dy: i32, viewport: &Viewport) {
        self.yaw += dx as f32 * YAW_PER_WIDTH / viewport.width.max(1) as f32;
        self.pitch += dy as f32 * PITCH_PER_HEIGHT / viewport.height.max(1) as f32;
        self.yaw %= 360.0;
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }
}
