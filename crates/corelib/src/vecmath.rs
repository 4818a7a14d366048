//! Fixed-size 4-vector and 4x4 matrix used by the camera.
//!
//! Matrices are stored as four column vectors (`x`, `y`, `z`, `w`) and
//! multiply column vectors: `(m * n) * v == m * (n * v)`.

use std::ops::{Add, Div, Mul, Sub};

/// Homogeneous vector / point / direction.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const X: Self = Self::new(1.0, 0.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0, 0.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Cross product of the xyz parts. `w` of the result is always 0.
    #[inline]
    pub fn cross(u: Self, v: Self) -> Self {
        Self::new(
            u.y * v.z - v.y * u.z,
            u.z * v.x - v.z * u.x,
            u.x * v.y - v.x * u.y,
            0.0,
        )
    }

    /// Euclidean norm over all four components, `w` included.
    #[inline]
    pub fn length(u: Self) -> f32 {
        (u.x * u.x + u.y * u.y + u.z * u.z + u.w * u.w).sqrt()
    }

    /// Divides every component by `length(u) + f32::EPSILON`.
    /// The zero vector stays zero.
    #[inline]
    pub fn normalize(u: Self) -> Self {
        let inv = 1.0 / (Self::length(u) + f32::EPSILON);
        Self::new(u.x * inv, u.y * inv, u.z * inv, u.w * inv)
    }

    /// Same xyz with `w` forced to 0 (direction).
    #[inline]
    pub fn xyz0(self) -> Self {
        Self::new(self.x, self.y, self.z, 0.0)
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }
}

impl Add for Vec4 {
    type Output = Self;
    #[inline]
    fn add(self, v: Self) -> Self {
        Self::new(self.x + v.x, self.y + v.y, self.z + v.z, self.w + v.w)
    }
}

impl Sub for Vec4 {
    type Output = Self;
    #[inline]
    fn sub(self, v: Self) -> Self {
        Self::new(self.x - v.x, self.y - v.y, self.z - v.z, self.w - v.w)
    }
}

impl Mul for Vec4 {
    type Output = Self;
    #[inline]
    fn mul(self, v: Self) -> Self {
        Self::new(self.x * v.x, self.y * v.y, self.z * v.z, self.w * v.w)
    }
}

impl Div for Vec4 {
    type Output = Self;
    #[inline]
    fn div(self, v: Self) -> Self {
        Self::new(self.x / v.x, self.y / v.y, self.z / v.z, self.w / v.w)
    }
}

impl From<glam::Vec4> for Vec4 {
    fn from(v: glam::Vec4) -> Self {
        Self::new(v.x, v.y, v.z, v.w)
    }
}

impl From<Vec4> for glam::Vec4 {
    fn from(v: Vec4) -> Self {
        glam::Vec4::new(v.x, v.y, v.z, v.w)
    }
}

/// Column-major 4x4 matrix.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat4 {
    pub x: Vec4,
    pub y: Vec4,
    pub z: Vec4,
    pub w: Vec4,
}

impl Mat4 {
    pub const IDENTITY: Self = Self::from_cols(
        Vec4::new(1.0, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 1.0, 0.0, 0.0),
        Vec4::new(0.0, 0.0, 1.0, 0.0),
        Vec4::new(0.0, 0.0, 0.0, 1.0),
    );

    #[inline]
    pub const fn from_cols(x: Vec4, y: Vec4, z: Vec4, w: Vec4) -> Self {
        Self { x, y, z, w }
    }

    #[inline]
    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    /// View matrix looking from `eye` at `target`.
    ///
    /// The rotation is built first; the translation column is `-eye`
    /// carried through that rotation, so it lives in the camera basis.
    /// `eye == target` gives a degenerate (all-zero rotation) matrix.
    pub fn look_at(eye: Vec4, target: Vec4, up: Vec4) -> Self {
        let f = Vec4::normalize(target - eye);
        let s = Vec4::normalize(Vec4::cross(f, up));
        let u = Vec4::normalize(Vec4::cross(s, f));

        let mut m = Self::from_cols(
            Vec4::new(s.x, u.x, -f.x, 0.0),
            Vec4::new(s.y, u.y, -f.y, 0.0),
            Vec4::new(s.z, u.z, -f.z, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        );

        let t = m * Vec4::new(-eye.x, -eye.y, -eye.z, 1.0);
        m.w.x = t.x;
        m.w.y = t.y;
        m.w.z = t.z;
        m
    }

    /// GL-style perspective projection (clip z in [-w, w]).
    ///
    /// `fov_y_deg` of 0 or 180, or `z_near == z_far`, produce non-finite
    /// entries; callers must avoid them.
    pub fn perspective(fov_y_deg: f32, aspect: f32, z_near: f32, z_far: f32) -> Self {
        let rad = fov_y_deg.to_radians() * 0.5;
        let cotan = rad.cos() / rad.sin();
        let delta_z = z_near - z_far;

        Self::from_cols(
            Vec4::new(cotan / aspect, 0.0, 0.0, 0.0),
            Vec4::new(0.0, cotan, 0.0, 0.0),
            Vec4::new(0.0, 0.0, (z_far + z_near) / delta_z, -1.0),
            Vec4::new(0.0, 0.0, 2.0 * z_near * z_far / delta_z, 0.0),
        )
    }

    /// Rotation of `deg` degrees around `axis` (Rodrigues).
    /// `axis` must already be unit length; it is not normalized here.
    pub fn rotate(deg: f32, axis: Vec4) -> Self {
        let rad = deg.to_radians();
        let c = rad.cos();
        let s = rad.sin();
        let k = 1.0 - c;
        let Vec4 { x, y, z, .. } = axis;

        Self::from_cols(
            Vec4::new(x * x * k + c, y * x * k + z * s, x * z * k - y * s, 0.0),
            Vec4::new(x * y * k - z * s, y * y * k + c, y * z * k + x * s, 0.0),
            Vec4::new(x * z * k + y * s, y * z * k - x * s, z * z * k + c, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        )
    }

    pub fn to_cols_array(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        for (dst, col) in out.chunks_exact_mut(4).zip(self.to_cols_array_2d()) {
            dst.copy_from_slice(&col);
        }
        out
    }

    /// Column arrays, ready for a uniform buffer.
    pub fn to_cols_array_2d(&self) -> [[f32; 4]; 4] {
        [
            self.x.to_array(),
            self.y.to_array(),
            self.z.to_array(),
            self.w.to_array(),
        ]
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    #[inline]
    fn mul(self, u: Vec4) -> Vec4 {
        let m = &self;
        Vec4::new(
            m.x.x * u.x + m.y.x * u.y + m.z.x * u.z + m.w.x * u.w,
            m.x.y * u.x + m.y.y * u.y + m.z.y * u.z + m.w.y * u.w,
            m.x.z * u.x + m.y.z * u.y + m.z.z * u.z + m.w.z * u.w,
            m.x.w * u.x + m.y.w * u.y + m.z.w * u.z + m.w.w * u.w,
        )
    }
}

impl Mul for Mat4 {
    type Output = Self;
    #[inline]
    fn mul(self, n: Self) -> Self {
        // Column j of the product is self applied to column j of n.
        Self::from_cols(self * n.x, self * n.y, self * n.z, self * n.w)
    }
}

impl From<glam::Mat4> for Mat4 {
    fn from(m: glam::Mat4) -> Self {
        Self::from_cols(m.x_axis.into(), m.y_axis.into(), m.z_axis.into(), m.w_axis.into())
    }
}

impl From<Mat4> for glam::Mat4 {
    fn from(m: Mat4) -> Self {
        glam::Mat4::from_cols(m.x.into(), m.y.into(), m.z.into(), m.w.into())
    }
}
