//! Per-frame data the GPU path needs, computed without touching the GPU.

use std::ops::Range;

use anyhow::{Result, bail};
use asset::{SbmObject, sbm::COMPONENT_SIZE};
use bytemuck::{Pod, Zeroable};
use corelib::{Mat4, OrbitCamera, Vec4, Viewport};

/// Attribute order the sample meshes use: position, normal, texcoord0.
pub const STREAM_NAMES: [&str; 3] = ["position", "normal", "texcoord0"];

/// Pose drawn by the viewer.
pub const DEFAULT_FRAME: u32 = 0;

/// Maps GL clip depth `[-w, w]` onto wgpu's `[0, w]`.
pub const OPENGL_TO_WGPU: Mat4 = Mat4::from_cols(
    Vec4::new(1.0, 0.0, 0.0, 0.0),
    Vec4::new(0.0, 1.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 0.5, 0.0),
    Vec4::new(0.0, 0.0, 0.5, 1.0),
);

/// One attribute stream bound as its own vertex buffer slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamBinding {
    /// Shader input location (equals the attribute index).
    pub location: u32,
    pub components: u32,
    /// Byte range inside the vertex payload.
    pub offset: u64,
    pub size: u64,
}

impl StreamBinding {
    #[inline]
    pub fn stride(&self) -> u64 {
        u64::from(self.components) * COMPONENT_SIZE as u64
    }

    #[inline]
    pub fn range(&self) -> Range<u64> {
        self.offset..self.offset + self.size
    }

    pub fn format(&self) -> wgpu::VertexFormat {
        match self.components {
            1 => wgpu::VertexFormat::Float32,
            2 => wgpu::VertexFormat::Float32x2,
            3 => wgpu::VertexFormat::Float32x3,
            _ => wgpu::VertexFormat::Float32x4,
        }
    }
}

/// Bind attributes 0, 1 and 2 of `mesh` as position, normal and texcoord.
pub fn stream_bindings(mesh: &SbmObject) -> Result<[StreamBinding; 3]> {
    if mesh.vertex_count() == 0 {
        bail!("Mesh has no vertices");
    }
    if mesh.attribute_count() < STREAM_NAMES.len() as u32 {
        bail!(
            "Mesh has {} attributes, need {} ({})",
            mesh.attribute_count(),
            STREAM_NAMES.len(),
            STREAM_NAMES.join(", ")
        );
    }

    let mut out = [StreamBinding {
        location: 0,
        components: 0,
        offset: 0,
        size: 0,
    }; 3];
    for (location, slot) in (0u32..).zip(out.iter_mut()) {
        let Some(stream) = mesh.attribute_stream(location) else {
            bail!("Attribute {location} has no stream");
        };
        if !(1..=4).contains(&stream.components) {
            bail!(
                "Attribute {} ({:?}) has {} components, expected 1..=4",
                location,
                stream.name,
                stream.components
            );
        }
        if stream.name != STREAM_NAMES[location as usize] {
            log::debug!(
                "Binding attribute {} {:?} as {}",
                location,
                stream.name,
                STREAM_NAMES[location as usize]
            );
        }
        *slot = StreamBinding {
            location,
            components: stream.components,
            offset: stream.offset as u64,
            size: stream.bytes.len() as u64,
        };
    }
    Ok(out)
}

/// Vertex range of `frame`; empty when the frame does not exist.
pub fn draw_range(mesh: &SbmObject, frame: u32) -> Range<u32> {
    let first = mesh.frame_first_vertex(frame);
    first..first.saturating_add(mesh.frame_vertex_count(frame))
}

/// Uniform block shared by both shader stages (80 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FrameUniforms {
    pub mvp: [[f32; 4]; 4],
    /// Unit light direction; `w` is 0.
    pub light: [f32; 4],
}

impl FrameUniforms {
    pub fn new(camera: &OrbitCamera, viewport: &Viewport) -> Self {
        let mvp = OPENGL_TO_WGPU * camera.view_projection(viewport.aspect());
        Self {
            mvp: mvp.to_cols_array_2d(),
            light: camera.light_dir().to_array(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset::sbm::SbmBuilder;

    fn mesh(uv_components: u32) -> SbmObject {
        let uv = vec![0.5; 3 * uv_components as usize];
        let bytes = SbmBuilder::new("m")
            .attribute("position", 4, vec![1.0; 12])
            .attribute("normal", 3, vec![0.0; 9])
            .attribute("texcoord0", uv_components, uv)
            .frame(1, 2)
            .to_bytes()
            .unwrap();
        SbmObject::from_bytes(bytes).unwrap()
    }

    #[test]
    fn bindings_follow_stream_offsets() {
        let [pos, normal, uv] = stream_bindings(&mesh(2)).unwrap();
        assert_eq!(pos.range(), 0..48);
        assert_eq!(normal.range(), 48..84);
        assert_eq!(uv.range(), 84..108);
        assert_eq!(pos.format(), wgpu::VertexFormat::Float32x4);
        assert_eq!(normal.stride(), 12);
        assert_eq!(uv.format(), wgpu::VertexFormat::Float32x2);
        assert_eq!(uv.location, 2);
    }

    #[test]
    fn too_few_attributes_is_an_error() {
        let bytes = SbmBuilder::new("p")
            .attribute("position", 3, vec![0.0; 9])
            .to_bytes()
            .unwrap();
        let mesh = SbmObject::from_bytes(bytes).unwrap();
        assert!(stream_bindings(&mesh).is_err());
        assert!(stream_bindings(&SbmObject::new()).is_err());
    }

    #[test]
    fn wide_attribute_is_rejected() {
        assert!(stream_bindings(&mesh(5)).is_err());
    }

    #[test]
    fn draw_range_uses_frame_zero() {
        let m = mesh(2);
        assert_eq!(draw_range(&m, DEFAULT_FRAME), 1..3);
        assert!(draw_range(&m, 9).is_empty());
    }

    #[test]
    fn uniforms_keep_target_inside_depth_range() {
        let camera = OrbitCamera::default();
        let viewport = Viewport::new(640, 480).unwrap();
        let u = FrameUniforms::new(&camera, &viewport);
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 80);

        let mvp = Mat4::from_cols(
            Vec4::new(u.mvp[0][0], u.mvp[0][1], u.mvp[0][2], u.mvp[0][3]),
            Vec4::new(u.mvp[1][0], u.mvp[1][1], u.mvp[1][2], u.mvp[1][3]),
            Vec4::new(u.mvp[2][0], u.mvp[2][1], u.mvp[2][2], u.mvp[2][3]),
            Vec4::new(u.mvp[3][0], u.mvp[3][1], u.mvp[3][2], u.mvp[3][3]),
        );
        let t = camera.target;
        let clip = mvp * Vec4::new(t.x, t.y, t.z, 1.0);
        let depth = clip.z / clip.w;
        assert!((0.0..=1.0).contains(&depth), "depth {depth}");
        assert!((clip.x / clip.w).abs() < 1e-4);
        assert_eq!(u.light, camera.light_dir().to_array());
    }

    #[test]
    fn near_plane_maps_to_zero_depth() {
        let proj = OPENGL_TO_WGPU * Mat4::perspective(60.0, 4.0 / 3.0, 1.0, 1000.0);
        let clip = proj * Vec4::new(0.0, 0.0, -1.0, 1.0);
        assert!((clip.z / clip.w).abs() < 1e-4);

        let reference = glam::Mat4::perspective_rh(60f32.to_radians(), 4.0 / 3.0, 1.0, 1000.0);
        for (a, b) in proj.to_cols_array().iter().zip(reference.to_cols_array()) {
            assert!((a - b).abs() < 1e-4, "{a} vs {b}");
        }
    }
}
