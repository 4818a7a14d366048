//! Borrowed views over the vertex streams of a loaded mesh.

use crate::sbm::COMPONENT_SIZE;

/// One attribute's stream inside an SBM vertex payload.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexStream<'a> {
    /// Attribute index in descriptor order.
    pub index: u32,
    pub name: &'a str,
    pub components: u32,
    /// Byte offset of this stream within the vertex payload.
    pub offset: usize,
    /// Little-endian f32 data, `components` per vertex.
    pub bytes: &'a [u8],
}

impl VertexStream<'_> {
    /// Bytes between consecutive vertices.
    #[inline]
    pub fn stride(&self) -> usize {
        self.components as usize * COMPONENT_SIZE
    }

    /// Number of vertices in the stream.
    pub fn len(&self) -> usize {
        match self.stride() {
            0 => 0,
            stride => self.bytes.len() / stride,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode the whole stream.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.bytes
            .chunks_exact(COMPONENT_SIZE)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    /// Vertex `i` widened to four components the way GL fills missing
    /// attribute components: `(0, 0, 0, 1)`.
    pub fn vertex(&self, i: usize) -> Option<[f32; 4]> {
        if i >= self.len() {
            return None;
        }
        let stride = self.stride();
        let start = i.checked_mul(stride)?;
        let end = start.checked_add(stride)?;
        let raw = self.bytes.get(start..end)?;
        let mut out = [0.0, 0.0, 0.0, 1.0];
        for (dst, c) in out.iter_mut().zip(raw.chunks_exact(COMPONENT_SIZE)) {
            *dst = f32::from_le_bytes([c[0], c[1], c[2], c[3]]);
        }
        Some(out)
    }
}
