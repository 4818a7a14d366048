//! SBM mesh container: a header, attribute and frame descriptor tables, then
//! stream-major vertex data (and optional indices) in one file image.
//!
//! [`SbmObject`] owns the file bytes. Descriptor records are decoded into
//! owned values; vertex and index data are handed out as slices of the
//! owned buffer, checked against the file size before they are exposed.

mod builder;
mod error;
mod format;

use std::{fs::File, io::Read, path::Path};

pub use builder::{SbmAttribute, SbmBuilder};
pub use error::{Result, SbmError, SbmErrorKind};
pub use format::{
    ATTRIBUTE_SIZE, AttributeDescriptor, COMPONENT_SIZE, FRAME_SIZE, FrameDescriptor, GL_FLOAT,
    HEADER_SIZE, IndexType, NAME_LEN, SBM_MAGIC, SbmHeader,
};

use crate::mesh::VertexStream;

/// Validated contents of one SBM file.
#[derive(Debug)]
struct LoadedSbm {
    header: SbmHeader,
    attributes: Vec<AttributeDescriptor>,
    frames: Vec<FrameDescriptor>,
    /// The whole file image.
    buffer: Vec<u8>,
    /// Offset of the first vertex stream in `buffer`.
    payload_start: usize,
    vertex_bytes: usize,
    /// Per-attribute offsets relative to `payload_start`.
    stream_offsets: Vec<usize>,
    index_bytes: usize,
}

/// A mesh loaded from an SBM file, or nothing.
///
/// Accessors never fail: out-of-range indices and the empty state yield
/// `0`, `None` or an empty slice.
#[derive(Debug, Default)]
pub struct SbmObject {
    data: Option<LoadedSbm>,
}

impl SbmObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a new object from `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut obj = Self::new();
        obj.load_from_file(path)?;
        Ok(obj)
    }

    /// Parse an in-memory file image.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let mut obj = Self::new();
        obj.load_from_bytes(bytes)?;
        Ok(obj)
    }

    /// Replace the contents with the mesh stored at `path`.
    /// On error the object is left empty.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.release();
        let path = path.as_ref();
        let buffer = read_whole_file(path)?;
        log::debug!("Read {} bytes from {:?}", buffer.len(), path);
        self.load_from_bytes(buffer)?;
        log::info!(
            "Loaded SBM {:?} from {:?}: {} attributes, {} frames, {} vertices, {} indices",
            self.name().unwrap_or_default(),
            path,
            self.attribute_count(),
            self.frame_count(),
            self.vertex_count(),
            self.index_count(),
        );
        Ok(())
    }

    /// Replace the contents with the mesh in `bytes`.
    /// On error the object is left empty.
    pub fn load_from_bytes(&mut self, bytes: Vec<u8>) -> Result<()> {
        self.release();
        self.data = Some(parse(bytes)?);
        Ok(())
    }

    /// Drop all loaded data. Calling this on an empty object does nothing.
    pub fn release(&mut self) {
        if self.data.take().is_some() {
            log::debug!("Released SBM data");
        }
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    pub fn header(&self) -> Option<&SbmHeader> {
        self.data.as_ref().map(|d| &d.header)
    }

    pub fn name(&self) -> Option<&str> {
        self.header().map(|h| h.name.as_str())
    }

    pub fn attribute_count(&self) -> u32 {
        self.header().map_or(0, |h| h.num_attribs)
    }

    pub fn attribute(&self, index: u32) -> Option<&AttributeDescriptor> {
        self.data.as_ref()?.attributes.get(index as usize)
    }

    pub fn attribute_name(&self, index: u32) -> Option<&str> {
        self.attribute(index).map(|a| a.name.as_str())
    }

    pub fn attribute_components(&self, index: u32) -> u32 {
        self.attribute(index).map_or(0, |a| a.components)
    }

    /// Position of the first attribute called `name`.
    pub fn attribute_index(&self, name: &str) -> Option<u32> {
        let data = self.data.as_ref()?;
        data.attributes
            .iter()
            .position(|a| a.name == name)
            .map(|i| i as u32)
    }

    /// All vertex streams, back to back in attribute order.
    pub fn vertex_payload(&self) -> &[u8] {
        match &self.data {
            Some(d) => &d.buffer[d.payload_start..d.payload_start + d.vertex_bytes],
            None => &[],
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.header().map_or(0, |h| h.num_vertices)
    }

    /// Byte offset of attribute `index`'s stream within [`Self::vertex_payload`]:
    /// the sum of `components * 4 * vertex_count` over the attributes before it.
    pub fn stream_offset(&self, index: u32) -> Option<usize> {
        self.data.as_ref()?.stream_offsets.get(index as usize).copied()
    }

    pub fn attribute_stream(&self, index: u32) -> Option<VertexStream<'_>> {
        let data = self.data.as_ref()?;
        let attr = data.attributes.get(index as usize)?;
        let offset = *data.stream_offsets.get(index as usize)?;
        // Lengths were validated at load time, so this cannot overflow.
        let len = attr.components as usize * COMPONENT_SIZE * data.header.num_vertices as usize;
        let payload = self.vertex_payload();
        Some(VertexStream {
            index,
            name: &attr.name,
            components: attr.components,
            offset,
            bytes: &payload[offset..offset + len],
        })
    }

    pub fn frame_count(&self) -> u32 {
        self.header().map_or(0, |h| h.num_frames)
    }

    pub fn frame(&self, frame: u32) -> Option<&FrameDescriptor> {
        self.data.as_ref()?.frames.get(frame as usize)
    }

    pub fn frame_first_vertex(&self, frame: u32) -> u32 {
        self.frame(frame).map_or(0, |f| f.first)
    }

    pub fn frame_vertex_count(&self, frame: u32) -> u32 {
        self.frame(frame).map_or(0, |f| f.count)
    }

    pub fn index_count(&self) -> u32 {
        self.header().map_or(0, |h| h.num_indices)
    }

    /// Index element type, if the file declares indices.
    pub fn index_type(&self) -> Option<IndexType> {
        let header = self.header()?;
        if header.num_indices == 0 {
            return None;
        }
        IndexType::from_tag(header.index_type)
    }

    /// Raw little-endian index block following the vertex streams.
    pub fn index_data(&self) -> Option<&[u8]> {
        let d = self.data.as_ref()?;
        if d.index_bytes == 0 {
            return None;
        }
        let start = d.payload_start + d.vertex_bytes;
        Some(&d.buffer[start..start + d.index_bytes])
    }
}

fn read_whole_file(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let expected = file.metadata()?.len();
    let mut buffer = Vec::with_capacity(expected as usize);
    let actual = file.read_to_end(&mut buffer)? as u64;
    if actual != expected {
        return Err(SbmError::ShortRead { expected, actual });
    }
    Ok(buffer)
}

fn require(section: &'static str, needed: u64, available: u64) -> Result<()> {
    if needed > available {
        return Err(SbmError::Truncated {
            section,
            needed,
            available,
        });
    }
    Ok(())
}

/// Validate every region against the buffer length before decoding it.
fn parse(buffer: Vec<u8>) -> Result<LoadedSbm> {
    let total = buffer.len() as u64;
    require("header", HEADER_SIZE as u64, total)?;

    let mut cursor: &[u8] = &buffer;
    let header = SbmHeader::read_from(&mut cursor)?;
    if header.magic != SBM_MAGIC {
        return Err(SbmError::BadMagic {
            found: header.magic,
            expected: SBM_MAGIC,
        });
    }
    // A file shorter than its declared size was cut off in transit.
    if u64::from(header.size) > total {
        return Err(SbmError::ShortRead {
            expected: u64::from(header.size),
            actual: total,
        });
    }

    // u32 counts times small record sizes cannot overflow u64.
    let descriptors_end = HEADER_SIZE as u64
        + u64::from(header.num_attribs) * ATTRIBUTE_SIZE as u64
        + u64::from(header.num_frames) * FRAME_SIZE as u64;
    require("descriptor tables", descriptors_end, total)?;

    let attributes = (0..header.num_attribs)
        .map(|_| AttributeDescriptor::read_from(&mut cursor))
        .collect::<std::io::Result<Vec<_>>>()?;
    let frames = (0..header.num_frames)
        .map(|_| FrameDescriptor::read_from(&mut cursor))
        .collect::<std::io::Result<Vec<_>>>()?;

    let available = total - descriptors_end;
    let mut offsets = Vec::with_capacity(attributes.len());
    let mut vertex_bytes = 0u64;
    for attr in &attributes {
        offsets.push(vertex_bytes);
        vertex_bytes = attr
            .stream_len(header.num_vertices)
            .and_then(|len| vertex_bytes.checked_add(len))
            .unwrap_or(u64::MAX);
    }
    require("vertex streams", vertex_bytes, available)?;

    for (i, frame) in frames.iter().enumerate() {
        if frame.end() > u64::from(header.num_vertices) {
            return Err(SbmError::FrameOutOfRange {
                frame: i as u32,
                first: frame.first,
                end: frame.end(),
                vertices: header.num_vertices,
            });
        }
    }

    let mut index_bytes = 0u64;
    if header.num_indices > 0 {
        let ty = IndexType::from_tag(header.index_type)
            .ok_or(SbmError::UnknownIndexType(header.index_type))?;
        index_bytes = u64::from(header.num_indices) * ty.size() as u64;
        require("index data", index_bytes, available - vertex_bytes)?;
    }

    log::debug!(
        "SBM layout: descriptors end at {}, {} vertex bytes, {} index bytes, {} trailing",
        descriptors_end,
        vertex_bytes,
        index_bytes,
        available - vertex_bytes - index_bytes
    );

    // Everything below is bounded by `total`, so it fits in usize.
    Ok(LoadedSbm {
        header,
        attributes,
        frames,
        buffer,
        payload_start: descriptors_end as usize,
        vertex_bytes: vertex_bytes as usize,
        stream_offsets: offsets.into_iter().map(|o| o as usize).collect(),
        index_bytes: index_bytes as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> SbmBuilder {
        SbmBuilder::new("tri")
            .attribute(
                "position",
                4,
                vec![
                    0.0, 0.0, 0.0, 1.0, //
                    1.0, 0.0, 0.0, 1.0, //
                    0.0, 1.0, 0.0, 1.0,
                ],
            )
            .attribute("normal", 3, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0])
            .attribute("texcoord0", 2, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0])
            .frame(0, 3)
    }

    #[test]
    fn round_trip_reproduces_descriptors() {
        let bytes = triangle()
            .frame(1, 2)
            .indices_u32(vec![2, 1, 0, 0])
            .to_bytes()
            .unwrap();
        let len = bytes.len() as u32;
        let obj = SbmObject::from_bytes(bytes).unwrap();
        let header = obj.header().unwrap();
        assert_eq!(
            *header,
            SbmHeader {
                magic: SBM_MAGIC,
                size: len,
                name: "tri".to_string(),
                num_attribs: 3,
                num_frames: 2,
                num_vertices: 3,
                num_indices: 4,
                index_type: IndexType::U32.tag(),
            }
        );
        assert_eq!(obj.name(), Some("tri"));
        assert_eq!(obj.index_count(), 4);
        assert_eq!(obj.index_type(), Some(IndexType::U32));
        assert_eq!(obj.attribute_count(), 3);
        assert_eq!(obj.vertex_count(), 3);
        assert_eq!(obj.frame_count(), 2);

        let attrs: Vec<_> = (0..obj.attribute_count())
            .map(|i| (obj.attribute_name(i).unwrap(), obj.attribute_components(i)))
            .collect();
        assert_eq!(attrs, [("position", 4), ("normal", 3), ("texcoord0", 2)]);

        assert_eq!(obj.frame_first_vertex(0), 0);
        assert_eq!(obj.frame_vertex_count(0), 3);
        assert_eq!(obj.frame_first_vertex(1), 1);
        assert_eq!(obj.frame_vertex_count(1), 2);
    }

    #[test]
    fn stream_offsets_are_stream_major() {
        let obj = SbmObject::from_bytes(triangle().to_bytes().unwrap()).unwrap();
        assert_eq!(obj.stream_offset(0), Some(0));
        assert_eq!(obj.stream_offset(1), Some(4 * 4 * 3));
        assert_eq!(obj.stream_offset(2), Some((4 + 3) * 4 * 3));
        assert_eq!(obj.stream_offset(3), None);
        assert_eq!(obj.vertex_payload().len(), (4 + 3 + 2) * 4 * 3);

        let uv = obj.attribute_stream(2).unwrap();
        assert_eq!(uv.name, "texcoord0");
        assert_eq!(uv.to_f32_vec(), vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        assert_eq!(obj.attribute_index("normal"), Some(1));
        assert_eq!(obj.attribute_index("tangent"), None);
    }

    #[test]
    fn empty_object_returns_sentinels() {
        let obj = SbmObject::new();
        assert!(!obj.is_loaded());
        assert_eq!(obj.attribute_count(), 0);
        assert_eq!(obj.vertex_count(), 0);
        assert!(obj.vertex_payload().is_empty());
        for i in [0, 1, 7, u32::MAX] {
            assert_eq!(obj.attribute_name(i), None);
            assert_eq!(obj.attribute_components(i), 0);
            assert_eq!(obj.frame_first_vertex(i), 0);
            assert_eq!(obj.frame_vertex_count(i), 0);
            assert_eq!(obj.stream_offset(i), None);
            assert!(obj.attribute_stream(i).is_none());
        }
        assert!(obj.index_data().is_none());
    }

    #[test]
    fn out_of_range_indices_return_sentinels() {
        let obj = SbmObject::from_bytes(triangle().to_bytes().unwrap()).unwrap();
        for i in [3, 4, 100, u32::MAX] {
            assert_eq!(obj.attribute_name(i), None);
            assert_eq!(obj.attribute_components(i), 0);
        }
        for f in [1, 2, u32::MAX] {
            assert_eq!(obj.frame_first_vertex(f), 0);
            assert_eq!(obj.frame_vertex_count(f), 0);
        }
    }

    #[test]
    fn bad_magic_is_format_violation() {
        let mut bytes = triangle().to_bytes().unwrap();
        bytes[0..4].copy_from_slice(b"OBJ!");
        let err = SbmObject::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, SbmError::BadMagic { .. }));
        assert_eq!(err.kind(), SbmErrorKind::FormatViolation);
    }

    #[test]
    fn short_header_is_rejected() {
        let err = SbmObject::from_bytes(vec![0; HEADER_SIZE - 1]).unwrap_err();
        assert!(matches!(err, SbmError::Truncated { section: "header", .. }));
    }

    #[test]
    fn descriptor_counts_are_checked_before_reading() {
        let mut bytes = triangle().to_bytes().unwrap();
        // num_attribs lives right after magic, size and the name.
        bytes[72..76].copy_from_slice(&u32::MAX.to_le_bytes());
        let err = SbmObject::from_bytes(bytes).unwrap_err();
        assert!(matches!(
            err,
            SbmError::Truncated {
                section: "descriptor tables",
                ..
            }
        ));
    }

    #[test]
    fn truncated_payload_leaves_object_empty() {
        let mut obj = SbmObject::from_bytes(triangle().to_bytes().unwrap()).unwrap();
        let mut bytes = triangle().to_bytes().unwrap();
        let full = bytes.len() as u64;
        bytes.truncate(bytes.len() - 5);
        let err = obj.load_from_bytes(bytes).unwrap_err();
        assert_eq!(err.kind(), SbmErrorKind::IoFailure);
        match err {
            SbmError::ShortRead { expected, actual } => {
                assert_eq!((expected, actual), (full, full - 5));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!obj.is_loaded());
        assert!(obj.vertex_payload().is_empty());
        obj.release();
        obj.release();
        assert!(!obj.is_loaded());
    }

    #[test]
    fn undeclared_size_falls_back_to_stream_check() {
        let mut bytes = triangle().to_bytes().unwrap();
        // size sits right after magic.
        bytes[4..8].copy_from_slice(&(HEADER_SIZE as u32).to_le_bytes());
        bytes.truncate(bytes.len() - 5);
        let err = SbmObject::from_bytes(bytes).unwrap_err();
        assert_eq!(err.kind(), SbmErrorKind::FormatViolation);
        assert!(matches!(
            err,
            SbmError::Truncated {
                section: "vertex streams",
                ..
            }
        ));
    }

    #[test]
    fn inflated_vertex_count_is_rejected() {
        let mut bytes = triangle().to_bytes().unwrap();
        bytes[80..84].copy_from_slice(&1_000_000u32.to_le_bytes());
        let err = SbmObject::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, SbmError::Truncated { .. }));
    }

    #[test]
    fn frame_past_vertex_count_is_rejected() {
        let err = SbmObject::from_bytes(triangle().frame(2, 5).to_bytes().unwrap()).unwrap_err();
        match err {
            SbmError::FrameOutOfRange {
                frame,
                first,
                end,
                vertices,
            } => {
                assert_eq!((frame, first, end, vertices), (1, 2, 7, 3));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn indices_follow_vertex_streams() {
        let bytes = triangle().indices_u16(vec![0, 1, 2]).to_bytes().unwrap();
        let obj = SbmObject::from_bytes(bytes).unwrap();
        assert_eq!(obj.index_count(), 3);
        assert_eq!(obj.index_type(), Some(IndexType::U16));
        assert_eq!(obj.index_data(), Some(&[0u8, 0, 1, 0, 2, 0][..]));
    }

    #[test]
    fn unknown_index_type_is_rejected() {
        let mut bytes = triangle().indices_u16(vec![0, 1, 2]).to_bytes().unwrap();
        bytes[88..92].copy_from_slice(&GL_FLOAT.to_le_bytes());
        let err = SbmObject::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, SbmError::UnknownIndexType(GL_FLOAT)));
    }

    #[test]
    fn release_is_idempotent() {
        let mut obj = SbmObject::from_bytes(triangle().to_bytes().unwrap()).unwrap();
        assert!(obj.is_loaded());
        obj.release();
        assert!(!obj.is_loaded());
        assert_eq!(obj.attribute_count(), 0);
        obj.release();
        assert!(!obj.is_loaded());
    }
}
