use std::{
    io::{self, Write},
    path::Path,
};

use byteorder::{LittleEndian, WriteBytesExt};

use super::format::{
    ATTRIBUTE_SIZE, AttributeDescriptor, FRAME_SIZE, FrameDescriptor, GL_FLOAT, HEADER_SIZE,
    IndexType, SBM_MAGIC, SbmHeader,
};

/// One float attribute stream to be written.
#[derive(Clone, Debug, PartialEq)]
pub struct SbmAttribute {
    pub name: String,
    pub components: u32,
    pub data: Vec<f32>,
}

#[derive(Clone, Debug, PartialEq)]
enum Indices {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Indices {
    fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
        }
    }

    fn index_type(&self) -> IndexType {
        match self {
            Self::U8(_) => IndexType::U8,
            Self::U16(_) => IndexType::U16,
            Self::U32(_) => IndexType::U32,
        }
    }
}

/// Writes SBM images.
///
/// The vertex count is taken from the first attribute
/// (`data.len() / components`); every stream must agree with it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SbmBuilder {
    name: String,
    attributes: Vec<SbmAttribute>,
    frames: Vec<FrameDescriptor>,
    indices: Option<Indices>,
}

impl SbmBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attribute(mut self, name: impl Into<String>, components: u32, data: Vec<f32>) -> Self {
        self.attributes.push(SbmAttribute {
            name: name.into(),
            components,
            data,
        });
        self
    }

    pub fn frame(mut self, first: u32, count: u32) -> Self {
        self.frames.push(FrameDescriptor {
            first,
            count,
            flags: 0,
        });
        self
    }

    pub fn indices_u8(mut self, indices: Vec<u8>) -> Self {
        self.indices = Some(Indices::U8(indices));
        self
    }

    pub fn indices_u16(mut self, indices: Vec<u16>) -> Self {
        self.indices = Some(Indices::U16(indices));
        self
    }

    pub fn indices_u32(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(Indices::U32(indices));
        self
    }

    pub fn vertex_count(&self) -> u32 {
        self.attributes
            .first()
            .filter(|a| a.components > 0)
            .map_or(0, |a| (a.data.len() / a.components as usize) as u32)
    }

    /// Serialize into `w`. Fails with `InvalidInput` when a stream's length
    /// disagrees with the vertex count.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let num_vertices = self.vertex_count();
        for attr in &self.attributes {
            let expected = attr.components as usize * num_vertices as usize;
            if attr.data.len() != expected {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "attribute {:?} has {} floats, expected {}",
                        attr.name,
                        attr.data.len(),
                        expected
                    ),
                ));
            }
        }

        let (num_indices, index_type) = match &self.indices {
            Some(ix) => (ix.len() as u32, ix.index_type().tag()),
            None => (0, 0),
        };
        let header = SbmHeader {
            magic: SBM_MAGIC,
            size: self.encoded_len() as u32,
            name: self.name.clone(),
            num_attribs: self.attributes.len() as u32,
            num_frames: self.frames.len() as u32,
            num_vertices,
            num_indices,
            index_type,
        };
        header.write_to(w)?;

        for attr in &self.attributes {
            AttributeDescriptor {
                name: attr.name.clone(),
                type_tag: GL_FLOAT,
                components: attr.components,
                flags: 0,
            }
            .write_to(w)?;
        }
        for frame in &self.frames {
            frame.write_to(w)?;
        }
        for attr in &self.attributes {
            for &v in &attr.data {
                w.write_f32::<LittleEndian>(v)?;
            }
        }
        match &self.indices {
            Some(Indices::U8(v)) => w.write_all(v)?,
            Some(Indices::U16(v)) => {
                for &i in v {
                    w.write_u16::<LittleEndian>(i)?;
                }
            }
            Some(Indices::U32(v)) => {
                for &i in v {
                    w.write_u32::<LittleEndian>(i)?;
                }
            }
            None => {}
        }
        Ok(())
    }

    /// Serialize into a fresh buffer.
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut out)?;
        Ok(out)
    }

    pub fn write_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        std::fs::write(path, self.to_bytes()?)
    }

    fn encoded_len(&self) -> usize {
        let streams: usize = self.attributes.iter().map(|a| a.data.len() * 4).sum();
        let indices = self
            .indices
            .as_ref()
            .map_or(0, |ix| ix.len() * ix.index_type().size());
        HEADER_SIZE
            + self.attributes.len() * ATTRIBUTE_SIZE
            + self.frames.len() * FRAME_SIZE
            + streams
            + indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_len_matches_output() {
        let b = SbmBuilder::new("quad")
            .attribute("position", 3, vec![0.0; 12])
            .attribute("texcoord0", 2, vec![0.0; 8])
            .frame(0, 4)
            .indices_u8(vec![0, 1, 2, 0, 2, 3]);
        let bytes = b.to_bytes().unwrap();
        assert_eq!(bytes.len(), b.encoded_len());
        assert_eq!(b.vertex_count(), 4);
        // Declared size carries the image length.
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), bytes.len() as u32);
    }

    #[test]
    fn mismatched_stream_is_invalid_input() {
        let b = SbmBuilder::new("bad")
            .attribute("position", 3, vec![0.0; 9])
            .attribute("normal", 3, vec![0.0; 6]);
        let err = b.write_to(&mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
