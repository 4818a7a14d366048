//! On-disk SBM records and their little-endian byte layout.
//!
//! ```text
//! header      92 bytes  magic, size, name[64], attribs, frames, vertices, indices, index_type
//! attribute   76 bytes  name[64], type, components, flags       (x attribs)
//! frame       12 bytes  first, count, flags                     (x frames)
//! streams               components * 4 * vertices bytes each, descriptor order
//! indices               indices * sizeof(index_type), optional
//! ```

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// `"SB6M"` read as a little-endian u32.
pub const SBM_MAGIC: u32 = u32::from_le_bytes(*b"SB6M");

pub const NAME_LEN: usize = 64;
pub const HEADER_SIZE: usize = 4 + 4 + NAME_LEN + 5 * 4;
pub const ATTRIBUTE_SIZE: usize = NAME_LEN + 3 * 4;
pub const FRAME_SIZE: usize = 3 * 4;

/// Bytes per stream component; streams are always 32-bit floats.
pub const COMPONENT_SIZE: usize = 4;

/// GL enum tag for 32-bit float attribute data.
pub const GL_FLOAT: u32 = 0x1406;

/// Element type of the optional index block, tagged with GL enums.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexType {
    U8,
    U16,
    U32,
}

impl IndexType {
    pub const fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0x1401 => Some(Self::U8),
            0x1403 => Some(Self::U16),
            0x1405 => Some(Self::U32),
            _ => None,
        }
    }

    pub const fn tag(self) -> u32 {
        match self {
            Self::U8 => 0x1401,
            Self::U16 => 0x1403,
            Self::U32 => 0x1405,
        }
    }

    pub const fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SbmHeader {
    pub magic: u32,
    /// Declared size as written by the exporter. A buffer shorter than this
    /// is reported as a short read.
    pub size: u32,
    pub name: String,
    pub num_attribs: u32,
    pub num_frames: u32,
    pub num_vertices: u32,
    pub num_indices: u32,
    pub index_type: u32,
}

impl SbmHeader {
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            magic: r.read_u32::<LittleEndian>()?,
            size: r.read_u32::<LittleEndian>()?,
            name: read_name(r)?,
            num_attribs: r.read_u32::<LittleEndian>()?,
            num_frames: r.read_u32::<LittleEndian>()?,
            num_vertices: r.read_u32::<LittleEndian>()?,
            num_indices: r.read_u32::<LittleEndian>()?,
            index_type: r.read_u32::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<LittleEndian>(self.magic)?;
        w.write_u32::<LittleEndian>(self.size)?;
        write_name(w, &self.name)?;
        w.write_u32::<LittleEndian>(self.num_attribs)?;
        w.write_u32::<LittleEndian>(self.num_frames)?;
        w.write_u32::<LittleEndian>(self.num_vertices)?;
        w.write_u32::<LittleEndian>(self.num_indices)?;
        w.write_u32::<LittleEndian>(self.index_type)
    }
}

/// One vertex attribute stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeDescriptor {
    pub name: String,
    pub type_tag: u32,
    pub components: u32,
    pub flags: u32,
}

impl AttributeDescriptor {
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            name: read_name(r)?,
            type_tag: r.read_u32::<LittleEndian>()?,
            components: r.read_u32::<LittleEndian>()?,
            flags: r.read_u32::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_name(w, &self.name)?;
        w.write_u32::<LittleEndian>(self.type_tag)?;
        w.write_u32::<LittleEndian>(self.components)?;
        w.write_u32::<LittleEndian>(self.flags)
    }

    /// Bytes this attribute's stream occupies for `vertices` vertices.
    pub fn stream_len(&self, vertices: u32) -> Option<u64> {
        u64::from(self.components)
            .checked_mul(COMPONENT_SIZE as u64)?
            .checked_mul(u64::from(vertices))
    }
}

/// Vertex sub-range for one keyframe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameDescriptor {
    pub first: u32,
    pub count: u32,
    pub flags: u32,
}

impl FrameDescriptor {
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            first: r.read_u32::<LittleEndian>()?,
            count: r.read_u32::<LittleEndian>()?,
            flags: r.read_u32::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<LittleEndian>(self.first)?;
        w.write_u32::<LittleEndian>(self.count)?;
        w.write_u32::<LittleEndian>(self.flags)
    }

    /// One past the last vertex, widened so it cannot overflow.
    #[inline]
    pub fn end(&self) -> u64 {
        u64::from(self.first) + u64::from(self.count)
    }
}

/// Name fields are NUL-padded but not guaranteed NUL-terminated.
fn read_name<R: Read>(r: &mut R) -> io::Result<String> {
    let mut raw = [0u8; NAME_LEN];
    r.read_exact(&mut raw)?;
    let end = raw.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
    Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
}

/// Writes at most `NAME_LEN - 1` bytes so a terminator is always present.
fn write_name<W: Write>(w: &mut W, name: &str) -> io::Result<()> {
    let mut end = name.len().min(NAME_LEN - 1);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    let mut raw = [0u8; NAME_LEN];
    raw[..end].copy_from_slice(&name.as_bytes()[..end]);
    w.write_all(&raw)
}
