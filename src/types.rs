//! In-memory scene tables decoded from the IQM buffer.
//!
//! Records with owned string data (meshes, joints, anims) are decoded field
//! by field; triangles and adjacency are fixed-layout copies of the wire
//! format. All tables are immutable after load.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::IqmError;
use crate::reader::{Reader, text_str};

/// One mesh: a vertex range and a triangle range plus material name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mesh {
    pub name: String,
    pub material: String,
    pub first_vertex: u32,
    pub num_vertices: u32,
    pub first_triangle: u32,
    pub num_triangles: u32,
}

impl Mesh {
    pub(crate) fn decode(r: &mut Reader, text: &[u8]) -> Result<Self, IqmError> {
        let name = text_str(text, r.read_u32()?)?;
        let material = text_str(text, r.read_u32()?)?;
        Ok(Self {
            name,
            material,
            first_vertex: r.read_u32()?,
            num_vertices: r.read_u32()?,
            first_triangle: r.read_u32()?,
            num_triangles: r.read_u32()?,
        })
    }
}

/// Three vertex indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle(pub [u32; 3]);

/// Three triangle indices; parallel array to [`Triangle`], same count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjacency(pub [u32; 3]);

/// One joint of the skeleton. `parent < 0` means root. Joint indices double
/// as bone indices throughout the crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Joint {
    pub name: String,
    pub parent: i32,
    pub translate: Vec3,
    /// Unit quaternion; renormalized on decode since files are not
    /// guaranteed to store it pre-normalized.
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Joint {
    pub(crate) fn decode(r: &mut Reader, text: &[u8]) -> Result<Self, IqmError> {
        let name = text_str(text, r.read_u32()?)?;
        let parent = r.read_i32()?;
        let t = r.read_f32_array::<3>()?;
        let q = r.read_f32_array::<4>()?;
        let s = r.read_f32_array::<3>()?;
        Ok(Self {
            name,
            parent,
            translate: Vec3::from_array(t),
            rotation: Quat::from_xyzw(q[0], q[1], q[2], q[3]).normalize(),
            scale: Vec3::from_array(s),
        })
    }
}

/// Per-joint channel decode descriptor, shared across all frames. Channels
/// 0..3 are translation, 3..7 rotation (x, y, z, w), 7..10 scale. A set bit
/// in `channel_mask` means the channel carries one quantized sample per
/// frame; a clear bit means the channel stays at its baseline offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseChannels {
    pub parent: i32,
    pub channel_mask: u32,
    pub channel_offset: [f32; 10],
    pub channel_scale: [f32; 10],
}

impl PoseChannels {
    pub(crate) fn decode(r: &mut Reader) -> Result<Self, IqmError> {
        Ok(Self {
            parent: r.read_i32()?,
            channel_mask: r.read_u32()?,
            channel_offset: r.read_f32_array::<10>()?,
            channel_scale: r.read_f32_array::<10>()?,
        })
    }

    /// Number of quantized samples this joint consumes per frame.
    pub fn samples_per_frame(&self) -> usize {
        (self.channel_mask & 0x3FF).count_ones() as usize
    }
}

/// Animation clip flag: bit 0 = loop.
const ANIM_LOOP: u32 = 1 << 0;

/// One animation clip, referencing a range of the flat frame-sample array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anim {
    pub name: String,
    pub first_frame: u32,
    pub num_frames: u32,
    pub framerate: f32,
    pub looping: bool,
}

impl Anim {
    pub(crate) fn decode(r: &mut Reader, text: &[u8]) -> Result<Self, IqmError> {
        let name = text_str(text, r.read_u32()?)?;
        let first_frame = r.read_u32()?;
        let num_frames = r.read_u32()?;
        let framerate = r.read_f32()?;
        let flags = r.read_u32()?;
        Ok(Self {
            name,
            first_frame,
            num_frames,
            framerate,
            looping: flags & ANIM_LOOP != 0,
        })
    }
}

/// Per-frame bounding volume.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bounds {
    pub mins: Vec3,
    pub maxs: Vec3,
    pub xy_radius: f32,
    pub radius: f32,
}

impl Bounds {
    pub(crate) fn decode(r: &mut Reader) -> Result<Self, IqmError> {
        let mins = r.read_f32_array::<3>()?;
        let maxs = r.read_f32_array::<3>()?;
        Ok(Self {
            mins: Vec3::from_array(mins),
            maxs: Vec3::from_array(maxs),
            xy_radius: r.read_f32()?,
            radius: r.read_f32()?,
        })
    }
}

/// Vertex array semantic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VertexArrayKind {
    Position,
    TexCoord,
    Normal,
    Tangent,
    BlendIndices,
    BlendWeights,
    Color,
    /// Custom or unrecognized semantic; the raw type code is preserved.
    Custom(u32),
}

impl VertexArrayKind {
    pub fn from_u32(v: u32) -> Self {
        match v {
            0 => Self::Position,
            1 => Self::TexCoord,
            2 => Self::Normal,
            3 => Self::Tangent,
            4 => Self::BlendIndices,
            5 => Self::BlendWeights,
            6 => Self::Color,
            other => Self::Custom(other),
        }
    }
}

/// Vertex array component format codes.
pub const FORMAT_BYTE: u32 = 0;
pub const FORMAT_UBYTE: u32 = 1;
pub const FORMAT_SHORT: u32 = 2;
pub const FORMAT_USHORT: u32 = 3;
pub const FORMAT_INT: u32 = 4;
pub const FORMAT_UINT: u32 = 5;
pub const FORMAT_HALF: u32 = 6;
pub const FORMAT_FLOAT: u32 = 7;
pub const FORMAT_DOUBLE: u32 = 8;

/// One vertex-array descriptor: where an attribute stream lives in the
/// buffer and how its components are encoded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VertexArray {
    pub kind: VertexArrayKind,
    pub flags: u32,
    /// Raw component format code (`FORMAT_*`).
    pub format: u32,
    /// Components per vertex.
    pub size: u32,
    /// Byte offset of the stream from the start of the buffer.
    pub offset: u32,
}

impl VertexArray {
    pub(crate) fn decode(r: &mut Reader) -> Result<Self, IqmError> {
        Ok(Self {
            kind: VertexArrayKind::from_u32(r.read_u32()?),
            flags: r.read_u32()?,
            format: r.read_u32()?,
            size: r.read_u32()?,
            offset: r.read_u32()?,
        })
    }
}

/// One decoded frame pose sample: a joint's pose in its parent's local
/// space. Stored flattened as `frame_index * num_joints + joint_index`.
/// `PartialEq` is bit-for-bit, which the evaluator relies on for change
/// detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trs {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Trs {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };
}
