//! IQM fixed header (128 bytes).
//!
//! # Layout (all little-endian)
//! ```text
//! 0x00: magic1 u64           - "INTERQUA"
//! 0x08: magic2 u64           - "KEMODEL\0"
//! 0x10: version u32          - must be 2
//! 0x14: filesize u32
//! 0x18: flags u32
//! 0x1C: num_text, ofs_text
//! 0x24: num_meshes, ofs_meshes
//! 0x2C: num_vertexarrays, num_vertices, ofs_vertexarrays
//! 0x38: num_triangles, ofs_triangles, ofs_adjacency
//! 0x44: num_joints, ofs_joints
//! 0x4C: num_poses, ofs_poses
//! 0x54: num_anims, ofs_anims
//! 0x5C: num_frames, num_framechannels, ofs_frames, ofs_bounds
//! 0x6C: num_comment, ofs_comment
//! 0x74: num_extensions, ofs_extensions
//! ```
//! The adjacency table shares `num_triangles`; bounds carry one record per
//! frame. Comments and extensions are never read by this crate.

use crate::error::IqmError;
use crate::reader::{Reader, check_table};

const MAGIC1: u64 = u64::from_le_bytes(*b"INTERQUA");
const MAGIC2: u64 = u64::from_le_bytes(*b"KEMODEL\0");

/// Supported IQM format version.
pub const IQM_VERSION: u32 = 2;

/// Wire sizes of the fixed-layout records, used for table range checks.
pub const MESH_SIZE: usize = 4 * 6;
pub const VERTEX_ARRAY_SIZE: usize = 4 * 5;
pub const TRIANGLE_SIZE: usize = 4 * 3;
pub const JOINT_SIZE: usize = 4 * 12;
pub const POSE_SIZE: usize = 4 * 22;
pub const ANIM_SIZE: usize = 4 * 5;
pub const BOUNDS_SIZE: usize = 4 * 8;

/// Decoded IQM header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IqmHeader {
    pub version: u32,
    pub filesize: u32,
    pub flags: u32,
    pub num_text: u32,
    pub ofs_text: u32,
    pub num_meshes: u32,
    pub ofs_meshes: u32,
    pub num_vertexarrays: u32,
    pub num_vertices: u32,
    pub ofs_vertexarrays: u32,
    pub num_triangles: u32,
    pub ofs_triangles: u32,
    pub ofs_adjacency: u32,
    pub num_joints: u32,
    pub ofs_joints: u32,
    pub num_poses: u32,
    pub ofs_poses: u32,
    pub num_anims: u32,
    pub ofs_anims: u32,
    pub num_frames: u32,
    pub num_framechannels: u32,
    pub ofs_frames: u32,
    pub ofs_bounds: u32,
    pub num_comment: u32,
    pub ofs_comment: u32,
    pub num_extensions: u32,
    pub ofs_extensions: u32,
}

impl IqmHeader {
    /// Header size in bytes (32 x 4-byte fields).
    pub const SIZE: usize = 128;

    /// Decode and validate the fixed header. Checks, in order: buffer length,
    /// both magics, version, and a non-empty text section.
    pub fn parse(data: &[u8]) -> Result<Self, IqmError> {
        if data.len() < Self::SIZE {
            return Err(IqmError::TooShort {
                len: data.len(),
                need: Self::SIZE,
            });
        }

        let mut r = Reader::at(data, 0);
        let magic1 = r.read_u64()?;
        let magic2 = r.read_u64()?;
        if magic1 != MAGIC1 || magic2 != MAGIC2 {
            return Err(IqmError::BadMagic);
        }

        let header = Self {
            version: r.read_u32()?,
            filesize: r.read_u32()?,
            flags: r.read_u32()?,
            num_text: r.read_u32()?,
            ofs_text: r.read_u32()?,
            num_meshes: r.read_u32()?,
            ofs_meshes: r.read_u32()?,
            num_vertexarrays: r.read_u32()?,
            num_vertices: r.read_u32()?,
            ofs_vertexarrays: r.read_u32()?,
            num_triangles: r.read_u32()?,
            ofs_triangles: r.read_u32()?,
            ofs_adjacency: r.read_u32()?,
            num_joints: r.read_u32()?,
            ofs_joints: r.read_u32()?,
            num_poses: r.read_u32()?,
            ofs_poses: r.read_u32()?,
            num_anims: r.read_u32()?,
            ofs_anims: r.read_u32()?,
            num_frames: r.read_u32()?,
            num_framechannels: r.read_u32()?,
            ofs_frames: r.read_u32()?,
            ofs_bounds: r.read_u32()?,
            num_comment: r.read_u32()?,
            ofs_comment: r.read_u32()?,
            num_extensions: r.read_u32()?,
            ofs_extensions: r.read_u32()?,
        };

        if header.version != IQM_VERSION {
            return Err(IqmError::BadVersion(header.version));
        }
        if header.num_text == 0 {
            return Err(IqmError::NoText);
        }

        Ok(header)
    }

    /// Range-check every table this crate reads against the buffer length.
    /// Runs before any table region is touched.
    pub fn validate_tables(&self, len: usize) -> Result<(), IqmError> {
        check_table(len, "text", self.ofs_text, self.num_text, 1)?;
        check_table(len, "meshes", self.ofs_meshes, self.num_meshes, MESH_SIZE)?;
        check_table(
            len,
            "vertexarrays",
            self.ofs_vertexarrays,
            self.num_vertexarrays,
            VERTEX_ARRAY_SIZE,
        )?;
        check_table(
            len,
            "triangles",
            self.ofs_triangles,
            self.num_triangles,
            TRIANGLE_SIZE,
        )?;
        check_table(
            len,
            "adjacency",
            self.ofs_adjacency,
            self.num_triangles,
            TRIANGLE_SIZE,
        )?;
        check_table(len, "joints", self.ofs_joints, self.num_joints, JOINT_SIZE)?;
        check_table(len, "poses", self.ofs_poses, self.num_poses, POSE_SIZE)?;
        check_table(len, "anims", self.ofs_anims, self.num_anims, ANIM_SIZE)?;
        check_table(len, "bounds", self.ofs_bounds, self.num_frames, BOUNDS_SIZE)?;
        // Frame data is a flat u16 stream, num_framechannels samples per frame
        let samples = (self.num_frames as usize)
            .checked_mul(self.num_framechannels as usize)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or(IqmError::TableOutOfRange {
                table: "frames",
                offset: self.ofs_frames,
                size: usize::MAX,
                len,
            })?;
        check_table(len, "frames", self.ofs_frames, samples, 2)?;
        Ok(())
    }

    /// Byte range of the text section, for string resolution.
    pub fn text_range(&self) -> std::ops::Range<usize> {
        self.ofs_text as usize..self.ofs_text as usize + self.num_text as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::IqmBuilder;

    #[test]
    fn test_header_size() {
        assert_eq!(IqmHeader::SIZE, 128);
    }

    #[test]
    fn test_parse_minimal() {
        let data = IqmBuilder::new().build();
        let h = IqmHeader::parse(&data).unwrap();
        assert_eq!(h.version, IQM_VERSION);
        assert!(h.num_text > 0);
        h.validate_tables(data.len()).unwrap();
    }

    #[test]
    fn test_parse_too_short() {
        let data = [0u8; 64];
        assert_eq!(
            IqmHeader::parse(&data),
            Err(IqmError::TooShort { len: 64, need: 128 })
        );
    }

    #[test]
    fn test_parse_bad_magic() {
        let mut data = IqmBuilder::new().build();
        data[0] ^= 0xFF;
        assert_eq!(IqmHeader::parse(&data), Err(IqmError::BadMagic));
    }

    #[test]
    fn test_parse_bad_version() {
        let mut data = IqmBuilder::new().build();
        data[16..20].copy_from_slice(&3u32.to_le_bytes());
        assert_eq!(IqmHeader::parse(&data), Err(IqmError::BadVersion(3)));
    }

    #[test]
    fn test_parse_empty_text() {
        let mut data = IqmBuilder::new().build();
        data[28..32].copy_from_slice(&0u32.to_le_bytes());
        assert_eq!(IqmHeader::parse(&data), Err(IqmError::NoText));
    }
}
