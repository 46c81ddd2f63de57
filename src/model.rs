//! IQM model loading and the bind-pose basis.
//!
//! `IqmModel::load` is single-threaded, synchronous and all-or-nothing: it
//! either returns a fully validated model or an error, never a partial one.
//! All tables are immutable after load; the only lazily built data is the
//! geometry staging buffer (see `geometry`).

use glam::Mat4;
use tracing::debug;

use crate::error::IqmError;
use crate::frames::decode_frame_samples;
use crate::header::{
    ANIM_SIZE, BOUNDS_SIZE, IqmHeader, JOINT_SIZE, MESH_SIZE, POSE_SIZE, VERTEX_ARRAY_SIZE,
};
use crate::reader::Reader;
use crate::types::{Adjacency, Anim, Bounds, Joint, Mesh, PoseChannels, Triangle, Trs, VertexArray};

/// A loaded IQM model: meshes, skeleton, animation clips and decoded frame
/// samples, plus the per-joint bind-pose basis matrices.
#[derive(Debug, Clone)]
pub struct IqmModel {
    pub meshes: Vec<Mesh>,
    pub triangles: Vec<Triangle>,
    pub adjacency: Vec<Adjacency>,
    pub joints: Vec<Joint>,
    pub poses: Vec<PoseChannels>,
    pub anims: Vec<Anim>,
    pub bounds: Vec<Bounds>,
    pub vertex_arrays: Vec<VertexArray>,
    pub num_vertices: u32,

    /// World-space bind matrix per joint, composed through the parent chain.
    pub(crate) base_frame: Vec<Mat4>,
    /// Inverse of the world-space bind matrix per joint.
    pub(crate) inverse_base_frame: Vec<Mat4>,
    /// Flat frame samples, `frame * num_joints + joint`. At least one frame.
    pub(crate) frame_samples: Vec<Trs>,
}

impl IqmModel {
    /// Parse and validate an IQM buffer. Construction order matters only
    /// where one table validates another (joints before poses before
    /// frames), but every table is populated before any animation math runs.
    pub fn load(data: &[u8]) -> Result<Self, IqmError> {
        let header = IqmHeader::parse(data)?;
        header.validate_tables(data.len())?;

        let text = &data[header.text_range()];

        let mut meshes = Vec::with_capacity(header.num_meshes as usize);
        for i in 0..header.num_meshes {
            let mut r = Reader::at(
                data,
                header.ofs_meshes as usize + i as usize * MESH_SIZE,
            );
            meshes.push(Mesh::decode(&mut r, text)?);
        }

        // Triangle and adjacency layouts are bit-identical between wire and
        // memory; the count is shared, only the offsets differ.
        let triangles = read_index_triples(data, header.ofs_triangles, header.num_triangles)?
            .into_iter()
            .map(Triangle)
            .collect();
        let adjacency: Vec<Adjacency> =
            read_index_triples(data, header.ofs_adjacency, header.num_triangles)?
                .into_iter()
                .map(Adjacency)
                .collect();

        let mut joints = Vec::with_capacity(header.num_joints as usize);
        for i in 0..header.num_joints {
            let mut r = Reader::at(
                data,
                header.ofs_joints as usize + i as usize * JOINT_SIZE,
            );
            let joint = Joint::decode(&mut r, text)?;
            check_parent(i, joint.parent)?;
            joints.push(joint);
        }

        let mut poses = Vec::with_capacity(header.num_poses as usize);
        for i in 0..header.num_poses {
            let mut r = Reader::at(data, header.ofs_poses as usize + i as usize * POSE_SIZE);
            let pose = PoseChannels::decode(&mut r)?;
            check_parent(i, pose.parent)?;
            poses.push(pose);
        }

        // Frame samples are indexed frame * num_joints + joint, so an
        // animated model needs exactly one pose descriptor per joint.
        if header.num_frames > 0 && header.num_poses != header.num_joints {
            return Err(IqmError::PoseJointMismatch {
                poses: header.num_poses,
                joints: header.num_joints,
            });
        }

        let mut anims = Vec::with_capacity(header.num_anims as usize);
        for i in 0..header.num_anims {
            let mut r = Reader::at(data, header.ofs_anims as usize + i as usize * ANIM_SIZE);
            anims.push(Anim::decode(&mut r, text)?);
        }

        let mut bounds = Vec::with_capacity(header.num_frames as usize);
        for i in 0..header.num_frames {
            let mut r = Reader::at(data, header.ofs_bounds as usize + i as usize * BOUNDS_SIZE);
            bounds.push(Bounds::decode(&mut r)?);
        }

        let mut vertex_arrays = Vec::with_capacity(header.num_vertexarrays as usize);
        for i in 0..header.num_vertexarrays {
            let mut r = Reader::at(
                data,
                header.ofs_vertexarrays as usize + i as usize * VERTEX_ARRAY_SIZE,
            );
            vertex_arrays.push(VertexArray::decode(&mut r)?);
        }

        let (base_frame, inverse_base_frame) = build_bind_pose(&joints);
        let frame_samples = decode_frame_samples(data, &header, &poses, &joints)?;

        debug!(
            meshes = meshes.len(),
            joints = joints.len(),
            anims = anims.len(),
            frames = header.num_frames,
            vertices = header.num_vertices,
            "loaded IQM model"
        );

        Ok(Self {
            meshes,
            triangles,
            adjacency,
            joints,
            poses,
            anims,
            bounds,
            vertex_arrays,
            num_vertices: header.num_vertices,
            base_frame,
            inverse_base_frame,
            frame_samples,
        })
    }

    /// The flat frame-sample array, `frame * num_joints + joint`. Exposed so
    /// one model's animation data can drive another model's skeleton.
    pub fn frame_samples(&self) -> &[Trs] {
        &self.frame_samples
    }

    /// Look up a frame index by animation name, case-insensitive. A trailing
    /// `:offset` selects a frame within the clip; an offset at or past the
    /// clip length is not found. Without an offset the clip's first frame is
    /// returned.
    pub fn find_frame(&self, name: &str) -> Option<u32> {
        let (stem, offset) = match name.rsplit_once(':') {
            Some((stem, ofs)) => (stem, Some(ofs)),
            None => (name, None),
        };
        for anim in &self.anims {
            if anim.name.eq_ignore_ascii_case(stem) {
                let Some(ofs) = offset else {
                    return Some(anim.first_frame);
                };
                let ofs: u32 = ofs.parse().ok()?;
                if ofs >= anim.num_frames {
                    return None;
                }
                return Some(anim.first_frame + ofs);
            }
        }
        None
    }
}

fn check_parent(index: u32, parent: i32) -> Result<(), IqmError> {
    // parent-before-child order, proven rather than assumed: a non-negative
    // parent must be strictly earlier, which also rules out cycles
    if parent >= 0 && parent as u32 >= index {
        return Err(IqmError::InvalidParent {
            joint: index,
            parent,
        });
    }
    Ok(())
}

fn read_index_triples(data: &[u8], offset: u32, count: u32) -> Result<Vec<[u32; 3]>, IqmError> {
    let mut r = Reader::at(data, offset as usize);
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        out.push(r.read_u32_array::<3>()?);
    }
    Ok(out)
}

/// Build the per-joint bind matrices and their inverses in one forward pass.
/// Local transform is translate * rotate * scale; a child's world bind is its
/// parent's world bind times the local, and the inverse composes the other
/// way around. Never recomputed after load.
fn build_bind_pose(joints: &[Joint]) -> (Vec<Mat4>, Vec<Mat4>) {
    let mut base = Vec::with_capacity(joints.len());
    let mut inverse = Vec::with_capacity(joints.len());
    for joint in joints {
        let local = Mat4::from_scale_rotation_translation(
            joint.scale,
            joint.rotation,
            joint.translate,
        );
        let inv_local = local.inverse();
        if joint.parent >= 0 {
            let p = joint.parent as usize;
            base.push(base[p] * local);
            inverse.push(inv_local * inverse[p]);
        } else {
            base.push(local);
            inverse.push(inv_local);
        }
    }
    (base, inverse)
}
