//! Skeletal pose evaluation.
//!
//! Blends two animation frames into world bone matrices ready for GPU
//! skinning. The per-instance cache lets the evaluator skip matrix work for
//! bones whose blended pose did not change since the previous call.

use glam::{Mat4, Vec4};
use hashbrown::HashMap;

use crate::model::IqmModel;
use crate::types::Trs;

/// Fixed Y/Z axis swap between the model's and the engine's coordinate
/// conventions; applied when descending into a child and once more at the
/// end of the whole composition.
const SWAP_YZ: Mat4 = Mat4::from_cols(Vec4::X, Vec4::Z, Vec4::Y, Vec4::W);

/// Last-evaluated state for one instance of a model: per-joint blended TRS
/// and world matrix.
#[derive(Debug, Clone, Default)]
struct InstanceCache {
    trs: Vec<Trs>,
    matrices: Vec<Mat4>,
}

/// Externally owned bone-evaluation cache, keyed by an opaque instance
/// index. The cache owns and grows the per-joint records; the evaluator only
/// reads and updates them. Callers must not evaluate the same instance key
/// concurrently; different keys against the same model are safe, since the
/// model tables are read-only after load.
#[derive(Debug, Clone, Default)]
pub struct BoneComponents {
    instances: HashMap<usize, InstanceCache>,
    recomputed: usize,
}

impl BoneComponents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bones whose world matrix was rebuilt during the most recent
    /// `calculate_bones` call against this cache. Zero means every bone was
    /// served from the cache.
    pub fn recomputed_last_call(&self) -> usize {
        self.recomputed
    }
}

impl IqmModel {
    /// Blend frames `frame1` and `frame2` by `inter` and produce one world
    /// bone matrix per joint, in joint index order.
    ///
    /// Frame indices are clamped to the available range, so out-of-range
    /// values from the caller degrade instead of faulting. `animation`
    /// optionally substitutes another model's frame samples for this
    /// skeleton. Calling twice with identical arguments and an untouched
    /// cache returns bit-identical matrices and recomputes nothing.
    pub fn calculate_bones(
        &self,
        frame1: i32,
        frame2: i32,
        inter: f32,
        animation: Option<&[Trs]>,
        components: &mut BoneComponents,
        instance: usize,
    ) -> Vec<Mat4> {
        let samples = animation.unwrap_or(&self.frame_samples);
        let num_bones = self.joints.len();
        components.recomputed = 0;
        if num_bones == 0 || samples.len() < num_bones {
            return Vec::new();
        }

        let cache = components.instances.entry(instance).or_default();
        if cache.trs.len() != num_bones {
            cache.trs.resize(num_bones, Trs::IDENTITY);
            cache.matrices.resize(num_bones, Mat4::IDENTITY);
        }

        // Whole frames only: a ragged sample slice contributes its complete
        // frames and the trailing partial frame is unreachable.
        let max_frame = (samples.len() / num_bones - 1) as i32;
        let offset1 = frame1.clamp(0, max_frame) as usize * num_bones;
        let offset2 = frame2.clamp(0, max_frame) as usize * num_bones;
        let t = inter;
        let invt = 1.0 - t;
        let swap = SWAP_YZ;

        let mut bones = vec![Mat4::IDENTITY; num_bones];
        let mut modified = vec![false; num_bones];
        let mut recomputed = 0;

        for i in 0..num_bones {
            let from = samples[offset1 + i];
            let to = samples[offset2 + i];

            // Shortest-path linear quaternion blend: negate the accumulator
            // when the two contributions point into opposite hemispheres.
            let mut rotation = from.rotation * invt;
            let to_rotation = to.rotation * t;
            if rotation.dot(to_rotation) < 0.0 {
                rotation = -rotation;
            }
            let bone = Trs {
                translation: from.translation * invt + to.translation * t,
                rotation: (rotation + to_rotation).normalize(),
                scale: from.scale * invt + to.scale * t,
            };

            let parent = self.joints[i].parent;
            let parent_modified = parent >= 0 && modified[parent as usize];
            if !parent_modified && cache.trs[i] == bone {
                bones[i] = cache.matrices[i];
                continue;
            }
            cache.trs[i] = bone;
            modified[i] = true;
            recomputed += 1;

            let local =
                Mat4::from_scale_rotation_translation(bone.scale, bone.rotation, bone.translation);
            let world = (if parent >= 0 {
                let p = parent as usize;
                bones[p] * swap * self.base_frame[p] * local * self.inverse_base_frame[i]
            } else {
                swap * local * self.inverse_base_frame[i]
            }) * swap;
            bones[i] = world;
            cache.matrices[i] = world;
        }

        components.recomputed = recomputed;
        bones
    }
}
