//! Inter-Quake Model (IQM) loader and skeletal pose evaluator.
//!
//! Parses the self-describing IQM binary layout (fixed header plus
//! offset/count tables pointing into the same buffer) into immutable scene
//! tables, builds the bind-pose basis, decodes the quantized per-frame pose
//! stream, and blends two frames into world bone matrices for GPU skinning.
//!
//! Every offset and count is validated against the buffer length before it
//! is read, so mod-author-controlled files fail cleanly with an [`IqmError`]
//! instead of faulting.
//!
//! # Modules
//!
//! - [`model`] - buffer -> validated scene tables + bind pose, at load
//! - [`animation`] - frame blending and the per-instance bone cache
//! - [`geometry`] - lazy vertex stream materialization for GPU upload
//!
//! ```no_run
//! use iqmesh::{BoneComponents, IqmModel};
//!
//! # fn run(bytes: &[u8]) -> Result<(), iqmesh::IqmError> {
//! let model = IqmModel::load(bytes)?;
//! let mut cache = BoneComponents::new();
//! let frame = model.find_frame("idle").unwrap_or(0) as i32;
//! let bones = model.calculate_bones(frame, frame + 1, 0.5, None, &mut cache, 0);
//! # Ok(())
//! # }
//! ```

pub mod animation;
pub mod error;
pub mod frames;
pub mod geometry;
pub mod header;
pub mod model;
pub mod reader;
pub mod types;

#[cfg(test)]
mod test_util;

pub use animation::BoneComponents;
pub use error::IqmError;
pub use geometry::ModelVertex;
pub use header::{IQM_VERSION, IqmHeader};
pub use model::IqmModel;
pub use types::{
    Adjacency, Anim, Bounds, Joint, Mesh, PoseChannels, Triangle, Trs, VertexArray,
    VertexArrayKind,
};
