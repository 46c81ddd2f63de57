//! Vertex stream materialization.
//!
//! Decodes the raw vertex arrays into the engine vertex format. Invoked only
//! when geometry is first needed; the returned staging vector is meant to be
//! dropped as soon as the renderer has copied it into GPU-resident storage,
//! so release happens on every exit path, including upload failure.

use bytemuck::{Pod, Zeroable};
use tracing::warn;

use crate::error::IqmError;
use crate::model::IqmModel;
use crate::reader::Reader;
use crate::types::{FORMAT_FLOAT, FORMAT_INT, FORMAT_UBYTE, VertexArray, VertexArrayKind};

/// Engine vertex format for skinned models. Bone weights are unorm8 (255 =
/// weight 1.0), matching the GPU-side layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
    pub bone_indices: [u8; 4],
    pub bone_weights: [u8; 4],
}

impl IqmModel {
    /// Decode position/texcoord/normal/blend-index/blend-weight arrays from
    /// the source buffer into a staging vector, one entry per vertex.
    ///
    /// Each consumed array's `(format, size)` pair is validated against the
    /// supported set for its attribute, and its declared extent against the
    /// buffer, before any of it is read. Position decode swaps the model's
    /// Y/Z axes into the engine convention. Tangent, color and custom arrays
    /// are skipped.
    pub fn load_geometry(&self, data: &[u8]) -> Result<Vec<ModelVertex>, IqmError> {
        let count = self.num_vertices as usize;
        let mut vertices = vec![ModelVertex::zeroed(); count];

        for va in &self.vertex_arrays {
            match va.kind {
                VertexArrayKind::Position => match (va.format, va.size) {
                    (FORMAT_FLOAT, 3) => {
                        let mut r = stream(data, "position", va, 4, count)?;
                        for v in &mut vertices {
                            let p = r.read_f32_array::<3>()?;
                            v.position = [p[0], p[2], p[1]];
                        }
                    }
                    _ => return Err(unsupported("position", va)),
                },
                VertexArrayKind::TexCoord => match (va.format, va.size) {
                    (FORMAT_FLOAT, 2) => {
                        let mut r = stream(data, "texcoord", va, 4, count)?;
                        for v in &mut vertices {
                            v.uv = r.read_f32_array::<2>()?;
                        }
                    }
                    _ => return Err(unsupported("texcoord", va)),
                },
                VertexArrayKind::Normal => match (va.format, va.size) {
                    (FORMAT_FLOAT, 3) => {
                        let mut r = stream(data, "normal", va, 4, count)?;
                        for v in &mut vertices {
                            v.normal = r.read_f32_array::<3>()?;
                        }
                    }
                    _ => return Err(unsupported("normal", va)),
                },
                VertexArrayKind::BlendIndices => match (va.format, va.size) {
                    (FORMAT_UBYTE, 4) => {
                        let mut r = stream(data, "blendindexes", va, 1, count)?;
                        for v in &mut vertices {
                            for b in &mut v.bone_indices {
                                *b = r.read_u8()?;
                            }
                        }
                    }
                    (FORMAT_INT, 4) => {
                        let mut r = stream(data, "blendindexes", va, 4, count)?;
                        for v in &mut vertices {
                            for b in &mut v.bone_indices {
                                *b = r.read_i32()?.clamp(0, 255) as u8;
                            }
                        }
                    }
                    _ => return Err(unsupported("blendindexes", va)),
                },
                VertexArrayKind::BlendWeights => match (va.format, va.size) {
                    (FORMAT_UBYTE, 4) => {
                        let mut r = stream(data, "blendweights", va, 1, count)?;
                        for v in &mut vertices {
                            for b in &mut v.bone_weights {
                                *b = r.read_u8()?;
                            }
                        }
                    }
                    (FORMAT_FLOAT, 4) => {
                        let mut r = stream(data, "blendweights", va, 4, count)?;
                        for v in &mut vertices {
                            for b in &mut v.bone_weights {
                                *b = (r.read_f32()? * 255.0).clamp(0.0, 255.0) as u8;
                            }
                        }
                    }
                    _ => return Err(unsupported("blendweights", va)),
                },
                VertexArrayKind::Tangent | VertexArrayKind::Color | VertexArrayKind::Custom(_) => {
                    warn!(kind = ?va.kind, "skipping unused vertex array");
                }
            }
        }

        Ok(vertices)
    }
}

/// Range-check a vertex array's extent and return a cursor at its start.
fn stream<'a>(
    data: &'a [u8],
    semantic: &'static str,
    va: &VertexArray,
    elem_width: usize,
    count: usize,
) -> Result<Reader<'a>, IqmError> {
    let size = va.size as usize * elem_width * count;
    let end = (va.offset as usize).checked_add(size);
    match end {
        Some(end) if end <= data.len() => Ok(Reader::at(data, va.offset as usize)),
        _ => Err(IqmError::TableOutOfRange {
            table: semantic,
            offset: va.offset,
            size,
            len: data.len(),
        }),
    }
}

fn unsupported(semantic: &'static str, va: &VertexArray) -> IqmError {
    IqmError::UnsupportedVertexFormat {
        semantic,
        format: va.format,
        size: va.size,
    }
}
