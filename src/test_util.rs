//! Test-only builder for synthesizing IQM byte buffers.
//!
//! Assembles a valid buffer from typed parts so tests can construct models
//! programmatically and then corrupt individual header fields to probe the
//! loader's bounds checks.

use crate::header::IqmHeader;

struct RawJoint {
    name: u32,
    parent: i32,
    translate: [f32; 3],
    rotation: [f32; 4],
    scale: [f32; 3],
}

struct RawPose {
    parent: i32,
    mask: u32,
    offset: [f32; 10],
    scale: [f32; 10],
}

struct RawAnim {
    name: u32,
    first_frame: u32,
    num_frames: u32,
    framerate: f32,
    flags: u32,
}

struct RawVertexArray {
    kind: u32,
    format: u32,
    size: u32,
    data: Vec<u8>,
}

pub struct IqmBuilder {
    text: Vec<u8>,
    meshes: Vec<[u32; 6]>,
    triangles: Vec<[u32; 3]>,
    adjacency: Vec<[u32; 3]>,
    joints: Vec<RawJoint>,
    poses: Vec<RawPose>,
    anims: Vec<RawAnim>,
    vertex_arrays: Vec<RawVertexArray>,
    num_vertices: u32,
    num_frames: u32,
    num_framechannels: u32,
    frame_samples: Vec<u16>,
}

impl IqmBuilder {
    pub fn new() -> Self {
        Self {
            text: vec![0], // offset 0 is the conventional empty string
            meshes: Vec::new(),
            triangles: Vec::new(),
            adjacency: Vec::new(),
            joints: Vec::new(),
            poses: Vec::new(),
            anims: Vec::new(),
            vertex_arrays: Vec::new(),
            num_vertices: 0,
            num_frames: 0,
            num_framechannels: 0,
            frame_samples: Vec::new(),
        }
    }

    /// Intern a NUL-terminated string, returning its text-section offset.
    pub fn text(&mut self, s: &str) -> u32 {
        let ofs = self.text.len() as u32;
        self.text.extend_from_slice(s.as_bytes());
        self.text.push(0);
        ofs
    }

    pub fn mesh(
        mut self,
        name: &str,
        material: &str,
        first_vertex: u32,
        num_vertices: u32,
        first_triangle: u32,
        num_triangles: u32,
    ) -> Self {
        let name = self.text(name);
        let material = self.text(material);
        self.meshes.push([
            name,
            material,
            first_vertex,
            num_vertices,
            first_triangle,
            num_triangles,
        ]);
        self
    }

    pub fn triangle(mut self, vertices: [u32; 3], adjacent: [u32; 3]) -> Self {
        self.triangles.push(vertices);
        self.adjacency.push(adjacent);
        self
    }

    pub fn joint(
        mut self,
        name: &str,
        parent: i32,
        translate: [f32; 3],
        rotation: [f32; 4],
        scale: [f32; 3],
    ) -> Self {
        let name = self.text(name);
        self.joints.push(RawJoint {
            name,
            parent,
            translate,
            rotation,
            scale,
        });
        self
    }

    pub fn pose(mut self, parent: i32, mask: u32, offset: [f32; 10], scale: [f32; 10]) -> Self {
        self.poses.push(RawPose {
            parent,
            mask,
            offset,
            scale,
        });
        self
    }

    pub fn anim(
        mut self,
        name: &str,
        first_frame: u32,
        num_frames: u32,
        framerate: f32,
        flags: u32,
    ) -> Self {
        let name = self.text(name);
        self.anims.push(RawAnim {
            name,
            first_frame,
            num_frames,
            framerate,
            flags,
        });
        self
    }

    /// Declare the frame table and its flat quantized sample stream.
    pub fn frames(mut self, num_frames: u32, num_framechannels: u32, samples: Vec<u16>) -> Self {
        self.num_frames = num_frames;
        self.num_framechannels = num_framechannels;
        self.frame_samples = samples;
        self
    }

    pub fn vertices(mut self, num: u32) -> Self {
        self.num_vertices = num;
        self
    }

    /// Add a vertex array with a raw data blob; the builder assigns its
    /// buffer offset during `build`.
    pub fn vertex_array(mut self, kind: u32, format: u32, size: u32, data: Vec<u8>) -> Self {
        self.vertex_arrays.push(RawVertexArray {
            kind,
            format,
            size,
            data,
        });
        self
    }

    /// Position array helper: float x 3 per vertex.
    pub fn positions(self, positions: &[[f32; 3]]) -> Self {
        let mut data = Vec::new();
        for p in positions {
            for v in p {
                data.extend_from_slice(&v.to_le_bytes());
            }
        }
        self.vertex_array(0, 7, 3, data)
    }

    pub fn build(self) -> Vec<u8> {
        let mut body: Vec<u8> = Vec::new();
        let base = IqmHeader::SIZE as u32;
        let pos = |body: &Vec<u8>| base + body.len() as u32;

        let ofs_text = pos(&body);
        body.extend_from_slice(&self.text);

        let ofs_meshes = pos(&body);
        for m in &self.meshes {
            for v in m {
                body.extend_from_slice(&v.to_le_bytes());
            }
        }

        let ofs_triangles = pos(&body);
        for t in &self.triangles {
            for v in t {
                body.extend_from_slice(&v.to_le_bytes());
            }
        }

        let ofs_adjacency = pos(&body);
        for a in &self.adjacency {
            for v in a {
                body.extend_from_slice(&v.to_le_bytes());
            }
        }

        let ofs_joints = pos(&body);
        for j in &self.joints {
            body.extend_from_slice(&j.name.to_le_bytes());
            body.extend_from_slice(&j.parent.to_le_bytes());
            for v in j.translate.iter().chain(&j.rotation).chain(&j.scale) {
                body.extend_from_slice(&v.to_le_bytes());
            }
        }

        let ofs_poses = pos(&body);
        for p in &self.poses {
            body.extend_from_slice(&p.parent.to_le_bytes());
            body.extend_from_slice(&p.mask.to_le_bytes());
            for v in p.offset.iter().chain(&p.scale) {
                body.extend_from_slice(&v.to_le_bytes());
            }
        }

        let ofs_anims = pos(&body);
        for a in &self.anims {
            body.extend_from_slice(&a.name.to_le_bytes());
            body.extend_from_slice(&a.first_frame.to_le_bytes());
            body.extend_from_slice(&a.num_frames.to_le_bytes());
            body.extend_from_slice(&a.framerate.to_le_bytes());
            body.extend_from_slice(&a.flags.to_le_bytes());
        }

        let ofs_bounds = pos(&body);
        for _ in 0..self.num_frames {
            body.extend_from_slice(&[0u8; 32]);
        }

        let ofs_frames = pos(&body);
        for s in &self.frame_samples {
            body.extend_from_slice(&s.to_le_bytes());
        }

        // Vertex array data blobs, then the descriptor table pointing at them
        let mut descriptors = Vec::new();
        for va in &self.vertex_arrays {
            let offset = pos(&body);
            body.extend_from_slice(&va.data);
            descriptors.push([va.kind, 0u32, va.format, va.size, offset]);
        }
        let ofs_vertexarrays = pos(&body);
        for d in &descriptors {
            for v in d {
                body.extend_from_slice(&v.to_le_bytes());
            }
        }

        let filesize = base + body.len() as u32;
        let mut out = Vec::with_capacity(filesize as usize);
        out.extend_from_slice(b"INTERQUAKEMODEL\0");
        for v in [
            2u32, // version
            filesize,
            0, // flags
            self.text.len() as u32,
            ofs_text,
            self.meshes.len() as u32,
            ofs_meshes,
            self.vertex_arrays.len() as u32,
            self.num_vertices,
            ofs_vertexarrays,
            self.triangles.len() as u32,
            ofs_triangles,
            ofs_adjacency,
            self.joints.len() as u32,
            ofs_joints,
            self.poses.len() as u32,
            ofs_poses,
            self.anims.len() as u32,
            ofs_anims,
            self.num_frames,
            self.num_framechannels,
            ofs_frames,
            ofs_bounds,
            0, // num_comment
            0, // ofs_comment
            0, // num_extensions
            0, // ofs_extensions
        ] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out.extend_from_slice(&[0u8; 4]); // header padding up to 128 bytes
        debug_assert_eq!(out.len(), IqmHeader::SIZE);
        out.extend_from_slice(&body);
        out
    }
}

/// A two-joint skeleton (root + child) with matching identity-baseline pose
/// channels, used by several evaluator tests.
pub fn two_joint_builder() -> IqmBuilder {
    let identity_offsets = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
    let unit_scales = [1.0; 10];
    IqmBuilder::new()
        .joint(
            "root",
            -1,
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
        )
        .joint(
            "child",
            0,
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
        )
        .pose(-1, 0x7, identity_offsets, unit_scales)
        .pose(0, 0x7, identity_offsets, unit_scales)
}
