//! Load and evaluation failure kinds.
//!
//! Every way an IQM buffer can be rejected gets its own variant so callers
//! (and tests) can match on the kind instead of parsing a message. All
//! failures are recoverable: the caller discards the model and moves on.

/// Error produced while decoding an IQM buffer or materializing its geometry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IqmError {
    /// Buffer is shorter than a region that must be readable
    #[error("buffer too short: {len} bytes, need {need}")]
    TooShort { len: usize, need: usize },

    /// One of the two 8-byte magic fields does not match
    #[error("bad magic, not an IQM file")]
    BadMagic,

    /// Format version other than the supported one
    #[error("unsupported IQM version {0} (expected 2)")]
    BadVersion(u32),

    /// Text section is empty; every name is string-table-resolved
    #[error("model has no text section")]
    NoText,

    /// A table's declared offset + size extends past the buffer
    #[error("{table} table out of range: offset {offset} + {size} bytes exceeds buffer length {len}")]
    TableOutOfRange {
        table: &'static str,
        offset: u32,
        size: usize,
        len: usize,
    },

    /// A string reference points at or beyond the end of the text section
    #[error("string index {index} out of range (text section is {text_len} bytes)")]
    StringIndexOutOfRange { index: u32, text_len: usize },

    /// A joint or pose references a parent that is not strictly earlier in
    /// index order, so the single forward pass over the hierarchy is unsound
    #[error("joint {joint} has invalid parent {parent} (must be < {joint} or negative)")]
    InvalidParent { joint: u32, parent: i32 },

    /// Frame samples are indexed by joint, so an animated model must carry
    /// exactly one pose channel descriptor per joint
    #[error("pose count {poses} does not match joint count {joints}")]
    PoseJointMismatch { poses: u32, joints: u32 },

    /// The quantized sample stream ended before a joint's channels were read
    #[error("frame data exhausted at frame {frame}, joint {joint}")]
    FrameStreamExhausted { frame: u32, joint: u32 },

    /// A vertex array's (format, size) pair is not in the supported set for
    /// its attribute type
    #[error("unsupported {semantic} vertex array: format {format}, size {size}")]
    UnsupportedVertexFormat {
        semantic: &'static str,
        format: u32,
        size: u32,
    },
}
