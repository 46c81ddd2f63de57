//! Per-frame pose sample decoding.
//!
//! Frame data is a single flat stream of quantized u16 samples. Each joint's
//! pose channels start from that joint's baseline offsets; every bit set in
//! the channel mask consumes one sample from the stream and adds
//! `sample * scale` to the baseline. The stream cursor is global across the
//! whole frame x joint loop and is never reset.

use glam::{Quat, Vec3};

use crate::error::IqmError;
use crate::header::IqmHeader;
use crate::reader::Reader;
use crate::types::{Joint, PoseChannels, Trs};

/// Decode all frame pose samples, flattened as
/// `frame_index * num_joints + joint_index`.
///
/// A model that declares zero frames still gets exactly one synthetic frame
/// equal to the bind pose, so the evaluator always has a valid frame to read.
pub fn decode_frame_samples(
    data: &[u8],
    header: &IqmHeader,
    poses: &[PoseChannels],
    joints: &[Joint],
) -> Result<Vec<Trs>, IqmError> {
    if header.num_frames == 0 {
        return Ok(bind_pose_frame(joints));
    }

    let stream_len = header.num_frames as usize * header.num_framechannels as usize * 2;
    let stream_end = header.ofs_frames as usize + stream_len;
    // validate_tables already proved stream_end <= data.len()
    let mut r = Reader::at(&data[..stream_end], header.ofs_frames as usize);

    let mut samples = Vec::with_capacity(header.num_frames as usize * poses.len());
    for frame in 0..header.num_frames {
        for (j, pose) in poses.iter().enumerate() {
            let remaining = (stream_end - r.position()) / 2;
            if pose.samples_per_frame() > remaining {
                return Err(IqmError::FrameStreamExhausted {
                    frame,
                    joint: j as u32,
                });
            }
            samples.push(decode_joint_pose(&mut r, pose)?);
        }
    }
    Ok(samples)
}

fn decode_joint_pose(r: &mut Reader, pose: &PoseChannels) -> Result<Trs, IqmError> {
    let ofs = &pose.channel_offset;
    let mut translate = Vec3::new(ofs[0], ofs[1], ofs[2]);
    let mut quat = [ofs[3], ofs[4], ofs[5], ofs[6]];
    let mut scale = Vec3::new(ofs[7], ofs[8], ofs[9]);

    let mask = pose.channel_mask;
    let mut channel = |bit: u32| -> Result<f32, IqmError> {
        Ok(r.read_u16()? as f32 * pose.channel_scale[bit.trailing_zeros() as usize])
    };

    if mask & 0x01 != 0 {
        translate.x += channel(0x01)?;
    }
    if mask & 0x02 != 0 {
        translate.y += channel(0x02)?;
    }
    if mask & 0x04 != 0 {
        translate.z += channel(0x04)?;
    }

    if mask & 0x08 != 0 {
        quat[0] += channel(0x08)?;
    }
    if mask & 0x10 != 0 {
        quat[1] += channel(0x10)?;
    }
    if mask & 0x20 != 0 {
        quat[2] += channel(0x20)?;
    }
    if mask & 0x40 != 0 {
        quat[3] += channel(0x40)?;
    }

    if mask & 0x080 != 0 {
        scale.x += channel(0x080)?;
    }
    if mask & 0x100 != 0 {
        scale.y += channel(0x100)?;
    }
    if mask & 0x200 != 0 {
        scale.z += channel(0x200)?;
    }

    Ok(Trs {
        translation: translate,
        rotation: Quat::from_xyzw(quat[0], quat[1], quat[2], quat[3]).normalize(),
        scale,
    })
}

/// The synthetic single frame used when a file declares no animation:
/// every joint's sample is its bind-pose TRS, bypassing channel decode.
fn bind_pose_frame(joints: &[Joint]) -> Vec<Trs> {
    joints
        .iter()
        .map(|j| Trs {
            translation: j.translate,
            rotation: j.rotation,
            scale: j.scale,
        })
        .collect()
}
