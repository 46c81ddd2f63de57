//! Bounds-checked little-endian reads over the source buffer.
//!
//! The IQM layout is a header plus offset/count tables all pointing into one
//! buffer, so nothing here ever aliases the buffer as a struct array. Each
//! field is decoded through a cursor that checks before it reads, and each
//! table region is range-checked as a whole before its first read.

use crate::error::IqmError;

/// Sequential cursor over a byte buffer. All reads are little-endian and
/// fail with `TooShort` rather than reading past the end.
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Cursor starting at `offset` into `data`.
    pub fn at(data: &'a [u8], offset: usize) -> Self {
        Self { data, pos: offset }
    }

    /// Current byte position in the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], IqmError> {
        let end = self.pos.checked_add(n).ok_or(IqmError::TooShort {
            len: self.data.len(),
            need: usize::MAX,
        })?;
        if end > self.data.len() {
            return Err(IqmError::TooShort {
                len: self.data.len(),
                need: end,
            });
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, IqmError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, IqmError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, IqmError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i32(&mut self) -> Result<i32, IqmError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64, IqmError> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn read_f32(&mut self) -> Result<f32, IqmError> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f32_array<const N: usize>(&mut self) -> Result<[f32; N], IqmError> {
        let mut out = [0.0; N];
        for v in &mut out {
            *v = self.read_f32()?;
        }
        Ok(out)
    }

    pub fn read_u32_array<const N: usize>(&mut self) -> Result<[u32; N], IqmError> {
        let mut out = [0; N];
        for v in &mut out {
            *v = self.read_u32()?;
        }
        Ok(out)
    }
}

/// Check that `offset + count * elem_size` stays inside a buffer of `len`
/// bytes. Must pass before any read from the table's region.
pub fn check_table(
    len: usize,
    table: &'static str,
    offset: u32,
    count: u32,
    elem_size: usize,
) -> Result<(), IqmError> {
    let size = count as usize * elem_size;
    let end = (offset as usize).checked_add(size);
    match end {
        Some(end) if end <= len => Ok(()),
        _ => Err(IqmError::TableOutOfRange {
            table,
            offset,
            size,
            len,
        }),
    }
}

/// Resolve a string-table reference: a byte offset into the text section,
/// NUL-terminated. The read is clipped to the text region; an index at or
/// beyond the region is a hard failure, not a truncation.
pub fn text_str(text: &[u8], index: u32) -> Result<String, IqmError> {
    let start = index as usize;
    if start >= text.len() {
        return Err(IqmError::StringIndexOutOfRange {
            index,
            text_len: text.len(),
        });
    }
    let tail = &text[start..];
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    Ok(String::from_utf8_lossy(&tail[..end]).into_owned())
}
