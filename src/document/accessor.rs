//! Typed reads of glTF accessors from the binary chunk
//!
//! Every read validates the accessor's declared component type and
//! element type against the semantic it is bound to, and bounds-checks
//! the byte range through bufferView and buffer. Interleaved buffer
//! views (byteStride) are honored.

use glam::Mat4;

use super::json;
use crate::core::Error;

pub const UNSIGNED_BYTE: u32 = 5121;
pub const UNSIGNED_SHORT: u32 = 5123;
pub const UNSIGNED_INT: u32 = 5125;
pub const FLOAT: u32 = 5126;

fn component_count(element_type: &str) -> Option<usize> {
    match element_type {
        "SCALAR" => Some(1),
        "VEC2" => Some(2),
        "VEC3" => Some(3),
        "VEC4" => Some(4),
        "MAT4" => Some(16),
        _ => None,
    }
}

fn component_size(component_type: u32) -> Option<usize> {
    match component_type {
        5120 | 5121 => Some(1),
        5122 | 5123 => Some(2),
        5125 | 5126 => Some(4),
        _ => None,
    }
}

/// Reads accessor data out of the GLB binary chunk.
pub struct Reader<'a> {
    root: &'a json::Root,
    bin: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(root: &'a json::Root, bin: &'a [u8]) -> Result<Self, Error> {
        for (i, buffer) in root.buffers.iter().enumerate() {
            if buffer.uri.is_some() {
                return Err(Error::Format(format!(
                    "buffer {i} references external data, only the embedded chunk is supported"
                )));
            }
            if buffer.byte_length > bin.len() {
                return Err(Error::Format(format!(
                    "buffer {i} declares {} bytes but the binary chunk holds {}",
                    buffer.byte_length,
                    bin.len()
                )));
            }
        }
        Ok(Self { root, bin })
    }

    fn accessor(&self, index: usize) -> Result<&'a json::Accessor, Error> {
        self.root
            .accessors
            .get(index)
            .ok_or_else(|| Error::Format(format!("accessor index {index} out of range")))
    }

    /// Resolve an accessor to (first element, element stride, element size).
    fn raw(&self, index: usize, acc: &json::Accessor) -> Result<(&'a [u8], usize, usize), Error> {
        let comps = component_count(&acc.element_type).ok_or_else(|| {
            Error::Format(format!(
                "accessor {index}: unknown element type {}",
                acc.element_type
            ))
        })?;
        let comp_size = component_size(acc.component_type).ok_or_else(|| {
            Error::Format(format!(
                "accessor {index}: unknown component type {}",
                acc.component_type
            ))
        })?;
        let elem_size = comps * comp_size;

        let view_index = acc.buffer_view.ok_or_else(|| {
            Error::Format(format!("accessor {index}: sparse accessors unsupported"))
        })?;
        let view = self.root.buffer_views.get(view_index).ok_or_else(|| {
            Error::Format(format!("accessor {index}: bufferView {view_index} out of range"))
        })?;
        if view.buffer >= self.root.buffers.len() {
            return Err(Error::Format(format!(
                "bufferView {view_index}: buffer {} out of range",
                view.buffer
            )));
        }

        let view_bytes = view
            .byte_offset
            .checked_add(view.byte_length)
            .and_then(|end| self.bin.get(view.byte_offset..end))
            .ok_or_else(|| {
                Error::Format(format!(
                    "bufferView {view_index} overruns the binary chunk"
                ))
            })?;

        let stride = view.byte_stride.unwrap_or(elem_size);
        if stride < elem_size {
            return Err(Error::Format(format!(
                "bufferView {view_index}: stride {stride} smaller than element size {elem_size}"
            )));
        }

        if acc.count > 0 {
            // Declared counts are untrusted; the arithmetic itself must
            // not overflow before the range check
            let fits = (acc.count - 1)
                .checked_mul(stride)
                .and_then(|n| n.checked_add(acc.byte_offset))
                .and_then(|n| n.checked_add(elem_size))
                .is_some_and(|need| need <= view_bytes.len());
            if !fits {
                return Err(Error::Format(format!(
                    "accessor {index}: {} elements overrun bufferView {view_index}",
                    acc.count
                )));
            }
        }

        Ok((&view_bytes[acc.byte_offset.min(view_bytes.len())..], stride, elem_size))
    }

    fn expect(
        &self,
        index: usize,
        semantic: &str,
        component_type: u32,
        element_type: &str,
    ) -> Result<&'a json::Accessor, Error> {
        let acc = self.accessor(index)?;
        if acc.component_type != component_type || acc.element_type != element_type {
            return Err(Error::Format(format!(
                "accessor {index}: {semantic} requires {element_type}/{component_type}, \
                 got {}/{}",
                acc.element_type, acc.component_type
            )));
        }
        Ok(acc)
    }

    fn read_f32_flat(&self, index: usize, acc: &json::Accessor) -> Result<Vec<f32>, Error> {
        let comps = component_count(&acc.element_type).unwrap_or(1);
        let (base, stride, _) = self.raw(index, acc)?;
        let mut out = Vec::with_capacity(acc.count * comps);
        for i in 0..acc.count {
            let elem = &base[i * stride..];
            for c in 0..comps {
                let b = &elem[c * 4..c * 4 + 4];
                out.push(f32::from_le_bytes(b.try_into().unwrap()));
            }
        }
        Ok(out)
    }

    /// Flat f32 values with the given element type (animation outputs,
    /// keyframe timestamps).
    pub fn read_floats(
        &self,
        index: usize,
        semantic: &str,
        element_type: &str,
    ) -> Result<Vec<f32>, Error> {
        let acc = self.expect(index, semantic, FLOAT, element_type)?;
        self.read_f32_flat(index, acc)
    }

    pub fn read_vec3s(&self, index: usize, semantic: &str) -> Result<Vec<[f32; 3]>, Error> {
        let acc = self.expect(index, semantic, FLOAT, "VEC3")?;
        let flat = self.read_f32_flat(index, acc)?;
        Ok(flat.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
    }

    pub fn read_vec2s(&self, index: usize, semantic: &str) -> Result<Vec<[f32; 2]>, Error> {
        let acc = self.expect(index, semantic, FLOAT, "VEC2")?;
        let flat = self.read_f32_flat(index, acc)?;
        Ok(flat.chunks_exact(2).map(|c| [c[0], c[1]]).collect())
    }

    pub fn read_mat4s(&self, index: usize, semantic: &str) -> Result<Vec<Mat4>, Error> {
        let acc = self.expect(index, semantic, FLOAT, "MAT4")?;
        let flat = self.read_f32_flat(index, acc)?;
        // glTF matrices are column-major, same as glam
        Ok(flat
            .chunks_exact(16)
            .map(|c| Mat4::from_cols_array(c.try_into().unwrap()))
            .collect())
    }

    /// Joint indices: unsigned byte or short, VEC4.
    pub fn read_joints(&self, index: usize) -> Result<Vec<[u16; 4]>, Error> {
        let acc = self.accessor(index)?;
        if acc.element_type != "VEC4" {
            return Err(Error::Format(format!(
                "accessor {index}: JOINTS_0 requires VEC4, got {}",
                acc.element_type
            )));
        }
        let (base, stride, _) = self.raw(index, acc)?;
        let mut out = Vec::with_capacity(acc.count);
        match acc.component_type {
            UNSIGNED_BYTE => {
                for i in 0..acc.count {
                    let e = &base[i * stride..];
                    out.push([e[0] as u16, e[1] as u16, e[2] as u16, e[3] as u16]);
                }
            }
            UNSIGNED_SHORT => {
                for i in 0..acc.count {
                    let e = &base[i * stride..];
                    let j = |c: usize| u16::from_le_bytes([e[c * 2], e[c * 2 + 1]]);
                    out.push([j(0), j(1), j(2), j(3)]);
                }
            }
            other => {
                return Err(Error::Format(format!(
                    "accessor {index}: JOINTS_0 requires u8/u16 components, got {other}"
                )));
            }
        }
        Ok(out)
    }

    /// Joint weights: float VEC4, or normalized u8/u16 VEC4.
    pub fn read_weights(&self, index: usize) -> Result<Vec<[f32; 4]>, Error> {
        let acc = self.accessor(index)?;
        if acc.element_type != "VEC4" {
            return Err(Error::Format(format!(
                "accessor {index}: WEIGHTS_0 requires VEC4, got {}",
                acc.element_type
            )));
        }
        let (base, stride, _) = self.raw(index, acc)?;
        let mut out = Vec::with_capacity(acc.count);
        match (acc.component_type, acc.normalized) {
            (FLOAT, _) => {
                for i in 0..acc.count {
                    let e = &base[i * stride..];
                    let w = |c: usize| {
                        f32::from_le_bytes(e[c * 4..c * 4 + 4].try_into().unwrap())
                    };
                    out.push([w(0), w(1), w(2), w(3)]);
                }
            }
            (UNSIGNED_BYTE, true) => {
                for i in 0..acc.count {
                    let e = &base[i * stride..];
                    let w = |c: usize| e[c] as f32 / 255.0;
                    out.push([w(0), w(1), w(2), w(3)]);
                }
            }
            (UNSIGNED_SHORT, true) => {
                for i in 0..acc.count {
                    let e = &base[i * stride..];
                    let w = |c: usize| {
                        u16::from_le_bytes([e[c * 2], e[c * 2 + 1]]) as f32 / 65535.0
                    };
                    out.push([w(0), w(1), w(2), w(3)]);
                }
            }
            (other, _) => {
                return Err(Error::Format(format!(
                    "accessor {index}: WEIGHTS_0 requires float or normalized u8/u16, got {other}"
                )));
            }
        }
        Ok(out)
    }

    /// Index lists: unsigned byte, short, or int SCALARs, widened to u32.
    pub fn read_indices(&self, index: usize) -> Result<Vec<u32>, Error> {
        let acc = self.accessor(index)?;
        if acc.element_type != "SCALAR" {
            return Err(Error::Format(format!(
                "accessor {index}: indices require SCALAR, got {}",
                acc.element_type
            )));
        }
        let (base, stride, _) = self.raw(index, acc)?;
        let mut out = Vec::with_capacity(acc.count);
        match acc.component_type {
            UNSIGNED_BYTE => {
                for i in 0..acc.count {
                    out.push(base[i * stride] as u32);
                }
            }
            UNSIGNED_SHORT => {
                for i in 0..acc.count {
                    let e = &base[i * stride..];
                    out.push(u16::from_le_bytes([e[0], e[1]]) as u32);
                }
            }
            UNSIGNED_INT => {
                for i in 0..acc.count {
                    let e = &base[i * stride..];
                    out.push(u32::from_le_bytes(e[..4].try_into().unwrap()));
                }
            }
            other => {
                return Err(Error::Format(format!(
                    "accessor {index}: indices require u8/u16/u32 components, got {other}"
                )));
            }
        }
        Ok(out)
    }
}
