//! GLB container framing
//!
//! A GLB file is a 12-byte header (magic, version, total length) followed
//! by chunks, each with an 8-byte header (length, type). A conforming
//! file carries the JSON description chunk first and at most one binary
//! chunk after it.

use crate::core::Error;

const MAGIC: u32 = 0x4654_6C67; // "glTF"
const VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A; // "JSON"
const CHUNK_BIN: u32 = 0x004E_4942; // "BIN\0"

/// The two payloads of a GLB container.
pub struct Chunks<'a> {
    pub json: &'a [u8],
    pub bin: &'a [u8],
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, Error> {
    let end = offset
        .checked_add(4)
        .ok_or_else(|| Error::Format("container offset overflow".into()))?;
    let slice = bytes
        .get(offset..end)
        .ok_or_else(|| Error::Format("container truncated".into()))?;
    Ok(u32::from_le_bytes(slice.try_into().unwrap()))
}

/// Split a GLB byte stream into its JSON and binary chunks, validating
/// the structural header along the way.
pub fn split(bytes: &[u8]) -> Result<Chunks<'_>, Error> {
    if bytes.len() < 12 {
        return Err(Error::Format(format!(
            "header needs 12 bytes, got {}",
            bytes.len()
        )));
    }

    let magic = read_u32(bytes, 0)?;
    if magic != MAGIC {
        return Err(Error::Format(format!("bad magic 0x{magic:08x}")));
    }

    let version = read_u32(bytes, 4)?;
    if version != VERSION {
        return Err(Error::Format(format!("unsupported version {version}")));
    }

    let declared = read_u32(bytes, 8)? as usize;
    if declared != bytes.len() {
        return Err(Error::Format(format!(
            "declared length {} does not match actual {}",
            declared,
            bytes.len()
        )));
    }

    let mut offset = 12;
    let mut json: Option<&[u8]> = None;
    let mut bin: Option<&[u8]> = None;

    while offset < bytes.len() {
        let chunk_len = read_u32(bytes, offset)? as usize;
        let chunk_type = read_u32(bytes, offset + 4)?;
        let data_start = offset + 8;
        let data_end = data_start
            .checked_add(chunk_len)
            .filter(|&end| end <= bytes.len())
            .ok_or_else(|| {
                Error::Format(format!("chunk at offset {offset} overruns container"))
            })?;
        let data = &bytes[data_start..data_end];

        match chunk_type {
            CHUNK_JSON => {
                if json.is_some() {
                    return Err(Error::Format("duplicate JSON chunk".into()));
                }
                if bin.is_some() {
                    return Err(Error::Format("JSON chunk after binary chunk".into()));
                }
                json = Some(data);
            }
            CHUNK_BIN => {
                if json.is_none() {
                    return Err(Error::Format("binary chunk before JSON chunk".into()));
                }
                if bin.is_some() {
                    return Err(Error::Format("duplicate binary chunk".into()));
                }
                bin = Some(data);
            }
            // Unknown chunk types must be skipped per the format
            _ => {}
        }

        offset = data_end;
    }

    let json = json.ok_or_else(|| Error::Format("missing JSON chunk".into()))?;
    Ok(Chunks {
        json,
        bin: bin.unwrap_or(&[]),
    })
}

/// Assemble a GLB container from a JSON description and binary payload.
/// Chunks are padded to 4-byte alignment as the format requires.
#[cfg(test)]
pub fn assemble(json: &[u8], bin: &[u8]) -> Vec<u8> {
    let json_padded = (json.len() + 3) & !3;
    let bin_padded = (bin.len() + 3) & !3;
    let mut total = 12 + 8 + json_padded;
    if !bin.is_empty() {
        total += 8 + bin_padded;
    }

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&MAGIC.to_le_bytes());
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());

    out.extend_from_slice(&(json_padded as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(json);
    out.resize(out.len() + (json_padded - json.len()), b' ');

    if !bin.is_empty() {
        out.extend_from_slice(&(bin_padded as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(bin);
        out.resize(out.len() + (bin_padded - bin.len()), 0);
    }

    out
}
