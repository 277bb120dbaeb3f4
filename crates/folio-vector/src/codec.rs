//! On-disk encoding of a [`VectorIndex`].
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! magic   b"FOLIOVEC"   8 bytes
//! version u32           currently 1
//! rows    u64
//! dim     u64
//! data    rows * dim f32
//! ```

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use folio_core::error::{Error, Result};

use crate::matrix::VectorIndex;

const MAGIC: &[u8; 8] = b"FOLIOVEC";
pub const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 8 + 4 + 8 + 8;

pub fn write_vectors(path: &Path, index: &VectorIndex) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(MAGIC)?;
    out.write_all(&FORMAT_VERSION.to_le_bytes())?;
    out.write_all(&(index.len() as u64).to_le_bytes())?;
    out.write_all(&(index.dim() as u64).to_le_bytes())?;
    for value in index.as_slice() {
        out.write_all(&value.to_le_bytes())?;
    }
    out.flush()?;
    out.get_ref().sync_all()?;
    Ok(())
}

pub fn read_vectors(path: &Path) -> Result<VectorIndex> {
    let mut bytes = Vec::new();
    File::open(path)?.read_to_end(&mut bytes)?;
    decode(&bytes)
}

fn corrupt(msg: impl Into<String>) -> Error {
    Error::IndexCorrupt(format!("vector file: {}", msg.into()))
}

fn decode(bytes: &[u8]) -> Result<VectorIndex> {
    if bytes.len() < HEADER_LEN {
        return Err(corrupt("truncated header"));
    }
    if &bytes[..8] != MAGIC {
        return Err(corrupt("bad magic"));
    }
    let version = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    if version != FORMAT_VERSION {
        return Err(corrupt(format!("unsupported version {version}")));
    }
    let read_u64 = |at: usize| -> Result<usize> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes[at..at + 8]);
        usize::try_from(u64::from_le_bytes(buf)).map_err(|_| corrupt("size does not fit in memory"))
    };
    let rows = read_u64(12)?;
    let dim = read_u64(20)?;
    let expected = rows
        .checked_mul(dim)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| corrupt("size overflow"))?;
    let body = &bytes[HEADER_LEN..];
    if body.len() != expected {
        return Err(corrupt(format!("expected {expected} data bytes for {rows}x{dim}, found {}", body.len())));
    }
    let mut data = Vec::with_capacity(rows * dim);
    for chunk in body.chunks_exact(4) {
        let value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        if !value.is_finite() {
            return Err(corrupt("non-finite value"));
        }
        data.push(value);
    }
    VectorIndex::from_raw(dim, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_foreign_and_truncated_files() {
        assert!(matches!(decode(b"short"), Err(Error::IndexCorrupt(_))));
        let mut bytes = b"NOTFOLIO".to_vec();
        bytes.extend_from_slice(&[0u8; 20]);
        assert!(matches!(decode(&bytes), Err(Error::IndexCorrupt(_))));
    }

    #[test]
    fn rejects_body_length_mismatch() {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&2u64.to_le_bytes());
        bytes.extend_from_slice(&3u64.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 4 * 5]);
        let err = decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("expected 24 data bytes"), "{err}");
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&99u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 16]);
        assert!(decode(&bytes).unwrap_err().to_string().contains("unsupported version 99"));
    }
}
