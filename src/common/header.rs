//! Wire framing for the single-file transfer.
//!
//! ```text
//! offset 0,    16 bytes LE uint : name length N
//! offset 16,   N bytes UTF-8    : file name
//! offset 16+N, 16 bytes LE uint : file size
//! offset 32+N, payload          : raw bytes until the sender closes
//! ```
//!
//! No magic, version or checksum. The payload length is decided by the
//! connection closing, not by the declared size.

use crate::common::errors::TransferError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Width of each integer field on the wire.
pub const FIELD_LEN: usize = 16;

/// Largest accepted file name, in UTF-8 bytes.
pub const MAX_NAME_LEN: usize = u16::MAX as usize;

pub fn encode_field(value: u128) -> [u8; FIELD_LEN] {
    value.to_le_bytes()
}

/// Decode a little-endian integer field. Fails unless exactly 16 bytes arrived.
pub fn decode_field(bytes: &[u8], field: &str) -> Result<u128, TransferError> {
    let raw: [u8; FIELD_LEN] = bytes.try_into().map_err(|_| {
        TransferError::malformed(format!(
            "truncated {field}: got {} of {FIELD_LEN} bytes",
            bytes.len()
        ))
    })?;
    Ok(u128::from_le_bytes(raw))
}

/// Read up to `len` bytes, tolerating partial reads.
///
/// Stops early if the peer closes, so the returned buffer may be shorter
/// than requested. Callers decide whether a short field is an error.
pub async fn read_field<R>(reader: &mut R, len: usize) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; len];
    let mut filled = 0;

    while filled < len {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    buf.truncate(filled);
    Ok(buf)
}

/// Name and declared size sent ahead of the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferHeader {
    pub name: String,
    pub file_size: u128,
}

impl TransferHeader {
    pub fn new(name: impl Into<String>, file_size: u64) -> Result<Self, TransferError> {
        let name = name.into();
        if name.len() > MAX_NAME_LEN {
            return Err(TransferError::NameTooLong { len: name.len() });
        }

        Ok(Self {
            name,
            file_size: u128::from(file_size),
        })
    }

    /// Serialized header exactly as it appears on the wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        let name = self.name.as_bytes();
        let mut out = Vec::with_capacity(2 * FIELD_LEN + name.len());
        out.extend_from_slice(&encode_field(name.len() as u128));
        out.extend_from_slice(name);
        out.extend_from_slice(&encode_field(self.file_size));
        out
    }

    pub async fn write_to<W>(&self, writer: &mut W) -> Result<(), TransferError>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(&self.to_bytes()).await?;
        Ok(())
    }

    /// Reconstruct a header from the start of a stream.
    ///
    /// A field cut short by the peer closing is reported as
    /// [`TransferError::MalformedHeader`], as is a name that is not UTF-8.
    pub async fn read_from<R>(reader: &mut R) -> Result<Self, TransferError>
    where
        R: AsyncRead + Unpin,
    {
        let raw = read_field(reader, FIELD_LEN).await?;
        let name_len = decode_field(&raw, "name length")?;

        let name_len = usize::try_from(name_len)
            .ok()
            .filter(|len| *len <= MAX_NAME_LEN)
            .ok_or_else(|| {
                TransferError::malformed(format!(
                    "name length {name_len} exceeds {MAX_NAME_LEN} bytes"
                ))
            })?;

        let raw_name = read_field(reader, name_len).await?;
        if raw_name.len() < name_len {
            return Err(TransferError::malformed(format!(
                "truncated file name: got {} of {name_len} bytes",
                raw_name.len()
            )));
        }
        let name = String::from_utf8(raw_name)
            .map_err(|e| TransferError::malformed(format!("file name is not UTF-8: {e}")))?;

        let raw = read_field(reader, FIELD_LEN).await?;
        let file_size = decode_field(&raw, "file size")?;

        tracing::debug!(name = %name, file_size, "decoded transfer header");

        Ok(Self { name, file_size })
    }
}
