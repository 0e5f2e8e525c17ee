//! LZF miniblock codec.
//!
//! A miniblock is the atomic unit of the block stream:
//!
//! ```text
//! [written_size: u32 LE]
//! [payload: written_size & 0x7FFF_FFFF bytes]
//! ```
//!
//! Bit 31 of `written_size` marks a payload stored raw; a clear bit means
//! the payload is LZF-compressed. The encoder only ever sets the bit on the
//! uncompressed path, so raw payloads whose size happens to have bit 31
//! clear cannot be emitted and the two cases round-trip unambiguously.

use crate::block::LZF_BUFFER_SIZE;
use crate::buffer::ByteReader;
use crate::error::{Error, Result};
use bytes::{BufMut, Bytes, BytesMut};

/// Largest payload representable in the 31-bit length prefix.
pub const MAX_PAYLOAD: usize = 0x7FFF_FFFF;

/// Bit 31 of the length prefix: set when the payload is stored raw.
const RAW_FLAG: u32 = 0x8000_0000;

/// Split a length prefix into its compressed flag and payload length.
pub(crate) fn unpack_prefix(written_size: u32) -> (bool, usize) {
    (written_size & RAW_FLAG == 0, (written_size & MAX_PAYLOAD as u32) as usize)
}

/// Decode one miniblock and return its payload.
pub fn decode(r: &mut ByteReader) -> Result<Bytes> {
    let written_size = r.get_u32_le()?;
    let (compressed, len) = unpack_prefix(written_size);
    let payload = r.take(len)?;

    if compressed {
        decompress(&payload)
    } else {
        Ok(payload)
    }
}

/// LZF-decompress `data` into a buffer of fixed capacity [`LZF_BUFFER_SIZE`].
pub(crate) fn decompress(data: &[u8]) -> Result<Bytes> {
    match lzf::decompress(data, LZF_BUFFER_SIZE) {
        Ok(out) => Ok(Bytes::from(out)),
        Err(lzf::LzfError::BufferTooSmall) => {
            Err(Error::decompression("unable to decompress; increase buffer size?"))
        }
        Err(e) => Err(Error::decompression(format!("corrupt LZF payload: {:?}", e))),
    }
}

/// Encode `payload` as one miniblock, appending to `out`.
///
/// Compression is kept only when it saves at least one byte; otherwise the
/// payload is stored raw with bit 31 set. An empty payload is legal and is
/// always stored raw.
pub fn encode(payload: &[u8], out: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(Error::invalid_argument(format!(
            "miniblock payload of {} bytes exceeds the 31-bit length prefix",
            payload.len()
        )));
    }

    let compressed = if payload.is_empty() { None } else { lzf::compress(payload).ok() };

    match compressed {
        Some(data) if data.len() < payload.len() => {
            out.put_u32_le(data.len() as u32);
            out.put_slice(&data);
        }
        _ => {
            out.put_u32_le(payload.len() as u32 | RAW_FLAG);
            out.put_slice(payload);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(payload: &[u8]) -> Bytes {
        let mut encoded = BytesMut::new();
        encode(payload, &mut encoded).unwrap();
        let mut r = ByteReader::new(encoded.freeze());
        let decoded = decode(&mut r).unwrap();
        assert!(r.is_empty(), "miniblock left trailing bytes");
        decoded
    }

    #[test]
    fn test_round_trip_compressible() {
        let payload = vec![0u8; 4096];
        assert_eq!(round_trip(&payload), payload);
    }

    #[test]
    fn test_round_trip_incompressible() {
        // 16 distinct bytes leave LZF nothing to match.
        let payload: Vec<u8> = (0u8..16).collect();
        assert_eq!(round_trip(&payload), payload);
    }

    #[test]
    fn test_round_trip_empty() {
        assert_eq!(round_trip(&[]), Bytes::new());
    }

    #[test]
    fn test_empty_payload_stored_raw() {
        let mut encoded = BytesMut::new();
        encode(&[], &mut encoded).unwrap();
        assert_eq!(encoded.as_ref(), &RAW_FLAG.to_le_bytes());
    }

    #[test]
    fn test_compressed_prefix_has_bit31_clear() {
        let payload = vec![0u8; 4096];
        let mut encoded = BytesMut::new();
        encode(&payload, &mut encoded).unwrap();

        let prefix = u32::from_le_bytes(encoded[0..4].try_into().unwrap());
        assert_eq!(prefix & RAW_FLAG, 0);
        assert!(encoded.len() < payload.len());
    }

    #[test]
    fn test_raw_prefix_decodes_verbatim() {
        // Prefix with bit 31 set and payload length 5, then 5 raw bytes.
        let mut data = (5u32 | RAW_FLAG).to_le_bytes().to_vec();
        data.extend_from_slice(&[0x00, 0x01, 0x02, 0x03, 0x04]);

        let mut r = ByteReader::new(data);
        let payload = decode(&mut r).unwrap();
        assert_eq!(payload.as_ref(), &[0x00, 0x01, 0x02, 0x03, 0x04]);
        assert!(r.is_empty());
    }

    #[test]
    fn test_truncated_payload() {
        // Claims 8 raw bytes but carries 3.
        let mut data = (8u32 | RAW_FLAG).to_le_bytes().to_vec();
        data.extend_from_slice(&[1, 2, 3]);

        let mut r = ByteReader::new(data);
        assert!(matches!(decode(&mut r), Err(Error::Corruption(_))));
    }

    #[test]
    fn test_corrupt_compressed_payload() {
        // Bit 31 clear marks these bytes as LZF, which they are not.
        let mut data = 4u32.to_le_bytes().to_vec();
        data.extend_from_slice(&[0xff, 0xff, 0xff, 0xff]);

        let mut r = ByteReader::new(data);
        assert!(matches!(decode(&mut r), Err(Error::Decompression(_))));
    }
}
