use std::io::{self, Write};

/// Encode a u32 as a variable-length integer
pub fn encode_varint(mut value: u32, buf: &mut Vec<u8>) {
    loop {
        if value < 0x80 {
            buf.push(value as u8);
            break;
        }
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
}

/// Decode a variable-length integer from a slice
/// Returns (value, bytes_consumed)
pub fn decode_varint(buf: &[u8]) -> Option<(u32, usize)> {
    let mut result: u32 = 0;
    let mut shift = 0;

    for (i, &byte) in buf.iter().enumerate() {
        if shift >= 32 {
            return None; // Overflow
        }

        result |= ((byte & 0x7F) as u32) << shift;

        if byte & 0x80 == 0 {
            return Some((result, i + 1));
        }

        shift += 7;
    }

    None // Incomplete
}

/// Delta-encode a strictly ascending list of ids
pub fn delta_encode(values: &[u32], buf: &mut Vec<u8>) {
    let mut prev = 0u32;
    for &value in values {
        debug_assert!(value >= prev, "delta_encode input must be ascending");
        encode_varint(value - prev, buf);
        prev = value;
    }
}

/// Decode exactly `count` delta-encoded ids.
///
/// Returns `None` if the buffer is truncated, has trailing bytes, or the
/// running sum overflows.
pub fn delta_decode(buf: &[u8], count: usize) -> Option<Vec<u32>> {
    let mut result = Vec::with_capacity(count.min(buf.len()));
    let mut prev = 0u32;
    let mut pos = 0;

    for _ in 0..count {
        let (delta, consumed) = decode_varint(&buf[pos..])?;
        prev = prev.checked_add(delta)?;
        result.push(prev);
        pos += consumed;
    }

    (pos == buf.len()).then_some(result)
}

/// Write a u32 in little-endian format
pub fn write_u32_le<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

/// Read a little-endian u32 at `pos`, if the slice is long enough
#[inline]
pub fn read_u32_at(buf: &[u8], pos: usize) -> Option<u32> {
    let bytes = buf.get(pos..pos.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_roundtrip() {
        let values = [0, 1, 127, 128, 16383, 16384, u32::MAX];
        for value in values {
            let mut buf = Vec::new();
            encode_varint(value, &mut buf);
            let (decoded, _) = decode_varint(&buf).unwrap();
            assert_eq!(value, decoded);
        }
    }

    #[test]
    fn test_delta_encoding() {
        let values = vec![0, 5, 10, 15, 100, 1000, 70000];
        let mut buf = Vec::new();
        delta_encode(&values, &mut buf);
        assert_eq!(delta_decode(&buf, values.len()), Some(values));
    }

    #[test]
    fn test_delta_decode_rejects_bad_lengths() {
        let mut buf = Vec::new();
        delta_encode(&[3, 300], &mut buf);

        assert!(delta_decode(&buf, 3).is_none());
        assert!(delta_decode(&buf, 1).is_none()); // trailing bytes
        assert!(delta_decode(&buf[..buf.len() - 1], 2).is_none());
    }

    #[test]
    fn test_read_u32_at() {
        let mut buf = Vec::new();
        write_u32_le(&mut buf, 0xDEADBEEF).unwrap();
        buf.push(0);
        assert_eq!(read_u32_at(&buf, 0), Some(0xDEADBEEF));
        assert_eq!(read_u32_at(&buf, 2), None);
        assert_eq!(read_u32_at(&buf, usize::MAX), None);
    }
}
