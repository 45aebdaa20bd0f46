//! Offset-addressed byte primitives shared by every codec.
//!
//! Readers take a whole buffer plus an absolute offset and either return the
//! value or [`Error::OutOfRange`]; nothing here reads past the end of a
//! slice. Writers come in two flavours: `write_*` patch a value in place,
//! `push_*` append to a growing output buffer.

use crate::{Error, Result};

/// Borrow `len` bytes at `offset`.
#[inline]
pub fn slice(buf: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| buf.get(offset..end))
        .ok_or(Error::OutOfRange {
            offset,
            width: len,
            len: buf.len(),
        })
}

/// Copy `N` bytes at `offset` into an array.
#[inline]
pub(crate) fn read_array<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N]> {
    let mut b = [0u8; N];
    b.copy_from_slice(slice(buf, offset, N)?);
    Ok(b)
}

#[inline]
fn array_mut<const N: usize>(buf: &mut [u8], offset: usize) -> Result<&mut [u8]> {
    let len = buf.len();
    offset
        .checked_add(N)
        .and_then(|end| buf.get_mut(offset..end))
        .ok_or(Error::OutOfRange {
            offset,
            width: N,
            len,
        })
}

/// Read one byte.
#[inline]
pub fn read_u8(buf: &[u8], offset: usize) -> Result<u8> {
    Ok(read_array::<1>(buf, offset)?[0])
}

/// Read a little-endian `u16`.
#[inline]
pub fn read_u16(buf: &[u8], offset: usize) -> Result<u16> {
    read_array(buf, offset).map(u16::from_le_bytes)
}

/// Read a little-endian `u32`.
#[inline]
pub fn read_u32(buf: &[u8], offset: usize) -> Result<u32> {
    read_array(buf, offset).map(u32::from_le_bytes)
}

/// Read a little-endian `i32`.
#[inline]
pub fn read_i32(buf: &[u8], offset: usize) -> Result<i32> {
    read_array(buf, offset).map(i32::from_le_bytes)
}

/// Read a little-endian `u32` that is used as an offset or count.
#[inline]
pub(crate) fn read_len(buf: &[u8], offset: usize) -> Result<usize> {
    read_u32(buf, offset).map(|v| v as usize)
}

/// Overwrite a little-endian `u16` at `offset`.
#[inline]
pub fn write_u16(buf: &mut [u8], offset: usize, value: u16) -> Result<()> {
    array_mut::<2>(buf, offset)?.copy_from_slice(&value.to_le_bytes());
    Ok(())
}

/// Overwrite a little-endian `u32` at `offset`.
#[inline]
pub fn write_u32(buf: &mut [u8], offset: usize, value: u32) -> Result<()> {
    array_mut::<4>(buf, offset)?.copy_from_slice(&value.to_le_bytes());
    Ok(())
}

/// Overwrite a little-endian `i32` at `offset`.
#[inline]
pub fn write_i32(buf: &mut [u8], offset: usize, value: i32) -> Result<()> {
    array_mut::<4>(buf, offset)?.copy_from_slice(&value.to_le_bytes());
    Ok(())
}

#[inline]
pub(crate) fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

#[inline]
pub(crate) fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Convert a computed size or offset into a `u32` field.
#[inline]
pub(crate) fn to_u32(field: &'static str, value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::FieldOverflow { field, value })
}

/// Convert a computed size or offset into a `u16` field.
#[inline]
pub(crate) fn to_u16(field: &'static str, value: usize) -> Result<u16> {
    u16::try_from(value).map_err(|_| Error::FieldOverflow { field, value })
}

/// Check the little-endian `u32` signature at `offset`.
///
/// Returns [`Error::BadSignature`] on mismatch.
#[inline]
pub fn signature(buf: &[u8], offset: usize, expected: u32, format: &'static str) -> Result<()> {
    let found = read_u32(buf, offset)?;
    if found != expected {
        return Err(Error::BadSignature {
            format,
            expected,
            found,
        });
    }
    Ok(())
}

/// Round `offset` up to the next multiple of `alignment`.
///
/// Works for any non-zero boundary, not only powers of two.
#[inline]
pub fn round_up(offset: usize, alignment: usize) -> usize {
    offset.div_ceil(alignment) * alignment
}

/// Number of bytes needed to move `offset` onto the next `boundary`.
///
/// Zero when `offset` is already aligned.
#[inline]
pub fn pad_length(offset: usize, boundary: usize) -> usize {
    round_up(offset, boundary) - offset
}

/// Append `fill` bytes until `out.len()` is a multiple of `boundary`.
#[inline]
pub(crate) fn pad_to(out: &mut Vec<u8>, boundary: usize, fill: u8) {
    let n = pad_length(out.len(), boundary);
    out.resize(out.len() + n, fill);
}

/// Length of the null-terminated run starting at `offset`, capped at `max`.
pub(crate) fn terminated_len(buf: &[u8], offset: usize, max: usize) -> usize {
    buf.get(offset..)
        .unwrap_or_default()
        .iter()
        .take(max)
        .take_while(|&&b| b != 0)
        .count()
}

/// Uppercase hex dump of `buf`. Pass a sub-slice to dump part of a buffer.
pub fn bytes_to_hex(buf: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    let mut s = String::with_capacity(buf.len() * 2);
    for &b in buf {
        s.push(DIGITS[(b >> 4) as usize] as char);
        s.push(DIGITS[(b & 0x0F) as usize] as char);
    }
    s
}

/// Parse a hex string back into bytes.
///
/// The input must be well-formed, even-length hex (either case). Other input
/// produces unspecified bytes and a trailing odd digit is ignored; neither
/// case panics.
pub fn hex_to_bytes(hex: &str) -> Vec<u8> {
    fn nibble(c: u8) -> u8 {
        match c {
            b'0'..=b'9' => c - b'0',
            b'a'..=b'f' => c - b'a' + 10,
            b'A'..=b'F' => c - b'A' + 10,
            _ => c & 0x0F,
        }
    }
    hex.as_bytes()
        .chunks_exact(2)
        .map(|p| (nibble(p[0]) << 4) | nibble(p[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use quickcheck_macros::quickcheck;
    use rstest::rstest;

    #[test]
    fn reads_little_endian() {
        let buf = [0x4E, 0x49, 0x44, 0x58, 0xFF, 0xFF, 0xFF, 0xFF];
        assert_eq!(read_u32(&buf, 0).unwrap(), 0x5844494E);
        assert_eq!(read_u16(&buf, 1).unwrap(), 0x4449);
        assert_eq!(read_i32(&buf, 4).unwrap(), -1);
    }

    #[test]
    fn read_past_end_is_out_of_range() {
        let buf = [0u8; 6];
        let err = read_u32(&buf, 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
        assert!(read_u16(&buf, 4).is_ok());
        assert!(read_u16(&buf, usize::MAX).is_err());
    }

    #[test]
    fn write_patches_in_place() {
        let mut buf = vec![0u8; 8];
        write_u32(&mut buf, 2, 0xDEADBEEF).unwrap();
        write_u16(&mut buf, 6, 0x1234).unwrap();
        assert_eq!(buf, [0, 0, 0xEF, 0xBE, 0xAD, 0xDE, 0x34, 0x12]);
        assert!(write_i32(&mut buf, 5, 1).is_err());
    }

    #[rstest]
    #[case(0, 4, 0)]
    #[case(1, 4, 4)]
    #[case(4, 4, 4)]
    #[case(17, 16, 32)]
    #[case(11, 10, 20)]
    fn round_up_cases(#[case] offset: usize, #[case] align: usize, #[case] expected: usize) {
        assert_eq!(round_up(offset, align), expected);
    }

    #[test]
    fn pad_length_is_zero_when_aligned() {
        assert_eq!(pad_length(8, 4), 0);
        assert_eq!(pad_length(9, 4), 3);
        assert_eq!(pad_length(0, 16), 0);
    }

    #[test]
    fn hex_is_uppercase() {
        assert_eq!(bytes_to_hex(&[0x1B, 0x43, 0x05, 0xAB]), "1B4305AB");
        assert_eq!(bytes_to_hex(&[0x00, 0xFF, 0x10][1..]), "FF10");
        assert_eq!(hex_to_bytes("1b43"), vec![0x1B, 0x43]);
    }

    #[test]
    fn signature_mismatch_reports_both_values() {
        let err = signature(&[1, 0, 0, 0], 0, 0x5844494E, "NIDX").unwrap_err();
        match err {
            Error::BadSignature {
                expected, found, ..
            } => {
                assert_eq!(expected, 0x5844494E);
                assert_eq!(found, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn terminated_len_stops_at_null_or_cap() {
        let buf = b"ab\0cdef";
        assert_eq!(terminated_len(buf, 0, 10), 2);
        assert_eq!(terminated_len(buf, 3, 10), 4);
        assert_eq!(terminated_len(buf, 3, 2), 2);
        assert_eq!(terminated_len(buf, 20, 2), 0);
    }

    #[quickcheck]
    fn hex_round_trips(bytes: Vec<u8>) -> bool {
        hex_to_bytes(&bytes_to_hex(&bytes)) == bytes
    }

    #[quickcheck]
    fn round_up_is_the_smallest_aligned_bound(offset: u32, align: u8) -> bool {
        let offset = offset as usize;
        let align = align as usize + 1;
        let r = round_up(offset, align);
        r % align == 0 && r >= offset && r - offset < align
    }
}
