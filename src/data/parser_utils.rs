//! Shared winnow-based parsing utilities used by the mdl, vtx, vvd and phy parsers.
//!
//! Every stream in the family is little-endian and addresses its records with
//! byte offsets, so the helpers here all take the whole stream plus an
//! absolute offset and bounds-check before handing a slice to winnow.

use winnow::Parser;
use winnow::binary::le_f32;
use winnow::combinator::repeat;
use winnow::error::{ContextError, ErrMode};
use winnow::token::take;

use crate::data::FileKind;
use crate::error::ErrorKind;

/// Common result type for winnow parsers.
pub type WResult<T> = Result<T, ErrMode<ContextError>>;

/// Resolve a relative pointer: base_offset + rel_value = absolute offset.
///
/// `None` when the pointer lands before the start of the stream.
pub fn resolve_relptr(base_offset: usize, rel_value: i64) -> Option<usize> {
    usize::try_from(base_offset as i64 + rel_value).ok()
}

/// Bounds-checked view of `need` bytes at `offset`.
pub fn slice_at(data: &[u8], file: FileKind, offset: usize, need: usize) -> Result<&[u8], ErrorKind> {
    offset
        .checked_add(need)
        .filter(|&end| end <= data.len())
        .map(|end| &data[offset..end])
        .ok_or(ErrorKind::OutOfBounds {
            file,
            offset,
            need,
            have: data.len(),
        })
}

fn decode_error(file: FileKind, offset: usize) -> impl Fn(ErrMode<ContextError>) -> ErrorKind {
    move |e| ErrorKind::Decode {
        file,
        offset,
        detail: e.to_string(),
    }
}

/// Decode one fixed-size record of `size` bytes at `offset`.
pub fn parse_at<T>(
    data: &[u8],
    file: FileKind,
    offset: usize,
    size: usize,
    mut parser: impl FnMut(&mut &[u8]) -> WResult<T>,
) -> Result<T, ErrorKind> {
    let input = &mut slice_at(data, file, offset, size)?;
    parser(input).map_err(decode_error(file, offset))
}

/// Decode `count` consecutive records of `size` bytes starting at `offset`.
///
/// Each record is returned with its own start offset, which is the base its
/// relative pointers resolve against.
pub fn parse_records<T>(
    data: &[u8],
    file: FileKind,
    offset: usize,
    count: usize,
    size: usize,
    mut parser: impl FnMut(&mut &[u8]) -> WResult<T>,
) -> Result<Vec<(usize, T)>, ErrorKind> {
    let need = count.saturating_mul(size);
    slice_at(data, file, offset, need)?;
    (0..count)
        .map(|i| {
            let at = offset + i * size;
            parse_at(data, file, at, size, &mut parser).map(|record| (at, record))
        })
        .collect()
}

/// Decode a packed array of `count` elements of `size` bytes each.
pub fn parse_array<'d, T, P>(
    data: &'d [u8],
    file: FileKind,
    offset: usize,
    count: usize,
    size: usize,
    parser: P,
) -> Result<Vec<T>, ErrorKind>
where
    P: Parser<&'d [u8], T, ErrMode<ContextError>>,
{
    let input = &mut slice_at(data, file, offset, count.saturating_mul(size))?;
    let values: Vec<T> = repeat(count, parser)
        .parse_next(input)
        .map_err(decode_error(file, offset))?;
    Ok(values)
}

/// Decode bytes as Latin-1, the code page the format family stores text in.
pub fn latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

/// Decode a fixed-width, NUL-padded text field.
pub fn fixed_str(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    latin1(&bytes[..end])
}

/// Read a NUL-terminated Latin-1 string starting at `offset`.
pub fn read_cstr(data: &[u8], file: FileKind, offset: usize) -> Result<String, ErrorKind> {
    let remaining = data.get(offset..).ok_or(ErrorKind::OutOfBounds {
        file,
        offset,
        need: 1,
        have: data.len(),
    })?;
    let end = remaining
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| ErrorKind::Decode {
            file,
            offset,
            detail: "string is not NUL-terminated".to_string(),
        })?;
    Ok(latin1(&remaining[..end]))
}

pub fn parse_vec3(input: &mut &[u8]) -> WResult<[f32; 3]> {
    let x = le_f32.parse_next(input)?;
    let y = le_f32.parse_next(input)?;
    let z = le_f32.parse_next(input)?;
    Ok([x, y, z])
}

pub fn parse_vec2(input: &mut &[u8]) -> WResult<[f32; 2]> {
    let x = le_f32.parse_next(input)?;
    let y = le_f32.parse_next(input)?;
    Ok([x, y])
}

/// Fixed-length byte array, e.g. magic tags or packed bone ids.
pub fn parse_bytes<const N: usize>(input: &mut &[u8]) -> WResult<[u8; N]> {
    let bytes: &[u8] = take(N).parse_next(input)?;
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

/// Skip `n` reserved or unused bytes.
pub fn skip(input: &mut &[u8], n: usize) -> WResult<()> {
    let _: &[u8] = take(n).parse_next(input)?;
    Ok(())
}
