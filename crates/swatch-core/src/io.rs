//! Byte and text helpers shared by the palette codecs.
//!
//! Every reader maps a premature end of input to
//! [`PaletteError::InvalidData`] so truncated files surface as malformed
//! palettes rather than I/O failures.

use crate::{PaletteError, Result};
use std::io::{self, ErrorKind, Read, Write};

fn truncated(err: io::Error) -> PaletteError {
    if err.kind() == ErrorKind::UnexpectedEof {
        PaletteError::invalid("unexpected end of data")
    } else {
        PaletteError::Io(err)
    }
}

pub fn read_array<const N: usize, R: Read + ?Sized>(reader: &mut R) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf).map_err(truncated)?;
    Ok(buf)
}

pub fn read_u16_be<R: Read + ?Sized>(reader: &mut R) -> Result<u16> {
    read_array(reader).map(u16::from_be_bytes)
}

pub fn read_u32_be<R: Read + ?Sized>(reader: &mut R) -> Result<u32> {
    read_array(reader).map(u32::from_be_bytes)
}

/// Read up to `N` bytes, returning `None` when the input ends first.
pub fn try_read_array<const N: usize, R: Read + ?Sized>(reader: &mut R) -> Result<Option<[u8; N]>> {
    let mut buf = [0u8; N];
    let mut filled = 0;
    while filled < N {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => return Ok(None),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(Some(buf))
}

/// Like [`read_u16_be`] but yields `None` at end of input.
pub fn try_read_u16_be<R: Read + ?Sized>(reader: &mut R) -> Result<Option<u16>> {
    Ok(try_read_array(reader)?.map(u16::from_be_bytes))
}

pub fn read_bytes<R: Read + ?Sized>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    (&mut *reader)
        .take(len as u64)
        .read_to_end(&mut buf)
        .map_err(PaletteError::Io)?;
    if buf.len() < len {
        return Err(PaletteError::invalid(format!(
            "expected {len} bytes, found {}",
            buf.len()
        )));
    }
    Ok(buf)
}

/// Read `units` UTF-16BE code units. Trailing NULs are dropped.
pub fn read_utf16_be<R: Read + ?Sized>(reader: &mut R, units: usize) -> Result<String> {
    let len = units
        .checked_mul(2)
        .ok_or_else(|| PaletteError::invalid("string length overflows"))?;
    let bytes = read_bytes(reader, len)?;
    let mut code_units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    while code_units.last() == Some(&0) {
        code_units.pop();
    }
    String::from_utf16(&code_units).map_err(|e| PaletteError::invalid(e.to_string()))
}

pub fn write_u16_be<W: Write + ?Sized>(writer: &mut W, value: u16) -> Result<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

pub fn write_u32_be<W: Write + ?Sized>(writer: &mut W, value: u32) -> Result<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

/// Write `text` as UTF-16BE without a terminator, returning the number of
/// code units written.
pub fn write_utf16_be<W: Write + ?Sized>(writer: &mut W, text: &str) -> Result<usize> {
    let mut units = 0;
    for unit in text.encode_utf16() {
        write_u16_be(writer, unit)?;
        units += 1;
    }
    Ok(units)
}

/// Read the remaining input as text. Invalid UTF-8 is replaced rather than
/// rejected and a leading byte order mark is removed.
pub fn read_text<R: Read + ?Sized>(reader: &mut R) -> Result<String> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.strip_prefix('\u{feff}').unwrap_or(&text).to_owned())
}

/// Split text into lines, accepting `\n` and `\r\n` endings.
pub fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(|line| line.trim_end_matches('\r'))
}

/// Up to `limit` bytes of the input as text, without a byte order mark.
/// `None` if the input cannot be read.
pub fn read_head<R: Read + ?Sized>(reader: &mut R, limit: u64) -> Option<String> {
    let mut bytes = Vec::new();
    (&mut *reader).take(limit).read_to_end(&mut bytes).ok()?;
    let text = String::from_utf8_lossy(&bytes);
    Some(text.strip_prefix('\u{feff}').unwrap_or(&text).to_owned())
}

/// The first line of the input, or `None` if it cannot be read.
///
/// At most `limit` bytes are consumed, which keeps probing cheap on large
/// binary files.
pub fn first_line<R: Read + ?Sized>(reader: &mut R, limit: u64) -> Option<String> {
    let head = read_head(reader, limit)?;
    lines(&head).next().map(str::to_owned)
}
