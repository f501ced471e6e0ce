//! The object program and the formats it can be read from and written to.
//!
//! An [`ObjectProgram`] consists of a header, a sequence of [`TextRecord`]s, and an entry point.
//! [`TextRecordBuilder`] packs the code generated in pass 2 into text records.
//!
//! The [`ObjFileFormat`] trait describes an implementation of reading/writing object programs.
//! This module provides an implementation of the trait:
//! - [`RecordFormat`]: the standard H/T/E text record format

use std::fmt::Write;

use tracing::{event, Level};

/// The maximum number of bytes a text record can hold.
pub const MAX_TEXT_BYTES: usize = 30;

/// A contiguous run of object code, loaded at `addr`.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct TextRecord {
    /// The address the first byte is loaded at.
    pub addr: u16,
    /// The object code (at most [`MAX_TEXT_BYTES`] bytes).
    pub bytes: Vec<u8>,
}

/// An assembled object program.
///
/// Its [`Display`] implementation renders the program in [`RecordFormat`].
///
/// [`Display`]: std::fmt::Display
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct ObjectProgram {
    /// The program name (at most 6 characters are written).
    pub name: String,
    /// The starting address.
    pub start: u16,
    /// The length of the program in bytes.
    pub length: u16,
    /// The text records, in address order.
    pub text: Vec<TextRecord>,
    /// The address execution begins at.
    pub entry: u16,
}
impl std::fmt::Display for ObjectProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&RecordFormat::serialize(self))
    }
}

/// Packs consecutive object code into text records.
///
/// A record is opened at the address of the first code pushed after a flush,
/// and is flushed when the next piece of code would overflow [`MAX_TEXT_BYTES`].
#[derive(Debug, Default)]
pub struct TextRecordBuilder {
    current: Option<TextRecord>,
    done: Vec<TextRecord>,
}
impl TextRecordBuilder {
    /// Creates a new builder with no records.
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends the object code of a statement at the given address.
    pub fn push(&mut self, addr: u16, code: &[u8]) {
        if code.is_empty() { return; }

        if self.current.as_ref().is_some_and(|r| r.bytes.len() + code.len() > MAX_TEXT_BYTES) {
            self.flush();
        }
        let record = self.current.get_or_insert_with(|| TextRecord { addr, bytes: vec![] });
        record.bytes.extend_from_slice(code);

        // Only data larger than a whole record can get here.
        while self.current.as_ref().is_some_and(|r| r.bytes.len() > MAX_TEXT_BYTES) {
            let Some(mut record) = self.current.take() else { break };
            let rest = record.bytes.split_off(MAX_TEXT_BYTES);
            // Pass 1 guarantees the LC never wrapped, so neither does this.
            let rest_addr = record.addr.wrapping_add(MAX_TEXT_BYTES as u16);

            self.done.push(record);
            self.current.replace(TextRecord { addr: rest_addr, bytes: rest });
        }
    }

    /// Ends the current record (if there is one).
    pub fn flush(&mut self) {
        if let Some(record) = self.current.take() {
            event!(Level::DEBUG, "text record at {:04X} flushed with {} bytes", record.addr, record.bytes.len());
            self.done.push(record);
        }
    }

    /// Flushes the current record and returns every record built.
    pub fn finish(mut self) -> Vec<TextRecord> {
        self.flush();
        self.done
    }
}

/// A trait defining object program formats.
pub trait ObjFileFormat {
    /// Representation of the serialized format.
    ///
    /// For binary formats, `[u8]` should be used.
    /// For text-based formats, `str` should be used.
    type Stream: ToOwned + ?Sized;
    /// Serializes into the stream format.
    fn serialize(o: &ObjectProgram) -> <Self::Stream as ToOwned>::Owned;
    /// Deserializes from the stream format, returning `None`
    /// if an error occurred during deserialization.
    fn deserialize(i: &Self::Stream) -> Option<ObjectProgram>;
}

/// The H/T/E record format.
///
/// ```text
/// H<name, 6 chars><start, 6 hex><length, 6 hex>
/// T<address, 6 hex><byte count, 2 hex><code, hex>
/// ...
/// E<entry, 6 hex>
/// ```
/// Each record is written on its own line.
///
/// ```
/// use sicxe_asm::asm::encoding::{ObjFileFormat, RecordFormat};
///
/// let obj = RecordFormat::deserialize("HCOPY  00100000000C\nT001000090320030F2003000005\nE001000\n").unwrap();
/// assert_eq!(obj.name, "COPY");
/// assert_eq!(obj.text[0].bytes.len(), 9);
/// assert_eq!(RecordFormat::serialize(&obj), obj.to_string());
/// ```
pub struct RecordFormat;

impl ObjFileFormat for RecordFormat {
    type Stream = str;

    fn serialize(o: &ObjectProgram) -> <Self::Stream as ToOwned>::Owned {
        let mut buf = String::new();
        // Writing to a String never fails.
        let _ = writeln!(buf, "H{:<6.6}{:06X}{:06X}", o.name, o.start, o.length);
        for record in &o.text {
            let _ = writeln!(buf, "T{:06X}{:02X}{}", record.addr, record.bytes.len(), hex(&record.bytes));
        }
        let _ = writeln!(buf, "E{:06X}", o.entry);

        buf
    }

    fn deserialize(string: &Self::Stream) -> Option<ObjectProgram> {
        let mut lines = string.lines().filter(|l| !l.trim().is_empty());

        // Header
        let mut header = lines.next()?.strip_prefix('H')?;
        let name = take_str(&mut header, 6)?.trim_end().to_string();
        let start = take_addr(&mut header)?;
        let length = take_addr(&mut header)?;
        if !header.is_empty() { return None; }

        let mut text = vec![];
        for line in lines {
            if let Some(mut record) = line.strip_prefix('T') {
                let addr = take_addr(&mut record)?;
                let len = u8::from_str_radix(take_str(&mut record, 2)?, 16).ok()?;
                if record.len() != 2 * usize::from(len) || usize::from(len) > MAX_TEXT_BYTES { return None; }

                let bytes = unhex(record)?;
                text.push(TextRecord { addr, bytes });
            } else if let Some(mut end) = line.strip_prefix('E') {
                let entry = take_addr(&mut end)?;
                if !end.is_empty() { return None; }

                return Some(ObjectProgram { name, start, length, text, entry });
            } else {
                return None;
            }
        }

        // No End record
        None
    }
}

/// Renders bytes as uppercase hex, two digits per byte.
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(2 * bytes.len()), |mut s, b| {
        let _ = write!(s, "{b:02X}");
        s
    })
}
fn unhex(s: &str) -> Option<Vec<u8>> {
    if !s.is_ascii() || s.len() % 2 != 0 { return None; }
    (0..s.len()).step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}
fn take_str<'a>(data: &mut &'a str, n: usize) -> Option<&'a str> {
    if !data.is_char_boundary(n) { return None; }
    let (left, right) = data.split_at(n);
    *data = right;
    Some(left)
}
fn take_addr(data: &mut &str) -> Option<u16> {
    let field = take_str(data, 6)?;
    let value = u32::from_str_radix(field, 16).ok()?;
    u16::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ObjectProgram {
        ObjectProgram {
            name: "COPY".to_string(),
            start: 0x1000,
            length: 0x000C,
            text: vec![TextRecord { addr: 0x1000, bytes: vec![0x03, 0x20, 0x03, 0x0F, 0x20, 0x03, 0x00, 0x00, 0x05] }],
            entry: 0x1000,
        }
    }

    #[test]
    fn test_serialize() {
        assert_eq!(RecordFormat::serialize(&sample()), "\
HCOPY  00100000000C
T001000090320030F2003000005
E001000
");
        // names are cut to 6 characters
        let obj = ObjectProgram { name: "LONGPROGRAM".into(), text: vec![], ..sample() };
        assert_eq!(obj.to_string(), "HLONGPR00100000000C\nE001000\n");
    }

    #[test]
    fn test_deserialize() {
        let obj = sample();
        assert_eq!(RecordFormat::deserialize(&obj.to_string()), Some(obj));

        // no header
        assert_eq!(RecordFormat::deserialize("T00100003032003\nE001000\n"), None);
        // no end
        assert_eq!(RecordFormat::deserialize("HCOPY  00100000000C\nT00100003032003\n"), None);
        // length mismatch
        assert_eq!(RecordFormat::deserialize("HCOPY  00100000000C\nT00100004032003\nE001000\n"), None);
        // bad hex
        assert_eq!(RecordFormat::deserialize("HCOPY  00100000000C\nT0010000303200G\nE001000\n"), None);
        // address beyond 16 bits
        assert_eq!(RecordFormat::deserialize("HCOPY  01000000000C\nE001000\n"), None);
    }

    #[test]
    fn test_builder_flush_on_overflow() {
        let mut builder = TextRecordBuilder::new();
        for i in 0..10u16 {
            builder.push(0x100 + 3 * i, &[0x01, 0x02, 0x03]);
        }
        // the first record is exactly full here
        builder.push(0x11E, &[0xAA]);
        builder.push(0x11F, &[]);
        let records = builder.finish();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].addr, 0x100);
        assert_eq!(records[0].bytes.len(), MAX_TEXT_BYTES);
        assert_eq!(records[1], TextRecord { addr: 0x11E, bytes: vec![0xAA] });
    }

    #[test]
    fn test_builder_gap() {
        let mut builder = TextRecordBuilder::new();
        builder.push(0x0, &[0x4F, 0x00, 0x00]);
        builder.flush();
        builder.flush();
        builder.push(0x20, &[0x05]);
        let records = builder.finish();

        assert_eq!(records, [
            TextRecord { addr: 0x0, bytes: vec![0x4F, 0x00, 0x00] },
            TextRecord { addr: 0x20, bytes: vec![0x05] },
        ]);
    }

    #[test]
    fn test_builder_oversized() {
        let data: Vec<u8> = (0..70).collect();
        let mut builder = TextRecordBuilder::new();
        builder.push(0x200, &[0xFF]);
        builder.push(0x201, &data);
        let records = builder.finish();

        let layout: Vec<_> = records.iter().map(|r| (r.addr, r.bytes.len())).collect();
        assert_eq!(layout, [(0x200, 1), (0x201, 30), (0x21F, 30), (0x23D, 10)]);

        let joined: Vec<u8> = records.iter().skip(1).flat_map(|r| r.bytes.clone()).collect();
        assert_eq!(joined, data);
    }

    #[test]
    fn test_hex() {
        assert_eq!(hex(&[]), "");
        assert_eq!(hex(&[0x00, 0xAB, 0x0F]), "00AB0F");
        assert_eq!(unhex("00AB0f"), Some(vec![0x00, 0xAB, 0x0F]));
        assert_eq!(unhex("ABC"), None);
    }
}
