//! Intel HEX parser
//! Date: 17/10/2026
//!

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    Data,
    EndOfFile,
    ExtendedSegmentAddress,
    StartSegmentAddress,
    ExtendedLinearAddress,
    StartLinearAddress,
}

impl TryFrom<u8> for RecordType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(RecordType::Data),
            0x01 => Ok(RecordType::EndOfFile),
            0x02 => Ok(RecordType::ExtendedSegmentAddress),
            0x03 => Ok(RecordType::StartSegmentAddress),
            0x04 => Ok(RecordType::ExtendedLinearAddress),
            0x05 => Ok(RecordType::StartLinearAddress),
            other => Err(other),
        }
    }
}

/// A single decoded line, address still relative to the current base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub kind: RecordType,
    pub address: u16,
    pub data: Vec<u8>,
}

/// A data record resolved to its absolute address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBlock {
    pub address: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Line {line}: missing ':' start code")]
    MissingStartCode { line: usize },

    #[error("Line {line}: invalid hex digits")]
    InvalidDigits { line: usize },

    #[error("Line {line}: record length does not match its byte count")]
    LengthMismatch { line: usize },

    #[error("Line {line}: checksum mismatch (expected {expected:#04X}, found {found:#04X})")]
    ChecksumMismatch { line: usize, expected: u8, found: u8 },

    #[error("Line {line}: unknown record type {kind:#04X}")]
    UnknownRecordType { line: usize, kind: u8 },

    #[error("Line {line}: malformed address record")]
    MalformedAddress { line: usize },

    #[error("Data at {address:#X} does not fit into {capacity:#X} bytes")]
    OutOfBounds { address: u32, capacity: usize },
}

fn decode_bytes(hex: &str, line: usize) -> Result<Vec<u8>, Error> {
    if hex.len() % 2 != 0 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidDigits { line });
    }

    (0..hex.len())
        .step_by(2)
        .map(|i| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or(Error::InvalidDigits { line })
        })
        .collect()
}

/// Parse one line (1-based `line` used for error reporting)
pub fn parse_record(text: &str, line: usize) -> Result<Record, Error> {
    let body = text
        .trim()
        .strip_prefix(':')
        .ok_or(Error::MissingStartCode { line })?;

    let bytes = decode_bytes(body, line)?;

    // length, address (2), type, checksum
    if bytes.len() < 5 || bytes.len() != bytes[0] as usize + 5 {
        return Err(Error::LengthMismatch { line });
    }

    let (payload, checksum) = bytes.split_at(bytes.len() - 1);
    let expected = payload
        .iter()
        .fold(0u8, |acc, byte| acc.wrapping_add(*byte))
        .wrapping_neg();

    if expected != checksum[0] {
        return Err(Error::ChecksumMismatch {
            line,
            expected,
            found: checksum[0],
        });
    }

    let kind = RecordType::try_from(bytes[3])
        .map_err(|kind| Error::UnknownRecordType { line, kind })?;

    Ok(Record {
        kind,
        address: u16::from_be_bytes([bytes[1], bytes[2]]),
        data: payload[4..].to_vec(),
    })
}

/// Parse a whole HEX file into absolute data blocks.
/// Parsing stops at the first end-of-file record; blank lines are skipped.
pub fn read_ihex(text: &str) -> Result<Vec<DataBlock>, Error> {
    let mut base = 0u32;
    let mut blocks = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        if raw.trim().is_empty() {
            continue;
        }

        let record = parse_record(raw, line)?;

        match record.kind {
            RecordType::Data => blocks.push(DataBlock {
                address: base.wrapping_add(record.address as u32),
                data: record.data,
            }),
            RecordType::EndOfFile => break,
            RecordType::ExtendedSegmentAddress => {
                let [hi, lo] = address_bytes(&record.data, line)?;
                base = (u16::from_be_bytes([hi, lo]) as u32) << 4;
            }
            RecordType::ExtendedLinearAddress => {
                let [hi, lo] = address_bytes(&record.data, line)?;
                base = (u16::from_be_bytes([hi, lo]) as u32) << 16;
            }
            // entry points are meaningless for a flash image
            RecordType::StartSegmentAddress | RecordType::StartLinearAddress => {}
        }
    }

    Ok(blocks)
}

fn address_bytes(data: &[u8], line: usize) -> Result<[u8; 2], Error> {
    data.try_into().map_err(|_| Error::MalformedAddress { line })
}

/// Write every data record of `text` into `target`.
/// Returns the number of bytes spanned by the image (highest address + 1).
pub fn load_ihex(text: &str, target: &mut [u8]) -> Result<usize, Error> {
    let mut end = 0usize;

    for block in read_ihex(text)? {
        let start = block.address as usize;
        let stop = start + block.data.len();

        let Some(slot) = target.get_mut(start..stop) else {
            return Err(Error::OutOfBounds {
                address: block.address,
                capacity: target.len(),
            });
        };

        slot.copy_from_slice(&block.data);
        end = end.max(stop);
    }

    Ok(end)
}
