//! Host side of the DECT NR+ sniffer.
//!
//! The device prints one line per captured frame (see
//! [`dectnr::capture::encode_line`]). [`LineDecoder`] turns those lines back
//! into packets made of the physical header followed by its payload, ready to
//! be forwarded to a packet analyser.
use colored::*;
use dectnr::capture::{LineFormat, MARKER_PLACEHOLDER};
use thiserror::Error;

/// Hex digits of the length field of a header line.
const HEADER_LEN_DIGITS: usize = 2;
/// Hex digits of the length field of a length prefixed data line.
const DATA_LEN_DIGITS: usize = 4;

#[derive(Debug, Error)]
pub enum Error {
    /// A line contains something else than hex digits after its tag.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    /// The length field does not match the bytes on the line.
    #[error("length field says {expected} bytes, line holds {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = core::result::Result<T, Error>;

/// What a single line amounted to.
#[derive(Debug, PartialEq, Eq)]
pub enum Decoded {
    /// The device waits for its network id and carrier, see [`config_reply`].
    ConfigRequest,
    /// A header was stored, its payload comes with the next data line.
    Pending,
    /// A complete packet: header bytes followed by payload bytes.
    Packet(Vec<u8>),
    /// Empty, unknown or marker line that produced nothing.
    Ignored,
}

/// Reassembles packets from sniffer lines.
///
/// A header line is kept until the next data line and both are joined into
/// one packet. Markers are handled as follows:
/// - `H0000` (header CRC error, or a header whose payload the device lost)
///   discards any stored header,
/// - `P0000` (payload CRC error, flush) turns a stored header into a header
///   only packet.
///
/// With [`LineFormat::Simple`] a two byte all zero payload can not be told
/// apart from a marker and is treated as one.
#[derive(Debug, Default)]
pub struct LineDecoder {
    format: LineFormat,
    header: Option<Vec<u8>>,
}

impl LineDecoder {
    pub fn new(format: LineFormat) -> Self {
        Self {
            format,
            header: None,
        }
    }

    pub fn decode(&mut self, line: &str) -> Result<Decoded> {
        let line = line.trim();
        let mut chars = line.chars();
        let Some(tag) = chars.next() else {
            return Ok(Decoded::Ignored);
        };
        let body = chars.as_str();

        match tag {
            'W' => Ok(Decoded::ConfigRequest),
            'H' if body == MARKER_PLACEHOLDER => {
                self.header = None;
                Ok(Decoded::Ignored)
            }
            'H' => {
                // A broken header must not be paired with the next payload
                self.header = None;
                self.header = Some(decode_length_prefixed(body, HEADER_LEN_DIGITS)?);
                Ok(Decoded::Pending)
            }
            'P' if body == MARKER_PLACEHOLDER => Ok(match self.header.take() {
                Some(header) => Decoded::Packet(header),
                None => Decoded::Ignored,
            }),
            'P' => {
                let header = self.header.take();
                let payload = match self.format {
                    LineFormat::Simple => hex::decode(body)?,
                    LineFormat::LengthPrefixed => decode_length_prefixed(body, DATA_LEN_DIGITS)?,
                };

                let mut packet = header.unwrap_or_default();
                packet.extend_from_slice(&payload);
                if packet.is_empty() {
                    Ok(Decoded::Ignored)
                } else {
                    Ok(Decoded::Packet(packet))
                }
            }
            _ => Ok(Decoded::Ignored),
        }
    }
}

/// Decode `<length><bytes>` where the length takes `digits` hex digits.
fn decode_length_prefixed(body: &str, digits: usize) -> Result<Vec<u8>> {
    let (Some(len), Some(bytes)) = (body.get(..digits), body.get(digits..)) else {
        return Err(Error::LengthMismatch {
            expected: digits / 2,
            actual: body.len() / 2,
        });
    };

    let expected = hex::decode(len)?
        .iter()
        .fold(0usize, |acc, b| (acc << 8) | *b as usize);
    let bytes = hex::decode(bytes)?;

    if bytes.len() != expected {
        return Err(Error::LengthMismatch {
            expected,
            actual: bytes.len(),
        });
    }

    Ok(bytes)
}

/// Answer to a [`Decoded::ConfigRequest`]: network id then carrier, both
/// little endian.
pub fn config_reply(network_id: u32, carrier: u16) -> [u8; 6] {
    let mut reply = [0u8; 6];
    reply[..4].copy_from_slice(&network_id.to_le_bytes());
    reply[4..].copy_from_slice(&carrier.to_le_bytes());
    reply
}

/// One line summary of a decoded line, for the terminal.
pub fn describe(decoded: &Decoded) -> String {
    match decoded {
        Decoded::ConfigRequest => format!("{}", "config request".yellow().bold()),
        Decoded::Pending => format!("{}", "header".dimmed()),
        Decoded::Packet(packet) => format!(
            "{} ({} bytes): {}",
            "packet".green().bold(),
            packet.len(),
            hex::encode(packet)
        ),
        Decoded::Ignored => format!("{}", "ignored".dimmed()),
    }
}
