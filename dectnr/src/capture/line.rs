//! Text rendering of captured frames.
//!
//! One line per frame, upper case hex:
//!
//! | Frame | Line |
//! |---|---|
//! | header | `H` + length (2 digits) + bytes |
//! | data, [`LineFormat::Simple`] | `P` + bytes |
//! | data, [`LineFormat::LengthPrefixed`] | `P` + length (4 digits) + bytes |
//! | header CRC error, abort | `H0000` |
//! | data CRC error, flush | `P0000` |
//!
//! Markers use a fixed zero placeholder so a host tool strips the prefix of
//! every marker line the same way.

use core::fmt::{self, Write};

use super::FrameKind;

/// Placeholder emitted after the tag of a marker line.
pub const MARKER_PLACEHOLDER: &str = "0000";

/// How data frames are rendered.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum LineFormat {
    /// Data bytes follow the tag directly.
    #[default]
    Simple,
    /// Data bytes are preceded by a 4 digit length field.
    LengthPrefixed,
}

/// Render one frame as a line, without the line terminator.
///
/// Header lines carry at most 255 bytes and length prefixed data lines at
/// most 65535, matching the width of their length field.
pub fn encode_line<W: Write>(
    kind: FrameKind,
    payload: &[u8],
    format: LineFormat,
    w: &mut W,
) -> fmt::Result {
    w.write_char(kind.tag())?;
    if kind.is_marker() {
        return w.write_str(MARKER_PLACEHOLDER);
    }

    let payload = match kind {
        FrameKind::Header => {
            let payload = &payload[..payload.len().min(u8::MAX as usize)];
            write!(w, "{:02X}", payload.len())?;
            payload
        }
        FrameKind::Data => match format {
            LineFormat::Simple => payload,
            LineFormat::LengthPrefixed => {
                let payload = &payload[..payload.len().min(u16::MAX as usize)];
                write!(w, "{:04X}", payload.len())?;
                payload
            }
        },
        _ => &[],
    };

    for byte in payload {
        write!(w, "{byte:02X}")?;
    }

    Ok(())
}
