use crate::{Error, Result};

/// A single reception outcome reported by the PHY.
///
/// Produced once per callback, consumed once and never retained.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ReceptionEvent {
    HeaderOk { rssi: f32 },
    HeaderCrcError { rssi: f32 },
    DataOk { sequence_number: u32, rssi: f32 },
    DataCrcError { rssi: f32 },
}

impl ReceptionEvent {
    pub fn rssi(&self) -> f32 {
        match *self {
            Self::HeaderOk { rssi }
            | Self::HeaderCrcError { rssi }
            | Self::DataOk { rssi, .. }
            | Self::DataCrcError { rssi } => rssi,
        }
    }

    /// `Err(FrameCrcFailure)` for the CRC error events.
    pub fn check(&self) -> Result<()> {
        match self {
            Self::HeaderCrcError { .. } | Self::DataCrcError { .. } => Err(Error::FrameCrcFailure),
            Self::HeaderOk { .. } | Self::DataOk { .. } => Ok(()),
        }
    }
}

/// Application level counter carried in the first 4 payload bytes, big endian.
pub struct SequenceNumber;

impl SequenceNumber {
    pub const LEN: usize = 4;

    /// Read the counter from a payload, `None` if the payload is too short.
    pub fn from_payload(payload: &[u8]) -> Option<u32> {
        let bytes: [u8; Self::LEN] = payload.get(..Self::LEN)?.try_into().ok()?;
        Some(u32::from_be_bytes(bytes))
    }

    /// Write the counter in front of a payload. Returns `None` if the payload
    /// can not hold it.
    pub fn write(payload: &mut [u8], value: u32) -> Option<()> {
        payload
            .get_mut(..Self::LEN)?
            .copy_from_slice(&value.to_be_bytes());
        Some(())
    }
}
