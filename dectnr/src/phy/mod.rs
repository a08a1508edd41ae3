//! Contract with the DECT NR+ PHY collaborator.
//!
//! The PHY runs the air interface on its own and reports what it received
//! through the callbacks of [`PhyEvents`]. Those callbacks are delivered on a
//! latency sensitive path (an interrupt or a zero latency modem callback), so
//! implementations must return quickly and must never block.
//!
//! Submitting work to the PHY goes through [`PhyOperations`].

mod event;

pub use event::{ReceptionEvent, SequenceNumber};

use crate::{Error, Result};

/// Outcome of a PHY operation, as reported by the operation complete callback.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OperationStatus {
    Success,
    /// The operation failed with the given modem status code.
    Failed(i16),
}

impl OperationStatus {
    /// Create a status from the raw modem code, where 0 means success.
    pub fn from_code(code: i16) -> Self {
        match code {
            0 => Self::Success,
            code => Self::Failed(code),
        }
    }

    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Success => Ok(()),
            Self::Failed(code) => Err(Error::RadioOperationFailure(code)),
        }
    }
}

/// Event notifications delivered by the PHY.
///
/// One method per event kind. Every method has an empty default so a
/// component only implements the events it cares about. The PHY holds a
/// mutable handle to exactly one implementation and calls it sequentially.
pub trait PhyEvents {
    /// A physical header (PCC) was decoded.
    fn on_header_received(&mut self, rssi: f32, header: &[u8]) {
        let _ = (rssi, header);
    }

    /// A physical header (PCC) failed its CRC.
    fn on_header_crc_error(&mut self, rssi: f32) {
        let _ = rssi;
    }

    /// A payload (PDC) was decoded.
    fn on_data_received(&mut self, rssi: f32, data: &[u8]) {
        let _ = (rssi, data);
    }

    /// A payload (PDC) failed its CRC.
    fn on_data_crc_error(&mut self, rssi: f32) {
        let _ = rssi;
    }

    /// A scheduled operation finished. For a reception this is always the
    /// last callback of the transaction.
    fn on_operation_complete(&mut self, handle: u32, status: OperationStatus) {
        let _ = (handle, status);
    }
}

/// Operation submission towards the PHY.
pub trait PhyOperations {
    /// Schedule an immediate transmission of `payload`.
    ///
    /// An `Err` means the modem refused the request, the completion of an
    /// accepted request is reported through [`PhyEvents::on_operation_complete`].
    fn transmit(&mut self, handle: u32, payload: &[u8]) -> Result<()>;
}

/// Convert a modem `rssi_2` sample, expressed in steps of 0.5 dB, to dBm.
pub fn rssi_2_to_dbm(rssi_2: i16) -> f32 {
    rssi_2 as f32 / 2.0
}
