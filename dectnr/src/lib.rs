//! Reception statistics and frame capture for DECT NR+ PHY samples.
//!
//! The PHY itself is an external collaborator that reports what it sees
//! through the [`phy::PhyEvents`] trait. This crate provides what sits on the
//! other side of those callbacks:
//!
//! - [`stats`]: a streaming link quality estimator turning reception events
//!   into loss, CRC and RSSI statistics.
//! - [`capture`]: a fixed pool of capture buffers and a single consumer queue
//!   that move frames out of the callback context and render them as hex
//!   lines for a host side tool.
//! - [`role`]: the receiver, sniffer and transmitter samples built on top of
//!   the two components above.
#![no_std]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[macro_use]
pub(crate) mod utils;

pub mod capture;
pub mod config;
pub mod phy;
pub mod role;
pub mod stats;
pub mod sync;

/// Errors surfaced by the radio samples.
///
/// None of these is fatal: radio failures are logged and left to the caller,
/// CRC failures are counted and capture exhaustion drops a single frame.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Error {
    /// The PHY reported a failed operation, with its status code.
    RadioOperationFailure(i16),
    /// A header or payload was received with an invalid CRC.
    FrameCrcFailure,
    /// No capture buffer was free, the frame was dropped.
    CaptureBufferExhausted,
    /// The output sink refused a rendered line.
    SinkRejected,
}

/// A type alias for `Result<T, dectnr::Error>`.
pub type Result<T> = core::result::Result<T, Error>;
