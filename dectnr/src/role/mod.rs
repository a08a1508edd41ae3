//! The radio samples, wired on top of the PHY contract.
//!
//! - [`Receiver`]: counts a counter stream and reports link statistics.
//! - [`Sniffer`]: forwards every header and payload seen to a capture pool.
//! - [`Transmitter`]: broadcasts an increasing counter.

pub mod receiver;
pub mod sniffer;
pub mod transmitter;

pub use receiver::Receiver;
pub use sniffer::Sniffer;
pub use transmitter::{CounterPayload, Transmitter};
