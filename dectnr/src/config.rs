//! Compile time configuration.
//!
//! Every constant can be overridden at build time through an environment
//! variable with the `DECTNR_` prefix, e.g. `DECTNR_CAPTURE_POOL_SIZE=4`.
//!
//! - `CAPTURE_POOL_SIZE`: number of capture buffers owned by the pool.
//! - `CAPTURE_BUFFER_LEN`: capacity in bytes of one capture buffer.
//! - `PROGRESS_INTERVAL`: the receiver logs a progress line every time the
//!   received sequence number is a multiple of this value.
//! - `TX_PAYLOAD_LEN`: size of the payload sent by the transmitter.
//! - `TX_INTERVAL_MS`: delay between two transmissions.
//! - `TX_MAX_COUNTER`: the transmitted counter wraps to 0 when reaching this.

include!(concat!(env!("OUT_DIR"), "/config.rs"));

#[cfg(test)]
#[path = "../build/value.rs"]
mod value;
