//! Offloading captured frames out of the PHY callback context.
//!
//! A [`BufferPool`] owns a fixed arena of [`CaptureBuffer`]s. The PHY event
//! path holds the [`CaptureProducer`] half: it takes a free buffer, copies the
//! frame in and queues it, without blocking and without allocating. When no
//! buffer is free the frame is dropped. A single task holds the
//! [`CaptureConsumer`] half: it waits for queued buffers, renders them as a
//! hex text line (see [`encode_line`]) and hands the buffer back to the pool.
//!
//! Every buffer goes through `Free -> Producer -> Queued -> Consumer -> Free`
//! and is owned by exactly one of them at any time.

mod buffer;
mod line;
mod pool;

pub use buffer::CaptureBuffer;
pub use line::{encode_line, LineFormat, MARKER_PLACEHOLDER};
pub use pool::{BufferPool, CaptureConsumer, CaptureProducer, CapturedFrame, SlotState};

use crate::config::{CAPTURE_BUFFER_LEN, CAPTURE_POOL_SIZE};

/// The pool used by the sniffer, sized by the build configuration.
pub type DefaultBufferPool = BufferPool<CAPTURE_POOL_SIZE, CAPTURE_BUFFER_LEN>;

/// What a capture buffer holds.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum FrameKind {
    /// Physical header bytes.
    Header,
    /// Payload bytes.
    #[default]
    Data,
    /// A header was seen but failed its CRC.
    HeaderCrcError,
    /// A payload was seen but failed its CRC.
    DataCrcError,
    /// End of a transaction that only carried a header.
    Flush,
    /// The payload following the last header was lost, the host must
    /// discard that header instead of forwarding it.
    Abort,
}

impl FrameKind {
    /// One character tag starting the emitted line.
    pub fn tag(&self) -> char {
        match self {
            Self::Header | Self::HeaderCrcError | Self::Abort => 'H',
            Self::Data | Self::DataCrcError | Self::Flush => 'P',
        }
    }

    /// Markers carry no payload, only a zero placeholder.
    pub fn is_marker(&self) -> bool {
        matches!(
            self,
            Self::HeaderCrcError | Self::DataCrcError | Self::Flush | Self::Abort
        )
    }
}
