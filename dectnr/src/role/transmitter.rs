use embedded_hal_async::delay::DelayNs;

use crate::config::{PROGRESS_INTERVAL, TX_INTERVAL_MS, TX_MAX_COUNTER, TX_PAYLOAD_LEN};
use crate::phy::{PhyOperations, SequenceNumber};
use crate::Result;

/// Highest operation handle used for transmissions, handles cycle in
/// `1..=TX_MAX_HANDLE`.
pub const TX_MAX_HANDLE: u32 = 30_000;

/// Payload of the counter sample: the counter, big endian, padded with
/// spaces up to `LEN` bytes.
#[derive(Debug, PartialEq, Clone)]
pub struct CounterPayload<const LEN: usize> {
    bytes: [u8; LEN],
}

impl<const LEN: usize> CounterPayload<LEN> {
    pub const PADDING: u8 = 0x20;

    const FITS_COUNTER: () = assert!(
        LEN >= SequenceNumber::LEN,
        "payload too short for the counter"
    );

    pub fn new(counter: u32) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::FITS_COUNTER;

        let mut bytes = [Self::PADDING; LEN];
        // Always fits, checked at compile time above
        let _ = SequenceNumber::write(&mut bytes, counter);
        Self { bytes }
    }

    pub fn counter(&self) -> u32 {
        SequenceNumber::from_payload(&self.bytes).unwrap_or_default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Sending end of the counter sample.
///
/// Every [`TX_INTERVAL_MS`] a [`CounterPayload`] carrying the next counter
/// value is submitted to the PHY. The counter starts at 1 and wraps to 0 when
/// it reaches [`TX_MAX_COUNTER`]. It advances even when a submission fails,
/// so the receiver accounts the failure as a missing packet.
pub struct Transmitter<P, D> {
    phy: P,
    delay: D,
    counter: u32,
    handle: u32,
}

impl<P: PhyOperations, D: DelayNs> Transmitter<P, D> {
    pub fn new(phy: P, delay: D) -> Self {
        Self {
            phy,
            delay,
            counter: 1,
            handle: 1,
        }
    }

    /// Start counting from `counter` instead of 1.
    pub fn with_counter(mut self, counter: u32) -> Self {
        self.counter = counter % TX_MAX_COUNTER;
        self
    }

    /// The value the next transmission will carry.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn phy(&self) -> &P {
        &self.phy
    }

    /// Submit the current counter right away and advance it. Returns the
    /// value that was submitted.
    pub fn transmit_next(&mut self) -> Result<u32> {
        let counter = self.counter;
        let payload = CounterPayload::<TX_PAYLOAD_LEN>::new(counter);
        let result = self.phy.transmit(self.handle, payload.as_bytes());

        self.handle = if self.handle >= TX_MAX_HANDLE {
            1
        } else {
            self.handle + 1
        };

        self.counter += 1;
        if self.counter >= TX_MAX_COUNTER {
            self.counter = 0;
            info!("Sent counter looped");
        }

        result.map(|_| counter)
    }

    /// Wait one interval, then transmit.
    async fn step(&mut self) {
        self.delay.delay_ms(TX_INTERVAL_MS).await;
        match self.transmit_next() {
            Ok(counter) if PROGRESS_INTERVAL != 0 && counter % PROGRESS_INTERVAL == 0 => {
                info!("TX {}", counter);
            }
            Ok(_) => (),
            Err(e) => {
                error!("TX failed: {:?}", e);
            }
        }
    }

    /// Transmit `count` counters and return.
    pub async fn run_for(&mut self, count: u32) {
        for _ in 0..count {
            self.step().await;
        }
    }

    /// Transmit forever. Should be run in its own task.
    pub async fn run(&mut self) -> ! {
        loop {
            self.step().await;
        }
    }
}
