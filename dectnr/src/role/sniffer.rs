use crate::capture::{CaptureProducer, FrameKind};
use crate::phy::{OperationStatus, PhyEvents};

/// What the host decoder holds from the last header line we queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostHeader {
    /// Nothing, the next payload line stands on its own.
    None,
    /// The header of the current transaction, waiting for its payload.
    Open,
    /// A header whose payload was lost. It must be aborted before any other
    /// payload line is queued, or the host pairs them.
    Stale,
}

/// Capturing end of the sniffer sample.
///
/// Every header, payload and CRC failure reported by the PHY becomes a
/// capture buffer. When an operation completes after a header that was not
/// followed by any payload (an acknowledgement, a zero length PDC), a flush
/// marker closes the transaction so the host does not pair that header with
/// the next payload.
///
/// Frames that find no free buffer are dropped without a trace on the event
/// path, [`Sniffer::dropped`] tells how many. A drop only ever removes
/// packets from the host's view:
/// - a payload whose header was dropped is dropped as well,
/// - a header whose payload was dropped is aborted instead of flushed.
pub struct Sniffer<'a, const N: usize, const CAP: usize> {
    producer: CaptureProducer<'a, N, CAP>,
    host_header: HostHeader,
    /// The header of the current transaction was dropped.
    header_dropped: bool,
}

impl<'a, const N: usize, const CAP: usize> Sniffer<'a, N, CAP> {
    pub fn new(producer: CaptureProducer<'a, N, CAP>) -> Self {
        Self {
            producer,
            host_header: HostHeader::None,
            header_dropped: false,
        }
    }

    /// Frames lost so far because the consumer did not keep up.
    pub fn dropped(&self) -> u32 {
        self.producer.pool().dropped()
    }

    /// Queue a header line, or a marker that resets the host's header.
    fn capture_header(&mut self, kind: FrameKind, bytes: &[u8]) {
        match self.producer.capture(kind, bytes) {
            Ok(()) if kind == FrameKind::Header => self.host_header = HostHeader::Open,
            Ok(()) => self.host_header = HostHeader::None,
            Err(_) => {
                if self.host_header == HostHeader::Open {
                    self.host_header = HostHeader::Stale;
                }
            }
        }
    }

    /// Queue a payload line, which the host pairs with its header.
    fn capture_payload(&mut self, kind: FrameKind, bytes: &[u8]) {
        if self.header_dropped || self.host_header == HostHeader::Stale {
            self.producer.discard();
            return;
        }

        match self.producer.capture(kind, bytes) {
            Ok(()) => self.host_header = HostHeader::None,
            Err(_) => {
                if self.host_header == HostHeader::Open {
                    self.host_header = HostHeader::Stale;
                }
            }
        }
    }
}

impl<const N: usize, const CAP: usize> PhyEvents for Sniffer<'_, N, CAP> {
    fn on_header_received(&mut self, rssi: f32, header: &[u8]) {
        debug!("PCC, rssi {}, {} bytes", rssi, header.len());
        self.capture_header(FrameKind::Header, header);
        self.header_dropped = self.host_header != HostHeader::Open;
    }

    fn on_header_crc_error(&mut self, rssi: f32) {
        debug!("PCC CRC error, rssi {}", rssi);
        self.capture_header(FrameKind::HeaderCrcError, &[]);
        // No payload follows a broken header
        self.header_dropped = true;
    }

    fn on_data_received(&mut self, rssi: f32, data: &[u8]) {
        debug!("PDC, rssi {}, {} bytes", rssi, data.len());
        self.capture_payload(FrameKind::Data, data);
    }

    fn on_data_crc_error(&mut self, rssi: f32) {
        debug!("PDC CRC error, rssi {}", rssi);
        self.capture_payload(FrameKind::DataCrcError, &[]);
    }

    fn on_operation_complete(&mut self, handle: u32, status: OperationStatus) {
        if let Err(e) = status.into_result() {
            error!("Operation {} failed: {:?}", handle, e);
        }

        match self.host_header {
            HostHeader::Open => self.capture_payload(FrameKind::Flush, &[]),
            HostHeader::Stale => self.capture_header(FrameKind::Abort, &[]),
            HostHeader::None => (),
        }
        self.header_dropped = false;
    }
}

#[cfg(test)]
mod tests {
    use std::string::String;
    use std::vec::Vec;

    use super::*;
    use crate::capture::{BufferPool, LineFormat};

    const HEADER: [u8; 5] = [0x10, 0x0a, 0x01, 0x01, 0x1b];

    #[test]
    fn transaction_is_emitted_in_order() {
        let mut pool = BufferPool::<10, 64>::new();
        let (producer, mut consumer) = pool.split();
        let mut sniffer = Sniffer::new(producer);

        sniffer.on_header_received(-50.0, &HEADER);
        sniffer.on_data_received(-50.0, &[0x00, 0x00, 0x00, 0x01, 0x20]);
        sniffer.on_operation_complete(31400, OperationStatus::Success);

        let mut out = String::new();
        consumer.drain(LineFormat::Simple, &mut out);
        assert_eq!(out, "H05100A01011B\nP0000000120\n");
    }

    #[test]
    fn header_only_transaction_is_flushed() {
        let mut pool = BufferPool::<10, 64>::new();
        let (producer, mut consumer) = pool.split();
        let mut sniffer = Sniffer::new(producer);

        sniffer.on_header_received(-50.0, &HEADER);
        sniffer.on_operation_complete(31400, OperationStatus::Success);
        // Nothing pending anymore, a second completion adds nothing
        sniffer.on_operation_complete(31401, OperationStatus::Success);

        let mut out = String::new();
        consumer.drain(LineFormat::Simple, &mut out);
        assert_eq!(out.lines().collect::<Vec<_>>(), ["H05100A01011B", "P0000"]);
    }

    #[test]
    fn crc_errors_become_markers() {
        let mut pool = BufferPool::<10, 64>::new();
        let (producer, mut consumer) = pool.split();
        let mut sniffer = Sniffer::new(producer);

        sniffer.on_header_crc_error(-90.0);
        sniffer.on_operation_complete(1, OperationStatus::Success);
        sniffer.on_header_received(-50.0, &HEADER);
        sniffer.on_data_crc_error(-88.0);
        sniffer.on_operation_complete(2, OperationStatus::Failed(-1));

        let mut out = String::new();
        consumer.drain(LineFormat::LengthPrefixed, &mut out);
        assert_eq!(
            out.lines().collect::<Vec<_>>(),
            ["H0000", "H05100A01011B", "P0000"]
        );
    }

    #[test]
    fn overload_drops_without_blocking() {
        let mut pool = BufferPool::<2, 64>::new();
        let (producer, mut consumer) = pool.split();
        let mut sniffer = Sniffer::new(producer);

        sniffer.on_header_received(-50.0, &HEADER);
        sniffer.on_data_received(-50.0, &[1, 2, 3, 4]);
        // Pool is full, the header is dropped and no flush follows.
        sniffer.on_header_received(-50.0, &HEADER);
        sniffer.on_operation_complete(3, OperationStatus::Success);
        assert_eq!(sniffer.dropped(), 1);

        let mut out = String::new();
        assert_eq!(consumer.drain(LineFormat::Simple, &mut out), 2);
        sniffer.on_data_received(-50.0, &[5]);
        assert_eq!(consumer.drain(LineFormat::Simple, &mut out), 1);
        assert_eq!(
            out.lines().collect::<Vec<_>>(),
            ["H05100A01011B", "P01020304", "P05"]
        );
    }

    #[test]
    fn lost_payload_aborts_its_header() {
        let mut pool = BufferPool::<1, 64>::new();
        let (producer, mut consumer) = pool.split();
        let mut sniffer = Sniffer::new(producer);
        let mut out = String::new();

        sniffer.on_header_received(-50.0, &[0xaa]);
        sniffer.on_data_received(-50.0, &[0, 0, 0, 1]);
        consumer.drain(LineFormat::Simple, &mut out);
        sniffer.on_operation_complete(1, OperationStatus::Success);
        consumer.drain(LineFormat::Simple, &mut out);

        assert_eq!(out.lines().collect::<Vec<_>>(), ["H01AA", "H0000"]);
        assert_eq!(sniffer.dropped(), 1);
    }

    #[test]
    fn payload_of_a_dropped_header_is_dropped() {
        let mut pool = BufferPool::<1, 64>::new();
        let (producer, mut consumer) = pool.split();
        let mut sniffer = Sniffer::new(producer);
        let mut out = String::new();

        // Fills the pool, the next header finds no buffer
        sniffer.on_data_received(-50.0, &[0, 0, 0, 1]);
        sniffer.on_header_received(-50.0, &[0xbb]);
        consumer.drain(LineFormat::Simple, &mut out);
        sniffer.on_data_received(-50.0, &[0, 0, 0, 2]);
        sniffer.on_data_crc_error(-50.0);
        sniffer.on_operation_complete(2, OperationStatus::Success);
        assert_eq!(sniffer.dropped(), 3);

        // The next transaction is captured again
        sniffer.on_data_received(-50.0, &[0, 0, 0, 3]);
        consumer.drain(LineFormat::Simple, &mut out);
        assert_eq!(out.lines().collect::<Vec<_>>(), ["P00000001", "P00000003"]);
    }

    #[test]
    fn stale_header_is_aborted_once_there_is_room() {
        let mut pool = BufferPool::<1, 64>::new();
        let (producer, mut consumer) = pool.split();
        let mut sniffer = Sniffer::new(producer);
        let mut out = String::new();

        sniffer.on_header_received(-50.0, &[0xaa]);
        // Neither the payload nor the abort find a buffer
        sniffer.on_data_received(-50.0, &[0, 0, 0, 1]);
        sniffer.on_operation_complete(1, OperationStatus::Success);
        consumer.drain(LineFormat::Simple, &mut out);

        // Without a header line of its own this payload would be paired with
        // the stale header, so it is dropped and the abort is retried.
        sniffer.on_data_received(-50.0, &[0, 0, 0, 2]);
        sniffer.on_operation_complete(2, OperationStatus::Success);
        consumer.drain(LineFormat::Simple, &mut out);

        sniffer.on_header_received(-50.0, &[0xcc]);
        consumer.drain(LineFormat::Simple, &mut out);
        sniffer.on_data_received(-50.0, &[0, 0, 0, 3]);
        consumer.drain(LineFormat::Simple, &mut out);

        assert_eq!(
            out.lines().collect::<Vec<_>>(),
            ["H01AA", "H0000", "H01CC", "P00000003"]
        );
        assert_eq!(sniffer.dropped(), 3);
    }
}
