use crate::config::PROGRESS_INTERVAL;
use crate::phy::{OperationStatus, PhyEvents, ReceptionEvent, SequenceNumber};
use crate::stats::{LinkQualityEstimator, LinkStats};

/// Receiving end of the counter sample.
///
/// Feeds every PHY event to a [`LinkQualityEstimator`] and logs progress
/// along the way. Print [`Receiver::stats`] at the end of the run for the
/// report.
#[derive(Debug, Default)]
pub struct Receiver {
    estimator: LinkQualityEstimator,
}

impl Receiver {
    pub const fn new() -> Self {
        Self {
            estimator: LinkQualityEstimator::new(),
        }
    }

    pub fn stats(&self) -> LinkStats {
        self.estimator.current_stats()
    }

    pub fn reset(&mut self) {
        self.estimator.reset();
    }

    fn record_failure(&mut self, channel: &str, event: ReceptionEvent) {
        self.estimator.record(event);
        if let Err(e) = event.check() {
            info!(
                "{} {:?}, rssi {}, crc errors {}",
                channel,
                e,
                event.rssi(),
                self.estimator.current_stats().crc_error_count
            );
        }
    }
}

impl PhyEvents for Receiver {
    fn on_header_received(&mut self, rssi: f32, _header: &[u8]) {
        debug!("PCC received, rssi {}", rssi);
        self.estimator.record(ReceptionEvent::HeaderOk { rssi });
    }

    fn on_header_crc_error(&mut self, rssi: f32) {
        self.record_failure("PCC", ReceptionEvent::HeaderCrcError { rssi });
    }

    fn on_data_received(&mut self, rssi: f32, data: &[u8]) {
        let Some(sequence_number) = SequenceNumber::from_payload(data) else {
            warn!("PDC of {} bytes carries no counter", data.len());
            return;
        };

        self.estimator.record(ReceptionEvent::DataOk {
            sequence_number,
            rssi,
        });

        if PROGRESS_INTERVAL != 0 && sequence_number % PROGRESS_INTERVAL == 0 {
            let stats = self.estimator.current_stats();
            info!(
                "Received data {}, rssi {}, received {}, missed {}",
                sequence_number, rssi, stats.received_ok, stats.missing_count
            );
        }
    }

    fn on_data_crc_error(&mut self, rssi: f32) {
        self.record_failure("PDC", ReceptionEvent::DataCrcError { rssi });
    }

    fn on_operation_complete(&mut self, handle: u32, status: OperationStatus) {
        match status.into_result() {
            Ok(()) => {
                debug!("Operation {} complete", handle);
            }
            Err(e) => {
                error!("Operation {} failed: {:?}", handle, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(value: u32) -> [u8; 6] {
        let b = value.to_be_bytes();
        [b[0], b[1], b[2], b[3], 0x20, 0x20]
    }

    #[test]
    fn counts_a_transaction_stream() {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut receiver = Receiver::new();
        for value in [1386, 1387, 1389, 1390] {
            receiver.on_header_received(-50.0, &[0x10, 0x0a, 0x01, 0x01, 0x1b]);
            receiver.on_data_received(-50.0, &counter(value));
            receiver.on_operation_complete(31400, OperationStatus::Success);
        }
        receiver.on_header_crc_error(-52.0);
        receiver.on_operation_complete(31401, OperationStatus::Failed(-1));

        let stats = receiver.stats();
        assert_eq!(stats.received_ok, 4);
        assert_eq!(stats.missing_count, 1);
        assert_eq!(stats.crc_error_count, 1);
        assert_eq!(stats.header_ok_count, 4);
        assert_eq!(stats.rssi_sample_count, 5);
        assert!((stats.success_rate() - 4.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn short_payload_is_ignored() {
        let mut receiver = Receiver::new();
        receiver.on_data_received(-50.0, &[0x01, 0x02]);
        assert_eq!(receiver.stats(), LinkStats::new());
    }

    #[test]
    fn reset_starts_over() {
        let mut receiver = Receiver::new();
        receiver.on_data_received(-50.0, &counter(10));
        receiver.on_data_crc_error(-50.0);
        receiver.reset();
        assert_eq!(receiver.stats(), LinkStats::new());
    }
}
