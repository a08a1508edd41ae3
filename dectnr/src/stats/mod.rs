//! Streaming link quality estimation.
//!
//! [`LinkQualityEstimator`] folds [`ReceptionEvent`]s into [`LinkStats`]:
//! packets received, packets inferred missing from gaps in the transmitted
//! counter, CRC failures and a running RSSI mean.
//!
//! The estimator is a plain accumulator owned by whoever receives the PHY
//! events. It has no interior mutability: if events ever come from more than
//! one context, calls to [`LinkQualityEstimator::record`] must be serialized
//! by the caller, the running mean is not commutative under interleaving.

mod report;

pub use report::LinkStats;

use crate::phy::{PhyEvents, ReceptionEvent, SequenceNumber};

/// Accumulates reception events into link statistics.
#[derive(Debug, Default, Clone)]
pub struct LinkQualityEstimator {
    stats: LinkStats,
}

impl LinkQualityEstimator {
    pub const fn new() -> Self {
        Self {
            stats: LinkStats::new(),
        }
    }

    /// Fold one event into the statistics. Never fails: radio errors are
    /// events themselves.
    pub fn record(&mut self, event: ReceptionEvent) {
        let stats = &mut self.stats;
        match event {
            ReceptionEvent::HeaderOk { .. } => {
                // A header is only a precursor of the data, counting it for
                // loss as well would count a lost packet twice.
                stats.header_ok_count = stats.header_ok_count.saturating_add(1);
            }
            ReceptionEvent::HeaderCrcError { rssi } | ReceptionEvent::DataCrcError { rssi } => {
                stats.crc_error_count = stats.crc_error_count.saturating_add(1);
                stats.add_rssi_sample(rssi);
            }
            ReceptionEvent::DataOk {
                sequence_number,
                rssi,
            } => {
                stats.received_ok = stats.received_ok.saturating_add(1);
                stats.add_rssi_sample(rssi);

                if let Some(previous) = stats.previous_sequence {
                    let gap = sequence_gap(previous, sequence_number);
                    stats.missing_count = stats.missing_count.saturating_add(gap);
                }
                stats.previous_sequence = Some(sequence_number);
            }
        }
    }

    /// Snapshot of the statistics gathered so far.
    pub fn current_stats(&self) -> LinkStats {
        self.stats
    }

    /// Forget everything, as if no event was ever recorded.
    pub fn reset(&mut self) {
        self.stats = LinkStats::new();
    }
}

/// Number of packets missing between two consecutively received counters.
///
/// A repeated or decreasing counter (duplicate, reordering, sender restart
/// or wrap) contributes nothing, missing packets are never subtracted.
fn sequence_gap(previous: u32, current: u32) -> u32 {
    let gap = current as i64 - previous as i64 - 1;
    if gap > 0 {
        gap as u32
    } else {
        0
    }
}

/// The estimator can be handed to the PHY directly.
///
/// Data frames too short to carry a counter are ignored.
impl PhyEvents for LinkQualityEstimator {
    fn on_header_received(&mut self, rssi: f32, _header: &[u8]) {
        self.record(ReceptionEvent::HeaderOk { rssi });
    }

    fn on_header_crc_error(&mut self, rssi: f32) {
        self.record(ReceptionEvent::HeaderCrcError { rssi });
    }

    fn on_data_received(&mut self, rssi: f32, data: &[u8]) {
        if let Some(sequence_number) = SequenceNumber::from_payload(data) {
            self.record(ReceptionEvent::DataOk {
                sequence_number,
                rssi,
            });
        }
    }

    fn on_data_crc_error(&mut self, rssi: f32) {
        self.record(ReceptionEvent::DataCrcError { rssi });
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};

    use super::*;

    fn data(sequence_number: u32) -> ReceptionEvent {
        ReceptionEvent::DataOk {
            sequence_number,
            rssi: -50.0,
        }
    }

    fn record_all(events: impl IntoIterator<Item = ReceptionEvent>) -> LinkStats {
        let mut estimator = LinkQualityEstimator::new();
        for event in events {
            estimator.record(event);
        }
        estimator.current_stats()
    }

    #[test]
    fn consecutive_counters_miss_nothing() {
        let stats = record_all((1..=500).map(data));
        assert_eq!(stats.received_ok, 500);
        assert_eq!(stats.missing_count, 0);
        assert_eq!(stats.previous_sequence, Some(500));
    }

    #[test]
    fn first_packet_never_counts_as_gap() {
        let stats = record_all([data(20314)]);
        assert_eq!(stats.missing_count, 0);
        assert_eq!(stats.previous_sequence, Some(20314));
    }

    #[test]
    fn gap_adds_missing_packets() {
        let stats = record_all([data(5), data(6), data(9)]);
        assert_eq!(stats.missing_count, 2);
        assert_eq!(stats.received_ok, 3);
    }

    #[test]
    fn repeated_counter_is_not_subtracted() {
        let stats = record_all([data(5), data(6), data(9), data(9)]);
        assert_eq!(stats.missing_count, 2);

        let stats = record_all([data(5), data(6), data(6)]);
        assert_eq!(stats.missing_count, 0);
        assert_eq!(stats.previous_sequence, Some(6));
    }

    #[test]
    fn decreasing_counter_is_not_subtracted() {
        let stats = record_all([data(10), data(13), data(4), data(5)]);
        assert_eq!(stats.missing_count, 2);
        assert_eq!(stats.previous_sequence, Some(5));
    }

    #[test]
    fn counter_wrap_is_not_a_gap() {
        let stats = record_all([data(0x7fff_fffe), data(0), data(1)]);
        assert_eq!(stats.missing_count, 0);
    }

    #[test]
    fn crc_errors_count_for_rssi_but_not_for_gaps() {
        let stats = record_all([
            data(1),
            ReceptionEvent::DataCrcError { rssi: -60.0 },
            ReceptionEvent::HeaderCrcError { rssi: -70.0 },
            data(2),
        ]);
        assert_eq!(stats.crc_error_count, 2);
        assert_eq!(stats.received_ok, 2);
        assert_eq!(stats.missing_count, 0);
        assert_eq!(stats.rssi_sample_count, 4);
        assert!((stats.rssi_running_mean - -57.5).abs() < 1e-4);
    }

    #[test]
    fn headers_are_diagnostics_only() {
        let stats = record_all([
            ReceptionEvent::HeaderOk { rssi: -10.0 },
            ReceptionEvent::HeaderOk { rssi: -10.0 },
        ]);
        assert_eq!(stats.header_ok_count, 2);
        assert_eq!(stats.received_ok, 0);
        assert_eq!(stats.rssi_sample_count, 0);
        assert_eq!(stats.rssi_running_mean, 0.0);
        assert_eq!(stats.success_rate(), 1.0);
    }

    #[test]
    fn rssi_running_mean() {
        let stats = record_all([
            ReceptionEvent::DataOk {
                sequence_number: 1,
                rssi: -50.0,
            },
            ReceptionEvent::DataOk {
                sequence_number: 2,
                rssi: -52.0,
            },
            ReceptionEvent::DataOk {
                sequence_number: 3,
                rssi: -50.0,
            },
        ]);
        assert_eq!(stats.rssi_sample_count, 3);
        assert!((stats.rssi_running_mean - -50.667).abs() < 1e-3);
    }

    #[test]
    fn reset_forgets_everything() {
        let mut estimator = LinkQualityEstimator::new();
        estimator.record(data(1));
        estimator.record(data(5));
        estimator.record(ReceptionEvent::DataCrcError { rssi: -50.0 });
        estimator.reset();

        assert_eq!(estimator.current_stats(), LinkStats::new());

        // The next counter after a reset is a fresh start, not a gap.
        estimator.record(data(100));
        assert_eq!(estimator.current_stats().missing_count, 0);
    }

    #[test]
    fn phy_events_feed_the_estimator() {
        let mut estimator = LinkQualityEstimator::new();
        estimator.on_header_received(-50.0, &[0x10, 0x0a, 0x01, 0x01, 0x1b]);
        estimator.on_data_received(-50.0, &[0, 0, 0, 7, 0x20]);
        estimator.on_data_received(-50.0, &[0, 0, 0, 10, 0x20]);
        estimator.on_data_received(-50.0, &[0, 0]);
        estimator.on_header_crc_error(-52.0);
        estimator.on_data_crc_error(-52.0);

        let stats = estimator.current_stats();
        assert_eq!(stats.header_ok_count, 1);
        assert_eq!(stats.received_ok, 2);
        assert_eq!(stats.missing_count, 2);
        assert_eq!(stats.crc_error_count, 2);
        assert_eq!(stats.rssi_sample_count, 4);
    }

    #[test]
    fn random_streams_keep_invariants() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0x0dec7);
        let mut estimator = LinkQualityEstimator::new();
        let mut previous = estimator.current_stats();
        let mut sequence_number = 0u32;

        for _ in 0..10_000 {
            let rssi = rng.gen_range(-110.0..-20.0);
            let event = match rng.gen_range(0..10) {
                0 => ReceptionEvent::HeaderOk { rssi },
                1 => ReceptionEvent::HeaderCrcError { rssi },
                2 => ReceptionEvent::DataCrcError { rssi },
                3 => ReceptionEvent::DataOk {
                    sequence_number: rng.gen(),
                    rssi,
                },
                _ => {
                    sequence_number = sequence_number.wrapping_add(rng.gen_range(0..4));
                    ReceptionEvent::DataOk {
                        sequence_number,
                        rssi,
                    }
                }
            };
            estimator.record(event);
            let stats = estimator.current_stats();

            assert_eq!(
                stats.rssi_sample_count,
                stats.received_ok + stats.crc_error_count
            );
            assert!(stats.received_ok >= previous.received_ok);
            assert!(stats.missing_count >= previous.missing_count);
            assert!(stats.crc_error_count >= previous.crc_error_count);
            if stats.rssi_sample_count > 0 {
                assert!((-110.01..=-19.99).contains(&stats.rssi_running_mean));
            }
            assert!((0.0..=1.0).contains(&stats.success_rate()));
            previous = stats;
        }
    }
}
