use afl::*;
use dectnr::phy::ReceptionEvent;
use dectnr::stats::LinkQualityEstimator;

fn main() {
    fuzz!(|events: Vec<ReceptionEvent>| {
        let mut estimator = LinkQualityEstimator::new();
        let mut previous = estimator.current_stats();

        for event in events {
            estimator.record(event);
            let stats = estimator.current_stats();

            assert!(stats.missing_count >= previous.missing_count);
            assert!(stats.received_ok >= previous.received_ok);
            assert!(stats.crc_error_count >= previous.crc_error_count);
            if stats.received_ok < u32::MAX && stats.crc_error_count < u32::MAX {
                assert_eq!(
                    stats.rssi_sample_count,
                    stats.received_ok + stats.crc_error_count
                );
            }
            previous = stats;
        }
    });
}
