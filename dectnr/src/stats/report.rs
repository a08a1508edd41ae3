use core::fmt;

/// Running link statistics.
///
/// `rssi_sample_count` always equals `received_ok + crc_error_count`: every
/// received packet and every CRC failure contributes one RSSI sample, headers
/// do not.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Default, PartialEq, Clone, Copy)]
pub struct LinkStats {
    /// Payloads received with a valid CRC.
    pub received_ok: u32,
    /// Packets inferred lost from gaps in the received counter.
    pub missing_count: u32,
    /// Headers and payloads received with an invalid CRC.
    pub crc_error_count: u32,
    /// Headers received with a valid CRC. Not used for loss accounting.
    pub header_ok_count: u32,
    /// Last accepted counter value, `None` until the first payload.
    pub previous_sequence: Option<u32>,
    pub rssi_running_mean: f32,
    pub rssi_sample_count: u32,
}

impl LinkStats {
    pub const fn new() -> Self {
        Self {
            received_ok: 0,
            missing_count: 0,
            crc_error_count: 0,
            header_ok_count: 0,
            previous_sequence: None,
            rssi_running_mean: 0.0,
            rssi_sample_count: 0,
        }
    }

    /// `received / (received + missing + crc errors)`, or `1.0` when nothing
    /// was observed yet.
    pub fn success_rate(&self) -> f32 {
        let total =
            self.received_ok as u64 + self.missing_count as u64 + self.crc_error_count as u64;
        if total == 0 {
            1.0
        } else {
            self.received_ok as f32 / total as f32
        }
    }

    /// Incremental mean: `mean += (sample - mean) / n`.
    pub(super) fn add_rssi_sample(&mut self, rssi: f32) {
        self.rssi_sample_count = self.rssi_sample_count.saturating_add(1);
        self.rssi_running_mean += (rssi - self.rssi_running_mean) / self.rssi_sample_count as f32;
    }
}

/// End of run report.
impl fmt::Display for LinkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const RULE: &str = "*********************************************";

        writeln!(f, "{RULE}")?;
        writeln!(f, "Success rate {:.2}", self.success_rate())?;
        writeln!(f, "Received messages {}", self.received_ok)?;
        writeln!(f, "Missed messages {}", self.missing_count)?;
        writeln!(f, "CRC errors {}", self.crc_error_count)?;
        writeln!(f, "RSSI AVG {:.1}", self.rssi_running_mean)?;
        write!(f, "{RULE}")
    }
}
