//! Fusing upload and server-side processing signals into one percentage.
//!
//! The transfer phase owns `[0, 50]` of the displayed range and the
//! processing phase owns `[50, 100]`. The functions here are stateless;
//! keeping the shown value non-decreasing across calls is the job of the
//! caller (see [`crate::ProgressState`]).

/// Which part of a job's lifetime a raw percentage belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Bytes are still being sent to the job-accepting service.
    Transfer,
    /// Every byte has been sent but no server response has arrived yet.
    TransferComplete,
    /// The server reported progress for its own processing stages.
    Processing,
}

pub const TRANSFER_CEILING: u8 = 50;
pub const MIN_ACTIVE_PERCENT: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressPolicy {
    /// Payloads strictly smaller than this are "small".
    pub small_payload_threshold: u64,
    /// Displayed value a small payload is held at once its raw transfer
    /// percentage passes [`SMALL_PAYLOAD_TRIGGER`].
    pub small_payload_ceiling: u8,
}

/// Raw transfer percentage above which the small-payload hold kicks in.
pub const SMALL_PAYLOAD_TRIGGER: u8 = 90;

impl Default for ProgressPolicy {
    fn default() -> Self {
        Self {
            small_payload_threshold: 1024 * 1024,
            small_payload_ceiling: 45,
        }
    }
}

impl ProgressPolicy {
    /// Map a raw phase percentage onto the 0..=100 display scale.
    ///
    /// `raw_percent` is clamped to 100. `total_bytes_hint` is only consulted
    /// during [`Phase::Transfer`]; an unknown size never counts as small.
    pub fn fuse(&self, phase: Phase, raw_percent: u8, total_bytes_hint: Option<u64>) -> u8 {
        let raw = raw_percent.min(100);
        let display = match phase {
            Phase::Transfer => {
                let is_small =
                    total_bytes_hint.is_some_and(|total| total < self.small_payload_threshold);
                if is_small && raw > SMALL_PAYLOAD_TRIGGER {
                    self.small_payload_ceiling
                } else {
                    raw / 2
                }
            }
            Phase::TransferComplete => TRANSFER_CEILING,
            Phase::Processing => TRANSFER_CEILING + raw / 2,
        };
        display.max(MIN_ACTIVE_PERCENT)
    }
}

/// [`ProgressPolicy::fuse`] with the default policy.
pub fn fuse(phase: Phase, raw_percent: u8, total_bytes_hint: Option<u64>) -> u8 {
    ProgressPolicy::default().fuse(phase, raw_percent, total_bytes_hint)
}

/// Rounded share of `sent` over `total`, or `None` when the size is unknown.
pub fn transfer_percent(sent: u64, total: Option<u64>) -> Option<u8> {
    match total {
        None => None,
        Some(0) => Some(100),
        Some(total) => {
            let sent = sent.min(total) as u128;
            let pct = (sent * 100 + total as u128 / 2) / total as u128;
            Some(pct as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_percent_rounds_to_nearest() {
        assert_eq!(transfer_percent(1, Some(3)), Some(33));
        assert_eq!(transfer_percent(2, Some(3)), Some(67));
        assert_eq!(transfer_percent(10, Some(10)), Some(100));
        assert_eq!(transfer_percent(11, Some(10)), Some(100));
        assert_eq!(transfer_percent(5, None), None);
        assert_eq!(transfer_percent(0, Some(0)), Some(100));
    }

    #[test]
    fn custom_policy_moves_threshold_and_ceiling() {
        let policy = ProgressPolicy {
            small_payload_threshold: 10,
            small_payload_ceiling: 40,
        };
        assert_eq!(policy.fuse(Phase::Transfer, 95, Some(9)), 40);
        assert_eq!(policy.fuse(Phase::Transfer, 95, Some(10)), 47);
    }
}
