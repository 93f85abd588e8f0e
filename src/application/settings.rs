//! Engine behaviour switches derived from configuration

use chrono::{FixedOffset, Offset, Utc};

use crate::domain::ExtraMinutesPolicy;

/// How many barcodes a customer-type count row produces at booking time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BarcodeIssuance {
    /// One ticket per admitted guest
    #[default]
    PerGuest,
    /// One ticket per customer-type row, regardless of head count
    PerGroup,
}

impl BarcodeIssuance {
    pub fn barcodes_for(&self, count: i32) -> usize {
        match self {
            Self::PerGuest => count.max(0) as usize,
            Self::PerGroup => usize::from(count > 0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub extra_minutes_policy: ExtraMinutesPolicy,
    pub issuance: BarcodeIssuance,
    pub barcode_prefix: String,
    /// Venue wall-clock offset used when presenting outside-tracker times
    pub utc_offset: FixedOffset,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            extra_minutes_policy: ExtraMinutesPolicy::default(),
            issuance: BarcodeIssuance::default(),
            barcode_prefix: "B".to_string(),
            utc_offset: Utc.fix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issuance_counts() {
        assert_eq!(BarcodeIssuance::PerGuest.barcodes_for(3), 3);
        assert_eq!(BarcodeIssuance::PerGroup.barcodes_for(3), 1);
        assert_eq!(BarcodeIssuance::PerGroup.barcodes_for(0), 0);
        assert_eq!(BarcodeIssuance::PerGuest.barcodes_for(-1), 0);
    }
}
