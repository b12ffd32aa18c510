use serde::{Deserialize, Serialize};

use crate::core::interval::GenomicInterval;
use crate::core::types::{RegionId, RegionStatus, RejectionReason};

/// A candidate tandem-repeat region.
///
/// `interval` holds the reported coordinates. `padded` holds the slop-extended
/// coordinates used for annotation lookup; it equals `interval` until
/// [`Region::with_slop`] derives a padded copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub interval: GenomicInterval,
    pub padded: GenomicInterval,
    pub status: RegionStatus,
}

impl Region {
    #[must_use]
    pub fn kept(interval: GenomicInterval) -> Self {
        Self::with_status(interval, RegionStatus::Kept)
    }

    #[must_use]
    pub fn rejected(interval: GenomicInterval, reason: RejectionReason) -> Self {
        Self::with_status(interval, RegionStatus::Rejected(reason))
    }

    fn with_status(interval: GenomicInterval, status: RegionStatus) -> Self {
        Self {
            id: RegionId::from_interval(&interval),
            padded: interval.clone(),
            interval,
            status,
        }
    }

    #[must_use]
    pub fn is_kept(&self) -> bool {
        matches!(self.status, RegionStatus::Kept)
    }

    #[must_use]
    pub fn rejection_reason(&self) -> Option<RejectionReason> {
        match self.status {
            RegionStatus::Kept => None,
            RegionStatus::Rejected(reason) => Some(reason),
        }
    }

    /// Unpadded span in bp
    #[must_use]
    pub fn span(&self) -> u64 {
        self.interval.len()
    }

    /// Derive a padded region: same id and reported coordinates, lookup
    /// coordinates extended by `slop` on both sides and clamped to the contig.
    #[must_use]
    pub fn with_slop(&self, slop: u64, contig_length: u64) -> Self {
        Self {
            id: self.id.clone(),
            interval: self.interval.clone(),
            padded: self.interval.padded(slop, contig_length),
            status: self.status,
        }
    }
}
