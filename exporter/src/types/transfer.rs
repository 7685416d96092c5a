//! Transfer records returned by the indexer's `transfers` view and the
//! per-status tally the collectors export.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a cross-domain transfer.
///
/// Statuses the indexer adds in the future decode as
/// [`TransferStatus::Unrecognized`] and are not counted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferStatus {
    XCalled,
    Executed,
    CompletedFast,
    CompletedSlow,
    Reconciled,
    #[default]
    #[serde(other)]
    Unrecognized,
}

impl TransferStatus {
    /// Statuses that are exported, in label order.
    pub const TRACKED: [TransferStatus; 5] = [
        TransferStatus::XCalled,
        TransferStatus::Executed,
        TransferStatus::CompletedFast,
        TransferStatus::CompletedSlow,
        TransferStatus::Reconciled,
    ];

    /// Label value used in the `status` dimension, `None` for untracked
    /// statuses.
    pub fn label(self) -> Option<&'static str> {
        match self {
            TransferStatus::XCalled => Some("XCalled"),
            TransferStatus::Executed => Some("Executed"),
            TransferStatus::CompletedFast => Some("CompletedFast"),
            TransferStatus::CompletedSlow => Some("CompletedSlow"),
            TransferStatus::Reconciled => Some("Reconciled"),
            TransferStatus::Unrecognized => None,
        }
    }

    fn slot(self) -> Option<usize> {
        Self::TRACKED.iter().position(|s| *s == self)
    }
}

/// One row of the `transfers` view, restricted to the selected columns.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub status: TransferStatus,
    #[serde(default)]
    pub origin_chain: Option<String>,
    #[serde(default)]
    pub destination_chain: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub xcall_timestamp: Option<i64>,
    /// Unix seconds, absent until the transfer executes.
    #[serde(default)]
    pub execute_timestamp: Option<i64>,
}

/// Number of transfers per tracked status in one sampled window.
///
/// Every tracked status starts at zero, so a status that disappears from
/// the window is exported as `0` rather than keeping an older count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusCounts {
    counts: [u64; TransferStatus::TRACKED.len()],
}

impl StatusCounts {
    /// Tallies `records`, ignoring unrecognized statuses.
    pub fn tally<'a>(records: impl IntoIterator<Item = &'a TransferRecord>) -> Self {
        let mut out = Self::default();
        for slot in records.into_iter().filter_map(|r| r.status.slot()) {
            out.counts[slot] += 1;
        }
        out
    }

    pub fn get(&self, status: TransferStatus) -> u64 {
        status.slot().map(|i| self.counts[i]).unwrap_or(0)
    }

    /// `(label, count)` for every tracked status, including zeros.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        TransferStatus::TRACKED
            .iter()
            .zip(self.counts.iter())
            .filter_map(|(status, count)| status.label().map(|l| (l, *count)))
    }
}
