use serde::{Deserialize, Serialize};

use crate::job::null_as_default;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ByteCount {
    #[serde(default, deserialize_with = "null_as_default")]
    pub bytes: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransferProgress {
    #[serde(default, deserialize_with = "null_as_default")]
    pub transferred: ByteCount,
    #[serde(default, deserialize_with = "null_as_default")]
    pub failed: ByteCount,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skipped: ByteCount,
    #[serde(default, deserialize_with = "null_as_default")]
    pub remaining: ByteCount,
}

impl TransferProgress {
    /// Bytes the transfer is done with, whether they landed or not.
    pub fn processed_bytes(&self) -> u64 {
        self.transferred
            .bytes
            .saturating_add(self.failed.bytes)
            .saturating_add(self.skipped.bytes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectsManifest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: ByteCount,
}

/// The currently executing data movement for an in-progress job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub transfer_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_rate_bits_per_second: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub transfer_progress: TransferProgress,
    #[serde(default, deserialize_with = "null_as_default")]
    pub objects_manifest: ObjectsManifest,
}

impl Transfer {
    pub fn total_bytes(&self) -> u64 {
        self.objects_manifest.summary.bytes
    }

    /// Whole-number completion percentage, or `None` when the manifest is empty.
    pub fn percent_complete(&self) -> Option<u32> {
        percent_of(self.transfer_progress.processed_bytes(), self.total_bytes())
    }
}

/// `round(part / total * 100)`, `None` for a zero total.
pub fn percent_of(part: u64, total: u64) -> Option<u32> {
    if total == 0 {
        return None;
    }
    let pct = (part as f64 / total as f64 * 100.0).round();
    Some(pct.clamp(0.0, u32::MAX as f64) as u32)
}
