//! Process-wide frame counters
//!
//! Counters are plain relaxed atomics updated by [`ProtocolStack`]
//! operations; no registry or exporter is involved.
//!
//! [`ProtocolStack`]: crate::layer::ProtocolStack

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, ErrorClass};

static FRAMES_READ: AtomicU64 = AtomicU64::new(0);
static FRAMES_WRITTEN: AtomicU64 = AtomicU64::new(0);
static UPDATE_PASSES: AtomicU64 = AtomicU64::new(0);
static BYTES_READ: AtomicU64 = AtomicU64::new(0);
static BYTES_WRITTEN: AtomicU64 = AtomicU64::new(0);
static MAX_FRAME_LEN: AtomicU64 = AtomicU64::new(0);

struct ErrorCounters {
    insufficiency: AtomicU64,
    malformed: AtomicU64,
    resource: AtomicU64,
    unsupported: AtomicU64,
}

static ERROR_COUNTERS: ErrorCounters = ErrorCounters::new();

impl ErrorCounters {
    const fn new() -> Self {
        Self {
            insufficiency: AtomicU64::new(0),
            malformed: AtomicU64::new(0),
            resource: AtomicU64::new(0),
            unsupported: AtomicU64::new(0),
        }
    }

    fn increment(&self, class: ErrorClass) {
        let counter = match class {
            ErrorClass::Insufficiency => &self.insufficiency,
            ErrorClass::Malformed => &self.malformed,
            ErrorClass::Resource => &self.resource,
            ErrorClass::Unsupported => &self.unsupported,
            ErrorClass::None | ErrorClass::Deferred => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Direction of a completed frame
#[derive(Clone, Copy)]
pub(crate) enum FrameDirection {
    Read,
    Written,
}

#[inline]
pub(crate) fn record_frame(direction: FrameDirection, len: usize) {
    let len = u64::try_from(len).unwrap_or(u64::MAX);
    match direction {
        FrameDirection::Read => {
            FRAMES_READ.fetch_add(1, Ordering::Relaxed);
            BYTES_READ.fetch_add(len, Ordering::Relaxed);
        }
        FrameDirection::Written => {
            FRAMES_WRITTEN.fetch_add(1, Ordering::Relaxed);
            BYTES_WRITTEN.fetch_add(len, Ordering::Relaxed);
        }
    }
    update_max(&MAX_FRAME_LEN, len);
}

#[inline]
pub(crate) fn record_update() {
    UPDATE_PASSES.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub(crate) fn record_error(err: Error) {
    ERROR_COUNTERS.increment(err.status().class());
}

fn update_max(target: &AtomicU64, candidate: u64) {
    let mut current = target.load(Ordering::Relaxed);
    while candidate > current {
        match target.compare_exchange_weak(
            current,
            candidate,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return,
            Err(old) => current = old,
        }
    }
}

/// Current counter values
#[must_use]
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        frames_read: FRAMES_READ.load(Ordering::Relaxed),
        frames_written: FRAMES_WRITTEN.load(Ordering::Relaxed),
        update_passes: UPDATE_PASSES.load(Ordering::Relaxed),
        bytes_read: BYTES_READ.load(Ordering::Relaxed),
        bytes_written: BYTES_WRITTEN.load(Ordering::Relaxed),
        max_frame_len: MAX_FRAME_LEN.load(Ordering::Relaxed),
        insufficiency_errors: ERROR_COUNTERS.insufficiency.load(Ordering::Relaxed),
        malformed_errors: ERROR_COUNTERS.malformed.load(Ordering::Relaxed),
        resource_errors: ERROR_COUNTERS.resource.load(Ordering::Relaxed),
        unsupported_errors: ERROR_COUNTERS.unsupported.load(Ordering::Relaxed),
    }
}

/// Lightweight snapshot of the frame counters.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricsSnapshot {
    /// Frames decoded successfully
    pub frames_read: u64,
    /// Frames encoded successfully
    pub frames_written: u64,
    /// Completed update passes
    pub update_passes: u64,
    /// Bytes consumed by decoded frames
    pub bytes_read: u64,
    /// Bytes produced by encoded frames
    pub bytes_written: u64,
    /// Largest frame seen in either direction
    pub max_frame_len: u64,
    /// `NotEnoughData` failures
    pub insufficiency_errors: u64,
    /// Protocol, id and data failures
    pub malformed_errors: u64,
    /// Allocation and buffer failures
    pub resource_errors: u64,
    /// Missing capabilities
    pub unsupported_errors: u64,
}

impl MetricsSnapshot {
    /// Total failures across every class
    #[must_use]
    pub fn total_errors(&self) -> u64 {
        self.insufficiency_errors
            + self.malformed_errors
            + self.resource_errors
            + self.unsupported_errors
    }

    /// Average size of completed frames in bytes
    #[must_use]
    pub fn avg_frame_len(&self) -> Option<u64> {
        let frames = self.frames_read + self.frames_written;
        if frames == 0 {
            return None;
        }
        Some((self.bytes_read + self.bytes_written) / frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_move_forward() {
        let before = snapshot();
        record_frame(FrameDirection::Read, 10);
        record_error(Error::ProtocolError);
        record_update();
        let after = snapshot();

        assert!(after.frames_read > before.frames_read);
        assert!(after.malformed_errors > before.malformed_errors);
        assert!(after.update_passes > before.update_passes);
        assert!(after.max_frame_len >= 10);
    }

    #[test]
    fn test_average_frame_len() {
        let snap = MetricsSnapshot {
            frames_read: 2,
            bytes_read: 10,
            frames_written: 1,
            bytes_written: 5,
            ..MetricsSnapshot::default()
        };
        assert_eq!(snap.avg_frame_len(), Some(5));
        assert_eq!(MetricsSnapshot::default().avg_frame_len(), None);
    }
}
