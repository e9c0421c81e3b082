//! Scriptable vision backend for tests.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{PhotoComparison, RoomAnalysis, VisionAnalyzer, VisionError};

/// Mock backend returning scripted results and recording invocations.
pub struct MockVision {
    analysis: RoomAnalysis,
    comparison: PhotoComparison,
    fail: bool,
    analyze_calls: AtomicU32,
    compare_calls: AtomicU32,
    compared_rooms: Mutex<Vec<String>>,
}

impl Default for MockVision {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVision {
    /// Neutral results, never failing.
    pub fn new() -> Self {
        Self {
            analysis: RoomAnalysis::neutral(),
            comparison: PhotoComparison::neutral(),
            fail: false,
            analyze_calls: AtomicU32::new(0),
            compare_calls: AtomicU32::new(0),
            compared_rooms: Mutex::new(Vec::new()),
        }
    }

    /// Script the single-photo analysis result.
    pub fn with_analysis(mut self, analysis: RoomAnalysis) -> Self {
        self.analysis = analysis;
        self
    }

    /// Script the comparison result.
    pub fn with_comparison(mut self, comparison: PhotoComparison) -> Self {
        self.comparison = comparison;
        self
    }

    /// Make every call fail as if the backend were unreachable.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn analyze_calls(&self) -> u32 {
        self.analyze_calls.load(Ordering::SeqCst)
    }

    pub fn compare_calls(&self) -> u32 {
        self.compare_calls.load(Ordering::SeqCst)
    }

    /// Room names passed to `compare`, in call order.
    pub fn compared_rooms(&self) -> Vec<String> {
        self.compared_rooms
            .lock()
            .expect("mock mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl VisionAnalyzer for MockVision {
    fn id(&self) -> &str {
        "mock"
    }

    async fn analyze(
        &self,
        _image: &Path,
        _checklist: &[String],
        _room_name: &str,
    ) -> Result<RoomAnalysis, VisionError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(VisionError::Unavailable("scripted outage".to_string()));
        }
        Ok(self.analysis.clone())
    }

    async fn compare(
        &self,
        _before: &Path,
        _after: &Path,
        room_name: &str,
    ) -> Result<PhotoComparison, VisionError> {
        self.compare_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(VisionError::Unavailable("scripted outage".to_string()));
        }
        self.compared_rooms
            .lock()
            .expect("mock mutex poisoned")
            .push(room_name.to_string());
        Ok(self.comparison.clone())
    }
}
