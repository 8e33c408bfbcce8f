// ============================================================
// Layer 3 - KeypointSample Domain Type
// ============================================================
// One row of the keypoint dataset: a gesture class id and the
// 42 normalised coordinates of 21 hand landmarks laid out as
// [x0, y0, x1, y1, ..., x20, y20].

/// Number of landmarks MediaPipe reports for one hand
pub const NUM_LANDMARKS: usize = 21;

/// Length of the flattened (x, y) feature vector
pub const FEATURE_DIM: usize = NUM_LANDMARKS * 2;

/// Number of gesture classes in the shipped dataset
pub const DEFAULT_NUM_CLASSES: usize = 26;

/// A labelled keypoint vector.
#[derive(Debug, Clone, PartialEq)]
pub struct KeypointSample {
    /// Gesture class id, in `[0, num_classes)`
    pub label: usize,

    /// Flattened landmark coordinates
    pub features: [f32; FEATURE_DIM],
}

impl KeypointSample {
    pub fn new(label: usize, features: [f32; FEATURE_DIM]) -> Self {
        Self { label, features }
    }
}
