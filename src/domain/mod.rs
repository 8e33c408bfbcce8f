// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types and traits describing hand keypoints,
// labelled samples and gesture classes.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only plain structs, enums and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// One labelled 42-float training row
pub mod sample;

// Raw hand landmarks and their normalisation into features
pub mod keypoint;

// Class id -> gesture name mapping
pub mod labels;

// Core abstractions (traits) that other layers implement
pub mod traits;
