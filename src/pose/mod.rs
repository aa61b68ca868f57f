pub mod ingest;
pub mod keypoint;

pub use ingest::{parse_payload, validate_frames, RawFrame, RawKeypoint, RawPayload};
pub use keypoint::{Frame, Keypoint, LandmarkIndex};
