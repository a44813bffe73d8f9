pub mod engine;
pub mod feedback;
pub mod input;
pub mod playback;
pub mod sequence;
pub mod timing;
