//! Audio output backends for the cinereel engine.

mod cpal_backend;
mod null;
mod traits;

pub use cpal_backend::{CpalHost, CpalOutput};
pub use null::{NullHost, NullOutput};
pub use traits::{AudioError, AudioHost, AudioOutput, OutputConfig};
