//! Render engine for the cinereel composition.
//!
//! `RenderContext` is the audio clock: it owns the live node graph, the
//! automation of every gain stage and the queue of source start/stop
//! events, and advances one frame per call to `render_frame`. Everything
//! scheduled on it runs from that loop alone.

mod buffer_source;
mod context;
pub mod envelope;
mod error;
mod event_queue;
mod frame;
mod graph_state;
pub mod noise;
mod oscillator;

pub use buffer_source::BufferPlayer;
pub use context::{BufferKey, RenderContext};
pub use error::EngineError;
pub use event_queue::{EventQueue, SourceAction, SourceEvent};
pub use frame::Frame;
pub use graph_state::{topological_sort, GraphState};
pub use oscillator::Oscillator;
