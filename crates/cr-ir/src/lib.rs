//! Core IR types for the cinereel engine.
//!
//! Everything here is plain data: the fixed segment table, time on the
//! audio clock, the scheduled events of a session, the graph topology and
//! the automation curves attached to gain parameters. Rendering lives in
//! `cr-engine`.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod audio_time;
pub mod automation;
pub mod event;
pub mod graph;
pub mod timeline;

pub use audio_time::AudioTime;
pub use automation::{AutomationError, AutomationEvent, ParamTimeline, Ramp, MAX_AUTOMATION_EVENTS};
pub use event::{Drone, EventKind, Pluck, ScheduledEvent, Stage};
pub use graph::{AudioGraph, Connection, Node, NodeId, NodeType, Waveform, DESTINATION};
pub use timeline::{segment_at, Segment, DURATION, SEGMENTS};
