//! Engine error type.

use cr_ir::{AutomationError, NodeId};
use thiserror::Error;

/// Errors raised while building or scheduling on a `RenderContext`.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("render context is closed")]
    ContextClosed,
    #[error("render context was already closed")]
    AlreadyClosed,
    #[error("no node with id {0}")]
    UnknownNode(NodeId),
    #[error("no sample buffer with that key")]
    UnknownBuffer,
    #[error("oscillator frequency {0} Hz is outside (0, nyquist)")]
    InvalidFrequency(f32),
    #[error("cannot connect node {from} to node {to}")]
    InvalidConnection { from: NodeId, to: NodeId },
    #[error("node {0} is not a source")]
    NotASource(NodeId),
    #[error("node {0} was already started")]
    AlreadyStarted(NodeId),
    #[error("node {0} has no gain parameter")]
    NotAGain(NodeId),
    #[error("sample buffer is empty")]
    EmptyBuffer,
    #[error("graph is full")]
    GraphFull,
    #[error(transparent)]
    Automation(#[from] AutomationError),
}
