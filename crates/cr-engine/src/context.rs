//! The render context: node registry, scheduling surface and renderer.

use cr_ir::{AudioGraph, AudioTime, NodeId, NodeType, ParamTimeline, Waveform, DESTINATION};
use slotmap::SlotMap;

use crate::buffer_source::BufferPlayer;
use crate::error::EngineError;
use crate::event_queue::{EventQueue, SourceAction, SourceEvent};
use crate::frame::Frame;
use crate::graph_state::GraphState;
use crate::oscillator::Oscillator;

slotmap::new_key_type! {
    /// Key for a sample buffer registered with a context.
    pub struct BufferKey;
}

/// Lifecycle of a source node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SourceStatus {
    /// Created, no start scheduled
    Idle,
    /// Start scheduled, not reached yet
    Scheduled,
    Playing,
    Stopped,
}

enum NodeRuntime {
    Destination,
    Gain(ParamTimeline),
    Oscillator { osc: Oscillator, status: SourceStatus },
    Buffer { key: BufferKey, player: BufferPlayer, status: SourceStatus },
}

impl NodeRuntime {
    fn status_mut(&mut self) -> Option<&mut SourceStatus> {
        match self {
            NodeRuntime::Oscillator { status, .. } | NodeRuntime::Buffer { status, .. } => Some(status),
            _ => None,
        }
    }
}

/// A software rendering context and the audio clock it defines.
///
/// Time advances only through [`RenderContext::render_frame`]: frame `n`
/// is at `n / sample_rate` seconds. Source starts and stops are queued as
/// frame-stamped events and gain automation is evaluated at each frame's
/// time, so everything scheduled here executes sample-accurately without
/// any other timer. Events scheduled at or before the current time fire
/// on the next rendered frame.
pub struct RenderContext {
    sample_rate: u32,
    graph: AudioGraph,
    /// Runtime state per node (indexed by NodeId).
    nodes: Vec<NodeRuntime>,
    buffers: SlotMap<BufferKey, Vec<f32>>,
    events: EventQueue,
    /// Traversal data, rebuilt lazily after the topology changes.
    state: Option<GraphState>,
    frame: u64,
    closed: bool,
}

impl RenderContext {
    /// Create an open context at `sample_rate` with only the destination node.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            graph: AudioGraph::with_destination(),
            nodes: vec![NodeRuntime::Destination],
            buffers: SlotMap::with_key(),
            events: EventQueue::new(),
            state: None,
            frame: 0,
            closed: false,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Current position of the audio clock.
    pub fn current_time(&self) -> AudioTime {
        AudioTime::from_frame(self.frame, self.sample_rate)
    }

    /// Index of the next frame to render.
    pub fn current_frame(&self) -> u64 {
        self.frame
    }

    /// The node that feeds the physical output.
    pub fn destination(&self) -> NodeId {
        DESTINATION
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Topology of the live graph.
    pub fn graph(&self) -> &AudioGraph {
        &self.graph
    }

    /// Number of live nodes, destination included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Sources that are playing or waiting for a scheduled start.
    pub fn active_sources(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| match n {
                NodeRuntime::Oscillator { status, .. } | NodeRuntime::Buffer { status, .. } => {
                    matches!(status, SourceStatus::Scheduled | SourceStatus::Playing)
                }
                _ => false,
            })
            .count()
    }

    // --- Graph construction ---

    /// Create a gain stage with an initial value.
    pub fn create_gain(&mut self, value: f32) -> Result<NodeId, EngineError> {
        self.add_node(NodeType::Gain, NodeRuntime::Gain(ParamTimeline::new(value)))
    }

    /// Create an oscillator. It stays silent until started.
    pub fn create_oscillator(&mut self, waveform: Waveform, frequency: f32) -> Result<NodeId, EngineError> {
        self.ensure_open()?;
        let osc = Oscillator::new(waveform, frequency, self.sample_rate)?;
        self.add_node(
            NodeType::Oscillator { waveform, frequency },
            NodeRuntime::Oscillator { osc, status: SourceStatus::Idle },
        )
    }

    /// Register sample data for buffer sources. Samples are read at the
    /// context's sample rate.
    pub fn create_buffer(&mut self, samples: Vec<f32>) -> Result<BufferKey, EngineError> {
        self.ensure_open()?;
        if samples.is_empty() {
            return Err(EngineError::EmptyBuffer);
        }
        Ok(self.buffers.insert(samples))
    }

    /// Create a source that plays a registered buffer.
    pub fn create_buffer_source(&mut self, buffer: BufferKey, looped: bool) -> Result<NodeId, EngineError> {
        self.ensure_open()?;
        if !self.buffers.contains_key(buffer) {
            return Err(EngineError::UnknownBuffer);
        }
        self.add_node(
            NodeType::BufferSource { looped },
            NodeRuntime::Buffer { key: buffer, player: BufferPlayer::new(looped), status: SourceStatus::Idle },
        )
    }

    /// Route the output of `from` into `to`.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), EngineError> {
        self.ensure_open()?;
        let from_type = self.node_type(from)?;
        let to_type = self.node_type(to)?;
        if from == to || *from_type == NodeType::Destination || to_type.is_source() {
            return Err(EngineError::InvalidConnection { from, to });
        }
        self.graph.connect(from, to);
        self.state = None;
        Ok(())
    }

    /// Remove every connection into or out of `node`.
    pub fn disconnect(&mut self, node: NodeId) -> Result<(), EngineError> {
        self.ensure_open()?;
        self.node_type(node)?;
        self.graph.disconnect(node);
        self.state = None;
        Ok(())
    }

    fn add_node(&mut self, node_type: NodeType, runtime: NodeRuntime) -> Result<NodeId, EngineError> {
        self.ensure_open()?;
        if self.nodes.len() >= NodeId::MAX as usize {
            return Err(EngineError::GraphFull);
        }
        let id = self.graph.add_node(node_type);
        self.nodes.push(runtime);
        self.state = None;
        Ok(id)
    }

    fn node_type(&self, id: NodeId) -> Result<&NodeType, EngineError> {
        self.graph
            .node(id)
            .map(|n| &n.node_type)
            .ok_or(EngineError::UnknownNode(id))
    }

    fn ensure_open(&self) -> Result<(), EngineError> {
        if self.closed {
            Err(EngineError::ContextClosed)
        } else {
            Ok(())
        }
    }

    // --- Scheduling ---

    /// Schedule `node` to start sounding at `at`. A source starts once.
    pub fn start(&mut self, node: NodeId, at: AudioTime) -> Result<(), EngineError> {
        self.ensure_open()?;
        let status = self
            .nodes
            .get_mut(node as usize)
            .ok_or(EngineError::UnknownNode(node))?
            .status_mut()
            .ok_or(EngineError::NotASource(node))?;
        if *status != SourceStatus::Idle {
            return Err(EngineError::AlreadyStarted(node));
        }
        *status = SourceStatus::Scheduled;
        let frame = at.to_frame(self.sample_rate);
        self.events.push(SourceEvent::new(frame, node, SourceAction::Start));
        Ok(())
    }

    /// Schedule `node` to fall silent at `at`.
    pub fn stop(&mut self, node: NodeId, at: AudioTime) -> Result<(), EngineError> {
        self.ensure_open()?;
        self.nodes
            .get_mut(node as usize)
            .ok_or(EngineError::UnknownNode(node))?
            .status_mut()
            .ok_or(EngineError::NotASource(node))?;
        let frame = at.to_frame(self.sample_rate);
        self.events.push(SourceEvent::new(frame, node, SourceAction::Stop));
        Ok(())
    }

    /// Automation of a gain stage.
    pub fn gain_param(&mut self, node: NodeId) -> Result<&mut ParamTimeline, EngineError> {
        self.ensure_open()?;
        match self.nodes.get_mut(node as usize) {
            Some(NodeRuntime::Gain(param)) => Ok(param),
            Some(_) => Err(EngineError::NotAGain(node)),
            None => Err(EngineError::UnknownNode(node)),
        }
    }

    // --- Teardown ---

    /// Stop every source, drop every node, buffer and pending event.
    ///
    /// After closing, rendering produces silence and every scheduling call
    /// fails with `ContextClosed`. Closing twice reports `AlreadyClosed`.
    pub fn close(&mut self) -> Result<(), EngineError> {
        if self.closed {
            return Err(EngineError::AlreadyClosed);
        }
        for node in &mut self.nodes {
            if let Some(status) = node.status_mut() {
                *status = SourceStatus::Stopped;
            }
        }
        let released = self.nodes.len() - 1;
        self.graph.clear();
        self.nodes.truncate(1);
        self.buffers.clear();
        self.events.clear();
        self.state = None;
        self.closed = true;
        tracing::debug!(released, "render context closed");
        Ok(())
    }

    // --- Rendering ---

    /// Rebuild traversal data if the topology changed. Allocates; call it
    /// before entering a realtime section if nodes were just added.
    pub fn prepare(&mut self) {
        if self.state.is_none() {
            let state = GraphState::from_graph(&self.graph);
            tracing::debug!(nodes = self.nodes.len(), ordered = state.topo_order.len(), "graph rebuilt");
            self.state = Some(state);
        }
    }

    /// Render one frame and advance the audio clock.
    pub fn render_frame(&mut self) -> Frame {
        if self.closed {
            return Frame::silence();
        }
        self.prepare();

        let frame = self.frame;
        let now = AudioTime::from_frame(frame, self.sample_rate);
        self.frame += 1;

        for i in self.events.drain_until(frame) {
            if let Some(&event) = self.events.get(i) {
                apply_source_event(&mut self.nodes, event);
            }
        }

        let Self { nodes, buffers, state, .. } = self;
        let Some(state) = state.as_mut() else {
            return Frame::silence();
        };

        for idx in 0..state.topo_order.len() {
            let id = state.topo_order[idx];
            let value = match &mut nodes[id as usize] {
                NodeRuntime::Oscillator { osc, status: SourceStatus::Playing } => osc.next_sample(),
                NodeRuntime::Buffer { key, player, status } if *status == SourceStatus::Playing => {
                    match buffers.get(*key) {
                        Some(data) => {
                            let v = player.next_sample(data);
                            if player.is_finished() {
                                *status = SourceStatus::Stopped;
                            }
                            v
                        }
                        None => {
                            *status = SourceStatus::Stopped;
                            0.0
                        }
                    }
                }
                NodeRuntime::Gain(param) => {
                    let input = state.gather(id);
                    if input == 0.0 {
                        0.0
                    } else {
                        input * param.value_at(now)
                    }
                }
                NodeRuntime::Destination => state.gather(id),
                _ => 0.0,
            };
            state.outputs[id as usize] = value;
        }

        Frame::mono(state.outputs[DESTINATION as usize].clamp(-1.0, 1.0))
    }

    /// Render `count` frames into a new vector.
    pub fn render_frames(&mut self, count: usize) -> Vec<Frame> {
        let mut frames = Vec::with_capacity(count);
        for _ in 0..count {
            frames.push(self.render_frame());
        }
        frames
    }

    /// Render into an existing slice.
    pub fn render_into(&mut self, frames: &mut [Frame]) {
        for frame in frames.iter_mut() {
            *frame = self.render_frame();
        }
    }
}

fn apply_source_event(nodes: &mut [NodeRuntime], event: SourceEvent) {
    let Some(status) = nodes.get_mut(event.node as usize).and_then(NodeRuntime::status_mut) else {
        return;
    };
    *status = match (event.action, *status) {
        (SourceAction::Start, SourceStatus::Scheduled) => SourceStatus::Playing,
        (SourceAction::Stop, _) => SourceStatus::Stopped,
        (_, current) => current,
    };
}
