//! Building the session graph on a render context and applying the
//! composition's schedule to it.

use cr_engine::envelope::PluckEnvelope;
use cr_engine::noise::noise_buffer;
use cr_engine::{EngineError, RenderContext};
use cr_ir::{AudioTime, EventKind, NodeId, ScheduledEvent, Stage, Waveform};

use crate::composition::{self, MASTER_LEVEL};

/// A pluck oscillator keeps sounding this long past its nominal length.
pub const PLUCK_RELEASE: f64 = 0.05;

/// Oscillator and fixed gain of one drone voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DroneVoice {
    pub osc: NodeId,
    pub gain: NodeId,
}

/// Nodes created for one pluck.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PluckVoice {
    pub osc: NodeId,
    pub gain: NodeId,
    pub onset: AudioTime,
}

/// Node handles of a live session.
#[derive(Debug)]
pub struct SessionGraph {
    pub master: NodeId,
    pub rain: NodeId,
    pub noise: NodeId,
    pub drones: Vec<DroneVoice>,
    pub plucks: Vec<PluckVoice>,
}

impl SessionGraph {
    fn stage(&self, stage: Stage) -> NodeId {
        match stage {
            Stage::Master => self.master,
            Stage::Rain => self.rain,
        }
    }
}

/// How much of the schedule made it onto the context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    pub applied: usize,
    pub failed: usize,
}

/// A session whose whole schedule has been handed to the context.
#[derive(Debug)]
pub struct ArmedSession {
    pub graph: SessionGraph,
    /// Audio-clock reading when the session was armed
    pub reference: AudioTime,
    /// Where the composition ends
    pub end: AudioTime,
    pub report: ScheduleReport,
}

/// Create the master stage and the rain bed, and start the noise loop at
/// the current audio time. The rain stage stays silent until its first
/// ramp.
pub fn build(ctx: &mut RenderContext) -> Result<SessionGraph, EngineError> {
    let master = ctx.create_gain(MASTER_LEVEL)?;
    ctx.connect(master, ctx.destination())?;

    let rain = ctx.create_gain(0.0)?;
    ctx.connect(rain, master)?;

    let buffer = ctx.create_buffer(noise_buffer(ctx.sample_rate()))?;
    let noise = ctx.create_buffer_source(buffer, true)?;
    ctx.connect(noise, rain)?;
    ctx.start(noise, ctx.current_time())?;

    Ok(SessionGraph { master, rain, noise, drones: Vec::with_capacity(2), plucks: Vec::new() })
}

/// Apply one scheduled event.
///
/// Voice nodes are registered on the graph as soon as they exist. If wiring
/// them up fails afterwards they are unplugged, so the voice stays silent.
pub fn apply(
    ctx: &mut RenderContext,
    graph: &mut SessionGraph,
    event: &ScheduledEvent,
) -> Result<(), EngineError> {
    let at = event.time;
    let master = graph.master;
    match event.kind {
        EventKind::Pluck(pluck) => {
            let osc = ctx.create_oscillator(Waveform::Triangle, pluck.frequency)?;
            let gain = ctx.create_gain(0.0)?;
            graph.plucks.push(PluckVoice { osc, gain, onset: at });
            wire(ctx, [osc, gain], |ctx| {
                PluckEnvelope::DEFAULT.schedule(ctx.gain_param(gain)?, at, pluck.length)?;
                ctx.connect(osc, gain)?;
                ctx.connect(gain, master)?;
                ctx.start(osc, at)?;
                ctx.stop(osc, at + pluck.length + PLUCK_RELEASE)
            })?;
        }
        EventKind::DroneStart(drone) => {
            let osc = ctx.create_oscillator(Waveform::Sine, drone.frequency)?;
            let gain = ctx.create_gain(drone.gain)?;
            graph.drones.push(DroneVoice { osc, gain });
            wire(ctx, [osc, gain], |ctx| {
                ctx.connect(osc, gain)?;
                ctx.connect(gain, master)?;
                ctx.start(osc, at)
            })?;
        }
        EventKind::GainRamp { stage, ramp } => {
            ctx.gain_param(graph.stage(stage))?.schedule(at, ramp)?;
        }
    }
    Ok(())
}

fn wire(
    ctx: &mut RenderContext,
    nodes: [NodeId; 2],
    connect: impl FnOnce(&mut RenderContext) -> Result<(), EngineError>,
) -> Result<(), EngineError> {
    let result = connect(ctx);
    if result.is_err() {
        for node in nodes {
            if let Err(e) = ctx.disconnect(node) {
                tracing::debug!(node, error = %e, "could not unplug voice");
            }
        }
    }
    result
}

/// Build the graph and schedule the whole composition from the context's
/// current time.
///
/// A failing event is logged and skipped; the rest of the schedule still
/// goes out. Only a failure to build the graph itself is an error.
pub fn arm(ctx: &mut RenderContext) -> Result<ArmedSession, EngineError> {
    let reference = ctx.current_time();
    let mut graph = build(ctx)?;
    let mut report = ScheduleReport::default();

    for event in composition::schedule(reference) {
        match apply(ctx, &mut graph, &event) {
            Ok(()) => report.applied += 1,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(
                    kind = event.kind.label(),
                    time = event.time.secs(),
                    error = %e,
                    "dropped scheduled event"
                );
            }
        }
    }

    let end = composition::session_end(reference);
    let beds = graph.drones.iter().map(|d| d.osc).chain([graph.noise]);
    for node in beds {
        if let Err(e) = ctx.stop(node, end) {
            tracing::warn!(node, error = %e, "could not schedule bed stop");
        }
    }

    ctx.prepare();
    tracing::debug!(
        reference = reference.secs(),
        end = end.secs(),
        applied = report.applied,
        failed = report.failed,
        nodes = ctx.node_count(),
        "session armed"
    );
    Ok(ArmedSession { graph, reference, end, report })
}

/// Halt the noise bed and release the context. Sources that were already
/// stopped or a context that was already closed are not errors here.
pub fn release(ctx: &mut RenderContext, graph: &SessionGraph) {
    if let Err(e) = ctx.stop(graph.noise, ctx.current_time()) {
        tracing::debug!(error = %e, "noise bed already released");
    }
    if let Err(e) = ctx.close() {
        tracing::debug!(error = %e, "render context already released");
    }
}
