use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_COHERENCE, DEFAULT_ROTATION_SPEED, SECOND_PLANE_RATIO, VERTEX_COUNT};
use crate::error::Result;
use crate::frame::{EngineStatus, Frame, Telemetry};
use crate::projection::{ProjectionConfig, ProjectionPipeline, clamp_coherence};
use crate::rotation::{RotationState, clamp_rotation_speed};
use crate::signal::{LatestValue, StopHandle, TickSource};
use crate::topology::HypercubeTopology;

/// Construction parameters for an [`Engine`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub projection: ProjectionConfig,
    pub rotation_speed: f64,
    pub second_plane_ratio: f64,
    pub initial_coherence: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            projection: ProjectionConfig::default(),
            rotation_speed: DEFAULT_ROTATION_SPEED,
            second_plane_ratio: SECOND_PLANE_RATIO,
            initial_coherence: DEFAULT_COHERENCE,
        }
    }
}

type Source = Box<dyn LatestValue + Send>;

/// The render loop: owns topology, orientation and the cached inputs.
///
/// One owner, no locks. External producers reach the engine only through
/// injected [`LatestValue`] sources, sampled at the start of each tick.
pub struct Engine {
    topology: HypercubeTopology,
    rotation: RotationState,
    pipeline: ProjectionPipeline,
    coherence: f64,
    rotation_speed: f64,
    coherence_source: Option<Source>,
    speed_source: Option<Source>,
    stop: StopHandle,
    running: bool,
    tick: u64,
}

impl Engine {
    /// Build and validate the topology eagerly. This is the only fallible step
    /// in the engine's life.
    pub fn new(settings: EngineSettings) -> Result<Self> {
        Ok(Self {
            topology: HypercubeTopology::new()?,
            rotation: RotationState::new().with_second_plane_ratio(settings.second_plane_ratio),
            pipeline: ProjectionPipeline::new(settings.projection),
            coherence: clamp_coherence(settings.initial_coherence),
            rotation_speed: clamp_rotation_speed(settings.rotation_speed),
            coherence_source: None,
            speed_source: None,
            stop: StopHandle::new(),
            running: false,
            tick: 0,
        })
    }

    /// Replace the starting orientation.
    pub fn with_rotation(mut self, rotation: RotationState) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_coherence_source(mut self, source: impl LatestValue + Send + 'static) -> Self {
        self.coherence_source = Some(Box::new(source));
        self
    }

    pub fn with_speed_source(mut self, source: impl LatestValue + Send + 'static) -> Self {
        self.speed_source = Some(Box::new(source));
        self
    }

    pub fn set_coherence(&mut self, coherence: f64) {
        self.coherence = clamp_coherence(coherence);
    }

    pub fn set_rotation_speed(&mut self, speed: f64) {
        self.rotation_speed = clamp_rotation_speed(speed);
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn coherence(&self) -> f64 {
        self.coherence
    }

    pub fn rotation_speed(&self) -> f64 {
        self.rotation_speed
    }

    pub fn rotation(&self) -> &RotationState {
        &self.rotation
    }

    pub fn topology(&self) -> &HypercubeTopology {
        &self.topology
    }

    pub fn pipeline(&self) -> &ProjectionPipeline {
        &self.pipeline
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Handle that stops `run` before its next tick.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Pull the newest value from each injected source.
    fn sample_inputs(&mut self) {
        if let Some(c) = self.coherence_source.as_mut().and_then(|s| s.latest()) {
            self.coherence = clamp_coherence(c);
        }
        if let Some(s) = self.speed_source.as_mut().and_then(|s| s.latest()) {
            self.rotation_speed = clamp_rotation_speed(s);
        }
    }

    /// Advance one frame: sample inputs, step the orientation, rotate and
    /// project all vertices, order the edges.
    pub fn tick(&mut self) -> Frame {
        self.sample_inputs();
        self.rotation.step(self.rotation_speed);

        let source = self.topology.vertices();
        let rotated = std::array::from_fn(|i| self.rotation.rotate(source[i]));
        let vertices = self.pipeline.project_all(&rotated, self.coherence);
        let edges = self.pipeline.edge_draws(&vertices, self.topology.edges());

        self.tick += 1;
        Frame {
            tick: self.tick,
            vertices,
            edges,
            telemetry: Telemetry {
                coherence: self.coherence,
                rotation_speed: self.rotation_speed,
                vertex_count: VERTEX_COUNT,
            },
        }
    }

    /// Tick until the source is exhausted or the stop flag is raised.
    /// Returns the number of ticks run. The stop flag is cleared on return,
    /// so a stopped engine can be run again.
    pub fn run(&mut self, ticks: &mut impl TickSource, mut on_frame: impl FnMut(&Frame)) -> u64 {
        self.running = true;
        let mut count = 0;
        while !self.stop.is_stopped() && ticks.next_tick() {
            let frame = self.tick();
            on_frame(&frame);
            count += 1;
        }
        self.running = false;
        self.stop.reset();
        count
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            coherence: self.coherence,
            rotation_speed: self.rotation_speed,
            is_running: self.running,
            vertex_count: VERTEX_COUNT,
            tick: self.tick,
        }
    }
}
