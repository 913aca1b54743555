//! Tesseract projection engine.
//!
//! Rotates a 4-cube under two coupled quaternion rotations and projects it
//! into 3-space with a perspective divide whose w amplification follows an
//! external coherence signal in [0, 1]. Singularities on the focal plane are
//! saturated, never divided through.
//!
//! No I/O here. Clocks, transports and rasterizers live in the callers.

pub mod constants;
pub mod engine;
pub mod error;
pub mod field;
pub mod frame;
pub mod projection;
pub mod quaternion;
pub mod rotation;
pub mod signal;
pub mod topology;

pub use constants::{
    BASE_FOCAL_DISTANCE, DEFAULT_COHERENCE, DEFAULT_ROTATION_SPEED, DEFAULT_TICK_HZ, EDGE_COUNT,
    MAX_ROTATION_SPEED, SATURATION_MAGNITUDE, SECOND_PLANE_RATIO, SINGULARITY_EPSILON,
    VERTEX_COUNT,
};
pub use engine::{Engine, EngineSettings};
pub use error::TopologyError;
pub use field::CoherenceField;
pub use frame::{EngineStatus, Frame, Telemetry, export_json};
pub use projection::{
    EdgeDraw, ProjectionConfig, ProjectionPipeline, Vertex3D, clamp_coherence, depth_opacity,
};
pub use quaternion::Quaternion;
pub use rotation::{RotationState, clamp_rotation_speed};
pub use signal::{FixedTicks, Fixed, LatestValue, SignalCell, StopHandle, TickSource};
pub use topology::{Edge, HypercubeTopology, Vertex4D};
