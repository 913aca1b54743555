/// Number of vertices of a 4-cube
pub const VERTEX_COUNT: usize = 16;

/// Number of edges of a 4-cube
pub const EDGE_COUNT: usize = 32;

/// Numerical epsilon for near-zero comparisons
pub const EPSILON: f64 = 1e-10;

/// Allowed drift of |q| from 1.0 after a composition
pub const NORM_TOLERANCE: f64 = 1e-6;

/// Focal distance of the 4D → 3D perspective camera along w
pub const BASE_FOCAL_DISTANCE: f64 = 4.0;

/// |denominator| at or below this takes the saturation branch
pub const SINGULARITY_EPSILON: f64 = 0.01;

/// Scale applied to a point that lands on the focal plane
pub const SATURATION_MAGNITUDE: f64 = 100.0;

/// Extra w amplification at zero coherence: w_factor = 1 + (1 - c) * this
pub const W_AMPLIFICATION: f64 = 2.0;

/// Coherence used until the external signal arrives (mid, not extreme)
pub const DEFAULT_COHERENCE: f64 = 0.5;

/// Default rotation speed in radians per tick
pub const DEFAULT_ROTATION_SPEED: f64 = 0.02;

/// Upper clamp for rotation speed in radians per tick
pub const MAX_ROTATION_SPEED: f64 = 0.2;

/// Angular speed of the Z'-W plane relative to the X-Y-Z rotation.
/// Non-resonant with 1.0 so the two planes precess independently.
pub const SECOND_PLANE_RATIO: f64 = 0.7;

/// Minimum opacity an edge can fade to
pub const OPACITY_FLOOR: f64 = 0.15;

/// Target render cadence (ticks per second)
pub const DEFAULT_TICK_HZ: f64 = 60.0;

/// Field EMA: weight kept from the previous score (3:1 balance)
pub const FIELD_RETENTION: f64 = 0.75;

/// Probability that a field update draws from the exploration band
pub const FIELD_PERTURBATION: f64 = 0.25;
