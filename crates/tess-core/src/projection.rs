//! 4D → 3D perspective projection modulated by coherence.
//!
//! The only place the external signal touches geometry is the w
//! amplification: `w_factor = 1 + (1 - c) * W_AMPLIFICATION`. Low coherence
//! pushes points toward the focal plane and distorts the shape.

use serde::{Deserialize, Serialize};

use crate::constants::{
    BASE_FOCAL_DISTANCE, DEFAULT_COHERENCE, EDGE_COUNT, OPACITY_FLOOR, SATURATION_MAGNITUDE,
    SINGULARITY_EPSILON, VERTEX_COUNT, W_AMPLIFICATION,
};
use crate::topology::{Edge, Vertex4D};

/// Projected point. Recomputed every tick; identity is its source index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vertex3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vertex3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Largest absolute coordinate.
    pub fn max_abs(self) -> f64 {
        self.x.abs().max(self.y.abs()).max(self.z.abs())
    }
}

/// One line segment ready for a rasterizer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeDraw {
    pub from: Vertex3D,
    pub to: Vertex3D,
    /// Mean projected z of the endpoints.
    pub depth: f64,
    /// In [OPACITY_FLOOR, 1]; deeper edges are more transparent.
    pub opacity: f64,
    /// Source vertex indices.
    pub edge: (usize, usize),
}

/// Clamp coherence into [0, 1]. NaN falls back to the default mid value.
pub fn clamp_coherence(coherence: f64) -> f64 {
    if coherence.is_nan() {
        return DEFAULT_COHERENCE;
    }
    coherence.clamp(0.0, 1.0)
}

/// Opacity for an edge at the given mean depth.
pub fn depth_opacity(depth: f64) -> f64 {
    (1.0 / (1.0 + depth.abs())).max(OPACITY_FLOOR)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    pub base_focal_distance: f64,
    pub singularity_epsilon: f64,
    pub saturation: f64,
    pub w_amplification: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            base_focal_distance: BASE_FOCAL_DISTANCE,
            singularity_epsilon: SINGULARITY_EPSILON,
            saturation: SATURATION_MAGNITUDE,
            w_amplification: W_AMPLIFICATION,
        }
    }
}

/// Projects rotated vertices and orders the resulting edges by depth.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProjectionPipeline {
    config: ProjectionConfig,
}

impl ProjectionPipeline {
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// w amplification for a (clamped) coherence value: 3.0 at c=0, 1.0 at c=1
    /// with the default amplification.
    pub fn w_factor(&self, coherence: f64) -> f64 {
        1.0 + (1.0 - clamp_coherence(coherence)) * self.config.w_amplification
    }

    /// Perspective divide along w.
    ///
    /// When `|denominator| <= epsilon` the point sits on the focal plane: it is
    /// pushed outward by the saturation magnitude in the sign direction of the
    /// denominator instead of being divided, so the result is always finite.
    pub fn project(&self, point: Vertex4D, coherence: f64) -> Vertex3D {
        let w_scaled = point.w * self.w_factor(coherence);
        let denominator = self.config.base_focal_distance - w_scaled;

        if denominator.abs() > self.config.singularity_epsilon {
            Vertex3D::new(
                point.x / denominator,
                point.y / denominator,
                point.z / denominator,
            )
        } else {
            let scale = self.config.saturation * denominator.signum();
            Vertex3D::new(point.x * scale, point.y * scale, point.z * scale)
        }
    }

    pub fn project_all(
        &self,
        points: &[Vertex4D; VERTEX_COUNT],
        coherence: f64,
    ) -> [Vertex3D; VERTEX_COUNT] {
        std::array::from_fn(|i| self.project(points[i], coherence))
    }

    /// Build the draw list: deepest |z| first, ties by edge index.
    pub fn edge_draws(
        &self,
        projected: &[Vertex3D; VERTEX_COUNT],
        edges: &[Edge; EDGE_COUNT],
    ) -> [EdgeDraw; EDGE_COUNT] {
        let draws: [EdgeDraw; EDGE_COUNT] = std::array::from_fn(|i| {
            let Edge { a, b } = edges[i];
            let (from, to) = (projected[a], projected[b]);
            let depth = (from.z + to.z) / 2.0;
            EdgeDraw {
                from,
                to,
                depth,
                opacity: depth_opacity(depth),
                edge: (a, b),
            }
        });

        let mut order: [usize; EDGE_COUNT] = std::array::from_fn(|i| i);
        order.sort_by(|&i, &j| {
            draws[j]
                .depth
                .abs()
                .total_cmp(&draws[i].depth.abs())
                .then(i.cmp(&j))
        });

        std::array::from_fn(|k| draws[order[k]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::HypercubeTopology;
    use approx::assert_relative_eq;

    fn pipeline() -> ProjectionPipeline {
        ProjectionPipeline::default()
    }

    #[test]
    fn test_w_factor_range() {
        let p = pipeline();
        assert_relative_eq!(p.w_factor(0.0), 3.0);
        assert_relative_eq!(p.w_factor(0.5), 2.0);
        assert_relative_eq!(p.w_factor(1.0), 1.0);
    }

    #[test]
    fn test_clamp_coherence() {
        assert_eq!(clamp_coherence(-0.3), 0.0);
        assert_eq!(clamp_coherence(1.7), 1.0);
        assert_eq!(clamp_coherence(f64::INFINITY), 1.0);
        assert_eq!(clamp_coherence(f64::NEG_INFINITY), 0.0);
        assert_eq!(clamp_coherence(f64::NAN), DEFAULT_COHERENCE);
        assert_eq!(clamp_coherence(0.42), 0.42);
    }

    #[test]
    fn test_standard_divide() {
        // c = 1 → w_factor 1, denominator = 4 - 1 = 3
        let out = pipeline().project(Vertex4D::new(3.0, -6.0, 1.5, 1.0), 1.0);
        assert_relative_eq!(out.x, 1.0);
        assert_relative_eq!(out.y, -2.0);
        assert_relative_eq!(out.z, 0.5);
    }

    #[test]
    fn test_singularity_saturates() {
        // c = 0 → w_factor 3; w = 4/3 puts the point on the focal plane
        let point = Vertex4D::new(0.5, -0.25, 1.0, 4.0 / 3.0);
        let out = pipeline().project(point, 0.0);
        assert!(out.is_finite());
        assert!(out.max_abs() <= SATURATION_MAGNITUDE * 1.0 + 1e-9);
        assert_relative_eq!(out.x.abs(), 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_saturation_follows_denominator_sign() {
        let p = pipeline();
        // denominator = 4 - 4.005 < 0 but inside epsilon
        let below = p.project(Vertex4D::new(1.0, 0.0, 0.0, 4.005), 1.0);
        assert_relative_eq!(below.x, -SATURATION_MAGNITUDE);
        // denominator = 4 - 3.995 > 0, inside epsilon
        let above = p.project(Vertex4D::new(1.0, 0.0, 0.0, 3.995), 1.0);
        assert_relative_eq!(above.x, SATURATION_MAGNITUDE);
    }

    #[test]
    fn test_nan_coherence_projects_like_default() {
        let p = pipeline();
        let v = Vertex4D::new(1.0, 1.0, -1.0, 1.0);
        assert_eq!(p.project(v, f64::NAN), p.project(v, DEFAULT_COHERENCE));
    }

    #[test]
    fn test_coherence_changes_output() {
        let p = pipeline();
        let v = Vertex4D::new(1.0, 1.0, 1.0, 1.0);
        // denominators 4 - 3 = 1 and 4 - 1 = 3
        let low = p.project(v, 0.0);
        let high = p.project(v, 1.0);
        assert_relative_eq!(low.x, 1.0);
        assert_relative_eq!(high.x, 1.0 / 3.0);
    }

    #[test]
    fn test_depth_opacity() {
        assert_relative_eq!(depth_opacity(0.0), 1.0);
        assert_relative_eq!(depth_opacity(-1.0), 0.5);
        assert_relative_eq!(depth_opacity(1000.0), OPACITY_FLOOR);
    }

    #[test]
    fn test_edge_draws_sorted_far_first() {
        let topo = HypercubeTopology::new().unwrap();
        let p = pipeline();
        let projected = p.project_all(topo.vertices(), 0.5);
        let draws = p.edge_draws(&projected, topo.edges());

        for pair in draws.windows(2) {
            assert!(pair[0].depth.abs() >= pair[1].depth.abs());
        }
        let mut seen: Vec<(usize, usize)> = draws.iter().map(|d| d.edge).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), EDGE_COUNT);
    }

    #[test]
    fn test_edge_draw_ties_break_by_index() {
        let topo = HypercubeTopology::new().unwrap();
        let p = pipeline();
        // Every projected point at the origin: all depths tie at zero
        let projected = [Vertex3D::default(); VERTEX_COUNT];
        let draws = p.edge_draws(&projected, topo.edges());
        for (draw, edge) in draws.iter().zip(topo.edges()) {
            assert_eq!(draw.edge, (edge.a, edge.b));
        }
    }
}
