//! Per-tick output and status records.
//!
//! Field names are camelCase on the wire so a browser or canvas layer can
//! consume them directly.

use serde::{Deserialize, Serialize};

use crate::constants::{EDGE_COUNT, VERTEX_COUNT};
use crate::projection::{EdgeDraw, Vertex3D};

/// Heads-up numbers that accompany every frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Telemetry {
    pub coherence: f64,
    pub rotation_speed: f64,
    pub vertex_count: usize,
}

/// Current engine state for status displays.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub coherence: f64,
    pub rotation_speed: f64,
    pub is_running: bool,
    pub vertex_count: usize,
    pub tick: u64,
}

/// Everything a rasterizer needs for one tick. The fixed-size arrays make a
/// wrong vertex or edge count unrepresentable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub tick: u64,
    pub vertices: [Vertex3D; VERTEX_COUNT],
    pub edges: [EdgeDraw; EDGE_COUNT],
    pub telemetry: Telemetry,
}

impl Frame {
    /// True when every emitted coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.vertices.iter().all(|v| v.is_finite())
            && self.edges.iter().all(|e| e.from.is_finite() && e.to.is_finite())
    }
}

/// Serialize a frame as pretty JSON.
pub fn export_json(frame: &Frame) -> serde_json::Result<String> {
    serde_json::to_string_pretty(frame)
}
