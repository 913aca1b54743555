//! Follow a running `tess serve` over its `/frames` event stream.

use anyhow::{Context, Result, bail};
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use tess_core::Frame;

/// Print one telemetry line per received frame. Stops after `count` frames
/// when given, otherwise when the server closes the stream.
pub async fn follow(base_url: &str, count: Option<u64>) -> Result<u64> {
    let url = format!("{}/frames", base_url.trim_end_matches('/'));
    let response = reqwest::get(&url)
        .await
        .with_context(|| format!("failed to connect to {url}"))?;
    if !response.status().is_success() {
        bail!("{url} returned {}", response.status());
    }

    let mut events = response.bytes_stream().eventsource();
    let mut received = 0;
    while let Some(event) = events.next().await {
        let event = event.map_err(|e| anyhow::anyhow!("event stream error: {e}"))?;
        if event.event != "frame" {
            continue;
        }
        let frame: Frame =
            serde_json::from_str(&event.data).context("failed to decode frame event")?;
        println!("{}", telemetry_line(&frame));
        received += 1;
        if count.is_some_and(|n| received >= n) {
            break;
        }
    }
    Ok(received)
}

pub fn telemetry_line(frame: &Frame) -> String {
    serde_json::json!({
        "tick": frame.tick,
        "coherence": frame.telemetry.coherence,
        "rotationSpeed": frame.telemetry.rotation_speed,
        "vertexCount": frame.telemetry.vertex_count,
    })
    .to_string()
}
