//! JSON output for scripting.

use anyhow::Result;
use tallybar_core::UsageSnapshot;

/// Renders a snapshot as JSON.
pub fn render(snapshot: &UsageSnapshot, pretty: bool) -> Result<String> {
    let body = if pretty {
        serde_json::to_string_pretty(snapshot)?
    } else {
        serde_json::to_string(snapshot)?
    };
    Ok(body)
}
