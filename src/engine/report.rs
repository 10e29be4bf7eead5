use std::fmt::Write;

use crate::engine::models::Classification;

/// Render the stdout report: one URL per line for new and updated assets,
/// then removed keys on a single ` | `-joined line.
pub fn render(result: &Classification) -> String {
    let mut out = String::new();

    out.push_str("New Asset:\n");
    for asset in &result.appended {
        let _ = writeln!(out, "{}", asset.url);
    }

    out.push_str("Updated Asset:\n");
    for asset in &result.updated {
        let _ = writeln!(out, "{}", asset.url);
    }

    out.push_str("Removed Asset:\n");
    let removed: Vec<String> = result.removed.iter().map(|key| key.removed_label()).collect();
    let _ = writeln!(out, "{}", removed.join(" | "));

    out
}
