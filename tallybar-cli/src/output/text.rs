//! Text output formatting with progress bars and colors.

use chrono::{DateTime, Local, Utc};
use tallybar_core::{ProviderUsageResult, UsageSnapshot, UsageWindow};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

// Progress bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    bar_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            bar_width: 10,
        }
    }

    /// Formats a full snapshot: one block per provider plus a footer.
    pub fn format_snapshot(&self, snapshot: &UsageSnapshot) -> String {
        let mut blocks = Vec::new();

        if snapshot.results.is_empty() {
            blocks.push("No usage data yet.".to_string());
        }
        for result in &snapshot.results {
            blocks.push(self.format_result(result));
        }
        blocks.push(self.format_footer(snapshot));

        blocks.join("\n\n")
    }

    /// Formats one provider's result.
    pub fn format_result(&self, result: &ProviderUsageResult) -> String {
        let mut lines = Vec::new();

        let mut header = self.bold(result.provider.display_name());
        if let Some(label) = &result.account_label {
            header.push_str(&format!(" ({label})"));
        }
        if result.is_stale {
            header.push_str(&self.dim(" [stale]"));
        }
        if let Some(error) = &result.error_state {
            header.push_str(&format!(" {}", self.red(&format!("⚠ {}", error.badge()))));
        }
        lines.push(header);

        if let Some(primary) = &result.primary_window {
            lines.push(self.format_window(primary, "Session"));
        }
        if let Some(secondary) = &result.secondary_window {
            lines.push(self.format_window(secondary, "Weekly"));
        }
        for model in &result.per_model_windows {
            lines.push(self.format_window(&model.window, &model.model));
        }

        if let Some(error) = &result.error_state {
            lines.push(self.dim(&error.detail()));
        } else if !result.has_data() {
            lines.push(self.dim("No usage reported."));
        }

        lines.join("\n")
    }

    /// Formats a usage window with a progress bar.
    fn format_window(&self, window: &UsageWindow, label: &str) -> String {
        let remaining = window.remaining_percent();
        let bar = self.progress_bar(remaining);
        let pct = self.color_for_percent(remaining, &format!("{remaining:.0}% left"));

        let mut line = format!("{:<10} {bar} {pct}", format!("{label}:"));
        if let Some(resets_at) = window.resets_at {
            line.push_str(&self.dim(&format!(" resets {}", format_reset(resets_at))));
        }
        line
    }

    fn format_footer(&self, snapshot: &UsageSnapshot) -> String {
        let mut parts = Vec::new();

        if let Some(min) = snapshot.minimum_remaining_percent() {
            parts.push(self.color_for_percent(min, &format!("Tightest quota: {min:.0}% left")));
        }
        if let Some(updated) = snapshot.last_updated {
            let local: DateTime<Local> = updated.into();
            parts.push(self.dim(&format!("Updated {}", local.format("%H:%M:%S"))));
        }
        if snapshot.is_refreshing {
            parts.push(self.dim("Refreshing…"));
        }

        parts.join("  ")
    }

    /// Renders a remaining-percent progress bar.
    fn progress_bar(&self, remaining: f64) -> String {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let filled = ((remaining / 100.0) * self.bar_width as f64).round() as usize;
        let filled = filled.min(self.bar_width);

        let mut bar = String::with_capacity(self.bar_width);
        for _ in 0..filled {
            bar.push(BAR_FULL);
        }
        for _ in filled..self.bar_width {
            bar.push(BAR_EMPTY);
        }
        bar
    }

    // ========================================================================
    // Color helpers
    // ========================================================================

    fn color_for_percent(&self, remaining: f64, text: &str) -> String {
        if !self.use_colors {
            return text.to_string();
        }
        let color = if remaining <= 10.0 {
            RED
        } else if remaining <= 25.0 {
            YELLOW
        } else {
            GREEN
        };
        format!("{color}{text}{RESET}")
    }

    fn bold(&self, text: &str) -> String {
        if self.use_colors {
            format!("{BOLD}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.use_colors {
            format!("{DIM}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn red(&self, text: &str) -> String {
        if self.use_colors {
            format!("{RED}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

/// Human description of a reset time relative to now.
fn format_reset(resets_at: DateTime<Utc>) -> String {
    let delta = resets_at - Utc::now();
    let minutes = delta.num_minutes();
    if minutes < 0 {
        "soon".to_string()
    } else if minutes < 60 {
        format!("in {minutes}m")
    } else if minutes < 48 * 60 {
        format!("in {}h", delta.num_hours())
    } else {
        format!("in {}d", delta.num_days())
    }
}
