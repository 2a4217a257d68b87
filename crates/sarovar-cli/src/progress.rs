use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner for a blocking backend step
///
/// Hidden in JSON mode so stdout and stderr stay machine-readable.
pub fn create_spinner(message: &str, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Finish a spinner with success message
pub fn finish_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✓ {}", message));
}

/// Finish a spinner with error message
pub fn finish_error(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✗ {}", message));
}

/// Static text bar for a fraction in [0, 1], e.g. `[████░░░░░░]`
pub fn fraction_bar(fraction: f64, width: usize) -> String {
    let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
    let filled = (fraction * width as f64).round() as usize;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_bar() {
        assert_eq!(fraction_bar(0.0, 4), "[░░░░]");
        assert_eq!(fraction_bar(0.5, 4), "[██░░]");
        assert_eq!(fraction_bar(1.7, 4), "[████]");
        assert_eq!(fraction_bar(f64::NAN, 2), "[░░]");
    }
}
