use indicatif::{ProgressBar, ProgressStyle};

pub const TEMPLATE: &str = "[{bar:50}] {pos}/{len} ({percent}%)";

fn style() -> ProgressStyle {
    ProgressStyle::with_template(TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>.")
}

/// Segment progress bar drawn on stderr.
pub fn segment_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    bar.set_style(style());
    bar
}

/// Moves `bar` to `completed` of `total`, finishing it with the last segment.
pub fn update(bar: &ProgressBar, completed: usize, total: usize) {
    bar.set_length(total as u64);
    bar.set_position(completed.min(total) as u64);
    if completed >= total {
        bar.finish();
    }
}
