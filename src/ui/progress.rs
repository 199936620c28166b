use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Spinner shown while a fetch cycle is at its barrier.
///
/// Resolution fans out all requests at once and joins them together, so
/// there is no meaningful per-epic progress to report; a steady spinner
/// with a message is honest about that. Call [`Self::finish_and_clear`]
/// before rendering the board so the spinner does not linger above it.
pub struct FetchSpinner {
    bar: ProgressBar,
}

impl FetchSpinner {
    pub fn new(message: impl Into<String>) -> Self {
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("progress bar template is a valid static string");
        let bar = ProgressBar::new_spinner();
        bar.set_style(style);
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.bar.set_message(message.into());
    }

    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}
