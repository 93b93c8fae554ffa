//! Terminal progress bars for chunk uploads and restores.

use cairn_manifest::{ProgressObserver, Step};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Forwards chunk progress to an indicatif bar on stderr.
///
/// One bar is reused across every file of a tree; its length follows the
/// `total` of whichever file is currently being processed.
pub struct ChunkBar {
    bar: ProgressBar,
}

impl ChunkBar {
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
            bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.cyan} {msg:>8} [{bar:30.cyan/blue}] {pos}/{len} chunks",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
            );
            bar
        };
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressObserver for ChunkBar {
    fn on_progress(&self, step: Step, index: usize, total: usize) {
        if self.bar.length() != Some(total as u64) {
            self.bar.set_length(total as u64);
        }
        if index == 1 {
            self.bar.set_message(step.as_str());
        }
        self.bar.set_position(index as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_bar_tracks_position() {
        let bar = ChunkBar::new(true);
        bar.on_progress(Step::Upload, 1, 3);
        bar.on_progress(Step::Upload, 2, 3);
        assert_eq!(bar.bar.position(), 2);
        assert_eq!(bar.bar.length(), Some(3));

        bar.on_progress(Step::Recreate, 1, 5);
        assert_eq!(bar.bar.length(), Some(5));
        assert_eq!(bar.bar.position(), 1);
    }
}
