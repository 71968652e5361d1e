//! Progress reporting on stderr, next to the script itself.
use std::fmt::Display;
use std::sync::LazyLock;
use std::time::Instant;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

const DIM_BLUE: Style = Style::new().blue();

static TASKS_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tasks {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
});

/// Time since `start`, e.g. `(+42ms)`.
fn elapsed(start: Instant) -> impl Display {
    DIM_BLUE.apply_to(format!("(+{}ms)", start.elapsed().as_millis()))
}

/// One bar for the whole script, advanced once per task.
pub(crate) struct Progress {
    bar: ProgressBar,
    start: Instant,
}

impl Progress {
    pub fn new(tasks: usize, silent: bool) -> Self {
        let bar = if silent {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(tasks as u64)
        };
        bar.set_style(TASKS_STYLE.clone());

        Self {
            bar,
            start: Instant::now(),
        }
    }

    pub fn task(&self, name: &str) {
        self.bar.set_message(name.to_owned());
    }

    pub fn rows(&self, name: &str, rows: u64) {
        self.bar.set_message(format!("{name} ({rows} rows)"));
    }

    pub fn done(&self) {
        self.bar.inc(1);
    }

    pub fn finish(&self) {
        self.bar.finish_with_message(format!(
            "Finished generating the script! {}",
            elapsed(self.start)
        ));
    }

    pub fn abandon(&self, name: &str) {
        self.bar.abandon_with_message(format!("Failed at {name}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_is_hidden() {
        let progress = Progress::new(3, true);
        assert!(progress.bar.is_hidden());
        progress.task("agency");
        progress.done();
        assert_eq!(progress.bar.position(), 1);
    }

    #[test]
    fn test_elapsed_format() {
        let text = elapsed(Instant::now()).to_string();
        assert!(text.contains("(+"));
        assert!(text.contains("ms)"));
    }
}
