use std::io::{self, Write};

use mcw_diff::ProgressSink;

const BAR_WIDTH: u64 = 20;

/// Single-line progress bar on stderr, redrawn in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn report(&self, done: u64, total: u64, stage: &str) {
        let mut err = io::stderr().lock();
        let _ = write!(err, "\r{}", render_bar(done, total, stage));
        let _ = err.flush();
    }

    fn finish(&self, _stage: &str) {
        let _ = writeln!(io::stderr().lock());
    }
}

/// `\t[#####     ] done/total, pct% stage`
pub fn render_bar(done: u64, total: u64, stage: &str) -> String {
    let done = done.min(total);
    let (filled, percent) = if total == 0 {
        (BAR_WIDTH, 100)
    } else {
        (
            (done * BAR_WIDTH * 2 + total) / (total * 2),
            (done * 200 + total) / (total * 2),
        )
    };
    let filled = usize::try_from(filled).unwrap_or(0);
    let width = usize::try_from(BAR_WIDTH).unwrap_or(0);
    format!(
        "\t[{}{}] {done}/{total}, {percent}% {stage}",
        "#".repeat(filled),
        " ".repeat(width - filled),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bar() {
        assert_eq!(render_bar(0, 10, "x"), format!("\t[{}] 0/10, 0% x", " ".repeat(20)));
    }

    #[test]
    fn half_bar_rounds() {
        assert_eq!(
            render_bar(1, 2, "comparing chunks"),
            format!("\t[{}{}] 1/2, 50% comparing chunks", "#".repeat(10), " ".repeat(10))
        );
        // 1/3 is 6.67 cells and 33.3%.
        let filled = format!("\t[{}{}]", "#".repeat(7), " ".repeat(13));
        assert!(render_bar(1, 3, "s").starts_with(&filled));
        assert!(render_bar(1, 3, "s").contains(" 33% "));
    }

    #[test]
    fn zero_total_is_complete() {
        assert_eq!(render_bar(0, 0, "s"), format!("\t[{}] 0/0, 100% s", "#".repeat(20)));
    }

    #[test]
    fn overshoot_is_clamped() {
        assert!(render_bar(12, 10, "s").contains("10/10, 100%"));
    }
}
