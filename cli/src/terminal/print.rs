use colored::*;
use sweepr_common::summary::PipelineSummary;
use tracing::info;

use crate::terminal::colors;

pub const PRINT_TARGET: &str = "sweepr::print";
pub const TOTAL_WIDTH: usize = 64;
const KEY_WIDTH: usize = 16;

pub fn print(msg: &str) {
    info!(target: PRINT_TARGET, "{msg}");
}

pub fn header(msg: &str) {
    let formatted: String = format!("⟦ {} ⟧", msg);
    let msg_len: usize = console::measure_text_width(&formatted);

    let dash_count: usize = TOTAL_WIDTH.saturating_sub(msg_len);
    let left: usize = dash_count / 2;
    let right: usize = dash_count - left;

    let line: String = format!(
        "{}{}{}",
        "─".repeat(left).color(colors::SEPARATOR),
        formatted.to_uppercase().color(colors::PRIMARY),
        "─".repeat(right).color(colors::SEPARATOR)
    );

    print(&line);
}

pub fn fat_separator() {
    print(&format!("{}", "═".repeat(TOTAL_WIDTH).color(colors::SEPARATOR)));
}

pub fn aligned_line(key: &str, value: ColoredString) {
    let dots: String = ".".repeat(KEY_WIDTH.saturating_sub(key.len()));
    let output: String = format!(
        "{} {}{}{} {}",
        ">".color(colors::SEPARATOR),
        key.color(colors::TEXT_DEFAULT),
        dots.color(colors::SEPARATOR),
        ":".color(colors::SEPARATOR),
        value
    );
    print(&output);
}

pub fn centerln(msg: &str) {
    let pad: usize = TOTAL_WIDTH.saturating_sub(console::measure_text_width(msg)) / 2;
    print(&format!("{}{}", " ".repeat(pad), msg));
}

fn count(n: usize, bad: bool) -> ColoredString {
    if bad && n > 0 {
        n.to_string().color(colors::FAILURE).bold()
    } else {
        n.to_string().color(colors::ACCENT)
    }
}

pub fn summary(summary: &PipelineSummary) {
    header("scan summary");
    aligned_line("Targets", count(summary.targets, false));
    aligned_line("Scanned", count(summary.scanned, false));
    aligned_line("Failed", count(summary.failed, true));
    aligned_line("Skipped", count(summary.skipped, true));
    aligned_line("Records", count(summary.records, false));
    aligned_line("Saved", count(summary.persisted, false));
    aligned_line("Save failures", count(summary.persist_failures, true));

    let saved: ColoredString = format!("{} records saved", summary.persisted).bold().green();
    let total_time: ColoredString = format!("{:.2}s", summary.elapsed.as_secs_f64())
        .bold()
        .yellow();

    fat_separator();
    centerln(&format!("Sweep complete: {saved} in {total_time}"));
}
