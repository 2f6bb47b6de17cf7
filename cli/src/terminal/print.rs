use std::fmt::Display;

use colored::*;
use tracing::info;
use unicode_width::UnicodeWidthStr;

use super::colors;
use super::logging::PRINT_TARGET;

pub const TOTAL_WIDTH: usize = 64;

pub fn print(msg: &str) {
    info!(target: PRINT_TARGET, "{}", msg);
}

pub fn banner() {
    let title = format!("⟦ NETFANG v{} ⟧", env!("CARGO_PKG_VERSION"));
    print(&framed(&title, "═", |t| t.bright_green().bold()));
}

pub fn header(msg: &str) {
    let title = format!("⟦ {} ⟧", msg.to_uppercase());
    print(&framed(&title, "─", |t| t.color(colors::PRIMARY)));
}

/// Centres `title` in a rule of `fill` spanning the terminal width.
fn framed(title: &str, fill: &str, paint: impl Fn(&str) -> ColoredString) -> String {
    let pad = TOTAL_WIDTH.saturating_sub(UnicodeWidthStr::width(title));
    let left = pad / 2;
    format!(
        "{}{}{}",
        fill.repeat(left).color(colors::SEPARATOR),
        paint(title),
        fill.repeat(pad - left).color(colors::SEPARATOR)
    )
}

/// `key.....: value`, keys padded to `width`.
pub fn aligned_line(key: &str, width: usize, value: impl Display) {
    let dots: String = ".".repeat((width + 1).saturating_sub(UnicodeWidthStr::width(key)));
    print_status(format!(
        "{}{}{} {}",
        key.color(colors::PRIMARY),
        dots.color(colors::SEPARATOR),
        ":".color(colors::SEPARATOR),
        value
    ));
}

pub fn print_status<T: AsRef<str>>(msg: T) {
    let prefix: ColoredString = ">".color(colors::SEPARATOR);
    print(&format!("{} {}", prefix, msg.as_ref().color(colors::TEXT_DEFAULT)));
}

pub fn tree_head(idx: usize, name: &str) {
    let idx_str: String = format!("[{}]", idx.to_string().color(colors::ACCENT));
    print(&format!(
        "{} {}",
        idx_str.color(colors::SEPARATOR),
        name.color(colors::PRIMARY)
    ));
}

pub fn as_tree_one_level(key_value_pair: &[(String, ColoredString)]) {
    let width = key_value_pair
        .iter()
        .map(|(key, _)| UnicodeWidthStr::width(key.as_str()))
        .max()
        .unwrap_or(0);

    for (i, (key, value)) in key_value_pair.iter().enumerate() {
        let last: bool = i + 1 == key_value_pair.len();
        let branch: ColoredString = if !last {
            "├─".bright_black()
        } else {
            "└─".bright_black()
        };
        print(&format!(
            " {} {}{}{} {}",
            branch,
            key.color(colors::TEXT_DEFAULT),
            ".".repeat(width.saturating_sub(UnicodeWidthStr::width(key.as_str())) + 1)
                .color(colors::SEPARATOR),
            ":".color(colors::SEPARATOR),
            value
        ));
    }
}

pub fn end_of_program() {
    print(&format!("{}", "═".repeat(TOTAL_WIDTH).color(colors::SEPARATOR)));
}
