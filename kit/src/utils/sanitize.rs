use regex::Regex;
use std::sync::OnceLock;

pub const FIGURE_EXTENSION: &str = "png";

const SEPARATOR: char = '_';

fn separator_runs() -> &'static Regex {
    static RUNS: OnceLock<Regex> = OnceLock::new();
    RUNS.get_or_init(|| Regex::new("_{2,}").expect("static pattern"))
}

/// Turn a free-form figure title into a file base name.
///
/// Spaces become `_`, everything outside `[A-Za-z0-9_]` is dropped and runs
/// of `_` collapse to one. Titles made only of punctuation come out empty.
pub fn sanitize_base_name(title: &str) -> String {
    let kept: String = title
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == SEPARATOR)
        .collect();

    separator_runs().replace_all(&kept, "_").into_owned()
}

/// Sanitized base name plus `.{extension}`.
pub fn sanitized_file_name(title: &str, extension: &str) -> String {
    format!("{}.{}", sanitize_base_name(title), extension)
}
