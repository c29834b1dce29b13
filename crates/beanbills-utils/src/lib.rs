//! Filename and path helpers

use std::path::{Component, Path, PathBuf};

/// Letters with diacritics kept in folder names (Portuguese set, both cases)
pub const ACCENTED_LETTERS: &str = "ãâáàẽêéèĩîíìõôóòũûúùçÃÂÁÀẼÊÉÈĨÎÍÌÕÔÓÒŨÛÚÙÇ";

/// Map free text to a filesystem-safe fragment.
///
/// Every character outside the allowed set becomes a single space, then runs
/// of spaces are collapsed. Leading and trailing spaces are kept.
pub fn sanitize_filename(text: &str) -> String {
    static DISALLOWED: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let disallowed_regex = DISALLOWED.get_or_init(|| {
        regex::Regex::new(&format!(r"[^0-9A-Za-z_.'{}€£$-]", ACCENTED_LETTERS)).unwrap()
    });

    let replaced = disallowed_regex.replace_all(text, " ");
    collapse_spaces(&replaced)
}

/// Collapse runs of two or more spaces into one
pub fn collapse_spaces(text: &str) -> String {
    static SPACE_RUNS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let space_regex = SPACE_RUNS.get_or_init(|| regex::Regex::new(r" {2,}").unwrap());

    space_regex.replace_all(text, " ").into_owned()
}

/// Lexically compute `target` relative to the directory `base`.
///
/// Returns `None` when one path is absolute and the other is not, or when
/// `base` climbs above the shared prefix with `..` so no relative path exists.
pub fn relative_path(base: &Path, target: &Path) -> Option<PathBuf> {
    if base.is_absolute() != target.is_absolute() {
        return None;
    }

    let base = normalize(base);
    let target = normalize(target);

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    if base[common..].iter().any(|c| *c == Component::ParentDir) {
        return None;
    }

    let mut out = PathBuf::new();
    for _ in common..base.len() {
        out.push("..");
    }
    for c in &target[common..] {
        out.push(c.as_os_str());
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }
    Some(out)
}

fn normalize(path: &Path) -> Vec<Component<'_>> {
    let mut out: Vec<Component<'_>> = Vec::new();
    for c in path.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(c),
            },
            other => out.push(other),
        }
    }
    out
}
