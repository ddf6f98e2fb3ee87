// src/present.rs

use std::fmt::Display;

/// `NHS Fife\t|\t1234`
pub fn single(name: &str, value: impl Display) -> String {
    format!("{name}\t|\t{value}")
}

/// One `name | value` line per board, padded so the separators line up two
/// columns past the longest name. `names` and `values` must be the same
/// length.
pub fn table<V: Display>(names: &[String], values: &[V]) -> String {
    debug_assert_eq!(names.len(), values.len(), "one value per name");
    let width = names.iter().map(|n| n.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for (name, value) in names.iter().zip(values) {
        let pad = width - name.chars().count() + 2;
        out.push_str(&format!("{name}{:pad$} | {value}\n", ""));
    }
    out
}

pub fn bullet_list(names: &[String]) -> String {
    names.iter().map(|n| format!("*  {n}\n")).collect()
}
