//! Column layout shared by every dump: fixed-width, left-justified cells
//! separated by a single space.

use crate::constants::FIELDS;
use crate::models::User;

pub const COLSIZ: usize = 10;

/// Upper-cases the first letter of every alphabetic run and lower-cases the rest.
#[must_use]
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_word = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

#[must_use]
pub fn header_cell(name: &str) -> String {
    format!("{:<width$}", name.to_uppercase(), width = COLSIZ)
}

#[must_use]
pub fn value_cell(value: impl ToString) -> String {
    format!("{:<width$}", title_case(&value.to_string()), width = COLSIZ)
}

#[must_use]
pub fn header_line() -> String {
    FIELDS
        .iter()
        .map(|name| header_cell(name))
        .collect::<Vec<_>>()
        .join(" ")
}

#[must_use]
pub fn row_line(user: &User) -> String {
    [
        value_cell(&user.login),
        value_cell(user.userid),
        value_cell(user.projid),
    ]
    .join(" ")
}
