//! Rule-based bootstrap labeling
//!
//! Assigns a provisional type label from a parameter's name and observed
//! value. These weak labels seed the first training run when the crawler
//! output carries no ground truth. Never used at prediction time.

use super::patterns;
use crate::models::{Parameter, TypeLabel};

/// Label a parameter from its name, value and enumerated options.
///
/// First matching rule wins:
/// 1. non-empty options -> `enum`
/// 2. empty value -> `int` for id/count/size/page/limit names, else `string`
/// 3. `true`/`false` -> `bool`
/// 4. `0`/`1` on a flag-style name -> `bool`
/// 5. integer literal -> `int`
/// 6. decimal literal -> `float`
/// 7. canonical UUID -> `uuid`
/// 8. contains `@` and `.` -> `email`
/// 9. otherwise `string`
pub fn label(name: &str, value: Option<&str>, options: Option<&[String]>) -> TypeLabel {
    if options.is_some_and(|o| !o.is_empty()) {
        return TypeLabel::Enum;
    }

    let value = value.map(str::trim).unwrap_or("");
    if value.is_empty() {
        if !name.is_empty() && patterns::int_like_name().is_match(name) {
            return TypeLabel::Int;
        }
        return TypeLabel::String;
    }

    if patterns::is_bool_token(value) {
        return TypeLabel::Bool;
    }
    if (value == "0" || value == "1")
        && !name.is_empty()
        && patterns::bool_flag_name().is_match(name)
    {
        return TypeLabel::Bool;
    }
    if patterns::integer().is_match(value) {
        return TypeLabel::Int;
    }
    if patterns::decimal().is_match(value) {
        return TypeLabel::Float;
    }
    if patterns::uuid().is_match(value) {
        return TypeLabel::Uuid;
    }
    if value.contains('@') && value.contains('.') {
        return TypeLabel::Email;
    }
    TypeLabel::String
}

/// Convenience wrapper over [`label`] for a normalized parameter.
pub fn label_parameter(param: &Parameter) -> TypeLabel {
    label(
        &param.name,
        Some(param.original_value.as_str()),
        param.options(),
    )
}
