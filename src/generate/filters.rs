//! Case-conversion filters available to templates.
//!
//! | Filter   | `"http_port"` | `"logLevel"` |
//! |----------|---------------|--------------|
//! | `camel`  | `httpPort`    | `logLevel`   |
//! | `pascal` | `HttpPort`    | `LogLevel`   |
//! | `snake`  | `http_port`   | `log_level`  |
//! | `kebab`  | `http-port`   | `log-level`  |
//!
//! Words are split on any non-alphanumeric character and before an uppercase
//! letter that follows a non-uppercase character, so runs of capitals such as
//! `HTTP` stay one word.

use std::collections::HashMap;
use tera::{Tera, Value};

/// Register every case filter on `tera`.
pub fn register(tera: &mut Tera) {
    tera.register_filter("camel", case_filter("camel", to_camel_case));
    tera.register_filter("pascal", case_filter("pascal", to_pascal_case));
    tera.register_filter("snake", case_filter("snake", to_snake_case));
    tera.register_filter("kebab", case_filter("kebab", to_kebab_case));
}

fn case_filter(
    name: &'static str,
    convert: fn(&str) -> String,
) -> impl tera::Filter + 'static {
    move |value: &Value, _args: &HashMap<String, Value>| -> tera::Result<Value> {
        let input = value
            .as_str()
            .ok_or_else(|| tera::Error::msg(format!("{name} filter requires a string, got {value}")))?;
        Ok(Value::String(convert(input)))
    }
}

/// Split into lowercase words.
pub fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut previous_upper = false;

    for (index, ch) in input.chars().enumerate() {
        if ch.is_alphanumeric() {
            if index > 0 && ch.is_uppercase() && !previous_upper && !word.is_empty() {
                words.push(std::mem::take(&mut word));
            }
            word.extend(ch.to_lowercase());
        } else if !word.is_empty() {
            words.push(std::mem::take(&mut word));
        }
        previous_upper = ch.is_uppercase();
    }

    if !word.is_empty() {
        words.push(word);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn to_camel_case(input: &str) -> String {
    split_words(input)
        .iter()
        .enumerate()
        .map(|(i, word)| if i == 0 { word.clone() } else { capitalize(word) })
        .collect()
}

pub fn to_pascal_case(input: &str) -> String {
    split_words(input).iter().map(|word| capitalize(word)).collect()
}

pub fn to_snake_case(input: &str) -> String {
    split_words(input).join("_")
}

pub fn to_kebab_case(input: &str) -> String {
    split_words(input).join("-")
}
