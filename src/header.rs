//! Front-matter lookup for the "not yet translated" marker.

use crate::config::MarkerConfig;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{line_ending, not_line_ending, space0},
    combinator::{eof, not, recognize, value},
    multi::many0_count,
    sequence::{preceded, terminated},
};

/// Whether `content` starts with a YAML (`---`) or TOML (`+++`) front matter
/// holding `marker.key` set to `marker.value`.
pub(crate) fn has_marker(content: &[u8], marker: &MarkerConfig) -> bool {
    let Ok(text) = std::str::from_utf8(content) else {
        return false;
    };
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let found = match front_matter(text) {
        Ok((_, ("---", block))) => yaml_value(block, &marker.key),
        Ok((_, (_, block))) => toml_value(block, &marker.key),
        Err(_) => None,
    };
    found.is_some_and(|v| v.eq_ignore_ascii_case(&marker.value))
}

/// The fence and the lines between it and its closing twin.
fn front_matter(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, fence) = terminated(alt((tag("---"), tag("+++"))), (space0, line_ending)).parse(input)?;
    let (input, block) = recognize(many0_count(preceded(
        not(fence_line(fence)),
        (not_line_ending, line_ending),
    )))
    .parse(input)?;
    let (input, _) = fence_line(fence).parse(input)?;

    Ok((input, (fence, block)))
}

fn fence_line<'a>(fence: &'a str) -> impl Parser<&'a str, Output = (), Error = nom::error::Error<&'a str>> {
    value((), (tag(fence), space0, alt((line_ending, eof))))
}

fn yaml_value(block: &str, key: &str) -> Option<String> {
    let mapping = match serde_yaml::from_str::<serde_yaml::Mapping>(block) {
        Ok(mapping) => mapping,
        Err(err) => {
            log::debug!("Ignoring unreadable YAML front matter: {}", err);
            return None;
        }
    };

    match mapping.get(key)? {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn toml_value(block: &str, key: &str) -> Option<String> {
    let table = match toml::from_str::<toml::Table>(block) {
        Ok(table) => table,
        Err(err) => {
            log::debug!("Ignoring unreadable TOML front matter: {}", err);
            return None;
        }
    };

    match table.get(key)? {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Integer(i) => Some(i.to_string()),
        _ => None,
    }
}
