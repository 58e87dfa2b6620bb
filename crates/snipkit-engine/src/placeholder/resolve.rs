use std::collections::HashMap;

use chrono::{Local, NaiveDateTime};

use super::datetime::{
    format_datetime, DEFAULT_DATETIME_FORMAT, DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT,
};
use super::interactive::{field_for, InputFieldDefinition};
use super::{
    parse, ParsedPlaceholder, PlaceholderContext, PlaceholderType, ProcessedContent,
    TabStopDefinition, Transform,
};

/// What a single token turns into.
enum Resolution {
    /// Leave the raw token in place.
    Literal,
    Text(String),
    Cursor,
    TabStop { index: u32, default_value: Option<String> },
}

impl Resolution {
    fn replacement<'a>(&'a self, placeholder: &'a ParsedPlaceholder) -> &'a str {
        match self {
            Resolution::Literal => &placeholder.raw,
            Resolution::Text(text) => text,
            Resolution::Cursor => "",
            Resolution::TabStop { default_value, .. } => default_value.as_deref().unwrap_or(""),
        }
    }
}

/// Resolves the non-interactive placeholders using the current local time.
///
/// `input`, `select` and `tab` tokens are left as literal text.
pub fn process(content: &str, context: &PlaceholderContext) -> ProcessedContent {
    process_at(content, context, Local::now().naive_local())
}

pub fn process_at(content: &str, context: &PlaceholderContext, now: NaiveDateTime) -> ProcessedContent {
    substitute(content, |placeholder| {
        resolve_static(placeholder, context, &now).unwrap_or(Resolution::Literal)
    })
}

/// Like [`process`], additionally filling `input`/`select` tokens from
/// `input_values` (keyed by field id) and turning `tab` tokens into stops.
pub fn process_with_inputs(
    content: &str,
    context: &PlaceholderContext,
    input_values: &HashMap<String, String>,
    fields: &[InputFieldDefinition],
) -> ProcessedContent {
    process_with_inputs_at(content, context, input_values, fields, Local::now().naive_local())
}

pub fn process_with_inputs_at(
    content: &str,
    context: &PlaceholderContext,
    input_values: &HashMap<String, String>,
    fields: &[InputFieldDefinition],
    now: NaiveDateTime,
) -> ProcessedContent {
    substitute(content, |placeholder| {
        if let Some(resolution) = resolve_static(placeholder, context, &now) {
            return resolution;
        }
        match placeholder.kind {
            PlaceholderType::Input | PlaceholderType::Select => {
                resolve_field(placeholder, input_values, fields)
            }
            PlaceholderType::Tab => match parse_tab_argument(placeholder) {
                Some((index, default_value)) => Resolution::TabStop {
                    index,
                    default_value,
                },
                None => Resolution::Literal,
            },
            _ => Resolution::Literal,
        }
    })
}

/// Splits `N[:Default]`; a non-numeric index makes the token malformed.
pub(super) fn parse_tab_argument(placeholder: &ParsedPlaceholder) -> Option<(u32, Option<String>)> {
    let arg = placeholder.argument()?;
    let (index, default_value) = match arg.split_once(':') {
        Some((index, default)) => (index, Some(default).filter(|d| !d.is_empty())),
        None => (arg, None),
    };
    let index = index.trim().parse().ok()?;
    Some((index, default_value.map(str::to_string)))
}

/// Resolves the types that need no user input. `None` for the rest.
fn resolve_static(
    placeholder: &ParsedPlaceholder,
    context: &PlaceholderContext,
    now: &NaiveDateTime,
) -> Option<Resolution> {
    let resolution = match placeholder.kind {
        PlaceholderType::Clipboard => transformed(placeholder, context.clipboard.as_deref()),
        PlaceholderType::Selection => transformed(placeholder, context.selection.as_deref()),
        PlaceholderType::Cursor => Resolution::Cursor,
        PlaceholderType::Date => formatted(placeholder, now, DEFAULT_DATE_FORMAT),
        PlaceholderType::Time => formatted(placeholder, now, DEFAULT_TIME_FORMAT),
        PlaceholderType::DateTime => formatted(placeholder, now, DEFAULT_DATETIME_FORMAT),
        PlaceholderType::Input | PlaceholderType::Select | PlaceholderType::Tab => return None,
    };
    Some(resolution)
}

fn transformed(placeholder: &ParsedPlaceholder, value: Option<&str>) -> Resolution {
    let value = value.unwrap_or_default();
    let text = match placeholder.argument().and_then(Transform::from_name) {
        Some(transform) => transform.apply(value),
        None => value.to_string(),
    };
    Resolution::Text(text)
}

fn formatted(placeholder: &ParsedPlaceholder, now: &NaiveDateTime, default_format: &str) -> Resolution {
    let pattern = placeholder.argument().unwrap_or(default_format);
    Resolution::Text(format_datetime(now, pattern))
}

fn resolve_field(
    placeholder: &ParsedPlaceholder,
    input_values: &HashMap<String, String>,
    fields: &[InputFieldDefinition],
) -> Resolution {
    let Some(derived) = field_for(placeholder) else {
        return Resolution::Literal;
    };
    if let Some(value) = input_values.get(&derived.id) {
        return Resolution::Text(value.clone());
    }
    let default_value = fields
        .iter()
        .find(|field| field.id == derived.id)
        .map_or(derived.default_value.as_ref(), |field| field.default_value.as_ref());
    Resolution::Text(default_value.cloned().unwrap_or_default())
}

/// Applies `resolve` to every token and rebuilds the text.
///
/// All offsets are computed against the original content, so output positions
/// are the token start shifted by the length change of every earlier token.
/// The splice itself runs rightmost-first so earlier spans stay valid.
fn substitute<F>(content: &str, mut resolve: F) -> ProcessedContent
where
    F: FnMut(&ParsedPlaceholder) -> Resolution,
{
    let placeholders = parse(content);
    let resolutions: Vec<Resolution> = placeholders.iter().map(&mut resolve).collect();

    let mut cursor_offset = None;
    let mut tab_stops = Vec::new();
    let mut delta: isize = 0;

    for (placeholder, resolution) in placeholders.iter().zip(&resolutions) {
        let replacement = resolution.replacement(placeholder);
        let start = shift(placeholder.start_index, delta);
        match resolution {
            Resolution::Cursor if cursor_offset.is_none() => cursor_offset = Some(start),
            Resolution::TabStop {
                index,
                default_value,
            } => tab_stops.push(TabStopDefinition {
                index: *index,
                default_value: default_value.clone(),
                start_offset: start,
                end_offset: start + replacement.len(),
            }),
            _ => {}
        }
        delta += replacement.len() as isize - placeholder.raw.len() as isize;
    }

    let mut text = content.to_string();
    for (placeholder, resolution) in placeholders.iter().zip(&resolutions).rev() {
        text.replace_range(
            placeholder.start_index..placeholder.end_index,
            resolution.replacement(placeholder),
        );
    }

    // Stable: equal indices stay in source order.
    tab_stops.sort_by_key(|stop| stop.index);

    ProcessedContent {
        text,
        cursor_offset,
        tab_stops,
    }
}

fn shift(offset: usize, delta: isize) -> usize {
    offset.saturating_add_signed(delta)
}
