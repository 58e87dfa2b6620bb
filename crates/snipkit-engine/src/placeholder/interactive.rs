use serde::Serialize;

use super::{parse, ParsedPlaceholder, PlaceholderType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFieldKind {
    Text,
    Select,
}

/// One field the user must fill in before the template can be expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputFieldDefinition {
    /// `"{type}_{start_index}"`, unique within one content string.
    pub id: String,
    pub kind: InputFieldKind,
    pub label: String,
    pub default_value: Option<String>,
    /// Only populated for select fields.
    pub options: Vec<String>,
}

/// Lists the interactive fields of `content` in document order.
///
/// Returns `None` when there is nothing to ask, so callers never show an
/// empty form.
pub fn analyze_interactive(content: &str) -> Option<Vec<InputFieldDefinition>> {
    let fields: Vec<_> = parse(content).iter().filter_map(field_for).collect();
    if fields.is_empty() { None } else { Some(fields) }
}

pub(super) fn field_id(placeholder: &ParsedPlaceholder) -> String {
    format!("{}_{}", placeholder.kind.keyword(), placeholder.start_index)
}

/// Derives the field for an `input`/`select` token, or `None` when the token
/// is some other type or is missing its label/options.
pub(super) fn field_for(placeholder: &ParsedPlaceholder) -> Option<InputFieldDefinition> {
    let arg = placeholder.argument()?;
    match placeholder.kind {
        PlaceholderType::Input => {
            let (label, default_value) = match arg.split_once(':') {
                Some((label, default)) => (label, Some(default.to_string())),
                None => (arg, None),
            };
            if label.is_empty() {
                return None;
            }
            Some(InputFieldDefinition {
                id: field_id(placeholder),
                kind: InputFieldKind::Text,
                label: label.to_string(),
                default_value,
                options: Vec::new(),
            })
        }
        PlaceholderType::Select => {
            let (label, raw_options) = arg.split_once(':')?;
            let options: Vec<String> = raw_options
                .split(',')
                .map(str::trim)
                .filter(|option| !option.is_empty())
                .map(str::to_string)
                .collect();
            if label.is_empty() || options.is_empty() {
                return None;
            }
            Some(InputFieldDefinition {
                id: field_id(placeholder),
                kind: InputFieldKind::Select,
                label: label.to_string(),
                default_value: options.first().cloned(),
                options,
            })
        }
        _ => None,
    }
}
