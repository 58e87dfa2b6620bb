//! # Placeholder micro-language
//!
//! Template content may contain `<type[:arg]>` tokens that are resolved at
//! expansion time:
//!
//! | Token | Resolves to |
//! |-------|-------------|
//! | `<clipboard[:transform]>` | clipboard text, optionally `upper`/`lower`/`title`/`trim` |
//! | `<selection[:transform]>` | selected text, same transforms |
//! | `<cursor>` | nothing; marks where the caret lands |
//! | `<date[:FMT]>`, `<time[:FMT]>`, `<datetime[:FMT]>` | current local time |
//! | `<input:Label[:Default]>` | value typed into the interactive form |
//! | `<select:Label:a,b,c>` | option picked in the interactive form |
//! | `<tab:N[:Default]>` | a tab stop, optionally pre-filled |
//!
//! Resolution never fails. Anything the grammar does not recognize, or a
//! recognized token missing a required argument, is left in the output exactly
//! as written so the template author can see and fix it in place.

mod datetime;
mod interactive;
mod resolve;
mod transform;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub use datetime::{format_datetime, DEFAULT_DATETIME_FORMAT, DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT};
pub use interactive::{analyze_interactive, InputFieldDefinition, InputFieldKind};
pub use resolve::{process, process_at, process_with_inputs, process_with_inputs_at};
pub use transform::Transform;

static PLACEHOLDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(clipboard|selection|cursor|datetime|date|time|input|select|tab)(?::([^>]*))?>")
        .expect("placeholder pattern must compile")
});

/// The recognized placeholder keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderType {
    Clipboard,
    Selection,
    Cursor,
    Date,
    Time,
    DateTime,
    Input,
    Select,
    Tab,
}

impl PlaceholderType {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "clipboard" => Some(Self::Clipboard),
            "selection" => Some(Self::Selection),
            "cursor" => Some(Self::Cursor),
            "date" => Some(Self::Date),
            "time" => Some(Self::Time),
            "datetime" => Some(Self::DateTime),
            "input" => Some(Self::Input),
            "select" => Some(Self::Select),
            "tab" => Some(Self::Tab),
            _ => None,
        }
    }

    /// The keyword as written inside the angle brackets.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Clipboard => "clipboard",
            Self::Selection => "selection",
            Self::Cursor => "cursor",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::Input => "input",
            Self::Select => "select",
            Self::Tab => "tab",
        }
    }

    /// Whether this type needs values collected from the user.
    pub fn is_interactive(self) -> bool {
        matches!(self, Self::Input | Self::Select)
    }
}

/// One token occurrence found by [`parse`].
///
/// `start_index..end_index` is the byte span of `raw` in the original content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedPlaceholder {
    pub raw: String,
    pub kind: PlaceholderType,
    /// Everything after the first `:` up to the closing `>`, verbatim.
    pub format: Option<String>,
    pub start_index: usize,
    pub end_index: usize,
}

impl ParsedPlaceholder {
    /// The argument, treating `<type:>` the same as `<type>`.
    pub fn argument(&self) -> Option<&str> {
        self.format.as_deref().filter(|arg| !arg.is_empty())
    }
}

/// Ephemeral values supplied by the caller for one expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderContext {
    pub selection: Option<String>,
    pub clipboard: Option<String>,
}

/// A `<tab:N[:Default]>` occurrence, positioned in the resolved text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabStopDefinition {
    pub index: u32,
    pub default_value: Option<String>,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// Output of [`process`] and [`process_with_inputs`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessedContent {
    pub text: String,
    /// Where the caret goes after expansion, from the first `<cursor>`.
    pub cursor_offset: Option<usize>,
    /// Sorted ascending by `index`; colliding indices keep source order.
    pub tab_stops: Vec<TabStopDefinition>,
}

impl ProcessedContent {
    pub fn has_tab_stops(&self) -> bool {
        !self.tab_stops.is_empty()
    }
}

/// Finds every recognized token in `content`, left to right.
pub fn parse(content: &str) -> Vec<ParsedPlaceholder> {
    PLACEHOLDER_PATTERN
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let kind = PlaceholderType::from_keyword(caps.get(1)?.as_str())?;
            Some(ParsedPlaceholder {
                raw: whole.as_str().to_string(),
                kind,
                format: caps.get(2).map(|arg| arg.as_str().to_string()),
                start_index: whole.start(),
                end_index: whole.end(),
            })
        })
        .collect()
}

pub fn has_placeholders(content: &str) -> bool {
    PLACEHOLDER_PATTERN.is_match(content)
}

/// True when [`analyze_interactive`] would return at least one field.
pub fn has_interactive_placeholders(content: &str) -> bool {
    parse(content)
        .iter()
        .any(|p| interactive::field_for(p).is_some())
}

/// True when the content declares at least one well-formed `<tab:N>`.
pub fn has_tab_stops(content: &str) -> bool {
    parse(content)
        .iter()
        .any(|p| p.kind == PlaceholderType::Tab && resolve::parse_tab_argument(p).is_some())
}

/// True when `content` references the clipboard, so callers can skip reading it.
pub fn references_clipboard(content: &str) -> bool {
    parse(content)
        .iter()
        .any(|p| p.kind == PlaceholderType::Clipboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn parse_records_offsets_into_original_content() {
        let found = parse("Hi <clipboard:upper>, at <date>");

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].raw, "<clipboard:upper>");
        assert_eq!(found[0].kind, PlaceholderType::Clipboard);
        assert_eq!(found[0].format.as_deref(), Some("upper"));
        assert_eq!(found[0].start_index, 3);
        assert_eq!(found[0].end_index, 20);
        assert_eq!(found[1].kind, PlaceholderType::Date);
        assert_eq!(found[1].format, None);
        assert_eq!(found[1].start_index, 25);
    }

    #[test]
    fn parse_keeps_embedded_colons_in_argument() {
        let found = parse("<input:Time:10:30>");
        assert_eq!(found[0].format.as_deref(), Some("Time:10:30"));
    }

    #[test]
    fn parse_is_idempotent() {
        let content = "<tab:2:b> <cursor> <select:Pick:a,b> <time:HH>";
        assert_eq!(parse(content), parse(content));
    }

    #[rstest]
    #[case("<datetime>", PlaceholderType::DateTime)]
    #[case("<date:YYYY>", PlaceholderType::Date)]
    #[case("<time>", PlaceholderType::Time)]
    #[case("<selection:trim>", PlaceholderType::Selection)]
    #[case("<tab:1>", PlaceholderType::Tab)]
    fn parse_recognizes_keyword(#[case] content: &str, #[case] expected: PlaceholderType) {
        let found = parse(content);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, expected);
        assert_eq!(found[0].raw, content);
    }

    #[rstest]
    #[case("plain text")]
    #[case("<b>bold</b>")]
    #[case("<unknown:arg>")]
    #[case("<Clipboard>")]
    #[case("<clipboard")]
    fn parse_ignores_non_placeholders(#[case] content: &str) {
        assert!(parse(content).is_empty());
        assert!(!has_placeholders(content));
    }

    #[test]
    fn empty_argument_counts_as_missing() {
        let found = parse("<input:>");
        assert_eq!(found[0].format.as_deref(), Some(""));
        assert_eq!(found[0].argument(), None);
    }

    #[rstest]
    #[case("<clipboard>", false, false)]
    #[case("<input:Name>", true, false)]
    #[case("<input>", false, false)]
    #[case("<select:Pick>", false, false)]
    #[case("<select:Pick:a,b>", true, false)]
    #[case("<tab:1>", false, true)]
    #[case("<tab:x>", false, false)]
    #[case("<input:Name> <tab:2:x>", true, true)]
    fn predicates_agree_with_resolution_rules(
        #[case] content: &str,
        #[case] interactive: bool,
        #[case] tab_stops: bool,
    ) {
        assert_eq!(has_interactive_placeholders(content), interactive);
        assert_eq!(has_tab_stops(content), tab_stops);
    }

    #[test]
    fn clipboard_reference_detection() {
        assert!(references_clipboard("x <clipboard:title>"));
        assert!(!references_clipboard("x <selection>"));
    }
}
