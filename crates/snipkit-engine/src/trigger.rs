//! Trigger detection over the text just before the caret.
//!
//! Detection is purely string based. The surfaces only differ in how they
//! produce the text up to the caret, so one matcher serves all of them.

use serde::{Deserialize, Serialize};

use crate::surface::{ContenteditableContext, ContenteditableSurface, TextSurface};

pub const DEFAULT_DELIMITERS: [char; 3] = [' ', '\t', '\n'];

/// Shortest trigger, in characters, that will ever match.
pub const MIN_TRIGGER_LEN: usize = 2;

/// A trigger found at the end of the text.
///
/// `start_index` is the first byte of the trigger; `end_index` is the end of
/// the inspected text, so it includes the delimiter when there is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerMatch {
    pub trigger: String,
    pub start_index: usize,
    pub end_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionMode {
    /// A trigger is the word completed by typing one of `delimiters`.
    Delimited { delimiters: Vec<char> },
    /// A trigger matches as soon as its last character is typed. Only the
    /// known triggers can match.
    Immediate {
        triggers: Vec<String>,
        case_sensitive: bool,
    },
}

impl Default for DetectionMode {
    fn default() -> Self {
        DetectionMode::Delimited {
            delimiters: DEFAULT_DELIMITERS.to_vec(),
        }
    }
}

/// The key that completes a trigger, as stored in the user settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKey {
    #[default]
    Space,
    Tab,
    Enter,
    /// No delimiter: expand as soon as a known trigger is typed.
    None,
}

impl TriggerKey {
    /// `known_triggers` is only kept for [`TriggerKey::None`].
    pub fn detection_mode(self, known_triggers: Vec<String>, case_sensitive: bool) -> DetectionMode {
        let delimiter = match self {
            TriggerKey::Space => ' ',
            TriggerKey::Tab => '\t',
            TriggerKey::Enter => '\n',
            TriggerKey::None => {
                return DetectionMode::Immediate {
                    triggers: known_triggers,
                    case_sensitive,
                };
            }
        };
        DetectionMode::Delimited {
            delimiters: vec![delimiter],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TriggerDetector {
    mode: DetectionMode,
}

impl TriggerDetector {
    pub fn new(mode: DetectionMode) -> Self {
        let mut detector = Self { mode };
        detector.sort_triggers();
        detector
    }

    pub fn mode(&self) -> &DetectionMode {
        &self.mode
    }

    /// Replaces the known triggers used in immediate mode. Ignored otherwise.
    pub fn set_known_triggers(&mut self, known: Vec<String>) {
        if let DetectionMode::Immediate { triggers, .. } = &mut self.mode {
            *triggers = known;
        }
        self.sort_triggers();
    }

    fn sort_triggers(&mut self) {
        if let DetectionMode::Immediate { triggers, .. } = &mut self.mode {
            triggers.sort_by_key(|t| std::cmp::Reverse(t.chars().count()));
        }
    }

    /// Looks for a trigger ending at the end of `text`.
    pub fn detect(&self, text: &str) -> Option<TriggerMatch> {
        match &self.mode {
            DetectionMode::Delimited { delimiters } => detect_delimited(text, delimiters),
            DetectionMode::Immediate {
                triggers,
                case_sensitive,
            } => detect_immediate(text, triggers, *case_sensitive),
        }
    }

    /// Runs [`detect`](Self::detect) on `value` up to `cursor`.
    pub fn detect_at_cursor(&self, value: &str, cursor: usize) -> Option<TriggerMatch> {
        let cursor = crate::dom::clamp_to_char_boundary(value, cursor);
        self.detect(&value[..cursor])
    }

    /// Detects inside a contenteditable region, returning the context that
    /// was read so the caller can replace in place.
    pub fn detect_in_contenteditable(
        &self,
        surface: &ContenteditableSurface,
    ) -> Option<(TriggerMatch, ContenteditableContext)> {
        let context = surface.context()?;
        let found = self.detect(&context.text)?;
        Some((found, context))
    }

    pub fn detect_on_surface(&self, surface: &dyn TextSurface) -> Option<TriggerMatch> {
        let state = surface.text_and_caret()?;
        self.detect(state.before_caret())
    }
}

/// [`TriggerDetector::detect`] with the default delimiters.
pub fn detect_trigger(text: &str) -> Option<TriggerMatch> {
    detect_delimited(text, &DEFAULT_DELIMITERS)
}

/// [`TriggerDetector::detect_at_cursor`] with the default delimiters.
pub fn detect_trigger_at_cursor(value: &str, cursor: usize) -> Option<TriggerMatch> {
    TriggerDetector::default().detect_at_cursor(value, cursor)
}

fn detect_delimited(text: &str, delimiters: &[char]) -> Option<TriggerMatch> {
    if text.chars().count() < MIN_TRIGGER_LEN {
        return None;
    }
    let last = text.chars().next_back()?;
    if !delimiters.contains(&last) {
        return None;
    }
    let body = &text[..text.len() - last.len_utf8()];
    let start = body
        .char_indices()
        .rev()
        .find(|(_, ch)| ch.is_whitespace())
        .map_or(0, |(i, ch)| i + ch.len_utf8());
    let trigger = &body[start..];
    if trigger.chars().count() < MIN_TRIGGER_LEN {
        return None;
    }
    Some(TriggerMatch {
        trigger: trigger.to_string(),
        start_index: start,
        end_index: text.len(),
    })
}

/// `triggers` must be sorted longest first.
fn detect_immediate(text: &str, triggers: &[String], case_sensitive: bool) -> Option<TriggerMatch> {
    triggers.iter().find_map(|known| {
        let len = known.chars().count();
        if len < MIN_TRIGGER_LEN {
            return None;
        }
        let start = text.char_indices().rev().nth(len - 1).map(|(i, _)| i)?;
        let typed = &text[start..];
        let matches = if case_sensitive {
            typed == known
        } else {
            typed.to_lowercase() == known.to_lowercase()
        };
        let at_boundary = text[..start]
            .chars()
            .next_back()
            .is_none_or(char::is_whitespace);
        (matches && at_boundary).then(|| TriggerMatch {
            trigger: typed.to_string(),
            start_index: start,
            end_index: text.len(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Fragment;
    use crate::surface::NativeFieldSurface;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn found(trigger: &str, start_index: usize, end_index: usize) -> Option<TriggerMatch> {
        Some(TriggerMatch {
            trigger: trigger.to_string(),
            start_index,
            end_index,
        })
    }

    #[rstest]
    #[case("hi", None)]
    #[case("", None)]
    #[case("a ", None)]
    #[case("  ", None)]
    #[case("/ab", None)]
    #[case("/ab ", found("/ab", 0, 4))]
    #[case("hello /ab ", found("/ab", 6, 10))]
    #[case("line\n/sig\t", found("/sig", 5, 10))]
    #[case("one\n;addr\n", found(";addr", 4, 10))]
    #[case("xy a ", None)]
    #[case("café ", found("café", 0, 6))]
    fn detects_with_default_delimiters(#[case] text: &str, #[case] expected: Option<TriggerMatch>) {
        assert_eq!(detect_trigger(text), expected);
    }

    #[test]
    fn only_configured_delimiters_complete_a_trigger() {
        let detector = TriggerDetector::new(DetectionMode::Delimited {
            delimiters: vec!['\t'],
        });
        assert_eq!(detector.detect("/ab "), None);
        assert_eq!(detector.detect("/ab\t"), found("/ab", 0, 4));
    }

    #[rstest]
    #[case(TriggerKey::Space, "/ab ", true)]
    #[case(TriggerKey::Space, "/ab\t", false)]
    #[case(TriggerKey::Tab, "/ab\t", true)]
    #[case(TriggerKey::Enter, "/ab\n", true)]
    #[case(TriggerKey::Enter, "/ab ", false)]
    #[case(TriggerKey::None, "/ab", true)]
    fn trigger_key_selects_mode(#[case] key: TriggerKey, #[case] text: &str, #[case] matches: bool) {
        let detector = TriggerDetector::new(key.detection_mode(vec!["/ab".into()], false));
        assert_eq!(detector.detect(text).is_some(), matches);
    }

    #[test]
    fn trigger_key_uses_lowercase_names() {
        use serde::de::value::{Error, StrDeserializer};
        use serde::de::IntoDeserializer;

        let keys: Vec<TriggerKey> = ["space", "tab", "enter", "none"]
            .into_iter()
            .map(|name| {
                let deserializer: StrDeserializer<'_, Error> = name.into_deserializer();
                TriggerKey::deserialize(deserializer).unwrap()
            })
            .collect();
        assert_eq!(
            keys,
            vec![TriggerKey::Space, TriggerKey::Tab, TriggerKey::Enter, TriggerKey::None]
        );
    }

    #[test]
    fn detect_at_cursor_ignores_text_after_cursor() {
        assert_eq!(detect_trigger_at_cursor("/ab tail", 4), found("/ab", 0, 4));
        assert_eq!(detect_trigger_at_cursor("/ab tail", 3), None);
        assert_eq!(detect_trigger_at_cursor("/ab ", 40), found("/ab", 0, 4));
    }

    #[rstest]
    #[case("say sig", false, found("sig", 4, 7))]
    #[case("say SIG", false, found("SIG", 4, 7))]
    #[case("say SIG", true, None)]
    #[case("mysig", false, None)]
    #[case("/addr", false, found("/addr", 0, 5))]
    #[case("ad", false, None)]
    fn immediate_mode_matches_known_triggers(
        #[case] text: &str,
        #[case] case_sensitive: bool,
        #[case] expected: Option<TriggerMatch>,
    ) {
        let detector = TriggerDetector::new(DetectionMode::Immediate {
            triggers: vec!["sig".into(), "/addr".into(), "x".into()],
            case_sensitive,
        });
        assert_eq!(detector.detect(text), expected);
    }

    #[test]
    fn immediate_mode_prefers_longest_trigger() {
        let mut detector = TriggerDetector::new(DetectionMode::Immediate {
            triggers: vec![],
            case_sensitive: true,
        });
        detector.set_known_triggers(vec!["ab".into(), "ab".into(), "xab".into()]);
        assert_eq!(detector.detect("xab"), found("xab", 0, 3));
    }

    #[test]
    fn detects_on_surfaces() {
        let detector = TriggerDetector::default();
        let mut field = NativeFieldSurface::input("hello /ab more");
        field.set_caret(10);
        assert_eq!(detector.detect_on_surface(&field), found("/ab", 6, 10));

        let region = ContenteditableSurface::new(&[
            Fragment::element("b", vec![Fragment::text("hey ")]),
            Fragment::text("/ab "),
        ]);
        let (hit, context) = detector.detect_in_contenteditable(&region).unwrap();
        assert_eq!(Some(hit), found("/ab", 4, 8));
        assert_eq!(context.cursor_position, 8);
    }
}
