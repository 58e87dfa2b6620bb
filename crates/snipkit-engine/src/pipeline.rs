//! Wires detection, lookup, resolution, expansion and tab stops together.
//!
//! The host calls [`ExpansionPipeline::on_input`] after every edit of a
//! surface and routes keydown, blur and timer ticks to the pipeline so tab
//! stops can react. Everything runs to completion inside the call; the
//! interactive dialog is the only place it waits on the user.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{Local, NaiveDateTime};
use uuid::Uuid;

use crate::error::ClipboardError;
use crate::expander::{ExpandOptions, TextExpander};
use crate::placeholder::{self, InputFieldDefinition, PlaceholderContext, ProcessedContent};
use crate::store::TemplateStore;
use crate::surface::{KeyDisposition, KeyEvent, TextSurface};
use crate::tab_stops::TabStopManager;
use crate::trigger::{TriggerDetector, TriggerKey, TriggerMatch};

pub trait ClipboardSource {
    fn read(&mut self) -> Result<String, ClipboardError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogResult {
    Submitted(HashMap<String, String>),
    Cancelled,
}

/// Collects values for interactive fields, keyed by field id.
pub trait InputDialog {
    fn show(&mut self, fields: &[InputFieldDefinition]) -> DialogResult;
}

/// The outside world the pipeline consults on each expansion.
pub struct Collaborators<'a> {
    pub templates: &'a dyn TemplateStore,
    pub clipboard: &'a mut dyn ClipboardSource,
    pub dialog: &'a mut dyn InputDialog,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSettings {
    pub trigger_key: TriggerKey,
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    NoTrigger,
    /// A trigger-shaped word with no template behind it.
    NoTemplate { trigger: String },
    /// The user dismissed the dialog; nothing was changed.
    Cancelled,
    /// The surface changed between detection and expansion.
    Stale,
    Expanded {
        trigger: String,
        template_id: Uuid,
        tab_stops: usize,
    },
}

pub struct ExpansionPipeline {
    settings: PipelineSettings,
    detector: TriggerDetector,
    expander: TextExpander,
    tab_stops: TabStopManager,
}

impl ExpansionPipeline {
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            settings,
            detector: detector_for(settings),
            expander: TextExpander::new(),
            tab_stops: TabStopManager::new(),
        }
    }

    pub fn settings(&self) -> PipelineSettings {
        self.settings
    }

    /// Switches detection mode. Undo history and tab stops are kept.
    pub fn set_settings(&mut self, settings: PipelineSettings) {
        self.settings = settings;
        self.detector = detector_for(settings);
    }

    pub fn tab_stops(&self) -> &TabStopManager {
        &self.tab_stops
    }

    pub fn expander(&self) -> &TextExpander {
        &self.expander
    }

    /// Runs one expansion attempt for the text before the caret.
    pub fn on_input(
        &mut self,
        surface: &mut dyn TextSurface,
        collaborators: &mut Collaborators<'_>,
    ) -> PipelineOutcome {
        self.on_input_at(surface, collaborators, Local::now().naive_local())
    }

    /// [`on_input`](Self::on_input) with an explicit clock for date tokens.
    pub fn on_input_at(
        &mut self,
        surface: &mut dyn TextSurface,
        collaborators: &mut Collaborators<'_>,
        now: NaiveDateTime,
    ) -> PipelineOutcome {
        if self.settings.trigger_key == TriggerKey::None {
            self.detector.set_known_triggers(collaborators.templates.triggers());
        }
        let Some(found) = self.detector.detect_on_surface(surface) else {
            return PipelineOutcome::NoTrigger;
        };

        let Some(template) = collaborators
            .templates
            .find_by_trigger(&found.trigger, self.settings.case_sensitive)
        else {
            log::debug!("no template for trigger '{}'", found.trigger);
            return PipelineOutcome::NoTemplate {
                trigger: found.trigger,
            };
        };
        log::debug!("trigger '{}' matched template {}", found.trigger, template.id);

        self.tab_stops.deactivate();

        let fields = placeholder::analyze_interactive(&template.content);
        let values = match &fields {
            Some(fields) => match collaborators.dialog.show(fields) {
                DialogResult::Submitted(values) => values,
                DialogResult::Cancelled => {
                    log::debug!("input dialog cancelled for '{}'", found.trigger);
                    return PipelineOutcome::Cancelled;
                }
            },
            None => HashMap::new(),
        };

        let context = PlaceholderContext {
            selection: surface.selected_text(),
            clipboard: placeholder::references_clipboard(&template.content)
                .then(|| read_clipboard_or_empty(collaborators.clipboard)),
        };
        let processed = resolve(&template.content, &context, &values, fields.as_deref(), now);

        if !self.still_matches(surface, &found) {
            log::debug!("trigger '{}' went stale before expansion", found.trigger);
            return PipelineOutcome::Stale;
        }

        let options = ExpandOptions {
            cursor_offset: processed.cursor_offset,
        };
        self.expander.expand(surface, &found, &processed.text, options);

        let tab_stops = processed.tab_stops.len();
        if processed.has_tab_stops() {
            self.tab_stops.activate(surface, processed.tab_stops, found.start_index);
        }
        log::info!("expanded '{}' using template '{}'", found.trigger, template.name);

        PipelineOutcome::Expanded {
            trigger: found.trigger,
            template_id: template.id,
            tab_stops,
        }
    }

    fn still_matches(&self, surface: &dyn TextSurface, found: &TriggerMatch) -> bool {
        self.detector.detect_on_surface(surface).as_ref() == Some(found)
    }

    pub fn on_keydown(&mut self, surface: &mut dyn TextSurface, key: &KeyEvent) -> KeyDisposition {
        self.tab_stops.handle_key(surface, key)
    }

    pub fn on_blur(&mut self, at: Instant) {
        self.tab_stops.handle_blur(at);
    }

    /// Lets a pending blur settle; call periodically.
    pub fn tick(&mut self, surface: &dyn TextSurface, now: Instant) {
        self.tab_stops.poll(surface, now);
    }

    /// Reverts the last expansion on `surface`, ending tab-stop navigation.
    pub fn undo(&mut self, surface: &mut dyn TextSurface) -> bool {
        self.tab_stops.deactivate();
        self.expander.undo(surface)
    }
}

fn detector_for(settings: PipelineSettings) -> TriggerDetector {
    TriggerDetector::new(
        settings
            .trigger_key
            .detection_mode(Vec::new(), settings.case_sensitive),
    )
}

fn resolve(
    content: &str,
    context: &PlaceholderContext,
    values: &HashMap<String, String>,
    fields: Option<&[InputFieldDefinition]>,
    now: NaiveDateTime,
) -> ProcessedContent {
    if fields.is_none() && !placeholder::has_tab_stops(content) {
        return placeholder::process_at(content, context, now);
    }
    placeholder::process_with_inputs_at(content, context, values, fields.unwrap_or_default(), now)
}

/// Reads the clipboard, falling back to empty text on any failure.
pub fn read_clipboard_or_empty<C: ClipboardSource + ?Sized>(clipboard: &mut C) -> String {
    match clipboard.read() {
        Ok(text) => text,
        Err(e) => {
            log::warn!("Clipboard read failed, expanding with empty text: {e}");
            String::new()
        }
    }
}
