pub mod dom;
pub mod error;
pub mod expander;
pub mod pipeline;
pub mod placeholder;
pub mod store;
pub mod surface;
pub mod tab_stops;
pub mod trigger;

// Re-export key types for easier usage
pub use error::{ClipboardError, StoreError};
pub use expander::{ExpandOptions, ExpansionResult, TextExpander};
pub use pipeline::{
    ClipboardSource, Collaborators, DialogResult, ExpansionPipeline, InputDialog, PipelineOutcome,
    PipelineSettings,
};
pub use placeholder::{
    InputFieldDefinition, InputFieldKind, ParsedPlaceholder, PlaceholderContext, PlaceholderType,
    ProcessedContent, TabStopDefinition,
};
pub use store::{InMemoryTemplateStore, Template, TemplateStore};
pub use surface::{
    ContenteditableSurface, Key, KeyDisposition, KeyEvent, NativeFieldSurface, SurfaceId,
    SurfaceKind, TextSurface,
};
pub use tab_stops::TabStopManager;
pub use trigger::{DetectionMode, TriggerDetector, TriggerKey, TriggerMatch};
