use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Trigger '{trigger}' is already used by template {existing}")]
    DuplicateTrigger { trigger: String, existing: Uuid },

    #[error("Template {0} has an empty trigger")]
    EmptyTrigger(Uuid),
}

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Clipboard access was denied")]
    PermissionDenied,

    #[error("Clipboard is unavailable: {0}")]
    Unavailable(String),
}
