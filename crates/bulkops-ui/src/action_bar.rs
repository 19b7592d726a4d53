//! Selection toolbar state.

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;
use tracing::{debug, warn};

use crate::handler::HandlerOutput;

/// Errors from action bar interactions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionBarError {
    /// No action with this id.
    #[error("Unknown action: {id}")]
    UnknownAction { id: String },

    /// The bar is disabled by its owner.
    #[error("Action bar is disabled")]
    Disabled,

    /// Another action is still running.
    #[error("Action already in progress: {id}")]
    Busy { id: String },

    /// Nothing is selected.
    #[error("No items selected")]
    NothingSelected,

    /// The action must be confirmed before it runs.
    #[error("Action requires confirmation: {id}")]
    ConfirmationRequired { id: String },

    /// The action's handler reported a failure.
    #[error("Action {id} failed: {message}")]
    Failed { id: String, message: String },
}

/// Visual emphasis of an action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActionVariant {
    #[default]
    Default,
    Destructive,
}

/// Text for a confirmation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
}

impl Confirmation {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            confirm_label: "Confirm".to_string(),
        }
    }

    /// Set the label of the confirming button.
    pub fn with_confirm_label(mut self, label: impl Into<String>) -> Self {
        self.confirm_label = label.into();
        self
    }
}

/// An action offered for the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkAction {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub variant: ActionVariant,
    /// When set, the action must be confirmed before it runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<Confirmation>,
}

impl BulkAction {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            variant: ActionVariant::Default,
            confirmation: None,
        }
    }

    /// Mark the action as destructive.
    pub fn destructive(mut self) -> Self {
        self.variant = ActionVariant::Destructive;
        self
    }

    /// Require confirmation before running.
    pub fn with_confirmation(mut self, confirmation: Confirmation) -> Self {
        self.confirmation = Some(confirmation);
        self
    }

    pub fn requires_confirmation(&self) -> bool {
        self.confirmation.is_some()
    }
}

/// What the UI should do after an action is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    /// Run the action now.
    Run,
    /// Show this confirmation first, then call [`BulkActionBar::confirm`].
    Confirm(Confirmation),
}

/// State of a toolbar offering actions over a selection.
///
/// Visible while something is selected. At most one action runs at a time,
/// and every action is disabled while one is running or while the bar is
/// disabled by its owner. The bar never runs bulk work itself; handlers are
/// supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct BulkActionBar {
    actions: Vec<BulkAction>,
    selected_count: usize,
    disabled: bool,
    loading: Option<String>,
    pending_confirmation: Option<String>,
    confirmed: Option<String>,
}

impl BulkActionBar {
    pub fn new(actions: Vec<BulkAction>) -> Self {
        Self {
            actions,
            ..Default::default()
        }
    }

    pub fn actions(&self) -> &[BulkAction] {
        &self.actions
    }

    pub fn selected_count(&self) -> usize {
        self.selected_count
    }

    pub fn set_selected_count(&mut self, count: usize) {
        self.selected_count = count;
        if count == 0 {
            self.pending_confirmation = None;
            self.confirmed = None;
        }
    }

    /// Clear the selection, hiding the bar.
    pub fn clear_selection(&mut self) {
        self.set_selected_count(0);
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Whether the bar should be shown at all.
    pub fn is_visible(&self) -> bool {
        self.selected_count > 0
    }

    /// Whether actions can currently be triggered.
    pub fn is_enabled(&self) -> bool {
        !self.disabled && self.loading.is_none() && self.selected_count > 0
    }

    /// Id of the action currently running.
    pub fn loading(&self) -> Option<&str> {
        self.loading.as_deref()
    }

    pub fn is_loading(&self, id: &str) -> bool {
        self.loading.as_deref() == Some(id)
    }

    /// The confirmation currently awaiting an answer.
    pub fn pending_confirmation(&self) -> Option<&Confirmation> {
        let id = self.pending_confirmation.as_deref()?;
        self.action(id).and_then(|action| action.confirmation.as_ref())
    }

    /// Request an action, possibly entering its confirmation step.
    pub fn request(&mut self, id: &str) -> Result<ActionRequest, ActionBarError> {
        let action = self.check_available(id)?;

        match action.confirmation.clone() {
            Some(confirmation) => {
                debug!(action = id, "Awaiting confirmation");
                self.pending_confirmation = Some(id.to_string());
                Ok(ActionRequest::Confirm(confirmation))
            }
            None => Ok(ActionRequest::Run),
        }
    }

    /// Accept the pending confirmation, returning the action id to run.
    pub fn confirm(&mut self) -> Option<String> {
        let id = self.pending_confirmation.take()?;
        self.confirmed = Some(id.clone());
        Some(id)
    }

    /// Dismiss the pending confirmation.
    pub fn dismiss(&mut self) {
        self.pending_confirmation = None;
    }

    /// Mark an action as running.
    ///
    /// Actions with a confirmation step must have been confirmed.
    pub fn start(&mut self, id: &str) -> Result<(), ActionBarError> {
        let needs_confirmation = self.check_available(id)?.requires_confirmation();

        if needs_confirmation && self.confirmed.as_deref() != Some(id) {
            return Err(ActionBarError::ConfirmationRequired { id: id.to_string() });
        }

        self.confirmed = None;
        self.loading = Some(id.to_string());
        Ok(())
    }

    /// Mark the running action as finished.
    pub fn finish(&mut self, id: &str) {
        if self.is_loading(id) {
            self.loading = None;
        }
    }

    /// Run an action's handler, tracking it as loading until it settles.
    ///
    /// Loading is also cleared if the returned future is dropped early.
    pub async fn run<H>(&mut self, id: &str, handler: H) -> Result<(), ActionBarError>
    where
        H: FnOnce() -> HandlerOutput,
    {
        self.start(id)?;
        let outcome = {
            let _loading = LoadingGuard { bar: self, id };
            handler().resolve().await
        };

        outcome.map_err(|message| {
            warn!(action = id, error = %message, "Bulk action failed");
            ActionBarError::Failed {
                id: id.to_string(),
                message,
            }
        })
    }

    fn action(&self, id: &str) -> Option<&BulkAction> {
        self.actions.iter().find(|action| action.id == id)
    }

    fn check_available(&self, id: &str) -> Result<&BulkAction, ActionBarError> {
        let action = self.action(id).ok_or_else(|| ActionBarError::UnknownAction {
            id: id.to_string(),
        })?;

        if self.disabled {
            return Err(ActionBarError::Disabled);
        }
        if let Some(running) = &self.loading {
            return Err(ActionBarError::Busy {
                id: running.clone(),
            });
        }
        if self.selected_count == 0 {
            return Err(ActionBarError::NothingSelected);
        }

        Ok(action)
    }
}

/// Clears the loading action when dropped.
struct LoadingGuard<'a> {
    bar: &'a mut BulkActionBar,
    id: &'a str,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.bar.finish(self.id);
    }
}
