//! Interactive front-end state: the task store plus everything a screen
//! needs between keystrokes (filters, edit target, helper line, loading flag).
//!
//! Everything runs on one cooperative thread. The two suspend points are the
//! simulated creation latency and the suggestion fetch; neither can be
//! cancelled once started, and the loading flag is cleared on every exit path.

use crate::badge::needs_refresh;
use crate::error::AppError;
use crate::model::{Task, TaskId, validate_description};
use crate::notify::Notifier;
use crate::remote::{RemoteItem, SUGGESTION_MARKER, SuggestionPort};
use crate::storage::KeyValueStore;
use crate::store::{NewTask, TaskStore};
use crate::view::{StatusFilter, ViewState, visible_tasks};
use std::time::Duration;

const ADDING_MESSAGE: &str = "Adding your note...";
const SYNCING_MESSAGE: &str = "Syncing suggestions...";
const CONNECTION_ERROR: &str = "Connection error";

pub struct Session<S, N> {
    store: TaskStore<S>,
    view: ViewState,
    helper: Option<String>,
    busy: bool,
    notifier: N,
    create_delay: Duration,
}

impl<S: KeyValueStore, N: Notifier> Session<S, N> {
    pub fn new(store: TaskStore<S>, notifier: N, create_delay: Duration) -> Self {
        Self {
            store,
            view: ViewState::new(),
            helper: None,
            busy: false,
            notifier,
            create_delay,
        }
    }

    pub fn store(&self) -> &TaskStore<S> {
        &self.store
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn helper(&self) -> Option<&str> {
        self.helper.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn visible(&self) -> Vec<&Task> {
        visible_tasks(self.store.tasks(), &self.view)
    }

    /// True when a periodic re-render would show different badges.
    pub fn wants_refresh(&self) -> bool {
        needs_refresh(self.store.tasks())
    }

    pub fn set_search<T: Into<String>>(&mut self, search: T) {
        self.view = self.view.with_search(search);
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.view = self.view.with_filter(filter);
    }

    /// Validates up front, then stores the note after the creation delay.
    pub async fn submit(&mut self, new_task: NewTask) -> Result<Task, AppError> {
        if let Err(err) = validate_description(&new_task.description) {
            self.show_helper(err.message());
            return Err(err);
        }

        self.set_loading(true, ADDING_MESSAGE);
        tokio::time::sleep(self.create_delay).await;
        let result = self.store.create(new_task);
        self.set_loading(false, "");

        match &result {
            Ok(_) => self.toast("Note saved"),
            Err(err) => self.show_helper(err.message()),
        }
        result
    }

    /// Pulls suggestions and stores each one as a marked note. A failure
    /// part-way keeps what was already ingested.
    pub async fn sync_suggestions<P: SuggestionPort>(
        &mut self,
        port: &P,
        limit: usize,
    ) -> Result<Vec<Task>, AppError> {
        self.set_loading(true, SYNCING_MESSAGE);
        let result = self.ingest_suggestions(port, limit).await;
        self.set_loading(false, "");

        match &result {
            Ok(created) => {
                tracing::info!(count = created.len(), "ingested suggestions");
                self.toast("Sync complete");
            }
            Err(err) => {
                tracing::warn!(error = %err, "suggestion sync failed");
                self.toast(CONNECTION_ERROR);
            }
        }
        result
    }

    async fn ingest_suggestions<P: SuggestionPort>(
        &mut self,
        port: &P,
        limit: usize,
    ) -> Result<Vec<Task>, AppError> {
        let items = port.fetch_suggestions(limit).await?;
        let mut created = Vec::with_capacity(items.len());
        for item in items {
            let description = format!("{SUGGESTION_MARKER}{}", item.title);
            created.push(self.store.create(NewTask::new(description))?);
        }
        Ok(created)
    }

    /// Sends one task to the suggestion service. The echo is returned but
    /// nothing local depends on it.
    pub async fn push<P: SuggestionPort>(
        &mut self,
        port: &P,
        id: TaskId,
    ) -> Result<RemoteItem, AppError> {
        let task = self
            .store
            .find_by_id(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("task {id} not found")))?;

        let result = port.push_task(&task).await;
        match &result {
            Ok(_) => self.toast("Note sent"),
            Err(err) => {
                tracing::warn!(id = %id, error = %err, "push failed");
                self.toast(CONNECTION_ERROR);
            }
        }
        result
    }

    /// Direct edit without entering edit mode; unknown ids are an error.
    pub fn edit(&mut self, id: TaskId, text: &str) -> Result<Task, AppError> {
        let updated = self.store.edit(id, text)?;
        self.toast("Note updated");
        Ok(updated)
    }

    pub fn toggle(&mut self, id: TaskId) -> Result<Option<Task>, AppError> {
        self.store.toggle(id)
    }

    /// Deletes after confirmation; an unconfirmed request changes nothing.
    pub fn delete(&mut self, id: TaskId, confirmed: bool) -> Result<Option<Task>, AppError> {
        if !confirmed {
            return Ok(None);
        }

        let removed = self.store.remove(id)?;
        if removed.is_some() {
            if self.view.is_editing(id) {
                self.view = self.view.cancel_edit();
            }
            self.toast("Note deleted");
        }
        Ok(removed)
    }

    pub fn clear_all(&mut self, confirmed: bool) -> Result<bool, AppError> {
        if !confirmed {
            return Ok(false);
        }

        self.store.clear_all()?;
        self.view = self.view.cancel_edit();
        self.toast("List cleared");
        Ok(true)
    }

    /// Enters edit mode. Refused for unknown ids or while another task is
    /// being edited.
    pub fn begin_edit(&mut self, id: TaskId) -> bool {
        if self.store.find_by_id(id).is_none() || !self.view.edit_controls_enabled() {
            return false;
        }
        self.view = self.view.begin_edit(id);
        true
    }

    pub fn cancel_edit(&mut self) {
        self.view = self.view.cancel_edit();
        self.show_helper("");
    }

    pub fn save_edit(&mut self, text: &str) -> Result<(), AppError> {
        match self.view.confirm_edit(&mut self.store, text) {
            Ok(next) => {
                self.view = next;
                self.show_helper("");
                self.toast("Note updated");
                Ok(())
            }
            Err(err) => {
                self.show_helper(err.message());
                Err(err)
            }
        }
    }

    fn set_loading(&mut self, loading: bool, message: &str) {
        self.busy = loading;
        self.show_helper(message);
    }

    fn show_helper(&mut self, message: &str) {
        self.helper = if message.is_empty() {
            None
        } else {
            Some(message.to_string())
        };
    }

    fn toast(&self, message: &str) {
        if let Err(err) = self.notifier.notify(message) {
            tracing::warn!(error = %err, "toast delivery failed");
        }
    }
}
