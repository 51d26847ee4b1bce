//! Delete confirmation gate.
//!
//! `request_delete` captures an id snapshot that is decoupled from the live
//! selection. `confirm` closes the gate and hands the snapshot back so the
//! caller can dispatch the batch.

use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfirmationState {
    #[default]
    Idle,
    Pending(Arc<[String]>),
}

#[derive(Debug, Default)]
pub struct ConfirmationWorkflow {
    state: ConfirmationState,
}

impl ConfirmationWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ConfirmationState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, ConfirmationState::Pending(_))
    }

    /// Ids awaiting confirmation, empty when idle.
    pub fn pending_ids(&self) -> &[String] {
        match &self.state {
            ConfirmationState::Pending(ids) => ids,
            ConfirmationState::Idle => &[],
        }
    }

    /// Open (or overwrite) the pending confirmation. Empty input is ignored.
    /// Duplicate ids collapse to their first occurrence.
    pub fn request_delete<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut snapshot: Vec<String> = Vec::new();
        for id in ids {
            let id = id.into();
            if !snapshot.contains(&id) {
                snapshot.push(id);
            }
        }
        if snapshot.is_empty() {
            return;
        }
        if self.is_pending() {
            log::debug!("Delete request replaced: ids={}", snapshot.len());
        }
        self.state = ConfirmationState::Pending(snapshot.into());
    }

    /// Close the gate and return the captured ids. `None` when idle.
    pub fn confirm(&mut self) -> Option<Vec<String>> {
        match std::mem::take(&mut self.state) {
            ConfirmationState::Pending(ids) => Some(ids.to_vec()),
            ConfirmationState::Idle => None,
        }
    }

    pub fn cancel(&mut self) {
        self.state = ConfirmationState::Idle;
    }
}
