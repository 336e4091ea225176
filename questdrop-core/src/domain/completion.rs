use crate::domain::objective::ObjectiveCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Derived, non-persisted per-identity completion snapshot. Always carries an
/// entry for every code in [`ObjectiveCode::REQUIRED`]; a missing off-chain
/// record shows up here as `false`, never as an error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionStatus {
    completed: BTreeMap<ObjectiveCode, bool>,
}

impl CompletionStatus {
    pub fn new(completed: BTreeMap<ObjectiveCode, bool>) -> Self {
        Self { completed }
    }

    pub fn is_complete(&self, code: ObjectiveCode) -> bool {
        self.completed.get(&code).copied().unwrap_or(false)
    }

    /// Logical AND over the required set.
    pub fn fully_complete(&self) -> bool {
        ObjectiveCode::REQUIRED.iter().all(|code| self.is_complete(*code))
    }

    pub fn completed_count(&self) -> usize {
        ObjectiveCode::REQUIRED.iter().filter(|code| self.is_complete(**code)).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectiveCode, bool)> + '_ {
        self.completed.iter().map(|(code, done)| (*code, *done))
    }
}
