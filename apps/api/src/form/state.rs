use std::collections::BTreeMap;

use crate::form::draft::CandidateDraft;
use crate::form::steps::{FieldPath, Step};

/// Step cursor, draft and UI error map for one form session.
///
/// Navigation here is unconditional; validation gating lives in the controller.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    step: Step,
    draft: CandidateDraft,
    errors: BTreeMap<FieldPath, String>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_step(&self) -> Step {
        self.step
    }

    /// Moves one step forward. No-op on the last step.
    pub fn advance(&mut self) -> Step {
        self.step = self.step.next().unwrap_or(self.step);
        self.step
    }

    /// Moves one step back. No-op on the first step.
    pub fn retreat(&mut self) -> Step {
        self.step = self.step.previous().unwrap_or(self.step);
        self.step
    }

    pub fn draft(&self) -> &CandidateDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut CandidateDraft {
        &mut self.draft
    }

    pub fn field_errors(&self) -> &BTreeMap<FieldPath, String> {
        &self.errors
    }

    /// Replaces the error entries belonging to `step` with `errors`, leaving
    /// other steps' entries alone.
    pub fn set_field_errors(&mut self, step: Step, errors: BTreeMap<FieldPath, String>) {
        self.errors.retain(|path, _| path.step() != step);
        self.errors.extend(errors);
    }

    pub fn set_field_error(&mut self, path: FieldPath, message: impl Into<String>) {
        self.errors.insert(path, message.into());
    }

    pub fn clear_field_error(&mut self, path: FieldPath) {
        self.errors.remove(&path);
    }

    /// Back to step 1 with an empty draft and no errors.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
