use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use grantdesk_core::{AppError, AppResult};
use grantdesk_domain::FormAction;

use crate::{ViewDirective, ViewRenderer};

/// Allows at most one submission in flight per form.
#[derive(Debug, Default)]
pub struct SubmissionGate {
    busy: Mutex<HashSet<FormAction>>,
}

impl SubmissionGate {
    /// Creates a gate with every form idle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the form's slot and marks its submit control busy.
    ///
    /// Fails with a conflict while another submission of the same form holds
    /// the slot.
    pub fn acquire<'a>(
        &'a self,
        form: FormAction,
        renderer: &'a dyn ViewRenderer,
    ) -> AppResult<SubmissionGuard<'a>> {
        let inserted = self
            .busy
            .lock()
            .map_err(|_| AppError::Internal("submission gate lock is poisoned".to_owned()))?
            .insert(form);
        if !inserted {
            return Err(AppError::Conflict(format!(
                "a {} submission is already in progress",
                form.as_str()
            )));
        }

        renderer.apply(ViewDirective::SetSubmitBusy { form, busy: true });
        Ok(SubmissionGuard {
            gate: self,
            form,
            renderer,
        })
    }

    /// Returns whether the form currently holds its slot.
    #[must_use]
    pub fn is_busy(&self, form: FormAction) -> bool {
        self.slots().contains(&form)
    }

    // Releasing must succeed even after a panic elsewhere poisoned the lock.
    fn slots(&self) -> MutexGuard<'_, HashSet<FormAction>> {
        self.busy.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held while a submission runs; releases the slot on drop.
pub struct SubmissionGuard<'a> {
    gate: &'a SubmissionGate,
    form: FormAction,
    renderer: &'a dyn ViewRenderer,
}

impl std::fmt::Debug for SubmissionGuard<'_> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SubmissionGuard")
            .field("form", &self.form)
            .finish_non_exhaustive()
    }
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.gate.slots().remove(&self.form);
        self.renderer.apply(ViewDirective::SetSubmitBusy {
            form: self.form,
            busy: false,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use grantdesk_core::AppError;
    use grantdesk_domain::FormAction;

    use super::SubmissionGate;
    use crate::{ViewDirective, ViewRenderer};

    #[derive(Default)]
    struct RecordingRenderer {
        directives: Mutex<Vec<ViewDirective>>,
    }

    impl ViewRenderer for RecordingRenderer {
        fn apply(&self, directive: ViewDirective) {
            if let Ok(mut directives) = self.directives.lock() {
                directives.push(directive);
            }
        }
    }

    #[test]
    fn second_acquire_conflicts_until_release() {
        let gate = SubmissionGate::new();
        let renderer = RecordingRenderer::default();

        let first = gate.acquire(FormAction::Grant, &renderer);
        assert!(first.is_ok());
        assert!(matches!(
            gate.acquire(FormAction::Grant, &renderer),
            Err(AppError::Conflict(_))
        ));
        assert!(gate.acquire(FormAction::Revoke, &renderer).is_ok());

        drop(first);
        assert!(!gate.is_busy(FormAction::Grant));
        assert!(gate.acquire(FormAction::Grant, &renderer).is_ok());
    }

    #[test]
    fn release_marks_form_idle() {
        let gate = SubmissionGate::new();
        let renderer = RecordingRenderer::default();

        drop(gate.acquire(FormAction::Revoke, &renderer));

        let directives = renderer
            .directives
            .lock()
            .map(|directives| directives.clone())
            .unwrap_or_default();
        assert_eq!(
            directives,
            vec![
                ViewDirective::SetSubmitBusy {
                    form: FormAction::Revoke,
                    busy: true
                },
                ViewDirective::SetSubmitBusy {
                    form: FormAction::Revoke,
                    busy: false
                },
            ]
        );
    }
}
