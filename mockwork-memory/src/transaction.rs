//! The shared transaction state machine.
//!
//! One controller guards the single logical transaction of an
//! [`InMemoryContext`](crate::context::InMemoryContext): at most one open
//! transaction exists across every registered set, matching
//! single-context-per-unit-of-work semantics. The context broadcasts each
//! transition to its set stores so their mirror flags and snapshots stay
//! consistent with this one flag.

use mockwork_core::error::{ContextError, ContextResult};

/// `{Closed, Open}` state machine for the context-wide transaction.
///
/// Every misuse (begin while open, commit/rollback while closed) is a
/// programmer error surfaced immediately, never silently ignored. The one
/// exception is the no-throw rollback path used for drop-time cleanup.
#[derive(Debug, Default)]
pub struct TransactionController {
    open: bool,
}

impl TransactionController {
    /// Returns whether a transaction is currently open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Transitions `Closed → Open`.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::TransactionAlreadyOpen`] if already open.
    pub fn begin(&mut self) -> ContextResult<()> {
        if self.open {
            return Err(ContextError::TransactionAlreadyOpen);
        }

        self.open = true;

        Ok(())
    }

    /// Transitions `Open → Closed` on commit.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::NoOpenTransaction`] if already closed.
    pub fn commit(&mut self) -> ContextResult<()> {
        if !self.open {
            return Err(ContextError::NoOpenTransaction);
        }

        self.open = false;

        Ok(())
    }

    /// Transitions `Open → Closed` on rollback.
    ///
    /// With `no_throw` set, rolling back while closed is a silent no-op and
    /// the caller must skip the store broadcast; the `Ok(false)` return
    /// signals that nothing was rolled back.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::NoOpenTransaction`] if already closed and
    /// `no_throw` is false.
    pub fn rollback(&mut self, no_throw: bool) -> ContextResult<bool> {
        if !self.open {
            if no_throw {
                return Ok(false);
            }

            return Err(ContextError::NoOpenTransaction);
        }

        self.open = false;

        Ok(true)
    }

    /// Forces the controller back to `Closed` during context teardown.
    pub fn reset(&mut self) {
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_while_open_fails() {
        let mut controller = TransactionController::default();

        controller.begin().unwrap();

        assert!(matches!(
            controller.begin(),
            Err(ContextError::TransactionAlreadyOpen),
        ));
        assert!(controller.is_open());
    }

    #[test]
    fn commit_while_closed_fails() {
        let mut controller = TransactionController::default();

        assert!(matches!(
            controller.commit(),
            Err(ContextError::NoOpenTransaction),
        ));
    }

    #[test]
    fn rollback_while_closed_fails_unless_no_throw() {
        let mut controller = TransactionController::default();

        assert!(matches!(
            controller.rollback(false),
            Err(ContextError::NoOpenTransaction),
        ));
        assert_eq!(controller.rollback(true).unwrap(), false);
    }

    #[test]
    fn commit_and_rollback_both_close_the_transaction() {
        let mut controller = TransactionController::default();

        controller.begin().unwrap();
        controller.commit().unwrap();
        assert!(!controller.is_open());

        controller.begin().unwrap();
        assert_eq!(controller.rollback(false).unwrap(), true);
        assert!(!controller.is_open());
    }
}
