use alloy_primitives::{Bytes, TxHash, B256};
use tokio::sync::watch;

use crate::error::{BatchError, SubmissionStage};

/// Progress of a direct `multiAttest` submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DirectStatus {
    Creating,
    Attesting,
    WaitUid {
        tx_hash: TxHash,
    },
    Success {
        tx_hash: TxHash,
        uids: Vec<B256>,
    },
    Error {
        stage: SubmissionStage,
        reason: String,
    },
}

/// Progress of a Safe multisig proposal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MultisigStatus {
    Creating,
    Signing {
        safe_tx_hash: B256,
    },
    Created {
        safe_tx_hash: B256,
        signature: Bytes,
    },
    Error {
        stage: SubmissionStage,
        reason: String,
    },
}

/// The state of the current submission attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TransactionState {
    #[default]
    Idle,
    Direct(DirectStatus),
    Multisig(MultisigStatus),
}

impl TransactionState {
    /// Short tag of the state, as shown to users.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Direct(DirectStatus::Creating) | Self::Multisig(MultisigStatus::Creating) => {
                "creating"
            }
            Self::Direct(DirectStatus::Attesting) => "attesting",
            Self::Direct(DirectStatus::WaitUid { .. }) => "wait_uid",
            Self::Direct(DirectStatus::Success { .. }) => "success",
            Self::Multisig(MultisigStatus::Signing { .. }) => "signing",
            Self::Multisig(MultisigStatus::Created { .. }) => "created",
            Self::Direct(DirectStatus::Error { .. }) | Self::Multisig(MultisigStatus::Error { .. }) => {
                "error"
            }
        }
    }

    /// Whether a submission is between its first and its terminal state.
    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        match self {
            Self::Idle
            | Self::Direct(DirectStatus::Success { .. } | DirectStatus::Error { .. })
            | Self::Multisig(MultisigStatus::Created { .. } | MultisigStatus::Error { .. }) => false,
            Self::Direct(
                DirectStatus::Creating | DirectStatus::Attesting | DirectStatus::WaitUid { .. },
            )
            | Self::Multisig(MultisigStatus::Creating | MultisigStatus::Signing { .. }) => true,
        }
    }

    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub fn can_transition_to(&self, next: &Self) -> bool {
        use DirectStatus as D;
        use MultisigStatus as M;

        match (self, next) {
            // A new attempt may start from idle or from any terminal state.
            (current, Self::Direct(D::Creating) | Self::Multisig(M::Creating)) => {
                !current.is_in_flight()
            }
            (Self::Direct(D::Creating), Self::Direct(D::Attesting)) => true,
            (Self::Direct(D::Attesting), Self::Direct(D::WaitUid { .. })) => true,
            (
                Self::Direct(D::WaitUid { tx_hash: sent }),
                Self::Direct(D::Success { tx_hash, .. }),
            ) => sent == tx_hash,
            (
                Self::Direct(D::Creating | D::Attesting | D::WaitUid { .. }),
                Self::Direct(D::Error { .. }),
            ) => true,
            (Self::Multisig(M::Creating), Self::Multisig(M::Signing { .. })) => true,
            (
                Self::Multisig(M::Signing { safe_tx_hash: signing }),
                Self::Multisig(M::Created { safe_tx_hash, .. }),
            ) => signing == safe_tx_hash,
            (Self::Multisig(M::Creating | M::Signing { .. }), Self::Multisig(M::Error { .. })) => {
                true
            }
            _ => false,
        }
    }
}

/// Publishes the transaction state to any number of observers.
#[derive(Debug)]
pub struct StateTracker {
    tx: watch::Sender<TransactionState>,
}

impl Default for StateTracker {
    fn default() -> Self {
        let (tx, _) = watch::channel(TransactionState::Idle);
        Self { tx }
    }
}

impl StateTracker {
    #[must_use]
    pub fn current(&self) -> TransactionState {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TransactionState> {
        self.tx.subscribe()
    }

    /// Move to `next`, rejecting transitions the state machine does not allow.
    pub fn advance(&self, next: TransactionState) -> Result<(), BatchError> {
        let current = self.tx.borrow().clone();
        if !current.can_transition_to(&next) {
            return Err(BatchError::Precondition(format!(
                "cannot move from `{}` to `{}`",
                current.tag(),
                next.tag()
            )));
        }
        tracing::debug!(from = current.tag(), to = next.tag(), "transaction state");
        self.tx.send_replace(next);
        Ok(())
    }

    /// Record `error` as the terminal state of the current attempt and hand it back.
    pub fn fail(&self, error: BatchError) -> BatchError {
        let stage = match &error {
            BatchError::Submission { stage, .. } => *stage,
            _ => SubmissionStage::Creating,
        };
        let reason = error.to_string();
        let next = match self.tx.borrow().clone() {
            TransactionState::Multisig(_) => {
                TransactionState::Multisig(MultisigStatus::Error { stage, reason })
            }
            _ => TransactionState::Direct(DirectStatus::Error { stage, reason }),
        };
        if let Err(e) = self.advance(next) {
            tracing::warn!("could not record submission failure: {e}");
        }
        error
    }

    /// Clear the state back to idle.
    pub fn reset(&self) {
        self.tx.send_replace(TransactionState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(byte: u8) -> B256 {
        B256::repeat_byte(byte)
    }

    #[test]
    fn direct_happy_path() {
        let tracker = StateTracker::default();
        let mut rx = tracker.subscribe();

        tracker.advance(TransactionState::Direct(DirectStatus::Creating)).unwrap();
        tracker.advance(TransactionState::Direct(DirectStatus::Attesting)).unwrap();
        tracker
            .advance(TransactionState::Direct(DirectStatus::WaitUid { tx_hash: hash(1) }))
            .unwrap();
        tracker
            .advance(TransactionState::Direct(DirectStatus::Success {
                tx_hash: hash(1),
                uids: vec![hash(2)],
            }))
            .unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().tag(), "success");
    }

    #[test]
    fn multisig_cannot_skip_signing() {
        let tracker = StateTracker::default();
        tracker.advance(TransactionState::Multisig(MultisigStatus::Creating)).unwrap();
        let err = tracker
            .advance(TransactionState::Multisig(MultisigStatus::Created {
                safe_tx_hash: hash(1),
                signature: Bytes::new(),
            }))
            .unwrap_err();
        assert!(matches!(err, BatchError::Precondition(_)));
    }

    #[test]
    fn created_must_match_signed_hash() {
        let signing = TransactionState::Multisig(MultisigStatus::Signing { safe_tx_hash: hash(1) });
        assert!(!signing.can_transition_to(&TransactionState::Multisig(MultisigStatus::Created {
            safe_tx_hash: hash(2),
            signature: Bytes::new(),
        })));
    }

    #[test]
    fn new_attempt_requires_terminal_state() {
        let tracker = StateTracker::default();
        tracker.advance(TransactionState::Direct(DirectStatus::Creating)).unwrap();
        assert!(tracker
            .advance(TransactionState::Multisig(MultisigStatus::Creating))
            .is_err());

        let err = tracker.fail(BatchError::submission(SubmissionStage::Creating, "boom"));
        assert!(matches!(err, BatchError::Submission { .. }));
        assert_eq!(tracker.current().tag(), "error");

        tracker
            .advance(TransactionState::Multisig(MultisigStatus::Creating))
            .unwrap();
    }

    #[test]
    fn fail_keeps_the_path_and_stage() {
        let tracker = StateTracker::default();
        tracker.advance(TransactionState::Multisig(MultisigStatus::Creating)).unwrap();
        tracker
            .advance(TransactionState::Multisig(MultisigStatus::Signing { safe_tx_hash: hash(1) }))
            .unwrap();
        tracker.fail(BatchError::submission(SubmissionStage::Proposing, "503"));

        assert!(matches!(
            tracker.current(),
            TransactionState::Multisig(MultisigStatus::Error {
                stage: SubmissionStage::Proposing,
                ..
            })
        ));
    }

    #[test]
    fn reset_returns_to_idle() {
        let tracker = StateTracker::default();
        tracker.advance(TransactionState::Direct(DirectStatus::Creating)).unwrap();
        tracker.reset();
        assert_eq!(tracker.current(), TransactionState::Idle);
    }
}
