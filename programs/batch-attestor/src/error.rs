use std::fmt;

use thiserror::Error;

/// The stage of a submission at which it failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionStage {
    /// Building the multi-attestation request or the Safe transaction.
    Creating,
    /// Sending the `multiAttest` transaction.
    Attesting,
    /// Waiting for the receipt and the assigned attestation UIDs.
    WaitUid,
    /// Signing the Safe transaction hash.
    Signing,
    /// Proposing the signed transaction to the Safe Transaction Service.
    Proposing,
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            Self::Creating => "creating",
            Self::Attesting => "attesting",
            Self::WaitUid => "wait_uid",
            Self::Signing => "signing",
            Self::Proposing => "proposing",
        };
        f.write_str(stage)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("invalid schema field type `{field_type}` in segment `{segment}`")]
    InvalidSchemaFieldType {
        /// The offending `type name` segment of the schema string.
        segment: String,
        /// The type that could not be recognised.
        field_type: String,
    },
    #[error("failed to build schema encoder: {0}")]
    SchemaEncoderConstruction(String),
    #[error("row has {found} cells but the schema expects {expected}")]
    MalformedRow { expected: usize, found: usize },
    #[error("failed to encode `{field}` as {field_type}: {reason}")]
    RowEncoding {
        field: String,
        field_type: String,
        reason: String,
    },
    #[error("failed to resolve recipient `{identifier}`: {reason}")]
    RecipientResolution { identifier: String, reason: String },
    #[error("precondition failed: {0}")]
    Precondition(String),
    #[error("submission failed while {stage}: {reason}")]
    Submission {
        stage: SubmissionStage,
        reason: String,
    },
    #[error("schema registry lookup failed: {0}")]
    Registry(String),
    #[error("failed to build client due to: {0}")]
    ClientConfig(String),
}

impl BatchError {
    pub(crate) fn submission(stage: SubmissionStage, reason: impl fmt::Display) -> Self {
        Self::Submission {
            stage,
            reason: reason.to_string(),
        }
    }

    /// Whether the error only disqualifies a single CSV row.
    #[must_use]
    pub const fn is_row_level(&self) -> bool {
        matches!(
            self,
            Self::MalformedRow { .. } | Self::RowEncoding { .. } | Self::RecipientResolution { .. }
        )
    }
}
