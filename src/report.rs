//! What happened to each field of one submission.
//!
//! 一次提交中每个字段的处理结果。

use crate::error::FieldError;
use crate::field::{EncryptableField, FieldState};
use crate::primitive::Ciphertext;

/// The aggregate flag the server reads.
///
/// 服务器读取的聚合标志。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SubmissionOutcome {
    /// Every marked field was encrypted in the browser.
    Encrypted,
    /// At least one field went out as plaintext; the server must handle it.
    Degraded,
}

impl SubmissionOutcome {
    pub fn flag_value(&self) -> &'static str {
        match self {
            SubmissionOutcome::Encrypted => "true",
            SubmissionOutcome::Degraded => "false",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReport {
    pub field: EncryptableField,
    pub result: Result<Ciphertext, FieldError>,
}

impl FieldReport {
    pub fn state(&self) -> FieldState {
        match self.result {
            Ok(_) => FieldState::Encrypted,
            Err(_) => FieldState::Failed,
        }
    }

    pub fn ciphertext(&self) -> Option<&Ciphertext> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&FieldError> {
        self.result.as_ref().err()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmissionReport {
    /// One entry per marked field, in document order.
    pub fields: Vec<FieldReport>,
    /// Result for the consolidated email body, when one was requested.
    pub email_body: Option<Result<Ciphertext, FieldError>>,
}

impl SubmissionReport {
    /// `Encrypted` only when no field failed. The email body does not count.
    pub fn outcome(&self) -> SubmissionOutcome {
        if self.fields.iter().all(|r| r.result.is_ok()) {
            SubmissionOutcome::Encrypted
        } else {
            SubmissionOutcome::Degraded
        }
    }

    pub fn is_encrypted(&self) -> bool {
        self.outcome() == SubmissionOutcome::Encrypted
    }

    pub fn failures(&self) -> impl Iterator<Item = &FieldReport> {
        self.fields.iter().filter(|r| r.result.is_err())
    }

    pub fn encrypted(&self) -> impl Iterator<Item = &FieldReport> {
        self.fields.iter().filter(|r| r.result.is_ok())
    }

    pub fn field(&self, name: &str) -> Option<&FieldReport> {
        self.fields
            .iter()
            .find(|r| r.field.name.as_deref() == Some(name))
    }
}
