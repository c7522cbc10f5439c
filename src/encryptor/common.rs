//! Prepare and settle phases shared by every processing mode.
//!
//! `prepare` only reads the store; `settle` is the single place that writes
//! to it and runs once every request has produced a result.
//!
//! 所有处理模式共享的准备与结算阶段。`prepare` 只读取存储；
//! `settle` 是唯一写入存储的地方，且只在所有请求都有结果后运行一次。

use crate::common::config::ArcConfig;
use crate::email::format_full_body;
use crate::error::FieldError;
use crate::field::{DisplayField, EncryptableField, FieldState};
use crate::primitive::{Ciphertext, PublicKey};
use crate::report::{FieldReport, SubmissionOutcome, SubmissionReport};
use crate::store::FieldStore;
use log::{debug, error, info, warn};

/// What an encryption request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    /// Index into [`Plan::fields`].
    Field(usize),
    EmailBody,
}

/// One encryption request: padded field value or the email body.
#[derive(Debug)]
pub(crate) struct Job {
    pub target: Target,
    pub plaintext: String,
}

#[derive(Debug)]
pub(crate) struct Settled {
    pub target: Target,
    pub result: Result<Ciphertext, FieldError>,
}

impl Job {
    pub fn run<P>(self, primitive: &P, public_key: &PublicKey) -> Settled
    where
        P: crate::primitive::EncryptionPrimitive + ?Sized,
    {
        Settled {
            target: self.target,
            result: primitive.encrypt(public_key, &self.plaintext),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Plan {
    pub fields: Vec<EncryptableField>,
    /// Failures known before any request is issued, by field index.
    pub early: Vec<Option<FieldError>>,
    pub jobs: Vec<Job>,
    pub email_body: Option<Result<Ciphertext, FieldError>>,
}

impl Plan {
    pub fn take_jobs(&mut self) -> Vec<Job> {
        std::mem::take(&mut self.jobs)
    }
}

fn transition(field: &EncryptableField, from: FieldState, to: FieldState) {
    match from.advance(to) {
        Some(state) => debug!("field `{}`: {:?} -> {:?}", field.display_label(), from, state),
        None => warn!(
            "field `{}`: ignored illegal transition {:?} -> {:?}",
            field.display_label(),
            from,
            to
        ),
    }
}

/// Enumerates, extracts and pads every marked field without touching the store.
pub(crate) fn prepare<S: FieldStore + ?Sized>(
    store: &S,
    config: &ArcConfig,
    public_key: Option<&PublicKey>,
) -> Plan {
    let fields = store.encryptable_fields();

    if public_key.is_none() {
        warn!("Public key not provided for encryption. Encryption cannot proceed.");
        for field in &fields {
            transition(field, FieldState::Pending, FieldState::Failed);
        }
        return Plan {
            early: vec![Some(FieldError::MissingKey); fields.len()],
            fields,
            jobs: Vec::new(),
            email_body: config
                .email_body_field()
                .map(|_| Err(FieldError::MissingKey)),
        };
    }

    let mut early = Vec::with_capacity(fields.len());
    let mut jobs = Vec::with_capacity(fields.len() + 1);
    let mut sections = Vec::with_capacity(fields.len());

    for (index, field) in fields.iter().enumerate() {
        let value = store
            .read_value(field)
            .and_then(|value| field.submission_name().map(|_| value));
        match value {
            Ok(value) => {
                let logical = value.logical();
                jobs.push(Job {
                    target: Target::Field(index),
                    plaintext: config.pad(&logical),
                });
                sections.push((field.display_label().to_string(), logical));
                transition(field, FieldState::Pending, FieldState::Encrypting);
                early.push(None);
            }
            Err(e) => {
                error!("Cannot encrypt field `{}`: {}", field.display_label(), e);
                transition(field, FieldState::Pending, FieldState::Failed);
                early.push(Some(FieldError::from(e)));
            }
        }
    }

    if config.email_body_field().is_some() {
        jobs.push(Job {
            target: Target::EmailBody,
            plaintext: format_full_body(&sections),
        });
    }

    Plan {
        fields,
        early,
        jobs,
        email_body: None,
    }
}

/// Applies every settled result to the store and sets the aggregate flag.
pub(crate) fn settle<S: FieldStore + ?Sized>(
    store: &mut S,
    config: &ArcConfig,
    plan: Plan,
    settled: Vec<Settled>,
) -> SubmissionReport {
    let Plan {
        fields,
        early,
        email_body,
        ..
    } = plan;

    let mut results: Vec<(bool, Option<Result<Ciphertext, FieldError>>)> = early
        .into_iter()
        .map(|e| (e.is_some(), e.map(Err)))
        .collect();
    let mut email_body = email_body;
    for Settled { target, result } in settled {
        match target {
            Target::Field(index) => {
                if let Some((_, slot)) = results.get_mut(index) {
                    *slot = Some(result);
                }
            }
            Target::EmailBody => email_body = Some(result),
        }
    }

    let mut reports = Vec::with_capacity(fields.len());
    for (field, (failed_early, result)) in fields.into_iter().zip(results) {
        let result = result
            .unwrap_or_else(|| Err(FieldError::Task("request was never settled".to_string())));
        let result = match result {
            Ok(ciphertext) => commit(store, &field, ciphertext),
            Err(e) => Err(e),
        };
        match &result {
            Ok(_) => {
                info!("Field `{}` encrypted client-side successfully.", field.display_label());
                transition(&field, FieldState::Encrypting, FieldState::Encrypted);
            }
            Err(e) => {
                if !failed_early {
                    error!("Error encrypting field `{}`: {}", field.display_label(), e);
                    transition(&field, FieldState::Encrypting, FieldState::Failed);
                }
                store.mark_failed(&field);
            }
        }
        reports.push(FieldReport { field, result });
    }

    let report = SubmissionReport {
        fields: reports,
        email_body,
    };

    let outcome = report.outcome();
    store.set_hidden(config.flag_field(), outcome.flag_value());
    if outcome == SubmissionOutcome::Degraded {
        warn!(
            "Client-side encryption failed for {} field(s), submitting them for server-side handling.",
            report.failures().count()
        );
    }

    if let Some(name) = config.email_body_field() {
        match &report.email_body {
            Some(Ok(ciphertext)) => store.set_hidden(name, ciphertext.as_str()),
            Some(Err(e)) => warn!("Email body was not encrypted client-side: {}", e),
            None => {}
        }
    }

    report
}

/// Swaps a field for its display. A failure here leaves the field untouched.
fn commit<S: FieldStore + ?Sized>(
    store: &mut S,
    field: &EncryptableField,
    ciphertext: Ciphertext,
) -> Result<Ciphertext, FieldError> {
    let name = field.submission_name()?.to_string();
    let display = DisplayField {
        name,
        ciphertext: ciphertext.as_str().to_string(),
    };
    store.replace(field, display)?;
    Ok(ciphertext)
}
