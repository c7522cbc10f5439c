//! Single-shot submit interception for one form.
//!
//! The handler suppresses the default submission every time it sees the
//! event. The first time it also encrypts the form and then submits it
//! programmatically, exactly once. A degraded submission is still a
//! submission: the user is never blocked from sending the form.
//!
//! 单次提交拦截。处理器每次都会阻止默认提交；第一次还会加密表单并以编程方式恰好提交一次。
//! 降级的提交仍然是提交，用户永远不会被阻止发送表单。

use crate::common::config::FailureNotice;
use crate::encryptor::FieldEncryptor;
use crate::error::{Error, FieldError, Result};
use crate::primitive::{EncryptionPrimitive, OpenPgp};
use crate::report::{FieldReport, SubmissionOutcome, SubmissionReport};
use crate::store::FieldStore;
use log::{error, warn};

/// The user-initiated submit event.
#[derive(Debug, Default)]
pub struct SubmitEvent {
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitDisposition {
    /// This event triggered the encryption and the programmatic submission.
    Handled(SubmissionReport),
    /// The form was already handled; nothing was done.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    InFlight,
    Submitted,
}

pub struct SubmitHandler<S, P: ?Sized = OpenPgp> {
    store: S,
    encryptor: FieldEncryptor<P>,
    phase: Phase,
}

impl<S, P> SubmitHandler<S, P>
where
    S: FieldStore,
    P: EncryptionPrimitive + ?Sized,
{
    pub fn new(store: S, encryptor: FieldEncryptor<P>) -> Self {
        Self {
            store,
            encryptor,
            phase: Phase::Idle,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn encryptor(&self) -> &FieldEncryptor<P> {
        &self.encryptor
    }

    /// Whether the form has already been submitted programmatically.
    pub fn is_submitted(&self) -> bool {
        self.phase == Phase::Submitted
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Returns `false` when this event must be ignored.
    fn begin(&mut self, event: &mut SubmitEvent) -> bool {
        event.prevent_default();
        if self.phase != Phase::Idle {
            warn!("Form submission already handled, ignoring repeated submit event.");
            return false;
        }
        self.phase = Phase::InFlight;
        true
    }

    /// Fails every marked field when the encryptor could not run at all.
    fn abandon(&mut self, cause: &Error) -> SubmissionReport {
        let flag = self.encryptor.config().flag_field().to_string();
        self.store
            .set_hidden(&flag, SubmissionOutcome::Degraded.flag_value());
        let fields = self
            .store
            .encryptable_fields()
            .into_iter()
            .map(|field| {
                self.store.mark_failed(&field);
                FieldReport {
                    field,
                    result: Err(FieldError::NotAttempted(cause.to_string())),
                }
            })
            .collect();
        SubmissionReport {
            fields,
            email_body: None,
        }
    }

    fn finish(&mut self, encrypted: Result<SubmissionReport>) -> Result<SubmitDisposition> {
        let (report, cause) = match encrypted {
            Ok(report) => (report, None),
            Err(e) => {
                error!("Client-side encryption could not run, submitting for server-side handling: {}", e);
                (self.abandon(&e), Some(e))
            }
        };

        if report.outcome() == SubmissionOutcome::Degraded
            && self.encryptor.config().failure_notice() == FailureNotice::Notify
        {
            self.store.notify_failures(&report);
        }

        self.phase = Phase::Submitted;
        if let Err(e) = self.store.submit() {
            error!("Form submission failed: {}", e);
            return Err(e);
        }
        match cause {
            Some(e) => Err(e),
            None => Ok(SubmitDisposition::Handled(report)),
        }
    }

    /// Handles a submit event with the encryptor's blocking modes.
    pub fn on_submit(&mut self, event: &mut SubmitEvent) -> Result<SubmitDisposition> {
        if !self.begin(event) {
            return Ok(SubmitDisposition::Ignored);
        }
        let encrypted = self.encryptor.encrypt_form(&mut self.store);
        self.finish(encrypted)
    }
}

#[cfg(feature = "async")]
impl<S, P> SubmitHandler<S, P>
where
    S: FieldStore,
    P: EncryptionPrimitive + ?Sized + 'static,
{
    /// Handles a submit event with the asynchronous scatter/gather mode.
    pub async fn on_submit_async(&mut self, event: &mut SubmitEvent) -> Result<SubmitDisposition> {
        if !self.begin(event) {
            return Ok(SubmitDisposition::Ignored);
        }
        let report = self.encryptor.encrypt_form_async(&mut self.store).await;
        self.finish(Ok(report))
    }
}
