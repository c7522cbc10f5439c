//! Orchestrates the encryption of every marked field of a form.
//!
//! A run has three phases. *Prepare* enumerates the marked fields, extracts
//! and pads their values. *Gather* issues one encryption request per field
//! (plus one for the email body when configured) and waits for all of them,
//! in the configured [`ProcessingMode`]. *Settle* swaps successful fields for
//! their encrypted display, flags failures and sets the aggregate flag.
//! The store is only written during settle.
//!
//! 编排表单中所有标记字段的加密。一次运行分为准备、汇集、结算三个阶段，
//! 只有结算阶段会写入存储。

use crate::common::config::ArcConfig;
use crate::common::mode::ProcessingMode;
use crate::error::{FieldError, Result};
use crate::primitive::{EncryptionPrimitive, OpenPgp, PublicKey};
use crate::report::SubmissionReport;
use crate::store::FieldStore;
use std::sync::Arc;

pub(crate) mod common;
pub(crate) mod ordinary;
pub(crate) mod parallel;

#[cfg(feature = "async")]
pub(crate) mod asynchronous;

/// Encrypts every marked field of a form against the page's public key.
///
/// 使用页面公钥加密表单中所有被标记的字段。
pub struct FieldEncryptor<P: ?Sized = OpenPgp> {
    primitive: Arc<P>,
    public_key: Option<PublicKey>,
    config: ArcConfig,
    mode: ProcessingMode,
}

impl<P: ?Sized> Clone for FieldEncryptor<P> {
    fn clone(&self) -> Self {
        Self {
            primitive: Arc::clone(&self.primitive),
            public_key: self.public_key.clone(),
            config: self.config.clone(),
            mode: self.mode,
        }
    }
}

impl FieldEncryptor<OpenPgp> {
    /// An OpenPGP encryptor for the page's public key, if it has one.
    pub fn new(public_key: Option<PublicKey>) -> Self {
        Self::with_primitive(OpenPgp::new(), public_key)
    }
}

impl<P: EncryptionPrimitive> FieldEncryptor<P> {
    pub fn with_primitive(primitive: P, public_key: Option<PublicKey>) -> Self {
        Self::with_shared_primitive(Arc::new(primitive), public_key)
    }
}

impl<P: EncryptionPrimitive + ?Sized> FieldEncryptor<P> {
    pub fn with_shared_primitive(primitive: Arc<P>, public_key: Option<PublicKey>) -> Self {
        Self {
            primitive,
            public_key,
            config: ArcConfig::default(),
            mode: ProcessingMode::default(),
        }
    }

    pub fn with_config(mut self, config: ArcConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_mode(mut self, mode: ProcessingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn config(&self) -> &ArcConfig {
        &self.config
    }

    pub fn mode(&self) -> ProcessingMode {
        self.mode
    }

    pub fn public_key(&self) -> Option<&PublicKey> {
        self.public_key.as_ref()
    }

    /// Checks up front whether the page key is usable at all.
    pub fn check_key(&self) -> std::result::Result<(), FieldError> {
        let key = self.public_key.as_ref().ok_or(FieldError::MissingKey)?;
        self.primitive.check_key(key)
    }

    /// Encrypts the form in [`ProcessingMode::Ordinary`] or
    /// [`ProcessingMode::Parallel`].
    ///
    /// Field failures are reported, never returned as `Err`.
    ///
    /// 以普通或并行模式加密表单。字段失败只会被报告，不会作为 `Err` 返回。
    pub fn encrypt_form<S: FieldStore + ?Sized>(&self, store: &mut S) -> Result<SubmissionReport> {
        let gather: fn(&P, &PublicKey, Vec<common::Job>) -> Vec<common::Settled> = match self.mode {
            ProcessingMode::Ordinary => ordinary::gather::<P>,
            ProcessingMode::Parallel => parallel::gather::<P>,
            #[cfg(feature = "async")]
            ProcessingMode::Asynchronous => return Err(crate::error::Error::UnsupportedOperation),
        };

        let mut plan = common::prepare(store, &self.config, self.public_key.as_ref());
        let settled = match &self.public_key {
            None => Vec::new(),
            Some(key) => gather(&*self.primitive, key, plan.take_jobs()),
        };
        Ok(common::settle(store, &self.config, plan, settled))
    }
}

#[cfg(feature = "async")]
impl<P: EncryptionPrimitive + ?Sized + 'static> FieldEncryptor<P> {
    /// Encrypts the form with one task per field, joined before settling.
    ///
    /// Runs regardless of the configured mode. Requires a Tokio runtime.
    ///
    /// 每个字段一个任务，全部汇合后再结算。需要 Tokio 运行时。
    pub async fn encrypt_form_async<S: FieldStore + ?Sized>(&self, store: &mut S) -> SubmissionReport {
        let mut plan = common::prepare(store, &self.config, self.public_key.as_ref());
        let settled = match &self.public_key {
            None => Vec::new(),
            Some(key) => {
                asynchronous::gather(
                    Arc::clone(&self.primitive),
                    key.clone(),
                    plan.take_jobs(),
                    self.config.timeout(),
                )
                .await
            }
        };
        common::settle(store, &self.config, plan, settled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::ConfigBuilder;
    use crate::common::EMAIL_BODY_FIELD;
    use crate::error::DomShapeError;
    use crate::field::FieldState;
    use crate::primitive::Ciphertext;
    use crate::report::SubmissionOutcome;
    use crate::store::memory::{Control, GroupKind, MemoryForm, Widget};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Wraps the plaintext in markers and records what it saw.
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl EncryptionPrimitive for Recorder {
        fn encrypt(&self, _key: &PublicKey, plaintext: &str) -> std::result::Result<Ciphertext, FieldError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(plaintext.to_string());
            if let Some(needle) = self.fail_on {
                if plaintext.contains(needle) {
                    return Err(FieldError::Crypto(format!("refused `{needle}`")));
                }
            }
            Ok(Ciphertext::new(format!("<{}>", plaintext.trim_end())))
        }
    }

    fn key() -> Option<PublicKey> {
        Some(PublicKey::new("test-key"))
    }

    fn small_blocks() -> ArcConfig {
        ConfigBuilder::new().set_block_size(8).build().unwrap()
    }

    #[test]
    fn pads_each_field_before_encrypting() {
        let recorder = Arc::new(Recorder::default());
        let encryptor = FieldEncryptor::with_shared_primitive(recorder.clone(), key())
            .with_config(small_blocks());
        let mut form = MemoryForm::new()
            .with(Control::text("empty", "").encrypted())
            .with(Control::text("greeting", "hello").encrypted());

        let report = encryptor.encrypt_form(&mut form).unwrap();

        let seen = recorder.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![" ".repeat(8), "hello   ".to_string()]);
        assert_eq!(report.outcome(), SubmissionOutcome::Encrypted);
        assert_eq!(form.hidden_value("client_side_encrypted"), Some("true"));
    }

    #[test]
    fn failure_is_isolated_to_its_field() {
        let recorder = Recorder {
            fail_on: Some("bad"),
            ..Default::default()
        };
        let encryptor = FieldEncryptor::with_primitive(recorder, key()).with_config(small_blocks());
        let mut form = MemoryForm::new()
            .with(Control::text("a", "bad").encrypted())
            .with(Control::text("b", "good").encrypted());

        let report = encryptor.encrypt_form(&mut form).unwrap();

        assert_eq!(report.outcome(), SubmissionOutcome::Degraded);
        assert_eq!(report.field("a").unwrap().state(), FieldState::Failed);
        assert_eq!(report.field("b").unwrap().state(), FieldState::Encrypted);
        assert_eq!(form.hidden_value("client_side_encrypted"), Some("false"));

        let payload = form.payload();
        assert!(payload.contains(&("a".to_string(), "bad".to_string())));
        assert!(payload.contains(&("b".to_string(), "<good>".to_string())));
        assert!(form.control_named("a").unwrap().failed);
    }

    #[test]
    fn missing_key_fails_every_field_without_calling_the_primitive() {
        let recorder = Arc::new(Recorder::default());
        let encryptor = FieldEncryptor::with_shared_primitive(recorder.clone(), None);
        let mut form = MemoryForm::new()
            .with(Control::text("a", "one").encrypted())
            .with(Control::textarea("b", "two").encrypted());
        let before = form.payload();

        let report = encryptor.encrypt_form(&mut form).unwrap();

        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
        assert!(report
            .fields
            .iter()
            .all(|r| r.error() == Some(&FieldError::MissingKey)));
        assert_eq!(form.hidden_value("client_side_encrypted"), Some("false"));
        let after: Vec<_> = form
            .payload()
            .into_iter()
            .filter(|(name, _)| name != "client_side_encrypted")
            .collect();
        assert_eq!(after, before);
    }

    #[test]
    fn group_is_encrypted_under_its_shared_name() {
        let recorder = Arc::new(Recorder::default());
        let encryptor = FieldEncryptor::with_shared_primitive(recorder.clone(), key())
            .with_config(small_blocks());
        let mut form = MemoryForm::new().with(
            Control::checkboxes("topics", &[("a", true), ("b", false), ("c", true)]).encrypted(),
        );

        let report = encryptor.encrypt_form(&mut form).unwrap();

        assert!(report.is_encrypted());
        assert_eq!(recorder.seen.lock().unwrap()[0], "a, c    ");
        let topics: Vec<_> = form
            .payload()
            .into_iter()
            .filter(|(name, _)| name == "topics")
            .collect();
        assert_eq!(topics, vec![("topics".to_string(), "<a, c>".to_string())]);
    }

    #[test]
    fn shape_errors_degrade_without_aborting() {
        let encryptor = FieldEncryptor::with_primitive(Recorder::default(), key());
        let mut form = MemoryForm::new()
            .with(Control::group(GroupKind::Radio, vec![]).encrypted().labeled("Choice"))
            .with(Control::text("ok", "fine").encrypted());

        let report = encryptor.encrypt_form(&mut form).unwrap();

        assert_eq!(
            report.fields[0].error(),
            Some(&FieldError::DomShape(DomShapeError::EmptyGroup("Choice".into())))
        );
        assert!(report.fields[1].result.is_ok());
        assert_eq!(report.outcome(), SubmissionOutcome::Degraded);
    }

    #[test]
    fn parallel_mode_keeps_document_order() {
        let encryptor = FieldEncryptor::with_primitive(Recorder::default(), key())
            .with_config(small_blocks())
            .with_mode(ProcessingMode::Parallel);
        let mut form = MemoryForm::new();
        for i in 0..32 {
            form.push(Control::text(format!("f{i}"), format!("v{i}")).encrypted());
        }

        let report = encryptor.encrypt_form(&mut form).unwrap();

        for (i, field) in report.fields.iter().enumerate() {
            assert_eq!(field.field.name.as_deref(), Some(format!("f{i}").as_str()));
            assert_eq!(field.ciphertext().unwrap().as_str(), format!("<v{i}>"));
        }
    }

    #[test]
    fn email_body_is_built_from_labels_and_values() {
        let recorder = Arc::new(Recorder::default());
        let config = ConfigBuilder::new()
            .set_block_size(8)
            .set_email_body_field(Some(EMAIL_BODY_FIELD))
            .build()
            .unwrap();
        let encryptor =
            FieldEncryptor::with_shared_primitive(recorder.clone(), key()).with_config(config);
        let mut form = MemoryForm::new()
            .with(Control::text("contact", "signal").encrypted().labeled("Contact Method"))
            .with(Control::textarea("content", "hi").encrypted());

        let report = encryptor.encrypt_form(&mut form).unwrap();

        let expected = "# Contact Method\n\nsignal\n\n====================\n\n# content\n\nhi\n\n====================";
        assert_eq!(recorder.seen.lock().unwrap().last().unwrap(), expected);
        assert!(matches!(report.email_body, Some(Ok(_))));
        assert_eq!(
            form.hidden_value(EMAIL_BODY_FIELD),
            Some(format!("<{expected}>").as_str())
        );
    }

    #[test]
    fn displays_replace_plaintext() {
        let encryptor = FieldEncryptor::with_primitive(Recorder::default(), key());
        let mut form = MemoryForm::new().with(Control::textarea("content", "secret").encrypted());

        encryptor.encrypt_form(&mut form).unwrap();

        let control = form.control_named("content").unwrap();
        assert!(matches!(control.widget, Widget::Display { .. }));
        assert!(form.encryptable_fields().is_empty());
    }

    #[test]
    fn marked_hidden_control_degrades_the_submission() {
        let recorder = Arc::new(Recorder::default());
        let encryptor = FieldEncryptor::with_shared_primitive(recorder.clone(), key());
        let mut form = MemoryForm::new()
            .with(Control::hidden("secret_note", "plaintext-secret").encrypted())
            .with(Control::text("content", "hi").encrypted());

        let report = encryptor.encrypt_form(&mut form).unwrap();

        assert_eq!(report.fields.len(), 2);
        assert_eq!(
            report.field("secret_note").unwrap().error(),
            Some(&FieldError::DomShape(DomShapeError::NotEncryptable(0)))
        );
        assert_eq!(report.field("content").unwrap().state(), FieldState::Encrypted);
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(form.hidden_value("client_side_encrypted"), Some("false"));
        assert!(form.control_named("secret_note").unwrap().failed);
    }

    #[test]
    fn unnamed_control_fails_without_touching_siblings() {
        let encryptor = FieldEncryptor::with_primitive(Recorder::default(), key());
        let mut form = MemoryForm::new()
            .with(
                Control {
                    name: None,
                    ..Control::text("x", "anonymous")
                }
                .encrypted(),
            )
            .with(Control::text("content", "hi").encrypted());

        let report = encryptor.encrypt_form(&mut form).unwrap();

        assert_eq!(
            report.fields[0].error(),
            Some(&FieldError::DomShape(DomShapeError::MissingName))
        );
        assert_eq!(report.fields[1].ciphertext().unwrap().as_str(), "<hi>");
        assert_eq!(report.outcome(), SubmissionOutcome::Degraded);
        assert_eq!(form.hidden_value("client_side_encrypted"), Some("false"));
        assert!(form.controls()[0].failed);
        assert_eq!(form.controls()[0].widget, Widget::Text("anonymous".to_string()));
        assert!(form.payload().contains(&("content".to_string(), "<hi>".to_string())));
    }

    /// Counts how often the form is read.
    #[cfg(feature = "async")]
    struct Watched {
        form: MemoryForm,
        reads: std::cell::Cell<usize>,
    }

    #[cfg(feature = "async")]
    impl FieldStore for Watched {
        fn encryptable_fields(&self) -> Vec<crate::field::EncryptableField> {
            self.reads.set(self.reads.get() + 1);
            self.form.encryptable_fields()
        }

        fn read_value(
            &self,
            field: &crate::field::EncryptableField,
        ) -> std::result::Result<crate::field::FieldValue, DomShapeError> {
            self.reads.set(self.reads.get() + 1);
            self.form.read_value(field)
        }

        fn replace(
            &mut self,
            field: &crate::field::EncryptableField,
            display: crate::field::DisplayField,
        ) -> std::result::Result<(), DomShapeError> {
            self.form.replace(field, display)
        }

        fn set_hidden(&mut self, name: &str, value: &str) {
            self.form.set_hidden(name, value)
        }

        fn submit(&mut self) -> Result<()> {
            self.form.submit()
        }
    }

    #[cfg(feature = "async")]
    #[test]
    fn asynchronous_mode_is_rejected_before_the_form_is_read() {
        let recorder = Arc::new(Recorder::default());
        let encryptor = FieldEncryptor::with_shared_primitive(recorder.clone(), key())
            .with_mode(ProcessingMode::Asynchronous);
        let mut store = Watched {
            form: MemoryForm::new().with(Control::text("a", "x").encrypted()),
            reads: std::cell::Cell::new(0),
        };

        assert!(matches!(
            encryptor.encrypt_form(&mut store),
            Err(crate::error::Error::UnsupportedOperation)
        ));
        assert_eq!(store.reads.get(), 0);
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.form.hidden_value("client_side_encrypted"), None);
    }

    #[test]
    fn check_key_reports_missing_key() {
        let encryptor = FieldEncryptor::with_primitive(Recorder::default(), None);
        assert_eq!(encryptor.check_key(), Err(FieldError::MissingKey));
        let encryptor = FieldEncryptor::with_primitive(Recorder::default(), key());
        assert_eq!(encryptor.check_key(), Ok(()));
    }
}
