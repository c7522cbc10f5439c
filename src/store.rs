//! The seam between the encryption workflow and whatever holds the form.
//!
//! A browser document is one possible backing store; [`memory::MemoryForm`]
//! is another. The workflow only needs to enumerate marked fields, read their
//! values, swap a field for its encrypted replacement and submit.
//!
//! 加密工作流与表单载体之间的接口。浏览器文档是一种可能的存储，
//! [`memory::MemoryForm`] 是另一种。

use crate::error::{DomShapeError, Result};
use crate::field::{DisplayField, EncryptableField, FieldValue};
use crate::report::SubmissionReport;

pub mod memory;

pub use memory::MemoryForm;

pub trait FieldStore {
    /// Every field marked for end-to-end encryption, in document order.
    fn encryptable_fields(&self) -> Vec<EncryptableField>;

    /// Reads the live value of `field`.
    fn read_value(&self, field: &EncryptableField) -> std::result::Result<FieldValue, DomShapeError>;

    /// Replaces `field` with its encrypted display. There is no way back.
    fn replace(
        &mut self,
        field: &EncryptableField,
        display: DisplayField,
    ) -> std::result::Result<(), DomShapeError>;

    /// Flags a field whose encryption failed. Its value stays as it was.
    fn mark_failed(&mut self, _field: &EncryptableField) {}

    /// Sets a hidden field, creating it when the form has none by that name.
    fn set_hidden(&mut self, name: &str, value: &str);

    /// Shows the user that some fields will be submitted unencrypted.
    fn notify_failures(&mut self, _report: &SubmissionReport) {}

    /// Submits the form programmatically.
    fn submit(&mut self) -> Result<()>;
}
