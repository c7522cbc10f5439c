//! `seal-form` encrypts the marked fields of a web form against a recipient's
//! OpenPGP public key before the form is submitted. Each field is padded to a
//! fixed block size, encrypted independently and swapped for its ciphertext
//! under the same submission name, while a hidden flag tells the server
//! whether everything left the browser encrypted. Field failures degrade the
//! submission instead of blocking it.
//!
//! Encryption requests of one submission can run sequentially, on the Rayon
//! pool, or as a Tokio scatter/gather, and are always joined before the form
//! is touched.
//!
//! `seal-form` 在表单提交前，使用收件人的 OpenPGP 公钥加密表单中被标记的字段。
//! 每个字段先填充到固定块大小，再独立加密，并以相同的提交名称替换为密文；
//! 隐藏标志告诉服务器是否所有内容都已加密。单个字段失败只会降级提交，不会阻止提交。

pub mod common;
pub mod email;
pub mod encryptor;
pub mod error;
pub mod field;
pub mod primitive;
pub mod report;
pub mod store;
pub mod submit;

pub use error::{Error, Result};

/// The types needed to wire a form to the encryptor.
///
/// 将表单接入加密器所需的类型。
pub mod prelude {
    pub use crate::common::config::{ArcConfig, ConfigBuilder, FailureNotice};
    pub use crate::common::mode::ProcessingMode;
    pub use crate::common::padding::PaddingScheme;
    pub use crate::encryptor::FieldEncryptor;
    pub use crate::error::{DomShapeError, Error, FieldError, Result};
    pub use crate::field::{EncryptableField, FieldKind, FieldState, FieldValue};
    pub use crate::primitive::{Ciphertext, EncryptionPrimitive, OpenPgp, PublicKey};
    pub use crate::report::{FieldReport, SubmissionOutcome, SubmissionReport};
    pub use crate::store::{FieldStore, MemoryForm};
    pub use crate::submit::{SubmitDisposition, SubmitEvent, SubmitHandler};
}
