//! The encryption primitive the field workflow delegates to.
//!
//! 字段加密工作流所委托的加密原语。

use crate::error::FieldError;
use std::fmt;
use std::sync::Arc;

pub mod openpgp;

pub use openpgp::{is_armored_pgp_message, OpenPgp};

/// An armored public key injected by the page at render time.
///
/// Cheap to clone; the text is shared and never mutated.
///
/// 页面渲染时注入的 ASCII 装甲公钥。克隆开销低，文本共享且不可变。
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(Arc<str>);

impl PublicKey {
    pub fn new(armored: impl Into<Arc<str>>) -> Self {
        Self(armored.into())
    }

    /// Reads the key as the page provides it. Absent or blank text means the
    /// page has no key configured.
    pub fn from_page(armored: Option<&str>) -> Option<Self> {
        armored
            .filter(|text| !text.trim().is_empty())
            .map(|text| Self::new(text))
    }

    pub fn armored(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({} bytes)", self.0.len())
    }
}

/// Armored ciphertext produced for one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ciphertext(String);

impl Ciphertext {
    pub fn new(armored: impl Into<String>) -> Self {
        Self(armored.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for Ciphertext {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Encrypts a plaintext string against a public key.
///
/// Implementations are called from worker threads in the parallel and
/// asynchronous modes.
///
/// 使用公钥加密明文字符串。在并行和异步模式下会从工作线程调用实现。
pub trait EncryptionPrimitive: Send + Sync {
    fn encrypt(&self, public_key: &PublicKey, plaintext: &str) -> Result<Ciphertext, FieldError>;

    /// Checks that `public_key` can be used for encryption at all.
    fn check_key(&self, _public_key: &PublicKey) -> Result<(), FieldError> {
        Ok(())
    }
}

impl<P: EncryptionPrimitive + ?Sized> EncryptionPrimitive for Arc<P> {
    fn encrypt(&self, public_key: &PublicKey, plaintext: &str) -> Result<Ciphertext, FieldError> {
        (**self).encrypt(public_key, plaintext)
    }

    fn check_key(&self, public_key: &PublicKey) -> Result<(), FieldError> {
        (**self).check_key(public_key)
    }
}
