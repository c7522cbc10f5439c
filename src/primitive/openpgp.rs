//! OpenPGP encryption built on Sequoia.
//!
//! 基于 Sequoia 的 OpenPGP 加密实现。

use super::{Ciphertext, EncryptionPrimitive, PublicKey};
use crate::error::FieldError;
use sequoia_openpgp as pgp;
use pgp::cert::Cert;
use pgp::parse::Parse;
use pgp::policy::StandardPolicy;
use pgp::serialize::stream::{Armorer, Encryptor2, LiteralWriter, Message};
use std::io::Write;

const MESSAGE_BEGIN: &str = "-----BEGIN PGP MESSAGE-----";
const MESSAGE_END: &str = "-----END PGP MESSAGE-----";

/// Whether `text` looks like an ASCII-armored OpenPGP message.
///
/// 判断 `text` 是否为 ASCII 装甲格式的 OpenPGP 消息。
pub fn is_armored_pgp_message(text: &str) -> bool {
    text.contains(MESSAGE_BEGIN) && text.contains(MESSAGE_END)
}

/// Encrypts to every alive, non-revoked transport-encryption key of the
/// recipient certificate under the standard policy and armors the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenPgp;

impl OpenPgp {
    pub fn new() -> Self {
        Self
    }

    fn parse(public_key: &PublicKey) -> Result<Cert, FieldError> {
        Cert::from_bytes(public_key.armored().as_bytes())
            .map_err(|e| FieldError::MalformedKey(e.to_string()))
    }
}

fn crypto_error(e: impl std::fmt::Display) -> FieldError {
    FieldError::Crypto(e.to_string())
}

impl EncryptionPrimitive for OpenPgp {
    fn encrypt(&self, public_key: &PublicKey, plaintext: &str) -> Result<Ciphertext, FieldError> {
        let cert = Self::parse(public_key)?;
        let policy = StandardPolicy::new();
        let recipients: Vec<_> = cert
            .keys()
            .with_policy(&policy, None)
            .supported()
            .alive()
            .revoked(false)
            .for_transport_encryption()
            .collect();
        if recipients.is_empty() {
            return Err(FieldError::NoEncryptionKey);
        }

        let mut sink = Vec::new();
        {
            let message = Message::new(&mut sink);
            let message = Armorer::new(message).build().map_err(crypto_error)?;
            let message = Encryptor2::for_recipients(message, recipients)
                .build()
                .map_err(crypto_error)?;
            let mut message = LiteralWriter::new(message).build().map_err(crypto_error)?;
            message
                .write_all(plaintext.as_bytes())
                .map_err(crypto_error)?;
            message.finalize().map_err(crypto_error)?;
        }

        String::from_utf8(sink)
            .map(Ciphertext::new)
            .map_err(crypto_error)
    }

    fn check_key(&self, public_key: &PublicKey) -> Result<(), FieldError> {
        let cert = Self::parse(public_key)?;
        let policy = StandardPolicy::new();
        let usable = cert
            .keys()
            .with_policy(&policy, None)
            .supported()
            .alive()
            .revoked(false)
            .for_transport_encryption()
            .next()
            .is_some();
        if usable {
            Ok(())
        } else {
            Err(FieldError::NoEncryptionKey)
        }
    }
}
