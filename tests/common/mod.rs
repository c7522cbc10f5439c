//! Recipient-side helpers: key generation and decryption of what the form
//! sent out.

#![allow(dead_code)]

use seal_form::prelude::PublicKey;
use sequoia_openpgp as pgp;
use pgp::cert::prelude::*;
use pgp::crypto::SessionKey;
use pgp::packet::{PKESK, SKESK};
use pgp::parse::stream::{
    DecryptionHelper, DecryptorBuilder, MessageStructure, VerificationHelper,
};
use pgp::parse::Parse;
use pgp::policy::{Policy, StandardPolicy};
use pgp::serialize::SerializeInto;
use pgp::types::SymmetricAlgorithm;
use pgp::{Fingerprint, KeyHandle};
use std::io::Read;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A fresh recipient certificate (with secrets) and its armored public key.
pub fn recipient() -> (Cert, PublicKey) {
    let (cert, _) = CertBuilder::general_purpose(None, Some("hushline@example.org"))
        .generate()
        .unwrap();
    let armored = String::from_utf8(cert.armored().to_vec().unwrap()).unwrap();
    (cert, PublicKey::new(armored))
}

struct Helper<'a> {
    policy: &'a dyn Policy,
    secret: &'a Cert,
}

impl VerificationHelper for Helper<'_> {
    fn get_certs(&mut self, _ids: &[KeyHandle]) -> pgp::Result<Vec<Cert>> {
        Ok(Vec::new())
    }

    fn check(&mut self, _structure: MessageStructure) -> pgp::Result<()> {
        Ok(())
    }
}

impl DecryptionHelper for Helper<'_> {
    fn decrypt<D>(
        &mut self,
        pkesks: &[PKESK],
        _skesks: &[SKESK],
        sym_algo: Option<SymmetricAlgorithm>,
        mut decrypt: D,
    ) -> pgp::Result<Option<Fingerprint>>
    where
        D: FnMut(SymmetricAlgorithm, &SessionKey) -> bool,
    {
        let key = self
            .secret
            .keys()
            .unencrypted_secret()
            .with_policy(self.policy, None)
            .for_transport_encryption()
            .next()
            .unwrap()
            .key()
            .clone();
        let mut pair = key.into_keypair()?;
        for pkesk in pkesks {
            if let Some((algo, session_key)) = pkesk.decrypt(&mut pair, sym_algo) {
                if decrypt(algo, &session_key) {
                    break;
                }
            }
        }
        Ok(None)
    }
}

/// Decrypts an armored message with the recipient's secret key.
pub fn decrypt(secret: &Cert, armored: &str) -> String {
    let policy = StandardPolicy::new();
    let helper = Helper {
        policy: &policy,
        secret,
    };
    let mut decryptor = DecryptorBuilder::from_bytes(armored.as_bytes())
        .unwrap()
        .with_policy(&policy, None, helper)
        .unwrap();
    let mut plaintext = String::new();
    decryptor.read_to_string(&mut plaintext).unwrap();
    plaintext
}
