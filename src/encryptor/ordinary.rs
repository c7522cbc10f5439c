//! Ordinary (single-threaded) gathering of field encryption requests.

use super::common::{Job, Settled};
use crate::primitive::{EncryptionPrimitive, PublicKey};

/// Runs every request in turn.
pub(crate) fn gather<P>(primitive: &P, public_key: &PublicKey, jobs: Vec<Job>) -> Vec<Settled>
where
    P: EncryptionPrimitive + ?Sized,
{
    jobs.into_iter()
        .map(|job| job.run(primitive, public_key))
        .collect()
}
