//! Implements parallel gathering of field encryption requests.
//!
//! 实现字段加密请求的并行汇集。

use super::common::{Job, Settled};
use crate::primitive::{EncryptionPrimitive, PublicKey};
use rayon::prelude::*;

/// Runs every request on the Rayon pool. Results keep the order of `jobs`.
pub(crate) fn gather<P>(primitive: &P, public_key: &PublicKey, jobs: Vec<Job>) -> Vec<Settled>
where
    P: EncryptionPrimitive + ?Sized,
{
    jobs.into_par_iter()
        .map(|job| job.run(primitive, public_key))
        .collect()
}
