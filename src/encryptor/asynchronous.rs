//! Asynchronous scatter/gather of field encryption requests.
//!
//! Each request runs on Tokio's blocking pool; all of them are joined before
//! the caller gets anything back, so nothing can reach the form while a
//! sibling request is still in flight.
//!
//! 异步分发/汇集字段加密请求。每个请求在 Tokio 阻塞线程池中运行，
//! 并在返回前全部汇合，因此在其他请求仍在进行时不会有任何结果写入表单。
#![cfg(feature = "async")]

use super::common::{Job, Settled};
use crate::error::FieldError;
use crate::primitive::{EncryptionPrimitive, PublicKey};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

pub(crate) async fn gather<P>(
    primitive: Arc<P>,
    public_key: PublicKey,
    jobs: Vec<Job>,
    timeout: Option<Duration>,
) -> Vec<Settled>
where
    P: EncryptionPrimitive + ?Sized + 'static,
{
    let requests = jobs.into_iter().map(|job| {
        let primitive = Arc::clone(&primitive);
        let public_key = public_key.clone();
        async move {
            let Job { target, plaintext } = job;
            let handle =
                tokio::task::spawn_blocking(move || primitive.encrypt(&public_key, &plaintext));
            let result = match timeout {
                // The blocking task keeps running after a timeout; its result is dropped.
                Some(limit) => match tokio::time::timeout(limit, handle).await {
                    Ok(joined) => joined.map_err(FieldError::from).and_then(|r| r),
                    Err(_) => Err(FieldError::Timeout(limit)),
                },
                None => handle.await.map_err(FieldError::from).and_then(|r| r),
            };
            Settled { target, result }
        }
    });

    join_all(requests).await
}
