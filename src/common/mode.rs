//! Defines the processing modes for the encryption of a form.
//!
//! 定义了表单加密的处理模式。

/// Specifies how the per-field encryption requests of one submission are
/// executed. Every mode joins all requests before the form is touched, so the
/// observable result is the same; only latency and thread usage differ.
///
/// 指定一次提交中各字段加密请求的执行方式。
/// 所有模式都会在修改表单之前等待全部请求完成，因此结果相同，只有延迟和线程使用不同。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProcessingMode {
    /// Single-threaded, one field after another.
    ///
    /// 单线程，逐个字段处理。
    #[default]
    Ordinary,

    /// Fields encrypted concurrently on the Rayon thread pool.
    ///
    /// 使用 Rayon 线程池并发加密字段。
    Parallel,

    /// Scatter/gather on Tokio: one blocking task per field, all joined.
    ///
    /// 基于 Tokio 的分发/汇集：每个字段一个阻塞任务，全部汇合。
    #[cfg(feature = "async")]
    Asynchronous,
}
