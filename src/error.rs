use std::time::Duration;
use thiserror::Error;

/// A form field whose shape prevents it from being encrypted and renamed safely.
///
/// 表单字段的结构不允许安全地加密和重命名。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomShapeError {
    #[error("field has no submission name")]
    MissingName,

    #[error("option group `{0}` contains no inputs")]
    EmptyGroup(String),

    #[error("field handle {0} does not refer to a control in this form")]
    UnknownField(usize),

    #[error("control at {0} is not an encryptable field")]
    NotEncryptable(usize),
}

/// Failure of a single field. Never aborts the surrounding submission.
///
/// 单个字段的失败，永远不会中止整个提交。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("页面未配置公钥，无法加密")]
    MissingKey,

    #[error("公钥无法解析: {0}")]
    MalformedKey(String),

    #[error("公钥中没有可用于传输加密的子密钥")]
    NoEncryptionKey,

    #[error("加密原语拒绝了输入: {0}")]
    Crypto(String),

    #[error("表单结构无效: {0}")]
    DomShape(#[from] DomShapeError),

    #[error("encryption did not settle within {0:?}")]
    Timeout(Duration),

    #[error("异步任务错误: {0}")]
    Task(String),

    #[error("加密未执行: {0}")]
    NotAttempted(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("配置无效: {0}")]
    InvalidConfig(&'static str),

    #[error("不支持的操作或处理模式组合")]
    UnsupportedOperation,

    #[error("表单提交失败: {0}")]
    Submission(String),
}

#[cfg(feature = "async")]
impl From<tokio::task::JoinError> for FieldError {
    fn from(e: tokio::task::JoinError) -> Self {
        FieldError::Task(e.to_string())
    }
}

// 定义一个统一的 Result 类型
pub type Result<T> = std::result::Result<T, Error>;
