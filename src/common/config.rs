use crate::common::padding::PaddingScheme;
use crate::common::{DEFAULT_BLOCK_SIZE, DEFAULT_FILL, ENCRYPTED_FLAG_FIELD};
use crate::error::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

/// Whether encryption failures are surfaced before the form is submitted.
///
/// Submission proceeds in both cases.
///
/// 提交前是否提示加密失败。两种情况下提交都会继续。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FailureNotice {
    #[default]
    Silent,
    Notify,
}

pub(crate) struct ConfigIndex {
    pub block_size: usize,
    pub fill: char,
    pub padding: PaddingScheme,
    pub flag_field: String,
    pub email_body_field: Option<String>,
    pub failure_notice: FailureNotice,
    pub timeout: Option<Duration>,
}

impl Default for ConfigIndex {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            fill: DEFAULT_FILL,
            padding: PaddingScheme::default(),
            flag_field: ENCRYPTED_FLAG_FIELD.to_string(),
            email_body_field: None,
            failure_notice: FailureNotice::default(),
            timeout: None,
        }
    }
}

#[derive(Clone, Default)]
pub struct ArcConfig {
    index: Arc<ConfigIndex>,
}

impl ArcConfig {
    pub fn block_size(&self) -> usize {
        self.index.block_size
    }

    pub fn fill(&self) -> char {
        self.index.fill
    }

    pub fn padding(&self) -> PaddingScheme {
        self.index.padding
    }

    pub fn flag_field(&self) -> &str {
        &self.index.flag_field
    }

    pub fn email_body_field(&self) -> Option<&str> {
        self.index.email_body_field.as_deref()
    }

    pub fn failure_notice(&self) -> FailureNotice {
        self.index.failure_notice
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.index.timeout
    }

    /// Pads a field value according to this configuration.
    pub fn pad(&self, value: &str) -> String {
        self.index
            .padding
            .pad(value, self.index.block_size, self.index.fill)
    }
}

impl std::fmt::Debug for ArcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArcConfig")
            .field("block_size", &self.index.block_size)
            .field("fill", &self.index.fill)
            .field("padding", &self.index.padding)
            .field("flag_field", &self.index.flag_field)
            .field("email_body_field", &self.index.email_body_field)
            .field("failure_notice", &self.index.failure_notice)
            .field("timeout", &self.index.timeout)
            .finish()
    }
}

pub struct ConfigBuilder {
    pub block_size: usize,
    pub fill: char,
    pub padding: PaddingScheme,
    pub flag_field: String,
    pub email_body_field: Option<String>,
    pub failure_notice: FailureNotice,
    pub timeout: Option<Duration>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        let defaults = ConfigIndex::default();
        Self {
            block_size: defaults.block_size,
            fill: defaults.fill,
            padding: defaults.padding,
            flag_field: defaults.flag_field,
            email_body_field: defaults.email_body_field,
            failure_notice: defaults.failure_notice,
            timeout: defaults.timeout,
        }
    }

    pub fn set_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn set_fill(mut self, fill: char) -> Self {
        self.fill = fill;
        self
    }

    pub fn set_padding(mut self, padding: PaddingScheme) -> Self {
        self.padding = padding;
        self
    }

    pub fn set_flag_field(mut self, flag_field: impl Into<String>) -> Self {
        self.flag_field = flag_field.into();
        self
    }

    pub fn set_email_body_field(mut self, field: Option<impl Into<String>>) -> Self {
        self.email_body_field = field.map(Into::into);
        self
    }

    pub fn set_failure_notice(mut self, notice: FailureNotice) -> Self {
        self.failure_notice = notice;
        self
    }

    pub fn set_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ArcConfig> {
        if self.block_size == 0 {
            return Err(Error::InvalidConfig("block size must be greater than zero"));
        }
        if self.flag_field.is_empty() {
            return Err(Error::InvalidConfig("flag field name must not be empty"));
        }
        if self.email_body_field.as_deref() == Some("") {
            return Err(Error::InvalidConfig("email body field name must not be empty"));
        }
        Ok(ArcConfig {
            index: Arc::new(ConfigIndex {
                block_size: self.block_size,
                fill: self.fill,
                padding: self.padding,
                flag_field: self.flag_field,
                email_body_field: self.email_body_field,
                failure_notice: self.failure_notice,
                timeout: self.timeout,
            }),
        })
    }
}
