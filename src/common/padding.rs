//! Block padding for field values.
//!
//! Every value is padded before encryption so that ciphertext length reveals
//! neither which optional field was filled in nor how long its content was.
//! Lengths are counted in characters, not bytes.
//!
//! 加密前对每个字段值进行块填充，使密文长度既不泄露填写了哪个可选字段，
//! 也不泄露其内容长度。长度按字符而非字节计算。

use rand::distr::Alphanumeric;
use rand::Rng;
use thiserror::Error;

/// Separator between the length prefix and the value in
/// [`PaddingScheme::LengthPrefixed`].
pub const LENGTH_PREFIX_SEPARATOR: char = ':';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaddingError {
    #[error("padded value has no length prefix")]
    MissingLengthPrefix,

    #[error("length prefix `{0}` is not a decimal number")]
    InvalidLengthPrefix(String),

    #[error("length prefix claims {claimed} characters but only {available} follow it")]
    LengthOutOfBounds { claimed: usize, available: usize },
}

/// How a value is brought up to a multiple of the block size.
///
/// 值如何被填充到块大小的整数倍。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PaddingScheme {
    /// Append the fill character. The receiver trims trailing fill characters,
    /// so a value that itself ends in the fill character loses that suffix.
    ///
    /// 追加填充字符。接收方去除末尾填充字符，因此本身以填充字符结尾的值会丢失该后缀。
    #[default]
    TrailingFill,

    /// Prefix the character count, then append random alphanumeric fill.
    /// Recovers every value exactly.
    ///
    /// 前置字符计数，然后追加随机字母数字填充。可精确恢复任意值。
    LengthPrefixed,
}

impl PaddingScheme {
    pub fn pad(&self, value: &str, block_size: usize, fill: char) -> String {
        match self {
            PaddingScheme::TrailingFill => pad(value, block_size, fill),
            PaddingScheme::LengthPrefixed => pad_length_prefixed(value, block_size),
        }
    }

    pub fn unpad<'a>(&self, padded: &'a str, fill: char) -> Result<&'a str, PaddingError> {
        match self {
            PaddingScheme::TrailingFill => Ok(unpad(padded, fill)),
            PaddingScheme::LengthPrefixed => unpad_length_prefixed(padded),
        }
    }
}

/// Number of fill characters needed after `len` characters.
///
/// Always in `1..=block_size`: a value that is already an exact multiple
/// still receives a full block.
pub fn padding_len(len: usize, block_size: usize) -> usize {
    block_size - (len % block_size)
}

/// Pads `value` with `fill` up to the smallest multiple of `block_size`
/// strictly greater than its length.
pub fn pad(value: &str, block_size: usize, fill: char) -> String {
    let len = value.chars().count();
    let extra = padding_len(len, block_size);
    let mut padded = String::with_capacity(value.len() + extra * fill.len_utf8());
    padded.push_str(value);
    padded.extend(std::iter::repeat_n(fill, extra));
    padded
}

/// Removes trailing `fill` characters.
pub fn unpad(padded: &str, fill: char) -> &str {
    padded.trim_end_matches(fill)
}

/// Pads `value` as `"<chars>:" + value + random alphanumeric fill`.
pub fn pad_length_prefixed(value: &str, block_size: usize) -> String {
    let len = value.chars().count();
    let prefix = format!("{len}{LENGTH_PREFIX_SEPARATOR}");
    let extra = padding_len(prefix.len() + len, block_size);

    let mut padded = String::with_capacity(prefix.len() + value.len() + extra);
    padded.push_str(&prefix);
    padded.push_str(value);
    padded.extend(
        rand::rng()
            .sample_iter(Alphanumeric)
            .take(extra)
            .map(char::from),
    );
    padded
}

/// Recovers the value from a [`pad_length_prefixed`] output.
pub fn unpad_length_prefixed(padded: &str) -> Result<&str, PaddingError> {
    let (prefix, rest) = padded
        .split_once(LENGTH_PREFIX_SEPARATOR)
        .ok_or(PaddingError::MissingLengthPrefix)?;
    let claimed: usize = prefix
        .parse()
        .map_err(|_| PaddingError::InvalidLengthPrefix(prefix.to_string()))?;

    let available = rest.chars().count();
    if claimed > available {
        return Err(PaddingError::LengthOutOfBounds { claimed, available });
    }
    let end = rest
        .char_indices()
        .nth(claimed)
        .map_or(rest.len(), |(idx, _)| idx);
    Ok(&rest[..end])
}
