//! The logical view of a form field marked for end-to-end encryption.
//!
//! 标记为端到端加密的表单字段的逻辑视图。

use crate::error::DomShapeError;

/// Separator placed between the checked values of an option group.
pub const GROUP_VALUE_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldKind {
    Text,
    TextArea,
    Select,
    CheckboxGroup,
    RadioGroup,
    /// A marked control with no user-entered value, such as a hidden input.
    /// Stores report it so that it fails instead of going out unflagged.
    Hidden,
}

impl FieldKind {
    /// Whether the field is rendered as a list of inputs sharing one name.
    pub fn is_group(&self) -> bool {
        matches!(self, FieldKind::CheckboxGroup | FieldKind::RadioGroup)
    }
}

/// Opaque position of a field inside the store that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldHandle(pub usize);

/// A field discovered at submit time.
///
/// Its current value is not stored here; it is read from the live store
/// when the submission is prepared.
///
/// 提交时发现的字段。当前值不保存在这里，而是在准备提交时从存储中读取。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptableField {
    pub handle: FieldHandle,
    pub name: Option<String>,
    pub kind: FieldKind,
    pub label: Option<String>,
}

impl EncryptableField {
    pub fn new(handle: FieldHandle, name: Option<String>, kind: FieldKind) -> Self {
        Self {
            handle,
            name,
            kind,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The form submission key. For groups this is the name shared by the
    /// group's inputs.
    pub fn submission_name(&self) -> Result<&str, DomShapeError> {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(DomShapeError::MissingName),
        }
    }

    /// Human-readable label, falling back to the submission name.
    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or_default()
    }
}

/// The current value(s) of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Single(String),
    /// Checked option values in rendered order.
    Group { checked: Vec<String> },
}

impl FieldValue {
    /// The string that gets padded and encrypted.
    pub fn logical(&self) -> String {
        match self {
            FieldValue::Single(value) => value.clone(),
            FieldValue::Group { checked } => checked.join(GROUP_VALUE_SEPARATOR),
        }
    }
}

/// The post-encryption replacement for a field: a hidden input carrying the
/// ciphertext under the original submission name, plus a disabled echo of
/// the same ciphertext.
///
/// 加密后替换字段的内容：以原始提交名称携带密文的隐藏输入，以及同一密文的禁用回显。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayField {
    pub name: String,
    pub ciphertext: String,
}

/// Per-field lifecycle within one submission.
///
/// 单次提交中每个字段的生命周期。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldState {
    #[default]
    Pending,
    Encrypting,
    Encrypted,
    Failed,
}

impl FieldState {
    /// Moves to `next` if the transition is legal. Terminal states never move.
    pub fn advance(self, next: FieldState) -> Option<FieldState> {
        use FieldState::*;
        match (self, next) {
            (Pending, Encrypting) | (Pending, Failed) => Some(next),
            (Encrypting, Encrypted) | (Encrypting, Failed) => Some(next),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FieldState::Encrypted | FieldState::Failed)
    }
}
