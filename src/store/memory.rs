//! An in-memory form document.
//!
//! Controls are kept in document order and serialized the way a browser
//! builds a form-encoded body: disabled and unnamed controls are skipped,
//! only checked options of a group are sent, and an encrypted display
//! contributes exactly its hidden input.
//!
//! 内存中的表单文档。控件按文档顺序保存，并按照浏览器构建表单编码请求体的方式序列化。

use super::FieldStore;
use crate::error::{DomShapeError, Error, Result};
use crate::field::{DisplayField, EncryptableField, FieldHandle, FieldKind, FieldValue};
use crate::report::SubmissionReport;
use url::form_urlencoded;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Checkbox,
    Radio,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupOption {
    pub name: Option<String>,
    pub value: String,
    pub checked: bool,
}

impl GroupOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>, checked: bool) -> Self {
        Self {
            name: Some(name.into()),
            value: value.into(),
            checked,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Widget {
    Text(String),
    TextArea(String),
    Select(String),
    Hidden(String),
    Group {
        kind: GroupKind,
        options: Vec<GroupOption>,
    },
    /// Hidden input plus disabled echo left behind by a successful encryption.
    Display {
        ciphertext: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub name: Option<String>,
    pub label: Option<String>,
    pub widget: Widget,
    pub encrypted: bool,
    pub disabled: bool,
    pub failed: bool,
}

impl Control {
    fn named(name: impl Into<String>, widget: Widget) -> Self {
        Self {
            name: Some(name.into()),
            label: None,
            widget,
            encrypted: false,
            disabled: false,
            failed: false,
        }
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::named(name, Widget::Text(value.into()))
    }

    pub fn textarea(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::named(name, Widget::TextArea(value.into()))
    }

    pub fn select(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::named(name, Widget::Select(value.into()))
    }

    pub fn hidden(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::named(name, Widget::Hidden(value.into()))
    }

    /// A group of inputs sharing `name`, given as `(value, checked)` pairs.
    pub fn checkboxes(name: &str, options: &[(&str, bool)]) -> Self {
        Self::group(GroupKind::Checkbox, Self::options(name, options))
    }

    pub fn radios(name: &str, options: &[(&str, bool)]) -> Self {
        Self::group(GroupKind::Radio, Self::options(name, options))
    }

    /// A group built from arbitrary options, including malformed ones.
    pub fn group(kind: GroupKind, options: Vec<GroupOption>) -> Self {
        Self {
            name: None,
            label: None,
            widget: Widget::Group { kind, options },
            encrypted: false,
            disabled: false,
            failed: false,
        }
    }

    fn options(name: &str, options: &[(&str, bool)]) -> Vec<GroupOption> {
        options
            .iter()
            .map(|(value, checked)| GroupOption::new(name, *value, *checked))
            .collect()
    }

    /// Marks the control for end-to-end encryption.
    pub fn encrypted(mut self) -> Self {
        self.encrypted = true;
        self
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    fn kind(&self) -> FieldKind {
        match &self.widget {
            Widget::Text(_) => FieldKind::Text,
            Widget::TextArea(_) => FieldKind::TextArea,
            Widget::Select(_) => FieldKind::Select,
            Widget::Group {
                kind: GroupKind::Checkbox,
                ..
            } => FieldKind::CheckboxGroup,
            Widget::Group {
                kind: GroupKind::Radio,
                ..
            } => FieldKind::RadioGroup,
            Widget::Hidden(_) | Widget::Display { .. } => FieldKind::Hidden,
        }
    }

    /// Submission key: the control's own name, or for a group the name of
    /// its first input.
    fn submission_name(&self) -> Option<&str> {
        let name = match &self.widget {
            Widget::Group { options, .. } => options.first().and_then(|o| o.name.as_deref()),
            _ => self.name.as_deref(),
        };
        name.filter(|name| !name.is_empty())
    }

    /// Human-readable description used in shape errors.
    fn describe(&self, handle: usize) -> String {
        self.label
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| format!("#{handle}"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryForm {
    controls: Vec<Control>,
    submissions: Vec<Vec<(String, String)>>,
    notices: Vec<String>,
}

impl MemoryForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, control: Control) -> Self {
        self.push(control);
        self
    }

    pub fn push(&mut self, control: Control) -> FieldHandle {
        self.controls.push(control);
        FieldHandle(self.controls.len() - 1)
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn control(&self, handle: FieldHandle) -> Option<&Control> {
        self.controls.get(handle.0)
    }

    /// First control whose submission key is `name`.
    pub fn control_named(&self, name: &str) -> Option<&Control> {
        self.controls
            .iter()
            .find(|c| c.submission_name() == Some(name))
    }

    pub fn hidden_value(&self, name: &str) -> Option<&str> {
        self.controls.iter().find_map(|c| match &c.widget {
            Widget::Hidden(value) if c.name.as_deref() == Some(name) => Some(value.as_str()),
            _ => None,
        })
    }

    /// The name/value pairs a submission would carry right now.
    pub fn payload(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for control in self.controls.iter().filter(|c| !c.disabled) {
            match &control.widget {
                Widget::Group { options, .. } => {
                    for option in options.iter().filter(|o| o.checked) {
                        if let Some(name) = option.name.as_deref().filter(|n| !n.is_empty()) {
                            pairs.push((name.to_string(), option.value.clone()));
                        }
                    }
                }
                Widget::Text(value)
                | Widget::TextArea(value)
                | Widget::Select(value)
                | Widget::Hidden(value)
                | Widget::Display { ciphertext: value } => {
                    if let Some(name) = control.name.as_deref().filter(|n| !n.is_empty()) {
                        pairs.push((name.to_string(), value.clone()));
                    }
                }
            }
        }
        pairs
    }

    /// `application/x-www-form-urlencoded` body of [`MemoryForm::payload`].
    pub fn to_urlencoded(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.payload())
            .finish()
    }

    /// Payloads of every programmatic submission, oldest first.
    pub fn submissions(&self) -> &[Vec<(String, String)>] {
        &self.submissions
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    fn control_mut(&mut self, handle: FieldHandle) -> std::result::Result<&mut Control, DomShapeError> {
        self.controls
            .get_mut(handle.0)
            .ok_or(DomShapeError::UnknownField(handle.0))
    }
}

impl FieldStore for MemoryForm {
    fn encryptable_fields(&self) -> Vec<EncryptableField> {
        self.controls
            .iter()
            .enumerate()
            .filter(|(_, c)| c.encrypted)
            .map(|(i, c)| {
                let mut field = EncryptableField::new(
                    FieldHandle(i),
                    c.submission_name().map(str::to_string),
                    c.kind(),
                );
                field.label = c.label.clone();
                field
            })
            .collect()
    }

    fn read_value(&self, field: &EncryptableField) -> std::result::Result<FieldValue, DomShapeError> {
        let handle = field.handle.0;
        let control = self
            .controls
            .get(handle)
            .ok_or(DomShapeError::UnknownField(handle))?;
        match &control.widget {
            Widget::Text(value) | Widget::TextArea(value) | Widget::Select(value) => {
                Ok(FieldValue::Single(value.clone()))
            }
            Widget::Group { options, .. } => {
                if options.is_empty() {
                    return Err(DomShapeError::EmptyGroup(control.describe(handle)));
                }
                let checked = options
                    .iter()
                    .filter(|o| o.checked)
                    .map(|o| o.value.clone())
                    .collect();
                Ok(FieldValue::Group { checked })
            }
            Widget::Hidden(_) | Widget::Display { .. } => Err(DomShapeError::NotEncryptable(handle)),
        }
    }

    fn replace(
        &mut self,
        field: &EncryptableField,
        display: DisplayField,
    ) -> std::result::Result<(), DomShapeError> {
        let handle = field.handle.0;
        let control = self.control_mut(field.handle)?;
        if control.kind() == FieldKind::Hidden {
            return Err(DomShapeError::NotEncryptable(handle));
        }
        if display.name.is_empty() {
            return Err(DomShapeError::MissingName);
        }
        control.name = Some(display.name);
        control.widget = Widget::Display {
            ciphertext: display.ciphertext,
        };
        control.encrypted = false;
        control.failed = false;
        Ok(())
    }

    fn mark_failed(&mut self, field: &EncryptableField) {
        if let Ok(control) = self.control_mut(field.handle) {
            control.failed = true;
        }
    }

    fn set_hidden(&mut self, name: &str, value: &str) {
        let existing = self.controls.iter_mut().find(|c| {
            matches!(c.widget, Widget::Hidden(_)) && c.name.as_deref() == Some(name)
        });
        match existing {
            Some(control) => control.widget = Widget::Hidden(value.to_string()),
            None => {
                self.controls.push(Control::hidden(name, value));
            }
        }
    }

    fn notify_failures(&mut self, report: &SubmissionReport) {
        let names: Vec<&str> = report
            .failures()
            .map(|r| r.field.display_label())
            .collect();
        self.notices.push(format!(
            "{} field(s) could not be encrypted in the browser: {}",
            names.len(),
            names.join(", ")
        ));
    }

    /// Refuses to send a marked control that was neither encrypted nor
    /// flagged as failed.
    fn submit(&mut self) -> Result<()> {
        if let Some((handle, control)) = self
            .controls
            .iter()
            .enumerate()
            .find(|(_, c)| c.encrypted && !c.failed)
        {
            return Err(Error::Submission(format!(
                "marked field `{}` was neither encrypted nor flagged as failed",
                control.describe(handle)
            )));
        }
        let payload = self.payload();
        self.submissions.push(payload);
        Ok(())
    }
}
