//! Consolidated notification body built from all encryptable fields.
//!
//! The receiving side sends this body as-is when it is an armored message and
//! otherwise falls back to building one itself, so it is reported separately
//! from the per-field results.
//!
//! 由所有可加密字段组成的合并邮件正文。

const SECTION_RULE: &str = "====================";

/// Formats `(label, value)` pairs as one body, in the given order.
pub fn format_full_body<L, V>(entries: &[(L, V)]) -> String
where
    L: AsRef<str>,
    V: AsRef<str>,
{
    let mut body = String::new();
    for (label, value) in entries {
        body.push_str("# ");
        body.push_str(label.as_ref());
        body.push_str("\n\n");
        body.push_str(value.as_ref());
        body.push_str("\n\n");
        body.push_str(SECTION_RULE);
        body.push_str("\n\n");
    }
    body.trim().to_string()
}
