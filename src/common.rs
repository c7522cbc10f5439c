pub mod config;
pub mod mode;
pub mod padding;

/// Block size, in characters, that every encrypted field value is padded to.
pub const DEFAULT_BLOCK_SIZE: usize = 512;

/// Character appended when padding with [`padding::PaddingScheme::TrailingFill`].
pub const DEFAULT_FILL: char = ' ';

/// Hidden field the server reads to learn whether the payload is already encrypted.
pub const ENCRYPTED_FLAG_FIELD: &str = "client_side_encrypted";

/// Hidden field conventionally used for the consolidated, encrypted email body.
pub const EMAIL_BODY_FIELD: &str = "encrypted_email_body";
