//! Shared constants.

/// MIME type of a `.docx` document.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Template file name looked up in the working directory by default.
pub const DEFAULT_TEMPLATE_FILE: &str = "template_gedicht_sinterklaas.docx";

/// Download file name prefix; the session id and `.docx` follow.
pub const DOWNLOAD_PREFIX: &str = "sinterklaas_gedicht_";

/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 5000;

/// Filter that turns a placeholder into whole paragraphs.
pub const PARAGRAPH_FILTER: &str = "nl2para";

/// Main document part inside the archive.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Context key holding the recipient's first name.
pub const KEY_FIRST_NAME: &str = "voornaam";

/// Context key holding the rhyme.
pub const KEY_RHYME: &str = "rijm";

/// Health check message.
pub const HEALTH_MESSAGE: &str = "Sinterklaas Word Generator is running";

/// Sessions whose status is remembered; the oldest are forgotten first.
pub const MAX_TRACKED_SESSIONS: usize = 1000;
