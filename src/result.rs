use thiserror::Error;

pub type Result<A, E = Error> = std::result::Result<A, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("premature end of input at offset {offset}")]
    PrematureEnd { offset: usize },
    #[error("stream magic mismatch: expected 0xACED, found {found:#06x}")]
    MagicMismatch { found: u16 },
    #[error("stream version mismatch: expected 5, found {found}")]
    VersionMismatch { found: u16 },
    #[error("unknown tag byte {tag:#04x} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },
    #[error("tag {tag} not allowed here (offset {offset})")]
    TagNotAllowed { tag: &'static str, offset: usize },
    #[error("invalid UTF-8 in string starting at offset {offset}: {source}")]
    InvalidUtf8 {
        offset: usize,
        #[source]
        source: std::string::FromUtf8Error,
    },
    #[error("unknown primitive type code '{code}' at offset {offset}")]
    UnknownTypeCode { code: char, offset: usize },
    #[error("unsupported construct: {0}")]
    Unsupported(&'static str),
    #[error("unsupported class-data flags {flags:#04x} for class {class_name}")]
    UnknownFlags { flags: u8, class_name: String },
    #[error("reference to unknown handle {handle:#010x}")]
    UnknownHandle { handle: u32 },
    #[error("reference to handle {handle:#010x} whose value is not yet available")]
    HandleNotReady { handle: u32 },
    #[error("serialVersionUID must be exactly 16 hex digits, got {0:?}")]
    InvalidUidFormat(String),
    #[error("expected a class descriptor in this context, got {found:?}")]
    ExpectedClassDescriptor { found: &'static str },
}
