//! Failures while parsing headers and message bodies.

/// Result of header and body parsing.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Parse failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A field name with characters outside printable ASCII.
    #[error("bad header line {0:?}")]
    InvalidHeader(String),

    /// Continuation-less line without `name:`.
    #[error("no colon in header line {0:?}")]
    MissingColon(String),

    /// `Content-Type` without a `type/subtype` pair.
    #[error("bad content type {0:?}")]
    InvalidContentType(String),

    /// Unknown transfer encoding, or an encoded word that does not decode.
    #[error("cannot decode: {0}")]
    InvalidEncoding(String),

    /// Base64 body or encoded word.
    #[error(transparent)]
    Base64Decode(#[from] base64::DecodeError),

    /// `multipart/*` without a `boundary` parameter.
    #[error("multipart without boundary")]
    MissingBoundary,

    /// Missing closing delimiter and similar.
    #[error("broken multipart body: {0}")]
    InvalidMultipart(String),

    /// Not an RFC 2822 date.
    #[error("not a date: {0:?}")]
    InvalidTimestamp(String),

    /// Address list that cannot be split.
    #[error("not an address list: {0:?}")]
    InvalidAddress(String),

    /// Field body that should be a non-negative integer.
    #[error("not a count: {0:?}")]
    InvalidCount(String),

    /// Message id without `<...>`.
    #[error("message id needs angle brackets: {0:?}")]
    InvalidId(String),
}
