//! Message - the opaque unit of data moved by the pipeline
//!
//! A message is a reference-counted byte payload with no required schema.
//! Components that transform a message build a new one rather than
//! mutating in place; cloning is cheap (an `Arc` bump via `Bytes`), so a
//! shared sink receiving the same payload from several chains never
//! copies it.

use std::fmt;

use bytes::Bytes;

/// Opaque unit of data flowing through a chain
///
/// Immutable by convention: the current holder owns the value, and a
/// filter that produces a different payload returns a new `Message`.
///
/// # Example
///
/// ```
/// use ferry_protocol::Message;
///
/// let msg = Message::from_text("hello");
/// assert_eq!(msg.text(), Some("hello"));
/// assert_eq!(msg.len(), 5);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Message {
    payload: Bytes,
}

impl Message {
    /// Create a message from any byte payload
    #[inline]
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Create a message from a UTF-8 string
    #[inline]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            payload: Bytes::from(text.into()),
        }
    }

    /// Create an empty message
    #[inline]
    pub const fn empty() -> Self {
        Self {
            payload: Bytes::new(),
        }
    }

    /// Get the raw payload bytes
    #[inline]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Interpret the payload as UTF-8 text
    ///
    /// Returns `None` if the payload is not valid UTF-8. Components that
    /// only operate on text (grep, split) treat a `None` as a non-match
    /// rather than an error.
    #[inline]
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }

    /// Payload length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Consume the message, returning the payload
    #[inline]
    pub fn into_payload(self) -> Bytes {
        self.payload
    }
}

impl From<Bytes> for Message {
    #[inline]
    fn from(payload: Bytes) -> Self {
        Self { payload }
    }
}

impl From<Vec<u8>> for Message {
    #[inline]
    fn from(payload: Vec<u8>) -> Self {
        Self {
            payload: Bytes::from(payload),
        }
    }
}

impl From<&str> for Message {
    #[inline]
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Payloads can be large; show at most a short prefix.
        const PREVIEW: usize = 32;

        let mut d = f.debug_struct("Message");
        d.field("len", &self.payload.len());
        match self.text() {
            Some(text) if text.len() <= PREVIEW => d.field("text", &text),
            Some(text) => {
                let mut cut = PREVIEW;
                while !text.is_char_boundary(cut) {
                    cut -= 1;
                }
                d.field("text", &format!("{}…", &text[..cut]))
            }
            None => d.field("bytes", &format!("{:02x?}…", &self.payload[..PREVIEW.min(self.payload.len())])),
        };
        d.finish()
    }
}
