//! Stream fragments.

use std::fmt;

use bytes::Bytes;

/// An opaque piece of generated text.
///
/// Fragments carry no boundary semantics: one may end in the middle of a
/// word, a markup token, or even a UTF-8 sequence. Only their order matters.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct StreamFragment {
    data: Bytes,
}

impl StreamFragment {
    /// Creates a fragment from raw bytes.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// Returns the fragment bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the fragment length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the fragment carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consumes the fragment and returns its bytes.
    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

impl From<&'static str> for StreamFragment {
    fn from(text: &'static str) -> Self {
        Self::new(Bytes::from_static(text.as_bytes()))
    }
}

impl From<String> for StreamFragment {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<Vec<u8>> for StreamFragment {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<Bytes> for StreamFragment {
    fn from(data: Bytes) -> Self {
        Self::new(data)
    }
}

impl fmt::Debug for StreamFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StreamFragment")
            .field(&String::from_utf8_lossy(&self.data))
            .finish()
    }
}
