//! Fragment accumulator.

use std::borrow::Cow;

use bytes::BytesMut;

use crate::StreamFailure;
use crate::stream::StreamFragment;

/// Ordered concatenation of every fragment received in the current run.
#[derive(Debug, Clone, Default)]
pub struct RenderBuffer {
    data: BytesMut,
    fragments: usize,
}

impl RenderBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fragment.
    pub fn append(&mut self, fragment: &StreamFragment) {
        self.data.extend_from_slice(fragment.as_bytes());
        self.fragments += 1;
    }

    /// Returns the accumulated bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Decodes the accumulated bytes as UTF-8.
    ///
    /// # Errors
    ///
    /// Fails while the buffer ends mid-sequence or holds invalid bytes.
    pub fn as_str(&self) -> Result<&str, StreamFailure> {
        std::str::from_utf8(&self.data).map_err(StreamFailure::from_utf8_error)
    }

    /// Decodes the accumulated bytes, skipping invalid sequences.
    ///
    /// Invalid bytes inside the buffer carry no text and are left out, so
    /// the fragments that follow them still render. Their offsets are
    /// returned alongside the text.
    ///
    /// # Errors
    ///
    /// Fails with [`StreamFailure::IncompleteUtf8`] while the buffer ends
    /// mid-sequence, since the next fragment may complete it.
    pub fn decode(&self) -> Result<DecodedText<'_>, StreamFailure> {
        let mut invalid_offsets = Vec::new();
        let mut text = String::new();
        let mut offset = 0;

        while offset < self.data.len() {
            let rest = &self.data[offset..];
            match std::str::from_utf8(rest) {
                Ok(valid) if invalid_offsets.is_empty() => {
                    return Ok(DecodedText {
                        text: Cow::Borrowed(valid),
                        invalid_offsets,
                    });
                }
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(error) => {
                    let valid_up_to = error.valid_up_to();
                    let Some(invalid_len) = error.error_len() else {
                        return Err(StreamFailure::IncompleteUtf8 {
                            valid_up_to: offset + valid_up_to,
                        });
                    };

                    text.push_str(&String::from_utf8_lossy(&rest[..valid_up_to]));
                    invalid_offsets.push(offset + valid_up_to);
                    offset += valid_up_to + invalid_len;
                }
            }
        }

        Ok(DecodedText {
            text: Cow::Owned(text),
            invalid_offsets,
        })
    }

    /// Returns the buffer length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of fragments appended.
    pub fn fragment_count(&self) -> usize {
        self.fragments
    }

    /// Empties the buffer for a new run.
    pub fn clear(&mut self) {
        self.data.clear();
        self.fragments = 0;
    }
}

/// Text decoded from a [`RenderBuffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText<'a> {
    text: Cow<'a, str>,
    invalid_offsets: Vec<usize>,
}

impl DecodedText<'_> {
    /// Returns the decoded text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the byte offsets of the skipped invalid sequences.
    pub fn invalid_offsets(&self) -> &[usize] {
        &self.invalid_offsets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenation_ignores_fragment_boundaries() {
        let text = "| Energy (kcal) | 520 |\n| Protein (g) | 7 |";
        let mut whole = RenderBuffer::new();
        whole.append(&StreamFragment::from(text));

        for split in 0..=text.len() {
            let mut parts = RenderBuffer::new();
            parts.append(&StreamFragment::from(text.as_bytes()[..split].to_vec()));
            parts.append(&StreamFragment::from(text.as_bytes()[split..].to_vec()));

            assert_eq!(parts.as_bytes(), whole.as_bytes());
            assert_eq!(parts.fragment_count(), 2);
        }
    }

    #[test]
    fn split_code_point_is_incomplete_until_completed() {
        let euro = "€".as_bytes();
        let mut buffer = RenderBuffer::new();

        buffer.append(&StreamFragment::from(euro[..1].to_vec()));
        assert_eq!(
            buffer.as_str(),
            Err(StreamFailure::IncompleteUtf8 { valid_up_to: 0 })
        );

        buffer.append(&StreamFragment::from(euro[1..].to_vec()));
        assert_eq!(buffer.as_str(), Ok("€"));
    }

    #[test]
    fn clear_resets_counters() {
        let mut buffer = RenderBuffer::new();
        buffer.append(&StreamFragment::from("abc"));
        buffer.clear();

        assert!(buffer.is_empty());
        assert_eq!(buffer.fragment_count(), 0);
    }

    #[test]
    fn decode_skips_invalid_bytes() {
        let mut buffer = RenderBuffer::new();
        buffer.append(&StreamFragment::from(b"ab\xFFcd\xC0".to_vec()));
        buffer.append(&StreamFragment::from("ef"));

        let decoded = buffer.decode().unwrap();
        assert_eq!(decoded.as_str(), "abcdef");
        assert_eq!(decoded.invalid_offsets(), &[2, 5]);
        assert!(buffer.as_str().is_err());
    }

    #[test]
    fn decode_waits_for_truncated_tail() {
        let euro = "€".as_bytes();
        let mut buffer = RenderBuffer::new();
        buffer.append(&StreamFragment::from(vec![0xFF, b'a', euro[0], euro[1]]));

        assert_eq!(
            buffer.decode(),
            Err(StreamFailure::IncompleteUtf8 { valid_up_to: 2 })
        );

        buffer.append(&StreamFragment::from(euro[2..].to_vec()));
        assert_eq!(buffer.decode().unwrap().as_str(), "a€");
    }

    #[test]
    fn decode_borrows_valid_text() {
        let mut buffer = RenderBuffer::new();
        buffer.append(&StreamFragment::from("plain"));

        let decoded = buffer.decode().unwrap();
        assert!(matches!(decoded.text, Cow::Borrowed("plain")));
        assert!(decoded.invalid_offsets().is_empty());
    }
}
