use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

/// Payload of a string object.
///
/// Character positions are O(1): ASCII text indexes bytes directly, other text
/// builds its character offsets on the first positional access.
pub struct Text {
    text: Arc<str>,
    ascii: bool,
    offsets: OnceCell<Box<[usize]>>,
}

impl Text {
    pub fn new(text: &str) -> Self {
        Self {
            ascii: text.is_ascii(),
            text: Arc::from(text),
            offsets: OnceCell::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    fn offsets(&self) -> &[usize] {
        self.offsets
            .get_or_init(|| self.text.char_indices().map(|(at, _)| at).collect())
    }

    /// Byte offset where character `idx` starts; `idx == char_len()` maps to the end.
    fn byte_at(&self, idx: usize) -> Option<usize> {
        if self.ascii {
            return (idx <= self.text.len()).then_some(idx);
        }
        let offsets = self.offsets();
        match offsets.get(idx) {
            Some(&at) => Some(at),
            None if idx == offsets.len() => Some(self.text.len()),
            None => None,
        }
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        if self.ascii { self.text.len() } else { self.offsets().len() }
    }

    /// The character at position `idx`, as a string slice.
    pub fn char_at(&self, idx: usize) -> Option<&str> {
        if idx >= self.char_len() {
            return None;
        }
        self.char_slice(idx, idx + 1)
    }

    /// Characters `low..high`; `None` when out of range or reversed.
    pub fn char_slice(&self, low: usize, high: usize) -> Option<&str> {
        if low > high {
            return None;
        }
        let start = self.byte_at(low)?;
        let end = self.byte_at(high)?;
        self.text.get(start..end)
    }
}

impl PartialEq for Text {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.text, f)
    }
}
