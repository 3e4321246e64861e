use std::fmt;

use crate::error::{message_of, position_of};

/// 1-based line and column of a byte offset into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl Position {
    pub fn new(line: u32, column: u32, offset: usize) -> Self {
        Self { line, column, offset }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Columns count characters, not bytes. Offsets past the end land after the last character.
pub fn offset_to_position(text: &str, offset: usize) -> Position {
    let before = text.char_indices().take_while(|(i, _)| *i < offset).map(|(_, ch)| ch);
    let (line, column) = before.fold((1, 1), |(line, column), ch| match ch {
        '\n' => (line + 1, 1),
        _ => (line, column + 1),
    });
    Position::new(line, column, offset)
}

/// Render an engine error for a host: the message chain, plus `line:col` when
/// the error carries a known position and the source text is available.
pub fn describe(err: &anyhow::Error, source: Option<&str>) -> String {
    let message = message_of(err);
    match (position_of(err), source) {
        (Some(pos), Some(text)) if pos > 0 => {
            format!("Error: {} at {}", message, offset_to_position(text, pos))
        }
        (Some(pos), None) if pos > 0 => format!("Error: {} at offset {}", message, pos),
        _ => format!("Error: {}", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{At, RuntimeError};

    #[test]
    fn test_offset_to_position_counts_lines_and_chars() {
        let text = "a = 1\nb = \"é\"\nc";
        assert_eq!(offset_to_position(text, 0), Position::new(1, 1, 0));
        assert_eq!(offset_to_position(text, 6), Position::new(2, 1, 6));
        // `é` is two bytes but one column
        let c = text.find('c').unwrap();
        assert_eq!(offset_to_position(text, c), Position::new(3, 1, c));
        assert_eq!(offset_to_position(text, 11).column, 6);
        assert_eq!(offset_to_position(text, 99).to_string(), "3:2");
    }

    #[test]
    fn test_describe_with_source() {
        let err = anyhow::Error::new(RuntimeError::UnresolvedName("y".into())).context(At(8));
        let text = "x = 1\nx = y";
        let rendered = describe(&err, Some(text));
        assert!(rendered.starts_with("Error: "), "{rendered}");
        assert!(rendered.contains("'y' not found"), "{rendered}");
        assert!(rendered.ends_with("at 2:3"), "{rendered}");
    }
}
