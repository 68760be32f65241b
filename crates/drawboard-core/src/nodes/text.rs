//! Text node geometry.

use super::NodeGeometry;
use kurbo::Rect;

/// A block of text. Bounds are approximated until the renderer lays it out.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub content: String,
    pub font_size: f64,
}

impl Text {
    pub const DEFAULT_FONT_SIZE: f64 = 24.0;

    // Average glyph advance and line height as fractions of the font size.
    const CHAR_WIDTH_FACTOR: f64 = 0.6;
    const LINE_HEIGHT_FACTOR: f64 = 1.2;

    pub fn new(content: impl Into<String>, font_size: f64) -> Self {
        Self {
            content: content.into(),
            font_size,
        }
    }

    fn approximate_size(&self) -> (f64, f64) {
        let lines = self.content.lines().count().max(1);
        let longest = self
            .content
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0)
            .max(1);
        (
            longest as f64 * self.font_size * Self::CHAR_WIDTH_FACTOR,
            lines as f64 * self.font_size * Self::LINE_HEIGHT_FACTOR,
        )
    }
}

impl NodeGeometry for Text {
    fn local_bounds(&self) -> Rect {
        let (width, height) = self.approximate_size();
        Rect::new(0.0, 0.0, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiline_bounds() {
        let text = Text::new("ab\nabcd", 10.0);
        let bounds = text.local_bounds();
        assert!((bounds.width() - 24.0).abs() < 1e-9);
        assert!((bounds.height() - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_text_has_size() {
        let bounds = Text::new("", 10.0).local_bounds();
        assert!(bounds.width() > 0.0);
        assert!(bounds.height() > 0.0);
    }
}
