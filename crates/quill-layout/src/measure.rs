//! Leaf measurement.
//!
//! Token extents come from the embedding application (usually a font
//! shaper); the engine only needs width, height and the baseline.

use quill_core::Extent;

/// Measures the intrinsic extent of a token's text.
pub trait Measure {
    fn measure(&self, text: &str) -> Extent;
}

impl<F> Measure for F
where
    F: Fn(&str) -> Extent,
{
    fn measure(&self, text: &str) -> Extent {
        self(text)
    }
}

/// Fixed-pitch measurement: every character has the same advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonospaceMeasure {
    /// Advance of one character
    pub char_width: i32,
    /// Height of a line
    pub line_height: i32,
    /// Baseline offset from the top of the line
    pub ascent: i32,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self {
            char_width: 8,
            line_height: 16,
            ascent: 12,
        }
    }
}

impl Measure for MonospaceMeasure {
    fn measure(&self, text: &str) -> Extent {
        let chars = text.chars().count() as i32;
        // Empty tokens still get a caret-wide box.
        Extent::new(
            (chars * self.char_width).max(1),
            self.line_height,
            self.ascent,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monospace_measure() {
        let measure = MonospaceMeasure::default();
        assert_eq!(measure.measure("print"), Extent::new(40, 16, 12));
        assert_eq!(measure.measure("").width, 1);
        assert_eq!(measure.measure("héllo").width, 40);
    }

    #[test]
    fn test_closure_measure() {
        let measure = |text: &str| Extent::new(text.len() as i32, 1, 1);
        assert_eq!(measure.measure("abc").width, 3);
    }
}
