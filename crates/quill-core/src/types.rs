//! Core value types shared by the layout crates.

use std::fmt;

/// Unique identifier for an element of the edited tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named attachment point of an element kind.
///
/// The slot set of every fixed-arity kind is known statically; only ordered
/// sequences use the dynamically sized `Item` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SlotId {
    /// The callee of a call expression
    Callee,
    /// Left operand of a binary expression
    Left,
    /// Operator token of a binary expression
    Operator,
    /// Right operand of a binary expression
    Right,
    /// Position within an ordered sequence
    Item(u32),
}

impl SlotId {
    /// Slot for the sequence item at `index`.
    pub fn item(index: usize) -> Self {
        SlotId::Item(index as u32)
    }

    /// Sequence index, if this is an item slot.
    pub fn item_index(&self) -> Option<usize> {
        match self {
            SlotId::Item(i) => Some(*i as usize),
            _ => None,
        }
    }
}

/// Size of a box together with its anchor line.
///
/// `anchor` is the distance from the top edge to the line the box is
/// attached to its parent by (a text baseline for tokens).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Extent {
    pub width: i32,
    pub height: i32,
    pub anchor: i32,
}

impl Extent {
    /// Create an extent, clamping the anchor into `0..=height`.
    pub fn new(width: i32, height: i32, anchor: i32) -> Self {
        let height = height.max(0);
        Self {
            width: width.max(0),
            height,
            anchor: anchor.clamp(0, height),
        }
    }

    /// Distance from the anchor line to the top edge.
    pub fn above(&self) -> i32 {
        self.anchor
    }

    /// Distance from the anchor line to the bottom edge.
    pub fn below(&self) -> i32 {
        self.height - self.anchor
    }

    /// Area of the box.
    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_clamps_anchor() {
        let e = Extent::new(10, 20, 30);
        assert_eq!(e.anchor, 20);
        assert_eq!(e.below(), 0);

        let e = Extent::new(10, 20, -4);
        assert_eq!(e.anchor, 0);
        assert_eq!(e.above(), 0);
        assert_eq!(e.area(), 200);
    }

    #[test]
    fn test_slot_item_index() {
        assert_eq!(SlotId::item(3).item_index(), Some(3));
        assert_eq!(SlotId::Callee.item_index(), None);
        assert!(SlotId::Callee < SlotId::Item(0));
    }
}
