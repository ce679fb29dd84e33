//! Element tree data structures.
//!
//! The element tree is the permanent document being edited. Layout passes
//! only read it; the single write is the commit of the chosen layout, which
//! stores a [`Placed`] box on every element that appears in it.

use std::collections::HashMap;

use glam::IVec2;
use quill_core::{ElementId, Extent, SlotId};

use crate::node::{ApplyLayout, LayoutNode};

/// Committed geometry of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placed {
    /// Top-left corner in document coordinates
    pub origin: IVec2,
    /// Width and height
    pub size: IVec2,
    /// Distance from the top edge to the anchor line
    pub anchor: i32,
}

impl Placed {
    /// Position of the element's left edge on its anchor line.
    pub fn anchor_point(&self) -> IVec2 {
        self.origin + IVec2::new(0, self.anchor)
    }

    /// Get the right edge (x + width).
    pub fn right(&self) -> i32 {
        self.origin.x + self.size.x
    }

    /// Get the bottom edge (y + height).
    pub fn bottom(&self) -> i32 {
        self.origin.y + self.size.y
    }

    /// Check if a point is inside the box.
    pub fn contains(&self, point: IVec2) -> bool {
        point.x >= self.origin.x
            && point.x < self.right()
            && point.y >= self.origin.y
            && point.y < self.bottom()
    }

    fn from_anchor(x: i32, y: i32, extent: Extent) -> Self {
        Self {
            origin: IVec2::new(x, y - extent.anchor),
            size: IVec2::new(extent.width, extent.height),
            anchor: extent.anchor,
        }
    }
}

/// A committed empty slot, usable as an insertion target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptySlot {
    pub owner: Option<ElementId>,
    pub slot: SlotId,
    pub placed: Placed,
}

/// Kinds of elements and their children.
///
/// `None` children are holes left by editing; they lay out as empty slots.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// A measured piece of text
    Token { text: String },
    /// `callee(args...)`
    Call {
        callee: Option<ElementId>,
        args: Vec<Option<ElementId>>,
    },
    /// `left operator right`
    Binary {
        left: Option<ElementId>,
        operator: Option<ElementId>,
        right: Option<ElementId>,
    },
    /// A bare wrapped sequence
    List { items: Vec<Option<ElementId>> },
}

impl ElementKind {
    /// Every slot of this element with its occupant.
    pub fn slots(&self) -> Vec<(SlotId, Option<ElementId>)> {
        match self {
            ElementKind::Token { .. } => Vec::new(),
            ElementKind::Call { callee, args } => std::iter::once((SlotId::Callee, *callee))
                .chain(args.iter().enumerate().map(|(i, a)| (SlotId::item(i), *a)))
                .collect(),
            ElementKind::Binary {
                left,
                operator,
                right,
            } => vec![
                (SlotId::Left, *left),
                (SlotId::Operator, *operator),
                (SlotId::Right, *right),
            ],
            ElementKind::List { items } => items
                .iter()
                .enumerate()
                .map(|(i, item)| (SlotId::item(i), *item))
                .collect(),
        }
    }
}

/// An element of the tree.
#[derive(Debug, Clone)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    /// Geometry from the last committed layout
    pub placed: Option<Placed>,
}

/// The element tree.
#[derive(Debug, Clone, Default)]
pub struct ElementTree {
    elements: HashMap<ElementId, Element>,
    empty_slots: Vec<EmptySlot>,
    next_id: u64,
}

impl ElementTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element and return its ID.
    pub fn add(&mut self, kind: ElementKind) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.elements.insert(
            id,
            Element {
                id,
                kind,
                placed: None,
            },
        );
        id
    }

    /// Add a token.
    pub fn token(&mut self, text: impl Into<String>) -> ElementId {
        self.add(ElementKind::Token { text: text.into() })
    }

    /// Add a call with the given callee and arguments.
    pub fn call(
        &mut self,
        callee: Option<ElementId>,
        args: impl IntoIterator<Item = Option<ElementId>>,
    ) -> ElementId {
        self.add(ElementKind::Call {
            callee,
            args: args.into_iter().collect(),
        })
    }

    /// Add a binary expression.
    pub fn binary(
        &mut self,
        left: Option<ElementId>,
        operator: Option<ElementId>,
        right: Option<ElementId>,
    ) -> ElementId {
        self.add(ElementKind::Binary {
            left,
            operator,
            right,
        })
    }

    /// Add a bare list.
    pub fn list(&mut self, items: impl IntoIterator<Item = Option<ElementId>>) -> ElementId {
        self.add(ElementKind::List {
            items: items.into_iter().collect(),
        })
    }

    /// Get an element by ID.
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    /// Get a mutable element by ID.
    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(&id)
    }

    /// Committed geometry of an element.
    pub fn placed(&self, id: ElementId) -> Option<Placed> {
        self.elements.get(&id).and_then(|e| e.placed)
    }

    /// Empty slots of the last committed layout.
    pub fn empty_slots(&self) -> &[EmptySlot] {
        &self.empty_slots
    }

    /// Find the empty slot under a point.
    pub fn empty_slot_at(&self, point: IVec2) -> Option<&EmptySlot> {
        self.empty_slots.iter().find(|s| s.placed.contains(point))
    }

    /// Iterate over all elements.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Forget the geometry of the previous commit.
    pub fn clear_placements(&mut self) {
        for element in self.elements.values_mut() {
            element.placed = None;
        }
        self.empty_slots.clear();
    }
}

impl ApplyLayout for ElementTree {
    fn apply_layout(&mut self, element: ElementId, x: i32, y: i32, layout: &LayoutNode) {
        if let Some(e) = self.elements.get_mut(&element) {
            e.placed = Some(Placed::from_anchor(x, y, layout.extent()));
        }
    }

    fn apply_empty_slot(
        &mut self,
        owner: Option<ElementId>,
        slot: SlotId,
        x: i32,
        y: i32,
        footprint: Extent,
    ) {
        self.empty_slots.push(EmptySlot {
            owner,
            slot,
            placed: Placed::from_anchor(x, y, footprint),
        });
    }
}
