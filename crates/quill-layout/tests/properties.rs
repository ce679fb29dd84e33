//! Property tests for candidate generation.

use proptest::prelude::*;
use quill_core::{ElementId, Extent, LayoutOptions, SlotId};
use quill_layout::{
    instantiate, layout_sequence, ApplyLayout, CandidateSet, LayoutNode, LayoutStats,
    SequenceItem, SubLayout,
};

const ITEM_CHOICE_POINTS: usize = 2;

fn shape() -> impl Strategy<Value = (i32, i32, f64)> {
    (1i32..60, 1i32..40, 0.0f64..5.0)
}

fn item_shapes() -> impl Strategy<Value = Option<Vec<(i32, i32, f64)>>> {
    prop::option::weighted(0.85, prop::collection::vec(shape(), 1..4))
}

/// Leaves of item `i` belong to element `ELEMENT_BASE + i`.
const ELEMENT_BASE: u64 = 10;

fn sequence() -> impl Strategy<Value = Vec<SequenceItem>> {
    prop::collection::vec(item_shapes(), 1..6).prop_map(|items| {
        items
            .into_iter()
            .enumerate()
            .map(|(i, shapes)| {
                let element = ElementId(ELEMENT_BASE + i as u64);
                let candidates: Vec<SubLayout> = shapes
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(w, h, bad)| {
                        LayoutNode::leaf(Some(element), Extent::new(w, h, h / 2))
                            .with_badness(bad)
                            .into()
                    })
                    .collect();
                match CandidateSet::new(candidates, ITEM_CHOICE_POINTS) {
                    Some(set) => SequenceItem::Present(set),
                    None => SequenceItem::Missing,
                }
            })
            .collect()
    })
}

fn options() -> LayoutOptions {
    LayoutOptions::default()
        .with_item_gap(4)
        .with_continuation_indent(0)
}

fn triples(set: &CandidateSet) -> Vec<(i32, i32, f64)> {
    set.candidates()
        .iter()
        .map(|c| (c.node().width(), c.node().height(), c.node().badness()))
        .collect()
}

#[derive(Default)]
struct Recorder {
    applied: Vec<(ElementId, i32, i32)>,
    empty: Vec<(Option<ElementId>, SlotId, i32, i32)>,
}

impl ApplyLayout for Recorder {
    fn apply_layout(&mut self, element: ElementId, x: i32, y: i32, _layout: &LayoutNode) {
        self.applied.push((element, x, y));
    }

    fn apply_empty_slot(
        &mut self,
        owner: Option<ElementId>,
        slot: SlotId,
        x: i32,
        y: i32,
        _footprint: Extent,
    ) {
        self.empty.push((owner, slot, x, y));
    }
}

proptest! {
    #[test]
    fn test_sequence_candidates_form_antichain(items in sequence()) {
        let mut stats = LayoutStats::default();
        let set = layout_sequence(&items, None, &options(), &mut stats).unwrap();
        let nodes: Vec<&LayoutNode> = set.candidates().iter().map(|c| c.node()).collect();
        for (i, a) in nodes.iter().enumerate() {
            for (j, b) in nodes.iter().enumerate() {
                if i != j {
                    prop_assert!(!a.dominates(b));
                }
            }
        }
    }

    #[test]
    fn test_sequence_respects_budget(items in sequence()) {
        let options = options();
        let mut stats = LayoutStats::default();
        let set = layout_sequence(&items, None, &options, &mut stats).unwrap();
        prop_assert!(!set.is_empty());
        prop_assert!(set.len() <= options.budget.limit(set.choice_points()));
    }

    #[test]
    fn test_narrowest_candidate_uses_minimal_margin(items in sequence()) {
        let options = options();
        let mut stats = LayoutStats::default();
        let set = layout_sequence(&items, None, &options, &mut stats).unwrap();
        let widest_item = items
            .iter()
            .map(|item| item.min_width(options.empty_slot))
            .max()
            .unwrap_or(0);
        prop_assert_eq!(set.min_width(), widest_item);
    }

    #[test]
    fn test_sequence_layout_is_deterministic(items in sequence()) {
        let options = options();
        let first = layout_sequence(&items, None, &options, &mut LayoutStats::default()).unwrap();
        let second = layout_sequence(&items, None, &options, &mut LayoutStats::default()).unwrap();
        prop_assert_eq!(triples(&first), triples(&second));
    }

    #[test]
    fn test_instantiate_places_items_at_offsets(
        items in sequence(),
        x0 in -500i32..500,
        y0 in -500i32..500,
    ) {
        let owner = ElementId(1);
        let mut stats = LayoutStats::default();
        let set = layout_sequence(&items, Some(owner), &options(), &mut stats).unwrap();

        for candidate in set.candidates() {
            let node = candidate.node();
            let mut recorder = Recorder::default();
            instantiate(node, x0, y0, &mut recorder);

            let mut applied = vec![(owner, x0, y0)];
            let mut empty = Vec::new();
            for placement in node.placements() {
                let (x, y) = (x0 + placement.x, y0 + placement.y);
                let index = placement.slot.item_index().unwrap_or(usize::MAX);
                match &placement.child {
                    Some(child) => {
                        let element = ElementId(ELEMENT_BASE + index as u64);
                        prop_assert_eq!(child.node().element(), Some(element));
                        applied.push((element, x, y));
                    }
                    None => empty.push((Some(owner), placement.slot, x, y)),
                }
            }
            prop_assert_eq!(recorder.applied, applied);
            prop_assert_eq!(recorder.empty, empty);

            // Items sit left to right on their row's anchor line.
            for row in candidate.rows().unwrap_or_default() {
                let mut x = 0;
                for index in row.items.clone() {
                    let placement = node.placement(SlotId::item(index)).unwrap();
                    prop_assert_eq!((placement.x, placement.y), (x, row.y));
                    x += placement.footprint.width + 4;
                }
            }
        }
    }
}
