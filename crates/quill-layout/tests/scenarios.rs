//! End-to-end layout scenarios.

use glam::IVec2;
use quill_core::{CandidateBudget, ElementId, Extent, LayoutOptions, SlotId};
use quill_layout::{
    compute_layout, layout_sequence, reduce, select_layout, CandidateSet, ElementTree,
    LayoutNode, LayoutStats, MonospaceMeasure, SequenceItem, SubLayout,
};

fn item(width: i32, height: i32, anchor: i32) -> SequenceItem {
    let leaf = LayoutNode::leaf(None, Extent::new(width, height, anchor));
    SequenceItem::Present(CandidateSet::single(leaf.into(), 0))
}

fn shapes(set: &CandidateSet) -> Vec<(i32, i32)> {
    let mut shapes: Vec<_> = set
        .candidates()
        .iter()
        .map(|c| (c.node().width(), c.node().height()))
        .collect();
    shapes.sort();
    shapes
}

#[test]
fn test_three_items_wrap_at_every_breakpoint() {
    let items = vec![item(10, 10, 5), item(40, 10, 5), item(10, 10, 5)];
    let options = LayoutOptions::default()
        .with_item_gap(2)
        .with_continuation_indent(0);
    let mut stats = LayoutStats::default();

    let set = layout_sequence(&items, None, &options, &mut stats).unwrap();
    assert_eq!(shapes(&set), vec![(40, 30), (52, 20), (64, 10)]);
    assert_eq!(stats.margin_steps, 3);

    let wide = select_layout(&set, 100, &mut stats);
    assert_eq!(wide.node().width(), 64);
    assert_eq!(wide.row_count(), 1);

    let medium = select_layout(&set, 53, &mut stats);
    let rows = medium.rows().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].items, 0..2);
    assert_eq!(rows[1].items, 2..3);

    // Nothing fits: the narrowest candidate is used anyway.
    let narrow = select_layout(&set, 20, &mut stats);
    assert_eq!((narrow.node().width(), narrow.node().height()), (40, 30));
    assert_eq!(stats.convergence_faults, 0);
}

#[test]
fn test_single_missing_item_is_an_empty_slot() {
    let options = LayoutOptions::default();
    let mut stats = LayoutStats::default();

    let set = layout_sequence(&[SequenceItem::Missing], None, &options, &mut stats).unwrap();
    assert_eq!(set.len(), 1);
    let node = set.candidates()[0].node();
    assert_eq!(node.extent(), options.empty_slot);
    assert_eq!(node.badness(), 0.0);
    assert!(node.placement(SlotId::item(0)).unwrap().child.is_none());
}

#[test]
fn test_large_front_is_cut_to_budget() {
    // Wider shapes are flatter and better, so nothing dominates anything.
    let candidates: Vec<SubLayout> = (0..500)
        .map(|i| {
            LayoutNode::leaf(None, Extent::new(10 + i, 1000 - i, 0))
                .with_badness((500 - i) as f64 * 0.01)
                .into()
        })
        .collect();
    let mut stats = LayoutStats::default();

    let reduced = reduce(candidates, 400, &CandidateBudget::default(), &mut stats);
    assert_eq!(reduced.len(), 20);
    assert_eq!(stats.budget_exhaustions, 1);
    assert_eq!(stats.pruned, 0);

    let widths: Vec<i32> = reduced.iter().map(|c| c.node().width()).collect();
    // Lowest badness, lowest area and narrowest survive.
    assert!(widths.contains(&509));
    assert!(widths.contains(&10));
}

#[test]
fn test_nested_calls_stay_inside_root() {
    let mut tree = ElementTree::new();
    let inner_callee = tree.token("inner");
    let inner_args: Vec<_> = (0..3).map(|i| Some(tree.token(format!("v{i}")))).collect();
    let inner = tree.call(Some(inner_callee), inner_args);
    let lhs = tree.token("total");
    let op = tree.token("+");
    let sum = tree.binary(Some(lhs), Some(op), Some(inner));
    let outer_callee = tree.token("print");
    let outer = tree.call(Some(outer_callee), [Some(sum), None]);

    let options = LayoutOptions::default().with_viewport_width(120);
    let report = compute_layout(&mut tree, outer, &MonospaceMeasure::default(), &options).unwrap();

    let root = tree.placed(outer).unwrap();
    assert_eq!(root.origin, IVec2::ZERO);
    assert_eq!(root.size.x, report.layout.node().width());

    for element in tree.elements() {
        let placed = element.placed.unwrap();
        assert!(placed.origin.x >= 0 && placed.origin.y >= 0);
        assert!(placed.right() <= root.right());
        assert!(placed.bottom() <= root.bottom());
    }

    let empty = tree.empty_slots();
    assert_eq!(empty.len(), 1);
    assert_eq!(empty[0].owner, Some(outer));
    assert_eq!(empty[0].slot, SlotId::Item(1));
}

#[test]
fn test_committed_arguments_match_call_offsets() {
    let mut tree = ElementTree::new();
    let callee = tree.token("f");
    let args: Vec<ElementId> = (0..5).map(|i| tree.token(format!("arg{i}"))).collect();
    let call = tree.call(Some(callee), args.iter().copied().map(Some));
    let measure = MonospaceMeasure::default();

    for width in [1000, 120, 60] {
        let options = LayoutOptions::default().with_viewport_width(width);
        let report = compute_layout(&mut tree, call, &measure, &options).unwrap();
        let node = report.layout.node();
        let anchor = IVec2::new(0, node.anchor());

        assert_eq!(tree.placed(callee).unwrap().anchor_point(), anchor);
        for (i, &arg) in args.iter().enumerate() {
            let placement = node.placement(SlotId::item(i)).unwrap();
            let expected = anchor + IVec2::new(placement.x, placement.y);
            assert_eq!(tree.placed(arg).unwrap().anchor_point(), expected);
        }
    }

    // On one line the arguments follow the callee and the open bracket.
    compute_layout(
        &mut tree,
        call,
        &measure,
        &LayoutOptions::default().with_viewport_width(1000),
    )
    .unwrap();
    assert_eq!(tree.placed(args[0]).unwrap().origin, IVec2::new(16, 0));
    assert_eq!(tree.placed(args[1]).unwrap().origin, IVec2::new(56, 0));
}

#[test]
fn test_viewport_changes_chosen_shape() {
    let mut tree = ElementTree::new();
    let callee = tree.token("configure");
    let args: Vec<_> = (0..6).map(|i| Some(tree.token(format!("option{i}")))).collect();
    let call = tree.call(Some(callee), args);
    let measure = MonospaceMeasure::default();

    let wide = LayoutOptions::default().with_viewport_width(1000);
    compute_layout(&mut tree, call, &measure, &wide).unwrap();
    let one_line = tree.placed(call).unwrap();
    assert_eq!(one_line.size.y, 16);

    let narrow = LayoutOptions::default().with_viewport_width(200);
    compute_layout(&mut tree, call, &measure, &narrow).unwrap();
    let wrapped = tree.placed(call).unwrap();
    assert!(wrapped.size.x <= 200);
    assert!(wrapped.size.y > 16);
}

#[test]
fn test_unknown_root_is_an_error() {
    let mut tree = ElementTree::new();
    let result = compute_layout(
        &mut tree,
        ElementId(7),
        &MonospaceMeasure::default(),
        &LayoutOptions::default(),
    );
    assert!(result.is_err());
}
