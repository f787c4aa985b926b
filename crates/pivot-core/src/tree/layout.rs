//! Two-pass tree layout.
//!
//! Pass 1 ([`layout_full`]) walks the whole forest with the active branch
//! ordered first at every fork. Pass 2 ([`relayout_visible`]) re-derives
//! parent/child/sibling relationships among the visible nodes only and lays
//! them out again, because connector and gutter placement depends on visible
//! sibling counts. Both passes share [`lay_out`], an explicit-stack walk.

use std::collections::HashMap;

use super::Gutter;
use super::forest::Forest;

/// Layout of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Slot {
    pub idx: usize,
    pub indent: usize,
    pub show_connector: bool,
    pub is_last: bool,
    pub gutters: Vec<Gutter>,
    pub is_virtual_root_child: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Layout {
    /// Slots in emission (display) order.
    pub slots: Vec<Slot>,
    pub multiple_roots: bool,
}

struct Pending {
    idx: usize,
    indent: usize,
    just_branched: bool,
    show_connector: bool,
    is_last: bool,
    gutters: Vec<Gutter>,
    is_virtual_root_child: bool,
}

/// Lays out every node reachable from `roots`, depth first, children visited
/// in the order `children_of` returns them.
fn lay_out<'c>(roots: &[usize], children_of: impl Fn(usize) -> &'c [usize]) -> Layout {
    let multiple_roots = roots.len() > 1;
    let root_indent = usize::from(multiple_roots);
    let mut slots = Vec::new();

    let mut stack: Vec<Pending> = roots
        .iter()
        .enumerate()
        .rev()
        .map(|(i, &idx)| Pending {
            idx,
            indent: root_indent,
            just_branched: multiple_roots,
            show_connector: multiple_roots,
            is_last: i + 1 == roots.len(),
            gutters: Vec::new(),
            is_virtual_root_child: multiple_roots,
        })
        .collect();

    while let Some(node) = stack.pop() {
        let children = children_of(node.idx);
        let multiple_children = children.len() > 1;

        let child_indent = if multiple_children || (node.just_branched && node.indent > 0) {
            node.indent + 1
        } else {
            node.indent
        };

        let connector_displayed = node.show_connector && !node.is_virtual_root_child;
        let display_indent = if multiple_roots {
            node.indent.saturating_sub(1)
        } else {
            node.indent
        };
        let child_gutters = if connector_displayed {
            let mut gutters = node.gutters.clone();
            gutters.push(Gutter {
                position: display_indent.saturating_sub(1),
                show: !node.is_last,
            });
            gutters
        } else {
            node.gutters.clone()
        };

        for (i, &child) in children.iter().enumerate().rev() {
            stack.push(Pending {
                idx: child,
                indent: child_indent,
                just_branched: multiple_children,
                show_connector: multiple_children,
                is_last: i + 1 == children.len(),
                gutters: child_gutters.clone(),
                is_virtual_root_child: false,
            });
        }

        slots.push(Slot {
            idx: node.idx,
            indent: node.indent,
            show_connector: node.show_connector,
            is_last: node.is_last,
            gutters: node.gutters,
            is_virtual_root_child: node.is_virtual_root_child,
        });
    }

    Layout {
        slots,
        multiple_roots,
    }
}

/// Stable partition: entries whose subtree holds the active leaf first.
fn active_first(nodes: &[usize], contains_active: &[bool]) -> Vec<usize> {
    let (mut ordered, rest): (Vec<usize>, Vec<usize>) =
        nodes.iter().partition(|&&idx| contains_active[idx]);
    ordered.extend(rest);
    ordered
}

/// Pass 1: full forest, active branch first at every fork.
pub(crate) fn layout_full(forest: &Forest<'_>, contains_active: &[bool]) -> Layout {
    let roots = active_first(&forest.roots, contains_active);
    let children: Vec<Vec<usize>> = forest
        .children
        .iter()
        .map(|kids| active_first(kids, contains_active))
        .collect();
    lay_out(&roots, |idx| children[idx].as_slice())
}

/// Nearest visible ancestor of every node, filled top-down in pass-1 order so
/// each parent is resolved before its children.
fn visible_ancestors(forest: &Forest<'_>, full: &Layout, visible: &[bool]) -> Vec<Option<usize>> {
    let mut ancestors = vec![None; forest.len()];
    for slot in &full.slots {
        ancestors[slot.idx] = forest.parent[slot.idx].and_then(|parent| {
            if visible[parent] {
                Some(parent)
            } else {
                ancestors[parent]
            }
        });
    }
    ancestors
}

/// Pass 2: lay out only the nodes with `visible[idx]`, attaching each one to
/// its nearest visible ancestor. Sibling order follows pass-1 order.
pub(crate) fn relayout_visible(forest: &Forest<'_>, full: &Layout, visible: &[bool]) -> Layout {
    let ancestors = visible_ancestors(forest, full, visible);

    let mut roots = Vec::new();
    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
    for slot in full.slots.iter().filter(|slot| visible[slot.idx]) {
        match ancestors[slot.idx] {
            Some(parent) => children.entry(parent).or_default().push(slot.idx),
            None => roots.push(slot.idx),
        }
    }

    lay_out(&roots, |idx| {
        children.get(&idx).map_or(&[][..], Vec::as_slice)
    })
}

#[cfg(test)]
mod tests {
    use pivot_types::{AgentMessage, Entry, EntryKind, UserContent};

    use super::*;

    fn entry(id: &str, parent: Option<&str>) -> Entry {
        Entry::new(
            id,
            parent,
            EntryKind::Message {
                message: AgentMessage::User {
                    content: UserContent::Text(id.to_string()),
                },
            },
        )
    }

    fn ids(forest: &Forest<'_>, layout: &Layout) -> Vec<String> {
        layout
            .slots
            .iter()
            .map(|slot| forest.entries[slot.idx].id.clone())
            .collect()
    }

    #[test]
    fn test_fork_children_get_connectors_and_gutters() {
        //  a
        //  ├─ b
        //  │  └ d
        //  └─ c
        let entries = vec![
            entry("a", None),
            entry("b", Some("a")),
            entry("c", Some("a")),
            entry("d", Some("b")),
        ];
        let forest = Forest::build(&entries);
        let contains = forest.contains_leaf(forest.lookup("d"));
        let layout = layout_full(&forest, &contains);

        assert_eq!(ids(&forest, &layout), ["a", "b", "d", "c"]);
        let by_id: HashMap<String, &Slot> = layout
            .slots
            .iter()
            .map(|slot| (forest.entries[slot.idx].id.clone(), slot))
            .collect();

        assert_eq!(by_id["a"].indent, 0);
        assert!(!by_id["a"].show_connector);

        assert_eq!(by_id["b"].indent, 1);
        assert!(by_id["b"].show_connector);
        assert!(!by_id["b"].is_last);

        // Just after a fork, the single child steps in once more.
        assert_eq!(by_id["d"].indent, 2);
        assert!(!by_id["d"].show_connector);
        assert_eq!(
            by_id["d"].gutters,
            vec![Gutter {
                position: 0,
                show: true
            }]
        );

        assert_eq!(by_id["c"].indent, 1);
        assert!(by_id["c"].is_last);
        assert!(by_id["c"].gutters.is_empty());
    }

    #[test]
    fn test_gutter_hidden_below_last_branch() {
        //  a
        //  ├─ b
        //  │  ├─ f
        //  │  └─ g
        //  └─ c
        //     ├─ d
        //     └─ e
        let entries = vec![
            entry("a", None),
            entry("b", Some("a")),
            entry("c", Some("a")),
            entry("d", Some("c")),
            entry("e", Some("c")),
            entry("f", Some("b")),
            entry("g", Some("b")),
        ];
        let forest = Forest::build(&entries);
        let contains = forest.contains_leaf(None);
        let layout = layout_full(&forest, &contains);

        assert_eq!(ids(&forest, &layout), ["a", "b", "f", "g", "c", "d", "e"]);
        for slot in &layout.slots {
            let id = forest.entries[slot.idx].id.as_str();
            let expected = match id {
                "f" | "g" => vec![Gutter {
                    position: 0,
                    show: true,
                }],
                "d" | "e" => vec![Gutter {
                    position: 0,
                    show: false,
                }],
                _ => vec![],
            };
            assert_eq!(slot.gutters, expected, "gutters of {id}");
        }
    }

    #[test]
    fn test_multiple_roots_use_virtual_level() {
        let entries = vec![entry("r1", None), entry("r2", None), entry("x", Some("r2"))];
        let forest = Forest::build(&entries);
        let contains = forest.contains_leaf(forest.lookup("x"));
        let layout = layout_full(&forest, &contains);

        assert!(layout.multiple_roots);
        assert_eq!(ids(&forest, &layout), ["r2", "x", "r1"]);
        for slot in &layout.slots {
            let id = &forest.entries[slot.idx].id;
            assert_eq!(slot.is_virtual_root_child, id.starts_with('r'));
        }
        // Root indent 1 and just branched: the child steps in.
        assert_eq!(layout.slots[1].indent, 2);
        // Virtual root children draw no connector, so they add no gutter.
        assert!(layout.slots[1].gutters.is_empty());
    }

    #[test]
    fn test_relayout_collapses_hidden_fork() {
        // a -> h (hidden) -> {b, c}; after hiding h, b and c are children of a.
        let entries = vec![
            entry("a", None),
            entry("h", Some("a")),
            entry("b", Some("h")),
            entry("c", Some("h")),
        ];
        let forest = Forest::build(&entries);
        let contains = forest.contains_leaf(None);
        let full = layout_full(&forest, &contains);
        let visible: Vec<bool> = forest.entries.iter().map(|e| e.id != "h").collect();
        let relaid = relayout_visible(&forest, &full, &visible);

        assert_eq!(ids(&forest, &relaid), ["a", "b", "c"]);
        assert_eq!(relaid.slots[1].indent, 1);
        assert!(relaid.slots[1].show_connector);
        assert!(relaid.slots[2].is_last);
    }

    #[test]
    fn test_relayout_removes_fork_when_sibling_hidden() {
        // a has children b (hidden leaf) and c: visibly a chain a -> c.
        let entries = vec![entry("a", None), entry("b", Some("a")), entry("c", Some("a"))];
        let forest = Forest::build(&entries);
        let contains = forest.contains_leaf(None);
        let full = layout_full(&forest, &contains);
        assert_eq!(full.slots[1].indent, 1);

        let visible: Vec<bool> = forest.entries.iter().map(|e| e.id != "b").collect();
        let relaid = relayout_visible(&forest, &full, &visible);
        assert_eq!(ids(&forest, &relaid), ["a", "c"]);
        assert_eq!(relaid.slots[1].indent, 0);
        assert!(!relaid.slots[1].show_connector);
    }
}
