//! Breadth-first teardown of attribute graphs.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::{Object, Payload};

/// Detach the attribute graphs of `roots`, releasing any cycles among them.
///
/// Namespaces may reference each other in cycles that reference counting
/// alone never releases. The pass walks breadth first (never recursing on the
/// host stack) over everything reachable from `roots`, stopping at pinned
/// objects. An object that is also held from outside the walked graph is
/// live, as is everything it reaches; every other object has its attributes
/// cleared.
///
/// Returns the number of objects cleared.
pub fn disown(roots: impl IntoIterator<Item = Object>) -> usize {
    let graph = Graph::collect(roots);
    let live = graph.live();
    let mut cleared = 0;
    for (node, is_live) in graph.nodes.iter().zip(live) {
        if is_live {
            continue;
        }
        for name in node.dir() {
            node.delete_attribute(name.as_str());
        }
        cleared += 1;
    }
    tracing::trace!(cleared, walked = graph.nodes.len(), "disowned attribute graph");
    cleared
}

struct Graph {
    nodes: Vec<Object>,
    edges: Vec<Vec<usize>>,
}

impl Graph {
    fn collect(roots: impl IntoIterator<Item = Object>) -> Self {
        let mut index = FxHashMap::default();
        let mut nodes: Vec<Object> = Vec::new();
        let mut edges: Vec<Vec<usize>> = Vec::new();
        let mut queue: VecDeque<Object> = VecDeque::new();

        let mut admit = |object: Object, queue: &mut VecDeque<Object>, nodes: &mut Vec<Object>| {
            if object.is_pinned() {
                return None;
            }
            let next = nodes.len();
            let slot = *index.entry(object.id()).or_insert(next);
            if slot == next {
                nodes.push(object.clone());
                queue.push_back(object);
            }
            Some(slot)
        };

        for root in roots {
            admit(root, &mut queue, &mut nodes);
        }
        while let Some(object) = queue.pop_front() {
            let mut out = Vec::new();
            for child in children(&object) {
                if let Some(slot) = admit(child, &mut queue, &mut nodes) {
                    out.push(slot);
                }
            }
            edges.push(out);
        }
        Graph { nodes, edges }
    }

    /// Mark objects held from outside the graph, then everything they reach.
    fn live(&self) -> Vec<bool> {
        let mut incoming = vec![0_usize; self.nodes.len()];
        for out in &self.edges {
            for &target in out {
                incoming[target] += 1;
            }
        }
        let mut live = vec![false; self.nodes.len()];
        let mut queue: VecDeque<usize> = VecDeque::new();
        for (slot, node) in self.nodes.iter().enumerate() {
            // One handle belongs to `nodes`; the rest are graph edges or
            // outside holders.
            if node.handle_count() > 1 + incoming[slot] {
                live[slot] = true;
                queue.push_back(slot);
            }
        }
        while let Some(slot) = queue.pop_front() {
            for &target in &self.edges[slot] {
                if !live[target] {
                    live[target] = true;
                    queue.push_back(target);
                }
            }
        }
        live
    }
}

/// Every handle `object` holds: attribute values plus payload parts.
fn children(object: &Object) -> Vec<Object> {
    let mut out: Vec<Object> = object
        .dir()
        .iter()
        .filter_map(|name| object.get_attribute(name.as_str()))
        .collect();
    match object.payload() {
        Payload::Tuple(items) => out.extend(items.iter().cloned()),
        Payload::TupleIterator(cursor) => out.extend(cursor.items().iter().cloned()),
        Payload::Method(method) => {
            out.push(method.function.clone());
            out.push(method.receiver.clone());
        }
        Payload::Function(code) => out.extend(code.closure.iter().cloned()),
        Payload::Plain
        | Payload::None
        | Payload::Bool(_)
        | Payload::Int(_)
        | Payload::Float(_)
        | Payload::Str(_)
        | Payload::Native(_) => {}
    }
    out
}
