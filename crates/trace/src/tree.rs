use std::collections::HashMap;

use cellscope_core::error::{CellscopeError, Result};
use cellscope_core::model::span::Span;

/// Callbacks driven by [`SpanTree::walk`].
///
/// `enter` runs in pre-order; whatever it returns is threaded down to the
/// node's children as their state, so an open link source can be carried
/// without shared mutable state. `leave` runs after the node's subtree and
/// receives the state the node itself was entered with. When `terminate`
/// returns true the node's children are skipped, but the node itself is
/// still entered and left.
pub trait SpanVisitor {
    type State: Clone;

    fn enter(&mut self, span: &Span, state: &Self::State) -> Self::State;

    fn leave(&mut self, _span: &Span, _state: &Self::State) {}

    fn terminate(&self, _span: &Span) -> bool {
        false
    }
}

/// A rooted view over a flat span collection.
///
/// The tree indexes the caller's spans rather than copying them. Children
/// are ordered ascending by start time, ties broken by input order.
#[derive(Debug, Clone)]
pub struct SpanTree<'a> {
    spans: &'a [Span],
    children: Vec<Vec<usize>>,
    index: HashMap<&'a str, usize>,
    root: usize,
    count: usize,
}

impl<'a> SpanTree<'a> {
    pub fn build(spans: &'a [Span]) -> Result<Self> {
        if spans.is_empty() {
            return Err(CellscopeError::MalformedTrace(
                "no spans supplied".to_string(),
            ));
        }

        let mut index = HashMap::with_capacity(spans.len());
        for (i, span) in spans.iter().enumerate() {
            if index.insert(span.span_id.as_str(), i).is_some() {
                return Err(CellscopeError::MalformedTrace(format!(
                    "duplicate span id {}",
                    span.span_id
                )));
            }
        }

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); spans.len()];
        let mut root = None;
        for (i, span) in spans.iter().enumerate() {
            match &span.parent_span_id {
                None => {
                    if let Some(previous) = root.replace(i) {
                        return Err(CellscopeError::MalformedTrace(format!(
                            "multiple root spans: {} and {}",
                            spans[previous].span_id, span.span_id
                        )));
                    }
                }
                Some(parent_id) => {
                    let Some(&parent) = index.get(parent_id.as_str()) else {
                        return Err(CellscopeError::MalformedTrace(format!(
                            "span {} references missing parent {parent_id}",
                            span.span_id
                        )));
                    };
                    children[parent].push(i);
                }
            }
        }
        let Some(root) = root else {
            return Err(CellscopeError::MalformedTrace(
                "no root span in collection".to_string(),
            ));
        };

        // Stable: input order survives among equal start times.
        for siblings in &mut children {
            siblings.sort_by_key(|&i| spans[i].start_ts);
        }

        let count = reachable_count(&children, root);
        if count != spans.len() {
            return Err(CellscopeError::MalformedTrace(format!(
                "{} of {} spans unreachable from root (cycle or detached subtree)",
                spans.len() - count,
                spans.len()
            )));
        }

        Ok(Self {
            spans,
            children,
            index,
            root,
            count,
        })
    }

    pub fn root(&self) -> &'a Span {
        &self.spans[self.root]
    }

    /// Number of spans reachable from this tree's root.
    pub fn node_count(&self) -> usize {
        self.count
    }

    pub fn contains(&self, span_id: &str) -> bool {
        self.index.contains_key(span_id)
    }

    /// The same arena re-rooted at `span_id`, for drill-down walks.
    pub fn subtree(&self, span_id: &str) -> Option<SpanTree<'a>> {
        let &root = self.index.get(span_id)?;
        let count = reachable_count(&self.children, root);
        Some(SpanTree {
            spans: self.spans,
            children: self.children.clone(),
            index: self.index.clone(),
            root,
            count,
        })
    }

    /// Depth-first traversal from the root.
    ///
    /// Uses an explicit stack so traversal depth is not bounded by the host
    /// call stack. Pre-order matches child ordering; synchronous and
    /// single-threaded throughout.
    pub fn walk<V: SpanVisitor>(&self, seed: V::State, visitor: &mut V) {
        enum Frame<S> {
            Enter(usize, S),
            Leave(usize, S),
        }

        let mut stack = vec![Frame::Enter(self.root, seed)];
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(idx, state) => {
                    let span = &self.spans[idx];
                    let next = visitor.enter(span, &state);
                    stack.push(Frame::Leave(idx, state));
                    if !visitor.terminate(span) {
                        for &child in self.children[idx].iter().rev() {
                            stack.push(Frame::Enter(child, next.clone()));
                        }
                    }
                }
                Frame::Leave(idx, state) => visitor.leave(&self.spans[idx], &state),
            }
        }
    }
}

fn reachable_count(children: &[Vec<usize>], root: usize) -> usize {
    let mut count = 0;
    let mut stack = vec![root];
    while let Some(idx) = stack.pop() {
        count += 1;
        stack.extend(children[idx].iter().copied());
    }
    count
}
