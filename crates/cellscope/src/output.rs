use cellscope_core::model::span::{Span, SpanKind};
use cellscope_trace::sanitize::ActorNameCodec;
use cellscope_trace::sequence::SequenceDiagram;
use cellscope_trace::{SpanTree, SpanVisitor};
use serde_json::{Value, json};

pub fn print_sequence_human(diagram: &SequenceDiagram, codec: &ActorNameCodec) {
    print!("{}", diagram.script);
    println!("-- {} actors --", diagram.actors.len());
    for actor in &diagram.actors {
        println!("actor={} display={}", actor, codec.decode(actor));
    }
    for (span_id, action_id) in diagram.action_ids.iter() {
        println!("action={action_id} span={span_id}");
    }
}

pub fn print_tree_human(tree: &SpanTree<'_>) {
    let mut printer = TreePrinter;
    tree.walk(0, &mut printer);
    println!("-- {} spans --", tree.node_count());
}

struct TreePrinter;

impl SpanVisitor for TreePrinter {
    type State = usize;

    fn enter(&mut self, span: &Span, depth: &usize) -> usize {
        let indent = "  ".repeat(*depth);
        let cell = span.cell_name().unwrap_or("-");
        println!(
            "{indent}{} {} kind={} cell={} ({}ms)",
            span.service,
            span.operation,
            kind_label(span.kind),
            cell,
            span.duration_ms()
        );
        depth + 1
    }
}

fn kind_label(kind: SpanKind) -> &'static str {
    match kind {
        SpanKind::Client => "CLIENT",
        SpanKind::Server => "SERVER",
        SpanKind::Other => "OTHER",
    }
}

/// Nested JSON rendering of the reconstructed hierarchy, children in
/// walk order.
pub fn tree_to_json(tree: &SpanTree<'_>) -> Value {
    let mut builder = JsonTreeBuilder {
        stack: Vec::new(),
        root: Value::Null,
    };
    tree.walk((), &mut builder);
    builder.root
}

struct JsonTreeBuilder {
    stack: Vec<Vec<Value>>,
    root: Value,
}

impl SpanVisitor for JsonTreeBuilder {
    type State = ();

    fn enter(&mut self, _span: &Span, _state: &()) {
        self.stack.push(Vec::new());
    }

    fn leave(&mut self, span: &Span, _state: &()) {
        let children = self.stack.pop().unwrap_or_default();
        let node = json!({
            "span_id": span.span_id,
            "service": span.service,
            "operation": span.operation,
            "kind": kind_label(span.kind),
            "cell": span.cell_name(),
            "duration_ms": span.duration_ms(),
            "children": children,
        });
        match self.stack.last_mut() {
            Some(siblings) => siblings.push(node),
            None => self.root = node,
        }
    }
}
