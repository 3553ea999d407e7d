use std::collections::BTreeMap;

use cellscope_core::config::Config;
use cellscope_core::error::{CellscopeError, Result};
use cellscope_core::model::span::{Span, SpanKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::sanitize::ActorNameCodec;
use crate::tree::{SpanTree, SpanVisitor};

/// Spans the diagram treats as transparent: the auth filter the gateway
/// sidecar wraps around inbound calls, and the mesh telemetry mixer. They
/// never become actors and never produce statements. Both patterns are
/// injectable so the core stays decoupled from one mesh's naming scheme.
#[derive(Debug, Clone)]
pub struct SkipRules {
    sidecar_auth_filter_operation: Regex,
    mixer_service: Regex,
}

impl SkipRules {
    pub fn new(operation_pattern: &str, service_pattern: &str) -> Result<Self> {
        Ok(Self {
            sidecar_auth_filter_operation: Regex::new(operation_pattern).map_err(|e| {
                CellscopeError::Config(format!("bad sidecar auth filter pattern: {e}"))
            })?,
            mixer_service: Regex::new(service_pattern)
                .map_err(|e| CellscopeError::Config(format!("bad mixer service pattern: {e}")))?,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            &cfg.sidecar_auth_filter_operation_pattern,
            &cfg.mixer_service_pattern,
        )
    }

    fn skips(&self, span: &Span) -> bool {
        self.sidecar_auth_filter_operation.is_match(&span.operation)
            || self.mixer_service.is_match(&span.service)
    }
}

/// Span id to assigned action id, as emitted in `Call ... [id]` labels.
/// Returned alongside the script instead of being smuggled through span
/// mutation; [`apply_action_ids`] mirrors it back onto spans when callers
/// want the annotation form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionIdMap(BTreeMap<String, String>);

impl ActionIdMap {
    pub fn get(&self, span_id: &str) -> Option<&str> {
        self.0.get(span_id).map(String::as_str)
    }

    pub fn span_for(&self, action_id: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, id)| id.as_str() == action_id)
            .map(|(span_id, _)| span_id.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceDiagram {
    /// Mermaid sequence script, produced fresh on every generation.
    pub script: String,
    /// Encoded actor names in first-encountered order.
    pub actors: Vec<String>,
    pub action_ids: ActionIdMap,
}

/// Writes assigned action ids back onto the spans that earned them. Only
/// cell-level callers should do this; component-level ids are namespaced
/// views that would clobber the drill-down anchors.
pub fn apply_action_ids(spans: &mut [Span], ids: &ActionIdMap) {
    for span in spans {
        if let Some(id) = ids.get(&span.span_id) {
            span.action_id = Some(id.to_string());
        }
    }
}

/// Cell-level diagram over the whole trace: one swimlane per cell, with a
/// synthetic gateway lane for spans owned by no cell, and plain integer
/// action ids.
pub fn cell_level(
    tree: &SpanTree<'_>,
    rules: &SkipRules,
    codec: &ActorNameCodec,
    gateway_actor: &str,
) -> SequenceDiagram {
    generate(
        tree,
        rules,
        codec,
        |span| span.cell_name().unwrap_or(gateway_actor).to_string(),
        |id| id.to_string(),
        None,
    )
}

/// Component-level drill-down into one cell-level action: the SERVER span
/// carrying `action_id` becomes the subtree root, swimlanes are service
/// names, ids are namespaced under the parent action id, and traversal
/// stops at spans owned by a different cell than the subtree root.
pub fn component_level(
    tree: &SpanTree<'_>,
    rules: &SkipRules,
    codec: &ActorNameCodec,
    prior: &ActionIdMap,
    action_id: &str,
) -> Result<SequenceDiagram> {
    let span_id = prior.span_for(action_id).ok_or_else(|| {
        CellscopeError::DrillDownNotFound(format!("no span annotated with action id {action_id}"))
    })?;
    let sub = tree.subtree(span_id).ok_or_else(|| {
        CellscopeError::DrillDownNotFound(format!(
            "span {span_id} for action id {action_id} is not part of the current trace"
        ))
    })?;

    // The selected cell is whatever the subtree root belongs to. A
    // null-vs-non-null mismatch counts as leaving it, same as a differing
    // name. Instance kind is deliberately not consulted.
    let root_cell = sub.root().cell.clone();
    let boundary = |span: &Span| match (&root_cell, &span.cell) {
        (None, None) => false,
        (Some(root), Some(own)) => root.name != own.name,
        _ => true,
    };

    Ok(generate(
        &sub,
        rules,
        codec,
        |span| span.service.clone(),
        |id| format!("{action_id}.{id}"),
        Some(&boundary),
    ))
}

struct DiagramBuilder<'x, A, C> {
    rules: &'x SkipRules,
    codec: &'x ActorNameCodec,
    resolve_actor: A,
    resolve_call_id: C,
    boundary: Option<&'x dyn Fn(&Span) -> bool>,
    actors: Vec<String>,
    statements: Vec<String>,
    action_ids: BTreeMap<String, String>,
    next_id: u64,
    initial_actor: Option<String>,
}

impl<A, C> DiagramBuilder<'_, A, C>
where
    A: Fn(&Span) -> String,
{
    fn actor(&self, span: &Span) -> String {
        self.codec.encode(&(self.resolve_actor)(span))
    }
}

impl<A, C> SpanVisitor for DiagramBuilder<'_, A, C>
where
    A: Fn(&Span) -> String,
    C: Fn(u64) -> String,
{
    /// Encoded actor name of the span that opened the still-unclosed
    /// remote call, threaded through the walk instead of held in a field
    /// so generation stays reentrant.
    type State = Option<String>;

    fn enter(&mut self, span: &Span, state: &Option<String>) -> Option<String> {
        let mut link_source = state.clone();
        if self.rules.skips(span) {
            return link_source;
        }

        let actor = self.actor(span);
        if link_source.as_deref() != Some(actor.as_str()) {
            if let Some(source) = link_source.as_deref() {
                if span.kind == SpanKind::Server {
                    // Crossing actors with an open link closes the call.
                    let call_id = (self.resolve_call_id)(self.next_id);
                    self.statements
                        .push(format!("{source}->>+{actor}: Call {actor} [{call_id}]"));
                    self.action_ids.insert(span.span_id.clone(), call_id);
                    self.next_id += 1;
                    link_source = None;
                }
            } else if span.kind == SpanKind::Client {
                link_source = Some(actor.clone());
            }
            if !self.actors.contains(&actor) {
                self.actors.push(actor.clone());
            }
            if self.initial_actor.is_none() {
                self.initial_actor = Some(actor);
            }
        }
        link_source
    }

    fn leave(&mut self, span: &Span, state: &Option<String>) {
        if self.rules.skips(span) {
            return;
        }
        let actor = self.actor(span);
        if let Some(target) = state.as_deref() {
            if target != actor && span.kind == SpanKind::Server {
                self.statements.push(format!("{actor}-->>-{target}: Return"));
            }
        }
    }

    fn terminate(&self, span: &Span) -> bool {
        self.boundary.is_some_and(|f| f(span))
    }
}

fn generate<A, C>(
    tree: &SpanTree<'_>,
    rules: &SkipRules,
    codec: &ActorNameCodec,
    resolve_actor: A,
    resolve_call_id: C,
    boundary: Option<&dyn Fn(&Span) -> bool>,
) -> SequenceDiagram
where
    A: Fn(&Span) -> String,
    C: Fn(u64) -> String,
{
    let mut builder = DiagramBuilder {
        rules,
        codec,
        resolve_actor,
        resolve_call_id,
        boundary,
        actors: Vec::new(),
        statements: Vec::new(),
        action_ids: BTreeMap::new(),
        next_id: 1,
        initial_actor: None,
    };
    tree.walk(None, &mut builder);

    let mut script = String::from("sequenceDiagram\n");
    for actor in &builder.actors {
        script.push_str("participant ");
        script.push_str(actor);
        script.push('\n');
    }
    if let Some(initial) = &builder.initial_actor {
        script.push_str("activate ");
        script.push_str(initial);
        script.push('\n');
    }
    for statement in &builder.statements {
        script.push_str(statement);
        script.push('\n');
    }
    if let Some(initial) = &builder.initial_actor {
        script.push_str("deactivate ");
        script.push_str(initial);
        script.push('\n');
    }

    debug!(
        actors = builder.actors.len(),
        statements = builder.statements.len(),
        calls = builder.action_ids.len(),
        "generated sequence diagram"
    );

    SequenceDiagram {
        script,
        actors: builder.actors,
        action_ids: ActionIdMap(builder.action_ids),
    }
}
