pub mod sanitize;
pub mod sequence;
pub mod tree;

pub use sequence::{ActionIdMap, SequenceDiagram, SkipRules};
pub use tree::{SpanTree, SpanVisitor};
