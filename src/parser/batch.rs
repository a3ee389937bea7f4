//! Parallel parsing of independent inputs.

use std::sync::Arc;

use rayon::prelude::*;

use super::{ParseError, Parser};
use crate::grammar::Grammar;
use crate::tree::Tree;

/// Parse every text with `grammar` on the rayon pool. Each worker builds
/// its own [`Parser`]; results come back in input order.
pub fn parse_batch(grammar: &Arc<Grammar>, texts: &[&str]) -> Vec<Result<Tree, ParseError>> {
    tracing::debug!(grammar = grammar.name(), inputs = texts.len(), "batch parse");
    texts
        .par_iter()
        .map_init(
            || {
                let mut parser = Parser::new();
                parser.set_language(grammar);
                parser
            },
            |parser, text| parser.parse(text),
        )
        .collect()
}
