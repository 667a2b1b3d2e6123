use serde_json::Value;
use tracing::trace;

use crate::logging::HARVEST_SCAN;

/// Keyword substring that marks a node as a hazard lookup layer.
pub const HAZARD_KEYWORD: &str = "hazardlookup";

/// Walk the JSON tree and collect every object whose `keyword_list` mentions
/// [`HAZARD_KEYWORD`].
///
/// Traversal is iterative with an explicit stack so arbitrarily deep documents
/// cannot overflow the call stack. A matched object is a leaf of the search:
/// its children are never inspected, even if they would match on their own.
pub fn find_hazard_layers(root: &Value) -> Vec<&Value> {
    let mut results = Vec::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        match node {
            Value::Object(map) => {
                if is_hazard_layer(node) {
                    trace!(
                        target: HARVEST_SCAN,
                        name = ?map.get("name"),
                        "matched hazard layer"
                    );
                    results.push(node);
                } else {
                    stack.extend(map.values());
                }
            }
            Value::Array(items) => stack.extend(items.iter()),
            _ => {}
        }
    }

    results
}

/// True when `node` is an object carrying a `keyword_list` array with at least
/// one element containing [`HAZARD_KEYWORD`], case-insensitively.
pub fn is_hazard_layer(node: &Value) -> bool {
    match node.get("keyword_list") {
        Some(Value::Array(keywords)) => keywords
            .iter()
            .any(|k| value_text(k).to_lowercase().contains(HAZARD_KEYWORD)),
        _ => false,
    }
}

/// String form of a scalar as it should appear in a report cell: strings are
/// taken verbatim, everything else uses its JSON text.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
