//! `continue: true` injection for route fragments.

use serde_yaml::Value;

const CONTINUE: &str = "continue";

/// Set `continue: true` on every non-empty mapping of a route sequence.
///
/// Returns the input unchanged when it is blank, not YAML, or not a sequence.
pub fn ensure_continue(route_text: &str) -> String {
    if route_text.trim().is_empty() {
        return route_text.to_string();
    }

    let mut document: Value = match serde_yaml::from_str(route_text) {
        Ok(document) => document,
        Err(e) => {
            tracing::error!(error = %e, route = %route_text, "Format error in route fragment");
            return route_text.to_string();
        }
    };

    let Some(routes) = document.as_sequence_mut() else {
        tracing::error!(route = %route_text, "Route fragment is not a YAML sequence");
        return route_text.to_string();
    };

    for (index, route) in routes.iter_mut().enumerate() {
        match route.as_mapping_mut() {
            Some(mapping) if mapping.is_empty() => {
                tracing::warn!(index, "Skipping empty route entry");
            }
            Some(mapping) => {
                mapping.insert(Value::String(CONTINUE.to_string()), Value::Bool(true));
            }
            None => {
                tracing::warn!(index, "Skipping route entry that is not a mapping");
            }
        }
    }

    match serde_yaml::to_string(&document) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize route fragment");
            route_text.to_string()
        }
    }
}
