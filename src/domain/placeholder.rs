//! Placeholder syntax understood by the workflow engine.
//!
//! The compiler emits these verbatim; the engine substitutes them at run time.

/// Scope of a template's declared input parameters
pub const INPUTS: &str = "inputs.parameters";

/// Scope of the workflow's global arguments
pub const WORKFLOW: &str = "workflow.parameters";

/// Scope of the current fan-out item
pub const ITEM: &str = "item";

/// `{{inputs.parameters.<name>}}`
pub fn input_ref(name: &str) -> String {
    placeholder(INPUTS, name)
}

/// `{{item.<key>}}`
pub fn item_ref(key: &str) -> String {
    placeholder(ITEM, key)
}

fn placeholder(scope: &str, name: &str) -> String {
    format!("{{{{{scope}.{name}}}}}")
}

/// Names referenced in `text` under the given scope, in order of appearance
pub fn references<'a>(text: &'a str, scope: &str) -> Vec<&'a str> {
    let open = format!("{{{{{scope}.");
    let mut found = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find(&open) {
        let after = &rest[start + open.len()..];
        match after.find("}}") {
            Some(end) => {
                found.push(after[..end].trim());
                rest = &after[end + 2..];
            }
            None => break,
        }
    }

    found
}
