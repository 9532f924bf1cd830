//! Best-effort extraction of a JSON object from raw model output.
//!
//! Attempts, first success wins:
//! 1. parse the trimmed text as-is
//! 2. parse the span from the first `{` to the last `}`
//! 3. strip trailing commas before `}`/`]` in that span and parse again,
//!    leaving string literals untouched
//!
//! Only objects are accepted. Anything else is `MalformedOutput`.

use crate::error::{PipelineError, Result};
use serde_json::{Map, Value};
use tracing::trace;

/// JSON object as produced by the model.
pub type JsonObject = Map<String, Value>;

/// Coerce raw model text into a JSON object.
pub fn coerce_json(raw: &str) -> Result<JsonObject> {
    let trimmed = raw.trim();

    if let Some(obj) = parse_object(trimmed) {
        return Ok(obj);
    }

    if let Some(span) = brace_span(trimmed) {
        if let Some(obj) = parse_object(span) {
            trace!("Recovered JSON object from surrounding prose");
            return Ok(obj);
        }

        let repaired = strip_trailing_commas(span);
        if let Some(obj) = parse_object(&repaired) {
            trace!("Recovered JSON object after trailing comma repair");
            return Ok(obj);
        }
    }

    Err(PipelineError::malformed_output(raw))
}

/// Substring from the first `{` to the last `}` inclusive.
pub fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Remove commas that are followed only by whitespace and a closing bracket,
/// along with that whitespace.
///
/// Commas inside string literals are kept, so a value such as `"a, }"`
/// survives the repair. Escaped quotes do not end a literal.
pub fn strip_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some((i, c)) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' if text[i + 1..].trim_start().starts_with(['}', ']']) => {
                while chars.next_if(|(_, next)| next.is_whitespace()).is_some() {}
            }
            _ => out.push(c),
        }
    }

    out
}

fn parse_object(text: &str) -> Option<JsonObject> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(obj)) => Some(obj),
        _ => None,
    }
}
