//! Typed records exchanged between pipeline stages.
//!
//! Each stage boundary converts the coerced JSON object into one of these
//! records and fails fast with a descriptive error when the shape is wrong.

use crate::coerce::JsonObject;
use crate::error::{PipelineError, Result};
use crate::package::README_FILE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Generated sources keyed by relative path.
pub type FileSet = BTreeMap<String, String>;

/// Structured requirements extracted from the specification.
///
/// The pipeline forwards it verbatim and only checks that it is a non-empty
/// object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Contract(JsonObject);

impl Contract {
    pub fn from_object(obj: JsonObject) -> Result<Self> {
        if obj.is_empty() {
            return Err(PipelineError::malformed_output("{}"));
        }
        Ok(Self(obj))
    }

    pub fn as_object(&self) -> &JsonObject {
        &self.0
    }

    /// Top-level keys, for logging.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// One output file in the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanModule {
    pub relpath: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub module_type: Option<String>,
    /// Remaining descriptive fields, forwarded to the code stage untouched
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl PlanModule {
    /// Name for logs and error messages.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.relpath)
    }
}

/// Ordered manifest of files to generate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub modules: Vec<PlanModule>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl Plan {
    /// Validate a coerced plan object.
    ///
    /// Rejects a missing or empty `modules` array, modules without a usable
    /// `relpath`, paths that leave the project directory or collide with the
    /// generated README, and duplicate paths.
    /// Accepted relative paths are normalised to `/`-separated form.
    pub fn from_object(mut obj: JsonObject) -> Result<Self> {
        let modules = match obj.remove("modules") {
            Some(Value::Array(modules)) => modules,
            Some(_) => {
                return Err(PipelineError::PlanIntegrity(
                    "\"modules\" is not an array".to_string(),
                ))
            }
            None => {
                return Err(PipelineError::PlanIntegrity(
                    "plan has no \"modules\" key".to_string(),
                ))
            }
        };

        if modules.is_empty() {
            return Err(PipelineError::PlanIntegrity(
                "plan contains no modules".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut parsed = Vec::with_capacity(modules.len());

        for (index, value) in modules.into_iter().enumerate() {
            if !value.get("relpath").is_some_and(Value::is_string) {
                return Err(PipelineError::PlanIntegrity(format!(
                    "module {} has no string \"relpath\"",
                    index
                )));
            }

            let mut module: PlanModule = serde_json::from_value(value).map_err(|e| {
                PipelineError::PlanIntegrity(format!("module {} is malformed: {}", index, e))
            })?;

            module.relpath = normalize_relpath(&module.relpath)?;
            ensure_not_reserved(&module.relpath)?;

            if !seen.insert(module.relpath.clone()) {
                return Err(PipelineError::PlanIntegrity(format!(
                    "duplicate relpath: {}",
                    module.relpath
                )));
            }

            parsed.push(module);
        }

        Ok(Self {
            modules: parsed,
            extra: obj,
        })
    }

    pub fn relpaths(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|m| m.relpath.as_str())
    }
}

/// Full-content replacement proposed by the critic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub relpath: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub new_content: String,
}

/// Critic verdict for one review round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticReview {
    pub status: String,
    #[serde(default)]
    pub patches: Option<Vec<Patch>>,
}

impl CriticReview {
    pub fn from_object(obj: JsonObject) -> Result<Self> {
        let raw = Value::Object(obj);
        serde_json::from_value(raw.clone()).map_err(|_| PipelineError::malformed_output(&raw.to_string()))
    }

    /// `status` equals "complete", ignoring case and surrounding whitespace.
    pub fn is_complete(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case("complete")
    }

    pub fn patches(&self) -> &[Patch] {
        self.patches.as_deref().unwrap_or(&[])
    }
}

/// Reject a normalised relpath that would be overwritten by the packaged
/// README. Compared case-insensitively.
pub fn ensure_not_reserved(relpath: &str) -> Result<()> {
    if relpath.eq_ignore_ascii_case(README_FILE) {
        return Err(PipelineError::PlanIntegrity(format!(
            "relpath is reserved for the generated README: {}",
            relpath
        )));
    }
    Ok(())
}

/// Normalise a model-supplied relative path.
///
/// Backslashes become `/`, empty and `.` segments are dropped. Absolute
/// paths, drive prefixes and `..` segments are rejected.
pub fn normalize_relpath(raw: &str) -> Result<String> {
    let unified = raw.trim().replace('\\', "/");

    if unified.starts_with('/') {
        return Err(PipelineError::PlanIntegrity(format!(
            "relpath must be relative: {}",
            raw
        )));
    }

    let mut segments = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(PipelineError::PlanIntegrity(format!(
                    "relpath escapes the project directory: {}",
                    raw
                )))
            }
            s if s.contains(':') => {
                return Err(PipelineError::PlanIntegrity(format!(
                    "relpath contains a drive or stream separator: {}",
                    raw
                )))
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return Err(PipelineError::PlanIntegrity(format!(
            "relpath is empty: {:?}",
            raw
        )));
    }

    Ok(segments.join("/"))
}
