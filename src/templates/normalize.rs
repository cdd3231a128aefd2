//! Normalization of crawler output into canonical templates
//!
//! Upstream crawlers emit several JSON layouts. The layout is detected once,
//! up front, in strict priority order:
//!
//! 1. a bare array of template objects
//! 2. `{"templates": [...]}`
//! 3. `{"forms": [...], "endpoints": [...]}` (either or both)
//! 4. any top-level array of endpoint-looking objects (`url`/`action`/`method`)
//! 5. a single template object with a `params` array
//!
//! Anything else is an input format error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PipelineError, Result};
use crate::models::{Parameter, Template};

/// Which input layout the templates came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputFormat {
    #[serde(rename = "list")]
    List,
    #[serde(rename = "templates-wrapper")]
    TemplatesWrapper,
    #[serde(rename = "forms/endpoints")]
    FormsEndpoints,
    #[serde(rename = "object")]
    Object,
}

impl InputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputFormat::List => "list",
            InputFormat::TemplatesWrapper => "templates-wrapper",
            InputFormat::FormsEndpoints => "forms/endpoints",
            InputFormat::Object => "object",
        }
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Templates plus the layout they were read from
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedInput {
    pub format: InputFormat,
    pub templates: Vec<Template>,
}

/// Detected input layout, borrowing from the raw document
#[derive(Debug, Clone, PartialEq)]
pub enum InputShape<'a> {
    List(&'a [Value]),
    TemplatesWrapper(&'a [Value]),
    /// Named sequences of form/endpoint objects, in document order
    FormsEndpoints(Vec<(&'a str, &'a [Value])>),
    /// Endpoint-looking arrays found under arbitrary keys
    EndpointArrays(Vec<(&'a str, &'a [Value])>),
    SingleTemplate(&'a Map<String, Value>),
}

impl InputShape<'_> {
    pub fn format(&self) -> InputFormat {
        match self {
            InputShape::List(_) => InputFormat::List,
            InputShape::TemplatesWrapper(_) => InputFormat::TemplatesWrapper,
            InputShape::FormsEndpoints(_) => InputFormat::FormsEndpoints,
            InputShape::EndpointArrays(_) | InputShape::SingleTemplate(_) => InputFormat::Object,
        }
    }
}

fn looks_like_endpoint(v: &Value) -> bool {
    v.as_object().is_some_and(|o| {
        ["url", "action", "method"]
            .iter()
            .any(|k| o.get(*k).is_some_and(Value::is_string))
    })
}

/// Classify the raw document's layout without building anything.
pub fn detect_shape(raw: &Value) -> Result<InputShape<'_>> {
    let obj = match raw {
        Value::Array(items) => return Ok(InputShape::List(items)),
        Value::Object(obj) => obj,
        other => {
            return Err(PipelineError::InputFormat(format!(
                "expected an array or object at top level, got {}",
                json_kind(other)
            )))
        }
    };

    if let Some(Value::Array(items)) = obj.get("templates") {
        return Ok(InputShape::TemplatesWrapper(items));
    }

    let named: Vec<(&str, &[Value])> = ["forms", "endpoints"]
        .iter()
        .filter_map(|&key| match obj.get(key) {
            Some(Value::Array(items)) => Some((key, items.as_slice())),
            _ => None,
        })
        .collect();
    if !named.is_empty() {
        return Ok(InputShape::FormsEndpoints(named));
    }

    let generic: Vec<(&str, &[Value])> = obj
        .iter()
        .filter_map(|(key, v)| match v {
            Value::Array(items) if items.first().is_some_and(looks_like_endpoint) => {
                Some((key.as_str(), items.as_slice()))
            }
            _ => None,
        })
        .collect();
    if !generic.is_empty() {
        return Ok(InputShape::EndpointArrays(generic));
    }

    if matches!(obj.get("params"), Some(Value::Array(_))) {
        return Ok(InputShape::SingleTemplate(obj));
    }

    Err(PipelineError::InputFormat(
        "expected a list of templates, an object with 'templates', 'forms' or 'endpoints', \
         or a single template with 'params'"
            .into(),
    ))
}

/// Detect the layout and build canonical templates.
pub fn normalize(raw: &Value) -> Result<NormalizedInput> {
    let shape = detect_shape(raw)?;
    let format = shape.format();

    let templates = match shape {
        InputShape::List(items) | InputShape::TemplatesWrapper(items) => items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| template_entry(item, &format!("template_{i}")))
            .collect(),
        InputShape::FormsEndpoints(seqs) | InputShape::EndpointArrays(seqs) => {
            let mut out = Vec::new();
            for (seq_name, items) in seqs {
                for item in items {
                    let fallback = format!("{seq_name}_{}", out.len());
                    if let Some(t) = template_entry(item, &fallback) {
                        out.push(t);
                    }
                }
            }
            out
        }
        InputShape::SingleTemplate(obj) => {
            vec![normalize_template(obj, "template_0", SINGLE_URL_KEYS)]
        }
    };

    tracing::debug!("Normalized {} template(s) from {} input", templates.len(), format);
    Ok(NormalizedInput { format, templates })
}

/// Parse JSON text and normalize it.
pub fn normalize_str(json: &str) -> Result<NormalizedInput> {
    let raw: Value = serde_json::from_str(json)?;
    normalize(&raw)
}

/// Read and normalize a template file.
pub fn load_templates(path: &std::path::Path) -> Result<NormalizedInput> {
    if !path.exists() {
        return Err(PipelineError::missing_input(path));
    }
    let content = std::fs::read_to_string(path)?;
    normalize_str(&content)
}

fn template_entry(item: &Value, fallback_id: &str) -> Option<Template> {
    match item.as_object() {
        Some(obj) => Some(normalize_template(obj, fallback_id, ENTRY_URL_KEYS)),
        None => {
            tracing::warn!("Skipping non-object template entry ({})", json_kind(item));
            None
        }
    }
}

/// URL key priority for entries inside a list, wrapper or forms/endpoints sequence
pub const ENTRY_URL_KEYS: &[&str] = &["action", "url", "template"];
/// URL key priority for a lone top-level template object
pub const SINGLE_URL_KEYS: &[&str] = &["url", "action", "template"];

/// Build a template from one template/form/endpoint object, taking the URL
/// from the first non-empty key in `url_keys`.
pub fn normalize_template(
    obj: &Map<String, Value>,
    fallback_id: &str,
    url_keys: &[&str],
) -> Template {
    let url = first_text(obj, url_keys).unwrap_or_default();
    let method = first_text(obj, &["method", "verb"])
        .unwrap_or_default()
        .to_uppercase();
    let params = ["params", "parameters"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_array))
        .map(|items| items.iter().map(normalize_param).collect())
        .unwrap_or_default();

    let id = first_text(obj, &["id"])
        .or_else(|| (!url.is_empty()).then(|| url.clone()))
        .unwrap_or_else(|| fallback_id.to_string());

    Template {
        id,
        template: url,
        method,
        params,
    }
}

/// Build a parameter from one parameter object. Non-objects become an
/// empty parameter.
pub fn normalize_param(value: &Value) -> Parameter {
    let Some(obj) = value.as_object() else {
        return Parameter::default();
    };

    let name = first_text(obj, &["name", "key", "param"]).unwrap_or_default();
    let original_value = ["original_value", "value", "default", "example"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(scalar_text))
        .unwrap_or_default();
    let options = ["options", "opts", "choices"].iter().find_map(|k| {
        obj.get(*k)
            .and_then(Value::as_array)
            .filter(|items| !items.is_empty())
            .map(|items| items.iter().filter_map(option_text).collect::<Vec<_>>())
    });
    let required = obj.get("required").is_some_and(coerce_bool);
    let explicit_type = first_text(obj, &["type"]);

    Parameter {
        name,
        original_value,
        options,
        required,
        explicit_type,
        ..Default::default()
    }
}

/// First key whose value renders to non-empty text.
fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| obj.get(*k).and_then(scalar_text).filter(|s| !s.is_empty()))
}

/// Text form of a JSON value; `None` for null.
fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Option entries may be plain scalars or `{"value": .., "label": ..}`.
fn option_text(v: &Value) -> Option<String> {
    match v {
        Value::Object(o) => o
            .get("value")
            .or_else(|| o.get("label"))
            .and_then(scalar_text),
        other => scalar_text(other),
    }
}

fn coerce_bool(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on" | "required"
        ),
        _ => false,
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
