use serde_json::{Map, Value};

/// Errors from parsing a raw patch payload.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("patch must be a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("patch is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("patch field `{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

/// A single mutation instruction targeting the world.
///
/// Transient: constructed from deserialized JSON, consumed by the applier,
/// never persisted itself. `id` names the target entity (or the spawn
/// subject); `kind` is the operation name carried as `type` on the wire;
/// `data` holds the operation-specific fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub id: Option<String>,
    pub kind: String,
    pub data: Map<String, Value>,
}

impl Patch {
    /// Strict parse: shape, presence, and primitive type of `id`, `type`,
    /// and `data` are all enforced before any mutation is attempted.
    pub fn parse(raw: &Value) -> Result<Self, PatchError> {
        let Some(obj) = raw.as_object() else {
            return Err(PatchError::NotAnObject(json_type_name(raw)));
        };

        let id = match obj.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                return Err(PatchError::WrongType {
                    field: "id",
                    expected: "a string",
                });
            }
            None => return Err(PatchError::MissingField("id")),
        };
        let kind = match obj.get("type") {
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                return Err(PatchError::WrongType {
                    field: "type",
                    expected: "a string",
                });
            }
            None => return Err(PatchError::MissingField("type")),
        };
        let data = match obj.get("data") {
            Some(Value::Object(m)) => m.clone(),
            Some(_) => {
                return Err(PatchError::WrongType {
                    field: "data",
                    expected: "an object",
                });
            }
            None => return Err(PatchError::MissingField("data")),
        };

        Ok(Self {
            id: Some(id),
            kind,
            data,
        })
    }

    /// Lenient parse: non-objects and entries without a string `type` are
    /// dropped (`None`); a missing `id` or `data` is tolerated.
    pub fn parse_lenient(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;
        let kind = obj.get("type")?.as_str()?.to_owned();
        let id = obj.get("id").and_then(Value::as_str).map(str::to_owned);
        let data = obj
            .get("data")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Some(Self { id, kind, data })
    }
}

/// Human-readable name for a JSON value's type, for shape errors.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
