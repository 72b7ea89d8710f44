//! Generated component data and the schema profile that shapes it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Which component fields a deployment asks the generator for.
///
/// Downstream consumers (install-script execution, import merging) depend on
/// field presence, so the profile travels with every session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentSchema {
    /// `install_script`, `imports`, `code` and `description`.
    #[default]
    Full,
    /// Only `code`.
    CodeOnly,
}

impl ComponentSchema {
    /// Field names the tool call must supply.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Full => &["install_script", "imports", "code", "description"],
            Self::CodeOnly => &["code"],
        }
    }

    /// Name of the function the model is forced to call.
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::Full => "ui_gen_function",
            Self::CodeOnly => "UiGenTool",
        }
    }
}

impl fmt::Display for ComponentSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::CodeOnly => write!(f, "code_only"),
        }
    }
}

impl FromStr for ComponentSchema {
    type Err = ComponentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "full" => Ok(Self::Full),
            "code_only" | "code" => Ok(Self::CodeOnly),
            other => Err(ComponentError::UnknownSchema(other.to_string())),
        }
    }
}

/// Errors raised while reading tool-call arguments into a component.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComponentError {
    /// Tool arguments were not a JSON object.
    #[error("tool arguments are not an object")]
    NotAnObject,

    /// A field required by the schema is absent or not a string.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// The code field is present but blank.
    #[error("generated code is empty")]
    EmptyCode,

    /// Unrecognised schema profile name.
    #[error("unknown component schema: {0}")]
    UnknownSchema(String),
}

/// A generated UI component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentData {
    /// Shell script installing the packages the component needs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_script: Option<String>,

    /// Import statements for the component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imports: Option<String>,

    /// Component source.
    pub code: String,

    /// Human-readable summary of the component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ComponentData {
    /// Create a code-only component.
    pub fn code_only(code: impl Into<String>) -> Self {
        Self {
            install_script: None,
            imports: None,
            code: code.into(),
            description: None,
        }
    }

    /// Create a component with every field populated.
    pub fn full(
        install_script: impl Into<String>,
        imports: impl Into<String>,
        code: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            install_script: Some(install_script.into()),
            imports: Some(imports.into()),
            code: code.into(),
            description: Some(description.into()),
        }
    }

    /// Read tool-call arguments according to `schema`.
    ///
    /// Fields outside the schema are ignored, so a code-only deployment never
    /// exposes a stray `imports` value the model volunteered.
    pub fn from_tool_args(schema: ComponentSchema, args: &Value) -> Result<Self, ComponentError> {
        let obj = args.as_object().ok_or(ComponentError::NotAnObject)?;
        let field = |name: &str| -> Result<String, ComponentError> {
            obj.get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ComponentError::MissingField(name.to_string()))
        };

        let code = field("code")?;
        if code.trim().is_empty() {
            return Err(ComponentError::EmptyCode);
        }

        match schema {
            ComponentSchema::CodeOnly => Ok(Self::code_only(code)),
            ComponentSchema::Full => Ok(Self::full(
                field("install_script")?,
                field("imports")?,
                code,
                field("description")?,
            )),
        }
    }

    /// Whether this component carries exactly the fields of `schema`.
    pub fn conforms_to(&self, schema: ComponentSchema) -> bool {
        let extras = [&self.install_script, &self.imports, &self.description];
        match schema {
            ComponentSchema::Full => extras.iter().all(|f| f.is_some()),
            ComponentSchema::CodeOnly => extras.iter().all(|f| f.is_none()),
        }
    }

    /// Present fields as a name → value map.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        if let Some(ref v) = self.install_script {
            map.insert("install_script".to_string(), v.clone());
        }
        if let Some(ref v) = self.imports {
            map.insert("imports".to_string(), v.clone());
        }
        map.insert("code".to_string(), self.code.clone());
        if let Some(ref v) = self.description {
            map.insert("description".to_string(), v.clone());
        }
        map
    }
}
