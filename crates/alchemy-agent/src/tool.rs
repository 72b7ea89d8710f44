//! Tool definitions bound to structured gateway calls.

use alchemy_models::ComponentSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Definition of a function the model can be forced to call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Function name.
    pub name: String,
    /// What the function does.
    pub description: String,
    /// JSON Schema of the arguments.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a tool definition.
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// The component generation tool for `schema`.
    ///
    /// Every field of the schema is a required string.
    pub fn component(schema: ComponentSchema) -> Self {
        let mut properties = Map::new();
        for field in schema.required_fields() {
            properties.insert(
                (*field).to_string(),
                json!({
                    "type": "string",
                    "description": field_description(field),
                }),
            );
        }

        Self::new(
            schema.tool_name(),
            "Return a generated UI component as structured data",
            json!({
                "type": "object",
                "properties": properties,
                "required": schema.required_fields(),
            }),
        )
    }
}

fn field_description(field: &str) -> &'static str {
    match field {
        "install_script" => "The script to install the required packages",
        "imports" => "The imports required for the component",
        "code" => "The code for the component",
        "description" => "The description of the component",
        _ => "",
    }
}
