use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name shown for products whose document carries no name
pub const UNKNOWN_PRODUCT_NAME: &str = "Unknown Product";

const ID_FIELDS: &[&str] = &["id", "product_id", "_id"];
const NAME_FIELDS: &[&str] = &["name", "title", "product_name"];
const SKU_FIELDS: &[&str] = &["sku", "product_sku"];
const IMAGE_FIELD: &str = "image_url";

/// A product as shown in the simulator, normalized from a search document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ProductRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            sku: None,
            image_url: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    /// Display name, falling back when the name is absent or empty
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => UNKNOWN_PRODUCT_NAME,
        }
    }

    /// The SKU if it can act as an identity key (present and non-empty)
    pub fn usable_sku(&self) -> Option<&str> {
        self.sku.as_deref().filter(|sku| !sku.is_empty())
    }
}

/// Outcome of parsing one raw search document
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedDocument {
    Valid(ProductRecord),
    Malformed { reason: String, document: Value },
}

impl ParsedDocument {
    /// Parses a loosely-typed search document
    ///
    /// Each normalized field takes the first candidate key that is present
    /// with a non-null scalar. Numbers and booleans are stringified; a present
    /// empty string stays `Some("")`. The identifier is the exception: empty
    /// candidates are skipped, and a document with none left is malformed.
    pub fn parse(document: Value) -> Self {
        match normalize(&document) {
            Ok(record) => ParsedDocument::Valid(record),
            Err(reason) => ParsedDocument::Malformed { reason, document },
        }
    }
}

fn normalize(document: &Value) -> Result<ProductRecord, String> {
    let fields = document
        .as_object()
        .ok_or_else(|| "document is not an object".to_string())?;

    let id = first_non_empty(fields, ID_FIELDS)
        .ok_or_else(|| format!("none of {:?} holds a non-empty value", ID_FIELDS))?;

    Ok(ProductRecord {
        id,
        name: first_present(fields, NAME_FIELDS),
        sku: first_present(fields, SKU_FIELDS),
        image_url: first_present(fields, &[IMAGE_FIELD]).filter(|url| !url.is_empty()),
    })
}

fn first_present(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .find_map(scalar_to_string)
}

fn first_non_empty(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .filter_map(scalar_to_string)
        .find(|value| !value.is_empty())
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
