//! Index schema types.
//!
//! An index is a name plus an ordered list of field descriptors. The tool
//! copies the descriptors attribute-for-attribute; anything else the service
//! returns alongside them (analyzers, scoring profiles, suggesters) is
//! dropped on deserialization and therefore not recreated.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A search index definition: name plus ordered field list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Index name.
    pub name: String,
    /// Field descriptors, in service order.
    pub fields: Vec<Field>,
}

impl IndexDefinition {
    /// Returns the key field, if the schema declares one.
    #[must_use]
    pub fn key_field(&self) -> Option<&Field> {
        self.fields.iter().find(|field| field.key)
    }

    /// Names of the fields that are returned in search results.
    #[must_use]
    pub fn retrievable_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|field| field.retrievable)
            .map(|field| field.name.clone())
            .collect()
    }
}

/// One field descriptor: data type plus query capability flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name.
    pub name: String,
    /// Data type, an EDM type name on the wire.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether this field is the document key.
    #[serde(default)]
    pub key: bool,
    /// Whether the field is full-text searchable.
    #[serde(default)]
    pub searchable: bool,
    /// Whether the field can be used in filter expressions.
    #[serde(default)]
    pub filterable: bool,
    /// Whether the field can be used to sort results.
    #[serde(default)]
    pub sortable: bool,
    /// Whether the field can be faceted.
    #[serde(default)]
    pub facetable: bool,
    /// Whether the field is returned in search results. The service
    /// defaults this to true when omitted.
    #[serde(default = "default_true")]
    pub retrievable: bool,
}

fn default_true() -> bool {
    true
}

impl Field {
    /// Type and enabled capability flags, e.g. `Edm.String [key|searchable]`.
    fn descriptor(&self) -> String {
        let mut flags = Vec::new();
        for (enabled, label) in [
            (self.key, "key"),
            (self.searchable, "searchable"),
            (self.filterable, "filterable"),
            (self.sortable, "sortable"),
            (self.facetable, "facetable"),
            (!self.retrievable, "hidden"),
        ] {
            if enabled {
                flags.push(label);
            }
        }
        if flags.is_empty() {
            self.field_type.to_string()
        } else {
            format!("{} [{}]", self.field_type, flags.join("|"))
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.descriptor())
    }
}

/// Field data types, plus a passthrough for anything this tool predates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    /// `Edm.String`
    String,
    /// `Edm.Int32`
    Int32,
    /// `Edm.Int64`
    Int64,
    /// `Edm.Double`
    Double,
    /// `Edm.Boolean`
    Boolean,
    /// `Edm.DateTimeOffset`
    DateTimeOffset,
    /// `Edm.GeographyPoint`
    GeographyPoint,
    /// `Collection(...)` of an inner type.
    Collection(Box<FieldType>),
    /// Any type name this tool does not model, copied through verbatim.
    Other(String),
}

impl FieldType {
    fn parse(name: &str) -> Self {
        match name {
            "Edm.String" => Self::String,
            "Edm.Int32" => Self::Int32,
            "Edm.Int64" => Self::Int64,
            "Edm.Double" => Self::Double,
            "Edm.Boolean" => Self::Boolean,
            "Edm.DateTimeOffset" => Self::DateTimeOffset,
            "Edm.GeographyPoint" => Self::GeographyPoint,
            _ => {
                if let Some(inner) = name
                    .strip_prefix("Collection(")
                    .and_then(|rest| rest.strip_suffix(')'))
                {
                    Self::Collection(Box::new(Self::parse(inner)))
                } else {
                    Self::Other(name.to_string())
                }
            }
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "Edm.String"),
            Self::Int32 => write!(f, "Edm.Int32"),
            Self::Int64 => write!(f, "Edm.Int64"),
            Self::Double => write!(f, "Edm.Double"),
            Self::Boolean => write!(f, "Edm.Boolean"),
            Self::DateTimeOffset => write!(f, "Edm.DateTimeOffset"),
            Self::GeographyPoint => write!(f, "Edm.GeographyPoint"),
            Self::Collection(inner) => write!(f, "Collection({inner})"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.to_string()
    }
}

/// Field-level differences between an existing index and its replacement:
/// one line per added (`+`), removed (`-`), or changed (`~`) field.
#[must_use]
pub fn diff_fields(current: &[Field], planned: &[Field]) -> Vec<String> {
    let mut changes = Vec::new();
    for field in planned {
        match current.iter().find(|existing| existing.name == field.name) {
            None => changes.push(format!("+ {}: {}", field.name, field.descriptor())),
            Some(existing) if existing != field => changes.push(format!(
                "~ {}: {} -> {}",
                field.name,
                existing.descriptor(),
                field.descriptor()
            )),
            Some(_) => {}
        }
    }
    for field in current {
        if !planned.iter().any(|planned| planned.name == field.name) {
            changes.push(format!("- {}", field.name));
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, field_type: FieldType) -> Field {
        Field {
            name: name.to_string(),
            field_type,
            key: false,
            searchable: false,
            filterable: false,
            sortable: false,
            facetable: false,
            retrievable: true,
        }
    }

    #[test]
    fn test_field_type_parses_wire_names() {
        assert_eq!(FieldType::from("Edm.String".to_string()), FieldType::String);
        assert_eq!(FieldType::from("Edm.Int64".to_string()), FieldType::Int64);
        assert_eq!(
            FieldType::from("Collection(Edm.String)".to_string()),
            FieldType::Collection(Box::new(FieldType::String))
        );
    }

    #[test]
    fn test_field_type_nested_collection() {
        assert_eq!(
            FieldType::from("Collection(Collection(Edm.Int32))".to_string()),
            FieldType::Collection(Box::new(FieldType::Collection(Box::new(
                FieldType::Int32
            ))))
        );
    }

    #[test]
    fn test_unknown_field_type_passes_through() {
        let parsed = FieldType::from("Edm.ComplexType".to_string());
        assert_eq!(parsed, FieldType::Other("Edm.ComplexType".to_string()));
        assert_eq!(parsed.to_string(), "Edm.ComplexType");
    }

    #[test]
    fn test_field_type_display_round_trip() {
        for name in [
            "Edm.String",
            "Edm.Int32",
            "Edm.Double",
            "Edm.Boolean",
            "Edm.DateTimeOffset",
            "Edm.GeographyPoint",
            "Collection(Edm.Double)",
        ] {
            assert_eq!(FieldType::from(name.to_string()).to_string(), name);
        }
    }

    #[test]
    fn test_field_deserializes_wire_shape() {
        let json = r#"{"name": "title", "type": "Edm.String", "searchable": true}"#;
        let field: Field = serde_json::from_str(json).unwrap();
        assert_eq!(field.name, "title");
        assert_eq!(field.field_type, FieldType::String);
        assert!(field.searchable);
        assert!(!field.key);
        assert!(field.retrievable, "retrievable defaults to true");
    }

    #[test]
    fn test_field_serializes_type_under_wire_name() {
        let field = field("price", FieldType::Double);
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "Edm.Double");
        assert_eq!(json["retrievable"], true);
    }

    #[test]
    fn test_index_definition_ignores_extra_properties() {
        let json = r#"{
            "@odata.context": "https://example.search.windows.net/$metadata",
            "name": "products",
            "fields": [{"name": "id", "type": "Edm.String", "key": true}],
            "scoringProfiles": [],
            "suggesters": []
        }"#;
        let index: IndexDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(index.name, "products");
        assert_eq!(index.fields.len(), 1);
        assert_eq!(index.key_field().unwrap().name, "id");
    }

    #[test]
    fn test_retrievable_fields_skips_hidden() {
        let mut hidden = field("internal", FieldType::String);
        hidden.retrievable = false;
        let index = IndexDefinition {
            name: "products".to_string(),
            fields: vec![field("id", FieldType::String), hidden],
        };
        assert_eq!(index.retrievable_fields(), vec!["id"]);
    }

    #[test]
    fn test_field_display_lists_flags() {
        let mut key = field("id", FieldType::String);
        key.key = true;
        key.searchable = true;
        assert_eq!(key.to_string(), "id: Edm.String [key|searchable]");
        assert_eq!(
            field("price", FieldType::Double).to_string(),
            "price: Edm.Double"
        );
    }

    #[test]
    fn test_diff_reports_added_removed_and_changed() {
        let current = vec![
            field("id", FieldType::String),
            field("old", FieldType::Int32),
            field("price", FieldType::Double),
        ];
        let mut changed = field("price", FieldType::Double);
        changed.sortable = true;
        let planned = vec![
            field("id", FieldType::String),
            changed,
            field("tags", FieldType::Collection(Box::new(FieldType::String))),
        ];

        let changes = diff_fields(&current, &planned);
        assert_eq!(
            changes,
            vec![
                "~ price: Edm.Double -> Edm.Double [sortable]",
                "+ tags: Collection(Edm.String)",
                "- old",
            ]
        );
    }

    #[test]
    fn test_diff_of_identical_schemas_is_empty() {
        let fields = vec![field("id", FieldType::String)];
        assert!(diff_fields(&fields, &fields).is_empty());
    }
}
