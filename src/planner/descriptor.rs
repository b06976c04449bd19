use serde::{Deserialize, Serialize};

/// Which columns a select projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnSelection {
    /// `"*"` on the wire.
    All(Wildcard),
    Named(Vec<String>),
}

/// Unit marker that (de)serializes as the string `"*"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wildcard;

impl Serialize for Wildcard {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("*")
    }
}

impl<'de> Deserialize<'de> for Wildcard {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == "*" {
            Ok(Wildcard)
        } else {
            Err(serde::de::Error::custom(format!("expected \"*\", got {raw:?}")))
        }
    }
}

impl ColumnSelection {
    pub fn all() -> Self {
        ColumnSelection::All(Wildcard)
    }

    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnSelection::Named(names.into_iter().map(Into::into).collect())
    }
}

/// `column = 'literal'`, the only filter shape supported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EqualityPredicate {
    pub column: String,
    /// Literal with its SQL quoting already removed.
    pub literal: String,
}

impl EqualityPredicate {
    pub fn new(column: impl Into<String>, literal: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            literal: literal.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryMode {
    Count,
    Select,
}

/// Normalized query request handed to the query engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub table: String,
    pub columns: ColumnSelection,
    #[serde(default)]
    pub predicate: Option<EqualityPredicate>,
    pub mode: QueryMode,
}

impl QueryDescriptor {
    pub fn count(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: ColumnSelection::all(),
            predicate: None,
            mode: QueryMode::Count,
        }
    }

    pub fn select(table: impl Into<String>, columns: ColumnSelection) -> Self {
        Self {
            table: table.into(),
            columns,
            predicate: None,
            mode: QueryMode::Select,
        }
    }

    pub fn with_predicate(mut self, predicate: EqualityPredicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
