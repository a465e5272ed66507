//! YAML schema describing the configuration to generate.
//!
//! A schema file declares template options, custom type definitions and one or
//! more groups of fields:
//!
//! ```yaml
//! options:
//!   go_package: config
//! types:
//!   - name: LogLevel
//!     type: zerolog.Level
//!     import: github.com/rs/zerolog
//! groups:
//!   - name: app
//!     prefix: APP_
//!     fields:
//!       - name: port
//!         type: int
//!         default: "8080"
//!       - name: log_level
//!         type: LogLevel
//! ```
//!
//! [`Config::load`] only parses. Callers apply [`Config::filter_types`] and
//! [`Config::filter_groups`] and then [`Config::validate`], in that order, so
//! that ignored entries cannot fail validation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Structured failure of loading or validating a schema.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema file could not be read.
    #[error("failed to read schema file {path}: {source}")]
    Read {
        /// Path of the schema file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The schema file is not valid YAML for this shape.
    #[error("failed to parse schema file {path}: {source}")]
    Parse {
        /// Path of the schema file
        path: PathBuf,
        /// Underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// The schema has no groups left.
    #[error("at least one group is required")]
    NoGroups,

    /// A group has an empty name.
    #[error("invalid group {index}: group name is required")]
    MissingGroupName {
        /// Position of the group
        index: usize,
    },

    /// A group has no fields.
    #[error("invalid group {index}: at least one field is required in group \"{group}\"")]
    EmptyGroup {
        /// Position of the group
        index: usize,
        /// Name of the group
        group: String,
    },

    /// Two fields of one group share a name.
    #[error("invalid group {index}: duplicate field name \"{field}\" in group \"{group}\"")]
    DuplicateField {
        /// Position of the group
        index: usize,
        /// Name of the group
        group: String,
        /// The repeated field name
        field: String,
    },

    /// A field has an empty name.
    #[error("invalid field {field_index} in group \"{group}\": field name is required")]
    MissingFieldName {
        /// Name of the group
        group: String,
        /// Position of the field within the group
        field_index: usize,
    },

    /// A field has an empty type.
    #[error("invalid field {field_index} in group \"{group}\": field type is required for field \"{field}\"")]
    MissingFieldType {
        /// Name of the group
        group: String,
        /// Position of the field within the group
        field_index: usize,
        /// Name of the field
        field: String,
    },

    /// A type definition has an empty name.
    #[error("invalid type {index}: type name is required")]
    MissingTypeName {
        /// Position of the type definition
        index: usize,
    },

    /// A type definition has an empty definition.
    #[error("invalid type {index}: type definition is required for type \"{name}\"")]
    MissingTypeDefinition {
        /// Position of the type definition
        index: usize,
        /// Name of the type
        name: String,
    },
}

/// Root of a schema file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Template-specific options such as a target package name.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    /// Custom types that fields may reference.
    #[serde(default)]
    pub types: Vec<TypeDefinition>,
    /// Groups of fields; at least one is required.
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

/// A named set of related fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Prefix of the environment variables of this group.
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// One configuration value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// Built-in type or the name of a [`TypeDefinition`].
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

/// A custom type usable by fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Import path the generated code needs for this type.
    #[serde(default)]
    pub import: String,
    #[serde(default)]
    pub description: String,
    /// Documented possible values.
    #[serde(default)]
    pub values: Vec<String>,
}

impl Config {
    /// Read and parse a schema file. Does not validate.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let content = std::fs::read_to_string(&path).map_err(|source| SchemaError::Read {
            path: path.clone(),
            source,
        })?;

        let mut config = Self::parse(&content).map_err(|source| SchemaError::Parse {
            path: path.clone(),
            source,
        })?;
        config.path = Some(path);
        Ok(config)
    }

    /// Parse schema YAML from a string.
    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Absolute path the schema was loaded from, if it came from a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Drop type definitions whose names are listed.
    pub fn filter_types(&mut self, ignored: &[String]) {
        if ignored.is_empty() {
            return;
        }
        let ignored: HashSet<&str> = ignored.iter().map(String::as_str).collect();
        self.types.retain(|t| !ignored.contains(t.name.as_str()));
    }

    /// Drop groups whose names are listed.
    pub fn filter_groups(&mut self, ignored: &[String]) {
        if ignored.is_empty() {
            return;
        }
        let ignored: HashSet<&str> = ignored.iter().map(String::as_str).collect();
        self.groups.retain(|g| !ignored.contains(g.name.as_str()));
    }

    /// Check the structural rules, reporting the first violation.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.groups.is_empty() {
            return Err(SchemaError::NoGroups);
        }

        for (index, group) in self.groups.iter().enumerate() {
            group.validate(index)?;
        }

        for (index, definition) in self.types.iter().enumerate() {
            definition.validate(index)?;
        }

        Ok(())
    }

    /// Look up a type definition by name.
    #[must_use]
    pub fn find_type(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Look up a top-level option.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Sorted, de-duplicated imports of the custom types fields actually use.
    #[must_use]
    pub fn imports(&self) -> Vec<String> {
        let used: BTreeSet<&str> = self
            .groups
            .iter()
            .flat_map(|group| &group.fields)
            .filter_map(|field| self.find_type(&field.kind))
            .map(|definition| definition.import.as_str())
            .filter(|import| !import.is_empty())
            .collect();

        used.into_iter().map(str::to_string).collect()
    }
}

impl Group {
    fn validate(&self, index: usize) -> Result<(), SchemaError> {
        if self.name.is_empty() {
            return Err(SchemaError::MissingGroupName {
                index,
            });
        }

        if self.fields.is_empty() {
            return Err(SchemaError::EmptyGroup {
                index,
                group: self.name.clone(),
            });
        }

        let mut seen = HashSet::with_capacity(self.fields.len());
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    index,
                    group: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }

        for (field_index, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(SchemaError::MissingFieldName {
                    group: self.name.clone(),
                    field_index,
                });
            }
            if field.kind.is_empty() {
                return Err(SchemaError::MissingFieldType {
                    group: self.name.clone(),
                    field_index,
                    field: field.name.clone(),
                });
            }
        }

        Ok(())
    }
}

impl TypeDefinition {
    /// Whether possible values are documented.
    #[must_use]
    pub fn has_values(&self) -> bool {
        !self.values.is_empty()
    }

    fn validate(&self, index: usize) -> Result<(), SchemaError> {
        if self.name.is_empty() {
            return Err(SchemaError::MissingTypeName {
                index,
            });
        }
        if self.kind.is_empty() {
            return Err(SchemaError::MissingTypeDefinition {
                index,
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}
