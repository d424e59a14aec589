//! Association configuration.
//!
//! Associations are declared once, either in code through
//! [`AssociationOptions`] or in a TOML file loaded by [`AssociationConfig`].

use crate::naming::{default_foreign_key, is_attribute_name};
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options of a one-to-many association.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssociationOptions {
    /// Explicit foreign-key attribute on the children. When absent the key
    /// is derived from the owner's type name.
    pub foreign_key: Option<String>,
}

impl AssociationOptions {
    pub fn with_foreign_key(foreign_key: impl Into<String>) -> Self {
        Self {
            foreign_key: Some(foreign_key.into()),
        }
    }

    /// Validate the options.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(key) = &self.foreign_key {
            if !is_attribute_name(key) {
                return Err(ConfigError::InvalidValue {
                    field: "foreign_key".to_string(),
                    value: key.clone(),
                    reason: "must be an identifier ([_a-zA-Z] followed by word characters)"
                        .to_string(),
                });
            }
        }
        Ok(())
    }

    /// The foreign key in effect for children of `owner_type`.
    pub fn resolve_foreign_key(&self, owner_type: &str) -> String {
        self.foreign_key
            .clone()
            .unwrap_or_else(|| default_foreign_key(owner_type))
    }
}

/// One `[[many]]` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManyDeclaration {
    /// Owner model type name, e.g. `Room` or `Blog::Post`.
    pub owner: String,
    /// Association name on the owner, e.g. `messages`.
    pub name: String,
    /// Child model type name.
    pub target: String,
    pub foreign_key: Option<String>,
}

impl ManyDeclaration {
    pub fn options(&self) -> AssociationOptions {
        AssociationOptions {
            foreign_key: self.foreign_key.clone(),
        }
    }
}

/// A file of association declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssociationConfig {
    #[serde(default)]
    pub many: Vec<ManyDeclaration>,
}

impl AssociationConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: AssociationConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, decl) in self.many.iter().enumerate() {
            for (field, value) in [
                ("owner", &decl.owner),
                ("name", &decl.name),
                ("target", &decl.target),
            ] {
                if value.trim().is_empty() {
                    return Err(ConfigError::MissingRequired {
                        field: format!("many[{}].{}", index, field),
                    });
                }
            }
            decl.options().validate()?;
        }

        for (index, decl) in self.many.iter().enumerate() {
            let duplicate = self.many[..index]
                .iter()
                .any(|other| other.owner == decl.owner && other.name == decl.name);
            if duplicate {
                return Err(ConfigError::InvalidValue {
                    field: format!("many[{}].name", index),
                    value: decl.name.clone(),
                    reason: format!("declared twice on {}", decl.owner),
                });
            }
        }
        Ok(())
    }

    /// Look up the declaration of `owner.name`.
    pub fn find(&self, owner: &str, name: &str) -> Option<&ManyDeclaration> {
        self.many
            .iter()
            .find(|decl| decl.owner == owner && decl.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[[many]]
owner = "Room"
name = "messages"
target = "Message"

[[many]]
owner = "Blog::Post"
name = "comments"
target = "Comment"
foreign_key = "article_id"
"#;

    #[test]
    fn test_resolve_foreign_key_prefers_override() {
        let options = AssociationOptions::with_foreign_key("article_id");
        assert_eq!(options.resolve_foreign_key("Blog::Post"), "article_id");
        assert_eq!(
            AssociationOptions::default().resolve_foreign_key("Blog::Post"),
            "blog_post_id"
        );
    }

    #[test]
    fn test_validate_rejects_bad_foreign_key() {
        let options = AssociationOptions::with_foreign_key("room id");
        assert!(matches!(
            options.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_parse_sample_config() {
        let config = AssociationConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.many.len(), 2);
        let comments = config.find("Blog::Post", "comments").unwrap();
        assert_eq!(comments.options().resolve_foreign_key(&comments.owner), "article_id");
        let messages = config.find("Room", "messages").unwrap();
        assert_eq!(messages.options().resolve_foreign_key(&messages.owner), "room_id");
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = AssociationConfig::from_toml_str(
            "[[many]]\nowner = \"Room\"\nname = \"messages\"\ntarget = \"Message\"\ndependent = \"destroy\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_duplicate_declaration_rejected() {
        let source = format!(
            "{}\n[[many]]\nowner = \"Room\"\nname = \"messages\"\ntarget = \"Note\"\n",
            SAMPLE
        );
        assert!(matches!(
            AssociationConfig::from_toml_str(&source),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_empty_owner_rejected() {
        let err = AssociationConfig::from_toml_str(
            "[[many]]\nowner = \" \"\nname = \"messages\"\ntarget = \"Message\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { .. }));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = AssociationConfig::from_path(file.path()).unwrap();
        assert_eq!(config.many.len(), 2);
    }
}
