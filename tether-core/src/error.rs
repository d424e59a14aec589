//! Error types for TETHER operations

use crate::DocumentId;
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Document not found in {collection} with id {id}")]
    NotFound { collection: String, id: DocumentId },

    #[error("Insert failed for {collection}: {reason}")]
    InsertFailed { collection: String, reason: String },

    #[error("Update failed for {collection}: {reason}")]
    UpdateFailed { collection: String, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Query construction and lookup errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryError {
    /// Raised by strict lookups (id finders, bang dynamic finders) when
    /// nothing matched. `conditions` is the searched mapping as JSON.
    #[error("Couldn't find Document with {conditions} in collection named {collection}")]
    DocumentNotFound {
        collection: String,
        conditions: serde_json::Value,
    },

    #[error("Invalid order clause '{clause}': {reason}")]
    InvalidOrder { clause: String, reason: String },

    #[error("Invalid page request: {reason}")]
    InvalidPage { reason: String },
}

/// Association proxy errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssociationError {
    /// The owner has no id yet, so no scope can be computed for it.
    #[error("Owner {owner_model} has no id; save it before scoping children")]
    OwnerNotIdentified { owner_model: String },

    /// Fallback for method names that are neither part of the fixed
    /// collection API nor a recognized dynamic finder.
    #[error("undefined method '{name}' for association proxy")]
    UndefinedMethod { name: String },
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Master error type for all TETHER errors.
#[derive(Debug, Error)]
pub enum TetherError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Association error: {0}")]
    Association(#[from] AssociationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl TetherError {
    /// True for the strict not-found failure raised by id lookups and
    /// bang finders.
    pub fn is_document_not_found(&self) -> bool {
        matches!(self, TetherError::Query(QueryError::DocumentNotFound { .. }))
    }
}

/// Result type alias for TETHER operations.
pub type TetherResult<T> = Result<T, TetherError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            collection: "messages".to_string(),
            id: Uuid::nil(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Document not found"));
        assert!(msg.contains("messages"));
        assert!(msg.contains("00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn test_document_not_found_names_conditions_and_collection() {
        let err = QueryError::DocumentNotFound {
            collection: "pets".to_string(),
            conditions: json!({"name": "Ann", "age": 5}),
        };
        let msg = format!("{}", err);
        assert!(msg.starts_with("Couldn't find Document with"));
        assert!(msg.contains("\"name\":\"Ann\""));
        assert!(msg.contains("\"age\":5"));
        assert!(msg.contains("collection named pets"));
    }

    #[test]
    fn test_association_error_display_owner_not_identified() {
        let err = AssociationError::OwnerNotIdentified {
            owner_model: "Room".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Room"));
        assert!(msg.contains("no id"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "foreign_key".to_string(),
            value: "9bad".to_string(),
            reason: "must be an identifier".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("foreign_key"));
        assert!(msg.contains("9bad"));
        assert!(msg.contains("must be an identifier"));
    }

    #[test]
    fn test_tether_error_from_variants() {
        let storage = TetherError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, TetherError::Storage(_)));

        let query = TetherError::from(QueryError::InvalidPage {
            reason: "page must be >= 1".to_string(),
        });
        assert!(matches!(query, TetherError::Query(_)));

        let assoc = TetherError::from(AssociationError::UndefinedMethod {
            name: "frobnicate".to_string(),
        });
        assert!(matches!(assoc, TetherError::Association(_)));

        let config = TetherError::from(ConfigError::MissingRequired {
            field: "target".to_string(),
        });
        assert!(matches!(config, TetherError::Config(_)));
    }

    #[test]
    fn test_is_document_not_found() {
        let err = TetherError::from(QueryError::DocumentNotFound {
            collection: "pets".to_string(),
            conditions: json!({}),
        });
        assert!(err.is_document_not_found());
        assert!(!TetherError::from(StorageError::LockPoisoned).is_document_not_found());
    }
}
