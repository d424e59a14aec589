//! Scope resolution: the condition every proxied query is pinned to.

use tether_core::{id_value, AssociationError, Conditions, Document, TetherResult};

/// `{foreign_key: owner.id}`. Fails when the owner has no id.
pub fn scoped_conditions(
    foreign_key: &str,
    owner_model: &str,
    owner: &Document,
) -> TetherResult<Conditions> {
    let id = owner.id().ok_or_else(|| AssociationError::OwnerNotIdentified {
        owner_model: owner_model.to_string(),
    })?;
    let mut scope = Conditions::new();
    scope.insert(foreign_key.to_string(), id_value(id));
    Ok(scope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::{Attributes, TetherError};

    #[test]
    fn test_scope_is_single_entry() {
        let owner = Document::new(Attributes::new());
        let scope = scoped_conditions("room_id", "Room", &owner).unwrap();
        assert_eq!(scope.len(), 1);
        assert_eq!(scope.get("room_id"), Some(&id_value(owner.id().unwrap())));
    }

    #[test]
    fn test_scope_requires_owner_id() {
        let owner = Document::unidentified(Attributes::new());
        let err = scoped_conditions("room_id", "Room", &owner).unwrap_err();
        assert!(matches!(
            err,
            TetherError::Association(AssociationError::OwnerNotIdentified { .. })
        ));
    }
}
