use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Typed reference to another entity, stored as a (kind, id) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    Job(Uuid),
    User(Uuid),
    Application(Uuid),
    Payment(Uuid),
}

impl EntityRef {
    pub fn kind(&self) -> &'static str {
        match self {
            EntityRef::Job(_) => "job",
            EntityRef::User(_) => "user",
            EntityRef::Application(_) => "application",
            EntityRef::Payment(_) => "payment",
        }
    }

    pub fn id(&self) -> Uuid {
        match *self {
            EntityRef::Job(id)
            | EntityRef::User(id)
            | EntityRef::Application(id)
            | EntityRef::Payment(id) => id,
        }
    }

    pub fn from_parts(kind: &str, id: Uuid) -> Result<Self> {
        match kind {
            "job" => Ok(EntityRef::Job(id)),
            "user" => Ok(EntityRef::User(id)),
            "application" => Ok(EntityRef::Application(id)),
            "payment" => Ok(EntityRef::Payment(id)),
            other => Err(Error::Internal(format!("Unknown entity kind: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_kind_and_id() {
        let id = Uuid::new_v4();
        let value = serde_json::to_value(EntityRef::Payment(id)).unwrap();
        assert_eq!(value["kind"], "payment");
        assert_eq!(value["id"], id.to_string());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(EntityRef::from_parts("invoice", Uuid::new_v4()).is_err());
        let id = Uuid::new_v4();
        assert_eq!(EntityRef::from_parts("job", id).unwrap(), EntityRef::Job(id));
    }
}
