use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Cannot {action} a show that is {from}")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}
