//! Status ids mapping to the `show_statuses` lookup table.
//!
//! The discriminants of [`ShowStatus`] match the seed order (1-based) of the
//! lookup table.

pub use gigboard_core::review::ShowStatus;

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

/// Decode a `status_id` column, failing on ids outside the seed data.
pub fn decode_status(id: StatusId) -> Result<ShowStatus, sqlx::Error> {
    ShowStatus::from_id(id)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown show status id {id}").into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_status_ids_match_seed_data() {
        assert_eq!(ShowStatus::Pending.id(), 1);
        assert_eq!(ShowStatus::Approved.id(), 2);
        assert_eq!(ShowStatus::Rejected.id(), 3);
        assert_eq!(ShowStatus::Private.id(), 4);
    }

    #[test]
    fn unknown_status_id_is_decode_error() {
        assert!(matches!(decode_status(9), Err(sqlx::Error::Decode(_))));
        assert_eq!(decode_status(3).unwrap(), ShowStatus::Rejected);
    }
}
