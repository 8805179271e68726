pub mod pagination;
pub mod query;
pub mod schema;
pub mod slug;
pub mod store;

mod connection;

pub use connection::{connect, MIGRATOR};
pub use sqlx;
pub use store::{ContentStore, MemoryStore, PgStore};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(thiserror::Error, Debug)]
pub enum DatabaseError {
    #[error("row not found")]
    RowNotFound,
    #[error("unique constraint violated")]
    Conflict,
    #[error("referenced row does not exist")]
    InvalidReference,
    #[error("refusing to modify rows without a filter")]
    MissingFilter,
    #[error("sql error: {0}")]
    Other(sqlx::Error),
}

pub trait SqlxResultExt<T> {
    fn map_database_error(self) -> Result<T, DatabaseError>;
}

impl<T> SqlxResultExt<T> for Result<T, sqlx::Error> {
    fn map_database_error(self) -> Result<T, DatabaseError> {
        self.map_err(|error| match error {
            sqlx::Error::RowNotFound => DatabaseError::RowNotFound,
            sqlx::Error::Database(database_error) => {
                let code = database_error.code().map(|code| code.into_owned());
                match code.as_deref() {
                    Some(UNIQUE_VIOLATION) => DatabaseError::Conflict,
                    Some(FOREIGN_KEY_VIOLATION) => DatabaseError::InvalidReference,
                    _ => DatabaseError::Other(sqlx::Error::Database(database_error)),
                }
            }
            other => DatabaseError::Other(other),
        })
    }
}
