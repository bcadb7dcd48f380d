mod schema;
mod seen;
mod types;

pub use schema::Database;
pub use seen::SeenSet;
pub use types::DatabaseError;
