pub mod database;
pub mod query;
