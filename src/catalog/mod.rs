pub mod import;
pub mod store;
pub mod types;
