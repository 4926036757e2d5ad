pub mod form;
pub mod migrate;
pub mod user;
