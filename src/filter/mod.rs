pub mod error;
pub mod filter;
pub mod params;
pub mod search;
pub mod types;

pub use error::FilterError;
pub use filter::Filter;
pub use params::SubmissionQuery;
pub use types::*;
