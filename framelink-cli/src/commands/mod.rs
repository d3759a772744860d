pub mod query;
pub mod replay;
