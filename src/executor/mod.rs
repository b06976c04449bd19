pub mod predicate;
pub mod query;
