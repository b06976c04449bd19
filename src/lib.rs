pub mod executor;
pub mod planner;
pub mod storage;
pub mod types;
pub mod utils;

pub use executor::query::{EmptyReason, QueryEngine, QueryOutput, ResultRow, SelectOutcome};
pub use planner::descriptor::{ColumnSelection, EqualityPredicate, QueryDescriptor, QueryMode};
pub use types::error::{DatabaseError, Result};
