mod filters;
pub use filters::FilterOutput;
pub(crate) use filters::{criteria_to_query, FilterId, FilterManager};

mod kind;
pub(crate) use kind::InterestKind;
