// Pipeline processing: unification, parsing, filtering, reconciliation and aggregation

pub mod conflation;
pub mod filter;
pub mod metadata;
pub mod parse;
pub mod ratings;
pub mod schema;
pub mod unify;
pub mod wiki;

pub use conflation::MergedRow;
pub use ratings::RatingCounts;
pub use wiki::{build_wiki_table, WikiOptions, WikiTable};
