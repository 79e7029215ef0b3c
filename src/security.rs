//! Security helpers for building safe predicates and bounding caller input.

mod patterns;

pub use patterns::{
    contains_pattern, escape_clause, escape_like, require_search_text, LIKE_ESCAPE_CHAR,
};
