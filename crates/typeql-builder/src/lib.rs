//! TypeQL query builder.
//!
//! This crate turns an in-memory graph of things (entities and relationships
//! with attributes) into TypeQL `match`/`insert` statement text.
//!
//! # Overview
//!
//! A [`QueryBuilder`] owns every thing of one statement. Things are registered
//! under `match` (bound from existing data) or `insert` (created), and each
//! registration returns the new thing so attributes and role players can be
//! chained onto it. Relationships refer to their role players by variable;
//! those references are checked when the statement is compiled.
//!
//! # Example
//!
//! ```
//! use typeql_builder::{QueryBuilder, Thing};
//!
//! let mut builder = QueryBuilder::new();
//! let p1 = builder.match_entity("protein", "p1")?.has("protein_id", "Q1").variable().clone();
//! let p2 = builder.match_entity("protein", "p2")?.has("protein_id", "Q2").variable().clone();
//! builder
//!     .insert_relationship("protein_interaction", "pi")?
//!     .relates("associated_protein", &p1)
//!     .relates("associated_protein", &p2)
//!     .has_typed("id", 1, "double");
//!
//! let query = builder.compile_query()?;
//! assert!(query.starts_with("match $p1 isa protein"));
//! # Ok::<(), typeql_builder::QueryError>(())
//! ```

mod builder;
mod compile;
mod error;
mod thing;
mod value;

pub use builder::QueryBuilder;
pub use compile::Category;
pub use error::QueryError;
pub use thing::{Attributes, Entity, Relationship, Thing, ThingCore, Variable};
pub use value::{is_numeric_type, AttributeValue, DEFAULT_TYPE, NUMERIC_TYPES};
