//! TypeQL text generation for registered things.

use crate::error::QueryError;
use crate::thing::{Attributes, Entity, Relationship, Thing};
use std::collections::HashSet;

/// Top-level clause a thing is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Match,
    Insert,
}

impl Category {
    pub fn keyword(self) -> &'static str {
        match self {
            Category::Match => "match",
            Category::Insert => "insert",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Compile one clause (`match ...` or `insert ...`).
///
/// Returns an empty string when the clause has no things.
pub(crate) fn compile_clause(
    category: Category,
    entities: &[Entity],
    relationships: &[Relationship],
    known: &HashSet<String>,
) -> Result<String, QueryError> {
    if entities.is_empty() && relationships.is_empty() {
        return Ok(String::new());
    }

    let mut clause = format!("{} ", category.keyword());
    clause.push_str(&compile_entities(entities));
    clause.push_str(&compile_relationships(relationships, known)?);
    Ok(clause)
}

/// `$x isa type, has name "value"; ` for every entity.
pub(crate) fn compile_entities(entities: &[Entity]) -> String {
    let mut query = String::new();
    for entity in entities {
        query.push_str(&format!("{} isa {}", entity.variable(), entity.type_name()));
        push_attributes(&mut query, entity.attributes());
        query.push_str("; ");
    }
    query
}

/// `$r (role: $x, role: $y) isa type, has name "value"; ` for every relationship.
pub(crate) fn compile_relationships(
    relationships: &[Relationship],
    known: &HashSet<String>,
) -> Result<String, QueryError> {
    let mut query = String::new();
    for relationship in relationships {
        let var = relationship.variable();
        if relationship.related().is_empty() {
            return Err(QueryError::MalformedRelationship(var.name().to_string()));
        }

        let mut players = Vec::with_capacity(relationship.related().len());
        for (role, target) in relationship.related() {
            if !known.contains(target.name()) {
                return Err(QueryError::UnresolvedVariable {
                    relationship: var.name().to_string(),
                    target: target.name().to_string(),
                });
            }
            players.push(format!("{role}: {target}"));
        }

        query.push_str(&format!(
            "{var} ({}) isa {}",
            players.join(", "),
            relationship.type_name()
        ));
        push_attributes(&mut query, relationship.attributes());
        query.push_str("; ");
    }
    Ok(query)
}

fn push_attributes(query: &mut String, attributes: &Attributes) {
    for (name, values) in attributes.iter() {
        for value in values {
            query.push_str(&format!(", has {name} {}", value.to_literal()));
        }
    }
}
