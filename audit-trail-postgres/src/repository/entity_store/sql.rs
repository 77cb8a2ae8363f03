//! SQL rendering for entity writes and filtered reads.
//!
//! Identifiers come from the model registry and are always quoted; values are
//! always bound as parameters.

use audit_trail_db::filter::RowPredicate;
use audit_trail_db::metadata::EntityDescriptor;
use audit_trail_db::models::{PropertyBag, PropertyValue, ValueKind};

/// A statement and the values to bind, in parameter order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<PropertyValue>,
}

pub fn quote_ident(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// `INSERT` of all scalar columns. Without a key value the key column is
/// left to its default and returned.
pub fn insert(descriptor: &EntityDescriptor, key: Option<&PropertyValue>, values: &PropertyBag) -> Statement {
    let omit_key = key.map_or(true, PropertyValue::is_null);

    let mut columns = Vec::new();
    let mut params = Vec::new();
    for property in descriptor.scalar_properties() {
        if omit_key && descriptor.is_key(property.name) {
            continue;
        }
        columns.push(quote_ident(property.column));
        params.push(value_for(values, property.name, property.kind()));
    }

    let placeholders: Vec<String> = (1..=params.len()).map(|i| format!("${i}")).collect();
    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(descriptor.table),
        columns.join(", "),
        placeholders.join(", ")
    );
    if omit_key {
        sql.push_str(&format!(" RETURNING {}", quote_ident(descriptor.key.column)));
    }

    Statement { sql, params }
}

/// `UPDATE` of every non-key column, matched on the key.
pub fn update(descriptor: &EntityDescriptor, key: &PropertyValue, values: &PropertyBag) -> Statement {
    let mut assignments = Vec::new();
    let mut params = Vec::new();
    for property in descriptor.scalar_properties() {
        if descriptor.is_key(property.name) {
            continue;
        }
        params.push(value_for(values, property.name, property.kind()));
        assignments.push(format!("{} = ${}", quote_ident(property.column), params.len()));
    }
    params.push(key.clone());

    Statement {
        sql: format!(
            "UPDATE {} SET {} WHERE {} = ${}",
            quote_ident(descriptor.table),
            assignments.join(", "),
            quote_ident(descriptor.key.column),
            params.len()
        ),
        params,
    }
}

pub fn delete(descriptor: &EntityDescriptor, key: &PropertyValue) -> Statement {
    Statement {
        sql: format!(
            "DELETE FROM {} WHERE {} = $1",
            quote_ident(descriptor.table),
            quote_ident(descriptor.key.column)
        ),
        params: vec![key.clone()],
    }
}

/// `SELECT` of all scalar columns restricted by the given predicates.
pub fn select(descriptor: &EntityDescriptor, predicates: &[RowPredicate]) -> Statement {
    let columns: Vec<String> = descriptor
        .scalar_properties()
        .map(|p| quote_ident(p.column))
        .collect();
    let (clause, params) = render_predicates(predicates, 1);

    let mut sql = format!("SELECT {} FROM {}", columns.join(", "), quote_ident(descriptor.table));
    if !clause.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clause);
    }
    Statement { sql, params }
}

/// Renders predicates joined by `AND`, numbering parameters from `first_param`.
///
/// An equality against null is rendered as a bound null, which matches no row.
pub fn render_predicates(predicates: &[RowPredicate], first_param: usize) -> (String, Vec<PropertyValue>) {
    let mut params = Vec::new();
    let clauses: Vec<String> = predicates
        .iter()
        .map(|predicate| match predicate {
            RowPredicate::IsNotTrue { column, .. } => format!("{} IS NOT TRUE", quote_ident(column)),
            RowPredicate::Equals { column, value, .. } => {
                params.push(value.clone());
                format!("{} = ${}", quote_ident(column), first_param + params.len() - 1)
            }
        })
        .collect();
    (clauses.join(" AND "), params)
}

/// Value of a declared property; a property missing from the bag is a typed null.
fn value_for(values: &PropertyBag, property: &str, kind: Option<ValueKind>) -> PropertyValue {
    values
        .get(property)
        .cloned()
        .or_else(|| kind.map(PropertyValue::null))
        .unwrap_or(PropertyValue::Text(None))
}
