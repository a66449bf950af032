//! Identifier-based record resolution.
//!
//! Walks a nested tree and, for every node carrying identifier-marked keys,
//! looks up the existing record through the persistence collaborator. A
//! unique match rewrites the node to carry the internal record id; an
//! ambiguous match is reported, never guessed. One2many children are
//! scoped to the resolved parent so natural keys cannot collide across
//! parents.

use serde_json::{Map, Value, json};

use pattern_core::prelude::*;
use pattern_core::tree::TreeValue;

/// Read-only search seam into the persistence layer
pub trait RecordSearch {
    /// Return the ids of the records of `model` matching `domain`.
    ///
    /// # Errors
    ///
    /// Implementations report backend failures as [`PatternError::Search`].
    fn search(&self, model: &str, domain: &Predicate) -> Result<Vec<i64>>;

    /// Resolve an external identifier to an internal record id.
    ///
    /// # Errors
    ///
    /// Implementations report backend failures as [`PatternError::Search`].
    fn external_id(&self, xid: &str) -> Result<Option<i64>>;
}

/// Rewrites nested trees in place, replacing identifier keys with matched
/// record ids
pub struct IdentifierResolver<'a> {
    registry: &'a SchemaRegistry,
    search: &'a dyn RecordSearch,
}

impl<'a> IdentifierResolver<'a> {
    /// New resolver over the given field typing and search seam
    #[must_use]
    pub fn new(registry: &'a SchemaRegistry, search: &'a dyn RecordSearch) -> Self {
        Self { registry, search }
    }

    /// Resolve identifier keys in `tree` (a record of `model`), then
    /// recursively in its one2many children.
    ///
    /// `parent_missing` suppresses the search: when the parent record is
    /// known not to exist yet, its children cannot exist either.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::DuplicateMatch`] when an identifier predicate
    /// matches more than one record, [`PatternError::UnknownIdentifier`] for
    /// an invalid or unresolvable explicit id column, and propagates search
    /// failures.
    pub fn resolve(
        &self,
        model: &str,
        tree: &mut Mapping,
        ambient: &Predicate,
        parent_missing: bool,
    ) -> Result<()> {
        let (domain, ident_keys) = identifier_domain(tree);

        if !domain.is_trivial() && !parent_missing {
            let full = ambient.clone().and(domain);
            self.set_record_id(model, tree, &ident_keys, &full)?;
        }

        let parent_id = self.effective_parent_id(tree)?;
        self.resolve_children(model, tree, parent_id)?;
        clean_identifier_keys(tree, &ident_keys);
        Ok(())
    }

    fn set_record_id(
        &self,
        model: &str,
        tree: &mut Mapping,
        ident_keys: &[String],
        domain: &Predicate,
    ) -> Result<()> {
        let records = self.search.search(model, domain)?;
        if records.len() > 1 {
            let mut pairs = Map::new();
            for key in ident_keys {
                if let Some(value) = tree.get(key) {
                    pairs.insert(key.clone(), serde_json::to_value(value)?);
                }
            }
            return Err(PatternError::duplicate_match(
                model,
                Value::Object(pairs).to_string(),
            ));
        }
        if let Some(&id) = records.first() {
            tree.insert(path::DB_ID_KEY.to_string(), TreeValue::Scalar(json!(id)));
            // Rewriting the same values onto the matched record is useless.
            for key in ident_keys {
                tree.shift_remove(key);
            }
        }
        Ok(())
    }

    fn effective_parent_id(&self, tree: &Mapping) -> Result<Option<i64>> {
        if let Some(value) = tree.get(path::DB_ID_KEY) {
            let scalar = value
                .as_scalar()
                .ok_or_else(|| PatternError::unknown_identifier(path::DB_ID_KEY))?;
            return coerce_db_id(scalar).map(Some);
        }
        if let Some(value) = tree.get(path::XML_ID_KEY) {
            let Some(Value::String(xid)) = value.as_scalar() else {
                return Err(PatternError::unknown_identifier(format!("{value:?}")));
            };
            return match self.search.external_id(xid)? {
                Some(id) => Ok(Some(id)),
                None => Err(PatternError::unknown_identifier(xid.clone())),
            };
        }
        Ok(None)
    }

    fn resolve_children(
        &self,
        model: &str,
        tree: &mut Mapping,
        parent_id: Option<i64>,
    ) -> Result<()> {
        for (key, value) in tree.iter_mut() {
            let Some(def) = self.registry.field(model, key) else {
                continue;
            };
            if def.kind != RelationKind::One2many {
                continue;
            }
            let comodel = def.comodel.as_deref().ok_or_else(|| {
                PatternError::invalid_pattern(format!("one2many field '{key}' has no co-model"))
            })?;
            let inverse = def.inverse.as_deref().ok_or_else(|| {
                PatternError::invalid_pattern(format!(
                    "one2many field '{key}' has no inverse field"
                ))
            })?;
            let subdomain = match parent_id {
                Some(pid) => Predicate::eq(inverse, json!(pid)),
                None => Predicate::True,
            };
            let TreeValue::Sequence(items) = value else {
                continue;
            };
            // Empty sub-items are removed before recursing.
            items.retain(TreeValue::has_content);
            for item in items.iter_mut() {
                if let TreeValue::Mapping(child) = item {
                    self.resolve(comodel, child, &subdomain, parent_id.is_none())?;
                }
            }
        }
        Ok(())
    }
}

/// Collect the identifier-suffixed keys of `tree` into an ANDed equality
/// predicate, returning the predicate and the consumed key names
fn identifier_domain(tree: &Mapping) -> (Predicate, Vec<String>) {
    let mut domain = Predicate::True;
    let mut ident_keys = Vec::new();
    for (key, value) in tree {
        if let Some(field) = path::strip_identifier_suffix(key) {
            domain = domain.and(value_domain(field, value));
            ident_keys.push(key.clone());
        }
    }
    (domain, ident_keys)
}

/// Equality clauses for one identifier value: a mapping expands into one
/// clause per sub-key on `field.subkey`
fn value_domain(field: &str, value: &TreeValue) -> Predicate {
    match value {
        TreeValue::Mapping(mapping) => Predicate::all(mapping.iter().map(|(sub, v)| {
            Predicate::Eq(
                format!("{field}.{sub}"),
                serde_json::to_value(v).unwrap_or(Value::Null),
            )
        })),
        TreeValue::Scalar(v) => Predicate::Eq(field.to_string(), v.clone()),
        TreeValue::Sequence(_) => Predicate::Eq(
            field.to_string(),
            serde_json::to_value(value).unwrap_or(Value::Null),
        ),
    }
}

/// Rename the identifier keys that survived resolution (no unique match)
/// back to their bare field name so their values feed record creation
fn clean_identifier_keys(tree: &mut Mapping, ident_keys: &[String]) {
    for key in ident_keys {
        if let Some(value) = tree.shift_remove(key) {
            if let Some(field) = path::strip_identifier_suffix(key) {
                tree.insert(field.to_string(), value);
            }
        }
    }
}

fn coerce_db_id(value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| PatternError::unknown_identifier(n.to_string())),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| PatternError::unknown_identifier(s.clone())),
        other => Err(PatternError::unknown_identifier(other.to_string())),
    }
}
