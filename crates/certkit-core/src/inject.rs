//! # Field Injection
//!
//! Sets a value at a path inside a JSON document. Resolution runs in two
//! phases:
//!
//! 1. **Match.** A [`PathMatcher`] resolves the path against the document
//!    and returns every concrete [`Location`] it addresses. The default
//!    [`QueryMatcher`] evaluates full JSONPath (wildcards, filters, slices,
//!    descendants); [`ChainMatcher`] only follows literal steps. Each match
//!    is a walkable address even when the query used wildcards.
//!
//! 2. **Create.** When nothing matches, the original path must be a plain
//!    chain of field names. The walk descends through existing objects and
//!    inserts the final key. A missing intermediate component is reported
//!    and rejected; intermediate objects are never invented.
//!
//! The document is mutated in place. Callers that share a template across
//! recipients clone it before injecting.

use std::fmt;

use serde_json::Value;
use serde_json_path::{JsonPath, NormalizedPath, PathElement};

use crate::error::PathError;
use crate::field::FieldSpec;
use crate::path::{PathExpression, PathStep};

/// A concrete address inside a document, outermost step first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location(Vec<PathStep>);

impl Location {
    /// Create a location from literal steps.
    pub fn new(steps: Vec<PathStep>) -> Self {
        Self(steps)
    }

    /// The document root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// The literal steps of this location.
    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    fn from_normalized(path: &NormalizedPath<'_>) -> Self {
        Self(
            path.iter()
                .map(|element| match element {
                    PathElement::Name(name) => PathStep::Field(name.to_string()),
                    PathElement::Index(index) => PathStep::Index(*index),
                })
                .collect(),
        )
    }

    /// Borrow the value at this location, if it still exists.
    pub fn resolve<'v>(&self, document: &'v Value) -> Option<&'v Value> {
        self.0.iter().try_fold(document, |node, step| match step {
            PathStep::Field(name) => node.get(name.as_str()),
            PathStep::Index(index) => node.get(*index),
        })
    }

    /// Mutably borrow the value at this location, if it still exists.
    pub fn resolve_mut<'v>(&self, document: &'v mut Value) -> Option<&'v mut Value> {
        self.0.iter().try_fold(document, |node, step| match step {
            PathStep::Field(name) => node.get_mut(name.as_str()),
            PathStep::Index(index) => node.get_mut(*index),
        })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", PathExpression::from_steps(self.0.clone()))
    }
}

/// Resolves a path expression to the concrete locations it addresses.
pub trait PathMatcher {
    /// Return every location in `document` matched by `path`.
    ///
    /// An empty vector means the path is well-formed but addresses nothing
    /// that exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Invalid`] if the path cannot be parsed.
    fn locate(&self, document: &Value, path: &str) -> Result<Vec<Location>, PathError>;
}

/// Full JSONPath (RFC 9535) matcher backed by `serde_json_path`.
///
/// Expressions the query grammar rejects (for example dotted names such as
/// `image:signature`) are retried with [`ChainMatcher`].
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryMatcher;

impl PathMatcher for QueryMatcher {
    fn locate(&self, document: &Value, path: &str) -> Result<Vec<Location>, PathError> {
        let rooted = if path.starts_with('$') {
            path.to_string()
        } else {
            format!("$.{path}")
        };

        let query = match JsonPath::parse(&rooted) {
            Ok(query) => query,
            Err(query_err) => {
                return ChainMatcher.locate(document, path).map_err(|_| {
                    PathError::invalid(path, format!("not a valid JSONPath query: {query_err}"))
                });
            }
        };

        Ok(query
            .query_located(document)
            .into_iter()
            .map(|node| Location::from_normalized(node.location()))
            .collect())
    }
}

/// Literal-chain matcher: every step must be a field name or an index.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainMatcher;

impl PathMatcher for ChainMatcher {
    fn locate(&self, document: &Value, path: &str) -> Result<Vec<Location>, PathError> {
        let location = Location::new(PathExpression::parse(path)?.steps().to_vec());
        Ok(match location.resolve(document) {
            Some(_) => vec![location],
            None => Vec::new(),
        })
    }
}

/// Writes values into documents at path expressions.
#[derive(Debug, Clone, Default)]
pub struct FieldInjector<M = QueryMatcher> {
    matcher: M,
}

impl FieldInjector<QueryMatcher> {
    /// Create an injector backed by the full JSONPath matcher.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M: PathMatcher> FieldInjector<M> {
    /// Create an injector backed by a specific matcher.
    pub fn with_matcher(matcher: M) -> Self {
        Self { matcher }
    }

    /// Set `value` at every location addressed by `path`.
    ///
    /// Returns the number of locations written. When the path matches
    /// nothing, the final field of a plain field chain is created under its
    /// existing parent object and `1` is returned.
    ///
    /// # Errors
    ///
    /// - [`PathError::Invalid`] if the path is malformed, or nothing matched
    ///   and the path is not a plain field chain, or the parent of the new
    ///   field is not an object.
    /// - [`PathError::Ambiguous`] if nothing matched and more than the last
    ///   component is missing.
    pub fn set_field(&self, document: &mut Value, path: &str, value: Value) -> Result<usize, PathError> {
        let locations = self.matcher.locate(document, path)?;
        if locations.is_empty() {
            create_leaf(document, path, value)?;
            return Ok(1);
        }

        let mut written = 0;
        let last = locations.len() - 1;
        let mut value = Some(value);
        for (idx, location) in locations.iter().enumerate() {
            // An earlier write may have replaced an ancestor of this match.
            let Some(target) = location.resolve_mut(document) else {
                tracing::debug!(%location, path, "matched location no longer exists");
                continue;
            };
            *target = if idx == last {
                value.take().unwrap_or(Value::Null)
            } else {
                value.clone().unwrap_or(Value::Null)
            };
            written += 1;
        }
        Ok(written)
    }

    /// Apply every spec's literal `value` at its `path`, in order.
    ///
    /// # Errors
    ///
    /// Stops at the first spec that fails; see [`Self::set_field`].
    pub fn apply_all(&self, document: &mut Value, specs: &[FieldSpec]) -> Result<(), PathError> {
        for spec in specs {
            self.set_field(document, &spec.path, spec.value.clone())?;
        }
        Ok(())
    }
}

/// Set `value` at `path` using the default JSONPath-backed injector.
///
/// # Errors
///
/// See [`FieldInjector::set_field`].
pub fn set_field(document: &mut Value, path: &str, value: Value) -> Result<usize, PathError> {
    FieldInjector::new().set_field(document, path, value)
}

fn create_leaf(document: &mut Value, path: &str, value: Value) -> Result<(), PathError> {
    let expr = PathExpression::parse(path)?;
    let fields = expr.field_chain(path)?;
    let Some((leaf, parents)) = fields.split_last() else {
        return Err(PathError::invalid(path, "path addresses no field"));
    };

    let mut cursor = document;
    for name in parents {
        let Some(object) = cursor.as_object_mut() else {
            return Err(PathError::invalid(
                path,
                format!("cannot descend into non-object value at `{name}`"),
            ));
        };
        cursor = match object.get_mut(*name) {
            Some(next) => next,
            None => {
                tracing::error!(path, missing = *name, "path is not valid");
                return Err(PathError::Ambiguous {
                    path: path.to_string(),
                    missing: (*name).to_string(),
                });
            }
        };
    }

    let Some(parent) = cursor.as_object_mut() else {
        return Err(PathError::invalid(
            path,
            format!("parent of `{leaf}` is not an object"),
        ));
    };
    parent.insert((*leaf).to_string(), value);
    Ok(())
}
