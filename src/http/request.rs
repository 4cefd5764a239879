//! Per-request context attached by the router.
//!
//! # Responsibilities
//! - Carry path variables bound during matching to downstream handlers
//!
//! # Design Decisions
//! - Variables travel in the request extensions, keyed by parameter name
//! - A request that was not routed has no [`PathVars`] at all

use std::collections::HashMap;

use axum::http::Request;

/// Path variables bound while matching, e.g. `id -> "42"` for `/items/:id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathVars(HashMap<String, String>);

impl PathVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> HashMap<String, String> {
        self.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathVars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Lookup of routed path variables on a request.
pub trait RequestVarsExt {
    /// All variables, if the request went through the router.
    fn path_vars(&self) -> Option<&PathVars>;

    /// A single variable by parameter name (without the `:`/`*` sigil).
    fn path_var(&self, name: &str) -> Option<&str> {
        self.path_vars().and_then(|vars| vars.get(name))
    }
}

impl<B> RequestVarsExt for Request<B> {
    fn path_vars(&self) -> Option<&PathVars> {
        self.extensions().get::<PathVars>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_vars_on_request() {
        let mut req = Request::builder().uri("/items/42").body(()).unwrap();
        assert!(req.path_vars().is_none());
        assert_eq!(req.path_var("id"), None);

        req.extensions_mut().insert(PathVars::from_iter([("id", "42")]));
        assert_eq!(req.path_var("id"), Some("42"));
        assert_eq!(req.path_var("other"), None);
    }

    #[test]
    fn test_insert_overwrites() {
        let mut vars = PathVars::new();
        vars.insert("id", "1");
        vars.insert("id", "2");
        assert_eq!(vars.len(), 1);
        assert_eq!(vars.get("id"), Some("2"));
    }
}
