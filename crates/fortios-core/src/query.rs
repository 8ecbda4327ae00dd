//! Convenience builder for HTTP query parameters.
//!
//! Every cmdb call may be scoped to a virtual domain; this helper keeps the
//! optional `vdom` and similar parameters out of the client code paths.

/// Builder for assembling query parameter pairs.
#[derive(Debug, Default, Clone)]
pub struct QueryParams {
    pairs: Vec<(&'static str, String)>,
}

impl QueryParams {
    /// Create a new, empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Scope the request to a virtual domain when one is given.
    #[must_use]
    pub fn vdom(vdom: Option<&str>) -> Self {
        let mut params = Self::new();
        params.push_opt("vdom", vdom.filter(|value| !value.is_empty()));
        params
    }

    /// Append a key/value pair when the value is present.
    pub fn push_opt<T>(&mut self, key: &'static str, value: Option<T>)
    where
        T: ToString,
    {
        if let Some(value) = value {
            self.pairs.push((key, value.to_string()));
        }
    }

    /// Borrow the collected key/value pairs.
    #[must_use]
    pub fn as_pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    /// Returns true if no parameters have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::QueryParams;

    #[test]
    fn vdom_skips_missing_and_empty() {
        assert!(QueryParams::vdom(None).is_empty());
        assert!(QueryParams::vdom(Some("")).is_empty());
        assert_eq!(
            QueryParams::vdom(Some("root")).as_pairs(),
            &[("vdom", "root".to_string())]
        );
    }
}
