use uipattern_core::types::{Filters, Requirements, SearchQuery};

/// Times the component type is repeated in the lexical query.
const TYPE_BOOST: usize = 3;

/// Turns [`Requirements`] into the per-request [`SearchQuery`].
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryBuilder;

impl QueryBuilder {
    pub fn build(&self, requirements: &Requirements) -> SearchQuery {
        SearchQuery {
            lexical_query: self.lexical_query(requirements),
            semantic_query: self.semantic_query(requirements),
            filters: self.filters(requirements),
        }
    }

    /// Type ×3, then props, variants and states, lower-cased.
    pub fn lexical_query(&self, requirements: &Requirements) -> String {
        let mut terms: Vec<&str> = Vec::new();
        if let Some(ty) = requirements.component_type() {
            terms.extend(std::iter::repeat(ty).take(TYPE_BOOST));
        }
        terms.extend(requirements.props.iter().map(String::as_str));
        terms.extend(requirements.variants.iter().map(String::as_str));
        terms.extend(requirements.states.iter().map(String::as_str));
        terms.retain(|t| !t.trim().is_empty());
        terms.join(" ").to_lowercase()
    }

    pub fn semantic_query(&self, requirements: &Requirements) -> String {
        let mut sentence = match requirements.component_type() {
            Some(ty) => format!("A {ty} component"),
            None => "A component".to_string(),
        };
        if !requirements.props.is_empty() {
            sentence.push_str(&format!(", with {} props", join_list(&requirements.props)));
        }
        if !requirements.variants.is_empty() {
            sentence.push_str(&format!(", supporting {} variants", join_list(&requirements.variants)));
        }
        if !requirements.a11y.is_empty() {
            sentence.push_str(&format!(", with accessibility features: {}", join_list(&requirements.a11y)));
        }
        sentence.push('.');
        sentence
    }

    pub fn filters(&self, requirements: &Requirements) -> Filters {
        requirements
            .component_type()
            .map(|ty| Filters::from([("type".to_string(), ty.to_lowercase())]))
            .unwrap_or_default()
    }
}

/// "a", "a and b", "a, b, and c".
pub(crate) fn join_list<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [one] => one.as_ref().to_string(),
        [a, b] => format!("{} and {}", a.as_ref(), b.as_ref()),
        [head @ .., last] => {
            let head: Vec<&str> = head.iter().map(AsRef::as_ref).collect();
            format!("{}, and {}", head.join(", "), last.as_ref())
        }
    }
}
