//! Filter expressions for the record store's query language.
//!
//! List endpoints accept a boolean filter formula built from equality and
//! search predicates combined with `AND`/`OR`. This is deliberately not a
//! general expression engine: only the shapes the pipeline issues are
//! representable.

/// A boolean filter expression over store columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formula {
    /// `{field}='value'`
    Eq {
        /// Column name or field id
        field: String,
        /// Value to compare against
        value: String,
    },
    /// `SEARCH('needle', {field})` — substring match
    Search {
        /// Substring to look for
        needle: String,
        /// Column name or field id
        field: String,
    },
    /// `{field}=TRUE()`
    IsTrue(String),
    /// `{field}=FALSE()`
    IsFalse(String),
    /// `{field}=BLANK()`
    Blank(String),
    /// Bare `{field}` — truthy when the cell is non-empty
    Truthy(String),
    /// Conjunction of sub-expressions
    And(Vec<Formula>),
    /// Disjunction of sub-expressions
    Or(Vec<Formula>),
}

impl Formula {
    /// Equality predicate.
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Substring-search predicate.
    pub fn search(needle: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Search {
            needle: needle.into(),
            field: field.into(),
        }
    }

    /// Conjunction.
    pub fn and(exprs: Vec<Formula>) -> Self {
        Self::And(exprs)
    }

    /// Disjunction.
    pub fn or(exprs: Vec<Formula>) -> Self {
        Self::Or(exprs)
    }

    /// Render to the store's formula syntax.
    pub fn render(&self) -> String {
        match self {
            Self::Eq { field, value } => {
                format!("{{{field}}}='{}'", escape(value))
            }
            Self::Search { needle, field } => {
                format!("SEARCH('{}', {{{field}}})", escape(needle))
            }
            Self::IsTrue(field) => format!("{{{field}}}=TRUE()"),
            Self::IsFalse(field) => format!("{{{field}}}=FALSE()"),
            Self::Blank(field) => format!("{{{field}}}=BLANK()"),
            Self::Truthy(field) => format!("{{{field}}}"),
            Self::And(exprs) => combine("AND", exprs),
            Self::Or(exprs) => combine("OR", exprs),
        }
    }
}

impl std::fmt::Display for Formula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

fn combine(op: &str, exprs: &[Formula]) -> String {
    let rendered: Vec<String> = exprs.iter().map(Formula::render).collect();
    format!("{op}({})", rendered.join(","))
}

fn escape(value: &str) -> String {
    value.replace('\'', "\\'")
}
