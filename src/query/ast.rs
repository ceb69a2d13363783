use std::fmt;

/// Field name that matches every indexed field
pub const ANY_FIELD: &str = "*";

/// Main query enum representing all query types
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Term(TermQuery),          // Single term search
    Prefix(PrefixQuery),      // Terms starting with a prefix
    FullText(FullTextQuery),  // Literal phrase
    And(GroupQuery),          // Every child must match
    Or(GroupQuery),           // Any child may match
    Not(NotQuery),            // Excludes the child's matches
    Null(String),             // Matches nothing; carries the reason
}

/// Single term query
#[derive(Debug, Clone, PartialEq)]
pub struct TermQuery {
    pub field: String,
    pub value: String,
    pub boost: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrefixQuery {
    pub field: String,
    pub prefix: String,
    pub boost: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FullTextQuery {
    pub field: String,
    pub phrase: String,
    pub boost: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupQuery {
    pub children: Vec<Query>,
    pub boost: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotQuery {
    pub child: Box<Query>,
    pub boost: Option<f32>,
}

/// Field, value and boost of a term, prefix or phrase node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextClause<'a> {
    pub field: &'a str,
    pub value: &'a str,
    pub boost: f32,
}

impl Query {
    pub fn term(field: &str, value: &str) -> Self {
        Query::Term(TermQuery {
            field: field.to_string(),
            value: value.to_string(),
            boost: None,
        })
    }

    pub fn prefix(field: &str, prefix: &str) -> Self {
        Query::Prefix(PrefixQuery {
            field: field.to_string(),
            prefix: prefix.to_string(),
            boost: None,
        })
    }

    /// Double quotes inside the phrase are dropped
    pub fn full_text(field: &str, phrase: &str) -> Self {
        Query::FullText(FullTextQuery {
            field: field.to_string(),
            phrase: phrase.replace('"', ""),
            boost: None,
        })
    }

    pub fn and(children: Vec<Query>) -> Self {
        Query::And(GroupQuery { children, boost: None })
    }

    pub fn or(children: Vec<Query>) -> Self {
        Query::Or(GroupQuery { children, boost: None })
    }

    pub fn not(child: Query) -> Self {
        Query::Not(NotQuery {
            child: Box::new(child),
            boost: None,
        })
    }

    pub fn null(reason: &str) -> Self {
        Query::Null(reason.to_string())
    }

    /// No effect on `Null`
    pub fn with_boost(mut self, value: f32) -> Self {
        match &mut self {
            Query::Term(q) => q.boost = Some(value),
            Query::Prefix(q) => q.boost = Some(value),
            Query::FullText(q) => q.boost = Some(value),
            Query::And(q) | Query::Or(q) => q.boost = Some(value),
            Query::Not(q) => q.boost = Some(value),
            Query::Null(_) => {}
        }
        self
    }

    pub fn boost(&self) -> f32 {
        let boost = match self {
            Query::Term(q) => q.boost,
            Query::Prefix(q) => q.boost,
            Query::FullText(q) => q.boost,
            Query::And(q) | Query::Or(q) => q.boost,
            Query::Not(q) => q.boost,
            Query::Null(_) => None,
        };
        boost.unwrap_or(1.0)
    }

    /// Evaluation order inside a group; exclusions go last
    pub fn priority(&self) -> u8 {
        match self {
            Query::Not(_) => 1,
            _ => 0,
        }
    }

    /// Term, prefix or phrase node
    pub fn text_clause(&self) -> Option<TextClause<'_>> {
        let (field, value) = match self {
            Query::Term(q) => (&q.field, &q.value),
            Query::Prefix(q) => (&q.field, &q.prefix),
            Query::FullText(q) => (&q.field, &q.phrase),
            _ => return None,
        };
        Some(TextClause {
            field,
            value,
            boost: self.boost(),
        })
    }

    /// Canonical copy: single-child groups become their child, empty
    /// groups and blank phrases become `Null`
    pub fn normalize(&self) -> Query {
        match self {
            Query::FullText(q) if q.phrase.trim().is_empty() => Query::null("Empty Phrase"),
            Query::And(group) | Query::Or(group) => {
                let mut children: Vec<Query> = group.children.iter().map(Query::normalize).collect();
                match children.len() {
                    0 => Query::null("Empty Group"),
                    1 => children.remove(0),
                    _ => {
                        let normalized = GroupQuery { children, boost: group.boost };
                        if matches!(self, Query::And(_)) {
                            Query::And(normalized)
                        } else {
                            Query::Or(normalized)
                        }
                    }
                }
            }
            Query::Not(q) => Query::Not(NotQuery {
                child: Box::new(q.child.normalize()),
                boost: q.boost,
            }),
            _ => self.clone(),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Term(q) => write!(f, "{}:{}", q.field, q.value),
            Query::Prefix(q) => write!(f, "{}:{}*", q.field, q.prefix),
            Query::FullText(q) => write!(f, "{}:\"{}\"", q.field, q.phrase),
            Query::And(group) => write_group(f, &group.children, "AND"),
            Query::Or(group) => write_group(f, &group.children, "OR"),
            Query::Not(q) => write!(f, "NOT({})", q.child),
            Query::Null(reason) => write!(f, "<null> {}", reason),
        }
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, children: &[Query], joint: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", joint)?;
        }
        write!(f, "{}", child)?;
    }
    f.write_str(")")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_canonical_strings() {
        let query = Query::and(vec![
            Query::or(vec![Query::term("*", "world"), Query::prefix("other", "foo")]),
            Query::not(Query::term("title", "hello")),
        ]);
        assert_eq!(query.to_string(), "((*:world OR other:foo*) AND NOT(title:hello))");
        assert_eq!(Query::full_text("*", "hello world").to_string(), "*:\"hello world\"");
        assert_eq!(Query::null("Empty Query").to_string(), "<null> Empty Query");
    }

    #[test]
    fn normalize_collapses_and_is_idempotent() {
        let query = Query::and(vec![
            Query::or(vec![Query::and(vec![Query::term("*", "a")])]),
            Query::not(Query::or(vec![Query::full_text("*", "  ")])),
            Query::and(vec![]),
        ]);

        let once = query.normalize();
        assert_eq!(
            once,
            Query::and(vec![
                Query::term("*", "a"),
                Query::not(Query::null("Empty Phrase")),
                Query::null("Empty Group"),
            ])
        );
        assert_eq!(once.normalize(), once);
    }

    #[test]
    fn not_sorts_after_positive_nodes() {
        assert!(Query::not(Query::term("*", "a")).priority() > Query::term("*", "a").priority());
        assert_eq!(Query::or(vec![]).priority(), Query::prefix("*", "a").priority());
    }

    #[test]
    fn boost_defaults_to_one() {
        assert_eq!(Query::term("*", "a").boost(), 1.0);
        let boosted = Query::term("title", "a").with_boost(3.0);
        assert_eq!(boosted.text_clause().unwrap().boost, 3.0);
        assert_eq!(Query::full_text("*", "say \"hi\"").text_clause().unwrap().value, "say hi");
    }
}
