//! Query evaluation over tree listings
//!
//! An expression is a chain of clauses joined by ` and ` or ` or `, read
//! strictly left to right without precedence. Each clause is a relative path
//! or a `*` glob, optionally prefixed by `not `. The whole expression may
//! start with `%f ` (files only) or `%d ` (folders only).

use std::collections::BTreeSet;

use crate::enumerate::TreeListing;
use crate::error::{Error, Result};

const AND: &str = " and ";
const OR: &str = " or ";

/// Kind restriction selected by the `%f` / `%d` prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFilter {
    Files,
    Folders,
}

/// How a clause combines with everything to its left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

/// A single path pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Whole relative path
    Exact(String),
    /// Pattern containing at least one `*`
    Glob(String),
}

impl Pattern {
    fn new(text: &str) -> Self {
        if text.contains('*') {
            Pattern::Glob(text.to_string())
        } else {
            Pattern::Exact(text.to_string())
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            Pattern::Exact(p) => p == path,
            Pattern::Glob(p) => glob_match(p, path),
        }
    }
}

/// Anchored glob match where `*` stands for any run of characters
fn glob_match(pattern: &str, text: &str) -> bool {
    let pieces: Vec<&str> = pattern.split('*').collect();
    let (first, rest) = match pieces.split_first() {
        Some(split) => split,
        None => return text.is_empty(),
    };
    let Some((last, middle)) = rest.split_last() else {
        return pattern == text;
    };

    if !text.starts_with(first) {
        return false;
    }
    let mut pos = first.len();
    for piece in middle.iter().filter(|p| !p.is_empty()) {
        match text[pos..].find(piece) {
            Some(found) => pos += found + piece.len(),
            None => return false,
        }
    }
    text.len() >= pos + last.len() && text.ends_with(last)
}

/// One clause of an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub negated: bool,
    pub pattern: Pattern,
}

impl Clause {
    fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let (negated, body) = match text.strip_prefix("not ") {
            Some(body) => (true, body.trim()),
            None if text == "not" => (true, ""),
            None => (false, text),
        };
        let body = strip_quotes(body);
        if body.is_empty() {
            return Err(Error::InvalidQuery(format!("empty clause in '{text}'")));
        }
        Ok(Self {
            negated,
            pattern: Pattern::new(body),
        })
    }

    fn indices(&self, tree: &TreeListing) -> Vec<usize> {
        tree.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| self.pattern.matches(&e.path) != self.negated)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Parsed query expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub kind: Option<KindFilter>,
    pub first: Clause,
    pub rest: Vec<(Combinator, Clause)>,
}

impl Query {
    /// Parse an expression
    pub fn parse(expression: &str) -> Result<Self> {
        let mut text = expression.trim_start();
        let mut kind = None;
        if let Some(stripped) = text.strip_prefix("%f ") {
            kind = Some(KindFilter::Files);
            text = stripped;
        } else if let Some(stripped) = text.strip_prefix("%d ") {
            kind = Some(KindFilter::Folders);
            text = stripped;
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(Error::InvalidQuery("empty expression".into()));
        }
        for op in ["and", "or"] {
            if text == op
                || text.starts_with(&format!("{op} "))
                || text.ends_with(&format!(" {op}"))
            {
                return Err(Error::InvalidQuery(format!(
                    "dangling '{op}' in '{expression}'"
                )));
            }
        }

        let (first, mut remaining) = split_next(text);
        let first = Clause::parse(first)?;
        let mut rest = Vec::new();
        while let Some((combinator, tail)) = remaining {
            let (clause, next) = split_next(tail);
            rest.push((combinator, Clause::parse(clause)?));
            remaining = next;
        }

        Ok(Self { kind, first, rest })
    }

    /// Evaluate against a listing
    ///
    /// `and` keeps the order of its left operand; `or` yields entries in
    /// listing order without duplicates.
    pub fn evaluate(&self, tree: &TreeListing) -> TreeListing {
        let mut selected = self.first.indices(tree);
        for (combinator, clause) in &self.rest {
            let matched = clause.indices(tree);
            match combinator {
                Combinator::And => {
                    let matched: BTreeSet<usize> = matched.into_iter().collect();
                    selected.retain(|i| matched.contains(i));
                }
                Combinator::Or => {
                    let union: BTreeSet<usize> = selected.into_iter().chain(matched).collect();
                    selected = union.into_iter().collect();
                }
            }
        }

        if let Some(kind) = self.kind {
            selected.retain(|&i| {
                let is_folder = tree.entries[i].kind.is_folder();
                match kind {
                    KindFilter::Files => !is_folder,
                    KindFilter::Folders => is_folder,
                }
            });
        }
        tree.select(&selected)
    }
}

/// Parse `expression` and evaluate it against `tree`
pub fn find(expression: &str, tree: &TreeListing) -> Result<TreeListing> {
    Ok(Query::parse(expression)?.evaluate(tree))
}

/// Split off the first clause and the operator following it
fn split_next(text: &str) -> (&str, Option<(Combinator, &str)>) {
    let and = text.find(AND).map(|i| (i, Combinator::And, AND.len()));
    let or = text.find(OR).map(|i| (i, Combinator::Or, OR.len()));
    let next = match (and, or) {
        (Some(a), Some(o)) => Some(if a.0 < o.0 { a } else { o }),
        (a, o) => a.or(o),
    };
    match next {
        Some((i, combinator, len)) => (&text[..i], Some((combinator, &text[i + len..]))),
        None => (text, None),
    }
}

fn strip_quotes(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}
