/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Minimal RDF terms and their SPARQL/Turtle serialisation.
//!
//! Only what the service writes is modelled: IRIs, plain and typed literals,
//! and triples rendered as statement lines for `INSERT` blocks. Values coming
//! from delta notifications are untrusted, so [`NamedNode::parse`] rejects
//! anything that could break out of an `<...>` IRI reference.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

use crate::error::TermError;
use crate::vocabulary::xsd;

/// Characters that may not appear inside a SPARQL `IRIREF`.
const FORBIDDEN_IRI_CHARS: &[char] = &['<', '>', '"', '{', '}', '|', '^', '`', '\\'];

/// An IRI term. The original string is kept verbatim so it matches stored data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamedNode(String);

impl NamedNode {
    /// Validates `value` as an absolute IRI usable inside `<...>`.
    pub fn parse(value: impl Into<String>) -> Result<Self, TermError> {
        let value = value.into();
        let invalid = |reason: &str| TermError::InvalidIri {
            value: value.clone(),
            reason: reason.to_string(),
        };

        if value.is_empty() {
            return Err(invalid("empty"));
        }
        if value
            .chars()
            .any(|c| c <= ' ' || FORBIDDEN_IRI_CHARS.contains(&c))
        {
            return Err(invalid("contains characters not allowed in an IRI"));
        }
        // Only used as a check; the parsed form may be normalised.
        if let Err(e) = url::Url::parse(&value) {
            return Err(invalid(&e.to_string()));
        }

        Ok(Self(value))
    }

    /// Builds a term from a value known to be a valid IRI (vocabulary constants).
    pub(crate) fn trusted(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_sparql(&self) -> String {
        format!("<{}>", self.0)
    }
}

impl fmt::Display for NamedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A literal with an optional datatype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    value: String,
    datatype: Option<NamedNode>,
}

impl Literal {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
        }
    }

    pub fn typed(value: impl Into<String>, datatype: NamedNode) -> Self {
        Self {
            value: value.into(),
            datatype: Some(datatype),
        }
    }

    /// An `xsd:dateTime` literal with millisecond precision in UTC.
    pub fn date_time(value: DateTime<Utc>) -> Self {
        Self::typed(
            value.to_rfc3339_opts(SecondsFormat::Millis, true),
            xsd("dateTime"),
        )
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn datatype(&self) -> Option<&NamedNode> {
        self.datatype.as_ref()
    }

    pub fn to_sparql(&self) -> String {
        let quoted = format!("\"{}\"", escape_literal(&self.value));
        match &self.datatype {
            Some(datatype) => format!("{}^^{}", quoted, datatype.to_sparql()),
            None => quoted,
        }
    }
}

fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Object position of a triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    NamedNode(NamedNode),
    Literal(Literal),
}

impl Term {
    pub fn to_sparql(&self) -> String {
        match self {
            Term::NamedNode(node) => node.to_sparql(),
            Term::Literal(literal) => literal.to_sparql(),
        }
    }
}

impl From<NamedNode> for Term {
    fn from(node: NamedNode) -> Self {
        Term::NamedNode(node)
    }
}

impl From<Literal> for Term {
    fn from(literal: Literal) -> Self {
        Term::Literal(literal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub subject: NamedNode,
    pub predicate: NamedNode,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: NamedNode, predicate: NamedNode, object: impl Into<Term>) -> Self {
        Self {
            subject,
            predicate,
            object: object.into(),
        }
    }

    pub fn to_sparql(&self) -> String {
        format!(
            "{} {} {} .",
            self.subject.to_sparql(),
            self.predicate.to_sparql(),
            self.object.to_sparql()
        )
    }
}

/// Renders triples as one statement per line.
pub fn write_triples(triples: &[Triple]) -> String {
    triples
        .iter()
        .map(Triple::to_sparql)
        .collect::<Vec<_>>()
        .join("\n")
}
