//! Line-based N-Triples loader.
//!
//! Parses the subset of N-Triples needed for typed knowledge graphs: IRIs,
//! blank nodes, and literals with optional datatype or language tag. Malformed
//! statements fail the load with the offending line number.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::GraphError;
use crate::term::Term;

use super::KnowledgeGraph;

// Subject and predicate are IRIs or (subject only) blank nodes; the object is
// everything up to the terminating dot and parsed separately.
static STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(<[^>]+>|_:\S+)\s+(<[^>]+>)\s+(.+?)\s*\.\s*$").expect("statement regex")
});

static LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^"((?:[^"\\]|\\.)*)"(?:\^\^<([^>]+)>|@([A-Za-z]+(?:-[A-Za-z0-9]+)*))?$"#)
        .expect("literal regex")
});

/// Load an N-Triples file into a fresh [`KnowledgeGraph`].
pub fn load_ntriples(path: &Path) -> Result<KnowledgeGraph, GraphError> {
    let file = File::open(path).map_err(|source| GraphError::Io { source })?;
    load_from_reader(BufReader::new(file))
}

/// Load N-Triples statements from any buffered reader.
pub fn load_from_reader<R: BufRead>(reader: R) -> Result<KnowledgeGraph, GraphError> {
    let kg = KnowledgeGraph::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| GraphError::Io { source })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (subject, predicate, object) = parse_statement(trimmed, i + 1)?;
        kg.insert(&subject, &predicate, &object);
    }

    tracing::info!(
        nodes = kg.node_count(),
        relations = kg.num_relations(),
        triples = kg.triple_count(),
        "loaded graph"
    );

    Ok(kg)
}

fn parse_statement(statement: &str, line: usize) -> Result<(Term, Term, Term), GraphError> {
    let caps = STATEMENT
        .captures(statement)
        .ok_or_else(|| GraphError::ParseLine {
            line,
            statement: statement.to_string(),
        })?;

    let subject = parse_resource(&caps[1]);
    let predicate = parse_resource(&caps[2]);
    let object = parse_object(&caps[3]).ok_or_else(|| GraphError::ParseLine {
        line,
        statement: statement.to_string(),
    })?;

    Ok((subject, predicate, object))
}

fn parse_resource(token: &str) -> Term {
    if let Some(label) = token.strip_prefix("_:") {
        Term::BNode(label.to_string())
    } else {
        Term::Iri(token[1..token.len() - 1].to_string())
    }
}

fn parse_object(token: &str) -> Option<Term> {
    if token.starts_with('<') && token.ends_with('>') {
        return Some(Term::Iri(token[1..token.len() - 1].to_string()));
    }
    if let Some(label) = token.strip_prefix("_:") {
        return Some(Term::BNode(label.to_string()));
    }

    let caps = LITERAL.captures(token)?;
    let lexical = unescape(&caps[1]);
    let datatype = match (caps.get(2), caps.get(3)) {
        (Some(dt), _) => Some(dt.as_str().to_string()),
        // Language-tagged strings are rdf:langString per RDF 1.1.
        (None, Some(_)) => {
            Some("http://www.w3.org/1999/02/22-rdf-syntax-ns#langString".to_string())
        }
        (None, None) => None,
    };

    Some(Term::Literal { lexical, datatype })
}

fn unescape(lexical: &str) -> String {
    let mut out = String::with_capacity(lexical.len());
    let mut chars = lexical.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
