//! SPARQL serialization of discovered patterns.
//!
//! Each accepted pattern is written as one named SELECT query over the root
//! variable, in discovery order. Multimodal variables cannot be expressed as
//! plain triple patterns, so they serialize as FILTER constraints derived
//! from their cluster summary.

use std::collections::HashMap;
use std::io::{self, Write};

use std::sync::Arc;

use crate::pattern::{Assertion, AssertionRhs, GraphPattern, VarId, Variable};
use crate::term::Term;

/// Serialize one pattern as a SPARQL SELECT query, appended to `sink`.
///
/// `number` names the query within `namespace`; the updated (incremented)
/// counter is returned so callers can thread it through a discovery stream.
pub fn write_query<W: Write>(
    sink: &mut W,
    pattern: &GraphPattern,
    number: usize,
    namespace: &str,
    prefixes: &[(String, String)],
) -> io::Result<usize> {
    let ordered = canonical_order(pattern);
    let names = variable_names(pattern, &ordered);
    let root_name = &names[&pattern.root.var()];

    writeln!(
        sink,
        "# <{namespace}Pattern_{number}> support={} length={} width={}",
        pattern.support(),
        pattern.length(),
        pattern.width()
    )?;
    for (prefix, iri) in prefixes {
        writeln!(sink, "PREFIX {prefix}: <{iri}>")?;
    }

    writeln!(sink, "SELECT DISTINCT ?{root_name} WHERE {{")?;
    if let Some(class) = pattern.root.class() {
        writeln!(sink, "\t?{root_name} a {} .", render_term(class, prefixes))?;
    }

    for assertion in &ordered {
        let subject = &names[&assertion.lhs];
        let predicate = render_term(&assertion.predicate, prefixes);
        match &assertion.rhs {
            AssertionRhs::Bound(term) => {
                writeln!(sink, "\t?{subject} {predicate} {} .", render_term(term, prefixes))?;
            }
            AssertionRhs::Variable(variable) => {
                let object = &names[&variable.var()];
                writeln!(sink, "\t?{subject} {predicate} ?{object} .")?;
                write_variable_constraint(sink, variable, object, prefixes)?;
            }
        }
    }

    writeln!(sink, "}}")?;
    writeln!(sink)?;

    Ok(number + 1)
}

fn write_variable_constraint<W: Write>(
    sink: &mut W,
    variable: &Variable,
    name: &str,
    prefixes: &[(String, String)],
) -> io::Result<()> {
    match variable {
        Variable::ObjectType { class, .. } => {
            writeln!(sink, "\t?{name} a {} .", render_term(class, prefixes))
        }
        Variable::DataType { datatype, .. } => {
            writeln!(sink, "\tFILTER(DATATYPE(?{name}) = <{datatype}>)")
        }
        Variable::MultiModalNumeric { cluster, .. } => {
            writeln!(sink, "\t# cluster: {cluster}")?;
            writeln!(
                sink,
                "\tFILTER(?{name} >= {:.6} && ?{name} <= {:.6})",
                cluster.min, cluster.max
            )
        }
        Variable::MultiModalString { cluster, .. } => {
            writeln!(sink, "\t# cluster: {cluster}")?;
            writeln!(
                sink,
                "\tFILTER(STRLEN(STR(?{name})) >= {} && STRLEN(STR(?{name})) <= {})",
                cluster.min_len, cluster.max_len
            )
        }
    }
}

/// Order assertions by their root-relative path so that two structurally
/// equal patterns serialize to identical text, whatever order growth happened
/// to append their assertions in.
fn canonical_order(pattern: &GraphPattern) -> Vec<Arc<Assertion>> {
    let paths = pattern.var_paths();
    let mut ordered: Vec<Arc<Assertion>> = pattern.assertions.to_vec();
    ordered.sort_by_key(|a| {
        (
            paths.get(&a.lhs).cloned().unwrap_or_default(),
            a.descriptor(),
            a.depth,
        )
    });
    ordered
}

/// Assign stable query-local names: the root is `v0`, rhs variables follow in
/// canonical assertion order.
fn variable_names(pattern: &GraphPattern, ordered: &[Arc<Assertion>]) -> HashMap<VarId, String> {
    let mut names = HashMap::new();
    names.insert(pattern.root.var(), "v0".to_string());
    let mut next = 1;
    for assertion in ordered {
        if let AssertionRhs::Variable(v) = &assertion.rhs {
            names.entry(v.var()).or_insert_with(|| {
                let name = format!("v{next}");
                next += 1;
                name
            });
        }
    }
    names
}

/// Render a term in SPARQL syntax, compacting IRIs against the prefix map
/// when the remainder is a clean local name.
fn render_term(term: &Term, prefixes: &[(String, String)]) -> String {
    if let Term::Iri(iri) = term {
        let best = prefixes
            .iter()
            .filter(|(_, ns)| iri.starts_with(ns.as_str()))
            .max_by_key(|(_, ns)| ns.len());
        if let Some((prefix, ns)) = best {
            let local = &iri[ns.len()..];
            if !local.is_empty()
                && local
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return format!("{prefix}:{local}");
            }
        }
    }
    term.to_ntriples()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::pattern::{Assertion, VarAllocator};
    use crate::term::NodeId;

    fn node(i: u64) -> NodeId {
        NodeId::new(i).unwrap()
    }

    fn ex_prefixes() -> Vec<(String, String)> {
        vec![("ex".to_string(), "http://example.org/".to_string())]
    }

    fn sample_pattern(vars: &VarAllocator) -> GraphPattern {
        let root = Variable::ObjectType {
            class: Term::iri("http://example.org/Person"),
            var: vars.fresh(),
        };
        let assertion = Assertion::new(
            root.var(),
            Term::iri("http://example.org/age"),
            AssertionRhs::Bound(Term::typed_literal(
                "30",
                "http://www.w3.org/2001/XMLSchema#integer",
            )),
            0,
            (1..=6).map(node).collect::<HashSet<_>>(),
            [(node(50), (1..=6).map(node).collect())].into_iter().collect(),
        );
        GraphPattern::root_pattern(root, assertion)
    }

    #[test]
    fn query_text_shape() {
        let vars = VarAllocator::new();
        let pattern = sample_pattern(&vars);
        let mut buf = Vec::new();
        let next = write_query(
            &mut buf,
            &pattern,
            0,
            "http://example.org/patterns/",
            &ex_prefixes(),
        )
        .unwrap();
        assert_eq!(next, 1);

        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("<http://example.org/patterns/Pattern_0> support=6"));
        assert!(text.contains("PREFIX ex: <http://example.org/>"));
        assert!(text.contains("SELECT DISTINCT ?v0 WHERE {"));
        assert!(text.contains("?v0 a ex:Person ."));
        assert!(text.contains(
            "?v0 ex:age \"30\"^^<http://www.w3.org/2001/XMLSchema#integer> ."
        ));
    }

    #[test]
    fn datatype_variable_becomes_filter() {
        let vars = VarAllocator::new();
        let root = Variable::ObjectType {
            class: Term::iri("http://example.org/Person"),
            var: vars.fresh(),
        };
        let assertion = Assertion::new(
            root.var(),
            Term::iri("http://example.org/age"),
            AssertionRhs::Variable(Variable::DataType {
                datatype: "http://www.w3.org/2001/XMLSchema#integer".into(),
                var: vars.fresh(),
            }),
            0,
            [node(1)].into_iter().collect(),
            [(node(2), [node(1)].into_iter().collect())]
                .into_iter()
                .collect(),
        );
        let pattern = GraphPattern::root_pattern(root, assertion);

        let mut buf = Vec::new();
        write_query(&mut buf, &pattern, 3, "urn:p:", &ex_prefixes()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("?v0 ex:age ?v1 ."));
        assert!(text.contains(
            "FILTER(DATATYPE(?v1) = <http://www.w3.org/2001/XMLSchema#integer>)"
        ));
    }

    #[test]
    fn numeric_cluster_becomes_range_filter() {
        let vars = VarAllocator::new();
        let root = Variable::ObjectType {
            class: Term::iri("http://example.org/Person"),
            var: vars.fresh(),
        };
        let cluster = crate::cluster::NumericCluster {
            mean: 25.0,
            std_dev: 2.0,
            min: 20.0,
            max: 30.0,
            count: 6,
        };
        let assertion = Assertion::new(
            root.var(),
            Term::iri("http://example.org/age"),
            AssertionRhs::Variable(Variable::MultiModalNumeric {
                datatype: "http://www.w3.org/2001/XMLSchema#integer".into(),
                cluster,
                var: vars.fresh(),
            }),
            0,
            [node(1)].into_iter().collect(),
            [(node(2), [node(1)].into_iter().collect())]
                .into_iter()
                .collect(),
        );
        let pattern = GraphPattern::root_pattern(root, assertion);

        let mut buf = Vec::new();
        write_query(&mut buf, &pattern, 0, "urn:p:", &[]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("FILTER(?v1 >= 20.000000 && ?v1 <= 30.000000)"));
    }

    #[test]
    fn unprefixed_iris_stay_angle_bracketed() {
        assert_eq!(
            render_term(&Term::iri("http://other.org/x"), &ex_prefixes()),
            "<http://other.org/x>"
        );
        assert_eq!(
            render_term(&Term::iri("http://example.org/knows"), &ex_prefixes()),
            "ex:knows"
        );
    }
}
