//! Root Pattern Builder: depth-0 patterns from class/predicate statistics.
//!
//! For every class whose instance count clears the support threshold, each
//! qualifying predicate contributes up to three shapes of seed pattern:
//! typed-object extensions (T-box), bound-value extensions (A-box), and
//! multimodal-cluster extensions. Predicates of one class are evaluated on
//! independent rayon workers; nothing here needs a lock.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use crate::cluster::{ClusterSummary, compute_clusters};
use crate::error::{GraphError, SeshatResult};
use crate::graph::KnowledgeGraph;
use crate::pattern::{Assertion, AssertionRhs, GraphPattern, VarAllocator, Variable};
use crate::term::{
    NodeId, RDFS_LABEL, Term, XSD_NUMERIC, XSD_STRING, is_clusterable, is_temporal,
};

use super::MineConfig;

/// Mapping from class term to that class's depth-0 patterns.
///
/// Built once per run and read-only during growth, where it doubles as the
/// extension catalogue: "what predicates/targets are known for class X".
pub type RootPatternIndex = HashMap<Term, Vec<GraphPattern>>;

/// Build the Root Pattern Index for every sufficiently supported class.
pub fn init_root_patterns(
    kg: &KnowledgeGraph,
    cfg: &MineConfig,
    vars: &VarAllocator,
) -> SeshatResult<RootPatternIndex> {
    let rdf_type = kg.rdf_type_id().ok_or(GraphError::Untyped)?;
    let rdfs_label = kg.id(&Term::iri(RDFS_LABEL));

    // If a class has fewer instances than min_support, no pattern rooted in
    // it can reach min_support either.
    let mut classes: Vec<(Term, NodeId)> = Vec::new();
    for (class_id, count) in kg.classes() {
        if count >= cfg.min_support {
            classes.push((kg.term(class_id)?, class_id));
        }
    }
    classes.sort();

    let mut index = RootPatternIndex::new();
    for (class_term, class_id) in classes {
        let members = kg.instances_of_class(class_id);

        let qualifying: Vec<NodeId> = kg
            .predicates()
            .into_iter()
            .filter(|&p| p != rdf_type && Some(p) != rdfs_label)
            .filter(|&p| {
                let subjects: HashSet<NodeId> = kg
                    .relation_adjacency(p)
                    .into_iter()
                    .filter(|(s, _)| members.contains(s))
                    .map(|(s, _)| s)
                    .collect();
                subjects.len() >= cfg.min_support
            })
            .collect();

        let per_predicate: Vec<Vec<GraphPattern>> = qualifying
            .par_iter()
            .map(|&p| compute_root_patterns(kg, cfg, vars, &class_term, &members, p))
            .collect::<SeshatResult<_>>()?;

        let patterns: HashSet<GraphPattern> = per_predicate.into_iter().flatten().collect();
        tracing::info!(class = %class_term, discovered = patterns.len(), "mapped root patterns");

        if !patterns.is_empty() {
            index.insert(class_term, patterns.into_iter().collect());
        }
    }

    Ok(index)
}

/// Compute all root patterns for one (class, predicate) pair.
fn compute_root_patterns(
    kg: &KnowledgeGraph,
    cfg: &MineConfig,
    vars: &VarAllocator,
    class_term: &Term,
    members: &HashSet<NodeId>,
    predicate: NodeId,
) -> SeshatResult<Vec<GraphPattern>> {
    let p_term = kg.term(predicate)?;
    let pairs: Vec<(NodeId, NodeId)> = kg
        .relation_adjacency(predicate)
        .into_iter()
        .filter(|(s, _)| members.contains(s))
        .collect();
    let Some(&(_, probe)) = pairs.last() else {
        return Ok(Vec::new());
    };

    let domain: HashSet<NodeId> = pairs.iter().map(|&(s, _)| s).collect();
    let mut inv_map: HashMap<NodeId, HashSet<NodeId>> = HashMap::new();
    for &(s, o) in &pairs {
        inv_map.entry(o).or_default().insert(s);
    }

    // Infer the object kind from one sampled edge and assume every edge of
    // this predicate from this class agrees. Usually true in well-engineered
    // graphs; an optimization by approximation.
    let probe_datatype = kg.literal_datatype(probe);

    let mut out = Vec::new();

    if cfg.mode.tbox() {
        let rhs_var = match &probe_datatype {
            Some(datatype) => Some(Variable::DataType {
                datatype: datatype.clone(),
                var: vars.fresh(),
            }),
            // Object is an entity: take its first declared type, skip if untyped.
            None => match kg.types_of(probe).first() {
                Some(&object_class) => Some(Variable::ObjectType {
                    class: kg.term(object_class)?,
                    var: vars.fresh(),
                }),
                None => None,
            },
        };

        if let Some(rhs_var) = rhs_var {
            let root = Variable::ObjectType {
                class: class_term.clone(),
                var: vars.fresh(),
            };
            let assertion = Assertion::new(
                root.var(),
                p_term.clone(),
                AssertionRhs::Variable(rhs_var),
                0,
                domain.clone(),
                inv_map.clone(),
            );
            let pattern = GraphPattern::root_pattern(root, assertion);
            if pattern.support() >= cfg.min_support {
                out.push(pattern);
            }
        }
    }

    if cfg.mode.abox() {
        // Interning makes equal literals share a node, so grouping by object
        // ID groups by concrete value for entities and literals alike.
        for (&object, subjects) in &inv_map {
            if subjects.len() < cfg.min_support {
                continue;
            }
            let root = Variable::ObjectType {
                class: class_term.clone(),
                var: vars.fresh(),
            };
            let assertion = Assertion::new(
                root.var(),
                p_term.clone(),
                AssertionRhs::Bound(kg.term(object)?),
                0,
                subjects.clone(),
                [(object, subjects.clone())].into_iter().collect(),
            );
            let pattern = GraphPattern::root_pattern(root, assertion);
            if pattern.support() >= cfg.min_support {
                out.push(pattern);
            }
        }
    }

    if cfg.multimodal() {
        if let Some(datatype) = &probe_datatype {
            if modality_enabled(cfg, datatype) && pairs.len() >= cfg.min_support {
                out.extend(multimodal_patterns(
                    kg, cfg, vars, class_term, &p_term, datatype, &inv_map,
                )?);
            }
        }
    }

    Ok(out)
}

/// Whether the datatype's modality family is switched on.
fn modality_enabled(cfg: &MineConfig, datatype: &str) -> bool {
    if !is_clusterable(datatype) {
        return false;
    }
    if XSD_STRING.contains(&datatype) {
        return cfg.textual;
    }
    if XSD_NUMERIC.contains(&datatype) {
        return cfg.numerical;
    }
    debug_assert!(is_temporal(datatype));
    cfg.temporal
}

/// Cluster the predicate's literal population and emit one multimodal pattern
/// per sufficiently supported cluster.
fn multimodal_patterns(
    kg: &KnowledgeGraph,
    cfg: &MineConfig,
    vars: &VarAllocator,
    class_term: &Term,
    p_term: &Term,
    datatype: &str,
    inv_map: &HashMap<NodeId, HashSet<NodeId>>,
) -> SeshatResult<Vec<GraphPattern>> {
    let mut ids: Vec<NodeId> = inv_map.keys().copied().collect();
    ids.sort();
    let mut values = Vec::with_capacity(ids.len());
    for &id in &ids {
        match kg.term(id)? {
            Term::Literal { lexical, .. } => values.push(lexical),
            // Kind was inferred from one sample; a stray entity object just
            // falls out of the population.
            _ => values.push(String::new()),
        }
    }

    let clusters = compute_clusters(datatype, &values, &ids)?;

    let mut out = Vec::new();
    for (member_ids, summary) in clusters {
        let cluster_inv: HashMap<NodeId, HashSet<NodeId>> = member_ids
            .iter()
            .filter_map(|id| inv_map.get(id).map(|subjects| (*id, subjects.clone())))
            .collect();
        let cluster_domain: HashSet<NodeId> =
            cluster_inv.values().flatten().copied().collect();

        let rhs_var = match summary {
            ClusterSummary::Numeric(cluster) => Variable::MultiModalNumeric {
                datatype: datatype.to_string(),
                cluster,
                var: vars.fresh(),
            },
            ClusterSummary::String(cluster) => Variable::MultiModalString {
                datatype: datatype.to_string(),
                cluster,
                var: vars.fresh(),
            },
        };
        let root = Variable::ObjectType {
            class: class_term.clone(),
            var: vars.fresh(),
        };
        let assertion = Assertion::new(
            root.var(),
            p_term.clone(),
            AssertionRhs::Variable(rhs_var),
            0,
            cluster_domain,
            cluster_inv,
        );
        let pattern = GraphPattern::root_pattern(root, assertion);
        if pattern.support() >= cfg.min_support {
            out.push(pattern);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mine::Mode;
    use crate::term::RDF_TYPE;

    const XSD_INT: &str = "http://www.w3.org/2001/XMLSchema#integer";

    fn iri(local: &str) -> Term {
        Term::iri(format!("http://example.org/{local}"))
    }

    /// Ten persons, all with an integer `age`: 6 aged 30, 4 aged 40.
    fn age_graph() -> KnowledgeGraph {
        let kg = KnowledgeGraph::new();
        let rdf_type = Term::iri(RDF_TYPE);
        for i in 0..10 {
            let person = iri(&format!("p{i}"));
            kg.insert(&person, &rdf_type, &iri("Person"));
            let age = if i < 6 { "30" } else { "40" };
            kg.insert(&person, &iri("age"), &Term::typed_literal(age, XSD_INT));
        }
        kg
    }

    fn config(mode: Mode, min_support: usize) -> MineConfig {
        MineConfig {
            mode,
            min_support,
            ..Default::default()
        }
    }

    #[test]
    fn tbox_emits_one_datatype_pattern() {
        let kg = age_graph();
        let vars = VarAllocator::new();
        let index = init_root_patterns(&kg, &config(Mode::T, 5), &vars).unwrap();

        let patterns = &index[&iri("Person")];
        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert_eq!(p.support(), 10);
        let rhs = p.creating_assertion().rhs.variable().unwrap();
        assert!(matches!(rhs, Variable::DataType { datatype, .. } if datatype == XSD_INT));
    }

    #[test]
    fn abox_keeps_only_supported_values() {
        let kg = age_graph();
        let vars = VarAllocator::new();
        let index = init_root_patterns(&kg, &config(Mode::A, 5), &vars).unwrap();

        // age=30 has frequency 6 >= 5; age=40 has 4 < 5 and is dropped.
        let patterns = &index[&iri("Person")];
        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert_eq!(p.support(), 6);
        match &p.creating_assertion().rhs {
            AssertionRhs::Bound(Term::Literal { lexical, .. }) => assert_eq!(lexical, "30"),
            other => panic!("unexpected rhs: {other:?}"),
        }
    }

    #[test]
    fn class_below_min_support_is_dropped() {
        let kg = age_graph();
        let vars = VarAllocator::new();
        let index = init_root_patterns(&kg, &config(Mode::AT, 11), &vars).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn untyped_graph_is_an_error() {
        let kg = KnowledgeGraph::new();
        kg.insert(&iri("a"), &iri("p"), &iri("b"));
        let vars = VarAllocator::new();
        let err = init_root_patterns(&kg, &MineConfig::default(), &vars).unwrap_err();
        assert!(matches!(
            err,
            crate::error::SeshatError::Graph(GraphError::Untyped)
        ));
    }

    #[test]
    fn tbox_object_pattern_uses_object_class() {
        let kg = KnowledgeGraph::new();
        let rdf_type = Term::iri(RDF_TYPE);
        for i in 0..5 {
            let person = iri(&format!("p{i}"));
            let city = iri(&format!("c{i}"));
            kg.insert(&person, &rdf_type, &iri("Person"));
            kg.insert(&city, &rdf_type, &iri("City"));
            kg.insert(&person, &iri("livesIn"), &city);
        }
        let vars = VarAllocator::new();
        let index = init_root_patterns(&kg, &config(Mode::T, 3), &vars).unwrap();

        let person_roots = &index[&iri("Person")];
        assert_eq!(person_roots.len(), 1);
        let rhs = person_roots[0].creating_assertion().rhs.variable().unwrap();
        assert_eq!(rhs.class(), Some(&iri("City")));
    }

    #[test]
    fn untyped_objects_yield_no_tbox_pattern() {
        let kg = KnowledgeGraph::new();
        let rdf_type = Term::iri(RDF_TYPE);
        for i in 0..5 {
            let person = iri(&format!("p{i}"));
            kg.insert(&person, &rdf_type, &iri("Person"));
            // Object entities carry no rdf:type.
            kg.insert(&person, &iri("likes"), &iri(&format!("thing{i}")));
        }
        let vars = VarAllocator::new();
        let index = init_root_patterns(&kg, &config(Mode::T, 3), &vars).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn multimodal_clusters_bimodal_ages() {
        let kg = KnowledgeGraph::new();
        let rdf_type = Term::iri(RDF_TYPE);
        for i in 0..12 {
            let person = iri(&format!("p{i}"));
            kg.insert(&person, &rdf_type, &iri("Person"));
            // Two bands: ages near 20 and near 80, distinct values so every
            // literal is its own node.
            let age = if i < 6 { 20 + i } else { 74 + i };
            kg.insert(
                &person,
                &iri("age"),
                &Term::typed_literal(age.to_string(), XSD_INT),
            );
        }
        let vars = VarAllocator::new();
        let cfg = MineConfig {
            mode: Mode::T,
            min_support: 5,
            numerical: true,
            ..Default::default()
        };
        let index = init_root_patterns(&kg, &cfg, &vars).unwrap();

        let patterns = &index[&iri("Person")];
        let multimodal: Vec<_> = patterns
            .iter()
            .filter(|p| {
                matches!(
                    p.creating_assertion().rhs.variable(),
                    Some(Variable::MultiModalNumeric { .. })
                )
            })
            .collect();
        assert_eq!(multimodal.len(), 2);
        assert!(multimodal.iter().all(|p| p.support() == 6));
    }

    #[test]
    fn disabled_modality_emits_no_clusters() {
        let kg = age_graph();
        let vars = VarAllocator::new();
        let cfg = MineConfig {
            mode: Mode::T,
            min_support: 5,
            textual: true, // numeric population, textual flag only
            ..Default::default()
        };
        let index = init_root_patterns(&kg, &cfg, &vars).unwrap();
        let patterns = &index[&iri("Person")];
        assert!(patterns.iter().all(|p| {
            !matches!(
                p.creating_assertion().rhs.variable(),
                Some(Variable::MultiModalNumeric { .. } | Variable::MultiModalString { .. })
            )
        }));
    }
}
