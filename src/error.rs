//! Rich diagnostic error types for the seshat engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so users know exactly what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the seshat engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, source spans) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum SeshatError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Mine(#[from] MineError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(seshat::graph::io),
        help(
            "A filesystem operation failed. Check that the input file exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("malformed N-Triples statement on line {line}: {statement}")]
    #[diagnostic(
        code(seshat::graph::parse_line),
        help(
            "Each non-comment line must be a full N-Triples statement terminated \
             by ' .'. Check for unescaped quotes or a missing object term."
        )
    )]
    ParseLine { line: usize, statement: String },

    #[error("node not found: {id}")]
    #[diagnostic(
        code(seshat::graph::node_not_found),
        help(
            "The node ID has no interned term in the graph index. \
             This indicates an internal bookkeeping bug, not bad input data."
        )
    )]
    NodeNotFound { id: u64 },

    #[error("graph contains no rdf:type statements")]
    #[diagnostic(
        code(seshat::graph::untyped),
        help(
            "Pattern discovery grows patterns from class roots, so the input \
             graph must assign at least one rdf:type to some entity."
        )
    )]
    Untyped,
}

// ---------------------------------------------------------------------------
// Clustering errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ClusterError {
    #[error("datatype {datatype} is not clusterable")]
    #[diagnostic(
        code(seshat::cluster::unsupported_datatype),
        help(
            "Only numeric, date/time, date-fragment, and string XSD datatypes \
             can be clustered. Other literal types are still usable as plain \
             data-type variables or bound values."
        )
    )]
    UnsupportedDatatype { datatype: String },

    #[error("empty value population for datatype {datatype}")]
    #[diagnostic(
        code(seshat::cluster::empty_population),
        help("Clustering requires at least one parseable literal value.")
    )]
    EmptyPopulation { datatype: String },
}

// ---------------------------------------------------------------------------
// Mining errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum MineError {
    #[error("worker failed while processing class {class}: {message}")]
    #[diagnostic(
        code(seshat::mine::worker_failed),
        help(
            "A parallel candidate-generation or extension task failed. The run \
             aborts rather than continuing with a corrupted frontier. The \
             underlying message should point at the defect."
        )
    )]
    WorkerFailed { class: String, message: String },

    #[error("failed to write pattern {number} to the output sink: {source}")]
    #[diagnostic(
        code(seshat::mine::write_failed),
        help(
            "The output stream rejected a query. Check disk space and that the \
             output path is writable."
        )
    )]
    WriteFailed {
        number: usize,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("probability {name} = {value} is outside [0, 1]")]
    #[diagnostic(
        code(seshat::config::probability),
        help("p_explore and p_extend are sampling probabilities; use a value in [0.0, 1.0].")
    )]
    Probability { name: &'static str, value: f64 },

    #[error("depth limit must be at least 1, got {value}")]
    #[diagnostic(
        code(seshat::config::depths),
        help("A run of depth 1 discovers only root patterns; 0 would discover nothing.")
    )]
    Depths { value: usize },

    #[error("min_support must be at least 1, got {value}")]
    #[diagnostic(
        code(seshat::config::min_support),
        help("A support threshold of 0 would accept every possible pattern.")
    )]
    MinSupport { value: usize },

    #[error("structural bound {name} must be at least 1, got {value}")]
    #[diagnostic(
        code(seshat::config::bounds),
        help("max_length and max_width bound the pattern tree; both must be positive.")
    )]
    Bounds { name: &'static str, value: usize },

    #[error("mode must generate at least one of A-box or T-box patterns")]
    #[diagnostic(
        code(seshat::config::mode),
        help("Valid modes are \"A\", \"T\", and \"AT\".")
    )]
    EmptyMode,
}

/// Convenience alias for functions returning seshat results.
pub type SeshatResult<T> = std::result::Result<T, SeshatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_error_converts_to_seshat_error() {
        let err = GraphError::ParseLine {
            line: 12,
            statement: "<a> <b>".into(),
        };
        let top: SeshatError = err.into();
        assert!(matches!(top, SeshatError::Graph(GraphError::ParseLine { .. })));
    }

    #[test]
    fn config_error_converts_to_seshat_error() {
        let err = ConfigError::Probability {
            name: "p_explore",
            value: 1.5,
        };
        let top: SeshatError = err.into();
        assert!(matches!(
            top,
            SeshatError::Config(ConfigError::Probability { .. })
        ));
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = ConfigError::Probability {
            name: "p_extend",
            value: -0.2,
        };
        let msg = format!("{err}");
        assert!(msg.contains("p_extend"));
        assert!(msg.contains("-0.2"));
    }
}
