//! Traversal dispatcher
//!
//! One analysis pass is one synchronous depth-first walk: every node is
//! visited exactly once in natural child order, nodes with a registered
//! handler are routed to it, and diagnostics accumulate into an ordered
//! sink returned at the end. Handlers never prune the walk or see each
//! other's output.

use crate::ast::{Ast, NodeId, NodeKind};
use crate::config::{ConfigError, NamePatterns, RuleConfig};
use crate::diagnostic::Diagnostic;
use crate::resolver::{ModuleResolver, ResolveError};
use crate::rule::RuleCode;
use crate::rules;
use log::{debug, trace};
use thiserror::Error;

/// Fatal failure of an analysis pass
///
/// Rule violations are diagnostics, never errors; these are collaborator
/// contract failures.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The resolver failed for a reason other than an unresolvable module
    #[error("module resolution failed for {module}: {source}")]
    Resolver {
        module: String,
        #[source]
        source: ResolveError,
    },

    /// The tree violates the producer contract
    #[error("malformed syntax tree: {0}")]
    MalformedTree(String),
}

/// The style checker engine
///
/// Holds the immutable per-run configuration; a pass itself keeps no state
/// beyond the sink it returns.
pub struct Checker {
    config: RuleConfig,
    patterns: NamePatterns,
}

impl Checker {
    /// Create a checker, compiling the configured name patterns once
    pub fn new(config: RuleConfig) -> Result<Self, ConfigError> {
        let patterns = NamePatterns::compile(&config)?;
        Ok(Self { config, patterns })
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Analyze one tree, returning diagnostics in discovery order
    pub fn analyze(
        &self,
        ast: &Ast,
        resolver: &dyn ModuleResolver,
    ) -> Result<Vec<Diagnostic>, CheckError> {
        let mut sink = Vec::new();
        let Some(root) = ast.root() else {
            return Ok(sink);
        };
        debug!("analyzing tree of {} nodes", ast.len());

        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            self.visit(ast, id, resolver, &mut sink)?;
            for &child in ast.children(id).iter().rev() {
                stack.push(child);
            }
        }

        sink.retain(|diag| self.config.is_rule_enabled(diag.code));
        for diag in &mut sink {
            if let Some(severity) = self.config.severity_override(diag.code) {
                diag.severity = severity;
            }
        }
        Ok(sink)
    }

    /// Route one node to the handlers registered for its kind
    fn visit(
        &self,
        ast: &Ast,
        id: NodeId,
        resolver: &dyn ModuleResolver,
        sink: &mut Vec<Diagnostic>,
    ) -> Result<(), CheckError> {
        let node = ast.node(id);
        trace!(
            "visiting {} at line {}",
            node.kind.name(),
            node.location.line
        );

        match &node.kind {
            NodeKind::ImportFrom { .. } => {
                // Disabling the one resolver-calling rule also skips its IO
                if self.config.is_rule_enabled(RuleCode::ImportModulesOnly) {
                    rules::import_modules_only(ast, id, &self.config, resolver, sink)?;
                }
                rules::import_full_path_only(ast, id, sink);
            }
            NodeKind::Assign { .. } => {
                rules::avoid_global_variables(ast, id, &self.patterns, sink)
            }
            NodeKind::Raise => rules::no_archaic_raise(ast, id, sink),
            NodeKind::ExceptHandler { .. } => rules::no_catch_standard_error(ast, id, sink),
            NodeKind::TryExcept { .. } => {
                rules::limit_try_except_size(ast, id, &self.config, sink)
            }
            NodeKind::TryFinally { .. } => rules::limit_finally_size(ast, id, &self.config, sink),
            NodeKind::Module { .. }
            | NodeKind::FunctionDef { .. }
            | NodeKind::ClassDef { .. }
            | NodeKind::Name { .. }
            | NodeKind::Attribute { .. }
            | NodeKind::Tuple { .. }
            | NodeKind::List { .. }
            | NodeKind::Call
            | NodeKind::Str { .. }
            | NodeKind::Const { .. }
            | NodeKind::Expr
            | NodeKind::Pass
            | NodeKind::Return => {}
        }
        Ok(())
    }
}
