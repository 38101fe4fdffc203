//! pyguide - Google Python Style Guide checker engine
//!
//! A rule-based static-analysis engine for Python syntax trees. It consumes
//! an already-parsed tree, walks it once, and emits structured diagnostics
//! for the style checks it knows about.
//!
//! # Architecture
//!
//! ```text
//! Parser -> Ast -> Checker -> rule handlers -> Vec<Diagnostic> -> caller
//! ```
//!
//! The checker compiles the configured naming patterns once, performs a
//! single depth-first walk, and routes each node kind to the handlers
//! registered for it. Rendering, exit codes and configuration discovery
//! policy belong to the host.
//!
//! # Example
//!
//! ```
//! use pyguide::{AstBuilder, Checker, NodeKind, PathResolver, RuleConfig};
//!
//! let mut builder = AstBuilder::new("app.py");
//! let module = builder.add(NodeKind::Module { name: "app".into() }, 1, 1);
//! let target = builder.add(NodeKind::Name { id: "cache".into() }, 2, 1);
//! let value = builder.add(NodeKind::Const { repr: "{}".into() }, 2, 9);
//! let assign = builder.add(NodeKind::Assign { targets: vec![target] }, 2, 1);
//! builder.attach(module, assign);
//! builder.attach(assign, target);
//! builder.attach(assign, value);
//!
//! let checker = Checker::new(RuleConfig::default()).unwrap();
//! let resolver = PathResolver::default();
//! let diagnostics = checker.analyze(&builder.build(), &resolver).unwrap();
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].message(), "cache declared at the module level (i.e. global)");
//! ```

pub mod ast;
pub mod checker;
pub mod config;
pub mod diagnostic;
pub mod resolver;
pub mod rule;

mod rules;

// Re-export main types
pub use ast::{count_tree_size, Ast, AstBuilder, ImportedName, Node, NodeId, NodeKind};
pub use checker::{CheckError, Checker};
pub use config::{ConfigError, NamePatterns, RuleConfig};
pub use diagnostic::{ArgValue, Diagnostic, Location, Severity};
pub use resolver::{ModuleResolver, PathResolver, ResolveError};
pub use rule::RuleCode;
