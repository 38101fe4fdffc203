//! The seven style checks
//!
//! Each handler consumes one node event plus the shared configuration and
//! appends zero or more diagnostics to the sink. Handlers are stateless and
//! never look at each other's output; the dispatcher decides which handler
//! sees which node kind.

use crate::ast::{count_tree_size, Ast, ImportedName, NodeId, NodeKind};
use crate::checker::CheckError;
use crate::config::{NamePatterns, RuleConfig};
use crate::diagnostic::Diagnostic;
use crate::resolver::ModuleResolver;
use crate::rule::RuleCode;
use log::trace;

/// Use imports for packages and modules only.
///
/// For each name in an absolute `from x import y1, y2` the candidate path
/// `x.y` must resolve as a module; names that resolve to anything else (or
/// nothing) are flagged. The lookup belongs to the nearest enclosing scope
/// that can resolve imports, found by walking the parent chain.
pub(crate) fn import_modules_only(
    ast: &Ast,
    id: NodeId,
    config: &RuleConfig,
    resolver: &dyn ModuleResolver,
    sink: &mut Vec<Diagnostic>,
) -> Result<(), CheckError> {
    let node = ast.node(id);
    let NodeKind::ImportFrom {
        module,
        names,
        level,
    } = &node.kind
    else {
        return Ok(());
    };

    if *level != 0 || config.ignores_module(module) {
        return Ok(());
    }

    let scope = find_import_scope(ast, id)?;
    trace!("resolving imports of {} in scope {}", module, scope);

    for child in dotted_names(module, names) {
        match resolver.resolve(&child) {
            Ok(()) => {}
            Err(err) if err.is_unresolvable() => {
                sink.push(
                    Diagnostic::new(RuleCode::ImportModulesOnly, id, node.location.clone())
                        .with_arg("child", child),
                );
            }
            Err(source) => {
                return Err(CheckError::Resolver {
                    module: child,
                    source,
                })
            }
        }
    }
    Ok(())
}

/// Import each module using the full pathname location of the module.
pub(crate) fn import_full_path_only(ast: &Ast, id: NodeId, sink: &mut Vec<Diagnostic>) {
    let node = ast.node(id);
    let NodeKind::ImportFrom {
        module,
        names,
        level,
    } = &node.kind
    else {
        return;
    };

    if *level == 0 {
        return;
    }

    for child in dotted_names(module, names) {
        sink.push(
            Diagnostic::new(RuleCode::ImportFullPath, id, node.location.clone())
                .with_arg("module", child),
        );
    }
}

/// Avoid global variables.
///
/// Only fires for assignments whose parent is the module root. Names
/// matching the class, constant or dunder conventions are allowed.
pub(crate) fn avoid_global_variables(
    ast: &Ast,
    id: NodeId,
    patterns: &NamePatterns,
    sink: &mut Vec<Diagnostic>,
) {
    let node = ast.node(id);
    let NodeKind::Assign { targets } = &node.kind else {
        return;
    };

    let at_module_level = node
        .parent
        .is_some_and(|p| matches!(ast.node(p).kind, NodeKind::Module { .. }));
    if !at_module_level {
        return;
    }

    for &target in targets {
        check_assignment_target(ast, target, patterns, sink);
    }
}

fn check_assignment_target(
    ast: &Ast,
    target: NodeId,
    patterns: &NamePatterns,
    sink: &mut Vec<Diagnostic>,
) {
    let node = ast.node(target);
    match &node.kind {
        NodeKind::Tuple { elts } | NodeKind::List { elts } => {
            for &elt in elts {
                check_assignment_target(ast, elt, patterns, sink);
            }
        }
        NodeKind::Name { id: name } => {
            if !patterns.allows_global(name) {
                sink.push(
                    Diagnostic::new(RuleCode::GlobalVariable, target, node.location.clone())
                        .with_arg("name", name.clone()),
                );
            }
        }
        // Subscript, attribute and starred targets carry their names elsewhere
        _ => {}
    }
}

/// Don't use the two-argument form of raise or the string raise.
pub(crate) fn no_archaic_raise(ast: &Ast, id: NodeId, sink: &mut Vec<Diagnostic>) {
    let node = ast.node(id);
    if !matches!(node.kind, NodeKind::Raise) {
        return;
    }

    let children = ast.children(id);
    if children.len() > 1 && !matches!(ast.node(children[1]).kind, NodeKind::Name { .. }) {
        sink.push(Diagnostic::new(
            RuleCode::TwoArgException,
            id,
            node.location.clone(),
        ));
    } else if children.len() == 1 && matches!(ast.node(children[0]).kind, NodeKind::Str { .. }) {
        sink.push(Diagnostic::new(
            RuleCode::StringException,
            id,
            node.location.clone(),
        ));
    }
}

/// Never catch StandardError.
///
/// Bare handlers and broad `except Exception` handlers are covered by other
/// checkers and stay silent here.
pub(crate) fn no_catch_standard_error(ast: &Ast, id: NodeId, sink: &mut Vec<Diagnostic>) {
    let node = ast.node(id);
    let NodeKind::ExceptHandler { ty: Some(ty) } = &node.kind else {
        return;
    };

    if let NodeKind::Name { id: name } = &ast.node(*ty).kind {
        if name == "StandardError" {
            sink.push(Diagnostic::new(
                RuleCode::CatchStandardError,
                id,
                node.location.clone(),
            ));
        }
    }
}

/// Minimize the amount of code in a try/except block.
pub(crate) fn limit_try_except_size(
    ast: &Ast,
    id: NodeId,
    config: &RuleConfig,
    sink: &mut Vec<Diagnostic>,
) {
    let node = ast.node(id);
    let NodeKind::TryExcept { body, handlers, .. } = &node.kind else {
        return;
    };

    let try_nodes: usize = body.iter().map(|&stmt| count_tree_size(ast, stmt)).sum();
    if try_nodes > config.max_try_nodes {
        sink.push(
            Diagnostic::new(RuleCode::TryTooLong, id, node.location.clone())
                .with_arg("found", try_nodes),
        );
    }

    for &handler in handlers {
        let except_nodes = count_tree_size(ast, handler);
        if except_nodes > config.max_except_nodes {
            sink.push(
                Diagnostic::new(
                    RuleCode::ExceptTooLong,
                    handler,
                    ast.node(handler).location.clone(),
                )
                .with_arg("found", except_nodes),
            );
        }
    }
}

/// Minimize the amount of code in a finally block.
pub(crate) fn limit_finally_size(
    ast: &Ast,
    id: NodeId,
    config: &RuleConfig,
    sink: &mut Vec<Diagnostic>,
) {
    let node = ast.node(id);
    let NodeKind::TryFinally { finalbody, .. } = &node.kind else {
        return;
    };

    let finally_nodes: usize = finalbody
        .iter()
        .map(|&stmt| count_tree_size(ast, stmt))
        .sum();
    if finally_nodes > config.max_finally_nodes {
        sink.push(
            Diagnostic::new(RuleCode::FinallyTooLong, id, node.location.clone())
                .with_arg("found", finally_nodes),
        );
    }
}

/// Rearrange `from x import y` as `x.y` for each imported name
fn dotted_names<'a>(
    module: &'a str,
    names: &'a [ImportedName],
) -> impl Iterator<Item = String> + 'a {
    names.iter().map(move |n| format!("{}.{}", module, n.name))
}

/// Walk the parent chain to the nearest scope that can resolve imports
///
/// Reaching the root without finding one is a producer contract violation,
/// not a recoverable condition.
fn find_import_scope(ast: &Ast, id: NodeId) -> Result<NodeId, CheckError> {
    let mut current = ast.parent(id);
    while let Some(ancestor) = current {
        if ast.node(ancestor).kind.resolves_imports() {
            return Ok(ancestor);
        }
        current = ast.parent(ancestor);
    }
    Err(CheckError::MalformedTree(format!(
        "no import-resolving scope above {} node {}",
        ast.node(id).kind.name(),
        id
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstBuilder;
    use crate::diagnostic::ArgValue;
    use crate::resolver::ResolveError;

    struct KnownModules(&'static [&'static str]);

    impl ModuleResolver for KnownModules {
        fn resolve(&self, dotted_path: &str) -> Result<(), ResolveError> {
            if self.0.contains(&dotted_path) {
                Ok(())
            } else {
                Err(ResolveError::Unresolvable {
                    module: dotted_path.to_string(),
                })
            }
        }
    }

    struct BrokenResolver;

    impl ModuleResolver for BrokenResolver {
        fn resolve(&self, dotted_path: &str) -> Result<(), ResolveError> {
            Err(ResolveError::Io {
                module: dotted_path.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        }
    }

    fn module_builder() -> (AstBuilder, NodeId) {
        let mut b = AstBuilder::new("test.py");
        let module = b.add(
            NodeKind::Module {
                name: "test".to_string(),
            },
            1,
            1,
        );
        (b, module)
    }

    fn import_from(
        b: &mut AstBuilder,
        parent: NodeId,
        module: &str,
        names: &[&str],
        level: u32,
    ) -> NodeId {
        let node = b.add(
            NodeKind::ImportFrom {
                module: module.to_string(),
                names: names.iter().map(|n| ImportedName::new(n)).collect(),
                level,
            },
            2,
            1,
        );
        b.attach(parent, node);
        node
    }

    fn str_arg(diag: &Diagnostic, key: &str) -> String {
        match diag.args.get(key) {
            Some(ArgValue::Str(s)) => s.clone(),
            other => panic!("missing string arg {}: {:?}", key, other),
        }
    }

    #[test]
    fn test_import_modules_only_flags_unresolvable_names() {
        let (mut b, module) = module_builder();
        let import = import_from(&mut b, module, "os.path", &["join", "exists"], 0);
        let ast = b.build();

        let mut sink = Vec::new();
        import_modules_only(
            &ast,
            import,
            &RuleConfig::new(),
            &KnownModules(&["os.path.exists"]),
            &mut sink,
        )
        .unwrap();

        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].code, RuleCode::ImportModulesOnly);
        assert_eq!(sink[0].node, import);
        assert_eq!(str_arg(&sink[0], "child"), "os.path.join");
    }

    #[test]
    fn test_import_modules_only_checks_source_name_not_alias() {
        let (mut b, module) = module_builder();
        let import = b.add(
            NodeKind::ImportFrom {
                module: "os".to_string(),
                names: vec![ImportedName::aliased("path", "p")],
                level: 0,
            },
            2,
            1,
        );
        b.attach(module, import);
        let ast = b.build();

        let mut sink = Vec::new();
        import_modules_only(
            &ast,
            import,
            &RuleConfig::new(),
            &KnownModules(&["os.path"]),
            &mut sink,
        )
        .unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_import_modules_only_skips_ignored_and_relative() {
        let (mut b, module) = module_builder();
        let future = import_from(&mut b, module, "__future__", &["annotations"], 0);
        let relative = import_from(&mut b, module, "sibling", &["thing"], 1);
        let ast = b.build();

        let mut sink = Vec::new();
        import_modules_only(&ast, future, &RuleConfig::new(), &KnownModules(&[]), &mut sink)
            .unwrap();
        import_modules_only(&ast, relative, &RuleConfig::new(), &KnownModules(&[]), &mut sink)
            .unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_import_modules_only_propagates_internal_failure() {
        let (mut b, module) = module_builder();
        let import = import_from(&mut b, module, "os", &["sep"], 0);
        let ast = b.build();

        let mut sink = Vec::new();
        let err = import_modules_only(&ast, import, &RuleConfig::new(), &BrokenResolver, &mut sink)
            .unwrap_err();
        assert!(matches!(err, CheckError::Resolver { .. }));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_import_without_module_scope_is_malformed() {
        let mut b = AstBuilder::new("test.py");
        let func = b.add(
            NodeKind::FunctionDef {
                name: "f".to_string(),
            },
            1,
            1,
        );
        let import = import_from(&mut b, func, "os", &["sep"], 0);
        let ast = b.build();

        let mut sink = Vec::new();
        let err = import_modules_only(
            &ast,
            import,
            &RuleConfig::new(),
            &KnownModules(&["os.sep"]),
            &mut sink,
        )
        .unwrap_err();
        assert!(matches!(err, CheckError::MalformedTree(_)));
    }

    #[test]
    fn test_import_full_path_flags_each_relative_name() {
        let (mut b, module) = module_builder();
        let relative = import_from(&mut b, module, "sibling", &["thing", "other"], 1);
        let ast = b.build();

        let mut sink = Vec::new();
        import_full_path_only(&ast, relative, &mut sink);

        assert_eq!(sink.len(), 2);
        assert_eq!(str_arg(&sink[0], "module"), "sibling.thing");
        assert_eq!(str_arg(&sink[1], "module"), "sibling.other");
    }

    #[test]
    fn test_import_full_path_ignores_absolute() {
        let (mut b, module) = module_builder();
        let absolute = import_from(&mut b, module, "os.path", &["join"], 0);
        let ast = b.build();

        let mut sink = Vec::new();
        import_full_path_only(&ast, absolute, &mut sink);
        assert!(sink.is_empty());
    }

    fn global_assign(b: &mut AstBuilder, module: NodeId, name: &str) -> (NodeId, NodeId) {
        let target = b.add(
            NodeKind::Name {
                id: name.to_string(),
            },
            2,
            1,
        );
        let value = b.add(
            NodeKind::Const {
                repr: "1".to_string(),
            },
            2,
            5,
        );
        let assign = b.add(
            NodeKind::Assign {
                targets: vec![target],
            },
            2,
            1,
        );
        b.attach(module, assign);
        b.attach(assign, target);
        b.attach(assign, value);
        (assign, target)
    }

    #[test]
    fn test_global_variable_flags_plain_name() {
        let (mut b, module) = module_builder();
        let (assign, target) = global_assign(&mut b, module, "x");
        let ast = b.build();
        let patterns = NamePatterns::compile(&RuleConfig::new()).unwrap();

        let mut sink = Vec::new();
        avoid_global_variables(&ast, assign, &patterns, &mut sink);

        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].code, RuleCode::GlobalVariable);
        assert_eq!(sink[0].node, target);
        assert_eq!(str_arg(&sink[0], "name"), "x");
    }

    #[test]
    fn test_global_variable_allows_conventional_names() {
        let patterns = NamePatterns::compile(&RuleConfig::new()).unwrap();
        for name in ["TIMEOUT", "HttpClient", "__all__"] {
            let (mut b, module) = module_builder();
            let (assign, _) = global_assign(&mut b, module, name);
            let ast = b.build();

            let mut sink = Vec::new();
            avoid_global_variables(&ast, assign, &patterns, &mut sink);
            assert!(sink.is_empty(), "{} should be allowed", name);
        }
    }

    #[test]
    fn test_global_variable_ignores_nested_assignments() {
        let (mut b, module) = module_builder();
        let func = b.add(
            NodeKind::FunctionDef {
                name: "f".to_string(),
            },
            2,
            1,
        );
        b.attach(module, func);
        let (assign, _) = global_assign(&mut b, func, "x");
        let ast = b.build();
        let patterns = NamePatterns::compile(&RuleConfig::new()).unwrap();

        let mut sink = Vec::new();
        avoid_global_variables(&ast, assign, &patterns, &mut sink);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_global_variable_recurses_into_tuple_targets() {
        let (mut b, module) = module_builder();
        let first = b.add(
            NodeKind::Name {
                id: "a".to_string(),
            },
            2,
            1,
        );
        let second = b.add(
            NodeKind::Name {
                id: "OK".to_string(),
            },
            2,
            4,
        );
        let tuple = b.add(
            NodeKind::Tuple {
                elts: vec![first, second],
            },
            2,
            1,
        );
        let assign = b.add(
            NodeKind::Assign {
                targets: vec![tuple],
            },
            2,
            1,
        );
        b.attach(module, assign);
        b.attach(assign, tuple);
        b.attach(tuple, first);
        b.attach(tuple, second);
        let ast = b.build();
        let patterns = NamePatterns::compile(&RuleConfig::new()).unwrap();

        let mut sink = Vec::new();
        avoid_global_variables(&ast, assign, &patterns, &mut sink);

        assert_eq!(sink.len(), 1);
        assert_eq!(str_arg(&sink[0], "name"), "a");
    }

    fn raise_with(b: &mut AstBuilder, module: NodeId, children: Vec<NodeKind>) -> NodeId {
        let raise = b.add(NodeKind::Raise, 2, 1);
        b.attach(module, raise);
        for kind in children {
            let child = b.add(kind, 2, 7);
            b.attach(raise, child);
        }
        raise
    }

    #[test]
    fn test_two_arg_raise_flagged() {
        let (mut b, module) = module_builder();
        let raise = raise_with(
            &mut b,
            module,
            vec![
                NodeKind::Name {
                    id: "Exception".to_string(),
                },
                NodeKind::Str {
                    value: "message".to_string(),
                },
            ],
        );
        let ast = b.build();

        let mut sink = Vec::new();
        no_archaic_raise(&ast, raise, &mut sink);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].code, RuleCode::TwoArgException);
    }

    #[test]
    fn test_raise_from_name_is_fine() {
        // `raise err from cause` has a plain name in second position
        let (mut b, module) = module_builder();
        let raise = raise_with(
            &mut b,
            module,
            vec![
                NodeKind::Name {
                    id: "err".to_string(),
                },
                NodeKind::Name {
                    id: "cause".to_string(),
                },
            ],
        );
        let ast = b.build();

        let mut sink = Vec::new();
        no_archaic_raise(&ast, raise, &mut sink);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_string_raise_flagged() {
        let (mut b, module) = module_builder();
        let raise = raise_with(
            &mut b,
            module,
            vec![NodeKind::Str {
                value: "message".to_string(),
            }],
        );
        let ast = b.build();

        let mut sink = Vec::new();
        no_archaic_raise(&ast, raise, &mut sink);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].code, RuleCode::StringException);
    }

    #[test]
    fn test_call_raise_is_fine() {
        let (mut b, module) = module_builder();
        let raise = raise_with(&mut b, module, vec![NodeKind::Call]);
        let ast = b.build();

        let mut sink = Vec::new();
        no_archaic_raise(&ast, raise, &mut sink);
        assert!(sink.is_empty());
    }

    fn handler_catching(b: &mut AstBuilder, module: NodeId, ty: Option<NodeKind>) -> NodeId {
        let ty_id = ty.map(|kind| b.add(kind, 3, 8));
        let handler = b.add(NodeKind::ExceptHandler { ty: ty_id }, 3, 1);
        b.attach(module, handler);
        if let Some(ty_id) = ty_id {
            b.attach(handler, ty_id);
        }
        handler
    }

    #[test]
    fn test_catch_standard_error_flagged() {
        let (mut b, module) = module_builder();
        let handler = handler_catching(
            &mut b,
            module,
            Some(NodeKind::Name {
                id: "StandardError".to_string(),
            }),
        );
        let ast = b.build();

        let mut sink = Vec::new();
        no_catch_standard_error(&ast, handler, &mut sink);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].code, RuleCode::CatchStandardError);
    }

    #[test]
    fn test_other_handlers_are_fine() {
        let (mut b, module) = module_builder();
        let broad = handler_catching(
            &mut b,
            module,
            Some(NodeKind::Name {
                id: "Exception".to_string(),
            }),
        );
        let bare = handler_catching(&mut b, module, None);
        let dotted = handler_catching(
            &mut b,
            module,
            Some(NodeKind::Attribute {
                attr: "StandardError".to_string(),
            }),
        );
        let ast = b.build();

        let mut sink = Vec::new();
        no_catch_standard_error(&ast, broad, &mut sink);
        no_catch_standard_error(&ast, bare, &mut sink);
        no_catch_standard_error(&ast, dotted, &mut sink);
        assert!(sink.is_empty());
    }

    /// try with `body_size` single-node statements and handlers of the
    /// given total sizes
    fn try_except(
        b: &mut AstBuilder,
        module: NodeId,
        body_size: usize,
        handler_sizes: &[usize],
    ) -> (NodeId, Vec<NodeId>) {
        let body: Vec<NodeId> = (0..body_size).map(|_| b.add(NodeKind::Pass, 2, 5)).collect();
        let mut handlers = Vec::new();
        let mut handler_children = Vec::new();
        for &size in handler_sizes {
            let handler = b.add(NodeKind::ExceptHandler { ty: None }, 3, 1);
            let children: Vec<NodeId> =
                (1..size).map(|_| b.add(NodeKind::Pass, 4, 5)).collect();
            handlers.push(handler);
            handler_children.push(children);
        }
        let tryx = b.add(
            NodeKind::TryExcept {
                body: body.clone(),
                handlers: handlers.clone(),
                orelse: Vec::new(),
            },
            2,
            1,
        );
        b.attach(module, tryx);
        for &stmt in &body {
            b.attach(tryx, stmt);
        }
        for (handler, children) in handlers.iter().zip(&handler_children) {
            b.attach(tryx, *handler);
            for &child in children {
                b.attach(*handler, child);
            }
        }
        (tryx, handlers)
    }

    #[test]
    fn test_try_body_over_limit() {
        let (mut b, module) = module_builder();
        let (tryx, _) = try_except(&mut b, module, 26, &[1]);
        let ast = b.build();

        let mut sink = Vec::new();
        limit_try_except_size(&ast, tryx, &RuleConfig::new(), &mut sink);

        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].code, RuleCode::TryTooLong);
        assert_eq!(sink[0].args.get("found"), Some(&ArgValue::Int(26)));
    }

    #[test]
    fn test_try_body_at_limit_is_fine() {
        let (mut b, module) = module_builder();
        let (tryx, _) = try_except(&mut b, module, 25, &[1]);
        let ast = b.build();

        let mut sink = Vec::new();
        limit_try_except_size(&ast, tryx, &RuleConfig::new(), &mut sink);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_oversized_handler_reported_individually() {
        let (mut b, module) = module_builder();
        let (tryx, handlers) = try_except(&mut b, module, 1, &[10, 30]);
        let ast = b.build();

        let mut sink = Vec::new();
        limit_try_except_size(&ast, tryx, &RuleConfig::new(), &mut sink);

        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].code, RuleCode::ExceptTooLong);
        assert_eq!(sink[0].node, handlers[1]);
        assert_eq!(sink[0].args.get("found"), Some(&ArgValue::Int(30)));
    }

    fn try_finally(b: &mut AstBuilder, module: NodeId, finally_size: usize) -> NodeId {
        let body = vec![b.add(NodeKind::Pass, 2, 5)];
        let finalbody: Vec<NodeId> = (0..finally_size)
            .map(|_| b.add(NodeKind::Pass, 4, 5))
            .collect();
        let tryf = b.add(
            NodeKind::TryFinally {
                body: body.clone(),
                finalbody: finalbody.clone(),
            },
            2,
            1,
        );
        b.attach(module, tryf);
        for &stmt in body.iter().chain(&finalbody) {
            b.attach(tryf, stmt);
        }
        tryf
    }

    #[test]
    fn test_finally_body_over_limit() {
        let (mut b, module) = module_builder();
        let tryf = try_finally(&mut b, module, 14);
        let ast = b.build();

        let mut sink = Vec::new();
        limit_finally_size(&ast, tryf, &RuleConfig::new(), &mut sink);

        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].code, RuleCode::FinallyTooLong);
        assert_eq!(sink[0].args.get("found"), Some(&ArgValue::Int(14)));
    }

    #[test]
    fn test_finally_body_at_limit_is_fine() {
        let (mut b, module) = module_builder();
        let tryf = try_finally(&mut b, module, 13);
        let ast = b.build();

        let mut sink = Vec::new();
        limit_finally_size(&ast, tryf, &RuleConfig::new(), &mut sink);
        assert!(sink.is_empty());
    }
}
