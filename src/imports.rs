//! Exactly-once default import of the tracker module.

use swc_core::{
    common::{SyntaxContext, DUMMY_SP},
    ecma::{ast::*, utils::prepend_stmt},
};

/// Name hint for the inserted binding. Unique bindings are derived from the
/// hint with a leading underscore, which yields the tracker function name.
pub const IMPORT_NAME_HINT: &str = "tracker";

pub fn import_local_name() -> String {
    format!("_{IMPORT_NAME_HINT}")
}

fn str_lit(value: &str) -> Str {
    Str {
        span: DUMMY_SP,
        value: value.into(),
        raw: None,
    }
}

fn ident(name: &str) -> Ident {
    Ident::new(name.into(), DUMMY_SP, SyntaxContext::empty())
}

// -----------------------------------------------------------------------------
// ES modules
// -----------------------------------------------------------------------------

pub fn module_imports(module: &Module, tracker_path: &str) -> bool {
    module.body.iter().any(|item| {
        matches!(
            item,
            ModuleItem::ModuleDecl(ModuleDecl::Import(import))
                if import.src.value.as_ref() == tracker_path
        )
    })
}

/// Prepends `import <local> from "<tracker_path>"`, after any directives.
pub fn insert_module_import(module: &mut Module, tracker_path: &str, local: &str) {
    let import_decl = ModuleItem::ModuleDecl(ModuleDecl::Import(ImportDecl {
        span: DUMMY_SP,
        specifiers: vec![ImportSpecifier::Default(ImportDefaultSpecifier {
            span: DUMMY_SP,
            local: ident(local),
        })],
        src: Box::new(str_lit(tracker_path)),
        type_only: false,
        with: None,
        phase: ImportPhase::Evaluation,
    }));
    prepend_stmt(&mut module.body, import_decl);
}

// -----------------------------------------------------------------------------
// Scripts (CommonJS)
// -----------------------------------------------------------------------------

fn is_require_of(expr: &Expr, tracker_path: &str) -> bool {
    let Expr::Call(call) = expr else {
        return false;
    };
    let Callee::Expr(callee) = &call.callee else {
        return false;
    };
    let is_require = matches!(&**callee, Expr::Ident(id) if id.sym.as_ref() == "require");
    is_require
        && matches!(
            call.args.first().map(|a| &*a.expr),
            Some(Expr::Lit(Lit::Str(s))) if s.value.as_ref() == tracker_path
        )
}

pub fn script_requires(script: &Script, tracker_path: &str) -> bool {
    script.body.iter().any(|stmt| match stmt {
        Stmt::Decl(Decl::Var(var)) => var
            .decls
            .iter()
            .filter_map(|d| d.init.as_deref())
            .any(|init| is_require_of(init, tracker_path)),
        _ => false,
    })
}

/// Prepends `var <local> = require("<tracker_path>")`, after any directives.
pub fn insert_script_import(script: &mut Script, tracker_path: &str, local: &str) {
    let require_call = Expr::Call(CallExpr {
        span: DUMMY_SP,
        callee: Callee::Expr(Box::new(Expr::Ident(ident("require")))),
        args: vec![ExprOrSpread {
            spread: None,
            expr: Box::new(Expr::Lit(Lit::Str(str_lit(tracker_path)))),
        }],
        type_args: None,
        ctxt: SyntaxContext::empty(),
    });
    let decl = Stmt::Decl(Decl::Var(Box::new(VarDecl {
        span: DUMMY_SP,
        kind: VarDeclKind::Var,
        declare: false,
        decls: vec![VarDeclarator {
            span: DUMMY_SP,
            name: Pat::Ident(BindingIdent {
                id: ident(local),
                type_ann: None,
            }),
            init: Some(Box::new(require_call)),
            definite: false,
        }],
        ctxt: SyntaxContext::empty(),
    })));
    prepend_stmt(&mut script.body, decl);
}

// -----------------------------------------------------------------------------
// Programs
// -----------------------------------------------------------------------------

/// Whether the program already binds the tracker module.
pub fn has_tracker_import(program: &Program, tracker_path: &str) -> bool {
    match program {
        Program::Module(m) => module_imports(m, tracker_path),
        Program::Script(s) => script_requires(s, tracker_path),
    }
}

pub fn insert_tracker_import(program: &mut Program, tracker_path: &str, local: &str) {
    match program {
        Program::Module(m) => insert_module_import(m, tracker_path, local),
        Program::Script(s) => insert_script_import(s, tracker_path, local),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_module() -> Module {
        Module {
            span: DUMMY_SP,
            body: vec![],
            shebang: None,
        }
    }

    fn import_sources(module: &Module) -> Vec<String> {
        module
            .body
            .iter()
            .filter_map(|item| match item {
                ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                    Some(import.src.value.to_string())
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn local_name_matches_tracker_function() {
        assert_eq!(import_local_name(), "_tracker");
    }

    #[test]
    fn inserts_default_import() {
        let mut program = Program::Module(empty_module());
        assert!(!has_tracker_import(&program, "@/tracker"));
        insert_tracker_import(&mut program, "@/tracker", "_tracker");
        assert!(has_tracker_import(&program, "@/tracker"));

        let Program::Module(module) = &program else {
            panic!("expected module");
        };
        assert_eq!(import_sources(module), vec!["@/tracker".to_string()]);
        let ModuleItem::ModuleDecl(ModuleDecl::Import(import)) = &module.body[0] else {
            panic!("expected import");
        };
        assert!(matches!(
            &import.specifiers[..],
            [ImportSpecifier::Default(d)] if d.local.sym.as_ref() == "_tracker"
        ));
    }

    #[test]
    fn other_imports_do_not_count() {
        let mut module = empty_module();
        insert_module_import(&mut module, "./index.css", "_css");
        assert!(!module_imports(&module, "tracker"));
        insert_module_import(&mut module, "tracker", "_tracker");
        assert!(module_imports(&module, "tracker"));
        assert_eq!(import_sources(&module).len(), 2);
    }

    #[test]
    fn script_gets_require() {
        let mut program = Program::Script(Script {
            span: DUMMY_SP,
            body: vec![],
            shebang: None,
        });
        assert!(!has_tracker_import(&program, "tracker"));
        insert_tracker_import(&mut program, "tracker", "_tracker");
        assert!(has_tracker_import(&program, "tracker"));
        assert!(!has_tracker_import(&program, "other"));
    }
}
