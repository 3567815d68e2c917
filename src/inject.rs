//! Builds tracker call statements and splices them into function bodies.

use swc_core::{
    common::{sync::Lrc, FileName, SourceMap, Span, SyntaxContext, DUMMY_SP},
    ecma::{
        ast::*,
        parser::{parse_file_as_expr, EsSyntax, Syntax},
        utils::prepend_stmt,
        visit::{VisitMut, VisitMutWith},
    },
};

use crate::locator::{Body, TargetNode};
use crate::scanner::TRACKER_PARAM_TAG;

/// `callee(arg)` as an expression statement.
pub fn tracker_call(callee: &str, arg: Option<Box<Expr>>) -> Stmt {
    Stmt::Expr(ExprStmt {
        span: DUMMY_SP,
        expr: Box::new(Expr::Call(CallExpr {
            span: DUMMY_SP,
            callee: Callee::Expr(Box::new(Expr::Ident(Ident::new(
                callee.into(),
                DUMMY_SP,
                SyntaxContext::empty(),
            )))),
            args: arg
                .map(|expr| vec![ExprOrSpread { spread: None, expr }])
                .unwrap_or_default(),
            type_args: None,
            ctxt: SyntaxContext::empty(),
        })),
    })
}

/// `this._trackerParam`
pub fn self_param_member() -> Box<Expr> {
    Box::new(Expr::Member(MemberExpr {
        span: DUMMY_SP,
        obj: Box::new(Expr::This(ThisExpr { span: DUMMY_SP })),
        prop: MemberProp::Ident(IdentName::new(TRACKER_PARAM_TAG.into(), DUMMY_SP)),
    }))
}

/// Parses marker payload text into the call argument.
///
/// Returns `None` for an empty payload and for text that is not a single
/// JavaScript expression (e.g. `{a: {b: 1}` after first-brace truncation).
pub fn parse_payload(text: &str) -> Option<Box<Expr>> {
    if text.trim().is_empty() {
        return None;
    }
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(Lrc::new(FileName::Anon), text.to_string());
    let mut recovered = vec![];
    match parse_file_as_expr(
        &fm,
        Syntax::Es(EsSyntax::default()),
        EsVersion::latest(),
        None,
        &mut recovered,
    ) {
        Ok(mut expr) if recovered.is_empty() => {
            // Positions belong to the scratch source map, not the host file.
            expr.visit_mut_with(&mut ClearSpans);
            Some(expr)
        }
        _ => {
            tracing::warn!(
                payload = text,
                "tracker payload is not an expression, injecting without argument"
            );
            None
        }
    }
}

struct ClearSpans;

impl VisitMut for ClearSpans {
    fn visit_mut_span(&mut self, span: &mut Span) {
        *span = DUMMY_SP;
    }
}

/// Inserts `call` as the first effect of the target's body.
///
/// Block bodies get the call prepended (after any directive prologue).
/// Expression bodies become `{ call; return <expr>; }`, so the original
/// expression is evaluated after the call and its value is still returned.
/// Returns `false` when the target has no body to instrument.
pub fn inject_call(target: &mut TargetNode<'_>, call: Stmt) -> bool {
    let Some(body) = target.body_mut() else {
        return false;
    };
    match body {
        Body::Block(block) => prepend_stmt(&mut block.stmts, call),
        Body::Concise(body) => match body {
            BlockStmtOrExpr::BlockStmt(block) => prepend_stmt(&mut block.stmts, call),
            BlockStmtOrExpr::Expr(expr) => {
                let expr =
                    std::mem::replace(expr, Box::new(Expr::Invalid(Invalid { span: DUMMY_SP })));
                *body = BlockStmtOrExpr::BlockStmt(BlockStmt {
                    span: DUMMY_SP,
                    ctxt: SyntaxContext::empty(),
                    stmts: vec![
                        call,
                        Stmt::Return(ReturnStmt {
                            span: DUMMY_SP,
                            arg: Some(expr),
                        }),
                    ],
                });
            }
        },
    }
    true
}
