//! SWC plugin that instruments functions for analytics.
//!
//! Functions preceded by a `// _tracker` comment get a `_tracker()` call as
//! their first statement; `// _tracker&_trackerParam={...}` passes the object
//! literal through. Statements of the form `this._trackerParam = {...}` are
//! followed by `_tracker(this._trackerParam)`. Whenever anything was injected
//! the tracker module is imported once.

use swc_core::{
    common::{comments::Comments, BytePos, SyntaxContext, DUMMY_SP},
    ecma::{
        ast::*,
        utils::StmtLike,
        visit::{VisitMut, VisitMutWith},
    },
    plugin::{plugin_transform, proxies::TransformPluginProgramMetadata},
};
use tracing::{debug, warn};

pub mod config;
pub mod imports;
pub mod inject;
pub mod locator;
pub mod scanner;

pub use config::{ConfigError, TrackerConfig};

use imports::{has_tracker_import, import_local_name, insert_tracker_import};
use inject::{inject_call, parse_payload, self_param_member, tracker_call};
use locator::{locate, Candidate, TargetNode};
use scanner::{has_marker_comments, TRACKER_PARAM_TAG};

/// Name of the function every injected call invokes.
pub const TRACKER_FUNC_NAME: &str = "_tracker";

// -----------------------------------------------------------------------------
// Per-file state
// -----------------------------------------------------------------------------

/// Mutable context for one file; created on entry, dropped on exit.
#[derive(Debug, Default, Clone)]
pub struct FileState {
    pub has_marker_comments: bool,
    pub tracker_function_name: String,
    pub has_self_assigned_param: bool,
    pub import_already_present: bool,
    pub injected_calls: usize,
}

impl FileState {
    fn begin(has_marker_comments: bool) -> Self {
        Self {
            has_marker_comments,
            tracker_function_name: TRACKER_FUNC_NAME.to_string(),
            ..Default::default()
        }
    }

    /// Markers anywhere in the file import eagerly; otherwise only the
    /// assignment idiom pulls the import in.
    fn needs_import(&self) -> bool {
        self.has_marker_comments || self.has_self_assigned_param
    }
}

// -----------------------------------------------------------------------------
// Transform
// -----------------------------------------------------------------------------

pub struct TrackerTransform<C: Comments> {
    config: TrackerConfig,
    comments: C,
    file: FileState,
    /// Start of the innermost expression statement being visited. A comment
    /// there belongs to the statement, not to an arrow sharing its position.
    stmt_start: Option<BytePos>,
}

impl<C: Comments> TrackerTransform<C> {
    pub fn new(config: TrackerConfig, comments: C) -> Self {
        Self {
            config,
            comments,
            file: FileState::default(),
            stmt_start: None,
        }
    }

    fn instrument(&mut self, mut target: TargetNode<'_>, chain: &[Candidate]) {
        if !self.file.has_marker_comments {
            return;
        }
        let Some(attachment) = locate(&self.comments, chain) else {
            return;
        };
        let arg = parse_payload(&attachment.marker.param_text);
        let call = tracker_call(&self.file.tracker_function_name, arg);
        if inject_call(&mut target, call) {
            self.file.injected_calls += 1;
            debug!(
                kind = target.kind(),
                tier = ?attachment.tier,
                payload = %attachment.marker.param_text,
                "injected tracker call"
            );
        }
    }

    fn visit_fn_expr_with(&mut self, n: &mut FnExpr, fallback: Option<Candidate>) {
        n.visit_mut_children_with(self);
        let chain: Vec<_> = std::iter::once(Candidate::own(n.function.span.lo))
            .chain(fallback)
            .collect();
        self.instrument(TargetNode::FunctionExpression(&mut n.function), &chain);
    }

    fn visit_arrow_with(&mut self, n: &mut ArrowExpr, fallback: Option<Candidate>) {
        n.visit_mut_children_with(self);
        let own = (self.stmt_start != Some(n.span.lo)).then(|| Candidate::own(n.span.lo));
        let chain: Vec<_> = own.into_iter().chain(fallback).collect();
        self.instrument(TargetNode::ArrowFunction(n), &chain);
    }

    /// Initializer of a class field or variable declarator. Function values
    /// there may also be marked through their parent's comments.
    fn visit_fn_like_init(&mut self, expr: &mut Expr, fallback: Candidate) {
        match expr {
            Expr::Paren(p) => self.visit_fn_like_init(&mut p.expr, fallback),
            Expr::Fn(f) => self.visit_fn_expr_with(f, Some(fallback)),
            Expr::Arrow(a) => self.visit_arrow_with(a, Some(fallback)),
            _ => expr.visit_mut_with(self),
        }
    }

    /// Visits a statement list, appending `_tracker(this._trackerParam)`
    /// after every `this._trackerParam = ...;` statement.
    fn observe_stmts<T>(&mut self, items: &mut Vec<T>)
    where
        T: StmtLike + From<Stmt> + VisitMutWith<Self>,
    {
        let original = std::mem::take(items);
        items.reserve(original.len());
        for mut item in original {
            item.visit_mut_with(self);
            let observed = item.as_stmt().is_some_and(is_self_param_assignment);
            items.push(item);
            if observed {
                items.push(T::from(self.self_param_call()));
            }
        }
    }

    /// Single-statement slot (`if` branch, loop or label body): a matching
    /// assignment becomes `{ <assignment>; _tracker(this._trackerParam); }`.
    fn observe_single(&mut self, stmt: &mut Stmt) {
        if !is_self_param_assignment(stmt) {
            return;
        }
        let assign = std::mem::replace(stmt, Stmt::Empty(EmptyStmt { span: DUMMY_SP }));
        *stmt = Stmt::Block(BlockStmt {
            span: DUMMY_SP,
            ctxt: SyntaxContext::empty(),
            stmts: vec![assign, self.self_param_call()],
        });
    }

    fn self_param_call(&mut self) -> Stmt {
        self.file.has_self_assigned_param = true;
        self.file.injected_calls += 1;
        debug!("observed self-assigned tracker param");
        tracker_call(&self.file.tracker_function_name, Some(self_param_member()))
    }

    /// Ensures the import and hands back the file's final state.
    fn finish_file(&mut self, program: &mut Program) -> FileState {
        let mut state = std::mem::take(&mut self.file);
        if !state.needs_import() {
            return state;
        }
        let path = self.config.tracker_path.as_str();
        state.import_already_present = has_tracker_import(program, path);
        if !state.import_already_present {
            insert_tracker_import(program, path, &import_local_name());
        }
        debug!(
            tracker_path = path,
            injected_calls = state.injected_calls,
            import_already_present = state.import_already_present,
            "finished tracker instrumentation"
        );
        state
    }
}

fn unparen(mut expr: &Expr) -> &Expr {
    while let Expr::Paren(p) = expr {
        expr = &p.expr;
    }
    expr
}

/// `this._trackerParam = ...` in statement position, with any assignment operator.
fn is_self_param_assignment(stmt: &Stmt) -> bool {
    let Stmt::Expr(ExprStmt { expr, .. }) = stmt else {
        return false;
    };
    let Expr::Assign(assign) = unparen(expr) else {
        return false;
    };
    match &assign.left {
        AssignTarget::Simple(SimpleAssignTarget::Member(m)) => {
            matches!(&*m.obj, Expr::This(_))
                && matches!(&m.prop, MemberProp::Ident(p) if p.sym.as_ref() == TRACKER_PARAM_TAG)
        }
        _ => false,
    }
}

impl<C: Comments> VisitMut for TrackerTransform<C> {
    fn visit_mut_program(&mut self, program: &mut Program) {
        self.file = FileState::begin(has_marker_comments(program, &self.comments));
        program.visit_mut_children_with(self);
        self.finish_file(program);
    }

    fn visit_mut_module_items(&mut self, items: &mut Vec<ModuleItem>) {
        self.observe_stmts(items);
    }

    fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
        self.observe_stmts(stmts);
    }

    fn visit_mut_expr_stmt(&mut self, n: &mut ExprStmt) {
        let outer = self.stmt_start.replace(n.span.lo);
        n.visit_mut_children_with(self);
        self.stmt_start = outer;
    }

    fn visit_mut_if_stmt(&mut self, n: &mut IfStmt) {
        n.visit_mut_children_with(self);
        self.observe_single(&mut n.cons);
        if let Some(alt) = n.alt.as_deref_mut() {
            self.observe_single(alt);
        }
    }

    fn visit_mut_for_stmt(&mut self, n: &mut ForStmt) {
        n.visit_mut_children_with(self);
        self.observe_single(&mut n.body);
    }

    fn visit_mut_for_in_stmt(&mut self, n: &mut ForInStmt) {
        n.visit_mut_children_with(self);
        self.observe_single(&mut n.body);
    }

    fn visit_mut_for_of_stmt(&mut self, n: &mut ForOfStmt) {
        n.visit_mut_children_with(self);
        self.observe_single(&mut n.body);
    }

    fn visit_mut_while_stmt(&mut self, n: &mut WhileStmt) {
        n.visit_mut_children_with(self);
        self.observe_single(&mut n.body);
    }

    fn visit_mut_do_while_stmt(&mut self, n: &mut DoWhileStmt) {
        n.visit_mut_children_with(self);
        self.observe_single(&mut n.body);
    }

    fn visit_mut_labeled_stmt(&mut self, n: &mut LabeledStmt) {
        n.visit_mut_children_with(self);
        self.observe_single(&mut n.body);
    }

    fn visit_mut_with_stmt(&mut self, n: &mut WithStmt) {
        n.visit_mut_children_with(self);
        self.observe_single(&mut n.body);
    }

    fn visit_mut_fn_decl(&mut self, n: &mut FnDecl) {
        n.visit_mut_children_with(self);
        let own = Candidate::own(n.function.span.lo);
        self.instrument(TargetNode::FunctionDeclaration(&mut n.function), &[own]);
    }

    fn visit_mut_fn_expr(&mut self, n: &mut FnExpr) {
        self.visit_fn_expr_with(n, None);
    }

    fn visit_mut_arrow_expr(&mut self, n: &mut ArrowExpr) {
        self.visit_arrow_with(n, None);
    }

    fn visit_mut_class_method(&mut self, n: &mut ClassMethod) {
        n.visit_mut_children_with(self);
        let own = Candidate::own(n.span.lo);
        self.instrument(TargetNode::ClassMethod(&mut n.function), &[own]);
    }

    fn visit_mut_constructor(&mut self, n: &mut Constructor) {
        n.visit_mut_children_with(self);
        let own = Candidate::own(n.span.lo);
        self.instrument(TargetNode::Constructor(n), &[own]);
    }

    fn visit_mut_class_prop(&mut self, n: &mut ClassProp) {
        let field = Candidate::class_field(n.span.lo);
        let value = n.value.take();
        n.visit_mut_children_with(self);
        n.value = value;
        if let Some(value) = n.value.as_deref_mut() {
            self.visit_fn_like_init(value, field);
        }
    }

    fn visit_mut_var_decl(&mut self, n: &mut VarDecl) {
        let decl = Candidate::enclosing_decl(n.span.lo);
        for d in n.decls.iter_mut() {
            d.name.visit_mut_with(self);
            if let Some(init) = d.init.as_deref_mut() {
                self.visit_fn_like_init(init, decl);
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------------

#[plugin_transform]
pub fn process_transform(mut program: Program, metadata: TransformPluginProgramMetadata) -> Program {
    let config = match metadata.get_transform_plugin_config() {
        Some(raw) => TrackerConfig::from_json(&raw).unwrap_or_else(|err| {
            warn!(%err, "using default tracker config");
            TrackerConfig::default()
        }),
        None => TrackerConfig::default(),
    };

    let mut transform = TrackerTransform::new(config, metadata.comments);
    program.visit_mut_with(&mut transform);
    program
}
