//! Maps a function-like node to the marker comment that instruments it.
//!
//! Resolution walks an ordered chain of candidate positions and takes the
//! first one whose leading comments contain a marker:
//!
//! 1. the node itself (`// _tracker` above `function f() {}` or a class method)
//! 2. the enclosing class field (`// _tracker` above `handle = () => {}`)
//! 3. the enclosing variable declaration (`// _tracker` above `const f = () => {}`)

use swc_core::{
    common::{comments::Comments, BytePos},
    ecma::ast::{ArrowExpr, BlockStmt, BlockStmtOrExpr, Constructor, Function},
};

use crate::scanner::{find_marker, Marker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachTier {
    Own,
    ClassField,
    EnclosingDecl,
}

/// One link of the resolution chain: where to look for leading comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub tier: AttachTier,
    pub pos: BytePos,
}

impl Candidate {
    pub fn own(pos: BytePos) -> Self {
        Self {
            tier: AttachTier::Own,
            pos,
        }
    }

    pub fn class_field(pos: BytePos) -> Self {
        Self {
            tier: AttachTier::ClassField,
            pos,
        }
    }

    pub fn enclosing_decl(pos: BytePos) -> Self {
        Self {
            tier: AttachTier::EnclosingDecl,
            pos,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub tier: AttachTier,
    pub marker: Marker,
}

pub fn resolve_tier<C: Comments>(comments: &C, candidate: Candidate) -> Option<Attachment> {
    if candidate.pos.is_dummy() {
        return None;
    }
    let leading = comments.get_leading(candidate.pos)?;
    find_marker(&leading).map(|marker| Attachment {
        tier: candidate.tier,
        marker,
    })
}

/// First successful tier wins; tiers are never merged.
pub fn locate<C: Comments>(comments: &C, chain: &[Candidate]) -> Option<Attachment> {
    chain.iter().find_map(|c| resolve_tier(comments, *c))
}

// -----------------------------------------------------------------------------
// Target nodes
// -----------------------------------------------------------------------------

/// A function-like node that may receive an injected tracker call.
pub enum TargetNode<'a> {
    FunctionDeclaration(&'a mut Function),
    FunctionExpression(&'a mut Function),
    ArrowFunction(&'a mut ArrowExpr),
    ClassMethod(&'a mut Function),
    Constructor(&'a mut Constructor),
}

/// Mutable view of a target's body.
pub enum Body<'a> {
    Block(&'a mut BlockStmt),
    /// Arrow function body: a block or an implicit-return expression.
    Concise(&'a mut BlockStmtOrExpr),
}

impl TargetNode<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            TargetNode::FunctionDeclaration(_) => "function-declaration",
            TargetNode::FunctionExpression(_) => "function-expression",
            TargetNode::ArrowFunction(_) => "arrow-function",
            TargetNode::ClassMethod(_) => "class-method",
            TargetNode::Constructor(_) => "constructor",
        }
    }

    /// `None` for bodiless shapes (overload signatures, `declare` functions).
    pub fn body_mut(&mut self) -> Option<Body<'_>> {
        match self {
            TargetNode::FunctionDeclaration(f)
            | TargetNode::FunctionExpression(f)
            | TargetNode::ClassMethod(f) => f.body.as_mut().map(Body::Block),
            TargetNode::Constructor(c) => c.body.as_mut().map(Body::Block),
            TargetNode::ArrowFunction(a) => Some(Body::Concise(&mut a.body)),
        }
    }
}
