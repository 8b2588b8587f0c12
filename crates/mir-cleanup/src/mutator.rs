//! Cursor over a function body that lets a pass synthesize supporting
//! statements while it walks the same blocks.

use std::mem;

use mir_core::mir::{BasicBlockId, Body, LValue, RValue, Statement, Terminator, TerminatorKind};
use mir_core::span::Span;
use mir_core::types::TypeRef;

pub struct Mutator<'a> {
    body: &'a mut Body,
    cur_block: BasicBlockId,
    cur_stmt: usize,
    span: Span,
    new_statements: Vec<Statement>,
    statements_inserted: usize,
    temporaries_added: usize,
}

impl<'a> Mutator<'a> {
    pub fn new(body: &'a mut Body) -> Self {
        Self {
            body,
            cur_block: 0,
            cur_stmt: 0,
            span: Span::dummy(),
            new_statements: Vec::new(),
            statements_inserted: 0,
            temporaries_added: 0,
        }
    }

    pub fn body(&self) -> &Body {
        self.body
    }

    pub fn temporaries(&self) -> &[TypeRef] {
        &self.body.temporaries
    }

    pub fn cur_block(&self) -> BasicBlockId {
        self.cur_block
    }

    pub fn cur_stmt(&self) -> usize {
        self.cur_stmt
    }

    pub fn statements_inserted(&self) -> usize {
        self.statements_inserted
    }

    pub fn temporaries_added(&self) -> usize {
        self.temporaries_added
    }

    /// Move the cursor to the first statement of `block`.
    pub fn enter_block(&mut self, block: BasicBlockId) {
        debug_assert!(self.new_statements.is_empty());
        self.cur_block = block;
        self.cur_stmt = 0;
    }

    /// Step past the statement under the cursor.
    pub fn advance(&mut self) {
        self.cur_stmt += 1;
    }

    /// Is the cursor on a statement (as opposed to the terminator)?
    pub fn at_statement(&self) -> bool {
        self.cur_stmt < self.body.basic_blocks[self.cur_block].statements.len()
    }

    /// Span given to statements synthesized for the current element.
    pub fn set_span(&mut self, span: Span) {
        self.span = span;
    }

    /// Take the statement under the cursor out of its block, leaving a
    /// `Nop` in its place until [`Mutator::restore_statement`].
    pub fn take_statement(&mut self) -> Statement {
        let slot = &mut self.body.basic_blocks[self.cur_block].statements[self.cur_stmt];
        let span = slot.source_info;
        mem::replace(slot, Statement::nop(span))
    }

    pub fn restore_statement(&mut self, stmt: Statement) {
        self.body.basic_blocks[self.cur_block].statements[self.cur_stmt] = stmt;
    }

    pub fn take_terminator(&mut self) -> Terminator {
        let slot = &mut self.body.basic_blocks[self.cur_block].terminator;
        let span = slot.source_info;
        mem::replace(slot, Terminator::new(span, TerminatorKind::Diverge))
    }

    pub fn restore_terminator(&mut self, terminator: Terminator) {
        self.body.basic_blocks[self.cur_block].terminator = terminator;
    }

    pub fn new_temporary(&mut self, ty: TypeRef) -> LValue {
        let idx = self.body.temporaries.len();
        self.body.temporaries.push(ty);
        self.temporaries_added += 1;
        LValue::Temporary(idx)
    }

    pub fn push_statement(&mut self, stmt: Statement) {
        self.new_statements.push(stmt);
    }

    pub fn push_assign(&mut self, dst: LValue, src: RValue) {
        self.push_statement(Statement::assign(self.span, dst, src));
    }

    /// Allocate a temporary of type `ty` holding `value`.
    pub fn in_temporary(&mut self, ty: TypeRef, value: RValue) -> LValue {
        let lv = self.new_temporary(ty);
        self.push_assign(lv.clone(), value);
        lv
    }

    /// Insert the pending statements before the element under the cursor
    /// and move the cursor past them. Called once per visited element.
    pub fn flush(&mut self) {
        if self.new_statements.is_empty() {
            return;
        }
        let count = self.new_statements.len();
        let statements = &mut self.body.basic_blocks[self.cur_block].statements;
        let at = self.cur_stmt.min(statements.len());
        statements.splice(at..at, self.new_statements.drain(..));
        mir_core::trace!(
            "inserted {} statement(s) at bb{}/s{}",
            count,
            self.cur_block,
            at
        );
        self.cur_stmt += count;
        self.statements_inserted += count;
    }

    /// Drop statements queued for an element that failed to clean up.
    pub fn discard_pending(&mut self) {
        self.new_statements.clear();
    }
}
