//! Builder API for constructing function bodies.
//!
//! Allocates [`VarId`]s sequentially and appends instructions in order.
//! Function references must already exist in the module, so forward or
//! mutually recursive references are built by declaring first and calling
//! [`Module::define`](crate::Module::define) afterwards.

use crate::{Call, FuncId, FunctionType, Instr, Intrinsic, Operand, VarId};

/// Builder for a single function body.
#[derive(Debug, Default)]
pub struct BodyBuilder {
    instrs: Vec<Instr>,
    next_var: u32,
}

impl BodyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh(&mut self) -> VarId {
        let var = VarId::new(self.next_var);
        self.next_var += 1;
        var
    }

    /// `dst = src`.
    pub fn copy(&mut self, src: Operand) -> VarId {
        let dst = self.fresh();
        self.instrs.push(Instr::Copy { dst, src });
        dst
    }

    /// `dst = load ptr`.
    pub fn load(&mut self, ptr: Operand) -> VarId {
        let dst = self.fresh();
        self.instrs.push(Instr::Load { dst, ptr });
        dst
    }

    /// `store value, ptr`.
    pub fn store(&mut self, value: Operand, ptr: Operand) {
        self.instrs.push(Instr::Store { value, ptr });
    }

    /// `dst = lhs == rhs`.
    pub fn compare(&mut self, lhs: Operand, rhs: Operand) -> VarId {
        let dst = self.fresh();
        self.instrs.push(Instr::Compare { dst, lhs, rhs });
        dst
    }

    /// `dst = &base.field`.
    pub fn field_addr(&mut self, base: Operand, field: u32) -> VarId {
        let dst = self.fresh();
        self.instrs.push(Instr::FieldAddr { dst, base, field });
        dst
    }

    /// Call `callee`, binding the result.
    pub fn call(&mut self, callee: Operand, args: Vec<Operand>, callee_ty: FunctionType) -> VarId {
        let dst = self.fresh();
        self.push_call(Some(dst), callee, args, callee_ty);
        dst
    }

    /// Call `callee`, discarding any result.
    pub fn call_void(&mut self, callee: Operand, args: Vec<Operand>, callee_ty: FunctionType) {
        self.push_call(None, callee, args, callee_ty);
    }

    /// Direct call to a known function, discarding any result.
    pub fn call_direct(&mut self, func: FuncId, args: Vec<Operand>, callee_ty: FunctionType) {
        self.push_call(None, Operand::Func(func), args, callee_ty);
    }

    fn push_call(
        &mut self,
        dst: Option<VarId>,
        callee: Operand,
        args: Vec<Operand>,
        callee_ty: FunctionType,
    ) {
        self.instrs.push(Instr::Call(Call {
            dst,
            callee,
            args,
            callee_ty,
            type_metadata: None,
        }));
    }

    pub fn intrinsic(&mut self, intrinsic: Intrinsic, args: Vec<Operand>) {
        self.instrs.push(Instr::Intrinsic { intrinsic, args });
    }

    pub fn ret(&mut self, value: Option<Operand>) {
        self.instrs.push(Instr::Return { value });
    }

    /// Finish the body, appending `ret void` if it has no terminator.
    pub fn finish(mut self) -> Vec<Instr> {
        if !matches!(self.instrs.last(), Some(Instr::Return { .. })) {
            self.instrs.push(Instr::Return { value: None });
        }
        self.instrs
    }
}
