//! LLVM-style text dump of a module.
//!
//! Output format:
//! ```text
//! $foo = comdat nodeduplicate
//!
//! @table = global [@foo, null]
//!
//! define void @foo() comdat !type !{i64 0, !"_ZTSFvE.generalized"} {
//!   ret void
//! }
//!
//! define void @bar() !type !{i64 0, !"_ZTSFvE.generalized"} {
//!   %0 = @foo
//!   call %0() !type !{!"_ZTSFvE.generalized"}
//!   ret void
//! }
//! ```

use std::fmt;

use crate::{Call, Function, Instr, Module, Operand};

struct OperandDisplay<'a> {
    module: &'a Module,
    operand: Operand,
}

impl fmt::Display for OperandDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand {
            Operand::Var(v) => write!(f, "%{}", v.raw()),
            Operand::Func(id) => write!(f, "@{}", self.module.function(id).name),
            Operand::Global(id) => write!(f, "@{}", self.module.globals[id.index()].name),
            Operand::Int(value) => write!(f, "{value}"),
            Operand::Null => f.write_str("null"),
        }
    }
}

fn op(module: &Module, operand: Operand) -> OperandDisplay<'_> {
    OperandDisplay { module, operand }
}

fn fmt_operands(f: &mut fmt::Formatter<'_>, module: &Module, ops: &[Operand]) -> fmt::Result {
    for (i, &operand) in ops.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", op(module, operand))?;
    }
    Ok(())
}

fn fmt_call(f: &mut fmt::Formatter<'_>, module: &Module, call: &Call) -> fmt::Result {
    if let Some(dst) = call.dst {
        write!(f, "%{} = ", dst.raw())?;
    }
    write!(f, "call {}(", op(module, call.callee))?;
    fmt_operands(f, module, &call.args)?;
    f.write_str(")")?;
    if let Some(md) = &call.type_metadata {
        write!(f, " !type {md}")?;
    }
    Ok(())
}

fn fmt_instr(f: &mut fmt::Formatter<'_>, module: &Module, instr: &Instr) -> fmt::Result {
    f.write_str("  ")?;
    match instr {
        Instr::Copy { dst, src } => write!(f, "%{} = {}", dst.raw(), op(module, *src))?,
        Instr::Load { dst, ptr } => write!(f, "%{} = load {}", dst.raw(), op(module, *ptr))?,
        Instr::Store { value, ptr } => {
            write!(f, "store {}, {}", op(module, *value), op(module, *ptr))?;
        }
        Instr::Compare { dst, lhs, rhs } => write!(
            f,
            "%{} = icmp eq {}, {}",
            dst.raw(),
            op(module, *lhs),
            op(module, *rhs)
        )?,
        Instr::FieldAddr { dst, base, field } => {
            write!(f, "%{} = field {}, {field}", dst.raw(), op(module, *base))?;
        }
        Instr::Call(call) => fmt_call(f, module, call)?,
        Instr::Intrinsic { intrinsic, args } => {
            write!(f, "call @llvm.{}(", intrinsic.name())?;
            fmt_operands(f, module, args)?;
            f.write_str(")")?;
        }
        Instr::Return { value: None } => f.write_str("ret void")?,
        Instr::Return { value: Some(value) } => write!(f, "ret {}", op(module, *value))?,
    }
    writeln!(f)
}

fn fmt_function(f: &mut fmt::Formatter<'_>, module: &Module, func: &Function) -> fmt::Result {
    f.write_str(if func.is_declaration() { "declare " } else { "define " })?;
    if !func.linkage.keyword().is_empty() {
        write!(f, "{} ", func.linkage)?;
    }
    if func.dso_local {
        f.write_str("dso_local ")?;
    }
    write!(f, "{} @{}(", func.ty.ret, func.name)?;
    for (i, param) in func.ty.params.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{param}")?;
    }
    if func.ty.variadic {
        f.write_str(if func.ty.params.is_empty() { "..." } else { ", ..." })?;
    }
    f.write_str(")")?;

    if let Some(id) = func.comdat {
        let comdat = module.comdats.get(id);
        if comdat.name() == func.name {
            f.write_str(" comdat")?;
        } else {
            write!(f, " comdat(${})", comdat.name())?;
        }
    }
    for md in &func.type_metadata {
        write!(f, " !type {md}")?;
    }

    let Some(body) = &func.body else {
        return writeln!(f);
    };
    writeln!(f, " {{")?;
    for instr in body {
        fmt_instr(f, module, instr)?;
    }
    writeln!(f, "}}")
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sections = 0;
        let mut separate = |f: &mut fmt::Formatter<'_>| {
            sections += 1;
            if sections > 1 {
                writeln!(f)
            } else {
                Ok(())
            }
        };

        if !self.comdats.is_empty() {
            separate(f)?;
            for (_, comdat) in self.comdats.iter() {
                writeln!(f, "${} = comdat {}", comdat.name(), comdat.selection)?;
            }
        }

        if !self.globals.is_empty() {
            separate(f)?;
            for global in &self.globals {
                write!(f, "@{} = ", global.name)?;
                if !global.linkage.keyword().is_empty() {
                    write!(f, "{} ", global.linkage)?;
                }
                f.write_str("global [")?;
                fmt_operands(f, self, &global.initializer)?;
                writeln!(f, "]")?;
            }
        }

        if !self.retained.is_empty() {
            separate(f)?;
            f.write_str("@llvm.used = appending global [")?;
            fmt_operands(f, self, &self.retained)?;
            writeln!(f, "]")?;
        }

        for func in &self.functions {
            separate(f)?;
            fmt_function(f, self, func)?;
        }
        Ok(())
    }
}
