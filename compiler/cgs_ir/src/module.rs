//! Module IR: functions, instructions, globals.
//!
//! The representation is deliberately flat. A function body is a single
//! instruction list; control flow is irrelevant to the call-graph passes,
//! which only ask two questions of a body:
//!
//! - does it contain an indirect call (a call whose callee is a runtime
//!   value rather than a function symbol)?
//! - where does each function's address appear as an operand?
//!
//! Values are named via [`VarId`] (SSA-like, per function). Functions and
//! globals are referenced by [`FuncId`] / [`GlobalId`] within their module.

use smallvec::SmallVec;

use crate::{ComdatId, ComdatTable, FunctionType, Linkage, TypeMetadata};

// ── ID newtypes ─────────────────────────────────────────────────────

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create an ID from a raw index.
            #[inline]
            pub fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Get the raw `u32` value.
            #[inline]
            pub fn raw(self) -> u32 {
                self.0
            }

            /// Get the index as `usize` (for indexing into `Vec`s).
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

id_newtype!(
    /// Function index within a [`Module`].
    FuncId
);
id_newtype!(
    /// Global variable index within a [`Module`].
    GlobalId
);
id_newtype!(
    /// Local value within a single function body.
    VarId
);
id_newtype!(
    /// Instruction index within a single function body.
    InstrId
);

/// Convert a table position to a raw ID.
///
/// Every ID in this crate goes through here, both when an entity is added
/// and when positions are enumerated again later.
///
/// # Panics
///
/// Panics if `index` does not fit in `u32`.
pub(crate) fn raw_index(index: usize, what: &str) -> u32 {
    u32::try_from(index).unwrap_or_else(|_| panic!("{what} count exceeds u32::MAX"))
}

// ── Operands ────────────────────────────────────────────────────────

/// An instruction operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    /// A runtime value computed in this function.
    Var(VarId),
    /// The address of a function symbol.
    Func(FuncId),
    /// The address of a global variable.
    Global(GlobalId),
    /// An integer constant.
    Int(i64),
    /// The null pointer.
    Null,
}

// ── Intrinsics ──────────────────────────────────────────────────────

/// Compiler intrinsics that can take function addresses as operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    Assume,
    SideEffect,
    PseudoProbe,
    DbgValue,
    DbgDeclare,
    LifetimeStart,
    LifetimeEnd,
    InvariantStart,
    InvariantEnd,
    ObjectSize,
    NoAliasScopeDecl,
    PtrAnnotation,
    VarAnnotation,
    Memcpy,
    Memset,
    Prefetch,
}

impl Intrinsic {
    /// Intrinsics that only state facts to the optimizer and never observe
    /// or transfer the value of their operands.
    #[must_use]
    pub fn is_assume_like(self) -> bool {
        !matches!(self, Self::Memcpy | Self::Memset | Self::Prefetch)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Assume => "assume",
            Self::SideEffect => "sideeffect",
            Self::PseudoProbe => "pseudoprobe",
            Self::DbgValue => "dbg.value",
            Self::DbgDeclare => "dbg.declare",
            Self::LifetimeStart => "lifetime.start",
            Self::LifetimeEnd => "lifetime.end",
            Self::InvariantStart => "invariant.start",
            Self::InvariantEnd => "invariant.end",
            Self::ObjectSize => "objectsize",
            Self::NoAliasScopeDecl => "experimental.noalias.scope.decl",
            Self::PtrAnnotation => "ptr.annotation",
            Self::VarAnnotation => "var.annotation",
            Self::Memcpy => "memcpy",
            Self::Memset => "memset",
            Self::Prefetch => "prefetch",
        }
    }
}

// ── Instructions ────────────────────────────────────────────────────

/// A call instruction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Call {
    pub dst: Option<VarId>,
    pub callee: Operand,
    pub args: Vec<Operand>,
    /// The callee's type as seen from this call, derived from the types of
    /// the call's operands.
    pub callee_ty: FunctionType,
    /// Call-site descriptor, set by metadata attachment on indirect calls.
    pub type_metadata: Option<TypeMetadata>,
}

impl Call {
    /// A call whose target is computed at runtime.
    ///
    /// Calls to a function symbol or to a constant address are direct.
    #[must_use]
    pub fn is_indirect(&self) -> bool {
        matches!(self.callee, Operand::Var(_))
    }

    /// The statically known callee, if any.
    #[must_use]
    pub fn direct_callee(&self) -> Option<FuncId> {
        match self.callee {
            Operand::Func(id) => Some(id),
            _ => None,
        }
    }
}

/// A single instruction in a function body.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Instr {
    /// Bind an operand to a local: `dst = src`.
    Copy { dst: VarId, src: Operand },
    /// Memory read: `dst = load ptr`.
    Load { dst: VarId, ptr: Operand },
    /// Memory write: `store value, ptr`.
    Store { value: Operand, ptr: Operand },
    /// Equality comparison: `dst = lhs == rhs`.
    Compare {
        dst: VarId,
        lhs: Operand,
        rhs: Operand,
    },
    /// Field address computation: `dst = &base.field`.
    FieldAddr { dst: VarId, base: Operand, field: u32 },
    Call(Call),
    Intrinsic {
        intrinsic: Intrinsic,
        args: Vec<Operand>,
    },
    Return { value: Option<Operand> },
}

impl Instr {
    /// Every operand of the instruction, in order. A call's callee comes
    /// before its arguments.
    pub fn operands(&self) -> SmallVec<[Operand; 4]> {
        match self {
            Self::Copy { src, .. } => smallvec::smallvec![*src],
            Self::Load { ptr, .. } => smallvec::smallvec![*ptr],
            Self::Store { value, ptr } => smallvec::smallvec![*value, *ptr],
            Self::Compare { lhs, rhs, .. } => smallvec::smallvec![*lhs, *rhs],
            Self::FieldAddr { base, .. } => smallvec::smallvec![*base],
            Self::Call(call) => std::iter::once(call.callee)
                .chain(call.args.iter().copied())
                .collect(),
            Self::Intrinsic { args, .. } => args.iter().copied().collect(),
            Self::Return { value } => value.iter().copied().collect(),
        }
    }

    #[must_use]
    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Self::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_call_mut(&mut self) -> Option<&mut Call> {
        match self {
            Self::Call(call) => Some(call),
            _ => None,
        }
    }
}

// ── Functions ───────────────────────────────────────────────────────

/// A function: a declaration when `body` is `None`, a definition otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    /// Linker symbol name.
    pub name: String,
    /// Declared type.
    pub ty: FunctionType,
    pub linkage: Linkage,
    /// The symbol is known to resolve within the current linkage unit.
    pub dso_local: bool,
    pub body: Option<Vec<Instr>>,
    pub comdat: Option<ComdatId>,
    /// Function-level type descriptors.
    pub type_metadata: Vec<TypeMetadata>,
    /// Parameter positions this function invokes as callbacks (for
    /// example the start routine of a thread-spawning broker). A function
    /// passed in one of these positions is not considered address-taken
    /// under the default policy.
    pub callback_params: SmallVec<[u32; 2]>,
}

impl Function {
    /// An external declaration.
    pub fn declaration(name: impl Into<String>, ty: FunctionType) -> Self {
        Self {
            name: name.into(),
            ty,
            linkage: Linkage::External,
            dso_local: false,
            body: None,
            comdat: None,
            type_metadata: Vec::new(),
            callback_params: SmallVec::new(),
        }
    }

    /// An external, `dso_local` definition.
    pub fn definition(name: impl Into<String>, ty: FunctionType, body: Vec<Instr>) -> Self {
        Self {
            dso_local: true,
            body: Some(body),
            ..Self::declaration(name, ty)
        }
    }

    #[must_use]
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    #[must_use]
    pub fn with_dso_local(mut self, dso_local: bool) -> Self {
        self.dso_local = dso_local;
        self
    }

    #[must_use]
    pub fn with_callback_param(mut self, index: u32) -> Self {
        self.callback_params.push(index);
        self
    }

    #[must_use]
    pub fn is_declaration(&self) -> bool {
        self.body.is_none()
    }

    /// No code for this function will be emitted in this module.
    #[must_use]
    pub fn is_declaration_for_linker(&self) -> bool {
        self.is_declaration() || self.linkage == Linkage::AvailableExternally
    }

    #[must_use]
    pub fn has_local_linkage(&self) -> bool {
        self.linkage.is_local()
    }

    #[must_use]
    pub fn is_weak_for_linker(&self) -> bool {
        self.linkage.is_weak_for_linker()
    }

    pub fn instrs(&self) -> &[Instr] {
        self.body.as_deref().unwrap_or_default()
    }

    /// Calls in the body, with their positions.
    pub fn calls(&self) -> impl Iterator<Item = (InstrId, &Call)> {
        self.instrs()
            .iter()
            .enumerate()
            .filter_map(|(i, instr)| {
                instr
                    .as_call()
                    .map(|c| (InstrId::new(raw_index(i, "instruction")), c))
            })
    }

    /// Indirect calls in the body, with their positions.
    pub fn indirect_calls(&self) -> impl Iterator<Item = (InstrId, &Call)> {
        self.calls().filter(|(_, call)| call.is_indirect())
    }

    #[must_use]
    pub fn has_indirect_calls(&self) -> bool {
        self.indirect_calls().next().is_some()
    }
}

// ── Globals ─────────────────────────────────────────────────────────

/// A global variable. Its initializer may reference function addresses
/// (dispatch tables, vtables).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalVar {
    pub name: String,
    pub linkage: Linkage,
    pub initializer: Vec<Operand>,
    pub comdat: Option<ComdatId>,
}

impl GlobalVar {
    pub fn new(name: impl Into<String>, initializer: Vec<Operand>) -> Self {
        Self {
            name: name.into(),
            linkage: Linkage::External,
            initializer,
            comdat: None,
        }
    }
}

// ── Module ──────────────────────────────────────────────────────────

/// A compilation unit: functions, globals, and the comdat namespace.
#[derive(Clone, Debug, Default)]
pub struct Module {
    pub name: String,
    pub functions: Vec<Function>,
    pub globals: Vec<GlobalVar>,
    pub comdats: ComdatTable,
    /// Symbols the compiler must keep even without visible references
    /// (the `llvm.used` list).
    pub retained: Vec<Operand>,
    /// Non-`dso_local` definitions may be replaced at load time.
    pub semantic_interposition: bool,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_function(&mut self, function: Function) -> FuncId {
        let id = FuncId::new(raw_index(self.functions.len(), "function"));
        self.functions.push(function);
        id
    }

    pub fn add_global(&mut self, global: GlobalVar) -> GlobalId {
        let id = GlobalId::new(raw_index(self.globals.len(), "global"));
        self.globals.push(global);
        id
    }

    /// Give a previously declared function a body.
    pub fn define(&mut self, id: FuncId, body: Vec<Instr>) {
        self.functions[id.index()].body = Some(body);
    }

    #[must_use]
    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id.index()]
    }

    pub fn function_mut(&mut self, id: FuncId) -> &mut Function {
        &mut self.functions[id.index()]
    }

    #[must_use]
    pub fn function_by_name(&self, name: &str) -> Option<FuncId> {
        self.functions
            .iter()
            .position(|f| f.name == name)
            .map(|i| FuncId::new(raw_index(i, "function")))
    }

    pub fn function_ids(&self) -> impl Iterator<Item = FuncId> {
        (0..self.functions.len()).map(|i| FuncId::new(raw_index(i, "function")))
    }

    /// Whether the function may be replaced by a different definition at
    /// link or load time.
    #[must_use]
    pub fn is_interposable(&self, id: FuncId) -> bool {
        let func = self.function(id);
        func.linkage.is_interposable() || (self.semantic_interposition && !func.dso_local)
    }

    /// Attach `comdat` to a function.
    pub fn set_comdat(&mut self, id: FuncId, comdat: ComdatId) {
        self.functions[id.index()].comdat = Some(comdat);
    }

    /// The comdat a function belongs to, with its table entry.
    #[must_use]
    pub fn comdat_of(&self, id: FuncId) -> Option<&crate::Comdat> {
        self.function(id).comdat.map(|c| self.comdats.get(c))
    }
}
