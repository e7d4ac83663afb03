//! LLVM IR generation from the typed AST.
//!
//! Module shape: every function and operator in the symbol table is
//! declared with external linkage (operators under their mangled names),
//! top-level statements concatenate into a synthetic entry function, and
//! each body is lowered into basic blocks with alloca-per-variable
//! storage. Every emitted function is verified; a failed verification is
//! a fatal internal error.

use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::intrinsics::Intrinsic;
use inkwell::module::{Linkage, Module};
use inkwell::targets::{
    CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetMachine,
};
use inkwell::values::{
    BasicMetadataValueEnum, BasicValueEnum, FloatValue, FunctionValue, IntValue, PointerValue,
};
use inkwell::{AddressSpace, FloatPredicate, IntPredicate, OptimizationLevel};
use lyrac_par::ast::{
    BinaryExpr, Block, CallExpr, ElseArm, Expr, FuncDecl, IfStmt, OpPosition, OperatorDecl, Param,
    Stmt, UnaryExpr, WhileStmt,
};
use lyrac_sem::SymbolTable;
use lyrac_util::{FxHashMap, Handler, Stage, Symbol, Ty};
use std::path::Path;

use crate::error::{CodeGenError, Result};
use crate::mangle::{mangle_operator, ENTRY_SYMBOL};
use crate::types::TypeMapper;

/// A variable's stack slot.
#[derive(Clone, Copy)]
struct Local<'ctx> {
    ptr: PointerValue<'ctx>,
    ty: Ty,
}

/// Code generator state for one module.
pub struct CodeGen<'ctx, 'a> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    types: TypeMapper<'ctx>,
    table: &'a SymbolTable,
    handler: &'a Handler,
    /// Scope stack of name → slot frames, mirroring block structure.
    locals: Vec<FxHashMap<Symbol, Local<'ctx>>>,
    current_fn: Option<FunctionValue<'ctx>>,
    string_count: usize,
}

impl<'ctx, 'a> CodeGen<'ctx, 'a> {
    pub fn new(
        context: &'ctx Context,
        module_name: &str,
        table: &'a SymbolTable,
        handler: &'a Handler,
    ) -> Self {
        Self {
            context,
            module: context.create_module(module_name),
            builder: context.create_builder(),
            types: TypeMapper::new(context),
            table,
            handler,
            locals: Vec::new(),
            current_fn: None,
            string_count: 0,
        }
    }

    /// Lowers the whole program into the module.
    ///
    /// User-facing problems become diagnostics on the handler and abort
    /// only the surrounding function; a returned `Err` is fatal.
    pub fn compile(&mut self, program: &[Stmt]) -> Result<()> {
        self.declare_signatures()?;

        if let Err(err) = self.emit_entry(program) {
            self.report_or_fatal(err)?;
        }
        for stmt in program {
            let result = match stmt {
                Stmt::Func(decl) if decl.body.is_some() => self.emit_func(decl),
                Stmt::Operator(decl) if decl.body.is_some() => self.emit_operator(decl),
                _ => Ok(()),
            };
            if let Err(err) = result {
                self.report_or_fatal(err)?;
            }
        }
        self.emit_main_wrapper()
    }

    /// The generated module.
    pub fn module(&self) -> &Module<'ctx> {
        &self.module
    }

    /// Textual IR for `--emit-llvm`.
    pub fn print_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    /// Writes a native object file for the host target.
    pub fn write_object_file(&self, path: &Path) -> Result<()> {
        Target::initialize_native(&InitializationConfig::default())
            .map_err(CodeGenError::Llvm)?;
        let triple = TargetMachine::get_default_triple();
        let target = Target::from_triple(&triple).map_err(|e| CodeGenError::Llvm(e.to_string()))?;
        let machine = target
            .create_target_machine(
                &triple,
                "generic",
                "",
                OptimizationLevel::Default,
                RelocMode::PIC,
                CodeModel::Default,
            )
            .ok_or_else(|| CodeGenError::Llvm("failed to create target machine".to_string()))?;
        self.module.set_triple(&triple);
        self.module
            .set_data_layout(&machine.get_target_data().get_data_layout());
        machine
            .write_to_file(&self.module, FileType::Object, path)
            .map_err(|e| CodeGenError::Llvm(e.to_string()))
    }

    /// Routes a user-facing error to the handler; fatal errors bubble.
    fn report_or_fatal(&self, err: CodeGenError) -> Result<()> {
        match err.span() {
            Some(span) => {
                self.handler.error(Stage::Codegen, err.to_string(), span);
                Ok(())
            }
            None => Err(err),
        }
    }

    /// Declares every function and operator in the symbol table as an
    /// external symbol. Each function name is declared once; operator
    /// overloads disambiguate through their mangled names.
    fn declare_signatures(&self) -> Result<()> {
        for sigs in self.table.functions.values() {
            for sig in sigs {
                if self.module.get_function(sig.name.as_str()).is_some() {
                    continue;
                }
                let fn_type = match self.types.function(&sig.params, sig.ret, sig.span) {
                    Ok(ty) => ty,
                    Err(err) => {
                        self.report_or_fatal(err)?;
                        continue;
                    }
                };
                self.module
                    .add_function(sig.name.as_str(), fn_type, Some(Linkage::External));
            }
        }
        for sigs in self.table.operators.values() {
            for sig in sigs {
                let name = mangle_operator(sig.symbol, &sig.params);
                if self.module.get_function(&name).is_some() {
                    continue;
                }
                let fn_type = match self.types.function(&sig.params, sig.ret, sig.span) {
                    Ok(ty) => ty,
                    Err(err) => {
                        self.report_or_fatal(err)?;
                        continue;
                    }
                };
                self.module.add_function(&name, fn_type, Some(Linkage::External));
            }
        }
        Ok(())
    }

    /// Emits the synthetic entry function from the top-level statements
    /// that are not declarations. Falls off the end with status zero.
    fn emit_entry(&mut self, program: &[Stmt]) -> Result<()> {
        let i32_type = self.context.i32_type();
        let function = self
            .module
            .add_function(ENTRY_SYMBOL, i32_type.fn_type(&[], false), None);
        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);
        self.current_fn = Some(function);

        self.locals.push(FxHashMap::default());
        let mut result = Ok(());
        for stmt in program {
            if matches!(stmt, Stmt::Func(_) | Stmt::Operator(_)) {
                continue;
            }
            if self.block_terminated() {
                break;
            }
            if let Err(err) = self.lower_stmt(stmt) {
                result = Err(err);
                break;
            }
        }
        self.locals.pop();
        result?;

        if !self.block_terminated() {
            self.builder
                .build_return(Some(&i32_type.const_int(0, false)))?;
        }
        self.verify_fn(function)
    }

    /// Wraps the entry function in a conventional `main` for linkage,
    /// unless the user already defined one.
    fn emit_main_wrapper(&mut self) -> Result<()> {
        if self.module.get_function("main").is_some() {
            return Ok(());
        }
        let i32_type = self.context.i32_type();
        let function = self
            .module
            .add_function("main", i32_type.fn_type(&[], false), None);
        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);
        let entry_fn = self
            .module
            .get_function(ENTRY_SYMBOL)
            .ok_or_else(|| CodeGenError::Internal("entry function missing".to_string()))?;
        let call = self.builder.build_call(entry_fn, &[], "status")?;
        let status = call
            .try_as_basic_value()
            .basic()
            .ok_or_else(|| CodeGenError::Internal("entry function returned void".to_string()))?;
        self.builder.build_return(Some(&status))?;
        self.verify_fn(function)
    }

    fn emit_func(&mut self, decl: &FuncDecl) -> Result<()> {
        let Some(body) = &decl.body else {
            return Ok(());
        };
        let function = self
            .module
            .get_function(decl.name.as_str())
            .ok_or_else(|| {
                CodeGenError::Internal(format!("function `{}` was never declared", decl.name))
            })?;
        if function.count_basic_blocks() > 0 {
            return Err(CodeGenError::DuplicateDefinition {
                name: decl.name.as_str().to_string(),
                span: decl.span,
            });
        }
        self.emit_body(function, &decl.params, decl.ret.unwrap_or(Ty::Void), body)
    }

    fn emit_operator(&mut self, decl: &OperatorDecl) -> Result<()> {
        let Some(body) = &decl.body else {
            return Ok(());
        };
        let params: Vec<Ty> = decl
            .params
            .iter()
            .map(|p| {
                p.ty.ok_or_else(|| {
                    CodeGenError::Internal("unannotated parameter survived analysis".to_string())
                })
            })
            .collect::<Result<_>>()?;
        let name = mangle_operator(decl.symbol, &params);
        let function = self.module.get_function(&name).ok_or_else(|| {
            CodeGenError::Internal(format!("operator `{}` was never declared", name))
        })?;
        if function.count_basic_blocks() > 0 {
            return Err(CodeGenError::DuplicateDefinition {
                name,
                span: decl.span,
            });
        }
        self.emit_body(function, &decl.params, decl.ret, body)
    }

    /// Emits one function body: an entry block that spills every incoming
    /// parameter into a stack slot, then the lowered statements, then a
    /// default return if control falls off the end.
    fn emit_body(
        &mut self,
        function: FunctionValue<'ctx>,
        params: &[Param],
        ret: Ty,
        body: &Block,
    ) -> Result<()> {
        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);
        self.current_fn = Some(function);

        self.locals.push(FxHashMap::default());
        let mut result = self.bind_params(function, params);
        if result.is_ok() {
            result = self.lower_stmts(&body.stmts);
        }
        self.locals.pop();
        result?;

        if !self.block_terminated() {
            self.build_default_return(ret)?;
        }
        self.verify_fn(function)
    }

    fn bind_params(&mut self, function: FunctionValue<'ctx>, params: &[Param]) -> Result<()> {
        for (i, param) in params.iter().enumerate() {
            let ty = param.ty.ok_or_else(|| {
                CodeGenError::Internal("unannotated parameter survived analysis".to_string())
            })?;
            let basic = self.types.basic(ty, param.span)?;
            let value = function.get_nth_param(i as u32).ok_or_else(|| {
                CodeGenError::Internal("parameter count mismatch at emission".to_string())
            })?;
            let slot = self.builder.build_alloca(basic, param.name.as_str())?;
            self.builder.build_store(slot, value)?;
            self.insert_local(param.name, slot, ty);
        }
        Ok(())
    }

    fn insert_local(&mut self, name: Symbol, ptr: PointerValue<'ctx>, ty: Ty) {
        if let Some(frame) = self.locals.last_mut() {
            frame.insert(name, Local { ptr, ty });
        }
    }

    fn lookup_local(&self, name: Symbol) -> Option<Local<'ctx>> {
        self.locals
            .iter()
            .rev()
            .find_map(|frame| frame.get(&name).copied())
    }

    /// True if the current block already ends in a terminator; nothing
    /// may be appended after one.
    fn block_terminated(&self) -> bool {
        self.builder
            .get_insert_block()
            .and_then(|bb| bb.get_terminator())
            .is_some()
    }

    fn current_function(&self) -> Result<FunctionValue<'ctx>> {
        self.current_fn
            .ok_or_else(|| CodeGenError::Internal("no current function".to_string()))
    }

    fn verify_fn(&self, function: FunctionValue<'ctx>) -> Result<()> {
        if function.verify(false) {
            Ok(())
        } else {
            Err(CodeGenError::VerifyFailed {
                name: function.get_name().to_string_lossy().into_owned(),
            })
        }
    }

    /// Lowers statements until the block terminates; statements after a
    /// `return` are unreachable and skipped.
    fn lower_stmts(&mut self, stmts: &[Stmt]) -> Result<()> {
        for stmt in stmts {
            if self.block_terminated() {
                break;
            }
            self.lower_stmt(stmt)?;
        }
        Ok(())
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Let(s) => {
                let value = self.lower_value(&s.init)?;
                let ty = s
                    .declared_ty
                    .or(s.init.ty())
                    .or_else(|| ty_of_value(&value))
                    .ok_or_else(|| {
                        CodeGenError::Internal("untyped let initializer".to_string())
                    })?;
                let basic = self.types.basic(ty, s.name_span)?;
                let slot = self.builder.build_alloca(basic, s.name.as_str())?;
                self.builder.build_store(slot, value)?;
                self.insert_local(s.name, slot, ty);
                Ok(())
            }
            Stmt::If(s) => self.lower_if(s),
            Stmt::While(s) => self.lower_while(s),
            Stmt::Return(s) => {
                match &s.value {
                    Some(expr) => {
                        let value = self.lower_value(expr)?;
                        self.builder.build_return(Some(&value))?;
                    }
                    None => {
                        self.builder.build_return(None)?;
                    }
                }
                Ok(())
            }
            Stmt::Expr(e) => {
                self.lower_expr(e)?;
                Ok(())
            }
            Stmt::Block(b) => {
                self.locals.push(FxHashMap::default());
                let result = self.lower_stmts(&b.stmts);
                self.locals.pop();
                result
            }
            // Nested declarations are rejected by the symbol-table pass.
            Stmt::Func(_) | Stmt::Operator(_) => Ok(()),
        }
    }

    fn lower_if(&mut self, s: &IfStmt) -> Result<()> {
        let function = self.current_function()?;
        let cond = self.lower_value(&s.cond)?.into_int_value();

        let then_bb = self.context.append_basic_block(function, "if.then");
        let else_bb = s
            .else_arm
            .as_ref()
            .map(|_| self.context.append_basic_block(function, "if.else"));
        let merge_bb = self.context.append_basic_block(function, "if.end");

        self.builder
            .build_conditional_branch(cond, then_bb, else_bb.unwrap_or(merge_bb))?;

        self.builder.position_at_end(then_bb);
        self.locals.push(FxHashMap::default());
        let result = self.lower_stmts(&s.then_block.stmts);
        self.locals.pop();
        result?;
        if !self.block_terminated() {
            self.builder.build_unconditional_branch(merge_bb)?;
        }

        if let (Some(else_bb), Some(arm)) = (else_bb, s.else_arm.as_deref()) {
            self.builder.position_at_end(else_bb);
            match arm {
                ElseArm::Block(b) => {
                    self.locals.push(FxHashMap::default());
                    let result = self.lower_stmts(&b.stmts);
                    self.locals.pop();
                    result?;
                }
                ElseArm::If(nested) => self.lower_if(nested)?,
            }
            if !self.block_terminated() {
                self.builder.build_unconditional_branch(merge_bb)?;
            }
        }

        self.builder.position_at_end(merge_bb);
        Ok(())
    }

    fn lower_while(&mut self, s: &WhileStmt) -> Result<()> {
        let function = self.current_function()?;
        let cond_bb = self.context.append_basic_block(function, "while.cond");
        let body_bb = self.context.append_basic_block(function, "while.body");
        let end_bb = self.context.append_basic_block(function, "while.end");

        self.builder.build_unconditional_branch(cond_bb)?;
        self.builder.position_at_end(cond_bb);
        let cond = self.lower_value(&s.cond)?.into_int_value();
        self.builder.build_conditional_branch(cond, body_bb, end_bb)?;

        self.builder.position_at_end(body_bb);
        self.locals.push(FxHashMap::default());
        let result = self.lower_stmts(&s.body.stmts);
        self.locals.pop();
        result?;
        if !self.block_terminated() {
            self.builder.build_unconditional_branch(cond_bb)?;
        }

        self.builder.position_at_end(end_bb);
        Ok(())
    }

    /// Lowers an expression, requiring it to produce a value.
    fn lower_value(&mut self, expr: &Expr) -> Result<BasicValueEnum<'ctx>> {
        self.lower_expr(expr)?
            .ok_or(CodeGenError::VoidValue { span: expr.span() })
    }

    /// Lowers an expression. Void-returning calls yield `None`.
    fn lower_expr(&mut self, expr: &Expr) -> Result<Option<BasicValueEnum<'ctx>>> {
        match expr {
            Expr::Int(lit) => {
                let value: i32 = lit.text.as_str().parse().map_err(|_| {
                    CodeGenError::BadIntLiteral {
                        text: lit.text.as_str().to_string(),
                        span: lit.span,
                    }
                })?;
                Ok(Some(
                    self.context.i32_type().const_int(value as u64, true).into(),
                ))
            }
            Expr::Float(lit) => {
                let value: f64 = lit.text.as_str().parse().map_err(|_| {
                    CodeGenError::BadFloatLiteral {
                        text: lit.text.as_str().to_string(),
                        span: lit.span,
                    }
                })?;
                Ok(Some(self.context.f64_type().const_float(value).into()))
            }
            Expr::Str(lit) => {
                let name = format!(".str.{}", self.string_count);
                self.string_count += 1;
                let global = self
                    .builder
                    .build_global_string_ptr(lit.text.as_str(), &name)?;
                Ok(Some(global.as_pointer_value().into()))
            }
            Expr::Bool(lit) => Ok(Some(
                self.context
                    .bool_type()
                    .const_int(u64::from(lit.value), false)
                    .into(),
            )),
            Expr::Ident(e) => {
                let local =
                    self.lookup_local(e.name)
                        .ok_or_else(|| CodeGenError::UndefinedVariable {
                            name: e.name.as_str().to_string(),
                            span: e.span,
                        })?;
                Ok(Some(self.builder.build_load(
                    local.ptr,
                    e.name.as_str(),
                )?))
            }
            Expr::Binary(e) => self.lower_binary(e),
            Expr::Unary(e) => self.lower_unary(e),
            Expr::Call(e) => self.lower_call(e),
            Expr::OpSeq(_) => Err(CodeGenError::Internal(
                "unresolved operator sequence reached code generation".to_string(),
            )),
        }
    }

    fn lower_binary(&mut self, e: &BinaryExpr) -> Result<Option<BasicValueEnum<'ctx>>> {
        let op = e.op.as_str();
        if matches!(op, "=" | "+=" | "-=" | "*=" | "/=" | "%=") {
            return self.lower_assignment(e);
        }
        if matches!(op, "&&" | "||") {
            let bool_operands = e.lhs.ty() == Some(Ty::Bool) && e.rhs.ty() == Some(Ty::Bool);
            if bool_operands {
                return self.lower_short_circuit(e, op == "&&");
            }
        }

        let lhs = self.lower_value(&e.lhs)?;
        let rhs = self.lower_value(&e.rhs)?;
        let lhs_ty = e.lhs.ty().or_else(|| ty_of_value(&lhs));
        let rhs_ty = e.rhs.ty().or_else(|| ty_of_value(&rhs));
        let (Some(lt), Some(rt)) = (lhs_ty, rhs_ty) else {
            return Err(self.unknown_operator(e.op, &[lhs_ty, rhs_ty], e.span));
        };

        if lt == rt {
            if let Some(value) = self.native_binary(op, lt, lhs, rhs)? {
                return Ok(Some(value));
            }
        }
        self.operator_call(e.op, OpPosition::Infix, &[lhs, rhs], &[lt, rt], e.span)
    }

    /// Native instruction selection for one built-in operator/type
    /// combination; `None` if the combination is not built in.
    fn native_binary(
        &mut self,
        op: &str,
        ty: Ty,
        lhs: BasicValueEnum<'ctx>,
        rhs: BasicValueEnum<'ctx>,
    ) -> Result<Option<BasicValueEnum<'ctx>>> {
        match ty {
            Ty::I32 => {
                let a = lhs.into_int_value();
                let b = rhs.into_int_value();
                let value: BasicValueEnum = match op {
                    "+" => self.builder.build_int_add(a, b, "addtmp")?.into(),
                    "-" => self.builder.build_int_sub(a, b, "subtmp")?.into(),
                    "*" => self.builder.build_int_mul(a, b, "multmp")?.into(),
                    "/" => self.builder.build_int_signed_div(a, b, "divtmp")?.into(),
                    "%" => self.builder.build_int_signed_rem(a, b, "remtmp")?.into(),
                    "&" => self.builder.build_and(a, b, "andtmp")?.into(),
                    "|" => self.builder.build_or(a, b, "ortmp")?.into(),
                    "^" => self.builder.build_xor(a, b, "xortmp")?.into(),
                    "<<" => self.builder.build_left_shift(a, b, "shltmp")?.into(),
                    ">>" => self.builder.build_right_shift(a, b, true, "shrtmp")?.into(),
                    "==" => self.int_cmp(IntPredicate::EQ, a, b)?.into(),
                    "!=" => self.int_cmp(IntPredicate::NE, a, b)?.into(),
                    "<" => self.int_cmp(IntPredicate::SLT, a, b)?.into(),
                    "<=" => self.int_cmp(IntPredicate::SLE, a, b)?.into(),
                    ">" => self.int_cmp(IntPredicate::SGT, a, b)?.into(),
                    ">=" => self.int_cmp(IntPredicate::SGE, a, b)?.into(),
                    _ => return Ok(None),
                };
                Ok(Some(value))
            }
            Ty::F64 => {
                let a = lhs.into_float_value();
                let b = rhs.into_float_value();
                let value: BasicValueEnum = match op {
                    "+" => self.builder.build_float_add(a, b, "faddtmp")?.into(),
                    "-" => self.builder.build_float_sub(a, b, "fsubtmp")?.into(),
                    "*" => self.builder.build_float_mul(a, b, "fmultmp")?.into(),
                    "/" => self.builder.build_float_div(a, b, "fdivtmp")?.into(),
                    "%" => self.builder.build_float_rem(a, b, "fremtmp")?.into(),
                    "**" => self.float_pow(a, b)?,
                    // Float equality uses the ordered predicates; NaN
                    // behavior follows LLVM.
                    "==" => self.float_cmp(FloatPredicate::OEQ, a, b)?.into(),
                    "!=" => self.float_cmp(FloatPredicate::ONE, a, b)?.into(),
                    "<" => self.float_cmp(FloatPredicate::OLT, a, b)?.into(),
                    "<=" => self.float_cmp(FloatPredicate::OLE, a, b)?.into(),
                    ">" => self.float_cmp(FloatPredicate::OGT, a, b)?.into(),
                    ">=" => self.float_cmp(FloatPredicate::OGE, a, b)?.into(),
                    _ => return Ok(None),
                };
                Ok(Some(value))
            }
            Ty::Bool => {
                let a = lhs.into_int_value();
                let b = rhs.into_int_value();
                let value: BasicValueEnum = match op {
                    "==" => self.int_cmp(IntPredicate::EQ, a, b)?.into(),
                    "!=" => self.int_cmp(IntPredicate::NE, a, b)?.into(),
                    _ => return Ok(None),
                };
                Ok(Some(value))
            }
            _ => Ok(None),
        }
    }

    fn int_cmp(
        &self,
        pred: IntPredicate,
        a: IntValue<'ctx>,
        b: IntValue<'ctx>,
    ) -> Result<IntValue<'ctx>> {
        Ok(self.builder.build_int_compare(pred, a, b, "cmptmp")?)
    }

    fn float_cmp(
        &self,
        pred: FloatPredicate,
        a: FloatValue<'ctx>,
        b: FloatValue<'ctx>,
    ) -> Result<IntValue<'ctx>> {
        Ok(self.builder.build_float_compare(pred, a, b, "fcmptmp")?)
    }

    /// Float power via the generic `llvm.pow` intrinsic.
    fn float_pow(&self, a: FloatValue<'ctx>, b: FloatValue<'ctx>) -> Result<BasicValueEnum<'ctx>> {
        let intrinsic = Intrinsic::find("llvm.pow")
            .ok_or_else(|| CodeGenError::Internal("llvm.pow intrinsic not found".to_string()))?;
        let declaration = intrinsic
            .get_declaration(&self.module, &[self.context.f64_type().into()])
            .ok_or_else(|| {
                CodeGenError::Internal("failed to declare llvm.pow".to_string())
            })?;
        let call = self
            .builder
            .build_call(declaration, &[a.into(), b.into()], "powtmp")?;
        call.try_as_basic_value()
            .basic()
            .ok_or_else(|| CodeGenError::Internal("llvm.pow returned void".to_string()))
    }

    /// `&&`/`||` lower to control flow so the right operand only
    /// evaluates when it matters.
    fn lower_short_circuit(
        &mut self,
        e: &BinaryExpr,
        is_and: bool,
    ) -> Result<Option<BasicValueEnum<'ctx>>> {
        let function = self.current_function()?;
        let lhs = self.lower_value(&e.lhs)?.into_int_value();
        let lhs_bb = self
            .builder
            .get_insert_block()
            .ok_or_else(|| CodeGenError::Internal("builder has no insert block".to_string()))?;

        let (rhs_name, end_name) = if is_and {
            ("and.rhs", "and.end")
        } else {
            ("or.rhs", "or.end")
        };
        let rhs_bb = self.context.append_basic_block(function, rhs_name);
        let merge_bb = self.context.append_basic_block(function, end_name);

        if is_and {
            self.builder.build_conditional_branch(lhs, rhs_bb, merge_bb)?;
        } else {
            self.builder.build_conditional_branch(lhs, merge_bb, rhs_bb)?;
        }

        self.builder.position_at_end(rhs_bb);
        let rhs = self.lower_value(&e.rhs)?.into_int_value();
        let rhs_end = self
            .builder
            .get_insert_block()
            .ok_or_else(|| CodeGenError::Internal("builder has no insert block".to_string()))?;
        self.builder.build_unconditional_branch(merge_bb)?;

        self.builder.position_at_end(merge_bb);
        let phi = self.builder.build_phi(
            self.context.bool_type(),
            if is_and { "andtmp" } else { "ortmp" },
        )?;
        let short_value = self
            .context
            .bool_type()
            .const_int(u64::from(!is_and), false);
        phi.add_incoming(&[(&short_value, lhs_bb), (&rhs, rhs_end)]);
        Ok(Some(phi.as_basic_value()))
    }

    /// `=` and compound assignments: the left operand must name a
    /// variable; compound forms read the slot, apply the arithmetic,
    /// store back, and yield the stored value.
    fn lower_assignment(&mut self, e: &BinaryExpr) -> Result<Option<BasicValueEnum<'ctx>>> {
        let Expr::Ident(target) = e.lhs.as_ref() else {
            return Err(CodeGenError::BadAssignTarget { span: e.lhs.span() });
        };
        let local = self
            .lookup_local(target.name)
            .ok_or_else(|| CodeGenError::UndefinedVariable {
                name: target.name.as_str().to_string(),
                span: target.span,
            })?;
        let rhs = self.lower_value(&e.rhs)?;
        let op = e.op.as_str();

        let value = if op == "=" {
            rhs
        } else {
            let current = self
                .builder
                .build_load(local.ptr, target.name.as_str())?;
            let arith = &op[..1];
            match self.native_binary(arith, local.ty, current, rhs)? {
                Some(value) => value,
                None => {
                    return Err(self.unknown_operator(
                        e.op,
                        &[Some(local.ty), e.rhs.ty()],
                        e.span,
                    ))
                }
            }
        };

        self.builder.build_store(local.ptr, value)?;
        Ok(Some(value))
    }

    fn lower_unary(&mut self, e: &UnaryExpr) -> Result<Option<BasicValueEnum<'ctx>>> {
        let value = self.lower_value(&e.operand)?;
        let ty = e.operand.ty().or_else(|| ty_of_value(&value));
        let Some(ty) = ty else {
            return Err(self.unknown_operator(e.op, &[None], e.span));
        };

        let op = e.op.as_str();
        if e.position == OpPosition::Prefix {
            match (op, ty) {
                ("-", Ty::I32) => {
                    let v = self.builder.build_int_neg(value.into_int_value(), "negtmp")?;
                    return Ok(Some(v.into()));
                }
                ("-", Ty::F64) => {
                    let v = self
                        .builder
                        .build_float_neg(value.into_float_value(), "fnegtmp")?;
                    return Ok(Some(v.into()));
                }
                ("!", Ty::Bool) => {
                    let v = self.builder.build_not(value.into_int_value(), "nottmp")?;
                    return Ok(Some(v.into()));
                }
                _ => {}
            }
        }
        self.operator_call(e.op, e.position, &[value], &[ty], e.span)
    }

    /// Emits a call to the mangled symbol of a declared operator
    /// overload matching the operand types exactly.
    fn operator_call(
        &mut self,
        symbol: Symbol,
        position: OpPosition,
        args: &[BasicValueEnum<'ctx>],
        tys: &[Ty],
        span: lyrac_util::Span,
    ) -> Result<Option<BasicValueEnum<'ctx>>> {
        let overloads = self.table.operator_overloads(symbol, position);
        let Some(sig) = overloads.iter().find(|sig| sig.params == tys) else {
            return Err(self.unknown_operator(
                symbol,
                &tys.iter().map(|&t| Some(t)).collect::<Vec<_>>(),
                span,
            ));
        };
        let name = mangle_operator(symbol, &sig.params);
        let function = self.module.get_function(&name).ok_or_else(|| {
            CodeGenError::Internal(format!("operator `{}` was never declared", name))
        })?;
        let call_args: Vec<BasicMetadataValueEnum> =
            args.iter().map(|&v| v.into()).collect();
        let result_name = if sig.ret == Ty::Void { "" } else { "optmp" };
        let call = self.builder.build_call(function, &call_args, result_name)?;
        Ok(call.try_as_basic_value().basic())
    }

    fn lower_call(&mut self, e: &CallExpr) -> Result<Option<BasicValueEnum<'ctx>>> {
        let Expr::Ident(callee) = e.callee.as_ref() else {
            return Err(CodeGenError::Internal(
                "non-identifier callee survived checking".to_string(),
            ));
        };
        let function = self
            .module
            .get_function(callee.name.as_str())
            .ok_or_else(|| CodeGenError::UnknownFunction {
                name: callee.name.as_str().to_string(),
                span: callee.span,
            })?;
        let expected = function.count_params() as usize;
        if expected != e.args.len() {
            return Err(CodeGenError::ArgCountMismatch {
                name: callee.name.as_str().to_string(),
                expected,
                found: e.args.len(),
                span: e.span,
            });
        }
        let mut args: Vec<BasicMetadataValueEnum> = Vec::with_capacity(e.args.len());
        for arg in &e.args {
            args.push(self.lower_value(arg)?.into());
        }
        let result_name = if function.get_type().get_return_type().is_none() {
            ""
        } else {
            "calltmp"
        };
        let call = self.builder.build_call(function, &args, result_name)?;
        Ok(call.try_as_basic_value().basic())
    }

    fn build_default_return(&mut self, ret: Ty) -> Result<()> {
        match ret {
            Ty::Void => {
                self.builder.build_return(None)?;
            }
            Ty::I32 => {
                self.builder
                    .build_return(Some(&self.context.i32_type().const_int(0, false)))?;
            }
            Ty::F64 => {
                self.builder
                    .build_return(Some(&self.context.f64_type().const_float(0.0)))?;
            }
            Ty::Bool => {
                self.builder
                    .build_return(Some(&self.context.bool_type().const_int(0, false)))?;
            }
            Ty::Str => {
                self.builder.build_return(Some(
                    &self
                        .context
                        .i8_type()
                        .ptr_type(AddressSpace::default())
                        .const_null(),
                ))?;
            }
            Ty::Named(_) => {
                return Err(CodeGenError::Internal(
                    "unknown return type survived declaration".to_string(),
                ))
            }
        }
        Ok(())
    }

    fn unknown_operator(
        &self,
        symbol: Symbol,
        tys: &[Option<Ty>],
        span: lyrac_util::Span,
    ) -> CodeGenError {
        let operands = tys
            .iter()
            .map(|ty| ty.map_or("?".to_string(), |t| t.name().to_string()))
            .collect::<Vec<_>>()
            .join(", ");
        CodeGenError::UnknownOperator {
            symbol: symbol.as_str().to_string(),
            operands,
            span,
        }
    }
}

/// Recovers a Lyra type from an LLVM value, used when an annotation is
/// missing but the value itself is unambiguous.
fn ty_of_value(value: &BasicValueEnum) -> Option<Ty> {
    match value {
        BasicValueEnum::IntValue(v) => match v.get_type().get_bit_width() {
            1 => Some(Ty::Bool),
            32 => Some(Ty::I32),
            _ => None,
        },
        BasicValueEnum::FloatValue(_) => Some(Ty::F64),
        BasicValueEnum::PointerValue(_) => Some(Ty::Str),
        _ => None,
    }
}
