//! x86-64 Code Generator
//!
//! Walks the analyzed AST and emits one assembly line per instruction. Every
//! expression leaves its value in the register its annotation names.
//!
//! Frame layout, growing down from `rbp`:
//!
//! ```text
//! [rbp - 8]              unused
//! [rbp - (offset + 8)]   local / parameter slot
//! ...                    callee-saved pool registers, then call-site saves
//! ```

use std::collections::VecDeque;

use crate::backend::codegen::CodeGen;
use crate::frontend::ast::*;
use crate::frontend::scope::SLOT_SIZE;
use crate::middle::regalloc::{RegMask, MAX_ARGS, POOL_SIZE};
use crate::utils::{Error, Result};

/// Physical register for each pool slot
const REGISTERS: [&str; POOL_SIZE] = ["r10", "r11", "rbx", "r12", "r13", "r14", "r15"];

/// Pool slots the SysV ABI requires a function to preserve for its caller
const CALLEE_SAVED: [bool; POOL_SIZE] = [false, false, true, true, true, true, true];

/// Calling-convention argument registers, by position
const ARG_REGISTERS: [&str; MAX_ARGS] = ["rdi", "rsi", "rdx", "rcx", "r8", "r9"];

const STACK_ALIGN: usize = 16;
const WORD: usize = 8;

/// x86-64 code generator
pub struct X86CodeGen {
    target_triple: String,
    output: Vec<String>,
    /// String literals in emission order: label and contents
    strings: Vec<(String, String)>,
    /// Bytes below the saved `rbp` owned by the current frame
    frame_depth: usize,
}

impl X86CodeGen {
    pub fn new(target: &str) -> Self {
        Self {
            target_triple: target.to_string(),
            output: Vec::new(),
            strings: Vec::new(),
            frame_depth: 0,
        }
    }

    /// Write an indented instruction
    fn emit(&mut self, line: impl AsRef<str>) {
        self.output.push(format!("  {}", line.as_ref()));
    }

    /// Write a label or directive (no indent)
    fn write_raw(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    fn register(slot: usize) -> Result<&'static str> {
        REGISTERS
            .get(slot)
            .copied()
            .ok_or_else(|| Error::CodeGen(format!("register slot {} out of range", slot)))
    }

    fn reg_of(expr: &Expr) -> Result<&'static str> {
        let slot = expr.reg.ok_or_else(|| {
            Error::CodeGen(format!("expression at {} has no register", expr.span))
        })?;
        Self::register(slot)
    }

    fn local_address(offset: usize) -> String {
        format!("QWORD PTR [rbp - {}]", offset + SLOT_SIZE)
    }

    fn offset_of(expr: &Expr) -> Result<usize> {
        match &expr.kind {
            ExprKind::Ident { offset: Some(offset), .. } => Ok(*offset),
            ExprKind::Ident { name, offset: None } => {
                Err(Error::CodeGen(format!("`{}` at {} is unresolved", name, expr.span)))
            }
            _ => Err(Error::NotAssignable { span: expr.span }),
        }
    }

    /// Register a string literal and return its label
    fn intern_string(&mut self, text: &str) -> String {
        let label = format!(".LC{}", self.strings.len());
        self.strings.push((label.clone(), text.to_string()));
        label
    }

    /// Generate one function; nested declarations are returned so the
    /// caller can emit them as separate blocks afterwards.
    fn gen_function<'a>(&mut self, func: &'a FunctionDecl) -> Result<Vec<&'a FunctionDecl>> {
        let name = &func.name.name;
        let frame_size = func.locals.len() * SLOT_SIZE + SLOT_SIZE;
        let saved: Vec<&'static str> = func
            .used
            .slots()
            .filter(|&slot| CALLEE_SAVED[slot])
            .map(|slot| REGISTERS[slot])
            .collect();
        self.frame_depth = frame_size + saved.len() * WORD;

        self.write_raw(format!(".globl {}", name));
        self.write_raw(format!("{}:", name));

        // Prologue
        self.emit("push rbp");
        self.emit("mov rbp, rsp");
        self.emit(format!("sub rsp, {}", frame_size));
        for reg in &saved {
            self.emit(format!("push {}", reg));
        }

        // Parameters are the first locals bound
        if func.locals.len() < func.params.len() {
            return Err(Error::CodeGen(format!("parameters of `{}` are unbound", name)));
        }
        for (param, arg_reg) in func.locals.iter().zip(ARG_REGISTERS).take(func.params.len()) {
            self.emit(format!("mov {}, {}", Self::local_address(param.offset), arg_reg));
        }

        let mut nested = Vec::new();
        for stmt in &func.body {
            match stmt {
                Stmt::Function(inner) => nested.push(inner),
                Stmt::VarDecl(_) => {}
                Stmt::Expr(expr) => self.gen_expr(expr)?,
            }
        }

        match func.result {
            Some(slot) => self.emit(format!("mov rax, {}", Self::register(slot)?)),
            None => self.emit("xor eax, eax"),
        }

        // Epilogue
        for reg in saved.iter().rev() {
            self.emit(format!("pop {}", reg));
        }
        self.emit("mov rsp, rbp");
        self.emit("pop rbp");
        self.emit("ret");

        Ok(nested)
    }

    fn gen_expr(&mut self, expr: &Expr) -> Result<()> {
        let dst = Self::reg_of(expr)?;

        match &expr.kind {
            ExprKind::Number(n) => self.emit(format!("mov {}, {}", dst, n)),

            ExprKind::Str(text) => {
                let label = self.intern_string(text);
                self.emit(format!("lea {}, [rip + {}]", dst, label));
            }

            ExprKind::Ident { .. } => {
                let offset = Self::offset_of(expr)?;
                self.emit(format!("mov {}, {}", dst, Self::local_address(offset)));
            }

            ExprKind::Assign { target, value } => {
                self.gen_expr(value)?;
                let src = Self::reg_of(value)?;
                let offset = Self::offset_of(target)?;
                self.emit(format!("mov {}, {}", Self::local_address(offset), src));
                if src != dst {
                    self.emit(format!("mov {}, {}", dst, src));
                }
            }

            ExprKind::Binary { op, left, right } => {
                self.gen_expr(left)?;
                self.gen_expr(right)?;
                let (lhs, rhs) = (Self::reg_of(left)?, Self::reg_of(right)?);

                match op {
                    BinOp::Add => self.emit(format!("add {}, {}", lhs, rhs)),
                    BinOp::Sub => self.emit(format!("sub {}, {}", lhs, rhs)),
                    BinOp::BitAnd => self.emit(format!("and {}, {}", lhs, rhs)),
                    BinOp::BitXor => self.emit(format!("xor {}, {}", lhs, rhs)),
                    BinOp::BitOr => self.emit(format!("or {}, {}", lhs, rhs)),
                    BinOp::Mul => {
                        self.emit(format!("mov rax, {}", lhs));
                        self.emit(format!("mul {}", rhs));
                        self.emit(format!("mov {}, rax", lhs));
                    }
                    BinOp::Div => {
                        self.emit(format!("mov rax, {}", lhs));
                        self.emit("xor edx, edx");
                        self.emit(format!("div {}", rhs));
                        self.emit(format!("mov {}, rax", lhs));
                    }
                }
                if lhs != dst {
                    self.emit(format!("mov {}, {}", dst, lhs));
                }
            }

            ExprKind::Compare { op, left, right } => {
                self.gen_expr(left)?;
                self.gen_expr(right)?;
                let (lhs, rhs) = (Self::reg_of(left)?, Self::reg_of(right)?);

                let set = match op {
                    CmpOp::Eq => "sete",
                    CmpOp::Ne => "setne",
                };
                self.emit(format!("cmp {}, {}", lhs, rhs));
                self.emit(format!("{} al", set));
                self.emit(format!("movzx {}, al", dst));
            }

            ExprKind::Call { name, args, live } => {
                for arg in args {
                    self.gen_expr(arg)?;
                }
                self.gen_call(name, args, *live, dst)?;
            }
        }

        Ok(())
    }

    /// Emit the call sequence once all arguments sit in their registers
    fn gen_call(&mut self, name: &str, args: &[Expr], live: RegMask, dst: &str) -> Result<()> {
        if args.len() > MAX_ARGS {
            return Err(Error::CodeGen(format!(
                "call to `{}` passes {} arguments",
                name,
                args.len()
            )));
        }

        let saves = live
            .slots()
            .map(Self::register)
            .collect::<Result<Vec<_>>>()?;
        for reg in &saves {
            self.emit(format!("push {}", reg));
        }

        let depth = self.frame_depth + live.count() * WORD;
        let padding = if depth % STACK_ALIGN == 0 { 0 } else { WORD };
        if padding > 0 {
            self.emit(format!("sub rsp, {}", padding));
        }

        for (arg, arg_reg) in args.iter().zip(ARG_REGISTERS) {
            self.emit(format!("mov {}, {}", arg_reg, Self::reg_of(arg)?));
        }
        // No vector registers carry arguments (matters for variadic callees).
        self.emit("xor eax, eax");
        self.emit(format!("call {}", name));

        if padding > 0 {
            self.emit(format!("add rsp, {}", padding));
        }
        for reg in saves.iter().rev() {
            self.emit(format!("pop {}", reg));
        }
        self.emit(format!("mov {}, rax", dst));

        Ok(())
    }

    fn gen_data(&mut self) {
        if self.strings.is_empty() {
            return;
        }

        self.write_raw(".section .rodata");
        for (label, text) in std::mem::take(&mut self.strings) {
            self.write_raw(format!("{}:", label));
            self.emit(format!(".string \"{}\"", escape_string(&text)));
        }
    }
}

/// Escape a string for a GNU assembler `.string` directive
fn escape_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            0x20..=0x7e => out.push(byte as char),
            _ => out.push_str(&format!("\\{:03o}", byte)),
        }
    }
    out
}

impl CodeGen for X86CodeGen {
    fn generate(&mut self, program: &Program) -> Result<Vec<String>> {
        self.output.clear();
        self.strings.clear();

        self.write_raw(".intel_syntax noprefix");
        self.write_raw(".text");

        for func in &program.functions {
            let mut pending = VecDeque::from([func]);
            while let Some(next) = pending.pop_front() {
                pending.extend(self.gen_function(next)?);
            }
        }

        self.gen_data();
        self.write_raw(".section .note.GNU-stack,\"\",@progbits");

        log::debug!(
            "{} ({}): emitted {} lines",
            self.name(),
            self.target_triple(),
            self.output.len()
        );
        Ok(std::mem::take(&mut self.output))
    }

    fn target_triple(&self) -> &str {
        &self.target_triple
    }

    fn name(&self) -> &str {
        "x86_64"
    }
}
