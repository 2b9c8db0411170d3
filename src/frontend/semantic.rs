//! Semantic Analysis for regcc
//!
//! One depth-first walk over the program that
//! - binds every declared name to a stack slot of its enclosing function,
//! - resolves identifier uses against the current function only,
//! - assigns a register slot to every value-producing expression,
//! - records, for each call, which registers are live across it.
//!
//! Annotations are written into the AST in place. Running the analysis again
//! on an already analyzed tree overwrites them with identical values.

use crate::frontend::ast::*;
use crate::frontend::scope::ScopeStack;
use crate::middle::regalloc::{Reg, RegisterPool, MAX_ARGS};
use crate::utils::{Error, Result, Span};

/// Semantic analyzer
pub struct SemanticAnalyzer {
    scopes: ScopeStack,
    pool: RegisterPool,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self {
            scopes: ScopeStack::new(),
            pool: RegisterPool::new(),
        }
    }

    /// Analyze a program
    pub fn analyze(&mut self, program: &mut Program) -> Result<()> {
        for func in &mut program.functions {
            self.analyze_function(func)?;
        }
        Ok(())
    }

    /// Analyze a function with its own local table and register pool; the
    /// caller's are restored afterwards, also on error.
    fn analyze_function(&mut self, func: &mut FunctionDecl) -> Result<()> {
        if func.params.len() > MAX_ARGS {
            return Err(Error::TooManyArguments {
                count: func.params.len(),
                limit: MAX_ARGS,
                span: func.span,
            });
        }

        let caller_pool = std::mem::take(&mut self.pool);
        self.scopes.enter();

        let result = self.analyze_function_body(func);

        func.locals = self.scopes.exit();
        func.used = self.pool.touched();
        self.pool = caller_pool;

        log::debug!(
            "analyzed `{}`: {} locals, result in {:?}",
            func.name.name,
            func.locals.len(),
            func.result
        );
        result
    }

    fn analyze_function_body(&mut self, func: &mut FunctionDecl) -> Result<()> {
        for param in &func.params {
            self.declare(param)?;
        }
        func.result = self.analyze_block(&mut func.body)?;
        Ok(())
    }

    /// Analyze statements in order. Every statement starts from the pool state
    /// the block was entered with; nothing stays allocated across a boundary.
    ///
    /// Returns the register of the last expression statement.
    fn analyze_block(&mut self, body: &mut [Stmt]) -> Result<Option<usize>> {
        let entry = self.pool.live();
        let mut result = None;

        for stmt in body {
            match stmt {
                Stmt::Function(func) => self.analyze_function(func)?,
                Stmt::VarDecl(ident) => self.declare(ident)?,
                Stmt::Expr(expr) => {
                    let reg = self.analyze_expr(expr)?;
                    result = Some(reg.slot());
                    self.pool.release(reg);
                    self.pool.check_balanced(entry, expr.span)?;
                }
            }
        }

        Ok(result)
    }

    fn declare(&mut self, ident: &Ident) -> Result<()> {
        let declared = self
            .scopes
            .current_mut()
            .and_then(|table| table.declare(&ident.name));

        match declared {
            Some(_) => Ok(()),
            None => Err(Error::DuplicateDeclaration {
                name: ident.name.clone(),
                span: ident.span,
            }),
        }
    }

    fn resolve(&self, name: &str, span: Span) -> Result<usize> {
        self.scopes
            .current()
            .and_then(|table| table.lookup(name))
            .ok_or_else(|| Error::UnboundName {
                name: name.to_string(),
                span,
            })
    }

    /// Analyze an expression; the returned register holds its value and
    /// belongs to the caller, which must release it.
    fn analyze_expr(&mut self, expr: &mut Expr) -> Result<Reg> {
        let span = expr.span;

        let reg = match &mut expr.kind {
            ExprKind::Number(_) | ExprKind::Str(_) => self.pool.acquire(span)?,

            ExprKind::Ident { name, offset } => {
                *offset = Some(self.resolve(name, span)?);
                self.pool.acquire(span)?
            }

            ExprKind::Assign { target, value } => {
                let reg = self.analyze_expr(value)?;

                let target_span = target.span;
                let ExprKind::Ident { name, offset } = &mut target.kind else {
                    return Err(Error::NotAssignable { span: target_span });
                };
                *offset = Some(self.resolve(name, target_span)?);

                // The target's old value is never loaded.
                let target_reg = self.pool.acquire(target_span)?;
                target.reg = Some(target_reg.slot());
                self.pool.release(target_reg);

                reg
            }

            ExprKind::Binary { left, right, .. } | ExprKind::Compare { left, right, .. } => {
                let left = self.analyze_expr(left)?;
                let right = self.analyze_expr(right)?;
                self.pool.release(right);
                left
            }

            ExprKind::Call { args, live, .. } => {
                if args.len() > MAX_ARGS {
                    return Err(Error::TooManyArguments {
                        count: args.len(),
                        limit: MAX_ARGS,
                        span,
                    });
                }

                *live = self.pool.live();

                let mut arg_regs = Vec::with_capacity(args.len());
                for arg in args.iter_mut() {
                    arg_regs.push(self.analyze_expr(arg)?);
                }
                for reg in arg_regs {
                    self.pool.release(reg);
                }

                self.pool.acquire(span)?
            }
        };

        expr.reg = Some(reg.slot());
        Ok(reg)
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;
    use crate::frontend::parser::Parser;
    use crate::middle::regalloc::{RegMask, POOL_SIZE};

    fn analyze(source: &str) -> Result<Program> {
        let mut parser = Parser::new(Lexer::new(source))?;
        let mut program = parser.parse_program()?;
        let mut analyzer = SemanticAnalyzer::new();
        analyzer.analyze(&mut program)?;
        Ok(program)
    }

    fn last_expr(func: &FunctionDecl) -> &Expr {
        func.body
            .iter()
            .rev()
            .find_map(|stmt| match stmt {
                Stmt::Expr(expr) => Some(expr),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_simple_function() {
        let program = analyze("int main() { 1; }").unwrap();
        assert_eq!(program.functions[0].result, Some(0));
        assert_eq!(program.functions[0].used, RegMask::EMPTY.with(0));
    }

    #[test]
    fn test_used_registers_are_per_function() {
        let program = analyze("int main() { 1 + (2 + 3); int g() { 4; } 5; }").unwrap();
        let func = &program.functions[0];
        assert_eq!(func.used, RegMask::EMPTY.with(0).with(1).with(2));

        let Some(Stmt::Function(inner)) = func.body.get(1) else {
            panic!("expected nested function");
        };
        assert_eq!(inner.used, RegMask::EMPTY.with(0));
    }

    #[test]
    fn test_offsets_follow_declaration_order() {
        let program = analyze("int main() { int a; int b; int c; c; }").unwrap();
        let func = &program.functions[0];

        let offsets: Vec<(&str, usize)> =
            func.locals.iter().map(|l| (l.name.as_str(), l.offset)).collect();
        assert_eq!(offsets, vec![("a", 8), ("b", 16), ("c", 24)]);
        assert!(matches!(last_expr(func).kind, ExprKind::Ident { offset: Some(24), .. }));
    }

    #[test]
    fn test_params_are_bound_first() {
        let program = analyze("int f(int a, int b) { int c; a + b; }").unwrap();
        let func = &program.functions[0];
        assert_eq!(func.locals.lookup("a"), Some(8));
        assert_eq!(func.locals.lookup("b"), Some(16));
        assert_eq!(func.locals.lookup("c"), Some(24));
    }

    #[test]
    fn test_binary_result_uses_left_register() {
        let program = analyze("int main() { 1 + 2 * 3; }").unwrap();
        let expr = last_expr(&program.functions[0]);

        let ExprKind::Binary { left, right, .. } = &expr.kind else {
            panic!("expected binary expression");
        };
        assert_eq!(expr.reg, Some(0));
        assert_eq!(left.reg, Some(0));
        assert_eq!(right.reg, Some(1));
        let ExprKind::Binary { left, right, .. } = &right.kind else {
            panic!("expected multiplication");
        };
        assert_eq!((left.reg, right.reg), (Some(1), Some(2)));
    }

    #[test]
    fn test_registers_do_not_cross_statements() {
        let program = analyze("int main() { int x; x = 1; x + 2; }").unwrap();
        let func = &program.functions[0];
        for stmt in &func.body {
            if let Stmt::Expr(expr) = stmt {
                assert_eq!(expr.reg, Some(0));
            }
        }
    }

    #[test]
    fn test_assignment_result_is_value_register() {
        let program = analyze("int main() { int x; int y; x = y = 5; }").unwrap();
        let expr = last_expr(&program.functions[0]);

        let ExprKind::Assign { target, value } = &expr.kind else {
            panic!("expected assignment");
        };
        assert_eq!(expr.reg, Some(0));
        assert_eq!(value.reg, Some(0));
        assert_eq!(target.reg, Some(1));
        assert!(matches!(target.kind, ExprKind::Ident { offset: Some(8), .. }));
    }

    #[test]
    fn test_call_records_live_registers() {
        let program = analyze("int f() { 1; } int main() { int x; x = 1; x + f(); }").unwrap();
        let expr = last_expr(&program.functions[1]);

        let ExprKind::Binary { right, .. } = &expr.kind else {
            panic!("expected binary expression");
        };
        let ExprKind::Call { live, .. } = &right.kind else {
            panic!("expected call");
        };
        assert_eq!(*live, RegMask::EMPTY.with(0));
        assert_eq!(right.reg, Some(1));
    }

    #[test]
    fn test_call_arguments_are_released() {
        let program = analyze("int f(int a, int b) { a; } int main() { f(1, f(2, 3)); }").unwrap();
        let expr = last_expr(&program.functions[1]);

        let ExprKind::Call { args, live, .. } = &expr.kind else {
            panic!("expected call");
        };
        assert_eq!(*live, RegMask::EMPTY);
        assert_eq!(args[0].reg, Some(0));
        let ExprKind::Call { live: inner_live, .. } = &args[1].kind else {
            panic!("expected nested call");
        };
        assert_eq!(*inner_live, RegMask::EMPTY.with(0));
        assert_eq!(expr.reg, Some(0));
    }

    #[test]
    fn test_undefined_variable() {
        let result = analyze("int main() { y; }");
        assert!(matches!(result, Err(Error::UnboundName { ref name, .. }) if name == "y"));
    }

    #[test]
    fn test_assignment_to_undeclared_name() {
        let result = analyze("int main() { x = 1; }");
        assert!(matches!(result, Err(Error::UnboundName { ref name, .. }) if name == "x"));
    }

    #[test]
    fn test_duplicate_declaration() {
        assert!(matches!(
            analyze("int main() { int a; int a; }"),
            Err(Error::DuplicateDeclaration { ref name, .. }) if name == "a"
        ));
        assert!(matches!(
            analyze("int f(int a, int a) { a; }"),
            Err(Error::DuplicateDeclaration { .. })
        ));
    }

    #[test]
    fn test_not_assignable() {
        assert!(matches!(
            analyze("int main() { 1 = 2; }"),
            Err(Error::NotAssignable { .. })
        ));
        assert!(matches!(
            analyze("int main() { int a; (a + 1) = 2; }"),
            Err(Error::NotAssignable { .. })
        ));
    }

    #[test]
    fn test_nested_function_has_its_own_scope() {
        assert!(analyze("int main() { int x; int g() { int x; x; } x; }").is_ok());
        assert!(matches!(
            analyze("int main() { int x; int g() { x; } x; }"),
            Err(Error::UnboundName { .. })
        ));
    }

    #[test]
    fn test_register_exhaustion() {
        let mut source = String::from("1");
        for _ in 0..POOL_SIZE {
            source = format!("1 + ({})", source);
        }
        let result = analyze(&format!("int main() {{ {}; }}", source));

        let err = result.unwrap_err();
        assert!(matches!(err, Error::RegisterExhaustion { .. }));
        assert!(err.is_capacity_limit());
    }

    #[test]
    fn test_expression_may_use_every_register() {
        let mut source = String::from("1");
        for _ in 1..POOL_SIZE {
            source = format!("1 + ({})", source);
        }
        let program = analyze(&format!("int main() {{ {}; }}", source)).unwrap();

        let all = (0..POOL_SIZE).fold(RegMask::EMPTY, RegMask::with);
        assert_eq!(program.functions[0].used, all);
        assert_eq!(program.functions[0].result, Some(0));
    }

    #[test]
    fn test_pool_is_enough_for_left_deep_chains() {
        assert!(analyze("int main() { 1|2^3&4==5!=6+7-8*9/10; }").is_ok());
    }

    #[test]
    fn test_too_many_arguments() {
        assert!(matches!(
            analyze("int main() { f(1, 2, 3, 4, 5, 6, 7); }"),
            Err(Error::TooManyArguments { count: 7, limit: 6, .. })
        ));
        assert!(matches!(
            analyze("int f(int a, int b, int c, int d, int e, int g, int h) { a; }"),
            Err(Error::TooManyArguments { count: 7, .. })
        ));
    }

    #[test]
    fn test_reanalysis_is_stable() {
        let mut program = analyze("int f(int a) { a; } int main() { int x; x = 2; x + f(x); }").unwrap();
        let before = serde_json::to_string(&program).unwrap();

        SemanticAnalyzer::new().analyze(&mut program).unwrap();
        let after = serde_json::to_string(&program).unwrap();

        assert_eq!(before, after);
    }
}
