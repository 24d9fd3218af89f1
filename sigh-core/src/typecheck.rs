//! Name resolution and type checking.
//!
//! This module lowers the surface AST to HIR. It walks every scope once:
//! struct and function declarations are hoisted when a scope is entered,
//! everything else is resolved in source order. All diagnostics are
//! collected; a failed expression yields `None` and its parents stay quiet
//! about it so that one mistake reports one error.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{self, BinaryOp, ExprKind, StmtKind};
use crate::builtins::BuiltinKind;
use crate::diagnostic::Diagnostic;
use crate::hir::{
    ArrayProperty, DotShape, FunId, HirBlock, HirExpr, HirExprKind, HirField, HirFunction,
    HirParam, HirPlace, HirProgram, HirStmt, HirStmtKind, HirStruct,
};
use crate::name_resolve::{Declaration, Resolution, ScopeKind, ScopeStack};
use crate::span::Span;
use crate::types::{StructId, Type, assignable, common_supertype, comparable, numeric_result};

/// Output of semantic analysis: the HIR when no error was found, and every
/// diagnostic collected along the way.
#[derive(Debug)]
pub struct TypeCheckResult {
    pub program: Option<HirProgram>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Public entry point: resolve and type-check a whole program.
pub fn typecheck_program(program: &ast::Program) -> TypeCheckResult {
    let mut checker = TypeChecker::new();
    checker.scopes.push(ScopeKind::Root);
    let statements = checker.check_statements(&program.statements);
    let slots = checker.scopes.pop();
    let body = HirBlock {
        statements,
        slots,
        span: program.span,
    };
    log::debug!(
        "type checked {} function(s), {} struct(s), {} diagnostic(s)",
        checker.functions.len(),
        checker.structs.len(),
        checker.diagnostics.len()
    );

    if !checker.diagnostics.is_empty() {
        return TypeCheckResult {
            program: None,
            diagnostics: checker.diagnostics,
        };
    }
    let diagnostics = std::mem::take(&mut checker.diagnostics);
    TypeCheckResult {
        program: Some(checker.finish(body)),
        diagnostics,
    }
}

#[derive(Debug)]
struct FunctionInfo {
    name: String,
    params: Vec<HirParam>,
    ret: Type,
    owner: Option<StructId>,
    span: Span,
    body: Option<HirBlock>,
}

impl FunctionInfo {
    fn ty(&self) -> Type {
        Type::fun(
            self.params.iter().map(|p| p.ty.clone()).collect(),
            self.ret.clone(),
        )
    }
}

#[derive(Debug)]
struct StructInfo {
    name: String,
    fields: Vec<HirField>,
    methods: Vec<(String, FunId)>,
}

struct TypeChecker {
    scopes: ScopeStack,
    functions: Vec<FunctionInfo>,
    structs: Vec<StructInfo>,
    /// Hoisted declarations, keyed by the start of their name.
    hoisted_functions: HashMap<u32, FunId>,
    hoisted_structs: HashMap<u32, StructId>,
    diagnostics: Vec<Diagnostic>,
}

impl TypeChecker {
    fn new() -> Self {
        TypeChecker {
            scopes: ScopeStack::new(),
            functions: Vec::new(),
            structs: Vec::new(),
            hoisted_functions: HashMap::new(),
            hoisted_structs: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    fn error(&mut self, span: Span, msg: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::error(msg, span).with_code("E0200"));
    }

    fn finish(self, body: HirBlock) -> HirProgram {
        let functions = self
            .functions
            .into_iter()
            .enumerate()
            .map(|(id, info)| {
                let body = info.body.unwrap_or(HirBlock {
                    statements: Vec::new(),
                    slots: 0,
                    span: info.span,
                });
                Rc::new(HirFunction {
                    id,
                    name: info.name,
                    params: info.params,
                    ret: info.ret,
                    body,
                    owner: info.owner,
                    span: info.span,
                })
            })
            .collect();
        let structs = self
            .structs
            .into_iter()
            .enumerate()
            .map(|(id, info)| {
                Rc::new(HirStruct {
                    id,
                    name: info.name,
                    fields: info.fields,
                    methods: info.methods,
                })
            })
            .collect();
        HirProgram {
            body,
            functions,
            structs,
        }
    }

    fn struct_type(&self, id: StructId) -> Type {
        Type::Struct {
            id,
            name: self.structs[id].name.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Scopes and declarations
    // ------------------------------------------------------------------

    /// Check the statements of a scope that has already been pushed.
    fn check_statements(&mut self, stmts: &[ast::Stmt]) -> Vec<HirStmt> {
        self.hoist(stmts);
        self.scopes.reserve(stmts.iter().filter_map(|stmt| match &stmt.kind {
            StmtKind::Var(decl) => Some(decl.name.name.as_str()),
            StmtKind::SizedArray(decl) => Some(decl.name.name.as_str()),
            _ => None,
        }));
        stmts
            .iter()
            .filter_map(|stmt| self.check_stmt(stmt))
            .collect()
    }

    /// Declare the structs and functions of a scope before checking its body.
    fn hoist(&mut self, stmts: &[ast::Stmt]) {
        let mut structs = Vec::new();
        let mut functions = Vec::new();

        for stmt in stmts {
            match &stmt.kind {
                StmtKind::Struct(decl) => {
                    let id = self.structs.len();
                    self.structs.push(StructInfo {
                        name: decl.name.name.clone(),
                        fields: Vec::new(),
                        methods: Vec::new(),
                    });
                    self.hoisted_structs.insert(decl.name.span.start, id);
                    self.declare(&decl.name, Declaration::Struct(id));
                    structs.push((decl, id));
                }
                StmtKind::Fun(decl) => {
                    let id = self.allocate_function(decl, None);
                    self.hoisted_functions.insert(decl.name.span.start, id);
                    self.declare(&decl.name, Declaration::Function(id));
                    functions.push((decl, id));
                }
                _ => {}
            }
        }

        // Signatures may mention any struct of this scope, so they are
        // resolved once every name above is declared.
        for (decl, id) in structs {
            let fields = decl
                .fields
                .iter()
                .map(|field| HirField {
                    name: field.name.name.clone(),
                    ty: self.resolve_type(&field.ty).unwrap_or(Type::Null),
                })
                .collect();
            self.structs[id].fields = fields;
            for method in &decl.methods {
                let fun_id = self.allocate_function(method, Some(id));
                self.hoisted_functions.insert(method.name.span.start, fun_id);
                self.resolve_signature(method, fun_id);
                self.structs[id]
                    .methods
                    .push((method.name.name.clone(), fun_id));
            }
        }
        for (decl, id) in functions {
            self.resolve_signature(decl, id);
        }
    }

    fn allocate_function(&mut self, decl: &ast::FunDecl, owner: Option<StructId>) -> FunId {
        let id = self.functions.len();
        self.functions.push(FunctionInfo {
            name: decl.name.name.clone(),
            params: Vec::new(),
            ret: Type::Void,
            owner,
            span: decl.name.span,
            body: None,
        });
        id
    }

    fn resolve_signature(&mut self, decl: &ast::FunDecl, id: FunId) {
        let params = decl
            .params
            .iter()
            .map(|param| HirParam {
                name: param.name.name.clone(),
                ty: self.resolve_type(&param.ty).unwrap_or(Type::Null),
            })
            .collect();
        let ret = match &decl.return_type {
            Some(ty) => self.resolve_type(ty).unwrap_or(Type::Void),
            None => Type::Void,
        };
        self.functions[id].params = params;
        self.functions[id].ret = ret;
    }

    fn declare(&mut self, name: &ast::Ident, decl: Declaration) {
        if self.scopes.declare(&name.name, decl).is_err() {
            self.error(
                name.span,
                format!("redeclaration of {} in the same scope", name.name),
            );
        }
    }

    fn declare_variable(&mut self, name: &ast::Ident, ty: Type) -> usize {
        match self.scopes.declare_variable(&name.name, ty.clone()) {
            Ok(slot) => slot,
            Err(_) => {
                self.error(
                    name.span,
                    format!("redeclaration of {} in the same scope", name.name),
                );
                // Keep analysing with a fresh slot under a name nobody can write.
                let shadow = format!("{}#{}", name.name, name.span.start);
                self.scopes.declare_variable(&shadow, ty).unwrap_or_default()
            }
        }
    }

    fn resolve_type(&mut self, ty: &ast::TypeExpr) -> Option<Type> {
        match &ty.kind {
            ast::TypeExprKind::Array(component) => self.resolve_type(component).map(Type::array),
            ast::TypeExprKind::Simple(name) => match self.scopes.lookup(name) {
                Resolution::Struct { id, .. } => Some(self.struct_type(id)),
                Resolution::Builtin(builtin) => match builtin.kind {
                    BuiltinKind::Type(builtin_type) => Some(builtin_type.to_type()),
                    _ => {
                        self.error(ty.span, format!("{name} does not name a type"));
                        None
                    }
                },
                Resolution::UsedBeforeDeclaration | Resolution::Unresolved => {
                    self.error(ty.span, format!("could not resolve: {name}"));
                    None
                }
                _ => {
                    self.error(ty.span, format!("{name} does not name a type"));
                    None
                }
            },
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn check_stmt(&mut self, stmt: &ast::Stmt) -> Option<HirStmt> {
        let kind = match &stmt.kind {
            StmtKind::Block(stmts) => HirStmtKind::Block(self.check_block(stmts, stmt.span)),
            StmtKind::Var(decl) => self.check_var(decl)?,
            StmtKind::SizedArray(decl) => {
                let element = self.resolve_type(&decl.element)?;
                let ty = decl
                    .dimensions
                    .iter()
                    .fold(element.clone(), |ty, _| Type::array(ty));
                let slot = self.declare_variable(&decl.name, ty);
                HirStmtKind::SizedArray {
                    slot,
                    element,
                    dimensions: decl.dimensions.clone(),
                }
            }
            StmtKind::Fun(decl) => {
                let id = self.hoisted_function(decl)?;
                self.check_function(decl, id);
                return None;
            }
            StmtKind::Struct(decl) => {
                self.check_struct(decl);
                return None;
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.check_condition(condition, "If");
                let then_branch = self.check_body(then_branch);
                let else_branch = else_branch.as_ref().map(|stmt| self.check_body(stmt));
                HirStmtKind::If {
                    condition: condition?,
                    then_branch: Box::new(then_branch),
                    else_branch: else_branch.map(Box::new),
                }
            }
            StmtKind::While { condition, body } => {
                let condition = self.check_condition(condition, "While");
                let body = self.check_body(body);
                HirStmtKind::While {
                    condition: condition?,
                    body: Box::new(body),
                }
            }
            StmtKind::Return(value) => HirStmtKind::Return(self.check_return(stmt.span, value)?),
            StmtKind::Expr(expr) => {
                if !expr.is_statement_expression() {
                    self.error(
                        expr.span,
                        "Expression used as statement. \
                         Only function calls and assignment expressions are allowed.",
                    );
                }
                HirStmtKind::Expr(self.check_expr(expr)?)
            }
        };
        Some(HirStmt {
            kind,
            span: stmt.span,
        })
    }

    fn check_block(&mut self, stmts: &[ast::Stmt], span: Span) -> HirBlock {
        self.scopes.push(ScopeKind::Block);
        let statements = self.check_statements(stmts);
        let slots = self.scopes.pop();
        HirBlock {
            statements,
            slots,
            span,
        }
    }

    /// Body of an `if` or `while`: always gets its own scope, even when it
    /// is a single statement.
    fn check_body(&mut self, stmt: &ast::Stmt) -> HirStmt {
        let block = match &stmt.kind {
            StmtKind::Block(stmts) => self.check_block(stmts, stmt.span),
            _ => self.check_block(std::slice::from_ref(stmt), stmt.span),
        };
        HirStmt {
            kind: HirStmtKind::Block(block),
            span: stmt.span,
        }
    }

    fn check_condition(&mut self, condition: &ast::Expr, statement: &str) -> Option<HirExpr> {
        let condition = self.check_expr(condition)?;
        if condition.ty != Type::Bool {
            self.error(
                condition.span,
                format!(
                    "{statement} statement with a non-boolean condition of type: {}",
                    condition.ty
                ),
            );
            return None;
        }
        Some(condition)
    }

    fn check_var(&mut self, decl: &ast::VarDecl) -> Option<HirStmtKind> {
        let value = self.check_expr(&decl.initializer);
        let ty = self.resolve_type(&decl.ty);
        // The name becomes visible only after its initializer.
        let slot = self.declare_variable(&decl.name, ty.clone().unwrap_or(Type::Null));
        let (value, ty) = (value?, ty?);
        if !assignable(&value.ty, &ty) {
            self.error(
                decl.initializer.span,
                format!(
                    "incompatible initializer type provided for variable {}: expected {} but got {}",
                    decl.name.name, ty, value.ty
                ),
            );
            return None;
        }
        Some(HirStmtKind::Declare {
            slot,
            value: value.coerce_to(&ty),
        })
    }

    fn check_return(&mut self, span: Span, value: &Option<ast::Expr>) -> Option<Option<HirExpr>> {
        let value = match value {
            Some(expr) => Some(self.check_expr(expr)?),
            None => None,
        };

        let Some(function) = self.scopes.current_function() else {
            if let Some(value) = &value
                && value.ty.is_void()
            {
                self.error(value.span, "Returning a Void value from the top level");
                return None;
            }
            return Some(value);
        };

        let expected = self.functions[function].ret.clone();
        match value {
            None if !expected.is_void() => {
                self.error(span, "Return without value in a function with a return type");
                None
            }
            None => Some(None),
            Some(value) if expected.is_void() => {
                self.error(value.span, "Return with a value in a Void function");
                None
            }
            Some(value) => {
                if !assignable(&value.ty, &expected) {
                    self.error(
                        value.span,
                        format!(
                            "Incompatible return type, expected {expected} but got {}",
                            value.ty
                        ),
                    );
                    return None;
                }
                Some(Some(value.coerce_to(&expected)))
            }
        }
    }

    fn hoisted_function(&mut self, decl: &ast::FunDecl) -> Option<FunId> {
        self.hoisted_functions.get(&decl.name.span.start).copied()
    }

    fn check_function(&mut self, decl: &ast::FunDecl, id: FunId) {
        self.scopes.push(ScopeKind::Function(id));
        let params = self.functions[id].params.clone();
        for (param, info) in decl.params.iter().zip(params) {
            self.declare_variable(&param.name, info.ty);
        }
        self.scopes.push(ScopeKind::Block);
        let statements = self.check_statements(&decl.body);
        let slots = self.scopes.pop();
        self.scopes.pop();

        if !self.functions[id].ret.is_void() && !always_returns(&decl.body) {
            self.error(
                decl.name.span,
                format!("Missing return in function {}", decl.name.name),
            );
        }
        self.functions[id].body = Some(HirBlock {
            statements,
            slots,
            span: decl.body_span,
        });
    }

    fn check_struct(&mut self, decl: &ast::StructDecl) {
        let Some(&id) = self.hoisted_structs.get(&decl.name.span.start) else {
            return;
        };
        self.scopes.push(ScopeKind::Struct(id));
        let field_types: Vec<Type> = self.structs[id].fields.iter().map(|f| f.ty.clone()).collect();
        for (index, (field, ty)) in decl.fields.iter().zip(field_types).enumerate() {
            self.declare(&field.name, Declaration::Field { index, ty });
        }
        let methods = self.structs[id].methods.clone();
        for (method, (_, fun_id)) in decl.methods.iter().zip(&methods) {
            self.declare(&method.name, Declaration::Method(*fun_id));
        }
        for (method, (_, fun_id)) in decl.methods.iter().zip(methods) {
            self.check_function(method, fun_id);
        }
        self.scopes.pop();
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn check_expr(&mut self, expr: &ast::Expr) -> Option<HirExpr> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Int(value) => Some(HirExpr::new(HirExprKind::Int(*value), Type::Int, span)),
            ExprKind::Float(value) => {
                Some(HirExpr::new(HirExprKind::Float(*value), Type::Float, span))
            }
            ExprKind::Str(value) => Some(HirExpr::new(
                HirExprKind::Str(Rc::from(value.as_str())),
                Type::String,
                span,
            )),
            ExprKind::Reference(name) => self.check_reference(name, span),
            ExprKind::Constructor(name) => self.check_constructor(name, span),
            ExprKind::Array(items) => self.check_array_literal(items, span),
            ExprKind::Paren(inner) => {
                let inner = self.check_expr(inner)?;
                Some(HirExpr { span, ..inner })
            }
            ExprKind::Field { stem, name } => self.check_field(stem, name, span),
            ExprKind::Index { array, index } => {
                let array = self.check_expr(array);
                let index = self.check_expr(index);
                let (array, index) = (array?, index?);
                self.check_index(array, index, span)
            }
            ExprKind::Call { callee, args } => self.check_call(callee, args, span),
            ExprKind::Unary { operand, .. } => {
                let operand = self.check_expr(operand)?;
                if operand.ty != Type::Bool {
                    self.error(span, format!("trying to negate type: {}", operand.ty));
                    return None;
                }
                Some(HirExpr::new(
                    HirExprKind::Not(Box::new(operand)),
                    Type::Bool,
                    span,
                ))
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.check_expr(left);
                let right = self.check_expr(right);
                let (left, right) = (left?, right?);
                self.check_binary(*op, left, right, span)
            }
            ExprKind::Assign { target, value } => self.check_assign(target, value, span),
        }
    }

    fn check_reference(&mut self, name: &str, span: Span) -> Option<HirExpr> {
        let (kind, ty) = match self.scopes.lookup(name) {
            Resolution::Local { hops, slot, ty } => (HirExprKind::Local { hops, slot }, ty),
            Resolution::ReceiverField { hops, index, ty } => {
                (HirExprKind::ReceiverField { hops, field: index }, ty)
            }
            Resolution::ReceiverMethod { hops, id } => (
                HirExprKind::ReceiverMethod { hops, method: id },
                self.functions[id].ty(),
            ),
            Resolution::Function { hops, id } => {
                (HirExprKind::Function { hops, id }, self.functions[id].ty())
            }
            Resolution::Struct { id, .. } => (HirExprKind::TypeValue(self.struct_type(id)), Type::Type),
            Resolution::Builtin(builtin) => {
                let kind = match builtin.kind {
                    BuiltinKind::Type(builtin_type) => {
                        HirExprKind::TypeValue(builtin_type.to_type())
                    }
                    BuiltinKind::True => HirExprKind::Bool(true),
                    BuiltinKind::False => HirExprKind::Bool(false),
                    BuiltinKind::Null => HirExprKind::Null,
                    BuiltinKind::Print => HirExprKind::Print,
                };
                (kind, builtin.value_type())
            }
            Resolution::UsedBeforeDeclaration => {
                self.error(span, format!("variable used before declaration: {name}"));
                return None;
            }
            Resolution::Unresolved => {
                self.error(span, format!("could not resolve: {name}"));
                return None;
            }
        };
        Some(HirExpr::new(kind, ty, span))
    }

    fn check_constructor(&mut self, name: &ast::Ident, span: Span) -> Option<HirExpr> {
        match self.scopes.lookup(&name.name) {
            Resolution::Struct { hops, id } => {
                let params = self.structs[id].fields.iter().map(|f| f.ty.clone()).collect();
                let ty = Type::fun(params, self.struct_type(id));
                Some(HirExpr::new(HirExprKind::Constructor { hops, id }, ty, span))
            }
            Resolution::UsedBeforeDeclaration | Resolution::Unresolved => {
                self.error(name.span, format!("could not resolve: {}", name.name));
                None
            }
            _ => {
                self.error(
                    span,
                    format!(
                        "Applying the constructor operator ($) to non-struct reference: {}",
                        name.name
                    ),
                );
                None
            }
        }
    }

    fn check_array_literal(&mut self, items: &[ast::Expr], span: Span) -> Option<HirExpr> {
        let items: Vec<Option<HirExpr>> = items.iter().map(|item| self.check_expr(item)).collect();
        let items: Vec<HirExpr> = items.into_iter().collect::<Option<_>>()?;

        let mut supertype: Option<Type> = None;
        for item in &items {
            if item.ty.is_void() {
                self.error(item.span, "Void-valued expression in array literal");
                return None;
            }
            supertype = match supertype {
                None => Some(item.ty.clone()),
                Some(current) => match common_supertype(&current, &item.ty) {
                    Some(ty) => Some(ty),
                    None => {
                        self.error(span, "Could not find common supertype in array literal.");
                        return None;
                    }
                },
            };
        }

        let component = supertype.unwrap_or(Type::Null);
        let items = items
            .into_iter()
            .map(|item| item.coerce_to(&component))
            .collect();
        Some(HirExpr::new(
            HirExprKind::Array(items),
            Type::array(component),
            span,
        ))
    }

    fn check_field(&mut self, stem: &ast::Expr, name: &ast::Ident, span: Span) -> Option<HirExpr> {
        let stem = self.check_expr(stem)?;
        let stem_ty = stem.ty.clone();
        match &stem_ty {
            Type::Array(_) => {
                let Some(property) = ArrayProperty::from_name(&name.name) else {
                    self.error(
                        name.span,
                        format!("Trying to access an unknown array property: {}", name.name),
                    );
                    return None;
                };
                let ty = match property {
                    ArrayProperty::Length | ArrayProperty::Count | ArrayProperty::NDim => Type::Int,
                    ArrayProperty::Sum | ArrayProperty::Avg => match numeric_leaf(&stem_ty) {
                        Some(ty) => ty,
                        None => {
                            self.error(
                                span,
                                format!(
                                    "Trying to aggregate ({}) a non-numeric array of type {}",
                                    name.name, stem_ty
                                ),
                            );
                            return None;
                        }
                    },
                };
                Some(HirExpr::new(
                    HirExprKind::ArrayProperty {
                        stem: Box::new(stem),
                        property,
                    },
                    ty,
                    span,
                ))
            }
            Type::Struct { id, name: struct_name } => {
                let info = &self.structs[*id];
                if let Some(field) = info.fields.iter().position(|f| f.name == name.name) {
                    let ty = info.fields[field].ty.clone();
                    return Some(HirExpr::new(
                        HirExprKind::Field {
                            stem: Box::new(stem),
                            field,
                        },
                        ty,
                        span,
                    ));
                }
                if let Some(&(_, method)) = info.methods.iter().find(|(m, _)| *m == name.name) {
                    let ty = self.functions[method].ty();
                    return Some(HirExpr::new(
                        HirExprKind::Method {
                            stem: Box::new(stem),
                            method,
                        },
                        ty,
                        span,
                    ));
                }
                let msg = format!("struct {struct_name} has no field or method named {}", name.name);
                self.error(name.span, msg);
                None
            }
            other => {
                let msg = format!("Trying to access a field on an expression of type {other}");
                self.error(span, msg);
                None
            }
        }
    }

    fn check_index(&mut self, array: HirExpr, index: HirExpr, span: Span) -> Option<HirExpr> {
        if index.ty != Type::Int {
            self.error(index.span, "Indexing an array using a non-int-valued expression.");
            return None;
        }
        let Some(component) = array.ty.component().cloned() else {
            self.error(
                span,
                format!("Trying to index a non-array expression of type {}", array.ty),
            );
            return None;
        };
        Some(HirExpr::new(
            HirExprKind::Index {
                array: Box::new(array),
                index: Box::new(index),
            },
            component,
            span,
        ))
    }

    fn check_call(&mut self, callee: &ast::Expr, args: &[ast::Expr], span: Span) -> Option<HirExpr> {
        let callee_hir = self.check_expr(callee);
        let args: Vec<Option<HirExpr>> = args.iter().map(|arg| self.check_expr(arg)).collect();
        let callee_hir = callee_hir?;
        let args: Vec<HirExpr> = args.into_iter().collect::<Option<_>>()?;

        let Type::Fun { params, ret } = callee_hir.ty.clone() else {
            self.error(
                callee.span,
                format!("trying to call a non-function expression: {callee}"),
            );
            return None;
        };
        self.check_arguments(&params, args, span).map(|args| {
            HirExpr::new(
                HirExprKind::Call {
                    callee: Box::new(callee_hir),
                    args,
                },
                *ret,
                span,
            )
        })
    }

    fn check_arguments(
        &mut self,
        params: &[Type],
        args: Vec<HirExpr>,
        span: Span,
    ) -> Option<Vec<HirExpr>> {
        if params.len() != args.len() {
            self.error(
                span,
                format!(
                    "wrong number of arguments, expected {} but got {}",
                    params.len(),
                    args.len()
                ),
            );
            return None;
        }
        let mut ok = true;
        let mut checked = Vec::with_capacity(args.len());
        for (i, (arg, param)) in args.into_iter().zip(params).enumerate() {
            if !assignable(&arg.ty, param) {
                self.error(
                    arg.span,
                    format!(
                        "incompatible argument provided for argument {i}: expected {param} but got {}",
                        arg.ty
                    ),
                );
                ok = false;
            }
            checked.push(arg.coerce_to(param));
        }
        ok.then_some(checked)
    }

    fn check_binary(
        &mut self,
        op: BinaryOp,
        left: HirExpr,
        right: HirExpr,
        span: Span,
    ) -> Option<HirExpr> {
        let operands = |left: HirExpr, right: HirExpr| (Box::new(left), Box::new(right));

        if op == BinaryOp::Add
            && (left.ty == Type::String || right.ty == Type::String)
            && !left.ty.is_void()
            && !right.ty.is_void()
        {
            let (left, right) = operands(left, right);
            return Some(HirExpr::new(
                HirExprKind::Concat { left, right },
                Type::String,
                span,
            ));
        }

        if op.is_arithmetic() {
            if let Some(ty) = numeric_result(&left.ty, &right.ty) {
                let (left, right) = operands(left, right);
                return Some(HirExpr::new(HirExprKind::Binary { op, left, right }, ty, span));
            }
            if let (Type::Struct { id, .. }, Some(method)) = (left.ty.leaf(), op.overload_method())
                && left.ty.depth() > 0
                && left.ty.depth() == right.ty.depth()
            {
                let id = *id;
                return self.check_elementwise_overload(id, method, op, left, right, span);
            }
            if op != BinaryOp::Remainder
                && let Some(ty) = elementwise_type(op, &left.ty, &right.ty)
            {
                let (left, right) = operands(left, right);
                return Some(HirExpr::new(
                    HirExprKind::ElementWise { op, left, right },
                    ty,
                    span,
                ));
            }
            if let (Type::Struct { id, .. }, Some(method)) = (&left.ty, op.overload_method()) {
                return self.check_overload(*id, method, op, left, right, span);
            }
            self.error(
                span,
                format!("trying to {} {} with {}", op.verb(), left.ty, right.ty),
            );
            return None;
        }

        if op == BinaryOp::DotProduct {
            let Some(ty) = dot_product_type(&left.ty, &right.ty) else {
                self.error(
                    span,
                    format!("trying to {} {} with {}", op.verb(), left.ty, right.ty),
                );
                return None;
            };
            let (left, right) = operands(left, right);
            return Some(HirExpr::new(HirExprKind::DotProduct { left, right }, ty, span));
        }

        if op.is_comparison() {
            let mut ok = true;
            for operand in [&left, &right] {
                if !operand.ty.is_numeric() {
                    self.error(
                        operand.span,
                        format!(
                            "Attempting to perform arithmetic comparison on non-numeric type: {}",
                            operand.ty
                        ),
                    );
                    ok = false;
                }
            }
            if !ok {
                return None;
            }
        } else if op.is_equality() {
            if !comparable(&left.ty, &right.ty) {
                self.error(
                    span,
                    format!(
                        "Trying to compare incomparable types {} and {}",
                        left.ty, right.ty
                    ),
                );
                return None;
            }
        } else if op.is_logic() {
            let mut ok = true;
            for operand in [&left, &right] {
                if operand.ty != Type::Bool {
                    self.error(
                        operand.span,
                        format!(
                            "Attempting to perform binary logic on non-boolean type: {}",
                            operand.ty
                        ),
                    );
                    ok = false;
                }
            }
            if !ok {
                return None;
            }
            let (left, right) = operands(left, right);
            return Some(HirExpr::new(
                HirExprKind::Logic { op, left, right },
                Type::Bool,
                span,
            ));
        }

        let (left, right) = operands(left, right);
        Some(HirExpr::new(
            HirExprKind::Binary { op, left, right },
            Type::Bool,
            span,
        ))
    }

    /// `as + bs` on arrays of structs calls `plus` on each pair of elements.
    fn check_elementwise_overload(
        &mut self,
        id: StructId,
        method_name: &str,
        op: BinaryOp,
        left: HirExpr,
        right: HirExpr,
        span: Span,
    ) -> Option<HirExpr> {
        let info = &self.structs[id];
        let struct_name = info.name.clone();
        let Some(method) = info
            .methods
            .iter()
            .find(|(m, _)| m == method_name)
            .map(|(_, fun)| *fun)
        else {
            self.error(
                span,
                format!(
                    "struct {struct_name} has no method {method_name} to support operator {}",
                    op.symbol()
                ),
            );
            return None;
        };
        let params: Vec<Type> = self.functions[method]
            .params
            .iter()
            .map(|p| p.ty.clone())
            .collect();
        let ret = self.functions[method].ret.clone();
        let [param] = params.as_slice() else {
            self.error(
                span,
                format!(
                    "method {method_name} of struct {struct_name} must take one parameter to support element-wise {}",
                    op.symbol()
                ),
            );
            return None;
        };
        let argument = right.ty.leaf();
        if !assignable(argument, param) {
            let msg = format!(
                "incompatible argument provided for argument 0: expected {param} but got {argument}"
            );
            self.error(right.span, msg);
            return None;
        }
        if ret.is_void() {
            self.error(
                span,
                format!(
                    "method {method_name} of struct {struct_name} returns Void and cannot be applied element-wise"
                ),
            );
            return None;
        }

        let ty = (0..left.ty.depth()).fold(ret, |ty, _| Type::array(ty));
        Some(HirExpr::new(
            HirExprKind::ElementWiseMethod {
                method,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty,
            span,
        ))
    }

    /// `a + b` on a struct becomes `a.plus(b)`, and so on.
    fn check_overload(
        &mut self,
        id: StructId,
        method_name: &str,
        op: BinaryOp,
        left: HirExpr,
        right: HirExpr,
        span: Span,
    ) -> Option<HirExpr> {
        let info = &self.structs[id];
        let Some(&(_, method)) = info.methods.iter().find(|(m, _)| m == method_name) else {
            let msg = format!(
                "struct {} has no method {method_name} to support operator {}",
                info.name,
                op.symbol()
            );
            self.error(span, msg);
            return None;
        };
        let fun_ty = self.functions[method].ty();
        let ret = self.functions[method].ret.clone();
        let params: Vec<Type> = self.functions[method]
            .params
            .iter()
            .map(|p| p.ty.clone())
            .collect();
        let args = self.check_arguments(&params, vec![right], span)?;
        let left_span = left.span;
        let callee = HirExpr::new(
            HirExprKind::Method {
                stem: Box::new(left),
                method,
            },
            fun_ty,
            left_span,
        );
        Some(HirExpr::new(
            HirExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            ret,
            span,
        ))
    }

    fn check_assign(&mut self, target: &ast::Expr, value: &ast::Expr, span: Span) -> Option<HirExpr> {
        let place = self.check_place(target);
        let value = self.check_expr(value);
        let ((place, target_ty), value) = (place?, value?);
        if !assignable(&value.ty, &target_ty) {
            self.error(span, "Trying to assign a value to a non-compatible lvalue.");
            return None;
        }
        let value = value.coerce_to(&target_ty);
        let ty = value.ty.clone();
        Some(HirExpr::new(
            HirExprKind::Assign {
                target: Box::new(place),
                value: Box::new(value),
            },
            ty,
            span,
        ))
    }

    fn check_place(&mut self, target: &ast::Expr) -> Option<(HirPlace, Type)> {
        let not_lvalue = |checker: &mut Self| {
            checker.error(target.span, "Trying to assign to an non-lvalue expression.");
            None
        };
        match &target.kind {
            ExprKind::Paren(inner) => self.check_place(inner),
            ExprKind::Reference(_) => {
                let expr = self.check_expr(target)?;
                match expr.kind {
                    HirExprKind::Local { hops, slot } => {
                        Some((HirPlace::Local { hops, slot }, expr.ty))
                    }
                    HirExprKind::ReceiverField { hops, field } => {
                        Some((HirPlace::ReceiverField { hops, field }, expr.ty))
                    }
                    _ => not_lvalue(self),
                }
            }
            ExprKind::Field { .. } => {
                let expr = self.check_expr(target)?;
                match expr.kind {
                    HirExprKind::Field { stem, field } => {
                        Some((HirPlace::Field { stem: *stem, field }, expr.ty))
                    }
                    _ => not_lvalue(self),
                }
            }
            ExprKind::Index { .. } => {
                let expr = self.check_expr(target)?;
                match expr.kind {
                    HirExprKind::Index { array, index } => Some((
                        HirPlace::Index {
                            array: *array,
                            index: *index,
                        },
                        expr.ty,
                    )),
                    _ => not_lvalue(self),
                }
            }
            _ => not_lvalue(self),
        }
    }
}

/// Whether executing these statements always ends in a `return`.
fn always_returns(stmts: &[ast::Stmt]) -> bool {
    stmts.iter().any(stmt_always_returns)
}

fn stmt_always_returns(stmt: &ast::Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Return(_) => true,
        StmtKind::Block(stmts) => always_returns(stmts),
        StmtKind::If {
            then_branch,
            else_branch: Some(else_branch),
            ..
        } => stmt_always_returns(then_branch) && stmt_always_returns(else_branch),
        _ => false,
    }
}

/// Element type of an array for `sum` and `avg`; `[]` sums to an `Int`.
fn numeric_leaf(ty: &Type) -> Option<Type> {
    match ty.leaf() {
        Type::Int | Type::Null => Some(Type::Int),
        Type::Float => Some(Type::Float),
        _ => None,
    }
}

/// Result of `left op right` applied pairwise to two arrays of equal depth.
fn elementwise_type(op: BinaryOp, left: &Type, right: &Type) -> Option<Type> {
    match (left, right) {
        (Type::Array(a), Type::Array(b)) => match (a.as_ref(), b.as_ref()) {
            (Type::Array(_), Type::Array(_)) => elementwise_type(op, a, b).map(Type::array),
            (Type::Array(_), _) | (_, Type::Array(_)) => None,
            (a, b) => {
                if op == BinaryOp::Add && (*a == Type::String || *b == Type::String) {
                    (!a.is_void() && !b.is_void()).then(|| Type::array(Type::String))
                } else {
                    numeric_result(a, b).map(Type::array)
                }
            }
        },
        _ => None,
    }
}

/// `Int[] @ Int[]` and `Int[] @ Int[][]` (a column) are `Int`s;
/// `Float[][] @ Int[][]` is a `Float[][]`.
fn dot_product_type(left: &Type, right: &Type) -> Option<Type> {
    let scalar = numeric_result(&numeric_leaf(left)?, &numeric_leaf(right)?)?;
    match DotShape::from_depths(left.depth(), right.depth())? {
        DotShape::Vectors | DotShape::VectorByColumn => Some(scalar),
        DotShape::Matrices => Some(Type::array(Type::array(scalar))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn diagnostics(source: &str) -> Vec<String> {
        let program = parse(source).expect("parse");
        typecheck_program(&program)
            .diagnostics
            .into_iter()
            .map(|d| d.message)
            .collect()
    }

    fn assert_ok(source: &str) {
        let messages = diagnostics(source);
        assert!(messages.is_empty(), "unexpected diagnostics: {messages:?}");
    }

    fn assert_error(source: &str, needle: &str) {
        let messages = diagnostics(source);
        assert!(
            messages.iter().any(|m| m.contains(needle)),
            "expected an error containing {needle:?}, got {messages:?}"
        );
    }

    #[test]
    fn literals_and_arithmetic() {
        assert_ok("return 1 + 2 * 3");
        assert_ok("return 1 + 2.0");
        assert_ok("return \"a\" + 1");
        assert_ok("return 1 % 2");
        assert_error("return 1 + true", "trying to add Int with Bool");
        assert_error("return true * 2", "trying to multiply Bool with Int");
    }

    #[test]
    fn comparisons_and_logic() {
        assert_ok("return 1 < 2.0 && true || false");
        assert_ok("return \"a\" == null");
        assert_ok("return 1 == 1.0");
        assert_error("return 1 < true", "non-numeric type: Bool");
        assert_error("return 1 && true", "non-boolean type: Int");
        assert_error("return 1 == true", "incomparable types Int and Bool");
        assert_error("return !1", "trying to negate type: Int");
    }

    #[test]
    fn variables_must_be_declared_before_use() {
        assert_ok("var x: Int = 1; return x");
        assert_error("return x; var x: Int = 1", "variable used before declaration: x");
        assert_error("return y", "could not resolve: y");
        assert_error("var x: Int = x", "variable used before declaration: x");
        assert_error("var x: Int = 1; var x: Int = 2", "redeclaration of x");
    }

    #[test]
    fn functions_and_structs_are_hoisted() {
        assert_ok("return f(); fun f(): Int { return 1 }");
        assert_ok("var p: P = $P(1); struct P { var x: Int }");
        assert_ok(
            "fun even(n: Int): Bool { if n == 0 return true else return odd(n - 1) } \
             fun odd(n: Int): Bool { if n == 0 return false else return even(n - 1) } \
             return even(4)",
        );
    }

    #[test]
    fn int_widens_to_float() {
        assert_ok("var x: Float = 1; return x");
        assert_ok("fun f(x: Float): Float { return 1 } return f(2)");
        assert_ok("var x: Float = 1.0; x = 2");
        assert_ok("var xs: Float[] = [1, 2.5]");
        assert_error("var x: Int = 1.0", "expected Int but got Float");
        assert_error("var xs: Float[] = [1, 2]", "expected Float[] but got Int[]");
    }

    #[test]
    fn array_literals() {
        assert_ok("var xs: Int[] = []");
        assert_ok("var xs: String[] = [null, \"a\"]");
        assert_ok("var m: Int[][] = [[1], []]");
        assert_error("var xs: Int[] = [1, \"a\"]", "Could not find common supertype");
        assert_error(
            "fun f() {} var xs: Int[] = [f()]",
            "Void-valued expression in array literal",
        );
    }

    #[test]
    fn array_access_and_properties() {
        assert_ok("var xs: Int[] = [1]; return xs[0] + xs.length + xs.count + xs.sum");
        assert_ok("var xs: Float[][] = [[1.0]]; return xs.avg + xs.nDim");
        assert_error("var xs: Int[] = [1]; return xs[true]", "non-int-valued");
        assert_error("return 1[0]", "non-array expression of type Int");
        assert_error("var xs: Int[] = [1]; return xs.size", "unknown array property: size");
        assert_error("var xs: String[] = [\"a\"]; return xs.sum", "non-numeric array");
    }

    #[test]
    fn clean_programs_produce_hir() {
        let program = parse("var x: Int = 1; return x").expect("parse");
        let result = typecheck_program(&program);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let hir = result.program.expect("hir");
        assert_eq!(hir.body.statements.len(), 2);
        assert_eq!(hir.body.slots, 1);
    }

    #[test]
    fn element_wise_struct_operators_need_methods() {
        let v = "struct V { var x: Int \
                   fun plus(o: V): V { return o } \
                   fun div(a: V, b: V): V { return a } \
                   fun mul(k: Int) {} } ";
        assert_ok(&format!("{v} var a: V[] = [$V(1)] + [$V(2)]"));
        assert_ok(&format!("{v} var a: V[][] = [[$V(1)]] + [[null]]"));
        assert_error(
            &format!("{v} var a: V[] = [$V(1)] - [$V(2)]"),
            "struct V has no method minus to support operator -",
        );
        assert_error(&format!("{v} var a: V[] = [$V(1)] / [$V(2)]"), "must take one parameter");
        assert_error(&format!("{v} var a: V[] = [$V(1)] * [2]"), "returns Void");
        assert_error(&format!("{v} var a: V[] = [$V(1)] + [1]"), "expected V but got Int");
        assert_error(&format!("{v} var a: V[] = [$V(1)] + [[$V(2)]]"), "trying to add V[] with V[][]");
    }

    #[test]
    fn element_wise_and_dot_products() {
        assert_ok("var xs: Int[] = [1, 2] + [3, 4]");
        assert_ok("var xs: Float[] = [1, 2] * [0.5, 2.0]");
        assert_ok("var m: Int[][] = [[1]] - [[2]]");
        assert_ok("var d: Int = [1, 2] @ [3, 4]");
        assert_ok("var m: Float[][] = [[1, 2]] @ [[1.5], [2.0]]");
        assert_error("var xs: Int[] = [1] % [2]", "trying to take the remainder of");
        assert_error("var xs: Int[] = [1] + [[2]]", "trying to add Int[] with Int[][]");
        assert_ok("var d: Int = [1, 2] @ [[1], [2]]");
        assert_error("var d: Int = [[1]] @ [2]", "trying to take the dot product");
    }

    #[test]
    fn calls_are_checked() {
        assert_ok("fun f(a: Int, b: String): String { return b } return f(1, \"x\")");
        assert_error("fun f(a: Int) {} f()", "wrong number of arguments, expected 1 but got 0");
        assert_error(
            "fun f(a: Int) {} f(\"x\")",
            "incompatible argument provided for argument 0: expected Int but got String",
        );
        assert_error("var x: Int = 1; x(2)", "trying to call a non-function expression: x");
        assert_ok("print(\"hello\")");
    }

    #[test]
    fn structs_and_methods() {
        assert_ok(
            "struct P { var x: Int; var y: Int \
               fun sum(): Int { return x + y } \
               fun twice(): Int { return sum() * 2 } \
               fun move(dx: Int) { x = x + dx } } \
             var p: P = $P(1, 2); p.move(3); p.y = 4; return p.twice() + p.x",
        );
        assert_error("struct P { var x: Int } var p: P = $P(1); return p.z", "no field or method named z");
        assert_error("struct P { var x: Int } var p: P = $P(\"a\")", "expected Int but got String");
        assert_error("var x: Int = 1; return $x", "non-struct reference: x");
        assert_error(
            "var i: Int = 1; return i.x",
            "access a field on an expression of type Int",
        );
    }

    #[test]
    fn operator_overloading() {
        assert_ok(
            "struct V { var x: Int \
               fun plus(o: V): V { return $V(x + o.x) } } \
             var v: V = $V(1) + $V(2); return v.x",
        );
        assert_error(
            "struct V { var x: Int } var v: V = $V(1) * $V(2)",
            "has no method mul to support operator *",
        );
    }

    #[test]
    fn statements_are_checked() {
        assert_error("1 + 1", "Expression used as statement");
        assert_error("if 1 return 1", "If statement with a non-boolean condition of type: Int");
        assert_error("while \"x\" {}", "While statement with a non-boolean condition");
        assert_error("fun f(): Int { return }", "Return without value");
        assert_error("fun f() { return 1 }", "Return with a value in a Void function");
        assert_error("fun f(): Int { return \"a\" }", "expected Int but got String");
        assert_error("fun f(): Int { if true return 1 }", "Missing return in function f");
        assert_ok("fun f(): Int { if true return 1 else { return 2 } }");
        assert_ok("fun f(): Int { while true { return 1 } return 0 }");
    }

    #[test]
    fn assignments_need_lvalues() {
        assert_ok("var xs: Int[] = [1]; xs[0] = 2");
        assert_error("fun f() {} f = f", "non-lvalue");
        assert_error("1 = 2", "non-lvalue");
        assert_error("var x: Int = 1; x = \"a\"", "non-compatible lvalue");
    }

    #[test]
    fn sized_arrays_are_typed_by_dimensions() {
        assert_ok("var m: Int[2][3]; var row: Int[] = m[0]; return m[1][2]");
        assert_error("var m: Int[2]; var s: String = m[0]", "expected String but got Int");
    }

    #[test]
    fn unknown_types_are_reported() {
        assert_error("var x: Foo = null", "could not resolve: Foo");
        assert_error("var t: true = true", "true does not name a type");
    }

    #[test]
    fn produces_hir_for_valid_programs() {
        let program = parse("fun f(): Int { return 1 } var x: Int = f(); return x").expect("parse");
        let result = typecheck_program(&program);
        let hir = result.program.expect("hir");
        assert_eq!(hir.functions.len(), 1);
        assert_eq!(hir.body.slots, 1);
        // function declarations do not produce statements
        assert_eq!(hir.body.statements.len(), 2);
    }
}
