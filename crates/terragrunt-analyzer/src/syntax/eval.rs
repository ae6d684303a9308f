//! Tolerant evaluation of a parsed unit configuration.
//!
//! The evaluator is not a Terragrunt interpreter. It resolves the references
//! a unit can declare locally (`local.*`, `dependency.*`, `include.*`, for
//! iterators), folds literal values, and checks the shapes of what it can see.
//!
//! [`Value::Unknown`] is the placeholder for everything it cannot see. Its
//! contract: attribute access, indexing, splats, conditionals, arithmetic,
//! comparisons, template interpolation, for-expressions and function calls on
//! an unknown value all yield unknown, and none of them report an error.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::syntax::{
    ErrorKind, ErrorLevel, Interrupted, Report,
    ast::*,
};

/// Top-level block types Terragrunt understands.
pub const KNOWN_BLOCKS: &[&str] = &[
    "terraform",
    "remote_state",
    "include",
    "locals",
    "dependency",
    "dependencies",
    "generate",
    "errors",
    "exclude",
    "feature",
    "engine",
    "catalog",
    "unit",
    "stack",
];

/// Roots whose values only exist at run time.
const RUNTIME_ROOTS: &[&str] = &["feature", "values", "stack", "unit"];

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Object(BTreeMap<String, Value>),
    Unknown,
}

impl Value {
    pub fn shape(&self) -> Shape {
        match self {
            Value::Null => Shape::Null,
            Value::Bool(_) => Shape::Bool,
            Value::Number(_) => Shape::Number,
            Value::String(_) => Shape::String,
            Value::List(_) => Shape::List,
            Value::Object(_) => Shape::Object,
            Value::Unknown => Shape::Unknown,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::String(s) if s == "true" => Some(true),
            Value::String(s) if s == "false" => Some(false),
            _ => None,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_template_text(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(format_number(*n)),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Coarse type of a value, shown on hover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Null,
    Bool,
    Number,
    String,
    List,
    Object,
    Unknown,
}

impl Shape {
    pub fn name(self) -> &'static str {
        match self {
            Shape::Null => "null",
            Shape::Bool => "bool",
            Shape::Number => "number",
            Shape::String => "string",
            Shape::List => "list",
            Shape::Object => "object",
            Shape::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Shape {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A `dependency "<name>" { ... }` block as seen by the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyDecl {
    pub name: String,
    pub config_path: Option<String>,
    pub mock_outputs: Option<Value>,
    /// Whole block.
    pub span: Span,
    /// `dependency "<name>"`.
    pub header_span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DependencyUnresolved {
    #[error("outputs of dependency `{name}` are not available until it is applied")]
    NotApplied { name: String },
}

/// Strategy for reading the outputs of another module.
pub trait ModuleResolver: Send + Sync {
    fn resolve_outputs(
        &self,
        dependency: &DependencyDecl,
    ) -> Result<Value, DependencyUnresolved>;
}

/// Nested evaluations past this depth yield unknown. Chains of locals are
/// not bounded by the parser's nesting limit, so this one bounds them.
pub const MAX_EVAL_DEPTH: usize = 256;

pub(crate) struct Evaluation {
    pub reports: Vec<Report>,
    pub shapes: BTreeMap<usize, Shape>,
    pub dependencies: Vec<DependencyDecl>,
}

pub(crate) fn evaluate(
    body: &Body,
    resolver: &dyn ModuleResolver,
    is_interrupted: &dyn Fn() -> bool,
) -> Result<Evaluation, Interrupted> {
    let mut evaluator = Evaluator {
        resolver,
        is_interrupted,
        reports: Vec::new(),
        shapes: BTreeMap::new(),
        dependencies: BTreeMap::new(),
        include_labels: HashSet::new(),
        has_unlabeled_include: false,
        locals: HashMap::new(),
        local_values: HashMap::new(),
        locals_in_progress: HashSet::new(),
        scopes: Vec::new(),
        depth: 0,
        depth_reported: false,
    };
    evaluator.collect(body);

    // Dependency blocks first so that their `mock_outputs` are known before
    // other blocks reference them.
    let (dependency_blocks, rest): (Vec<Structure>, Vec<Structure>) = body
        .items()
        .partition(|item| matches!(item, Structure::Block(block) if block.ident().name == "dependency"));
    let mut seen = HashMap::new();
    for item in dependency_blocks.iter().chain(&rest) {
        evaluator.checkpoint()?;
        evaluator.walk_structure(item, None, &mut seen)?;
    }

    let mut dependencies: Vec<DependencyDecl> = evaluator.dependencies.into_values().collect();
    dependencies.sort_by_key(|dep| dep.span.start);
    Ok(Evaluation {
        reports: evaluator.reports,
        shapes: evaluator.shapes,
        dependencies,
    })
}

struct Evaluator<'a> {
    resolver: &'a dyn ModuleResolver,
    is_interrupted: &'a dyn Fn() -> bool,
    reports: Vec<Report>,
    shapes: BTreeMap<usize, Shape>,
    dependencies: BTreeMap<String, DependencyDecl>,
    include_labels: HashSet<String>,
    has_unlabeled_include: bool,
    locals: HashMap<String, Attribute>,
    local_values: HashMap<String, Value>,
    locals_in_progress: HashSet<String>,
    scopes: Vec<HashMap<String, Value>>,
    depth: usize,
    depth_reported: bool,
}

impl Evaluator<'_> {
    fn checkpoint(&self) -> Result<(), Interrupted> {
        if (self.is_interrupted)() {
            Err(Interrupted)
        } else {
            Ok(())
        }
    }

    fn report(
        &mut self,
        kind: ErrorKind,
        level: ErrorLevel,
        span: Span,
        message: impl Into<String>,
    ) {
        self.reports.push(Report {
            kind,
            level,
            message: message.into(),
            span,
        });
    }

    fn error(
        &mut self,
        kind: ErrorKind,
        span: Span,
        message: impl Into<String>,
    ) {
        self.report(kind, ErrorLevel::Error, span, message);
    }

    // ── declarations ────────────────────────────────────────────────────

    fn collect(
        &mut self,
        body: &Body,
    ) {
        for block in body.blocks() {
            let ident = block.ident();
            let block_type = ident.name.as_str();
            if !KNOWN_BLOCKS.contains(&block_type) {
                self.report(
                    ErrorKind::Structure,
                    ErrorLevel::Warning,
                    ident.span.clone(),
                    format!("Unknown block type `{block_type}`"),
                );
                continue;
            }
            match block_type {
                "dependency" => self.collect_dependency(&block),
                "include" => match block.first_label() {
                    Some(label) => {
                        self.include_labels.insert(label);
                    },
                    None => self.has_unlabeled_include = true,
                },
                "locals" => {
                    for attr in block.attributes() {
                        let key = attr.key();
                        if self.locals.contains_key(&key.name) {
                            self.error(
                                ErrorKind::Structure,
                                key.span.clone(),
                                format!("Local `{}` is already defined", key.name),
                            );
                            continue;
                        }
                        self.locals.insert(key.name, attr);
                    }
                },
                _ => {},
            }
        }
    }

    fn collect_dependency(
        &mut self,
        block: &Block,
    ) {
        let Some(name) = block.first_label() else {
            self.error(
                ErrorKind::Structure,
                block.ident().span,
                "A `dependency` block requires a name label",
            );
            return;
        };
        if self.dependencies.contains_key(&name) {
            self.error(
                ErrorKind::Structure,
                block.header_span(),
                format!("Dependency `{name}` is already declared"),
            );
            return;
        }

        let config_path_attr = block.get_attribute("config_path");
        let config_path = config_path_attr
            .as_ref()
            .and_then(|attr| attr.value())
            .and_then(|value| value.as_static_string());
        if config_path_attr.is_none() {
            self.error(
                ErrorKind::Structure,
                block.header_span(),
                format!("Dependency `{name}` is missing the required `config_path` attribute"),
            );
        }

        self.dependencies.insert(
            name.clone(),
            DependencyDecl {
                name,
                config_path,
                mock_outputs: None,
                span: block.span(),
                header_span: block.header_span(),
            },
        );
    }

    // ── walking ─────────────────────────────────────────────────────────

    fn walk_structure(
        &mut self,
        item: &Structure,
        owner: Option<&Block>,
        seen: &mut HashMap<String, Span>,
    ) -> Result<(), Interrupted> {
        match item {
            Structure::Attribute(attr) => {
                let key = attr.key();
                if seen.contains_key(&key.name) {
                    let scope = owner.map_or("this file".to_owned(), |b| format!("`{}`", b.header_text()));
                    self.error(
                        ErrorKind::Structure,
                        key.span.clone(),
                        format!("Attribute `{}` is already defined in {scope}", key.name),
                    );
                } else {
                    seen.insert(key.name.clone(), key.span.clone());
                }

                let owner_type = owner.map(|block| block.ident().name);
                let value = if attr.is_recovered() {
                    // The syntax error already covers this line; what follows
                    // the key is not checked as a value.
                    Value::Unknown
                } else if owner_type.as_deref() == Some("locals") && self.is_primary_local(attr) {
                    self.eval_local(&key.name, key.span.clone())
                } else {
                    self.eval_attribute(attr)
                };

                if let Some(block) = owner
                    && owner_type.as_deref() == Some("dependency")
                    && key.name == "mock_outputs"
                    && let Some(name) = block.first_label()
                    && let Some(decl) = self.dependencies.get_mut(&name)
                    && decl.span == block.span()
                {
                    decl.mock_outputs = Some(value.clone());
                }

                self.shapes.insert(key.span.start, value.shape());
            },
            Structure::Block(block) => {
                let mut block_seen = HashMap::new();
                for child in block.items() {
                    self.checkpoint()?;
                    self.walk_structure(&child, Some(block), &mut block_seen)?;
                }
            },
        }
        Ok(())
    }

    fn eval_attribute(
        &mut self,
        attr: &Attribute,
    ) -> Value {
        match attr.value() {
            Some(expr) => self.eval(&expr),
            None => Value::Unknown,
        }
    }

    fn is_primary_local(
        &self,
        attr: &Attribute,
    ) -> bool {
        self.locals.get(&attr.key().name).is_some_and(|local| local == attr)
    }

    fn eval_local(
        &mut self,
        name: &str,
        reference: Span,
    ) -> Value {
        if let Some(value) = self.local_values.get(name) {
            return value.clone();
        }
        let Some(attr) = self.locals.get(name).cloned() else {
            return Value::Unknown;
        };
        if attr.is_recovered() {
            return Value::Unknown;
        }
        if !self.locals_in_progress.insert(name.to_owned()) {
            self.error(
                ErrorKind::Reference,
                reference,
                format!("Local `{name}` refers to itself"),
            );
            return Value::Unknown;
        }
        // Locals are evaluated outside any for-expression scope.
        let scopes = std::mem::take(&mut self.scopes);
        let value = self.eval_attribute(&attr);
        self.scopes = scopes;
        self.locals_in_progress.remove(name);
        self.local_values.insert(name.to_owned(), value.clone());
        value
    }

    // ── expressions ─────────────────────────────────────────────────────

    fn eval(
        &mut self,
        expr: &Expr,
    ) -> Value {
        if self.depth >= MAX_EVAL_DEPTH {
            if !self.depth_reported {
                self.depth_reported = true;
                self.report(
                    ErrorKind::Structure,
                    ErrorLevel::Warning,
                    expr.span(),
                    "Expression is nested too deeply to evaluate",
                );
            }
            return Value::Unknown;
        }
        self.depth += 1;
        let value = self.eval_inner(expr);
        self.depth -= 1;
        value
    }

    fn eval_operand(
        &mut self,
        expr: Option<Expr>,
    ) -> Value {
        match expr {
            Some(expr) => self.eval(&expr),
            None => Value::Unknown,
        }
    }

    fn eval_inner(
        &mut self,
        expr: &Expr,
    ) -> Value {
        match expr {
            Expr::Literal(literal) => match literal.value() {
                Literal::Null => Value::Null,
                Literal::Bool(b) => Value::Bool(b),
                Literal::Number(n) => Value::Number(n),
            },
            Expr::Template(template) => self.eval_template(template),
            Expr::Variable(variable) => self.eval_traversal(&variable.ident(), &[]),
            Expr::Traversal(traversal) => {
                let operators = traversal.operators();
                match traversal.root() {
                    Some(Expr::Variable(variable)) => self.eval_traversal(&variable.ident(), &operators),
                    root => {
                        let value = self.eval_operand(root);
                        self.apply_operators(value, &operators)
                    },
                }
            },
            Expr::FuncCall(call) => {
                for arg in call.args() {
                    self.eval(&arg);
                }
                Value::Unknown
            },
            Expr::Tuple(tuple) => Value::List(tuple.items().map(|item| self.eval(&item)).collect()),
            Expr::Object(object) => self.eval_object(object),
            Expr::Unary(unary) => {
                let operand = unary.operand();
                let span = operand.as_ref().map_or_else(|| unary.span(), |operand| operand.span());
                let value = self.eval_operand(operand);
                self.eval_unary(unary.op(), value, span)
            },
            Expr::Binary(binary) => {
                let left = self.eval_operand(binary.lhs());
                let right = self.eval_operand(binary.rhs());
                match binary.op() {
                    Some(op) => self.eval_binary(op, left, right, binary.span()),
                    None => Value::Unknown,
                }
            },
            Expr::Conditional(conditional) => {
                let cond = conditional.cond();
                let cond_span = cond.as_ref().map_or_else(|| conditional.span(), |cond| cond.span());
                let condition = self.eval_operand(cond);
                let then_value = self.eval_operand(conditional.then_expr());
                let else_value = self.eval_operand(conditional.else_expr());
                if condition.is_unknown() {
                    return Value::Unknown;
                }
                match condition.as_bool() {
                    Some(true) => then_value,
                    Some(false) => else_value,
                    None => {
                        self.error(
                            ErrorKind::Type,
                            cond_span,
                            format!("Condition must be a bool, found {}", condition.shape()),
                        );
                        Value::Unknown
                    },
                }
            },
            Expr::For(for_expr) => self.eval_for(for_expr),
            Expr::Parenthesized(paren) => self.eval_operand(paren.inner()),
            Expr::Invalid(_) => Value::Unknown,
        }
    }

    fn eval_template(
        &mut self,
        template: &TemplateExpr,
    ) -> Value {
        let mut text = String::new();
        let mut known = !template.has_directives();
        for part in template.parts() {
            match part {
                TemplatePart::Literal(literal) => text.push_str(&literal),
                TemplatePart::Interpolation(expr) => {
                    let value = self.eval(&expr);
                    match value {
                        Value::List(_) | Value::Object(_) => {
                            self.error(
                                ErrorKind::Type,
                                expr.span(),
                                format!("Cannot include a {} value in a string template", value.shape()),
                            );
                            known = false;
                        },
                        Value::Null => {
                            self.error(ErrorKind::Type, expr.span(), "Cannot include a null value in a string template");
                            known = false;
                        },
                        _ => match value.as_template_text() {
                            Some(part_text) => text.push_str(&part_text),
                            None => known = false,
                        },
                    }
                },
            }
        }
        if known {
            Value::String(text)
        } else {
            Value::Unknown
        }
    }

    fn eval_object(
        &mut self,
        object_expr: &ObjectExpr,
    ) -> Value {
        let mut object = BTreeMap::new();
        let mut known = true;
        for item in object_expr.items() {
            let (Some(key), Some(value_expr)) = (item.key(), item.value()) else {
                continue;
            };
            let key = match key {
                ObjectKey::Ident(ident) => Some(ident.name),
                ObjectKey::Expr(expr) => match self.eval(&expr) {
                    Value::Unknown => None,
                    value => match value.as_template_text() {
                        Some(key) => Some(key),
                        None => {
                            self.error(
                                ErrorKind::Type,
                                expr.span(),
                                format!("Object key must be a string, found {}", value.shape()),
                            );
                            None
                        },
                    },
                },
            };
            let value = self.eval(&value_expr);
            match key {
                Some(key) => {
                    object.insert(key, value);
                },
                None => known = false,
            }
        }
        if known {
            Value::Object(object)
        } else {
            Value::Unknown
        }
    }

    fn eval_for(
        &mut self,
        for_expr: &ForExpr,
    ) -> Value {
        let collection_expr = for_expr.collection();
        let collection_span = collection_expr.as_ref().map_or_else(|| for_expr.span(), |expr| expr.span());
        let collection = self.eval_operand(collection_expr);
        if !matches!(collection, Value::List(_) | Value::Object(_) | Value::Unknown) {
            self.error(
                ErrorKind::Type,
                collection_span,
                format!("Cannot iterate over a {} value", collection.shape()),
            );
        }

        // Iterators are bound to unknown: the body is checked once, not per
        // element.
        let mut scope = HashMap::new();
        if let Some(key_var) = for_expr.key_var() {
            scope.insert(key_var.name, Value::Unknown);
        }
        scope.insert(for_expr.value_var().name, Value::Unknown);
        self.scopes.push(scope);
        if let Some(key_expr) = for_expr.key_expr() {
            self.eval(&key_expr);
        }
        self.eval_operand(for_expr.value_expr());
        if let Some(cond) = for_expr.cond() {
            self.eval(&cond);
        }
        self.scopes.pop();
        Value::Unknown
    }

    fn eval_unary(
        &mut self,
        op: UnaryOperator,
        value: Value,
        span: Span,
    ) -> Value {
        if value.is_unknown() {
            return Value::Unknown;
        }
        match op {
            UnaryOperator::Not => match value.as_bool() {
                Some(b) => Value::Bool(!b),
                None => {
                    self.error(
                        ErrorKind::Type,
                        span,
                        format!("Operator `!` requires a bool, found {}", value.shape()),
                    );
                    Value::Unknown
                },
            },
            UnaryOperator::Neg => match value.as_number() {
                Some(n) => Value::Number(-n),
                None => {
                    self.error(
                        ErrorKind::Type,
                        span,
                        format!("Operator `-` requires a number, found {}", value.shape()),
                    );
                    Value::Unknown
                },
            },
        }
    }

    fn eval_binary(
        &mut self,
        op: BinaryOperator,
        left: Value,
        right: Value,
        span: Span,
    ) -> Value {
        if left.is_unknown() || right.is_unknown() {
            return Value::Unknown;
        }
        match op {
            BinaryOperator::Eq => Value::Bool(left == right),
            BinaryOperator::NotEq => Value::Bool(left != right),
            BinaryOperator::And | BinaryOperator::Or => match (left.as_bool(), right.as_bool()) {
                (Some(l), Some(r)) => Value::Bool(if op == BinaryOperator::And { l && r } else { l || r }),
                _ => self.invalid_operands(op, "bool", &left, &right, span),
            },
            _ => {
                let (Some(l), Some(r)) = (left.as_number(), right.as_number()) else {
                    return self.invalid_operands(op, "number", &left, &right, span);
                };
                match op {
                    BinaryOperator::Less => Value::Bool(l < r),
                    BinaryOperator::LessEq => Value::Bool(l <= r),
                    BinaryOperator::Greater => Value::Bool(l > r),
                    BinaryOperator::GreaterEq => Value::Bool(l >= r),
                    BinaryOperator::Add => Value::Number(l + r),
                    BinaryOperator::Sub => Value::Number(l - r),
                    BinaryOperator::Mul => Value::Number(l * r),
                    BinaryOperator::Div | BinaryOperator::Mod if r == 0.0 => {
                        self.error(ErrorKind::Type, span, "Division by zero");
                        Value::Unknown
                    },
                    BinaryOperator::Div => Value::Number(l / r),
                    BinaryOperator::Mod => Value::Number(l % r),
                    _ => Value::Unknown,
                }
            },
        }
    }

    fn invalid_operands(
        &mut self,
        op: BinaryOperator,
        expected: &str,
        left: &Value,
        right: &Value,
        span: Span,
    ) -> Value {
        self.error(
            ErrorKind::Type,
            span,
            format!(
                "Operator `{}` requires {expected} operands, found {} and {}",
                op.symbol(),
                left.shape(),
                right.shape()
            ),
        );
        Value::Unknown
    }

    // ── references ──────────────────────────────────────────────────────

    fn eval_traversal(
        &mut self,
        root: &Ident,
        operators: &[TraversalOperator],
    ) -> Value {
        if let Some(value) = self.scopes.iter().rev().find_map(|scope| scope.get(&root.name)) {
            let value = value.clone();
            return self.apply_operators(value, operators);
        }

        match root.name.as_str() {
            "local" => {
                let Some((name, rest)) = split_first_attr(operators) else {
                    return self.apply_operators(Value::Unknown, operators);
                };
                if !self.locals.contains_key(&name.name) {
                    self.error(
                        ErrorKind::Reference,
                        root.span.start..name.span.end,
                        format!("Unknown local `{}`", name.name),
                    );
                    return self.apply_operators(Value::Unknown, rest);
                }
                let value = self.eval_local(&name.name, root.span.start..name.span.end);
                self.apply_operators(value, rest)
            },
            "dependency" => self.eval_dependency(root, operators),
            "include" => {
                if let Some((label, _)) = split_first_attr(operators)
                    && !self.has_unlabeled_include
                    && !self.include_labels.contains(&label.name)
                {
                    self.error(
                        ErrorKind::Reference,
                        root.span.start..label.span.end,
                        format!("Unknown include `{}`", label.name),
                    );
                }
                self.apply_operators(Value::Unknown, operators)
            },
            name if RUNTIME_ROOTS.contains(&name) => self.apply_operators(Value::Unknown, operators),
            name => {
                self.error(
                    ErrorKind::Reference,
                    root.span.clone(),
                    format!("Unknown variable `{name}`"),
                );
                self.apply_operators(Value::Unknown, operators)
            },
        }
    }

    fn has_includes(&self) -> bool {
        self.has_unlabeled_include || !self.include_labels.is_empty()
    }

    fn eval_dependency(
        &mut self,
        root: &Ident,
        operators: &[TraversalOperator],
    ) -> Value {
        let Some((name, rest)) = split_first_attr(operators) else {
            return self.apply_operators(Value::Unknown, operators);
        };
        let Some(decl) = self.dependencies.get(&name.name).cloned() else {
            // An included file may declare the dependency; without reading
            // it the reference cannot be judged.
            if !self.has_includes() {
                self.error(
                    ErrorKind::Reference,
                    root.span.start..name.span.end,
                    format!(
                        "Unknown dependency `{0}`; declare it with a `dependency \"{0}\"` block",
                        name.name
                    ),
                );
            }
            return self.apply_operators(Value::Unknown, rest);
        };

        match split_first_attr(rest) {
            Some((attr, after)) if attr.name == "outputs" => {
                let value = match self.resolver.resolve_outputs(&decl) {
                    Ok(value) => value,
                    Err(err) => {
                        self.error(
                            ErrorKind::DependencyUnresolved,
                            root.span.start..attr.span.end,
                            err.to_string(),
                        );
                        Value::Unknown
                    },
                };
                self.apply_operators(value, after)
            },
            _ => self.apply_operators(Value::Unknown, rest),
        }
    }

    fn apply_operators(
        &mut self,
        mut value: Value,
        operators: &[TraversalOperator],
    ) -> Value {
        for operator in operators {
            value = match operator {
                TraversalOperator::GetAttr(ident) => self.get_attr(value, ident),
                TraversalOperator::Index(expr) => {
                    let index = self.eval(expr);
                    self.index(value, index, expr.span())
                },
                TraversalOperator::LegacyIndex {
                    index,
                    span,
                } => self.index(value, Value::Number(*index as f64), span.clone()),
                TraversalOperator::AttrSplat(_) | TraversalOperator::FullSplat(_) => Value::Unknown,
            };
        }
        value
    }

    fn get_attr(
        &mut self,
        value: Value,
        ident: &Ident,
    ) -> Value {
        match value {
            Value::Unknown => Value::Unknown,
            Value::Object(mut fields) => match fields.remove(&ident.name) {
                Some(field) => field,
                None => {
                    self.error(
                        ErrorKind::Type,
                        ident.span.clone(),
                        format!("Object has no attribute `{}`", ident.name),
                    );
                    Value::Unknown
                },
            },
            Value::Null => {
                self.error(
                    ErrorKind::Type,
                    ident.span.clone(),
                    format!("Attempt to get attribute `{}` from a null value", ident.name),
                );
                Value::Unknown
            },
            other => {
                self.error(
                    ErrorKind::Type,
                    ident.span.clone(),
                    format!("Cannot get attribute `{}` from a {} value", ident.name, other.shape()),
                );
                Value::Unknown
            },
        }
    }

    fn index(
        &mut self,
        value: Value,
        index: Value,
        span: Span,
    ) -> Value {
        if value.is_unknown() || index.is_unknown() {
            return Value::Unknown;
        }
        match value {
            Value::List(mut items) => match index.as_number() {
                Some(n) if n >= 0.0 && n.fract() == 0.0 && (n as usize) < items.len() => items.swap_remove(n as usize),
                Some(n) => {
                    self.error(
                        ErrorKind::Type,
                        span,
                        format!("Index {} is out of range for a list of {} elements", format_number(n), items.len()),
                    );
                    Value::Unknown
                },
                None => {
                    self.error(
                        ErrorKind::Type,
                        span,
                        format!("A list index must be a number, found {}", index.shape()),
                    );
                    Value::Unknown
                },
            },
            Value::Object(mut fields) => match index.as_template_text() {
                Some(key) => fields.remove(&key).unwrap_or_else(|| {
                    self.error(
                        ErrorKind::Type,
                        span,
                        format!("Object has no attribute `{key}`"),
                    );
                    Value::Unknown
                }),
                None => {
                    self.error(
                        ErrorKind::Type,
                        span,
                        format!("An object key must be a string, found {}", index.shape()),
                    );
                    Value::Unknown
                },
            },
            Value::Null => {
                self.error(ErrorKind::Type, span, "Cannot index a null value");
                Value::Unknown
            },
            other => {
                self.error(
                    ErrorKind::Type,
                    span,
                    format!("Cannot index a {} value", other.shape()),
                );
                Value::Unknown
            },
        }
    }
}

fn split_first_attr(operators: &[TraversalOperator]) -> Option<(&Ident, &[TraversalOperator])> {
    match operators.split_first() {
        Some((TraversalOperator::GetAttr(ident), rest)) => Some((ident, rest)),
        _ => None,
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/src/syntax/eval_tests.rs"]
mod tests;
