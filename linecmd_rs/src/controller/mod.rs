//! Declarative controller tables and the path resolver.
//!
//! A [`Controller`] is one scope: a table of tagged operations plus tagged
//! fields, each field nesting another controller. Tables are built once,
//! explicitly, with [`Controller::builder`]:
//!
//! ```
//! use linecmd::controller::{Controller, Tag};
//!
//! let math = Controller::builder("Math")
//!     .operation(Tag::none(), "add", |a: i64, b: i64| a + b)
//!     .build()
//!     .unwrap();
//! let root = Controller::builder("Root")
//!     .operation(Tag::default_op(), "echo", |msg: String| msg)
//!     .field(Tag::none(), "math", math)
//!     .build()
//!     .unwrap();
//!
//! let path: Vec<String> = ["math", "add", "2", "3"].map(String::from).to_vec();
//! let resolution = root.resolve(&path).unwrap();
//! assert_eq!(resolution.operation.name(), "add");
//! assert_eq!(resolution.consumed, 2);
//! ```
//!
//! # Resolution
//!
//! For each path segment, operations of the current scope are searched
//! first, then fields. A matching operation ends the walk; a matching field
//! descends into its controller. A segment that matches neither falls back
//! to the scope's default operation (the segment then becomes its first
//! argument). Running out of segments also selects the default operation.
//! Without a default, both cases are a [`PathNotFound`].
//!
//! Same-named operations are told apart by arity: the one whose arity equals
//! the number of tokens after the name wins, then the default-tagged one,
//! then the first declared.

mod operation;

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{DefinitionError, PathNotFound};

pub use operation::{IntoOperation, Operation};

/// Tag metadata attached to an operation or a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    name: String,
    is_default: bool,
}

impl Tag {
    /// No explicit name, not default.
    pub fn none() -> Self {
        Self::default()
    }

    /// Match the member under `name` instead of its declared name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_default: false,
        }
    }

    /// The default operation of its scope.
    pub fn default_op() -> Self {
        Self::none().as_default()
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn explicit_name(&self) -> Option<&str> {
        (!self.name.is_empty()).then_some(self.name.as_str())
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// The explicit name if set, else `declared`.
    pub fn effective_name<'a>(&'a self, declared: &'a str) -> &'a str {
        self.explicit_name().unwrap_or(declared)
    }
}

/// A tagged field: a named link to a nested scope.
#[derive(Debug)]
pub struct Field {
    name: String,
    declared_name: String,
    scope: Arc<Controller>,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_name(&self) -> &str {
        &self.declared_name
    }

    pub fn scope(&self) -> &Controller {
        &self.scope
    }
}

/// Outcome of a successful path walk.
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'c> {
    pub operation: &'c Operation,
    /// Number of leading path tokens that named scopes or the operation.
    pub consumed: usize,
}

/// One scope of tagged operations and fields.
#[derive(Debug)]
pub struct Controller {
    type_name: String,
    operations: Vec<Operation>,
    fields: Vec<Field>,
}

impl Controller {
    pub fn builder(type_name: impl Into<String>) -> ControllerBuilder {
        ControllerBuilder {
            type_name: type_name.into(),
            operations: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn default_operation(&self) -> Option<&Operation> {
        self.operations.iter().find(|op| op.is_default())
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Pick the operation named `name` for a call with `remaining` tokens.
    pub fn select_operation(&self, name: &str, remaining: usize) -> Option<&Operation> {
        let mut candidates = self.operations.iter().filter(|op| op.name() == name);
        let first = candidates.next()?;
        let others: Vec<&Operation> = candidates.collect();
        if others.is_empty() {
            return Some(first);
        }

        let all = || std::iter::once(first).chain(others.iter().copied());
        all()
            .find(|op| op.arity() == remaining)
            .or_else(|| all().find(|op| op.is_default()))
            .or(Some(first))
    }

    /// Walk `path` down the scope tree to a leaf operation.
    pub fn resolve(&self, path: &[String]) -> Result<Resolution<'_>, PathNotFound> {
        let mut scope = self;

        for (depth, segment) in path.iter().enumerate() {
            let remaining = path.len() - depth - 1;
            if let Some(operation) = scope.select_operation(segment, remaining) {
                return Ok(Resolution {
                    operation,
                    consumed: depth + 1,
                });
            }
            if let Some(field) = scope.field(segment) {
                scope = &field.scope;
                continue;
            }
            return scope
                .default_operation()
                .map(|operation| Resolution {
                    operation,
                    consumed: depth,
                })
                .ok_or_else(|| PathNotFound {
                    segment: Some(segment.clone()),
                    depth,
                });
        }

        scope
            .default_operation()
            .map(|operation| Resolution {
                operation,
                consumed: path.len(),
            })
            .ok_or(PathNotFound {
                segment: None,
                depth: path.len(),
            })
    }

    /// One line per reachable operation: `field field name <type>..`.
    pub fn usage_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        self.collect_usage("", &mut lines);
        lines
    }

    fn collect_usage(&self, prefix: &str, lines: &mut Vec<String>) {
        for op in &self.operations {
            let marker = if op.is_default() { " (default)" } else { "" };
            lines.push(format!("{prefix}{}{marker}", op.signature()));
        }
        for field in &self.fields {
            field
                .scope
                .collect_usage(&format!("{prefix}{} ", field.name), lines);
        }
    }

    /// Names of the scope reached by `path` that start with `partial`.
    ///
    /// Empty once the path reaches an operation: the rest are arguments.
    pub fn completions(&self, path: &[String], partial: &str) -> Vec<String> {
        let mut scope = self;
        for segment in path {
            match scope.field(segment) {
                Some(field) if scope.select_operation(segment, 0).is_none() => {
                    scope = &field.scope;
                }
                _ => return Vec::new(),
            }
        }

        let names: BTreeSet<&str> = scope
            .operations
            .iter()
            .map(Operation::name)
            .chain(scope.fields.iter().map(Field::name))
            .filter(|name| name.starts_with(partial))
            .collect();
        names.into_iter().map(str::to_string).collect()
    }
}

/// Collects the tagged members of one scope.
pub struct ControllerBuilder {
    type_name: String,
    operations: Vec<Operation>,
    fields: Vec<Field>,
}

impl ControllerBuilder {
    /// Add an operation whose signature is taken from `handler`.
    pub fn operation<H, Args>(mut self, tag: Tag, declared_name: &str, handler: H) -> Self
    where
        H: IntoOperation<Args>,
    {
        self.operations
            .push(Operation::new(&tag, declared_name, handler));
        self
    }

    /// Add a field nesting `scope`.
    pub fn field(mut self, tag: Tag, declared_name: &str, scope: impl Into<Arc<Controller>>) -> Self {
        self.fields.push(Field {
            name: tag.effective_name(declared_name).to_string(),
            declared_name: declared_name.to_string(),
            scope: scope.into(),
        });
        self
    }

    /// Validate the table: one default at most, no ambiguous members.
    pub fn build(self) -> Result<Controller, DefinitionError> {
        let mut defaults = self.operations.iter().filter(|op| op.is_default());
        if let (Some(first), Some(second)) = (defaults.next(), defaults.next()) {
            return Err(DefinitionError::MultipleDefaults {
                scope: self.type_name,
                first: first.name().to_string(),
                second: second.name().to_string(),
            });
        }

        let mut signatures = BTreeSet::new();
        for op in &self.operations {
            if !signatures.insert((op.name(), op.arity())) {
                return Err(DefinitionError::DuplicateOperation {
                    scope: self.type_name.clone(),
                    name: op.name().to_string(),
                    arity: op.arity(),
                });
            }
        }

        let mut field_names = BTreeSet::new();
        for field in &self.fields {
            if !field_names.insert(field.name.as_str()) {
                return Err(DefinitionError::DuplicateField {
                    scope: self.type_name.clone(),
                    name: field.name.clone(),
                });
            }
        }

        Ok(Controller {
            type_name: self.type_name,
            operations: self.operations,
            fields: self.fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    fn math() -> Controller {
        Controller::builder("Math")
            .operation(Tag::none(), "add", |a: i64, b: i64| a + b)
            .operation(Tag::named("neg"), "negate", |a: i64| -a)
            .build()
            .unwrap()
    }

    fn root() -> Controller {
        Controller::builder("Root")
            .operation(Tag::default_op(), "run", |msg: String| msg)
            .operation(Tag::named("Something"), "run", |msg: String, i: i32| {
                msg.repeat(i.max(0) as usize)
            })
            .field(Tag::none(), "math", math())
            .build()
            .unwrap()
    }

    #[test]
    fn test_operation_by_effective_name() {
        let root = root();
        let res = root.resolve(&path("Something hi 3")).unwrap();
        assert_eq!(res.operation.name(), "Something");
        assert_eq!(res.consumed, 1);
        // the declared name is not matched once a tag renames the member
        let err = root.resolve(&path("math negate 1")).unwrap_err();
        assert_eq!(err.segment.as_deref(), Some("negate"));
    }

    #[test]
    fn test_field_descent() {
        let root = root();
        let res = root.resolve(&path("math add 2 3")).unwrap();
        assert_eq!(res.operation.name(), "add");
        assert_eq!(res.consumed, 2);
        let res = root.resolve(&path("math neg 4")).unwrap();
        assert_eq!(res.operation.declared_name(), "negate");
    }

    #[test]
    fn test_default_fallback() {
        let root = root();
        let res = root.resolve(&path("hello")).unwrap();
        assert_eq!(res.operation.declared_name(), "run");
        assert!(res.operation.is_default());
        assert_eq!(res.consumed, 0);

        let res = root.resolve(&[]).unwrap();
        assert!(res.operation.is_default());
    }

    #[test]
    fn test_path_not_found_without_default() {
        let root = root();
        let err = root.resolve(&path("math mul 2 3")).unwrap_err();
        assert_eq!(
            err,
            PathNotFound {
                segment: Some("mul".to_string()),
                depth: 1
            }
        );
        let err = root.resolve(&path("math")).unwrap_err();
        assert_eq!(err.segment, None);
        assert_eq!(err.depth, 1);
    }

    #[test]
    fn test_overload_by_arity() {
        let scope = Controller::builder("Greeter")
            .operation(Tag::none(), "greet", |name: String| format!("hi {name}"))
            .operation(Tag::none(), "greet", |name: String, greeting: String| {
                format!("{greeting} {name}")
            })
            .build()
            .unwrap();

        let one = scope.resolve(&path("greet bob")).unwrap();
        assert_eq!(one.operation.arity(), 1);
        let two = scope.resolve(&path("greet bob hey")).unwrap();
        assert_eq!(two.operation.arity(), 2);
        // no exact arity and no default: first declared
        let many = scope.resolve(&path("greet a b c")).unwrap();
        assert_eq!(many.operation.arity(), 1);
    }

    #[test]
    fn test_overload_prefers_default_without_exact_arity() {
        let scope = Controller::builder("Greeter")
            .operation(Tag::none(), "greet", |name: String| name)
            .operation(Tag::default_op(), "greet", |a: String, b: String| a + &b)
            .build()
            .unwrap();
        let res = scope.resolve(&path("greet")).unwrap();
        assert_eq!(res.operation.arity(), 2);
    }

    #[test]
    fn test_two_defaults_rejected() {
        let err = Controller::builder("Broken")
            .operation(Tag::default_op(), "a", || "a")
            .operation(Tag::default_op(), "b", || "b")
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::MultipleDefaults { .. }));
    }

    #[test]
    fn test_duplicate_signature_rejected() {
        let err = Controller::builder("Broken")
            .operation(Tag::none(), "x", |a: i32| a)
            .operation(Tag::named("x"), "y", |b: String| b)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::DuplicateOperation {
                scope: "Broken".to_string(),
                name: "x".to_string(),
                arity: 1
            }
        );
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = Controller::builder("Broken")
            .field(Tag::none(), "math", math())
            .field(Tag::named("math"), "other", math())
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::DuplicateField { .. }));
    }

    #[test]
    fn test_usage_lines() {
        assert_eq!(
            root().usage_lines(),
            [
                "run <string> (default)",
                "Something <string> <i32>",
                "math add <i64> <i64>",
                "math neg <i64>",
            ]
        );
    }

    #[test]
    fn test_completions() {
        let root = root();
        assert_eq!(root.completions(&[], "m"), ["math"]);
        assert_eq!(root.completions(&path("math"), ""), ["add", "neg"]);
        assert!(root.completions(&path("run"), "").is_empty());
        assert!(root.completions(&path("nope"), "").is_empty());
    }

    #[test]
    fn test_tag_effective_name() {
        assert_eq!(Tag::none().effective_name("run"), "run");
        assert_eq!(Tag::named("Go").effective_name("run"), "Go");
        assert_eq!(Tag::named("").effective_name("run"), "run");
        assert!(Tag::named("x").as_default().is_default());
    }
}
