//! Session variables: four namespaces of value stacks.
//!
//! Every variable is a stack. `\SET` replaces the top, `\PUSH` adds a new
//! top, `\POP` removes it and `\UNSET` drops the whole variable. The
//! namespace is picked by the sigil on the name:
//!
//! ```text
//! -$name   named query parameter   (mirrored to the query service)
//! -name    query parameter         (mirrored to the query service)
//! $name    user session variable
//! name     predefined session variable (fixed set, created at startup)
//! ```

mod resolve;

use std::collections::HashMap;

use qsh_types::Value;

use crate::error::{ShellError, ShellResult};

pub use resolve::resolve;

/// Predefined session variables and their startup values.
pub const PREDEFINED: &[(&str, &str)] = &[
    ("histfile", ".qsh_history"),
    ("histsize", "50"),
    ("limit", "0"),
    ("autoconfig", "false"),
    ("querycreds", "\"\""),
];

/// One of the four variable namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// `-name`: request-level query parameter such as `-timeout`.
    QueryParam,
    /// `-$name`: value bound to a `$name` placeholder in statements.
    NamedParam,
    /// `$name`: scratch variables owned by the user.
    UserVar,
    /// Bare `name`: shell settings such as `histfile`.
    Predefined,
}

impl Namespace {
    /// All namespaces in sweep order.
    pub const ALL: [Namespace; 4] = [
        Namespace::QueryParam,
        Namespace::NamedParam,
        Namespace::UserVar,
        Namespace::Predefined,
    ];

    /// Sigil written before names in this namespace.
    pub fn sigil(self) -> &'static str {
        match self {
            Namespace::QueryParam => "-",
            Namespace::NamedParam => "-$",
            Namespace::UserVar => "$",
            Namespace::Predefined => "",
        }
    }

    /// Whether writes are forwarded to the query service.
    pub fn is_mirrored(self) -> bool {
        matches!(self, Namespace::QueryParam | Namespace::NamedParam)
    }

    /// Spell a name the way the user types it.
    pub fn display(self, name: &str) -> String {
        format!("{}{}", self.sigil(), name)
    }

    fn index(self) -> usize {
        match self {
            Namespace::QueryParam => 0,
            Namespace::NamedParam => 1,
            Namespace::UserVar => 2,
            Namespace::Predefined => 3,
        }
    }
}

/// Split a variable token into its namespace and bare name.
///
/// The longest sigil wins: `-$x` is a named parameter, not a query
/// parameter called `$x`.
pub fn decode_sigil(token: &str) -> ShellResult<(Namespace, &str)> {
    let (namespace, name) = if let Some(rest) = token.strip_prefix("-$") {
        (Namespace::NamedParam, rest)
    } else if let Some(rest) = token.strip_prefix('-') {
        (Namespace::QueryParam, rest)
    } else if let Some(rest) = token.strip_prefix('$') {
        (Namespace::UserVar, rest)
    } else {
        (Namespace::Predefined, token)
    };

    let starts_with_digit = name.chars().next().is_some_and(|c| c.is_ascii_digit());
    if name.is_empty() || (namespace == Namespace::QueryParam && starts_with_digit) {
        return Err(ShellError::InvalidVariableName(token.to_string()));
    }
    Ok((namespace, name))
}

/// An ordered stack of values. Empty is a valid state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stack {
    values: Vec<Value>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn pop(&mut self) -> Option<Value> {
        self.values.pop()
    }

    pub fn top(&self) -> Option<&Value> {
        self.values.last()
    }

    /// Replace the top value. Returns false when the stack is empty.
    pub fn set_top(&mut self, value: Value) -> bool {
        match self.values.last_mut() {
            Some(top) => {
                *top = value;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Outcome of a bulk push or pop sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sweep {
    /// Variables the operation applied to.
    pub applied: usize,
    /// Variables skipped because their stack was empty.
    pub skipped: usize,
}

/// All four namespaces of variable stacks.
#[derive(Debug, Clone)]
pub struct VarStore {
    tables: [HashMap<String, Stack>; 4],
}

impl Default for VarStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VarStore {
    /// Create a store with the predefined variables at their startup values.
    pub fn new() -> Self {
        let mut store = Self::empty();
        for (name, literal) in PREDEFINED {
            let value = qsh_types::str_to_val(literal).unwrap_or_else(|_| Value::from(*literal));
            let mut stack = Stack::new();
            stack.push(value);
            store.tables[Namespace::Predefined.index()].insert(name.to_string(), stack);
        }
        store
    }

    /// Create a store with no variables at all, predefined ones included.
    pub fn empty() -> Self {
        Self {
            tables: Default::default(),
        }
    }

    /// Look up a stack. `None` means the variable does not exist.
    pub fn get(&self, ns: Namespace, name: &str) -> Option<&Stack> {
        self.tables[ns.index()].get(name)
    }

    /// Depth of a variable's stack, zero when absent.
    pub fn depth(&self, ns: Namespace, name: &str) -> usize {
        self.get(ns, name).map_or(0, Stack::len)
    }

    /// Names defined in a namespace, sorted.
    pub fn names(&self, ns: Namespace) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables[ns.index()].keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Append a value, creating the stack if needed.
    ///
    /// Predefined variables cannot be created, only written.
    pub fn push(&mut self, ns: Namespace, name: &str, value: Value) -> ShellResult<()> {
        let table = &mut self.tables[ns.index()];
        match table.get_mut(name) {
            Some(stack) => stack.push(value),
            None if ns == Namespace::Predefined => {
                return Err(ShellError::UnknownPredefined(name.to_string()));
            }
            None => {
                let mut stack = Stack::new();
                stack.push(value);
                table.insert(name.to_string(), stack);
            }
        }
        Ok(())
    }

    /// Remove and return the top value.
    pub fn pop(&mut self, ns: Namespace, name: &str) -> ShellResult<Value> {
        self.tables[ns.index()]
            .get_mut(name)
            .and_then(Stack::pop)
            .ok_or_else(|| ShellError::EmptyStack(ns.display(name)))
    }

    /// Read the top value.
    pub fn top(&self, ns: Namespace, name: &str) -> ShellResult<&Value> {
        self.get(ns, name)
            .and_then(Stack::top)
            .ok_or_else(|| ShellError::EmptyStack(ns.display(name)))
    }

    /// Replace the top value. Never creates a variable.
    pub fn set_top(&mut self, ns: Namespace, name: &str, value: Value) -> ShellResult<()> {
        let replaced = self.tables[ns.index()]
            .get_mut(name)
            .is_some_and(|stack| stack.set_top(value));
        if replaced {
            Ok(())
        } else {
            Err(ShellError::EmptyStack(ns.display(name)))
        }
    }

    /// Drain a variable and, outside the predefined set, delete it.
    pub fn unset(&mut self, ns: Namespace, name: &str) -> ShellResult<()> {
        let table = &mut self.tables[ns.index()];
        match ns {
            Namespace::Predefined => match table.get_mut(name) {
                Some(stack) => stack.clear(),
                None => return Err(ShellError::UnknownPredefined(name.to_string())),
            },
            _ => {
                if table.remove(name).is_none() {
                    return Err(ShellError::EmptyStack(ns.display(name)));
                }
            }
        }
        Ok(())
    }

    /// Duplicate the top of every variable in every namespace.
    ///
    /// Variables with an empty stack are skipped.
    pub fn push_all(&mut self) -> Sweep {
        let mut sweep = Sweep::default();
        for table in &mut self.tables {
            for (name, stack) in table.iter_mut() {
                match stack.top().cloned() {
                    Some(top) => {
                        stack.push(top);
                        sweep.applied += 1;
                    }
                    None => {
                        tracing::debug!(variable = %name, "push sweep: empty stack skipped");
                        sweep.skipped += 1;
                    }
                }
            }
        }
        sweep
    }

    /// Pop the top of every variable in every namespace.
    ///
    /// Stacks left empty stay defined; variables already empty are skipped.
    pub fn pop_all(&mut self) -> Sweep {
        let mut sweep = Sweep::default();
        for table in &mut self.tables {
            for (name, stack) in table.iter_mut() {
                if stack.pop().is_some() {
                    sweep.applied += 1;
                } else {
                    tracing::debug!(variable = %name, "pop sweep: empty stack skipped");
                    sweep.skipped += 1;
                }
            }
        }
        sweep
    }
}
