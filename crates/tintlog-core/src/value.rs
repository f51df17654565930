//! Dynamic argument values.
//!
//! Logging calls carry arbitrary arguments next to the message. [`Value`]
//! models them as a graph: containers live behind shared [`Node`]s, so the
//! same child may be reachable from several parents and a container may
//! (directly or indirectly) contain itself.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, SecondsFormat, Utc};

/// Maximum nesting shown by [`Value::inspect`].
const INSPECT_DEPTH: usize = 3;

/// A shared, interior-mutable container.
///
/// Identity is the allocation address; two clones of a node are the same node.
pub struct Node<T>(Arc<RwLock<T>>);

impl<T> Node<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    /// Acquire a read guard, recovering from poisoning.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        match self.0.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Acquire a write guard, recovering from poisoning.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        match self.0.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Stable identity of this node for cycle detection.
    #[must_use]
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Clone> Node<T> {
    /// Clone the contents out so no guard is held while recursing.
    #[must_use]
    pub fn snapshot(&self) -> T {
        self.read().clone()
    }
}

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

// Contents may be cyclic, so Debug shows identity only.
impl<T> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({:#x})", self.id())
    }
}

/// An application-defined argument type.
///
/// Custom values are matched by user serializers through [`CustomValue::as_any`].
pub trait CustomValue: fmt::Debug + Send + Sync + 'static {
    /// Type name used in placeholders and the structural fallback.
    fn type_name(&self) -> &str;

    /// Access for downcasting in serializer predicates.
    fn as_any(&self) -> &dyn Any;

    /// Optional structural view used when no serializer matches.
    fn to_value(&self) -> Option<Value> {
        None
    }
}

/// An exception-like argument.
#[derive(Clone, Debug)]
pub struct ErrorValue {
    pub name: String,
    pub message: String,
    pub stack: Option<String>,
    pub cause: Option<Box<Value>>,
}

impl ErrorValue {
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
            cause: None,
        }
    }

    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: Value) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

/// One argument value.
#[derive(Clone, Debug)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// A callable; only its name is kept.
    Function { name: Option<String> },
    Date(DateTime<Utc>),
    Regex { source: String, flags: String },
    Error(ErrorValue),
    Bytes(Arc<[u8]>),
    Array(Node<Vec<Value>>),
    Object(Node<Vec<(String, Value)>>),
    /// Associative collection with arbitrary keys.
    Map(Node<Vec<(Value, Value)>>),
    /// Distinct-element collection.
    Set(Node<Vec<Value>>),
    Custom(Arc<dyn CustomValue>),
}

impl Value {
    #[must_use]
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Self::Array(Node::new(items.into_iter().collect()))
    }

    #[must_use]
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Object(Node::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    #[must_use]
    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Self::Map(Node::new(entries.into_iter().collect()))
    }

    #[must_use]
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        Self::Set(Node::new(items.into_iter().collect()))
    }

    #[must_use]
    pub fn function(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::Function {
            name: (!name.is_empty()).then_some(name),
        }
    }

    #[must_use]
    pub fn regex(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Self::Regex {
            source: source.into(),
            flags: flags.into(),
        }
    }

    #[must_use]
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(Arc::from(data.into()))
    }

    #[must_use]
    pub fn custom(value: impl CustomValue) -> Self {
        Self::Custom(Arc::new(value))
    }

    /// Build an error value from a Rust error, following its `source()` chain.
    #[must_use]
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut value = ErrorValue::new("Error", err.to_string());
        if let Some(source) = err.source() {
            value = value.with_cause(Self::from_error(source));
        }
        Self::Error(value)
    }

    /// Insert or replace a key on an object value. Returns false for non-objects.
    pub fn insert(&self, key: impl Into<String>, value: Value) -> bool {
        let Self::Object(node) = self else {
            return false;
        };
        let key = key.into();
        let mut entries = node.write();
        if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            entries.push((key, value));
        }
        true
    }

    /// Append to an array or set value. Returns false for other kinds.
    pub fn push(&self, value: Value) -> bool {
        match self {
            Self::Array(node) | Self::Set(node) => {
                node.write().push(value);
                true
            }
            _ => false,
        }
    }

    /// Short name of the value's kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) | Self::Float(_) => "number",
            Self::String(_) => "string",
            Self::Function { .. } => "function",
            Self::Date(_) => "date",
            Self::Regex { .. } => "regexp",
            Self::Error(_) => "error",
            Self::Bytes(_) => "bytes",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Map(_) => "map",
            Self::Set(_) => "set",
            Self::Custom(c) => c.type_name(),
        }
    }

    /// Whether this value is a scalar that serializes without recursion.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::Undefined
                | Self::Null
                | Self::Bool(_)
                | Self::Int(_)
                | Self::Float(_)
                | Self::String(_)
        )
    }

    /// Identity of the underlying container node, if any.
    #[must_use]
    pub fn node_id(&self) -> Option<usize> {
        match self {
            Self::Array(n) | Self::Set(n) => Some(n.id()),
            Self::Object(n) => Some(n.id()),
            Self::Map(n) => Some(n.id()),
            _ => None,
        }
    }

    /// Compact human-readable rendering, cycle-safe and depth-bounded.
    #[must_use]
    pub fn inspect(&self) -> String {
        let mut out = String::new();
        let mut ancestors = Vec::new();
        inspect_into(self, &mut out, &mut ancestors, 0, true);
        out
    }
}

fn inspect_into(value: &Value, out: &mut String, ancestors: &mut Vec<usize>, depth: usize, top: bool) {
    if let Some(id) = value.node_id() {
        if ancestors.contains(&id) {
            out.push_str("[Circular]");
            return;
        }
        if depth >= INSPECT_DEPTH {
            out.push_str(match value {
                Value::Array(_) => "[Array]",
                Value::Map(_) => "[Map]",
                Value::Set(_) => "[Set]",
                _ => "[Object]",
            });
            return;
        }
        ancestors.push(id);
    }

    match value {
        Value::Undefined => out.push_str("undefined"),
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(i) => out.push_str(&i.to_string()),
        Value::Float(f) => out.push_str(&f.to_string()),
        Value::String(s) if top => out.push_str(s),
        Value::String(s) => {
            out.push('\'');
            out.push_str(s);
            out.push('\'');
        }
        Value::Function { name } => {
            out.push_str("[Function: ");
            out.push_str(name.as_deref().unwrap_or("anonymous"));
            out.push(']');
        }
        Value::Date(d) => out.push_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true)),
        Value::Regex { source, flags } => {
            out.push('/');
            out.push_str(source);
            out.push('/');
            out.push_str(flags);
        }
        Value::Error(e) => {
            out.push_str(&e.name);
            out.push_str(": ");
            out.push_str(&e.message);
        }
        Value::Bytes(b) => out.push_str(&format!("<Bytes {}>", b.len())),
        Value::Array(node) => {
            out.push('[');
            for (i, item) in node.snapshot().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                inspect_into(item, out, ancestors, depth + 1, false);
            }
            out.push(']');
        }
        Value::Set(node) => {
            out.push_str("Set {");
            for (i, item) in node.snapshot().iter().enumerate() {
                out.push_str(if i > 0 { ", " } else { " " });
                inspect_into(item, out, ancestors, depth + 1, false);
            }
            out.push_str(" }");
        }
        Value::Object(node) => {
            let entries = node.snapshot();
            if entries.is_empty() {
                out.push_str("{}");
            } else {
                out.push_str("{ ");
                for (i, (key, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(key);
                    out.push_str(": ");
                    inspect_into(item, out, ancestors, depth + 1, false);
                }
                out.push_str(" }");
            }
        }
        Value::Map(node) => {
            out.push_str("Map {");
            for (i, (key, item)) in node.snapshot().iter().enumerate() {
                out.push_str(if i > 0 { ", " } else { " " });
                inspect_into(key, out, ancestors, depth + 1, false);
                out.push_str(" => ");
                inspect_into(item, out, ancestors, depth + 1, false);
            }
            out.push_str(" }");
        }
        Value::Custom(c) => out.push_str(&format!("{c:?}")),
    }

    if value.node_id().is_some() {
        ancestors.pop();
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Self::Int(i64::from(n))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        i64::try_from(n).map_or(Self::Float(n as f64), Self::Int)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        i64::try_from(n).map_or(Self::Float(n as f64), Self::Int)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Self::Float(f64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

impl From<ErrorValue> for Value {
    fn from(e: ErrorValue) -> Self {
        Self::Error(e)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::array(items.into_iter().map(Into::into))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .unwrap_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN))),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => Self::array(items.into_iter().map(Self::from)),
            serde_json::Value::Object(map) => {
                Self::object(map.into_iter().map(|(k, v)| (k, Self::from(v))))
            }
        }
    }
}
