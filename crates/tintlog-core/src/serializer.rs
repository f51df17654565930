//! Cycle-safe serialization of argument graphs.
//!
//! The [`SerializerRegistry`] is an ordered list of `(matcher, serializer,
//! priority)` entries, evaluated top to bottom. The first entry whose matcher
//! accepts a value serializes it; values no entry claims fall back to a
//! structural walk.
//!
//! Recursion is guarded two ways:
//! - **Depth**: containers nested deeper than [`SerializerOptions::max_depth`]
//!   become `"[Max Depth]"`.
//! - **Cycles**: the context tracks the *ancestor path* of container nodes.
//!   A node is pushed on entry and popped on exit, so a child shared by two
//!   unrelated branches is serialized in full both times. Only a node that is
//!   its own ancestor is a cycle.
//!
//! # Example
//!
//! ```
//! use tintlog_core::{SerializerOptions, SerializerRegistry, Value};
//!
//! let registry = SerializerRegistry::new();
//! let node = Value::object([("name", Value::from("root"))]);
//! node.insert("self", node.clone());
//!
//! let json = registry.serialize(&node, &SerializerOptions::default()).unwrap();
//! assert_eq!(json["self"], "[Circular]");
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::SecondsFormat;
use serde_json::{Map, Value as Json, json};

use crate::error::SerializeError;
use crate::value::{ErrorValue, Value};

/// Placeholder emitted at the position of a cycle.
pub const CIRCULAR_PLACEHOLDER: &str = "[Circular]";
/// Placeholder emitted in place of containers beyond the depth limit.
pub const MAX_DEPTH_PLACEHOLDER: &str = "[Max Depth]";
/// Marker emitted for undefined values.
pub const UNDEFINED_MARKER: &str = "[undefined]";

/// Bytes kept from a binary buffer before truncating.
const MAX_BYTES_SHOWN: usize = 256;

/// What to do when a cycle is found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CircularPolicy {
    /// Fail with [`SerializeError::Circular`] naming the path.
    Error,
    /// Omit the field or element that closes the cycle.
    Skip,
    /// Emit `"[Circular]"`.
    #[default]
    Placeholder,
}

impl std::str::FromStr for CircularPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" | "throw" => Ok(Self::Error),
            "skip" | "omit" => Ok(Self::Skip),
            "placeholder" => Ok(Self::Placeholder),
            other => Err(format!("unknown circular policy: {other}")),
        }
    }
}

/// Options for one serialization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializerOptions {
    /// Deepest container level that is still expanded. The root is depth 0.
    pub max_depth: usize,
    pub circular: CircularPolicy,
    /// Serialize undefined values as `null` instead of the marker string.
    pub preserve_undefined: bool,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self {
            max_depth: 5,
            circular: CircularPolicy::Placeholder,
            preserve_undefined: false,
        }
    }
}

impl SerializerOptions {
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_circular(mut self, policy: CircularPolicy) -> Self {
        self.circular = policy;
        self
    }

    #[must_use]
    pub fn preserve_undefined(mut self, preserve: bool) -> Self {
        self.preserve_undefined = preserve;
        self
    }
}

/// Predicate deciding whether an entry handles a value.
pub type Matcher = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Serializer body. Recurse into children through the context.
pub type SerializeFn =
    Arc<dyn Fn(&Value, &mut SerializeContext<'_>) -> Result<Json, SerializeError> + Send + Sync>;

/// One registered serializer.
#[derive(Clone)]
pub struct SerializerEntry {
    name: String,
    priority: i32,
    matcher: Matcher,
    serialize: SerializeFn,
}

impl SerializerEntry {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        (self.matcher)(value)
    }
}

impl fmt::Debug for SerializerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerEntry")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Built-in priorities. User entries may register above any of them.
pub mod priority {
    pub const ERROR: i32 = 100;
    pub const DATE: i32 = 80;
    pub const REGEX: i32 = 70;
    pub const MAP: i32 = 60;
    pub const SET: i32 = 50;
    pub const BYTES: i32 = 40;
}

/// Ordered serializer list, highest priority first.
#[derive(Clone, Debug)]
pub struct SerializerRegistry {
    entries: Vec<SerializerEntry>,
}

impl Default for SerializerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SerializerRegistry {
    /// Registry with the built-in serializers installed.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_builtins();
        registry
    }

    /// Registry with no entries; everything takes the structural path.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a serializer.
    ///
    /// Entries stay sorted by descending priority; equal priorities keep
    /// registration order. Registering an existing name replaces it.
    pub fn register<M, F>(&mut self, name: impl Into<String>, priority: i32, matcher: M, serialize: F)
    where
        M: Fn(&Value) -> bool + Send + Sync + 'static,
        F: Fn(&Value, &mut SerializeContext<'_>) -> Result<Json, SerializeError>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        self.unregister(&name);
        let entry = SerializerEntry {
            name,
            priority,
            matcher: Arc::new(matcher),
            serialize: Arc::new(serialize),
        };
        let pos = self
            .entries
            .iter()
            .position(|e| e.priority < priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
    }

    /// Remove a serializer by name. Returns whether one was removed.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        self.entries.len() != before
    }

    /// Entry names in evaluation order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[must_use]
    pub fn entries(&self) -> &[SerializerEntry] {
        &self.entries
    }

    /// First entry accepting the value.
    #[must_use]
    pub fn find(&self, value: &Value) -> Option<&SerializerEntry> {
        self.entries.iter().find(|e| e.matches(value))
    }

    /// Serialize a single value rooted at `root`.
    pub fn serialize(&self, value: &Value, options: &SerializerOptions) -> Result<Json, SerializeError> {
        let mut ctx = SerializeContext::new(self, options, "root");
        Ok(ctx.visit(value)?.unwrap_or(Json::Null))
    }

    /// Serialize a record's argument list; paths are rooted at `args`.
    pub fn serialize_args(
        &self,
        args: &[Value],
        options: &SerializerOptions,
    ) -> Result<Vec<Json>, SerializeError> {
        let mut ctx = SerializeContext::new(self, options, "args");
        let mut out = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            if let Some(json) = ctx.child(PathSegment::Index(i), arg)? {
                out.push(json);
            }
        }
        Ok(out)
    }

    fn register_builtins(&mut self) {
        self.register(
            "error",
            priority::ERROR,
            |v| matches!(v, Value::Error(_)),
            |v, ctx| match v {
                Value::Error(e) => serialize_error(e, ctx),
                _ => Ok(Json::Null),
            },
        );
        self.register(
            "date",
            priority::DATE,
            |v| matches!(v, Value::Date(_)),
            |v, _| match v {
                Value::Date(d) => Ok(json!({
                    "__type": "Date",
                    "iso": d.to_rfc3339_opts(SecondsFormat::Millis, true),
                })),
                _ => Ok(Json::Null),
            },
        );
        self.register(
            "regex",
            priority::REGEX,
            |v| matches!(v, Value::Regex { .. }),
            |v, _| match v {
                Value::Regex { source, flags } => Ok(json!({
                    "__type": "RegExp",
                    "source": source,
                    "flags": flags,
                })),
                _ => Ok(Json::Null),
            },
        );
        self.register(
            "map",
            priority::MAP,
            |v| matches!(v, Value::Map(_)),
            |v, ctx| {
                let Value::Map(node) = v else {
                    return Ok(Json::Null);
                };
                let mut entries = Vec::new();
                for (i, (key, item)) in node.snapshot().iter().enumerate() {
                    ctx.enter(PathSegment::Index(i));
                    let key = ctx.child(PathSegment::Key("key".into()), key);
                    let item = ctx.child(PathSegment::Key("value".into()), item);
                    ctx.leave();
                    if let (Some(key), Some(item)) = (key?, item?) {
                        entries.push(Json::Array(vec![key, item]));
                    }
                }
                Ok(json!({ "__type": "Map", "entries": entries }))
            },
        );
        self.register(
            "set",
            priority::SET,
            |v| matches!(v, Value::Set(_)),
            |v, ctx| {
                let Value::Set(node) = v else {
                    return Ok(Json::Null);
                };
                let values = ctx.children(&node.snapshot())?;
                Ok(json!({ "__type": "Set", "values": values }))
            },
        );
        self.register(
            "bytes",
            priority::BYTES,
            |v| matches!(v, Value::Bytes(_)),
            |v, _| {
                let Value::Bytes(bytes) = v else {
                    return Ok(Json::Null);
                };
                let shown: Vec<Json> = bytes
                    .iter()
                    .take(MAX_BYTES_SHOWN)
                    .map(|b| Json::from(*b))
                    .collect();
                let mut out = json!({
                    "__type": "Bytes",
                    "length": bytes.len(),
                    "data": shown,
                });
                if bytes.len() > MAX_BYTES_SHOWN {
                    out["truncated"] = Json::Bool(true);
                }
                Ok(out)
            },
        );
    }
}

fn serialize_error(e: &ErrorValue, ctx: &mut SerializeContext<'_>) -> Result<Json, SerializeError> {
    let mut out = Map::new();
    out.insert("__type".into(), Json::from("Error"));
    out.insert("name".into(), Json::from(e.name.clone()));
    out.insert("message".into(), Json::from(e.message.clone()));
    out.insert(
        "stack".into(),
        e.stack.clone().map_or(Json::Null, Json::from),
    );
    if let Some(cause) = &e.cause {
        if let Some(cause) = ctx.child(PathSegment::Key("cause".into()), cause)? {
            out.insert("cause".into(), cause);
        }
    }
    Ok(Json::Object(out))
}

/// One step in the path to the value being serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// State of one serialization pass.
///
/// Serializers receive the context so their recursion shares the same depth
/// limit and ancestor path as the structural walk.
pub struct SerializeContext<'a> {
    registry: &'a SerializerRegistry,
    options: &'a SerializerOptions,
    root: &'static str,
    path: Vec<PathSegment>,
    ancestors: Vec<usize>,
    depth: usize,
}

impl<'a> SerializeContext<'a> {
    fn new(registry: &'a SerializerRegistry, options: &'a SerializerOptions, root: &'static str) -> Self {
        Self {
            registry,
            options,
            root,
            path: Vec::new(),
            ancestors: Vec::new(),
            depth: 0,
        }
    }

    /// Current nesting depth; the root value is depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub fn options(&self) -> &SerializerOptions {
        self.options
    }

    /// Dotted path to the current position (`root.items[2].name`).
    #[must_use]
    pub fn path(&self) -> String {
        let mut out = String::from(self.root);
        for segment in &self.path {
            match segment {
                PathSegment::Key(k) => {
                    out.push('.');
                    out.push_str(k);
                }
                PathSegment::Index(i) => out.push_str(&format!("[{i}]")),
            }
        }
        out
    }

    /// Serialize a child one level down. `None` means the child was skipped.
    pub fn child(&mut self, segment: PathSegment, value: &Value) -> Result<Option<Json>, SerializeError> {
        self.path.push(segment);
        self.depth += 1;
        let result = self.visit(value);
        self.depth -= 1;
        self.path.pop();
        result
    }

    /// Serialize a sequence of children, dropping skipped ones.
    pub fn children(&mut self, items: &[Value]) -> Result<Vec<Json>, SerializeError> {
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            if let Some(json) = self.child(PathSegment::Index(i), item)? {
                out.push(json);
            }
        }
        Ok(out)
    }

    // Path-only step used for grouping (map entries); depth is unchanged.
    fn enter(&mut self, segment: PathSegment) {
        self.path.push(segment);
    }

    fn leave(&mut self) {
        self.path.pop();
    }

    fn visit(&mut self, value: &Value) -> Result<Option<Json>, SerializeError> {
        let node_id = value.node_id();
        if let Some(id) = node_id {
            if self.ancestors.contains(&id) {
                return match self.options.circular {
                    CircularPolicy::Error => Err(SerializeError::Circular { path: self.path() }),
                    CircularPolicy::Skip => Ok(None),
                    CircularPolicy::Placeholder => Ok(Some(Json::from(CIRCULAR_PLACEHOLDER))),
                };
            }
        }

        if !value.is_primitive() && self.depth > self.options.max_depth {
            return Ok(Some(Json::from(MAX_DEPTH_PLACEHOLDER)));
        }

        if let Some(id) = node_id {
            self.ancestors.push(id);
        }

        let registry = self.registry;
        let result = match registry.find(value) {
            Some(entry) => (entry.serialize)(value, self).map(Some),
            None => self.structural(value),
        };

        if node_id.is_some() {
            self.ancestors.pop();
        }
        result
    }

    fn structural(&mut self, value: &Value) -> Result<Option<Json>, SerializeError> {
        let json = match value {
            Value::Undefined => {
                if self.options.preserve_undefined {
                    Json::Null
                } else {
                    Json::from(UNDEFINED_MARKER)
                }
            }
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Float(f) => float_to_json(*f),
            Value::String(s) => Json::from(s.clone()),
            Value::Function { name } => Json::from(format!(
                "[Function: {}]",
                name.as_deref().unwrap_or("anonymous")
            )),
            Value::Date(d) => Json::from(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Value::Regex { source, flags } => Json::from(format!("/{source}/{flags}")),
            Value::Error(e) => json!({ "name": e.name, "message": e.message }),
            Value::Bytes(b) => Json::Array(b.iter().map(|x| Json::from(*x)).collect()),
            Value::Array(node) | Value::Set(node) => Json::Array(self.children(&node.snapshot())?),
            Value::Object(node) => {
                let mut out = Map::new();
                for (key, item) in node.snapshot() {
                    if let Some(json) = self.child(PathSegment::Key(key.clone()), &item)? {
                        out.insert(key, json);
                    }
                }
                Json::Object(out)
            }
            Value::Map(node) => {
                let mut out = Vec::new();
                for (i, (key, item)) in node.snapshot().iter().enumerate() {
                    let pair = Value::array([key.clone(), item.clone()]);
                    if let Some(json) = self.child(PathSegment::Index(i), &pair)? {
                        out.push(json);
                    }
                }
                Json::Array(out)
            }
            Value::Custom(custom) => match custom.to_value() {
                // Unwrapping to the structural view counts as one level.
                Some(inner) => {
                    self.depth += 1;
                    let result = self.visit(&inner);
                    self.depth -= 1;
                    return result;
                }
                None => json!({
                    "__type": custom.type_name(),
                    "debug": format!("{custom:?}"),
                }),
            },
        };
        Ok(Some(json))
    }
}

fn float_to_json(f: f64) -> Json {
    if f.is_nan() {
        Json::from("NaN")
    } else if f.is_infinite() {
        Json::from(if f > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        serde_json::Number::from_f64(f).map_or(Json::Null, Json::Number)
    }
}
