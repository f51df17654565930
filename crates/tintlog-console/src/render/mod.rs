//! Adaptive renderer
//!
//! Turns a [`LogRecord`] into output for the active [`OutputTarget`]:
//! - **BrowserCss**: `format` carries one `%c` per styled part and
//!   `style_args` the matching CSS strings.
//! - **Ansi**: `format` carries escape codes at the target's color depth.
//! - **Plain**: no styling.
//!
//! Parts always appear in the order timestamp, level, prefix, message,
//! location. Compiled templates are cached per [`StyleKey`]; the record's own
//! text is filled in on every call.

mod cache;
mod presets;

use std::collections::hash_map::DefaultHasher;
use std::fmt::Write as _;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Local, SecondsFormat};
use tintlog_core::LogRecord;

use crate::detection::OutputTarget;
use crate::style::{RESET, StyleConfig};
use crate::theme::Theme;

pub use cache::{CacheStats, DEFAULT_CAPACITY, DEFAULT_TTL, StyleCache, StyleKey};
pub use presets::Preset;

use presets::Compose;

/// Indentation per open console group.
const GROUP_INDENT: &str = "  ";

/// Output primitives for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Composed line, or a `%c`-bearing format string on the browser path.
    pub format: String,
    /// One CSS string per `%c`; empty outside the browser path.
    pub style_args: Vec<String>,
    pub target: OutputTarget,
}

impl Rendered {
    /// The line with all styling removed.
    #[must_use]
    pub fn plain_text(&self) -> String {
        match self.target {
            OutputTarget::BrowserCss => unformat(&self.format),
            OutputTarget::Ansi(_) => {
                String::from_utf8_lossy(&strip_ansi_escapes::strip(self.format.as_bytes()))
                    .into_owned()
            }
            OutputTarget::Plain => self.format.clone(),
        }
    }
}

// Drop `%c` directives and collapse `%%`.
fn unformat(format: &str) -> String {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            match chars.peek() {
                Some('c') => {
                    chars.next();
                    continue;
                }
                Some('%') => {
                    chars.next();
                }
                _ => {}
            }
        }
        out.push(c);
    }
    out
}

/// Everything about appearance a logger carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RenderSettings {
    pub style: StyleConfig,
    pub theme: Theme,
    pub preset: Option<Preset>,
}

impl RenderSettings {
    /// Hash of the style config and theme contents.
    #[must_use]
    pub fn appearance(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.style.hash(&mut hasher);
        self.theme.hash(&mut hasher);
        hasher.finish()
    }
}

/// What a segment shows for a given record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Content {
    Static(String),
    Timestamp(String),
    Prefix { open: String, close: String },
    Message,
    Location { open: String, close: String },
}

impl Content {
    fn text(&self, record: &LogRecord) -> String {
        match self {
            Self::Static(s) => s.clone(),
            Self::Timestamp(format) => format_timestamp(record, format),
            Self::Prefix { open, close } => {
                format!("{open}{}{close}", record.prefix.as_deref().unwrap_or_default())
            }
            Self::Message => message_text(record),
            Self::Location { open, close } => match &record.location {
                Some(loc) => format!("{open}{loc}{close}"),
                None => String::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment {
    pub content: Content,
    pub ansi: String,
    pub css: String,
}

/// A compiled line layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Template {
    pub segments: Vec<Segment>,
}

impl Template {
    fn apply(&self, record: &LogRecord, target: OutputTarget) -> Rendered {
        let mut format = group_indent(record);
        let mut style_args = Vec::new();
        for (i, seg) in self.segments.iter().enumerate() {
            let text = seg.content.text(record);
            match target {
                OutputTarget::BrowserCss => {
                    if i > 0 {
                        // Unstyled separator so badge backgrounds stop at the badge.
                        format.push_str("%c ");
                        style_args.push(String::new());
                    }
                    format.push_str("%c");
                    format.push_str(&text.replace('%', "%%"));
                    style_args.push(seg.css.clone());
                }
                OutputTarget::Ansi(_) | OutputTarget::Plain => {
                    if i > 0 {
                        format.push(' ');
                    }
                    if seg.ansi.is_empty() {
                        format.push_str(&text);
                    } else {
                        format.push_str(&seg.ansi);
                        format.push_str(&text);
                        format.push_str(RESET);
                    }
                }
            }
        }
        Rendered {
            format,
            style_args,
            target,
        }
    }
}

fn group_indent(record: &LogRecord) -> String {
    record
        .group
        .as_ref()
        .map(|g| GROUP_INDENT.repeat(g.depth))
        .unwrap_or_default()
}

fn format_timestamp(record: &LogRecord, format: &str) -> String {
    let local = record.timestamp.with_timezone(&Local);
    let mut out = String::new();
    // Invalid user format strings fail here instead of panicking in Display.
    if write!(out, "{}", local.format(format)).is_err() {
        return record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
    }
    out
}

fn message_text(record: &LogRecord) -> String {
    let mut text = record.message.clone();
    for arg in &record.args {
        text.push(' ');
        text.push_str(&arg.inspect());
    }
    text
}

/// Compose a record with no styling, honoring only the `show` flags.
///
/// This is the fallback when a styled composition fails.
#[must_use]
pub fn compose_plain(record: &LogRecord, style: &StyleConfig) -> Rendered {
    let mut parts = Vec::new();
    if style.timestamp.show {
        parts.push(format_timestamp(record, &style.timestamp_format));
    }
    if style.level.show {
        parts.push(format!("{:<5}", record.level.label()));
    }
    if style.prefix.show {
        if let Some(prefix) = &record.prefix {
            parts.push(format!("[{prefix}]"));
        }
    }
    if style.message.show {
        parts.push(message_text(record));
    }
    if style.location.show {
        if let Some(loc) = &record.location {
            parts.push(format!("({loc})"));
        }
    }
    Rendered {
        format: group_indent(record) + &parts.join(" "),
        style_args: Vec::new(),
        target: OutputTarget::Plain,
    }
}

/// Renders records and caches compiled templates.
#[derive(Debug)]
pub struct Renderer {
    cache: Mutex<StyleCache<Template>>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    #[must_use]
    pub fn new() -> Self {
        Self::with_cache(DEFAULT_CAPACITY, DEFAULT_TTL)
    }

    #[must_use]
    pub fn with_cache(capacity: usize, ttl: std::time::Duration) -> Self {
        Self {
            cache: Mutex::new(StyleCache::new(capacity, ttl)),
        }
    }

    fn cache(&self) -> MutexGuard<'_, StyleCache<Template>> {
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Render one record. Never fails.
    #[must_use]
    pub fn render(&self, record: &LogRecord, settings: &RenderSettings, target: OutputTarget) -> Rendered {
        let key = StyleKey {
            level: record.level,
            theme: settings.theme.name.clone(),
            appearance: settings.appearance(),
            has_prefix: record.prefix.is_some(),
            has_location: record.location.is_some(),
            preset: settings.preset,
            target,
        };

        let cached = self.cache().get(&key);
        let template = match cached {
            Some(template) => template,
            None => {
                let input = Compose {
                    level: record.level,
                    theme: &settings.theme,
                    style: &settings.style,
                    has_prefix: key.has_prefix,
                    has_location: key.has_location,
                    target,
                };
                match presets::compile(settings.preset, &input) {
                    Ok(template) => {
                        let template = Arc::new(template);
                        self.cache().insert(key, Arc::clone(&template));
                        template
                    }
                    Err(err) => {
                        tintlog_core::log_render!("style compilation failed, rendering plain: {}", err);
                        return compose_plain(record, &settings.style);
                    }
                }
            }
        };
        template.apply(record, target)
    }

    /// Drop every compiled template. Call after any settings change.
    pub fn invalidate(&self) {
        self.cache().clear();
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache().stats()
    }
}
