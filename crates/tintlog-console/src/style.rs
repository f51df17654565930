//! Per-part style configuration and the fluent style builder.

use crate::color::{self, ColorCapability};
use crate::error::RenderError;

/// SGR reset.
pub const RESET: &str = "\x1b[0m";

/// The parts of a rendered line, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    Timestamp,
    Level,
    Prefix,
    Message,
    Location,
}

impl Part {
    /// Fixed composition order.
    pub const ORDER: [Part; 5] = [
        Part::Timestamp,
        Part::Level,
        Part::Prefix,
        Part::Message,
        Part::Location,
    ];
}

/// Style for one part of the line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartStyle {
    pub show: bool,
    pub color: Option<String>,
    pub background: Option<String>,
    pub bold: bool,
    pub italic: bool,
    /// Extra CSS declarations for the browser path, `prop: value; ...`.
    pub css: Option<String>,
}

impl Default for PartStyle {
    fn default() -> Self {
        Self::shown()
    }
}

impl PartStyle {
    #[must_use]
    pub fn shown() -> Self {
        Self {
            show: true,
            color: None,
            background: None,
            bold: false,
            italic: false,
            css: None,
        }
    }

    #[must_use]
    pub fn hidden() -> Self {
        Self {
            show: false,
            ..Self::shown()
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = Some(background.into());
        self
    }

    #[must_use]
    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    #[must_use]
    pub fn italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    #[must_use]
    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = Some(css.into());
        self
    }
}

/// Style configuration for the generic composer.
///
/// Presets read the `show` flags and the extra CSS but bring their own colors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StyleConfig {
    pub timestamp: PartStyle,
    pub level: PartStyle,
    pub prefix: PartStyle,
    pub message: PartStyle,
    pub location: PartStyle,
    /// chrono format string for the timestamp part.
    pub timestamp_format: String,
    /// Use the bright half of the basic palette.
    pub bright: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            timestamp: PartStyle::shown(),
            level: PartStyle::shown().bold(true),
            prefix: PartStyle::shown(),
            message: PartStyle::shown(),
            location: PartStyle::shown().italic(true),
            timestamp_format: "%H:%M:%S%.3f".to_string(),
            bright: false,
        }
    }
}

impl StyleConfig {
    #[must_use]
    pub fn part(&self, part: Part) -> &PartStyle {
        match part {
            Part::Timestamp => &self.timestamp,
            Part::Level => &self.level,
            Part::Prefix => &self.prefix,
            Part::Message => &self.message,
            Part::Location => &self.location,
        }
    }

    pub fn part_mut(&mut self, part: Part) -> &mut PartStyle {
        match part {
            Part::Timestamp => &mut self.timestamp,
            Part::Level => &mut self.level,
            Part::Prefix => &mut self.prefix,
            Part::Message => &mut self.message,
            Part::Location => &mut self.location,
        }
    }

    /// Toggle a part on or off.
    #[must_use]
    pub fn show(mut self, part: Part, show: bool) -> Self {
        self.part_mut(part).show = show;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = format.into();
        self
    }

    #[must_use]
    pub fn bright(mut self, bright: bool) -> Self {
        self.bright = bright;
        self
    }
}

/// Parse and check a CSS declaration list.
///
/// Returns `(property, value)` pairs. Rejects declarations without `:`,
/// properties outside `[a-zA-Z0-9-]`, and values containing braces or newlines.
pub fn parse_css(css: &str) -> Result<Vec<(String, String)>, RenderError> {
    let mut out = Vec::new();
    if css.contains('\n') || css.contains('\r') {
        return Err(RenderError::invalid_style(css, "newline in style"));
    }
    for decl in css.split(';').map(str::trim).filter(|d| !d.is_empty()) {
        let Some((prop, value)) = decl.split_once(':') else {
            return Err(RenderError::invalid_style(decl, "missing ':'"));
        };
        let prop = prop.trim();
        let value = value.trim();
        if prop.is_empty() || !prop.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(RenderError::invalid_style(decl, "invalid property name"));
        }
        if value.is_empty() {
            return Err(RenderError::invalid_style(decl, "empty value"));
        }
        if value.contains(['{', '}']) {
            return Err(RenderError::invalid_style(decl, "braces in value"));
        }
        out.push((prop.to_string(), value.to_string()));
    }
    Ok(out)
}

/// SGR opening sequence for a color/background/weight combination.
///
/// Empty when nothing applies or the capability is `None`.
#[must_use]
pub fn sgr_open(
    color: Option<&str>,
    background: Option<&str>,
    bold: bool,
    italic: bool,
    capability: ColorCapability,
    bright: bool,
) -> String {
    if capability == ColorCapability::None {
        return String::new();
    }
    let mut out = String::new();
    if bold {
        out.push_str("\x1b[1m");
    }
    if italic {
        out.push_str("\x1b[3m");
    }
    if let Some(c) = color {
        out.push_str(&color::escape(c, capability, false, bright));
    }
    if let Some(b) = background {
        out.push_str(&color::escape(b, capability, true, bright));
    }
    out
}

/// Fluent builder for one style, usable for CSS and ANSI output.
///
/// ```
/// use tintlog_console::color::ColorCapability;
/// use tintlog_console::style::StyleBuilder;
///
/// let style = StyleBuilder::new().color("red").bold().padding("2px 4px");
/// assert_eq!(style.build(), "color: red; font-weight: bold; padding: 2px 4px");
/// assert_eq!(style.build_ansi(ColorCapability::Basic), "\x1b[1m\x1b[31m");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleBuilder {
    declarations: Vec<(String, String)>,
    color: Option<String>,
    background: Option<String>,
    bold: bool,
    italic: bool,
    underline: bool,
    bright: bool,
}

impl StyleBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn set(mut self, prop: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if let Some(slot) = self.declarations.iter_mut().find(|(p, _)| p == prop) {
            slot.1 = value;
        } else {
            self.declarations.push((prop.to_string(), value));
        }
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        let color = color.into();
        self.color = Some(color.clone());
        self.set("color", color)
    }

    pub fn background(mut self, background: impl Into<String>) -> Self {
        let background = background.into();
        self.background = Some(background.clone());
        self.set("background", background)
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self.set("font-weight", "bold")
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self.set("font-style", "italic")
    }

    pub fn underline(mut self) -> Self {
        self.underline = true;
        self.set("text-decoration", "underline")
    }

    /// Use bright basic ANSI colors. Has no CSS effect.
    pub fn bright(mut self) -> Self {
        self.bright = true;
        self
    }

    pub fn padding(self, padding: impl Into<String>) -> Self {
        self.set("padding", padding)
    }

    pub fn border_radius(self, radius: impl Into<String>) -> Self {
        self.set("border-radius", radius)
    }

    pub fn font_family(self, family: impl Into<String>) -> Self {
        self.set("font-family", family)
    }

    pub fn font_size(self, size: impl Into<String>) -> Self {
        self.set("font-size", size)
    }

    /// Any other declaration. A later call for the same property replaces it.
    pub fn css(self, prop: &str, value: impl Into<String>) -> Self {
        self.set(prop, value)
    }

    /// Append a raw declaration list, checking it first.
    pub fn extend_css(mut self, css: &str) -> Result<Self, RenderError> {
        for (prop, value) in parse_css(css)? {
            self = self.set(&prop, value);
        }
        Ok(self)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// CSS declaration list, `; ` separated.
    #[must_use]
    pub fn build(&self) -> String {
        self.declarations
            .iter()
            .map(|(p, v)| format!("{p}: {v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// ANSI opening sequence for the style.
    #[must_use]
    pub fn build_ansi(&self, capability: ColorCapability) -> String {
        let mut out = sgr_open(
            self.color.as_deref(),
            self.background.as_deref(),
            self.bold,
            self.italic,
            capability,
            self.bright,
        );
        if self.underline && capability != ColorCapability::None {
            out.push_str("\x1b[4m");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_css_accepts_declarations() {
        let decls = parse_css("color: red; padding: 2px 4px;").unwrap();
        assert_eq!(
            decls,
            vec![
                ("color".to_string(), "red".to_string()),
                ("padding".to_string(), "2px 4px".to_string())
            ]
        );
        assert!(parse_css("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_css_rejects_malformed() {
        assert!(parse_css("color red").is_err());
        assert!(parse_css("color: red }").is_err());
        assert!(parse_css("color: red\nbackground: blue").is_err());
        assert!(parse_css("co lor: red").is_err());
        assert!(parse_css("color:").is_err());
    }

    #[test]
    fn test_parse_css_error_names_declaration() {
        let err = parse_css("color: red; oops").unwrap_err();
        assert!(err.to_string().contains("oops"));
    }

    #[test]
    fn test_builder_css_output() {
        let css = StyleBuilder::new()
            .background("#111")
            .color("white")
            .border_radius("3px")
            .font_family("monospace")
            .font_size("11px")
            .italic()
            .underline()
            .build();
        assert_eq!(
            css,
            "background: #111; color: white; border-radius: 3px; font-family: monospace; \
             font-size: 11px; font-style: italic; text-decoration: underline"
        );
    }

    #[test]
    fn test_builder_replaces_repeated_property() {
        let css = StyleBuilder::new().color("red").color("blue").build();
        assert_eq!(css, "color: blue");
    }

    #[test]
    fn test_builder_extend_css() {
        let style = StyleBuilder::new()
            .extend_css("text-shadow: 0 0 4px red")
            .unwrap();
        assert_eq!(style.build(), "text-shadow: 0 0 4px red");
        assert!(StyleBuilder::new().extend_css("broken").is_err());
    }

    #[test]
    fn test_builder_ansi_respects_capability() {
        let style = StyleBuilder::new().color("#ff0000").background("black").underline();
        assert_eq!(
            style.build_ansi(ColorCapability::Full),
            "\x1b[38;2;255;0;0m\x1b[48;2;0;0;0m\x1b[4m"
        );
        assert_eq!(style.build_ansi(ColorCapability::None), "");
    }

    #[test]
    fn test_builder_bright_is_ansi_only() {
        let style = StyleBuilder::new().color("red").bright();
        assert_eq!(style.build(), "color: red");
        assert_eq!(style.build_ansi(ColorCapability::Basic), "\x1b[91m");
    }

    #[test]
    fn test_style_config_toggles() {
        let config = StyleConfig::default().show(Part::Location, false);
        assert!(!config.part(Part::Location).show);
        assert!(config.part(Part::Message).show);
        assert!(config.level.bold);
    }

    #[test]
    fn test_sgr_open_bright() {
        assert_eq!(
            sgr_open(Some("red"), None, false, false, ColorCapability::Basic, true),
            "\x1b[91m"
        );
    }
}
