//! Named presets and the generic composer.
//!
//! Each composer turns a [`Compose`] request into a [`Template`]. Templates
//! hold everything that depends on the cache key; per-record text is filled
//! in when the template is applied.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tintlog_core::Level;

use crate::color;
use crate::detection::OutputTarget;
use crate::error::RenderError;
use crate::style::{Part, PartStyle, StyleBuilder, StyleConfig};
use crate::theme::Theme;

use super::{Content, Segment, Template};

/// A named composition style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// High-contrast glowing badges.
    Neon,
    /// Terse; never shows prefix or location.
    Production,
    /// Dense monospace with locations always on.
    Debug,
    /// Translucent badges.
    Glass,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Neon, Preset::Production, Preset::Debug, Preset::Glass];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Neon => "neon",
            Self::Production => "production",
            Self::Debug => "debug",
            Self::Glass => "glass",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "neon" => Ok(Self::Neon),
            "production" | "prod" => Ok(Self::Production),
            "debug" => Ok(Self::Debug),
            "glass" => Ok(Self::Glass),
            other => Err(format!("unknown preset: {other}")),
        }
    }
}

/// Inputs to one template compilation.
pub(crate) struct Compose<'a> {
    pub level: Level,
    pub theme: &'a Theme,
    pub style: &'a StyleConfig,
    pub has_prefix: bool,
    pub has_location: bool,
    pub target: OutputTarget,
}

impl Compose<'_> {
    fn wants(&self, part: Part) -> bool {
        let shown = self.style.part(part).show;
        match part {
            Part::Prefix => shown && self.has_prefix,
            Part::Location => shown && self.has_location,
            _ => shown,
        }
    }

    fn level_color(&self) -> &str {
        &self.theme.style(self.level).color
    }

    fn segment(
        &self,
        part: Part,
        content: Content,
        style: StyleBuilder,
    ) -> Result<Segment, RenderError> {
        let style = match &self.style.part(part).css {
            Some(css) => style.extend_css(css)?,
            None => style,
        };
        let ansi = if self.target.is_ansi() {
            style.build_ansi(self.target.capability())
        } else {
            String::new()
        };
        let css = if self.target == OutputTarget::BrowserCss {
            style.build()
        } else {
            String::new()
        };
        Ok(Segment {
            content,
            ansi,
            css,
        })
    }
}

/// Compile the template for a preset, or the generic composer for `None`.
pub(crate) fn compile(preset: Option<Preset>, input: &Compose<'_>) -> Result<Template, RenderError> {
    match preset {
        None => generic(input),
        Some(Preset::Neon) => neon(input),
        Some(Preset::Production) => production(input),
        Some(Preset::Debug) => debug(input),
        Some(Preset::Glass) => glass(input),
    }
}

fn from_part(part: &PartStyle, default_color: Option<&str>) -> StyleBuilder {
    let mut b = StyleBuilder::new();
    if let Some(c) = part.color.as_deref().or(default_color) {
        b = b.color(c);
    }
    if let Some(bg) = &part.background {
        b = b.background(bg.clone());
    }
    if part.bold {
        b = b.bold();
    }
    if part.italic {
        b = b.italic();
    }
    b
}

fn maybe_bright(b: StyleBuilder, bright: bool) -> StyleBuilder {
    if bright { b.bright() } else { b }
}

fn translucent(expr: &str, alpha: f64) -> String {
    let c = color::resolve(expr);
    format!("rgba({}, {}, {}, {alpha})", c.r, c.g, c.b)
}

fn generic(c: &Compose<'_>) -> Result<Template, RenderError> {
    let s = c.style;
    let mut segments = Vec::new();
    for part in Part::ORDER {
        if !c.wants(part) {
            continue;
        }
        let seg = match part {
            Part::Timestamp => c.segment(
                part,
                Content::Timestamp(s.timestamp_format.clone()),
                maybe_bright(from_part(&s.timestamp, Some(&c.theme.muted)), s.bright),
            )?,
            Part::Level => {
                let mut b = from_part(&s.level, Some(c.level_color()));
                if c.target == OutputTarget::BrowserCss {
                    b = b.padding("1px 4px").border_radius("3px");
                }
                c.segment(
                    part,
                    Content::Static(format!("{:<5}", c.level.label())),
                    maybe_bright(b, s.bright),
                )?
            }
            Part::Prefix => c.segment(
                part,
                Content::Prefix {
                    open: "[".into(),
                    close: "]".into(),
                },
                maybe_bright(from_part(&s.prefix, Some(&c.theme.accent)), s.bright),
            )?,
            Part::Message => {
                let default = c.level.is_error().then(|| c.level_color());
                c.segment(
                    part,
                    Content::Message,
                    maybe_bright(from_part(&s.message, default), s.bright),
                )?
            }
            Part::Location => c.segment(
                part,
                Content::Location {
                    open: "(".into(),
                    close: ")".into(),
                },
                maybe_bright(from_part(&s.location, Some(&c.theme.muted)), s.bright),
            )?,
        };
        segments.push(seg);
    }
    Ok(Template { segments })
}

fn neon(c: &Compose<'_>) -> Result<Template, RenderError> {
    let glow = c.level_color().to_string();
    let mut segments = Vec::new();
    if c.wants(Part::Timestamp) {
        segments.push(c.segment(
            Part::Timestamp,
            Content::Timestamp(c.style.timestamp_format.clone()),
            StyleBuilder::new().color("#00ffff").bright(),
        )?);
    }
    if c.wants(Part::Level) {
        let icon = &c.theme.style(c.level).icon;
        segments.push(c.segment(
            Part::Level,
            Content::Static(format!(" {icon} {} ", c.level.label())),
            StyleBuilder::new()
                .color("#000000")
                .background(glow.clone())
                .bold()
                .bright()
                .padding("2px 6px")
                .border_radius("3px")
                .css("text-shadow", format!("0 0 6px {glow}"))
                .css("box-shadow", format!("0 0 8px {glow}")),
        )?);
    }
    if c.wants(Part::Prefix) {
        segments.push(c.segment(
            Part::Prefix,
            Content::Prefix {
                open: "[".into(),
                close: "]".into(),
            },
            StyleBuilder::new().color("#ff00ff").bold().bright(),
        )?);
    }
    if c.wants(Part::Message) {
        segments.push(c.segment(
            Part::Message,
            Content::Message,
            StyleBuilder::new()
                .color(glow.clone())
                .bright()
                .css("text-shadow", format!("0 0 4px {glow}")),
        )?);
    }
    if c.wants(Part::Location) {
        segments.push(c.segment(
            Part::Location,
            Content::Location {
                open: "@ ".into(),
                close: String::new(),
            },
            StyleBuilder::new().color("#39ff14").italic().bright(),
        )?);
    }
    Ok(Template { segments })
}

fn production(c: &Compose<'_>) -> Result<Template, RenderError> {
    let mut segments = Vec::new();
    if c.wants(Part::Timestamp) {
        segments.push(c.segment(
            Part::Timestamp,
            Content::Timestamp("%Y-%m-%dT%H:%M:%S%.3f%:z".into()),
            StyleBuilder::new().color(c.theme.muted.clone()),
        )?);
    }
    if c.wants(Part::Level) {
        let mut b = StyleBuilder::new().color(c.level_color().to_string());
        if c.level.is_error() {
            b = b.bold();
        }
        segments.push(c.segment(
            Part::Level,
            Content::Static(format!("{:<8}", c.level.label())),
            b,
        )?);
    }
    if c.wants(Part::Message) {
        segments.push(c.segment(Part::Message, Content::Message, StyleBuilder::new())?);
    }
    Ok(Template { segments })
}

fn debug(c: &Compose<'_>) -> Result<Template, RenderError> {
    let mono = || {
        StyleBuilder::new()
            .font_family("ui-monospace, monospace")
            .font_size("11px")
    };
    let mut segments = Vec::new();
    if c.wants(Part::Timestamp) {
        segments.push(c.segment(
            Part::Timestamp,
            Content::Timestamp("%H:%M:%S%.6f".into()),
            mono().color(c.theme.muted.clone()),
        )?);
    }
    if c.wants(Part::Level) {
        segments.push(c.segment(
            Part::Level,
            Content::Static(format!("[{}]", c.level.label())),
            mono().color(c.level_color().to_string()).bold(),
        )?);
    }
    if c.wants(Part::Prefix) {
        segments.push(c.segment(
            Part::Prefix,
            Content::Prefix {
                open: "<".into(),
                close: ">".into(),
            },
            mono().color(c.theme.accent.clone()),
        )?);
    }
    if c.wants(Part::Message) {
        segments.push(c.segment(Part::Message, Content::Message, mono())?);
    }
    // Locations are always on in this preset, whatever the config says.
    if c.has_location {
        segments.push(c.segment(
            Part::Location,
            Content::Location {
                open: "at ".into(),
                close: String::new(),
            },
            mono().color(c.theme.muted.clone()).italic(),
        )?);
    }
    Ok(Template { segments })
}

fn glass(c: &Compose<'_>) -> Result<Template, RenderError> {
    let tint = c.level_color().to_string();
    let pane = || {
        StyleBuilder::new()
            .border_radius("8px")
            .css("backdrop-filter", "blur(4px)")
            .css("border", "1px solid rgba(255, 255, 255, 0.18)")
    };
    let mut segments = Vec::new();
    if c.wants(Part::Timestamp) {
        segments.push(c.segment(
            Part::Timestamp,
            Content::Timestamp(c.style.timestamp_format.clone()),
            StyleBuilder::new().color(c.theme.muted.clone()),
        )?);
    }
    if c.wants(Part::Level) {
        segments.push(c.segment(
            Part::Level,
            Content::Static(format!(" {} ", c.level.label())),
            pane()
                .color(tint.clone())
                .background(translucent(&tint, 0.25))
                .padding("2px 8px")
                .bold(),
        )?);
    }
    if c.wants(Part::Prefix) {
        segments.push(c.segment(
            Part::Prefix,
            Content::Prefix {
                open: " ".into(),
                close: " ".into(),
            },
            pane()
                .color(c.theme.accent.clone())
                .background("rgba(255, 255, 255, 0.12)")
                .padding("2px 6px"),
        )?);
    }
    if c.wants(Part::Message) {
        segments.push(c.segment(Part::Message, Content::Message, StyleBuilder::new())?);
    }
    if c.wants(Part::Location) {
        segments.push(c.segment(
            Part::Location,
            Content::Location {
                open: "(".into(),
                close: ")".into(),
            },
            StyleBuilder::new().color(c.theme.muted.clone()).italic(),
        )?);
    }
    Ok(Template { segments })
}
