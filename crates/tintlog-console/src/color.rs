//! CSS color expressions to ANSI escape codes.
//!
//! Accepts hex (`#rgb`, `#rrggbb`, `#rrggbbaa`), `rgb()`/`rgba()`, CSS named
//! colors and `linear-gradient(...)`. Conversion is total: anything that does
//! not parse resolves to white.
//!
//! Gradients have no terminal equivalent. Every color token inside the
//! expression is resolved and the channels are averaged into one color.
//!
//! Translucent colors are composited over black, so a faint `rgba` background
//! maps to a dark terminal color instead of its opaque tint.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// How many colors an output target can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorCapability {
    /// 24-bit truecolor.
    #[default]
    Full,
    /// The 16-color ANSI palette.
    Basic,
    /// No escape codes at all.
    None,
}

/// A resolved sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a single color token. Gradients are not tokens; see [`resolve`].
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("rgb") {
            return parse_rgb_fn(&lower);
        }
        named(&lower)
    }

    /// Lowercase `#rrggbb`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn distance_sq(self, other: Rgb) -> u32 {
        let dr = i32::from(self.r) - i32::from(other.r);
        let dg = i32::from(self.g) - i32::from(other.g);
        let db = i32::from(self.b) - i32::from(other.b);
        (dr * dr + dg * dg + db * db).unsigned_abs()
    }

    fn over_black(self, alpha: f64) -> Self {
        let a = alpha.clamp(0.0, 1.0);
        let scale = |c: u8| (f64::from(c) * a).round() as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// The eight standard ANSI colors, in SGR order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnsiColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl AnsiColor {
    pub const ALL: [AnsiColor; 8] = [
        AnsiColor::Black,
        AnsiColor::Red,
        AnsiColor::Green,
        AnsiColor::Yellow,
        AnsiColor::Blue,
        AnsiColor::Magenta,
        AnsiColor::Cyan,
        AnsiColor::White,
    ];

    /// Reference point used for nearest-color matching.
    #[must_use]
    pub const fn reference(self) -> Rgb {
        match self {
            Self::Black => Rgb::new(0, 0, 0),
            Self::Red => Rgb::new(255, 0, 0),
            Self::Green => Rgb::new(0, 255, 0),
            Self::Yellow => Rgb::new(255, 255, 0),
            Self::Blue => Rgb::new(0, 0, 255),
            Self::Magenta => Rgb::new(255, 0, 255),
            Self::Cyan => Rgb::new(0, 255, 255),
            Self::White => Rgb::new(255, 255, 255),
        }
    }

    /// Nearest palette entry by Euclidean distance. Ties go to the earlier entry.
    #[must_use]
    pub fn nearest(color: Rgb) -> Self {
        let mut best = Self::Black;
        let mut best_dist = u32::MAX;
        for candidate in Self::ALL {
            let dist = color.distance_sq(candidate.reference());
            if dist < best_dist {
                best = candidate;
                best_dist = dist;
            }
        }
        best
    }

    const fn offset(self) -> u8 {
        self as u8
    }

    /// SGR parameter: 30–37 (fg), 40–47 (bg), 90–97 / 100–107 when bright.
    #[must_use]
    pub const fn sgr(self, background: bool, bright: bool) -> u8 {
        let base = match (background, bright) {
            (false, false) => 30,
            (true, false) => 40,
            (false, true) => 90,
            (true, true) => 100,
        };
        base + self.offset()
    }
}

/// Resolve any supported expression to a single color, defaulting to white.
#[must_use]
pub fn resolve(expr: &str) -> Rgb {
    resolve_alpha(expr).map_or(Rgb::WHITE, |(rgb, alpha)| {
        if alpha < 1.0 { rgb.over_black(alpha) } else { rgb }
    })
}

/// Hex form of [`resolve`].
#[must_use]
pub fn to_hex(expr: &str) -> String {
    resolve(expr).to_hex()
}

/// Foreground escape sequence for an expression.
#[must_use]
pub fn fg(expr: &str, capability: ColorCapability) -> String {
    escape(expr, capability, false, false)
}

/// Background escape sequence for an expression.
#[must_use]
pub fn bg(expr: &str, capability: ColorCapability) -> String {
    escape(expr, capability, true, false)
}

/// Escape sequence with explicit control over bright basic colors.
///
/// `transparent` and `none` produce no sequence at any capability.
#[must_use]
pub fn escape(expr: &str, capability: ColorCapability, background: bool, bright: bool) -> String {
    let trimmed = expr.trim();
    if trimmed.eq_ignore_ascii_case("transparent") || trimmed.eq_ignore_ascii_case("none") {
        return String::new();
    }
    match capability {
        ColorCapability::None => String::new(),
        ColorCapability::Full => {
            let c = resolve(trimmed);
            let mode = if background { 48 } else { 38 };
            format!("\x1b[{mode};2;{};{};{}m", c.r, c.g, c.b)
        }
        ColorCapability::Basic => {
            let code = AnsiColor::nearest(resolve(trimmed)).sgr(background, bright);
            format!("\x1b[{code}m")
        }
    }
}

fn resolve_alpha(expr: &str) -> Option<(Rgb, f64)> {
    let s = expr.trim();
    let lower = s.to_ascii_lowercase();
    if lower.contains("gradient(") {
        return average_gradient(&lower).map(|rgb| (rgb, 1.0));
    }
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex_alpha(hex);
    }
    if lower.starts_with("rgb") {
        return parse_rgb_alpha(&lower);
    }
    named(&lower).map(|rgb| (rgb, 1.0))
}

fn color_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"#[0-9a-f]{3,8}\b|rgba?\([^)]*\)|\b[a-z]+\b")
            .expect("color token regex is a valid static pattern")
    })
}

fn average_gradient(lower: &str) -> Option<Rgb> {
    let body = lower.split_once('(').map_or(lower, |(_, rest)| rest);
    let stops: Vec<Rgb> = color_token_regex()
        .find_iter(body)
        .filter_map(|m| resolve_alpha(m.as_str()))
        .map(|(rgb, alpha)| if alpha < 1.0 { rgb.over_black(alpha) } else { rgb })
        .collect();
    if stops.is_empty() {
        return None;
    }
    let n = stops.len() as u32;
    let sum = stops.iter().fold((0u32, 0u32, 0u32), |acc, c| {
        (
            acc.0 + u32::from(c.r),
            acc.1 + u32::from(c.g),
            acc.2 + u32::from(c.b),
        )
    });
    let avg = |total: u32| u8::try_from(total / n).unwrap_or(u8::MAX);
    Some(Rgb::new(avg(sum.0), avg(sum.1), avg(sum.2)))
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    parse_hex_alpha(hex).map(|(rgb, _)| rgb)
}

fn parse_hex_alpha(hex: &str) -> Option<(Rgb, f64)> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some((Rgb::new(nibble(0)?, nibble(1)?, nibble(2)?), 1.0)),
        6 => Some((Rgb::new(byte(0)?, byte(2)?, byte(4)?), 1.0)),
        8 => Some((
            Rgb::new(byte(0)?, byte(2)?, byte(4)?),
            f64::from(byte(6)?) / 255.0,
        )),
        _ => None,
    }
}

fn parse_rgb_fn(lower: &str) -> Option<Rgb> {
    parse_rgb_alpha(lower).map(|(rgb, _)| rgb)
}

fn parse_rgb_alpha(lower: &str) -> Option<(Rgb, f64)> {
    let open = lower.find('(')?;
    let close = lower.rfind(')')?;
    if close <= open {
        return None;
    }
    let parts: Vec<&str> = lower[open + 1..close]
        .split([',', ' ', '/'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() < 3 || parts.len() > 4 {
        return None;
    }
    let channel = |p: &str| -> Option<u8> {
        let v = if let Some(pct) = p.strip_suffix('%') {
            pct.parse::<f64>().ok()? * 2.55
        } else {
            p.parse::<f64>().ok()?
        };
        Some(v.round().clamp(0.0, 255.0) as u8)
    };
    let alpha = match parts.get(3) {
        Some(p) => {
            if let Some(pct) = p.strip_suffix('%') {
                pct.parse::<f64>().ok()? / 100.0
            } else {
                p.parse::<f64>().ok()?
            }
        }
        None => 1.0,
    };
    Some((
        Rgb::new(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?),
        alpha.clamp(0.0, 1.0),
    ))
}

fn named(name: &str) -> Option<Rgb> {
    let rgb = match name {
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "lime" => (0, 255, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "cyan" | "aqua" => (0, 255, 255),
        "magenta" | "fuchsia" => (255, 0, 255),
        "gray" | "grey" => (128, 128, 128),
        "silver" => (192, 192, 192),
        "lightgray" | "lightgrey" => (211, 211, 211),
        "darkgray" | "darkgrey" => (169, 169, 169),
        "dimgray" | "dimgrey" => (105, 105, 105),
        "slategray" | "slategrey" => (112, 128, 144),
        "maroon" => (128, 0, 0),
        "darkred" => (139, 0, 0),
        "crimson" => (220, 20, 60),
        "firebrick" => (178, 34, 34),
        "tomato" => (255, 99, 71),
        "coral" => (255, 127, 80),
        "salmon" => (250, 128, 114),
        "orangered" => (255, 69, 0),
        "orange" => (255, 165, 0),
        "darkorange" => (255, 140, 0),
        "gold" => (255, 215, 0),
        "khaki" => (240, 230, 140),
        "olive" => (128, 128, 0),
        "chartreuse" => (127, 255, 0),
        "limegreen" => (50, 205, 50),
        "springgreen" => (0, 255, 127),
        "seagreen" => (46, 139, 87),
        "darkgreen" => (0, 100, 0),
        "teal" => (0, 128, 128),
        "turquoise" => (64, 224, 208),
        "skyblue" => (135, 206, 235),
        "deepskyblue" => (0, 191, 255),
        "dodgerblue" => (30, 144, 255),
        "steelblue" => (70, 130, 180),
        "royalblue" => (65, 105, 225),
        "navy" => (0, 0, 128),
        "darkblue" => (0, 0, 139),
        "indigo" => (75, 0, 130),
        "purple" => (128, 0, 128),
        "violet" => (238, 130, 238),
        "orchid" => (218, 112, 214),
        "plum" => (221, 160, 221),
        "lavender" => (230, 230, 250),
        "pink" => (255, 192, 203),
        "hotpink" => (255, 105, 180),
        "deeppink" => (255, 20, 147),
        "brown" => (165, 42, 42),
        "chocolate" => (210, 105, 30),
        "tan" => (210, 180, 140),
        "beige" => (245, 245, 220),
        "ivory" => (255, 255, 240),
        "whitesmoke" => (245, 245, 245),
        _ => return None,
    };
    Some(Rgb::new(rgb.0, rgb.1, rgb.2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_red_to_hex_and_basic() {
        let hex = to_hex("rgb(255,0,0)");
        assert_eq!(hex, "#ff0000");
        assert_eq!(fg(&hex, ColorCapability::Basic), "\x1b[31m");
    }

    #[test]
    fn full_capability_emits_truecolor() {
        assert_eq!(fg("#0a141e", ColorCapability::Full), "\x1b[38;2;10;20;30m");
        assert_eq!(bg("#0a141e", ColorCapability::Full), "\x1b[48;2;10;20;30m");
    }

    #[test]
    fn none_capability_is_empty() {
        assert_eq!(fg("red", ColorCapability::None), "");
        assert_eq!(bg("#123456", ColorCapability::None), "");
    }

    #[test]
    fn malformed_input_resolves_to_white() {
        assert_eq!(to_hex("not-a-color"), "#ffffff");
        assert_eq!(to_hex("#12345"), "#ffffff");
        assert_eq!(to_hex("rgb(1,2)"), "#ffffff");
        assert_eq!(to_hex(""), "#ffffff");
        assert_eq!(fg("garbage", ColorCapability::Basic), "\x1b[37m");
    }

    #[test]
    fn short_hex_expands() {
        assert_eq!(to_hex("#f80"), "#ff8800");
        assert_eq!(Rgb::parse("#ABC"), Some(Rgb::new(0xaa, 0xbb, 0xcc)));
    }

    #[test]
    fn named_colors() {
        assert_eq!(to_hex("Orange"), "#ffa500");
        assert_eq!(to_hex("grey"), "#808080");
    }

    #[test]
    fn rgba_composites_over_black() {
        assert_eq!(to_hex("rgba(255, 255, 255, 0.5)"), "#808080");
        assert_eq!(to_hex("rgba(10, 20, 30, 1)"), "#0a141e");
        assert_eq!(to_hex("#ff000080"), "#800000");
    }

    #[test]
    fn rgb_percent_channels() {
        assert_eq!(to_hex("rgb(100%, 0%, 50%)"), "#ff0080");
    }

    #[test]
    fn gradient_averages_all_stops() {
        let hex = to_hex("linear-gradient(90deg, #ff0000 0%, #0000ff 100%)");
        assert_eq!(hex, "#7f007f");
        let named = to_hex("linear-gradient(to right, red, blue, lime)");
        assert_eq!(named, "#555555");
    }

    #[test]
    fn gradient_with_rgb_stops() {
        let hex = to_hex("linear-gradient(45deg, rgb(0,0,0), rgb(200,100,50))");
        assert_eq!(hex, "#643219");
    }

    #[test]
    fn gradient_without_colors_is_white() {
        assert_eq!(to_hex("linear-gradient(90deg)"), "#ffffff");
    }

    #[test]
    fn nearest_basic_palette() {
        assert_eq!(AnsiColor::nearest(Rgb::new(250, 10, 10)), AnsiColor::Red);
        assert_eq!(AnsiColor::nearest(Rgb::new(20, 20, 20)), AnsiColor::Black);
        assert_eq!(AnsiColor::nearest(Rgb::new(0, 200, 220)), AnsiColor::Cyan);
        assert_eq!(AnsiColor::nearest(resolve("orange")), AnsiColor::Yellow);
    }

    #[test]
    fn bright_and_background_codes() {
        assert_eq!(escape("red", ColorCapability::Basic, true, false), "\x1b[41m");
        assert_eq!(escape("red", ColorCapability::Basic, false, true), "\x1b[91m");
        assert_eq!(escape("red", ColorCapability::Basic, true, true), "\x1b[101m");
    }

    #[test]
    fn transparent_emits_nothing() {
        assert_eq!(bg("transparent", ColorCapability::Full), "");
        assert_eq!(bg("none", ColorCapability::Basic), "");
    }

    #[test]
    fn conversion_is_deterministic() {
        for expr in ["#abcdef", "rgb(1, 2, 3)", "teal", "linear-gradient(red, cyan)"] {
            let hex = to_hex(expr);
            assert_eq!(hex.len(), 7);
            assert!(hex.starts_with('#'));
            assert_eq!(fg(expr, ColorCapability::Basic), fg(expr, ColorCapability::Basic));
            assert_eq!(fg(expr, ColorCapability::Full), fg(expr, ColorCapability::Full));
        }
    }
}
