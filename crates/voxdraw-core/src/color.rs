//! Cell colors and color token parsing
//!
//! Grid cells store a [`Color`], which is either the raw token returned by a
//! script (`"red"`, `"#ff8800"`, `"hsl(120, 50%, 50%)"`) or the default color
//! used when a script returns `true`. Tokens are resolved to [`Rgb`] only when
//! the mesh is built, through a [`ColorParser`].

use thiserror::Error;

/// Color stored in an occupied grid cell
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Color {
    /// A symbolic color token, stored verbatim
    Token(String),
    /// The fixed default color (script returned a bare `true`)
    Default,
}

impl Color {
    /// Create a token color
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(token.into())
    }

    /// The token text, if this is not the default color
    pub fn as_token(&self) -> Option<&str> {
        match self {
            Self::Token(token) => Some(token),
            Self::Default => None,
        }
    }
}

impl From<&str> for Color {
    fn from(token: &str) -> Self {
        Self::token(token)
    }
}

impl From<String> for Color {
    fn from(token: String) -> Self {
        Self::Token(token)
    }
}

/// Linear RGB triple, each channel in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    /// Pure green, used for [`Color::Default`] and for unparseable tokens
    pub const DEFAULT: Rgb = Rgb::new(0.0, 1.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from 8-bit channels
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(f32::from(r) / 255.0, f32::from(g) / 255.0, f32::from(b) / 255.0)
    }

    /// Build from a packed `0xRRGGBB` value
    pub fn from_hex(hex: u32) -> Self {
        Self::from_u8((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// Errors produced when a color token cannot be resolved
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    /// The token is not a known name or notation
    #[error("Unrecognized color: {0:?}")]
    Unrecognized(String),

    /// The token uses a known notation but a component is invalid
    #[error("Invalid color component in {token:?}: {reason}")]
    InvalidComponent { token: String, reason: String },
}

/// Resolves color tokens to RGB
///
/// The mesher only ever talks to this trait, so a renderer with its own color
/// rules can supply a different implementation.
pub trait ColorParser: Send + Sync {
    /// Parse a token into an RGB triple
    fn parse(&self, token: &str) -> Result<Rgb, ColorError>;

    /// Resolve a cell color, falling back to [`Rgb::DEFAULT`] for the default color
    fn resolve(&self, color: &Color) -> Result<Rgb, ColorError> {
        match color {
            Color::Token(token) => self.parse(token),
            Color::Default => Ok(Rgb::DEFAULT),
        }
    }
}

/// CSS-style color parser
///
/// Accepts named colors, `#rgb`, `#rrggbb`, `rgb(r, g, b)` and
/// `hsl(h, s%, l%)`. Matching is case-insensitive and ignores surrounding
/// whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssColorParser;

impl ColorParser for CssColorParser {
    fn parse(&self, token: &str) -> Result<Rgb, ColorError> {
        let normalized = token.trim().to_ascii_lowercase();

        if let Some(hex) = normalized.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| ColorError::Unrecognized(token.to_string()));
        }

        if let Some(args) = function_args(&normalized, "rgb") {
            return parse_rgb_args(token, &args);
        }

        if let Some(args) = function_args(&normalized, "hsl") {
            return parse_hsl_args(token, &args);
        }

        NAMED_COLORS
            .get(normalized.as_str())
            .map(|&hex| Rgb::from_hex(hex))
            .ok_or_else(|| ColorError::Unrecognized(token.to_string()))
    }
}

/// Parse `rrggbb` or `rgb` hex digits (without the leading `#`)
fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    match hex.len() {
        6 => u32::from_str_radix(hex, 16).ok().map(Rgb::from_hex),
        3 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|d| d * 17);
            Some(Rgb::from_u8(digit(0)?, digit(1)?, digit(2)?))
        }
        _ => None,
    }
}

/// Extract the comma-separated arguments of `name(...)`
fn function_args<'a>(token: &'a str, name: &str) -> Option<Vec<&'a str>> {
    let inner = token
        .strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')?;
    Some(inner.split(',').map(str::trim).collect())
}

fn invalid(token: &str, reason: impl Into<String>) -> ColorError {
    ColorError::InvalidComponent {
        token: token.to_string(),
        reason: reason.into(),
    }
}

fn parse_rgb_args(token: &str, args: &[&str]) -> Result<Rgb, ColorError> {
    if args.len() != 3 {
        return Err(invalid(token, "rgb() takes three components"));
    }

    let mut channels = [0.0_f32; 3];
    for (channel, arg) in channels.iter_mut().zip(args) {
        let value = if let Some(percent) = arg.strip_suffix('%') {
            parse_number(token, percent)? / 100.0
        } else {
            parse_number(token, arg)? / 255.0
        };
        if !(0.0..=1.0).contains(&value) {
            return Err(invalid(token, format!("component {arg} out of range")));
        }
        *channel = value;
    }

    Ok(Rgb::new(channels[0], channels[1], channels[2]))
}

fn parse_hsl_args(token: &str, args: &[&str]) -> Result<Rgb, ColorError> {
    if args.len() != 3 {
        return Err(invalid(token, "hsl() takes three components"));
    }

    let hue = parse_number(token, args[0].trim_end_matches("deg"))?.rem_euclid(360.0) / 360.0;
    let percent = |arg: &str| -> Result<f32, ColorError> {
        let value = arg
            .strip_suffix('%')
            .ok_or_else(|| invalid(token, format!("{arg} must be a percentage")))?;
        let value = parse_number(token, value)? / 100.0;
        if (0.0..=1.0).contains(&value) {
            Ok(value)
        } else {
            Err(invalid(token, format!("component {arg} out of range")))
        }
    };
    let saturation = percent(args[1])?;
    let lightness = percent(args[2])?;

    Ok(hsl_to_rgb(hue, saturation, lightness))
}

fn parse_number(token: &str, text: &str) -> Result<f32, ColorError> {
    text.trim()
        .parse::<f32>()
        .map_err(|_| invalid(token, format!("{text:?} is not a number")))
}

/// Standard HSL to RGB conversion, all inputs in `0.0..=1.0`
fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Rgb {
    if s == 0.0 {
        return Rgb::new(l, l, l);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let channel = |t: f32| {
        let t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };

    Rgb::new(channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
}

/// CSS named colors as packed `0xRRGGBB`
static NAMED_COLORS: phf::Map<&'static str, u32> = phf::phf_map! {
    "aliceblue" => 0xF0F8FF,
    "antiquewhite" => 0xFAEBD7,
    "aqua" => 0x00FFFF,
    "aquamarine" => 0x7FFFD4,
    "azure" => 0xF0FFFF,
    "beige" => 0xF5F5DC,
    "bisque" => 0xFFE4C4,
    "black" => 0x000000,
    "blanchedalmond" => 0xFFEBCD,
    "blue" => 0x0000FF,
    "blueviolet" => 0x8A2BE2,
    "brown" => 0xA52A2A,
    "burlywood" => 0xDEB887,
    "cadetblue" => 0x5F9EA0,
    "chartreuse" => 0x7FFF00,
    "chocolate" => 0xD2691E,
    "coral" => 0xFF7F50,
    "cornflowerblue" => 0x6495ED,
    "cornsilk" => 0xFFF8DC,
    "crimson" => 0xDC143C,
    "cyan" => 0x00FFFF,
    "darkblue" => 0x00008B,
    "darkcyan" => 0x008B8B,
    "darkgoldenrod" => 0xB8860B,
    "darkgray" => 0xA9A9A9,
    "darkgreen" => 0x006400,
    "darkgrey" => 0xA9A9A9,
    "darkkhaki" => 0xBDB76B,
    "darkmagenta" => 0x8B008B,
    "darkolivegreen" => 0x556B2F,
    "darkorange" => 0xFF8C00,
    "darkorchid" => 0x9932CC,
    "darkred" => 0x8B0000,
    "darksalmon" => 0xE9967A,
    "darkseagreen" => 0x8FBC8F,
    "darkslateblue" => 0x483D8B,
    "darkslategray" => 0x2F4F4F,
    "darkslategrey" => 0x2F4F4F,
    "darkturquoise" => 0x00CED1,
    "darkviolet" => 0x9400D3,
    "deeppink" => 0xFF1493,
    "deepskyblue" => 0x00BFFF,
    "dimgray" => 0x696969,
    "dimgrey" => 0x696969,
    "dodgerblue" => 0x1E90FF,
    "firebrick" => 0xB22222,
    "floralwhite" => 0xFFFAF0,
    "forestgreen" => 0x228B22,
    "fuchsia" => 0xFF00FF,
    "gainsboro" => 0xDCDCDC,
    "ghostwhite" => 0xF8F8FF,
    "gold" => 0xFFD700,
    "goldenrod" => 0xDAA520,
    "gray" => 0x808080,
    "green" => 0x008000,
    "greenyellow" => 0xADFF2F,
    "grey" => 0x808080,
    "honeydew" => 0xF0FFF0,
    "hotpink" => 0xFF69B4,
    "indianred" => 0xCD5C5C,
    "indigo" => 0x4B0082,
    "ivory" => 0xFFFFF0,
    "khaki" => 0xF0E68C,
    "lavender" => 0xE6E6FA,
    "lavenderblush" => 0xFFF0F5,
    "lawngreen" => 0x7CFC00,
    "lemonchiffon" => 0xFFFACD,
    "lightblue" => 0xADD8E6,
    "lightcoral" => 0xF08080,
    "lightcyan" => 0xE0FFFF,
    "lightgoldenrodyellow" => 0xFAFAD2,
    "lightgray" => 0xD3D3D3,
    "lightgreen" => 0x90EE90,
    "lightgrey" => 0xD3D3D3,
    "lightpink" => 0xFFB6C1,
    "lightsalmon" => 0xFFA07A,
    "lightseagreen" => 0x20B2AA,
    "lightskyblue" => 0x87CEFA,
    "lightslategray" => 0x778899,
    "lightslategrey" => 0x778899,
    "lightsteelblue" => 0xB0C4DE,
    "lightyellow" => 0xFFFFE0,
    "lime" => 0x00FF00,
    "limegreen" => 0x32CD32,
    "linen" => 0xFAF0E6,
    "magenta" => 0xFF00FF,
    "maroon" => 0x800000,
    "mediumaquamarine" => 0x66CDAA,
    "mediumblue" => 0x0000CD,
    "mediumorchid" => 0xBA55D3,
    "mediumpurple" => 0x9370DB,
    "mediumseagreen" => 0x3CB371,
    "mediumslateblue" => 0x7B68EE,
    "mediumspringgreen" => 0x00FA9A,
    "mediumturquoise" => 0x48D1CC,
    "mediumvioletred" => 0xC71585,
    "midnightblue" => 0x191970,
    "mintcream" => 0xF5FFFA,
    "mistyrose" => 0xFFE4E1,
    "moccasin" => 0xFFE4B5,
    "navajowhite" => 0xFFDEAD,
    "navy" => 0x000080,
    "oldlace" => 0xFDF5E6,
    "olive" => 0x808000,
    "olivedrab" => 0x6B8E23,
    "orange" => 0xFFA500,
    "orangered" => 0xFF4500,
    "orchid" => 0xDA70D6,
    "palegoldenrod" => 0xEEE8AA,
    "palegreen" => 0x98FB98,
    "paleturquoise" => 0xAFEEEE,
    "palevioletred" => 0xDB7093,
    "papayawhip" => 0xFFEFD5,
    "peachpuff" => 0xFFDAB9,
    "peru" => 0xCD853F,
    "pink" => 0xFFC0CB,
    "plum" => 0xDDA0DD,
    "powderblue" => 0xB0E0E6,
    "purple" => 0x800080,
    "rebeccapurple" => 0x663399,
    "red" => 0xFF0000,
    "rosybrown" => 0xBC8F8F,
    "royalblue" => 0x4169E1,
    "saddlebrown" => 0x8B4513,
    "salmon" => 0xFA8072,
    "sandybrown" => 0xF4A460,
    "seagreen" => 0x2E8B57,
    "seashell" => 0xFFF5EE,
    "sienna" => 0xA0522D,
    "silver" => 0xC0C0C0,
    "skyblue" => 0x87CEEB,
    "slateblue" => 0x6A5ACD,
    "slategray" => 0x708090,
    "slategrey" => 0x708090,
    "snow" => 0xFFFAFA,
    "springgreen" => 0x00FF7F,
    "steelblue" => 0x4682B4,
    "tan" => 0xD2B48C,
    "teal" => 0x008080,
    "thistle" => 0xD8BFD8,
    "tomato" => 0xFF6347,
    "turquoise" => 0x40E0D0,
    "violet" => 0xEE82EE,
    "wheat" => 0xF5DEB3,
    "white" => 0xFFFFFF,
    "whitesmoke" => 0xF5F5F5,
    "yellow" => 0xFFFF00,
    "yellowgreen" => 0x9ACD32,
};
