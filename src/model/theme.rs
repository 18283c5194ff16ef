use ratatui::style::Color;

/// The user's two desktop colours, handed to every pane when it is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserTheme {
    pub stroke: Color,
    pub fill: Color,
}

impl Default for UserTheme {
    fn default() -> Self {
        Self {
            stroke: Color::Rgb(0xFF, 0x2B, 0x34),
            fill: Color::Rgb(0x00, 0x5F, 0xE4),
        }
    }
}

impl UserTheme {
    /// Parses `"#RRGGBB,#RRGGBB"` (stroke first, then fill).
    pub fn parse(xo_color: &str) -> Option<Self> {
        let (stroke, fill) = xo_color.split_once(',')?;
        Some(Self {
            stroke: parse_hex(stroke.trim())?,
            fill: parse_hex(fill.trim())?,
        })
    }

    pub fn from_config(xo_color: &str) -> Self {
        Self::parse(xo_color).unwrap_or_else(|| {
            tracing::warn!("invalid theme colour {xo_color:?}, using default");
            Self::default()
        })
    }
}

fn parse_hex(raw: &str) -> Option<Color> {
    let hex = raw.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
