use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    component::convert::AbstractText,
    foundation::error::{VeneerError, VeneerResult},
};

/// 24-bit RGB text color. The sixteen legacy palette entries keep their names on
/// the wire; every other value is written as `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextColor(u32);

const NAMED_COLORS: [(&str, u32); 16] = [
    ("black", 0x00_0000),
    ("dark_blue", 0x00_00aa),
    ("dark_green", 0x00_aa00),
    ("dark_aqua", 0x00_aaaa),
    ("dark_red", 0xaa_0000),
    ("dark_purple", 0xaa_00aa),
    ("gold", 0xff_aa00),
    ("gray", 0xaa_aaaa),
    ("dark_gray", 0x55_5555),
    ("blue", 0x55_55ff),
    ("green", 0x55_ff55),
    ("aqua", 0x55_ffff),
    ("red", 0xff_5555),
    ("light_purple", 0xff_55ff),
    ("yellow", 0xff_ff55),
    ("white", 0xff_ffff),
];

impl TextColor {
    /// Palette black.
    pub const BLACK: Self = Self(0x00_0000);
    /// Palette red.
    pub const RED: Self = Self(0xff_5555);
    /// Palette green.
    pub const GREEN: Self = Self(0x55_ff55);
    /// Palette gold.
    pub const GOLD: Self = Self(0xff_aa00);
    /// Palette white.
    pub const WHITE: Self = Self(0xff_ffff);

    /// Build from a packed `0xRRGGBB` value; higher bits are discarded.
    pub const fn rgb(value: u32) -> Self {
        Self(value & 0xff_ffff)
    }

    /// Packed `0xRRGGBB` value.
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Palette name, if this color is one of the named entries.
    pub fn name(self) -> Option<&'static str> {
        NAMED_COLORS
            .iter()
            .find(|(_, v)| *v == self.0)
            .map(|(n, _)| *n)
    }
}

impl fmt::Display for TextColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "#{:06x}", self.0),
        }
    }
}

impl FromStr for TextColor {
    type Err = VeneerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(VeneerError::serde(format!("invalid hex color {s:?}")));
            }
            return u32::from_str_radix(hex, 16)
                .map(Self::rgb)
                .map_err(|e| VeneerError::serde(format!("invalid hex color {s:?}: {e}")));
        }
        NAMED_COLORS
            .iter()
            .find(|(n, _)| *n == s)
            .map(|(_, v)| Self(*v))
            .ok_or_else(|| VeneerError::serde(format!("unknown color name {s:?}")))
    }
}

impl Serialize for TextColor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TextColor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Text decoration. Unset fields inherit from the parent node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Style {
    /// Text color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<TextColor>,
    /// Bold decoration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    /// Italic decoration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    /// Underline decoration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlined: Option<bool>,
    /// Strikethrough decoration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    /// Obfuscated decoration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obfuscated: Option<bool>,
    /// Font key, `namespace:path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    /// Text inserted into the host's input field on shift-click.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insertion: Option<String>,
}

impl Style {
    /// `true` when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Style with only a color set.
    pub fn colored(color: TextColor) -> Self {
        Self {
            color: Some(color),
            ..Self::default()
        }
    }
}

/// Leaf payload of a [`Component`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Translation key with positional arguments.
    Translatable {
        /// Translation key.
        #[serde(rename = "translate")]
        key: String,
        /// Positional arguments.
        #[serde(rename = "with", default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<Component>,
    },
    /// Client key binding, displayed as the bound key.
    Keybind {
        /// Binding identifier.
        keybind: String,
    },
    /// Literal text.
    Text {
        /// The text.
        text: String,
    },
}

/// Immutable styled text tree.
///
/// Structural equality is the only notion of identity; the JSON form follows the
/// host chat format (`text`/`translate`/`keybind`, style keys, `extra` children).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Component {
    #[serde(flatten)]
    content: Content,
    #[serde(flatten)]
    style: Style,
    #[serde(rename = "extra", default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Component>,
}

impl Component {
    /// Unstyled literal text.
    pub fn text(text: impl Into<String>) -> Self {
        Self::from_content(Content::Text { text: text.into() })
    }

    /// Translatable leaf.
    pub fn translatable(key: impl Into<String>, args: Vec<Component>) -> Self {
        Self::from_content(Content::Translatable {
            key: key.into(),
            args,
        })
    }

    /// Key binding leaf.
    pub fn keybind(keybind: impl Into<String>) -> Self {
        Self::from_content(Content::Keybind {
            keybind: keybind.into(),
        })
    }

    /// Assemble a node from its parts.
    pub fn from_parts(content: Content, style: Style, children: Vec<Component>) -> Self {
        Self {
            content,
            style,
            children,
        }
    }

    fn from_content(content: Content) -> Self {
        Self::from_parts(content, Style::default(), Vec::new())
    }

    /// Replace the style.
    pub fn styled(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Set the color, keeping the rest of the style.
    pub fn color(mut self, color: TextColor) -> Self {
        self.style.color = Some(color);
        self
    }

    /// Append a child.
    pub fn append(mut self, child: Component) -> Self {
        self.children.push(child);
        self
    }

    /// Leaf payload.
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Node style.
    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Child nodes.
    pub fn children(&self) -> &[Component] {
        &self.children
    }

    /// Chat JSON tree.
    pub fn to_json(&self) -> VeneerResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Parse the chat JSON form.
    pub fn from_json_str(s: &str) -> VeneerResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    fn write_plain(&self, out: &mut String) {
        match &self.content {
            Content::Text { text } => out.push_str(text),
            Content::Translatable { key, .. } => out.push_str(key),
            Content::Keybind { keybind } => out.push_str(keybind),
        }
        for child in &self.children {
            child.write_plain(out);
        }
    }
}

impl AbstractText for Component {
    fn as_plain_literal(&self) -> Option<&str> {
        match &self.content {
            Content::Text { text } if self.style.is_empty() && self.children.is_empty() => {
                Some(text)
            }
            _ => None,
        }
    }

    fn plain_text(&self) -> String {
        let mut out = String::new();
        self.write_plain(&mut out);
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/component/model.rs"]
mod tests;
