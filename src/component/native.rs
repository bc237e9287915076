use serde_json::{Map, Value};

use crate::component::model::TextColor;

/// Host-side style record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NativeStyle {
    /// Packed `0xRRGGBB` color.
    pub color: Option<u32>,
    /// Bold flag.
    pub bold: Option<bool>,
    /// Italic flag.
    pub italic: Option<bool>,
    /// Underline flag.
    pub underlined: Option<bool>,
    /// Strikethrough flag.
    pub strikethrough: Option<bool>,
    /// Obfuscated flag.
    pub obfuscated: Option<bool>,
    /// Font key, `namespace:path`.
    pub font: Option<String>,
    /// Shift-click insertion.
    pub insertion: Option<String>,
}

/// Host-side leaf payload.
#[derive(Clone, Debug, PartialEq)]
pub enum NativeContents {
    /// Literal text.
    Literal(String),
    /// Translation key with arguments.
    Translatable {
        /// Translation key.
        key: String,
        /// Positional arguments.
        args: Vec<NativeComponent>,
    },
    /// Key binding.
    Keybind(String),
    /// Host contents the abstract model has no counterpart for (scores, selectors, ...).
    Other {
        /// JSON key naming the contents kind.
        kind: String,
        /// Raw payload.
        payload: Value,
    },
}

/// Host-native text node, the shape the rest of the host expects.
#[derive(Clone, Debug, PartialEq)]
pub struct NativeComponent {
    /// Leaf payload.
    pub contents: NativeContents,
    /// Node style.
    pub style: NativeStyle,
    /// Child nodes.
    pub siblings: Vec<NativeComponent>,
}

/// The host's text interface: anything that can be handed to host code in place
/// of a [`NativeComponent`].
pub trait HostText {
    /// Node style.
    fn style(&self) -> NativeStyle;
    /// Leaf payload.
    fn contents(&self) -> NativeContents;
    /// Child nodes.
    fn siblings(&self) -> Vec<NativeComponent>;
    /// Flattened display string.
    fn string(&self) -> String;
}

impl NativeComponent {
    /// Unstyled literal leaf.
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            contents: NativeContents::Literal(text.into()),
            style: NativeStyle::default(),
            siblings: Vec::new(),
        }
    }

    /// Host serializer output (chat JSON).
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        match &self.contents {
            NativeContents::Literal(text) => {
                obj.insert("text".into(), Value::String(text.clone()));
            }
            NativeContents::Translatable { key, args } => {
                obj.insert("translate".into(), Value::String(key.clone()));
                if !args.is_empty() {
                    obj.insert(
                        "with".into(),
                        Value::Array(args.iter().map(Self::to_json).collect()),
                    );
                }
            }
            NativeContents::Keybind(keybind) => {
                obj.insert("keybind".into(), Value::String(keybind.clone()));
            }
            NativeContents::Other { kind, payload } => {
                obj.insert(kind.clone(), payload.clone());
            }
        }

        let s = &self.style;
        if let Some(color) = s.color {
            obj.insert(
                "color".into(),
                Value::String(TextColor::rgb(color).to_string()),
            );
        }
        for (key, flag) in [
            ("bold", s.bold),
            ("italic", s.italic),
            ("underlined", s.underlined),
            ("strikethrough", s.strikethrough),
            ("obfuscated", s.obfuscated),
        ] {
            if let Some(v) = flag {
                obj.insert(key.into(), Value::Bool(v));
            }
        }
        if let Some(font) = &s.font {
            obj.insert("font".into(), Value::String(font.clone()));
        }
        if let Some(insertion) = &s.insertion {
            obj.insert("insertion".into(), Value::String(insertion.clone()));
        }

        if !self.siblings.is_empty() {
            obj.insert(
                "extra".into(),
                Value::Array(self.siblings.iter().map(Self::to_json).collect()),
            );
        }
        Value::Object(obj)
    }

    fn write_string(&self, out: &mut String) {
        match &self.contents {
            NativeContents::Literal(text) => out.push_str(text),
            NativeContents::Translatable { key, .. } => out.push_str(key),
            NativeContents::Keybind(keybind) => out.push_str(keybind),
            NativeContents::Other { .. } => {}
        }
        for sibling in &self.siblings {
            sibling.write_string(out);
        }
    }
}

impl HostText for NativeComponent {
    fn style(&self) -> NativeStyle {
        self.style.clone()
    }

    fn contents(&self) -> NativeContents {
        self.contents.clone()
    }

    fn siblings(&self) -> Vec<NativeComponent> {
        self.siblings.clone()
    }

    fn string(&self) -> String {
        let mut out = String::new();
        self.write_string(&mut out);
        out
    }
}
