use crate::{
    component::{
        model::{Component, Content, Style, TextColor},
        native::{NativeComponent, NativeContents, NativeStyle},
    },
    foundation::error::{VeneerError, VeneerResult},
};

/// Read-only view of an abstract component that the render cache relies on.
pub trait AbstractText: Clone + PartialEq + Send + Sync + 'static {
    /// The text of an unstyled, childless literal leaf; `None` for anything else.
    ///
    /// Plain strings dominate real traffic, so conversion takes a shortcut for them.
    fn as_plain_literal(&self) -> Option<&str>;

    /// Flattened plain text.
    fn plain_text(&self) -> String;
}

/// Pure conversion between the abstract model and the host-native representation.
///
/// Implementations must be side-effect free: results are memoized.
pub trait NativeConverter: Send + Sync + 'static {
    /// Abstract component type.
    type Abstract: AbstractText;
    /// Host-native representation.
    type Native: Send + Sync + 'static;

    /// Full tree conversion.
    fn to_native(&self, component: &Self::Abstract) -> Self::Native;

    /// Trivial native text node for a plain literal.
    fn literal(&self, text: &str) -> Self::Native;

    /// Inverse conversion. Fails for native data the abstract model cannot express.
    fn to_abstract(&self, native: &Self::Native) -> VeneerResult<Self::Abstract>;
}

/// Lossless converter between [`Component`] and [`NativeComponent`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TreeConverter;

impl TreeConverter {
    fn style_to_native(style: &Style) -> NativeStyle {
        NativeStyle {
            color: style.color.map(TextColor::value),
            bold: style.bold,
            italic: style.italic,
            underlined: style.underlined,
            strikethrough: style.strikethrough,
            obfuscated: style.obfuscated,
            font: style.font.clone(),
            insertion: style.insertion.clone(),
        }
    }

    fn style_to_abstract(style: &NativeStyle) -> Style {
        Style {
            color: style.color.map(TextColor::rgb),
            bold: style.bold,
            italic: style.italic,
            underlined: style.underlined,
            strikethrough: style.strikethrough,
            obfuscated: style.obfuscated,
            font: style.font.clone(),
            insertion: style.insertion.clone(),
        }
    }
}

impl NativeConverter for TreeConverter {
    type Abstract = Component;
    type Native = NativeComponent;

    fn to_native(&self, component: &Component) -> NativeComponent {
        let contents = match component.content() {
            Content::Text { text } => NativeContents::Literal(text.clone()),
            Content::Translatable { key, args } => NativeContents::Translatable {
                key: key.clone(),
                args: args.iter().map(|a| self.to_native(a)).collect(),
            },
            Content::Keybind { keybind } => NativeContents::Keybind(keybind.clone()),
        };
        NativeComponent {
            contents,
            style: Self::style_to_native(component.style()),
            siblings: component
                .children()
                .iter()
                .map(|c| self.to_native(c))
                .collect(),
        }
    }

    fn literal(&self, text: &str) -> NativeComponent {
        NativeComponent::literal(text)
    }

    fn to_abstract(&self, native: &NativeComponent) -> VeneerResult<Component> {
        let content = match &native.contents {
            NativeContents::Literal(text) => Content::Text { text: text.clone() },
            NativeContents::Translatable { key, args } => Content::Translatable {
                key: key.clone(),
                args: args
                    .iter()
                    .map(|a| self.to_abstract(a))
                    .collect::<VeneerResult<_>>()?,
            },
            NativeContents::Keybind(keybind) => Content::Keybind {
                keybind: keybind.clone(),
            },
            NativeContents::Other { kind, .. } => {
                return Err(VeneerError::conversion(format!(
                    "native contents {kind:?} have no abstract counterpart"
                )));
            }
        };
        let children = native
            .siblings
            .iter()
            .map(|s| self.to_abstract(s))
            .collect::<VeneerResult<_>>()?;
        Ok(Component::from_parts(
            content,
            Self::style_to_abstract(&native.style),
            children,
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/component/convert.rs"]
mod tests;
