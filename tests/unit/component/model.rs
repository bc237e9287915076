use serde_json::json;

use super::*;

#[test]
fn plain_literal_only_for_unstyled_leaf() {
    assert_eq!(Component::text("hi").as_plain_literal(), Some("hi"));
    assert_eq!(
        Component::text("hi").color(TextColor::RED).as_plain_literal(),
        None
    );
    assert_eq!(
        Component::text("hi")
            .append(Component::text("!"))
            .as_plain_literal(),
        None
    );
    assert_eq!(Component::keybind("key.jump").as_plain_literal(), None);
}

#[test]
fn plain_text_flattens_children_in_order() {
    let c = Component::text("Hello")
        .append(Component::text(" friends").color(TextColor::rgb(0xaabbcc)))
        .append(Component::keybind("key.jump"));
    assert_eq!(c.plain_text(), "Hello friendskey.jump");
}

#[test]
fn json_uses_chat_format_keys() {
    let c = Component::translatable("gameMode.creative", vec![Component::text("x")])
        .styled(Style {
            color: Some(TextColor::RED),
            font: Some("minecraft:uniform".to_string()),
            ..Style::default()
        })
        .append(Component::text("!"));

    assert_eq!(
        c.to_json().unwrap(),
        json!({
            "translate": "gameMode.creative",
            "with": [{"text": "x"}],
            "color": "red",
            "font": "minecraft:uniform",
            "extra": [{"text": "!"}],
        })
    );
}

#[test]
fn json_parse_restores_structure() {
    let parsed = Component::from_json_str(
        r##"{"text":"Hello","bold":true,"extra":[{"keybind":"key.jump","color":"#aabbcc"}]}"##,
    )
    .unwrap();

    let expected = Component::text("Hello")
        .styled(Style {
            bold: Some(true),
            ..Style::default()
        })
        .append(Component::keybind("key.jump").color(TextColor::rgb(0xaabbcc)));
    assert_eq!(parsed, expected);
}

#[test]
fn colors_prefer_palette_names() {
    assert_eq!(TextColor::rgb(0xff5555).to_string(), "red");
    assert_eq!(TextColor::rgb(0x123456).to_string(), "#123456");
    assert_eq!("gold".parse::<TextColor>().unwrap(), TextColor::GOLD);
    assert_eq!(
        "#00ff00".parse::<TextColor>().unwrap().value(),
        0x00ff00
    );
    assert!("#12".parse::<TextColor>().is_err());
    assert!("#+fffff".parse::<TextColor>().is_err());
    assert!("#-00001".parse::<TextColor>().is_err());
    assert!("mauve".parse::<TextColor>().is_err());
}

#[test]
fn rgb_discards_high_bits() {
    assert_eq!(TextColor::rgb(0xff12_3456).value(), 0x12_3456);
}
