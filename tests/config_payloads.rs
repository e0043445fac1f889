use epub_pager::{HostEvent, ReaderConfig, ReadingDirection, Rect, ThemeUpdate};

#[test]
fn init_payload_fills_missing_fields_with_defaults() {
    let config: ReaderConfig = serde_json::from_str(
        r##"{
            "safeWidth": 412.7,
            "safeHeight": 815,
            "direction": 1,
            "padding": { "top": 24 },
            "theme": { "zoom": 1.25, "primaryColor": "#6750A4" }
        }"##,
    )
    .expect("init payload parses");

    let (viewport, theme, geometry) = config.normalized();
    assert_eq!(viewport.safe_width, 412);
    assert_eq!(viewport.safe_height, 815);
    assert_eq!(viewport.direction, ReadingDirection::Vertical);
    assert_eq!(viewport.padding.top, 24.0);
    assert_eq!(viewport.padding.left, 0.0);
    assert_eq!(theme.zoom, 1.25);
    assert_eq!(theme.primary_color, "#6750A4");
    assert_eq!(theme.surface_color, "#FFFFFF");
    assert!(theme.should_override_text_color);
    assert_eq!(geometry.page_gap, 128.0);
}

#[test]
fn direction_accepts_names_and_rejects_unknown_values() {
    let by_name: ReaderConfig =
        serde_json::from_str(r#"{"direction": "vertical"}"#).expect("named direction");
    assert_eq!(by_name.direction, ReadingDirection::Vertical);

    assert!(serde_json::from_str::<ReaderConfig>(r#"{"direction": 2}"#).is_err());
    assert!(serde_json::from_str::<ReaderConfig>(r#"{"direction": "sideways"}"#).is_err());
}

#[test]
fn theme_update_payload_reads_override_colour() {
    let update: ThemeUpdate = serde_json::from_str(
        r##"{
            "zoom": 0.9,
            "padding": { "top": 10, "left": 16, "right": 16, "bottom": 10 },
            "shouldOverrideTextColor": false,
            "overridePrimaryColor": "#FF5722",
            "primaryColor": "#000000"
        }"##,
    )
    .expect("theme update parses");
    assert_eq!(update.override_primary_color.as_deref(), Some("#FF5722"));
    assert_eq!(update.padding.left, 16.0);
    assert!(!update.should_override_text_color);
    assert_eq!(update.surface_color, "#FFFFFF");
}

#[test]
fn events_serialize_with_camel_case_tag() {
    let event = HostEvent::LinkTap {
        href: "http://localhost/ch2.xhtml".to_string(),
        rect: Rect::new(1.0, 2.0, 3.0, 4.0),
    };
    let json = serde_json::to_value(&event).expect("event serializes");
    assert_eq!(json["event"], "linkTap");
    assert_eq!(json["rect"]["width"], 3.0);
    assert_eq!(event.handler_name(), "onLinkTap");
}
