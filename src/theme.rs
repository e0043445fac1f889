//! Theme custom properties and the column-break polyfill.

use crate::config::{Theme, ViewportConfig};
use crate::surface::{RenderSurface, StyleRule, StyleTarget};

/// Style block carrying theme custom properties inside each frame document.
pub const VARIABLE_STYLE_ID: &str = "injected-variable-style";
/// Style block carrying column / scroll-snap rules inside each frame document.
pub const PAGINATION_STYLE_ID: &str = "injected-pagination-style";
/// Style block carrying theme custom properties in the shell document.
pub const SHELL_VARIABLE_STYLE_ID: &str = "skeleton-variable-style";

pub const OVERRIDE_COLOR_CLASS: &str = "lumina-override-color";
pub const VERTICAL_CLASS: &str = "is-vertical";

/// A theme custom property.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CssVariable {
    pub name: &'static str,
    /// Shorter name some stylesheets read from the root inline style.
    pub alias: Option<&'static str>,
    pub value: String,
}

impl CssVariable {
    fn new(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            alias: None,
            value: value.into(),
        }
    }

    fn aliased(name: &'static str, alias: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            alias: Some(alias),
            value: value.into(),
        }
    }
}

/// Theme custom properties in declaration order.
pub fn css_variables(viewport: &ViewportConfig, theme: &Theme) -> Vec<CssVariable> {
    let vertical = viewport.is_vertical();
    let padding = viewport.padding;
    vec![
        CssVariable::new("--lumina-zoom", format_number(theme.zoom)),
        CssVariable::new("--lumina-safe-width", format!("{}px", viewport.safe_width)),
        CssVariable::new("--lumina-safe-height", format!("{}px", viewport.safe_height)),
        CssVariable::new("--lumina-padding-top", px(padding.top)),
        CssVariable::new("--lumina-padding-left", px(padding.left)),
        CssVariable::new("--lumina-padding-right", px(padding.right)),
        CssVariable::new("--lumina-padding-bottom", px(padding.bottom)),
        CssVariable::new(
            "--lumina-reader-overflow-x",
            if vertical { "hidden" } else { "auto" },
        ),
        CssVariable::new(
            "--lumina-reader-overflow-y",
            if vertical { "auto" } else { "hidden" },
        ),
        CssVariable::new("--lumina-surface-color", theme.surface_color.as_str()),
        CssVariable::new("--lumina-on-surface-color", theme.on_surface_color.as_str()),
        CssVariable::new("--lumina-primary-color", theme.primary_color.as_str()),
        CssVariable::aliased(
            "--lumina-primary-container-color",
            "--lumina-primary-container",
            theme.primary_container_color.as_str(),
        ),
        CssVariable::aliased(
            "--lumina-on-surface-variant-color",
            "--lumina-on-surface-variant",
            theme.on_surface_variant_color.as_str(),
        ),
        CssVariable::aliased(
            "--lumina-outline-variant-color",
            "--lumina-outline-variant",
            theme.outline_variant_color.as_str(),
        ),
        CssVariable::aliased(
            "--lumina-surface-container-color",
            "--lumina-surface-container",
            theme.surface_container_color.as_str(),
        ),
        CssVariable::aliased(
            "--lumina-surface-container-high-color",
            "--lumina-surface-container-high",
            theme.surface_container_high_color.as_str(),
        ),
    ]
}

/// `:root { ... }` block declaring every theme custom property.
pub fn generate_variable_css(viewport: &ViewportConfig, theme: &Theme) -> String {
    let mut css = String::from(":root {");
    for variable in css_variables(viewport, theme) {
        css.push_str(variable.name);
        css.push_str(": ");
        css.push_str(&variable.value);
        css.push(';');
    }
    css.push('}');
    css
}

/// Push theme custom properties onto `target`'s root style, toggle the text
/// colour override class, and refresh the `style_id` block when present.
pub fn apply_css_variables<T: StyleTarget + ?Sized>(
    target: &mut T,
    viewport: &ViewportConfig,
    theme: &Theme,
    style_id: &str,
) {
    for variable in css_variables(viewport, theme) {
        target.set_root_property(variable.name, &variable.value);
        if let Some(alias) = variable.alias {
            target.set_root_property(alias, &variable.value);
        }
    }
    target.set_body_class(OVERRIDE_COLOR_CLASS, theme.should_override_text_color);
    target.replace_style_block(style_id, &theme.variable_css);
}

/// Inject (or refresh) the variable and pagination style blocks of a freshly
/// loaded document. The break polyfill runs only on first injection.
pub fn inject_document_styles<S: RenderSurface + ?Sized>(
    surface: &mut S,
    viewport: &ViewportConfig,
    theme: &Theme,
) {
    if surface.has_style_block(VARIABLE_STYLE_ID) {
        apply_css_variables(surface, viewport, theme, VARIABLE_STYLE_ID);
    } else {
        surface.insert_style_block(VARIABLE_STYLE_ID, &theme.variable_css);
        surface.set_body_class(OVERRIDE_COLOR_CLASS, theme.should_override_text_color);
        surface.set_body_class(VERTICAL_CLASS, viewport.is_vertical());
    }

    if !surface.replace_style_block(PAGINATION_STYLE_ID, &theme.pagination_css) {
        surface.insert_style_block(PAGINATION_STYLE_ID, &theme.pagination_css);
        polyfill_stylesheets(surface);
    }
}

/// Map a `break-*` / `page-break-*` value onto `-webkit-column-break-*`.
pub fn column_break_value(value: &str) -> &'static str {
    match value.trim().to_ascii_lowercase().as_str() {
        "page" | "left" | "right" | "always" => "always",
        "avoid" => "avoid",
        _ => "auto",
    }
}

/// A declaration the polyfill wants written back to a rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyUpdate {
    pub name: &'static str,
    pub value: String,
    pub priority: String,
}

/// Declarations to add to `rule` so engines without native fragmentation
/// support honour break hints, and so absolute font sizes follow the zoom.
pub fn polyfill_rule(rule: &StyleRule) -> Vec<PropertyUpdate> {
    let mut updates = Vec::new();

    if let Some(font_size) = rule.get("font-size") {
        if let Some(scaled) = zoomed_font_size(&font_size.value) {
            updates.push(PropertyUpdate {
                name: "font-size",
                value: scaled,
                priority: font_size.priority.clone(),
            });
        }
    }

    let before = rule
        .value("page-break-before")
        .or_else(|| rule.value("break-before"));
    if let Some(value) = before {
        updates.push(column_break("-webkit-column-break-before", value));
    }

    let after = [rule.value("page-break-after"), rule.value("break-after")]
        .into_iter()
        .flatten()
        .find(|value| !value.eq_ignore_ascii_case("auto"));
    if let Some(value) = after {
        updates.push(column_break("-webkit-column-break-after", value));
    }

    updates
}

fn column_break(name: &'static str, value: &str) -> PropertyUpdate {
    PropertyUpdate {
        name,
        value: column_break_value(value).to_string(),
        priority: String::new(),
    }
}

/// `calc(<size> * var(--lumina-zoom))` for plain `px`/`pt` sizes.
pub fn zoomed_font_size(value: &str) -> Option<String> {
    let trimmed = value.trim().to_ascii_lowercase();
    if trimmed.contains("calc") {
        return None;
    }
    let number = trimmed
        .strip_suffix("px")
        .or_else(|| trimmed.strip_suffix("pt"))?;
    let mut seen_dot = false;
    let mut seen_digit_after_dot = true;
    for (idx, ch) in number.char_indices() {
        match ch {
            '0'..='9' => seen_digit_after_dot = true,
            '.' if !seen_dot && idx > 0 => {
                seen_dot = true;
                seen_digit_after_dot = false;
            }
            _ => return None,
        }
    }
    if number.is_empty() || !seen_digit_after_dot {
        return None;
    }
    Some(format!("calc({} * var(--lumina-zoom))", trimmed))
}

/// Apply [`polyfill_rule`] to every readable stylesheet of `surface`.
///
/// Blocked (cross-origin) sheets are logged and skipped.
pub fn polyfill_stylesheets<S: RenderSurface + ?Sized>(surface: &mut S) {
    for sheet in 0..surface.stylesheet_count() {
        let rules = match surface.stylesheet_rules(sheet) {
            Ok(rules) => rules,
            Err(err) => {
                log::warn!("{}", err);
                continue;
            }
        };
        for (rule_index, rule) in rules.iter().enumerate() {
            for update in polyfill_rule(rule) {
                surface.set_rule_property(
                    sheet,
                    rule_index,
                    update.name,
                    &update.value,
                    &update.priority,
                );
            }
        }
    }
}

fn px(value: f64) -> String {
    format!("{}px", format_number(value))
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Padding;
    use crate::pagination::ReadingDirection;
    use crate::surface::Declaration;

    fn viewport(direction: ReadingDirection) -> ViewportConfig {
        ViewportConfig {
            safe_width: 400,
            safe_height: 600,
            direction,
            padding: Padding {
                top: 12.0,
                left: 8.5,
                right: 8.0,
                bottom: 0.0,
            },
        }
    }

    fn rule(declarations: &[(&str, &str)]) -> StyleRule {
        StyleRule {
            declarations: declarations
                .iter()
                .map(|(name, value)| Declaration::new(*name, *value))
                .collect(),
        }
    }

    #[test]
    fn variable_css_lists_layout_and_colour_properties() {
        let theme = Theme {
            zoom: 1.25,
            ..Theme::default()
        };
        let css = generate_variable_css(&viewport(ReadingDirection::Horizontal), &theme);
        assert!(css.starts_with(":root {--lumina-zoom: 1.25;"));
        assert!(css.contains("--lumina-safe-width: 400px;"));
        assert!(css.contains("--lumina-padding-left: 8.5px;"));
        assert!(css.contains("--lumina-reader-overflow-x: auto;"));
        assert!(css.contains("--lumina-reader-overflow-y: hidden;"));
        assert!(css.contains("--lumina-surface-color: #FFFFFF;"));
        assert!(css.contains("--lumina-surface-container-high-color: #000000;"));
        assert!(css.ends_with('}'));
    }

    #[test]
    fn vertical_reading_swaps_overflow_axes() {
        let css = generate_variable_css(&viewport(ReadingDirection::Vertical), &Theme::default());
        assert!(css.contains("--lumina-reader-overflow-x: hidden;"));
        assert!(css.contains("--lumina-reader-overflow-y: auto;"));
    }

    #[test]
    fn break_values_map_onto_column_breaks() {
        assert_eq!(column_break_value("page"), "always");
        assert_eq!(column_break_value("left"), "always");
        assert_eq!(column_break_value("RIGHT"), "always");
        assert_eq!(column_break_value("avoid"), "avoid");
        assert_eq!(column_break_value("auto"), "auto");
        assert_eq!(column_break_value("avoid-page"), "auto");
    }

    #[test]
    fn polyfill_translates_breaks_and_skips_auto_after() {
        let updates = polyfill_rule(&rule(&[
            ("break-before", "page"),
            ("break-after", "auto"),
            ("page-break-after", "avoid"),
        ]));
        assert_eq!(
            updates,
            vec![
                PropertyUpdate {
                    name: "-webkit-column-break-before",
                    value: "always".into(),
                    priority: String::new(),
                },
                PropertyUpdate {
                    name: "-webkit-column-break-after",
                    value: "avoid".into(),
                    priority: String::new(),
                },
            ]
        );
    }

    #[test]
    fn legacy_page_break_before_overrides_modern_value() {
        let updates = polyfill_rule(&rule(&[
            ("break-before", "avoid"),
            ("page-break-before", "always"),
        ]));
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].value, "always");
    }

    #[test]
    fn font_sizes_follow_zoom_only_for_absolute_units() {
        assert_eq!(
            zoomed_font_size("16px").as_deref(),
            Some("calc(16px * var(--lumina-zoom))")
        );
        assert_eq!(
            zoomed_font_size(" 10.5PT ").as_deref(),
            Some("calc(10.5pt * var(--lumina-zoom))")
        );
        assert_eq!(zoomed_font_size("1.2em"), None);
        assert_eq!(zoomed_font_size("calc(12px * 2)"), None);
        assert_eq!(zoomed_font_size("px"), None);
        assert_eq!(zoomed_font_size("12.px"), None);
        assert_eq!(zoomed_font_size("-3px"), None);
    }

    #[test]
    fn font_size_priority_is_preserved() {
        let mut rule = rule(&[("font-size", "14px")]);
        rule.declarations[0].priority = "important".into();
        let updates = polyfill_rule(&rule);
        assert_eq!(updates[0].priority, "important");
    }
}
