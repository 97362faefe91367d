//! Built-in templates for buttons and string selects.
//!
//! Templates declare the internal fields that mirror the platform
//! component's own attributes. Each of these fields is read back from the
//! raw component when an interaction is decoded, so a component keeps its
//! label, style and so on without encoding them in the custom id.

use compass_core::{Button, ButtonStyle, Component, PartialEmoji, SelectOption, StringSelect};

use super::ComponentFields;
use super::field::FieldDecl;
use super::spec::ComponentSpec;
use crate::reflect::AnyValue;

fn boxed<T: Send + Sync + 'static>(value: T) -> AnyValue {
    Box::new(value)
}

/// The rich button template: `label`, `style`, `emoji` and `disabled`.
pub fn rich_button() -> ComponentSpec {
    ComponentSpec::new("RichButton", module_path!())
        .template()
        .field(
            FieldDecl::internal::<Option<String>>("label")
                .extract(|c| Some(boxed(c.as_button()?.label.clone()))),
        )
        .field(
            FieldDecl::internal::<ButtonStyle>("style")
                .extract(|c| Some(boxed(c.as_button()?.style))),
        )
        .field(
            FieldDecl::internal::<Option<PartialEmoji>>("emoji")
                .extract(|c| Some(boxed(c.as_button()?.emoji.clone()))),
        )
        .field(
            FieldDecl::internal::<bool>("disabled")
                .extract(|c| Some(boxed(c.as_button()?.disabled))),
        )
}

/// The rich string select template: `placeholder`, `min_values`,
/// `max_values`, `options` and `disabled`.
pub fn rich_string_select() -> ComponentSpec {
    ComponentSpec::new("RichStringSelect", module_path!())
        .template()
        .field(
            FieldDecl::internal::<Option<String>>("placeholder")
                .extract(|c| Some(boxed(c.as_string_select()?.placeholder.clone()))),
        )
        .field(
            FieldDecl::internal::<u8>("min_values")
                .extract(|c| Some(boxed(c.as_string_select()?.min_values))),
        )
        .field(
            FieldDecl::internal::<u8>("max_values")
                .extract(|c| Some(boxed(c.as_string_select()?.max_values))),
        )
        .field(
            FieldDecl::internal::<Vec<SelectOption>>("options")
                .extract(|c| Some(boxed(c.as_string_select()?.options.clone()))),
        )
        .field(
            FieldDecl::internal::<bool>("disabled")
                .extract(|c| Some(boxed(c.as_string_select()?.disabled))),
        )
}

fn field_or<T: Clone + 'static>(component: &dyn ComponentFields, name: &str, default: T) -> T {
    component
        .field(name)
        .and_then(|value| value.downcast_ref::<T>())
        .cloned()
        .unwrap_or(default)
}

/// Renders a component laid out like [`rich_button`].
pub fn render_button(component: &dyn ComponentFields, custom_id: String) -> Component {
    Component::Button(Button {
        style: field_or(component, "style", ButtonStyle::default()),
        label: field_or(component, "label", None),
        emoji: field_or(component, "emoji", None),
        custom_id: Some(custom_id),
        url: None,
        disabled: field_or(component, "disabled", false),
    })
}

/// Renders a component laid out like [`rich_string_select`].
pub fn render_string_select(component: &dyn ComponentFields, custom_id: String) -> Component {
    let defaults = StringSelect::new(custom_id);
    Component::StringSelect(StringSelect {
        placeholder: field_or(component, "placeholder", defaults.placeholder.clone()),
        min_values: field_or(component, "min_values", defaults.min_values),
        max_values: field_or(component, "max_values", defaults.max_values),
        options: field_or(component, "options", Vec::new()),
        disabled: field_or(component, "disabled", defaults.disabled),
        ..defaults
    })
}
