//! UI component tree as sent to and received from the platform.
//!
//! Only buttons and selects are interactive and carry a custom id; the other
//! node types exist so whole message layouts can be walked and rewritten.

use serde::{Deserialize, Serialize};

use crate::model::PartialEmoji;

/// Interactive component kinds reported by an interaction payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Button,
    StringSelect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    #[default]
    Primary,
    Secondary,
    Success,
    Danger,
    Link,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Button {
    #[serde(default)]
    pub style: ButtonStyle,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub emoji: Option<PartialEmoji>,
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

impl Button {
    pub fn new(custom_id: impl Into<String>) -> Self {
        Self {
            custom_id: Some(custom_id.into()),
            ..Self::default()
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = style;
        self
    }

    pub fn emoji(mut self, emoji: PartialEmoji) -> Self {
        self.emoji = Some(emoji);
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub emoji: Option<PartialEmoji>,
    #[serde(default)]
    pub default: bool,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringSelect {
    pub custom_id: String,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default = "one")]
    pub min_values: u8,
    #[serde(default = "one")]
    pub max_values: u8,
    #[serde(default)]
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub disabled: bool,
}

fn one() -> u8 {
    1
}

impl StringSelect {
    pub fn new(custom_id: impl Into<String>) -> Self {
        Self {
            custom_id: custom_id.into(),
            placeholder: None,
            min_values: 1,
            max_values: 1,
            options: Vec::new(),
            disabled: false,
        }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionRow {
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextDisplay {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Separator {
    #[serde(default)]
    pub divider: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Container {
    pub components: Vec<Component>,
    #[serde(default)]
    pub accent_colour: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub components: Vec<Component>,
    pub accessory: Box<Component>,
}

/// A node in a message's component tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Component {
    ActionRow(ActionRow),
    Button(Button),
    StringSelect(StringSelect),
    TextDisplay(TextDisplay),
    Separator(Separator),
    Container(Container),
    Section(Section),
}

impl Component {
    /// Wraps interactive components into a single action row.
    pub fn row(components: impl IntoIterator<Item = Component>) -> Self {
        Self::ActionRow(ActionRow {
            components: components.into_iter().collect(),
        })
    }

    pub fn kind(&self) -> Option<ComponentKind> {
        match self {
            Self::Button(_) => Some(ComponentKind::Button),
            Self::StringSelect(_) => Some(ComponentKind::StringSelect),
            _ => None,
        }
    }

    /// Returns `true` for nodes a user can interact with.
    pub fn is_interactive(&self) -> bool {
        self.kind().is_some()
    }

    pub fn custom_id(&self) -> Option<&str> {
        match self {
            Self::Button(button) => button.custom_id.as_deref(),
            Self::StringSelect(select) => Some(&select.custom_id),
            _ => None,
        }
    }

    pub fn as_button(&self) -> Option<&Button> {
        match self {
            Self::Button(button) => Some(button),
            _ => None,
        }
    }

    pub fn as_string_select(&self) -> Option<&StringSelect> {
        match self {
            Self::StringSelect(select) => Some(select),
            _ => None,
        }
    }

    fn children(&self) -> &[Component] {
        match self {
            Self::ActionRow(row) => &row.components,
            Self::Container(container) => &container.components,
            Self::Section(section) => &section.components,
            _ => &[],
        }
    }
}

impl From<Button> for Component {
    fn from(button: Button) -> Self {
        Self::Button(button)
    }
}

impl From<StringSelect> for Component {
    fn from(select: StringSelect) -> Self {
        Self::StringSelect(select)
    }
}

// ─── Tree walking ───

/// Every node of the tree, depth-first, parents before children.
pub fn walk_components(components: &[Component]) -> Vec<&Component> {
    fn visit<'a>(node: &'a Component, out: &mut Vec<&'a Component>) {
        out.push(node);
        for child in node.children() {
            visit(child, out);
        }
        if let Component::Section(section) = node {
            visit(&section.accessory, out);
        }
    }

    let mut out = Vec::new();
    for component in components {
        visit(component, &mut out);
    }
    out
}

/// Interactive leaves of the tree in layout order.
pub fn interactive_components(components: &[Component]) -> Vec<&Component> {
    walk_components(components)
        .into_iter()
        .filter(|c| c.is_interactive())
        .collect()
}

/// Mutable interactive leaves of the tree in layout order.
pub fn interactive_components_mut(components: &mut [Component]) -> Vec<&mut Component> {
    fn visit<'a>(node: &'a mut Component, out: &mut Vec<&'a mut Component>) {
        if node.is_interactive() {
            out.push(node);
            return;
        }
        match node {
            Component::ActionRow(ActionRow { components })
            | Component::Container(Container { components, .. }) => {
                for child in components {
                    visit(child, out);
                }
            }
            Component::Section(section) => {
                for child in &mut section.components {
                    visit(child, out);
                }
                visit(&mut section.accessory, out);
            }
            _ => {}
        }
    }

    let mut out = Vec::new();
    for component in components {
        visit(component, &mut out);
    }
    out
}

/// Finds the interactive component with the given custom id.
pub fn find_by_custom_id<'a>(components: &'a [Component], custom_id: &str) -> Option<&'a Component> {
    walk_components(components)
        .into_iter()
        .find(|c| c.custom_id() == Some(custom_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Vec<Component> {
        vec![
            Component::TextDisplay(TextDisplay {
                content: "hello".into(),
            }),
            Component::row([
                Button::new("a|1").into(),
                Button::new("b|2").into(),
            ]),
            Component::Container(Container {
                components: vec![Component::Section(Section {
                    components: vec![Component::TextDisplay(TextDisplay::default())],
                    accessory: Box::new(Button::new("c").into()),
                })],
                accent_colour: None,
            }),
            Component::row([StringSelect::new("d").into()]),
        ]
    }

    #[test]
    fn test_interactive_components_in_layout_order() {
        let layout = layout();
        let ids: Vec<_> = interactive_components(&layout)
            .into_iter()
            .filter_map(Component::custom_id)
            .collect();
        assert_eq!(ids, ["a|1", "b|2", "c", "d"]);
    }

    #[test]
    fn test_interactive_components_mut_rewrites_nested_nodes() {
        let mut layout = layout();
        for node in interactive_components_mut(&mut layout) {
            if let Component::Button(button) = node {
                button.disabled = true;
            }
        }
        let disabled = walk_components(&layout)
            .into_iter()
            .filter_map(Component::as_button)
            .all(|b| b.disabled);
        assert!(disabled);
    }

    #[test]
    fn test_find_by_custom_id() {
        let layout = layout();
        let found = find_by_custom_id(&layout, "c").and_then(Component::as_button);
        assert!(found.is_some());
        assert!(find_by_custom_id(&layout, "missing").is_none());
    }

    #[test]
    fn test_deserialize_tagged_payload() {
        let json = r#"[{"type": "action_row", "components": [
            {"type": "button", "style": "danger", "label": "Delete", "custom_id": "Del|1"},
            {"type": "string_select", "custom_id": "Pick", "options": [{"label": "A", "value": "a"}]}
        ]}]"#;
        let layout: Vec<Component> = serde_json::from_str(json).unwrap();
        let leaves = interactive_components(&layout);
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].as_button().unwrap().style, ButtonStyle::Danger);
        assert_eq!(leaves[1].as_string_select().unwrap().max_values, 1);
    }
}
