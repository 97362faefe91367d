//! Fixtures shared by the unit tests of this crate.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use compass_core::{
    BoxedClient, Channel, ChannelKind, Client, Component, Interaction, Listeners, Message,
    Snowflake, User,
};
use parking_lot::Mutex;

use crate::component::template::{render_button, rich_button};
use crate::component::{ComponentFields, ComponentSpec, FieldDecl, FieldValues, RichComponent};
use crate::error::ParseResult;
use crate::manager::resolve;
use crate::reflect::DynValue;

#[derive(Default)]
pub(crate) struct MockClient {
    listeners: Listeners,
}

impl MockClient {
    pub(crate) fn boxed() -> BoxedClient {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl Client for MockClient {
    fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Ordered record of hook and callback calls.
#[derive(Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub(crate) fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

pub(crate) fn author() -> User {
    User {
        id: Snowflake(1),
        name: "tester".into(),
        bot: false,
    }
}

pub(crate) fn channel() -> Channel {
    Channel {
        id: Snowflake(2),
        guild_id: None,
        name: "general".into(),
        kind: ChannelKind::Text,
    }
}

/// An interaction on a message holding `components`, triggered by the
/// first interactive one.
pub(crate) fn interaction(client: BoxedClient, components: Vec<Component>) -> Interaction {
    let message = Message {
        id: Snowflake(3),
        channel_id: Snowflake(2),
        author: author(),
        content: String::new(),
        components,
    };
    let trigger = compass_core::interactive_components(&message.components)
        .first()
        .map(|c| (*c).clone());

    let mut builder = Interaction::builder(author(), channel(), client).id(4u64);
    if let Some(trigger) = &trigger {
        builder = builder.component(trigger, Vec::new());
    }
    builder.message(message).build()
}

macro_rules! any_impls {
    () => {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    };
}

// ─── Counter: a button with two custom-id fields ───

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Counter {
    pub(crate) label: Option<String>,
    pub(crate) count: i64,
    pub(crate) step: i64,
}

impl Counter {
    pub(crate) const DEFAULT_STEP: i64 = 1;

    pub(crate) fn new(count: i64) -> Self {
        Self {
            label: None,
            count,
            step: Self::DEFAULT_STEP,
        }
    }

    pub(crate) fn with_step(mut self, step: i64) -> Self {
        self.step = step;
        self
    }

    pub(crate) fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }
}

impl ComponentFields for Counter {
    fn declare() -> ComponentSpec {
        ComponentSpec::new("Counter", module_path!())
            .extends(rich_button())
            .field(FieldDecl::internal::<Option<String>>("label"))
            .field(FieldDecl::custom_id::<i64>("count"))
            .field(FieldDecl::custom_id::<i64>("step").required(false))
    }

    fn from_fields(mut values: FieldValues) -> ParseResult<Self> {
        Ok(Self {
            label: values.take("label")?.unwrap_or_default(),
            count: values.require("count")?,
            step: values.take("step")?.unwrap_or(Self::DEFAULT_STEP),
        })
    }

    fn render(component: &dyn ComponentFields, custom_id: String) -> Component {
        render_button(component, custom_id)
    }

    fn field(&self, name: &str) -> Option<&DynValue> {
        match name {
            "label" => Some(&self.label),
            "count" => Some(&self.count),
            "step" => Some(&self.step),
            _ => None,
        }
    }

    fn as_ui_component(&self, custom_id: String) -> Component {
        Self::render(self, custom_id)
    }

    any_impls!();
}

#[async_trait]
impl RichComponent for Counter {
    async fn callback(&mut self, _interaction: &Interaction) -> anyhow::Result<()> {
        self.count += self.step;
        if let Some(log) = resolve::<CallLog>() {
            log.push(format!("callback {}", self.count));
        }
        Ok(())
    }
}

// ─── Labelled: a single string field ───

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Labelled {
    pub(crate) text: String,
}

impl Labelled {
    pub(crate) fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl ComponentFields for Labelled {
    fn declare() -> ComponentSpec {
        ComponentSpec::new("Labelled", module_path!()).field(FieldDecl::custom_id::<String>("text"))
    }

    fn from_fields(mut values: FieldValues) -> ParseResult<Self> {
        Ok(Self {
            text: values.require("text")?,
        })
    }

    fn render(component: &dyn ComponentFields, custom_id: String) -> Component {
        render_button(component, custom_id)
    }

    fn field(&self, name: &str) -> Option<&DynValue> {
        (name == "text").then_some(&self.text as &DynValue)
    }

    fn as_ui_component(&self, custom_id: String) -> Component {
        Self::render(self, custom_id)
    }

    any_impls!();
}

#[async_trait]
impl RichComponent for Labelled {
    async fn callback(&mut self, _interaction: &Interaction) -> anyhow::Result<()> {
        Ok(())
    }
}

// ─── Faulty: fails on demand ───

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Faulty {
    /// 0 succeeds, 1 returns an error, 2 panics, anything else never
    /// completes.
    pub(crate) mode: u8,
}

impl ComponentFields for Faulty {
    fn declare() -> ComponentSpec {
        ComponentSpec::new("Faulty", module_path!())
            .extends(rich_button())
            .field(FieldDecl::custom_id::<u8>("mode"))
    }

    fn from_fields(mut values: FieldValues) -> ParseResult<Self> {
        Ok(Self {
            mode: values.require("mode")?,
        })
    }

    fn render(component: &dyn ComponentFields, custom_id: String) -> Component {
        render_button(component, custom_id)
    }

    fn field(&self, name: &str) -> Option<&DynValue> {
        (name == "mode").then_some(&self.mode as &DynValue)
    }

    fn as_ui_component(&self, custom_id: String) -> Component {
        Self::render(self, custom_id)
    }

    any_impls!();
}

#[async_trait]
impl RichComponent for Faulty {
    async fn callback(&mut self, _interaction: &Interaction) -> anyhow::Result<()> {
        match self.mode {
            0 => Ok(()),
            1 => Err(anyhow::anyhow!("callback failed")),
            2 => panic!("callback panicked"),
            _ => std::future::pending().await,
        }
    }
}

// ─── Reloadable: lives in its own pseudo-module, one per `N` ───

#[derive(Debug, Default)]
pub(crate) struct Reloadable<const N: u8>;

impl<const N: u8> Reloadable<N> {
    pub(crate) const MODULE: &'static str = match N {
        0 => "compass_framework::testing::reloadable_a",
        _ => "compass_framework::testing::reloadable_b",
    };
}

impl<const N: u8> ComponentFields for Reloadable<N> {
    fn declare() -> ComponentSpec {
        ComponentSpec::new("Reloadable", Self::MODULE)
    }

    fn from_fields(_: FieldValues) -> ParseResult<Self> {
        Ok(Self)
    }

    fn render(component: &dyn ComponentFields, custom_id: String) -> Component {
        render_button(component, custom_id)
    }

    fn field(&self, _: &str) -> Option<&DynValue> {
        None
    }

    fn as_ui_component(&self, custom_id: String) -> Component {
        Self::render(self, custom_id)
    }

    any_impls!();
}

#[async_trait]
impl<const N: u8> RichComponent for Reloadable<N> {
    async fn callback(&mut self, _interaction: &Interaction) -> anyhow::Result<()> {
        if let Some(log) = resolve::<CallLog>() {
            log.push("reloadable");
        }
        Ok(())
    }
}
