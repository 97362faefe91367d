//! Counter Demo
//!
//! A counter button and a select menu that changes the counter's step. All
//! state lives in the components' custom ids: every click decodes the
//! button from the message, updates it and re-renders it in place.
//!
//! The platform is simulated by an in-memory client that stores messages
//! and feeds synthetic clicks to the bound manager.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package counter-demo
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use compass::core::{
    BoxedClient, Channel, ChannelKind, Listeners, MESSAGE_INTERACTION_EVENT, Message,
    MessagePayload, PlatformError, PlatformResult, User, interactive_components,
};
use compass::prelude::*;
use parking_lot::Mutex;
use tracing::info;

// ============================================================================
// Components
// ============================================================================

#[derive(Debug, Component)]
#[component(extends = button)]
struct Counter {
    #[component(internal)]
    label: Option<String>,
    count: i64,
    #[component(default = 1)]
    step: i64,
}

impl Counter {
    fn new() -> Self {
        let mut counter = Self {
            label: None,
            count: 0,
            step: 1,
        };
        counter.relabel();
        counter
    }

    fn relabel(&mut self) {
        self.label = Some(format!("Count: {} (+{})", self.count, self.step));
    }
}

#[async_trait]
impl RichComponent for Counter {
    async fn callback(&mut self, interaction: &Interaction) -> anyhow::Result<()> {
        self.count += self.step;
        self.relabel();
        info!(count = self.count, step = self.step, "Counter clicked");

        let manager = resolve::<Arc<ComponentManager>>().context("no manager in scope")?;
        let message = interaction.message.as_ref().context("no source message")?;
        let mut layout = message.components.clone();
        manager.update_layout(&mut layout, &[&*self]).await?;
        interaction.edit_components(layout).await?;
        Ok(())
    }
}

#[derive(Debug, Component)]
#[component(extends = string_select)]
struct StepPicker {
    #[component(internal)]
    placeholder: Option<String>,
    #[component(internal)]
    options: Vec<SelectOption>,
}

impl StepPicker {
    fn new() -> Self {
        Self {
            placeholder: Some("Step size".into()),
            options: [1, 2, 5, 10]
                .into_iter()
                .map(|n| SelectOption::new(format!("+{n}"), n.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl RichComponent for StepPicker {
    async fn callback(&mut self, interaction: &Interaction) -> anyhow::Result<()> {
        let step: i64 = interaction
            .values()
            .first()
            .context("no step selected")?
            .parse()?;

        let manager = resolve::<Arc<ComponentManager>>().context("no manager in scope")?;
        let message = interaction.message.as_ref().context("no source message")?;
        let (mut layout, slots) = manager.parse_message_components(&message.components).await?;

        let mut counter = slots
            .into_iter()
            .filter_map(RichSlot::into_parsed)
            .find(|c| c.is::<Counter>())
            .context("no counter on the message")?;
        if let Some(counter) = counter.downcast_mut::<Counter>() {
            counter.step = step;
            counter.relabel();
        }
        info!(step, "Step changed");

        manager
            .update_layout(&mut layout, &[&*counter, &*self])
            .await?;
        interaction.edit_components(layout).await?;
        Ok(())
    }
}

// ============================================================================
// In-memory platform
// ============================================================================

struct InMemoryClient {
    listeners: Listeners,
    messages: Mutex<HashMap<Snowflake, Message>>,
    next_id: AtomicU64,
    me: User,
}

impl InMemoryClient {
    fn new() -> Self {
        Self {
            listeners: Listeners::new(),
            messages: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(100),
            me: User {
                id: Snowflake(1),
                name: "compass-demo".into(),
                bot: true,
            },
        }
    }

    fn message(&self, id: Snowflake) -> Option<Message> {
        self.messages.lock().get(&id).cloned()
    }
}

#[async_trait]
impl Client for InMemoryClient {
    fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    fn get_message(&self, id: Snowflake) -> Option<Message> {
        self.message(id)
    }

    async fn send_message(
        &self,
        channel: Snowflake,
        payload: MessagePayload,
    ) -> PlatformResult<Message> {
        let message = Message {
            id: Snowflake(self.next_id.fetch_add(1, Ordering::Relaxed)),
            channel_id: channel,
            author: self.me.clone(),
            content: payload.content.unwrap_or_default(),
            components: payload.components,
        };
        self.messages.lock().insert(message.id, message.clone());
        Ok(message)
    }

    async fn edit_message(
        &self,
        _channel: Snowflake,
        message: Snowflake,
        payload: MessagePayload,
    ) -> PlatformResult<Message> {
        let mut messages = self.messages.lock();
        let stored = messages
            .get_mut(&message)
            .ok_or_else(|| PlatformError::not_found("message", message))?;
        if let Some(content) = payload.content {
            stored.content = content;
        }
        stored.components = payload.components;
        Ok(stored.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Simulates `user` clicking the `index`-th interactive component of a
/// stored message, selecting `values`.
async fn click(
    client: &BoxedClient,
    user: &User,
    channel: &Channel,
    message: Snowflake,
    index: usize,
    values: Vec<String>,
) -> Result<Message> {
    let message = client.get_message(message).context("message is gone")?;
    let component = interactive_components(&message.components)
        .get(index)
        .map(|c| (*c).clone())
        .context("no such component")?;

    let interaction = Interaction::builder(user.clone(), channel.clone(), client.clone())
        .component(&component, values)
        .message(message.clone())
        .build();
    client
        .listeners()
        .dispatch(MESSAGE_INTERACTION_EVENT, interaction)
        .await;

    client.get_message(message.id).context("message is gone")
}

fn describe(message: &Message) -> Vec<String> {
    interactive_components(&message.components)
        .into_iter()
        .map(|c| match c {
            Component::Button(b) => format!(
                "[{}] {:?}",
                b.label.as_deref().unwrap_or_default(),
                b.custom_id.as_deref().unwrap_or_default()
            ),
            other => format!("<select> {:?}", other.custom_id().unwrap_or_default()),
        })
        .collect()
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let runtime = CompassRuntime::new();
    let demo = runtime.manager("demo");
    demo.register::<Counter>()?;
    demo.register::<StepPicker>()?;

    let client: BoxedClient = Arc::new(InMemoryClient::new());
    runtime.bind(client.clone())?;

    let channel = Channel {
        id: Snowflake(10),
        guild_id: None,
        name: "demo".into(),
        kind: ChannelKind::Text,
    };
    let user = User {
        id: Snowflake(20),
        name: "someone".into(),
        bot: false,
    };

    let components = vec![
        Component::row([demo.render(&Counter::new()).await?]),
        Component::row([demo.render(&StepPicker::new()).await?]),
    ];
    let sent = client
        .send_message(
            channel.id,
            MessagePayload::components(components).content("Click me"),
        )
        .await?;
    info!(components = ?describe(&sent), "Message sent");

    for _ in 0..2 {
        let message = click(&client, &user, &channel, sent.id, 0, Vec::new()).await?;
        info!(components = ?describe(&message), "After click");
    }

    let message = click(&client, &user, &channel, sent.id, 1, vec!["5".into()]).await?;
    info!(components = ?describe(&message), "After picking a step");

    let message = click(&client, &user, &channel, sent.id, 0, Vec::new()).await?;
    info!(components = ?describe(&message), "After click");

    runtime.unbind()?;
    Ok(())
}
