//! Hook traits run around component callbacks.
//!
//! Each manager has one hook of each kind. Replacing a hook only affects
//! that manager; the chain still runs the hooks of every ancestor.

use std::sync::Arc;

use async_trait::async_trait;
use compass_core::Interaction;
use tracing::error;

use super::ComponentManager;
use crate::component::RichComponent;
use crate::di::Dependencies;

/// Supplies request dependencies before a component is decoded.
#[async_trait]
pub trait DependencyProvider: Send + Sync {
    /// Runs root-to-registrar before decoding. Values inserted into `deps`
    /// are visible to parsers and, through [`resolve`](super::resolve), to
    /// callbacks.
    async fn enter(
        &self,
        manager: &Arc<ComponentManager>,
        interaction: &Interaction,
        deps: &mut Dependencies,
    ) -> anyhow::Result<()>;

    /// Runs registrar-to-root once the interaction is done, on every path.
    async fn exit(&self, _manager: &Arc<ComponentManager>, _interaction: &Interaction) {}
}

/// Runs code around a component's callback.
#[async_trait]
pub trait CallbackWrapper: Send + Sync {
    /// Runs root-to-registrar. An error cancels the callback and every
    /// wrapper not yet entered.
    async fn before(
        &self,
        _manager: &Arc<ComponentManager>,
        _component: &dyn RichComponent,
        _interaction: &Interaction,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs registrar-to-root for every wrapper whose `before` succeeded.
    /// `error` is the failure so far, if any. Returning an error replaces it.
    async fn after(
        &self,
        _manager: &Arc<ComponentManager>,
        _component: &dyn RichComponent,
        _interaction: &Interaction,
        _error: Option<&anyhow::Error>,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Handles errors raised while decoding or running a component.
#[async_trait]
pub trait ExceptionHandler: Send + Sync {
    /// Returns `true` if the error is handled. Handlers run
    /// registrar-to-root until one returns `true`.
    ///
    /// `component` is `None` when the error happened before the component
    /// was built.
    async fn handle(
        &self,
        manager: &Arc<ComponentManager>,
        component: Option<&dyn RichComponent>,
        interaction: &Interaction,
        error: &anyhow::Error,
    ) -> bool;
}

/// Exposes the manager, interaction, client, channel, author and, when
/// present, guild and member.
pub struct DefaultProvider;

#[async_trait]
impl DependencyProvider for DefaultProvider {
    async fn enter(
        &self,
        manager: &Arc<ComponentManager>,
        interaction: &Interaction,
        deps: &mut Dependencies,
    ) -> anyhow::Result<()> {
        deps.insert(manager.clone());
        deps.insert(interaction.client.clone());
        deps.insert(interaction.channel.clone());
        deps.insert(interaction.author.clone());
        if let Some(guild) = &interaction.guild {
            deps.insert(guild.clone());
        }
        if let Some(member) = &interaction.member {
            deps.insert(member.clone());
        }
        deps.insert(interaction.clone());
        Ok(())
    }
}

pub struct NoopWrapper;

impl CallbackWrapper for NoopWrapper {}

/// Logs and swallows every error that reaches the root. Other managers
/// pass errors on.
pub struct DefaultHandler;

#[async_trait]
impl ExceptionHandler for DefaultHandler {
    async fn handle(
        &self,
        manager: &Arc<ComponentManager>,
        component: Option<&dyn RichComponent>,
        interaction: &Interaction,
        error: &anyhow::Error,
    ) -> bool {
        if !manager.is_root() {
            return false;
        }

        let component = component.map_or("<undecoded>", |c| c.type_key().short_name());
        error!(
            manager = %manager.name(),
            component,
            custom_id = interaction.custom_id().unwrap_or_default(),
            error = %format!("{error:#}"),
            "Unhandled error in component interaction"
        );
        true
    }
}

pub(crate) struct Hooks {
    pub(crate) provider: Arc<dyn DependencyProvider>,
    pub(crate) wrapper: Arc<dyn CallbackWrapper>,
    pub(crate) handler: Arc<dyn ExceptionHandler>,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            provider: Arc::new(DefaultProvider),
            wrapper: Arc::new(NoopWrapper),
            handler: Arc::new(DefaultHandler),
        }
    }
}

impl ComponentManager {
    /// Replaces this manager's dependency provider.
    pub fn as_dependency_provider(&self, provider: impl DependencyProvider + 'static) {
        self.hooks.write().provider = Arc::new(provider);
    }

    /// Replaces this manager's callback wrapper.
    pub fn as_callback_wrapper(&self, wrapper: impl CallbackWrapper + 'static) {
        self.hooks.write().wrapper = Arc::new(wrapper);
    }

    /// Replaces this manager's exception handler.
    pub fn as_exception_handler(&self, handler: impl ExceptionHandler + 'static) {
        self.hooks.write().handler = Arc::new(handler);
    }

    pub(crate) fn provider(&self) -> Arc<dyn DependencyProvider> {
        self.hooks.read().provider.clone()
    }

    pub(crate) fn wrapper(&self) -> Arc<dyn CallbackWrapper> {
        self.hooks.read().wrapper.clone()
    }

    pub(crate) fn handler(&self) -> Arc<dyn ExceptionHandler> {
        self.hooks.read().handler.clone()
    }
}
