//! Interaction dispatch through the manager chain.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use compass_core::Interaction;
use futures::FutureExt;
use tracing::{Instrument, debug, debug_span, error, trace, warn};

use super::{CallbackWrapper, ComponentManager, DependencyProvider};
use crate::component::RichComponent;
use crate::di::Dependencies;

tokio::task_local! {
    static REQUEST: RequestScope;
}

/// State visible to everything that runs during one dispatch.
#[derive(Clone)]
pub struct RequestScope {
    custom_id: Arc<str>,
    deps: Arc<Dependencies>,
}

impl RequestScope {
    pub fn new(custom_id: &str, deps: Dependencies) -> Self {
        Self {
            custom_id: Arc::from(custom_id),
            deps: Arc::new(deps),
        }
    }

    /// Custom id of the component being dispatched.
    pub fn custom_id(&self) -> &str {
        &self.custom_id
    }

    pub fn deps(&self) -> &Arc<Dependencies> {
        &self.deps
    }

    /// Runs `future` with this scope installed.
    pub async fn run<F: Future>(self, future: F) -> F::Output {
        REQUEST.scope(self, future).await
    }
}

/// Looks up a dependency of the running dispatch.
///
/// Returns `None` outside a dispatch or when no provider supplied a `T`.
pub fn resolve<T: Clone + Send + Sync + 'static>() -> Option<T> {
    REQUEST
        .try_with(|scope| scope.deps.get::<T>().cloned())
        .ok()
        .flatten()
}

/// Custom id of the component being dispatched, if any.
pub fn current_custom_id() -> Option<String> {
    REQUEST.try_with(|scope| scope.custom_id.to_string()).ok()
}

/// Dependencies of the running dispatch, if any.
pub fn current_dependencies() -> Option<Arc<Dependencies>> {
    REQUEST.try_with(|scope| scope.deps.clone()).ok()
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "<non-string panic payload>".to_string())
}

/// Awaits a fallible hook or callback, turning a panic into an error.
async fn guarded<T>(future: impl Future<Output = anyhow::Result<T>>) -> anyhow::Result<T> {
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(anyhow::anyhow!("panicked: {}", panic_message(panic))),
    }
}

impl ComponentManager {
    /// Dispatches a component interaction with dependency injection.
    pub async fn invoke(self: &Arc<Self>, interaction: &Interaction) {
        self.invoke_with(interaction, true).await;
    }

    /// Dispatches a component interaction.
    ///
    /// Interactions whose component is not on the message, or whose
    /// identifier is unknown to this manager, are ignored. Errors are never
    /// returned: they go through the exception handlers of the chain.
    ///
    /// Dropping the returned future part way still releases the hooks that
    /// were entered: their `after` and `exit` calls run on a spawned task.
    pub async fn invoke_with(self: &Arc<Self>, interaction: &Interaction, with_di: bool) {
        let Some(raw) = interaction.component() else {
            trace!(manager = %self.name, "Interaction has no source component");
            return;
        };
        let Some(custom_id) = raw.custom_id() else {
            return;
        };

        let (identifier, tokens) = self.get_identifier(custom_id);
        let Some(registration) = self.live_registration(identifier) else {
            trace!(manager = %self.name, identifier, "Unknown component");
            return;
        };
        let registrar = registration.registrar.upgrade().unwrap_or_else(|| self.clone());
        let chain = registrar.chain();

        let span = debug_span!(
            "dispatch",
            manager = %self.name,
            registrar = %registrar.name,
            identifier,
        );

        async {
            let mut unwind = Unwind::new(interaction);

            // ─── providers.enter: root → registrar ───
            let mut deps = Dependencies::new();
            let mut failure = None;
            if with_di {
                for manager in chain.iter().rev() {
                    let provider = manager.provider();
                    match guarded(provider.enter(manager, interaction, &mut deps)).await {
                        Ok(()) => unwind.providers.push((manager.clone(), provider)),
                        Err(error) => {
                            failure = Some(error);
                            break;
                        }
                    }
                }
            }

            let scope = RequestScope::new(custom_id, deps);
            let deps = scope.deps().clone();
            scope
                .run(async {
                    let error = match failure {
                        Some(error) => Some(error),
                        None => {
                            let internal = registration.ty.extract_internal(raw);
                            let built = registration
                                .ty
                                .factory()
                                .build_component(&tokens, internal, &deps)
                                .await;
                            match built {
                                Ok(component) => {
                                    unwind.component = Some(component);
                                    run_callback(&chain, &mut unwind, interaction).await
                                }
                                Err(error) => Some(error.into()),
                            }
                        }
                    };

                    if let Some(error) = error {
                        let component = unwind.component.as_deref();
                        handle_error(&chain, component, interaction, &error).await;
                    } else {
                        debug!("Component callback completed");
                    }
                })
                .await;

            // ─── providers.exit: registrar → root ───
            unwind.exit_providers().await;
        }
        .instrument(span)
        .await;
    }
}

/// Hooks entered during one dispatch whose exit is still pending.
///
/// If it is dropped with hooks still pending, the dispatch was cancelled.
/// The pending `after` and `exit` calls are then moved to a spawned task.
struct Unwind {
    interaction: Interaction,
    component: Option<Box<dyn RichComponent>>,
    wrappers: Vec<(Arc<ComponentManager>, Arc<dyn CallbackWrapper>)>,
    providers: Vec<(Arc<ComponentManager>, Arc<dyn DependencyProvider>)>,
    detached: bool,
}

impl Unwind {
    fn new(interaction: &Interaction) -> Self {
        Self {
            interaction: interaction.clone(),
            component: None,
            wrappers: Vec::new(),
            providers: Vec::new(),
            detached: false,
        }
    }

    /// Runs `after` registrar → root for every entered wrapper. Returns the
    /// error left once they all ran.
    async fn leave_wrappers(&mut self, mut error: Option<anyhow::Error>) -> Option<anyhow::Error> {
        while let Some((manager, wrapper)) = self.wrappers.pop() {
            let Some(component) = self.component.as_deref() else {
                break;
            };
            let after = wrapper.after(&manager, component, &self.interaction, error.as_ref());
            if let Err(e) = guarded(after).await {
                if let Some(previous) = &error {
                    debug!(error = %previous, "Error replaced by callback wrapper");
                }
                error = Some(e);
            }
        }
        error
    }

    /// Runs `exit` registrar → root for every entered provider.
    async fn exit_providers(&mut self) {
        while let Some((manager, provider)) = self.providers.pop() {
            let exit = async {
                provider.exit(&manager, &self.interaction).await;
                Ok::<_, anyhow::Error>(())
            };
            if let Err(error) = guarded(exit).await {
                warn!(manager = %manager.name, %error, "Dependency provider exit failed");
            }
        }
    }
}

impl Drop for Unwind {
    fn drop(&mut self) {
        if self.detached || (self.wrappers.is_empty() && self.providers.is_empty()) {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("Dispatch cancelled outside a runtime, entered hooks were not released");
            return;
        };

        let mut pending = Self {
            interaction: self.interaction.clone(),
            component: self.component.take(),
            wrappers: std::mem::take(&mut self.wrappers),
            providers: std::mem::take(&mut self.providers),
            detached: true,
        };
        debug!(
            wrappers = pending.wrappers.len(),
            providers = pending.providers.len(),
            "Dispatch cancelled, releasing entered hooks"
        );
        runtime.spawn(
            async move {
                let cancelled = anyhow::anyhow!("dispatch cancelled");
                if let Some(error) = pending.leave_wrappers(Some(cancelled)).await {
                    trace!(%error, "Cancelled dispatch unwound");
                }
                pending.exit_providers().await;
            }
            .in_current_span(),
        );
    }
}

/// Runs the wrappers and the callback. Returns the error to report, if any.
async fn run_callback(
    chain: &[Arc<ComponentManager>],
    unwind: &mut Unwind,
    interaction: &Interaction,
) -> Option<anyhow::Error> {
    let mut error = None;

    if let Some(component) = unwind.component.as_deref_mut() {
        for manager in chain.iter().rev() {
            let wrapper = manager.wrapper();
            match guarded(wrapper.before(manager, &*component, interaction)).await {
                Ok(()) => unwind.wrappers.push((manager.clone(), wrapper)),
                Err(e) => {
                    error = Some(e);
                    break;
                }
            }
        }

        if error.is_none() {
            if let Err(e) = guarded(component.callback(interaction)).await {
                error = Some(e);
            }
        }
    }

    unwind.leave_wrappers(error).await
}

/// Offers `error` to the handlers registrar → root until one accepts it.
async fn handle_error(
    chain: &[Arc<ComponentManager>],
    component: Option<&dyn RichComponent>,
    interaction: &Interaction,
    error: &anyhow::Error,
) {
    for manager in chain {
        let handler = manager.handler();
        let handled = AssertUnwindSafe(handler.handle(manager, component, interaction, error))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                warn!(
                    manager = %manager.name,
                    panic = %panic_message(panic),
                    "Exception handler panicked"
                );
                false
            });
        if handled {
            trace!(manager = %manager.name, "Error handled");
            return;
        }
    }
    error!(error = %format!("{error:#}"), "Error was not handled by any manager");
}
