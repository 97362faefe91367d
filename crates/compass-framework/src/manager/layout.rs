//! Whole-message helpers: decode every rich component on a message and
//! write updated components back into the layout.

use std::fmt;
use std::sync::Arc;

use compass_core::{Component, interactive_components, interactive_components_mut};
use tracing::trace;

use super::ComponentManager;
use super::dispatch::current_custom_id;
use crate::component::RichComponent;
use crate::error::ManagerResult;

/// A rich component found on a message.
pub enum RichSlot {
    /// The component currently being dispatched. It is not decoded again;
    /// the callback already holds it as `self`.
    Current,
    Parsed(Box<dyn RichComponent>),
}

impl RichSlot {
    pub fn is_current(&self) -> bool {
        matches!(self, Self::Current)
    }

    pub fn as_parsed(&self) -> Option<&dyn RichComponent> {
        match self {
            Self::Parsed(component) => Some(component.as_ref()),
            Self::Current => None,
        }
    }

    pub fn into_parsed(self) -> Option<Box<dyn RichComponent>> {
        match self {
            Self::Parsed(component) => Some(component),
            Self::Current => None,
        }
    }
}

impl fmt::Debug for RichSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => f.write_str("Current"),
            Self::Parsed(component) => f
                .debug_tuple("Parsed")
                .field(&component.type_key())
                .finish(),
        }
    }
}

impl ComponentManager {
    /// Copies a message layout and decodes every rich component on it, in
    /// layout order.
    ///
    /// Components unknown to this manager are skipped. Inside a dispatch,
    /// the first leaf with the in-flight custom id becomes
    /// [`RichSlot::Current`].
    pub async fn parse_message_components(
        self: &Arc<Self>,
        components: &[Component],
    ) -> ManagerResult<(Vec<Component>, Vec<RichSlot>)> {
        let layout = components.to_vec();
        let mut current = current_custom_id();
        let mut slots = Vec::new();

        for leaf in interactive_components(components) {
            if current.is_some() && leaf.custom_id() == current.as_deref() {
                current = None;
                slots.push(RichSlot::Current);
                continue;
            }
            if let Some(component) = self.parse_raw_component(leaf).await? {
                slots.push(RichSlot::Parsed(component));
            }
        }
        Ok((layout, slots))
    }

    /// Re-renders `components` into `layout`, in place.
    ///
    /// Interactive leaves are walked in order; a leaf whose custom id
    /// starts with the next component's identifier is replaced by that
    /// component. Walking stops once every component is placed.
    pub async fn update_layout(
        &self,
        layout: &mut [Component],
        components: &[&dyn RichComponent],
    ) -> ManagerResult<()> {
        let mut pending = components.iter();
        let Some(mut component) = pending.next() else {
            return Ok(());
        };
        let mut identifier = self.identifier_of(component.type_key())?;

        for leaf in interactive_components_mut(layout) {
            if !leaf
                .custom_id()
                .is_some_and(|id| id.starts_with(identifier.as_str()))
            {
                continue;
            }

            *leaf = self.render(*component).await?;
            trace!(identifier = %identifier, "Layout slot updated");

            let Some(next) = pending.next() else {
                return Ok(());
            };
            component = next;
            identifier = self.identifier_of(component.type_key())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::ManagerStore;
    use crate::manager::dispatch::RequestScope;
    use crate::di::Dependencies;
    use crate::testing::{Counter, Labelled};
    use compass_core::TextDisplay;

    async fn message(root: &Arc<ComponentManager>) -> Vec<Component> {
        vec![
            Component::TextDisplay(TextDisplay {
                content: "counters".into(),
            }),
            Component::row([
                root.render(&Counter::new(1)).await.unwrap(),
                root.render(&Labelled::new("hi")).await.unwrap(),
                root.render(&Counter::new(2)).await.unwrap(),
            ]),
        ]
    }

    #[tokio::test]
    async fn test_parse_message_components_in_order() {
        let store = ManagerStore::new();
        let root = store.root();
        root.register::<Counter>().unwrap();
        root.register::<Labelled>().unwrap();

        let components = message(&root).await;
        let (layout, slots) = root.parse_message_components(&components).await.unwrap();
        assert_eq!(layout, components);

        let counts: Vec<_> = slots
            .iter()
            .filter_map(|s| s.as_parsed()?.downcast_ref::<Counter>().map(|c| c.count))
            .collect();
        assert_eq!(counts, [1, 2]);
        assert_eq!(slots.len(), 3);
    }

    #[tokio::test]
    async fn test_in_flight_component_is_not_decoded() {
        let store = ManagerStore::new();
        let root = store.root();
        root.register::<Counter>().unwrap();
        root.register::<Labelled>().unwrap();

        let components = message(&root).await;
        let scope = RequestScope::new("Labelled|hi", Dependencies::new());
        let slots = scope
            .run(async { root.parse_message_components(&components).await.unwrap().1 })
            .await;
        assert!(slots[1].is_current());
        assert!(!slots[0].is_current() && !slots[2].is_current());
    }

    #[tokio::test]
    async fn test_update_layout_replaces_matching_leaves() {
        let store = ManagerStore::new();
        let root = store.root();
        root.register::<Counter>().unwrap();
        root.register::<Labelled>().unwrap();

        let mut layout = message(&root).await;
        let first = Counter::new(10);
        let second = Counter::new(20);
        let updated: [&dyn RichComponent; 2] = [&first, &second];
        root.update_layout(&mut layout, &updated).await.unwrap();

        let ids: Vec<_> = interactive_components(&layout)
            .iter()
            .filter_map(|c| c.custom_id().map(str::to_string))
            .collect();
        assert_eq!(ids, ["Counter|a|1", "Labelled|hi", "Counter|k|1"]);
    }

    #[tokio::test]
    async fn test_update_layout_with_nothing_is_noop() {
        let store = ManagerStore::new();
        let root = store.root();
        root.register::<Counter>().unwrap();
        root.register::<Labelled>().unwrap();

        let mut layout = message(&root).await;
        let before = layout.clone();
        root.update_layout(&mut layout, &[]).await.unwrap();
        assert_eq!(layout, before);
    }
}
