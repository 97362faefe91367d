//! End-to-end encoding scenarios through `#[derive(Component)]`.

use std::sync::Arc;

use compass::framework::{ComponentManager, ManagerStore};
use compass::prelude::*;
use tokio_test::assert_ok;

#[derive(Debug, Component)]
#[component(extends = button)]
struct MyButton {
    count: i64,
}

#[async_trait]
impl RichComponent for MyButton {
    async fn callback(&mut self, _interaction: &Interaction) -> anyhow::Result<()> {
        self.count += 1;
        Ok(())
    }
}

#[derive(Debug, Component)]
#[component(extends = button)]
struct Paged {
    #[component(default = Some(10))]
    limit: Option<i64>,
    page: u32,
}

#[async_trait]
impl RichComponent for Paged {
    async fn callback(&mut self, _interaction: &Interaction) -> anyhow::Result<()> {
        Ok(())
    }
}

fn manager_with<T: RichComponent>() -> Arc<ComponentManager> {
    let manager = ManagerStore::new().root();
    assert_ok!(manager.register::<T>());
    manager
}

async fn decode(manager: &Arc<ComponentManager>, custom_id: &str) -> Box<dyn RichComponent> {
    let raw = Component::Button(Button::new(custom_id));
    manager
        .parse_raw_component(&raw)
        .await
        .unwrap()
        .expect("identifier is registered")
}

#[tokio::test]
async fn test_single_field_round_trip() {
    let manager = manager_with::<MyButton>();

    let custom_id = manager.make_custom_id(&MyButton { count: 5 }).await.unwrap();
    assert_eq!(custom_id, "MyButton|5");

    let decoded = decode(&manager, &custom_id).await;
    assert_eq!(decoded.downcast_ref::<MyButton>().map(|b| b.count), Some(5));
}

#[tokio::test]
async fn test_dedup_counter_follows_identifier() {
    let manager = manager_with::<MyButton>();
    manager.set_count(Some(true));
    manager.set_counter(10);

    let custom_id = manager.make_custom_id(&MyButton { count: 5 }).await.unwrap();
    assert_eq!(custom_id, "MyButton\u{a}|5");
    assert_eq!(manager.counter(), 11);

    let decoded = decode(&manager, &custom_id).await;
    assert_eq!(decoded.downcast_ref::<MyButton>().map(|b| b.count), Some(5));
}

#[tokio::test]
async fn test_empty_token_takes_declared_default() {
    let manager = manager_with::<Paged>();

    let custom_id = manager
        .make_custom_id(&Paged {
            limit: None,
            page: 3,
        })
        .await
        .unwrap();
    assert_eq!(custom_id, "Paged||3");

    // The empty token means "absent", not `None`.
    let decoded = decode(&manager, &custom_id).await;
    let decoded = decoded.downcast_ref::<Paged>().unwrap();
    assert_eq!(decoded.limit, Some(10));
    assert_eq!(decoded.page, 3);
}

#[tokio::test]
async fn test_identical_components_collide_without_dedup() {
    let manager = manager_with::<MyButton>();

    let first = manager.make_custom_id(&MyButton { count: 7 }).await.unwrap();
    let second = manager.make_custom_id(&MyButton { count: 7 }).await.unwrap();
    assert_eq!(first, second);

    manager.set_count(Some(true));
    let third = manager.make_custom_id(&MyButton { count: 7 }).await.unwrap();
    let fourth = manager.make_custom_id(&MyButton { count: 7 }).await.unwrap();
    assert_ne!(third, fourth);
}
