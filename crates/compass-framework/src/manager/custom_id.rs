//! Custom id assembly and decoding.
//!
//! A custom id is `identifier [counter] (SEP token)*`. When counting is on,
//! one character from a private codepage is appended to the identifier so
//! that otherwise identical components on one message get distinct ids:
//! values below 32 map to the control characters `U+0000..U+001F`, the
//! rest to `U+E020..U+E0FF` in the Private Use Area. Neither range can be
//! typed into an identifier by accident.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use compass_core::Component;
use tracing::trace;

use super::ComponentManager;
use super::dispatch::current_dependencies;
use crate::component::RichComponent;
use crate::di::Dependencies;
use crate::error::{ManagerError, ManagerResult};

/// Platform limit on custom id length, in characters.
pub const MAX_CUSTOM_ID_LEN: usize = 100;

const PRIVATE_USE_START: u32 = 0xE000;

/// The codepage character for counter value `n`.
pub fn dedup_char(n: u8) -> char {
    let code = if n < 32 {
        u32::from(n)
    } else {
        PRIVATE_USE_START + u32::from(n)
    };
    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Whether `c` belongs to the counter codepage.
pub fn is_dedup_char(c: char) -> bool {
    let code = u32::from(c);
    code < 32 || (PRIVATE_USE_START + 32..=PRIVATE_USE_START + 255).contains(&code)
}

impl ComponentManager {
    /// Returns the current counter character and advances the counter,
    /// wrapping after 255.
    pub fn increment(&self) -> char {
        dedup_char(self.counter.fetch_add(1, Ordering::Relaxed))
    }

    /// Splits a custom id into its identifier and tokens.
    ///
    /// With counting on, a trailing counter character is stripped from the
    /// identifier.
    pub fn get_identifier<'a>(&self, custom_id: &'a str) -> (&'a str, Vec<&'a str>) {
        let sep = self.sep();
        let mut parts = custom_id.split(sep.as_str());
        let mut identifier = parts.next().unwrap_or(custom_id);

        if self.count() {
            if let Some(last) = identifier.chars().last().filter(|c| is_dedup_char(*c)) {
                identifier = &identifier[..identifier.len() - last.len_utf8()];
            }
        }
        (identifier, parts.collect())
    }

    /// Builds the custom id for `component`.
    pub async fn make_custom_id(&self, component: &dyn RichComponent) -> ManagerResult<String> {
        let identifier = self.identifier_of(component.type_key())?;
        let ty = self
            .component_type(&identifier)
            .ok_or_else(|| ManagerError::UnknownIdentifier {
                identifier: identifier.clone(),
                manager: self.name.clone(),
            })?;

        let sep = self.sep();
        let mut custom_id = identifier;
        if self.count() {
            custom_id.push(self.increment());
        }
        for token in ty.factory().dump_params(component, &sep).await? {
            custom_id.push_str(&sep);
            custom_id.push_str(&token);
        }

        let length = custom_id.chars().count();
        if length > MAX_CUSTOM_ID_LEN {
            return Err(ManagerError::CustomIdTooLong {
                custom_id,
                length,
                limit: MAX_CUSTOM_ID_LEN,
            });
        }
        trace!(manager = %self.name, custom_id = %custom_id.escape_debug(), "Custom id made");
        Ok(custom_id)
    }

    /// Decodes a raw platform component into the rich component registered
    /// for its identifier.
    ///
    /// Returns `Ok(None)` when the component has no custom id, the
    /// identifier is unknown to this manager or its registration went stale.
    /// Inside a dispatch, the request's dependencies are available to the
    /// parsers.
    pub async fn parse_raw_component(
        self: &Arc<Self>,
        component: &Component,
    ) -> ManagerResult<Option<Box<dyn RichComponent>>> {
        let deps = current_dependencies().unwrap_or_default();
        self.parse_raw_component_with(component, &deps).await
    }

    /// Like [`parse_raw_component`](Self::parse_raw_component) with explicit
    /// dependencies.
    pub async fn parse_raw_component_with(
        self: &Arc<Self>,
        component: &Component,
        deps: &Dependencies,
    ) -> ManagerResult<Option<Box<dyn RichComponent>>> {
        let Some(custom_id) = component.custom_id() else {
            return Ok(None);
        };
        let (identifier, tokens) = self.get_identifier(custom_id);
        let Some(registration) = self.live_registration(identifier) else {
            return Ok(None);
        };

        let internal = registration.ty.extract_internal(component);
        let rich = registration
            .ty
            .factory()
            .build_component(&tokens, internal, deps)
            .await?;
        Ok(Some(rich))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::manager::ManagerStore;
    use crate::testing::{Counter, Labelled};
    use compass_core::{Button, StringSelect};

    #[test]
    fn test_codepage_ranges() {
        assert_eq!(dedup_char(10), '\n');
        assert_eq!(dedup_char(31), '\u{1f}');
        assert_eq!(dedup_char(32), '\u{e020}');
        assert_eq!(dedup_char(255), '\u{e0ff}');

        for n in 0..=255u8 {
            assert!(is_dedup_char(dedup_char(n)));
        }
        assert!(!is_dedup_char('a'));
        assert!(!is_dedup_char('\u{e000}'));
    }

    #[test]
    fn test_counter_wraps_after_256_increments() {
        let store = ManagerStore::new();
        let root = store.root();
        let first = root.increment();
        for _ in 0..255 {
            root.increment();
        }
        assert_eq!(root.increment(), first);
        assert_eq!(root.counter(), 1);
    }

    #[tokio::test]
    async fn test_custom_id_without_counter() {
        let store = ManagerStore::new();
        let root = store.root();
        root.register_as::<Counter>("MyButton").unwrap();

        let custom_id = root.make_custom_id(&Counter::new(5)).await.unwrap();
        assert_eq!(custom_id, "MyButton|5|1");
        assert_eq!(root.counter(), 0);
    }

    #[tokio::test]
    async fn test_custom_id_with_counter() {
        let store = ManagerStore::new();
        let root = store.root();
        root.set_count(Some(true));
        root.set_counter(10);
        root.register_as::<Counter>("MyButton").unwrap();

        let custom_id = root.make_custom_id(&Counter::new(5)).await.unwrap();
        assert_eq!(custom_id, "MyButton\n|5|1");
        assert_eq!(root.counter(), 11);

        let (identifier, tokens) = root.get_identifier(&custom_id);
        assert_eq!(identifier, "MyButton");
        assert_eq!(tokens, ["5", "1"]);
    }

    #[tokio::test]
    async fn test_identical_ids_without_counter() {
        let store = ManagerStore::new();
        let root = store.root();
        root.register::<Counter>().unwrap();

        let a = root.make_custom_id(&Counter::new(3)).await.unwrap();
        let b = root.make_custom_id(&Counter::new(3)).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_length_limit_is_enforced() {
        let store = ManagerStore::new();
        let root = store.root();
        root.register::<Labelled>().unwrap();

        let fits = Labelled::new("x".repeat(100 - "Labelled|".len()));
        assert_eq!(root.make_custom_id(&fits).await.unwrap().chars().count(), 100);

        let too_long = Labelled::new("x".repeat(100));
        let err = root.make_custom_id(&too_long).await.unwrap_err();
        assert!(matches!(
            err,
            ManagerError::CustomIdTooLong { length: 109, limit: 100, .. }
        ));
    }

    #[tokio::test]
    async fn test_separator_in_token_is_rejected() {
        let store = ManagerStore::new();
        let root = store.root();
        root.register::<Labelled>().unwrap();

        let err = root.make_custom_id(&Labelled::new("a|b")).await.unwrap_err();
        assert!(matches!(
            err,
            ManagerError::Parse(ParseError::ContainsSeparator { .. })
        ));
    }

    #[tokio::test]
    async fn test_unregistered_component_is_an_error() {
        let store = ManagerStore::new();
        let err = store.root().make_custom_id(&Counter::new(1)).await.unwrap_err();
        assert!(matches!(err, ManagerError::NotRegistered { component: "Counter", .. }));
    }

    #[tokio::test]
    async fn test_round_trip_through_raw_component() {
        let store = ManagerStore::new();
        let root = store.root();
        root.register::<Counter>().unwrap();

        let original = Counter::new(-42).with_step(7).with_label("Add");
        let raw = root.render(&original).await.unwrap();

        let parsed = root.parse_raw_component(&raw).await.unwrap().unwrap();
        let parsed = parsed.downcast_ref::<Counter>().unwrap();
        assert_eq!(parsed, &original);
    }

    #[tokio::test]
    async fn test_empty_token_takes_default() {
        let store = ManagerStore::new();
        let root = store.root();
        root.register_as::<Counter>("MyButton").unwrap();

        let raw = Component::Button(Button::new("MyButton|5|"));
        let parsed = root.parse_raw_component(&raw).await.unwrap().unwrap();
        let parsed = parsed.downcast_ref::<Counter>().unwrap();
        assert_eq!(parsed.count, 5);
        assert_eq!(parsed.step, Counter::DEFAULT_STEP);
    }

    #[tokio::test]
    async fn test_wrong_token_count_is_param_count_error() {
        let store = ManagerStore::new();
        let root = store.root();
        root.register::<Counter>().unwrap();

        let raw = Component::Button(Button::new("Counter|1|2|3"));
        let err = root.parse_raw_component(&raw).await.err().unwrap();
        assert!(matches!(
            err,
            ManagerError::Parse(ParseError::ParamCount { expected: 2, got: 3 })
        ));
    }

    #[tokio::test]
    async fn test_unknown_identifier_parses_to_none() {
        let store = ManagerStore::new();
        let raw = Component::StringSelect(StringSelect::new("Nobody|1"));
        assert!(store.root().parse_raw_component(&raw).await.unwrap().is_none());
    }
}
