//! Encoding and decoding of a component's custom-id fields.
//!
//! A [`ComponentFactory`] holds one parser per custom-id field, in
//! declaration order. That order is the wire order for both directions.

use async_trait::async_trait;
use tracing::trace;

use crate::component::{FieldDecl, FieldValues, RichComponent};
use crate::di::Dependencies;
use crate::error::{ParseError, ParseResult};
use crate::parser::BoxedParser;

/// Constructs a component from decoded values.
pub type BuildFn = fn(FieldValues) -> ParseResult<Box<dyn RichComponent>>;

/// Whether a token means "no value, use the field's default".
///
/// Only the empty token is absent. An empty string therefore cannot be
/// encoded as a value of a required field.
pub fn is_absent_token(token: &str) -> bool {
    token.is_empty()
}

#[async_trait]
pub trait Factory: Send + Sync {
    /// Number of custom-id fields.
    fn param_count(&self) -> usize;

    /// Decodes one token per custom-id field. Absent tokens are left out so
    /// defaults apply.
    async fn load_params(&self, tokens: &[&str], deps: &Dependencies)
    -> ParseResult<FieldValues>;

    /// Encodes the custom-id fields of `component`, rejecting any token
    /// that contains `sep`.
    async fn dump_params(
        &self,
        component: &dyn RichComponent,
        sep: &str,
    ) -> ParseResult<Vec<String>>;

    /// Decodes `tokens`, merges `internal` and constructs the component.
    async fn build_component(
        &self,
        tokens: &[&str],
        internal: FieldValues,
        deps: &Dependencies,
    ) -> ParseResult<Box<dyn RichComponent>>;
}

pub struct ComponentFactory {
    component: &'static str,
    parsers: Vec<(&'static str, BoxedParser)>,
    build: BuildFn,
}

impl ComponentFactory {
    /// Collects the parsers of the resolved custom-id fields in `fields`.
    pub fn new(component: &'static str, fields: &[FieldDecl], build: BuildFn) -> Self {
        let parsers = fields
            .iter()
            .filter(|f| f.is_custom_id())
            .filter_map(|f| f.parser.clone().map(|p| (f.name, p)))
            .collect();
        Self {
            component,
            parsers,
            build,
        }
    }

    pub fn parsers(&self) -> &[(&'static str, BoxedParser)] {
        &self.parsers
    }
}

#[async_trait]
impl Factory for ComponentFactory {
    fn param_count(&self) -> usize {
        self.parsers.len()
    }

    async fn load_params(
        &self,
        tokens: &[&str],
        deps: &Dependencies,
    ) -> ParseResult<FieldValues> {
        if tokens.len() != self.parsers.len() {
            return Err(ParseError::ParamCount {
                expected: self.parsers.len(),
                got: tokens.len(),
            });
        }

        let mut values = FieldValues::new();
        for ((name, parser), token) in self.parsers.iter().zip(tokens) {
            if is_absent_token(token) {
                trace!(component = self.component, field = name, "Absent token");
                continue;
            }
            values.insert(name, parser.loads_any(token, deps).await?);
        }
        Ok(values)
    }

    async fn dump_params(
        &self,
        component: &dyn RichComponent,
        sep: &str,
    ) -> ParseResult<Vec<String>> {
        let mut tokens = Vec::with_capacity(self.parsers.len());
        for (name, parser) in &self.parsers {
            let value = component
                .field(name)
                .ok_or_else(|| ParseError::MissingField(name.to_string()))?;
            let token = parser.dumps_any(value).await?;
            if !sep.is_empty() && token.contains(sep) {
                return Err(ParseError::ContainsSeparator {
                    field: name.to_string(),
                    token,
                    sep: sep.to_string(),
                });
            }
            tokens.push(token);
        }
        Ok(tokens)
    }

    async fn build_component(
        &self,
        tokens: &[&str],
        mut internal: FieldValues,
        deps: &Dependencies,
    ) -> ParseResult<Box<dyn RichComponent>> {
        internal.extend(self.load_params(tokens, deps).await?);
        (self.build)(internal)
    }
}

/// Factory of template types. Every operation fails.
pub struct NoopFactory;

#[async_trait]
impl Factory for NoopFactory {
    fn param_count(&self) -> usize {
        0
    }

    async fn load_params(&self, _: &[&str], _: &Dependencies) -> ParseResult<FieldValues> {
        Err(ParseError::NotImplemented("loading a template"))
    }

    async fn dump_params(&self, _: &dyn RichComponent, _: &str) -> ParseResult<Vec<String>> {
        Err(ParseError::NotImplemented("dumping a template"))
    }

    async fn build_component(
        &self,
        _: &[&str],
        _: FieldValues,
        _: &Dependencies,
    ) -> ParseResult<Box<dyn RichComponent>> {
        Err(ParseError::NotImplemented("building a template"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentType;
    use crate::testing::Counter;

    #[tokio::test]
    async fn test_dump_then_build() {
        let ty = ComponentType::of::<Counter>().unwrap();
        let factory = ty.factory();
        assert_eq!(factory.param_count(), 2);

        let tokens = factory
            .dump_params(&Counter::new(71).with_step(2), "|")
            .await
            .unwrap();
        assert_eq!(tokens, ["1z", "2"]);

        let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();
        let built = factory
            .build_component(&tokens, FieldValues::new(), &Dependencies::new())
            .await
            .unwrap();
        let counter = built.downcast_ref::<Counter>().unwrap();
        assert_eq!((counter.count, counter.step), (71, 2));
    }

    #[tokio::test]
    async fn test_absent_tokens_are_left_out() {
        let ty = ComponentType::of::<Counter>().unwrap();
        let values = ty
            .factory()
            .load_params(&["5", ""], &Dependencies::new())
            .await
            .unwrap();
        assert!(values.contains("count"));
        assert!(!values.contains("step"));
    }

    #[tokio::test]
    async fn test_missing_required_field() {
        let ty = ComponentType::of::<Counter>().unwrap();
        let err = ty
            .factory()
            .build_component(&["", "3"], FieldValues::new(), &Dependencies::new())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ParseError::MissingField(name) if name == "count"));
    }

    #[tokio::test]
    async fn test_noop_factory_is_not_implemented() {
        let err = NoopFactory
            .load_params(&[], &Dependencies::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::NotImplemented(_)));
    }
}
