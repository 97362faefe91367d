//! Unresolved component declarations.

use super::field::FieldDecl;

/// What a component type declares about itself, before its parent chain
/// is merged in and its parsers are resolved.
///
/// Built by `#[derive(Component)]`, or by hand:
///
/// ```rust,ignore
/// ComponentSpec::new("Counter", module_path!())
///     .extends(templates::rich_button())
///     .field(FieldDecl::custom_id::<i64>("count"))
/// ```
#[derive(Debug, Clone)]
pub struct ComponentSpec {
    pub name: &'static str,
    /// Module the type is defined in, as given by `module_path!()`.
    pub module: &'static str,
    pub template: bool,
    pub parent: Option<Box<ComponentSpec>>,
    pub fields: Vec<FieldDecl>,
}

impl ComponentSpec {
    pub fn new(name: &'static str, module: &'static str) -> Self {
        Self {
            name,
            module,
            template: false,
            parent: None,
            fields: Vec::new(),
        }
    }

    /// Marks the type as a template: it is never finalized with parsers and
    /// cannot be registered.
    pub fn template(mut self) -> Self {
        self.template = true;
        self
    }

    pub fn extends(mut self, parent: ComponentSpec) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }
}
