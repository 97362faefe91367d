//! `#[derive(Component)]` implementation.
//!
//! # Struct attributes `#[component(...)]`
//!
//! | Key | Example | Description |
//! |-----|---------|-------------|
//! | `extends` | `button`, `string_select`, `crate::Base` | Parent declaration; built-in templates by keyword |
//! | `render` | `crate::render_link` | Renderer, overriding the one inherited from `extends` |
//! | `template` | | Declares a template: usable as a parent, never registered |
//!
//! # Field attributes `#[component(...)]`
//!
//! | Key | Description |
//! |-----|-------------|
//! | `internal` | Stored on the platform component, read back on decode |
//! | `plain` | Not encoded; always built from its default |
//! | `default` | `Default::default()` when the value is absent |
//! | `default = expr` | `expr` when the value is absent |
//! | `parser = expr` | Explicit parser for a custom-id field |
//!
//! Fields without `internal` or `plain` are custom-id fields, encoded in
//! declaration order after the parent's.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Expr, Fields, Ident, LitStr, Path, Token, Type, spanned::Spanned,
};

// ============================================================================
// Attribute structures
// ============================================================================

/// Where the declaration and renderer come from.
enum Parent {
    Button,
    StringSelect,
    Component(Path),
}

#[derive(Default)]
struct StructAttrs {
    parent: Option<Parent>,
    render: Option<Path>,
    template: bool,
}

#[derive(Clone, Copy, PartialEq)]
enum Kind {
    CustomId,
    Internal,
    Plain,
}

enum DefaultValue {
    None,
    Trait,
    Expr(Expr),
}

struct FieldAttrs {
    kind: Kind,
    default: DefaultValue,
    parser: Option<Expr>,
}

struct ComponentField<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    attrs: FieldAttrs,
}

// ============================================================================
// Entry point
// ============================================================================

pub fn derive_component(input: &DeriveInput) -> syn::Result<TokenStream> {
    let attrs = parse_struct_attrs(&input.attrs)?;
    if attrs.parent.is_none() && attrs.render.is_none() {
        return Err(syn::Error::new(
            input.ident.span(),
            "#[derive(Component)] requires `#[component(extends = ...)]` or `#[component(render = ...)]`",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => collect_fields(&data.fields)?,
        Data::Enum(_) => {
            return Err(syn::Error::new(
                input.span(),
                "Component cannot be derived for enums",
            ));
        }
        Data::Union(_) => {
            return Err(syn::Error::new(
                input.span(),
                "Component cannot be derived for unions",
            ));
        }
    };

    generate_impl(input, &attrs, &fields)
}

// ============================================================================
// Attribute parsing
// ============================================================================

fn parse_struct_attrs(attrs: &[Attribute]) -> syn::Result<StructAttrs> {
    let mut parsed = StructAttrs::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("component")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("extends") {
                let path: Path = meta.value()?.parse()?;
                parsed.parent = Some(if path.is_ident("button") {
                    Parent::Button
                } else if path.is_ident("string_select") {
                    Parent::StringSelect
                } else {
                    Parent::Component(path)
                });
            } else if meta.path.is_ident("render") {
                parsed.render = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("template") {
                parsed.template = true;
            } else {
                return Err(meta.error("expected `extends`, `render` or `template`"));
            }
            Ok(())
        })?;
    }

    Ok(parsed)
}

fn parse_field_attrs(attrs: &[Attribute], span: Span) -> syn::Result<FieldAttrs> {
    let mut internal = false;
    let mut plain = false;
    let mut default = DefaultValue::None;
    let mut parser = None;

    for attr in attrs.iter().filter(|a| a.path().is_ident("component")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("internal") {
                internal = true;
            } else if meta.path.is_ident("plain") {
                plain = true;
            } else if meta.path.is_ident("default") {
                default = if meta.input.peek(Token![=]) {
                    DefaultValue::Expr(meta.value()?.parse()?)
                } else {
                    DefaultValue::Trait
                };
            } else if meta.path.is_ident("parser") {
                parser = Some(meta.value()?.parse::<Expr>()?);
            } else {
                return Err(meta.error("expected `internal`, `plain`, `default` or `parser`"));
            }
            Ok(())
        })?;
    }

    let kind = match (internal, plain) {
        (true, true) => {
            return Err(syn::Error::new(
                span,
                "a field cannot be both `internal` and `plain`",
            ));
        }
        (true, false) => Kind::Internal,
        (false, true) => Kind::Plain,
        (false, false) => Kind::CustomId,
    };
    if parser.is_some() && kind != Kind::CustomId {
        return Err(syn::Error::new(
            span,
            "`parser` only applies to custom-id fields",
        ));
    }

    Ok(FieldAttrs {
        kind,
        default,
        parser,
    })
}

fn collect_fields(fields: &Fields) -> syn::Result<Vec<ComponentField<'_>>> {
    match fields {
        Fields::Named(named) => named
            .named
            .iter()
            .map(|field| {
                let ident = field
                    .ident
                    .as_ref()
                    .ok_or_else(|| syn::Error::new(field.span(), "expected a named field"))?;
                Ok(ComponentField {
                    ident,
                    ty: &field.ty,
                    attrs: parse_field_attrs(&field.attrs, field.span())?,
                })
            })
            .collect(),
        Fields::Unit => Ok(Vec::new()),
        Fields::Unnamed(unnamed) => Err(syn::Error::new(
            unnamed.span(),
            "Component requires named fields",
        )),
    }
}

// ============================================================================
// Code generation
// ============================================================================

fn generate_impl(
    input: &DeriveInput,
    attrs: &StructAttrs,
    fields: &[ComponentField<'_>],
) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    let name = LitStr::new(&ident.to_string(), ident.span());
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let template = attrs.template.then(|| quote! { .template() });
    let extends = attrs.parent.as_ref().map(|parent| match parent {
        Parent::Button => quote! { .extends(::compass::framework::template::rich_button()) },
        Parent::StringSelect => {
            quote! { .extends(::compass::framework::template::rich_string_select()) }
        }
        Parent::Component(path) => {
            quote! { .extends(<#path as ::compass::framework::ComponentFields>::declare()) }
        }
    });
    let decls = fields.iter().map(field_decl);
    let inits = fields.iter().map(field_init);
    let render = render_call(attrs);

    let field_names = fields.iter().map(|f| LitStr::new(&f.ident.to_string(), f.ident.span()));
    let field_idents = fields.iter().map(|f| f.ident);
    let values_binding = if fields.is_empty() {
        quote! { _values }
    } else {
        quote! { mut values }
    };
    let unit = matches!(&input.data, Data::Struct(data) if matches!(data.fields, Fields::Unit));
    let construct = if unit {
        quote! { Self }
    } else {
        quote! { Self { #(#inits),* } }
    };

    Ok(quote! {
        impl #impl_generics ::compass::framework::ComponentFields for #ident #ty_generics #where_clause {
            fn declare() -> ::compass::framework::ComponentSpec {
                ::compass::framework::ComponentSpec::new(#name, ::core::module_path!())
                    #template
                    #extends
                    #(#decls)*
            }

            fn from_fields(
                #values_binding: ::compass::framework::FieldValues,
            ) -> ::compass::framework::error::ParseResult<Self> {
                ::core::result::Result::Ok(#construct)
            }

            fn render(
                component: &dyn ::compass::framework::ComponentFields,
                custom_id: ::std::string::String,
            ) -> ::compass::core::Component {
                #render
            }

            fn field(
                &self,
                name: &str,
            ) -> ::core::option::Option<&::compass::framework::reflect::DynValue> {
                match name {
                    #(#field_names => ::core::option::Option::Some(
                        &self.#field_idents as &::compass::framework::reflect::DynValue
                    ),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn as_ui_component(&self, custom_id: ::std::string::String) -> ::compass::core::Component {
                <Self as ::compass::framework::ComponentFields>::render(self, custom_id)
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }
        }
    })
}

fn field_decl(field: &ComponentField<'_>) -> TokenStream {
    let name = LitStr::new(&field.ident.to_string(), field.ident.span());
    let ty = field.ty;

    let base = match field.attrs.kind {
        Kind::CustomId => quote! { ::compass::framework::FieldDecl::custom_id::<#ty>(#name) },
        Kind::Internal => quote! { ::compass::framework::FieldDecl::internal::<#ty>(#name) },
        Kind::Plain => quote! { ::compass::framework::FieldDecl::plain::<#ty>(#name) },
    };
    let parser = field.attrs.parser.as_ref().map(|parser| {
        quote! { .parser(::compass::framework::ParserExt::boxed(#parser)) }
    });
    let optional = (field.attrs.kind == Kind::CustomId
        && !matches!(field.attrs.default, DefaultValue::None))
    .then(|| quote! { .required(false) });

    quote! { .field(#base #parser #optional) }
}

fn field_init(field: &ComponentField<'_>) -> TokenStream {
    let ident = field.ident;
    let name = LitStr::new(&ident.to_string(), ident.span());
    let ty = field.ty;

    let value = match (&field.attrs.default, field.attrs.kind) {
        (DefaultValue::None, Kind::CustomId) => quote! { values.require::<#ty>(#name)? },
        (DefaultValue::Expr(expr), _) => {
            quote! { values.take::<#ty>(#name)?.unwrap_or_else(|| #expr) }
        }
        _ => quote! { values.take::<#ty>(#name)?.unwrap_or_default() },
    };

    quote! { #ident: #value }
}

fn render_call(attrs: &StructAttrs) -> TokenStream {
    if let Some(render) = &attrs.render {
        return quote! { #render(component, custom_id) };
    }
    match &attrs.parent {
        Some(Parent::Button) => {
            quote! { ::compass::framework::template::render_button(component, custom_id) }
        }
        Some(Parent::StringSelect) => {
            quote! { ::compass::framework::template::render_string_select(component, custom_id) }
        }
        Some(Parent::Component(path)) => {
            quote! { <#path as ::compass::framework::ComponentFields>::render(component, custom_id) }
        }
        // Rejected in `derive_component`.
        None => quote! { ::core::unreachable!() },
    }
}
