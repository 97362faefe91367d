//! `#[derive(ParseEnum)]` implementation.
//!
//! Only fieldless enums are accepted. Each variant maps to its discriminant
//! through an `as i64` cast, so explicit and implicit discriminants both work.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, spanned::Spanned};

pub fn derive_parse_enum(input: &DeriveInput) -> syn::Result<TokenStream> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new(
            input.span(),
            "ParseEnum can only be derived for enums",
        ));
    };
    if data.variants.is_empty() {
        return Err(syn::Error::new(
            input.ident.span(),
            "ParseEnum requires at least one variant",
        ));
    }
    if let Some(variant) = data
        .variants
        .iter()
        .find(|v| !matches!(v.fields, Fields::Unit))
    {
        return Err(syn::Error::new(
            variant.span(),
            "ParseEnum variants cannot have fields",
        ));
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let variants: Vec<_> = data.variants.iter().map(|v| &v.ident).collect();

    Ok(quote! {
        impl #impl_generics ::compass::framework::ParseEnum for #ident #ty_generics #where_clause {
            fn discriminant(&self) -> i64 {
                match self {
                    #(Self::#variants => Self::#variants as i64,)*
                }
            }

            fn from_discriminant(value: i64) -> ::core::option::Option<Self> {
                match value {
                    #(v if v == Self::#variants as i64 => ::core::option::Option::Some(Self::#variants),)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl #impl_generics ::compass::framework::Reflect for #ident #ty_generics #where_clause {
            fn field_type() -> ::compass::framework::FieldType {
                ::compass::framework::FieldType::enumeration::<Self>()
            }
        }
    })
}
