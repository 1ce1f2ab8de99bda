//! Procedural macros for Strawberry.
//!
//! # Example
//!
//! ```ignore
//! use strawberry::GraphQLEnum;
//!
//! /// Ice cream flavours.
//! #[derive(GraphQLEnum)]
//! #[graphql(name = "Flavour")]
//! enum IceCreamFlavour {
//!     Vanilla,
//!     #[graphql(name = "STRAWBERRY", description = "Our favourite")]
//!     Strawberry,
//!     #[graphql(deprecation_reason = "Discontinued")]
//!     Chocolate,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, LitStr, Path};

/// Derive macro for GraphQL enums.
///
/// Implements `GraphQLEnum`, leaving the type itself untouched. Values are
/// named in SCREAMING_SNAKE_CASE unless renamed. Doc comments serve as
/// descriptions when no `description` is given.
///
/// Enum attributes: `name`, `description`, and `crate` (path of the crate
/// exporting `GraphQLEnum`, `::strawberry` by default).
/// Variant attributes: `name`, `description`, `deprecation_reason`.
#[proc_macro_derive(GraphQLEnum, attributes(graphql))]
pub fn derive_graphql_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_graphql_enum(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Default)]
struct GraphQLAttrs {
    name: Option<String>,
    description: Option<String>,
    deprecation_reason: Option<String>,
    krate: Option<Path>,
}

fn parse_graphql_attrs(attrs: &[Attribute], on_variant: bool) -> syn::Result<GraphQLAttrs> {
    let mut parsed = GraphQLAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("graphql") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                parsed.name = Some(value.value());
            } else if meta.path.is_ident("description") {
                let value: LitStr = meta.value()?.parse()?;
                parsed.description = Some(value.value());
            } else if on_variant && meta.path.is_ident("deprecation_reason") {
                let value: LitStr = meta.value()?.parse()?;
                parsed.deprecation_reason = Some(value.value());
            } else if !on_variant && meta.path.is_ident("crate") {
                let value: LitStr = meta.value()?.parse()?;
                parsed.krate = Some(value.parse()?);
            } else {
                return Err(meta.error("unsupported graphql attribute"));
            }
            Ok(())
        })?;
    }
    Ok(parsed)
}

/// Joins `///` lines into a description.
fn doc_comment(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(meta) => match &meta.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(text),
                    ..
                }) => Some(text.value().trim().to_string()),
                _ => None,
            },
            _ => None,
        })
        .collect();
    let joined = lines.join("\n").trim().to_string();
    (!joined.is_empty()).then_some(joined)
}

fn expand_graphql_enum(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "GraphQLEnum can only be derived for enums",
        ));
    };

    let attrs = parse_graphql_attrs(&input.attrs, false)?;
    let krate = attrs
        .krate
        .map_or_else(|| quote! { ::strawberry }, |path| quote! { #path });
    let ident = &input.ident;
    let name = attrs.name.unwrap_or_else(|| ident.to_string());
    let description = option_tokens(attrs.description.or_else(|| doc_comment(&input.attrs)));

    let mut variants = Vec::new();
    let mut value_names = Vec::new();
    let mut value_defs = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "GraphQLEnum variants cannot carry data",
            ));
        }
        let variant_attrs = parse_graphql_attrs(&variant.attrs, true)?;
        let value_name = variant_attrs
            .name
            .unwrap_or_else(|| screaming_snake_case(&variant.ident.to_string()));
        if value_names.contains(&value_name) {
            return Err(syn::Error::new_spanned(
                variant,
                format!("duplicate GraphQL enum value '{value_name}'"),
            ));
        }

        let mut value_def = quote! { #krate::EnumValueDef::new(#value_name) };
        if let Some(description) = variant_attrs
            .description
            .or_else(|| doc_comment(&variant.attrs))
        {
            value_def = quote! { #value_def.description(#description) };
        }
        if let Some(reason) = variant_attrs.deprecation_reason {
            value_def = quote! { #value_def.deprecation_reason(#reason) };
        }

        variants.push(&variant.ident);
        value_names.push(value_name);
        value_defs.push(value_def);
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics #krate::GraphQLEnum for #ident #ty_generics #where_clause {
            const NAME: &'static str = #name;
            const DESCRIPTION: ::core::option::Option<&'static str> = #description;

            fn values() -> ::std::vec::Vec<#krate::EnumValueDef> {
                ::std::vec![#(#value_defs),*]
            }

            fn value_name(&self) -> &'static str {
                match *self {
                    #(Self::#variants => #value_names,)*
                }
            }

            fn from_value_name(name: &str) -> ::core::option::Option<Self> {
                match name {
                    #(#value_names => ::core::option::Option::Some(Self::#variants),)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    })
}

fn option_tokens(value: Option<String>) -> TokenStream2 {
    match value {
        Some(value) => quote! { ::core::option::Option::Some(#value) },
        None => quote! { ::core::option::Option::None },
    }
}

/// `ScienceFiction` -> `SCIENCE_FICTION`, `HTTPError` -> `HTTP_ERROR`.
fn screaming_snake_case(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|next| next.is_lowercase());
            if prev != '_'
                && (prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_uppercase() && next_is_lower))
            {
                out.push('_');
            }
        }
        out.extend(c.to_uppercase());
    }
    out
}
