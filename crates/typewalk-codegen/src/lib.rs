// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, parse_quote, Data, DeriveInput, Fields, LitInt, LitStr};

/// Per-field `#[inspect(...)]` options
#[derive(Default)]
struct FieldAttrs {
    /// Not traversed; keeps its default on construction
    skip: bool,
    /// First schema version carrying the field
    since: Option<u32>,
    /// Name handed to `Inspector::enter_field` instead of the identifier
    rename: Option<LitStr>,
}

/// `#[derive(Inspect)]` macro: generates a record `Inspect` impl
///
/// Fields are traversed in declaration order, each through the handler of
/// its own type. The struct must implement `Default`.
///
/// Field attributes:
/// - `#[inspect(skip)]`: never traversed
/// - `#[inspect(since = N)]`: skipped when the traversal version is below `N`
/// - `#[inspect(rename = "wire_name")]`: name reported to the inspector
///
/// Type parameters are bounded by `Inspect`.
///
/// Example:
/// ```ignore
/// use typewalk::{Inspect, NdArray};
///
/// #[derive(Default, Inspect)]
/// struct Scan {
///     #[inspect(rename = "id")]
///     scan_id: u32,
///     ranges: Option<NdArray<f32, 1>>,
///     #[inspect(since = 2)]
///     intensities: Vec<f32>,
///     #[inspect(skip)]
///     cached_checksum: u64,
/// }
/// ```
#[proc_macro_derive(Inspect, attributes(inspect))]
pub fn derive_inspect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(mut input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(f) => f.named.clone(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Inspect cannot be derived for tuple structs; use named fields",
                ))
            }
            Fields::Unit => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Inspect cannot be derived for unit structs",
                ))
            }
        },
        Data::Enum(_) => {
            return Err(syn::Error::new_spanned(
                &input,
                "Inspect cannot be derived for enums; declare open enums with typewalk::inspect_enum!",
            ))
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                &input,
                "Inspect cannot be derived for unions",
            ))
        }
    };

    let mut field_calls = Vec::new();
    let mut seen = Vec::new();

    for field in &fields {
        let Some(ident) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "Field must have a name"));
        };
        let attrs = parse_field_attrs(field)?;
        if attrs.skip {
            continue;
        }

        let wire_name = attrs
            .rename
            .as_ref()
            .map_or_else(|| ident.to_string(), LitStr::value);
        if seen.contains(&wire_name) {
            return Err(syn::Error::new_spanned(
                field,
                format!("duplicate inspected field name `{wire_name}`"),
            ));
        }
        seen.push(wire_name.clone());

        let accessor = quote! { |record: &mut Self| &mut record.#ident };
        field_calls.push(match attrs.since {
            Some(since) => quote! { .field_since(#wire_name, #since, #accessor) },
            None => quote! { .field(#wire_name, #accessor) },
        });
    }

    for param in input.generics.type_params_mut() {
        param.bounds.push(parse_quote!(::typewalk::Inspect));
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::typewalk::Inspect for #name #ty_generics #where_clause {
            const CATEGORY: ::typewalk::Category = ::typewalk::Category::Record;

            fn build_handler(
                cache: &::typewalk::HandlerCache,
            ) -> ::core::result::Result<::typewalk::TypeHandler<Self>, ::typewalk::BuildError> {
                ::typewalk::RecordBuilder::new(cache)
                    #(#field_calls)*
                    .build()
            }
        }
    })
}

fn parse_field_attrs(field: &syn::Field) -> syn::Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();

    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("inspect")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                attrs.skip = true;
                Ok(())
            } else if meta.path.is_ident("since") {
                let since: LitInt = meta.value()?.parse()?;
                attrs.since = Some(since.base10_parse()?);
                Ok(())
            } else if meta.path.is_ident("rename") {
                attrs.rename = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `skip`, `since = N` or `rename = \"name\"`"))
            }
        })?;
    }

    if attrs.skip && (attrs.since.is_some() || attrs.rename.is_some()) {
        return Err(syn::Error::new_spanned(
            field,
            "`skip` cannot be combined with `since` or `rename`",
        ));
    }
    Ok(attrs)
}
