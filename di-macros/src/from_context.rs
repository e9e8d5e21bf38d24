//! `#[derive(FromContext)]`: resolve every field from the context.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

use crate::fields::named_fields;

pub fn derive_from_context_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let context_type = context_type(&input);

    let fields = match named_fields(&input, "FromContext") {
        Ok(fields) => fields,
        Err(err) => return err.to_compile_error().into(),
    };

    let inits = fields.iter().filter_map(|field| {
        let ident = field.ident.as_ref()?;
        let ty = &field.ty;
        Some(quote! {
            #ident: <#ty as crate::FromRef<#context_type>>::from_ref(ctx)
        })
    });

    TokenStream::from(quote! {
        impl #impl_generics crate::FromRef<#context_type> for #name #ty_generics #where_clause {
            fn from_ref(ctx: &#context_type) -> Self {
                Self {
                    #(#inits),*
                }
            }
        }
    })
}

/// Reads `#[from_context(Context = "Path")]`, defaulting to `Context`.
fn context_type(input: &DeriveInput) -> proc_macro2::TokenStream {
    let mut found: Option<syn::Type> = None;

    for attr in input.attrs.iter().filter(|a| a.path().is_ident("from_context")) {
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("Context") {
                let value: syn::LitStr = meta.value()?.parse()?;
                found = Some(value.parse()?);
            }
            Ok(())
        });
    }

    match found {
        Some(ty) => quote! { #ty },
        None => quote! { Context },
    }
}
