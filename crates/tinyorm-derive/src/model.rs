//! Model derive macro implementation

use crate::common::attrs::{field_attrs, struct_attrs};
use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Model cannot be derived for generic structs",
        ));
    }

    let attrs = struct_attrs(&input)?;
    let table_name = attrs
        .table
        .unwrap_or_else(|| name.unraw().to_string());

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Model can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Model can only be derived for structs",
            ));
        }
    };

    let mut column_defs = Vec::new();
    let mut values = Vec::new();
    for field in fields {
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        let field_attrs = field_attrs(field)?;
        if field_attrs.skip {
            continue;
        }

        let column_name = field_ident.unraw().to_string();
        let field_ty = &field.ty;
        let tag = match field_attrs.tag {
            Some(tag) => quote! { ::std::option::Option::Some(#tag) },
            None => quote! { ::std::option::Option::None },
        };

        column_defs.push(quote! {
            tinyorm::ColumnDef {
                name: #column_name,
                native: <#field_ty as tinyorm::SqlType>::NATIVE,
                tag: #tag,
            }
        });
        values.push(quote! {
            tinyorm::Param::new(::std::clone::Clone::clone(&self.#field_ident))
        });
    }

    let hooks_impl = if attrs.hooks {
        quote! {}
    } else {
        quote! {
            impl tinyorm::Hooks for #name {}
        }
    };

    Ok(quote! {
        impl tinyorm::Model for #name {
            const TABLE: &'static str = #table_name;

            fn columns() -> &'static [tinyorm::ColumnDef] {
                const COLUMNS: &[tinyorm::ColumnDef] = &[
                    #(#column_defs),*
                ];
                COLUMNS
            }

            fn record_values(&self) -> ::std::vec::Vec<tinyorm::Param> {
                ::std::vec![
                    #(#values),*
                ]
            }
        }

        #hooks_impl
    })
}
