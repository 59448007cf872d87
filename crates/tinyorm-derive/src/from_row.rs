//! FromRow derive macro implementation

use crate::common::attrs::field_attrs;
use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "FromRow can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "FromRow can only be derived for structs",
            ));
        }
    };

    let mut field_extracts = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        if field_attrs(field)?.skip {
            field_extracts.push(quote! {
                #field_name: ::std::default::Default::default()
            });
        } else {
            let column_name = field_name.unraw().to_string();
            field_extracts.push(quote! {
                #field_name: row.try_get_column(#column_name)?
            });
        }
    }

    Ok(quote! {
        impl #impl_generics tinyorm::FromRow for #name #ty_generics #where_clause {
            fn from_row(row: &tinyorm::tokio_postgres::Row) -> tinyorm::OrmResult<Self> {
                use tinyorm::RowExt;
                Ok(Self {
                    #(#field_extracts),*
                })
            }
        }
    })
}
