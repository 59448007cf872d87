//! Parsing of `#[orm(...)]` attributes.
//!
//! Struct level: `table = "..."`, `hooks`.
//! Field level: `tag = "..."`, `skip`.

use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Attribute, DeriveInput, Result, Token};

/// One comma-separated item inside `#[orm(...)]`.
enum OrmItem {
    Flag(syn::Ident),
    Value(syn::Ident, syn::LitStr),
}

impl Parse for OrmItem {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: syn::Ident = input.parse()?;
        if input.peek(Token![=]) {
            let _: Token![=] = input.parse()?;
            let value: syn::LitStr = input.parse()?;
            Ok(OrmItem::Value(key, value))
        } else {
            Ok(OrmItem::Flag(key))
        }
    }
}

fn orm_items(attrs: &[Attribute]) -> Result<Vec<OrmItem>> {
    let mut items = Vec::new();
    for attr in attrs {
        if attr.path().is_ident("orm") {
            let parsed =
                attr.parse_args_with(Punctuated::<OrmItem, Token![,]>::parse_terminated)?;
            items.extend(parsed);
        }
    }
    Ok(items)
}

/// Struct-level options.
#[derive(Debug, Default)]
pub struct StructAttrs {
    pub table: Option<String>,
    /// The struct implements `Hooks` itself.
    pub hooks: bool,
}

pub fn struct_attrs(input: &DeriveInput) -> Result<StructAttrs> {
    let mut out = StructAttrs::default();
    for item in orm_items(&input.attrs)? {
        match item {
            OrmItem::Value(key, value) if key == "table" => {
                if value.value().is_empty() {
                    return Err(syn::Error::new_spanned(value, "table name must not be empty"));
                }
                out.table = Some(value.value());
            }
            OrmItem::Flag(key) if key == "hooks" => out.hooks = true,
            OrmItem::Flag(key) | OrmItem::Value(key, _) => {
                return Err(syn::Error::new_spanned(
                    &key,
                    format!("unknown struct attribute `{key}`, expected `table` or `hooks`"),
                ));
            }
        }
    }
    Ok(out)
}

/// Field-level options.
#[derive(Debug, Default)]
pub struct FieldAttrs {
    /// Raw constraint text, e.g. `PRIMARY KEY`.
    pub tag: Option<String>,
    pub skip: bool,
}

pub fn field_attrs(field: &syn::Field) -> Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for item in orm_items(&field.attrs)? {
        match item {
            OrmItem::Value(key, value) if key == "tag" => out.tag = Some(value.value()),
            OrmItem::Flag(key) if key == "skip" => out.skip = true,
            OrmItem::Flag(key) | OrmItem::Value(key, _) => {
                return Err(syn::Error::new_spanned(
                    &key,
                    format!("unknown field attribute `{key}`, expected `tag` or `skip`"),
                ));
            }
        }
    }
    if out.skip && out.tag.is_some() {
        return Err(syn::Error::new_spanned(
            field,
            "a skipped field cannot carry a tag",
        ));
    }
    Ok(out)
}
