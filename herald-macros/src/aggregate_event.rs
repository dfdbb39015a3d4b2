use proc_macro::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::spanned::Spanned;
use syn::{Ident, Item, LitStr, Result as SynResult, Token, Type, parse_macro_input};

/// `#[aggregate_event(...)]` 宏实现
/// - 读取 `aggregate_id` 字段的类型作为标识类型
/// - `aggregate = "Name"` 必填；`kind = created|changed` 可选
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as AggregateEventConfig);
    let input = parse_macro_input!(item as Item);

    let st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[aggregate_event] only on struct")
                .to_compile_error()
                .into();
        }
    };

    if !st.generics.params.is_empty() {
        return syn::Error::new(
            st.generics.span(),
            "#[aggregate_event] does not support generic structs",
        )
        .to_compile_error()
        .into();
    }

    // 仅支持具名字段，且必须带 aggregate_id
    let fields = match &st.fields {
        syn::Fields::Named(f) => f,
        _ => {
            return syn::Error::new(st.span(), "only supports named-field struct")
                .to_compile_error()
                .into();
        }
    };

    let id_type: Type = match fields.named.iter().find(|f| {
        f.ident
            .as_ref()
            .map(|ident| ident == "aggregate_id")
            .unwrap_or(false)
    }) {
        Some(field) => field.ty.clone(),
        None => {
            return syn::Error::new(
                fields.span(),
                "an `aggregate_id` field is required; its type is used as the aggregate id type",
            )
            .to_compile_error()
            .into();
        }
    };

    let Some(aggregate) = cfg.aggregate else {
        return syn::Error::new(
            proc_macro2::Span::call_site(),
            "missing `aggregate = \"...\"` parameter",
        )
        .to_compile_error()
        .into();
    };

    let name = &st.ident;
    let name_lit = LitStr::new(&name.to_string(), name.span());

    // 风味切面在前、通用聚合切面在后，与分发解析顺序一致
    let (flavour_facet, flavour_marker) = match &cfg.kind {
        Some(kind) if kind.to_string() == "created" => (
            quote! {
                ::herald_messages::Facet::of::<
                    ::herald_messages::AggregateCreatedEvents<#id_type>,
                >(self),
            },
            quote! {
                impl ::herald_messages::AggregateCreatedEvent for #name {}
            },
        ),
        Some(kind) if kind.to_string() == "changed" => (
            quote! {
                ::herald_messages::Facet::of::<
                    ::herald_messages::AggregateChangedEvents<#id_type>,
                >(self),
            },
            quote! {
                impl ::herald_messages::AggregateChangedEvent for #name {}
            },
        ),
        Some(kind) => {
            return syn::Error::new(kind.span(), "`kind` must be `created` or `changed`")
                .to_compile_error()
                .into();
        }
        None => (quote! {}, quote! {}),
    };

    let expanded = quote! {
        #st

        impl ::herald_messages::DomainEvent for #name {
            fn event_type(&self) -> &'static str {
                #name_lit
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn facets(&self) -> ::std::vec::Vec<::herald_messages::Facet<'_>> {
                ::std::vec![
                    #flavour_facet
                    ::herald_messages::Facet::of::<
                        ::herald_messages::AggregateEvents<#id_type>,
                    >(self),
                ]
            }
        }

        impl ::herald_messages::AggregateEvent for #name {
            type Id = #id_type;

            fn aggregate_type(&self) -> &'static str {
                #aggregate
            }

            fn aggregate_id(&self) -> #id_type {
                ::core::clone::Clone::clone(&self.aggregate_id)
            }

            fn clone_event(
                &self,
            ) -> ::std::sync::Arc<dyn ::herald_messages::AggregateEvent<Id = #id_type>> {
                ::std::sync::Arc::new(::core::clone::Clone::clone(self))
            }
        }

        #flavour_marker
    };

    expanded.into()
}

struct AggregateEventConfig {
    aggregate: Option<LitStr>,
    kind: Option<Ident>,
}

impl Parse for AggregateEventConfig {
    fn parse(input: ParseStream) -> SynResult<Self> {
        let mut aggregate = None;
        let mut kind = None;

        while !input.is_empty() {
            let key: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match key.to_string().as_str() {
                "aggregate" => {
                    if aggregate.is_some() {
                        return Err(syn::Error::new(key.span(), "duplicate `aggregate`"));
                    }
                    aggregate = Some(input.parse()?);
                }
                "kind" => {
                    if kind.is_some() {
                        return Err(syn::Error::new(key.span(), "duplicate `kind`"));
                    }
                    kind = Some(input.parse()?);
                }
                other => {
                    return Err(syn::Error::new(
                        key.span(),
                        format!("unknown parameter `{other}`"),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(Self { aggregate, kind })
    }
}
