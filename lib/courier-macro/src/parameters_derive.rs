//! `#[derive(Parameters)]` implementation.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, GenericArgument, PathArguments, Type, parse2};

/// Case conversion applied by `#[param(rename_all = "...")]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenameRule {
    LowerCase,
    UpperCase,
    CamelCase,
    PascalCase,
    SnakeCase,
    ScreamingSnakeCase,
    KebabCase,
}

impl RenameRule {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "lowercase" => Some(Self::LowerCase),
            "UPPERCASE" => Some(Self::UpperCase),
            "camelCase" => Some(Self::CamelCase),
            "PascalCase" => Some(Self::PascalCase),
            "snake_case" => Some(Self::SnakeCase),
            "SCREAMING_SNAKE_CASE" => Some(Self::ScreamingSnakeCase),
            "kebab-case" => Some(Self::KebabCase),
            _ => None,
        }
    }

    /// Field identifiers are already `snake_case`.
    fn apply(self, field: &str) -> String {
        match self {
            Self::LowerCase | Self::SnakeCase => field.to_string(),
            Self::UpperCase | Self::ScreamingSnakeCase => field.to_uppercase(),
            Self::CamelCase => {
                let pascal = Self::PascalCase.apply(field);
                let mut chars = pascal.chars();
                chars
                    .next()
                    .map(|first| first.to_lowercase().chain(chars).collect())
                    .unwrap_or_default()
            }
            Self::PascalCase => field
                .split('_')
                .filter(|word| !word.is_empty())
                .map(|word| {
                    let mut chars = word.chars();
                    chars
                        .next()
                        .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                        .unwrap_or_default()
                })
                .collect(),
            Self::KebabCase => field.replace('_', "-"),
        }
    }
}

/// How a `Vec<T>` field is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum CollectionFormat {
    /// One pair per item: `tag=a&tag=b`.
    #[default]
    Multi,
    /// Joined with a separator into one pair: `tag=a,b`.
    Joined(char),
}

impl CollectionFormat {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "multi" => Some(Self::Multi),
            "csv" => Some(Self::Joined(',')),
            "ssv" => Some(Self::Joined(' ')),
            "tsv" => Some(Self::Joined('\t')),
            "pipes" => Some(Self::Joined('|')),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct ContainerOptions {
    rename_all: Option<RenameRule>,
}

#[derive(Debug, Default)]
struct FieldOptions {
    rename: Option<String>,
    format: Option<CollectionFormat>,
    /// Renders each value as `fn(&T) -> String`.
    with: Option<syn::Path>,
    skip: bool,
}

/// Expand `#[derive(Parameters)]`.
pub fn expand(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = parse2(input)?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let container = parse_container_options(&input.attrs)?;

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Parameters can only be derived for structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Parameters can only be derived for structs with named fields",
        ));
    };

    let mut pushes = Vec::new();
    for field in &fields.named {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let options = parse_field_options(&field.attrs)?;
        if options.skip {
            continue;
        }

        let field_name = ident.to_string();
        let field_name = field_name.trim_start_matches("r#");
        let key = match (&options.rename, container.rename_all) {
            (Some(rename), _) => rename.clone(),
            (None, Some(rule)) => rule.apply(field_name),
            (None, None) => field_name.to_string(),
        };

        if options.format.is_some() && collection_item(&field.ty).is_none() {
            let is_optional_vec = option_inner(&field.ty).and_then(collection_item).is_some();
            if !is_optional_vec {
                return Err(syn::Error::new_spanned(
                    &field.ty,
                    "`format` only applies to `Vec<T>` fields",
                ));
            }
        }

        let value = quote! { &self.#ident };
        pushes.push(push_value(
            &value,
            &field.ty,
            &key,
            options.format.unwrap_or_default(),
            options.with.as_ref(),
        ));
    }

    Ok(quote! {
        impl #impl_generics ::courier::ToParameters for #name #ty_generics #where_clause {
            fn to_parameters(&self) -> ::std::vec::Vec<(::std::string::String, ::std::string::String)> {
                let mut pairs = ::std::vec::Vec::new();
                #(#pushes)*
                pairs
            }
        }
    })
}

/// Code pushing the pairs for `value`, a reference to a value of type `ty`.
fn push_value(
    value: &TokenStream,
    ty: &Type,
    key: &str,
    format: CollectionFormat,
    with: Option<&syn::Path>,
) -> TokenStream {
    if let Some(inner) = option_inner(ty) {
        let nested = push_value(&quote! { value }, inner, key, format, with);
        return quote! {
            if let ::std::option::Option::Some(value) = #value {
                #nested
            }
        };
    }

    if collection_item(ty).is_some() {
        let item = render(&quote! { item }, with);
        return match format {
            CollectionFormat::Multi => quote! {
                for item in #value {
                    pairs.push((#key.to_string(), #item));
                }
            },
            CollectionFormat::Joined(separator) => {
                let separator = separator.to_string();
                quote! {
                    let values = #value;
                    if !values.is_empty() {
                        let joined = values
                            .iter()
                            .map(|item| #item)
                            .collect::<::std::vec::Vec<_>>()
                            .join(#separator);
                        pairs.push((#key.to_string(), joined));
                    }
                }
            }
        };
    }

    let rendered = render(value, with);
    quote! {
        pairs.push((#key.to_string(), #rendered));
    }
}

/// Expression rendering `value` (a `&T`) as a `String`.
fn render(value: &TokenStream, with: Option<&syn::Path>) -> TokenStream {
    match with {
        Some(path) => quote! { #path(#value) },
        None => quote! { ::std::string::ToString::to_string(#value) },
    }
}

fn parse_container_options(attrs: &[Attribute]) -> syn::Result<ContainerOptions> {
    let mut options = ContainerOptions::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("param")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                let value: syn::LitStr = meta.value()?.parse()?;
                let rule = RenameRule::parse(&value.value()).ok_or_else(|| {
                    syn::Error::new_spanned(
                        &value,
                        "expected one of: lowercase, UPPERCASE, camelCase, PascalCase, \
                         snake_case, SCREAMING_SNAKE_CASE, kebab-case",
                    )
                })?;
                options.rename_all = Some(rule);
                Ok(())
            } else {
                Err(meta.error("unknown container attribute, expected `rename_all`"))
            }
        })?;
    }
    Ok(options)
}

fn parse_field_options(attrs: &[Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("param")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                options.skip = true;
            } else if meta.path.is_ident("rename") {
                let value: syn::LitStr = meta.value()?.parse()?;
                options.rename = Some(value.value());
            } else if meta.path.is_ident("format") {
                let value: syn::LitStr = meta.value()?.parse()?;
                let format = CollectionFormat::parse(&value.value()).ok_or_else(|| {
                    syn::Error::new_spanned(&value, "expected one of: multi, csv, ssv, tsv, pipes")
                })?;
                options.format = Some(format);
            } else if meta.path.is_ident("with") {
                let value: syn::LitStr = meta.value()?.parse()?;
                options.with = Some(value.parse()?);
            } else {
                return Err(meta.error(
                    "unknown field attribute, expected `rename`, `format`, `with` or `skip`",
                ));
            }
            Ok(())
        })?;
    }
    Ok(options)
}

/// `T` for `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    generic_argument(ty, "Option")
}

/// `T` for `Vec<T>`.
fn collection_item(ty: &Type) -> Option<&Type> {
    generic_argument(ty, "Vec")
}

fn generic_argument<'t>(ty: &'t Type, wrapper: &str) -> Option<&'t Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use quote::quote;

    use super::*;

    #[test]
    fn rename_rules() {
        check!(RenameRule::CamelCase.apply("page_size") == "pageSize");
        check!(RenameRule::PascalCase.apply("page_size") == "PageSize");
        check!(RenameRule::KebabCase.apply("page_size") == "page-size");
        check!(RenameRule::ScreamingSnakeCase.apply("page_size") == "PAGE_SIZE");
        check!(RenameRule::LowerCase.apply("page_size") == "page_size");
        check!(RenameRule::UpperCase.apply("page_size") == "PAGE_SIZE");
        check!(RenameRule::CamelCase.apply("q") == "q");
    }

    #[test]
    fn collection_formats() {
        check!(CollectionFormat::parse("csv") == Some(CollectionFormat::Joined(',')));
        check!(CollectionFormat::parse("multi") == Some(CollectionFormat::Multi));
        check!(CollectionFormat::parse("json").is_none());
    }

    #[test]
    fn detects_wrappers() {
        let ty: Type = syn::parse_quote!(Option<Vec<String>>);
        let_assert!(Some(inner) = option_inner(&ty));
        check!(collection_item(inner).is_some());
        check!(collection_item(&ty).is_none());
    }

    #[test]
    fn generates_impl_for_struct() {
        let tokens = expand(quote! {
            #[param(rename_all = "camelCase")]
            struct Search {
                page_size: u32,
                #[param(rename = "q")]
                text: Option<String>,
                #[param(skip)]
                internal: bool,
            }
        })
        .expect("expand")
        .to_string();

        check!(tokens.contains(":: courier :: ToParameters for Search"));
        check!(tokens.contains("\"pageSize\""));
        check!(tokens.contains("\"q\""));
        check!(!tokens.contains("internal"));
    }

    #[test]
    fn with_calls_the_render_function() {
        let tokens = expand(quote! {
            struct Window {
                #[param(with = "fmt::day")]
                from: Date,
                #[param(with = "fmt::day", format = "csv")]
                days: Vec<Date>,
            }
        })
        .expect("expand")
        .to_string();

        check!(tokens.contains("fmt :: day (& self . from)"));
        check!(tokens.contains("fmt :: day (item)"));
        check!(!tokens.contains("ToString :: to_string"));
    }

    #[test]
    fn rejects_invalid_with_path() {
        let_assert!(
            Err(err) = expand(quote! {
                struct Bad {
                    #[param(with = "not a path")]
                    id: u32,
                }
            })
        );
        check!(!err.to_string().is_empty());
    }

    #[test]
    fn rejects_enums() {
        let_assert!(Err(err) = expand(quote! { enum Mode { A, B } }));
        check!(err.to_string().contains("only be derived for structs"));
    }

    #[test]
    fn rejects_format_on_scalar() {
        let_assert!(
            Err(err) = expand(quote! {
                struct Bad {
                    #[param(format = "csv")]
                    id: u32,
                }
            })
        );
        check!(err.to_string().contains("only applies to `Vec<T>`"));
    }

    #[test]
    fn rejects_unknown_attribute() {
        let_assert!(
            Err(err) = expand(quote! {
                struct Bad {
                    #[param(flatten)]
                    inner: u32,
                }
            })
        );
        check!(err.to_string().contains("unknown field attribute"));
    }

    #[test]
    fn rejects_unknown_rename_rule() {
        let_assert!(
            Err(err) = expand(quote! {
                #[param(rename_all = "Train-Case")]
                struct Bad { id: u32 }
            })
        );
        check!(err.to_string().contains("expected one of"));
    }
}
