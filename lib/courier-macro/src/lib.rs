//! Procedural macros for the courier HTTP client.
//!
//! - `#[derive(Parameters)]` - map a struct's fields to query parameters,
//!   for use with `Request::add_object`

mod parameters_derive;

use proc_macro::TokenStream;

/// Derive `ToParameters` for a struct with named fields.
///
/// Each field becomes one `(name, value)` pair rendered with `ToString`,
/// in declaration order:
/// - `Option<T>` fields produce nothing when `None`
/// - `Vec<T>` fields produce one pair per item, or a single joined pair with
///   `#[param(format = "csv" | "ssv" | "tsv" | "pipes")]`
///
/// # Attributes
///
/// - `#[param(rename_all = "camelCase")]` on the struct: `lowercase`,
///   `UPPERCASE`, `camelCase`, `PascalCase`, `snake_case`,
///   `SCREAMING_SNAKE_CASE` or `kebab-case`
/// - `#[param(rename = "name")]`: explicit parameter name
/// - `#[param(with = "path::to::render")]`: render each value with a
///   `fn(&T) -> String` instead of `ToString`. For `Option` and `Vec` fields
///   it is applied to the inner values
/// - `#[param(skip)]`: leave the field out
///
/// # Example
///
/// ```ignore
/// use courier::{Parameters, Request};
///
/// #[derive(Parameters)]
/// #[param(rename_all = "camelCase")]
/// struct Search {
///     query_text: String,          // "queryText"
///     page: Option<u32>,           // omitted when None
///     #[param(format = "csv")]
///     tags: Vec<String>,           // "tags=a,b"
///     #[param(skip)]
///     cache_key: String,
/// }
///
/// let request = Request::get("/search").add_object(&search);
/// ```
#[proc_macro_derive(Parameters, attributes(param))]
pub fn derive_parameters(input: TokenStream) -> TokenStream {
    parameters_derive::expand(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
