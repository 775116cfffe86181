//! URI construction from a base URL, a resource template and parameters.

use percent_encoding::{AsciiSet, CONTROLS, NON_ALPHANUMERIC, utf8_percent_encode};
use url::{Position, Url};

use crate::{Error, Parameter, Result};

/// Characters escaped inside a substituted path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b'%');

/// RFC 3986 query component: everything but unreserved characters.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Build the absolute URI for a request.
///
/// - `{name}` tokens in `resource` are replaced by the matching segment
///   parameter (first match wins). A token without a parameter fails with
///   [`Error::MissingSegment`]; segment parameters without a token are ignored.
/// - Exactly one `/` separates the base path from the resource.
/// - Query pairs are appended in order, repeated names kept, values encoded
///   per RFC 3986 (space becomes `%20`).
///
/// # Example
///
/// ```
/// use courier_core::{Parameter, build_uri};
/// use url::Url;
///
/// let base = Url::parse("http://example.com/api/").expect("base");
/// let uri = build_uri(
///     &base,
///     "/users/{id}",
///     &[Parameter::url_segment("id", 42)],
///     &[Parameter::query("q", "a b")],
/// )
/// .expect("uri");
/// assert_eq!(uri.as_str(), "http://example.com/api/users/42?q=a%20b");
/// ```
pub fn build_uri<'p, S, Q>(base: &Url, resource: &str, segments: S, query: Q) -> Result<Url>
where
    S: IntoIterator<Item = &'p Parameter>,
    Q: IntoIterator<Item = &'p Parameter>,
{
    let segments: Vec<&Parameter> = segments.into_iter().collect();
    let path = substitute_segments(resource, &segments)?;

    let mut uri = join(base, &path);

    let mut separator = if uri.contains('?') { '&' } else { '?' };
    for param in query {
        uri.push(separator);
        separator = '&';
        uri.push_str(&encode_component(param.name(), true));
        uri.push('=');
        uri.push_str(&encode_component(param.value(), param.encode()));
    }

    Ok(Url::parse(&uri)?)
}

/// Replace every `{name}` token with its segment value.
fn substitute_segments(resource: &str, segments: &[&Parameter]) -> Result<String> {
    let mut path = String::with_capacity(resource.len());
    let mut rest = resource;

    while let Some((before, after)) = rest.split_once('{') {
        let Some((name, tail)) = after.split_once('}') else {
            break;
        };
        let segment = segments
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| Error::missing_segment(name))?;

        path.push_str(before);
        if segment.encode() {
            path.extend(utf8_percent_encode(segment.value(), PATH_SEGMENT));
        } else {
            path.push_str(segment.value());
        }
        rest = tail;
    }
    path.push_str(rest);

    Ok(path)
}

/// Join base and resource with exactly one `/`.
///
/// A query on the base comes ahead of one carried by the resource. The base
/// fragment is dropped.
fn join(base: &Url, resource: &str) -> String {
    let (path, resource_query) = match resource.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (resource, None),
    };

    let prefix = &base[..Position::AfterPath];
    let mut uri = if path.is_empty() {
        prefix.to_string()
    } else {
        let mut uri = prefix.trim_end_matches('/').to_string();
        uri.push('/');
        uri.push_str(path.trim_start_matches('/'));
        uri
    };

    let queries: Vec<&str> = base
        .query()
        .into_iter()
        .chain(resource_query)
        .filter(|query| !query.is_empty())
        .collect();
    if !queries.is_empty() {
        uri.push('?');
        uri.push_str(&queries.join("&"));
    }
    uri
}

fn encode_component(value: &str, encode: bool) -> String {
    if encode {
        utf8_percent_encode(value, QUERY_COMPONENT).to_string()
    } else {
        value.to_string()
    }
}
