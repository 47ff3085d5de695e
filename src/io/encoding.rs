//! Form encoding of proxy parameters.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )` is escaped.
const URI_COMPONENT_ENCODING_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Keys with this suffix are private and never sent.
const RESERVED_SUFFIX: &str = "___";

pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT_ENCODING_SET).to_string()
}

/// Encode `fields` as `key=value` pairs joined by `&`.
///
/// Keys ending in `___` are skipped. With `skip_escaping` the keys and values
/// are written as they are.
pub fn encode_values<I, K, V>(fields: I, skip_escaping: bool) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut buf = String::new();
    let mut first = true;
    for (key, value) in fields {
        let (key, value) = (key.as_ref(), value.as_ref());
        if key.ends_with(RESERVED_SUFFIX) {
            continue;
        }
        if !first {
            buf.push('&');
        }
        first = false;
        if skip_escaping {
            buf.push_str(key);
            buf.push('=');
            buf.push_str(value);
        } else {
            buf.push_str(&encode_uri_component(key));
            buf.push('=');
            buf.push_str(&encode_uri_component(value));
        }
    }
    buf
}
