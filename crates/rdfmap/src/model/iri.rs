//! IRI helpers for subject computation.
//!
//! Relative subjects are minted as `{parent}#{local}` with the local value
//! percent-encoded, and read back by taking the local name of the IRI and
//! decoding it again.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use super::term::Iri;

/// Characters that need percent-encoding in a local value.
/// Alphanumerics plus `-`, `_`, `.`, `~` stay unreserved per RFC 3987.
const LOCAL_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'!')
    .add(b'"')
    .add(b'#')
    .add(b'$')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'(')
    .add(b')')
    .add(b'*')
    .add(b'+')
    .add(b',')
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Escape a value for use as the local part of an IRI.
pub fn escape_local(value: &str) -> String {
    utf8_percent_encode(value, LOCAL_ENCODE_SET).to_string()
}

/// Reverse [`escape_local`]. Invalid UTF-8 sequences are replaced.
pub fn unescape_local(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

/// Index where the local name starts: after the last `#`, else the last `/`,
/// else the last `:`.
fn local_name_index(iri: &str) -> usize {
    iri.rfind('#')
        .or_else(|| iri.rfind('/'))
        .or_else(|| iri.rfind(':'))
        .map(|i| i + 1)
        .unwrap_or(0)
}

/// The local name of an IRI, still in its encoded form.
pub fn local_name(iri: &str) -> &str {
    &iri[local_name_index(iri)..]
}

/// The namespace part of an IRI (everything up to and including the separator).
pub fn namespace(iri: &str) -> &str {
    &iri[..local_name_index(iri)]
}

/// Mint the subject of a relatively identified child: `{parent}#{local}`.
pub fn relative_iri(parent: &Iri, local: &str) -> Iri {
    Iri::from(format!("{}#{}", parent.as_str(), escape_local(local)))
}

/// Local value of a relatively identified subject, decoded.
pub fn relative_local(subject: &Iri) -> String {
    unescape_local(local_name(subject.as_str()))
}
