use percent_encoding::{percent_encode, AsciiSet, CONTROLS};

/// https://url.spec.whatwg.org/#fragment-percent-encode-set
const FRAGMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`');

/// https://url.spec.whatwg.org/#query-percent-encode-set plus the
/// characters which separate query pairs
const QUERY: &AsciiSet = &FRAGMENT
    .add(b'#')
    .add(b'&')
    .add(b'=')
    .add(b'+')
    .add(b'%')
    .add(b'/')
    .add(b'?')
    .add(b':');

/// `percent_encoding` crate recommends you to create your own set for encoding.
/// Every query value sent to spire.io goes through this function.
pub fn url_encode(data: &[u8]) -> String {
    percent_encode(data, QUERY).to_string()
}
