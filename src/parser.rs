//! Extraction of the result payload from a SOAP response.
//!
//! Uses quick-xml which does not expand custom entities. Documents carrying a
//! DOCTYPE are rejected like any other unparseable input, as are malformed or
//! duplicate attributes and undeclared namespace prefixes.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

/// Element local-name suffix that marks a result element.
const RESULT_SUFFIX: &str = "result";

/// Fallback element local name used by RPC-style services.
const RETURN_ELEMENT: &str = "return";

/// Text capture for the first element matching a rule.
#[derive(Debug, Default)]
struct Capture {
    /// Depth at which the matched element was opened
    depth: Option<usize>,
    /// Still inside the matched element
    open: bool,
    text: String,
}

impl Capture {
    fn found(&self) -> bool {
        self.depth.is_some()
    }

    fn start(&mut self, depth: usize) {
        self.depth = Some(depth);
        self.open = true;
    }

    fn push(&mut self, text: &str) {
        if self.open {
            self.text.push_str(text);
        }
    }

    fn end(&mut self, depth: usize) {
        if self.open && self.depth == Some(depth) {
            self.open = false;
        }
    }
}

/// Extract the payload text from a raw SOAP response.
///
/// Returns the text content of the first element (document order) whose local
/// name ends with `Result`, else of the first element named `return`, both
/// compared case-insensitively. Blank input yields an empty string. Anything
/// that does not parse as a single well-formed XML document, or that has no
/// matching element, is returned unchanged.
pub fn extract_result_payload(soap_response: &str) -> String {
    if soap_response.trim().is_empty() {
        return String::new();
    }

    match scan(soap_response) {
        Some((result, ret)) => {
            if result.found() {
                result.text
            } else if ret.found() {
                ret.text
            } else {
                soap_response.to_string()
            }
        }
        None => soap_response.to_string(),
    }
}

/// Walk the whole document. `None` means it is not well-formed.
fn scan(xml: &str) -> Option<(Capture, Capture)> {
    let mut reader = NsReader::from_str(xml);

    let mut result = Capture::default();
    let mut ret = Capture::default();
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if depth == 0 {
                    if seen_root {
                        return None;
                    }
                    seen_root = true;
                }
                if !well_formed_element(&reader, e) {
                    return None;
                }
                depth += 1;
                open_element(e, depth, &mut result, &mut ret);
            }
            Ok(Event::Empty(ref e)) => {
                if depth == 0 {
                    if seen_root {
                        return None;
                    }
                    seen_root = true;
                }
                if !well_formed_element(&reader, e) {
                    return None;
                }
                // An empty element matches with empty text.
                open_element(e, depth + 1, &mut result, &mut ret);
                result.end(depth + 1);
                ret.end(depth + 1);
            }
            Ok(Event::End(_)) => {
                result.end(depth);
                ret.end(depth);
                depth = depth.checked_sub(1)?;
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().ok()?;
                if depth == 0 {
                    if !text.trim().is_empty() {
                        return None;
                    }
                    continue;
                }
                result.push(&text);
                ret.push(&text);
            }
            Ok(Event::CData(ref e)) => {
                if depth == 0 {
                    return None;
                }
                let text = std::str::from_utf8(e).ok()?;
                result.push(text);
                ret.push(text);
            }
            Ok(Event::DocType(_)) => return None,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => return None,
        }
    }

    if depth != 0 || !seen_root {
        return None;
    }

    Some((result, ret))
}

/// Attributes parse without duplicates, values unescape, and every prefix in
/// use is declared.
fn well_formed_element(reader: &NsReader<&[u8]>, e: &BytesStart) -> bool {
    if matches!(reader.resolve_element(e.name()).0, ResolveResult::Unknown(_)) {
        return false;
    }

    for attr in e.attributes() {
        let Ok(attr) = attr else {
            return false;
        };
        if attr.unescape_value().is_err() {
            return false;
        }

        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") || key.starts_with(b"xml:") {
            continue;
        }
        if matches!(reader.resolve_attribute(attr.key).0, ResolveResult::Unknown(_)) {
            return false;
        }
    }

    true
}

fn open_element(e: &BytesStart, depth: usize, result: &mut Capture, ret: &mut Capture) {
    let local = e.local_name();
    let Ok(name) = std::str::from_utf8(local.as_ref()) else {
        return;
    };

    if !result.found() && ends_with_ignore_case(name, RESULT_SUFFIX) {
        result.start(depth);
    }
    if !ret.found() && name.eq_ignore_ascii_case(RETURN_ELEMENT) {
        ret.start(depth);
    }
}

fn ends_with_ignore_case(name: &str, suffix: &str) -> bool {
    name.len() >= suffix.len()
        && name
            .get(name.len() - suffix.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
}
