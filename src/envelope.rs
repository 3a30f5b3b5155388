//! SOAP 1.1 request envelope construction.

use quick_xml::escape::escape;

/// SOAP 1.1 envelope namespace.
pub const SOAP_11_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Build a SOAP 1.1 request envelope.
///
/// The body holds one `<{action} xmlns="{namespace}">` element with a child
/// element per parameter, in the given order. Parameter values are escaped;
/// parameter names and the action are emitted verbatim and must already be
/// valid XML names.
pub fn build_envelope(action: &str, namespace: &str, params: &[(&str, String)]) -> String {
    let inner = params
        .iter()
        .map(|(name, value)| format!("<{name}>{}</{name}>", escape(value.as_str())))
        .collect::<String>();

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
               xmlns:xsd="http://www.w3.org/2001/XMLSchema"
               xmlns:soap="{SOAP_11_NS}">
  <soap:Body>
    <{action} xmlns="{}">
      {inner}
    </{action}>
  </soap:Body>
</soap:Envelope>"#,
        escape(namespace)
    )
}
