//! Upload payload construction
//!
//! One report becomes one `<crash>` element inside a `<crashes>` document,
//! sent as the single `xmlstring` part of a `multipart/form-data` body.

use quincy_core::{ContextSnapshot, ParsedReport};

/// Multipart boundary expected by the collection server.
pub const BOUNDARY: &str = "----FOO";

/// Name of the form field carrying the XML document.
pub const FORM_FIELD: &str = "xmlstring";

/// Fields of one `<crash>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashPayload {
    pub application_name: String,
    pub bundle_identifier: String,
    pub system_version: String,
    pub platform: String,
    pub sender_version: String,
    pub version: String,
    pub log: String,
    pub user_id: String,
    pub contact: String,
    pub description: String,
}

impl CrashPayload {
    /// Combines a stored report with the current snapshot.
    ///
    /// Package, version, OS and platform are taken from the report header so
    /// a report captured under an older version is delivered with the values
    /// it was captured with. The snapshot fills in anything the header lacks.
    pub fn from_report(report: &ParsedReport, snapshot: &ContextSnapshot) -> Self {
        let header = &report.header;

        let platform = if present(&header.manufacturer).is_some() || present(&header.model).is_some()
        {
            format!(
                "{} {}",
                ContextSnapshot::text(&header.manufacturer),
                ContextSnapshot::text(&header.model)
            )
        } else {
            snapshot.platform()
        };

        Self {
            application_name: ContextSnapshot::text(&snapshot.app_name).to_string(),
            bundle_identifier: pick(&header.package, &snapshot.app_package),
            system_version: pick(&header.os_version, &snapshot.os_version),
            platform,
            sender_version: snapshot.sender_version.clone(),
            version: pick(&header.version, &snapshot.app_version),
            log: report.log.clone(),
            user_id: snapshot.user_id.clone(),
            contact: snapshot.contact.clone(),
            description: report.description.clone(),
        }
    }

    /// Renders the `<crash>…</crash>` element.
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<crash>");
        push_text(&mut xml, "applicationname", &self.application_name);
        push_text(&mut xml, "bundleidentifier", &self.bundle_identifier);
        push_text(&mut xml, "systemversion", &self.system_version);
        push_text(&mut xml, "platform", &self.platform);
        push_text(&mut xml, "senderversion", &self.sender_version);
        push_text(&mut xml, "version", &self.version);
        push_cdata(&mut xml, "log", &self.log);
        push_text(&mut xml, "userid", &self.user_id);
        push_text(&mut xml, "contact", &self.contact);
        push_cdata(&mut xml, "description", &self.description);
        xml.push_str("</crash>");
        xml
    }

    /// Renders the `<crashes>` document holding this crash.
    pub fn to_document(&self) -> String {
        format!("<crashes>{}</crashes>", self.to_xml())
    }
}

/// Value of the `Content-Type` header for [`multipart_body`].
pub fn content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// Wraps `document` as the single `xmlstring` part of a multipart body.
pub fn multipart_body(document: &str) -> String {
    format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{FORM_FIELD}\"\r\n\r\n\
         {document}\r\n--{BOUNDARY}--\r\n"
    )
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn pick(primary: &Option<String>, fallback: &Option<String>) -> String {
    present(primary)
        .unwrap_or_else(|| ContextSnapshot::text(fallback))
        .to_string()
}

fn push_text(xml: &mut String, tag: &str, value: &str) {
    xml.push('<');
    xml.push_str(tag);
    xml.push('>');
    for c in value.chars() {
        match c {
            '&' => xml.push_str("&amp;"),
            '<' => xml.push_str("&lt;"),
            '>' => xml.push_str("&gt;"),
            '"' => xml.push_str("&quot;"),
            '\'' => xml.push_str("&apos;"),
            c => xml.push(c),
        }
    }
    xml.push_str("</");
    xml.push_str(tag);
    xml.push('>');
}

fn push_cdata(xml: &mut String, tag: &str, value: &str) {
    xml.push('<');
    xml.push_str(tag);
    xml.push_str("><![CDATA[");
    // A literal `]]>` would end the section early; split it across two.
    xml.push_str(&value.replace("]]>", "]]]]><![CDATA[>"));
    xml.push_str("]]></");
    xml.push_str(tag);
    xml.push('>');
}
