//! Mimetype detection for uploads

const OCTET_STREAM: &str = "application/octet-stream";
const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

/// Pick the mimetype recorded for an upload.
///
/// The client's declared type wins unless it is missing or the generic
/// `application/octet-stream`; then the content is sniffed, and finally
/// valid UTF-8 is taken as plain text.
pub fn detect_mimetype(declared: Option<&str>, content: &[u8]) -> String {
    if let Some(declared) = declared.map(str::trim) {
        if !declared.is_empty() && !essence(declared).eq_ignore_ascii_case(OCTET_STREAM) {
            return declared.to_string();
        }
    }

    if let Some(kind) = infer::get(content) {
        return kind.mime_type().to_string();
    }

    if std::str::from_utf8(content).is_ok() {
        return PLAIN_TEXT.to_string();
    }

    OCTET_STREAM.to_string()
}

/// Whether bytes of this type can be shown as plain text
pub fn is_textual(mimetype: &str) -> bool {
    let essence = essence(mimetype).to_ascii_lowercase();
    essence.starts_with("text/")
        || essence.ends_with("+json")
        || essence.ends_with("+xml")
        || matches!(
            essence.as_str(),
            "application/json"
                | "application/xml"
                | "application/javascript"
                | "application/x-javascript"
                | "application/ecmascript"
                | "application/x-sh"
                | "application/x-shellscript"
                | "application/x-yaml"
                | "application/yaml"
                | "application/toml"
                | "application/sql"
                | "application/x-httpd-php"
        )
}

/// `type/subtype` without parameters
fn essence(mimetype: &str) -> &str {
    mimetype.split(';').next().unwrap_or(mimetype).trim()
}
