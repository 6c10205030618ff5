//! Extension to MIME type lookup, plus base64 data URL encoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Error, Result};

/// Fallback for unknown extensions.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Lowercase extension to MIME type. The first extension listed for a type
/// is the one [`extension_for_mime_type`] returns.
static MIME_TYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("txt", "text/plain"),
    ("php", "text/plain"),
    ("asc", "text/plain"),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("rtf", "text/rtf"),
    ("vcf", "text/x-vCard"),
    ("wml", "text/vnd.wap.wml"),
    ("wmls", "text/vnd.wap.wmlscript"),
    ("xml", "text/xml"),
    ("xsl", "text/xml"),
    ("bmp", "image/bmp"),
    ("gif", "image/gif"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("jpe", "image/jpeg"),
    ("png", "image/png"),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
    ("ico", "image/vnd.microsoft.icon"),
    ("tiff", "image/tiff"),
    ("tif", "image/tiff"),
    ("mpeg", "video/mpeg"),
    ("mpg", "video/mpeg"),
    ("mpe", "video/mpeg"),
    ("mov", "video/quicktime"),
    ("qt", "video/quicktime"),
    ("avi", "video/x-msvideo"),
    ("wmv", "video/x-ms-wmv"),
    ("mp3", "audio/mpeg"),
    ("mp2", "audio/mpeg"),
    ("ram", "audio/x-pn-realaudio"),
    ("rm", "audio/x-pn-realaudio"),
    ("rpm", "audio/x-pn-realaudio-plugin"),
    ("ra", "audio/x-realaudio"),
    ("wav", "audio/x-wav"),
    ("au", "audio/basic"),
    ("snd", "audio/basic"),
    ("mid", "audio/midi"),
    ("midi", "audio/midi"),
    ("m3u", "audio/x-mpegurl"),
    ("zip", "application/zip"),
    ("rar", "application/x-rar-compressed"),
    ("gtar", "application/x-gtar"),
    ("gzip", "application/x-gzip"),
    ("tar", "application/x-tar"),
    ("pdf", "application/pdf"),
    ("json", "application/json"),
    ("doc", "application/msword"),
    ("xls", "application/vnd.ms-excel"),
    ("ppt", "application/vnd.ms-powerpoint"),
    ("wbxml", "application/vnd.wap.wbxml"),
    ("wmlc", "application/vnd.wap.wmlc"),
    ("wmlsc", "application/vnd.wap.wmlscriptc"),
    ("dvi", "application/x-dvi"),
    ("spl", "application/x-futuresplash"),
    ("js", "application/x-javascript"),
    ("swf", "application/x-shockwave-flash"),
    ("xhtml", "application/xhtml+xml"),
    ("bin", DEFAULT_MIME_TYPE),
    ("exe", DEFAULT_MIME_TYPE),
    ("class", DEFAULT_MIME_TYPE),
    ("dll", DEFAULT_MIME_TYPE),
];

/// MIME type for a file extension, case-insensitive.
pub fn mime_type_for_extension(extension: &str) -> &'static str {
    MIME_TYPES
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map_or(DEFAULT_MIME_TYPE, |&(_, mime)| mime)
}

/// Preferred extension for a MIME type, if the table knows it.
pub fn extension_for_mime_type(mime_type: &str) -> Option<&'static str> {
    if mime_type.eq_ignore_ascii_case(DEFAULT_MIME_TYPE) {
        return None;
    }
    MIME_TYPES
        .iter()
        .find(|(_, mime)| mime.eq_ignore_ascii_case(mime_type))
        .map(|&(ext, _)| ext)
}

/// A decoded `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl DataUrl {
    /// Parse `data:<mime>[;params];base64,<payload>`.
    ///
    /// Only base64 payloads are accepted. A missing media type means
    /// `text/plain`.
    pub fn parse(encoded: &str) -> Result<Self> {
        let rest = encoded
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| Error::DataUrl("missing \"data:\" scheme".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| Error::DataUrl("missing ',' before the payload".to_string()))?;

        let mut params = header.split(';');
        let mime_type = match params.next().map(str::trim) {
            Some("") | None => "text/plain".to_string(),
            Some(mime) => mime.to_string(),
        };
        if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(Error::DataUrl("only base64 payloads are supported".to_string()));
        }

        let data = STANDARD
            .decode(payload.trim())
            .map_err(|e| Error::DataUrl(e.to_string()))?;
        Ok(Self { mime_type, data })
    }

    pub fn encode(mime_type: &str, data: &[u8]) -> String {
        format!("data:{};base64,{}", mime_type, STANDARD.encode(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_extensions() {
        assert_eq!(mime_type_for_extension("png"), "image/png");
        assert_eq!(mime_type_for_extension("JPG"), "image/jpeg");
        assert_eq!(mime_type_for_extension("html"), "text/html");
        assert_eq!(mime_type_for_extension("nope"), DEFAULT_MIME_TYPE);
        assert_eq!(mime_type_for_extension(""), DEFAULT_MIME_TYPE);
    }

    #[test]
    fn test_reverse_lookup_prefers_first_extension() {
        assert_eq!(extension_for_mime_type("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for_mime_type("text/plain"), Some("txt"));
        assert_eq!(extension_for_mime_type("application/x-unknown"), None);
        assert_eq!(extension_for_mime_type(DEFAULT_MIME_TYPE), None);
    }

    #[test]
    fn test_parse_data_url() {
        let url = DataUrl::parse("data:text/plain;base64,aGVsbG8=").unwrap();
        assert_eq!(url.mime_type, "text/plain");
        assert_eq!(url.data, b"hello");
    }

    #[test]
    fn test_parse_data_url_with_params_and_no_type() {
        let url = DataUrl::parse("data:image/png;charset=x;base64,AAE=").unwrap();
        assert_eq!(url.mime_type, "image/png");
        assert_eq!(url.data, vec![0, 1]);

        let url = DataUrl::parse("data:;base64,eA==").unwrap();
        assert_eq!(url.mime_type, "text/plain");
    }

    #[test]
    fn test_parse_data_url_errors() {
        assert!(matches!(DataUrl::parse("http://x"), Err(Error::DataUrl(_))));
        assert!(matches!(DataUrl::parse("data:text/plain;base64"), Err(Error::DataUrl(_))));
        assert!(matches!(DataUrl::parse("data:text/plain,hello"), Err(Error::DataUrl(_))));
        assert!(matches!(DataUrl::parse("data:;base64,@@@"), Err(Error::DataUrl(_))));
    }

    #[test]
    fn test_encode() {
        assert_eq!(DataUrl::encode("text/plain", b"hello"), "data:text/plain;base64,aGVsbG8=");
    }
}
