//! `multipart/related` bodies for metadata-plus-content uploads

use serde::Serialize;

use gd_core::Result;

/// A ready-to-send multipart body and its `Content-Type` header
#[derive(Debug)]
pub struct RelatedBody {
    pub content_type: String,
    pub body: Vec<u8>,
}

impl RelatedBody {
    /// Build a body with JSON `metadata` followed by `content`
    pub fn new<M: Serialize>(metadata: &M, content: &[u8], content_mime: &str) -> Result<Self> {
        let boundary = boundary_for(content);
        let metadata = serde_json::to_vec(metadata)?;

        let mut body = Vec::with_capacity(metadata.len() + content.len() + 256);
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
        body.extend_from_slice(&metadata);
        body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
        body.extend_from_slice(format!("Content-Type: {content_mime}\r\n\r\n").as_bytes());
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Ok(Self {
            content_type: format!("multipart/related; boundary={boundary}"),
            body,
        })
    }
}

/// A boundary that does not occur in `content`
fn boundary_for(content: &[u8]) -> String {
    let mut n = jiff::Timestamp::now().as_nanosecond().unsigned_abs();
    loop {
        let boundary = format!("gd-boundary-{n:x}");
        if !contains(content, boundary.as_bytes()) {
            return boundary;
        }
        n = n.wrapping_add(1);
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
