use quick_xml::events::Event;
use quick_xml::Reader;

use crate::{Error, Result};

/// One page of a `ListObjectsV2` response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Keys of this page in the order the service returned them.
    pub keys: Vec<String>,
    /// Whether more pages follow.
    pub is_truncated: bool,
    /// Token to request the next page with.
    pub next_continuation_token: Option<String>,
}

/// Scan a `ListBucketResult` document.
///
/// Only `Key`, `IsTruncated` and `NextContinuationToken` are read; every
/// other element is skipped.
pub(crate) fn parse_list_page(xml: &str) -> Result<ListPage> {
    let mut reader = Reader::from_str(xml);

    let mut page = ListPage::default();
    let mut current: Option<Vec<u8>> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                current = Some(e.local_name().as_ref().to_vec());
                text.clear();
            }
            Ok(Event::Text(e)) => {
                if current.is_some() {
                    let s = e.unescape().map_err(|err| {
                        Error::protocol_failure("failed to unescape list response").with_source(err)
                    })?;
                    text.push_str(&s);
                }
            }
            Ok(Event::CData(e)) => {
                if current.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::End(e)) => {
                match e.local_name().as_ref() {
                    b"Key" => page.keys.push(std::mem::take(&mut text)),
                    b"IsTruncated" => page.is_truncated = text.trim() == "true",
                    b"NextContinuationToken" => {
                        let token = std::mem::take(&mut text);
                        if !token.is_empty() {
                            page.next_continuation_token = Some(token);
                        }
                    }
                    _ => {}
                }
                current = None;
                text.clear();
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(Error::protocol_failure(format!(
                    "failed to parse list response at position {}",
                    reader.buffer_position()
                ))
                .with_source(err))
            }
        }
    }

    Ok(page)
}
