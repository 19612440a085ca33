//! SOAP response parsing.
//!
//! Only two things are ever read back: a fault, or the `ItemInfo/Path` of a
//! `CreateCatalogItem` reply. Elements are matched by local name.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::SoapFault;

/// What a response body contained.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SoapResponse {
    pub fault: Option<SoapFault>,
    /// `ItemInfo/Path` when present.
    pub item_path: Option<String>,
}

#[derive(Default)]
struct FaultParts {
    seen: bool,
    fault_code: Option<String>,
    fault_string: Option<String>,
    error_code: Option<String>,
    message: Option<String>,
}

impl FaultParts {
    fn finish(self) -> Option<SoapFault> {
        if !self.seen {
            return None;
        }
        let code = self
            .error_code
            .or(self.fault_code)
            .unwrap_or_else(|| "Fault".to_string());
        let message = self
            .fault_string
            .or(self.message)
            .unwrap_or_default();
        Some(SoapFault { code, message })
    }
}

pub fn parse(body: &str) -> Result<SoapResponse, String> {
    let mut reader = Reader::from_str(body);
    let mut stack: Vec<String> = Vec::new();
    let mut fault = FaultParts::default();
    let mut item_path = None;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "Fault" {
                    fault.seen = true;
                }
                stack.push(name);
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                let in_fault = stack.iter().any(|n| n == "Fault");
                match stack.last().map(String::as_str) {
                    Some("faultcode") if in_fault => fault.fault_code = Some(text.to_string()),
                    Some("faultstring") if in_fault => fault.fault_string = Some(text.to_string()),
                    Some("ErrorCode") if in_fault => fault.error_code = Some(text.to_string()),
                    Some("Message") if in_fault => fault.message = Some(text.to_string()),
                    Some("Path") if stack.iter().any(|n| n == "ItemInfo") => {
                        item_path = Some(text.to_string())
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(SoapResponse {
        fault: fault.finish(),
        item_path,
    })
}
