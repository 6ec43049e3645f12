//! Payload body parsing with bounded recovery for malformed responses.
//!
//! The portal has no stable API contract: the gadget endpoint has been
//! observed to wrap its JSON payload in HTML fragments or stray log lines.
//! Strict parsing runs first; on failure exactly one recovery pass parses
//! the substring between the first `{` and the last `}`. A body that parses
//! but lacks the `"data"` key is reported as [`PortalError::MissingDataKey`]
//! rather than being passed along, so a silent redirect to an HTML login
//! page is never mistaken for a payload.

use serde_json::Value;

use crate::error::PortalError;

/// Parses a gadget response body into a raw payload.
///
/// # Errors
///
/// - [`PortalError::Deserialize`] if neither the strict nor the recovery
///   parse produces JSON. The strict parse error is kept as the source.
/// - [`PortalError::MissingDataKey`] if the parsed value has no `"data"`
///   key.
pub(crate) fn parse_payload_body(body: &str, context: &str) -> Result<Value, PortalError> {
    let value = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(strict_err) => {
            let Some(candidate) = braced_substring(body) else {
                return Err(PortalError::Deserialize {
                    context: context.to_owned(),
                    source: strict_err,
                });
            };
            tracing::warn!(context, "strict JSON parse failed, retrying on embedded object");
            serde_json::from_str::<Value>(candidate).map_err(|_| PortalError::Deserialize {
                context: context.to_owned(),
                source: strict_err,
            })?
        }
    };

    if value.get("data").is_some() {
        Ok(value)
    } else {
        Err(PortalError::MissingDataKey {
            context: context.to_owned(),
        })
    }
}

/// The substring spanning the first `{` through the last `}`, if any.
fn braced_substring(body: &str) -> Option<&str> {
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if start < end {
        Some(&body[start..=end])
    } else {
        None
    }
}
