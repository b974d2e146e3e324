// src/client/decode.rs

//! Decoding of successful response bodies.

use serde::de::DeserializeOwned;

use crate::models::{FailureReason, Outcome, Page, UpstreamResponse};

/// Decode a successful response body into `D`.
///
/// A body that does not fit `D` is the upstream's fault, so it surfaces as an
/// upstream failure rather than a parse error.
pub fn decode<D: DeserializeOwned>(response: &UpstreamResponse) -> Outcome<D> {
    match serde_json::from_str(&response.body) {
        Ok(value) => Outcome::Success(value),
        Err(e) => {
            log::error!(
                "Error when reading response with body: {}, causing exception: {}",
                response.body,
                e
            );
            Outcome::UpstreamFailure {
                status: Some(response.status),
                reason: FailureReason::MalformedResponse,
            }
        }
    }
}

/// Decode a JSON array body together with the reported total hit count.
pub fn decode_page<D: DeserializeOwned>(response: &UpstreamResponse) -> Outcome<Page<D>> {
    decode::<Vec<D>>(response).map(|items| {
        let total = response.total_count().unwrap_or(items.len());
        Page { items, total }
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::models::TOTAL_COUNT_HEADER;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Unit {
        cristin_unit_id: String,
    }

    #[test]
    fn decodes_valid_body() {
        let response = UpstreamResponse::new(200, r#"{"cristin_unit_id":"185.90.0.0"}"#);
        assert_eq!(
            decode::<Unit>(&response),
            Outcome::Success(Unit {
                cristin_unit_id: "185.90.0.0".into()
            })
        );
    }

    #[test]
    fn malformed_body_is_upstream_failure() {
        let response = UpstreamResponse::new(200, "<html>maintenance</html>");
        assert_eq!(
            decode::<Unit>(&response),
            Outcome::UpstreamFailure {
                status: Some(200),
                reason: FailureReason::MalformedResponse
            }
        );
    }

    #[test]
    fn wrong_shape_is_upstream_failure() {
        let response = UpstreamResponse::new(200, "[]");
        assert!(matches!(
            decode::<Unit>(&response),
            Outcome::UpstreamFailure {
                reason: FailureReason::MalformedResponse,
                ..
            }
        ));
    }

    #[test]
    fn page_total_prefers_header() {
        let response = UpstreamResponse::new(200, r#"[{"cristin_unit_id":"1.0.0.0"}]"#)
            .with_header(TOTAL_COUNT_HEADER, "57");
        let page = decode_page::<Unit>(&response).success().unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 57);

        let response = UpstreamResponse::new(200, "[]");
        let page = decode_page::<Unit>(&response).success().unwrap();
        assert_eq!(page.total, 0);
    }
}
