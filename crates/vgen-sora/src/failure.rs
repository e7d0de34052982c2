//! Mapping of upstream failure-reason codes to user-facing messages.

/// Convert a Sora failure-reason code into a readable message. Unknown
/// codes fall back to a generic upstream-failure form that keeps the raw
/// code visible for diagnosis.
pub fn failure_reason_message(failure_reason: &str) -> String {
    match failure_reason {
        "face_upload_not_allowed" => {
            "Images containing faces are not allowed for safety reasons. \
             Please use an image without a visible face."
                .to_string()
        }
        "content_policy_violation" => {
            "The content of your image or prompt violates the usage policy.".to_string()
        }
        "image_too_large" => "The image is too large. Please use a smaller image.".to_string(),
        "invalid_image_format" => "Invalid image format. Use JPG or PNG.".to_string(),
        "prompt_too_long" => "The prompt is too long. Please shorten it.".to_string(),
        "rate_limit_exceeded" => {
            "Too many requests. Please try again in a few minutes.".to_string()
        }
        "insufficient_quota" => {
            "Insufficient quota. Please check the upstream subscription.".to_string()
        }
        other => format!("Upstream failure: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_reason_gets_remediation_hint() {
        let msg = failure_reason_message("face_upload_not_allowed");
        assert!(msg.contains("without a visible face"));
    }

    #[test]
    fn known_reasons_have_distinct_messages() {
        let reasons = [
            "face_upload_not_allowed",
            "content_policy_violation",
            "image_too_large",
            "invalid_image_format",
            "prompt_too_long",
            "rate_limit_exceeded",
            "insufficient_quota",
        ];
        let messages: Vec<String> = reasons.iter().map(|r| failure_reason_message(r)).collect();
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn unknown_reason_falls_back_to_generic_form() {
        assert_eq!(
            failure_reason_message("mystery_code"),
            "Upstream failure: mystery_code"
        );
    }
}
