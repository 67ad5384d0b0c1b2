use subtle::ConstantTimeEq;

/// Header Telegram sets on webhook calls when a secret token was registered.
pub const SECRET_TOKEN_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Check the webhook secret token in constant time.
///
/// A missing header never matches, not even against an empty secret.
pub fn verify_webhook_secret(expected: &str, provided: Option<&str>) -> bool {
    let Some(provided) = provided else {
        return false;
    };
    if expected.len() != provided.len() {
        return false;
    }
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}
