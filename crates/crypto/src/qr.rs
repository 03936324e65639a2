use crate::CryptoError;
use rand::Rng;

/// Prefix printed in front of the code inside the QR image
pub const QR_PREFIX: &str = "CONGRESS:";
pub const QR_CODE_LEN: usize = 16;

// No 0/O or 1/I so codes can also be typed by hand at the desk.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generate a fresh attendee code
pub fn generate_qr_code() -> String {
    let mut rng = rand::thread_rng();
    (0..QR_CODE_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Content encoded in the attendee's QR image
pub fn encode_qr_payload(code: &str) -> String {
    format!("{}{}", QR_PREFIX, code)
}

/// Extract the attendee code from a scanned payload.
///
/// Accepts `CONGRESS:<code>` or the bare code, case-insensitively and
/// ignoring surrounding whitespace.
pub fn parse_qr_payload(raw: &str) -> Result<String, CryptoError> {
    let upper = raw.trim().to_uppercase();
    let code = upper.strip_prefix(QR_PREFIX).unwrap_or(&upper).trim();

    if code.is_empty() {
        return Err(CryptoError::EmptyQr);
    }
    if let Some(bad) = code
        .chars()
        .find(|c| !c.is_ascii() || !ALPHABET.contains(&(*c as u8)))
    {
        return Err(CryptoError::InvalidQrCharacter(bad));
    }
    if code.len() != QR_CODE_LEN {
        return Err(CryptoError::InvalidQrLength {
            expected: QR_CODE_LEN,
            actual: code.len(),
        });
    }

    Ok(code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_parse() {
        for _ in 0..50 {
            let code = generate_qr_code();
            assert_eq!(code.len(), QR_CODE_LEN);
            assert_eq!(parse_qr_payload(&encode_qr_payload(&code)).unwrap(), code);
        }
    }

    #[test]
    fn test_lenient_input() {
        let code = "ABCDEFGHJKLMNPQR";
        assert_eq!(parse_qr_payload("  congress:abcdefghjklmnpqr \n").unwrap(), code);
        assert_eq!(parse_qr_payload(code).unwrap(), code);
    }

    #[test]
    fn test_rejects_bad_payloads() {
        assert_eq!(parse_qr_payload("   "), Err(CryptoError::EmptyQr));
        assert_eq!(parse_qr_payload("CONGRESS:"), Err(CryptoError::EmptyQr));
        assert_eq!(
            parse_qr_payload("ABC"),
            Err(CryptoError::InvalidQrLength {
                expected: QR_CODE_LEN,
                actual: 3
            })
        );
        assert_eq!(
            parse_qr_payload("ABCDEFGH0KLMNPQR"),
            Err(CryptoError::InvalidQrCharacter('0'))
        );
        assert_eq!(
            parse_qr_payload("'; DROP TABLE users; --"),
            Err(CryptoError::InvalidQrCharacter('\''))
        );
    }
}
