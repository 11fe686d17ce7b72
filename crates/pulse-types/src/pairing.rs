use rand::Rng;

/// Pairing codes are 8 characters drawn from A-Z and 0-9. There is no
/// ambiguity filtering: 0/O and 1/I can both appear.
pub const CODE_LEN: usize = 8;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// How many leading characters the display grouping takes: `ABC-12345`.
const GROUP_LEN: usize = 3;

/// Generate a random pairing code. Uniqueness is NOT guaranteed here — the
/// store enforces it at insert time, and a collision surfaces as a
/// duplicate-code failure the caller retries with a fresh code.
pub fn generate_pairing_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Display form: first three characters, a dash, then the remainder.
pub fn format_pairing_code(code: &str) -> String {
    if code.len() <= GROUP_LEN {
        return code.to_string();
    }
    format!("{}-{}", &code[..GROUP_LEN], &code[GROUP_LEN..])
}

/// Clean up a user-typed code: strip everything outside the alphabet
/// (dashes, spaces) and uppercase what remains.
pub fn normalize_pairing_code(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

pub fn is_valid_pairing_code(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(|b| ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_eight_chars_from_alphabet() {
        for _ in 0..200 {
            let code = generate_pairing_code();
            assert!(is_valid_pairing_code(&code), "bad code: {code}");
        }
    }

    #[test]
    fn display_groups_three_then_five() {
        assert_eq!(format_pairing_code("ABC12345"), "ABC-12345");
    }

    #[test]
    fn normalize_strips_dashes_and_uppercases() {
        assert_eq!(normalize_pairing_code("abc-12345"), "ABC12345");
        assert_eq!(normalize_pairing_code(" a1 b2-C3d4 "), "A1B2C3D4");
    }

    #[test]
    fn normalized_display_form_validates() {
        let code = generate_pairing_code();
        assert!(is_valid_pairing_code(&normalize_pairing_code(
            &format_pairing_code(&code)
        )));
    }

    #[test]
    fn validation_rejects_wrong_length_and_lowercase() {
        assert!(!is_valid_pairing_code("ABC1234"));
        assert!(!is_valid_pairing_code("ABC123456"));
        assert!(!is_valid_pairing_code("abc12345"));
        assert!(is_valid_pairing_code("A1B2C3D4"));
    }
}
