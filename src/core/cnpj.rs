//! CNPJ (Brazilian company registry number) check-digit validation.

const FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Strips punctuation (`.`, `/`, `-`, spaces). Returns `None` when anything
/// other than digits and punctuation is present.
pub fn normalize(input: &str) -> Option<String> {
    let mut out = String::with_capacity(14);
    for ch in input.chars() {
        match ch {
            '0'..='9' => out.push(ch),
            '.' | '/' | '-' | ' ' => {}
            _ => return None,
        }
    }
    Some(out)
}

pub fn is_valid(input: &str) -> bool {
    let Some(digits) = normalize(input) else {
        return false;
    };
    let digits: Vec<u32> = digits.chars().filter_map(|ch| ch.to_digit(10)).collect();
    if digits.len() != 14 {
        return false;
    }
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let first = check_digit(&digits[..12], &FIRST_WEIGHTS);
    let second = check_digit(&digits[..13], &SECOND_WEIGHTS);
    digits[12] == first && digits[13] == second
}

/// Formats 14 digits as `00.000.000/0000-00`.
pub fn format(input: &str) -> Option<String> {
    let digits = normalize(input)?;
    if digits.len() != 14 {
        return None;
    }
    Some(format!(
        "{}.{}.{}/{}-{}",
        &digits[0..2],
        &digits[2..5],
        &digits[5..8],
        &digits[8..12],
        &digits[12..14]
    ))
}

fn check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let rem = sum % 11;
    if rem < 2 { 0 } else { 11 - rem }
}

#[cfg(test)]
mod tests {
    use super::{format, is_valid, normalize};

    #[test]
    fn accepts_known_valid_numbers() {
        assert!(is_valid("11.222.333/0001-81"));
        assert!(is_valid("11222333000181"));
        assert!(is_valid("45.997.418/0001-53"));
    }

    #[test]
    fn rejects_bad_check_digits_and_shapes() {
        assert!(!is_valid("11.222.333/0001-82"));
        assert!(!is_valid("1122233300018"));
        assert!(!is_valid("11.222.333/0001-8a"));
        assert!(!is_valid("00000000000000"));
        assert!(!is_valid(""));
    }

    #[test]
    fn normalize_and_format() {
        assert_eq!(normalize("11.222.333/0001-81").as_deref(), Some("11222333000181"));
        assert_eq!(format("11222333000181").as_deref(), Some("11.222.333/0001-81"));
        assert_eq!(format("123"), None);
    }
}
