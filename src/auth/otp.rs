use rand::Rng;

/// Generate a 6-digit verification code in 100000..=999999.
///
/// Plain `rand`, not a CSPRNG-derived secret: the code is low-value,
/// time-boxed and single-use.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_six_decimal_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn code_never_starts_with_zero() {
        for _ in 0..100 {
            let value: u32 = generate_code().parse().expect("numeric code");
            assert!((100_000..=999_999).contains(&value));
        }
    }
}
