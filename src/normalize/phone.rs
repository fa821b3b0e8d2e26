/// Canonicalizes a phone number to `+<country code><10 digits>`
///
/// Non-digits are stripped first, then a leading country code or trunk `0`
/// is removed. Anything that does not leave exactly ten national digits is
/// rejected.
///
/// ```
/// use estate_harvest::normalize::normalize_phone;
///
/// for raw in ["08031234567", "2348031234567", "+234 803 123 4567"] {
///     assert_eq!(normalize_phone(raw, "234").as_deref(), Some("+2348031234567"));
/// }
/// ```
pub fn normalize_phone(raw: &str, country_code: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    let national = if digits.len() == country_code.len() + 10 && digits.starts_with(country_code)
    {
        &digits[country_code.len()..]
    } else if digits.len() == 11 && digits.starts_with('0') {
        &digits[1..]
    } else if digits.len() == 10 {
        digits.as_str()
    } else {
        return None;
    };

    Some(format!("+{}{}", country_code, national))
}
