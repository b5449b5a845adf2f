/// Returns the number of chars in a utf-8 string
pub fn unicode_len(s: &str) -> usize {
    s.chars().count()
}

/// Returns the case-normalized form of a string, as used for index keys
pub fn unicode_upper(s: &str) -> String {
    s.to_uppercase()
}

/// Compares two strings ignoring case, using the same normalization as the indexes
pub fn unicode_eq_ignore_case(a: &str, b: &str) -> bool {
    //Fast path for the common ASCII case, which doesn't need to allocate
    if a.is_ascii() && b.is_ascii() {
        return a.eq_ignore_ascii_case(b);
    }
    unicode_upper(a) == unicode_upper(b)
}

/// Compares two chars ignoring case
pub fn unicode_char_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_uppercase().eq(b.to_uppercase())
}
