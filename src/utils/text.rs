//! Text and sequence helpers

/// Uppercase the first letter of every `split_by`-separated word, joining
/// the words back with `join_by`.
///
/// `capitalize_first_letters("hello-world", "-", " ")` gives `"Hello World"`.
pub fn capitalize_first_letters(value: &str, split_by: &str, join_by: &str) -> String {
    value
        .split(split_by)
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(join_by)
}

/// Every integer from `start` to `end`, inclusive; empty when `end < start`
pub fn generate_array(start: i64, end: i64) -> Vec<i64> {
    (start..=end).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize_first_letters() {
        assert_eq!(capitalize_first_letters("hello world", " ", " "), "Hello World");
        assert_eq!(capitalize_first_letters("hello-world", "-", " "), "Hello World");
        assert_eq!(capitalize_first_letters("hello-world", "-", "-"), "Hello-World");
        assert_eq!(capitalize_first_letters("", " ", " "), "");
        assert_eq!(capitalize_first_letters("élan vital", " ", " "), "Élan Vital");
    }

    #[test]
    fn test_generate_array() {
        assert_eq!(generate_array(5, 9), vec![5, 6, 7, 8, 9]);
        assert_eq!(generate_array(1, 1), vec![1]);
        assert!(generate_array(3, 1).is_empty());
    }
}
