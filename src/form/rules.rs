//! Client-side field rules.
//!
//! Advisory only: the server re-validates every submission.

/// Longest login name or personal name the server accepts.
pub const MAX_NAME_LENGTH: usize = 150;

/// Shortest password the server accepts.
pub const MIN_PASSWORD_LENGTH: usize = 8;

pub(crate) fn required(value: &str) -> Option<String> {
    value
        .trim()
        .is_empty()
        .then(|| "This field may not be blank.".to_owned())
}

pub(crate) fn max_length(value: &str, limit: usize) -> Option<String> {
    (value.chars().count() > limit)
        .then(|| format!("Ensure this field has no more than {limit} characters."))
}

pub(crate) fn min_length(value: &str, limit: usize) -> Option<String> {
    (value.chars().count() < limit)
        .then(|| format!("Ensure this field has at least {limit} characters."))
}

pub(crate) fn email(value: &str) -> Option<String> {
    let valid = value
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.ends_with('.'));
    (!valid).then(|| "Enter a valid email address.".to_owned())
}

pub(crate) fn matches(value: &str, expected: &str) -> Option<String> {
    (value != expected).then(|| "Passwords do not match.".to_owned())
}

/// Returns the first failing rule.
pub(crate) fn first(results: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    results.into_iter().flatten().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", true)]
    #[case("   ", true)]
    #[case("alice", false)]
    fn required_rejects_blank(#[case] value: &str, #[case] fails: bool) {
        assert_eq!(required(value).is_some(), fails);
    }

    #[rstest]
    #[case("alice@example.com", false)]
    #[case("alice@example", true)]
    #[case("@example.com", true)]
    #[case("alice@example.", true)]
    #[case("alice", true)]
    fn email_requires_local_part_and_dotted_domain(#[case] value: &str, #[case] fails: bool) {
        assert_eq!(email(value).is_some(), fails);
    }

    #[rstest]
    fn length_rules_count_characters() {
        assert!(max_length("ééé", 3).is_none());
        assert!(max_length("éééé", 3).is_some());
        assert!(min_length("short", MIN_PASSWORD_LENGTH).is_some());
    }

    #[rstest]
    fn first_picks_earliest_failure() {
        assert_eq!(
            first([None, Some("a".to_owned()), Some("b".to_owned())]),
            Some("a".to_owned())
        );
        assert_eq!(first([None, None]), None);
    }
}
