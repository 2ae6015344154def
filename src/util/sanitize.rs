/// Name used when a title sanitizes down to nothing.
pub const FALLBACK_TITLE: &str = "Untitled Ticket";

/// Characters that are illegal in a folder name on at least one common filesystem.
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Turn an arbitrary user-supplied title into a safe folder name component.
///
/// Removes separators, wildcards, quotes and anything outside printable ASCII,
/// then strips `..` sequences and surrounding whitespace. Character removal
/// runs before the `..` pass so that removing a character can never join two
/// dots into a fresh traversal sequence. An empty result becomes
/// [`FALLBACK_TITLE`].
pub fn sanitize(raw: &str) -> String {
    let printable: String = raw
        .chars()
        .filter(|&c| (' '..='~').contains(&c) && !ILLEGAL_CHARS.contains(&c))
        .collect();

    // A run of n dots collapses to n % 2 dots, so one pass leaves no `..`.
    let without_traversal = printable.replace("..", "");

    let trimmed = without_traversal.trim();
    if trimmed.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Folder name for a ticket: `{sanitize(title)}-{id}`.
pub fn folder_key(title: &str, id: &str) -> String {
    format!("{}-{}", sanitize(title), id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn plain_title_unchanged() {
        assert_eq!(sanitize("Fix login bug"), "Fix login bug");
    }

    #[test]
    fn strips_traversal_sequences() {
        assert_eq!(sanitize("Fix ../../login bug"), "Fix login bug");
        assert_eq!(sanitize("..\\..\\etc"), "etc");
        assert_eq!(sanitize("a...b"), "a.b");
    }

    #[test]
    fn strips_illegal_characters() {
        assert_eq!(sanitize(r#"a<b>c:d"e/f\g|h?i*j"#), "abcdefghij");
    }

    #[test]
    fn removal_cannot_create_new_traversal() {
        // `?` sits between two dots; removing it must not leave `..` behind
        assert_eq!(sanitize("a.?.b"), "ab");
        assert_eq!(sanitize("a.\u{1}.b"), "ab");
    }

    #[test]
    fn strips_non_ascii_and_control() {
        assert_eq!(sanitize("café\tnotes\n"), "cafnotes");
        assert_eq!(sanitize("🎉 party"), "party");
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(sanitize("   spaced out   "), "spaced out");
    }

    #[test]
    fn empty_results_fall_back() {
        assert_eq!(sanitize(""), FALLBACK_TITLE);
        assert_eq!(sanitize("   "), FALLBACK_TITLE);
        assert_eq!(sanitize("../.."), FALLBACK_TITLE);
        assert_eq!(sanitize("日本語"), FALLBACK_TITLE);
    }

    #[test]
    fn folder_key_appends_id() {
        assert_eq!(folder_key("Fix login bug", "abc123"), "Fix login bug-abc123");
        assert_eq!(folder_key("", "abc123"), "Untitled Ticket-abc123");
    }

    proptest! {
        #[test]
        fn output_is_never_empty_or_unsafe(raw in any::<String>()) {
            let out = sanitize(&raw);
            prop_assert!(!out.is_empty());
            prop_assert!(!out.contains(".."));
            prop_assert!(!out.contains(ILLEGAL_CHARS));
            prop_assert!(out.chars().all(|c| (' '..='~').contains(&c)));
            prop_assert_eq!(out.trim(), out.as_str());
        }

        #[test]
        fn sanitize_is_idempotent(raw in any::<String>()) {
            let once = sanitize(&raw);
            prop_assert_eq!(sanitize(&once), once);
        }

        #[test]
        fn traversal_heavy_input_is_idempotent(raw in "[a./\\\\?: ]{0,24}") {
            let once = sanitize(&raw);
            prop_assert_eq!(sanitize(&once), once.clone());
            prop_assert!(!once.contains(".."));
        }
    }
}
