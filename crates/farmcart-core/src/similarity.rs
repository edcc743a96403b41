//! # Name Similarity
//!
//! Decides whether two free-form product names belong to the same fairness
//! category ("Marigold Sapling" and "Marigold Seeds" do, "Marigold" and
//! "Tomato" do not).
//!
//! ## Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  a, b = lowercase(trim(name))                                          │
//! │                                                                         │
//! │  a == b                                              → similar         │
//! │                                                                         │
//! │  first_word(a) == first_word(b)                                        │
//! │      AND both contain a space                        → similar         │
//! │                                                                         │
//! │  one contains the other                                                │
//! │      AND |len(a) - len(b)| <= 10                     → similar         │
//! │                                                                         │
//! │  otherwise                                           → not similar     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first-word rule over-matches on purpose: "Free Item 1" and
//! "Free Item 2" are one category. Do not tighten it without the product
//! owner's sign-off.

/// Largest length difference for the containment rule.
const MAX_CONTAINMENT_LEN_DIFF: usize = 10;

/// Returns true when `name1` and `name2` are the same fairness category.
///
/// Symmetric in its arguments. Lengths are counted in characters.
///
/// ## Example
/// ```rust
/// use farmcart_core::similarity::similar;
///
/// assert!(similar("Marigold Sapling", "Marigold Seeds"));
/// assert!(similar("Apple", "Apple Tree"));
/// assert!(!similar("Marigold", "Tomato"));
/// assert!(!similar("FreeItem1", "FreeItem2"));
/// ```
pub fn similar(name1: &str, name2: &str) -> bool {
    let a = normalize(name1);
    let b = normalize(name2);

    if a == b {
        return true;
    }

    let both_multi_word = a.contains(' ') && b.contains(' ');
    let first_words_match = first_word(&a) == first_word(&b);
    let one_contains_other = a.contains(b.as_str()) || b.contains(a.as_str());
    let len_diff = a.chars().count().abs_diff(b.chars().count());

    (first_words_match && both_multi_word)
        || (one_contains_other && len_diff <= MAX_CONTAINMENT_LEN_DIFF)
}

/// The label used for a name's fairness category in user messages:
/// its normalized first word.
///
/// ```rust
/// use farmcart_core::similarity::fairness_category;
///
/// assert_eq!(fairness_category("  Marigold Sapling"), "marigold");
/// ```
pub fn fairness_category(name: &str) -> String {
    first_word(&normalize(name)).to_string()
}

fn normalize(name: &str) -> String {
    name.to_lowercase().trim().to_string()
}

/// Substring before the first space, or the whole string.
fn first_word(s: &str) -> &str {
    s.split(' ').next().unwrap_or(s)
}
