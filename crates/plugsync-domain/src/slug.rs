/// Derives the canonical identifier for a plugin name: lowercase, with runs
/// of separator characters collapsed into a single hyphen.
///
/// `"My Plugin_Name"` and `"my-plugin-name"` both yield `my-plugin-name`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let trimmed = name
        .trim_matches(|c| c == ' ' || c == '-')
        .to_lowercase();
    let mut slug = String::with_capacity(trimmed.len());
    let mut pending_separator = false;
    for ch in trimmed.chars() {
        if matches!(ch, '/' | '_' | '|' | '+' | ' ' | '-') {
            pending_separator = !slug.is_empty();
        } else {
            if pending_separator {
                slug.push('-');
                pending_separator = false;
            }
            slug.push(ch);
        }
    }
    slug
}
