const MIN_LINE_LENGTH: usize = 30;

// Navigation, account and form-template phrases that never carry company prose.
const TEMPLATE_PHRASES: [&str; 25] = [
    "home",
    "about us",
    "service",
    "menu",
    "shop",
    "team",
    "cms",
    "blog",
    "portfolio",
    "sign in",
    "sign up",
    "login",
    "password",
    "404",
    "licenses",
    "changelog",
    "privacy",
    "terms",
    "utility",
    "book a meeting",
    "product is not available in this quantity",
    "request a free quote",
    "thank you! your submission has been received",
    "oops! something went wrong",
    "cookie",
];

/// Keep lines that look like prose: trimmed, at least 30 characters, and free
/// of template phrases. Kept lines are joined with `\n`.
pub fn filter_lines<I, S>(lines: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| {
            let line = line.as_ref().trim();
            if line.chars().count() < MIN_LINE_LENGTH || is_template(line) {
                None
            } else {
                Some(line.to_string())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_template(line: &str) -> bool {
    let lower = line.to_lowercase();
    TEMPLATE_PHRASES.iter().any(|phrase| lower.contains(phrase))
}
