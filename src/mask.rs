const HIDDEN: &str = "***";

/// Redacts an e-mail address for logs, records and notifications.
///
/// `alice@example.com` becomes `al***ce@e***.com`. Input without an `@`
/// is fully hidden.
pub fn mask_email(email: &str) -> String {
    let email = email.trim();
    let Some((name, domain)) = email.split_once('@') else {
        return HIDDEN.to_string();
    };

    let name_chars: Vec<char> = name.chars().collect();
    let name_mask = match name_chars.len() {
        0 => HIDDEN.to_string(),
        1 | 2 => format!("{}{}", name_chars[0], HIDDEN),
        n => format!(
            "{}{}{}",
            name_chars[..2].iter().collect::<String>(),
            HIDDEN,
            name_chars[n - 2..].iter().collect::<String>()
        ),
    };

    let (first_label, suffix) = match domain.split_once('.') {
        Some((first, rest)) => (first, format!(".{}", rest)),
        None => (domain, String::new()),
    };
    let domain_head: String = first_label.chars().take(1).collect();

    format!("{}@{}{}{}", name_mask, domain_head, HIDDEN, suffix)
}
