//! Deterministic redaction masking for safe display without decryption.

/// Mask a sensitive value for display.
///
/// Emails keep structural markers: the local part keeps its first
/// character, every domain label except the TLD keeps its first
/// character (single-character labels pass through), interiors become
/// `***`. Other values keep the first and last character around `***`.
///
/// `user@x.com` → `u***@x.com`, `john@doe.com` → `j***@d***.com`,
/// `Jonathan` → `J***n`.
///
/// The output always contains a masking marker and never round-trips
/// back to the input.
pub fn mask(value: &str) -> String {
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
            format!("{}@{}", mask_local(local), mask_domain(domain))
        }
        _ => mask_plain(value),
    }
}

/// Local part of an email: always masked, even single characters, so
/// the redacted form can never equal the original address.
fn mask_local(local: &str) -> String {
    let mut chars = local.chars();
    match chars.next() {
        Some(first) => format!("{first}***"),
        None => "***".into(),
    }
}

fn mask_domain(domain: &str) -> String {
    let labels: Vec<&str> = domain.split('.').collect();
    let last = labels.len().saturating_sub(1);
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            // TLD and single-character labels stay readable.
            if i == last || label.chars().count() <= 1 {
                (*label).to_string()
            } else {
                let first = label.chars().next().unwrap_or('*');
                format!("{first}***")
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn mask_plain(value: &str) -> String {
    let mut chars = value.chars();
    let first = chars.next();
    let last = chars.next_back();
    match (first, last) {
        (Some(f), Some(l)) if value.chars().count() >= 3 => format!("{f}***{l}"),
        (Some(f), _) => format!("{f}***"),
        (None, _) => "***".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_email_local_and_domain() {
        assert_eq!(mask("john@doe.com"), "j***@d***.com");
    }

    #[test]
    fn single_char_domain_label_passes_through() {
        assert_eq!(mask("user@x.com"), "u***@x.com");
    }

    #[test]
    fn subdomains_each_masked() {
        assert_eq!(mask("amy@mail.corp.example"), "a***@m***.c***.example");
    }

    #[test]
    fn single_char_local_still_masked() {
        assert_eq!(mask("a@x.com"), "a***@x.com");
    }

    #[test]
    fn plain_value_keeps_first_and_last() {
        assert_eq!(mask("Jonathan"), "J***n");
    }

    #[test]
    fn short_plain_value() {
        assert_eq!(mask("Jo"), "J***");
        assert_eq!(mask("J"), "J***");
    }

    #[test]
    fn output_never_equals_input() {
        for input in ["user@x.com", "a@x.com", "Jonathan", "Jo", "J"] {
            let masked = mask(input);
            assert_ne!(masked, input);
            assert!(masked.contains('*'), "no marker in {masked:?}");
        }
    }
}
