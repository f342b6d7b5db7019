//! Human-readable labels from tag names

use crate::schema::local_name;

/// `orderDate` → `Order Date`, `ship_to` → `Ship to`, `ns:XMLFeed` → `XML Feed`
pub fn humanize(tag: &str) -> String {
    let chars: Vec<char> = local_name(tag).chars().collect();
    let mut words = String::with_capacity(chars.len() + 4);

    for (i, &ch) in chars.iter().enumerate() {
        if matches!(ch, '_' | '-' | '.') {
            if !words.ends_with(' ') && !words.is_empty() {
                words.push(' ');
            }
            continue;
        }
        let prev = i.checked_sub(1).and_then(|p| chars.get(p)).copied();
        let next = chars.get(i + 1).copied();
        let boundary = ch.is_uppercase()
            && match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                // last capital of an acronym starts the next word: XMLFeed
                Some(p) if p.is_uppercase() => next.is_some_and(char::is_lowercase),
                _ => false,
            };
        if boundary && !words.ends_with(' ') && !words.is_empty() {
            words.push(' ');
        }
        words.push(ch);
    }

    let words = words.trim();
    let mut out = String::with_capacity(words.len());
    let mut chars = words.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.push_str(chars.as_str());
    }
    out
}
