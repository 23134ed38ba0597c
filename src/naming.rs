//! Identifier case conversion and unique-name allocation.

use std::collections::HashSet;

/// Convert an identifier to snake_case.
///
/// Runs of capitals are treated as acronyms, so `HTTPServer` becomes
/// `http_server` and `UserID` becomes `user_id`. Dashes and spaces become
/// underscores.
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::new();

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                // End of an acronym: `HTTPServer` splits before the `S`.
                Some(p) if p.is_uppercase() => next.is_some_and(char::is_lowercase),
                _ => false,
            };
            if boundary && !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else if ch == '-' || ch == ' ' {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Convert `user_profile` (or `user-profile`) to `UserProfile`.
///
/// Existing capitals are kept, so `UserProfile` is unchanged.
pub fn to_camel_case(s: &str) -> String {
    s.split(['_', '-', ' '])
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Return `name` if unused, otherwise the first free `name_N` with N counting from 1.
pub fn unique_name(seen: &mut HashSet<String>, name: &str) -> String {
    if seen.insert(name.to_string()) {
        return name.to_string();
    }
    let mut counter = 1;
    loop {
        let candidate = format!("{name}_{counter}");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}
