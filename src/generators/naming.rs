//! Identifier case conversions.

/// `OrderDetails` -> `order-details`.
pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() && i > 0 {
            out.push('-');
        }
        out.push(ch.to_ascii_lowercase());
    }
    out
}

/// `OrderService` -> `orderService`.
pub fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `CustomerId` or `customer_id` -> `customerId`.
pub fn camel_case(name: &str) -> String {
    let joined: String = name
        .split(|c: char| c == '_' || c == ' ' || c == '-')
        .filter(|part| !part.is_empty())
        .enumerate()
        .map(|(i, part)| if i == 0 { part.to_string() } else { upper_first(part) })
        .collect();
    lower_first(&joined)
}

/// `customerId` -> `Customer Id`.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if i == 0 {
            out.extend(ch.to_uppercase());
        } else {
            if ch.is_ascii_uppercase() {
                out.push(' ');
            }
            out.push(ch);
        }
    }
    out
}

pub(crate) fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
