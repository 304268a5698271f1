/// Human label for a raw `vehicleType` value.
///
/// Accepts namespaced enum-like strings (`VehicleType.comfortXL`) and
/// camel-cased names, and maps known levels to their canonical spelling.
/// Unknown values come back cleaned with the first letter capitalized.
pub fn normalize_vehicle_type_label(raw: &str) -> String {
    if raw.trim().is_empty() {
        return "Standard".to_string();
    }

    let tail = match raw.rfind('.') {
        Some(idx) => &raw[idx + 1..],
        None => raw,
    };

    let cleaned = split_camel_case(tail)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if cleaned.is_empty() {
        return "Standard".to_string();
    }

    match cleaned.to_lowercase().as_str() {
        "standard" => "Standard".to_string(),
        "comfort" => "Comfort".to_string(),
        "comfort xl" => "Comfort XL".to_string(),
        "electric" => "Electric".to_string(),
        "luxury" => "Luxury".to_string(),
        "black luxury" => "Black Luxury".to_string(),
        _ => capitalize_first(&cleaned),
    }
}

/// Space before an uppercase letter that opens a new word. Uppercase runs
/// stay together (`ComfortXL` -> `Comfort XL`, `XLRide` -> `XL Ride`).
fn split_camel_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).map_or(false, |n| n.is_lowercase());
            let starts_word = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if starts_word {
                out.push(' ');
            }
        }
        out.push(c);
    }

    out
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
