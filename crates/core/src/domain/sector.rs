/// Canonical sector universe used to judge diversification.
pub const CANONICAL_SECTORS: [&str; 11] = [
    "Technology",
    "Healthcare",
    "Financial Services",
    "Consumer Cyclical",
    "Industrials",
    "Consumer Defensive",
    "Energy",
    "Basic Materials",
    "Real Estate",
    "Utilities",
    "Communication Services",
];

pub fn is_canonical(sector: &str) -> bool {
    CANONICAL_SECTORS.contains(&sector)
}

/// Maps a provider's sector label onto the canonical list where it can.
///
/// Matching is case-insensitive; known provider groupings are folded into
/// their closest canonical sector. Anything else is returned title-cased.
pub fn normalize_sector(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") || trimmed == "-" {
        return None;
    }

    if let Some(found) = CANONICAL_SECTORS
        .iter()
        .find(|s| s.eq_ignore_ascii_case(trimmed))
    {
        return Some(found.to_string());
    }

    let alias = match trimmed.to_ascii_uppercase().as_str() {
        "LIFE SCIENCES" | "HEALTH CARE" => Some("Healthcare"),
        "FINANCE" | "FINANCIALS" | "FINANCIAL" => Some("Financial Services"),
        "TRADE & SERVICES" | "CONSUMER DISCRETIONARY" => Some("Consumer Cyclical"),
        "MANUFACTURING" => Some("Industrials"),
        "CONSUMER STAPLES" => Some("Consumer Defensive"),
        "ENERGY & TRANSPORTATION" => Some("Energy"),
        "MATERIALS" => Some("Basic Materials"),
        "REAL ESTATE & CONSTRUCTION" => Some("Real Estate"),
        "COMMUNICATION" | "TELECOMMUNICATION SERVICES" => Some("Communication Services"),
        _ => None,
    };
    if let Some(name) = alias {
        return Some(name.to_string());
    }

    Some(title_case(trimmed))
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_match_case_insensitively() {
        assert_eq!(normalize_sector("TECHNOLOGY").as_deref(), Some("Technology"));
        assert_eq!(normalize_sector(" real estate ").as_deref(), Some("Real Estate"));
    }

    #[test]
    fn provider_groupings_fold_into_canonical() {
        assert_eq!(normalize_sector("LIFE SCIENCES").as_deref(), Some("Healthcare"));
        assert_eq!(normalize_sector("FINANCE").as_deref(), Some("Financial Services"));
        assert_eq!(normalize_sector("MANUFACTURING").as_deref(), Some("Industrials"));
    }

    #[test]
    fn unknown_labels_are_title_cased_and_blanks_dropped() {
        assert_eq!(normalize_sector("SPACE MINING").as_deref(), Some("Space Mining"));
        assert_eq!(normalize_sector("None"), None);
        assert_eq!(normalize_sector(""), None);
        assert!(!is_canonical("Space Mining"));
    }
}
