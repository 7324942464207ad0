/// Micro-units per whole currency unit.
pub const MICRO_PER_UNIT: u64 = 1_000_000;

/// Convert micro-units to whole currency units for display.
pub fn micro_to_units(micro: u64) -> f64 {
    micro as f64 / MICRO_PER_UNIT as f64
}

/// Convert whole currency units to micro-units.
pub fn units_to_micro(units: f64) -> u64 {
    (units * MICRO_PER_UNIT as f64) as u64
}

/// Truncate a string to a maximum length.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}

/// Format an account address for display (truncated)
pub fn format_address(address: &str) -> String {
    if address.len() <= 12 {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 6..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn micro_conversion_round_trips() {
        assert_eq!(micro_to_units(2_500_000), 2.5);
        assert_eq!(units_to_micro(2.5), 2_500_000);
    }

    #[test]
    fn short_addresses_are_left_alone() {
        assert_eq!(format_address("ABCDEF"), "ABCDEF");
    }

    #[test]
    fn long_addresses_are_truncated() {
        let addr = "AAAAAABBBBBBCCCCCCDDDDDDEEEEEE";
        assert_eq!(format_address(addr), "AAAAAA...EEEEEE");
    }

    #[test]
    fn truncation_appends_ellipsis() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("short", 8), "short");
    }
}
