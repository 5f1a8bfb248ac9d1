use alloy::primitives::U256;
use bytesize::ByteSize;
use chrono::DateTime;
use owo_colors::OwoColorize;

/// Renders a raw token `amount` as a decimal string with `decimals` fractional
/// digits.
///
/// The result is the shortest exact representation: trailing zeros of the
/// fraction are dropped, and so is the separator when nothing is left after
/// it. No rounding happens at any point. A missing amount renders as `"0"`.
///
/// The split into integer and fractional part works on the decimal digits of
/// `amount`, which is the same as dividing by `10^decimals` but stays exact
/// for precisions beyond what fits in 256 bits.
pub fn format_amount(amount: Option<U256>, decimals: u8) -> String {
    let Some(amount) = amount else {
        return "0".to_owned();
    };

    let digits = amount.to_string();
    if decimals == 0 {
        return digits;
    }

    let decimals = usize::from(decimals);
    let (integer, fraction) = if digits.len() > decimals {
        let (integer, fraction) = digits.split_at(digits.len() - decimals);
        (integer.to_owned(), fraction.to_owned())
    } else {
        ("0".to_owned(), format!("{digits:0>decimals$}"))
    };

    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        integer
    } else {
        format!("{integer}.{fraction}")
    }
}

/// Unix seconds as `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn format_timestamp(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// `chain`, or `chain.network` for anything but mainnet.
pub fn format_chain(chain: &str, network: &str) -> String {
    if network.is_empty() || network == "mainnet" {
        chain.to_owned()
    } else {
        format!("{chain}.{network}")
    }
}

/// Deployed code above this size is rejected (EIP-170).
const MAX_CODE_SIZE: u64 = 24 * 1024;
/// Init code above this size is rejected (EIP-3860).
const MAX_INIT_CODE_SIZE: u64 = 2 * MAX_CODE_SIZE;

pub fn format_gas(gas: u64) -> String {
    let text = format!("{gas} gas");
    if gas <= 3_000_000 {
        text.bright_green().to_string()
    } else if gas <= 15_000_000 {
        text.yellow().to_string()
    } else {
        text.bright_purple().to_string()
    }
}

/// Pretty-prints an init code size against the deployment limits.
pub fn format_code_size(len: usize) -> String {
    let len = len as u64;
    let text = ByteSize::b(len).to_string();
    if len <= MAX_CODE_SIZE {
        text.bright_green().to_string()
    } else if len <= MAX_INIT_CODE_SIZE {
        text.yellow().to_string()
    } else {
        text.bright_purple().to_string()
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;

    use owo_colors::OwoColorize;

    use super::{format_amount, format_chain, format_code_size, format_timestamp};

    fn amount(value: &str) -> Option<U256> {
        Some(value.parse().unwrap())
    }

    #[test]
    fn formats_whole_and_fractional_amounts() {
        assert_eq!(format_amount(amount("1500000000000000000"), 18), "1.5");
        assert_eq!(format_amount(amount("1000000000000000000"), 18), "1");
        assert_eq!(format_amount(amount("0"), 18), "0");
        assert_eq!(format_amount(amount("123"), 0), "123");
        assert_eq!(format_amount(amount("1230"), 3), "1.23");
    }

    #[test]
    fn pads_small_fractions() {
        assert_eq!(format_amount(amount("1"), 6), "0.000001");
        assert_eq!(format_amount(amount("10"), 6), "0.00001");
        assert_eq!(format_amount(amount("2500000"), 6), "2.5");
    }

    #[test]
    fn formats_missing_amount_as_zero() {
        for decimals in [0, 6, 18, 255] {
            assert_eq!(format_amount(None, decimals), "0");
        }
    }

    #[test]
    fn keeps_precision_beyond_f64() {
        let max = U256::MAX;
        assert_eq!(format_amount(Some(max), 0), max.to_string());
        assert_eq!(
            format_amount(amount("123456789012345678901234567890"), 18),
            "123456789012.34567890123456789"
        );
    }

    #[test]
    fn handles_precisions_wider_than_u256() {
        let formatted = format_amount(amount("5"), 255);
        assert_eq!(formatted, format!("0.{}5", "0".repeat(254)));
        assert_eq!(format_amount(amount("0"), 255), "0");
    }

    #[test]
    fn never_leaves_trailing_zeros_or_bare_separator() {
        let values = ["1", "10", "100", "1000000", "999999999999", "120000000000000000"];
        for value in values {
            for decimals in [1u8, 2, 6, 9, 18, 30] {
                let formatted = format_amount(amount(value), decimals);
                if let Some((_, fraction)) = formatted.split_once('.') {
                    assert!(!fraction.is_empty(), "{formatted}");
                    assert!(!fraction.ends_with('0'), "{formatted}");
                }
            }
        }
    }

    #[test]
    fn reconstructs_raw_amount() {
        let values = ["1", "42", "1500000000000000000", "987654321987654321987"];
        for value in values {
            for decimals in [0u8, 1, 6, 18, 40] {
                let formatted = format_amount(amount(value), decimals);
                let (integer, fraction) = formatted.split_once('.').unwrap_or((&formatted, ""));
                let padded = format!("{fraction:0<width$}", width = usize::from(decimals));
                let raw = format!("{integer}{padded}");
                assert_eq!(raw.parse::<U256>().unwrap(), value.parse::<U256>().unwrap());
            }
        }
    }

    #[test]
    fn formats_timestamps_in_utc() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
        assert_eq!(format_timestamp(1_700_000_000), "2023-11-14 22:13:20");
    }

    #[test]
    fn hides_mainnet_in_chain_label() {
        assert_eq!(format_chain("ethereum", "mainnet"), "ethereum");
        assert_eq!(format_chain("ethereum", ""), "ethereum");
        assert_eq!(format_chain("ethereum", "sepolia"), "ethereum.sepolia");
    }

    #[test]
    fn colors_code_size_by_limit() {
        assert_eq!(format_code_size(100), "100 B".bright_green().to_string());
        assert!(format_code_size(30 * 1024).starts_with("\u{1b}[33m"));
        assert!(format_code_size(64 * 1024).starts_with("\u{1b}[95m"));
    }
}
