use colored::Colorize;

use crate::eligibility::Category;

/// Format a fare with currency and color
pub fn format_price(amount: f64) -> String {
    format!("${:.2}", amount).yellow().to_string()
}

/// Format a distance in kilometers
pub fn format_distance(km: f64) -> String {
    format!("{:.2} km", km)
}

/// Format an optional timestamp in human-readable format
pub fn format_timestamp(timestamp: Option<&chrono::DateTime<chrono::Utc>>) -> String {
    match timestamp {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "-".to_string(),
    }
}

/// Comma-separated category labels
pub fn format_categories(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "-".to_string();
    }
    categories
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_flag(value: bool) -> String {
    if value {
        "yes".green().to_string()
    } else {
        "no".dimmed().to_string()
    }
}

/// Truncate long identifiers for table display
pub fn format_id(id: &str) -> String {
    if id.chars().count() <= 20 {
        id.to_string()
    } else {
        let head: String = id.chars().take(8).collect();
        let tail: String = id.chars().rev().take(8).collect::<Vec<_>>().into_iter().rev().collect();
        format!("{}...{}", head, tail)
    }
}

/// Prompt user for yes/no confirmation
pub fn confirm_action(prompt: &str) -> bool {
    use std::io::{self, Write};

    print!("{} (y/N): ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }

    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Print a formatted table border
pub fn print_table_border(width: usize) {
    println!("{}", "=".repeat(width));
}

/// Print a table row with columns
pub fn print_table_row(columns: &[&str], widths: &[usize]) {
    let mut row = String::new();
    for (col, width) in columns.iter().zip(widths) {
        row.push_str(&format!("{:<width$}  ", col, width = width));
    }
    println!("{}", row.trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_id() {
        assert_eq!(format_id("drv-1"), "drv-1");
        assert_eq!(format_id("abcdefghijklmnopqrstuvwxyz"), "abcdefgh...stuvwxyz");
    }

    #[test]
    fn test_format_categories() {
        assert_eq!(format_categories(&[]), "-");
        assert_eq!(
            format_categories(&[Category::Standard, Category::ComfortXl]),
            "Standard, Comfort XL"
        );
    }

    #[test]
    fn test_format_timestamp_missing() {
        assert_eq!(format_timestamp(None), "-");
    }
}
