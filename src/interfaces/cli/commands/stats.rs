use colored::Colorize;

use crate::api::AppState;
use crate::interfaces::cli::CliError;
use crate::storage::AdminStats;

/// 金额以最小货币单位存储，展示时按两位小数
fn format_amount(minor: i64, currency: &str) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{}{}.{:02} {}", sign, abs / 100, abs % 100, currency)
}

fn render(stats: &AdminStats, currency: &str) -> Vec<(&'static str, String)> {
    vec![
        ("Users", stats.users.to_string()),
        ("Active tasks", stats.active_tasks.to_string()),
        ("Pending surveys", stats.pending_surveys.to_string()),
        ("Approved surveys", stats.approved_surveys.to_string()),
        ("Pending KYC", stats.pending_kyc.to_string()),
        ("Pending withdrawals", stats.pending_withdrawals.to_string()),
        ("Total credited", format_amount(stats.total_credited, currency)),
        ("Total withdrawn", format_amount(stats.total_withdrawn, currency)),
    ]
}

pub async fn print_stats(state: &AppState) -> Result<(), CliError> {
    let stats = state.storage.admin_stats().await?;
    let currency = state.wallet.currency();

    println!("{}", "RewardHub statistics".cyan().bold());
    for (label, value) in render(&stats, currency) {
        println!("  {:<22} {}", format!("{}:", label).yellow(), value.white());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0, "USD"), "0.00 USD");
        assert_eq!(format_amount(1234, "USD"), "12.34 USD");
        assert_eq!(format_amount(-5, "EUR"), "-0.05 EUR");
    }
}
