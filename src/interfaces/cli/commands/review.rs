//! `survey approve|reject` / `kyc approve|reject`

use colored::Colorize;

use crate::api::AppState;
use crate::api::constants::ADMIN_REVIEWER;
use crate::interfaces::cli::CliError;

pub async fn approve_survey(state: &AppState, id: i64) -> Result<(), CliError> {
    let survey = state.surveys.approve(id, ADMIN_REVIEWER).await?;
    println!(
        "{} Survey {} approved, user {} credited",
        "✓".green().bold(),
        survey.id,
        survey.user_id
    );
    Ok(())
}

pub async fn reject_survey(state: &AppState, id: i64, reason: &str) -> Result<(), CliError> {
    let survey = state.surveys.reject(id, ADMIN_REVIEWER, reason).await?;
    println!("{} Survey {} rejected", "✓".green().bold(), survey.id);
    Ok(())
}

pub async fn approve_kyc(state: &AppState, user_id: i64) -> Result<(), CliError> {
    state.kyc.approve(user_id).await?;
    println!("{} KYC approved for user {}", "✓".green().bold(), user_id);
    Ok(())
}

pub async fn reject_kyc(state: &AppState, user_id: i64, reason: &str) -> Result<(), CliError> {
    state.kyc.reject(user_id, reason).await?;
    println!("{} KYC rejected for user {}", "✓".green().bold(), user_id);
    Ok(())
}
