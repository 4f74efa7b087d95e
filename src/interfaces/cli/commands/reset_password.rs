//! `reset-password --email <e>`

use std::io::{self, BufRead, IsTerminal, Write};

use colored::Colorize;

use crate::api::AppState;
use crate::interfaces::cli::CliError;

/// 密码来源：--stdin > --password > 交互输入
fn read_new_password(password: Option<String>, stdin: bool) -> Result<String, CliError> {
    if stdin {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| CliError::InputError(format!("Failed to read from stdin: {}", e)))?;
        return Ok(line.trim_end_matches(['\r', '\n']).to_string());
    }
    if let Some(password) = password {
        return Ok(password);
    }
    prompt_with_confirm()
}

fn prompt_with_confirm() -> Result<String, CliError> {
    if !io::stdin().is_terminal() {
        return Err(CliError::InputError(
            "No password provided. Use --password or --stdin, or run interactively.".to_string(),
        ));
    }

    let read = |label: &str| -> Result<String, CliError> {
        print!("{}", label);
        io::stdout()
            .flush()
            .map_err(|e| CliError::InputError(e.to_string()))?;
        rpassword::read_password()
            .map_err(|e| CliError::InputError(format!("Failed to read password: {}", e)))
    };

    let password = read("New password: ")?;
    let confirm = read("Confirm password: ")?;
    if password != confirm {
        return Err(CliError::InputError("Passwords do not match".to_string()));
    }
    Ok(password)
}

pub async fn reset_password(
    state: &AppState,
    email: &str,
    password: Option<String>,
    stdin: bool,
) -> Result<(), CliError> {
    let new_password = read_new_password(password, stdin)?;
    let user = state.users.set_password_by_email(email, &new_password).await?;
    println!(
        "{} Password updated for {} (id {})",
        "✓".green().bold(),
        user.email.cyan(),
        user.id
    );
    Ok(())
}
