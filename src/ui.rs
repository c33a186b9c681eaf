// UI layer: everything that talks to the terminal besides the report itself.
// Interactive prompts use `dialoguer`, progress uses an `indicatif` spinner,
// and colours go through `Palette` so they can be switched off for pipes,
// `NO_COLOR`, and tests.

use anyhow::Result;
use crossterm::style::{style, Color, Stylize};
use crossterm::tty::IsTty;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;

use crate::config::{mask_api_key, Settings};

/// Optional ANSI colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn plain() -> Self {
        Palette { enabled: false }
    }

    /// Colour when stdout is a terminal and `NO_COLOR` is unset.
    pub fn for_stdout() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        Palette {
            enabled: !no_color && std::io::stdout().is_tty(),
        }
    }

    pub fn paint(&self, text: impl std::fmt::Display, color: Color) -> String {
        if self.enabled {
            style(text).with(color).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn bold(&self, text: impl std::fmt::Display) -> String {
        if self.enabled {
            style(text).bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn bold_color(&self, text: impl std::fmt::Display, color: Color) -> String {
        if self.enabled {
            style(text).with(color).bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn dim(&self, text: impl std::fmt::Display) -> String {
        if self.enabled {
            style(text).dim().to_string()
        } else {
            text.to_string()
        }
    }
}

/// Spinner shown on stderr while archiving and uploading. Hidden when
/// `quiet` is set or stderr is not a terminal.
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    pub fn start(message: &'static str, quiet: bool) -> Self {
        if quiet || !std::io::stderr().is_tty() {
            return Spinner {
                bar: ProgressBar::hidden(),
            };
        }
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(100));
        Spinner { bar }
    }

    pub fn set_message(&self, message: &'static str) {
        self.bar.set_message(message);
    }

    pub fn succeed(&self, message: &'static str) {
        self.bar.finish_with_message(format!("✓ {message}"));
    }

    pub fn fail(&self, message: &'static str) {
        self.bar.abandon_with_message(format!("✗ {message}"));
    }
}

/// Prefix every ALICE API key carries.
pub const API_KEY_PREFIX: &str = "alice_";

pub fn validate_api_key(input: &str) -> Result<(), &'static str> {
    if input.trim().starts_with(API_KEY_PREFIX) && input.trim().len() > API_KEY_PREFIX.len() {
        Ok(())
    } else {
        Err("Please enter a valid ALICE API key (starts with alice_)")
    }
}

/// Loose `local@domain.tld` shape check.
pub fn validate_email(input: &str) -> Result<(), &'static str> {
    let invalid = "Please enter a valid email";
    if input.chars().any(char::is_whitespace) {
        return Err(invalid);
    }
    let (local, domain) = input.split_once('@').ok_or(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid);
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(invalid),
    }
}

/// Answers collected by `alice init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitAnswers {
    pub api_key: String,
    pub server_url: String,
    pub developer_name: String,
    pub developer_email: String,
}

/// Prompt for anything not already supplied. `prefill` values skip their prompt.
pub fn prompt_init(prefill: &InitAnswersPrefill, server_default: &str) -> Result<InitAnswers> {
    let api_key = match &prefill.api_key {
        Some(k) => k.clone(),
        None => Input::<String>::new()
            .with_prompt("Enter your ALICE API key")
            .validate_with(|input: &String| validate_api_key(input))
            .interact_text()?,
    };
    let server_url = match &prefill.server_url {
        Some(u) => u.clone(),
        None => Input::<String>::new()
            .with_prompt("Server URL")
            .default(server_default.to_string())
            .interact_text()?,
    };
    let developer_name = match &prefill.developer_name {
        Some(n) => n.clone(),
        None => Input::<String>::new()
            .with_prompt("Your name")
            .validate_with(|input: &String| {
                if input.trim().is_empty() {
                    Err("Name is required")
                } else {
                    Ok(())
                }
            })
            .interact_text()?,
    };
    let developer_email = match &prefill.developer_email {
        Some(e) => e.clone(),
        None => Input::<String>::new()
            .with_prompt("Your email")
            .validate_with(|input: &String| validate_email(input))
            .interact_text()?,
    };
    Ok(InitAnswers {
        api_key: api_key.trim().to_string(),
        server_url: server_url.trim().to_string(),
        developer_name: developer_name.trim().to_string(),
        developer_email: developer_email.trim().to_string(),
    })
}

/// Values passed on the command line or via environment for `alice init`.
#[derive(Debug, Clone, Default)]
pub struct InitAnswersPrefill {
    pub api_key: Option<String>,
    pub server_url: Option<String>,
    pub developer_name: Option<String>,
    pub developer_email: Option<String>,
}

/// Print the current configuration with the API key masked.
pub fn show_config<W: Write>(out: &mut W, settings: &Settings, palette: &Palette) -> std::io::Result<()> {
    let not_set = |v: &str| {
        if v.is_empty() {
            "Not set".to_string()
        } else {
            v.to_string()
        }
    };
    let timeout = match settings.timeout {
        Some(d) => format!("{}s", d.as_secs()),
        None => "disabled".to_string(),
    };
    writeln!(out, "{}", palette.bold_color("\nCurrent Configuration:\n", Color::Cyan))?;
    writeln!(out, "{} {}", palette.bold("Server URL:"), settings.server_url)?;
    writeln!(out, "{} {}", palette.bold("API Key:"), mask_api_key(settings.api_key.as_deref()))?;
    writeln!(out, "{} {}", palette.bold("Developer:"), not_set(&settings.developer_name))?;
    writeln!(out, "{} {}", palette.bold("Email:"), not_set(&settings.developer_email))?;
    writeln!(out, "{} {}", palette.bold("Upload timeout:"), timeout)?;
    writeln!(out)?;
    Ok(())
}

/// Hint printed when a command needs an API key that is not there.
pub fn print_not_configured<W: Write>(out: &mut W, palette: &Palette) -> std::io::Result<()> {
    writeln!(out, "{}", palette.paint("⚠️  ALICE SDK not configured.", Color::Yellow))?;
    writeln!(out, "{}", palette.dim("Run: alice init\n"))
}
