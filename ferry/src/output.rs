use std::fmt::Display;
use std::io::IsTerminal;

use console::{Term, style};

pub fn brand_fg<D: Display>(value: D) -> console::StyledObject<D> {
    style(value)
}

pub fn brand_success<D: Display>(value: D) -> console::StyledObject<D> {
    style(value).green()
}

pub fn brand_warning<D: Display>(value: D) -> console::StyledObject<D> {
    style(value).yellow()
}

pub fn brand_error<D: Display>(value: D) -> console::StyledObject<D> {
    style(value).red()
}

pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

pub fn step(message: &str) {
    println!("{} {}", style("•").cyan().bold(), brand_fg(message));
}

pub fn success(message: &str) {
    println!("{} {}", brand_success("✓").bold(), brand_fg(message));
}

pub fn warning(message: &str) {
    println!("{} {}", brand_warning("!").bold(), brand_fg(message));
}

pub fn error(message: &str) {
    println!("{} {}", brand_error("✗").bold(), brand_fg(message));
}

pub fn error_stderr(message: &str) {
    eprintln!("{} {}", brand_error("✗").bold(), brand_fg(message));
}

pub fn confirm(prompt: &str, default: bool) -> std::io::Result<bool> {
    if !is_interactive() {
        return Ok(default);
    }

    let term = Term::stderr();
    term.write_str(&format!("{} [y/n]: ", prompt))?;
    let answer = term.read_line()?;
    Ok(match answer.trim() {
        "" => default,
        s => s.eq_ignore_ascii_case("y") || s.eq_ignore_ascii_case("yes"),
    })
}

/// Read a secret from the terminal without echoing it.
pub fn prompt_password(prompt: &str) -> std::io::Result<String> {
    if !is_interactive() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "Password prompt requires an interactive terminal",
        ));
    }

    let term = Term::stderr();
    term.write_str(&format!("{}: ", prompt))?;
    let value = term.read_secure_line()?;
    if value.is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Input cannot be empty",
        ));
    }
    Ok(value)
}
