use leaves_core::error::AppError;
use std::collections::HashMap;

/// Splits an interactive line into arguments. Double quotes group words;
/// inside quotes `\"` and `\\` are escapes, any other backslash is kept.
pub fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        match ch {
            '\\' if in_quotes => escape = true,
            '"' => in_quotes = !in_quotes,
            ch if ch.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            ch => current.push(ch),
        }
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }
    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

/// Replaces a leading alias with its configured expansion.
pub fn expand_alias(args: Vec<String>, aliases: &HashMap<String, String>) -> Result<Vec<String>, AppError> {
    let Some(first) = args.first() else {
        return Ok(args);
    };
    let Some(expansion) = aliases.get(first) else {
        return Ok(args);
    };

    let mut expanded = split_command_line(expansion)?;
    if expanded.is_empty() {
        return Err(AppError::invalid_input(format!("alias '{first}' is empty")));
    }
    expanded.extend(args.into_iter().skip(1));
    Ok(expanded)
}

pub fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line.strip_prefix("error: ").unwrap_or(first_line);
    AppError::invalid_input(message.to_string())
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
