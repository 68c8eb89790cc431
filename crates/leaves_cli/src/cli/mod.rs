use clap::{Parser, Subcommand};
use leaves_core::config::ConfigOverrides;
use leaves_core::error::AppError;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

#[derive(Parser, Debug)]
#[command(name = "leaves", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new note
    ///
    /// Example: leaves add "Buy milk"
    /// Example: leaves add "Pay rent" --deadline "2026-11-01 09:00"
    Add {
        description: Option<String>,
        /// Deadline: RFC 3339, "YYYY-MM-DD HH:MM[:SS]" or "YYYY-MM-DD" (local time)
        #[arg(long, short = 'd')]
        deadline: Option<String>,
    },
    /// List notes, optionally searched and filtered
    ///
    /// Example: leaves list --search milk --filter pending
    List {
        #[arg(long, short = 's')]
        search: Option<String>,
        /// One of: all, pending, completed
        #[arg(long, short = 'f')]
        filter: Option<String>,
    },
    /// Show details of a note
    ///
    /// Example: leaves show 1
    Show { id: String },
    /// Replace a note's description
    ///
    /// Example: leaves edit 1 "Buy oat milk"
    Edit { id: String, new_description: String },
    /// Flip a note between pending and completed
    ///
    /// Example: leaves toggle 1
    Toggle { id: String },
    /// Delete a note
    ///
    /// Example: leaves delete 1 --yes
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Delete every note
    ///
    /// Example: leaves clear --yes
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Pull suggested notes from the remote service
    ///
    /// Example: leaves sync --limit 3
    Sync {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Send a note to the remote service
    ///
    /// Example: leaves push 1
    Push { id: String },
    /// Send a notification for every pending note whose time is up
    ///
    /// Example: leaves notify
    Notify,
    /// Keep the list on screen, refreshing deadline badges
    ///
    /// Example: leaves watch
    Watch {
        /// Stop after this many refreshes
        #[arg(long)]
        count: Option<u32>,
    },
}

/// Commands accepted inside the interactive session.
#[derive(Parser, Debug)]
#[command(name = "leaves", disable_version_flag = true)]
pub struct SessionCli {
    #[command(subcommand)]
    pub command: SessionCommand,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    #[command(flatten)]
    Base(Command),
    /// Set the search text (empty clears it)
    ///
    /// Example: search milk
    Search { text: Vec<String> },
    /// Set the status filter: all, pending or completed
    ///
    /// Example: filter pending
    Filter { filter: String },
    /// Start editing a note in place
    ///
    /// Example: begin-edit 1
    BeginEdit { id: String },
    /// Save the note being edited
    ///
    /// Example: save "Buy oat milk"
    Save { text: String },
    /// Leave edit mode without saving
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    Alias(String),
    StoreKey,
    SuggestionEndpoint,
    SuggestionLimit,
    CreateDelayMs,
    RefreshIntervalSecs,
    DesktopNotifications,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let (field, remainder) = key_raw
        .split_once('.')
        .map(|(field, rest)| (field.trim(), Some(rest.trim())))
        .unwrap_or((key_raw.trim(), None));

    let canonical_field =
        canonicalize_flag_name(field).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match canonical_field.as_str() {
        "aliases" | "alias" => {
            let alias_name = remainder
                .filter(|segment| !segment.is_empty())
                .ok_or_else(|| "aliases override requires an alias name".to_string())?;
            return Ok(ParsedConfigOverride {
                target: ConfigOverrideTarget::Alias(alias_name.to_string()),
                value,
            });
        }
        "theme" => ConfigOverrideTarget::Theme,
        "store_key" => ConfigOverrideTarget::StoreKey,
        "suggestion_endpoint" | "endpoint" => ConfigOverrideTarget::SuggestionEndpoint,
        "suggestion_limit" | "limit" => ConfigOverrideTarget::SuggestionLimit,
        "create_delay_ms" => ConfigOverrideTarget::CreateDelayMs,
        "refresh_interval_secs" => ConfigOverrideTarget::RefreshIntervalSecs,
        "desktop_notifications" => ConfigOverrideTarget::DesktopNotifications,
        other => return Err(format!("unknown config field '{other}'")),
    };

    if remainder.is_some() {
        return Err(format!("{canonical_field} override cannot have subfields"));
    }

    Ok(ParsedConfigOverride { target, value })
}

/// Folds parsed overrides into the set applied on top of the config file.
pub fn collect_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();

    for entry in raw {
        let parsed = parse_config_override(entry).map_err(AppError::invalid_input)?;
        let value = parsed.value;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(value),
            ConfigOverrideTarget::Alias(name) => {
                overrides.aliases.insert(name, value);
            }
            ConfigOverrideTarget::StoreKey => overrides.store_key = Some(value),
            ConfigOverrideTarget::SuggestionEndpoint => {
                overrides.suggestion_endpoint = Some(value)
            }
            ConfigOverrideTarget::SuggestionLimit => {
                overrides.suggestion_limit = Some(parse_number(&value, "suggestion_limit")?)
            }
            ConfigOverrideTarget::CreateDelayMs => {
                overrides.create_delay_ms = Some(parse_number(&value, "create_delay_ms")?)
            }
            ConfigOverrideTarget::RefreshIntervalSecs => {
                overrides.refresh_interval_secs =
                    Some(parse_number(&value, "refresh_interval_secs")?)
            }
            ConfigOverrideTarget::DesktopNotifications => {
                let enabled = value.parse::<bool>().map_err(|_| {
                    AppError::invalid_input("desktop_notifications must be true or false")
                })?;
                overrides.desktop_notifications = Some(enabled);
            }
        }
    }

    Ok(overrides)
}

fn parse_number<T: std::str::FromStr>(value: &str, field: &str) -> Result<T, AppError> {
    value
        .parse::<T>()
        .map_err(|_| AppError::invalid_input(format!("{field} must be a non-negative number")))
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Parses a deadline given on the command line. Values without an offset
/// are read in `offset`; a bare date means midnight.
pub fn parse_deadline(raw: &str, offset: UtcOffset) -> Result<OffsetDateTime, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("deadline is required"));
    }

    if let Ok(parsed) =
        OffsetDateTime::parse(trimmed, &time::format_description::well_known::Rfc3339)
    {
        return Ok(parsed);
    }

    let local = PrimitiveDateTime::parse(
        trimmed,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(
            trimmed,
            format_description!("[year]-[month]-[day] [hour]:[minute]"),
        )
    })
    .or_else(|_| {
        PrimitiveDateTime::parse(
            trimmed,
            format_description!("[year]-[month]-[day]T[hour]:[minute]"),
        )
    })
    .or_else(|_| {
        Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
            .map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT))
    })
    .map_err(|_| {
        AppError::invalid_input(
            "deadline must be RFC 3339, YYYY-MM-DD HH:MM[:SS] or YYYY-MM-DD",
        )
    })?;

    Ok(local.assume_offset(offset))
}
