// clipctl: control and maintenance CLI for clipcached
//
// Commands:
//   clipctl enable | disable | toggle
//   clipctl status
//   clipctl list [--selection <name>] [--json]
//   clipctl delete <regex> [--selection <name>] [--dry-run]

use std::collections::HashSet;
use std::env;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use clipcache::{
    daemon::{
        control::{self, ControlCommand},
        CacheLock, Config,
    },
    history::{HistoryCache, HistoryEntry, Selection},
    logging::{self, LogConfig},
};
use regex::Regex;

fn print_help() {
    println!(
        r#"clipctl - control the clipcached clipboard history daemon

USAGE:
    clipctl <COMMAND> [OPTIONS]

COMMANDS:
    enable                 Resume recording clipboard changes
    disable                Stop recording until re-enabled
    toggle                 Flip between enabled and disabled
    status                 Print enabled, disabled, or not running
    list                   List recorded clips, newest first
    delete <regex>         Delete clips whose summary matches <regex>
    help                   Show this help message

OPTIONS:
    --selection <name>     Only consider one selection (list, delete)
    --json                 Output in JSON format (list)
    --dry-run, -n          Show what delete would remove without removing it

Settings such as the cache location are read from CLIPCACHE_* variables,
the same ones clipcached uses."#
    );
}

fn main() -> Result<()> {
    logging::init(&LogConfig::from_env());

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    let command = &args[1];

    let mut selection: Option<String> = None;
    let mut json_output = false;
    let mut dry_run = false;
    let mut positional: Vec<String> = Vec::new();

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--selection" | "-s" => {
                i += 1;
                let name = args
                    .get(i)
                    .ok_or_else(|| anyhow!("--selection requires a selection name"))?;
                selection = Some(name.clone());
            }
            "--json" => {
                json_output = true;
            }
            "--dry-run" | "-n" => {
                dry_run = true;
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    let config = Config::from_env();
    let selection = selection
        .map(|name| Selection::new(&name).ok_or_else(|| anyhow!("Invalid selection name: {}", name)))
        .transpose()?;

    match command.as_str() {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }

        "enable" | "disable" | "toggle" => {
            let requested = match command.as_str() {
                "enable" => ControlCommand::Enable,
                "disable" => ControlCommand::Disable,
                _ => ControlCommand::Toggle,
            };
            let sent = control::send(&config, requested).context("Failed to signal clipcached")?;
            println!(
                "{}",
                if sent == ControlCommand::Disable {
                    "disabled"
                } else {
                    "enabled"
                }
            );
            Ok(())
        }

        "status" => {
            println!("{}", control::status(&config).as_str());
            Ok(())
        }

        "list" => {
            let cache = HistoryCache::new(config.cache_dir(), &config.selections);
            let entries = collapse_duplicates(
                cache
                    .entries(selection.as_ref())
                    .context("Failed to read index logs")?,
            );

            if json_output {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }

            for entry in &entries {
                println!("{}  {}", format_timestamp(entry.timestamp_ns), entry.summary);
            }
            Ok(())
        }

        "delete" => {
            let pattern = positional
                .first()
                .ok_or_else(|| anyhow!("Usage: clipctl delete <regex> [--selection <name>] [--dry-run]"))?;
            let regex = Regex::new(pattern).with_context(|| format!("Invalid pattern: {}", pattern))?;

            let cache = HistoryCache::new(config.cache_dir(), &config.selections);
            let _lock = CacheLock::acquire_blocking(&config.lock_file(), config.lock_timeout)?;
            let removed = cache
                .delete_matching(selection.as_ref(), dry_run, |summary| regex.is_match(summary))
                .context("Failed to delete clips")?;

            if dry_run {
                for entry in &removed {
                    println!("{}  {}", entry.selection, entry.summary);
                }
                println!("{} clip(s) would be deleted", removed.len());
            } else {
                println!("{} clip(s) deleted", removed.len());
            }
            Ok(())
        }

        other => {
            eprintln!("Unknown command: {}", other);
            print_help();
            std::process::exit(1);
        }
    }
}

/// Keep only the newest entry for each summary (entries are newest first)
fn collapse_duplicates(entries: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(e.summary.clone()))
        .collect()
}

fn format_timestamp(timestamp_ns: u64) -> String {
    let utc = DateTime::from_timestamp_nanos(timestamp_ns as i64);
    utc.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
