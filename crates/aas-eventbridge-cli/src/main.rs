//! # AAS-EventBridge CLI
//!
//! Command-line utilities for encoding, topic inspection, and frame checks.

use aas_eventbridge_core::EntityIds;
use aas_eventbridge_proto::{
    decode_id_base64url, encode_id_base64url, MessageFrame, TopicKind, TopicScheme,
};
use anyhow::{bail, Context, Result};
use std::env;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "encode" => {
            if args.len() < 3 {
                eprintln!("Usage: aas-eventbridge encode <identifier>");
                std::process::exit(1);
            }
            let id = &args[2];
            let encoded = encode_id_base64url(id);
            println!("{encoded}");
        }
        "decode" => {
            if args.len() < 3 {
                eprintln!("Usage: aas-eventbridge decode <encoded>");
                std::process::exit(1);
            }
            let encoded = &args[2];
            let decoded = decode_id_base64url(encoded).context("Failed to decode")?;
            println!("{decoded}");
        }
        "topic" => {
            if args.len() < 4 {
                eprintln!("Usage: aas-eventbridge topic <kind> <shell-id> [submodel-id] [path] [repo]");
                std::process::exit(1);
            }
            let kind = parse_kind(&args[2])?;
            let mut ids = EntityIds::new(&args[3], args.get(4).cloned().unwrap_or_default());
            if let Some(repo) = args.get(6) {
                ids = ids.in_repo(repo);
            }
            let path = args.get(5).map_or("", String::as_str);
            println!("{}", TopicScheme::default().topic(kind, &ids, path));
        }
        "parse-topic" => {
            if args.len() < 3 {
                eprintln!("Usage: aas-eventbridge parse-topic <topic>");
                std::process::exit(1);
            }
            let Some(parsed) = TopicScheme::default().parse(&args[2]) else {
                bail!("Not an event bridge topic: {}", args[2]);
            };
            println!("kind:      {:?}", parsed.kind);
            println!("repo:      {}", parsed.repo_id);
            if let Some(shell_id) = parsed.shell_id {
                println!("shell:     {shell_id}");
            }
            if let Some(submodel_id) = parsed.submodel_id {
                println!("submodel:  {submodel_id}");
            }
            if let Some(path) = parsed.path {
                println!("path:      {path}");
            }
        }
        "frame-check" => {
            if args.len() < 3 {
                eprintln!("Usage: aas-eventbridge frame-check <file>");
                std::process::exit(1);
            }
            let bytes = std::fs::read(&args[2])
                .with_context(|| format!("Failed to read {}", args[2]))?;
            let frame = MessageFrame::decode(&bytes).context("Invalid message frame")?;
            let pretty =
                serde_json::to_string_pretty(&frame).context("Failed to render frame")?;
            println!("{pretty}");
        }
        "help" | "--help" | "-h" => {
            print_help();
        }
        cmd => {
            eprintln!("Unknown command: {cmd}");
            print_help();
            std::process::exit(1);
        }
    }

    Ok(())
}

fn parse_kind(value: &str) -> Result<TopicKind> {
    Ok(match value {
        "shell-created" => TopicKind::ShellCreated,
        "submodel-created" => TopicKind::SubmodelCreated,
        "submodel-deleted" => TopicKind::SubmodelDeleted,
        "element-created" => TopicKind::ElementCreated,
        "element-updated" => TopicKind::ElementUpdated,
        "element-deleted" => TopicKind::ElementDeleted,
        "element-value" => TopicKind::ElementValue,
        other => bail!("Unknown topic kind: {other}"),
    })
}

fn print_help() {
    println!(
        r#"AAS-EventBridge CLI

USAGE:
    aas-eventbridge <COMMAND> [OPTIONS]

COMMANDS:
    encode <id>              Encode an AAS identifier to base64url (no padding)
    decode <encoded>         Decode a base64url-encoded identifier
    topic <kind> <shell-id> [submodel-id] [path] [repo]
                             Print the topic for an event
    parse-topic <topic>      Show the kind and identifiers of a topic
    frame-check <file>       Validate a JSON message frame
    help                     Show this help message

TOPIC KINDS:
    shell-created, submodel-created, submodel-deleted,
    element-created, element-updated, element-deleted, element-value

EXAMPLES:
    aas-eventbridge encode "urn:example:aas:asset1"
    aas-eventbridge topic element-value urn:example:aas:1 urn:example:sm:data temperature
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse() {
        assert_eq!(parse_kind("element-value").unwrap(), TopicKind::ElementValue);
        assert_eq!(parse_kind("shell-created").unwrap(), TopicKind::ShellCreated);
        assert!(parse_kind("element").is_err());
    }
}
