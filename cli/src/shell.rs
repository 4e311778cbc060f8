//! Interactive session. One cache lives for the whole session; the status
//! message stays visible until dismissed or replaced by the next mutation.

use agenda_core::{ContactDraft, ContactId, ContactOperations, DeleteOutcome, LoadState};
use anyhow::bail;

use crate::agenda_cmd::{FieldEdits, print_message};
use crate::prompt::LinePrompt;
use crate::render::{self, Palette};

const HELP: &str = "\
Commands:
  list                       reload and list contacts
  show ID                    show one contact
  add name=.. email=.. ...   create a contact (phone, address, image_url optional)
  edit ID key=value ...      change fields of a contact
  delete ID                  delete a contact
  dismiss                    clear the status message
  help                       show this help
  quit                       leave the shell
Quote values containing spaces: name=\"Ana Martinez\"";

#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Empty,
    List,
    Show(ContactId),
    Add(FieldEdits),
    Edit(ContactId, FieldEdits),
    Delete(ContactId),
    Dismiss,
    Help,
    Quit,
}

pub(crate) async fn run(ops: &ContactOperations, palette: Palette) -> anyhow::Result<()> {
    let prompt = LinePrompt::stdin();

    let mut changes = ops.store().subscribe();
    let watcher = tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let count = changes.borrow_and_update().len();
            tracing::debug!("cache updated, {count} contacts");
        }
    });

    report_load(ops.load().await, ops, palette);

    while let Some(line) = prompt.ask("agenda> ").await? {
        let command = match parse(&line) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };
        if command == ShellCommand::Quit {
            break;
        }
        if let Err(err) = execute(ops, &prompt, command, palette).await {
            crate::report(&err);
        }
    }

    watcher.abort();
    Ok(())
}

fn report_load(state: LoadState, ops: &ContactOperations, palette: Palette) {
    match state {
        LoadState::Ready { count } => println!("{count} contacts loaded"),
        LoadState::Failed { message } => {
            eprintln!("{message}");
            let cache = ops.store().snapshot();
            if !cache.is_empty() {
                println!("{}", render::contact_list(&cache.contacts, palette));
            }
        }
    }
}

async fn execute(
    ops: &ContactOperations,
    prompt: &LinePrompt<tokio::io::BufReader<tokio::io::Stdin>>,
    command: ShellCommand,
    palette: Palette,
) -> anyhow::Result<()> {
    match command {
        ShellCommand::Empty | ShellCommand::Quit => {}
        ShellCommand::Help => println!("{HELP}"),
        ShellCommand::List => {
            if let LoadState::Failed { message } = ops.load().await {
                eprintln!("{message}");
            }
            let cache = ops.store().snapshot();
            print_message(&cache, palette);
            println!("{}", render::contact_list(&cache.contacts, palette));
        }
        ShellCommand::Show(id) => {
            let cache = ops.store().snapshot();
            let Some(contact) = cache.get(id) else {
                bail!("contact {id} not found");
            };
            println!("{}", render::contact_card(contact, palette));
        }
        ShellCommand::Add(fields) => {
            let contact = ops.create(&fields.apply(ContactDraft::default())).await?;
            print_message(&ops.store().snapshot(), palette);
            println!("{}", render::contact_card(&contact, palette));
        }
        ShellCommand::Edit(id, fields) => {
            let Some(current) = ops.draft_for(id) else {
                bail!("contact {id} not found");
            };
            let contact = ops.update(id, &fields.apply(current)).await?;
            print_message(&ops.store().snapshot(), palette);
            println!("{}", render::contact_card(&contact, palette));
        }
        ShellCommand::Delete(id) => match ops.delete(id, prompt).await? {
            DeleteOutcome::Deleted { .. } => print_message(&ops.store().snapshot(), palette),
            DeleteOutcome::Cancelled => println!("Cancelled"),
        },
        ShellCommand::Dismiss => ops.clear_message(),
    }
    Ok(())
}

fn parse(line: &str) -> Result<ShellCommand, String> {
    let tokens = tokenize(line)?;
    let Some((verb, rest)) = tokens.split_first() else {
        return Ok(ShellCommand::Empty);
    };

    match (verb.as_str(), rest) {
        ("list" | "ls", []) => Ok(ShellCommand::List),
        ("show", [id]) => Ok(ShellCommand::Show(parse_id(id)?)),
        ("add", pairs) => Ok(ShellCommand::Add(parse_fields(pairs)?)),
        ("edit", [id, pairs @ ..]) => Ok(ShellCommand::Edit(parse_id(id)?, parse_fields(pairs)?)),
        ("delete" | "rm", [id]) => Ok(ShellCommand::Delete(parse_id(id)?)),
        ("dismiss", []) => Ok(ShellCommand::Dismiss),
        ("help" | "?", []) => Ok(ShellCommand::Help),
        ("quit" | "exit", []) => Ok(ShellCommand::Quit),
        (other, _) => Err(format!("unrecognised command '{other}', try 'help'")),
    }
}

fn parse_id(raw: &str) -> Result<ContactId, String> {
    raw.parse()
        .map_err(|_| format!("'{raw}' is not a contact id"))
}

fn parse_fields(pairs: &[String]) -> Result<FieldEdits, String> {
    let mut fields = FieldEdits::default();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(format!("expected key=value, got '{pair}'"));
        };
        fields.set(key, value)?;
    }
    Ok(fields)
}

/// Whitespace-separated words; double quotes group words and are dropped.
fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quoted {
        return Err("unterminated quote".to_string());
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}
