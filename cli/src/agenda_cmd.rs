//! `agenda` subcommands.
//!
//! ## Commands
//!
//! - `agenda list [--json]`
//! - `agenda show <ID> [--json]`
//! - `agenda add --name <NAME> --email <EMAIL> [--phone] [--address] [--image-url] [--json]`
//! - `agenda edit <ID> [--name] [--email] [--phone] [--address] [--image-url] [--json]`
//! - `agenda delete <ID> [--yes]`
//! - `agenda shell`

use std::sync::Arc;

use agenda_core::{
    AgendaConfig, ConfigError, ConfigLoader, ContactCache, ContactDraft, ContactId,
    ContactOperations, DeleteOutcome, HttpAgendaClient, Store,
};
use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};

use crate::prompt::LinePrompt;
use crate::render::{self, Palette};
use crate::shell;

#[derive(Debug, Parser)]
#[command(name = "agenda", version, about = "Manage the contacts of a remote agenda")]
pub struct AgendaCli {
    /// Service root URL. Overrides config file and environment.
    #[arg(long = "base-url", global = true)]
    pub base_url: Option<String>,

    /// Agenda slug. Overrides config file and environment.
    #[arg(long = "agenda", global = true)]
    pub agenda: Option<String>,

    /// Log requests and cache changes to stderr.
    #[arg(long = "verbose", short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: AgendaSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum AgendaSubcommand {
    /// List every contact in the agenda.
    List(ListArgs),
    /// Show one contact.
    Show(ShowArgs),
    /// Create a contact.
    Add(AddArgs),
    /// Change fields of an existing contact.
    Edit(EditArgs),
    /// Delete a contact after confirmation.
    Delete(DeleteArgs),
    /// Interactive session over one cache.
    Shell,
}

#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Output as JSON.
    #[arg(long = "json", short = 'j')]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct ShowArgs {
    pub id: ContactId,

    /// Output as JSON.
    #[arg(long = "json", short = 'j')]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct AddArgs {
    #[arg(long = "name")]
    pub name: String,

    #[arg(long = "email")]
    pub email: String,

    #[arg(long = "phone")]
    pub phone: Option<String>,

    #[arg(long = "address")]
    pub address: Option<String>,

    #[arg(long = "image-url")]
    pub image_url: Option<String>,

    /// Output as JSON.
    #[arg(long = "json", short = 'j')]
    pub json: bool,
}

impl AddArgs {
    fn draft(&self) -> ContactDraft {
        ContactDraft {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            image_url: self.image_url.clone(),
        }
    }
}

#[derive(Debug, Parser)]
pub struct EditArgs {
    pub id: ContactId,

    #[command(flatten)]
    pub fields: FieldEdits,

    /// Output as JSON.
    #[arg(long = "json", short = 'j')]
    pub json: bool,
}

/// Field values given by the user. Unset fields keep their current value;
/// an empty optional field clears it.
#[derive(Debug, Default, Clone, PartialEq, Eq, Args)]
pub struct FieldEdits {
    #[arg(long = "name")]
    pub name: Option<String>,

    #[arg(long = "email")]
    pub email: Option<String>,

    #[arg(long = "phone")]
    pub phone: Option<String>,

    #[arg(long = "address")]
    pub address: Option<String>,

    #[arg(long = "image-url")]
    pub image_url: Option<String>,
}

impl FieldEdits {
    /// Set one field from a `key=value` pair.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        let slot = match key {
            "name" => &mut self.name,
            "email" => &mut self.email,
            "phone" => &mut self.phone,
            "address" => &mut self.address,
            "image_url" | "image-url" | "image" => &mut self.image_url,
            other => return Err(format!("unknown field '{other}'")),
        };
        *slot = Some(value.to_string());
        Ok(())
    }

    pub fn apply(self, mut draft: ContactDraft) -> ContactDraft {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(email) = self.email {
            draft.email = email;
        }
        if let Some(phone) = self.phone {
            draft.phone = Some(phone);
        }
        if let Some(address) = self.address {
            draft.address = Some(address);
        }
        if let Some(image_url) = self.image_url {
            draft.image_url = Some(image_url);
        }
        draft
    }
}

#[derive(Debug, Parser)]
pub struct DeleteArgs {
    pub id: ContactId,

    /// Skip the confirmation prompt.
    #[arg(long = "yes", short = 'y')]
    pub yes: bool,
}

impl AgendaCli {
    /// Layered config with command-line overrides on top.
    pub fn config(&self) -> Result<AgendaConfig, ConfigError> {
        let mut config = ConfigLoader::new().load()?;
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(agenda) = &self.agenda {
            config.agenda = agenda.clone();
        }
        config.validated()
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.config()?;
        tracing::debug!("using agenda {} at {}", config.agenda, config.base_url);
        let client =
            HttpAgendaClient::from_config(&config).context("building the HTTP client")?;
        let ops = ContactOperations::new(Arc::new(client), Store::new());
        let palette = Palette::detect();

        match self.command {
            AgendaSubcommand::List(args) => cmd_list(&ops, &args, palette).await,
            AgendaSubcommand::Show(args) => cmd_show(&ops, &args, palette).await,
            AgendaSubcommand::Add(args) => cmd_add(&ops, &args, palette).await,
            AgendaSubcommand::Edit(args) => cmd_edit(&ops, args, palette).await,
            AgendaSubcommand::Delete(args) => cmd_delete(&ops, &args, palette).await,
            AgendaSubcommand::Shell => shell::run(&ops, palette).await,
        }
    }
}

pub(crate) fn print_message(cache: &ContactCache, palette: Palette) {
    if let Some(message) = &cache.message {
        println!("{}", render::message_banner(message, palette));
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn cmd_list(ops: &ContactOperations, args: &ListArgs, palette: Palette) -> anyhow::Result<()> {
    ops.try_load().await?;
    let cache = ops.store().snapshot();
    if args.json {
        return print_json(&cache.contacts);
    }
    println!("{}", render::contact_list(&cache.contacts, palette));
    Ok(())
}

async fn cmd_show(ops: &ContactOperations, args: &ShowArgs, palette: Palette) -> anyhow::Result<()> {
    ops.try_load().await?;
    let cache = ops.store().snapshot();
    let Some(contact) = cache.get(args.id) else {
        bail!("contact {} not found", args.id);
    };
    if args.json {
        return print_json(contact);
    }
    println!("{}", render::contact_card(contact, palette));
    Ok(())
}

async fn cmd_add(ops: &ContactOperations, args: &AddArgs, palette: Palette) -> anyhow::Result<()> {
    let contact = ops.create(&args.draft()).await?;
    if args.json {
        return print_json(&contact);
    }
    print_message(&ops.store().snapshot(), palette);
    println!("{}", render::contact_card(&contact, palette));
    Ok(())
}

async fn cmd_edit(ops: &ContactOperations, args: EditArgs, palette: Palette) -> anyhow::Result<()> {
    ops.try_load().await?;
    let Some(current) = ops.draft_for(args.id) else {
        bail!("contact {} not found", args.id);
    };
    let contact = ops.update(args.id, &args.fields.apply(current)).await?;
    if args.json {
        return print_json(&contact);
    }
    print_message(&ops.store().snapshot(), palette);
    println!("{}", render::contact_card(&contact, palette));
    Ok(())
}

async fn cmd_delete(
    ops: &ContactOperations,
    args: &DeleteArgs,
    palette: Palette,
) -> anyhow::Result<()> {
    ops.try_load().await?;
    let outcome = if args.yes {
        ops.delete(args.id, &true).await?
    } else {
        ops.delete(args.id, &LinePrompt::stdin()).await?
    };

    match outcome {
        DeleteOutcome::Deleted { id, .. } => {
            let cache = ops.store().snapshot();
            if cache.message.is_some() {
                print_message(&cache, palette);
            } else {
                println!("Deleted contact #{id}");
            }
            Ok(())
        }
        DeleteOutcome::Cancelled => bail!("delete cancelled"),
    }
}
