use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use time::macros::format_description;
use time::OffsetDateTime;
use tracing_subscriber::{fmt, EnvFilter};

use dialbook::config::{self, Config};
use dialbook::recents::RecentCallStore;
use dialbook::source::{AddressBook, JsonAddressBook, NoAddressBook};
use dialbook::store::CustomContactStore;
use dialbook::{ContactsService, PermissionStatus};

#[derive(Parser, Debug)]
#[command(name = "dialbook", version, about = "Contacts and recent calls")]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the documents directory holding contacts and the call log
    #[arg(long)]
    documents_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all contacts in alphabetic sections
    List(ListArgs),
    /// Show one contact
    Show { id: String },
    /// Save a new custom contact
    Add(AddArgs),
    /// Change a custom contact
    Edit(EditArgs),
    /// Delete a custom contact
    Delete { id: String },
    /// Call a contact and record it in the recent calls
    Call { id: String },
    /// Show recent calls, newest first
    Recents(ListArgs),
    /// Forget all recent calls
    ClearRecents,
    /// Show (or request) the address book permission
    Permission {
        #[arg(long)]
        request: bool,
    },
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Only show entries whose name or number contains this text
    #[arg(long, short = 'q', default_value = "")]
    query: String,
}

#[derive(Args, Debug)]
struct AddArgs {
    #[arg(long, default_value = "")]
    first: String,
    #[arg(long, default_value = "")]
    last: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long)]
    photo: Option<String>,
}

#[derive(Args, Debug)]
struct EditArgs {
    id: String,
    /// New display name (unchanged when omitted)
    #[arg(long)]
    name: Option<String>,
    /// New phone number (unchanged when omitted)
    #[arg(long)]
    phone: Option<String>,
    /// New photo URI; pass an empty value to remove it
    #[arg(long)]
    photo: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let mut config = config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.documents_dir {
        config.documents_dir = dir;
    }
    let mut service = build_service(&config);

    match cli.command {
        Command::List(args) => {
            load_contacts(&mut service)?;
            let sections = service.sections(&args.query);
            if sections.is_empty() {
                println!("No contacts to display.");
            }
            for section in sections {
                println!("{}", section.title);
                for contact in &section.data {
                    println!("  {}\t{}\t{}", contact.name, contact.phone_numbers, contact.id);
                }
            }
        }
        Command::Show { id } => {
            load_contacts(&mut service)?;
            let contact = service
                .find_contact(&id)
                .ok_or_else(|| anyhow!("Contact not found: {id}"))?;
            println!("name: {}", contact.name);
            println!("phone: {}", contact.phone_numbers);
            println!("photo: {}", contact.avatar.as_deref().unwrap_or(""));
            println!("custom: {}", contact.is_custom);
            println!("id: {}", contact.id);
        }
        Command::Add(args) => {
            let name = dialbook::normalize::compose_display_name(&args.first, &args.last);
            let id = service
                .create_custom_contact(&name, &args.phone, args.photo.as_deref())
                .context("failed to save contact")?;
            println!("{id}");
        }
        Command::Edit(args) => {
            let current = service
                .store()
                .get(&args.id)
                .with_context(|| format!("failed to read contact {}", args.id))?;
            let name = args.name.unwrap_or(current.name);
            let phone = args.phone.unwrap_or(current.phone_numbers);
            let photo = args.photo.or(current.avatar);
            let id = service
                .update_custom_contact(&args.id, &name, &phone, photo.as_deref())
                .context("failed to update contact")?;
            println!("{id}");
        }
        Command::Delete { id } => {
            service
                .delete_custom_contact(&id)
                .context("failed to delete contact")?;
        }
        Command::Call { id } => {
            load_contacts(&mut service)?;
            match service.place_call(&id, now_millis())? {
                Some(call) => println!("Calling {} at {}", call.name, call.phone_numbers),
                None => println!("No phone number for this contact."),
            }
        }
        Command::Recents(args) => {
            service.reload_recents();
            let calls = service.recent_calls_matching(&args.query);
            if calls.is_empty() {
                println!("No recent calls.");
            }
            for call in calls {
                println!(
                    "{}\t{}\t{}",
                    format_timestamp(call.timestamp),
                    call.name,
                    call.phone_numbers
                );
            }
        }
        Command::ClearRecents => {
            service
                .clear_recents()
                .context("failed to clear recent calls")?;
        }
        Command::Permission { request } => {
            let status = if request {
                service.request_permission()
            } else {
                service.get_permission_status()
            };
            println!("{status}");
            if let Some(message) = service.error() {
                eprintln!("{message}");
            }
        }
    }

    Ok(())
}

fn build_service(config: &Config) -> ContactsService {
    let address_book: Box<dyn AddressBook> = match &config.address_book {
        Some(path) => Box::new(JsonAddressBook::new(path.clone())),
        None => Box::new(NoAddressBook),
    };
    let store =
        CustomContactStore::open(&config.documents_dir).with_edit_identity(config.edit_identity);
    let recents = RecentCallStore::open(&config.documents_dir).with_limit(config.recents_limit);
    ContactsService::new(address_book, store, recents).with_alphabet(config.alphabet.clone())
}

/// Ask for permission the first time round, then load the merged list.
fn load_contacts(service: &mut ContactsService) -> Result<()> {
    if service.get_permission_status() == PermissionStatus::Undetermined {
        service.request_permission();
    }
    let reloaded = service.reload_contacts().map(|_| ());
    if let Err(err) = reloaded {
        let message = service.error().unwrap_or(err.user_message()).to_string();
        return Err(anyhow!(err).context(message));
    }
    Ok(())
}

fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

fn format_timestamp(millis: i64) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|dt| dt.format(&format).ok())
        .unwrap_or_else(|| millis.to_string())
}

fn init_tracing(level: &str) {
    let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
