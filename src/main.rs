//! `hobb` command-line entry point

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use hobb_backend::{Backend, BackendConfig};
use rolling_logger::LoggerOptions;

use hobb_inventory::commands::{
    HttpAssetUploader, HttpPersistence, LocalAssetUploader, LocalPersistence, StaticSession,
};
use hobb_inventory::models::{
    ImageFile, ImageSource, ItemId, ItemPatch, KeyboardDetails, KeycapDetails, NoteId, SwitchDetails, SwitchType,
    UserId,
};
use hobb_inventory::{
    AddOutcome, AppContext, ClientError, Entry, Inventory, InventoryType, ItemDetails, ListQuery, NewItemForm,
    Settings, SortKey,
};

#[derive(Parser)]
#[command(name = "hobb", version, about = "Track keycaps, switches and keyboards")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List a collection
    List {
        kind: InventoryType,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        switch_type: Option<SwitchType>,
        #[arg(long, default_value = "oldest")]
        sort: SortKey,
    },
    AddSwitch {
        #[command(flatten)]
        common: AddArgs,
        #[arg(long)]
        switch_type: SwitchType,
        #[arg(long)]
        manufacturer: Option<String>,
        #[arg(long)]
        quantity: Option<u32>,
        #[arg(long)]
        spring_weight: Option<u16>,
    },
    AddKeycap {
        #[command(flatten)]
        common: AddArgs,
        #[arg(long)]
        manufacturer: Option<String>,
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        material: Option<String>,
        /// `#RRGGBB`, repeatable
        #[arg(long = "color")]
        colors: Vec<String>,
        /// Repeatable
        #[arg(long = "kit")]
        kits: Vec<String>,
    },
    AddKeyboard {
        #[command(flatten)]
        common: AddArgs,
        #[arg(long)]
        layout: String,
        #[arg(long)]
        designer: Option<String>,
        #[arg(long)]
        case_material: Option<String>,
        #[arg(long)]
        plate: Option<String>,
        #[arg(long)]
        switches: Option<String>,
        #[arg(long)]
        keycaps: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        built_on: Option<NaiveDate>,
    },
    /// Rename an item or change its image link
    Edit {
        kind: InventoryType,
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
    },
    Delete {
        kind: InventoryType,
        id: String,
    },
    Note {
        #[command(subcommand)]
        action: NoteAction,
    },
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    name: String,
    #[arg(long, conflicts_with = "image_url", required_unless_present = "image_url")]
    image_file: Option<PathBuf>,
    #[arg(long)]
    image_url: Option<String>,
}

#[derive(Subcommand)]
enum NoteAction {
    Add {
        kind: InventoryType,
        item_id: String,
        text: String,
    },
    Edit {
        kind: InventoryType,
        item_id: String,
        note_id: String,
        text: String,
    },
    Delete {
        kind: InventoryType,
        item_id: String,
        note_id: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let options = LoggerOptions {
        default_level: cli.settings.log_level.clone(),
        ..LoggerOptions::default()
    };
    if let Err(e) = rolling_logger::init_logger(cli.settings.log_dir(), "hobb", options) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    if let Err(e) = run(cli).await {
        tracing::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), ClientError> {
    let ctx = build_context(&cli.settings).await?;

    match cli.command {
        Command::List {
            kind,
            search,
            switch_type,
            sort,
        } => {
            let inventory = open_loaded(&ctx, kind).await?;
            let query = ListQuery {
                search,
                switch_type,
                sort,
            };
            for entry in inventory.list(&query) {
                print_entry(&entry);
            }
        }
        Command::AddSwitch {
            common,
            switch_type,
            manufacturer,
            quantity,
            spring_weight,
        } => {
            let details = ItemDetails::Switch(SwitchDetails {
                switch_type,
                manufacturer,
                quantity,
                spring_weight,
            });
            add(&ctx, common, details).await?;
        }
        Command::AddKeycap {
            common,
            manufacturer,
            profile,
            material,
            colors,
            kits,
        } => {
            let details = ItemDetails::Keycap(KeycapDetails {
                manufacturer,
                profile,
                material,
                colors,
                kits,
            });
            add(&ctx, common, details).await?;
        }
        Command::AddKeyboard {
            common,
            layout,
            designer,
            case_material,
            plate,
            switches,
            keycaps,
            built_on,
        } => {
            let details = ItemDetails::Keyboard(KeyboardDetails {
                designer,
                layout,
                case_material,
                plate,
                switches,
                keycaps,
                built_on,
            });
            add(&ctx, common, details).await?;
        }
        Command::Edit {
            kind,
            id,
            name,
            image_url,
        } => {
            let inventory = open_loaded(&ctx, kind).await?;
            let patch = ItemPatch {
                name,
                image: image_url,
                details: None,
            };
            let saved = inventory.update_item(&ItemId::from(id.as_str()), patch).await?;
            println!("updated {} {}", saved.id, saved.name);
        }
        Command::Delete { kind, id } => {
            let inventory = open_loaded(&ctx, kind).await?;
            inventory.delete_item(&ItemId::from(id.as_str())).await?;
            println!("deleted {}", id);
        }
        Command::Note { action } => note(&ctx, action).await?,
    }
    Ok(())
}

async fn build_context(settings: &Settings) -> Result<AppContext, ClientError> {
    let session = Arc::new(StaticSession(settings.user.as_deref().map(UserId::from)));
    let config = settings.client_config();

    let ctx = match &settings.api_url {
        Some(api_url) => {
            let upload_url = settings
                .upload_url
                .clone()
                .ok_or_else(|| ClientError::Config("--upload-url is required with --api-url".to_string()))?;
            tracing::info!(api = %api_url, "Using remote persistence");
            AppContext::new(
                Arc::new(HttpPersistence::new(api_url.clone())),
                Arc::new(HttpAssetUploader::new(
                    upload_url,
                    settings.upload_preset.clone(),
                    config.max_upload_bytes,
                )),
                session,
            )
        }
        None => {
            tokio::fs::create_dir_all(&settings.data_dir)
                .await
                .map_err(|e| ClientError::Config(format!("{}: {}", settings.data_dir.display(), e)))?;
            let backend_config = BackendConfig {
                public_asset_base: settings.public_asset_base.clone(),
                max_asset_bytes: config.max_upload_bytes,
                ..BackendConfig::default()
            };
            let backend = Backend::open(&settings.data_dir, backend_config)
                .await
                .map_err(|e| ClientError::Config(e.to_string()))?;
            tracing::info!(dir = %settings.data_dir.display(), "Using local storage");
            AppContext::new(
                Arc::new(LocalPersistence::new(backend.clone())),
                Arc::new(LocalAssetUploader::new(backend.assets().clone())),
                session,
            )
        }
    };
    Ok(ctx.with_config(config))
}

async fn open_loaded(ctx: &AppContext, kind: InventoryType) -> Result<Inventory, ClientError> {
    let inventory = Inventory::open(ctx.clone(), kind)?;
    if let Err(e) = inventory.load().await {
        // Still usable: the cache keeps whatever it had
        eprintln!("warning: {}", e);
    }
    Ok(inventory)
}

async fn add(ctx: &AppContext, args: AddArgs, details: ItemDetails) -> Result<(), ClientError> {
    let kind = details.inventory_type();
    let image = match (args.image_file, args.image_url) {
        (Some(path), _) => {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| ClientError::Config(format!("{}: {}", path.display(), e)))?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            ImageSource::File(ImageFile::new(file_name, bytes))
        }
        (None, Some(url)) => ImageSource::Url(url),
        (None, None) => return Err(ClientError::Config("an image file or URL is required".to_string())),
    };

    let inventory = open_loaded(ctx, kind).await?;
    let pending = inventory.add_item(NewItemForm {
        name: args.name,
        image,
        details,
    })?;
    for entry in inventory.entries().iter().filter(|e| e.is_loading()) {
        print_entry(entry);
    }

    match pending.settle().await {
        AddOutcome::Confirmed(item) => {
            println!("added {} {}", item.id, item.name);
            Ok(())
        }
        AddOutcome::RolledBack(e) => Err(e),
    }
}

async fn note(ctx: &AppContext, action: NoteAction) -> Result<(), ClientError> {
    match action {
        NoteAction::Add { kind, item_id, text } => {
            let inventory = open_loaded(ctx, kind).await?;
            let note = inventory.add_note(&ItemId::from(item_id.as_str()), &text).await?;
            println!("note {} added", note.id);
        }
        NoteAction::Edit {
            kind,
            item_id,
            note_id,
            text,
        } => {
            let inventory = open_loaded(ctx, kind).await?;
            let note = inventory
                .edit_note(&ItemId::from(item_id.as_str()), &NoteId::from(note_id.as_str()), &text)
                .await?;
            println!("note {} updated", note.id);
        }
        NoteAction::Delete {
            kind,
            item_id,
            note_id,
        } => {
            let inventory = open_loaded(ctx, kind).await?;
            inventory
                .delete_note(&ItemId::from(item_id.as_str()), &NoteId::from(note_id.as_str()))
                .await?;
            println!("note {} deleted", note_id);
        }
    }
    Ok(())
}

fn print_entry(entry: &Entry) {
    match entry {
        Entry::Pending(placeholder) => println!("{}  {}  (saving...)", placeholder.temp_id, placeholder.name),
        Entry::Confirmed(item) => {
            let extra = match &item.details {
                ItemDetails::Switch(switch) => switch.switch_type.to_string(),
                ItemDetails::Keycap(keycap) => keycap.profile.clone().unwrap_or_default(),
                ItemDetails::Keyboard(keyboard) => keyboard.layout.clone(),
            };
            println!("{}  {}  {}  [{} notes]", item.id, item.name, extra, item.notes.len());
        }
    }
}
