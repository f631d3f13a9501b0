use anyhow::Result;
use clap::{Parser, Subcommand};
use eagle_client::client::{AddFromPath, AddFromUrl, EagleClient, Folder, Item};
use eagle_client::config::Config;
use eagle_client::scan::scan_library;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "eagle-cli",
    version,
    about = "Talk to a running Eagle app, or scan an Eagle library on disk"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Eagle API base URL, e.g. http://localhost:41595 (overrides config)
    #[arg(long, value_name = "URL", global = true)]
    host: Option<String>,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default config.json and exit
    Init,
    /// Show the running Eagle version
    Info,
    /// List items in the current library
    List {
        #[arg(long, default_value_t = 200)]
        limit: usize,
        /// Keep only items whose name starts with this
        #[arg(long, default_value = "")]
        prefix: String,
    },
    /// Add an image from a URL
    AddUrl {
        url: String,
        #[arg(long)]
        name: String,
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
        #[arg(long, default_value = "")]
        website: String,
        #[arg(long, default_value = "")]
        annotation: String,
        /// Folder id to add the image to
        #[arg(long)]
        folder: Option<String>,
    },
    /// Add a local file
    AddPath {
        path: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
        #[arg(long, default_value = "")]
        website: String,
        #[arg(long, default_value = "")]
        annotation: String,
        #[arg(long)]
        folder: Option<String>,
    },
    /// Replace the tags of an item
    Tag {
        id: String,
        tags: Vec<String>,
    },
    /// Move items to the trash
    Trash {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Show the folder tree
    Folders,
    /// Create a folder
    CreateFolder {
        name: String,
        /// Parent folder id
        #[arg(long)]
        parent: Option<String>,
    },
    /// Rename a folder
    RenameFolder { id: String, name: String },
    /// Show the current library
    Library,
    /// List recently opened libraries
    History,
    /// Switch Eagle to another library
    SwitchLibrary { path: PathBuf },
    /// Read item metadata straight from a library folder on disk
    Scan {
        library: PathBuf,
        /// Keep only items whose name starts with this (repeatable)
        #[arg(long = "prefix", value_name = "PREFIX")]
        prefixes: Vec<String>,
        /// Number of files read concurrently
        #[arg(long)]
        workers: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle init
    if let Command::Init = cli.command {
        let config = Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;
    let eagle = match cli.host {
        Some(ref host) => EagleClient::with_host(host.as_str()),
        None => EagleClient::from_config(&config)?,
    };
    log::debug!("Eagle API: {}", eagle.host());

    match cli.command {
        // Handled before the config is loaded.
        Command::Init => {}
        Command::Info => {
            let info = eagle.application_info().await?;
            if cli.json {
                print_json(&info)?;
            } else {
                log::info!("Eagle {} ({})", info.version, info.platform);
            }
        }
        Command::List { limit, prefix } => {
            let items = eagle.list_items_with_prefix(limit, &prefix).await?;
            print_items(&items, cli.json)?;
        }
        Command::AddUrl {
            url,
            name,
            tags,
            website,
            annotation,
            folder,
        } => {
            let mut item = AddFromUrl::new(url, name)
                .tags(tags)
                .website(website)
                .annotation(annotation);
            item.folder_id = folder;
            report_added(eagle.add_from_url(&item).await?);
        }
        Command::AddPath {
            path,
            name,
            tags,
            website,
            annotation,
            folder,
        } => {
            let path = std::fs::canonicalize(&path).unwrap_or(path);
            let mut item = AddFromPath::new(&path, name)
                .tags(tags)
                .website(website)
                .annotation(annotation);
            item.folder_id = folder;
            report_added(eagle.add_from_path(&item).await?);
        }
        Command::Tag { id, tags } => {
            let item = eagle.set_tags(&id, &tags).await?;
            if cli.json {
                print_json(&item)?;
            } else {
                log::info!("{}: {}", item.id, item.tags.join(", "));
            }
        }
        Command::Trash { ids } => {
            eagle.move_to_trash(&ids).await?;
            log::info!("Moved {} item(s) to trash", ids.len());
        }
        Command::Folders => {
            let folders = eagle.list_folders().await?;
            if cli.json {
                print_json(&folders)?;
            } else {
                for folder in &folders {
                    print_folder(folder, 0);
                }
            }
        }
        Command::CreateFolder { name, parent } => {
            let folder = eagle.create_folder(&name, parent.as_deref()).await?;
            if cli.json {
                print_json(&folder)?;
            } else {
                log::info!("Created folder {} ({})", folder.name, folder.id);
            }
        }
        Command::RenameFolder { id, name } => {
            let folder = eagle.rename_folder(&id, &name).await?;
            log::info!("Renamed folder {} to {}", folder.id, folder.name);
        }
        Command::Library => {
            let info = eagle.library_info().await?;
            if cli.json {
                print_json(&info)?;
            } else {
                if let Some(ref library) = info.library {
                    log::info!("Library: {} ({})", library.name, library.path);
                }
                log::info!(
                    "{} folder(s), {} smart folder(s)",
                    info.folders.len(),
                    info.smart_folders.len()
                );
            }
        }
        Command::History => {
            let history = eagle.library_history().await?;
            if cli.json {
                print_json(&history)?;
            } else {
                for path in &history {
                    println!("{path}");
                }
            }
        }
        Command::SwitchLibrary { path } => {
            eagle.switch_library(&path).await?;
        }
        Command::Scan {
            library,
            prefixes,
            workers,
        } => {
            let mut options = config.scan.options();
            if !prefixes.is_empty() {
                options.name_prefixes = prefixes;
            }
            if let Some(workers) = workers {
                options.max_workers = workers;
            }

            let report = scan_library(&library, &options).await?;

            if cli.json {
                let json_results: Vec<serde_json::Value> = report
                    .items
                    .iter()
                    .map(|item| {
                        serde_json::json!({
                            "path": item.path.display().to_string(),
                            "metadata": item.metadata,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&json_results)?);
            } else {
                for item in &report.items {
                    println!(
                        "{}\t{}\t{}",
                        item.id().unwrap_or("-"),
                        item.name().unwrap_or("-"),
                        item.tags().join(", ")
                    );
                }
            }

            // Summary
            log::info!(
                "Done: {} item(s), {} filtered, {} unreadable",
                report.items.len(),
                report.filtered,
                report.skipped.len()
            );
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_items(items: &[Item], json: bool) -> Result<()> {
    if json {
        return print_json(items);
    }
    for item in items {
        println!("{}\t{}\t{}", item.id, item.name, item.tags.join(", "));
    }
    log::info!("{} item(s)", items.len());
    Ok(())
}

fn print_folder(folder: &Folder, depth: usize) {
    println!("{}{} ({})", "  ".repeat(depth), folder.name, folder.id);
    for child in &folder.children {
        print_folder(child, depth + 1);
    }
}

fn report_added(id: Option<String>) {
    match id {
        Some(id) => log::info!("Added item {id}"),
        None => log::info!("Added"),
    }
}
