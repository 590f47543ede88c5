use adaptive_qf::{
    Backing, Filter, FilterConfigBuilder, FilterStats, HashMode, Insert, OpFlags,
    common::{bytes2hr, rate2hr},
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum HashArg {
    Murmur3,
    Fnv,
    Invertible,
}

impl From<HashArg> for HashMode {
    fn from(arg: HashArg) -> Self {
        match arg {
            HashArg::Murmur3 => HashMode::Murmur3,
            HashArg::Fnv => HashMode::Fnv,
            HashArg::Invertible => HashMode::Invertible,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new file-backed filter
    Create {
        /// Path to the filter file
        #[arg(short, long)]
        path: PathBuf,

        /// Quotient bits (2^qbits home slots)
        #[arg(short, long, default_value = "16")]
        qbits: u8,

        /// Remainder bits per slot
        #[arg(short, long, default_value = "8")]
        rbits: u8,

        /// Hash function for keys
        #[arg(long, value_enum, default_value = "murmur3")]
        hash: HashArg,

        /// Hash seed
        #[arg(long, default_value = "0")]
        seed: u32,

        /// Grow automatically when full
        #[arg(long)]
        auto_resize: bool,

        /// Cap on extension chunks per fingerprint
        #[arg(long)]
        max_chunks: Option<u8>,
    },

    /// Open an existing filter and perform operations
    Load {
        /// Path to the filter file
        #[arg(short, long)]
        path: PathBuf,

        #[command(subcommand)]
        operation: LoadCommands,
    },
}

#[derive(Subcommand)]
enum LoadCommands {
    /// Insert an element
    Insert {
        #[arg(short, long)]
        element: String,

        /// Number of copies
        #[arg(short, long, default_value = "1")]
        count: u64,
    },

    /// Check if an element exists
    Query {
        #[arg(short, long)]
        element: String,
    },

    /// Remove one copy of an element
    Remove {
        #[arg(short, long)]
        element: String,
    },

    /// Double the number of home slots
    Resize,

    /// Check the filter's structure
    Verify,

    /// Remove every element (with confirmation)
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Display information about the filter
    Info {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Create {
            path,
            qbits,
            rbits,
            hash,
            seed,
            auto_resize,
            max_chunks,
        } => {
            if path.exists() {
                println!("Error: Filter already exists at {}", path.display());
                println!("Use the 'load' command to operate on existing filters.");
                return Ok(());
            }

            let config = FilterConfigBuilder::default()
                .qbits(qbits)
                .rbits(rbits)
                .hash_mode(hash.into())
                .seed(seed)
                .auto_resize(auto_resize)
                .max_extension_chunks(max_chunks)
                .backing(Backing::File(path.clone()))
                .build()?;
            let filter = Filter::create(config)?;
            filter.flush()?;

            println!("Created new filter at {}", path.display());
            println!("Configuration:");
            println!("  Quotient bits: {qbits}");
            println!("  Remainder bits: {rbits}");
            println!("  Total slots: {}", filter.total_slots());
            println!("  Size: {}", bytes2hr(filter.as_bytes().len()));
        }
        Commands::Load { path, operation } => {
            handle_load_command(path, operation)?;
        }
    }

    Ok(())
}

fn handle_load_command(
    path: PathBuf,
    operation: LoadCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut filter = Filter::open(&path)?;

    match operation {
        LoadCommands::Insert { element, count } => {
            let hash = filter.hash_item(element.as_bytes());
            match filter.insert(hash, count, OpFlags::hashed())? {
                Insert::Inserted { slot, count, .. } => {
                    println!("Element '{element}' inserted ({count}x) at slot {slot}");
                }
                Insert::DuplicateOrCollision(found) => {
                    println!(
                        "Element '{element}' matches an existing entry at slot {} ({} bits)",
                        found.slot, found.length
                    );
                }
            }
        }
        LoadCommands::Query { element } => {
            let hash = filter.hash_item(element.as_bytes());
            let count = filter.count(hash, OpFlags::hashed());
            if count > 0 {
                println!("Element '{element}' exists in the filter (count {count})");
            } else {
                println!("Element '{element}' does not exist in the filter");
            }
        }
        LoadCommands::Remove { element } => {
            if filter.remove_item(element.as_bytes())? {
                println!("Element '{element}' removed");
            } else {
                println!("Element '{element}' was not in the filter");
            }
        }
        LoadCommands::Resize => {
            filter.resize()?;
            println!(
                "Resized to qbits={} rbits={} ({})",
                filter.qbits(),
                filter.rbits(),
                bytes2hr(filter.as_bytes().len())
            );
        }
        LoadCommands::Verify => {
            filter.verify()?;
            println!("Filter structure is consistent");
        }
        LoadCommands::Clear { force } => {
            if force || confirm_action("Are you sure you want to remove every element?") {
                filter.clear()?;
                println!("Filter cleared");
            } else {
                println!("Clear cancelled");
            }
        }
        LoadCommands::Info { json } => {
            let stats = filter.stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Filter Configuration:");
                println!("  Path: {}", path.display());
                println!("  Quotient bits: {}", stats.qbits);
                println!("  Remainder bits: {}", stats.rbits);
                println!("  Hash: {:?} (seed {})", filter.hash_mode(), filter.seed());
                println!("  Auto-resize: {}", stats.auto_resize);
                println!("  Max extension chunks: {}", stats.max_extension_chunks);
                println!("\nCurrent State:");
                println!("  Entries: {}", stats.entries);
                println!("  Used slots: {} / {}", stats.used_slots, stats.total_slots);
                println!("  Load factor: {:.4}", filter.load_factor());
                println!(
                    "  Estimated false positive rate: {}",
                    rate2hr(stats.false_positive_rate)
                );
                println!("  Size: {}", bytes2hr(stats.bytes));
            }
        }
    }

    filter.flush()?;
    Ok(())
}

fn confirm_action(prompt: &str) -> bool {
    use std::io::{self, Write};

    print!("{prompt} [y/N]: ");
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }

    input.trim().to_lowercase() == "y"
}
