use std::{
    fs::{self, File},
    io::BufWriter,
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use jiff::Timestamp;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::Config,
    models::{
        contract::ContractStatus,
        draft::{MilestoneField, SectionKey, ServiceField, TextField},
        store::Store,
    },
    notifications::{ConsoleNotifier, Dispatcher},
    render::{
        ContractDocument, Provider,
        html::render_html,
        layout::{PageGeometry, render_paginated},
        pdf::{pdf_file_name, write_pdf},
    },
    services::{
        contracts::{
            CreateContractError, CreateContractParameters, TransitionError, TransitionParameters,
            create_contract, get_contract, list_contracts, list_contracts_by_status, mark_sent,
            mark_signed, status_counts,
        },
        drafts::{init_draft, load_draft, update_draft},
    },
    storage::{Storage, json::JsonFileStorage},
};

mod config;
mod models;
mod notifications;
mod render;
mod services;
mod storage;
mod ui;

#[derive(Parser)]
#[command(
    name = "ctr",
    about = "Generate web services contracts and track them through signing"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit a contract draft file
    #[command(subcommand)]
    Draft(DraftCommands),

    #[command(flatten)]
    Contract(ContractCommands),
}

#[derive(Subcommand)]
enum ContractCommands {
    /// Issue a contract from a draft file
    New {
        /// Draft JSON file
        file: PathBuf,
    },

    /// List contracts, newest first
    List {
        /// Only show contracts with this status
        #[arg(short, long, value_enum)]
        status: Option<StatusFilter>,
    },

    /// Show one contract
    Show { contract_id: String },

    /// Send a draft contract for signing
    Send { contract_id: String },

    /// Record the client's signature
    Sign { contract_id: String },

    /// Print the contract HTML as it was issued
    Preview {
        contract_id: String,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Export the contract as a paginated PDF
    Pdf {
        contract_id: String,

        /// Directory to write Contract-<id>.pdf into
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
enum DraftCommands {
    /// Create a draft file with default milestones and terms
    Init { file: PathBuf },

    /// Set a text field (e.g. client-name, total-cost, contract-date)
    Set {
        file: PathBuf,
        field: TextField,
        value: String,
    },

    /// Toggle a service category or option (e.g. design, design.custom-mockups)
    Service {
        file: PathBuf,
        service: ServiceField,
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Include or exclude a section (e.g. warranty, timeline)
    Section {
        file: PathBuf,
        section: SectionKey,
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Append a milestone
    MilestoneAdd { file: PathBuf, name: String },

    /// Set a field of milestone <number> (1-based)
    MilestoneSet {
        file: PathBuf,
        number: usize,
        field: MilestoneField,
        value: String,
    },

    /// Render the draft as HTML without issuing it
    Preview {
        file: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

impl Toggle {
    fn is_on(self) -> bool {
        matches!(self, Toggle::On)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusFilter {
    Draft,
    Sent,
    Signed,
}

impl From<StatusFilter> for ContractStatus {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::Draft => ContractStatus::Draft,
            StatusFilter::Sent => ContractStatus::SentForSigning,
            StatusFilter::Signed => ContractStatus::Signed,
        }
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ctr=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let provider = config.provider();

    match cli.command {
        // Draft editing never touches the contract store
        Some(Commands::Draft(command)) => run_draft_command(command, &provider),
        Some(Commands::Contract(command)) => {
            run_contract_command(Some(command), &config, &provider)
        }
        None => run_contract_command(None, &config, &provider),
    }
}

/// `None` shows the dashboard.
fn run_contract_command(
    command: Option<ContractCommands>,
    config: &Config,
    provider: &Provider,
) {
    std::fs::create_dir_all(&config.data_dir).unwrap_or_else(|e| {
        eprintln!("Error: Failed to create data directory: {}", e);
        std::process::exit(1);
    });

    let storage = JsonFileStorage::new(config.store_path());

    let mut store = match storage.load() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: Failed to load store: {}", e);
            std::process::exit(1);
        }
    };

    let dispatcher = Dispatcher::new(
        Arc::new(ConsoleNotifier),
        Duration::from_millis(config.notification_delay_ms),
    );
    let now = Timestamp::now();

    match command {
        None => {
            let contracts = list_contracts(&store);

            println!("\n  {}\n", "CONTRACTS".cyan().bold());
            ui::render_status_counts(status_counts(&store));
            println!();

            if contracts.is_empty() {
                println!("  No contracts yet. Create a draft with `ctr draft init <file>`.");
            } else {
                for contract in contracts {
                    ui::render_contract_line(contract, now);
                }
            }
            println!();
        }
        Some(ContractCommands::New { file }) => {
            let draft = load_draft(&file).unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            });

            let params = CreateContractParameters {
                draft,
                provider,
                signing_base_url: &config.signing_base_url,
            };
            match create_contract(&mut store, &storage, params, now, &mut rand::rng()) {
                Ok(contract) => {
                    println!("✓ Contract {} created", contract.contract_id.bold());
                    println!("  {} {}", "Signing link:".dimmed(), contract.signable_url);
                }
                Err(CreateContractError::Validation(e)) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
                Err(CreateContractError::IdentifierExhausted) => {
                    eprintln!("Error: Could not generate a unique contract identifier, try again");
                    std::process::exit(1);
                }
                Err(CreateContractError::Storage(e)) => {
                    eprintln!("Error: Failed to save contract: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(ContractCommands::List { status }) => {
            let (title, contracts) = match status {
                Some(filter) => {
                    let status = ContractStatus::from(filter);
                    (
                        ui::status_label(status),
                        list_contracts_by_status(&store, status),
                    )
                }
                None => ("All", list_contracts(&store)),
            };

            if contracts.is_empty() {
                println!("No contracts found");
            } else {
                ui::render_view_header(title, contracts.len());
                for contract in contracts {
                    ui::render_contract_line(contract, now);
                }
            }
        }
        Some(ContractCommands::Show { contract_id }) => {
            match get_contract(&store, &contract_id) {
                Some(contract) => ui::render_contract_details(contract, now),
                None => exit_contract_not_found(&store, &contract_id),
            }
        }
        Some(ContractCommands::Send { contract_id }) => {
            let params = TransitionParameters {
                contract_id: &contract_id,
                owner_email: &config.owner_email,
                now,
            };
            match mark_sent(&mut store, &storage, &dispatcher, params) {
                Ok(contract) => {
                    println!("✓ Contract {} sent for signing", contract.contract_id.bold());
                    if let Some(expires_at) = contract.expires_at {
                        println!(
                            "  {} {}",
                            "Signing link expires".dimmed(),
                            ui::format_date(expires_at)
                        );
                    }
                }
                Err(e) => exit_transition_error(&store, e),
            }
        }
        Some(ContractCommands::Sign { contract_id }) => {
            let params = TransitionParameters {
                contract_id: &contract_id,
                owner_email: &config.owner_email,
                now,
            };
            match mark_signed(&mut store, &storage, &dispatcher, params) {
                Ok(contract) => {
                    println!("✓ Contract {} signed", contract.contract_id.bold());
                }
                Err(e) => exit_transition_error(&store, e),
            }
        }
        Some(ContractCommands::Preview { contract_id, out }) => {
            match get_contract(&store, &contract_id) {
                Some(contract) => write_output(&contract.content, out),
                None => exit_contract_not_found(&store, &contract_id),
            }
        }
        Some(ContractCommands::Pdf {
            contract_id,
            out_dir,
        }) => {
            let Some(contract) = get_contract(&store, &contract_id) else {
                exit_contract_not_found(&store, &contract_id);
            };

            let document = ContractDocument::issued(contract);
            let path = out_dir.join(pdf_file_name(&contract.contract_id));

            let result = render_paginated(&document).and_then(|pages| {
                let file = File::create(&path)?;
                write_pdf(&pages, PageGeometry::A4, &mut BufWriter::new(file))?;
                Ok(pages.len())
            });
            match result {
                Ok(page_count) => {
                    println!(
                        "✓ Exported {} ({} pages)",
                        path.display().to_string().bold(),
                        page_count
                    );
                }
                Err(e) => {
                    eprintln!("Error: Failed to export PDF: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    dispatcher.wait();
}

fn run_draft_command(command: DraftCommands, provider: &Provider) {
    let result = match command {
        DraftCommands::Init { file } => {
            let today = jiff::Zoned::now().date();
            init_draft(&file, today).map(|_| format!("✓ Draft written to {}", file.display()))
        }
        DraftCommands::Set { file, field, value } => {
            update_draft(&file, |draft| draft.set_text(field, &value))
                .map(|_| format!("✓ {} set", field.key()))
        }
        DraftCommands::Service {
            file,
            service,
            state,
        } => update_draft(&file, |draft| {
            draft.set_service(service, state.is_on());
            Ok(())
        })
        .map(|_| format!("✓ Service {}", if state.is_on() { "enabled" } else { "disabled" })),
        DraftCommands::Section {
            file,
            section,
            state,
        } => update_draft(&file, |draft| {
            draft.set_section(section, state.is_on());
            Ok(())
        })
        .map(|_| {
            format!(
                "✓ Section {} {}",
                section.title(),
                if state.is_on() { "included" } else { "excluded" }
            )
        }),
        DraftCommands::MilestoneAdd { file, name } => {
            update_draft(&file, |draft| Ok(draft.add_milestone(&name)))
                .map(|number| format!("✓ Milestone {} added", number))
        }
        DraftCommands::MilestoneSet {
            file,
            number,
            field,
            value,
        } => update_draft(&file, |draft| draft.set_milestone(number, field, &value))
            .map(|_| format!("✓ Milestone {} updated", number)),
        DraftCommands::Preview { file, out } => match load_draft(&file) {
            Ok(draft) => {
                let contract_id = if draft.project.contract_number.trim().is_empty() {
                    "DRAFT"
                } else {
                    draft.project.contract_number.trim()
                };
                let html = render_html(&ContractDocument {
                    contract_id,
                    draft: &draft,
                    provider,
                });
                write_output(&html, out);
                return;
            }
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(message) => println!("{}", message),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn write_output(content: &str, out: Option<PathBuf>) {
    match out {
        Some(path) => {
            fs::write(&path, content).unwrap_or_else(|e| {
                eprintln!("Error: Failed to write '{}': {}", path.display(), e);
                std::process::exit(1);
            });
            println!("✓ Written to {}", path.display());
        }
        None => print!("{}", content),
    }
}

fn exit_contract_not_found(store: &Store, contract_id: &str) -> ! {
    eprintln!("Error: Contract '{}' not found", contract_id);

    let contracts = list_contracts(store);
    if !contracts.is_empty() {
        eprintln!("\nAvailable contracts:");
        for contract in contracts.iter().take(10) {
            eprintln!("  - {} ({})", contract.contract_id, contract.draft.client.name);
        }
    }
    std::process::exit(1);
}

fn exit_transition_error(store: &Store, error: TransitionError) -> ! {
    match error {
        TransitionError::ContractNotFound(contract_id) => {
            exit_contract_not_found(store, &contract_id)
        }
        TransitionError::InvalidTransition { contract, from, to } => {
            eprintln!(
                "Error: Contract '{}' is {} and cannot become {}",
                contract,
                ui::status_label(from),
                ui::status_label(to)
            );
        }
        TransitionError::Timestamp(e) => {
            eprintln!("Error: {}", e);
        }
        TransitionError::Storage(e) => {
            eprintln!("Error: Failed to save contract: {}", e);
        }
    }
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_draft_and_contract_commands_parse_to_their_own_branch() {
        let cli = Cli::try_parse_from(["ctr", "draft", "init", "draft.json"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Draft(DraftCommands::Init { .. }))
        ));

        let cli = Cli::try_parse_from(["ctr", "send", "CTR-1"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Contract(ContractCommands::Send { ref contract_id })) if contract_id == "CTR-1"
        ));

        let cli = Cli::try_parse_from(["ctr"]).unwrap();
        assert!(cli.command.is_none());
    }
}
