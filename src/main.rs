use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use scribe_qa_tracker::abbreviations::AbbreviationRegistry;
use scribe_qa_tracker::config::AppConfig;
use scribe_qa_tracker::models::{AbbreviationKind, NewProspective, NewScribe};
use scribe_qa_tracker::prospective::ProspectiveStore;
use scribe_qa_tracker::providers::ProviderDirectory;
use scribe_qa_tracker::query::QueryLayer;
use scribe_qa_tracker::scribes::ScribeStore;
use scribe_qa_tracker::{db, http, report, schedule};

#[derive(Parser)]
#[command(name = "scribe-qa")]
#[command(about = "Quality-assurance tracker for medical scribes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load sample divisions, QA tracks, scribes and providers
    Seed,
    /// Bulk-import abbreviations from a CSV file (long_name,short_code,kind)
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Register a division or QA-track abbreviation
    AddAbbreviation {
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: String,
        /// DIV or QAT
        #[arg(long)]
        kind: String,
    },
    /// Look up an abbreviation by long name, or by short code and kind
    Lookup {
        #[arg(long, conflicts_with_all = ["code", "kind"])]
        name: Option<String>,
        #[arg(long, requires = "kind")]
        code: Option<String>,
        #[arg(long)]
        kind: Option<String>,
    },
    /// Register a new scribe
    AddScribe {
        #[arg(long)]
        name: String,
        /// Division long name
        #[arg(long)]
        division: String,
        /// QA track long name
        #[arg(long)]
        qa_track: Option<String>,
        #[arg(long)]
        solo_date: Option<NaiveDate>,
        #[arg(long)]
        training_score: Option<String>,
    },
    /// Remove a scribe profile
    RemoveScribe {
        #[arg(long)]
        name: String,
    },
    /// Print a scribe profile
    ShowScribe {
        #[arg(long)]
        name: String,
    },
    /// Update fields of a scribe profile
    UpdateScribe {
        #[arg(long)]
        name: String,
        #[arg(long)]
        solo_date: Option<NaiveDate>,
        /// Interval in months
        #[arg(long)]
        qa_track: Option<String>,
        #[arg(long)]
        provider_eval_score: Option<String>,
        #[arg(long)]
        final_training_score: Option<String>,
        /// Division long name to add
        #[arg(long)]
        add_division: Vec<String>,
        /// Division long name to remove
        #[arg(long)]
        remove_division: Vec<String>,
        #[arg(long)]
        assessor: Option<bool>,
    },
    /// Record a completed QA evaluation for a scribe
    RecordQa {
        #[arg(long)]
        name: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        score: f64,
    },
    /// Add a provider to a division
    AddProvider {
        #[arg(long)]
        name: String,
        #[arg(long)]
        division: String,
        #[arg(long)]
        subspecialty: Option<String>,
    },
    /// List providers
    ListProviders,
    /// Record a prospective QA session
    AddProspective {
        #[arg(long)]
        scribe: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        division: String,
        #[arg(long)]
        assessor: String,
        #[arg(long)]
        provider: String,
        #[arg(long, default_value = "")]
        comments: String,
    },
    /// List prospective QA sessions
    ListProspective,
    /// List scribes and providers of a division
    Roster {
        /// Division long name
        #[arg(long)]
        division: String,
    },
    /// List scribes with QAs due soon
    Due {
        #[arg(long, default_value_t = 30)]
        within_days: i64,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value_t = 30)]
        within_days: i64,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Serve the HTTP interface
    Serve {
        #[arg(long, default_value = "127.0.0.1:5000")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let pool = db::connect(&config.database_url).await?;
    db::init_db(&pool).await.context("failed to apply migrations")?;

    let registry = AbbreviationRegistry::new(pool.clone());
    let scribes = ScribeStore::new(pool.clone(), registry.clone(), config.qa_tracks()?);
    let providers = ProviderDirectory::new(pool.clone(), registry.clone());
    let prospective = ProspectiveStore::new(
        pool.clone(),
        registry.clone(),
        scribes.clone(),
        config.enforce_division_membership,
    );
    let query = QueryLayer::new(pool.clone(), registry.clone());

    match cli.command {
        Commands::InitDb => {
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&registry, &scribes, &providers).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let summary = registry.import_csv(&csv).await?;
            println!(
                "Inserted {} abbreviations from {}.",
                summary.inserted,
                csv.display()
            );
            for skipped in summary.skipped {
                println!("- skipped existing entry {skipped}");
            }
        }
        Commands::AddAbbreviation { name, code, kind } => {
            let kind: AbbreviationKind = kind.parse()?;
            let entry = registry.register(&name, &code, kind).await?;
            println!("Registered {} -> {} ({}).", entry.long_name, entry.short_code, entry.uid);
        }
        Commands::Lookup { name, code, kind } => match (name, code, kind) {
            (Some(name), _, _) => {
                let entry = registry.get(&name).await?;
                println!(
                    "{} -> {} [{}] ({})",
                    entry.long_name, entry.short_code, entry.kind, entry.uid
                );
            }
            (None, Some(code), Some(kind)) => {
                let kind: AbbreviationKind = kind.parse()?;
                let long_name = registry.resolve_to_long(&code, kind).await?;
                println!("{code} [{kind}] -> {long_name}");
            }
            _ => anyhow::bail!("pass --name, or --code together with --kind"),
        },
        Commands::AddScribe {
            name,
            division,
            qa_track,
            solo_date,
            training_score,
        } => {
            let profile = scribes
                .register(NewScribe {
                    name,
                    division,
                    qa_track,
                    solo_date,
                    training_score,
                })
                .await?;
            match profile.next_qa_date {
                Some(next) => println!("Registered {}; next QA due {next}.", profile.name),
                None => println!("Registered {}; no solo date yet.", profile.name),
            }
        }
        Commands::RemoveScribe { name } => {
            scribes.remove(&name).await?;
            println!("Removed {}.", schedule::normalize_name(&name));
        }
        Commands::ShowScribe { name } => {
            let handle = scribes.load(&name).await?;
            println!("{}", serde_json::to_string_pretty(handle.profile())?);
        }
        Commands::UpdateScribe {
            name,
            solo_date,
            qa_track,
            provider_eval_score,
            final_training_score,
            add_division,
            remove_division,
            assessor,
        } => {
            let mut handle = scribes.load(&name).await?;
            if let Some(date) = solo_date {
                handle.update_solo_date(date)?;
            }
            if let Some(raw) = qa_track {
                handle.update_qa_track(&raw)?;
            }
            if let Some(raw) = provider_eval_score {
                handle.update_provider_eval_score(&raw)?;
            }
            if let Some(raw) = final_training_score {
                handle.set_final_training_score(&raw)?;
            }
            for division in add_division {
                handle.add_division(&division).await?;
            }
            for division in remove_division {
                handle.remove_division(&division).await?;
            }
            if let Some(flag) = assessor {
                handle.set_assessor(flag);
            }
            scribes.save(&handle).await?;
            println!("Updated {}.", handle.name());
        }
        Commands::RecordQa { name, date, score } => {
            let mut handle = scribes.load(&name).await?;
            handle.record_completed_qa(date, score)?;
            scribes.save(&handle).await?;
            match handle.next_qa_date() {
                Some(next) => println!("Recorded QA #{} for {}; next due {next}.", handle.total_qa_count(), handle.name()),
                None => println!("Recorded QA #{} for {}.", handle.total_qa_count(), handle.name()),
            }
        }
        Commands::AddProvider {
            name,
            division,
            subspecialty,
        } => {
            let provider = providers.add(&name, &division, subspecialty.as_deref()).await?;
            println!("Added {} to {}.", provider.name, provider.division);
        }
        Commands::ListProviders => {
            for provider in providers.list().await? {
                match provider.subspecialty {
                    Some(sub) => println!("- {} ({}, {sub})", provider.name, provider.division),
                    None => println!("- {} ({})", provider.name, provider.division),
                }
            }
        }
        Commands::AddProspective {
            scribe,
            date,
            division,
            assessor,
            provider,
            comments,
        } => {
            let record = prospective
                .add(NewProspective {
                    scribe,
                    date,
                    division,
                    assessor,
                    provider,
                    comments,
                })
                .await?;
            println!("Recorded prospective QA {}.", record.uid);
        }
        Commands::ListProspective => {
            let records = prospective.list().await?;
            if records.is_empty() {
                println!("No prospective QAs recorded.");
                return Ok(());
            }
            for record in records {
                println!(
                    "- {} {} ({}) assessor {}, provider {} {}",
                    record.date,
                    record.scribe,
                    record.division,
                    record.assessor,
                    record.provider,
                    record.comments
                );
            }
        }
        Commands::Roster { division } => {
            let code = registry
                .resolve_to_short(&division, AbbreviationKind::Division)
                .await?;
            let roster = query.roster_for_division(&code).await?;
            println!("{division} ({code})");
            println!("Scribes: {}", roster.scribes.join(", "));
            println!("Providers: {}", roster.providers.join(", "));
        }
        Commands::Due { within_days } => {
            let due = query.due_qas(schedule::today(), within_days).await?;
            if due.is_empty() {
                println!("No QAs due in the next {within_days} days.");
                return Ok(());
            }
            for entry in due {
                println!(
                    "- {} ({}) due {} [{:?}]",
                    entry.scribe,
                    entry.divisions.join("/"),
                    entry.next_qa_date,
                    entry.status
                );
            }
        }
        Commands::Report { within_days, out } => {
            let as_of = schedule::today();
            let due = query.due_qas(as_of, within_days).await?;
            let rows = query.prospective_rows().await?;
            let report = report::build_report(as_of, within_days, &due, &rows);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Serve { bind } => {
            let state = http::AppState {
                registry,
                scribes,
                prospective,
                query,
            };
            http::serve(state, &bind).await?;
        }
    }

    Ok(())
}
