use clap::{Parser, Subcommand, ValueEnum};
use std::error::Error;
use std::path::PathBuf;
use tracing::{info, warn};

use specs_report::config;
use specs_report::logging::init_logging;
use specs_report::prompt::PromptGenerator;
use specs_report::reporter::{
    ReporterConfig, ReporterEvent, ReporterKind, RunAggregator, TestResultRecord,
    parse_event_stream,
};
use specs_report::tags::{process_tags, sort_by_category_priority, tag_stats, tag_warnings};

/// Specs Report - HTML reports and AI debugging prompts for end-to-end test runs
#[derive(Parser, Debug)]
#[command(
    name = "specs-report",
    about = "Aggregate end-to-end test results into grouped HTML reports",
    after_help = "ENVIRONMENT VARIABLES:\n\
        SPECS_REPORT_KIND         Reporter variant: steps or specs (legacy: REPORTER_TYPE)\n\
        SPECS_REPORT_STEPS_DIR    Root folder of the steps report\n\
        SPECS_REPORT_SPECS_DIR    Root folder of the specs report\n\
        SPECS_REPORT_TEST_DIR     Test root used for grouping\n\
        SPECS_REPORT_STATE_FILE   Shared state file for multi-instance runs\n\
        SPECS_REPORT_RUN_ID       Run id shared by instances of one run\n\
        RUST_LOG                  Log filter (default: info)"
)]
struct Args {
    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PromptKind {
    Full,
    Quick,
    Debug,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a recorded JSON Lines event stream through the reporter
    Replay {
        /// Event stream file (one runBegin/testEnd/runEnd event per line)
        #[arg(short, long)]
        events: PathBuf,

        /// Reporter variant (default: SPECS_REPORT_KIND, then REPORTER_TYPE, then specs)
        #[arg(short, long)]
        kind: Option<ReporterKind>,

        /// Report root (default: the configured folder for the variant)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Test root used for grouping keys when the run config names none
        #[arg(long)]
        test_dir: Option<PathBuf>,

        /// Shared state file enabling load-merge-save persistence
        #[arg(long)]
        state_file: Option<PathBuf>,

        /// Run id used when the event stream carries none
        #[arg(long)]
        run_id: Option<String>,

        /// Print the final run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a diagnostic prompt for a saved test record
    Prompt {
        /// Test record as JSON
        #[arg(short, long)]
        record: PathBuf,

        /// Which prompt to generate
        #[arg(short, long, value_enum, default_value = "full")]
        kind: PromptKind,
    },

    /// Normalize and classify tags
    Tags {
        /// Raw tags, e.g. @smoke @p1 booking
        #[arg(required = true)]
        tags: Vec<String>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Some(Commands::Replay {
            events,
            kind,
            output,
            test_dir,
            state_file,
            run_id,
            json,
        }) => {
            let input = std::fs::read_to_string(&events)
                .map_err(|e| format!("Failed to read {}: {}", events.display(), e))?;
            let events = parse_event_stream(&input)?;

            let kind = kind.unwrap_or_else(config::reporter_kind);
            let mut reporter_config = ReporterConfig::from_env(kind);
            if let Some(dir) = output {
                reporter_config.output_dir = dir;
            }
            if let Some(dir) = test_dir {
                reporter_config = reporter_config.test_dir(dir);
            }
            if state_file.is_some() {
                reporter_config = reporter_config.state_file(state_file);
            }
            if run_id.is_some() {
                reporter_config = reporter_config.run_id(run_id);
            }
            let mut aggregator = RunAggregator::new(reporter_config);

            info!(events = events.len(), kind = %kind, "replaying event stream");
            let mut summary_page = None;
            for event in &events {
                if let Some(page) = aggregator.dispatch(event) {
                    summary_page = Some(page);
                }
            }
            if !events.iter().any(|e| matches!(e, ReporterEvent::RunEnd { .. })) {
                warn!("event stream has no runEnd event; summary page not written");
            }

            let summary = aggregator.summary();
            if json {
                println!("{}", serde_json::to_string_pretty(summary)?);
            } else {
                println!(
                    "Run {}: {} tests ({} passed, {} failed, {} skipped, {} flaky) in {}",
                    summary.status.map(|s| s.as_str()).unwrap_or("unfinished"),
                    summary.total,
                    summary.total_passed,
                    summary.total_failed,
                    summary.total_skipped,
                    summary.total_flaky,
                    if summary.duration.is_empty() {
                        "-"
                    } else {
                        summary.duration.as_str()
                    },
                );
                for (file, records) in &summary.grouped_results {
                    println!("  {}", file);
                    for record in records {
                        println!(
                            "    #{} [{}] {} ({})",
                            record.num, record.status, record.title, record.duration
                        );
                    }
                }
                let pages = aggregator.session().list_test_dirs()?.len();
                println!(
                    "\nReport: {} ({} test pages)",
                    aggregator.session().root.display(),
                    pages
                );
                if let Some(page) = summary_page {
                    println!("Summary: {}", page.display());
                }
            }
        }

        Some(Commands::Prompt { record, kind }) => {
            let contents = std::fs::read_to_string(&record)
                .map_err(|e| format!("Failed to read {}: {}", record.display(), e))?;
            let record: TestResultRecord = serde_json::from_str(&contents)?;

            let generator = PromptGenerator::new();
            let prompt = match kind {
                PromptKind::Full => generator.generate_full(&record),
                PromptKind::Quick => generator.generate_quick(&record),
                PromptKind::Debug => generator.generate_debug(&record),
            };
            println!("{}", prompt);
        }

        Some(Commands::Tags { tags, json }) => {
            let processed = process_tags(&tags);
            if json {
                let output = serde_json::json!({
                    "tags": processed,
                    "stats": tag_stats(&processed),
                    "warnings": tag_warnings(&processed),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                for tag in sort_by_category_priority(&processed) {
                    let validity = match &tag.error {
                        Some(error) => format!("invalid: {}", error),
                        None => "ok".to_string(),
                    };
                    println!(
                        "{:<24} {:<14} {:<10} {}",
                        tag.original,
                        tag.category_name(),
                        tag.color,
                        validity
                    );
                }
            }
        }

        None => {
            println!(
                "Specs Report - HTML reports and AI debugging prompts for end-to-end test runs"
            );
            println!();
            println!("Usage: specs-report <COMMAND>");
            println!();
            println!("Commands:");
            println!("  replay  Replay a recorded event stream and write the report");
            println!("  prompt  Print a diagnostic prompt for a saved test record");
            println!("  tags    Normalize and classify tags");
            println!();
            println!("Run with --help for more information.");
        }
    }

    Ok(())
}
