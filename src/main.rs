use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use metro_progress::accountant::{Accountant, Policy};
use metro_progress::config::Config;
use metro_progress::export::{collect_report, export_csv, export_json};
use metro_progress::extract::{load_area_mapping, Extractor};
use metro_progress::logging::init_logger;
use metro_progress::model::{BasePlan, CountingUnit, Observation, ProgressRecord, ProgressResult};
use metro_progress::parser::IfcModel;
use metro_progress::segmentation::ClassMap;
use metro_progress::service::{ErrorBody, ProgressService};
use metro_progress::store::JsonFileStore;
use metro_progress::ui::App;

/// Picked up from the working directory when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "metro-progress.toml";

type FileAccountant = Accountant<JsonFileStore<BasePlan>, JsonFileStore<ProgressRecord>>;

#[derive(Parser, Debug)]
#[command(name = "metro-progress")]
#[command(about = "Metro Progress - track construction progress per area against BIM base plans")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding base plans and progress records
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Reconciliation policy for new observations
    #[arg(long, global = true, value_enum)]
    policy: Option<PolicyArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the named storeys and spaces of an IFC file
    Areas {
        /// Path to IFC file
        ifc: PathBuf,
    },

    /// Generate base plans for every mapped area of an IFC file
    Plan {
        /// Path to IFC file
        ifc: PathBuf,

        /// JSON object mapping photo folder names to IFC area names
        #[arg(long, value_name = "FILE")]
        area_map: PathBuf,
    },

    /// Merge one photo's detections into an area's progress
    Update {
        /// Inspection area (photo folder name)
        #[arg(long)]
        area: String,

        /// Label image produced by the segmentation model
        #[arg(long, value_name = "FILE", required_unless_present = "counts", conflicts_with = "counts")]
        mask: Option<PathBuf>,

        /// JSON object of per-class counts
        #[arg(long, value_name = "FILE")]
        counts: Option<PathBuf>,

        /// Unit of the counts (defaults to the configured unit)
        #[arg(long, value_enum)]
        unit: Option<UnitArg>,
    },

    /// Report the progress of every area with a base plan
    Report {
        /// Export to CSV
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,

        /// Export to JSON (stdout when no export is given)
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,
    },

    /// Browse area progress in the terminal
    Dashboard,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    Additive,
    #[value(name = "high_score")]
    HighScore,
}

impl From<PolicyArg> for Policy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Additive => Policy::Additive,
            PolicyArg::HighScore => Policy::HighScore,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum UnitArg {
    Instances,
    Pixels,
}

impl From<UnitArg> for CountingUnit {
    fn from(arg: UnitArg) -> Self {
        match arg {
            UnitArg::Instances => CountingUnit::Instances,
            UnitArg::Pixels => CountingUnit::Pixels,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let interactive = matches!(args.command, Command::Dashboard);
    init_logger(if interactive { "off" } else { "info" });

    let config = load_config(&args)?;

    match args.command {
        Command::Areas { ifc } => {
            let model = IfcModel::open(&ifc)?;
            print_json(&model.area_names())?;
        }
        Command::Plan { ifc, area_map } => {
            let folders = load_area_mapping(&area_map)?;
            let model = IfcModel::open(&ifc)?;
            let store = JsonFileStore::plans(&config.data_dir);
            let summary = Extractor::new(config.class_mapping()).generate_all(&model, &folders, &store)?;
            info!(
                generated = summary.generated.len(),
                missing = summary.missing.len(),
                "plan generation finished"
            );
            print_json(&summary)?;
        }
        Command::Update {
            area,
            mask,
            counts,
            unit,
        } => {
            let unit = unit.map_or(config.counting_unit, CountingUnit::from);
            match run_update(&config, &area, mask.as_deref(), counts.as_deref(), unit) {
                Ok(result) => print_json(&result)?,
                Err(err) => {
                    let message = err
                        .chain()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(": ");
                    error!(area = %area, "{message}");
                    print_json(&ErrorBody { error: message })?;
                    std::process::exit(1);
                }
            }
        }
        Command::Report { csv, json } => {
            let report = collect_report(&file_accountant(&config))?;

            if let Some(csv_path) = &csv {
                export_csv(&report, csv_path)?;
                info!("Exported to CSV: {}", csv_path.display());
            }
            if let Some(json_path) = &json {
                export_json(&report, json_path)?;
                info!("Exported to JSON: {}", json_path.display());
            }
            if csv.is_none() && json.is_none() {
                print_json(&report)?;
            }
        }
        Command::Dashboard => {
            let accountant = file_accountant(&config);
            let report = collect_report(&accountant)?;
            let source = config.data_dir.display().to_string();

            let terminal = ratatui::init();
            let result = App::new(report, source)
                .with_reload(move || collect_report(&accountant))
                .run(terminal);
            ratatui::restore();
            result?;
        }
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => Config::load(DEFAULT_CONFIG_FILE)?,
        None => Config::default(),
    };

    if let Some(dir) = &args.data_dir {
        config.data_dir.clone_from(dir);
    }
    if let Some(policy) = args.policy {
        config.policy = policy.into();
    }
    Ok(config)
}

fn file_accountant(config: &Config) -> FileAccountant {
    Accountant::new(
        JsonFileStore::plans(&config.data_dir),
        JsonFileStore::progress(&config.data_dir),
        config.policy,
    )
    .with_corrupt_policy(config.on_corrupt_progress)
}

fn run_update(
    config: &Config,
    area: &str,
    mask: Option<&Path>,
    counts: Option<&Path>,
    unit: CountingUnit,
) -> Result<ProgressResult> {
    info!(area, policy = %config.policy, %unit, "updating progress");

    if let Some(mask) = mask {
        let map = ClassMap::open(mask)
            .wrap_err_with(|| format!("failed to load mask '{}'", mask.display()))?;
        info!(width = map.width(), height = map.height(), "label map loaded");
        let service = ProgressService::new(file_accountant(config), config.label_map(), unit);
        return Ok(service.analyze_map(area, &map)?);
    }

    let path = counts.ok_or_else(|| color_eyre::eyre::eyre!("either --mask or --counts is required"))?;
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read counts '{}'", path.display()))?;
    let counts: BTreeMap<String, u64> = serde_json::from_str(&content)
        .wrap_err_with(|| format!("invalid counts '{}'", path.display()))?;

    let observation = Observation::from_counts(unit, counts);
    Ok(file_accountant(config).update(area, &observation)?)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
