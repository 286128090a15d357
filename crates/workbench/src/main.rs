mod demo;
mod logging;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use log::{error, info};

use workbench_core::dashboard::{Dashboard, LayoutBox, SerializedDashboard};
use workbench_core::kernel::constants;
use workbench_core::module_system::{InstanceTile, ModuleLookup};
use workbench_core::storage::StorageSystemError;
use workbench_core::{Result, Workbench, WorkbenchConfig, WorkbenchError};

/// Workbench: modules on dashboards, from the command line
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Directory holding the persisted layout and GUI state
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (.toml, .yaml or .json). Defaults to `workbench.toml` in the data directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Inspect registered modules
    Modules {
        #[command(subcommand)]
        command: ModulesCommand,
    },
    /// Work on the active dashboard
    Dashboard {
        #[command(subcommand)]
        command: DashboardCommand,
    },
    /// List and apply dashboard templates
    Template {
        #[command(subcommand)]
        command: TemplateCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ModulesCommand {
    /// List registered modules and their categories
    List,
}

#[derive(Subcommand, Debug)]
enum DashboardCommand {
    /// Print the instances of the active dashboard
    Show,
    /// Add an instance of a module
    Add {
        /// Name of a registered module
        module: String,
        #[command(flatten)]
        geometry: Geometry,
    },
    /// Remove an instance by id
    Remove { id: String },
    /// Remove every instance
    Clear,
    /// Write the active dashboard to a JSON file
    Export { file: PathBuf },
    /// Replace the active dashboard with the contents of a JSON file
    Import { file: PathBuf },
}

#[derive(Args, Debug)]
struct Geometry {
    #[arg(long, default_value_t = 0.0)]
    x: f64,
    #[arg(long, default_value_t = 0.0)]
    y: f64,
    #[arg(long, default_value_t = 1.0)]
    width: f64,
    #[arg(long, default_value_t = 1.0)]
    height: f64,
}

#[derive(Subcommand, Debug)]
enum TemplateCommand {
    /// List available templates
    List,
    /// Build a new active dashboard from a template
    Apply { name: String },
}

fn load_config(args: &CliArgs) -> Result<WorkbenchConfig> {
    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_DATA_DIR));
    let path = args
        .config
        .clone()
        .unwrap_or_else(|| data_dir.join(constants::DEFAULT_CONFIG_FILE));
    let mut config = WorkbenchConfig::load(&path)?;
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            logging::init(constants::DEFAULT_LOG_LEVEL);
            error!("Failed to load configuration: {}", e);
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(&config.log_level);

    match run(args.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: WorkbenchConfig) -> Result<()> {
    let workbench = Workbench::open(config, Arc::new(demo::DemoLoader::new()));
    demo::register(&workbench)?;
    workbench.load()?;

    match command {
        Commands::Modules {
            command: ModulesCommand::List,
        } => list_modules(&workbench),
        Commands::Dashboard { command } => run_dashboard(&workbench, command).await?,
        Commands::Template { command } => match command {
            TemplateCommand::List => {
                for template in workbench.template_registry().templates() {
                    println!("{:<24} {}", template.name, template.description);
                }
            }
            TemplateCommand::Apply { name } => {
                let dashboard = workbench.apply_template(&name)?;
                settle(&dashboard).await;
                workbench.save()?;
                println!("Applied template '{}' as dashboard {}", name, dashboard.id());
            }
        },
    }
    Ok(())
}

fn list_modules(workbench: &Workbench) {
    for module in workbench.module_registry().modules() {
        let definition = module.definition();
        println!(
            "{:<14} {:<6} {:<5} {}",
            definition.name(),
            definition.category(),
            definition.dev_state(),
            definition.description().unwrap_or("")
        );
    }
}

async fn run_dashboard(workbench: &Workbench, command: DashboardCommand) -> Result<()> {
    let dashboard = workbench.active_dashboard();
    match command {
        DashboardCommand::Show => {
            settle(&dashboard).await;
            show_dashboard(&dashboard);
        }
        DashboardCommand::Add { module, geometry } => {
            // Saved layouts must stay loadable, so unknown names are refused here
            if let ModuleLookup::NotFound(name) = workbench.module_registry().resolve(&module) {
                return Err(WorkbenchError::Other(format!("Unknown module '{name}'")));
            }
            let layout = LayoutBox::new(geometry.x, geometry.y, geometry.width, geometry.height);
            if !layout.is_valid() {
                return Err(WorkbenchError::Other(format!("Invalid geometry {layout:?}")));
            }
            let instance = dashboard.make_and_add_module_instance(&module, layout);
            let state = instance.module().wait_until_settled().await;
            workbench.save()?;
            println!("Added {} ({}) [{}]", instance.id(), module, state);
        }
        DashboardCommand::Remove { id } => {
            if dashboard.module_instance(&id).is_none() {
                return Err(WorkbenchError::Other(format!("No module instance '{id}'")));
            }
            dashboard.remove_module_instance(&id);
            workbench.save()?;
            println!("Removed {id}");
        }
        DashboardCommand::Clear => {
            dashboard.clear_layout();
            workbench.save()?;
            println!("Cleared dashboard {}", dashboard.id());
        }
        DashboardCommand::Export { file } => {
            let payload = dashboard.serialize_state()?;
            let text = serde_json::to_string_pretty(&payload)
                .map_err(|e| StorageSystemError::serialization("json", e))?;
            write_file(&file, &text)?;
            println!("Exported {} instance(s) to {}", payload.module_instances.len(), file.display());
        }
        DashboardCommand::Import { file } => {
            let text = fs::read_to_string(&file)
                .map_err(|e| StorageSystemError::io(e, "read_to_string", file.clone()))?;
            let payload: SerializedDashboard = serde_json::from_str(&text)
                .map_err(|e| StorageSystemError::deserialization("json", e))?;
            dashboard.deserialize_state(&payload)?;
            settle(&dashboard).await;
            workbench.save()?;
            println!("Imported {} instance(s) from {}", payload.module_instances.len(), file.display());
        }
    }
    Ok(())
}

fn write_file(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).map_err(|e| StorageSystemError::io(e, "write", path.to_path_buf()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Wait until every module on `dashboard` has finished importing.
async fn settle(dashboard: &Dashboard) {
    for instance in dashboard.module_instances() {
        instance.module().wait_until_settled().await;
    }
}

fn show_dashboard(dashboard: &Dashboard) {
    println!("Dashboard '{}' ({})", dashboard.name(), dashboard.id());
    let layout = dashboard.layout();
    if layout.is_empty() {
        println!("  (no module instances)");
        return;
    }
    let active = dashboard.active_module_instance_id();
    for element in layout {
        let Some(id) = element.module_instance_id.as_deref() else {
            continue;
        };
        let Some(instance) = dashboard.module_instance(id) else {
            continue;
        };
        let marker = if active.as_deref() == Some(id) { '*' } else { ' ' };
        let geometry = element.layout;
        println!(
            "{} {}  {:<12} {:<14} x={:.2} y={:.2} w={:.2} h={:.2}  [{}]",
            marker,
            id,
            element.module_name,
            format!("\"{}\"", instance.title()),
            geometry.rel_x,
            geometry.rel_y,
            geometry.rel_width,
            geometry.rel_height,
            instance.import_state()
        );
        match instance.tile() {
            InstanceTile::Fallback { reason, .. } => println!("    ! {reason}"),
            _ => {
                if let Some(summary) = instance.view_summary() {
                    println!("    {summary}");
                }
            }
        }
    }
}
