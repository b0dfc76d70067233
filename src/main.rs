use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::Result;
use std::io::Write;
use std::path::PathBuf;
use todostore::json::{self, LARGE_IMPORT_THRESHOLD};
use todostore::{NewTask, Partition, TaskFilter, TaskStore, TaskViewState, models};
use uuid::Uuid;

/// Page size of the incremental list views.
const PAGE_SIZE: usize = 30;

#[derive(Parser)]
#[command(name = "todostore")]
#[command(about = "Todo task store CLI - manage tasks in a local embedded database")]
#[command(version)]
struct Cli {
    /// Path to the database file (default: under the user data directory)
    #[arg(short, long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new task
    Add {
        /// Task description
        description: String,

        /// Due date (YYYY-MM-DD, default: today)
        #[arg(long)]
        due: Option<NaiveDate>,

        /// Image URI to attach
        #[arg(long, default_value = "")]
        image: String,

        /// Create the task already completed
        #[arg(long)]
        complete: bool,
    },

    /// List tasks, to-do first, then finished
    List,

    /// Toggle a task's completion state
    Toggle {
        /// Task id
        id: Uuid,
    },

    /// Delete a task
    Delete {
        /// Task id
        id: Uuid,
    },

    /// Delete all tasks
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Import tasks from a JSON file
    Import {
        /// JSON file to read
        file: PathBuf,

        /// Skip the large-file confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Export all tasks to a JSON file
    Export {
        /// JSON file to write
        file: PathBuf,
    },

    /// Show task counts
    Count,
}

fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let db_path = cli.db.unwrap_or_else(default_db_path);
    let mut store = TaskStore::open(&db_path)?;

    match cli.command {
        Commands::Add { description, due, image, complete } => {
            let task = store.create(NewTask {
                id: None,
                image_uri: image,
                description,
                due_date: due,
                complete,
            })?;
            println!("Created task {} (due {})", task.id, task.due_date);
        }
        Commands::List => {
            list_tasks(&store)?;
        }
        Commands::Toggle { id } => match store.get(id)? {
            Some(mut task) => {
                task.complete = !task.complete;
                store.update(&task)?;
                let state = if task.complete { "complete" } else { "incomplete" };
                println!("Marked {} {}", task.id, state);
            }
            None => println!("No task with id {id}"),
        },
        Commands::Delete { id } => {
            store.delete(id)?;
            println!("Deleted task {id}");
        }
        Commands::Clear { yes } => {
            if store.count(TaskFilter::All)? == 0 {
                println!("There are no tasks to clear.");
            } else if yes || confirm("Are you sure you want to clear all tasks?")? {
                store.clear()?;
                println!("All tasks cleared.");
            } else {
                println!("Clear cancelled.");
            }
        }
        Commands::Import { file, yes } => {
            let records = json::read_tasks_file(&file)?;
            if records.len() > LARGE_IMPORT_THRESHOLD
                && !yes
                && !confirm(&format!(
                    "Importing {} tasks may take a while. Continue?",
                    records.len()
                ))?
            {
                println!("Import cancelled.");
            } else {
                let count = store.import(records)?;
                println!("{} imported successfully.", format_task_count(count as u64));
            }
        }
        Commands::Export { file } => {
            let records = store.export_all()?;
            json::write_tasks_file(&file, &records)?;
            println!("Tasks exported successfully.");
        }
        Commands::Count => {
            println!("To Do:    {}", format_task_count(store.count(TaskFilter::Incomplete)?));
            println!("Finished: {}", format_task_count(store.count(TaskFilter::Complete)?));
            println!("Total:    {}", format_task_count(store.count(TaskFilter::All)?));
        }
    }

    Ok(())
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("todostore").join("tasks.db"))
        .unwrap_or_else(|| PathBuf::from("tasks.db"))
}

/// Render both partitions through the same paged view state the GUI
/// would use, one full page loop per partition.
fn list_tasks(store: &TaskStore) -> Result<()> {
    let mut view = TaskViewState::new();
    for partition in [Partition::Incomplete, Partition::Complete] {
        while view.load_more(store, partition, PAGE_SIZE)? > 0 {}
    }

    let today = models::today();

    println!("To Do ({})", format_task_count(store.count(TaskFilter::Incomplete)?));
    for task in view.items(Partition::Incomplete) {
        let due = task.due_date.to_string();
        let due = if task.due_date < today { due.red().to_string() } else { due };
        println!("  [ ] {}  {}  {}", due, task.description, task.id.to_string().dimmed());
    }

    println!("Finished ({})", format_task_count(store.count(TaskFilter::Complete)?));
    for task in view.items(Partition::Complete) {
        println!(
            "  {} {}  {}  {}",
            "[x]".green(),
            task.due_date,
            task.description,
            task.id.to_string().dimmed()
        );
    }

    Ok(())
}

fn format_task_count(count: u64) -> String {
    match count {
        0 => "no Tasks".to_string(),
        1 => "1 Task".to_string(),
        n => format!("{n} Tasks"),
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
