use clap::{Args, Parser, Subcommand};

use crate::model::task::Status;
use crate::ops::reorder::Placement;

#[derive(Parser)]
#[command(name = "tb", about = concat!("tb v", env!("CARGO_PKG_VERSION"), " - a task board with undo"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory
    #[arg(short = 'C', long = "data-dir", global = true)]
    pub data_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the board for the current view, or for VIEW
    Show(ShowArgs),
    /// List projects: pinned, unpinned, archived
    Projects,
    /// Switch the current view (project name, or "important")
    View(ViewArgs),
    /// Project management
    Project(ProjectCmd),
    /// Task management
    Task(TaskCmd),
    /// Subtask management
    Sub(SubCmd),
    /// Undo the last change made in this session
    Undo,
    /// Redo the last undone change in this session
    Redo,
    /// Set the maximum undo depth (1-100)
    Depth(DepthArgs),
    /// Write the board as JSON to FILE or stdout
    Export(ExportArgs),
    /// Replace the board with a JSON file
    Import(ImportArgs),
    /// Apply JSON-lines intents from FILE or stdin in one session
    Apply(ApplyArgs),
    /// Validate board integrity
    Check,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ShowArgs {
    /// Project name or "important" (default: current view)
    pub view: Option<String>,
}

#[derive(Args)]
pub struct ViewArgs {
    /// Project name or "important"
    pub key: String,
}

// ---------------------------------------------------------------------------
// Project args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ProjectCmd {
    #[command(subcommand)]
    pub action: ProjectAction,
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a project and switch to it
    Add(NameArg),
    /// Rename a project
    Rename(RenameArgs),
    /// Delete a project and its tasks
    Rm(NameArg),
    /// Toggle a project's pinned flag
    Pin(NameArg),
    /// Archive (hide) a project
    Archive(NameArg),
    /// Restore an archived project
    Restore(NameArg),
    /// Reorder an unpinned project
    Mv(ProjectMvArgs),
}

#[derive(Args)]
pub struct NameArg {
    pub name: String,
}

#[derive(Args)]
pub struct RenameArgs {
    pub old: String,
    pub new: String,
}

#[derive(Args)]
pub struct ProjectMvArgs {
    /// Project to move
    pub name: String,
    #[command(flatten)]
    pub position: PositionArgs,
}

/// Where to drop an item relative to a peer
#[derive(Args)]
pub struct PositionArgs {
    /// Place before this item
    #[arg(long, conflicts_with = "after")]
    pub before: Option<String>,
    /// Place after this item
    #[arg(long)]
    pub after: Option<String>,
}

impl PositionArgs {
    /// The reference item and which side of it
    pub fn reference(&self) -> (Option<&str>, Placement) {
        match (&self.before, &self.after) {
            (Some(id), _) => (Some(id), Placement::Before),
            (None, Some(id)) => (Some(id), Placement::After),
            (None, None) => (None, Placement::Before),
        }
    }
}

// ---------------------------------------------------------------------------
// Task args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TaskCmd {
    #[command(subcommand)]
    pub action: TaskAction,
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task
    Add(TaskAddArgs),
    /// Edit a task field (name, desc, due)
    Edit(TaskEditArgs),
    /// Delete a task
    Rm(TaskIdArg),
    /// Duplicate a task
    Dup(TaskIdArg),
    /// Toggle a task's important flag
    Star(TaskIdArg),
    /// Move a task to a column, or next to a task in the same column
    Mv(TaskMvArgs),
}

#[derive(Args)]
pub struct TaskIdArg {
    pub id: String,
}

#[derive(Args)]
pub struct TaskAddArgs {
    /// Task name
    pub name: String,
    /// Project (default: current view)
    #[arg(short, long)]
    pub project: Option<String>,
    /// Column: backlog, todo, inprogress, done
    #[arg(short, long, default_value = "backlog")]
    pub status: Status,
    /// Description
    #[arg(short, long)]
    pub desc: Option<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
    /// Mark important
    #[arg(long)]
    pub important: bool,
}

#[derive(Args)]
pub struct TaskEditArgs {
    pub id: String,
    /// name, desc or due
    pub field: String,
    /// New value (empty clears desc and due)
    pub value: String,
}

#[derive(Args)]
pub struct TaskMvArgs {
    pub id: String,
    /// Target column
    pub status: Status,
    #[command(flatten)]
    pub position: PositionArgs,
}

// ---------------------------------------------------------------------------
// Subtask args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct SubCmd {
    #[command(subcommand)]
    pub action: SubAction,
}

#[derive(Subcommand)]
pub enum SubAction {
    /// Add a subtask to a task
    Add(SubAddArgs),
    /// Toggle a subtask's completed flag
    Done(SubIdArgs),
    /// Delete a subtask
    Rm(SubIdArgs),
    /// Duplicate a subtask
    Dup(SubIdArgs),
    /// Turn a subtask into a backlog task
    Convert(SubIdArgs),
    /// Move a subtask within or between tasks
    Mv(SubMvArgs),
}

#[derive(Args)]
pub struct SubAddArgs {
    /// Parent task ID
    pub task: String,
    pub text: String,
}

#[derive(Args)]
pub struct SubIdArgs {
    /// Parent task ID
    pub task: String,
    /// Subtask ID
    pub sub: String,
}

#[derive(Args)]
pub struct SubMvArgs {
    /// Subtask ID
    pub sub: String,
    /// Task it currently belongs to
    pub from: String,
    /// Task to move it into
    pub to: String,
    #[command(flatten)]
    pub position: PositionArgs,
}

// ---------------------------------------------------------------------------
// History and maintenance args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct DepthArgs {
    pub depth: usize,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output file (default: stdout)
    pub file: Option<String>,
}

#[derive(Args)]
pub struct ImportArgs {
    pub file: String,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Input file (default: stdin)
    pub file: Option<String>,
}
