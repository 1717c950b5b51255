use std::fs;
use std::io::{self, BufRead};
use std::path::Path;

use crate::board::{Applied, Board, BoardError, BoardEvent, Intent, local_today};
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::persist::STATE_KEY;
use crate::io::store::{FileStore, KeyValueStore};
use crate::model::config::BoardConfig;
use crate::model::state::{ALL_IMPORTANT_KEY, View};
use crate::ops::project_ops::ProjectError;
use crate::ops::task_ops::{self, TaskField};
use crate::ops::{check, query};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli, data_dir: &Path, config: BoardConfig) -> CmdResult {
    let json = cli.json;
    let Some(command) = cli.command else {
        return Err("no command given (try `tb --help`)".into());
    };

    let store = FileStore::open(data_dir)?;
    // Opening the board repairs and saves it, so check reads the raw file
    if matches!(command, Commands::Check) {
        return cmd_check(&store, json);
    }
    let mut board = Board::open(store, config)?;
    // Events from loading are not the user's doing
    board.drain_events();

    match command {
        // Read commands
        Commands::Show(args) => cmd_show(&board, args, json),
        Commands::Projects => cmd_projects(&board, json),
        Commands::Check => cmd_check(board.store(), json),
        Commands::Export(args) => cmd_export(&board, args),

        // Write commands
        Commands::View(args) => cmd_view(&mut board, args, json),
        Commands::Project(cmd) => cmd_project(&mut board, cmd.action, json),
        Commands::Task(cmd) => cmd_task(&mut board, cmd.action, json),
        Commands::Sub(cmd) => cmd_sub(&mut board, cmd.action, json),

        // History
        Commands::Undo => run(&mut board, Intent::Undo, json, |a| match a {
            Applied::Stepped { moved: true } => "undone".into(),
            _ => "nothing to undo".into(),
        }),
        Commands::Redo => run(&mut board, Intent::Redo, json, |a| match a {
            Applied::Stepped { moved: true } => "redone".into(),
            _ => "nothing to redo".into(),
        }),
        Commands::Depth(args) => run(&mut board, Intent::SetMaxUndoDepth { depth: args.depth }, json, |a| {
            match a {
                Applied::Depth { depth } => format!("undo depth: {}", depth),
                _ => String::new(),
            }
        }),

        // Maintenance
        Commands::Import(args) => cmd_import(&mut board, args, json),
        Commands::Apply(args) => cmd_apply(&mut board, args, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map the CLI spelling of the all-important view to its key
fn view_key(key: &str) -> String {
    if key == "important" {
        ALL_IMPORTANT_KEY.to_string()
    } else {
        key.to_string()
    }
}

/// Apply one intent and report it: the `Applied` value as JSON, or the
/// line produced by `text` otherwise.
fn run(
    board: &mut Board<FileStore>,
    intent: Intent,
    json: bool,
    text: impl FnOnce(&Applied) -> String,
) -> CmdResult {
    let applied = board.apply(intent)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&applied)?);
    } else {
        let line = text(&applied);
        if !line.is_empty() {
            println!("{}", line);
        }
    }
    report_events(board, json);
    Ok(())
}

/// Print queued events. Rejections already surface as errors, so only
/// save failures and celebrations are shown here.
fn report_events(board: &mut Board<FileStore>, json: bool) {
    for event in board.drain_events() {
        match event {
            BoardEvent::Error { code: "persistence", message } => {
                eprintln!("warning: {}", message);
            }
            BoardEvent::Celebrate { task_id } if !json => {
                let name = board.state().find_task(&task_id).map(|t| t.name.as_str()).unwrap_or("task");
                println!("🎉 {} done!", name);
            }
            _ => {}
        }
    }
}

fn toggled(a: &Applied, subject: &str, on: &str, off: &str) -> String {
    match a {
        Applied::Toggled { value: true } => format!("{} {}", subject, on),
        Applied::Toggled { value: false } => format!("{} {}", subject, off),
        _ => String::new(),
    }
}

fn created(a: &Applied) -> String {
    match a {
        Applied::Created { id } => id.clone(),
        Applied::Project { name } => name.clone(),
        _ => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

fn cmd_show(board: &Board<FileStore>, args: ShowArgs, json: bool) -> CmdResult {
    let view = match args.view {
        Some(key) => View::from(view_key(&key)),
        None => board.state().current_view.clone(),
    };
    if !board.state().view_is_valid(&view) {
        return Err(BoardError::from(ProjectError::NotFound(view.key().to_string())).into());
    }
    let projection = query::board_view(board.state(), &view, board.today());
    if json {
        println!("{}", serde_json::to_string_pretty(&projection)?);
    } else {
        print!("{}", render_board(&projection));
    }
    Ok(())
}

fn cmd_projects(board: &Board<FileStore>, json: bool) -> CmdResult {
    if json {
        println!("{}", serde_json::to_string_pretty(&ProjectsJson::new(board.state()))?);
    } else {
        print!("{}", render_projects(board.state()));
    }
    Ok(())
}

fn cmd_check(store: &FileStore, json: bool) -> CmdResult {
    let saved = store.load(STATE_KEY)?;
    let result = check::check_saved(saved.as_deref(), local_today());
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_check(&result));
    }
    Ok(())
}

fn cmd_export(board: &Board<FileStore>, args: ExportArgs) -> CmdResult {
    let text = board.export()?;
    match args.file {
        Some(path) => {
            fs::write(&path, format!("{}\n", text)).map_err(|e| format!("could not write {}: {}", path, e))?;
            eprintln!("exported to {}", path);
        }
        None => println!("{}", text),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write command handlers
// ---------------------------------------------------------------------------

fn cmd_view(board: &mut Board<FileStore>, args: ViewArgs, json: bool) -> CmdResult {
    let key = view_key(&args.key);
    run(board, Intent::SwitchView { key: key.clone() }, json, |_| {
        format!("viewing {}", View::from(key))
    })
}

fn cmd_project(board: &mut Board<FileStore>, action: ProjectAction, json: bool) -> CmdResult {
    match action {
        ProjectAction::Add(args) => run(board, Intent::AddProject { name: args.name }, json, created),
        ProjectAction::Rename(args) => {
            let line = format!("{} → {}", args.old, args.new.trim());
            let intent = Intent::RenameProject {
                old_name: args.old,
                new_name: args.new,
            };
            run(board, intent, json, |_| line)
        }
        ProjectAction::Rm(args) => {
            let line = format!("{} deleted", args.name);
            run(board, Intent::DeleteProject { name: args.name }, json, |_| line)
        }
        ProjectAction::Pin(args) => {
            let name = args.name.clone();
            run(board, Intent::TogglePin { name: args.name }, json, |a| {
                toggled(a, &name, "pinned", "unpinned")
            })
        }
        ProjectAction::Archive(args) => {
            let line = format!("{} archived", args.name);
            run(board, Intent::ArchiveProject { name: args.name }, json, |_| line)
        }
        ProjectAction::Restore(args) => {
            let line = format!("{} restored", args.name);
            run(board, Intent::RestoreProject { name: args.name }, json, |_| line)
        }
        ProjectAction::Mv(args) => {
            let (reference, placement) = args.position.reference();
            let reference_name = reference
                .ok_or("project mv needs --before or --after")?
                .to_string();
            let line = format!("{} moved", args.name);
            let intent = Intent::MoveProject {
                name: args.name,
                reference_name,
                placement,
            };
            run(board, intent, json, |_| line)
        }
    }
}

fn cmd_task(board: &mut Board<FileStore>, action: TaskAction, json: bool) -> CmdResult {
    match action {
        TaskAction::Add(args) => {
            let project_name = match args.project {
                Some(project) => project,
                None => board
                    .state()
                    .current_view
                    .project_name()
                    .ok_or("the current view is not a project; pass --project")?
                    .to_string(),
            };
            let due_date = match args.due.as_deref() {
                Some(due) => task_ops::parse_due_input(due).map_err(BoardError::from)?,
                None => None,
            };
            let intent = Intent::AddTask {
                project_name,
                status: args.status,
                name: args.name,
                description: args.desc.unwrap_or_default(),
                due_date,
                is_important: args.important,
            };
            run(board, intent, json, created)
        }
        TaskAction::Edit(args) => {
            let field = TaskField::parse(&args.field)
                .ok_or_else(|| format!("unknown field '{}' (expected name, desc or due)", args.field))?;
            let line = format!("{} updated", args.id);
            let intent = Intent::EditTaskField {
                task_id: args.id,
                field,
                value: args.value,
            };
            run(board, intent, json, |_| line)
        }
        TaskAction::Rm(args) => {
            let line = format!("{} deleted", args.id);
            run(board, Intent::DeleteTask { task_id: args.id }, json, |_| line)
        }
        TaskAction::Dup(args) => {
            let intent = Intent::DuplicateTask {
                task_id: args.id,
                project_name: None,
            };
            run(board, intent, json, created)
        }
        TaskAction::Star(args) => {
            let id = args.id.clone();
            run(board, Intent::ToggleImportance { task_id: args.id }, json, |a| {
                toggled(a, &id, "important", "not important")
            })
        }
        TaskAction::Mv(args) => {
            let (reference, placement) = args.position.reference();
            let line = format!("{} → {}", args.id, args.status);
            let intent = Intent::MoveTask {
                reference_task_id: reference.map(str::to_string),
                task_id: args.id,
                target_status: args.status,
                placement,
            };
            run(board, intent, json, |_| line)
        }
    }
}

fn cmd_sub(board: &mut Board<FileStore>, action: SubAction, json: bool) -> CmdResult {
    match action {
        SubAction::Add(args) => {
            let intent = Intent::AddSubtask {
                task_id: args.task,
                text: args.text,
            };
            run(board, intent, json, created)
        }
        SubAction::Done(args) => {
            let sub = args.sub.clone();
            let intent = Intent::ToggleSubtaskDone {
                task_id: args.task,
                subtask_id: args.sub,
            };
            run(board, intent, json, |a| toggled(a, &sub, "done", "not done"))
        }
        SubAction::Rm(args) => {
            let line = format!("{} deleted", args.sub);
            let intent = Intent::DeleteSubtask {
                task_id: args.task,
                subtask_id: args.sub,
            };
            run(board, intent, json, |_| line)
        }
        SubAction::Dup(args) => {
            let intent = Intent::DuplicateSubtask {
                task_id: args.task,
                subtask_id: args.sub,
            };
            run(board, intent, json, created)
        }
        SubAction::Convert(args) => {
            let intent = Intent::ConvertSubtaskToTask {
                task_id: args.task,
                subtask_id: args.sub,
            };
            run(board, intent, json, created)
        }
        SubAction::Mv(args) => {
            let (reference, placement) = args.position.reference();
            let line = format!("{} moved", args.sub);
            let intent = Intent::MoveSubtask {
                reference_subtask_id: reference.map(str::to_string),
                subtask_id: args.sub,
                source_task_id: args.from,
                target_task_id: args.to,
                placement,
            };
            run(board, intent, json, |_| line)
        }
    }
}

// ---------------------------------------------------------------------------
// Maintenance handlers
// ---------------------------------------------------------------------------

fn cmd_import(board: &mut Board<FileStore>, args: ImportArgs, json: bool) -> CmdResult {
    let text = fs::read_to_string(&args.file).map_err(|e| format!("could not read {}: {}", args.file, e))?;
    board.import_str(&text)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&ProjectsJson::new(board.state()))?);
    } else {
        println!("imported {} projects", board.state().projects.len());
    }
    report_events(board, json);
    Ok(())
}

/// Apply newline-delimited JSON intents in one session, so undo and redo
/// see the earlier lines. Blank lines are skipped. A malformed or rejected
/// line is reported and the rest still run.
fn cmd_apply(board: &mut Board<FileStore>, args: ApplyArgs, json: bool) -> CmdResult {
    let input: Box<dyn BufRead> = match &args.file {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| format!("could not read {}: {}", path, e))?;
            Box::new(io::Cursor::new(text))
        }
        None => Box::new(io::stdin().lock()),
    };

    let mut failed = 0;
    for (index, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let number = index + 1;
        let outcome = serde_json::from_str::<Intent>(&line)
            .map_err(|e| ErrorJson {
                code: "bad_intent".to_string(),
                message: e.to_string(),
            })
            .and_then(|intent| {
                board.apply(intent).map_err(|e| ErrorJson {
                    code: e.code().to_string(),
                    message: e.to_string(),
                })
            });

        let (applied, error) = match outcome {
            Ok(applied) => (Some(applied), None),
            Err(error) => {
                failed += 1;
                (None, Some(error))
            }
        };
        if json {
            let record = ApplyLineJson {
                line: number,
                applied,
                error,
            };
            println!("{}", serde_json::to_string(&record)?);
        } else if let Some(error) = error {
            println!("{}: error [{}]: {}", number, error.code, error.message);
        } else if let Some(applied) = applied {
            println!("{}: {}", number, serde_json::to_string(&applied)?);
        }
        report_events(board, json);
    }

    if failed > 0 {
        return Err(format!("{} intent(s) failed", failed).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::task_ops::TaskError;

    #[test]
    fn important_alias_maps_to_sentinel() {
        assert_eq!(view_key("important"), ALL_IMPORTANT_KEY);
        assert_eq!(view_key("Work"), "Work");
    }

    #[test]
    fn toggled_lines() {
        assert_eq!(toggled(&Applied::Toggled { value: true }, "t1", "on", "off"), "t1 on");
        assert_eq!(toggled(&Applied::Toggled { value: false }, "t1", "on", "off"), "t1 off");
        assert_eq!(toggled(&Applied::Ok, "t1", "on", "off"), "");
    }

    #[test]
    fn created_prints_id_or_name() {
        assert_eq!(created(&Applied::Created { id: "abc".into() }), "abc");
        assert_eq!(created(&Applied::Project { name: "Work".into() }), "Work");
    }

    #[test]
    fn due_input_errors_are_task_errors() {
        let err = task_ops::parse_due_input("soon").map_err(BoardError::from).unwrap_err();
        assert!(matches!(err, BoardError::Task(TaskError::InvalidDueDate(_))));
    }
}
