//! Command-line interface for the `directives` binary.

use crate::authoring::AuthoringService;
use crate::domain::{DirectiveId, ExampleFields, Workflow};
use crate::render;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "directives")]
#[command(about = "Author workflow directives: ordered steps and worked examples for AI tooling")]
#[command(version)]
#[command(long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("DIRECTIVES_GIT_SHA"), ")"))]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Config file (defaults to ~/.directives/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage root (overrides the config file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create, inspect and change workflows
    #[command(subcommand)]
    Workflow(WorkflowCmd),
    /// Add, edit, remove and reorder steps
    #[command(subcommand)]
    Step(StepCmd),
    /// Add, edit and remove worked examples
    #[command(subcommand)]
    Example(ExampleCmd),
}

#[derive(Subcommand)]
pub enum WorkflowCmd {
    /// Create a workflow in draft state
    Draft {
        name: String,
        #[arg(long)]
        description: String,
        /// Kebab-case id (derived from the name when omitted)
        #[arg(long)]
        id: Option<String>,
    },
    Show {
        id: String,
    },
    List,
    /// Print the workflow as an XML-tagged prompt
    Export {
        id: String,
    },
    /// Replace name and description
    Details {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
    },
    /// Set or clear the free-text body
    Content {
        id: String,
        #[arg(long, conflicts_with_all = ["file", "clear"])]
        text: Option<String>,
        #[arg(long, conflicts_with = "clear")]
        file: Option<PathBuf>,
        #[arg(long)]
        clear: bool,
    },
    Publish {
        id: String,
    },
    Archive {
        id: String,
    },
}

/// `<step>` and `--after` accept a 1-based position or a step id.
#[derive(Subcommand)]
pub enum StepCmd {
    Add {
        workflow: String,
        content: String,
        /// Insert after this step (front when omitted)
        #[arg(long)]
        after: Option<String>,
    },
    Edit {
        workflow: String,
        step: String,
        content: String,
    },
    Remove {
        workflow: String,
        step: String,
    },
    Move {
        workflow: String,
        step: String,
        /// Place after this step (front when omitted)
        #[arg(long)]
        after: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ExampleCmd {
    Add {
        workflow: String,
        #[command(flatten)]
        fields: ExampleArgs,
    },
    Edit {
        workflow: String,
        example: String,
        #[command(flatten)]
        fields: ExampleArgs,
    },
    Remove {
        workflow: String,
        example: String,
    },
}

#[derive(Args)]
pub struct ExampleArgs {
    #[arg(long)]
    pub scenario: String,
    #[arg(long)]
    pub input: String,
    #[arg(long)]
    pub output: String,
    #[arg(long)]
    pub explanation: Option<String>,
}

impl From<ExampleArgs> for ExampleFields {
    fn from(args: ExampleArgs) -> Self {
        let fields = ExampleFields::new(args.scenario, args.input, args.output);
        match args.explanation {
            Some(explanation) => fields.with_explanation(explanation),
            None => fields,
        }
    }
}

/// Runs a parsed command against the service and prints the result.
pub async fn run(command: Command, service: &AuthoringService, json: bool) -> Result<()> {
    match command {
        Command::Workflow(cmd) => run_workflow(cmd, service, json).await,
        Command::Step(cmd) => run_step(cmd, service, json).await,
        Command::Example(cmd) => run_example(cmd, service, json).await,
    }
}

async fn run_workflow(cmd: WorkflowCmd, service: &AuthoringService, json: bool) -> Result<()> {
    let workflow = match cmd {
        WorkflowCmd::Draft {
            name,
            description,
            id,
        } => service.draft(&name, &description, id.as_deref()).await?,
        WorkflowCmd::Show { id } => service.load(&parse_id(&id)?).await?,
        WorkflowCmd::List => {
            let views = service.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else {
                print!("{}", render::render_listing(&views));
            }
            return Ok(());
        }
        WorkflowCmd::Export { id } => {
            let workflow = service.load(&parse_id(&id)?).await?;
            println!("{}", render::render_prompt(&workflow));
            return Ok(());
        }
        WorkflowCmd::Details {
            id,
            name,
            description,
        } => {
            service
                .update_details(&parse_id(&id)?, &name, &description)
                .await?
        }
        WorkflowCmd::Content {
            id,
            text,
            file,
            clear,
        } => {
            let content = match (text, file, clear) {
                (_, _, true) => None,
                (Some(text), _, false) => Some(text),
                (None, Some(path), false) => Some(
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                ),
                (None, None, false) => anyhow::bail!("Pass one of --text, --file or --clear"),
            };
            service
                .update_content(&parse_id(&id)?, content.as_deref())
                .await?
        }
        WorkflowCmd::Publish { id } => service.publish(&parse_id(&id)?).await?,
        WorkflowCmd::Archive { id } => service.archive(&parse_id(&id)?).await?,
    };

    print_workflow(&workflow, json)
}

async fn run_step(cmd: StepCmd, service: &AuthoringService, json: bool) -> Result<()> {
    let workflow = match cmd {
        StepCmd::Add {
            workflow,
            content,
            after,
        } => {
            let step = service
                .add_step(&parse_id(&workflow)?, &content, after.as_deref())
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&step)?);
            } else {
                println!("Added step {} at position {}", step.id(), step.position());
            }
            return Ok(());
        }
        StepCmd::Edit {
            workflow,
            step,
            content,
        } => {
            service
                .update_step(&parse_id(&workflow)?, &step, &content)
                .await?
        }
        StepCmd::Remove { workflow, step } => {
            service.remove_step(&parse_id(&workflow)?, &step).await?
        }
        StepCmd::Move {
            workflow,
            step,
            after,
        } => {
            service
                .move_step(&parse_id(&workflow)?, &step, after.as_deref())
                .await?
        }
    };

    print_workflow(&workflow, json)
}

async fn run_example(cmd: ExampleCmd, service: &AuthoringService, json: bool) -> Result<()> {
    let workflow = match cmd {
        ExampleCmd::Add { workflow, fields } => {
            let example = service
                .add_example(&parse_id(&workflow)?, fields.into())
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&example)?);
            } else {
                println!("Added example {}", example.id());
            }
            return Ok(());
        }
        ExampleCmd::Edit {
            workflow,
            example,
            fields,
        } => {
            service
                .update_example(&parse_id(&workflow)?, &example, fields.into())
                .await?
        }
        ExampleCmd::Remove { workflow, example } => {
            service
                .remove_example(&parse_id(&workflow)?, &example)
                .await?
        }
    };

    print_workflow(&workflow, json)
}

fn parse_id(id: &str) -> Result<DirectiveId> {
    DirectiveId::parse(id).with_context(|| format!("Invalid workflow id '{}'", id))
}

fn print_workflow(workflow: &Workflow, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(workflow)?);
    } else {
        print!("{}", render::render_text(workflow));
    }
    Ok(())
}
