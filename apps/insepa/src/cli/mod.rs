//! # INSEPA CLI Module
//!
//! This module implements the CLI interface for INSEPA.
//!
//! ## Available Commands
//!
//! - `init` - Write fresh documents
//! - `status` - Show document status
//! - `mae` - List, add, remove or rename namespaces
//! - `pool` - List, add, edit or remove pool texts
//! - `segment` - Suggest sentence splits for a text
//! - `block` - Save, extend, edit and remove blocks
//! - `cb` - Configure and exercise a namespace's CB
//! - `cbc` - Store or remove CBC records
//! - `checksum` - Compute the alnulu of a text
//! - `units` - Show the units of a text

mod commands;

use crate::config::Settings;
use crate::store::DocumentStore;
use clap::{Args, Parser, Subcommand, ValueEnum};
use insepa_core::{CbStatus, EntradaField, InsepaError, SaidaField};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// INSEPA - sequential indexing of input/output blocks
///
/// Every text fragment receives dotted tokens on its namespace's unbroken
/// index line.
#[derive(Parser, Debug)]
#[command(name = "insepa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Path to an insepa.toml config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the namespace document
    #[arg(short = 'M', long, global = true)]
    pub memory: Option<PathBuf>,

    /// Path to the pool document
    #[arg(short = 'P', long, global = true)]
    pub pool: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write fresh documents
    Init {
        /// Overwrite existing documents
        #[arg(short, long)]
        force: bool,
    },

    /// Show document status
    Status,

    /// Manage namespaces ("mães")
    #[command(subcommand)]
    Mae(MaeCommand),

    /// Manage the text pool
    #[command(subcommand)]
    Pool(PoolCommand),

    /// Suggest sentence splits for a text
    Segment {
        /// Text to split
        text: String,
    },

    /// Manage blocks
    #[command(subcommand)]
    Block(BlockCommand),

    /// Configure and exercise the CB of a namespace
    #[command(subcommand)]
    Cb(CbCommand),

    /// Store or remove CBC records
    #[command(subcommand)]
    Cbc(CbcCommand),

    /// Compute the alnulu checksum of a text
    Checksum {
        /// Text to weigh
        text: String,
    },

    /// Show the units a text decomposes into
    Units {
        /// Text to split
        text: String,
    },
}

/// Namespace subcommands.
#[derive(Subcommand, Debug)]
pub enum MaeCommand {
    /// List namespaces
    List,
    /// Add a namespace
    Add {
        /// Display name
        name: String,
    },
    /// Remove a namespace (later ids shift down)
    Remove {
        /// Namespace id
        id: u64,
    },
    /// Rename a namespace
    Rename {
        /// Namespace id
        id: u64,
        /// New display name
        name: String,
    },
}

/// Pool subcommands.
#[derive(Subcommand, Debug)]
pub enum PoolCommand {
    /// List pool entries
    List,
    /// Add a text
    Add {
        /// Raw text
        text: String,
    },
    /// Replace the text at a position
    Edit {
        /// 1-based position
        position: usize,
        /// Replacement text
        text: String,
    },
    /// Remove the entry at a position (later entries are renumbered)
    Remove {
        /// 1-based position
        position: usize,
    },
}

/// Namespace selector shared by block, CB and CBC commands.
#[derive(Args, Debug, Clone, Copy)]
pub struct NamespaceArg {
    /// Namespace id
    #[arg(short = 'n', long = "mae", default_value = "0")]
    pub namespace: u64,
}

/// Block subcommands.
#[derive(Subcommand, Debug)]
pub enum BlockCommand {
    /// List the blocks of a namespace
    List {
        #[command(flatten)]
        ns: NamespaceArg,
    },
    /// Create a block from an input and zero or more outputs
    Save {
        #[command(flatten)]
        ns: NamespaceArg,
        /// Input text
        input: String,
        /// Input reaction
        #[arg(long, default_value = "")]
        reaction: String,
        /// Input context
        #[arg(long, default_value = "")]
        context: String,
        /// Output fragment (repeatable)
        #[arg(short, long = "output")]
        outputs: Vec<String>,
        /// Reaction shared by the outputs
        #[arg(long, default_value = "")]
        output_reaction: String,
        /// Context shared by the outputs
        #[arg(long, default_value = "")]
        output_context: String,
    },
    /// Append an output to an existing block
    Extend {
        #[command(flatten)]
        ns: NamespaceArg,
        /// Block id
        block: u64,
        /// Output text
        text: String,
        /// Output reaction
        #[arg(long, default_value = "")]
        reaction: String,
        /// Output context
        #[arg(long, default_value = "")]
        context: String,
    },
    /// Overwrite a field of a block's input
    EditInput {
        #[command(flatten)]
        ns: NamespaceArg,
        /// Block id
        block: u64,
        /// Field to overwrite
        #[arg(value_enum)]
        field: InputField,
        /// New value
        value: String,
    },
    /// Overwrite a field of one of a block's outputs
    EditOutput {
        #[command(flatten)]
        ns: NamespaceArg,
        /// Block id
        block: u64,
        /// 1-based output index
        output: usize,
        /// Field to overwrite
        #[arg(value_enum)]
        field: OutputField,
        /// New value
        value: String,
        /// 1-based fragment index (for `fragment`)
        #[arg(long, default_value = "1")]
        fragment: usize,
    },
    /// Remove a block (later ids shift down)
    Remove {
        #[command(flatten)]
        ns: NamespaceArg,
        /// Block id
        block: u64,
    },
    /// Remove an inclusive range of blocks, e.g. `2-5`
    RemoveRange {
        #[command(flatten)]
        ns: NamespaceArg,
        /// Range expression
        range: String,
    },
}

/// Editable input fields.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum InputField {
    Text,
    Reaction,
    Context,
}

impl From<InputField> for EntradaField {
    fn from(field: InputField) -> Self {
        match field {
            InputField::Text => Self::Text,
            InputField::Reaction => Self::Reaction,
            InputField::Context => Self::Context,
        }
    }
}

/// Editable output fields.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputField {
    Fragment,
    Reaction,
    Context,
}

impl OutputField {
    /// Resolve to a core field, attaching the fragment index when needed.
    #[must_use]
    pub fn resolve(self, fragment: usize) -> SaidaField {
        match self {
            Self::Fragment => SaidaField::FragmentAt(fragment),
            Self::Reaction => SaidaField::Reaction,
            Self::Context => SaidaField::Context,
        }
    }
}

/// CB subcommands.
#[derive(Subcommand, Debug)]
pub enum CbCommand {
    /// Set status and target block ids
    Set {
        #[command(flatten)]
        ns: NamespaceArg,
        /// disponivel | indisponivel (also: enabled, disabled)
        status: CbStatus,
        /// Comma-separated block ids, e.g. "3, 5"
        #[arg(default_value = "")]
        bids: String,
    },
    /// Register a sequence of block observations and report firings
    Trigger {
        #[command(flatten)]
        ns: NamespaceArg,
        /// Block ids, in observation order
        #[arg(required = true, num_args = 1..)]
        blocks: Vec<u64>,
    },
}

/// CBC subcommands.
#[derive(Subcommand, Debug)]
pub enum CbcCommand {
    /// Store a CBC from comma-separated block ids
    Add {
        #[command(flatten)]
        ns: NamespaceArg,
        /// Comma-separated block ids
        ids: String,
    },
    /// Remove the CBC at a 1-based index
    Remove {
        #[command(flatten)]
        ns: NamespaceArg,
        /// 1-based CBC index
        index: usize,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), InsepaError> {
    let settings = Settings::resolve(cli.config.as_deref(), cli.memory, cli.pool)?;
    let store = DocumentStore::new(&settings);
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Init { force }) => cmd_init(&store, force).await,
        Some(Commands::Status) | None => cmd_status(&store, json_mode).await,
        Some(Commands::Mae(command)) => match command {
            MaeCommand::List => cmd_mae_list(&store, json_mode).await,
            MaeCommand::Add { name } => cmd_mae_add(&store, json_mode, &name).await,
            MaeCommand::Remove { id } => cmd_mae_remove(&store, json_mode, id).await,
            MaeCommand::Rename { id, name } => {
                cmd_mae_rename(&store, json_mode, id, &name).await
            }
        },
        Some(Commands::Pool(command)) => match command {
            PoolCommand::List => cmd_pool_list(&store, json_mode).await,
            PoolCommand::Add { text } => cmd_pool_add(&store, json_mode, &text).await,
            PoolCommand::Edit { position, text } => {
                cmd_pool_edit(&store, json_mode, position, &text).await
            }
            PoolCommand::Remove { position } => {
                cmd_pool_remove(&store, json_mode, position).await
            }
        },
        Some(Commands::Segment { text }) => cmd_segment(json_mode, &text),
        Some(Commands::Block(command)) => execute_block(&store, json_mode, command).await,
        Some(Commands::Cb(command)) => match command {
            CbCommand::Set { ns, status, bids } => {
                cmd_cb_set(&store, json_mode, ns.namespace, status, &bids).await
            }
            CbCommand::Trigger { ns, blocks } => {
                cmd_cb_trigger(&store, json_mode, ns.namespace, &blocks).await
            }
        },
        Some(Commands::Cbc(command)) => match command {
            CbcCommand::Add { ns, ids } => {
                cmd_cbc_add(&store, json_mode, ns.namespace, &ids).await
            }
            CbcCommand::Remove { ns, index } => {
                cmd_cbc_remove(&store, json_mode, ns.namespace, index).await
            }
        },
        Some(Commands::Checksum { text }) => cmd_checksum(json_mode, &text),
        Some(Commands::Units { text }) => cmd_units(json_mode, &text),
    }
}

async fn execute_block(
    store: &DocumentStore,
    json_mode: bool,
    command: BlockCommand,
) -> Result<(), InsepaError> {
    match command {
        BlockCommand::List { ns } => cmd_block_list(store, json_mode, ns.namespace).await,
        BlockCommand::Save {
            ns,
            input,
            reaction,
            context,
            outputs,
            output_reaction,
            output_context,
        } => {
            let request = SaveRequest {
                input: insepa_core::Passage::new(input, reaction, context),
                outputs,
                output_reaction,
                output_context,
            };
            cmd_block_save(store, json_mode, ns.namespace, request).await
        }
        BlockCommand::Extend {
            ns,
            block,
            text,
            reaction,
            context,
        } => {
            let output = insepa_core::Passage::new(text, reaction, context);
            cmd_block_extend(store, json_mode, ns.namespace, block, output).await
        }
        BlockCommand::EditInput {
            ns,
            block,
            field,
            value,
        } => cmd_block_edit_input(store, ns.namespace, block, field.into(), &value).await,
        BlockCommand::EditOutput {
            ns,
            block,
            output,
            field,
            value,
            fragment,
        } => {
            cmd_block_edit_output(
                store,
                ns.namespace,
                block,
                output,
                field.resolve(fragment),
                &value,
            )
            .await
        }
        BlockCommand::Remove { ns, block } => {
            cmd_block_remove(store, json_mode, ns.namespace, block).await
        }
        BlockCommand::RemoveRange { ns, range } => {
            cmd_block_remove_range(store, json_mode, ns.namespace, &range).await
        }
    }
}
