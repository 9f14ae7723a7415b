//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Mutating commands run inside `DocumentStore::transact`; read-only
//! commands use `DocumentStore::load`.

use crate::store::DocumentStore;
use insepa_core::{
    CbStatus, EntradaField, InsepaError, NamespaceCursor, Passage, SaidaField, Session,
    UnitTokenizer, checksum,
};

/// Print a JSON value for `--json-mode`.
fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, InsepaError> {
    serde_json::to_value(value).map_err(|e| InsepaError::SerializationError(e.to_string()))
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Write fresh documents.
pub async fn cmd_init(store: &DocumentStore, force: bool) -> Result<(), InsepaError> {
    if !store.init(force).await? {
        return Err(InsepaError::IoError(
            "Documents already exist. Use --force to overwrite.".to_string(),
        ));
    }

    println!(
        "Initialized {:?} and {:?}",
        store.memory_path(),
        store.pool_path()
    );
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show document status.
pub async fn cmd_status(store: &DocumentStore, json_mode: bool) -> Result<(), InsepaError> {
    let session = store.load().await?;
    let namespaces = session.namespaces();
    let block_count: usize = namespaces.iter().map(|(_, ns)| ns.blocks.len()).sum();

    if json_mode {
        print_json(&serde_json::json!({
            "memory": store.memory_path().to_string_lossy(),
            "pool": store.pool_path().to_string_lossy(),
            "namespaces": namespaces.len(),
            "blocks": block_count,
            "pool_entries": session.pool().len(),
        }));
        return Ok(());
    }

    println!("INSEPA Status");
    println!("=============");
    println!("Memory: {:?}", store.memory_path());
    println!("Pool:   {:?}", store.pool_path());
    println!();
    println!("Namespaces:   {}", namespaces.len());
    println!("Blocks:       {}", block_count);
    println!("Pool entries: {}", session.pool().len());

    Ok(())
}

// =============================================================================
// NAMESPACE COMMANDS
// =============================================================================

/// List namespaces with their cursors.
pub async fn cmd_mae_list(store: &DocumentStore, json_mode: bool) -> Result<(), InsepaError> {
    let session = store.load().await?;

    if json_mode {
        let list: Vec<_> = session
            .namespaces()
            .iter()
            .map(|(id, ns)| {
                serde_json::json!({
                    "id": id,
                    "name": ns.name,
                    "blocks": ns.blocks.len(),
                    "last_index": NamespaceCursor::last_index(ns),
                    "ultimo_child": ns.last_child,
                })
            })
            .collect();
        print_json(&serde_json::Value::Array(list));
        return Ok(());
    }

    for (id, ns) in session.namespaces().iter() {
        println!(
            "[{}] {} ({} blocks, last index {})",
            id,
            ns.name,
            ns.blocks.len(),
            NamespaceCursor::last_index(ns)
        );
    }
    Ok(())
}

/// Add a namespace.
pub async fn cmd_mae_add(
    store: &DocumentStore,
    json_mode: bool,
    name: &str,
) -> Result<(), InsepaError> {
    let id = store
        .transact(|session| Ok(session.add_namespace(name)))
        .await?;

    match (id, json_mode) {
        (Some(id), true) => print_json(&serde_json::json!({ "id": id, "name": name.trim() })),
        (Some(id), false) => println!("Added namespace [{}] {}", id, name.trim()),
        (None, _) => tracing::warn!("Blank namespace name, nothing added"),
    }
    Ok(())
}

/// Remove a namespace.
pub async fn cmd_mae_remove(
    store: &DocumentStore,
    json_mode: bool,
    id: u64,
) -> Result<(), InsepaError> {
    let removed = store
        .transact(|session| session.remove_namespace(id))
        .await?;
    tracing::info!("Removed namespace {} ({} blocks)", id, removed.blocks.len());

    if json_mode {
        print_json(&serde_json::json!({ "removed": id, "name": removed.name }));
    } else {
        println!("Removed namespace [{}] {}", id, removed.name);
    }
    Ok(())
}

/// Rename a namespace.
pub async fn cmd_mae_rename(
    store: &DocumentStore,
    json_mode: bool,
    id: u64,
    name: &str,
) -> Result<(), InsepaError> {
    let renamed = store
        .transact(|session| session.rename_namespace(id, name))
        .await?;

    if json_mode {
        print_json(&serde_json::json!({ "id": id, "renamed": renamed }));
    } else if renamed {
        println!("Renamed namespace [{}] to {}", id, name.trim());
    } else {
        tracing::warn!("Blank namespace name, nothing renamed");
    }
    Ok(())
}

// =============================================================================
// POOL COMMANDS
// =============================================================================

/// List pool entries.
pub async fn cmd_pool_list(store: &DocumentStore, json_mode: bool) -> Result<(), InsepaError> {
    let session = store.load().await?;

    if json_mode {
        print_json(&to_json(session.pool())?);
        return Ok(());
    }

    for entry in session.pool().entries() {
        println!(
            "{}: {} ({} tokens, alnulu {})",
            entry.name,
            entry.text,
            entry.tokens.total.len(),
            entry.checksum
        );
    }
    Ok(())
}

/// Add a text to the pool.
pub async fn cmd_pool_add(
    store: &DocumentStore,
    json_mode: bool,
    text: &str,
) -> Result<(), InsepaError> {
    let position = store
        .transact(|session| Ok(session.pool_add(text)))
        .await?;

    match (position, json_mode) {
        (Some(position), true) => print_json(&serde_json::json!({ "position": position })),
        (Some(position), false) => println!("Added Texto {}", position),
        (None, _) => tracing::warn!("Blank text, nothing added"),
    }
    Ok(())
}

/// Replace the text at a pool position.
pub async fn cmd_pool_edit(
    store: &DocumentStore,
    json_mode: bool,
    position: usize,
    text: &str,
) -> Result<(), InsepaError> {
    let entry = store
        .transact(|session| session.pool_edit(position, text).cloned())
        .await?;

    if json_mode {
        print_json(&to_json(&entry)?);
    } else {
        println!("{}: {}", entry.name, entry.text);
    }
    Ok(())
}

/// Remove a pool entry.
pub async fn cmd_pool_remove(
    store: &DocumentStore,
    json_mode: bool,
    position: usize,
) -> Result<(), InsepaError> {
    let removed = store
        .transact(|session| session.pool_remove(position))
        .await?;

    if json_mode {
        print_json(&serde_json::json!({ "removed": position, "text": removed.text }));
    } else {
        println!("Removed Texto {} and renumbered the rest", position);
    }
    Ok(())
}

// =============================================================================
// TEXT HELPERS
// =============================================================================

/// Suggest sentence splits.
pub fn cmd_segment(json_mode: bool, text: &str) -> Result<(), InsepaError> {
    let segments = Session::segments(text);
    if json_mode {
        print_json(&serde_json::json!(segments));
    } else {
        for (index, segment) in segments.iter().enumerate() {
            println!("{}. {}", index + 1, segment);
        }
    }
    Ok(())
}

/// Compute the alnulu checksum.
pub fn cmd_checksum(json_mode: bool, text: &str) -> Result<(), InsepaError> {
    let value = checksum(text);
    if json_mode {
        print_json(&serde_json::json!({ "text": text, "alnulu": value }));
    } else {
        println!("{}", value);
    }
    Ok(())
}

/// Show a text's units.
pub fn cmd_units(json_mode: bool, text: &str) -> Result<(), InsepaError> {
    let units = UnitTokenizer::units(text);
    if json_mode {
        print_json(&serde_json::json!(units));
    } else {
        println!("{}", units.join(" | "));
    }
    Ok(())
}

// =============================================================================
// BLOCK COMMANDS
// =============================================================================

/// Arguments of `block save`.
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub input: Passage,
    pub outputs: Vec<String>,
    pub output_reaction: String,
    pub output_context: String,
}

/// List the blocks of a namespace.
pub async fn cmd_block_list(
    store: &DocumentStore,
    json_mode: bool,
    namespace: u64,
) -> Result<(), InsepaError> {
    let session = store.load().await?;
    let ns = session.namespace(namespace)?;

    if json_mode {
        print_json(&to_json(&ns.blocks)?);
        return Ok(());
    }

    println!("{} [{}]", ns.name, namespace);
    for block in &ns.blocks {
        println!(
            "  #{} {} ({} .. {})",
            block.id,
            block.entrada.text,
            block
                .entrada
                .tokens
                .total
                .first()
                .map(ToString::to_string)
                .unwrap_or_default(),
            block
                .entrada
                .end
                .map(|t| t.to_string())
                .unwrap_or_default()
        );
        for (index, saida) in block.saidas.iter().enumerate() {
            println!("    -> {}: {}", index + 1, saida.texts.join(" / "));
        }
    }
    Ok(())
}

/// Create a block.
pub async fn cmd_block_save(
    store: &DocumentStore,
    json_mode: bool,
    namespace: u64,
    request: SaveRequest,
) -> Result<(), InsepaError> {
    let saved = store
        .transact(|session| {
            let id = session.save_block(
                namespace,
                &request.input,
                &request.outputs,
                &request.output_reaction,
                &request.output_context,
            )?;
            match id {
                Some(id) => Ok(Some((id, session.namespace(namespace)?.last_child.clone()))),
                None => Ok(None),
            }
        })
        .await?;

    let Some((block, last_child)) = saved else {
        tracing::warn!("Blank input, nothing saved");
        return Ok(());
    };
    tracing::info!("Saved block {} in namespace {}", block, namespace);

    if json_mode {
        print_json(&serde_json::json!({
            "namespace": namespace,
            "block": block,
            "ultimo_child": last_child,
        }));
    } else {
        println!("Saved block #{} (last token {})", block, last_child);
    }
    Ok(())
}

/// Append an output to a block.
pub async fn cmd_block_extend(
    store: &DocumentStore,
    json_mode: bool,
    namespace: u64,
    block: u64,
    output: Passage,
) -> Result<(), InsepaError> {
    let last = store
        .transact(|session| session.extend_block(namespace, block, &output))
        .await?;

    match (last, json_mode) {
        (Some(last), true) => print_json(&serde_json::json!({
            "namespace": namespace,
            "block": block,
            "last_index": last,
        })),
        (Some(last), false) => println!("Extended block #{} (last index {})", block, last),
        (None, _) => tracing::warn!("Blank output, nothing appended"),
    }
    Ok(())
}

/// Overwrite an input field.
pub async fn cmd_block_edit_input(
    store: &DocumentStore,
    namespace: u64,
    block: u64,
    field: EntradaField,
    value: &str,
) -> Result<(), InsepaError> {
    store
        .transact(|session| session.edit_entrada(namespace, block, field, value))
        .await?;
    println!("Updated input {:?} of block #{}", field, block);
    Ok(())
}

/// Overwrite an output field.
pub async fn cmd_block_edit_output(
    store: &DocumentStore,
    namespace: u64,
    block: u64,
    output: usize,
    field: SaidaField,
    value: &str,
) -> Result<(), InsepaError> {
    store
        .transact(|session| session.edit_saida(namespace, block, output, field, value))
        .await?;
    println!("Updated output {} {:?} of block #{}", output, field, block);
    Ok(())
}

/// Remove a block.
pub async fn cmd_block_remove(
    store: &DocumentStore,
    json_mode: bool,
    namespace: u64,
    block: u64,
) -> Result<(), InsepaError> {
    let removed = store
        .transact(|session| session.remove_block(namespace, block))
        .await?;

    if json_mode {
        print_json(&serde_json::json!({ "removed": block, "text": removed.entrada.text }));
    } else {
        println!("Removed block #{} and renumbered the rest", block);
    }
    Ok(())
}

/// Remove a range of blocks.
pub async fn cmd_block_remove_range(
    store: &DocumentStore,
    json_mode: bool,
    namespace: u64,
    range: &str,
) -> Result<(), InsepaError> {
    let count = store
        .transact(|session| session.remove_range(namespace, range))
        .await?;

    if json_mode {
        print_json(&serde_json::json!({ "range": range, "removed": count }));
    } else {
        println!("Removed {} blocks", count);
    }
    Ok(())
}

// =============================================================================
// TRIGGER COMMANDS
// =============================================================================

/// Configure a namespace's CB.
pub async fn cmd_cb_set(
    store: &DocumentStore,
    json_mode: bool,
    namespace: u64,
    status: CbStatus,
    bids: &str,
) -> Result<(), InsepaError> {
    let config = store
        .transact(|session| session.set_cb(namespace, status, bids).cloned())
        .await?;

    if json_mode {
        print_json(&to_json(&config)?);
    } else {
        println!("CB {} for {:?}", config.status, config.bids);
    }
    Ok(())
}

/// Register observations in order and report every firing.
///
/// Trigger windows are session state, so the sequence starts empty; the
/// window is cleared after each firing.
pub async fn cmd_cb_trigger(
    store: &DocumentStore,
    json_mode: bool,
    namespace: u64,
    blocks: &[u64],
) -> Result<(), InsepaError> {
    let mut session = store.load().await?;

    let mut report = Vec::with_capacity(blocks.len());
    for &block in blocks {
        let fired = session.register_trigger(namespace, block)?;
        let window = session.trigger_sequence(namespace).to_vec();
        if fired {
            tracing::info!("CB fired in namespace {} with {:?}", namespace, window);
            session.clear_trigger(namespace);
        }
        report.push((block, fired, window));
    }

    if json_mode {
        let list: Vec<_> = report
            .iter()
            .map(|(block, fired, window)| {
                serde_json::json!({ "block": block, "fired": fired, "window": window })
            })
            .collect();
        print_json(&serde_json::Value::Array(list));
        return Ok(());
    }

    for (block, fired, window) in &report {
        let mark = if *fired { "FIRED" } else { "-" };
        println!("{:>4} {:?} {}", block, window, mark);
    }
    Ok(())
}

/// Store a CBC.
pub async fn cmd_cbc_add(
    store: &DocumentStore,
    json_mode: bool,
    namespace: u64,
    ids: &str,
) -> Result<(), InsepaError> {
    let stored = store
        .transact(|session| session.add_cbc(namespace, ids))
        .await?;

    match (stored, json_mode) {
        (Some(cbc), true) => print_json(&serde_json::json!({ "cbc": cbc })),
        (Some(cbc), false) => println!("Stored CBC {:?}", cbc),
        (None, _) => tracing::warn!("Empty selection, no CBC stored"),
    }
    Ok(())
}

/// Remove a CBC.
pub async fn cmd_cbc_remove(
    store: &DocumentStore,
    json_mode: bool,
    namespace: u64,
    index: usize,
) -> Result<(), InsepaError> {
    let removed = store
        .transact(|session| session.remove_cbc(namespace, index))
        .await?;

    if json_mode {
        print_json(&serde_json::json!({ "removed": index, "cbc": removed }));
    } else {
        println!("Removed CBC #{} {:?}", index, removed);
    }
    Ok(())
}
