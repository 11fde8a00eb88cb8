//! Integration tests for editor sessions: autosave, recovery, history, drag-drop

use anyhow::Result;
use async_trait::async_trait;
use pagewright_editor::{
    tree, Block, BlockId, BlockTemplate, ContainerType, DropZone, EditSession, EditorConfig, FileCache, MemoryCache,
    Mutation, PageData, RemoteError, RemoteStore, SaveOutcome, SaveStatus, TemplateRegistry,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Records every call; optionally fails or rewrites ids like a server
/// assigning its own primary keys
#[derive(Default)]
struct RecordingRemote {
    pages: Mutex<Vec<PageData>>,
    synced: Mutex<Vec<Vec<Block>>>,
    fail_with: Mutex<Option<RemoteError>>,
    assign_ids: bool,
}

impl RecordingRemote {
    fn failing(err: RemoteError) -> Self {
        Self {
            fail_with: Mutex::new(Some(err)),
            ..Self::default()
        }
    }

    fn assigning_ids() -> Self {
        Self {
            assign_ids: true,
            ..Self::default()
        }
    }

    fn sync_count(&self) -> usize {
        self.synced.lock().unwrap().len()
    }
}

fn server_id(id: &BlockId) -> BlockId {
    if id.as_str().starts_with("srv-") {
        id.clone()
    } else {
        BlockId::new(format!("srv-{}", id))
    }
}

#[async_trait]
impl RemoteStore for RecordingRemote {
    async fn save_page(&self, _page_id: &str, page_data: &PageData) -> Result<(), RemoteError> {
        if let Some(err) = self.fail_with.lock().unwrap().clone() {
            return Err(err);
        }
        self.pages.lock().unwrap().push(page_data.clone());
        Ok(())
    }

    async fn sync_blocks(&self, _page_id: &str, blocks: &[Block]) -> Result<Vec<Block>, RemoteError> {
        self.synced.lock().unwrap().push(blocks.to_vec());
        if !self.assign_ids {
            return Ok(blocks.to_vec());
        }
        Ok(blocks
            .iter()
            .map(|b| {
                let mut stored = b.clone();
                stored.id = server_id(&b.id);
                stored.parent_id = b.parent_id.as_ref().map(server_id);
                stored
            })
            .collect())
    }
}

fn templates() -> TemplateRegistry {
    ["section", "row", "text"]
        .into_iter()
        .map(|name| BlockTemplate::new(name, name, "basic"))
        .collect()
}

fn blocks() -> Vec<Block> {
    vec![
        Block::new("hero", "section", ContainerType::Section),
        Block::new("title", "text", ContainerType::Block).with_parent("hero"),
        Block::new("body", "section", ContainerType::Section).with_order(1),
    ]
}

fn open<C: pagewright_editor::LocalCache>(
    remote: Arc<RecordingRemote>,
    cache: C,
) -> EditSession<Arc<RecordingRemote>, C> {
    EditSession::open(
        "home",
        blocks(),
        PageData::new("Home", "home"),
        templates(),
        remote,
        cache,
        &EditorConfig::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn test_autosave_sends_only_latest_state() -> Result<()> {
    init_tracing();
    let remote = Arc::new(RecordingRemote::default());
    let mut session = open(remote.clone(), MemoryCache::new());

    session.apply(Mutation::ToggleVisibility { block_id: "title".into() }, Instant::now())?;
    tokio::time::advance(Duration::from_millis(1000)).await;
    session.add_block("text", ContainerType::Block, Some("body".into()), Instant::now())?;
    let latest = session.document.blocks().to_vec();

    session.run_until_idle().await;

    assert_eq!(remote.sync_count(), 1);
    assert_eq!(remote.synced.lock().unwrap()[0], latest);
    assert!(!session.is_dirty());
    assert_eq!(session.save_status(), &SaveStatus::Saved);
    assert!(session.persistence().cache().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_nothing_is_sent_before_the_quiet_period() -> Result<()> {
    let remote = Arc::new(RecordingRemote::default());
    let mut session = open(remote.clone(), MemoryCache::new());
    let start = Instant::now();

    session.apply(Mutation::ToggleVisibility { block_id: "hero".into() }, start)?;

    assert!(matches!(session.tick(start + Duration::from_millis(1999)).await, SaveOutcome::NotDue));
    assert_eq!(remote.sync_count(), 0);
    assert!(matches!(session.tick(start + Duration::from_millis(2000)).await, SaveOutcome::Saved(_)));
    assert_eq!(remote.sync_count(), 1);
    assert_eq!(remote.pages.lock().unwrap()[0].title, "Home");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_failed_save_is_recovered_by_next_session() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let remote = Arc::new(RecordingRemote::failing(RemoteError::Http {
        status: 503,
        message: "maintenance".into(),
    }));
    let mut crashed = open(remote.clone(), FileCache::new(dir.path()));
    crashed.add_block("text", ContainerType::Block, Some("hero".into()), Instant::now())?;
    crashed.run_until_idle().await;

    assert!(crashed.is_dirty());
    assert_eq!(
        crashed.save_status(),
        &SaveStatus::Failed("HTTP 503: maintenance".into())
    );
    assert_eq!(remote.sync_count(), 0);
    assert!(crashed.next_deadline().is_none());
    let unsaved = crashed.document.blocks().to_vec();

    let mut recovered = open(Arc::new(RecordingRemote::default()), FileCache::new(dir.path()));
    assert!(recovered.recover_from_cache(Instant::now()));
    assert_eq!(recovered.document.blocks(), unsaved.as_slice());
    assert!(recovered.is_dirty());

    recovered.run_until_idle().await;
    assert!(!recovered.is_dirty());
    assert!(!recovered.recover_from_cache(Instant::now()));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_selection_follows_server_assigned_ids() -> Result<()> {
    let remote = Arc::new(RecordingRemote::assigning_ids());
    let mut session = open(remote.clone(), MemoryCache::new());

    let created = session.add_block("text", ContainerType::Block, Some("body".into()), Instant::now())?;
    assert_eq!(session.selected(), Some(&created));

    session.run_until_idle().await;

    let expected = BlockId::new(format!("srv-{}", created));
    assert_eq!(session.selected(), Some(&expected));
    assert!(session.document.contains(&expected));
    assert!(!session.document.contains(&created));
    assert_eq!(
        tree::find_parent(session.document.blocks(), &expected).map(|b| b.id.clone()),
        Some(BlockId::from("srv-body"))
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_edits_is_one_undo_step() -> Result<()> {
    let remote = Arc::new(RecordingRemote::default());
    let mut session = open(remote, MemoryCache::new());
    let original = session.document.snapshot();

    let start = Instant::now();
    for step in 0..3u64 {
        session.apply(
            Mutation::ToggleVisibility { block_id: "title".into() },
            start + Duration::from_millis(step * 100),
        )?;
    }
    session.run_until_idle().await;
    assert_eq!(session.document.history.len(), 2);

    assert!(session.undo(Instant::now()));
    assert_eq!(session.document.snapshot(), original);
    assert!(!session.undo(Instant::now()));
    assert!(session.is_dirty());
    Ok(())
}

#[test]
fn test_drag_drop_through_session() -> Result<()> {
    let mut session = open(Arc::new(RecordingRemote::default()), MemoryCache::new());
    let now = Instant::now();

    // title into body (reparent)
    assert!(session.drop_block(&"title".into(), &"body".into(), DropZone::EmptyRegion, now)?);
    assert_eq!(
        tree::find_parent(session.document.blocks(), &"title".into()).map(|b| b.id.clone()),
        Some(BlockId::from("body"))
    );

    // Refused drops leave the document untouched
    let version = session.document.version;
    assert!(!session.drop_block(&"body".into(), &"body".into(), DropZone::EmptyRegion, now)?);
    assert!(!session.drop_block(&"body".into(), &"title".into(), DropZone::Before, now)?);
    assert_eq!(session.document.version, version);

    // sections reorder at root
    assert!(session.drop_block(&"body".into(), &"hero".into(), DropZone::Before, now)?);
    let roots: Vec<&str> = tree::children_of(session.document.blocks(), None)
        .into_iter()
        .map(|b| b.id.as_str())
        .collect();
    assert_eq!(roots, vec!["body", "hero"]);
    Ok(())
}

#[test]
fn test_copy_paste_block_twice() -> Result<()> {
    let mut session = open(Arc::new(RecordingRemote::default()), MemoryCache::new());
    let now = Instant::now();

    session.copy_block(&"hero".into())?;
    let first = session.paste(None, now)?;
    let second = session.paste(Some("body".into()), now)?;

    assert_ne!(first, second);
    assert_eq!(session.document.blocks().len(), 7);
    assert_eq!(tree::descendants(session.document.blocks(), &second).len(), 1);
    assert_eq!(session.selected(), Some(&second));
    Ok(())
}

#[test]
fn test_copy_paste_style() -> Result<()> {
    let mut session = open(Arc::new(RecordingRemote::default()), MemoryCache::new());
    let now = Instant::now();

    let mut values = pagewright_editor::ConfigMap::new();
    values.insert("background".into(), serde_json::json!("#111"));
    session.apply(
        Mutation::UpdateConfig {
            block_id: "hero".into(),
            section: pagewright_editor::ConfigSection::Style,
            values,
        },
        now,
    )?;

    session.copy_style(&"hero".into())?;
    session.paste_style(&"body".into(), now)?;

    let body = tree::find_by_id(session.document.blocks(), &"body".into()).unwrap();
    assert_eq!(body.style_config["background"], "#111");
    Ok(())
}

#[test]
fn test_mutation_serialization() {
    let mutation = Mutation::MoveBlock {
        block_id: "title".into(),
        new_parent_id: Some("body".into()),
        new_order: 3,
    };

    let json = serde_json::to_string(&mutation).unwrap();
    let deserialized: Mutation = serde_json::from_str(&json).unwrap();

    assert_eq!(mutation, deserialized);
}
