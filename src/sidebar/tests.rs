//! Controller tests against a real library on disk and a recording UI.

use super::*;
use crate::domain::{Note, TagPath};
use crate::storage::FsStorage;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// UI double: keeps an outline mirror and records every other call.
struct RecordingUi {
    mirror: OutlineMirror,
    answer: bool,
    confirms: Vec<String>,
    alerts: Vec<String>,
    tables: Vec<Vec<NoteId>>,
    removed_notes: Vec<NoteId>,
    reloaded_notes: Vec<NoteId>,
    watched: Vec<PathBuf>,
    unwatched: Vec<PathBuf>,
    revealed: Vec<PathBuf>,
    editor_clears: usize,
}

impl RecordingUi {
    fn new() -> Self {
        Self {
            mirror: OutlineMirror::new(),
            answer: true,
            confirms: Vec::new(),
            alerts: Vec::new(),
            tables: Vec::new(),
            removed_notes: Vec::new(),
            reloaded_notes: Vec::new(),
            watched: Vec::new(),
            unwatched: Vec::new(),
            revealed: Vec::new(),
            editor_clears: 0,
        }
    }
}

impl OutlineView for RecordingUi {
    fn apply(&mut self, changes: &[OutlineChange], source: &dyn OutlineSource) {
        self.mirror.apply(changes, source);
    }

    fn expand_row(&mut self, row: Row, source: &dyn OutlineSource) {
        self.mirror.expand_row(row, source);
    }

    fn show_selection(&mut self, rows: &[Row]) {
        self.mirror.show_selection(rows);
    }
}

impl NotesView for RecordingUi {
    fn reload_note(&mut self, note: &Note) {
        self.reloaded_notes.push(note.id());
    }

    fn remove_notes(&mut self, notes: &[NoteId]) {
        self.removed_notes.extend_from_slice(notes);
    }

    fn reload_all(&mut self) {}

    fn update_table(&mut self, notes: &[NoteId]) {
        self.tables.push(notes.to_vec());
    }

    fn clear_editor(&mut self) {
        self.editor_clears += 1;
    }

    fn refill_editor(&mut self, _note: &Note) {}

    fn clear_search(&mut self) {}
}

impl Dialogs for RecordingUi {
    fn confirm(&mut self, message: &str) -> bool {
        self.confirms.push(message.to_string());
        self.answer
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn reveal(&mut self, path: &Path) {
        self.revealed.push(path.to_path_buf());
    }
}

impl FolderWatcher for RecordingUi {
    fn reload_observed_folders(&mut self, folders: &[PathBuf]) {
        self.watched = folders.to_vec();
    }

    fn unwatch(&mut self, folder: &Path) {
        self.unwatched.push(folder.to_path_buf());
    }
}

type TestSidebar = Sidebar<FsStorage, RecordingUi>;

// ===========================================
// Fixtures
// ===========================================

fn library_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    for folder in ["Zeta", "Alpha", "Mike"] {
        fs::create_dir_all(root.join(folder)).unwrap();
    }
    fs::write(root.join("inbox.md"), "Call mom #errand #work/urgent").unwrap();
    fs::write(root.join("Alpha/a.md"), "- [ ] ship #work/urgent #work2").unwrap();
    fs::write(root.join("Mike/m.md"), "Numbers #work/reports").unwrap();
    fs::write(root.join("Zeta/z.md"), "No tags here").unwrap();
    dir
}

fn open(dir: &TempDir) -> TestSidebar {
    let storage = FsStorage::open(dir.path()).unwrap();
    let mut sidebar = Sidebar::new(storage, RecordingUi::new(), SidebarOptions::default());
    expand_all(&mut sidebar);
    sidebar
}

/// Loads every expandable row in the mirror so later changes are tracked.
fn expand_all(sidebar: &mut TestSidebar) {
    let source = TreeSource {
        library: sidebar.storage.library(),
        tags: &sidebar.tags,
        entries: &sidebar.entries,
        fixed: &sidebar.fixed,
    };
    sidebar.ui.mirror.expand_all(&source);
}

fn assert_in_sync(sidebar: &TestSidebar) {
    if let Err(mismatch) = sidebar.ui().mirror.verify(&sidebar.source()) {
        panic!("{mismatch}");
    }
}

fn tag(s: &str) -> TagPath {
    TagPath::new(s).unwrap()
}

fn paths(tags: &[&str]) -> BTreeSet<TagPath> {
    tags.iter().map(|t| tag(t)).collect()
}

fn root_labels(sidebar: &TestSidebar) -> Vec<String> {
    let source = sidebar.source();
    source
        .children(None)
        .into_iter()
        .map(|row| source.label(row))
        .collect()
}

fn project(sidebar: &TestSidebar, relative: &str) -> ProjectId {
    let path = sidebar.storage().root().join(relative);
    sidebar.storage().get_by(&path).unwrap()
}

fn note(sidebar: &TestSidebar, relative: &str) -> NoteId {
    let path = sidebar.storage().root().join(relative);
    sidebar.storage().library().notes.get_by_path(&path).unwrap()
}

/// Every node is a referenced tag or an ancestor of one, and every
/// referenced tag has a node.
fn assert_forest_matches_notes(sidebar: &TestSidebar) {
    let live = sidebar.get_all_tags(None);
    let mut expected: BTreeSet<TagPath> = BTreeSet::new();
    for tag in &live {
        expected.extend(tag.ancestors());
        expected.insert(tag.clone());
    }
    assert_eq!(sidebar.tags().all_paths(), expected);
}

// ===========================================
// Root list
// ===========================================

#[test]
fn root_list_sorts_folders_after_inbox() {
    let dir = library_dir();
    let sidebar = open(&dir);

    assert_eq!(
        root_labels(&sidebar),
        vec![
            "Notes", "Inbox", "Alpha", "Mike", "Zeta", "Todo", "Untagged", "Archive", "Trash",
            "errand", "work", "work2",
        ]
    );
    assert_in_sync(&sidebar);
}

#[test]
fn startup_selects_inbox_and_fills_table() {
    let dir = library_dir();
    let sidebar = open(&dir);

    assert_eq!(sidebar.primary_row(), sidebar.row_for_entry(EntryKind::Inbox));
    let inbox = note(&sidebar, "inbox.md");
    assert_eq!(sidebar.ui().tables.last(), Some(&vec![inbox]));
}

#[test]
fn insert_project_takes_sorted_position() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    let kilo = sidebar.storage().root().join("Kilo");
    fs::create_dir(&kilo).unwrap();
    fs::write(kilo.join("k.md"), "#kilo").unwrap();

    let expected_index = sidebar.root_project_position("Kilo");
    let id = sidebar.insert_project(&kilo).unwrap();

    assert_eq!(sidebar.fixed_rows()[expected_index], Row::Project(id));
    assert_eq!(
        &root_labels(&sidebar)[..6],
        &["Notes", "Inbox", "Alpha", "Kilo", "Mike", "Zeta"]
    );
    assert!(sidebar.tags().contains(&tag("kilo")));
    assert!(sidebar.ui().watched.contains(&kilo));
    assert_in_sync(&sidebar);
}

#[test]
fn insert_project_is_idempotent() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    let alpha = sidebar.storage().root().join("Alpha");
    let before = root_labels(&sidebar);
    let batches = sidebar.ui().mirror.batches();

    assert_eq!(sidebar.insert_project(&alpha), None);
    assert_eq!(root_labels(&sidebar), before);
    assert_eq!(sidebar.ui().mirror.batches(), batches);
}

#[test]
fn insert_project_refuses_reserved_and_outside_paths() {
    let dir = library_dir();
    let outside = TempDir::new().unwrap();
    let mut sidebar = open(&dir);
    let assets = sidebar.storage().root().join("Alpha/assets");
    fs::create_dir(&assets).unwrap();

    assert_eq!(sidebar.insert_project(&assets), None);
    assert_eq!(sidebar.insert_project(outside.path()), None);
}

#[test]
fn nested_insert_shows_under_parent() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    let alpha = project(&sidebar, "Alpha");
    let sub = sidebar.storage().root().join("Alpha/Sub");
    fs::create_dir(&sub).unwrap();

    let id = sidebar.insert_project(&sub).unwrap();
    assert!(sidebar.expand(Row::Project(alpha)));

    let source = sidebar.source();
    assert_eq!(source.children(Some(Row::Project(alpha))), vec![Row::Project(id)]);
    assert_eq!(
        sidebar.ui().mirror.children(Some(Row::Project(alpha))),
        Some(&[Row::Project(id)][..])
    );
    assert_in_sync(&sidebar);
}

// ===========================================
// Tags
// ===========================================

#[test]
fn forest_holds_exactly_referenced_tags() {
    let dir = library_dir();
    let sidebar = open(&dir);

    assert_eq!(
        sidebar.tags().all_paths(),
        paths(&["errand", "work", "work/reports", "work/urgent", "work2"])
    );
    assert_forest_matches_notes(&sidebar);
}

#[test]
fn rename_moves_tag_in_forest_and_notes() {
    let dir = library_dir();
    let mut sidebar = open(&dir);

    assert!(sidebar.rename_tag(&[tag("work/urgent")], &tag("work/now")));

    assert_eq!(
        sidebar.tags().all_paths(),
        paths(&["errand", "work", "work/now", "work/reports", "work2"])
    );
    let content = fs::read_to_string(dir.path().join("Alpha/a.md")).unwrap();
    assert!(content.contains("#work/now"));
    assert!(!content.contains("#work/urgent"));
    assert!(content.contains("#work2"));
    assert_eq!(
        sidebar.selected_tags(),
        vec![tag("work/now")],
        "renamed tag is selected"
    );
    assert_forest_matches_notes(&sidebar);
    assert_in_sync(&sidebar);
}

#[test]
fn rename_root_leaves_lookalike_alone() {
    let dir = library_dir();
    let mut sidebar = open(&dir);

    assert!(sidebar.rename_tag(&[tag("work")], &tag("job")));

    assert_eq!(
        sidebar.tags().all_paths(),
        paths(&["errand", "job", "job/reports", "job/urgent", "work2"])
    );
    let content = fs::read_to_string(dir.path().join("Alpha/a.md")).unwrap();
    assert!(content.contains("#job/urgent"));
    assert!(content.contains("#work2"));
    assert_in_sync(&sidebar);
}

#[test]
fn rename_to_same_path_is_refused() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    assert!(!sidebar.rename_tag(&[tag("work")], &tag("work")));
    assert!(!sidebar.rename_tag(&[], &tag("work")));
}

#[test]
fn tag_notes_adds_row_and_writes_file() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    let z = note(&sidebar, "Zeta/z.md");

    assert_eq!(sidebar.tag_notes(&tag("read/later"), &[z]), 1);
    assert_eq!(sidebar.tag_notes(&tag("read/later"), &[z]), 0);

    assert!(sidebar.tags().contains(&tag("read/later")));
    let content = fs::read_to_string(dir.path().join("Zeta/z.md")).unwrap();
    assert!(content.contains("#read/later"));
    assert!(sidebar.ui().reloaded_notes.contains(&z));
    assert_in_sync(&sidebar);
}

#[test]
fn delete_selected_tags_strips_subtree_after_confirm() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    let work = sidebar.row_for_tag(&tag("work")).unwrap();
    assert!(sidebar.select(work, false));

    sidebar.ui_mut().answer = false;
    assert!(!sidebar.delete_selected());
    assert!(sidebar.tags().contains(&tag("work/urgent")));

    sidebar.ui_mut().answer = true;
    assert!(sidebar.delete_selected());
    assert_eq!(sidebar.tags().all_paths(), paths(&["errand", "work2"]));
    let content = fs::read_to_string(dir.path().join("Mike/m.md")).unwrap();
    assert!(!content.contains("#work"));
    assert_eq!(sidebar.ui().confirms.len(), 2);
    assert_in_sync(&sidebar);
}

#[test]
fn rename_nested_tag_keeps_siblings_and_moves_children() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.md"), "A #work/urgent #work/other").unwrap();
    fs::write(dir.path().join("b.md"), "B #work/urgent/sub").unwrap();
    let mut sidebar = open(&dir);
    let a = note(&sidebar, "a.md");
    let b = note(&sidebar, "b.md");

    assert!(sidebar.rename_tag(&[tag("work/urgent")], &tag("work/now")));

    assert_eq!(
        sidebar.tags().all_paths(),
        paths(&["work", "work/now", "work/now/sub", "work/other"])
    );
    let notes = &sidebar.storage().library().notes;
    assert_eq!(
        notes.get(a).unwrap().tags(),
        &[tag("work/now"), tag("work/other")][..]
    );
    assert_eq!(notes.get(b).unwrap().tags(), &[tag("work/now/sub")][..]);
    assert_forest_matches_notes(&sidebar);
    assert_in_sync(&sidebar);
}

#[test]
fn rename_reaches_tags_followed_by_punctuation() {
    let dir = library_dir();
    fs::write(dir.path().join("Zeta/p.md"), "Finish #work/urgent.").unwrap();
    let mut sidebar = open(&dir);

    assert!(sidebar.rename_tag(&[tag("work/urgent")], &tag("work/now")));

    let content = fs::read_to_string(dir.path().join("Zeta/p.md")).unwrap();
    assert_eq!(content, "Finish #work/now.");
    assert!(!sidebar.tags().contains(&tag("work/urgent")));
    assert_forest_matches_notes(&sidebar);
    assert_in_sync(&sidebar);
}

#[test]
fn delete_reaches_tags_followed_by_punctuation() {
    let dir = library_dir();
    fs::write(dir.path().join("Zeta/p.md"), "Buy milk #errand, eggs").unwrap();
    let mut sidebar = open(&dir);

    assert!(sidebar.select_tag(&tag("errand")));
    assert!(sidebar.delete_selected());

    let content = fs::read_to_string(dir.path().join("Zeta/p.md")).unwrap();
    assert_eq!(content, "Buy milk, eggs");
    let inbox = fs::read_to_string(dir.path().join("inbox.md")).unwrap();
    assert!(!inbox.contains("#errand"));
    assert!(!sidebar.tags().contains(&tag("errand")));
    assert_forest_matches_notes(&sidebar);
    assert_in_sync(&sidebar);
}

#[test]
fn forest_tracks_notes_through_tag_untag_and_trash() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    let inbox = note(&sidebar, "inbox.md");
    let a = note(&sidebar, "Alpha/a.md");
    let m = note(&sidebar, "Mike/m.md");
    let z = note(&sidebar, "Zeta/z.md");
    let trash = sidebar.row_for_entry(EntryKind::Trash).unwrap();

    let check = |sidebar: &TestSidebar| {
        assert_forest_matches_notes(sidebar);
        assert_in_sync(sidebar);
    };

    assert_eq!(sidebar.tag_notes(&tag("read/later"), &[z, m]), 2);
    check(&sidebar);
    assert_eq!(sidebar.untag_notes(&tag("errand"), &[inbox]), 1);
    check(&sidebar);
    assert!(sidebar.accept_drop(trash, &DropPayload::Notes(vec![a])));
    check(&sidebar);
    assert_eq!(sidebar.untag_notes(&tag("read/later"), &[z]), 1);
    check(&sidebar);
    assert_eq!(sidebar.untag_notes(&tag("work/reports"), &[m]), 1);
    check(&sidebar);
    assert!(sidebar.accept_drop(trash, &DropPayload::Notes(vec![m])));
    check(&sidebar);

    assert_eq!(sidebar.tags().all_paths(), paths(&["work", "work/urgent"]));
}

#[test]
fn select_tag_expands_ancestors() {
    let dir = library_dir();
    let mut sidebar = open(&dir);

    assert!(sidebar.select_tag(&tag("work/reports")));
    let work = sidebar.row_for_tag(&tag("work")).unwrap();
    let reports = sidebar.row_for_tag(&tag("work/reports")).unwrap();
    let visible = sidebar.visible_rows();
    assert!(visible.contains(&work));
    assert!(visible.contains(&reports));
    assert_eq!(sidebar.selected_inline_tags(), "#work/reports ");
}

// ===========================================
// Selection
// ===========================================

#[test]
fn tag_selection_is_exclusive_among_tags() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    let alpha = Row::Project(project(&sidebar, "Alpha"));
    let errand = sidebar.row_for_tag(&tag("errand")).unwrap();
    let work = sidebar.row_for_tag(&tag("work")).unwrap();

    assert!(sidebar.select(alpha, false));
    assert!(sidebar.select(errand, false));
    assert_eq!(sidebar.selection(), &[alpha, errand]);

    assert!(sidebar.select(work, false));
    assert_eq!(sidebar.selection(), &[alpha, work]);
    assert_eq!(sidebar.ui().mirror.selection(), &[alpha, work]);
}

#[test]
fn project_selection_is_additive_when_extending() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    let alpha = Row::Project(project(&sidebar, "Alpha"));
    let mike = Row::Project(project(&sidebar, "Mike"));

    sidebar.select(alpha, false);
    sidebar.select(mike, true);
    assert_eq!(sidebar.selection(), &[alpha, mike]);

    sidebar.select(alpha, false);
    assert_eq!(sidebar.selection(), &[alpha]);
}

#[test]
fn header_and_unbound_labels_are_not_selectable() {
    let dir = library_dir();
    let outside = TempDir::new().unwrap();
    let mut sidebar = open(&dir);
    assert!(sidebar.attach_storage(outside.path()));
    sidebar.wait_for_jobs();

    let header = sidebar.row_for_entry(EntryKind::Header).unwrap();
    assert!(!sidebar.is_selectable(header));
    assert!(!sidebar.select(header, false));
}

#[test]
fn scoped_notes_filter_by_entry_and_tag() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    let a = note(&sidebar, "Alpha/a.md");
    let z = note(&sidebar, "Zeta/z.md");

    sidebar.select_entry(EntryKind::Todo);
    assert_eq!(sidebar.scoped_notes(), vec![a]);

    sidebar.select_entry(EntryKind::Untagged);
    assert_eq!(sidebar.scoped_notes(), vec![z]);

    sidebar.select_entry(EntryKind::All);
    let work2 = sidebar.row_for_tag(&tag("work2")).unwrap();
    sidebar.select(work2, false);
    assert_eq!(sidebar.scoped_notes(), vec![a]);
}

#[test]
fn step_selection_skips_unselectable_rows() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    sidebar.select_entry(EntryKind::All);

    assert!(sidebar.select_next());
    assert_eq!(sidebar.primary_row(), sidebar.row_for_entry(EntryKind::Inbox));
    assert!(sidebar.select_prev());
    assert_eq!(sidebar.primary_row(), sidebar.row_for_entry(EntryKind::All));
    assert!(!sidebar.select_prev());
}

#[test]
fn selection_survives_reopen() {
    let dir = library_dir();
    let mike_path = {
        let mut sidebar = open(&dir);
        let mike = project(&sidebar, "Mike");
        sidebar.select(Row::Project(mike), false);
        sidebar.storage().root().join("Mike")
    };

    let sidebar = open(&dir);
    assert_eq!(sidebar.primary_row(), sidebar.row_for_path(&mike_path));
}

#[test]
fn unchanged_selection_keeps_editor() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    let alpha = Row::Project(project(&sidebar, "Alpha"));
    sidebar.select(alpha, false);
    let clears = sidebar.ui().editor_clears;

    sidebar.select(alpha, false);
    assert_eq!(sidebar.ui().editor_clears, clears);
}

#[test]
fn skipped_selection_still_takes_snapshot() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    let mike = Row::Project(project(&sidebar, "Mike"));
    let tables = sidebar.ui().tables.len();
    let clears = sidebar.ui().editor_clears;

    sidebar.skip_next_selection();
    sidebar.select(mike, false);
    assert_eq!(sidebar.ui().tables.len(), tables, "table refresh is skipped");
    assert_eq!(sidebar.ui().editor_clears, clears + 1);
    assert_eq!(
        sidebar.storage().state().last_project.as_deref(),
        Some(sidebar.storage().root().join("Mike").as_path())
    );

    sidebar.select(mike, false);
    assert_eq!(sidebar.ui().editor_clears, clears + 1, "same selection again");
    assert_eq!(sidebar.ui().tables.len(), tables + 1);
}

#[test]
fn select_note_remembers_current_note() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    let m = note(&sidebar, "Mike/m.md");

    assert!(sidebar.select_note(m));
    assert_eq!(sidebar.current_note(), Some(m));
    assert_eq!(
        sidebar.primary_row(),
        Some(Row::Project(project(&sidebar, "Mike")))
    );
}

#[test]
fn inline_tags_follow_selected_folder() {
    let dir = library_dir();
    let storage = FsStorage::open(dir.path()).unwrap();
    let mut sidebar = Sidebar::new(
        storage,
        RecordingUi::new(),
        SidebarOptions { inline_tags: true },
    );
    expand_all(&mut sidebar);
    let mike = Row::Project(project(&sidebar, "Mike"));

    sidebar.select(mike, false);
    assert_eq!(sidebar.tags().all_paths(), paths(&["work", "work/reports"]));
    assert_in_sync(&sidebar);

    sidebar.select_entry(EntryKind::All);
    assert!(sidebar.tags().contains(&tag("errand")));
    assert_in_sync(&sidebar);
}

// ===========================================
// Folder removal and storage roots
// ===========================================

#[test]
fn remove_project_prunes_its_tags() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    let mike = project(&sidebar, "Mike");

    assert!(sidebar.remove_project(mike));

    assert!(!sidebar.fixed_rows().contains(&Row::Project(mike)));
    assert!(!sidebar.tags().contains(&tag("work/reports")));
    assert!(sidebar.tags().contains(&tag("work/urgent")));
    assert!(sidebar.ui().unwatched.contains(&dir.path().canonicalize().unwrap().join("Mike")));
    assert_forest_matches_notes(&sidebar);
    assert_in_sync(&sidebar);
}

#[test]
fn default_root_cannot_be_removed() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    let root = sidebar.storage().library().projects.default_project().unwrap();
    assert!(!sidebar.remove_project(root));
}

#[test]
fn delete_nested_folder_removes_it_from_disk() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    let zeta = project(&sidebar, "Zeta");
    sidebar.select(Row::Project(zeta), false);

    assert!(sidebar.delete_selected());
    assert!(!dir.path().join("Zeta").exists());
    assert!(sidebar.storage().library().projects.get(zeta).is_none());
    assert_eq!(sidebar.primary_row(), sidebar.row_for_entry(EntryKind::All));
    assert_in_sync(&sidebar);
}

#[test]
fn attach_then_detach_cascades() {
    let dir = library_dir();
    let outside = TempDir::new().unwrap();
    fs::create_dir(outside.path().join("Ideas")).unwrap();
    fs::write(outside.path().join("Ideas/i.md"), "#ext/idea").unwrap();

    let mut sidebar = open(&dir);
    assert!(sidebar.attach_storage(outside.path()));
    sidebar.wait_for_jobs();
    expand_all(&mut sidebar);

    let root = outside.path().canonicalize().unwrap();
    let external = sidebar.storage().get_by(&root).unwrap();
    let labels = root_labels(&sidebar);
    assert!(labels.contains(&EXTERNAL_HEADER.to_string()));
    assert!(sidebar.tags().contains(&tag("ext/idea")));
    assert_eq!(sidebar.storage().state().bookmarks, vec![root.clone()]);

    sidebar.select(Row::Project(external), false);
    assert_eq!(
        sidebar.validate_command(MenuCommand::Delete).title,
        "Detach Storage"
    );

    sidebar.ui_mut().answer = false;
    assert!(!sidebar.delete_selected());
    assert!(sidebar.storage().get_by(&root).is_some());

    sidebar.ui_mut().answer = true;
    assert!(sidebar.delete_selected());

    assert!(sidebar.storage().get_by(&root).is_none());
    assert!(sidebar.storage().get_by(&root.join("Ideas")).is_none());
    assert!(sidebar.storage().state().bookmarks.is_empty());
    assert!(sidebar.row_for_entry(EntryKind::Header).is_none());
    assert!(!sidebar.tags().contains(&tag("ext/idea")));
    assert!(root.join("Ideas/i.md").exists(), "detach keeps files");
    assert_in_sync(&sidebar);
}

#[test]
fn attach_refuses_folders_inside_library() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    assert!(!sidebar.attach_storage(&dir.path().join("Alpha")));
    assert_eq!(sidebar.jobs_in_flight(), 0);
}

#[test]
fn snapshot_runs_in_background() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    sidebar.select_entry(EntryKind::Inbox);

    assert!(sidebar.snapshot());
    sidebar.wait_for_jobs();

    let snapshots = sidebar.storage().root().join(crate::storage::SNAPSHOT_DIR);
    let taken: Vec<_> = fs::read_dir(&snapshots).unwrap().collect();
    assert_eq!(taken.len(), 1);
    assert!(sidebar.ui().alerts.is_empty());
}

// ===========================================
// Drag and drop
// ===========================================

#[test]
fn dropping_notes_on_trash_moves_them_there() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    let inbox = note(&sidebar, "inbox.md");
    let trash = sidebar.row_for_entry(EntryKind::Trash).unwrap();
    let payload = DropPayload::Notes(vec![inbox]);

    assert_eq!(sidebar.validate_drop(trash, &payload), Some(DragOperation::Move));
    assert!(sidebar.accept_drop(trash, &payload));

    assert!(dir.path().join(".Trash/inbox.md").exists());
    assert!(sidebar.storage().library().notes.get(inbox).is_none());
    assert_eq!(sidebar.ui().removed_notes, vec![inbox]);
    assert!(!sidebar.tags().contains(&tag("errand")));
    assert!(sidebar.tags().contains(&tag("work/urgent")));
    assert_in_sync(&sidebar);
}

#[test]
fn dropping_notes_on_folder_moves_them() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    let a = note(&sidebar, "Alpha/a.md");
    let mike = project(&sidebar, "Mike");
    let payload = DropPayload::Notes(vec![a]);

    assert_eq!(
        sidebar.plan_drop(Row::Project(mike), &payload),
        Some(DropPlan::MoveNotes {
            project: mike,
            notes: vec![a]
        })
    );
    assert!(sidebar.accept_drop(Row::Project(mike), &payload));

    assert!(dir.path().join("Mike/a.md").exists());
    assert_eq!(sidebar.storage().library().notes.get(a).unwrap().project(), mike);
    assert!(sidebar.ui().reloaded_notes.contains(&a));
    assert_in_sync(&sidebar);
}

#[test]
fn dropping_notes_on_tag_tags_them() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    let z = note(&sidebar, "Zeta/z.md");
    let errand = sidebar.row_for_tag(&tag("errand")).unwrap();
    let payload = DropPayload::Notes(vec![z]);

    assert_eq!(sidebar.validate_drop(errand, &payload), Some(DragOperation::Copy));
    assert!(sidebar.accept_drop(errand, &payload));
    let content = fs::read_to_string(dir.path().join("Zeta/z.md")).unwrap();
    assert!(content.contains("#errand"));
}

#[test]
fn dropping_notes_on_trash_keeps_sync_when_one_fails() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    let inbox = note(&sidebar, "inbox.md");
    let z = note(&sidebar, "Zeta/z.md");
    let trash = sidebar.row_for_entry(EntryKind::Trash).unwrap();
    fs::remove_file(dir.path().join("Zeta/z.md")).unwrap();

    assert!(!sidebar.accept_drop(trash, &DropPayload::Notes(vec![inbox, z])));

    assert_eq!(sidebar.ui().alerts.len(), 1);
    assert!(dir.path().join(".Trash/inbox.md").exists());
    assert!(sidebar.storage().library().notes.get(inbox).is_none());
    assert_eq!(sidebar.ui().removed_notes, vec![inbox]);
    assert!(!sidebar.tags().contains(&tag("errand")));
    assert_forest_matches_notes(&sidebar);
    assert_in_sync(&sidebar);
}

#[test]
fn dropping_notes_on_folder_keeps_sync_when_one_fails() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    let a = note(&sidebar, "Alpha/a.md");
    let m = note(&sidebar, "Mike/m.md");
    let zeta = project(&sidebar, "Zeta");
    fs::write(dir.path().join("Zeta/m.md"), "taken").unwrap();
    let tables = sidebar.ui().tables.len();

    assert!(!sidebar.accept_drop(Row::Project(zeta), &DropPayload::Notes(vec![a, m])));

    assert_eq!(sidebar.ui().alerts.len(), 1);
    let notes = &sidebar.storage().library().notes;
    assert_eq!(notes.get(a).unwrap().project(), zeta);
    assert_eq!(notes.get(m).unwrap().project(), project(&sidebar, "Mike"));
    assert!(sidebar.ui().reloaded_notes.contains(&a));
    assert_eq!(sidebar.ui().tables.len(), tables + 1);
    assert_forest_matches_notes(&sidebar);
    assert_in_sync(&sidebar);
}

#[test]
fn files_are_rejected_by_tags_and_entries_without_folder() {
    let dir = library_dir();
    let sidebar = open(&dir);
    let payload = DropPayload::Files(vec![dir.path().join("inbox.md")]);
    let errand = sidebar.row_for_tag(&tag("errand")).unwrap();
    let todo = sidebar.row_for_entry(EntryKind::Todo).unwrap();

    assert_eq!(sidebar.validate_drop(errand, &payload), None);
    assert_eq!(sidebar.validate_drop(todo, &payload), None);
}

#[test]
fn dropping_files_on_trash_imports_them_there() {
    let dir = library_dir();
    let outside = TempDir::new().unwrap();
    fs::write(outside.path().join("clip.md"), "clipped #web").unwrap();
    let mut sidebar = open(&dir);
    let trash = sidebar.row_for_entry(EntryKind::Trash).unwrap();
    let trash_project = sidebar.project_of_row(trash).unwrap();
    let payload = DropPayload::Files(vec![outside.path().join("clip.md")]);

    assert_eq!(sidebar.validate_drop(trash, &payload), Some(DragOperation::Copy));
    assert!(sidebar.accept_drop(trash, &payload));

    assert!(dir.path().join(".Trash/clip.md").exists());
    assert_eq!(
        sidebar.storage().library().notes.get(note(&sidebar, ".Trash/clip.md")).unwrap().project(),
        trash_project
    );
    assert_forest_matches_notes(&sidebar);
    assert_in_sync(&sidebar);
}

#[test]
fn mixed_file_drop_imports_the_rest_after_a_conflict() {
    let dir = library_dir();
    let outside = TempDir::new().unwrap();
    fs::create_dir(outside.path().join("Alpha")).unwrap();
    fs::write(outside.path().join("clip.md"), "clipped #web").unwrap();
    let mut sidebar = open(&dir);
    let inbox = sidebar.row_for_entry(EntryKind::Inbox).unwrap();
    let payload = DropPayload::Files(vec![
        outside.path().join("Alpha"),
        outside.path().join("clip.md"),
    ]);

    assert!(sidebar.accept_drop(inbox, &payload));

    assert_eq!(sidebar.ui().alerts.len(), 1);
    assert!(dir.path().join("clip.md").exists());
    assert!(sidebar.tags().contains(&tag("web")));
    assert_forest_matches_notes(&sidebar);
    assert_in_sync(&sidebar);
}

#[test]
fn dropping_files_imports_notes_and_folders() {
    let dir = library_dir();
    let outside = TempDir::new().unwrap();
    fs::write(outside.path().join("clip.md"), "clipped #web").unwrap();
    fs::create_dir(outside.path().join("Bundle")).unwrap();
    fs::write(outside.path().join("Bundle/b.md"), "#bundle").unwrap();
    fs::create_dir(outside.path().join("Alpha")).unwrap();

    let mut sidebar = open(&dir);
    let zeta = project(&sidebar, "Zeta");
    let payload = DropPayload::Files(vec![
        outside.path().join("clip.md"),
        outside.path().join("Bundle"),
    ]);
    assert_eq!(
        sidebar.validate_drop(Row::Project(zeta), &payload),
        Some(DragOperation::Copy)
    );
    assert!(sidebar.accept_drop(Row::Project(zeta), &payload));

    assert!(dir.path().join("Zeta/clip.md").exists());
    assert!(sidebar.storage().get_by(&sidebar.storage().root().join("Zeta/Bundle")).is_some());
    assert!(sidebar.tags().contains(&tag("web")));
    assert!(sidebar.tags().contains(&tag("bundle")));
    assert_in_sync(&sidebar);

    let inbox = sidebar.row_for_entry(EntryKind::Inbox).unwrap();
    let conflict = DropPayload::Files(vec![outside.path().join("Alpha")]);
    assert!(!sidebar.accept_drop(inbox, &conflict));
    assert_eq!(sidebar.ui().alerts.len(), 1);
}

// ===========================================
// Context menu
// ===========================================

#[test]
fn menu_titles_follow_selection() {
    let dir = library_dir();
    let mut sidebar = open(&dir);

    let alpha = Row::Project(project(&sidebar, "Alpha"));
    sidebar.select(alpha, false);
    assert_eq!(sidebar.validate_command(MenuCommand::Rename).title, "Rename Folder");
    assert_eq!(sidebar.validate_command(MenuCommand::Delete).title, "Delete Folder");
    assert!(sidebar.validate_command(MenuCommand::NewFolder).visible);

    let work = sidebar.row_for_tag(&tag("work")).unwrap();
    sidebar.select(work, false);
    assert_eq!(sidebar.validate_command(MenuCommand::Delete).title, "Delete Tag");
    assert!(!sidebar.validate_command(MenuCommand::Reveal).visible);

    sidebar.select_entry(EntryKind::Trash);
    assert!(!sidebar.validate_command(MenuCommand::Delete).visible);
    assert!(!sidebar.validate_command(MenuCommand::Rename).visible);
    assert!(!sidebar.validate_command(MenuCommand::NewFolder).visible);
    assert!(!sidebar.validate_command(MenuCommand::Snapshot).visible);

    sidebar.select_entry(EntryKind::Inbox);
    assert!(!sidebar.validate_command(MenuCommand::Rename).visible);
    assert!(!sidebar.validate_command(MenuCommand::Delete).visible);
    assert!(sidebar.validate_command(MenuCommand::Snapshot).visible);
}

#[test]
fn perform_new_folder_and_rename() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    sidebar.select(Row::Project(project(&sidebar, "Alpha")), false);

    assert!(sidebar.perform(MenuCommand::NewFolder, Some("Drafts")));
    assert!(dir.path().join("Alpha/Drafts").is_dir());

    sidebar.select(Row::Project(project(&sidebar, "Zeta")), false);
    assert!(sidebar.perform(MenuCommand::Rename, Some("Omega")));
    assert!(dir.path().join("Omega/z.md").exists());
    assert!(root_labels(&sidebar).contains(&"Omega".to_string()));
    assert_in_sync(&sidebar);
}

#[test]
fn perform_rename_tag_takes_inline_input() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    let errand = sidebar.row_for_tag(&tag("errand")).unwrap();
    sidebar.select(errand, false);

    assert!(sidebar.perform(MenuCommand::RenameTag, Some("#chore")));
    assert!(sidebar.tags().contains(&tag("chore")));
    assert!(!sidebar.tags().contains(&tag("errand")));
}

#[test]
fn reveal_reports_selected_folder() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    sidebar.select(Row::Project(project(&sidebar, "Mike")), false);

    assert!(sidebar.perform(MenuCommand::Reveal, None));
    assert_eq!(
        sidebar.ui().revealed,
        vec![sidebar.storage().root().join("Mike")]
    );
}

// ===========================================
// Reload
// ===========================================

#[test]
fn reload_sidebar_keeps_selected_index() {
    let dir = library_dir();
    let mut sidebar = open(&dir);
    let mike = Row::Project(project(&sidebar, "Mike"));
    sidebar.select(mike, false);

    sidebar.reload_sidebar();
    assert_eq!(sidebar.primary_row(), Some(mike));
    assert_in_sync(&sidebar);
}
