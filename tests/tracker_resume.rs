mod helpers;

use blogforge::store::{SiteStore, StoreError};
use blogforge::tracker::{TrackerState, WorkItem};
use helpers::{ScriptedStages, SITE, article_for, guideline_for, profile, tracker};
use serde_json::json;
use std::fs;
use std::path::Path;

fn state_file(root: &Path) -> std::path::PathBuf {
    SiteStore::new(root, SITE).state_path()
}

fn load(root: &Path) -> TrackerState {
    let raw = fs::read_to_string(state_file(root)).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn item<'a>(state: &'a TrackerState, title: &str) -> &'a WorkItem {
    state
        .items()
        .iter()
        .find(|i| i.title() == title)
        .unwrap_or_else(|| panic!("no item titled {title}"))
}

fn write_state(root: &Path, value: serde_json::Value) {
    fs::write(state_file(root), serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

#[tokio::test]
async fn test_fresh_state_proposes_and_completes_a_batch() {
    let dir = tempfile::tempdir().unwrap();
    let stages = ScriptedStages::new();
    stages.propose(&["Top 5 Solar Myths", "Net Metering Explained", "Third Topic"]);

    let report = tracker(dir.path(), &stages).resume(&profile()).await.unwrap();

    assert_eq!(report.proposed, 2);
    assert_eq!((report.guidelines, report.articles, report.images), (2, 2, 2));
    assert_eq!((report.total, report.incomplete, report.failures), (2, 0, 0));

    let state = load(dir.path());
    let myths = item(&state, "Top 5 Solar Myths");
    assert!(myths.is_complete());
    assert_eq!(
        myths.guideline_path.as_deref(),
        Some(Path::new("guidelines/top_5_solar_myths_guideline.txt"))
    );
    assert_eq!(
        myths.article_path.as_deref(),
        Some(Path::new("blogs/top_5_solar_myths_blog.md"))
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("blogs/top_5_solar_myths_blog.md")).unwrap(),
        article_for("Top 5 Solar Myths")
    );
    assert_eq!(myths.images.len(), 2);
    assert!(dir.path().join("images/top_5_solar_myths/image_2.png").exists());
    assert!(state.items().iter().all(|i| i.title() != "Third Topic"));

    let script = stages.script();
    assert_eq!(script.proposal_calls, vec![Vec::<String>::new()]);
    assert_eq!(
        script.article_calls[0],
        ("Top 5 Solar Myths".to_string(), guideline_for("Top 5 Solar Myths"))
    );
}

#[tokio::test]
async fn test_completed_state_is_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let stages = ScriptedStages::new();
    stages.propose(&["A", "B"]);
    tracker(dir.path(), &stages).resume(&profile()).await.unwrap();
    let before = fs::read(state_file(dir.path())).unwrap();

    // proposer has nothing new to offer
    let report = tracker(dir.path(), &stages).resume(&profile()).await.unwrap();

    assert!(!report.made_progress());
    assert_eq!(fs::read(state_file(dir.path())).unwrap(), before);
    let script = stages.script();
    assert_eq!(script.guideline_calls.len(), 2);
    assert_eq!(script.article_calls.len(), 2);
    assert_eq!(script.image_calls.len(), 2);
    assert_eq!(script.proposal_calls.len(), 2);
}

#[tokio::test]
async fn test_proposals_never_duplicate_tracked_titles() {
    let dir = tempfile::tempdir().unwrap();
    let stages = ScriptedStages::new();
    stages.propose(&["Top 5 Solar Myths", "Net Metering Explained"]);
    tracker(dir.path(), &stages).resume(&profile()).await.unwrap();

    stages.propose(&["  top 5 solar MYTHS", "Net Metering Explained", "Going Solar in Patna"]);
    let report = tracker(dir.path(), &stages).resume(&profile()).await.unwrap();

    assert_eq!(report.proposed, 1);
    let state = load(dir.path());
    assert_eq!(state.len(), 3);
    assert!(item(&state, "Going Solar in Patna").is_complete());

    let known = &stages.script().proposal_calls[1];
    assert!(known.contains(&"top 5 solar myths".to_string()));
    assert!(known.contains(&"net metering explained".to_string()));
}

#[tokio::test]
async fn test_resume_continues_at_article_stage() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("guidelines")).unwrap();
    fs::write(
        dir.path().join("guidelines/top_5_solar_myths_guideline.txt"),
        "SAVED GUIDELINE",
    )
    .unwrap();
    write_state(
        dir.path(),
        json!([{
            "title": "Top 5 Solar Myths",
            "keyword": "solar myths",
            "guideline_done": true,
            "article_done": false,
            "images_done": false,
            "guideline_path": "guidelines/top_5_solar_myths_guideline.txt",
            "article_path": null,
            "images": []
        }]),
    );
    let stages = ScriptedStages::new();

    let report = tracker(dir.path(), &stages).resume(&profile()).await.unwrap();

    assert_eq!((report.guidelines, report.articles, report.images), (0, 1, 1));
    assert!(item(&load(dir.path()), "Top 5 Solar Myths").is_complete());

    let script = stages.script();
    assert!(script.guideline_calls.is_empty());
    assert_eq!(script.article_calls[0].1, "SAVED GUIDELINE");
    // no incomplete items remained, so a new round was requested
    assert_eq!(script.proposal_calls.len(), 1);
}

#[tokio::test]
async fn test_empty_guideline_is_retried_next_run() {
    let dir = tempfile::tempdir().unwrap();
    write_state(dir.path(), json!([{"title": "Solar Subsidies 2025"}]));
    let stages = ScriptedStages::new();
    stages.empty_guideline_for("Solar Subsidies 2025");

    let report = tracker(dir.path(), &stages).resume(&profile()).await.unwrap();

    assert_eq!(report.failures, 1);
    assert_eq!(report.incomplete, 1);
    let saved = load(dir.path());
    let subsidies = item(&saved, "Solar Subsidies 2025");
    assert!(!subsidies.guideline_done && !subsidies.article_done && !subsidies.images_done);
    {
        let script = stages.script();
        assert!(script.article_calls.is_empty());
        assert!(script.proposal_calls.is_empty());
    }

    stages.heal();
    let report = tracker(dir.path(), &stages).resume(&profile()).await.unwrap();
    assert_eq!(report.incomplete, 0);
    assert!(item(&load(dir.path()), "Solar Subsidies 2025").is_complete());
}

#[tokio::test]
async fn test_failure_is_isolated_to_one_item() {
    let dir = tempfile::tempdir().unwrap();
    write_state(dir.path(), json!([{"title": "A"}, {"title": "B"}, {"title": "C"}]));
    let stages = ScriptedStages::new();
    stages.failing_article_for("B");

    let report = tracker(dir.path(), &stages).resume(&profile()).await.unwrap();

    assert_eq!(report.incomplete, 1);
    let state = load(dir.path());
    assert!(item(&state, "A").is_complete());
    assert!(item(&state, "C").is_complete());
    let b = item(&state, "B");
    assert!(b.guideline_done);
    assert!(!b.article_done && !b.images_done);

    // a second failing run never reverts the finished guideline
    tracker(dir.path(), &stages).resume(&profile()).await.unwrap();
    let b = item(&load(dir.path()), "B").clone();
    assert!(b.guideline_done);
    assert_eq!(stages.script().guideline_calls.iter().filter(|t| *t == "B").count(), 1);
}

#[tokio::test]
async fn test_image_failure_does_not_block_later_items() {
    let dir = tempfile::tempdir().unwrap();
    write_state(dir.path(), json!([{"title": "A"}, {"title": "B"}]));
    let stages = ScriptedStages::new();
    stages.failing_images_for("A");

    let report = tracker(dir.path(), &stages).resume(&profile()).await.unwrap();

    assert_eq!(report.failures, 1);
    let state = load(dir.path());
    let a = item(&state, "A");
    assert!(a.images_done);
    assert!(a.images.is_empty());
    let b = item(&state, "B");
    assert!(b.is_complete());
    assert_eq!(b.images.len(), 2);
}

#[tokio::test]
async fn test_legacy_topics_seed_empty_state() {
    let dir = tempfile::tempdir().unwrap();
    let store = SiteStore::new(dir.path(), SITE);
    fs::write(
        store.legacy_topics_path(),
        json!([
            {"title": "Legacy One", "primary_keyword": "one", "SEO_priority_score": 80},
            "Legacy Two",
            {"title": "legacy one"}
        ])
        .to_string(),
    )
    .unwrap();
    let stages = ScriptedStages::new();

    let report = tracker(dir.path(), &stages).resume(&profile()).await.unwrap();

    assert_eq!(report.seeded, 2);
    assert_eq!(report.total, 2);
    let state = load(dir.path());
    assert_eq!(item(&state, "Legacy One").topic.priority, Some(80));
    assert!(item(&state, "Legacy Two").is_complete());
}

#[tokio::test]
async fn test_missing_guideline_is_regenerated_and_written_back() {
    let dir = tempfile::tempdir().unwrap();
    write_state(
        dir.path(),
        json!([{
            "title": "Lost Guideline",
            "guideline_done": true,
            "guideline_path": "guidelines/lost_guideline_guideline.txt"
        }]),
    );
    let stages = ScriptedStages::new();

    tracker(dir.path(), &stages).resume(&profile()).await.unwrap();

    assert_eq!(stages.script().guideline_calls, vec!["Lost Guideline".to_string()]);
    assert_eq!(
        fs::read_to_string(dir.path().join("guidelines/lost_guideline_guideline.txt")).unwrap(),
        guideline_for("Lost Guideline")
    );
    assert!(item(&load(dir.path()), "Lost Guideline").is_complete());
}

#[tokio::test]
async fn test_images_use_regenerated_article_when_file_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("guidelines")).unwrap();
    fs::write(dir.path().join("guidelines/g.txt"), "KEPT").unwrap();
    write_state(
        dir.path(),
        json!([{
            "title": "Lost Article",
            "guideline_done": true,
            "article_done": true,
            "guideline_path": "guidelines/g.txt",
            "article_path": "blogs/gone_blog.md"
        }]),
    );
    let stages = ScriptedStages::new();

    tracker(dir.path(), &stages).resume(&profile()).await.unwrap();

    let script = stages.script();
    assert_eq!(script.article_calls, vec![("Lost Article".to_string(), "KEPT".to_string())]);
    assert_eq!(script.image_calls[0].1, article_for("Lost Article"));
    assert!(dir.path().join("blogs/gone_blog.md").exists());
    drop(script);
    assert!(item(&load(dir.path()), "Lost Article").images_done);
}

#[tokio::test]
async fn test_images_wait_when_article_cannot_be_recovered() {
    let dir = tempfile::tempdir().unwrap();
    write_state(
        dir.path(),
        json!([{
            "title": "No Article",
            "guideline_done": true,
            "article_done": true,
            "guideline_path": "guidelines/none.txt",
            "article_path": "blogs/none.md"
        }]),
    );
    let stages = ScriptedStages::new();
    stages.failing_article_for("No Article");

    let report = tracker(dir.path(), &stages).resume(&profile()).await.unwrap();

    assert_eq!(report.images, 0);
    assert!(stages.script().image_calls.is_empty());
    let state = load(dir.path());
    let stuck = item(&state, "No Article");
    assert!(stuck.article_done);
    assert!(!stuck.images_done);
}

#[tokio::test]
async fn test_zero_images_still_closes_the_stage() {
    let dir = tempfile::tempdir().unwrap();
    write_state(dir.path(), json!([{"title": "Imageless"}]));
    let stages = ScriptedStages::new();
    stages.script().no_images = true;

    let report = tracker(dir.path(), &stages).resume(&profile()).await.unwrap();

    assert_eq!(report.images, 1);
    let state = load(dir.path());
    let imageless = item(&state, "Imageless");
    assert!(imageless.images_done);
    assert!(imageless.images.is_empty());
}

fn write_article_ready_state(root: &Path, title: &str, article: &str) {
    fs::create_dir_all(root.join("blogs")).unwrap();
    fs::write(root.join("blogs/ready_blog.md"), article).unwrap();
    write_state(
        root,
        json!([{
            "title": title,
            "guideline_done": true,
            "article_done": true,
            "guideline_path": "guidelines/ready.txt",
            "article_path": "blogs/ready_blog.md"
        }]),
    );
}

#[tokio::test]
async fn test_image_title_comes_from_article_metadata() {
    let dir = tempfile::tempdir().unwrap();
    write_article_ready_state(
        dir.path(),
        "Raw Title",
        "<!-- META_TITLE: Polished Title -->\n<!-- META_DESC: Polished. -->\n\n# Polished Title\n\nBody.\n",
    );
    let stages = ScriptedStages::new();

    tracker(dir.path(), &stages).resume(&profile()).await.unwrap();

    let script = stages.script();
    assert!(script.article_calls.is_empty());
    assert_eq!(script.image_calls[0].0, "Polished Title");
}

#[tokio::test]
async fn test_image_title_falls_back_to_topic_title() {
    let dir = tempfile::tempdir().unwrap();
    write_article_ready_state(dir.path(), "Raw Title", "# Some Heading\n\nBody without metadata.\n");
    let stages = ScriptedStages::new();

    tracker(dir.path(), &stages).resume(&profile()).await.unwrap();

    assert_eq!(stages.script().image_calls[0].0, "Raw Title");
}

#[tokio::test]
async fn test_corrupt_state_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(state_file(dir.path()), "[{not json").unwrap();
    let stages = ScriptedStages::new();

    let result = tracker(dir.path(), &stages).resume(&profile()).await;

    assert!(matches!(result, Err(StoreError::Json { .. })));
    assert!(stages.script().proposal_calls.is_empty());
}
