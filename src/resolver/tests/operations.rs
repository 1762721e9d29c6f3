use serde_json::json;

use crate::{
    conflict,
    error::AlignerError,
    index::DependencyIndex,
    manifest::DependencyBucket,
    resolver::{
        ChangeAction, Mutation, SyncCandidates,
        operations::{
            apply_removal, apply_update, packages_in_use, sync_candidates,
        },
        sync_to_version,
    },
    test_helpers::{MonorepoFixture, conflicting_fixture},
};

#[tokio::test]
async fn sync_rewrites_only_workspaces_on_other_versions() {
    let fixture = conflicting_fixture();
    let before_b = fixture.read_raw("packages/b");
    let repo = fixture.scan().await;
    let index = DependencyIndex::build(&repo.workspaces);
    let conflicts = conflict::detect(&index);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].versions.len(), 2);

    let changes =
        sync_to_version("dep", "^2.0.0", &conflicts[0].versions, false)
            .await
            .unwrap();

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].workspace, "a");
    assert_eq!(changes[0].bucket, DependencyBucket::Dependencies);
    assert_eq!(changes[0].before.as_deref(), Some("^1.0.0"));
    assert_eq!(changes[0].after.as_deref(), Some("^2.0.0"));

    assert_eq!(fixture.read_json("apps/a")["dependencies"]["dep"], "^2.0.0");
    assert_eq!(fixture.read_raw("packages/b"), before_b);
}

#[tokio::test]
async fn sync_is_idempotent() {
    let fixture = conflicting_fixture();
    let repo = fixture.scan().await;
    let index = DependencyIndex::build(&repo.workspaces);
    let versions = index.get("dep").unwrap();

    let first = sync_to_version("dep", "^2.0.0", versions, false)
        .await
        .unwrap();
    let second = sync_to_version("dep", "^2.0.0", versions, false)
        .await
        .unwrap();

    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
}

#[tokio::test]
async fn dry_run_matches_commit_and_writes_nothing() {
    let previewed = conflicting_fixture();
    let direct = conflicting_fixture();

    let raw_before = previewed.read_raw("apps/a");
    let repo = previewed.scan().await;
    let index = DependencyIndex::build(&repo.workspaces);
    let versions = index.get("dep").unwrap();

    let preview = sync_to_version("dep", "^1.0.0", versions, true)
        .await
        .unwrap();
    assert_eq!(previewed.read_raw("apps/a"), raw_before);
    assert_eq!(
        previewed.read_raw("packages/b"),
        conflicting_fixture().read_raw("packages/b")
    );

    let committed = sync_to_version("dep", "^1.0.0", versions, false)
        .await
        .unwrap();
    assert_eq!(preview, committed);

    let direct_repo = direct.scan().await;
    let direct_index = DependencyIndex::build(&direct_repo.workspaces);
    let direct_changes = sync_to_version(
        "dep",
        "^1.0.0",
        direct_index.get("dep").unwrap(),
        false,
    )
    .await
    .unwrap();

    let strip = |records: &[crate::resolver::ChangeRecord]| {
        records
            .iter()
            .map(|c| {
                (
                    c.workspace.clone(),
                    c.bucket,
                    c.before.clone(),
                    c.after.clone(),
                )
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(strip(&committed), strip(&direct_changes));
    assert_eq!(
        previewed.read_json("packages/b")["devDependencies"]["dep"],
        "^1.0.0"
    );
}

#[test_log::test(tokio::test)]
async fn sync_writes_the_located_bucket_not_the_grouped_one() {
    // x is indexed under its peer range but writes go to dependencies
    let fixture = MonorepoFixture::new()
        .app(
            "x",
            r#"{
  "dependencies": {"react": "^18.0.0"},
  "peerDependencies": {"react": ">=17"}
}"#,
        )
        .app("y", r#"{"dependencies": {"react": "^17.0.0"}}"#);
    let before_x = fixture.read_raw("apps/x");
    let repo = fixture.scan().await;
    let index = DependencyIndex::build(&repo.workspaces);
    let versions = index.get("react").unwrap();
    assert!(versions.contains_key(">=17"));

    let already = sync_to_version("react", "^18.0.0", versions, false)
        .await
        .unwrap();
    assert_eq!(already.len(), 1);
    assert_eq!(already[0].workspace, "y");
    assert_eq!(fixture.read_raw("apps/x"), before_x);

    let changes = sync_to_version("react", "^17.0.0", versions, true)
        .await
        .unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].workspace, "x");
    assert_eq!(changes[0].bucket, DependencyBucket::Dependencies);
    assert_eq!(changes[0].before.as_deref(), Some("^18.0.0"));
}

#[tokio::test]
async fn sync_failure_keeps_earlier_writes() {
    let fixture = MonorepoFixture::new()
        .app("a", r#"{"name": "a", "dependencies": {"dep": "1.0.0"}}"#)
        .app("b", r#"{"name": "b", "dependencies": {"dep": "1.0.0"}}"#)
        .app("c", r#"{"name": "c", "dependencies": {"dep": "2.0.0"}}"#);
    let repo = fixture.scan().await;
    let index = DependencyIndex::build(&repo.workspaces);
    let versions = index.get("dep").unwrap();

    std::fs::write(fixture.manifest_file("apps/b"), "{ broken").unwrap();

    let result = sync_to_version("dep", "2.0.0", versions, false).await;

    assert!(matches!(result, Err(AlignerError::Scan { .. })));
    assert_eq!(fixture.read_json("apps/a")["dependencies"]["dep"], "2.0.0");
    assert_eq!(fixture.read_raw("apps/b"), "{ broken");
}

#[tokio::test]
async fn sync_preserves_unrelated_fields() {
    let fixture = MonorepoFixture::new()
        .app(
            "a",
            r#"{
  "name": "a",
  "scripts": {"dev": "vite"},
  "dependencies": {"dep": "1.0.0", "other": "3.0.0"},
  "browserslist": ["defaults"]
}"#,
        )
        .app("b", r#"{"name": "b", "dependencies": {"dep": "2.0.0"}}"#);
    let repo = fixture.scan().await;
    let index = DependencyIndex::build(&repo.workspaces);

    sync_to_version("dep", "2.0.0", index.get("dep").unwrap(), false)
        .await
        .unwrap();

    assert_eq!(
        fixture.read_json("apps/a"),
        json!({
            "name": "a",
            "scripts": {"dev": "vite"},
            "dependencies": {"dep": "2.0.0", "other": "3.0.0"},
            "browserslist": ["defaults"]
        })
    );
    assert!(fixture.read_raw("apps/a").ends_with("}\n"));
}

#[tokio::test]
async fn update_adds_and_updates_entries() {
    let fixture = MonorepoFixture::new()
        .root(r#"{"name": "root"}"#)
        .app("a", r#"{"name": "a", "devDependencies": {"vitest": "^1.0.0"}}"#);
    let repo = fixture.scan().await;
    let targets: Vec<_> = repo.workspaces.iter().collect();

    let changes = apply_update(
        "vitest",
        "^2.0.0",
        DependencyBucket::DevDependencies,
        &targets,
        false,
    )
    .await
    .unwrap();

    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].workspace, "root");
    assert_eq!(changes[0].action(), ChangeAction::Add);
    assert_eq!(changes[1].workspace, "a");
    assert_eq!(changes[1].action(), ChangeAction::Update);
    assert_eq!(changes[1].before.as_deref(), Some("^1.0.0"));

    assert_eq!(fixture.read_json(".")["devDependencies"]["vitest"], "^2.0.0");
    assert_eq!(
        fixture.read_json("apps/a")["devDependencies"]["vitest"],
        "^2.0.0"
    );

    let again = apply_update(
        "vitest",
        "^2.0.0",
        DependencyBucket::DevDependencies,
        &targets,
        false,
    )
    .await
    .unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn update_dry_run_leaves_files_alone() {
    let fixture = MonorepoFixture::new().app("a", r#"{"name": "a"}"#);
    let repo = fixture.scan().await;
    let targets: Vec<_> = repo.workspaces.iter().collect();

    let changes = apply_update(
        "zod",
        "^3.23.0",
        DependencyBucket::Dependencies,
        &targets,
        true,
    )
    .await
    .unwrap();

    assert_eq!(changes.len(), 1);
    assert_eq!(fixture.read_raw("apps/a"), r#"{"name": "a"}"#);
}

#[tokio::test]
async fn removal_deletes_only_the_dev_dependency() {
    let fixture = MonorepoFixture::new()
        .app(
            "x",
            r#"{
  "name": "x",
  "version": "1.0.0",
  "dependencies": {"react": "^18.0.0"},
  "devDependencies": {"eslint": "^9.0.0", "prettier": "^3.0.0"}
}"#,
        )
        .app("y", r#"{"name": "y", "dependencies": {"react": "^18.0.0"}}"#);
    let before_y = fixture.read_raw("apps/y");
    let repo = fixture.scan().await;
    let targets = repo.declaring("eslint");
    assert_eq!(targets.len(), 1);

    let changes = apply_removal("eslint", &targets, false).await.unwrap();

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].bucket, DependencyBucket::DevDependencies);
    assert_eq!(changes[0].action(), ChangeAction::Remove);
    assert_eq!(changes[0].before.as_deref(), Some("^9.0.0"));

    assert_eq!(
        fixture.read_json("apps/x"),
        json!({
            "name": "x",
            "version": "1.0.0",
            "dependencies": {"react": "^18.0.0"},
            "devDependencies": {"prettier": "^3.0.0"}
        })
    );
    assert_eq!(fixture.read_raw("apps/y"), before_y);
}

#[tokio::test]
async fn removal_skips_workspaces_without_the_package() {
    let fixture = MonorepoFixture::new()
        .app("a", r#"{"name": "a", "dependencies": {"left-pad": "1.0.0"}}"#)
        .app("b", r#"{"name":"b"}"#);
    let repo = fixture.scan().await;
    let targets: Vec<_> = repo.workspaces.iter().collect();

    let changes = apply_removal("left-pad", &targets, false).await.unwrap();

    assert_eq!(changes.len(), 1);
    assert_eq!(fixture.read_raw("apps/b"), r#"{"name":"b"}"#);
}

#[tokio::test]
async fn packages_in_use_is_sorted_and_unique() {
    let fixture = MonorepoFixture::new()
        .app(
            "a",
            r#"{"dependencies": {"zod": "1"}, "devDependencies": {"Vite": "5"}}"#,
        )
        .app(
            "b",
            r#"{
  "dependencies": {"axios": "1", "zod": "2"},
  "peerDependencies": {"react": "18"}
}"#,
        );
    let repo = fixture.scan().await;

    assert_eq!(
        packages_in_use(&repo.workspaces),
        vec!["axios", "react", "Vite", "zod"]
    );
}

#[tokio::test]
async fn sync_candidates_classifies_package() {
    let fixture = conflicting_fixture()
        .package("c", r#"{"name": "c", "dependencies": {"solo": "1.0.0"}}"#);
    let repo = fixture.scan().await;

    assert!(matches!(
        sync_candidates("missing", &repo.workspaces),
        SyncCandidates::NotFound
    ));
    assert!(matches!(
        sync_candidates("solo", &repo.workspaces),
        SyncCandidates::AlreadySynced(v) if v == "1.0.0"
    ));
    match sync_candidates("dep", &repo.workspaces) {
        SyncCandidates::Conflicted(versions) => assert_eq!(versions.len(), 2),
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn mutation_preview_then_commit() {
    let fixture = conflicting_fixture();
    let repo = fixture.scan().await;
    let index = DependencyIndex::build(&repo.workspaces);

    let mutation = Mutation::Sync {
        package: "dep".into(),
        target: "^2.0.0".into(),
        versions: index.get("dep").unwrap().clone(),
    };

    let preview = mutation.run(true).await.unwrap();
    let applied = mutation.run(false).await.unwrap();

    assert_eq!(preview, applied);
    assert_eq!(mutation.title(), "Sync");
    assert_eq!(
        mutation.affected_paths(),
        vec![repo.workspaces[1].path.clone(), repo.workspaces[2].path.clone()]
    );
}
