//! Tests for database repository operations.

use chrono::{NaiveDate, NaiveDateTime};
use tempfile::NamedTempFile;

use stacktris::{
    GameRepository, GameSummary, NewGameRecord, NewProfile, NewRanking, ProfileChanges,
    RankingPartition, Theme, UserSettings,
};

/// Creates a temporary database file with schema applied, returns the file
/// handle (must stay in scope to keep the file alive) and a ready repository.
fn setup_test_db() -> (NamedTempFile, GameRepository) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();

    let repo = GameRepository::new(db_path).expect("Failed to create repository");
    repo.run_migrations().expect("Migrations failed");
    (db_file, repo)
}

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, day)
        .expect("Invalid date")
        .and_hms_opt(hour, 0, 0)
        .expect("Invalid time")
}

fn new_profile(name: &str) -> NewProfile {
    NewProfile::new(format!("auth-{}", name), name.to_string(), None)
}

fn summary(score: u32) -> GameSummary {
    GameSummary::new(score, 2, 12, 95, 40)
}

#[test]
fn test_empty_path_rejected() {
    assert!(GameRepository::new("  ".to_string()).is_err());
}

#[test]
fn test_create_profile() {
    let (_db, repo) = setup_test_db();
    let profile = repo.create_profile(new_profile("alice")).expect("Create failed");
    assert_eq!(profile.username(), "alice");
    assert_eq!(profile.auth_user_id(), "auth-alice");
    assert!(*profile.id() > 0);
    assert!(profile.avatar_url().is_none());
}

#[test]
fn test_duplicate_username_is_constraint_error() {
    let (_db, repo) = setup_test_db();
    repo.create_profile(new_profile("bob")).expect("First create failed");
    let err = repo
        .create_profile(NewProfile::new("other".to_string(), "bob".to_string(), None))
        .expect_err("Duplicate username should fail");
    assert!(err.constraint);
}

#[test]
fn test_profile_lookups() {
    let (_db, repo) = setup_test_db();
    let created = repo.create_profile(new_profile("carol")).expect("Create failed");

    let by_id = repo.get_profile(*created.id()).expect("Query failed");
    let by_name = repo.get_profile_by_username("carol").expect("Query failed");
    let by_auth = repo.get_profile_by_auth_id("auth-carol").expect("Query failed");
    assert_eq!(by_id.as_ref(), Some(&created));
    assert_eq!(by_name.as_ref(), Some(&created));
    assert_eq!(by_auth.as_ref(), Some(&created));

    assert!(repo.get_profile(9999).expect("Query failed").is_none());
    assert!(repo.get_profile_by_username("nobody").expect("Query failed").is_none());
}

#[test]
fn test_list_profiles_ordered_by_creation() {
    let (_db, repo) = setup_test_db();
    for name in ["alpha", "beta", "gamma"] {
        repo.create_profile(new_profile(name)).expect("Create failed");
    }
    let names: Vec<_> = repo
        .list_profiles()
        .expect("List failed")
        .iter()
        .map(|p| p.username().clone())
        .collect();
    assert_eq!(names, vec!["alpha", "beta", "gamma"]);
}

#[test]
fn test_update_profile_sets_and_clears_avatar() {
    let (_db, repo) = setup_test_db();
    let profile = repo.create_profile(new_profile("dave")).expect("Create failed");

    let changes = ProfileChanges {
        username: Some("david".to_string()),
        avatar_url: Some(Some("https://img.example/d.png".to_string())),
        ..Default::default()
    };
    let updated = repo
        .update_profile(*profile.id(), changes, at(2, 10))
        .expect("Update failed")
        .expect("Profile missing");
    assert_eq!(updated.username(), "david");
    assert_eq!(updated.avatar_url().as_deref(), Some("https://img.example/d.png"));
    assert_eq!(*updated.updated_at(), at(2, 10));

    let cleared = repo
        .update_profile(
            *profile.id(),
            ProfileChanges {
                avatar_url: Some(None),
                ..Default::default()
            },
            at(3, 10),
        )
        .expect("Update failed")
        .expect("Profile missing");
    assert!(cleared.avatar_url().is_none());
    assert_eq!(cleared.username(), "david");
}

#[test]
fn test_update_missing_profile_returns_none() {
    let (_db, repo) = setup_test_db();
    let changes = ProfileChanges {
        username: Some("ghost".to_string()),
        ..Default::default()
    };
    let result = repo.update_profile(42, changes, at(1, 0)).expect("Update failed");
    assert!(result.is_none());
}

#[test]
fn test_record_game_guest_flag_follows_user() {
    let (_db, repo) = setup_test_db();
    let profile = repo.create_profile(new_profile("erin")).expect("Create failed");

    let member = repo
        .record_game(NewGameRecord::from_summary(
            &summary(1200),
            Some(*profile.id()),
            Some("s1".to_string()),
            at(4, 12),
        ))
        .expect("Record failed");
    let guest = repo
        .record_game(NewGameRecord::from_summary(&summary(300), None, None, at(4, 13)))
        .expect("Record failed");

    assert!(!*member.is_guest());
    assert_eq!(*member.user_id(), Some(*profile.id()));
    assert_eq!(*member.score(), 1200);
    assert_eq!(*member.lines_cleared(), 12);
    assert!(*guest.is_guest());
    assert!(guest.user_id().is_none());
}

#[test]
fn test_record_game_for_unknown_user_fails() {
    let (_db, repo) = setup_test_db();
    let result = repo.record_game(NewGameRecord::from_summary(
        &summary(100),
        Some(777),
        None,
        at(5, 0),
    ));
    assert!(result.is_err(), "Foreign key should be enforced");
}

#[test]
fn test_user_records_most_recent_first() {
    let (_db, repo) = setup_test_db();
    let profile = repo.create_profile(new_profile("finn")).expect("Create failed");
    let id = *profile.id();
    for (day, score) in [(1, 100), (3, 300), (2, 200)] {
        repo.record_game(NewGameRecord::from_summary(&summary(score), Some(id), None, at(day, 0)))
            .expect("Record failed");
    }

    let scores: Vec<_> = repo
        .get_user_records(id)
        .expect("Query failed")
        .iter()
        .map(|r| *r.score())
        .collect();
    assert_eq!(scores, vec![300, 200, 100]);
}

#[test]
fn test_member_records_between_excludes_guests_and_outside() {
    let (_db, repo) = setup_test_db();
    let profile = repo.create_profile(new_profile("gina")).expect("Create failed");
    let id = *profile.id();
    repo.record_game(NewGameRecord::from_summary(&summary(1), Some(id), None, at(1, 0)))
        .expect("Record failed");
    repo.record_game(NewGameRecord::from_summary(&summary(2), Some(id), None, at(10, 0)))
        .expect("Record failed");
    repo.record_game(NewGameRecord::from_summary(&summary(3), None, None, at(10, 1)))
        .expect("Record failed");
    repo.record_game(NewGameRecord::from_summary(&summary(4), Some(id), None, at(20, 0)))
        .expect("Record failed");

    let bounded = repo
        .get_member_records_between(at(5, 0), Some(at(20, 0)))
        .expect("Query failed");
    assert_eq!(bounded.len(), 1);
    assert_eq!(*bounded[0].score(), 2);

    let open = repo
        .get_member_records_between(at(5, 0), None)
        .expect("Query failed");
    assert_eq!(open.len(), 2);
}

#[test]
fn test_settings_upsert_replaces_row() {
    let (_db, repo) = setup_test_db();
    let profile = repo.create_profile(new_profile("hana")).expect("Create failed");
    let id = *profile.id();
    assert!(repo.get_settings(id).expect("Query failed").is_none());

    repo.upsert_settings(UserSettings::default().to_row(id, at(1, 0)))
        .expect("Insert failed");
    let changed = UserSettings::default()
        .with_master_volume(10)
        .with_theme(Theme::Dark);
    repo.upsert_settings(changed.to_row(id, at(2, 0)))
        .expect("Update failed");

    let row = repo
        .get_settings(id)
        .expect("Query failed")
        .expect("Settings missing");
    let loaded = UserSettings::try_from(&row).expect("Row should convert");
    assert_eq!(loaded, changed);
}

#[test]
fn test_replace_rankings_swaps_period_rows() {
    let (_db, repo) = setup_test_db();
    let a = *repo.create_profile(new_profile("ivy")).expect("Create failed").id();
    let b = *repo.create_profile(new_profile("jon")).expect("Create failed").id();
    let start = at(2, 0);
    let row = |user: i32, rank: i32, score: i32| {
        NewRanking::new(user, "weekly".to_string(), start, Some(at(9, 0)), rank, score, 1, at(3, 0))
    };

    repo.replace_rankings(RankingPartition::Weekly, start, vec![row(a, 1, 500), row(b, 2, 400)])
        .expect("Replace failed");
    repo.replace_rankings(RankingPartition::Weekly, start, vec![row(b, 1, 900), row(a, 2, 500)])
        .expect("Replace failed");

    let rows = repo
        .list_rankings(RankingPartition::Weekly, start)
        .expect("List failed");
    assert_eq!(rows.len(), 2);
    assert_eq!(*rows[0].user_id(), b);
    assert_eq!(*rows[0].rank(), 1);
    assert_eq!(rows[0].partition().expect("Partition"), RankingPartition::Weekly);

    assert!(
        repo.list_rankings(RankingPartition::Monthly, start)
            .expect("List failed")
            .is_empty()
    );
    assert_eq!(repo.get_user_rankings(a).expect("Query failed").len(), 1);
}
