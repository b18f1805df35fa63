//! Tests for the profile service: profiles, game recording, statistics,
//! settings and ranking refresh.

use chrono::Utc;
use tempfile::NamedTempFile;

use stacktris::{
    AuthUser, GameConfig, GameRepository, GameState, GameSummary, Locale, ProfileChanges,
    ProfileService, RankingPartition, ServiceErrorKind, SimpleBot, UserSettings, play_game,
    username_from_email,
};

fn setup_service() -> (NamedTempFile, ProfileService) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    let repo = GameRepository::new(db_path).expect("Failed to create repository");
    repo.run_migrations().expect("Migrations failed");
    (db_file, ProfileService::new(repo))
}

fn user(id: &str, email: &str) -> AuthUser {
    AuthUser::new(id.to_string(), Some(email.to_string()))
}

fn summary(score: u32) -> GameSummary {
    GameSummary::new(score, 3, 25, 180, 70)
}

#[test]
fn test_username_from_email() {
    assert_eq!(username_from_email(Some("mika.t@example.com")), "mika.t");
    assert_eq!(username_from_email(Some("a+b@example.com")), "ab");
    assert_eq!(username_from_email(Some("@example.com")), "player");
    assert_eq!(username_from_email(None), "player");
}

#[test]
fn test_get_or_create_profile_is_idempotent() {
    let (_db, service) = setup_service();
    let u = user("uid-1", "kai@example.com");

    let first = service.get_or_create_profile(&u, None).expect("Create failed");
    let second = service.get_or_create_profile(&u, None).expect("Lookup failed");
    assert_eq!(first, second);
    assert_eq!(first.username(), "kai");
}

#[test]
fn test_get_or_create_profile_deduplicates_username() {
    let (_db, service) = setup_service();
    let a = service
        .get_or_create_profile(&user("uid-a", "sam@one.example"), None)
        .expect("Create failed");
    let b = service
        .get_or_create_profile(&user("uid-b", "sam@two.example"), None)
        .expect("Create failed");
    let c = service
        .get_or_create_profile(&user("uid-c", "sam@three.example"), None)
        .expect("Create failed");
    assert_eq!(a.username(), "sam");
    assert_eq!(b.username(), "sam2");
    assert_eq!(c.username(), "sam3");
}

#[test]
fn test_update_profile_validates_and_conflicts() {
    let (_db, service) = setup_service();
    let a = service
        .get_or_create_profile(&user("uid-a", "lee@example.com"), None)
        .expect("Create failed");
    service
        .get_or_create_profile(&user("uid-b", "max@example.com"), None)
        .expect("Create failed");

    let empty = service
        .update_profile(
            *a.id(),
            ProfileChanges {
                username: Some("   ".to_string()),
                ..Default::default()
            },
        )
        .expect_err("Blank username should fail");
    assert_eq!(empty.kind, ServiceErrorKind::Invalid);

    let taken = service
        .update_profile(
            *a.id(),
            ProfileChanges {
                username: Some("max".to_string()),
                ..Default::default()
            },
        )
        .expect_err("Taken username should fail");
    assert_eq!(taken.kind, ServiceErrorKind::Conflict);

    let missing = service
        .update_profile(
            999,
            ProfileChanges {
                username: Some("new".to_string()),
                ..Default::default()
            },
        )
        .expect_err("Missing profile should fail");
    assert_eq!(missing.kind, ServiceErrorKind::NotFound);
}

#[test]
fn test_record_unfinished_game_rejected() {
    let (_db, service) = setup_service();
    let mut game = GameState::new(GameConfig::default(), 3).expect("Valid config");
    game.start().expect("Start failed");

    let err = service
        .record_finished_game(&game, None, None)
        .expect_err("Game in progress should not record");
    assert_eq!(err.kind, ServiceErrorKind::Invalid);
}

#[test]
fn test_record_finished_game() {
    let (_db, service) = setup_service();
    let profile = service
        .get_or_create_profile(&user("uid-drop", "drop@example.com"), None)
        .expect("Create failed");

    let mut game = GameState::new(GameConfig::default(), 11).expect("Valid config");
    game.start().expect("Start failed");
    for _ in 0..200 {
        if game.is_over() {
            break;
        }
        game.hard_drop();
    }
    assert!(game.is_over(), "Stacking in the middle should top out");

    let record = service
        .record_finished_game(&game, Some(*profile.id()), Some("sess".to_string()))
        .expect("Record failed");
    assert!(!*record.is_guest());
    assert_eq!(record.session_id().as_deref(), Some("sess"));
    assert_eq!(*record.score() as u32, *game.stats().score());
    assert_eq!(*record.tetromino_count() as u32, *game.stats().tetrominoes());
}

#[test]
fn test_bot_clears_lines() {
    let game = play_game(&SimpleBot::new("bot"), GameConfig::default(), 5, 200, 100)
        .expect("Play failed");
    assert!(*game.stats().lines() > 0);
    assert!(*game.stats().tetrominoes() > 0);
}

#[test]
fn test_guest_games_never_rank() {
    let (_db, service) = setup_service();
    let now = Utc::now().naive_utc();

    service
        .record_summary(&summary(99_999), None, None, now)
        .expect("Record failed");

    for partition in RankingPartition::ALL {
        assert!(
            service.get_rankings(partition).expect("Query failed").is_empty(),
            "{} should be empty",
            partition
        );
    }
}

#[test]
fn test_recording_refreshes_every_partition() {
    let (_db, service) = setup_service();
    let a = *service
        .get_or_create_profile(&user("uid-a", "ann@example.com"), None)
        .expect("Create failed")
        .id();
    let b = *service
        .get_or_create_profile(&user("uid-b", "ben@example.com"), None)
        .expect("Create failed")
        .id();
    let now = Utc::now().naive_utc();

    for (owner, score) in [(a, 500), (b, 800), (a, 300)] {
        service
            .record_summary(&summary(score), Some(owner), None, now)
            .expect("Record failed");
    }

    for partition in RankingPartition::ALL {
        let rows = service.get_rankings(partition).expect("Query failed");
        assert_eq!(rows.len(), 2, "{}", partition);
        assert_eq!(*rows[0].user_id(), b);
        assert_eq!(*rows[0].rank(), 1);
        assert_eq!(*rows[1].user_id(), a);
        assert_eq!(*rows[1].best_score(), 500);
        assert_eq!(*rows[1].games_played(), 2);
    }
    assert_eq!(service.get_user_rankings(a).expect("Query failed").len(), 4);
}

#[test]
fn test_statistics_and_personal_best() {
    let (_db, service) = setup_service();
    let id = *service
        .get_or_create_profile(&user("uid-s", "sue@example.com"), None)
        .expect("Create failed")
        .id();

    let empty = service.get_statistics(id).expect("Stats failed");
    assert_eq!(*empty.statistics.total_games(), 0);
    assert_eq!(*empty.statistics.average_score(), 0.0);
    assert!(empty.personal_best.is_none());

    let now = Utc::now().naive_utc();
    service
        .record_summary(&GameSummary::new(400, 4, 30, 200, 90), Some(id), None, now)
        .expect("Record failed");
    service
        .record_summary(&GameSummary::new(200, 6, 50, 100, 60), Some(id), None, now)
        .expect("Record failed");

    let report = service.get_statistics(id).expect("Stats failed");
    assert_eq!(*report.statistics.total_games(), 2);
    assert_eq!(*report.statistics.total_score(), 600);
    assert_eq!(*report.statistics.total_lines(), 80);
    assert_eq!(*report.statistics.total_play_secs(), 300);
    assert_eq!(*report.statistics.average_score(), 300.0);

    let best = report.personal_best.expect("Personal best");
    assert_eq!(*best.best_score(), 400);
    assert_eq!(*best.best_score_level(), 4);
    assert_eq!(*best.highest_level(), 6);
    assert_eq!(*best.most_lines(), 50);
    assert_eq!(*best.longest_duration_secs(), 200);
}

#[test]
fn test_settings_default_then_update() {
    let (_db, service) = setup_service();
    let id = *service
        .get_or_create_profile(&user("uid-t", "tom@example.com"), None)
        .expect("Create failed")
        .id();

    assert_eq!(service.get_settings(id).expect("Get failed"), UserSettings::default());

    let wanted = UserSettings::default().with_locale(Locale::Ja).with_bgm_volume(0);
    let saved = service.update_settings(id, wanted).expect("Update failed");
    assert_eq!(saved, wanted);
    assert_eq!(service.get_settings(id).expect("Get failed"), wanted);

    let too_loud = UserSettings::default().with_sfx_volume(101);
    let err = service
        .update_settings(id, too_loud)
        .expect_err("Volume above 100 should fail");
    assert_eq!(err.kind, ServiceErrorKind::Invalid);
}

#[test]
fn test_history_of_unknown_user_is_not_found() {
    let (_db, service) = setup_service();
    let err = service.get_history(404).expect_err("Should fail");
    assert_eq!(err.kind, ServiceErrorKind::NotFound);
}

#[test]
fn test_concurrent_recording_keeps_every_ranking() {
    let (_db, service) = setup_service();
    let ids: Vec<i32> = (0..8)
        .map(|i| {
            let u = user(&format!("uid-{}", i), &format!("p{}@example.com", i));
            *service
                .get_or_create_profile(&u, None)
                .expect("Create failed")
                .id()
        })
        .collect();
    let now = Utc::now().naive_utc();

    std::thread::scope(|scope| {
        for (i, id) in ids.iter().enumerate() {
            let service = service.clone();
            let id = *id;
            scope.spawn(move || {
                service
                    .record_summary(&summary(100 * (i as u32 + 1)), Some(id), None, now)
                    .expect("Concurrent record failed");
            });
        }
    });

    for partition in RankingPartition::ALL {
        let rows = service.get_rankings(partition).expect("Query failed");
        assert_eq!(rows.len(), 8, "{}", partition);
        let ranks: Vec<i32> = rows.iter().map(|r| *r.rank()).collect();
        assert_eq!(ranks, (1..=8).collect::<Vec<_>>());
        assert_eq!(*rows[0].best_score(), 800);
    }
}
