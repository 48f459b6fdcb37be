use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, DbErr, Set};
use serde_json::json;

use results_server::entity::user;
use results_server::models::result::{NewResult, ResultRecord};
use results_server::models::user::{NewUser, Role};
use results_server::repository::{
    DbResultRepository, DbUserRepository, ResultRepository, UserRepository,
};

use crate::common::{TestApp, fresh_database, routes};

fn new_user(email: &str, role: Role) -> NewUser {
    NewUser {
        email: email.to_string(),
        password_hash: "hash".to_string(),
        role,
    }
}

fn new_result(user_id: i32, value: f64) -> NewResult {
    NewResult {
        value,
        time: NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap(),
        user_id,
    }
}

mod users {
    use super::*;

    #[tokio::test]
    async fn users_are_found_by_email_id_and_id_list() {
        let db = fresh_database().await;
        let users = DbUserRepository::new(db);

        let alice = users.insert(new_user("alice@x.com", Role::User)).await.unwrap();
        let admin = users.insert(new_user("admin@x.com", Role::Admin)).await.unwrap();

        let by_email = users.find_by_email("admin@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, admin.id);
        assert_eq!(by_email.role, Role::Admin);
        assert!(users.find_by_email("ghost@x.com").await.unwrap().is_none());

        let by_id = users.find_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "alice@x.com");
        assert_eq!(by_id.password_hash, "hash");

        let mut listed = users
            .find_by_ids(&[alice.id, admin.id, 9999])
            .await
            .unwrap();
        listed.sort_by_key(|u| u.id);
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, alice.id.min(admin.id));
        assert!(users.find_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let db = fresh_database().await;
        let users = DbUserRepository::new(db);

        users.insert(new_user("alice@x.com", Role::User)).await.unwrap();
        assert!(users.insert(new_user("alice@x.com", Role::Admin)).await.is_err());
    }

    #[tokio::test]
    async fn unknown_stored_role_is_a_type_error() {
        let db = fresh_database().await;
        let row = user::ActiveModel {
            email: Set("root@x.com".to_string()),
            password: Set("hash".to_string()),
            role: Set("ROLE_ROOT".to_string()),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let users = DbUserRepository::new(db);
        let err = users.find_by_id(row.id).await.unwrap_err();
        assert!(matches!(err, DbErr::Type(_)), "{err:?}");
    }
}

mod results {
    use super::*;

    #[tokio::test]
    async fn results_are_listed_by_owner_in_id_order() {
        let db = fresh_database().await;
        let users = DbUserRepository::new(db.clone());
        let results = DbResultRepository::new(db);

        let alice = users.insert(new_user("alice@x.com", Role::User)).await.unwrap();
        let bob = users.insert(new_user("bob@x.com", Role::User)).await.unwrap();
        let first = results.insert(new_result(alice.id, 1.0)).await.unwrap();
        results.insert(new_result(bob.id, 2.0)).await.unwrap();
        let third = results.insert(new_result(alice.id, 3.5)).await.unwrap();

        let owned = results.find_by_owner(alice.id).await.unwrap();
        assert_eq!(
            owned.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![first.id, third.id]
        );
        assert_eq!(owned[1].value, 3.5);
        assert_eq!(owned[1].time, new_result(alice.id, 0.0).time);

        let all = results.find_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn update_rewrites_every_field_of_the_row() {
        let db = fresh_database().await;
        let users = DbUserRepository::new(db.clone());
        let results = DbResultRepository::new(db);

        let alice = users.insert(new_user("alice@x.com", Role::User)).await.unwrap();
        let bob = users.insert(new_user("bob@x.com", Role::User)).await.unwrap();
        let created = results.insert(new_result(alice.id, 1.0)).await.unwrap();

        let moved_time = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        let updated = results
            .update(ResultRecord {
                id: created.id,
                value: 42.0,
                time: moved_time,
                user_id: bob.id,
            })
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);

        let stored = results.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(stored.value, 42.0);
        assert_eq!(stored.time, moved_time);
        assert_eq!(stored.user_id, bob.id);
        assert!(results.find_by_owner(alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_reports_whether_a_row_was_deleted() {
        let db = fresh_database().await;
        let users = DbUserRepository::new(db.clone());
        let results = DbResultRepository::new(db);

        let alice = users.insert(new_user("alice@x.com", Role::User)).await.unwrap();
        let created = results.insert(new_result(alice.id, 1.0)).await.unwrap();

        assert!(results.remove(created.id).await.unwrap());
        assert!(!results.remove(created.id).await.unwrap());
        assert!(results.find_by_id(created.id).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn crud_flow_runs_against_postgres() {
    let app = TestApp::spawn_with_database().await;

    let id = app.create_result(&app.user.token, 1.5, None).await;
    app.create_result(&app.other.token, 2.0, None).await;

    let listed = app.get_with_token(routes::RESULTS, &app.user.token).await;
    assert_eq!(listed.status, 200, "{}", listed.text);
    assert_eq!(listed.body["results"].as_array().unwrap().len(), 1);

    let etag = app
        .get_with_token(&routes::result(id), &app.user.token)
        .await
        .etag();
    let updated = app
        .put_with_token(
            &routes::result(id),
            &json!({"result": 9, "time": "2024-06-01 08:30:00"}),
            &app.user.token,
            Some(&etag),
        )
        .await;
    assert_eq!(updated.status, 209, "{}", updated.text);
    assert_eq!(updated.body["result"]["result"], 9.0);

    let forbidden = app.delete_with_token(&routes::result(id), &app.other.token).await;
    assert_eq!(forbidden.status, 403);

    let deleted = app.delete_with_token(&routes::result(id), &app.admin.token).await;
    assert_eq!(deleted.status, 204);
    let gone = app.get_with_token(&routes::result(id), &app.admin.token).await;
    assert_eq!(gone.status, 404);
}
