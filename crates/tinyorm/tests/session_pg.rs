//! End-to-end session and transaction tests against a live PostgreSQL.
//!
//! Skipped unless `DATABASE_URL` is set (a `.env` file is honored).

use std::sync::atomic::{AtomicUsize, Ordering};
use tinyorm::{Engine, FromRow, HookContext, Hooks, Model, OrmError, OrmResult, kv, params};

async fn try_engine() -> Option<Engine> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").ok()?;
    let engine = Engine::connect("postgres", &database_url)
        .await
        .expect("Failed to connect to DATABASE_URL with NoTls");
    Some(engine)
}

#[derive(Debug, Default, Clone, PartialEq, FromRow, Model)]
#[orm(table = "tinyorm_it_users")]
struct User {
    #[orm(tag = "PRIMARY KEY")]
    name: String,
    age: i32,
}

#[derive(Debug, Default, Clone, PartialEq, FromRow, Model)]
#[orm(table = "tinyorm_it_accounts")]
struct Account {
    #[orm(tag = "PRIMARY KEY")]
    id: i64,
    balance: i64,
}

#[derive(Debug, Default, Clone, PartialEq, FromRow, Model)]
#[orm(table = "tinyorm_it_notes")]
struct Note {
    #[orm(tag = "PRIMARY KEY")]
    id: i64,
    body: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, FromRow, Model)]
#[orm(table = "tinyorm_it_ledger")]
struct Ledger {
    #[orm(tag = "PRIMARY KEY")]
    id: i64,
    amount: i64,
}

static MASKED: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Default, FromRow, Model)]
#[orm(table = "tinyorm_it_secrets", hooks)]
struct Secret {
    #[orm(tag = "PRIMARY KEY")]
    id: i64,
    token: String,
}

impl Hooks for Secret {
    fn after_query(&mut self, _ctx: &HookContext<'_>) -> OrmResult<()> {
        MASKED.fetch_add(1, Ordering::SeqCst);
        self.token = "******".to_string();
        Ok(())
    }
}

#[tokio::test]
async fn insert_find_count_delete() {
    let Some(engine) = try_engine().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let mut s = engine.new_session();
    s.model::<User>().drop_table().await.unwrap();
    s.create_table().await.unwrap();
    assert!(s.has_table().await.unwrap());

    let tom = User {
        name: "Tom".to_string(),
        age: 18,
    };
    let affected = s.insert(&mut [tom.clone()]).await.unwrap();
    assert_eq!(affected, 1);

    let mut all: Vec<User> = Vec::new();
    s.find(&mut all).await.unwrap();
    assert_eq!(all, vec![tom.clone()]);

    let mut adults: Vec<User> = Vec::new();
    s.filter("age >= ?", params![18_i32]).find(&mut adults).await.unwrap();
    assert_eq!(adults, vec![tom.clone()]);

    assert_eq!(s.model::<User>().count().await.unwrap(), 1);
    s.model::<User>().delete().await.unwrap();
    assert_eq!(s.model::<User>().count().await.unwrap(), 0);

    s.drop_table().await.unwrap();
    assert!(!s.has_table().await.unwrap());
}

#[tokio::test]
async fn update_first_and_ordering() {
    let Some(engine) = try_engine().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let mut s = engine.new_session();
    s.model::<Account>().drop_table().await.unwrap();
    s.create_table().await.unwrap();

    let mut accounts = [
        Account { id: 1, balance: 10 },
        Account { id: 2, balance: 20 },
        Account { id: 3, balance: 30 },
    ];
    assert_eq!(s.insert(&mut accounts).await.unwrap(), 3);

    let affected = s
        .model::<Account>()
        .filter("id >= ?", params![2_i64])
        .update(kv!["balance", 0_i64])
        .await
        .unwrap();
    assert_eq!(affected, 2);

    let mut richest = Account::default();
    s.order_by("balance DESC").first(&mut richest).await.unwrap();
    assert_eq!(richest, Account { id: 1, balance: 10 });

    let mut none = Account::default();
    let err = s
        .filter("id = ?", params![42_i64])
        .first(&mut none)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let mut ordered: Vec<Account> = Vec::new();
    s.order_by("id DESC").limit(2).find(&mut ordered).await.unwrap();
    assert_eq!(
        ordered.iter().map(|a| a.id).collect::<Vec<_>>(),
        vec![3, 2]
    );

    s.model::<Account>().drop_table().await.unwrap();
}

#[tokio::test]
async fn nullable_columns_and_hooks() {
    let Some(engine) = try_engine().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let mut s = engine.new_session();

    s.model::<Note>().drop_table().await.unwrap();
    s.create_table().await.unwrap();
    let mut notes = [
        Note { id: 1, body: None },
        Note {
            id: 2,
            body: Some("hi".to_string()),
        },
    ];
    s.insert(&mut notes).await.unwrap();
    let mut found: Vec<Note> = Vec::new();
    s.order_by("id").find(&mut found).await.unwrap();
    assert_eq!(found, notes.to_vec());
    s.drop_table().await.unwrap();

    s.model::<Secret>().drop_table().await.unwrap();
    s.create_table().await.unwrap();
    s.insert(&mut [Secret {
        id: 1,
        token: "abc".to_string(),
    }])
    .await
    .unwrap();
    let mut secrets: Vec<Secret> = Vec::new();
    s.find(&mut secrets).await.unwrap();
    assert_eq!(secrets[0].token, "******");
    assert!(MASKED.load(Ordering::SeqCst) >= 1);
    s.drop_table().await.unwrap();
}

#[tokio::test]
async fn transaction_commit_rollback_and_panic() {
    let Some(mut engine) = try_engine().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    {
        let mut s = engine.new_session();
        s.model::<Ledger>().drop_table().await.unwrap();
        s.create_table().await.unwrap();
    }

    let inserted = engine
        .transaction(async |s| {
            s.insert(&mut [Ledger { id: 1, amount: 100 }]).await?;
            s.model::<Ledger>().count().await
        })
        .await
        .unwrap();
    assert_eq!(inserted, 1);

    let err = engine
        .transaction::<(), _>(async |s| {
            s.insert(&mut [Ledger { id: 2, amount: 5 }]).await?;
            Err(OrmError::validation("abort"))
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));

    let panicked = futures_util::FutureExt::catch_unwind(std::panic::AssertUnwindSafe(
        engine.transaction::<(), _>(async |s| {
            s.insert(&mut [Ledger { id: 3, amount: 5 }]).await?;
            panic!("boom");
        }),
    ))
    .await;
    assert!(panicked.is_err());

    let mut s = engine.new_session();
    let mut rows: Vec<Ledger> = Vec::new();
    s.order_by("id").find(&mut rows).await.unwrap();
    assert_eq!(rows, vec![Ledger { id: 1, amount: 100 }]);

    s.model::<Ledger>().drop_table().await.unwrap();
    drop(s);
    engine.close().await;
}
