#![allow(dead_code)]

use std::env;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, TimeZone, Utc};
use mockall::mock;
use sqlx::PgPool;
use uuid::Uuid;

use timesheet_backend::{
    config::{Config, LogFormat},
    database::pool::{create_pool, run_migrations},
    dto::auth_dto::RegisterPayload,
    models::user::{Actor, Role, User},
    utils::time::{Clock, SharedClock},
    AppState,
};

mock! {
    pub TestClock {}

    impl Clock for TestClock {
        fn now(&self) -> DateTime<Utc>;
    }
}

/// Hand-advanced time shared between a test and the services under test.
#[derive(Clone)]
pub struct ManualTime(Arc<Mutex<DateTime<Utc>>>);

impl ManualTime {
    pub fn set(&self, at: DateTime<Utc>) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = *guard + by;
    }

    pub fn get(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct TestContext {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub time: ManualTime,
    pub state: AppState,
}

/// Monday 2024-03-11 09:00 UTC.
pub fn monday_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 11, 9, 0, 0).unwrap()
}

fn test_config(database_url: String) -> Config {
    Config {
        server_address: "127.0.0.1:0".into(),
        database_url,
        database_max_connections: 5,
        jwt_secret: "test_secret_key".into(),
        jwt_ttl_hours: 1,
        api_rps: 1000,
        media_dir: env::temp_dir()
            .join("timesheet-media")
            .to_string_lossy()
            .into_owned(),
        log_format: LogFormat::Pretty,
    }
}

/// `None` when no database is configured; callers return early.
pub async fn setup() -> Option<TestContext> {
    dotenvy::dotenv().ok();
    let Ok(database_url) = env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping database test");
        return None;
    };

    let config = Arc::new(test_config(database_url));
    let pool = create_pool(&config).await.expect("pool");
    run_migrations(&pool).await.expect("migrations");

    let time = ManualTime(Arc::new(Mutex::new(monday_morning())));
    let mut clock = MockTestClock::new();
    let source = time.clone();
    clock.expect_now().returning(move || source.get());
    let clock: SharedClock = Arc::new(clock);

    let state = AppState::with_clock(pool.clone(), config.clone(), clock);
    Some(TestContext {
        pool,
        config,
        time,
        state,
    })
}

impl TestContext {
    pub async fn user(&self, role: Role) -> User {
        let suffix = Uuid::new_v4().simple().to_string();
        self.state
            .user_service
            .register(RegisterPayload {
                username: format!("{}_{}", role, &suffix[..12]),
                email: format!("{}@example.com", suffix),
                password: "correct horse battery".into(),
                role,
            })
            .await
            .expect("register user")
    }

    pub async fn actor(&self, role: Role) -> Actor {
        Actor::from(&self.user(role).await)
    }
}
