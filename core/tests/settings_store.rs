//! Everything the console persists goes through one SQLite key/value table.

use chrono::NaiveDate;
use tuition_core::{
    auth::{AuthProvider, StoredAuth},
    mailer::SendQuota,
    reminder::{ReminderSettings, REMINDERS_KEY},
    store::SettingsStore,
    term::{TermSettings, TERMS_KEY},
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
}

fn temp_db() -> String {
    let dir = std::env::temp_dir().join(format!("tuition-store-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir.join("console.db").to_string_lossy().into_owned()
}

#[test]
fn settings_survive_reopening_the_database() {
    let path = temp_db();
    {
        let store = SettingsStore::open(&path).expect("open");
        store.migrate().expect("migrate");

        let mut terms = TermSettings::load(&store).unwrap();
        terms.add();
        terms.save(&store).unwrap();

        let mut reminders = ReminderSettings::load(&store, today()).unwrap();
        reminders.add().unwrap();
        reminders.save(&store).unwrap();

        SendQuota::new(500, 321, today()).save(&store).unwrap();
        StoredAuth::new(&store).login().unwrap();
    }

    let store = SettingsStore::open(&path).expect("reopen");
    store.migrate().expect("migrations are idempotent");

    assert_eq!(TermSettings::load(&store).unwrap().terms().len(), 4);
    assert_eq!(ReminderSettings::load(&store, today()).unwrap().reminders.len(), 4);
    let quota = SendQuota::load(&store, SendQuota::new(500, 0, today()), today()).unwrap();
    assert_eq!(quota.count, 321);
    assert!(StoredAuth::new(&store).is_authenticated().unwrap());

    let mut keys = store.keys().unwrap();
    keys.sort();
    assert!(keys.contains(&TERMS_KEY.to_string()));
    assert!(keys.contains(&REMINDERS_KEY.to_string()));
}

#[test]
fn logout_clears_the_flag() {
    let store = SettingsStore::in_memory().unwrap();
    store.migrate().unwrap();
    let mut auth = StoredAuth::new(&store);
    assert!(!auth.is_authenticated().unwrap());
    auth.login().unwrap();
    auth.logout().unwrap();
    assert!(!auth.is_authenticated().unwrap());
}

#[test]
fn corrupt_json_is_a_serialization_error() {
    let store = SettingsStore::in_memory().unwrap();
    store.migrate().unwrap();
    store.put_setting(TERMS_KEY, "{not json").unwrap();
    assert!(matches!(
        TermSettings::load(&store),
        Err(tuition_core::ConsoleError::Serialization(_))
    ));
}
