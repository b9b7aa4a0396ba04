//! Console user accounts and their management operations.
//!
//! Unlike the record listings, the directory supports deletion.

use crate::{
    error::{ConsoleError, ConsoleResult},
    query::{
        filter::{filter_records, text_matches, unknown_filter},
        sort_records, Choice, Criteria, SortKey, SortSpec,
    },
    record::{Record, RecordSet},
    types::{string_enum, RecordId, Timestamp},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

string_enum! {
    pub enum Role {
        Admin => "admin",
        Manager => "manager",
        Staff => "staff",
        Viewer => "viewer",
    }
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::Manager => "Manager",
            Self::Staff => "Staff",
            Self::Viewer => "Viewer",
        }
    }
}

string_enum! {
    pub enum UserStatus {
        Active => "active",
        Inactive => "inactive",
    }
}

string_enum! {
    pub enum UserField {
        FirstName => "firstName",
        LastName => "lastName",
        Email => "email",
        Role => "role",
        CreatedAt => "createdAt",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub username: String,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: Timestamp,
    pub last_login: Option<Timestamp>,
}

impl UserAccount {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Record for UserAccount {
    type Field = UserField;

    fn id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self, field: UserField) -> SortKey<'_> {
        match field {
            UserField::FirstName => SortKey::Text(&self.first_name),
            UserField::LastName => SortKey::Text(&self.last_name),
            UserField::Email => SortKey::Text(&self.email),
            UserField::Role => SortKey::Text(self.role.as_str()),
            UserField::CreatedAt => SortKey::Timestamp(self.created_at),
        }
    }
}

/// Editable fields of an account. The password never leaves the form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub role: Role,
    pub status: UserStatus,
}

impl UserForm {
    fn validate(&self) -> ConsoleResult<()> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(ConsoleError::Validation(
                "First name and last name are required".to_string(),
            ));
        }
        if !self.email.contains('@') {
            return Err(ConsoleError::Validation(format!(
                "Invalid email address '{}'",
                self.email
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserCriteria {
    pub search: String,
    pub role: Choice<Role>,
    pub status: Choice<UserStatus>,
}

impl Criteria<UserAccount> for UserCriteria {
    fn matches(&self, u: &UserAccount) -> bool {
        text_matches(
            &self.search,
            &[u.first_name.as_str(), u.last_name.as_str(), u.email.as_str()],
        ) && self.role.admits(&u.role)
            && self.status.admits(&u.status)
    }

    fn set(&mut self, key: &str, value: &str) -> ConsoleResult<()> {
        match key {
            "search" => self.search = value.trim().to_string(),
            "role" => self.role = Choice::parse(value)?,
            "status" => self.status = Choice::parse(value)?,
            other => return Err(unknown_filter(other)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub total_users: usize,
    pub active_users: usize,
    pub admins: usize,
    pub managers: usize,
    pub staff: usize,
}

pub struct UserDirectory {
    users: RecordSet<UserAccount>,
}

impl UserDirectory {
    pub fn new(users: RecordSet<UserAccount>) -> Self {
        Self { users }
    }

    pub fn with_defaults() -> ConsoleResult<Self> {
        Ok(Self::new(RecordSet::from_records(default_users())?))
    }

    pub fn users(&self) -> &RecordSet<UserAccount> {
        &self.users
    }

    pub fn get(&self, id: &str) -> Option<&UserAccount> {
        self.users.get(id)
    }

    pub fn query(&self, criteria: &UserCriteria, sort: &SortSpec<UserField>) -> Vec<UserAccount> {
        sort_records(&filter_records(self.users.as_slice(), criteria), sort)
    }

    pub fn create(&mut self, form: &UserForm, now: Timestamp) -> ConsoleResult<String> {
        form.validate()?;
        let user = UserAccount {
            id: self.users.next_sequence_id(),
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
            email: form.email.trim().to_string(),
            phone: form.phone.clone(),
            username: form.username.clone(),
            role: form.role,
            status: form.status,
            created_at: now,
            last_login: None,
        };
        let message = format!("User {} created successfully", user.full_name());
        log::info!("Created user {} ({})", user.id, user.role);
        self.users.push(user)?;
        Ok(message)
    }

    pub fn update(&mut self, id: &str, form: &UserForm) -> ConsoleResult<String> {
        form.validate()?;
        let current = self
            .users
            .get(id)
            .ok_or_else(|| ConsoleError::RecordNotFound { id: id.to_string() })?;
        let updated = UserAccount {
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
            email: form.email.trim().to_string(),
            phone: form.phone.clone(),
            username: form.username.clone(),
            role: form.role,
            status: form.status,
            ..current.clone()
        };
        if !form.password.is_empty() {
            log::debug!("Password change requested for {}", updated.username);
        }
        let message = format!("User {} updated successfully", updated.full_name());
        self.users.replace(updated)?;
        Ok(message)
    }

    pub fn delete(&mut self, id: &str) -> ConsoleResult<String> {
        let removed = self.users.remove(id)?;
        log::info!("Deleted user {id}");
        Ok(format!("User {} deleted successfully", removed.full_name()))
    }

    pub fn summary(&self) -> UserSummary {
        let count = |pred: fn(&UserAccount) -> bool| self.users.iter().filter(|u| pred(u)).count();
        UserSummary {
            total_users: self.users.len(),
            active_users: count(|u| u.status == UserStatus::Active),
            admins: count(|u| u.role == Role::Admin),
            managers: count(|u| u.role == Role::Manager),
            staff: count(|u| u.role == Role::Staff),
        }
    }
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> Option<Timestamp> {
    NaiveDate::from_ymd_opt(y, m, d)?.and_hms_opt(h, min, 0)
}

/// The five seeded console accounts.
pub fn default_users() -> Vec<UserAccount> {
    type Seed<'a> = (&'a str, &'a str, &'a str, &'a str, Role, UserStatus, (i32, u32, u32), (i32, u32, u32, u32, u32));
    let seed: [Seed<'_>; 5] = [
        ("John", "Smith", "john.smith", "+66 81 234 5678", Role::Admin, UserStatus::Active, (2024, 1, 15), (2025, 10, 14, 9, 30)),
        ("Sarah", "Johnson", "sarah.johnson", "+66 82 345 6789", Role::Manager, UserStatus::Active, (2024, 2, 20), (2025, 10, 13, 14, 20)),
        ("Michael", "Chen", "michael.chen", "+66 83 456 7890", Role::Staff, UserStatus::Active, (2024, 3, 10), (2025, 10, 14, 8, 15)),
        ("Emily", "Davis", "emily.davis", "+66 84 567 8901", Role::Staff, UserStatus::Active, (2024, 4, 5), (2025, 10, 12, 16, 45)),
        ("David", "Wilson", "david.wilson", "+66 85 678 9012", Role::Viewer, UserStatus::Inactive, (2024, 5, 12), (2025, 9, 20, 10, 30)),
    ];
    seed.iter()
        .enumerate()
        .filter_map(|(i, (first, last, username, phone, role, status, created, login))| {
            Some(UserAccount {
                id: (i + 1).to_string(),
                first_name: first.to_string(),
                last_name: last.to_string(),
                email: format!("{username}@rugby.ac.th"),
                phone: phone.to_string(),
                username: username.to_string(),
                role: *role,
                status: *status,
                created_at: at(created.0, created.1, created.2, 0, 0)?,
                last_login: at(login.0, login.1, login.2, login.3, login.4),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortDirection;

    fn form(first: &str, email: &str) -> UserForm {
        UserForm {
            first_name: first.to_string(),
            last_name: "Tester".to_string(),
            email: email.to_string(),
            phone: String::new(),
            username: "tester".to_string(),
            password: String::new(),
            role: Role::Staff,
            status: UserStatus::Active,
        }
    }

    fn now() -> Timestamp {
        at(2025, 10, 15, 12, 0).unwrap()
    }

    #[test]
    fn defaults_and_summary() {
        let dir = UserDirectory::with_defaults().unwrap();
        assert_eq!(dir.users().len(), 5);
        assert_eq!(
            dir.summary(),
            UserSummary {
                total_users: 5,
                active_users: 4,
                admins: 1,
                managers: 1,
                staff: 2,
            }
        );
        assert_eq!(dir.get("1").unwrap().email, "john.smith@rugby.ac.th");
        assert_eq!(Role::Admin.label(), "Administrator");
    }

    #[test]
    fn create_update_delete() {
        let mut dir = UserDirectory::with_defaults().unwrap();
        let msg = dir.create(&form("Ann", "ann@rugby.ac.th"), now()).unwrap();
        assert_eq!(msg, "User Ann Tester created successfully");
        assert_eq!(dir.get("6").unwrap().created_at, now());

        let msg = dir.update("6", &form("Anna", "anna@rugby.ac.th")).unwrap();
        assert_eq!(msg, "User Anna Tester updated successfully");
        assert_eq!(dir.get("6").unwrap().created_at, now());

        dir.delete("3").unwrap();
        assert!(dir.get("3").is_none());
        // ids never collide after a delete
        dir.create(&form("Bo", "bo@rugby.ac.th"), now()).unwrap();
        assert!(dir.get("7").is_some());
    }

    #[test]
    fn validation_and_missing_ids() {
        let mut dir = UserDirectory::with_defaults().unwrap();
        assert!(matches!(
            dir.create(&form("", "x@y"), now()),
            Err(ConsoleError::Validation(_))
        ));
        assert!(matches!(
            dir.create(&form("Ann", "no-at-sign"), now()),
            Err(ConsoleError::Validation(_))
        ));
        assert!(matches!(
            dir.update("99", &form("Ann", "a@b")),
            Err(ConsoleError::RecordNotFound { .. })
        ));
        assert!(matches!(dir.delete("99"), Err(ConsoleError::RecordNotFound { .. })));
        assert_eq!(dir.users().len(), 5);
    }

    #[test]
    fn query_filters_and_sorts() {
        let dir = UserDirectory::with_defaults().unwrap();
        let mut c = UserCriteria::default();
        c.set("role", "staff").unwrap();
        let staff = dir.query(&c, &SortSpec::by(UserField::FirstName, SortDirection::Desc));
        let names: Vec<&str> = staff.iter().map(|u| u.first_name.as_str()).collect();
        assert_eq!(names, vec!["Michael", "Emily"]);

        let mut c = UserCriteria::default();
        c.set("search", "WILSON").unwrap();
        c.set("status", "inactive").unwrap();
        assert_eq!(dir.query(&c, &SortSpec::unsorted()).len(), 1);
        assert!(c.set("team", "x").is_err());
    }
}
