//! Listing catalog and store identities
//!
//! In-memory owner of everything the bot reads or changes outside of a
//! conversation: accounts, listings, the ban and host lists, the active
//! account and the current sync target. Persistence is the caller's job.

use crate::config::{GUEST_NICKNAME, RESERVED_NICKNAMES, SYSTEM_AUTHOR};
use crate::db::{seed_accounts, seed_apps, AppRecord, UserAccount};
use crate::telegram::ChatId;

/// Everything loaded from storage at startup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    pub accounts: Vec<UserAccount>,
    pub apps: Vec<AppRecord>,
    pub banned: Vec<String>,
    pub hosts: Vec<String>,
    pub current_user: Option<String>,
    pub operator_chat: Option<ChatId>,
}

/// Outcome of removing an account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRemoval {
    /// The account existed and was removed
    pub found: bool,
    /// The name was not on the ban list before
    pub newly_banned: bool,
    /// The removed account was signed in and is now a guest
    pub demoted_active: bool,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    accounts: Vec<UserAccount>,
    apps: Vec<AppRecord>,
    banned: Vec<String>,
    hosts: Vec<String>,
    active_user: String,
    synced: Option<String>,
}

impl Catalog {
    /// Build the catalog from stored data.
    ///
    /// Seeds default listings when none are stored, puts repeatedly
    /// published listings first, and merges seed accounts with stored ones
    /// (stored wins on a case-insensitive nickname clash).
    pub fn load(snapshot: CatalogSnapshot) -> Self {
        let apps = if snapshot.apps.is_empty() {
            seed_apps()
        } else {
            let (mut repeated, normal): (Vec<_>, Vec<_>) = snapshot
                .apps
                .into_iter()
                .partition(|app| app.repeatedly_published);
            repeated.extend(normal);
            repeated
        };

        let mut accounts: Vec<UserAccount> = Vec::new();
        for account in seed_accounts().into_iter().chain(snapshot.accounts) {
            match accounts
                .iter_mut()
                .find(|a| a.nickname.eq_ignore_ascii_case(&account.nickname))
            {
                Some(existing) => *existing = account,
                None => accounts.push(account),
            }
        }
        if !accounts
            .iter()
            .any(|a| a.nickname.eq_ignore_ascii_case(SYSTEM_AUTHOR))
        {
            accounts.push(UserAccount::new(
                SYSTEM_AUTHOR,
                format!("{}@granxy.com", SYSTEM_AUTHOR.to_lowercase()),
                "system_password",
            ));
        }

        Self {
            accounts,
            apps,
            banned: snapshot.banned,
            hosts: snapshot.hosts,
            active_user: snapshot
                .current_user
                .unwrap_or_else(|| GUEST_NICKNAME.to_string()),
            synced: None,
        }
    }

    pub fn accounts(&self) -> &[UserAccount] {
        &self.accounts
    }

    pub fn apps(&self) -> &[AppRecord] {
        &self.apps
    }

    pub fn banned(&self) -> &[String] {
        &self.banned
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn active_user(&self) -> &str {
        &self.active_user
    }

    pub fn is_guest(&self) -> bool {
        self.active_user == GUEST_NICKNAME
    }

    /// Listings carrying both a file and an icon
    pub fn publishable(&self) -> impl Iterator<Item = &AppRecord> {
        self.apps.iter().filter(|app| app.is_published())
    }

    /// Accounts shown to the operator (seed and system accounts hidden)
    pub fn visible_users(&self) -> Vec<&UserAccount> {
        self.accounts
            .iter()
            .filter(|a| !is_reserved(&a.nickname))
            .collect()
    }

    /// Names of listings authored by `nickname`, in catalog order
    pub fn authored_by(&self, nickname: &str) -> Vec<&str> {
        self.apps
            .iter()
            .filter(|app| app.author.eq_ignore_ascii_case(nickname))
            .map(|app| app.name.as_str())
            .collect()
    }

    pub fn commit(&mut self, record: AppRecord) {
        self.apps.push(record);
    }

    /// Remove every listing whose name matches case-insensitively
    pub fn delete_app(&mut self, name: &str) -> bool {
        let before = self.apps.len();
        self.apps.retain(|app| !app.name.eq_ignore_ascii_case(name));
        let deleted = self.apps.len() < before;

        if deleted
            && self
                .synced
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case(name))
        {
            self.synced = None;
        }
        deleted
    }

    /// Remove an account and ban its nickname.
    ///
    /// The nickname is banned even when no account matched; the ban list
    /// never holds the same name twice.
    pub fn delete_and_ban_user(&mut self, nickname: &str) -> UserRemoval {
        let before = self.accounts.len();
        self.accounts
            .retain(|a| !a.nickname.eq_ignore_ascii_case(nickname));
        let found = self.accounts.len() < before;

        let newly_banned = !self.banned.iter().any(|b| b == nickname);
        if newly_banned {
            self.banned.push(nickname.to_string());
        }

        let demoted_active = self.active_user.eq_ignore_ascii_case(nickname);
        if demoted_active {
            self.active_user = GUEST_NICKNAME.to_string();
        }

        UserRemoval {
            found,
            newly_banned,
            demoted_active,
        }
    }

    /// Make the listing named exactly `name` the featured one
    pub fn start_sync(&mut self, name: &str) -> bool {
        if self.apps.iter().any(|app| app.name == name) {
            self.synced = Some(name.to_string());
            true
        } else {
            false
        }
    }

    pub fn stop_sync(&mut self) {
        self.synced = None;
    }

    pub fn synced(&self) -> Option<&AppRecord> {
        let name = self.synced.as_deref()?;
        self.apps.iter().find(|app| app.name == name)
    }

    /// Register a host account; returns whether it was new
    pub fn add_host(&mut self, nickname: &str) -> bool {
        if self.hosts.iter().any(|h| h.eq_ignore_ascii_case(nickname)) {
            false
        } else {
            self.hosts.push(nickname.to_string());
            true
        }
    }

    /// Listing shown in the "Newly Uploaded" slot.
    ///
    /// The sync target wins; otherwise the latest repeatedly published
    /// listing with an icon, otherwise the latest listing with an icon.
    pub fn featured(&self) -> Option<&AppRecord> {
        if let Some(app) = self.synced() {
            return Some(app);
        }
        let with_icon = || self.apps.iter().filter(|app| app.icon_id.is_some());
        with_icon()
            .filter(|app| app.repeatedly_published)
            .last()
            .or_else(|| with_icon().last())
    }
}

fn is_reserved(nickname: &str) -> bool {
    RESERVED_NICKNAMES
        .iter()
        .any(|r| nickname.eq_ignore_ascii_case(r))
}
