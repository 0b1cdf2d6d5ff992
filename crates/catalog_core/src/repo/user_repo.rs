//! User/profile/address/tag repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist users and their one-to-one profile and one-to-many addresses.
//! - Own user tag replacement with atomic semantics.
//! - Load users together with their addresses and tags.
//!
//! # Invariants
//! - A profile shares the id of its owning user.
//! - `set_user_tags` and `remove_first_address` run in a single transaction.
//! - Tag names are normalized to lowercase before persistence.

use super::{ensure_schema, EntityKind, RepoError, RepoResult};
use crate::model::user::{
    normalize_tag, Address, AddressId, NewAddress, NewUser, Profile, ProfileId, ProfileWithUser,
    User, UserDetails, UserId,
};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::{BTreeMap, BTreeSet};

const ADDRESS_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    street,
    city,
    state,
    zip
FROM addresses";

const USER_SCHEMA: &[(&str, &[&str])] = &[
    ("users", &["id", "name", "email", "password"]),
    ("profiles", &["id", "bio", "phone_number", "date_of_birth"]),
    ("addresses", &["id", "user_id", "street", "city", "state", "zip"]),
    ("tags", &["id", "name"]),
    ("user_tags", &["user_id", "tag_id"]),
];

/// Repository interface for the user aggregate.
pub trait UserRepository {
    fn create_user(&self, user: &NewUser) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Inserts or replaces the profile owned by user `profile.id`.
    fn save_profile(&self, profile: &Profile) -> RepoResult<()>;
    fn get_profile_with_user(&self, id: ProfileId) -> RepoResult<Option<ProfileWithUser>>;
    fn add_address(&self, address: &NewAddress) -> RepoResult<Address>;
    fn get_address(&self, id: AddressId) -> RepoResult<Option<Address>>;
    /// Addresses of one user sorted by id.
    fn list_addresses(&self, user_id: UserId) -> RepoResult<Vec<Address>>;
    fn delete_address(&self, id: AddressId) -> RepoResult<()>;
    /// Replaces the full tag set of a user.
    fn set_user_tags(&self, user_id: UserId, tags: &[String]) -> RepoResult<()>;
    /// All users sorted by id with addresses and tags loaded.
    fn list_users_with_details(&self) -> RepoResult<Vec<UserDetails>>;
    /// Deletes the lowest-id address of a user and returns it.
    ///
    /// Returns `Ok(None)` when the user has no addresses and `NotFound` when
    /// the user does not exist.
    fn remove_first_address(&self, user_id: UserId) -> RepoResult<Option<Address>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(conn, USER_SCHEMA)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &NewUser) -> RepoResult<User> {
        user.validate()?;
        let email = user.email.trim();

        self.conn.execute(
            "INSERT INTO users (name, email, password) VALUES (?1, ?2, ?3);",
            params![user.name.as_str(), email, user.password.as_str()],
        )?;

        Ok(User {
            id: self.conn.last_insert_rowid(),
            name: user.name.clone(),
            email: email.to_string(),
            password: user.password.clone(),
        })
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        load_user(self.conn, id)
    }

    fn save_profile(&self, profile: &Profile) -> RepoResult<()> {
        if load_user(self.conn, profile.id)?.is_none() {
            return Err(RepoError::NotFound {
                entity: EntityKind::User,
                id: profile.id,
            });
        }

        self.conn.execute(
            "INSERT INTO profiles (id, bio, phone_number, date_of_birth)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                bio = excluded.bio,
                phone_number = excluded.phone_number,
                date_of_birth = excluded.date_of_birth;",
            params![
                profile.id,
                profile.bio.as_deref(),
                profile.phone_number.as_deref(),
                profile.date_of_birth.as_deref(),
            ],
        )?;
        Ok(())
    }

    fn get_profile_with_user(&self, id: ProfileId) -> RepoResult<Option<ProfileWithUser>> {
        let found = self
            .conn
            .query_row(
                "SELECT
                    p.id,
                    p.bio,
                    p.phone_number,
                    p.date_of_birth,
                    u.name,
                    u.email,
                    u.password
                 FROM profiles p
                 INNER JOIN users u ON u.id = p.id
                 WHERE p.id = ?1;",
                [id],
                |row| {
                    let profile = Profile {
                        id: row.get("id")?,
                        bio: row.get("bio")?,
                        phone_number: row.get("phone_number")?,
                        date_of_birth: row.get("date_of_birth")?,
                    };
                    let user = User {
                        id: profile.id,
                        name: row.get("name")?,
                        email: row.get("email")?,
                        password: row.get("password")?,
                    };
                    Ok(ProfileWithUser { profile, user })
                },
            )
            .optional()?;
        Ok(found)
    }

    fn add_address(&self, address: &NewAddress) -> RepoResult<Address> {
        address.validate()?;
        if load_user(self.conn, address.user_id)?.is_none() {
            return Err(RepoError::NotFound {
                entity: EntityKind::User,
                id: address.user_id,
            });
        }

        self.conn.execute(
            "INSERT INTO addresses (user_id, street, city, state, zip)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                address.user_id,
                address.street.as_str(),
                address.city.as_str(),
                address.state.as_str(),
                address.zip.as_str(),
            ],
        )?;

        Ok(Address {
            id: self.conn.last_insert_rowid(),
            user_id: address.user_id,
            street: address.street.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            zip: address.zip.clone(),
        })
    }

    fn get_address(&self, id: AddressId) -> RepoResult<Option<Address>> {
        let address = self
            .conn
            .query_row(
                &format!("{ADDRESS_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_address_row,
            )
            .optional()?;
        Ok(address)
    }

    fn list_addresses(&self, user_id: UserId) -> RepoResult<Vec<Address>> {
        load_addresses(self.conn, user_id)
    }

    fn delete_address(&self, id: AddressId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM addresses WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Address,
                id,
            });
        }
        Ok(())
    }

    fn set_user_tags(&self, user_id: UserId, tags: &[String]) -> RepoResult<()> {
        let normalized: BTreeSet<String> = tags.iter().filter_map(|tag| normalize_tag(tag)).collect();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if load_user(&tx, user_id)?.is_none() {
            return Err(RepoError::NotFound {
                entity: EntityKind::User,
                id: user_id,
            });
        }

        tx.execute("DELETE FROM user_tags WHERE user_id = ?1;", [user_id])?;
        for tag in &normalized {
            tx.execute(
                "INSERT OR IGNORE INTO tags (name) VALUES (?1);",
                [tag.as_str()],
            )?;
            tx.execute(
                "INSERT INTO user_tags (user_id, tag_id)
                 SELECT ?1, id
                 FROM tags
                 WHERE name = ?2 COLLATE NOCASE;",
                params![user_id, tag.as_str()],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn list_users_with_details(&self) -> RepoResult<Vec<UserDetails>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, email, password FROM users ORDER BY id ASC;")?;
        let users = stmt
            .query_map([], parse_user_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut addresses = BTreeMap::<UserId, Vec<Address>>::new();
        let mut stmt = self
            .conn
            .prepare(&format!("{ADDRESS_SELECT_SQL} ORDER BY user_id ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let address = parse_address_row(row)?;
            addresses.entry(address.user_id).or_default().push(address);
        }

        let mut tags = BTreeMap::<UserId, Vec<String>>::new();
        let mut stmt = self.conn.prepare(
            "SELECT ut.user_id, t.name
             FROM user_tags ut
             INNER JOIN tags t ON t.id = ut.tag_id
             ORDER BY ut.user_id ASC, t.name COLLATE NOCASE ASC;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let user_id: UserId = row.get(0)?;
            let name: String = row.get(1)?;
            tags.entry(user_id).or_default().push(name.to_lowercase());
        }

        Ok(users
            .into_iter()
            .map(|user| UserDetails {
                addresses: addresses.remove(&user.id).unwrap_or_default(),
                tags: tags.remove(&user.id).unwrap_or_default(),
                user,
            })
            .collect())
    }

    fn remove_first_address(&self, user_id: UserId) -> RepoResult<Option<Address>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if load_user(&tx, user_id)?.is_none() {
            return Err(RepoError::NotFound {
                entity: EntityKind::User,
                id: user_id,
            });
        }

        let Some(first) = load_addresses(&tx, user_id)?.into_iter().next() else {
            return Ok(None);
        };
        tx.execute("DELETE FROM addresses WHERE id = ?1;", [first.id])?;
        tx.commit()?;
        Ok(Some(first))
    }
}

fn load_user(conn: &Connection, id: UserId) -> RepoResult<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, name, email, password FROM users WHERE id = ?1;",
            [id],
            parse_user_row,
        )
        .optional()?;
    Ok(user)
}

fn load_addresses(conn: &Connection, user_id: UserId) -> RepoResult<Vec<Address>> {
    let mut stmt = conn.prepare(&format!(
        "{ADDRESS_SELECT_SQL} WHERE user_id = ?1 ORDER BY id ASC;"
    ))?;
    let addresses = stmt
        .query_map([user_id], parse_address_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(addresses)
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        password: row.get("password")?,
    })
}

fn parse_address_row(row: &Row<'_>) -> rusqlite::Result<Address> {
    Ok(Address {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        street: row.get("street")?,
        city: row.get("city")?,
        state: row.get("state")?,
        zip: row.get("zip")?,
    })
}
