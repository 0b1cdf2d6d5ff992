//! User use-case service.
//!
//! # Responsibility
//! - Resolve profiles, addresses and users by id, failing with `NotFound`.
//! - Log the related entities reached from a lookup.
//! - Remove a user's first address transactionally.

use super::{require_positive_id, ServiceError, ServiceResult};
use crate::model::user::{
    Address, AddressId, NewAddress, NewUser, Profile, ProfileId, ProfileWithUser, User,
    UserDetails, UserId,
};
use crate::repo::user_repo::UserRepository;
use crate::repo::EntityKind;
use log::info;

/// Use-case service wrapper for the user aggregate.
pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn register_user(&self, user: &NewUser) -> ServiceResult<User> {
        let created = self.repo.create_user(user)?;
        info!(
            "event=user_create module=user_service status=ok id={}",
            created.id
        );
        Ok(created)
    }

    pub fn save_profile(&self, profile: &Profile) -> ServiceResult<()> {
        require_positive_id(EntityKind::Profile, profile.id)?;
        self.repo.save_profile(profile)?;
        Ok(())
    }

    pub fn add_address(&self, address: &NewAddress) -> ServiceResult<Address> {
        require_positive_id(EntityKind::User, address.user_id)?;
        Ok(self.repo.add_address(address)?)
    }

    pub fn set_user_tags(&self, user_id: UserId, tags: &[String]) -> ServiceResult<()> {
        let user_id = require_positive_id(EntityKind::User, user_id)?;
        self.repo.set_user_tags(user_id, tags)?;
        Ok(())
    }

    /// Loads a profile with its owning user and logs the user's email.
    ///
    /// # Errors
    /// - `InvalidArgument` for a non-positive id.
    /// - `NotFound` when no profile has `profile_id`.
    pub fn show_related_entities(&self, profile_id: ProfileId) -> ServiceResult<ProfileWithUser> {
        let profile_id = require_positive_id(EntityKind::Profile, profile_id)?;
        let found = self
            .repo
            .get_profile_with_user(profile_id)?
            .ok_or(ServiceError::NotFound {
                entity: EntityKind::Profile,
                id: profile_id,
            })?;
        info!(
            "event=show_related_entities module=user_service status=ok profile_id={} user_id={} user_email={}",
            found.profile.id, found.user.id, found.user.email
        );
        Ok(found)
    }

    /// Gets one address by id.
    pub fn fetch_address(&self, address_id: AddressId) -> ServiceResult<Address> {
        let address_id = require_positive_id(EntityKind::Address, address_id)?;
        let address = self
            .repo
            .get_address(address_id)?
            .ok_or(ServiceError::NotFound {
                entity: EntityKind::Address,
                id: address_id,
            })?;
        info!(
            "event=fetch_address module=user_service status=ok id={} user_id={} city={:?}",
            address.id, address.user_id, address.city
        );
        Ok(address)
    }

    /// Deletes the user's lowest-id address and returns it.
    ///
    /// Returns `Ok(None)` when the user exists but has no addresses.
    pub fn delete_related(&self, user_id: UserId) -> ServiceResult<Option<Address>> {
        let user_id = require_positive_id(EntityKind::User, user_id)?;
        let removed = self.repo.remove_first_address(user_id)?;
        match &removed {
            Some(address) => info!(
                "event=delete_related module=user_service status=ok user_id={} address_id={}",
                user_id, address.id
            ),
            None => info!(
                "event=delete_related module=user_service status=noop user_id={} reason=no_addresses",
                user_id
            ),
        }
        Ok(removed)
    }

    /// Lists every user with addresses and tags.
    pub fn fetch_users(&self) -> ServiceResult<Vec<UserDetails>> {
        let users = self.repo.list_users_with_details()?;
        for details in &users {
            info!(
                "event=user_loaded module=user_service id={} tags={}",
                details.user.id,
                details.tags.join("|")
            );
            for address in &details.addresses {
                info!(
                    "event=address_loaded module=user_service id={} user_id={}",
                    address.id, address.user_id
                );
            }
        }
        info!(
            "event=fetch_users module=user_service status=ok count={}",
            users.len()
        );
        Ok(users)
    }
}
