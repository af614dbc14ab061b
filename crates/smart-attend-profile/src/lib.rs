#![warn(missing_docs)]
//! # smart-attend-profile
//!
//! ## Purpose
//! Holds the student profile collaborator and the form state the login
//! screen edits.
//!
//! ## Responsibilities
//! - Define the [`ProfileRepository`] seam (read, save, clear, subscribe).
//! - Provide [`InMemoryProfileRepository`] for the binary and tests.
//! - Keep form inputs, validate them, and normalise values before saving.
//!
//! ## Data flow
//! Login screen -> `update_*_input` -> [`ProfileViewModel::save_profile`]
//! (trim, upper-case class) -> repository -> `watch` subscribers.
//!
//! ## Error model
//! [`ProfileError`] display strings are the user-facing messages.
//!
//! ## Example
//! ```rust
//! use smart_attend_profile::{InMemoryProfileRepository, ProfileViewModel};
//!
//! let mut model = ProfileViewModel::new(InMemoryProfileRepository::new());
//! model.save_profile_with_class(" Asha ", "21BCE1234", "2s12").unwrap();
//! assert_eq!(model.profile_data().class_name, "2S12");
//! ```

use log::{debug, error, info};
use smart_attend_core::ProfileData;
use thiserror::Error;
use tokio::sync::watch;

/// Persistent store for the student profile.
pub trait ProfileRepository {
    /// Current profile (empty fields when nothing is saved).
    fn profile_data(&self) -> ProfileData;

    /// Stores a profile, replacing any previous one.
    ///
    /// # Errors
    /// Returns [`ProfileError::Storage`] when the backend fails.
    fn save_profile(
        &mut self,
        name: &str,
        roll_number: &str,
        class_name: &str,
    ) -> Result<(), ProfileError>;

    /// Removes every stored profile field.
    ///
    /// # Errors
    /// Returns [`ProfileError::Storage`] when the backend fails.
    fn clear_all_profile(&mut self) -> Result<(), ProfileError>;

    /// Receiver that observes every profile change.
    fn subscribe(&self) -> watch::Receiver<ProfileData>;
}

/// Profile store kept in process memory.
#[derive(Debug)]
pub struct InMemoryProfileRepository {
    sender: watch::Sender<ProfileData>,
    failure: Option<String>,
}

impl InMemoryProfileRepository {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::with_profile(ProfileData::default())
    }

    /// Creates a store holding `profile`.
    pub fn with_profile(profile: ProfileData) -> Self {
        let (sender, _receiver) = watch::channel(profile);
        Self {
            sender,
            failure: None,
        }
    }

    /// Creates a store whose writes fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new()
        }
    }

    fn check_writable(&self) -> Result<(), ProfileError> {
        match &self.failure {
            Some(message) => Err(ProfileError::Storage(message.clone())),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryProfileRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileRepository for InMemoryProfileRepository {
    fn profile_data(&self) -> ProfileData {
        self.sender.borrow().clone()
    }

    fn save_profile(
        &mut self,
        name: &str,
        roll_number: &str,
        class_name: &str,
    ) -> Result<(), ProfileError> {
        self.check_writable()?;
        self.sender.send_replace(ProfileData {
            name: name.to_string(),
            roll_number: roll_number.to_string(),
            class_name: class_name.to_string(),
        });
        Ok(())
    }

    fn clear_all_profile(&mut self) -> Result<(), ProfileError> {
        self.check_writable()?;
        self.sender.send_replace(ProfileData::default());
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<ProfileData> {
        self.sender.subscribe()
    }
}

/// Form state and actions around a [`ProfileRepository`].
#[derive(Debug)]
pub struct ProfileViewModel<R: ProfileRepository> {
    repository: R,
    name_input: String,
    roll_number_input: String,
    class_name_input: String,
    is_saving: bool,
}

impl<R: ProfileRepository> ProfileViewModel<R> {
    /// Creates the model with inputs pre-filled from the stored profile.
    pub fn new(repository: R) -> Self {
        let profile = repository.profile_data();
        debug!(
            "profile form initialised: {}",
            redact_profile_summary(&profile)
        );
        Self {
            repository,
            name_input: profile.name,
            roll_number_input: profile.roll_number,
            class_name_input: profile.class_name,
            is_saving: false,
        }
    }

    /// Stored profile.
    pub fn profile_data(&self) -> ProfileData {
        self.repository.profile_data()
    }

    /// Name input.
    pub fn name_input(&self) -> &str {
        &self.name_input
    }

    /// Roll-number input.
    pub fn roll_number_input(&self) -> &str {
        &self.roll_number_input
    }

    /// Class input.
    pub fn class_name_input(&self) -> &str {
        &self.class_name_input
    }

    /// `true` while a save is in progress.
    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    /// Replaces the name input.
    pub fn update_name_input(&mut self, name: impl Into<String>) {
        self.name_input = name.into();
    }

    /// Replaces the roll-number input.
    pub fn update_roll_number_input(&mut self, roll_number: impl Into<String>) {
        self.roll_number_input = roll_number.into();
    }

    /// Replaces the class input.
    pub fn update_class_name_input(&mut self, class_name: impl Into<String>) {
        self.class_name_input = class_name.into();
    }

    /// Saves the current inputs.
    ///
    /// # Errors
    /// Returns [`ProfileError::IncompleteForm`] when any input is blank and
    /// [`ProfileError::SaveFailed`] when the repository fails.
    pub fn save_profile(&mut self) -> Result<(), ProfileError> {
        let (name, roll_number, class_name) = (
            self.name_input.clone(),
            self.roll_number_input.clone(),
            self.class_name_input.clone(),
        );
        self.persist(&name, &roll_number, &class_name)
    }

    /// Saves explicit values and mirrors the normalised values into the
    /// inputs.
    ///
    /// # Errors
    /// Same as [`ProfileViewModel::save_profile`].
    pub fn save_profile_with_class(
        &mut self,
        name: &str,
        roll_number: &str,
        class_name: &str,
    ) -> Result<(), ProfileError> {
        self.persist(name, roll_number, class_name)?;
        self.name_input = name.trim().to_string();
        self.roll_number_input = roll_number.trim().to_string();
        self.class_name_input = class_name.trim().to_uppercase();
        Ok(())
    }

    fn persist(
        &mut self,
        name: &str,
        roll_number: &str,
        class_name: &str,
    ) -> Result<(), ProfileError> {
        if [name, roll_number, class_name]
            .iter()
            .any(|value| value.trim().is_empty())
        {
            return Err(ProfileError::IncompleteForm);
        }

        self.is_saving = true;
        let saved = self.repository.save_profile(
            name.trim(),
            roll_number.trim(),
            &class_name.trim().to_uppercase(),
        );
        self.is_saving = false;

        match saved {
            Ok(()) => {
                info!("profile saved");
                Ok(())
            }
            Err(error) => {
                error!("failed to save profile: {error}");
                Err(ProfileError::SaveFailed(error.to_string()))
            }
        }
    }

    /// Clears the stored profile and every input.
    ///
    /// # Errors
    /// Returns [`ProfileError::ResetFailed`] when the repository fails.
    pub fn reset_complete_profile(&mut self) -> Result<(), ProfileError> {
        debug!("starting complete profile reset");
        if let Err(error) = self.repository.clear_all_profile() {
            error!("failed to reset profile: {error}");
            return Err(ProfileError::ResetFailed(error.to_string()));
        }

        self.name_input.clear();
        self.roll_number_input.clear();
        self.class_name_input.clear();
        info!("complete profile reset successful");
        Ok(())
    }

    /// One-line description of the stored profile.
    pub fn profile_summary(&self) -> String {
        self.profile_data().summary()
    }

    /// `true` when every input is non-blank.
    pub fn is_form_valid(&self) -> bool {
        !self.name_input.trim().is_empty()
            && !self.roll_number_input.trim().is_empty()
            && !self.class_name_input.trim().is_empty()
    }

    /// `true` when the stored profile has every field.
    pub fn is_profile_saved(&self) -> bool {
        self.profile_data().is_complete()
    }

    /// Receiver that observes stored-profile changes.
    pub fn subscribe(&self) -> watch::Receiver<ProfileData> {
        self.repository.subscribe()
    }
}

fn redact_profile_summary(profile: &ProfileData) -> String {
    if profile.is_complete() {
        format!("complete profile for class {}", profile.class_name)
    } else {
        "incomplete profile".to_string()
    }
}

/// Profile store and form errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    /// At least one form field is blank.
    #[error("Please fill in all fields")]
    IncompleteForm,
    /// Backend failure.
    #[error("{0}")]
    Storage(String),
    /// Save failed in the backend.
    #[error("Failed to save profile: {0}")]
    SaveFailed(String),
    /// Clear failed in the backend.
    #[error("Failed to reset profile: {0}")]
    ResetFailed(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for the in-memory store.

    use super::*;

    #[test]
    fn subscribers_see_saved_profile() {
        let mut repository = InMemoryProfileRepository::new();
        let mut receiver = repository.subscribe();

        repository.save_profile("Asha", "21BCE1234", "2S12").unwrap();

        assert!(receiver.has_changed().unwrap());
        assert_eq!(receiver.borrow_and_update().roll_number, "21BCE1234");
    }

    #[test]
    fn failing_store_rejects_writes() {
        let mut repository = InMemoryProfileRepository::failing("disk full");
        assert_eq!(
            repository.clear_all_profile(),
            Err(ProfileError::Storage("disk full".to_string()))
        );
    }
}
