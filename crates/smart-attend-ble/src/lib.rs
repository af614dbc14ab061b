#![warn(missing_docs)]
//! # smart-attend-ble
//!
//! ## Purpose
//! Classroom presence detection through BLE beacons, behind a repository
//! seam the attendance flow observes.
//!
//! ## Responsibilities
//! - Define [`BleRepository`] and its observable state streams.
//! - Provide [`SyntheticBleRepository`], a deterministic backend driven by
//!   simulated advertisements.
//! - Wrap the repository in [`BleViewModel`], which logs failures instead of
//!   surfacing them and stops scanning when dropped.
//!
//! ## Data flow
//! Advertisement -> repository (room filter) -> `watch` channels
//! (`ble_state`, `device_found`, `detected_device_room`,
//! `detected_subject_code`) -> screens.
//!
//! ## Error model
//! Repository operations return [`BleError`]; the view model logs them.
//!
//! ## Example
//! ```rust
//! use smart_attend_ble::{BleRepository, SyntheticBleRepository};
//!
//! let mut ble = SyntheticBleRepository::new();
//! ble.initialize_ble().unwrap();
//! ble.start_scanning_for_room("AB").unwrap();
//! ble.advertise("AB1203", "CS301");
//! assert!(ble.is_detected_room_matching("ab"));
//! ```

use log::{debug, error, info};
use thiserror::Error;
use tokio::sync::watch;

/// Scanner lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BleState {
    /// Adapter not initialised.
    Idle,
    /// Initialised, not scanning.
    Ready,
    /// Scanning for the target room.
    Scanning,
    /// A matching beacon was seen.
    DeviceFound,
    /// Adapter unavailable.
    Unavailable,
}

/// Presence-detection backend.
pub trait BleRepository {
    /// Prepares the adapter.
    ///
    /// # Errors
    /// Returns [`BleError::AdapterUnavailable`] when there is no adapter.
    fn initialize_ble(&mut self) -> Result<(), BleError>;

    /// Starts scanning for beacons of `room_name`.
    ///
    /// # Errors
    /// Returns [`BleError::NotInitialized`] before initialisation and
    /// [`BleError::EmptyRoomName`] for a blank room.
    fn start_scanning_for_room(&mut self, room_name: &str) -> Result<(), BleError>;

    /// Stops scanning; detection results are kept.
    ///
    /// # Errors
    /// Returns [`BleError::NotInitialized`] before initialisation.
    fn stop_scanning(&mut self) -> Result<(), BleError>;

    /// Forgets the detected beacon.
    ///
    /// # Errors
    /// Returns [`BleError::NotInitialized`] before initialisation.
    fn reset_device_found(&mut self) -> Result<(), BleError>;

    /// Forgets the detected beacon and keeps scanning for the same room.
    ///
    /// # Errors
    /// Returns [`BleError::NoTargetRoom`] when no scan was ever started.
    fn reset_and_continue_scanning(&mut self) -> Result<(), BleError>;

    /// Subject code broadcast by the detected beacon.
    fn get_detected_subject_code(&self) -> Option<String>;

    /// Detected device name with the trailing digits removed.
    fn get_detected_room_name(&self) -> Option<String>;

    /// `true` when the detected room equals `target_room`, ignoring case.
    fn is_detected_room_matching(&self, target_room: &str) -> bool;

    /// Scanner state stream.
    fn ble_state(&self) -> watch::Receiver<BleState>;

    /// Device-found flag stream.
    fn device_found(&self) -> watch::Receiver<bool>;

    /// Full detected device name stream.
    fn detected_device_room(&self) -> watch::Receiver<Option<String>>;

    /// Detected subject code stream.
    fn detected_subject_code(&self) -> watch::Receiver<Option<String>>;
}

/// Room name carried by a beacon device name: the name without its
/// trailing digits (`AB1203` -> `AB`).
pub fn room_name_from_device(device_name: &str) -> String {
    device_name
        .trim()
        .trim_end_matches(|character: char| character.is_ascii_digit())
        .to_string()
}

/// Deterministic in-process backend.
#[derive(Debug)]
pub struct SyntheticBleRepository {
    adapter_available: bool,
    target_room: Option<String>,
    state: watch::Sender<BleState>,
    found: watch::Sender<bool>,
    device_room: watch::Sender<Option<String>>,
    subject_code: watch::Sender<Option<String>>,
}

impl SyntheticBleRepository {
    /// Creates a backend with a working adapter.
    pub fn new() -> Self {
        Self {
            adapter_available: true,
            target_room: None,
            state: watch::Sender::new(BleState::Idle),
            found: watch::Sender::new(false),
            device_room: watch::Sender::new(None),
            subject_code: watch::Sender::new(None),
        }
    }

    /// Creates a backend whose adapter is missing.
    pub fn without_adapter() -> Self {
        Self {
            adapter_available: false,
            ..Self::new()
        }
    }

    /// Simulates an advertisement. Returns `true` when it was accepted as the
    /// detected beacon.
    pub fn advertise(&mut self, device_name: &str, subject_code: &str) -> bool {
        if *self.state.borrow() != BleState::Scanning {
            debug!("ignoring advertisement from {device_name}: not scanning");
            return false;
        }

        let room = room_name_from_device(device_name);
        let matches = self
            .target_room
            .as_deref()
            .is_some_and(|target| rooms_equal(target, &room));
        if !matches {
            debug!("ignoring advertisement from {device_name}: room {room} not targeted");
            return false;
        }

        info!("beacon {device_name} detected for subject {subject_code}");
        self.device_room.send_replace(Some(device_name.trim().to_string()));
        self.subject_code.send_replace(Some(subject_code.trim().to_string()));
        self.found.send_replace(true);
        self.state.send_replace(BleState::DeviceFound);
        true
    }

    fn require_initialized(&self) -> Result<(), BleError> {
        match *self.state.borrow() {
            BleState::Idle => Err(BleError::NotInitialized),
            BleState::Unavailable => Err(BleError::AdapterUnavailable),
            _ => Ok(()),
        }
    }

    fn clear_detection(&mut self) {
        self.found.send_replace(false);
        self.device_room.send_replace(None);
        self.subject_code.send_replace(None);
    }
}

impl Default for SyntheticBleRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn rooms_equal(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

impl BleRepository for SyntheticBleRepository {
    fn initialize_ble(&mut self) -> Result<(), BleError> {
        if !self.adapter_available {
            self.state.send_replace(BleState::Unavailable);
            return Err(BleError::AdapterUnavailable);
        }
        if *self.state.borrow() == BleState::Idle {
            self.state.send_replace(BleState::Ready);
        }
        Ok(())
    }

    fn start_scanning_for_room(&mut self, room_name: &str) -> Result<(), BleError> {
        self.require_initialized()?;
        if room_name.trim().is_empty() {
            return Err(BleError::EmptyRoomName);
        }

        self.target_room = Some(room_name.trim().to_string());
        self.clear_detection();
        self.state.send_replace(BleState::Scanning);
        Ok(())
    }

    fn stop_scanning(&mut self) -> Result<(), BleError> {
        self.require_initialized()?;
        if *self.state.borrow() == BleState::Scanning {
            self.state.send_replace(BleState::Ready);
        }
        Ok(())
    }

    fn reset_device_found(&mut self) -> Result<(), BleError> {
        self.require_initialized()?;
        self.clear_detection();
        if *self.state.borrow() == BleState::DeviceFound {
            self.state.send_replace(BleState::Ready);
        }
        Ok(())
    }

    fn reset_and_continue_scanning(&mut self) -> Result<(), BleError> {
        self.require_initialized()?;
        if self.target_room.is_none() {
            return Err(BleError::NoTargetRoom);
        }
        self.clear_detection();
        self.state.send_replace(BleState::Scanning);
        Ok(())
    }

    fn get_detected_subject_code(&self) -> Option<String> {
        self.subject_code.borrow().clone()
    }

    fn get_detected_room_name(&self) -> Option<String> {
        self.device_room
            .borrow()
            .as_deref()
            .map(room_name_from_device)
    }

    fn is_detected_room_matching(&self, target_room: &str) -> bool {
        self.get_detected_room_name()
            .is_some_and(|room| rooms_equal(&room, target_room))
    }

    fn ble_state(&self) -> watch::Receiver<BleState> {
        self.state.subscribe()
    }

    fn device_found(&self) -> watch::Receiver<bool> {
        self.found.subscribe()
    }

    fn detected_device_room(&self) -> watch::Receiver<Option<String>> {
        self.device_room.subscribe()
    }

    fn detected_subject_code(&self) -> watch::Receiver<Option<String>> {
        self.subject_code.subscribe()
    }
}

/// Screen-facing wrapper around a [`BleRepository`].
///
/// Initialises the repository on construction and stops scanning on drop.
/// Operation failures are logged, never returned.
#[derive(Debug)]
pub struct BleViewModel<R: BleRepository> {
    repository: R,
}

impl<R: BleRepository> BleViewModel<R> {
    /// Wraps `repository` and initialises it.
    pub fn new(mut repository: R) -> Self {
        match repository.initialize_ble() {
            Ok(()) => debug!("ble view model initialised"),
            Err(error) => error!("failed to initialise ble: {error}"),
        }
        Self { repository }
    }

    /// Starts scanning for `room_name`.
    pub fn start_scanning_for_room(&mut self, room_name: &str) {
        debug!("starting scan for room {room_name}");
        if let Err(error) = self.repository.start_scanning_for_room(room_name) {
            error!("failed to start scanning for room {room_name}: {error}");
        }
    }

    /// Stops scanning.
    pub fn stop_scanning(&mut self) {
        match self.repository.stop_scanning() {
            Ok(()) => debug!("ble scanning stopped"),
            Err(error) => error!("failed to stop scanning: {error}"),
        }
    }

    /// Forgets the detected beacon.
    pub fn reset_device_found(&mut self) {
        match self.repository.reset_device_found() {
            Ok(()) => debug!("device detection reset"),
            Err(error) => error!("failed to reset device detection: {error}"),
        }
    }

    /// Forgets the detected beacon and keeps scanning.
    pub fn reset_and_continue_scanning(&mut self) {
        match self.repository.reset_and_continue_scanning() {
            Ok(()) => debug!("reset and continued scanning"),
            Err(error) => error!("failed to reset and continue scanning: {error}"),
        }
    }

    /// Full detected device name.
    pub fn get_detected_device_room(&self) -> Option<String> {
        self.repository.detected_device_room().borrow().clone()
    }

    /// Detected subject code.
    pub fn get_detected_subject_code(&self) -> Option<String> {
        self.repository.get_detected_subject_code()
    }

    /// Detected room name without the device suffix.
    pub fn get_detected_room_name(&self) -> Option<String> {
        self.repository.get_detected_room_name()
    }

    /// `true` when the detected room equals `target_room`.
    pub fn is_detected_room_matching(&self, target_room: &str) -> bool {
        self.repository.is_detected_room_matching(target_room)
    }

    /// Scanner state stream.
    pub fn ble_state(&self) -> watch::Receiver<BleState> {
        self.repository.ble_state()
    }

    /// Device-found flag stream.
    pub fn device_found(&self) -> watch::Receiver<bool> {
        self.repository.device_found()
    }

    /// Detected device name stream.
    pub fn detected_device_room(&self) -> watch::Receiver<Option<String>> {
        self.repository.detected_device_room()
    }

    /// Detected subject code stream.
    pub fn detected_subject_code(&self) -> watch::Receiver<Option<String>> {
        self.repository.detected_subject_code()
    }

    /// Borrow of the repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Mutable borrow of the repository.
    pub fn repository_mut(&mut self) -> &mut R {
        &mut self.repository
    }
}

impl<R: BleRepository> Drop for BleViewModel<R> {
    fn drop(&mut self) {
        match self.repository.stop_scanning() {
            Ok(()) => debug!("ble scanning stopped on teardown"),
            Err(error) => error!("failed to stop scanning on teardown: {error}"),
        }
    }
}

/// BLE repository errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BleError {
    /// Operation needs `initialize_ble` first.
    #[error("ble not initialized")]
    NotInitialized,
    /// No adapter on this device.
    #[error("bluetooth adapter unavailable")]
    AdapterUnavailable,
    /// Room name is blank.
    #[error("room name must be non-empty")]
    EmptyRoomName,
    /// No scan target to continue with.
    #[error("no room targeted; start scanning first")]
    NoTargetRoom,
}
