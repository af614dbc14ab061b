//! Integration tests for profile form validation and persistence.

use smart_attend_core::ProfileData;
use smart_attend_profile::{
    InMemoryProfileRepository, ProfileError, ProfileRepository, ProfileViewModel,
};

fn saved_profile() -> ProfileData {
    ProfileData {
        name: "Asha Rao".to_string(),
        roll_number: "21BCE1234".to_string(),
        class_name: "2S12".to_string(),
    }
}

#[test]
fn profile_form_tests_inputs_start_from_stored_profile() {
    let model = ProfileViewModel::new(InMemoryProfileRepository::with_profile(saved_profile()));

    assert_eq!(model.name_input(), "Asha Rao");
    assert_eq!(model.roll_number_input(), "21BCE1234");
    assert_eq!(model.class_name_input(), "2S12");
    assert!(model.is_form_valid());
    assert!(model.is_profile_saved());
}

#[test]
fn profile_form_tests_blank_field_is_rejected() {
    let mut model = ProfileViewModel::new(InMemoryProfileRepository::new());
    model.update_name_input("Asha");
    model.update_roll_number_input("   ");
    model.update_class_name_input("2s12");

    let error = model.save_profile().unwrap_err();
    assert_eq!(error, ProfileError::IncompleteForm);
    assert_eq!(error.to_string(), "Please fill in all fields");
    assert!(!model.is_profile_saved());
}

#[test]
fn profile_form_tests_save_trims_and_uppercases_class() {
    let mut model = ProfileViewModel::new(InMemoryProfileRepository::new());
    model.update_name_input("  Asha Rao ");
    model.update_roll_number_input(" 21BCE1234");
    model.update_class_name_input("2s12 ");

    model.save_profile().expect("save should succeed");

    assert_eq!(model.profile_data(), saved_profile());
    assert!(!model.is_saving());
    assert_eq!(
        model.profile_summary(),
        "Profile: name='Asha Rao', rollNumber='21BCE1234', className='2S12'"
    );
}

#[test]
fn profile_form_tests_save_with_class_updates_inputs() {
    let mut model = ProfileViewModel::new(InMemoryProfileRepository::new());

    model
        .save_profile_with_class(" Asha Rao ", "21BCE1234 ", " 2s12")
        .expect("save should succeed");

    assert_eq!(model.class_name_input(), "2S12");
    assert_eq!(model.name_input(), "Asha Rao");
    assert_eq!(model.profile_data(), saved_profile());
}

#[test]
fn profile_form_tests_storage_failure_is_reported() {
    let mut model = ProfileViewModel::new(InMemoryProfileRepository::failing("disk full"));

    let error = model
        .save_profile_with_class("Asha", "21BCE1234", "2S12")
        .unwrap_err();

    assert_eq!(error.to_string(), "Failed to save profile: disk full");
    assert!(model.name_input().is_empty());
}

#[test]
fn profile_form_tests_reset_clears_store_and_inputs() {
    let repository = InMemoryProfileRepository::with_profile(saved_profile());
    let mut receiver = repository.subscribe();
    let mut model = ProfileViewModel::new(repository);

    model.reset_complete_profile().expect("reset should succeed");

    assert!(!model.is_form_valid());
    assert!(!model.is_profile_saved());
    assert!(receiver.has_changed().expect("sender alive"));
    assert_eq!(*receiver.borrow_and_update(), ProfileData::default());
}
