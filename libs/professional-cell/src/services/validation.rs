use shared_models::FieldErrors;
use shared_utils::{cpf, validation::is_valid_email};

use crate::models::RegisterProfessionalRequest;

/// Field checks for professional registration. Everything runs; the caller
/// gets the full set of violations in one response.
pub fn validate_register_request(request: &RegisterProfessionalRequest) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if request.full_name.trim().is_empty() {
        errors.add("full_name", "The full name is required");
    } else if request.full_name.len() > 255 {
        errors.add("full_name", "The full name may not be greater than 255 characters");
    }

    if !is_valid_email(&request.email) {
        errors.add("email", "The email must be a valid email address");
    }

    if !cpf::is_valid(&request.cpf) {
        errors.add("cpf", "The CPF is not a valid document number");
    }

    if request.password.len() < 8 {
        errors.add("password", "The password must be at least 8 characters");
    }

    if request.specialty.trim().is_empty() {
        errors.add("specialty", "The specialty is required");
    }

    if request.license_number.trim().is_empty() {
        errors.add("license_number", "The license number is required");
    }

    if request.phone.trim().is_empty() {
        errors.add("phone", "The phone is required");
    }

    if request.address.trim().is_empty() {
        errors.add("address", "The address is required");
    }

    errors.into_result(())
}
