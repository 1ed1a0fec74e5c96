use chrono::{NaiveDate, Utc};

use shared_models::FieldErrors;
use shared_utils::{cpf, validation::is_valid_email};

use crate::models::RegisterPatientRequest;

/// Field checks for patient registration, reported together. A birth date
/// that fails to parse skips the future-date check for that field.
pub fn validate_register_request(
    request: &RegisterPatientRequest,
) -> Result<NaiveDate, FieldErrors> {
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

    if request.phone.trim().is_empty() {
        errors.add("phone", "The phone is required");
    }

    if request.address.trim().is_empty() {
        errors.add("address", "The address is required");
    }

    let birth_date = match NaiveDate::parse_from_str(&request.birth_date, "%Y-%m-%d") {
        Ok(date) => {
            if date > Utc::now().date_naive() {
                errors.add("birth_date", "The birth date may not be in the future");
            }
            Some(date)
        }
        Err(_) => {
            errors.add("birth_date", "The birth date must be a valid date in YYYY-MM-DD format");
            None
        }
    };

    if request.sex.trim().is_empty() {
        errors.add("sex", "The sex is required");
    }

    if request.marital_status.trim().is_empty() {
        errors.add("marital_status", "The marital status is required");
    }

    if request.occupation.trim().is_empty() {
        errors.add("occupation", "The occupation is required");
    }

    match (birth_date, errors.is_empty()) {
        (Some(date), true) => Ok(date),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> RegisterPatientRequest {
        RegisterPatientRequest {
            full_name: "Maria Oliveira".to_string(),
            email: "maria@exemplo.com".to_string(),
            cpf: "123.456.789-09".to_string(),
            password: "senha-segura".to_string(),
            phone: "11999999999".to_string(),
            address: "Rua Teste, 123".to_string(),
            birth_date: "1990-01-01".to_string(),
            sex: "F".to_string(),
            marital_status: "single".to_string(),
            occupation: "Analyst".to_string(),
        }
    }

    #[test]
    fn accepts_complete_request() {
        let date = validate_register_request(&valid_request()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(1990, 1, 1).unwrap());
    }

    #[test]
    fn rejects_checksum_invalid_cpf() {
        let mut request = valid_request();
        request.cpf = "111.111.111-11".to_string();

        let errors = validate_register_request(&request).unwrap_err();
        assert!(errors.contains("cpf"));
    }

    #[test]
    fn accepts_bare_digit_cpf() {
        let mut request = valid_request();
        request.cpf = "12345678909".to_string();

        assert!(validate_register_request(&request).is_ok());
    }

    #[test]
    fn rejects_future_birth_date() {
        let mut request = valid_request();
        request.birth_date = (Utc::now().date_naive() + chrono::Duration::days(30))
            .format("%Y-%m-%d")
            .to_string();

        let errors = validate_register_request(&request).unwrap_err();
        assert!(errors
            .messages("birth_date")
            .iter()
            .any(|m| m.contains("future")));
    }

    #[test]
    fn malformed_birth_date_reports_format_only() {
        let mut request = valid_request();
        request.birth_date = "01/01/1990".to_string();

        let errors = validate_register_request(&request).unwrap_err();
        assert_eq!(errors.messages("birth_date").len(), 1);
        assert!(errors.messages("birth_date")[0].contains("YYYY-MM-DD"));
    }

    #[test]
    fn rejects_short_password() {
        let mut request = valid_request();
        request.password = "1234567".to_string();

        let errors = validate_register_request(&request).unwrap_err();
        assert!(errors.contains("password"));
    }
}
