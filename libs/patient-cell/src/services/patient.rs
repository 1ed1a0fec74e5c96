use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::FieldErrors;
use shared_utils::{cpf, jwt, password};

use crate::models::{LoginRequest, Patient, PatientError, RegisterPatientRequest};
use crate::services::validation::validate_register_request;

const TOKEN_TTL_HOURS: i64 = 24;

pub struct PatientService {
    supabase: SupabaseClient,
    jwt_secret: String,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            jwt_secret: config.supabase_jwt_secret.clone(),
        }
    }

    pub async fn register(
        &self,
        request: RegisterPatientRequest,
    ) -> Result<(Patient, String), PatientError> {
        debug!("Registering patient: {}", request.email);

        let birth_date =
            validate_register_request(&request).map_err(PatientError::Validation)?;

        let normalized_cpf = cpf::normalize(&request.cpf);

        let mut errors = FieldErrors::new();
        if self.email_taken(&request.email).await? {
            errors.add("email", "The email has already been taken");
        }
        if self.cpf_taken(&normalized_cpf).await? {
            errors.add("cpf", "The CPF has already been taken");
        }
        if !errors.is_empty() {
            return Err(PatientError::Validation(errors));
        }

        let password_hash = password::hash_password(&request.password)
            .map_err(|e| PatientError::Database(e.to_string()))?;

        let now = Utc::now().to_rfc3339();
        let patient_data = json!({
            "full_name": request.full_name,
            "email": request.email,
            "cpf": normalized_cpf,
            "password_hash": password_hash,
            "phone": request.phone,
            "address": request.address,
            "birth_date": birth_date.format("%Y-%m-%d").to_string(),
            "sex": request.sex,
            "marital_status": request.marital_status,
            "occupation": request.occupation,
            "created_at": now,
            "updated_at": now,
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let rows: Vec<Patient> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/patients",
                None,
                Some(patient_data),
                Some(headers),
            )
            .await?;

        let patient = rows
            .into_iter()
            .next()
            .ok_or_else(|| PatientError::Database("insert returned no row".to_string()))?;

        let token = self.issue_token(&patient)?;

        info!("Patient registered successfully: {}", patient.id);
        Ok((patient, token))
    }

    pub async fn login(&self, request: LoginRequest) -> Result<(Patient, String), PatientError> {
        let patient = match self.find_by_email(&request.email).await? {
            Some(p) => p,
            None => {
                warn!("Invalid login attempt for {}", request.email);
                return Err(PatientError::InvalidCredentials);
            }
        };

        let valid = password::verify_password(&request.password, &patient.password_hash)
            .map_err(|e| PatientError::Database(e.to_string()))?;

        if !valid {
            warn!("Invalid login attempt for {}", request.email);
            return Err(PatientError::InvalidCredentials);
        }

        let token = self.issue_token(&patient)?;

        info!("Patient logged in: {}", patient.id);
        Ok((patient, token))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Patient>, PatientError> {
        let path = format!(
            "/rest/v1/patients?email=eq.{}&limit=1",
            urlencoding::encode(email),
        );

        let rows: Vec<Patient> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await?;

        Ok(rows.into_iter().next())
    }

    async fn email_taken(&self, email: &str) -> Result<bool, PatientError> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn cpf_taken(&self, normalized_cpf: &str) -> Result<bool, PatientError> {
        let path = format!(
            "/rest/v1/patients?cpf=eq.{}&limit=1",
            urlencoding::encode(normalized_cpf),
        );

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await?;

        Ok(!rows.is_empty())
    }

    fn issue_token(&self, patient: &Patient) -> Result<String, PatientError> {
        jwt::issue_token(
            &patient.id.to_string(),
            &patient.email,
            "patient",
            &self.jwt_secret,
            TOKEN_TTL_HOURS,
        )
        .map_err(PatientError::Token)
    }
}
