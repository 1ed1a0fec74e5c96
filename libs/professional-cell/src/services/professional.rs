use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::FieldErrors;
use shared_utils::{cpf, jwt, password};

use crate::models::{
    LoginRequest, Professional, ProfessionalError, RegisterProfessionalRequest,
};
use crate::services::validation::validate_register_request;

const TOKEN_TTL_HOURS: i64 = 24;

pub struct ProfessionalService {
    supabase: SupabaseClient,
    jwt_secret: String,
}

impl ProfessionalService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            jwt_secret: config.supabase_jwt_secret.clone(),
        }
    }

    pub async fn register(
        &self,
        request: RegisterProfessionalRequest,
    ) -> Result<(Professional, String), ProfessionalError> {
        debug!("Registering professional: {}", request.email);

        validate_register_request(&request).map_err(ProfessionalError::Validation)?;

        let normalized_cpf = cpf::normalize(&request.cpf);

        let mut errors = FieldErrors::new();
        if self.email_taken(&request.email).await? {
            errors.add("email", "The email has already been taken");
        }
        if self.cpf_taken(&normalized_cpf).await? {
            errors.add("cpf", "The CPF has already been taken");
        }
        if !errors.is_empty() {
            return Err(ProfessionalError::Validation(errors));
        }

        let password_hash = password::hash_password(&request.password)
            .map_err(|e| ProfessionalError::Database(e.to_string()))?;

        let now = Utc::now().to_rfc3339();
        let professional_data = json!({
            "full_name": request.full_name,
            "email": request.email,
            "cpf": normalized_cpf,
            "password_hash": password_hash,
            "specialty": request.specialty,
            "license_number": request.license_number,
            "phone": request.phone,
            "address": request.address,
            "created_at": now,
            "updated_at": now,
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let rows: Vec<Professional> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/professionals",
                None,
                Some(professional_data),
                Some(headers),
            )
            .await?;

        let professional = rows
            .into_iter()
            .next()
            .ok_or_else(|| ProfessionalError::Database("insert returned no row".to_string()))?;

        let token = self.issue_token(&professional)?;

        info!("Professional registered successfully: {}", professional.id);
        Ok((professional, token))
    }

    pub async fn login(
        &self,
        request: LoginRequest,
    ) -> Result<(Professional, String), ProfessionalError> {
        let professional = match self.find_by_email(&request.email).await? {
            Some(p) => p,
            None => {
                warn!("Invalid login attempt for {}", request.email);
                return Err(ProfessionalError::InvalidCredentials);
            }
        };

        let valid = password::verify_password(&request.password, &professional.password_hash)
            .map_err(|e| ProfessionalError::Database(e.to_string()))?;

        if !valid {
            warn!("Invalid login attempt for {}", request.email);
            return Err(ProfessionalError::InvalidCredentials);
        }

        let token = self.issue_token(&professional)?;

        info!("Professional logged in: {}", professional.id);
        Ok((professional, token))
    }

    pub async fn list(&self) -> Result<Vec<Professional>, ProfessionalError> {
        let rows: Vec<Professional> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/professionals?order=full_name.asc",
                None,
                None,
            )
            .await?;

        Ok(rows)
    }

    /// Case-insensitive exact-name lookup; an `ilike` pattern without
    /// wildcards matches the whole value ignoring case.
    pub async fn find_by_name(
        &self,
        name: &str,
        auth_token: &str,
    ) -> Result<Option<Professional>, ProfessionalError> {
        let path = format!(
            "/rest/v1/professionals?full_name=ilike.{}&limit=1",
            urlencoding::encode(name),
        );

        let rows: Vec<Professional> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(rows.into_iter().next())
    }

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Professional>, ProfessionalError> {
        let path = format!(
            "/rest/v1/professionals?email=eq.{}&limit=1",
            urlencoding::encode(email),
        );

        let rows: Vec<Professional> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await?;

        Ok(rows.into_iter().next())
    }

    async fn email_taken(&self, email: &str) -> Result<bool, ProfessionalError> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn cpf_taken(&self, normalized_cpf: &str) -> Result<bool, ProfessionalError> {
        let path = format!(
            "/rest/v1/professionals?cpf=eq.{}&limit=1",
            urlencoding::encode(normalized_cpf),
        );

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await?;

        Ok(!rows.is_empty())
    }

    fn issue_token(&self, professional: &Professional) -> Result<String, ProfessionalError> {
        jwt::issue_token(
            &professional.id.to_string(),
            &professional.email,
            "professional",
            &self.jwt_secret,
            TOKEN_TTL_HOURS,
        )
        .map_err(ProfessionalError::Token)
    }
}
