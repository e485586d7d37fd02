//! Controller de cuentas de usuario
//!
//! Registro, login y administración de cuentas. Un usuario nuevo queda
//! sin aprobar hasta que un admin lo apruebe; el login de no-admins
//! sin aprobar se rechaza con un mensaje de "pendiente".

use bcrypt::{hash, verify, DEFAULT_COST};
use sqlx::PgPool;
use uuid::Uuid;
use validator::ValidationError;

use crate::config::environment::EnvironmentConfig;
use crate::dto::ApiResponse;
use crate::middleware::auth::{generate_jwt_token, AuthenticatedUser};
use crate::models::user::{
    LoginRequest, LoginResponse, RegisterRequest, UpdateUserRequest, User, UserResponse,
};
use crate::repositories::user_repository::UserRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::utils::errors::{validation_error, AppError};

pub struct UserController {
    repository: UserRepository,
    vehicles: VehicleRepository,
    config: EnvironmentConfig,
}

impl UserController {
    pub fn new(pool: PgPool, config: EnvironmentConfig) -> Self {
        Self {
            repository: UserRepository::new(pool.clone()),
            vehicles: VehicleRepository::new(pool),
            config,
        }
    }

    /// Registrar una cuenta nueva (sin aprobar, sin rol de admin)
    pub async fn register(
        &self,
        request: RegisterRequest,
    ) -> Result<ApiResponse<UserResponse>, AppError> {
        use validator::Validate;
        request.validate()?;

        if request.password != request.password_confirm {
            let mut error = ValidationError::new("password_mismatch");
            error.add_param("field".into(), &"password_confirm");
            return Err(validation_error("password_confirm", error));
        }

        if self.repository.username_exists(&request.username).await? {
            return Err(AppError::Conflict(
                "El nombre de usuario ya está registrado".to_string(),
            ));
        }

        if self.repository.email_exists(&request.email).await? {
            return Err(AppError::Conflict("El email ya está registrado".to_string()));
        }

        let password_hash = hash(&request.password, DEFAULT_COST)
            .map_err(|e| AppError::Hash(format!("Error hashing password: {}", e)))?;

        let user = self
            .repository
            .create(&request.username, &request.email, &password_hash, false, false)
            .await?;

        tracing::info!("👤 Usuario registrado (pendiente de aprobación): {}", user.username);

        Ok(ApiResponse::success_with_message(
            user.into(),
            "Cuenta creada; queda pendiente de aprobación por un administrador".to_string(),
        ))
    }

    /// Login con username y password
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        use validator::Validate;
        request.validate()?;

        let user = self
            .repository
            .find_by_username(&request.username)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Credenciales inválidas".to_string()))?;

        let valid = verify(&request.password, &user.password_hash)
            .map_err(|e| AppError::Hash(format!("Error verifying password: {}", e)))?;

        if !valid {
            return Err(AppError::Unauthorized("Credenciales inválidas".to_string()));
        }

        if !user.is_active {
            return Err(AppError::Unauthorized("Usuario inactivo".to_string()));
        }

        if !user.is_admin && !user.is_approved {
            return Err(AppError::Unauthorized(
                "La cuenta está pendiente de aprobación".to_string(),
            ));
        }

        self.repository.record_login(user.id).await?;

        let token = generate_jwt_token(&user, &self.config)?;

        Ok(LoginResponse {
            token,
            user: user.into(),
        })
    }

    /// Datos de la cuenta autenticada
    pub async fn me(&self, user: &AuthenticatedUser) -> Result<UserResponse, AppError> {
        let user = self
            .repository
            .find_by_id(user.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuario no encontrado".to_string()))?;

        Ok(user.into())
    }

    pub async fn list(&self) -> Result<Vec<UserResponse>, AppError> {
        let users = self.repository.list_all().await?;
        Ok(users.into_iter().map(User::into).collect())
    }

    /// Aprobar una cuenta pendiente (admin)
    pub async fn approve(&self, id: Uuid) -> Result<ApiResponse<UserResponse>, AppError> {
        let user = self
            .repository
            .set_approved(id, true)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuario no encontrado".to_string()))?;

        Ok(ApiResponse::success_with_message(
            user.into(),
            "Usuario aprobado".to_string(),
        ))
    }

    /// Rechazar una cuenta pendiente: elimina el registro (admin)
    pub async fn reject(&self, id: Uuid) -> Result<ApiResponse<()>, AppError> {
        let user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuario no encontrado".to_string()))?;

        if user.is_approved {
            return Err(AppError::Conflict(
                "La cuenta ya fue aprobada; usa desactivar o eliminar".to_string(),
            ));
        }

        self.repository.delete(id).await?;

        Ok(ApiResponse::message_only("Cuenta rechazada".to_string()))
    }

    pub async fn activate(&self, id: Uuid) -> Result<ApiResponse<UserResponse>, AppError> {
        let user = self
            .repository
            .set_active(id, true)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuario no encontrado".to_string()))?;

        Ok(ApiResponse::success_with_message(
            user.into(),
            "Usuario activado".to_string(),
        ))
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<ApiResponse<UserResponse>, AppError> {
        self.guard_last_admin(id, "desactivar").await?;

        let user = self
            .repository
            .set_active(id, false)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuario no encontrado".to_string()))?;

        Ok(ApiResponse::success_with_message(
            user.into(),
            "Usuario desactivado".to_string(),
        ))
    }

    /// Editar una cuenta (admin): username, email, password, rol
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<ApiResponse<UserResponse>, AppError> {
        use validator::Validate;
        request.validate()?;

        let current = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuario no encontrado".to_string()))?;

        if let Some(username) = &request.username {
            if username != &current.username && self.repository.username_exists(username).await? {
                return Err(AppError::Conflict(
                    "El nombre de usuario ya está registrado".to_string(),
                ));
            }
        }

        if let Some(email) = &request.email {
            if email != &current.email && self.repository.email_exists(email).await? {
                return Err(AppError::Conflict("El email ya está registrado".to_string()));
            }
        }

        let is_admin = request.is_admin.unwrap_or(current.is_admin);
        if current.is_admin && !is_admin {
            self.guard_last_admin(id, "quitar el rol de admin a").await?;
        }

        let password_hash = match &request.password {
            Some(password) => hash(password, DEFAULT_COST)
                .map_err(|e| AppError::Hash(format!("Error hashing password: {}", e)))?,
            None => current.password_hash.clone(),
        };

        let user = self
            .repository
            .update(
                id,
                request.username.as_deref().unwrap_or(&current.username),
                request.email.as_deref().unwrap_or(&current.email),
                &password_hash,
                is_admin,
            )
            .await?
            .ok_or_else(|| AppError::NotFound("Usuario no encontrado".to_string()))?;

        Ok(ApiResponse::success_with_message(
            user.into(),
            "Usuario actualizado".to_string(),
        ))
    }

    /// Eliminar una cuenta (admin)
    pub async fn delete(&self, id: Uuid) -> Result<ApiResponse<()>, AppError> {
        self.guard_last_admin(id, "eliminar").await?;

        if self.vehicles.user_has_records(id).await? {
            return Err(AppError::Conflict(
                "El usuario tiene registros de vehículos asociados; desactívalo en su lugar"
                    .to_string(),
            ));
        }

        if !self.repository.delete(id).await? {
            return Err(AppError::NotFound("Usuario no encontrado".to_string()));
        }

        Ok(ApiResponse::message_only("Usuario eliminado".to_string()))
    }

    /// Impedir dejar el sistema sin ningún admin operativo
    async fn guard_last_admin(&self, id: Uuid, action: &str) -> Result<(), AppError> {
        let target = self.repository.find_by_id(id).await?;

        if let Some(target) = target {
            if target.is_admin && target.is_active && target.is_approved {
                let admins = self.repository.active_admin_count().await?;
                if admins <= 1 {
                    return Err(AppError::Conflict(format!(
                        "No se puede {} el último administrador",
                        action
                    )));
                }
            }
        }

        Ok(())
    }
}
