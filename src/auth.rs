//! Sign-in: the identity provider seam, a local SQLite-backed provider, and the
//! login/register form with its inline error handling.

use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{Result, ValidationError};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
    pub email: String,
}

impl User {
    /// Name shown in the menu header
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("Player")
    }

    pub fn initial(&self) -> char {
        self.display_name
            .as_deref()
            .and_then(|name| name.chars().next())
            .or_else(|| self.email.chars().next())
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }
}

/// Failure reported by an identity provider, carrying its own error code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub code: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

pub type AuthResult = std::result::Result<(), ProviderError>;

pub trait IdentityProvider {
    fn current_user(&self) -> Option<&User>;
    fn login(&mut self, email: &str, password: &str) -> AuthResult;
    fn register(&mut self, email: &str, password: &str, display_name: &str) -> AuthResult;
    fn logout(&mut self) -> AuthResult;
}

/// Provider codes with a dedicated user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorCode {
    EmailAlreadyInUse,
    WeakPassword,
    InvalidEmail,
    UserNotFound,
    WrongPassword,
    InvalidCredential,
}

impl AuthErrorCode {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "auth/email-already-in-use" => Some(Self::EmailAlreadyInUse),
            "auth/weak-password" => Some(Self::WeakPassword),
            "auth/invalid-email" => Some(Self::InvalidEmail),
            "auth/user-not-found" => Some(Self::UserNotFound),
            "auth/wrong-password" => Some(Self::WrongPassword),
            "auth/invalid-credential" => Some(Self::InvalidCredential),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::EmailAlreadyInUse => "auth/email-already-in-use",
            Self::WeakPassword => "auth/weak-password",
            Self::InvalidEmail => "auth/invalid-email",
            Self::UserNotFound => "auth/user-not-found",
            Self::WrongPassword => "auth/wrong-password",
            Self::InvalidCredential => "auth/invalid-credential",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::EmailAlreadyInUse => "This email address is already in use",
            Self::WeakPassword => "Password is too weak",
            Self::InvalidEmail => "Invalid email address",
            Self::UserNotFound => "No account found for this email",
            Self::WrongPassword => "Wrong password",
            Self::InvalidCredential => "Invalid credentials",
        }
    }
}

impl From<AuthErrorCode> for ProviderError {
    fn from(code: AuthErrorCode) -> Self {
        ProviderError::new(code.code())
    }
}

/// Maps a provider code to the text shown under the form; unknown codes pass through
pub fn error_message(code: &str) -> String {
    AuthErrorCode::from_code(code)
        .map(|c| c.message().to_string())
        .unwrap_or_else(|| code.to_string())
}

pub fn validate_registration(password: &str, confirm: &str) -> std::result::Result<(), ValidationError> {
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();
    digest.iter().fold(String::with_capacity(64), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

/// Accounts stored next to the score history. Keeps the signed-in user in memory.
#[derive(Debug)]
pub struct LocalIdentityProvider {
    conn: Connection,
    current: Option<User>,
}

impl LocalIdentityProvider {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                display_name TEXT,
                salt TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(Self {
            conn,
            current: None,
        })
    }

    fn find(&self, email: &str) -> rusqlite::Result<Option<(User, String, String)>> {
        self.conn
            .query_row(
                "SELECT id, email, display_name, salt, password_hash FROM users WHERE email = ?1",
                [email],
                |row| {
                    Ok((
                        User {
                            id: row.get(0)?,
                            email: row.get(1)?,
                            display_name: row.get(2)?,
                        },
                        row.get(3)?,
                        row.get(4)?,
                    ))
                },
            )
            .optional()
    }

    /// Account registered under `email`, whether or not it is signed in
    pub fn lookup(&self, email: &str) -> Result<Option<User>> {
        let email = email.trim().to_lowercase();
        Ok(self.find(&email)?.map(|(user, _, _)| user))
    }
}

fn storage_failure(err: rusqlite::Error) -> ProviderError {
    warn!("identity storage error: {}", err);
    ProviderError::new(err.to_string())
}

impl IdentityProvider for LocalIdentityProvider {
    fn current_user(&self) -> Option<&User> {
        self.current.as_ref()
    }

    fn login(&mut self, email: &str, password: &str) -> AuthResult {
        let email = email.trim().to_lowercase();
        if !looks_like_email(&email) {
            return Err(AuthErrorCode::InvalidEmail.into());
        }
        let (user, salt, expected) = self
            .find(&email)
            .map_err(storage_failure)?
            .ok_or(AuthErrorCode::UserNotFound)?;

        if hash_password(&salt, password) != expected {
            return Err(AuthErrorCode::WrongPassword.into());
        }

        info!("signed in {}", user.id);
        self.current = Some(user);
        Ok(())
    }

    fn register(&mut self, email: &str, password: &str, display_name: &str) -> AuthResult {
        let email = email.trim().to_lowercase();
        if !looks_like_email(&email) {
            return Err(AuthErrorCode::InvalidEmail.into());
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthErrorCode::WeakPassword.into());
        }
        if self.find(&email).map_err(storage_failure)?.is_some() {
            return Err(AuthErrorCode::EmailAlreadyInUse.into());
        }

        let mut rng = rand::thread_rng();
        let id = format!("{:032x}", rng.gen::<u128>());
        let salt = format!("{:032x}", rng.gen::<u128>());
        let display_name = Some(display_name.trim().to_string()).filter(|n| !n.is_empty());

        self.conn
            .execute(
                "INSERT INTO users (id, email, display_name, salt, password_hash) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, email, display_name, salt, hash_password(&salt, password)],
            )
            .map_err(storage_failure)?;

        info!("registered {}", id);
        self.current = Some(User {
            id,
            display_name,
            email,
        });
        Ok(())
    }

    fn logout(&mut self) -> AuthResult {
        if let Some(user) = self.current.take() {
            info!("signed out {}", user.id);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Email,
    Password,
    DisplayName,
    ConfirmPassword,
}

/// Login/register form state. Errors never leave the form: they end up in `error`.
#[derive(Debug, Clone)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub focus: AuthField,
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub confirm_password: String,
    pub error: Option<String>,
}

impl Default for AuthForm {
    fn default() -> Self {
        Self {
            mode: AuthMode::Login,
            focus: AuthField::Email,
            email: String::new(),
            password: String::new(),
            display_name: String::new(),
            confirm_password: String::new(),
            error: None,
        }
    }
}

impl AuthForm {
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            focus: AuthField::Password,
            ..Self::default()
        }
    }

    pub fn fields(&self) -> &'static [AuthField] {
        match self.mode {
            AuthMode::Login => &[AuthField::Email, AuthField::Password],
            AuthMode::Register => &[
                AuthField::DisplayName,
                AuthField::Email,
                AuthField::Password,
                AuthField::ConfirmPassword,
            ],
        }
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        self.focus = self.fields()[0];
        self.error = None;
    }

    pub fn focus_next(&mut self) {
        self.shift_focus(1);
    }

    pub fn focus_prev(&mut self) {
        self.shift_focus(-1);
    }

    fn shift_focus(&mut self, step: isize) {
        let fields = self.fields();
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0) as isize;
        let len = fields.len() as isize;
        self.focus = fields[((idx + step).rem_euclid(len)) as usize];
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
            AuthField::DisplayName => &mut self.display_name,
            AuthField::ConfirmPassword => &mut self.confirm_password,
        }
    }

    pub fn value(&self, field: AuthField) -> &str {
        match field {
            AuthField::Email => &self.email,
            AuthField::Password => &self.password,
            AuthField::DisplayName => &self.display_name,
            AuthField::ConfirmPassword => &self.confirm_password,
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.focused_mut().push(c);
        self.error = None;
    }

    pub fn pop_char(&mut self) {
        self.focused_mut().pop();
        self.error = None;
    }

    /// Runs validation and the provider call. Returns true once someone is signed in.
    pub fn submit<P: IdentityProvider + ?Sized>(&mut self, provider: &mut P) -> bool {
        self.error = None;

        let outcome = match self.mode {
            AuthMode::Login => provider.login(&self.email, &self.password),
            AuthMode::Register => {
                if let Err(err) = validate_registration(&self.password, &self.confirm_password) {
                    self.error = Some(err.to_string());
                    return false;
                }
                provider.register(&self.email, &self.password, &self.display_name)
            }
        };

        match outcome {
            Ok(()) => {
                self.password.clear();
                self.confirm_password.clear();
                true
            }
            Err(err) => {
                info!("authentication failed: {}", err.code);
                self.error = Some(error_message(&err.code));
                false
            }
        }
    }
}
