//! Login, signup and profile forms.

use futures::future::{self, BoxFuture, FutureExt};

use crate::model::{
    Credentials, LoginErrors, ProfileErrors, ProfileUpdate, SignupErrors, SignupRequest, UserProfile,
};

use super::Form;
use super::rules::{self, MAX_NAME_LENGTH, MIN_PASSWORD_LENGTH};

fn settled(message: Option<String>) -> BoxFuture<'static, Option<String>> {
    future::ready(message).boxed()
}

fn username_rules(value: &str) -> Option<String> {
    rules::first([rules::required(value), rules::max_length(value, MAX_NAME_LENGTH)])
}

fn email_rules(value: &str) -> Option<String> {
    rules::first([rules::required(value), rules::email(value)])
}

// =============================================================================
// LoginForm
// =============================================================================

/// Inputs of [`LoginForm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginField {
    /// Login name.
    Username,
    /// Password.
    Password,
}

/// Username and password.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    /// Login name.
    pub username: String,
    /// Password.
    pub password: String,
}

impl LoginForm {
    /// Builds the login request.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.trim().to_owned(),
            password: self.password.clone(),
        }
    }
}

impl Form for LoginForm {
    type Field = LoginField;
    type Errors = LoginErrors;

    fn fields(&self) -> Vec<LoginField> {
        vec![LoginField::Username, LoginField::Password]
    }

    fn set(&mut self, field: LoginField, value: String) {
        match field {
            LoginField::Username => self.username = value,
            LoginField::Password => self.password = value,
        }
    }

    fn check(&self, field: LoginField) -> BoxFuture<'static, Option<String>> {
        settled(match field {
            LoginField::Username => rules::required(&self.username),
            LoginField::Password => rules::required(&self.password),
        })
    }

    fn record_error(errors: &mut LoginErrors, field: LoginField, message: Option<String>) {
        match field {
            LoginField::Username => errors.username = message,
            LoginField::Password => errors.password = message,
        }
    }
}

// =============================================================================
// SignupForm
// =============================================================================

/// Inputs of [`SignupForm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignupField {
    /// Login name.
    Username,
    /// Contact address.
    Email,
    /// Password.
    Password,
    /// Password typed a second time.
    PasswordConfirmation,
    /// Given name.
    FirstName,
    /// Family name.
    LastName,
}

/// Account registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    /// Login name.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// Password.
    pub password: String,
    /// Password typed a second time.
    pub password_confirmation: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

impl SignupForm {
    /// Builds the signup request. The confirmation stays client-side.
    #[must_use]
    pub fn request(&self) -> SignupRequest {
        SignupRequest {
            username: self.username.trim().to_owned(),
            email: self.email.trim().to_owned(),
            password: self.password.clone(),
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
        }
    }
}

impl Form for SignupForm {
    type Field = SignupField;
    type Errors = SignupErrors;

    fn fields(&self) -> Vec<SignupField> {
        vec![
            SignupField::Username,
            SignupField::Email,
            SignupField::Password,
            SignupField::PasswordConfirmation,
            SignupField::FirstName,
            SignupField::LastName,
        ]
    }

    fn set(&mut self, field: SignupField, value: String) {
        match field {
            SignupField::Username => self.username = value,
            SignupField::Email => self.email = value,
            SignupField::Password => self.password = value,
            SignupField::PasswordConfirmation => self.password_confirmation = value,
            SignupField::FirstName => self.first_name = value,
            SignupField::LastName => self.last_name = value,
        }
    }

    fn check(&self, field: SignupField) -> BoxFuture<'static, Option<String>> {
        settled(match field {
            SignupField::Username => username_rules(&self.username),
            SignupField::Email => email_rules(&self.email),
            SignupField::Password => rules::min_length(&self.password, MIN_PASSWORD_LENGTH),
            SignupField::PasswordConfirmation => {
                rules::matches(&self.password_confirmation, &self.password)
            }
            SignupField::FirstName => rules::max_length(&self.first_name, MAX_NAME_LENGTH),
            SignupField::LastName => rules::max_length(&self.last_name, MAX_NAME_LENGTH),
        })
    }

    fn record_error(errors: &mut SignupErrors, field: SignupField, message: Option<String>) {
        let slot = match field {
            SignupField::Username => &mut errors.username,
            SignupField::Email => &mut errors.email,
            SignupField::Password => &mut errors.password,
            SignupField::PasswordConfirmation => &mut errors.password_confirmation,
            SignupField::FirstName => &mut errors.first_name,
            SignupField::LastName => &mut errors.last_name,
        };
        *slot = message;
    }
}

// =============================================================================
// ProfileForm
// =============================================================================

/// Inputs of [`ProfileForm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    /// Login name.
    Username,
    /// Contact address.
    Email,
    /// Given name.
    FirstName,
    /// Family name.
    LastName,
}

/// Profile editing, prefilled from the cached profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    /// Login name.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

impl ProfileForm {
    /// Prefills the form from `profile`.
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            username: profile.username.clone(),
            email: profile.email.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
        }
    }

    /// Builds the update request.
    #[must_use]
    pub fn profile_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            username: self.username.trim().to_owned(),
            email: self.email.trim().to_owned(),
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
        }
    }
}

impl Form for ProfileForm {
    type Field = ProfileField;
    type Errors = ProfileErrors;

    fn fields(&self) -> Vec<ProfileField> {
        vec![
            ProfileField::Username,
            ProfileField::Email,
            ProfileField::FirstName,
            ProfileField::LastName,
        ]
    }

    fn set(&mut self, field: ProfileField, value: String) {
        match field {
            ProfileField::Username => self.username = value,
            ProfileField::Email => self.email = value,
            ProfileField::FirstName => self.first_name = value,
            ProfileField::LastName => self.last_name = value,
        }
    }

    fn check(&self, field: ProfileField) -> BoxFuture<'static, Option<String>> {
        settled(match field {
            ProfileField::Username => username_rules(&self.username),
            ProfileField::Email => email_rules(&self.email),
            ProfileField::FirstName => rules::max_length(&self.first_name, MAX_NAME_LENGTH),
            ProfileField::LastName => rules::max_length(&self.last_name, MAX_NAME_LENGTH),
        })
    }

    fn record_error(errors: &mut ProfileErrors, field: ProfileField, message: Option<String>) {
        let slot = match field {
            ProfileField::Username => &mut errors.username,
            ProfileField::Email => &mut errors.email,
            ProfileField::FirstName => &mut errors.first_name,
            ProfileField::LastName => &mut errors.last_name,
        };
        *slot = message;
    }
}
