//! Field-error records, one per validated operation.
//!
//! Each record is sparse: a field is `Some(message)` only when it failed.
//! `non_field` carries errors the server reports under `non_field_errors`.

use serde::Deserialize;

use crate::outcome::{ErrorPayload, FieldErrors, decode_record};

/// Declares a field-error record and its [`FieldErrors`] implementation.
macro_rules! field_error_record {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$field_meta:meta])* $field:ident),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
        #[serde(default)]
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: Option<String>,
            )+
            /// Errors not tied to a single field.
            #[serde(rename = "non_field_errors")]
            pub non_field: Option<String>,
        }

        impl FieldErrors for $name {
            fn from_payload(payload: &ErrorPayload) -> Self {
                decode_record(payload)
            }

            fn is_empty(&self) -> bool {
                $(self.$field.is_none() &&)+ self.non_field.is_none()
            }
        }
    };
}

field_error_record! {
    /// Errors for the login form.
    LoginErrors {
        /// Login name error.
        username,
        /// Password error.
        password,
    }
}

field_error_record! {
    /// Errors for the signup form.
    SignupErrors {
        /// Login name error.
        username,
        /// Contact address error.
        email,
        /// Password error.
        password,
        /// Password confirmation error. Client-side only.
        password_confirmation,
        /// Given name error.
        first_name,
        /// Family name error.
        last_name,
    }
}

field_error_record! {
    /// Errors for the profile editing form.
    ProfileErrors {
        /// Login name error.
        username,
        /// Contact address error.
        email,
        /// Given name error.
        first_name,
        /// Family name error.
        last_name,
    }
}

field_error_record! {
    /// Errors for quiz creation.
    QuizErrors {
        /// Title error.
        title,
        /// Description error.
        description,
        /// Deadline error.
        due_date,
        /// Question list error.
        questions,
    }
}

field_error_record! {
    /// Errors for a quiz response submission.
    QuizResponseErrors {
        /// Answer list error.
        answers,
        /// Set when the quiz no longer accepts responses.
        expiration,
    }
}
