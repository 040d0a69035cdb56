//! Declarative request validation.
//!
//! Each field runs an ordered chain of `(predicate, message)` rules. Every
//! field is checked and all failures are collected; within a field, `bail()`
//! stops the chain once an earlier rule has failed, for rules that only make
//! sense on top of it (an email format check after a presence check).

use std::sync::LazyLock;

use regex::Regex;

use chirp_types::api::{CreateTweetRequest, EditProfileRequest, ErrorItem, SignUpRequest};

use crate::error::ApiError;

pub const MAX_BIO_CHARS: usize = 160;
pub const MAX_TWEET_CHARS: usize = 280;

#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ErrorItem>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field<'v>(&'v mut self, param: &'static str, value: &'v str) -> FieldRules<'v> {
        FieldRules {
            validator: self,
            param,
            value,
            failed: false,
            halted: false,
        }
    }

    pub fn errors(&self) -> &[ErrorItem] {
        &self.errors
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

pub struct FieldRules<'v> {
    validator: &'v mut Validator,
    param: &'static str,
    value: &'v str,
    failed: bool,
    halted: bool,
}

impl FieldRules<'_> {
    pub fn rule(mut self, ok: impl FnOnce(&str) -> bool, msg: &str) -> Self {
        if self.halted {
            return self;
        }
        if !ok(self.value) {
            self.failed = true;
            self.validator.errors.push(ErrorItem {
                msg: msg.to_string(),
                param: Some(self.param.to_string()),
            });
        }
        self
    }

    pub fn min_len(self, min: usize, msg: &str) -> Self {
        self.rule(|v| v.chars().count() >= min, msg)
    }

    pub fn max_len(self, max: usize, msg: &str) -> Self {
        self.rule(|v| v.chars().count() <= max, msg)
    }

    pub fn len_between(self, min: usize, max: usize, msg: &str) -> Self {
        self.rule(
            |v| {
                let n = v.chars().count();
                n >= min && n <= max
            },
            msg,
        )
    }

    pub fn email(self, msg: &str) -> Self {
        self.rule(valid_email, msg)
    }

    pub fn equals(self, other: &str, msg: &str) -> Self {
        self.rule(|v| v == other, msg)
    }

    /// Skip the rest of this field's chain if anything before failed.
    pub fn bail(mut self) -> Self {
        if self.failed {
            self.halted = true;
        }
        self
    }
}

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

/// Lightweight email sanity check.
pub fn valid_email(email: &str) -> bool {
    EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email))
}

/// Normalize an email for lookup and uniqueness checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_sign_up(req: &SignUpRequest) -> Result<(), ApiError> {
    let mut v = Validator::new();

    v.field("fname", &req.fname)
        .min_len(1, "First name is required at least 1 chars.");
    v.field("lname", &req.lname)
        .min_len(1, "Last name is required at least 1 chars.");
    v.field("email", req.email.trim())
        .min_len(1, "Email is required.")
        .bail()
        .email("Please provide a valid email address");
    v.field("username", req.username.trim())
        .min_len(3, "Username must contain at least 3 chars.")
        .rule(|v| !v.contains('@'), "Username cannot contain @.");
    v.field("password", &req.password)
        .len_between(6, 25, "Password must be between 6-25 characters long.");
    v.field("confirm", &req.confirm)
        .min_len(1, "Confirm password is required.")
        .bail()
        .equals(&req.password, "Passwords must match.");

    v.finish()
}

pub fn validate_profile_edit(req: &EditProfileRequest) -> Result<(), ApiError> {
    let mut v = Validator::new();

    if let Some(fname) = &req.fname {
        v.field("fname", fname)
            .min_len(1, "First name is required at least 1 chars.");
    }
    if let Some(lname) = &req.lname {
        v.field("lname", lname)
            .min_len(1, "Last name is required at least 1 chars.");
    }
    if let Some(bio) = &req.bio {
        v.field("bio", bio)
            .max_len(MAX_BIO_CHARS, "Bio must be at most 160 characters long.");
    }

    v.finish()
}

pub fn validate_tweet(req: &CreateTweetRequest) -> Result<(), ApiError> {
    let mut v = Validator::new();

    v.field("content", req.content.trim())
        .min_len(1, "Tweet content is required.")
        .bail()
        .max_len(MAX_TWEET_CHARS, "Tweet must be at most 280 characters long.");

    v.finish()
}
