//! Signed-in user's profile and the account form checks

use crate::interface::{CrochetError, ProfileUpdate, UserProfile};
use crate::observable::{Observable, SubscriptionId};

pub const MIN_PASSWORD_LEN: usize = 6;

const DEFAULT_USERNAME: &str = "Guest";
const DEFAULT_PROFILE_IMAGE: &str = "https://via.placeholder.com/80/4A5568/ffffff?Text=G";

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            email: String::new(),
            phone_number: String::new(),
            gender: String::new(),
            profile_image: DEFAULT_PROFILE_IMAGE.to_string(),
        }
    }
}

#[derive(Default)]
pub struct ProfileState {
    profile: Observable<UserProfile>,
}

impl ProfileState {
    pub fn new(initial: UserProfile) -> Self {
        Self {
            profile: Observable::new(initial),
        }
    }

    pub fn profile(&self) -> UserProfile {
        self.profile.get()
    }

    /// Merge the provided fields. Nothing changes if any field is invalid.
    pub fn update(&self, update: ProfileUpdate) -> Result<UserProfile, CrochetError> {
        validate_update(&update)?;
        Ok(self.profile.update(|profile| {
            if let Some(username) = update.username {
                profile.username = username;
            }
            if let Some(email) = update.email {
                profile.email = email.trim().to_string();
            }
            if let Some(phone_number) = update.phone_number {
                profile.phone_number = phone_number;
            }
            if let Some(gender) = update.gender {
                profile.gender = gender;
            }
            if let Some(profile_image) = update.profile_image {
                profile.profile_image = profile_image;
            }
            profile.clone()
        }))
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&UserProfile) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.profile.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.profile.unsubscribe(id)
    }
}

fn validate_update(update: &ProfileUpdate) -> Result<(), CrochetError> {
    if let Some(username) = &update.username {
        if username.trim().is_empty() {
            return Err(CrochetError::InvalidInput("username cannot be empty".into()));
        }
    }
    if let Some(email) = &update.email {
        let email = email.trim();
        if !email.is_empty() && !validator::validate_email(email) {
            return Err(CrochetError::InvalidInput(format!("invalid email: {}", email)));
        }
    }
    if let Some(image) = &update.profile_image {
        if !image.is_empty() && !is_http_url(image) {
            return Err(CrochetError::InvalidInput(format!("invalid image url: {}", image)));
        }
    }
    Ok(())
}

/// http(s) URL check shared with product drafts
pub(crate) fn is_http_url(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    (lower.starts_with("http://") || lower.starts_with("https://"))
        && validator::validate_url(text.trim())
}

/// Check the change-password form
pub fn validate_password_change(
    current_password: &str,
    new_password: &str,
    confirm_password: &str,
) -> Result<(), CrochetError> {
    if current_password.is_empty() || new_password.is_empty() || confirm_password.is_empty() {
        return Err(CrochetError::InvalidInput("please fill in all fields".into()));
    }
    if new_password != confirm_password {
        return Err(CrochetError::InvalidInput(
            "new password and confirm password do not match".into(),
        ));
    }
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CrochetError::InvalidInput(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
