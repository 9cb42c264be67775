use crate::application_port::TokenError;
use crate::domain_model::UserId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshToken(pub String);

/// The `sub` claim exactly as it was found in a verified token.
///
/// The codec does not interpret it; turning it into a [`UserId`] is a separate,
/// fallible step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject(pub serde_json::Value);

impl From<UserId> for Subject {
    fn from(user_id: UserId) -> Self {
        Subject(serde_json::Value::from(user_id.0))
    }
}

impl TryFrom<Subject> for UserId {
    type Error = TokenError;

    fn try_from(subject: Subject) -> Result<Self, Self::Error> {
        let id = subject.0.as_i64().ok_or(TokenError::InvalidSubject)?;
        let user_id = UserId(id);
        if !user_id.is_valid() {
            return Err(TokenError::InvalidSubject);
        }
        Ok(user_id)
    }
}
