//! Identity service contract: who is acting.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub uid: String,
    pub email: String,
}

pub trait Identity {
    fn current_user(&self) -> Option<CurrentUser>;
}

/// Fixed identity for tests and the CLI (`--as <uid>`).
#[derive(Debug, Clone, Default)]
pub struct FixedIdentity {
    user: Option<CurrentUser>,
}

impl FixedIdentity {
    pub fn signed_in(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user: Some(CurrentUser {
                uid: uid.into(),
                email: email.into(),
            }),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }
}

impl Identity for FixedIdentity {
    fn current_user(&self) -> Option<CurrentUser> {
        self.user.clone()
    }
}
