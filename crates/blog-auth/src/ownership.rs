//! Per-resource ownership checks
//!
//! Only the creator of a post or comment may change it. The existence lookup
//! happens before this check and is the caller's job.

use crate::error::AuthError;
use crate::store::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied,
}

/// Allowed iff the actor is the recorded owner
pub fn authorize(actor: UserId, owner: UserId) -> Decision {
    if actor == owner {
        Decision::Allowed
    } else {
        Decision::Denied
    }
}

/// [`authorize`] as a `Result`, for `?` in request handlers
pub fn ensure_owner(actor: UserId, owner: UserId) -> Result<(), AuthError> {
    match authorize(actor, owner) {
        Decision::Allowed => Ok(()),
        Decision::Denied => Err(AuthError::Denied),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_is_allowed() {
        assert_eq!(authorize(UserId(5), UserId(5)), Decision::Allowed);
        assert!(ensure_owner(UserId(5), UserId(5)).is_ok());
    }

    #[test]
    fn test_other_user_is_denied() {
        assert_eq!(authorize(UserId(7), UserId(5)), Decision::Denied);
        assert!(matches!(
            ensure_owner(UserId(7), UserId(5)),
            Err(AuthError::Denied)
        ));
    }

    #[test]
    fn test_allowed_iff_equal() {
        let ids = [0, 1, 5, 7, -3, i32::MAX];
        for a in ids {
            for b in ids {
                let decision = authorize(UserId(a), UserId(b));
                assert_eq!(decision == Decision::Allowed, a == b, "{} vs {}", a, b);
                // symmetric
                assert_eq!(decision, authorize(UserId(b), UserId(a)));
            }
        }
    }
}
