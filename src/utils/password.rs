use bcrypt::{hash, verify, BcryptError, DEFAULT_COST};

pub fn hash_password(password: &str) -> Result<String, BcryptError> {
    hash(password, DEFAULT_COST)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hashed = hash_password("kick-off-2025").unwrap();
        assert!(verify_password("kick-off-2025", &hashed));
        assert!(!verify_password("kick-off-2024", &hashed));
        assert!(!verify_password("kick-off-2025", "not-a-hash"));
    }
}
