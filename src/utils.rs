use uuid::Uuid;

/// Generates a new transaction id: a random UUID, e.g. `67e55044-10b1-426f-9247-bb680e5fe0c8`.
pub(crate) fn generate_transaction_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_transaction_id() {
        let a = generate_transaction_id();
        let b = generate_transaction_id();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
