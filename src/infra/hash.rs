use std::hash::Hasher;

use twox_hash::XxHash64;

pub fn hash64(text: &str) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(text.as_bytes());
    hasher.finish()
}

/// Stable file hash for records the server sent without one.
pub fn file_hash_for_path(path: &str) -> String {
    format!("{:016x}", hash64(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_hash_is_stable_and_path_sensitive() {
        let a = file_hash_for_path("app/models/user.rb");
        assert_eq!(a, file_hash_for_path("app/models/user.rb"));
        assert_eq!(a.len(), 16);
        assert_ne!(a, file_hash_for_path("app/models/users.rb"));
    }
}
